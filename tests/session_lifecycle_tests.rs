use std::cell::RefCell;
use std::rc::Rc;

use chart_session::api::{ChartSession, ChartSessionConfig, SessionState, VisibleWindowAnchor};
use chart_session::core::{
    Bar, BarFrame, LinePoint, PaneLayout, SeriesData, SeriesKey, SeriesSnapshot,
    build_series_snapshot,
};
use chart_session::error::ChartError;
use chart_session::extensions::match_report_markers;
use chart_session::interaction::PointerMoveEvent;
use chart_session::render::{Color, HeadlessSurface};
use chrono::{DateTime, TimeZone, Utc};

const DAY: f64 = 86_400.0;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 31, 15, 0, 0)
        .single()
        .expect("valid instant")
}

fn now_seconds() -> f64 {
    now().timestamp() as f64
}

fn session_with(config: ChartSessionConfig) -> ChartSession<HeadlessSurface> {
    ChartSession::new_at(HeadlessSurface::default(), PaneLayout::reference(), config, now())
        .expect("session")
}

fn session() -> ChartSession<HeadlessSurface> {
    session_with(ChartSessionConfig::default())
}

/// Daily bars ending `lag_days` before `now()`.
fn snapshot(count: usize, lag_days: f64) -> SeriesSnapshot {
    let last = (now_seconds() / DAY).floor() * DAY - lag_days * DAY;
    let bars: Vec<Bar> = (0..count)
        .map(|i| {
            let time = last - (count - 1 - i) as f64 * DAY;
            let close = 50.0 + i as f64;
            Bar::new(time, close - 0.5, close + 1.0, close - 1.0, close, 1_000.0).expect("bar")
        })
        .collect();
    let rsi: Vec<Option<f64>> = (0..count).map(|i| (i > 1).then_some(40.0 + i as f64)).collect();
    let frame = BarFrame::new(bars).expect("frame").with_indicator("rsi", rsi);
    build_series_snapshot(
        &frame,
        &PaneLayout::reference(),
        Color::from_hex(0x4CAF50),
        Color::from_hex(0xF44336),
    )
    .expect("snapshot")
}

#[test]
fn session_builds_four_panes_and_seventeen_handles() {
    let session = session();
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.handle_count(), 17);
    assert_eq!(session.surface().panes().len(), 4);
    assert_eq!(session.surface().series().len(), 16);
    for key in SeriesKey::ALL {
        assert!(session.handle(key).is_some(), "{} handle", key.name());
    }
}

#[test]
fn attach_resets_window_to_trailing_year_over_user_zoom() {
    let mut session = session();
    session
        .set_visible_range(now_seconds() - 30.0 * DAY, now_seconds() - 10.0 * DAY)
        .expect("user zoom");
    session.zoom_visible_by(2.0, now_seconds() - 20.0 * DAY).expect("zoom");

    session
        .attach_data_at(&snapshot(30, 0.0), &[], now())
        .expect("attach");

    let (start, end) = session.visible_range();
    assert_eq!(end, now_seconds());
    assert_eq!(end - start, 365.0 * DAY);
    assert_eq!(session.surface().visible_range(), Some((start, end)));
}

#[test]
fn last_bar_anchor_ends_window_at_final_bar() {
    let config =
        ChartSessionConfig::default().with_visible_window_anchor(VisibleWindowAnchor::LastBar);
    let mut session = session_with(config);
    let data = snapshot(20, 4.0);
    let last_bar = data.last_bar_time().expect("bars");
    session.attach_data_at(&data, &[], now()).expect("attach");
    assert_eq!(session.visible_range(), (last_bar - 365.0 * DAY, last_bar));

    session
        .attach_data_at(&SeriesSnapshot::new(), &[], now())
        .expect("empty attach");
    assert_eq!(session.visible_range().1, now_seconds());
}

#[test]
fn attach_replaces_every_series_and_the_marker_set() {
    let mut session = session();
    let reports = vec![
        chart_session::core::ReportEvent::new(1, "A", "desk").with_published_date("2025-01-10"),
        chart_session::core::ReportEvent::new(2, "B", "desk").with_published_date("2025-01-20"),
    ];
    let markers = match_report_markers(&reports, Color::from_hex(0x2196F3));
    session
        .attach_data_at(&snapshot(30, 0.0), &markers, now())
        .expect("first attach");

    let candles = session.surface().series_by_name("candles").expect("candles");
    assert_eq!(candles.markers.len(), 2);
    assert_eq!(candles.marker_updates, 2);
    let rsi = session.surface().series_by_name("rsi_14").expect("rsi");
    assert_eq!(rsi.data.as_ref().map(SeriesData::len), Some(28));

    let mut partial = SeriesSnapshot::new();
    partial.insert(
        SeriesKey::Rsi14,
        SeriesData::Line(vec![LinePoint::new(now_seconds() - DAY, 51.0)]),
    );
    session
        .attach_data_at(&partial, &markers[..1], now())
        .expect("second attach");

    let surface = session.surface();
    let candles = surface.series_by_name("candles").expect("candles");
    assert!(candles.data.as_ref().is_some_and(SeriesData::is_empty));
    assert_eq!(candles.markers.len(), 1);
    assert_eq!(candles.marker_updates, 4);
    assert_eq!(candles.data_updates, 2);
    let rsi = surface.series_by_name("rsi_14").expect("rsi");
    assert_eq!(rsi.data.as_ref().map(SeriesData::len), Some(1));
    let guide = surface.series_by_name("rsi_overbought").expect("guide");
    assert!(guide.data.as_ref().is_some_and(SeriesData::is_empty));
}

#[test]
fn mismatched_snapshot_is_rejected_before_any_push() {
    let mut session = session();
    session
        .set_visible_range(now_seconds() - 10.0 * DAY, now_seconds())
        .expect("user zoom");
    let mut wrong = SeriesSnapshot::new();
    wrong.insert(SeriesKey::Volume, SeriesData::Line(Vec::new()));

    let err = session
        .attach_data_at(&wrong, &[], now())
        .expect_err("kind mismatch");
    assert!(matches!(err, ChartError::SeriesKindMismatch { .. }));
    assert!(session.surface().series().iter().all(|series| series.data_updates == 0));
    assert_eq!(
        session.visible_range(),
        (now_seconds() - 10.0 * DAY, now_seconds())
    );
}

#[test]
fn dispose_is_idempotent_and_drops_subscriptions() {
    let mut session = session();
    session.subscribe_pointer_move(|_| {}).expect("subscribe");
    session.subscribe_pointer_move(|_| {}).expect("subscribe");
    assert_eq!(session.subscription_count(), 2);

    session.dispose();
    session.dispose();

    assert_eq!(session.state(), SessionState::Disposed);
    assert_eq!(session.subscription_count(), 0);
    assert_eq!(session.handle_count(), 0);
    assert_eq!(session.surface().release_count(), 1);
    assert!(session.surface().series().is_empty());
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "attach_data on a disposed chart session")]
fn attach_after_dispose_fails_loudly_in_debug_builds() {
    let mut session = session();
    session.dispose();
    let _ = session.attach_data_at(&snapshot(5, 0.0), &[], now());
}

#[cfg(not(debug_assertions))]
#[test]
fn attach_after_dispose_is_rejected_in_release_builds() {
    let mut session = session();
    session.dispose();
    assert!(matches!(
        session.attach_data_at(&snapshot(5, 0.0), &[], now()),
        Err(ChartError::SessionNotReady { state: "disposed" })
    ));
}

#[test]
fn pointer_moves_reach_subscribers_in_order_until_unsubscribed() {
    let mut session = session();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let first = Rc::clone(&seen);
    let first_id = session
        .subscribe_pointer_move(move |frame| first.borrow_mut().push(("first", frame.event)))
        .expect("subscribe");
    let second = Rc::clone(&seen);
    session
        .subscribe_pointer_move(move |frame| second.borrow_mut().push(("second", frame.event)))
        .expect("subscribe");

    session.pointer_move(PointerMoveEvent::at(10.0, 20.0));
    assert!(session.unsubscribe_pointer_move(first_id));
    assert!(!session.unsubscribe_pointer_move(first_id));
    session.pointer_move(PointerMoveEvent::left());

    let seen = seen.borrow();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0], ("first", PointerMoveEvent::at(10.0, 20.0)));
    assert_eq!(seen[1].0, "second");
    assert_eq!(seen[2], ("second", PointerMoveEvent::left()));
}

#[test]
fn pixel_mapping_follows_the_visible_window() {
    let mut session = session();
    let start = now_seconds() - 100.0 * DAY;
    session.set_visible_range(start, now_seconds()).expect("range");
    let x = session.time_to_pixel(start + 50.0 * DAY).expect("to pixel");
    assert!((x - 600.0).abs() <= 1e-6);
    let back = session.pixel_to_time(x).expect("to time");
    assert!((back - (start + 50.0 * DAY)).abs() <= 1e-3);
    session.pan_visible_by(-DAY).expect("pan");
    assert_eq!(session.visible_range(), (start - DAY, now_seconds() - DAY));
}
