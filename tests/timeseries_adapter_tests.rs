use chart_session::api::TimeseriesResponse;
use chart_session::core::{
    Bar, BarFrame, LinePoint, PaneLayout, SeriesData, SeriesKey, build_series_snapshot,
    candle_points, constant_line, indicator_points, volume_points,
};
use chart_session::render::Color;

const DAY: f64 = 86_400.0;
const START: f64 = 1_704_067_200.0;

fn up() -> Color {
    Color::from_hex(0x4CAF50)
}

fn down() -> Color {
    Color::from_hex(0xF44336)
}

fn bars(ohlc: &[(f64, f64)]) -> Vec<Bar> {
    ohlc.iter()
        .enumerate()
        .map(|(i, (open, close))| {
            Bar::new(
                START + i as f64 * DAY,
                *open,
                open.max(*close) + 1.0,
                open.min(*close) - 1.0,
                *close,
                1_000.0 + i as f64,
            )
            .expect("valid bar")
        })
        .collect()
}

#[test]
fn candles_mirror_bars_in_order() {
    let input = bars(&[(10.0, 11.0), (11.0, 10.5), (10.5, 12.0)]);
    let candles = candle_points(&input);
    assert_eq!(candles.len(), 3);
    for (candle, bar) in candles.iter().zip(&input) {
        assert_eq!(candle.time, bar.time);
        assert_eq!(candle.open, bar.open);
        assert_eq!(candle.high, bar.high);
        assert_eq!(candle.low, bar.low);
        assert_eq!(candle.close, bar.close);
    }
}

#[test]
fn volume_color_follows_own_open_not_previous_close() {
    // Second bar closes below the first close but above its own open.
    let input = bars(&[(10.0, 20.0), (12.0, 15.0), (15.0, 15.0), (15.0, 14.0)]);
    let volume = volume_points(&input, up(), down());
    let colors: Vec<Color> = volume.iter().map(|point| point.color).collect();
    assert_eq!(colors, vec![up(), up(), up(), down()]);
    assert_eq!(volume[1].value, 1_001.0);
}

#[test]
fn indicator_points_drop_non_finite_and_absent_values() {
    let times = [1.0, 2.0, 3.0, 4.0, 5.0];
    let values = [Some(1.5), None, Some(f64::NAN), Some(f64::INFINITY), Some(-2.0)];
    let points = indicator_points(&times, &values);
    assert_eq!(points, vec![LinePoint::new(1.0, 1.5), LinePoint::new(5.0, -2.0)]);
}

#[test]
fn indicator_points_pass_duplicate_timestamps_through() {
    let times = [3.0, 1.0, 1.0];
    let values = [Some(1.0), Some(2.0), Some(3.0)];
    let points = indicator_points(&times, &values);
    let seen: Vec<f64> = points.iter().map(|point| point.time).collect();
    assert_eq!(seen, vec![3.0, 1.0, 1.0]);
}

#[test]
fn constant_line_follows_reference_domain_only() {
    let reference = vec![LinePoint::new(2.0, 55.0), LinePoint::new(4.0, 61.0)];
    let guide = constant_line(&reference, 70.0);
    assert_eq!(guide, vec![LinePoint::new(2.0, 70.0), LinePoint::new(4.0, 70.0)]);
    assert!(constant_line(&[], 30.0).is_empty());
}

#[test]
fn snapshot_covers_every_reference_series() {
    let input = bars(&[(10.0, 11.0), (11.0, 12.0), (12.0, 11.5), (11.5, 13.0)]);
    let frame = BarFrame::new(input)
        .expect("frame")
        .with_indicator("rsi", vec![None, Some(55.0), Some(48.0), Some(72.0)])
        .with_indicator("bvc", vec![Some(0.2), Some(-0.1), None, Some(0.4)]);
    let layout = PaneLayout::reference();
    let snapshot = build_series_snapshot(&frame, &layout, up(), down()).expect("snapshot");

    assert_eq!(snapshot.len(), SeriesKey::ALL.len());
    assert_eq!(snapshot.get(SeriesKey::Candles).map(SeriesData::len), Some(4));
    assert_eq!(snapshot.get(SeriesKey::Volume).map(SeriesData::len), Some(4));

    let rsi = snapshot.get(SeriesKey::Rsi14).expect("rsi").times();
    assert_eq!(rsi.len(), 3);
    for guide in [SeriesKey::RsiOverbought, SeriesKey::RsiOversold, SeriesKey::RsiZero] {
        assert_eq!(snapshot.get(guide).expect("guide").times(), rsi);
    }

    let bvc = snapshot.get(SeriesKey::Bvc).expect("bvc").times();
    assert_eq!(snapshot.get(SeriesKey::BvcZero).expect("bvc zero").times(), bvc);
    assert_eq!(bvc.len(), 3);
}

#[test]
fn missing_indicators_yield_empty_series() {
    let frame = BarFrame::new(bars(&[(10.0, 11.0), (11.0, 12.0)])).expect("frame");
    let snapshot =
        build_series_snapshot(&frame, &PaneLayout::reference(), up(), down()).expect("snapshot");
    for key in [
        SeriesKey::TrailingStop,
        SeriesKey::VwapHigh,
        SeriesKey::Rsi5,
        SeriesKey::KalmanZscore,
        SeriesKey::KalmanUpper,
        SeriesKey::KalmanLower,
        SeriesKey::YzVolatility,
    ] {
        let data = snapshot.get(key).expect("series present");
        assert!(data.is_empty(), "{} should be empty", key.name());
    }
}

#[test]
fn backend_payload_flows_into_snapshot() {
    let payload = r#"{
        "symbol": "VNM",
        "timestamps": ["2024-01-01T00:00:00", "2024-01-02T00:00:00", "2024-01-03T00:00:00"],
        "timeseries": {
            "open": [70.0, 71.0, 70.5],
            "high": [72.0, 72.5, 71.0],
            "low": [69.0, 70.0, 69.5],
            "close": [71.0, 70.5, 70.8],
            "volume": [1500, 1700, 900]
        },
        "indicators": {
            "kalman_zscore": [0.5, null, -1.2],
            "atr_trailing": [68.0, 68.4, "n/a"],
            "macd": {"macd": [1, 2, 3]}
        },
        "meta": {"source": "daily"}
    }"#;
    let response = TimeseriesResponse::from_json(payload).expect("decode");
    assert_eq!(response.interval, "1d");
    assert_eq!(response.indicator_values("macd"), Vec::<Option<f64>>::new());

    let frame = response.into_frame().expect("frame");
    assert_eq!(frame.bars()[0].time, START);
    let snapshot =
        build_series_snapshot(&frame, &PaneLayout::reference(), up(), down()).expect("snapshot");

    let kalman = snapshot.get(SeriesKey::KalmanZscore).expect("kalman");
    assert_eq!(kalman.times(), vec![START, START + 2.0 * DAY]);
    let upper = snapshot
        .get(SeriesKey::KalmanUpper)
        .and_then(SeriesData::as_line)
        .expect("upper guide");
    assert!(upper.iter().all(|point| point.value == 2.0));
    assert_eq!(snapshot.get(SeriesKey::TrailingStop).map(SeriesData::len), Some(2));
}
