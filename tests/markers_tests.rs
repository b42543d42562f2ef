use chart_session::core::ReportEvent;
use chart_session::extensions::{MarkerShape, REPORT_MARKER_GLYPH, match_report_markers};
use chart_session::render::Color;

fn marker_color() -> Color {
    Color::from_hex(0x2196F3)
}

#[test]
fn dateless_reports_are_dropped_silently() {
    let reports = vec![
        ReportEvent::new(1, "Dated", "Broker A").with_published_date("2024-05-02"),
        ReportEvent::new(2, "Undated", "Broker A"),
        ReportEvent::new(3, "Also dated", "Broker C").with_published_date("2024-05-03"),
    ];
    let markers = match_report_markers(&reports, marker_color());
    let ids: Vec<&str> = markers.iter().map(|marker| marker.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "3"]);
}

#[test]
fn markers_sit_at_the_publication_instant() {
    let reports = vec![
        ReportEvent::new(4, "Intraday note", "Desk").with_published_date("2024-05-02T10:30:00Z"),
    ];
    let markers = match_report_markers(&reports, marker_color());
    assert_eq!(markers[0].time, 1_714_645_800.0);
    assert_eq!(markers[0].text, "Intraday note\nDesk\n02/05/2024");
    assert_eq!(markers[0].glyph, REPORT_MARKER_GLYPH);
    assert_eq!(markers[0].shape, MarkerShape::Circle);
    assert_eq!(markers[0].color, marker_color());
}

#[test]
fn same_day_reports_are_not_merged() {
    let reports = vec![
        ReportEvent::new(5, "Morning", "A").with_published_date("2024-06-10"),
        ReportEvent::new(6, "Evening", "B").with_published_date("2024-06-10"),
    ];
    let markers = match_report_markers(&reports, marker_color());
    assert_eq!(markers.len(), 2);
    assert_eq!(markers[0].time, markers[1].time);
}

#[test]
fn unparsable_dates_degrade_to_omission() {
    let reports = vec![
        ReportEvent::new(7, "Bad", "A").with_published_date("31/12/2024"),
        ReportEvent::new(8, "Empty", "A").with_published_date(""),
        ReportEvent::new(9, "Good", "A").with_published_date("2024-12-31"),
    ];
    let markers = match_report_markers(&reports, marker_color());
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].id, "9");
}

#[test]
fn reports_decode_from_backend_list() {
    let json = r#"{"reports": [
        {"id": 11, "mack": "HPG", "tenbaocao": "Steel cycle", "url": "", "nguon": "Broker D", "ngaykn": "2024-03-01", "rsnganh": "Materials"},
        {"id": 12, "mack": "HPG", "tenbaocao": "No date yet", "url": "", "nguon": "Broker D", "ngaykn": null, "rsnganh": null}
    ]}"#;
    let list = chart_session::api::ReportListResponse::from_json(json).expect("decode");
    assert_eq!(list.reports.len(), 2);
    assert_eq!(list.reports[0].sector_tag.as_deref(), Some("Materials"));
    let markers = match_report_markers(&list.reports, marker_color());
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].text, "Steel cycle\nBroker D\n01/03/2024");
}
