use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::ReportEvent;
use crate::core::primitives::{datetime_to_unix_seconds, format_day_month_year};
use crate::render::Color;

pub const REPORT_MARKER_GLYPH: &str = "📄";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerPosition {
    AboveBar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerShape {
    Circle,
}

/// Point annotation on the price pane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: String,
    /// Unix seconds; not snapped to any bar.
    pub time: f64,
    pub position: MarkerPosition,
    pub shape: MarkerShape,
    pub color: Color,
    pub glyph: String,
    /// Multi-line display text.
    pub text: String,
}

/// Maps dated report events onto price-pane markers.
///
/// One marker per event with a usable `published_date`, in input order, placed
/// at that exact instant. Events without a date are skipped silently; events
/// whose date does not parse are skipped with a warning. Same-day reports are
/// not merged.
#[must_use]
pub fn match_report_markers(reports: &[ReportEvent], color: Color) -> Vec<Marker> {
    reports
        .iter()
        .filter_map(|report| {
            let raw = report.published_date.as_deref()?;
            let Some(published) = report.published_at() else {
                warn!(report_id = report.id, date = raw, "dropping report with unparsable date");
                return None;
            };
            let time = datetime_to_unix_seconds(published);
            let date_text = format_day_month_year(time).unwrap_or_else(|| raw.to_owned());
            Some(Marker {
                id: report.id.to_string(),
                time,
                position: MarkerPosition::AboveBar,
                shape: MarkerShape::Circle,
                color,
                glyph: REPORT_MARKER_GLYPH.to_owned(),
                text: format!("{}\n{}\n{}", report.title, report.source, date_text),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_text_carries_title_source_and_date() {
        let reports = [ReportEvent::new(9, "Sector outlook", "Broker B")
            .with_published_date("2024-02-29")];
        let markers = match_report_markers(&reports, Color::from_hex(0x2196F3));
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].id, "9");
        assert_eq!(markers[0].text, "Sector outlook\nBroker B\n29/02/2024");
        assert_eq!(markers[0].position, MarkerPosition::AboveBar);
    }

    #[test]
    fn report_markers_serialize_with_their_only_placement() {
        let reports = [ReportEvent::new(3, "Note", "Desk").with_published_date("2024-02-01")];
        let markers = match_report_markers(&reports, Color::from_hex(0x2196F3));
        let json = serde_json::to_value(&markers[0]).expect("encode marker");
        assert_eq!(json["position"], "AboveBar");
        assert_eq!(json["shape"], "Circle");
    }
}
