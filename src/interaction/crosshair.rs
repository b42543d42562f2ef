use chrono::NaiveDate;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::trace;

use crate::core::primitives::{SECONDS_PER_DAY, format_day_month_year, format_price, utc_day};
use crate::core::{Bar, ReportEvent, SurfaceLayout, TimeScale};
use crate::render::Color;

/// Which report wins when several fall inside the hover tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TooltipMatchPolicy {
    #[default]
    FirstInInputOrder,
    /// Smallest absolute day difference; ties keep input order.
    NearestByDays,
}

/// Pointer position in plot coordinates, or `None` once the pointer leaves
/// the surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerMoveEvent {
    pub point: Option<(f64, f64)>,
}

impl PointerMoveEvent {
    #[must_use]
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            point: Some((x, y)),
        }
    }

    #[must_use]
    pub fn left() -> Self {
        Self { point: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoverConfig {
    pub tolerance_days: i64,
    pub match_policy: TooltipMatchPolicy,
    pub tooltip_width_px: f64,
    pub legend_width_px: f64,
    pub up_color: Color,
    pub down_color: Color,
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            tolerance_days: 3,
            match_policy: TooltipMatchPolicy::FirstInInputOrder,
            tooltip_width_px: 200.0,
            legend_width_px: 400.0,
            up_color: Color::from_hex(0x4CAF50),
            down_color: Color::from_hex(0xF44336),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendField {
    pub label: &'static str,
    pub value: f64,
    pub text: String,
}

/// Legend content for the hovered bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub symbol: String,
    pub bar_index: usize,
    pub time: f64,
    pub date_text: String,
    /// Open, high, low, close in that order.
    pub fields: SmallVec<[LegendField; 4]>,
    pub change_pct: f64,
    pub change_text: String,
    /// Applies to the OHLC values and the change text alike.
    pub color: Color,
    /// Fixed box width; the legend is pinned to the top-left of the plot.
    pub width_px: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tooltip {
    pub report_id: i64,
    pub title: String,
    pub source: String,
    pub date_text: String,
    pub left_px: f64,
    pub top_px: f64,
}

/// Outcome of one pointer-move resolution. Both halves `None` means "clear".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HoverDetail {
    pub legend: Option<Legend>,
    pub tooltip: Option<Tooltip>,
}

impl HoverDetail {
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.legend.is_none() && self.tooltip.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct DatedReport {
    id: i64,
    title: String,
    source: String,
    date_text: String,
    day: NaiveDate,
}

/// Data a resolver answers hover queries against: the price series and the
/// dated subset of the report set, both as of the last successful attach.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrosshairSnapshot {
    symbol: String,
    bars: Vec<Bar>,
    reports: Vec<DatedReport>,
}

impl CrosshairSnapshot {
    /// Reports without a parsable date are left out; they can never match.
    #[must_use]
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>, reports: &[ReportEvent]) -> Self {
        let reports = reports
            .iter()
            .filter_map(|report| {
                let published = report.published_at()?;
                let day = published.date_naive();
                Some(DatedReport {
                    id: report.id,
                    title: report.title.clone(),
                    source: report.source.clone(),
                    date_text: day.format("%d/%m/%Y").to_string(),
                    day,
                })
            })
            .collect();
        Self {
            symbol: symbol.into(),
            bars,
            reports,
        }
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[must_use]
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    #[must_use]
    pub fn dated_report_count(&self) -> usize {
        self.reports.len()
    }
}

/// Per-event legend/tooltip computation.
///
/// Report matching is a linear scan over every dated report on each event.
/// That is fine for per-symbol report lists in the tens to low hundreds; a
/// day-indexed lookup would be needed beyond that.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrosshairResolver {
    config: HoverConfig,
    snapshot: CrosshairSnapshot,
}

impl CrosshairResolver {
    #[must_use]
    pub fn new(config: HoverConfig) -> Self {
        Self {
            config,
            snapshot: CrosshairSnapshot::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> HoverConfig {
        self.config
    }

    #[must_use]
    pub fn snapshot(&self) -> &CrosshairSnapshot {
        &self.snapshot
    }

    pub fn set_snapshot(&mut self, snapshot: CrosshairSnapshot) {
        self.snapshot = snapshot;
    }

    /// Resolves legend and tooltip content for one pointer-move event.
    ///
    /// Never fails: anything that cannot be resolved clears the output.
    #[must_use]
    pub fn resolve(
        &self,
        event: &PointerMoveEvent,
        time_scale: TimeScale,
        layout: SurfaceLayout,
    ) -> HoverDetail {
        let Some((x, y)) = event.point else {
            return HoverDetail::default();
        };
        if !x.is_finite() || !y.is_finite() || x < 0.0 || x > f64::from(layout.plot.width) {
            return HoverDetail::default();
        }
        let Ok(time) = time_scale.pixel_to_time(x, layout.plot) else {
            return HoverDetail::default();
        };
        let Some(index) = hovered_bar_index(&self.snapshot.bars, time) else {
            return HoverDetail::default();
        };

        let bar = self.snapshot.bars[index];
        let legend = self.legend_for(index, bar);
        let tooltip = if layout.plot.contains(x, y) {
            self.tooltip_for(bar, x, layout)
        } else {
            None
        };
        trace!(
            bar_index = index,
            tooltip = tooltip.as_ref().map(|tooltip| tooltip.report_id),
            "resolved hover"
        );
        HoverDetail {
            legend: Some(legend),
            tooltip,
        }
    }

    fn legend_for(&self, index: usize, bar: Bar) -> Legend {
        let previous_close = previous_close(&self.snapshot.bars, index);
        let change_pct = percentage_change(bar.close, previous_close);
        let color = if bar.close >= previous_close {
            self.config.up_color
        } else {
            self.config.down_color
        };
        let fields = [
            ("O", bar.open),
            ("H", bar.high),
            ("L", bar.low),
            ("C", bar.close),
        ]
        .into_iter()
        .map(|(label, value)| LegendField {
            label,
            value,
            text: format_price(value),
        })
        .collect();

        Legend {
            symbol: self.snapshot.symbol.clone(),
            bar_index: index,
            time: bar.time,
            date_text: format_day_month_year(bar.time).unwrap_or_default(),
            fields,
            change_pct,
            change_text: format_change(change_pct),
            color,
            width_px: self.config.legend_width_px,
        }
    }

    fn tooltip_for(&self, bar: Bar, x: f64, layout: SurfaceLayout) -> Option<Tooltip> {
        let hovered_day = utc_day(bar.time)?;
        let report = self.matching_report(hovered_day)?;
        Some(Tooltip {
            report_id: report.id,
            title: report.title.clone(),
            source: report.source.clone(),
            date_text: report.date_text.clone(),
            left_px: tooltip_left(x, layout, self.config.tooltip_width_px),
            top_px: 0.0,
        })
    }

    fn matching_report(&self, hovered_day: NaiveDate) -> Option<&DatedReport> {
        let tolerance = self.config.tolerance_days;
        let mut candidates = self.snapshot.reports.iter().filter_map(|report| {
            let distance = (report.day - hovered_day).num_days();
            (-tolerance..=tolerance)
                .contains(&distance)
                .then_some((distance.abs(), report))
        });
        match self.config.match_policy {
            TooltipMatchPolicy::FirstInInputOrder => candidates.next().map(|(_, report)| report),
            TooltipMatchPolicy::NearestByDays => candidates
                .min_by_key(|(distance, _)| *distance)
                .map(|(_, report)| report),
        }
    }
}

/// Close of the preceding bar, or the bar's own open for the first bar.
#[must_use]
pub fn previous_close(bars: &[Bar], index: usize) -> f64 {
    match index.checked_sub(1).and_then(|previous| bars.get(previous)) {
        Some(previous) => previous.close,
        None => bars.get(index).map_or(f64::NAN, |bar| bar.open),
    }
}

#[must_use]
pub fn percentage_change(close: f64, previous_close: f64) -> f64 {
    (close - previous_close) / previous_close * 100.0
}

/// Signed, two-decimal percentage text. A change that rounds to zero is shown
/// as `+0.00%`; a non-finite change as `n/a`.
#[must_use]
pub fn format_change(change_pct: f64) -> String {
    if !change_pct.is_finite() {
        return "n/a".to_owned();
    }
    let shown = if (change_pct * 100.0).round() == 0.0 {
        0.0
    } else {
        change_pct
    };
    format!("{shown:+.2}%")
}

/// Horizontal tooltip position, centred on the pointer and clamped into the
/// plot area to the right of the price scale.
#[must_use]
pub fn tooltip_left(x: f64, layout: SurfaceLayout, tooltip_width_px: f64) -> f64 {
    let scale_width = layout.price_scale_width_px;
    let plot_width = f64::from(layout.plot.width);
    (x + scale_width - tooltip_width_px / 2.0)
        .min(scale_width + plot_width - tooltip_width_px)
        .max(scale_width)
}

/// Nearest bar to `time`, accepted within half a bar spacing beyond either end
/// of the series.
fn hovered_bar_index(bars: &[Bar], time: f64) -> Option<usize> {
    let first = bars.first()?;
    let last = bars.last()?;
    let (lead, trail) = edge_half_gaps(bars);
    if time < first.time - lead || time > last.time + trail {
        return None;
    }

    let upper = bars.partition_point(|bar| bar.time < time);
    let candidates: SmallVec<[usize; 2]> = [upper.checked_sub(1), Some(upper)]
        .into_iter()
        .flatten()
        .filter(|&index| index < bars.len())
        .collect();
    candidates
        .into_iter()
        .min_by_key(|&index| OrderedFloat((bars[index].time - time).abs()))
}

fn edge_half_gaps(bars: &[Bar]) -> (f64, f64) {
    let fallback = SECONDS_PER_DAY / 2.0;
    let lead = match bars {
        [first, second, ..] => (second.time - first.time) / 2.0,
        _ => fallback,
    };
    let trail = match bars {
        [.., before_last, last] => (last.time - before_last.time) / 2.0,
        _ => fallback,
    };
    (lead, trail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daily_bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(index, close)| {
                let time = 1_704_067_200.0 + index as f64 * SECONDS_PER_DAY;
                Bar::new(time, close - 1.0, close + 2.0, close - 2.0, *close, 10.0)
                    .expect("valid bar")
            })
            .collect()
    }

    #[test]
    fn nearest_bar_respects_half_spacing_at_edges() {
        let bars = daily_bars(&[10.0, 11.0, 12.0]);
        let start = bars[0].time;
        assert_eq!(hovered_bar_index(&bars, start - 40_000.0), Some(0));
        assert_eq!(hovered_bar_index(&bars, start - 50_000.0), None);
        assert_eq!(hovered_bar_index(&bars, start + 50_000.0), Some(1));
        assert_eq!(hovered_bar_index(&bars, bars[2].time + 43_200.0), Some(2));
        assert_eq!(hovered_bar_index(&[], start), None);
    }

    #[test]
    fn change_text_is_signed_and_normalizes_zero() {
        assert_eq!(format_change(2.5), "+2.50%");
        assert_eq!(format_change(-1.234), "-1.23%");
        assert_eq!(format_change(-0.001), "+0.00%");
        assert_eq!(format_change(f64::INFINITY), "n/a");
    }

    #[test]
    fn tooltip_left_clamps_into_plot() {
        let layout = SurfaceLayout::new(crate::core::Viewport::new(1000, 500), 60.0);
        assert_eq!(tooltip_left(500.0, layout, 200.0), 460.0);
        assert_eq!(tooltip_left(0.0, layout, 200.0), 60.0);
        assert_eq!(tooltip_left(1000.0, layout, 200.0), 860.0);
    }

    #[test]
    fn first_bar_uses_own_open_as_reference() {
        let bars = daily_bars(&[10.0, 12.0]);
        assert_eq!(previous_close(&bars, 0), 9.0);
        assert_eq!(previous_close(&bars, 1), 10.0);
    }
}
