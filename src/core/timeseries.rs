//! Normalization of a bars/indicators payload into per-series point sequences.
//!
//! Everything here is pure. Malformed indicator samples degrade to omission;
//! only the price series itself is validated strictly.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::{
    Bar, CandlePoint, HistogramPoint, IndicatorPoint, LinePoint, PaneLayout, SeriesData,
    SeriesKey, SeriesKind, SeriesSource,
};
use crate::error::{ChartError, ChartResult};
use crate::render::Color;

/// Price series plus the raw indicator arrays that accompany it.
///
/// Indicator arrays are index-aligned to `bars`; a missing key is a valid
/// "no data" state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BarFrame {
    bars: Vec<Bar>,
    indicators: IndexMap<String, Vec<Option<f64>>>,
}

impl BarFrame {
    /// Wraps a price series, enforcing strictly ascending bar times.
    pub fn new(bars: Vec<Bar>) -> ChartResult<Self> {
        if let Some(pair) = bars.windows(2).find(|pair| pair[1].time <= pair[0].time) {
            return Err(ChartError::InvalidData(format!(
                "bar times must be strictly ascending ({} then {})",
                pair[0].time, pair[1].time
            )));
        }
        Ok(Self {
            bars,
            indicators: IndexMap::new(),
        })
    }

    #[must_use]
    pub fn with_indicator(mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        self.indicators.insert(name.into(), values);
        self
    }

    pub fn insert_indicator(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) {
        self.indicators.insert(name.into(), values);
    }

    #[must_use]
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    #[must_use]
    pub fn times(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.time).collect()
    }

    /// Raw values for `name`; empty when the indicator is absent.
    #[must_use]
    pub fn indicator(&self, name: &str) -> &[Option<f64>] {
        self.indicators
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Position-aligned view of one indicator over the bar domain.
    #[must_use]
    pub fn indicator_series(&self, name: &str) -> Vec<IndicatorPoint> {
        let values = self.indicator(name);
        self.bars
            .iter()
            .enumerate()
            .map(|(index, bar)| IndicatorPoint {
                time: bar.time,
                value: values.get(index).copied().flatten(),
            })
            .collect()
    }

    #[must_use]
    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }
}

/// One candle per bar, same order.
#[must_use]
pub fn candle_points(bars: &[Bar]) -> Vec<CandlePoint> {
    bars.iter()
        .map(|bar| CandlePoint {
            time: bar.time,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
        })
        .collect()
}

/// One volume column per bar, colored by the bar's own open/close direction.
#[must_use]
pub fn volume_points(bars: &[Bar], up_color: Color, down_color: Color) -> Vec<HistogramPoint> {
    bars.iter()
        .map(|bar| HistogramPoint {
            time: bar.time,
            value: bar.volume,
            color: if bar.is_bullish() { up_color } else { down_color },
        })
        .collect()
}

/// Keeps positions whose timestamp and value are both finite numbers.
///
/// Order is preserved and duplicates pass through untouched. Positions past
/// the end of either slice count as absent.
#[must_use]
pub fn indicator_points(times: &[f64], values: &[Option<f64>]) -> Vec<LinePoint> {
    let series: Vec<IndicatorPoint> = times
        .iter()
        .zip(values)
        .map(|(&time, &value)| IndicatorPoint { time, value })
        .collect();
    indicator_series_points(&series)
}

/// Drops gaps from a position-aligned indicator series.
#[must_use]
pub fn indicator_series_points(series: &[IndicatorPoint]) -> Vec<LinePoint> {
    series
        .iter()
        .filter_map(|point| match point.value {
            Some(value) if value.is_finite() && point.time.is_finite() => {
                Some(LinePoint::new(point.time, value))
            }
            _ => None,
        })
        .collect()
}

/// Flat line at `level` over exactly the timestamps of `reference`.
#[must_use]
pub fn constant_line(reference: &[LinePoint], level: f64) -> Vec<LinePoint> {
    reference
        .iter()
        .map(|point| LinePoint::new(point.time, level))
        .collect()
}

/// Named point payloads ready to be pushed into series handles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSnapshot {
    series: IndexMap<SeriesKey, SeriesData>,
}

impl SeriesSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: SeriesKey, data: SeriesData) {
        self.series.insert(key, data);
    }

    #[must_use]
    pub fn get(&self, key: SeriesKey) -> Option<&SeriesData> {
        self.series.get(&key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SeriesKey, &SeriesData)> + '_ {
        self.series.iter().map(|(key, data)| (*key, data))
    }

    /// Time of the last candle, if the snapshot carries any.
    #[must_use]
    pub fn last_bar_time(&self) -> Option<f64> {
        self.get(SeriesKey::Candles)
            .and_then(SeriesData::as_candles)
            .and_then(|candles| candles.last())
            .map(|candle| candle.time)
    }
}

/// Runs every adapter the layout asks for over `frame`.
///
/// Guides are resolved against the already-filtered points of their reference
/// series, so their domain always matches it. A spec whose kind cannot be fed
/// from its source is rejected with the same error [`PaneLayout::new`] raises.
pub fn build_series_snapshot(
    frame: &BarFrame,
    layout: &PaneLayout,
    up_color: Color,
    down_color: Color,
) -> ChartResult<SeriesSnapshot> {
    let mut snapshot = SeriesSnapshot::new();

    for spec in layout.series() {
        let data = match (spec.kind, spec.source) {
            (SeriesKind::Candlestick, SeriesSource::Bars) => {
                SeriesData::Candlestick(candle_points(frame.bars()))
            }
            (SeriesKind::Histogram, SeriesSource::Bars) => {
                SeriesData::Histogram(volume_points(frame.bars(), up_color, down_color))
            }
            (SeriesKind::Line, SeriesSource::Indicator(name)) => {
                SeriesData::Line(indicator_series_points(&frame.indicator_series(name)))
            }
            (SeriesKind::Line, SeriesSource::Guide { reference, level }) => {
                let reference_points = snapshot
                    .get(reference)
                    .and_then(SeriesData::as_line)
                    .unwrap_or(&[]);
                SeriesData::Line(constant_line(reference_points, level))
            }
            _ => return Err(spec.incompatible_source()),
        };
        snapshot.insert(spec.key, data);
    }

    Ok(snapshot)
}
