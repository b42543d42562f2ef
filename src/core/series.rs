use serde::{Deserialize, Serialize};

use crate::render::Color;

/// Closed set of named series a session owns a handle for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKey {
    Candles,
    Volume,
    TrailingStop,
    VwapHigh,
    VwapLow,
    Rsi14,
    Rsi5,
    RsiOverbought,
    RsiOversold,
    RsiZero,
    Bvc,
    BvcZero,
    YzVolatility,
    KalmanZscore,
    KalmanUpper,
    KalmanLower,
}

impl SeriesKey {
    pub const ALL: [SeriesKey; 16] = [
        SeriesKey::Candles,
        SeriesKey::Volume,
        SeriesKey::TrailingStop,
        SeriesKey::VwapHigh,
        SeriesKey::VwapLow,
        SeriesKey::Rsi14,
        SeriesKey::Rsi5,
        SeriesKey::RsiOverbought,
        SeriesKey::RsiOversold,
        SeriesKey::RsiZero,
        SeriesKey::Bvc,
        SeriesKey::BvcZero,
        SeriesKey::YzVolatility,
        SeriesKey::KalmanZscore,
        SeriesKey::KalmanUpper,
        SeriesKey::KalmanLower,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            SeriesKey::Candles => "candles",
            SeriesKey::Volume => "volume",
            SeriesKey::TrailingStop => "trailing_stop",
            SeriesKey::VwapHigh => "vwap_high",
            SeriesKey::VwapLow => "vwap_low",
            SeriesKey::Rsi14 => "rsi_14",
            SeriesKey::Rsi5 => "rsi_5",
            SeriesKey::RsiOverbought => "rsi_overbought",
            SeriesKey::RsiOversold => "rsi_oversold",
            SeriesKey::RsiZero => "rsi_zero",
            SeriesKey::Bvc => "bvc",
            SeriesKey::BvcZero => "bvc_zero",
            SeriesKey::YzVolatility => "yz_volatility",
            SeriesKey::KalmanZscore => "kalman_zscore",
            SeriesKey::KalmanUpper => "kalman_upper",
            SeriesKey::KalmanLower => "kalman_lower",
        }
    }

    /// Looks a key up by its `name()`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesKind {
    Candlestick,
    Line,
    Histogram,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandlePoint {
    pub time: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinePoint {
    pub time: f64,
    pub value: f64,
}

impl LinePoint {
    #[must_use]
    pub const fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramPoint {
    pub time: f64,
    pub value: f64,
    pub color: Color,
}

/// Point payload for exactly one series kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SeriesData {
    Candlestick(Vec<CandlePoint>),
    Line(Vec<LinePoint>),
    Histogram(Vec<HistogramPoint>),
}

impl SeriesData {
    #[must_use]
    pub fn empty(kind: SeriesKind) -> Self {
        match kind {
            SeriesKind::Candlestick => SeriesData::Candlestick(Vec::new()),
            SeriesKind::Line => SeriesData::Line(Vec::new()),
            SeriesKind::Histogram => SeriesData::Histogram(Vec::new()),
        }
    }

    #[must_use]
    pub fn kind(&self) -> SeriesKind {
        match self {
            SeriesData::Candlestick(_) => SeriesKind::Candlestick,
            SeriesData::Line(_) => SeriesKind::Line,
            SeriesData::Histogram(_) => SeriesKind::Histogram,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            SeriesData::Candlestick(points) => points.len(),
            SeriesData::Line(points) => points.len(),
            SeriesData::Histogram(points) => points.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Time of every point, in payload order.
    #[must_use]
    pub fn times(&self) -> Vec<f64> {
        match self {
            SeriesData::Candlestick(points) => points.iter().map(|p| p.time).collect(),
            SeriesData::Line(points) => points.iter().map(|p| p.time).collect(),
            SeriesData::Histogram(points) => points.iter().map(|p| p.time).collect(),
        }
    }

    #[must_use]
    pub fn as_line(&self) -> Option<&[LinePoint]> {
        match self {
            SeriesData::Line(points) => Some(points),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_candles(&self) -> Option<&[CandlePoint]> {
        match self {
            SeriesData::Candlestick(points) => Some(points),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_histogram(&self) -> Option<&[HistogramPoint]> {
        match self {
            SeriesData::Histogram(points) => Some(points),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_key_names_round_trip() {
        for key in SeriesKey::ALL {
            assert_eq!(SeriesKey::from_name(key.name()), Some(key));
        }
        assert_eq!(SeriesKey::from_name("macd"), None);
    }

    #[test]
    fn empty_payload_matches_requested_kind() {
        for kind in [
            SeriesKind::Candlestick,
            SeriesKind::Line,
            SeriesKind::Histogram,
        ] {
            let data = SeriesData::empty(kind);
            assert_eq!(data.kind(), kind);
            assert!(data.is_empty());
        }
    }
}
