use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::primitives::parse_timestamp;
use crate::error::{ChartError, ChartResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Returns `true` when a plot-space point lies inside the viewport (edges inclusive).
    #[must_use]
    pub fn contains(self, x: f64, y: f64) -> bool {
        x >= 0.0 && x <= f64::from(self.width) && y >= 0.0 && y <= f64::from(self.height)
    }
}

/// Geometry the surface reports back to the session.
///
/// `plot` is the time-scale plot area; `price_scale_width_px` is the width of
/// the left price axis that precedes it horizontally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceLayout {
    pub plot: Viewport,
    pub price_scale_width_px: f64,
}

impl SurfaceLayout {
    #[must_use]
    pub fn new(plot: Viewport, price_scale_width_px: f64) -> Self {
        Self {
            plot,
            price_scale_width_px,
        }
    }
}

/// One OHLCV observation. `time` is unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Builds a bar from raw floating values; every field must be finite.
    pub fn new(
        time: f64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> ChartResult<Self> {
        if [time, open, high, low, close, volume]
            .iter()
            .any(|value| !value.is_finite())
        {
            return Err(ChartError::InvalidData(
                "bar values must be finite".to_owned(),
            ));
        }

        Ok(Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    /// Returns `true` when close price is greater than or equal to open price.
    #[must_use]
    pub fn is_bullish(self) -> bool {
        self.close >= self.open
    }
}

/// Indicator sample aligned by position to a bar; `value` is absent where the
/// indicator has no signal (e.g. inside its lookback window).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub time: f64,
    pub value: Option<f64>,
}

/// Published research report correlated to the price timeline by date.
///
/// Field names on the wire follow the report backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEvent {
    pub id: i64,
    #[serde(rename = "tenbaocao")]
    pub title: String,
    #[serde(rename = "nguon")]
    pub source: String,
    #[serde(rename = "ngaykn", default)]
    pub published_date: Option<String>,
    #[serde(rename = "rsnganh", default)]
    pub sector_tag: Option<String>,
    #[serde(rename = "mack", default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub url: String,
}

impl ReportEvent {
    #[must_use]
    pub fn new(id: i64, title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            source: source.into(),
            published_date: None,
            sector_tag: None,
            symbol: None,
            url: String::new(),
        }
    }

    #[must_use]
    pub fn with_published_date(mut self, date: impl Into<String>) -> Self {
        self.published_date = Some(date.into());
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Parsed publication instant; `None` when absent or unparsable.
    #[must_use]
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_date.as_deref().and_then(parse_timestamp)
    }

    #[must_use]
    pub fn published_day(&self) -> Option<NaiveDate> {
        self.published_at().map(|time| time.date_naive())
    }
}
