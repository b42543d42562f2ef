use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{ChartError, ChartResult};
use crate::interaction::{HoverConfig, TooltipMatchPolicy};
use crate::render::Color;

use super::data_source::{IndicatorRequest, TimeseriesRequest};

/// What the forced visible window is anchored to after each attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibleWindowAnchor {
    /// Ends at wall-clock "now", even if the last bar is older.
    #[default]
    WallClock,
    /// Ends at the last bar's time; falls back to wall-clock when there are no bars.
    LastBar,
}

/// Session bootstrap configuration.
///
/// Serializable so hosts can ship chart setup alongside their own settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartSessionConfig {
    #[serde(default = "default_visible_window_days")]
    pub visible_window_days: u32,
    #[serde(default)]
    pub visible_window_anchor: VisibleWindowAnchor,
    #[serde(default = "default_tooltip_tolerance_days")]
    pub tooltip_tolerance_days: i64,
    #[serde(default)]
    pub tooltip_match_policy: TooltipMatchPolicy,
    #[serde(default = "default_tooltip_width_px")]
    pub tooltip_width_px: f64,
    #[serde(default = "default_legend_width_px")]
    pub legend_width_px: f64,
    #[serde(default = "default_up_color")]
    pub up_color: Color,
    #[serde(default = "default_down_color")]
    pub down_color: Color,
    #[serde(default = "default_marker_color")]
    pub marker_color: Color,
}

impl Default for ChartSessionConfig {
    fn default() -> Self {
        Self {
            visible_window_days: default_visible_window_days(),
            visible_window_anchor: VisibleWindowAnchor::default(),
            tooltip_tolerance_days: default_tooltip_tolerance_days(),
            tooltip_match_policy: TooltipMatchPolicy::default(),
            tooltip_width_px: default_tooltip_width_px(),
            legend_width_px: default_legend_width_px(),
            up_color: default_up_color(),
            down_color: default_down_color(),
            marker_color: default_marker_color(),
        }
    }
}

impl ChartSessionConfig {
    pub fn from_json(json: &str) -> ChartResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_visible_window_anchor(mut self, anchor: VisibleWindowAnchor) -> Self {
        self.visible_window_anchor = anchor;
        self
    }

    #[must_use]
    pub fn with_tooltip_match_policy(mut self, policy: TooltipMatchPolicy) -> Self {
        self.tooltip_match_policy = policy;
        self
    }

    #[must_use]
    pub fn with_tooltip_tolerance_days(mut self, days: i64) -> Self {
        self.tooltip_tolerance_days = days;
        self
    }

    /// Subset of the configuration the crosshair resolver reads.
    #[must_use]
    pub fn hover_config(&self) -> HoverConfig {
        HoverConfig {
            tolerance_days: self.tooltip_tolerance_days,
            match_policy: self.tooltip_match_policy,
            tooltip_width_px: self.tooltip_width_px,
            legend_width_px: self.legend_width_px,
            up_color: self.up_color,
            down_color: self.down_color,
        }
    }

    pub fn validate(&self) -> ChartResult<()> {
        if self.visible_window_days == 0 {
            return Err(ChartError::InvalidData(
                "visible window must span at least one day".to_owned(),
            ));
        }
        if self.tooltip_tolerance_days < 0 {
            return Err(ChartError::InvalidData(
                "tooltip tolerance must be >= 0 days".to_owned(),
            ));
        }
        for (value, name) in [
            (self.tooltip_width_px, "tooltip_width_px"),
            (self.legend_width_px, "legend_width_px"),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ChartError::InvalidData(format!(
                    "`{name}` must be finite and > 0"
                )));
            }
        }
        self.up_color.validate()?;
        self.down_color.validate()?;
        self.marker_color.validate()
    }
}

/// Shape of the bars/indicators request issued on every symbol change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRequestConfig {
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default = "default_history_days")]
    pub history_days: u32,
    #[serde(default = "default_indicator_requests")]
    pub indicators: Vec<IndicatorRequest>,
}

impl Default for LoadRequestConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            history_days: default_history_days(),
            indicators: default_indicator_requests(),
        }
    }
}

impl LoadRequestConfig {
    pub fn from_json(json: &str) -> ChartResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Request covering `history_days` up to the calendar day of `now`.
    #[must_use]
    pub fn request_at(&self, now: DateTime<Utc>) -> TimeseriesRequest {
        let start = now - Duration::days(i64::from(self.history_days));
        TimeseriesRequest {
            interval: self.interval.clone(),
            start_date: Some(start.format("%Y-%m-%d").to_string()),
            end_date: Some(now.format("%Y-%m-%d").to_string()),
            indicators: self.indicators.clone(),
        }
    }
}

fn default_visible_window_days() -> u32 {
    365
}

fn default_tooltip_tolerance_days() -> i64 {
    3
}

fn default_tooltip_width_px() -> f64 {
    200.0
}

fn default_legend_width_px() -> f64 {
    400.0
}

fn default_up_color() -> Color {
    Color::from_hex(0x4CAF50)
}

fn default_down_color() -> Color {
    Color::from_hex(0xF44336)
}

fn default_marker_color() -> Color {
    Color::from_hex(0x2196F3)
}

fn default_interval() -> String {
    "1d".to_owned()
}

fn default_history_days() -> u32 {
    360 * 5
}

fn default_indicator_requests() -> Vec<IndicatorRequest> {
    fn params(pairs: &[(&str, serde_json::Value)]) -> IndexMap<String, serde_json::Value> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), value.clone()))
            .collect()
    }

    vec![
        IndicatorRequest::new("rsi").with_params(params(&[("period", json!(14))])),
        IndicatorRequest::new("atr_trailing"),
        IndicatorRequest::new("vwap").with_params(params(&[("window", json!(200))])),
        IndicatorRequest::new("bvc")
            .with_params(params(&[("window", json!(20)), ("kappa", json!(0.1))])),
        IndicatorRequest::new("kalman_zscore").with_params(params(&[("window", json!(20))])),
        IndicatorRequest::new("yz_volatility")
            .with_params(params(&[("window", json!(30)), ("periods", json!(252))])),
    ]
}
