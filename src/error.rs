use thiserror::Error;

use crate::core::SeriesKind;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("series `{series}` expects {expected:?} data, got {actual:?}")]
    SeriesKindMismatch {
        series: String,
        expected: SeriesKind,
        actual: SeriesKind,
    },

    #[error("unknown series: {0}")]
    UnknownSeries(String),

    #[error("chart session is not ready (state: {state})")]
    SessionNotReady { state: &'static str },

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("payload decoding failed: {0}")]
    Json(#[from] serde_json::Error),
}
