//! chart-session: headless multi-pane chart session engine.
//!
//! The crate turns bar/indicator payloads and dated research reports into
//! per-series point data, owns the lifecycle of a drawing surface through the
//! [`render::ChartSurface`] trait, and resolves legend/tooltip content for
//! pointer hover.

pub mod api;
pub mod core;
pub mod error;
pub mod extensions;
pub mod interaction;
pub mod render;
pub mod telemetry;

pub use api::{
    ChartDataSource, ChartHostView, ChartSession, ChartSessionConfig, LoadOutcome,
    LoadRequestConfig,
};
pub use error::{ChartError, ChartResult};
