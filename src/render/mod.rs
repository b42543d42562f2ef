mod headless_surface;
mod primitives;

pub use headless_surface::{HeadlessSurface, RecordedSeries};
pub use primitives::Color;

use serde::{Deserialize, Serialize};

use crate::core::{PaneDescriptor, SeriesData, SeriesSpec, SurfaceLayout};
use crate::error::ChartResult;
use crate::extensions::Marker;

/// Backend-assigned identity of one series on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceSeriesId(pub u32);

/// Contract implemented by any drawing backend a session can own.
///
/// The session is the only caller; it drives construction, data replacement,
/// and teardown in that order.
pub trait ChartSurface {
    /// Current plot geometry, used for hover clamping.
    fn layout(&self) -> SurfaceLayout;

    fn add_pane(&mut self, pane: &PaneDescriptor) -> ChartResult<()>;

    fn add_series(&mut self, spec: &SeriesSpec) -> ChartResult<SurfaceSeriesId>;

    /// Replaces the full point payload of a series.
    fn set_series_data(&mut self, series: SurfaceSeriesId, data: &SeriesData) -> ChartResult<()>;

    /// Replaces the full marker set attached to a series.
    fn set_series_markers(&mut self, series: SurfaceSeriesId, markers: &[Marker])
    -> ChartResult<()>;

    fn set_visible_range(&mut self, start: f64, end: f64) -> ChartResult<()>;

    /// Drops every pane and series; the surface is unusable afterwards.
    fn release(&mut self);
}
