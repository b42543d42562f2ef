pub mod pane;
pub mod primitives;
pub mod series;
pub mod time_scale;
pub mod timeseries;
pub mod types;

pub use pane::{
    LineStyle, PaneDescriptor, PaneId, PaneLayout, PaneRole, PriceScaleId, SeriesSource,
    SeriesSpec, SeriesStyle,
};
pub use series::{CandlePoint, HistogramPoint, LinePoint, SeriesData, SeriesKey, SeriesKind};
pub use time_scale::TimeScale;
pub use timeseries::{
    BarFrame, SeriesSnapshot, build_series_snapshot, candle_points, constant_line,
    indicator_points, indicator_series_points, volume_points,
};
pub use types::{Bar, IndicatorPoint, ReportEvent, SurfaceLayout, Viewport};
