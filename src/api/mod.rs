mod config;
mod data_source;
mod host;
mod session;

pub use config::{ChartSessionConfig, LoadRequestConfig, VisibleWindowAnchor};
pub use data_source::{
    ChartDataSource, FetchedData, IndicatorRequest, OhlcvColumns, ReportListResponse,
    TimeseriesRequest, TimeseriesResponse, fetch_symbol_data,
};
pub use host::{ChartHostView, LoadOutcome, LoadTicket, LoadToken};
pub use session::{ChartSession, PointerFrame, SeriesHandle, SessionState, SubscriptionId};
