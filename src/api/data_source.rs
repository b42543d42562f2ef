use async_trait::async_trait;
use futures::join;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::primitives::parse_unix_seconds;
use crate::core::{Bar, BarFrame, ReportEvent};
use crate::error::{ChartError, ChartResult};

use super::host::{LoadTicket, LoadToken};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub params: IndexMap<String, serde_json::Value>,
}

impl IndicatorRequest {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: IndexMap<String, serde_json::Value>) -> Self {
        self.params = params;
        self
    }
}

/// Body of the bars/indicators request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesRequest {
    pub interval: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub indicators: Vec<IndicatorRequest>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OhlcvColumns {
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
}

/// Bars/indicators payload as the backend returns it: parallel columns keyed
/// by string timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesResponse {
    pub symbol: String,
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default)]
    pub meta: serde_json::Map<String, serde_json::Value>,
    pub timestamps: Vec<String>,
    pub timeseries: OhlcvColumns,
    #[serde(default)]
    pub indicators: Option<IndexMap<String, serde_json::Value>>,
}

fn default_interval() -> String {
    "1d".to_owned()
}

impl TimeseriesResponse {
    pub fn from_json(json: &str) -> ChartResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Values of one indicator, position-aligned to `timestamps`.
    ///
    /// A missing key, `null`, or a non-array value (object-shaped indicators
    /// such as MACD) reads as an empty series; non-numeric elements read as
    /// absent.
    #[must_use]
    pub fn indicator_values(&self, name: &str) -> Vec<Option<f64>> {
        let Some(serde_json::Value::Array(values)) = self
            .indicators
            .as_ref()
            .and_then(|indicators| indicators.get(name))
        else {
            return Vec::new();
        };
        values.iter().map(serde_json::Value::as_f64).collect()
    }

    /// Decodes the columns into a validated price series plus indicator arrays.
    pub fn into_frame(self) -> ChartResult<BarFrame> {
        let len = self.timestamps.len();
        let columns = &self.timeseries;
        for (name, column_len) in [
            ("open", columns.open.len()),
            ("high", columns.high.len()),
            ("low", columns.low.len()),
            ("close", columns.close.len()),
            ("volume", columns.volume.len()),
        ] {
            if column_len != len {
                return Err(ChartError::InvalidData(format!(
                    "`{name}` column has {column_len} values for {len} timestamps"
                )));
            }
        }

        let mut bars = Vec::with_capacity(len);
        for (index, raw) in self.timestamps.iter().enumerate() {
            let time = parse_unix_seconds(raw).ok_or_else(|| {
                ChartError::InvalidData(format!("unparsable bar timestamp `{raw}`"))
            })?;
            bars.push(Bar::new(
                time,
                columns.open[index],
                columns.high[index],
                columns.low[index],
                columns.close[index],
                columns.volume[index],
            )?);
        }

        let mut frame = BarFrame::new(bars)?;
        let names: Vec<String> = self
            .indicators
            .as_ref()
            .map(|indicators| indicators.keys().cloned().collect())
            .unwrap_or_default();
        for name in names {
            let values = self.indicator_values(&name);
            if !values.is_empty() {
                frame.insert_indicator(name, values);
            }
        }
        debug!(
            symbol = %self.symbol,
            bars = frame.bars().len(),
            "decoded timeseries payload"
        );
        Ok(frame)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportListResponse {
    pub reports: Vec<ReportEvent>,
}

impl ReportListResponse {
    pub fn from_json(json: &str) -> ChartResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Fetch collaborator supplying bars/indicators and research reports.
///
/// Implementations own transport, caching, and retry policy.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait ChartDataSource: Send + Sync {
    async fn fetch_bars(
        &self,
        symbol: &str,
        request: &TimeseriesRequest,
    ) -> ChartResult<TimeseriesResponse>;

    async fn fetch_reports(&self, symbol: Option<&str>) -> ChartResult<Vec<ReportEvent>>;
}

/// Both fetch results for one load, tagged with the ticket's token.
#[derive(Debug)]
pub struct FetchedData {
    pub token: LoadToken,
    pub bars: ChartResult<TimeseriesResponse>,
    pub reports: ChartResult<Vec<ReportEvent>>,
}

/// Runs both collaborator fetches for `ticket` concurrently.
///
/// The result is handed back to the host, which decides whether it is still
/// current.
pub async fn fetch_symbol_data<D>(source: &D, ticket: &LoadTicket) -> FetchedData
where
    D: ChartDataSource + ?Sized,
{
    let (bars, reports) = join!(
        source.fetch_bars(&ticket.symbol, &ticket.request),
        source.fetch_reports(Some(&ticket.symbol))
    );
    FetchedData {
        token: ticket.token,
        bars,
        reports,
    }
}
