use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::{PaneLayout, build_series_snapshot};
use crate::error::ChartResult;
use crate::extensions::match_report_markers;
use crate::interaction::{
    CrosshairResolver, CrosshairSnapshot, HoverDetail, Legend, PointerMoveEvent, Tooltip,
};
use crate::render::ChartSurface;

use super::config::{ChartSessionConfig, LoadRequestConfig};
use super::data_source::{ChartDataSource, FetchedData, TimeseriesRequest, fetch_symbol_data};
use super::session::{ChartSession, SubscriptionId};

/// Identity of one symbol load. Only the most recently issued token is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadToken(u64);

/// Issued on every symbol change; carries what the fetch collaborators need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadTicket {
    pub token: LoadToken,
    pub symbol: String,
    pub request: TimeseriesRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadOutcome {
    /// The session now shows this load's data.
    Applied,
    /// A newer symbol change superseded this load; nothing was touched.
    Stale,
    /// The bars fetch failed; the previous chart stays on screen.
    Failed,
}

#[derive(Debug, Default)]
struct HoverState {
    resolver: CrosshairResolver,
    detail: HoverDetail,
}

/// Top-level owner of a mounted chart: one session, one pointer subscription,
/// and the symbol-load bookkeeping that keeps late responses out.
pub struct ChartHostView<S: ChartSurface> {
    session: ChartSession<S>,
    subscription: Option<SubscriptionId>,
    hover: Rc<RefCell<HoverState>>,
    request_config: LoadRequestConfig,
    pending: Option<(LoadToken, String)>,
    next_token: u64,
    displayed_symbol: Option<String>,
    loading: bool,
    error: Option<String>,
}

impl<S: ChartSurface> ChartHostView<S> {
    /// Builds the session and subscribes the crosshair resolver to it.
    pub fn mount(
        surface: S,
        layout: PaneLayout,
        config: ChartSessionConfig,
        request_config: LoadRequestConfig,
    ) -> ChartResult<Self> {
        let mut session = ChartSession::new(surface, layout, config)?;
        let hover = Rc::new(RefCell::new(HoverState {
            resolver: CrosshairResolver::new(config.hover_config()),
            detail: HoverDetail::default(),
        }));
        let handler_hover = Rc::clone(&hover);
        let subscription = session.subscribe_pointer_move(move |frame| {
            let mut hover = handler_hover.borrow_mut();
            let detail = hover
                .resolver
                .resolve(&frame.event, frame.time_scale, frame.layout);
            hover.detail = detail;
        })?;
        debug!("chart host mounted");

        Ok(Self {
            session,
            subscription: Some(subscription),
            hover,
            request_config,
            pending: None,
            next_token: 0,
            displayed_symbol: None,
            loading: false,
            error: None,
        })
    }

    #[must_use]
    pub fn session(&self) -> &ChartSession<S> {
        &self.session
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Symbol whose data is currently on screen.
    #[must_use]
    pub fn current_symbol(&self) -> Option<&str> {
        self.displayed_symbol.as_deref()
    }

    /// Symbol of the load still awaiting its data, if any.
    #[must_use]
    pub fn pending_symbol(&self) -> Option<&str> {
        self.pending.as_ref().map(|(_, symbol)| symbol.as_str())
    }

    #[must_use]
    pub fn hover(&self) -> HoverDetail {
        self.hover.borrow().detail.clone()
    }

    #[must_use]
    pub fn legend(&self) -> Option<Legend> {
        self.hover.borrow().detail.legend.clone()
    }

    #[must_use]
    pub fn tooltip(&self) -> Option<Tooltip> {
        self.hover.borrow().detail.tooltip.clone()
    }

    pub fn set_symbol(&mut self, symbol: impl Into<String>) -> LoadTicket {
        self.set_symbol_at(symbol, Utc::now())
    }

    /// Starts a load for `symbol`, superseding any load still in flight.
    pub fn set_symbol_at(&mut self, symbol: impl Into<String>, now: DateTime<Utc>) -> LoadTicket {
        let symbol = symbol.into();
        let token = LoadToken(self.next_token);
        self.next_token += 1;
        if let Some((superseded, previous)) = self.pending.replace((token, symbol.clone())) {
            debug!(?superseded, previous = %previous, next = %symbol, "symbol load superseded");
        }
        self.loading = true;
        self.error = None;
        LoadTicket {
            token,
            symbol,
            request: self.request_config.request_at(now),
        }
    }

    pub fn complete_load(&mut self, fetched: FetchedData) -> ChartResult<LoadOutcome> {
        self.complete_load_at(fetched, Utc::now())
    }

    /// Applies fetched data if its token is still current.
    ///
    /// A failed report fetch degrades to "no reports". A failed bars fetch, or
    /// a bars payload that does not decode, sets the error flag and leaves the
    /// session untouched.
    ///
    /// A surface error while attaching may leave the chart half updated, so
    /// the error flag is set, no symbol counts as displayed and hover output is
    /// cleared until the next load applies.
    pub fn complete_load_at(
        &mut self,
        fetched: FetchedData,
        now: DateTime<Utc>,
    ) -> ChartResult<LoadOutcome> {
        let symbol = match &self.pending {
            Some((token, symbol)) if *token == fetched.token => symbol.clone(),
            _ => {
                debug!(token = ?fetched.token, "discarding stale load result");
                return Ok(LoadOutcome::Stale);
            }
        };
        self.pending = None;
        self.loading = false;

        let frame = match fetched.bars.and_then(|response| response.into_frame()) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(symbol = %symbol, error = %err, "bars fetch failed");
                self.error = Some(err.to_string());
                return Ok(LoadOutcome::Failed);
            }
        };
        let reports = fetched.reports.unwrap_or_else(|err| {
            warn!(symbol = %symbol, error = %err, "report fetch failed, continuing without reports");
            Vec::new()
        });

        let config = self.session.config();
        let markers = match_report_markers(&reports, config.marker_color);
        let attached = build_series_snapshot(
            &frame,
            self.session.layout(),
            config.up_color,
            config.down_color,
        )
        .and_then(|snapshot| self.session.attach_data_at(&snapshot, &markers, now));
        if let Err(err) = attached {
            warn!(symbol = %symbol, error = %err, "attach failed, chart content not trusted");
            self.error = Some(err.to_string());
            self.displayed_symbol = None;
            let mut hover = self.hover.borrow_mut();
            hover.resolver.set_snapshot(CrosshairSnapshot::default());
            hover.detail = HoverDetail::default();
            return Err(err);
        }

        {
            let mut hover = self.hover.borrow_mut();
            hover.resolver.set_snapshot(CrosshairSnapshot::new(
                symbol.clone(),
                frame.into_bars(),
                &reports,
            ));
            hover.detail = HoverDetail::default();
        }
        debug!(symbol = %symbol, markers = markers.len(), "symbol load applied");
        self.displayed_symbol = Some(symbol);
        Ok(LoadOutcome::Applied)
    }

    /// Issues a load for `symbol`, runs both fetches, and applies the result.
    pub async fn load_symbol<D>(
        &mut self,
        source: &D,
        symbol: impl Into<String>,
    ) -> ChartResult<LoadOutcome>
    where
        D: ChartDataSource + ?Sized,
    {
        let ticket = self.set_symbol(symbol);
        let fetched = fetch_symbol_data(source, &ticket).await;
        self.complete_load(fetched)
    }

    /// Forwards a surface pointer event and returns the resolved detail.
    pub fn pointer_move(&mut self, event: PointerMoveEvent) -> HoverDetail {
        self.session.pointer_move(event);
        self.hover()
    }

    pub fn set_visible_range(&mut self, start: f64, end: f64) -> ChartResult<()> {
        self.session.set_visible_range(start, end)
    }

    pub fn pan_visible_by(&mut self, delta_time: f64) -> ChartResult<()> {
        self.session.pan_visible_by(delta_time)
    }

    pub fn zoom_visible_by(&mut self, factor: f64, anchor_time: f64) -> ChartResult<()> {
        self.session.zoom_visible_by(factor, anchor_time)
    }

    /// Explicit teardown; dropping the view has the same effect.
    pub fn unmount(self) {
        drop(self);
    }

    fn release(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.session.unsubscribe_pointer_move(subscription);
        }
        self.pending = None;
        self.session.dispose();
    }
}

impl<S: ChartSurface> Drop for ChartHostView<S> {
    fn drop(&mut self) {
        self.release();
        debug!("chart host unmounted");
    }
}
