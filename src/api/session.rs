use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::primitives::datetime_to_unix_seconds;
use crate::core::{
    PaneLayout, SeriesData, SeriesKey, SeriesKind, SeriesSnapshot, SurfaceLayout, TimeScale,
};
use crate::error::{ChartError, ChartResult};
use crate::extensions::Marker;
use crate::interaction::PointerMoveEvent;
use crate::render::{ChartSurface, SurfaceSeriesId};

use super::config::{ChartSessionConfig, VisibleWindowAnchor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Panes and series are still being created on the surface.
    Uninitialized,
    Ready,
    Disposed,
}

impl SessionState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Disposed => "disposed",
        }
    }
}

/// Typed handle to one series created on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesHandle {
    pub key: SeriesKey,
    pub kind: SeriesKind,
    pub surface_id: SurfaceSeriesId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Everything a pointer-move subscriber needs to resolve one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerFrame {
    pub event: PointerMoveEvent,
    pub time_scale: TimeScale,
    pub layout: SurfaceLayout,
}

type PointerMoveHandler = Box<dyn FnMut(&PointerFrame)>;

/// Owns one surface and every series handle on it.
///
/// Construction builds all panes and series in one step; teardown releases
/// them in one step. Data is replaced wholesale on every
/// [`attach_data`](Self::attach_data).
pub struct ChartSession<S: ChartSurface> {
    surface: S,
    state: SessionState,
    layout: PaneLayout,
    config: ChartSessionConfig,
    handles: IndexMap<SeriesKey, SeriesHandle>,
    marker_series: Option<SurfaceSeriesId>,
    time_scale: TimeScale,
    subscribers: IndexMap<SubscriptionId, PointerMoveHandler>,
    next_subscription: u64,
}

impl<S: ChartSurface> ChartSession<S> {
    /// Builds every pane and series of `layout` on `surface`.
    ///
    /// The session starts `Uninitialized` and only reaches `Ready` once the
    /// whole layout exists on the surface. On failure the surface is released
    /// before the error is returned, so no partially built surface outlives
    /// this call.
    pub fn new(surface: S, layout: PaneLayout, config: ChartSessionConfig) -> ChartResult<Self> {
        Self::new_at(surface, layout, config, Utc::now())
    }

    /// Same as [`new`](Self::new) with an explicit clock for the initial window.
    pub fn new_at(
        surface: S,
        layout: PaneLayout,
        config: ChartSessionConfig,
        now: DateTime<Utc>,
    ) -> ChartResult<Self> {
        let mut session = Self::unbuilt(surface, layout, config);
        match session.build(now) {
            Ok(()) => Ok(session),
            Err(err) => {
                session.dispose();
                Err(err)
            }
        }
    }

    fn unbuilt(surface: S, layout: PaneLayout, config: ChartSessionConfig) -> Self {
        Self {
            surface,
            state: SessionState::Uninitialized,
            layout,
            config,
            handles: IndexMap::new(),
            marker_series: None,
            time_scale: TimeScale::default(),
            subscribers: IndexMap::new(),
            next_subscription: 0,
        }
    }

    /// `Uninitialized -> Ready`: creates panes and series, then applies the
    /// initial trailing window.
    fn build(&mut self, now: DateTime<Utc>) -> ChartResult<()> {
        debug_assert!(self.state == SessionState::Uninitialized);
        self.config.validate()?;
        self.layout.validate()?;
        self.handles = build_surface(&mut self.surface, &self.layout)?;
        self.marker_series = self
            .handles
            .get(&SeriesKey::Candles)
            .map(|handle| handle.surface_id);
        let time_scale = TimeScale::trailing_days(
            datetime_to_unix_seconds(now),
            self.config.visible_window_days,
        )?;
        self.apply_time_scale(time_scale)?;

        self.state = SessionState::Ready;
        debug!(
            series = self.handles.len(),
            panes = self.layout.panes().len(),
            "chart session ready"
        );
        Ok(())
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn config(&self) -> ChartSessionConfig {
        self.config
    }

    #[must_use]
    pub fn layout(&self) -> &PaneLayout {
        &self.layout
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    #[must_use]
    pub fn handle(&self, key: SeriesKey) -> Option<SeriesHandle> {
        self.handles.get(&key).copied()
    }

    /// Series handles plus the marker layer on the candle series.
    #[must_use]
    pub fn handle_count(&self) -> usize {
        self.handles.len() + usize::from(self.marker_series.is_some())
    }

    #[must_use]
    pub fn time_scale(&self) -> TimeScale {
        self.time_scale
    }

    #[must_use]
    pub fn visible_range(&self) -> (f64, f64) {
        self.time_scale.visible_range()
    }

    /// Replaces every series payload and the full marker set, then resets the
    /// visible window.
    pub fn attach_data(&mut self, snapshot: &SeriesSnapshot, markers: &[Marker]) -> ChartResult<()> {
        self.attach_data_at(snapshot, markers, Utc::now())
    }

    /// [`attach_data`](Self::attach_data) with an explicit wall clock.
    ///
    /// Series absent from `snapshot` are cleared. The snapshot is checked
    /// against the handles before anything is pushed. The window reset only
    /// happens once every push has succeeded.
    ///
    /// A surface error during the pushes is returned as is and leaves the
    /// surface partially updated: earlier series hold the new data, later
    /// series and the markers keep the old data and the window is not reset.
    /// Callers must treat that snapshot as not displayed.
    pub fn attach_data_at(
        &mut self,
        snapshot: &SeriesSnapshot,
        markers: &[Marker],
        now: DateTime<Utc>,
    ) -> ChartResult<()> {
        debug_assert!(
            self.state == SessionState::Ready,
            "attach_data on a {} chart session",
            self.state.as_str()
        );
        self.ensure_ready()?;

        for (key, data) in snapshot.iter() {
            let handle = self
                .handles
                .get(&key)
                .ok_or_else(|| ChartError::UnknownSeries(key.name().to_owned()))?;
            if handle.kind != data.kind() {
                return Err(ChartError::SeriesKindMismatch {
                    series: key.name().to_owned(),
                    expected: handle.kind,
                    actual: data.kind(),
                });
            }
        }

        for handle in self.handles.values() {
            match snapshot.get(handle.key) {
                Some(data) => self.surface.set_series_data(handle.surface_id, data)?,
                None => self
                    .surface
                    .set_series_data(handle.surface_id, &SeriesData::empty(handle.kind))?,
            }
        }

        if let Some(marker_series) = self.marker_series {
            self.surface.set_series_markers(marker_series, &[])?;
            self.surface.set_series_markers(marker_series, markers)?;
        }

        let now_seconds = datetime_to_unix_seconds(now);
        let window_end = match self.config.visible_window_anchor {
            VisibleWindowAnchor::WallClock => now_seconds,
            VisibleWindowAnchor::LastBar => snapshot.last_bar_time().unwrap_or(now_seconds),
        };
        let time_scale = TimeScale::trailing_days(window_end, self.config.visible_window_days)?;
        self.apply_time_scale(time_scale)?;

        debug!(
            series = snapshot.len(),
            markers = markers.len(),
            window_end,
            "attached chart data"
        );
        Ok(())
    }

    /// User-driven zoom/pan; overridden by the next successful attach.
    pub fn set_visible_range(&mut self, start: f64, end: f64) -> ChartResult<()> {
        self.ensure_ready()?;
        self.apply_time_scale(TimeScale::new(start, end)?)
    }

    pub fn pan_visible_by(&mut self, delta_time: f64) -> ChartResult<()> {
        self.ensure_ready()?;
        let mut time_scale = self.time_scale;
        time_scale.pan_visible_by_delta(delta_time)?;
        self.apply_time_scale(time_scale)
    }

    pub fn zoom_visible_by(&mut self, factor: f64, anchor_time: f64) -> ChartResult<()> {
        self.ensure_ready()?;
        let mut time_scale = self.time_scale;
        time_scale.zoom_visible_by_factor(factor, anchor_time)?;
        self.apply_time_scale(time_scale)
    }

    pub fn time_to_pixel(&self, time: f64) -> ChartResult<f64> {
        self.time_scale
            .time_to_pixel(time, self.surface.layout().plot)
    }

    pub fn pixel_to_time(&self, pixel: f64) -> ChartResult<f64> {
        self.time_scale
            .pixel_to_time(pixel, self.surface.layout().plot)
    }

    /// Registers a pointer-move handler. Handlers run synchronously, in
    /// subscription order, from [`pointer_move`](Self::pointer_move).
    pub fn subscribe_pointer_move(
        &mut self,
        handler: impl FnMut(&PointerFrame) + 'static,
    ) -> ChartResult<SubscriptionId> {
        self.ensure_ready()?;
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.insert(id, Box::new(handler));
        Ok(id)
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe_pointer_move(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.shift_remove(&id).is_some()
    }

    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Dispatches a surface pointer-move event. Ignored unless ready.
    pub fn pointer_move(&mut self, event: PointerMoveEvent) {
        if self.state != SessionState::Ready {
            return;
        }
        let frame = PointerFrame {
            event,
            time_scale: self.time_scale,
            layout: self.surface.layout(),
        };
        for handler in self.subscribers.values_mut() {
            handler(&frame);
        }
    }

    /// Releases the surface, every handle, and every subscription. Idempotent.
    pub fn dispose(&mut self) {
        if self.state == SessionState::Disposed {
            return;
        }
        self.subscribers.clear();
        self.handles.clear();
        self.marker_series = None;
        self.surface.release();
        self.state = SessionState::Disposed;
        debug!("chart session disposed");
    }

    fn ensure_ready(&self) -> ChartResult<()> {
        if self.state != SessionState::Ready {
            return Err(ChartError::SessionNotReady {
                state: self.state.as_str(),
            });
        }
        Ok(())
    }

    fn apply_time_scale(&mut self, time_scale: TimeScale) -> ChartResult<()> {
        let (start, end) = time_scale.visible_range();
        self.surface.set_visible_range(start, end)?;
        self.time_scale = time_scale;
        Ok(())
    }
}

impl<S: ChartSurface> Drop for ChartSession<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<S: ChartSurface + std::fmt::Debug> std::fmt::Debug for ChartSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartSession")
            .field("surface", &self.surface)
            .field("state", &self.state)
            .field("handles", &self.handles)
            .field("time_scale", &self.time_scale)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

fn build_surface<S: ChartSurface>(
    surface: &mut S,
    layout: &PaneLayout,
) -> ChartResult<IndexMap<SeriesKey, SeriesHandle>> {
    for pane in layout.panes() {
        surface.add_pane(pane)?;
    }
    let mut handles = IndexMap::with_capacity(layout.series().len());
    for spec in layout.series() {
        let surface_id = surface.add_series(spec)?;
        handles.insert(
            spec.key,
            SeriesHandle {
                key: spec.key,
                kind: spec.kind,
                surface_id,
            },
        );
    }
    Ok(handles)
}
