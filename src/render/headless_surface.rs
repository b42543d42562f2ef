use crate::core::{PaneDescriptor, SeriesData, SeriesSpec, SurfaceLayout, Viewport};
use crate::error::{ChartError, ChartResult};
use crate::extensions::Marker;
use crate::render::{ChartSurface, SurfaceSeriesId};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSeries {
    pub spec: SeriesSpec,
    pub data: Option<SeriesData>,
    pub markers: Vec<Marker>,
    pub data_updates: usize,
    pub marker_updates: usize,
}

/// Recording surface used by tests and headless session usage.
///
/// It still validates what it receives so tests catch invalid payloads before
/// a real backend is introduced.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessSurface {
    layout: SurfaceLayout,
    panes: Vec<PaneDescriptor>,
    series: Vec<RecordedSeries>,
    visible_range: Option<(f64, f64)>,
    release_count: usize,
}

impl HeadlessSurface {
    #[must_use]
    pub fn new(layout: SurfaceLayout) -> Self {
        Self {
            layout,
            panes: Vec::new(),
            series: Vec::new(),
            visible_range: None,
            release_count: 0,
        }
    }

    #[must_use]
    pub fn panes(&self) -> &[PaneDescriptor] {
        &self.panes
    }

    #[must_use]
    pub fn series(&self) -> &[RecordedSeries] {
        &self.series
    }

    #[must_use]
    pub fn series_by_name(&self, name: &str) -> Option<&RecordedSeries> {
        self.series.iter().find(|series| series.spec.key.name() == name)
    }

    #[must_use]
    pub fn visible_range(&self) -> Option<(f64, f64)> {
        self.visible_range
    }

    #[must_use]
    pub fn release_count(&self) -> usize {
        self.release_count
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.release_count > 0
    }

    fn series_mut(&mut self, id: SurfaceSeriesId) -> ChartResult<&mut RecordedSeries> {
        if self.is_released() {
            return Err(ChartError::InvalidData(
                "surface has been released".to_owned(),
            ));
        }
        self.series
            .get_mut(id.0 as usize)
            .ok_or_else(|| ChartError::UnknownSeries(format!("surface series #{}", id.0)))
    }
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new(SurfaceLayout::new(Viewport::new(1200, 800), 60.0))
    }
}

impl ChartSurface for HeadlessSurface {
    fn layout(&self) -> SurfaceLayout {
        self.layout
    }

    fn add_pane(&mut self, pane: &PaneDescriptor) -> ChartResult<()> {
        self.panes.push(*pane);
        Ok(())
    }

    fn add_series(&mut self, spec: &SeriesSpec) -> ChartResult<SurfaceSeriesId> {
        if !self.panes.iter().any(|pane| pane.id == spec.pane) {
            return Err(ChartError::InvalidData(format!(
                "series `{}` targets a pane the surface does not have",
                spec.key.name()
            )));
        }
        spec.style.color.validate()?;
        let id = SurfaceSeriesId(self.series.len() as u32);
        self.series.push(RecordedSeries {
            spec: *spec,
            data: None,
            markers: Vec::new(),
            data_updates: 0,
            marker_updates: 0,
        });
        Ok(id)
    }

    fn set_series_data(&mut self, series: SurfaceSeriesId, data: &SeriesData) -> ChartResult<()> {
        let recorded = self.series_mut(series)?;
        if recorded.spec.kind != data.kind() {
            return Err(ChartError::SeriesKindMismatch {
                series: recorded.spec.key.name().to_owned(),
                expected: recorded.spec.kind,
                actual: data.kind(),
            });
        }
        recorded.data = Some(data.clone());
        recorded.data_updates += 1;
        Ok(())
    }

    fn set_series_markers(
        &mut self,
        series: SurfaceSeriesId,
        markers: &[Marker],
    ) -> ChartResult<()> {
        if markers.iter().any(|marker| !marker.time.is_finite()) {
            return Err(ChartError::InvalidData(
                "marker time must be finite".to_owned(),
            ));
        }
        let recorded = self.series_mut(series)?;
        recorded.markers = markers.to_vec();
        recorded.marker_updates += 1;
        Ok(())
    }

    fn set_visible_range(&mut self, start: f64, end: f64) -> ChartResult<()> {
        if !start.is_finite() || !end.is_finite() || start >= end {
            return Err(ChartError::InvalidData(
                "visible range must be finite and non-empty".to_owned(),
            ));
        }
        self.visible_range = Some((start, end));
        Ok(())
    }

    fn release(&mut self) {
        self.panes.clear();
        self.series.clear();
        self.visible_range = None;
        self.release_count += 1;
    }
}
