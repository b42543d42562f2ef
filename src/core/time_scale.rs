use crate::core::Viewport;
use crate::core::primitives::SECONDS_PER_DAY;
use crate::error::{ChartError, ChartResult};
use serde::{Deserialize, Serialize};

const MIN_VISIBLE_SPAN: f64 = 1e-9;

/// Horizontal time axis shared by every pane of a session.
///
/// Only the visible window is modeled: data is replaced wholesale on every
/// attach, so there is no separately fitted full range to fall back to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeScale {
    visible_start: f64,
    visible_end: f64,
}

impl Default for TimeScale {
    /// One day starting at the epoch; replaced before a session is ready.
    fn default() -> Self {
        Self {
            visible_start: 0.0,
            visible_end: SECONDS_PER_DAY,
        }
    }
}

impl TimeScale {
    pub fn new(time_start: f64, time_end: f64) -> ChartResult<Self> {
        let (visible_start, visible_end) = normalize_range(time_start, time_end)?;
        Ok(Self {
            visible_start,
            visible_end,
        })
    }

    /// Trailing window of `days` whole days ending exactly at `end`.
    pub fn trailing_days(end: f64, days: u32) -> ChartResult<Self> {
        if days == 0 {
            return Err(ChartError::InvalidData(
                "visible window must span at least one day".to_owned(),
            ));
        }
        Self::new(end - f64::from(days) * SECONDS_PER_DAY, end)
    }

    #[must_use]
    pub fn visible_range(self) -> (f64, f64) {
        (self.visible_start, self.visible_end)
    }

    #[must_use]
    pub fn span(self) -> f64 {
        self.visible_end - self.visible_start
    }

    pub fn set_visible_range(&mut self, start: f64, end: f64) -> ChartResult<()> {
        *self = Self::new(start, end)?;
        Ok(())
    }

    /// Pans the visible range by an additive time delta.
    pub fn pan_visible_by_delta(&mut self, delta_time: f64) -> ChartResult<()> {
        if !delta_time.is_finite() {
            return Err(ChartError::InvalidData(
                "pan delta must be finite".to_owned(),
            ));
        }
        self.set_visible_range(self.visible_start + delta_time, self.visible_end + delta_time)
    }

    /// Zooms visible range around an anchor time.
    ///
    /// `factor > 1.0` zooms in, `0.0 < factor < 1.0` zooms out.
    pub fn zoom_visible_by_factor(&mut self, factor: f64, anchor_time: f64) -> ChartResult<()> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(ChartError::InvalidData(
                "zoom factor must be finite and > 0".to_owned(),
            ));
        }
        if !anchor_time.is_finite() {
            return Err(ChartError::InvalidData(
                "zoom anchor must be finite".to_owned(),
            ));
        }

        let current_span = self.span();
        let target_span = (current_span / factor).max(MIN_VISIBLE_SPAN);
        let left_ratio = (anchor_time - self.visible_start) / current_span;
        let new_start = anchor_time - left_ratio * target_span;
        self.set_visible_range(new_start, new_start + target_span)
    }

    pub fn time_to_pixel(self, time: f64, viewport: Viewport) -> ChartResult<f64> {
        validate_viewport(viewport)?;
        if !time.is_finite() {
            return Err(ChartError::InvalidData("time must be finite".to_owned()));
        }
        let normalized = (time - self.visible_start) / self.span();
        Ok(normalized * f64::from(viewport.width))
    }

    pub fn pixel_to_time(self, pixel: f64, viewport: Viewport) -> ChartResult<f64> {
        validate_viewport(viewport)?;
        if !pixel.is_finite() {
            return Err(ChartError::InvalidData("pixel must be finite".to_owned()));
        }
        let normalized = pixel / f64::from(viewport.width);
        Ok(self.visible_start + normalized * self.span())
    }
}

fn validate_viewport(viewport: Viewport) -> ChartResult<()> {
    if !viewport.is_valid() {
        return Err(ChartError::InvalidViewport {
            width: viewport.width,
            height: viewport.height,
        });
    }
    Ok(())
}

fn normalize_range(start: f64, end: f64) -> ChartResult<(f64, f64)> {
    if !start.is_finite() || !end.is_finite() {
        return Err(ChartError::InvalidData(
            "scale range must be finite".to_owned(),
        ));
    }

    if start == end {
        let half = MIN_VISIBLE_SPAN / 2.0;
        return Ok((start - half, end + half));
    }

    Ok((start.min(end), start.max(end)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_window_ends_at_anchor() {
        let scale = TimeScale::trailing_days(1_000_000_000.0, 365).expect("window");
        let (start, end) = scale.visible_range();
        assert_eq!(end, 1_000_000_000.0);
        assert_eq!(end - start, 365.0 * SECONDS_PER_DAY);
        assert!(TimeScale::trailing_days(0.0, 0).is_err());
    }

    #[test]
    fn pixel_mapping_round_trips() {
        let scale = TimeScale::new(100.0, 200.0).expect("scale");
        let viewport = Viewport::new(1000, 400);
        let px = scale.time_to_pixel(150.0, viewport).expect("to px");
        assert!((px - 500.0).abs() <= 1e-9);
        let back = scale.pixel_to_time(px, viewport).expect("to time");
        assert!((back - 150.0).abs() <= 1e-9);
        assert!(scale.time_to_pixel(150.0, Viewport::new(0, 10)).is_err());
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut scale = TimeScale::new(0.0, 100.0).expect("scale");
        scale.zoom_visible_by_factor(2.0, 50.0).expect("zoom");
        assert_eq!(scale.visible_range(), (25.0, 75.0));
        scale.pan_visible_by_delta(-25.0).expect("pan");
        assert_eq!(scale.visible_range(), (0.0, 50.0));
    }
}
