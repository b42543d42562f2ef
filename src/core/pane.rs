use serde::{Deserialize, Serialize};

use crate::core::{SeriesKey, SeriesKind};
use crate::error::{ChartError, ChartResult};
use crate::render::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PaneId(u32);

impl PaneId {
    pub const PRICE: PaneId = PaneId(0);
    pub const MOMENTUM: PaneId = PaneId(1);
    pub const FLOW_A: PaneId = PaneId(2);
    pub const FLOW_B: PaneId = PaneId(3);

    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaneRole {
    PriceVolume,
    Momentum,
    FlowVolatilityA,
    FlowVolatilityB,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaneDescriptor {
    pub id: PaneId,
    pub role: PaneRole,
    pub stretch_factor: f64,
}

/// Logical value-axis identity inside a pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceScaleId {
    Right,
    /// Overlay scale squeezed to the bottom of the price pane.
    Volume,
}

impl PriceScaleId {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PriceScaleId::Right => "right",
            PriceScaleId::Volume => "volume",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStyle {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStyle {
    pub color: Color,
    /// Bearish color for candlestick series.
    pub down_color: Option<Color>,
    pub line_width: f64,
    pub line_style: LineStyle,
    pub title: Option<&'static str>,
    pub precision: u8,
}

impl SeriesStyle {
    #[must_use]
    pub const fn new(color: Color) -> Self {
        Self {
            color,
            down_color: None,
            line_width: 2.0,
            line_style: LineStyle::Solid,
            title: None,
            precision: 2,
        }
    }
}

/// Where a series gets its points from when a snapshot is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SeriesSource {
    /// Derived from the price series itself (candles, volume).
    Bars,
    /// Named indicator array in the bars payload.
    Indicator(&'static str),
    /// Fixed level drawn over the x-domain of another line series.
    Guide { reference: SeriesKey, level: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesSpec {
    pub key: SeriesKey,
    pub kind: SeriesKind,
    pub pane: PaneId,
    pub price_scale: PriceScaleId,
    pub source: SeriesSource,
    pub style: SeriesStyle,
}

impl SeriesSpec {
    #[must_use]
    pub const fn new(
        key: SeriesKey,
        kind: SeriesKind,
        pane: PaneId,
        source: SeriesSource,
        color: Color,
    ) -> Self {
        Self {
            key,
            kind,
            pane,
            price_scale: PriceScaleId::Right,
            source,
            style: SeriesStyle::new(color),
        }
    }

    #[must_use]
    pub const fn indicator(key: SeriesKey, pane: PaneId, name: &'static str, color: Color) -> Self {
        Self::new(
            key,
            SeriesKind::Line,
            pane,
            SeriesSource::Indicator(name),
            color,
        )
    }

    /// Thin guide line at `level` spanning the domain of `reference`.
    #[must_use]
    pub const fn guide(
        key: SeriesKey,
        pane: PaneId,
        reference: SeriesKey,
        level: f64,
        title: &'static str,
    ) -> Self {
        let mut spec = Self::new(
            key,
            SeriesKind::Line,
            pane,
            SeriesSource::Guide { reference, level },
            GUIDE_COLOR,
        );
        spec.style.line_width = 1.0;
        spec.style.title = Some(title);
        spec
    }

    /// Rejects kind/source pairs no adapter produces points for.
    pub fn check_source(&self) -> ChartResult<()> {
        match (self.kind, self.source) {
            (SeriesKind::Candlestick | SeriesKind::Histogram, SeriesSource::Bars)
            | (SeriesKind::Line, SeriesSource::Indicator(_) | SeriesSource::Guide { .. }) => Ok(()),
            _ => Err(self.incompatible_source()),
        }
    }

    pub(crate) fn incompatible_source(&self) -> ChartError {
        ChartError::InvalidData(format!(
            "series `{}` has a source incompatible with {:?}",
            self.key.name(),
            self.kind
        ))
    }

    #[must_use]
    pub const fn with_title(mut self, title: &'static str) -> Self {
        self.style.title = Some(title);
        self
    }

    #[must_use]
    pub const fn with_price_scale(mut self, price_scale: PriceScaleId) -> Self {
        self.price_scale = price_scale;
        self
    }

    #[must_use]
    pub const fn with_line_style(mut self, line_style: LineStyle) -> Self {
        self.style.line_style = line_style;
        self
    }

    #[must_use]
    pub const fn with_precision(mut self, precision: u8) -> Self {
        self.style.precision = precision;
        self
    }

    #[must_use]
    pub const fn with_down_color(mut self, color: Color) -> Self {
        self.style.down_color = Some(color);
        self
    }
}

const GUIDE_COLOR: Color = Color::from_hex(0xFF9800);

/// Declarative table of panes and the series they hold.
#[derive(Debug, Clone, PartialEq)]
pub struct PaneLayout {
    panes: Vec<PaneDescriptor>,
    series: Vec<SeriesSpec>,
}

impl PaneLayout {
    /// Builds a layout and checks its pane/scale assignments.
    pub fn new(panes: Vec<PaneDescriptor>, series: Vec<SeriesSpec>) -> ChartResult<Self> {
        let layout = Self { panes, series };
        layout.validate()?;
        Ok(layout)
    }

    /// Price/volume, momentum, and two flow/volatility panes.
    #[must_use]
    pub fn reference() -> Self {
        let panes = vec![
            PaneDescriptor {
                id: PaneId::PRICE,
                role: PaneRole::PriceVolume,
                stretch_factor: 3.0,
            },
            PaneDescriptor {
                id: PaneId::MOMENTUM,
                role: PaneRole::Momentum,
                stretch_factor: 1.0,
            },
            PaneDescriptor {
                id: PaneId::FLOW_A,
                role: PaneRole::FlowVolatilityA,
                stretch_factor: 1.0,
            },
            PaneDescriptor {
                id: PaneId::FLOW_B,
                role: PaneRole::FlowVolatilityB,
                stretch_factor: 1.0,
            },
        ];

        let series = vec![
            SeriesSpec::new(
                SeriesKey::Candles,
                SeriesKind::Candlestick,
                PaneId::PRICE,
                SeriesSource::Bars,
                Color::from_hex(0x4CAF50),
            )
            .with_down_color(Color::from_hex(0xF44336)),
            SeriesSpec::new(
                SeriesKey::Volume,
                SeriesKind::Histogram,
                PaneId::PRICE,
                SeriesSource::Bars,
                Color::from_hex(0x26A69A),
            )
            .with_price_scale(PriceScaleId::Volume)
            .with_precision(0),
            SeriesSpec::indicator(
                SeriesKey::TrailingStop,
                PaneId::PRICE,
                "atr_trailing",
                Color::from_hex(0x4CAF50),
            )
            .with_title("Trailing Stop")
            .with_line_style(LineStyle::Dashed),
            SeriesSpec::indicator(
                SeriesKey::VwapHigh,
                PaneId::PRICE,
                "vwap_highest",
                Color::from_hex(0x2196F3),
            )
            .with_title("VWAP High"),
            SeriesSpec::indicator(
                SeriesKey::VwapLow,
                PaneId::PRICE,
                "vwap_lowest",
                Color::from_hex(0xFF5722),
            )
            .with_title("VWAP Low"),
            SeriesSpec::indicator(
                SeriesKey::Rsi14,
                PaneId::MOMENTUM,
                "rsi",
                Color::from_hex(0x2962FF),
            )
            .with_title("RSI (14)"),
            SeriesSpec::indicator(
                SeriesKey::Rsi5,
                PaneId::MOMENTUM,
                "rsi_5",
                Color::from_hex(0xFF9800),
            )
            .with_title("RSI (5)"),
            SeriesSpec::guide(
                SeriesKey::RsiOverbought,
                PaneId::MOMENTUM,
                SeriesKey::Rsi14,
                70.0,
                "Overbought (70)",
            ),
            SeriesSpec::guide(
                SeriesKey::RsiOversold,
                PaneId::MOMENTUM,
                SeriesKey::Rsi14,
                30.0,
                "Oversold (30)",
            ),
            SeriesSpec::guide(
                SeriesKey::RsiZero,
                PaneId::MOMENTUM,
                SeriesKey::Rsi14,
                0.0,
                "0",
            ),
            SeriesSpec::indicator(SeriesKey::Bvc, PaneId::FLOW_A, "bvc", Color::from_hex(0x9C27B0))
                .with_title("BVC"),
            SeriesSpec::guide(SeriesKey::BvcZero, PaneId::FLOW_A, SeriesKey::Bvc, 0.0, "0"),
            SeriesSpec::indicator(
                SeriesKey::YzVolatility,
                PaneId::FLOW_B,
                "yz_volatility",
                Color::from_hex(0xE91E63),
            )
            .with_title("YZ Volatility")
            .with_precision(4),
            SeriesSpec::indicator(
                SeriesKey::KalmanZscore,
                PaneId::FLOW_B,
                "kalman_zscore",
                Color::from_hex(0x00BCD4),
            )
            .with_title("Kalman Z-Score"),
            SeriesSpec::guide(
                SeriesKey::KalmanUpper,
                PaneId::FLOW_B,
                SeriesKey::KalmanZscore,
                2.0,
                "Upper Bound (2)",
            ),
            SeriesSpec::guide(
                SeriesKey::KalmanLower,
                PaneId::FLOW_B,
                SeriesKey::KalmanZscore,
                -2.0,
                "Lower Bound (-2)",
            ),
        ];

        Self { panes, series }
    }

    #[must_use]
    pub fn panes(&self) -> &[PaneDescriptor] {
        &self.panes
    }

    #[must_use]
    pub fn series(&self) -> &[SeriesSpec] {
        &self.series
    }

    #[must_use]
    pub fn spec(&self, key: SeriesKey) -> Option<&SeriesSpec> {
        self.series.iter().find(|spec| spec.key == key)
    }

    /// Series in `pane`, in declaration order.
    pub fn series_in_pane(&self, pane: PaneId) -> impl Iterator<Item = &SeriesSpec> + '_ {
        self.series.iter().filter(move |spec| spec.pane == pane)
    }

    /// Checks the invariants construction relies on.
    ///
    /// - pane ids are `0..n` in stacking order and series keys are unique
    /// - every series lives in a declared pane
    /// - candlestick/histogram series read bars; line series read indicators or guides
    /// - a guide bounds an earlier line series in the same pane and on the same scale
    /// - all series outside the price pane share one scale id
    pub fn validate(&self) -> ChartResult<()> {
        if self.panes.is_empty() {
            return Err(ChartError::InvalidData(
                "layout needs at least one pane".to_owned(),
            ));
        }
        for (index, pane) in self.panes.iter().enumerate() {
            if pane.id.raw() as usize != index {
                return Err(ChartError::InvalidData(format!(
                    "pane {} declared out of stacking order",
                    pane.id.raw()
                )));
            }
            if !pane.stretch_factor.is_finite() || pane.stretch_factor <= 0.0 {
                return Err(ChartError::InvalidData(
                    "pane stretch factor must be finite and > 0".to_owned(),
                ));
            }
        }

        let mut overlay_scale: Option<PriceScaleId> = None;
        for (index, spec) in self.series.iter().enumerate() {
            let name = spec.key.name();
            if self.series[..index].iter().any(|other| other.key == spec.key) {
                return Err(ChartError::InvalidData(format!(
                    "series `{name}` declared twice"
                )));
            }
            if spec.pane.raw() as usize >= self.panes.len() {
                return Err(ChartError::InvalidData(format!(
                    "series `{name}` targets undeclared pane {}",
                    spec.pane.raw()
                )));
            }

            spec.check_source()?;
            if let SeriesSource::Guide { reference, level } = spec.source {
                if !level.is_finite() {
                    return Err(ChartError::InvalidData(format!(
                        "guide `{name}` level must be finite"
                    )));
                }
                let Some(target) = self.series[..index]
                    .iter()
                    .find(|other| other.key == reference)
                else {
                    return Err(ChartError::InvalidData(format!(
                        "guide `{name}` must follow its reference `{}`",
                        reference.name()
                    )));
                };
                if target.kind != SeriesKind::Line
                    || target.pane != spec.pane
                    || target.price_scale != spec.price_scale
                {
                    return Err(ChartError::InvalidData(format!(
                        "guide `{name}` must share pane and scale with `{}`",
                        reference.name()
                    )));
                }
            }

            if spec.pane != PaneId::PRICE {
                match overlay_scale {
                    None => overlay_scale = Some(spec.price_scale),
                    Some(shared) if shared == spec.price_scale => {}
                    Some(_) => {
                        return Err(ChartError::InvalidData(format!(
                            "series `{name}` breaks the shared indicator-pane scale"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for PaneLayout {
    fn default() -> Self {
        Self::reference()
    }
}
