//! Pointer-driven hover resolution.

pub mod crosshair;

pub use crosshair::{
    CrosshairResolver, CrosshairSnapshot, HoverConfig, HoverDetail, Legend, LegendField,
    PointerMoveEvent, Tooltip, TooltipMatchPolicy, format_change, percentage_change,
    previous_close, tooltip_left,
};
