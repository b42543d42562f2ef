//! Annotation layers that sit on top of core series data.

pub mod markers;

pub use markers::{
    Marker, MarkerPosition, MarkerShape, REPORT_MARKER_GLYPH, match_report_markers,
};
