//! Presentation lookups for plotting layers
//!
//! Maps a resolved channel to a trace style so every front end draws a given
//! channel the same way: analog channels C1-C4 get solid lines with pentagon
//! markers, function traces F1-F4 dashed lines with triangle markers, both
//! cycling through the same four colors. Pure lookups, no rendering here.

use crate::decoder::Origin;
use serde::{Deserialize, Serialize};

/// Trace colors, cycled across channels 1-4 and again across 5-8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceColor {
    Blue,
    Green,
    Red,
    Cyan,
}

/// Line style used when drawing a trace as a curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStyle {
    Solid,
    Dashed,
}

/// Marker used when drawing a trace as points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Marker {
    Pentagon,
    TriangleDown,
}

/// Complete drawing style for one trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStyle {
    pub color: TraceColor,
    pub line: LineStyle,
    pub marker: Marker,
}

const COLOR_CYCLE: [TraceColor; 4] = [
    TraceColor::Blue,
    TraceColor::Green,
    TraceColor::Red,
    TraceColor::Cyan,
];

/// Style for a resolved origin
///
/// Total over all supported origins; a function of the channel number only.
pub fn trace_style(origin: Origin) -> TraceStyle {
    let channel = origin.channel();
    let color = COLOR_CYCLE[((channel - 1) % 4) as usize];
    if origin.is_function() {
        TraceStyle {
            color,
            line: LineStyle::Dashed,
            marker: Marker::TriangleDown,
        }
    } else {
        TraceStyle {
            color,
            line: LineStyle::Solid,
            marker: Marker::Pentagon,
        }
    }
}

/// Human-readable label for a resolved origin
pub fn channel_label(origin: Origin) -> String {
    origin.label()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analog_channels_are_solid_with_pentagon_markers() {
        for origin in [Origin::C1, Origin::C2, Origin::C3, Origin::C4] {
            let style = trace_style(origin);
            assert_eq!(style.line, LineStyle::Solid);
            assert_eq!(style.marker, Marker::Pentagon);
        }
    }

    #[test]
    fn function_traces_are_dashed_with_triangle_markers() {
        for origin in [Origin::F1, Origin::F2, Origin::F3, Origin::F4] {
            let style = trace_style(origin);
            assert_eq!(style.line, LineStyle::Dashed);
            assert_eq!(style.marker, Marker::TriangleDown);
        }
    }

    #[test]
    fn colors_cycle_identically_for_channels_and_functions() {
        let expected = [
            TraceColor::Blue,
            TraceColor::Green,
            TraceColor::Red,
            TraceColor::Cyan,
        ];
        for (i, origin) in [Origin::C1, Origin::C2, Origin::C3, Origin::C4]
            .into_iter()
            .enumerate()
        {
            assert_eq!(trace_style(origin).color, expected[i]);
        }
        for (i, origin) in [Origin::F1, Origin::F2, Origin::F3, Origin::F4]
            .into_iter()
            .enumerate()
        {
            assert_eq!(trace_style(origin).color, expected[i]);
        }
    }

    #[test]
    fn labels_follow_channel_numbers() {
        assert_eq!(channel_label(Origin::C2), "Channel 2");
        assert_eq!(channel_label(Origin::F3), "Channel 7");
    }
}
