//! Common types for the waveform decoder

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::DecodeError;

/// Two-character origin tag identifying which input produced a waveform
///
/// `C1`..`C4` are the analog input channels, `F1`..`F4` the math/function
/// traces. The mapping to logical channel numbers 1-8 is total and fails
/// closed: any other tag is rejected with [`DecodeError::UnknownChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    C1,
    C2,
    C3,
    C4,
    F1,
    F2,
    F3,
    F4,
}

impl Origin {
    /// All supported origins, in channel order
    pub const ALL: [Origin; 8] = [
        Origin::C1,
        Origin::C2,
        Origin::C3,
        Origin::C4,
        Origin::F1,
        Origin::F2,
        Origin::F3,
        Origin::F4,
    ];

    /// Resolve a two-character tag to an origin
    pub fn parse(tag: &str) -> Result<Self, DecodeError> {
        match tag {
            "C1" => Ok(Origin::C1),
            "C2" => Ok(Origin::C2),
            "C3" => Ok(Origin::C3),
            "C4" => Ok(Origin::C4),
            "F1" => Ok(Origin::F1),
            "F2" => Ok(Origin::F2),
            "F3" => Ok(Origin::F3),
            "F4" => Ok(Origin::F4),
            other => Err(DecodeError::UnknownChannel {
                origin: other.to_string(),
            }),
        }
    }

    /// Logical channel number: C1-C4 map to 1-4, F1-F4 to 5-8
    pub fn channel(self) -> u8 {
        match self {
            Origin::C1 => 1,
            Origin::C2 => 2,
            Origin::C3 => 3,
            Origin::C4 => 4,
            Origin::F1 => 5,
            Origin::F2 => 6,
            Origin::F3 => 7,
            Origin::F4 => 8,
        }
    }

    /// Human-readable label for presentation layers
    pub fn label(self) -> String {
        format!("Channel {}", self.channel())
    }

    /// True for math/function traces (F1-F4)
    pub fn is_function(self) -> bool {
        self.channel() > 4
    }

    /// The two-character tag as sent on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            Origin::C1 => "C1",
            Origin::C2 => "C2",
            Origin::C3 => "C3",
            Origin::C4 => "C4",
            Origin::F1 => "F1",
            Origin::F2 => "F2",
            Origin::F3 => "F3",
            Origin::F4 => "F4",
        }
    }

    /// Origin for an analog channel number (1-4)
    pub fn analog(channel: u8) -> Option<Self> {
        match channel {
            1 => Some(Origin::C1),
            2 => Some(Origin::C2),
            3 => Some(Origin::C3),
            4 => Some(Origin::C4),
            _ => None,
        }
    }

    /// Origin for a function number (1-4)
    pub fn function(number: u8) -> Option<Self> {
        match number {
            1 => Some(Origin::F1),
            2 => Some(Origin::F2),
            3 => Some(Origin::F3),
            4 => Some(Origin::F4),
            _ => None,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Origin {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A decoded, calibrated waveform
///
/// Built exactly once from a raw instrument buffer and never mutated
/// afterwards. `samples` holds calibrated vertical values
/// (`raw * y_gain - y_offset`), `time` the matching horizontal coordinates
/// (`i * x_gain - x_offset`); the two sequences always have equal length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waveform {
    /// Origin tag carried at the start of the raw buffer
    pub origin: Origin,
    /// Vertical gain applied to raw integer samples
    pub y_gain: f32,
    /// Vertical offset, subtracted after scaling
    pub y_offset: f32,
    /// Vertical unit code
    pub y_unit: char,
    /// Sample interval
    pub x_gain: f32,
    /// Horizontal offset, subtracted from every time coordinate
    pub x_offset: f64,
    /// Horizontal unit code
    pub x_unit: char,
    /// Sample count declared in the descriptor; may differ from the
    /// number of samples actually decoded
    pub declared_size: i32,
    /// Raw source identifier byte from the descriptor
    pub source: u8,
    /// Calibrated vertical values
    pub samples: Vec<f32>,
    /// Time coordinate per sample
    pub time: Vec<f32>,
}

impl Waveform {
    /// Decode a complete raw instrument buffer into a waveform
    ///
    /// The buffer must contain the 2-byte origin tag followed by a
    /// `'#'`-delimited length-prefixed descriptor block as returned by a
    /// `WF?` query.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        super::wavedesc::decode(raw)
    }

    /// Logical channel number derived from the origin tag
    pub fn channel(&self) -> u8 {
        self.origin.channel()
    }

    /// Human-readable channel label
    pub fn label(&self) -> String {
        self.origin.label()
    }

    /// Number of decoded samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if no samples were decoded
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sub-range of the time and sample sequences by start/stop index
    ///
    /// Indices are clamped to the decoded length; `stop` is exclusive.
    /// Returns `(time, samples)` slices of equal length.
    pub fn range(&self, start: usize, stop: usize) -> (&[f32], &[f32]) {
        let len = self.samples.len();
        let start = start.min(len);
        let stop = stop.clamp(start, len);
        (&self.time[start..stop], &self.samples[start..stop])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_mapping_is_total_and_exact() {
        let expected = [
            ("C1", 1u8),
            ("C2", 2),
            ("C3", 3),
            ("C4", 4),
            ("F1", 5),
            ("F2", 6),
            ("F3", 7),
            ("F4", 8),
        ];
        for (tag, channel) in expected {
            let origin = Origin::parse(tag).unwrap();
            assert_eq!(origin.channel(), channel);
            assert_eq!(origin.as_str(), tag);
        }
    }

    #[test]
    fn channel_mapping_is_injective() {
        let mut seen = std::collections::HashSet::new();
        for origin in Origin::ALL {
            assert!(seen.insert(origin.channel()));
        }
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn unknown_origins_fail_closed() {
        for tag in ["C5", "F0", "X1", "c1", "", "C", "C10"] {
            let err = Origin::parse(tag).unwrap_err();
            assert!(matches!(err, DecodeError::UnknownChannel { .. }), "{tag}");
        }
    }

    #[test]
    fn labels() {
        assert_eq!(Origin::C1.label(), "Channel 1");
        assert_eq!(Origin::F4.label(), "Channel 8");
    }

    #[test]
    fn function_detection() {
        assert!(!Origin::C4.is_function());
        assert!(Origin::F1.is_function());
    }

    #[test]
    fn analog_and_function_constructors() {
        assert_eq!(Origin::analog(1), Some(Origin::C1));
        assert_eq!(Origin::analog(4), Some(Origin::C4));
        assert_eq!(Origin::analog(5), None);
        assert_eq!(Origin::function(1), Some(Origin::F1));
        assert_eq!(Origin::function(0), None);
    }

    #[test]
    fn origin_display_and_fromstr() {
        assert_eq!(Origin::C3.to_string(), "C3");
        assert_eq!("F2".parse::<Origin>().unwrap(), Origin::F2);
        assert!("Q9".parse::<Origin>().is_err());
    }

    fn sample_waveform(n: usize) -> Waveform {
        Waveform {
            origin: Origin::C1,
            y_gain: 1.0,
            y_offset: 0.0,
            y_unit: 'V',
            x_gain: 1.0,
            x_offset: 0.0,
            x_unit: 'S',
            declared_size: n as i32,
            source: 0,
            samples: (0..n).map(|i| i as f32).collect(),
            time: (0..n).map(|i| i as f32).collect(),
        }
    }

    #[test]
    fn range_clamps_indices() {
        let wf = sample_waveform(10);

        let (time, samples) = wf.range(2, 5);
        assert_eq!(samples, &[2.0, 3.0, 4.0]);
        assert_eq!(time.len(), samples.len());

        // stop beyond the end clamps to len
        let (_, samples) = wf.range(8, 100);
        assert_eq!(samples, &[8.0, 9.0]);

        // inverted range yields an empty slice
        let (time, samples) = wf.range(7, 3);
        assert!(time.is_empty());
        assert!(samples.is_empty());
    }

    #[test]
    fn len_and_is_empty() {
        let wf = sample_waveform(3);
        assert_eq!(wf.len(), 3);
        assert!(!wf.is_empty());
        assert!(sample_waveform(0).is_empty());
    }
}
