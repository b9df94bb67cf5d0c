//! Sample aggregation and persistence
//!
//! A [`Sample`] collects everything read out for one acquisition: the decoded
//! waveform per requested channel or function, plus the optional parameter
//! reading that came with it. Samples are persisted one per file: an 8-byte
//! magic, a format version, then a length-prefixed MessagePack body.

use crate::decoder::{Origin, Waveform};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Magic bytes for sample files
pub const FILE_MAGIC: [u8; 8] = *b"LCSAMP01";

/// Current sample file format version
pub const FORMAT_VERSION: u32 = 1;

/// Sample file errors
#[derive(Debug, Error)]
pub enum SampleFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid sample file magic")]
    InvalidMagic,

    #[error("unsupported sample file version {0}")]
    UnsupportedVersion(u32),

    #[error("serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),

    #[error("deserialization error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),
}

/// A parameter reading attached to one waveform readout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterReading {
    /// Source the reading was taken from
    pub origin: Origin,
    /// Raw `PAVA?` response text
    pub response: String,
}

/// One acquisition's worth of waveforms and parameter readings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    /// When the sample was assembled
    pub taken_at: DateTime<Utc>,
    /// Decoded waveforms, in readout order
    pub waveforms: Vec<Waveform>,
    /// Parameter readings for waveforms that had one
    pub parameters: Vec<ParameterReading>,
}

impl Default for Sample {
    fn default() -> Self {
        Self::new()
    }
}

impl Sample {
    /// Create an empty sample stamped with the current time
    pub fn new() -> Self {
        Self {
            taken_at: Utc::now(),
            waveforms: Vec::new(),
            parameters: Vec::new(),
        }
    }

    /// Add one readout response: a decoded waveform and its optional
    /// parameter reading
    pub fn add_response(&mut self, waveform: Waveform, parameter: Option<String>) {
        if let Some(response) = parameter {
            self.parameters.push(ParameterReading {
                origin: waveform.origin,
                response,
            });
        }
        self.waveforms.push(waveform);
    }

    /// Number of waveforms in the sample
    pub fn len(&self) -> usize {
        self.waveforms.len()
    }

    /// True if the sample holds no waveforms
    pub fn is_empty(&self) -> bool {
        self.waveforms.is_empty()
    }

    /// Waveform for a given origin, if present
    pub fn waveform(&self, origin: Origin) -> Option<&Waveform> {
        self.waveforms.iter().find(|w| w.origin == origin)
    }

    /// Parameter reading for a given origin, if present
    pub fn parameter(&self, origin: Origin) -> Option<&ParameterReading> {
        self.parameters.iter().find(|p| p.origin == origin)
    }

    /// Serialize to MessagePack bytes (body only, no file header)
    pub fn to_msgpack(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::to_vec(self)
    }

    /// Deserialize from MessagePack bytes
    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
        rmp_serde::from_slice(bytes)
    }

    /// Write the sample to a writer in the file format
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), SampleFileError> {
        let body = self.to_msgpack()?;
        writer.write_all(&FILE_MAGIC)?;
        writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
        writer.write_all(&(body.len() as u32).to_le_bytes())?;
        writer.write_all(&body)?;
        Ok(())
    }

    /// Read a sample from a reader in the file format
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, SampleFileError> {
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;
        if magic != FILE_MAGIC {
            return Err(SampleFileError::InvalidMagic);
        }

        let mut version_bytes = [0u8; 4];
        reader.read_exact(&mut version_bytes)?;
        let version = u32::from_le_bytes(version_bytes);
        if version != FORMAT_VERSION {
            return Err(SampleFileError::UnsupportedVersion(version));
        }

        let mut len_bytes = [0u8; 4];
        reader.read_exact(&mut len_bytes)?;
        let len = u32::from_le_bytes(len_bytes) as usize;

        let mut body = vec![0u8; len];
        reader.read_exact(&mut body)?;
        Ok(Self::from_msgpack(&body)?)
    }

    /// Save the sample to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SampleFileError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Load a sample from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SampleFileError> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::read_from(&mut reader)
    }
}

/// Writes a run of samples under a directory with timestamped, sequence
/// numbered file names
#[derive(Debug)]
pub struct SampleWriter {
    dir: PathBuf,
    prefix: String,
    sequence: u32,
}

impl SampleWriter {
    /// Create a writer, creating the output directory if needed
    pub fn new<P: AsRef<Path>>(dir: P, prefix: &str) -> Result<Self, SampleFileError> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            prefix: prefix.to_string(),
            sequence: 0,
        })
    }

    /// File name for a sample at the current sequence number
    fn file_name(&self, sample: &Sample) -> String {
        format!(
            "{}_{}_{:04}.wfs",
            self.prefix,
            sample.taken_at.format("%Y%m%d_%H%M%S"),
            self.sequence
        )
    }

    /// Write a sample, returning the path it was stored at
    pub fn write(&mut self, sample: &Sample) -> Result<PathBuf, SampleFileError> {
        let path = self.dir.join(self.file_name(sample));
        sample.save(&path)?;
        self.sequence += 1;
        Ok(path)
    }

    /// Number of samples written so far
    pub fn written(&self) -> u32 {
        self.sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_waveform(origin: Origin) -> Waveform {
        Waveform {
            origin,
            y_gain: 0.002,
            y_offset: -0.01,
            y_unit: 'V',
            x_gain: 1e-9,
            x_offset: 5e-7,
            x_unit: 'S',
            declared_size: 3,
            source: 0,
            samples: vec![0.21, -0.09, 0.01],
            time: vec![-5e-7, -4.99e-7, -4.98e-7],
        }
    }

    #[test]
    fn add_response_tracks_parameters_per_origin() {
        let mut sample = Sample::new();
        sample.add_response(test_waveform(Origin::C1), Some("AMPL,0.2 V,OK".to_string()));
        sample.add_response(test_waveform(Origin::F2), None);

        assert_eq!(sample.len(), 2);
        assert!(!sample.is_empty());
        assert!(sample.waveform(Origin::C1).is_some());
        assert!(sample.waveform(Origin::C2).is_none());
        assert_eq!(
            sample.parameter(Origin::C1).unwrap().response,
            "AMPL,0.2 V,OK"
        );
        assert!(sample.parameter(Origin::F2).is_none());
    }

    #[test]
    fn msgpack_roundtrip() {
        let mut sample = Sample::new();
        sample.add_response(test_waveform(Origin::C3), None);

        let bytes = sample.to_msgpack().unwrap();
        let restored = Sample::from_msgpack(&bytes).unwrap();

        assert_eq!(restored.len(), 1);
        let wf = restored.waveform(Origin::C3).unwrap();
        assert_eq!(wf.samples, vec![0.21, -0.09, 0.01]);
        assert_eq!(wf.y_unit, 'V');
    }

    #[test]
    fn file_format_roundtrip_in_memory() {
        let mut sample = Sample::new();
        sample.add_response(test_waveform(Origin::C1), Some("AMPL,0.2 V".to_string()));

        let mut buf = Vec::new();
        sample.write_to(&mut buf).unwrap();
        assert_eq!(&buf[0..8], &FILE_MAGIC);

        let mut cursor = std::io::Cursor::new(buf);
        let restored = Sample::read_from(&mut cursor).unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.parameters.len(), 1);
    }

    #[test]
    fn invalid_magic_is_rejected() {
        let mut buf = Vec::new();
        Sample::new().write_to(&mut buf).unwrap();
        buf[0..8].copy_from_slice(b"NOTMAGIC");

        let mut cursor = std::io::Cursor::new(buf);
        let err = Sample::read_from(&mut cursor).unwrap_err();
        assert!(matches!(err, SampleFileError::InvalidMagic));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let mut buf = Vec::new();
        Sample::new().write_to(&mut buf).unwrap();
        buf[8..12].copy_from_slice(&99u32.to_le_bytes());

        let mut cursor = std::io::Cursor::new(buf);
        let err = Sample::read_from(&mut cursor).unwrap_err();
        assert!(matches!(err, SampleFileError::UnsupportedVersion(99)));
    }

    #[test]
    fn writer_names_files_by_prefix_and_sequence() {
        let mut writer = SampleWriter {
            dir: PathBuf::from("/tmp"),
            prefix: "run7".to_string(),
            sequence: 12,
        };
        let sample = Sample::new();
        let name = writer.file_name(&sample);
        assert!(name.starts_with("run7_"));
        assert!(name.ends_with("_0012.wfs"));
        writer.sequence += 1;
        assert!(writer.file_name(&sample).ends_with("_0013.wfs"));
    }
}
