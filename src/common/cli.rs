//! CLI argument parsing for the acquisition tools
//!
//! Uses clap's derive macro; arguments shared between binaries live in
//! `CommonArgs` and are flattened into each binary's own struct.

use clap::Parser;
use std::path::PathBuf;

/// Common arguments shared across binaries
#[derive(Parser, Debug, Clone)]
pub struct CommonArgs {
    /// Path to configuration file
    #[arg(short = 'f', long = "config", default_value = "config.toml")]
    pub config_file: String,
}

/// Arguments for the acquire binary
#[derive(Parser, Debug, Clone)]
#[command(about = "Acquire waveforms from a LeCroy oscilloscope")]
pub struct AcquireArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Instrument host name or IP address (overrides config)
    #[arg(short = 'i', long = "ip")]
    pub host: Option<String>,

    /// Channel to read, can be given multiple times (1-4)
    #[arg(short = 'c', long = "channel", action = clap::ArgAction::Append)]
    pub channels: Vec<u8>,

    /// Function trace to read, can be given multiple times (1-4)
    #[arg(long = "function", action = clap::ArgAction::Append)]
    pub functions: Vec<u8>,

    /// Parameter to read per source, can be given multiple times
    /// (e.g. AMPL, AREA, PKPK, RISE)
    #[arg(short = 'p', long = "parameter", action = clap::ArgAction::Append)]
    pub parameters: Vec<String>,

    /// Time per division to set before acquiring, e.g. 10US
    #[arg(short = 't', long = "time-div")]
    pub time_div: Option<String>,

    /// Number of samples to take
    #[arg(short = 'n', long = "count")]
    pub count: Option<u32>,

    /// Output directory for sample files
    #[arg(short = 'o', long = "output")]
    pub output_dir: Option<String>,

    /// Store waveforms to the instrument's local disk instead of reading
    /// them back
    #[arg(long)]
    pub local_store: bool,
}

impl AcquireArgs {
    /// Parameter list joined the way the instrument expects it
    pub fn parameter(&self) -> Option<String> {
        if self.parameters.is_empty() {
            None
        } else {
            Some(self.parameters.join(","))
        }
    }
}

/// Arguments for the wfdump binary
#[derive(Parser, Debug, Clone)]
#[command(about = "Decode and inspect a raw waveform file")]
pub struct DumpArgs {
    /// Raw waveform file to decode
    pub file: PathBuf,

    /// Print the decoded waveform as JSON
    #[arg(long)]
    pub json: bool,

    /// First sample index to print
    #[arg(long, default_value = "0")]
    pub start: usize,

    /// Last sample index to print (exclusive); defaults to the whole record
    #[arg(long)]
    pub stop: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_args_default() {
        let args = CommonArgs::try_parse_from(["test"]).unwrap();
        assert_eq!(args.config_file, "config.toml");
    }

    #[test]
    fn test_acquire_args_default() {
        let args = AcquireArgs::try_parse_from(["test"]).unwrap();
        assert_eq!(args.common.config_file, "config.toml");
        assert!(args.channels.is_empty());
        assert!(args.functions.is_empty());
        assert_eq!(args.parameter(), None);
        assert_eq!(args.count, None);
        assert!(!args.local_store);
    }

    #[test]
    fn test_acquire_args_multiple_channels() {
        let args = AcquireArgs::try_parse_from(["test", "-c", "1", "-c", "3"]).unwrap();
        assert_eq!(args.channels, vec![1, 3]);
    }

    #[test]
    fn test_acquire_args_parameters_joined() {
        let args =
            AcquireArgs::try_parse_from(["test", "-p", "AMPL", "-p", "AREA", "-p", "PKPK"])
                .unwrap();
        assert_eq!(args.parameter(), Some("AMPL,AREA,PKPK".to_string()));
    }

    #[test]
    fn test_acquire_args_full() {
        let args = AcquireArgs::try_parse_from([
            "test",
            "-f",
            "lab.toml",
            "--ip",
            "10.0.0.7",
            "-c",
            "1",
            "--function",
            "2",
            "-t",
            "10US",
            "-n",
            "100",
            "-o",
            "./runs",
        ])
        .unwrap();
        assert_eq!(args.common.config_file, "lab.toml");
        assert_eq!(args.host, Some("10.0.0.7".to_string()));
        assert_eq!(args.channels, vec![1]);
        assert_eq!(args.functions, vec![2]);
        assert_eq!(args.time_div, Some("10US".to_string()));
        assert_eq!(args.count, Some(100));
        assert_eq!(args.output_dir, Some("./runs".to_string()));
    }

    #[test]
    fn test_dump_args() {
        let args = DumpArgs::try_parse_from(["test", "c1.trc", "--json"]).unwrap();
        assert_eq!(args.file, PathBuf::from("c1.trc"));
        assert!(args.json);
        assert_eq!(args.start, 0);
        assert_eq!(args.stop, None);
    }

    #[test]
    fn test_dump_args_range() {
        let args =
            DumpArgs::try_parse_from(["test", "c1.trc", "--start", "10", "--stop", "20"]).unwrap();
        assert_eq!(args.start, 10);
        assert_eq!(args.stop, Some(20));
    }

    #[test]
    fn test_dump_args_require_file() {
        assert!(DumpArgs::try_parse_from(["test"]).is_err());
    }
}
