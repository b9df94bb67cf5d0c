//! Network client for LeCroy oscilloscopes
//!
//! This module provides:
//! - VICP packet framing (vicp)
//! - An async command/response client over any byte stream
//! - Typed wrappers for the remote commands used during acquisition
//!
//! The client issues ASCII commands and returns raw response bytes; waveform
//! responses are handed to the decoder, everything else is parsed in place.
//! Transport concerns (timeouts, settle delays between commands) live here,
//! never in the decoder.

pub mod vicp;

use crate::decoder::{DecodeError, Origin, Waveform};
use crate::sample::Sample;
use bytes::BytesMut;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tracing::{debug, info};

use vicp::Header;

/// Scope client error type
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("VICP protocol error: {0}")]
    Protocol(String),

    #[error("malformed response to {query:?}: {reason}")]
    Response { query: String, reason: String },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Result type alias using ScopeError
pub type ScopeResult<T> = Result<T, ScopeError>;

/// Connection settings for the instrument link
#[derive(Debug, Clone)]
pub struct ScopeConfig {
    /// Instrument host name or IP address
    pub host: String,
    /// VICP TCP port
    pub port: u16,
    /// Timeout for each read on the control link, in milliseconds
    pub read_timeout_ms: u64,
    /// Settle delay after setup commands, in milliseconds
    pub settle_ms: u64,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            host: "192.168.0.40".to_string(),
            port: vicp::DEFAULT_PORT,
            read_timeout_ms: 5000,
            settle_ms: 50,
        }
    }
}

/// Trigger mode of the acquisition system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    Auto,
    Normal,
    Single,
    Stop,
}

impl TriggerMode {
    /// Remote-command mnemonic
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerMode::Auto => "AUTO",
            TriggerMode::Normal => "NORM",
            TriggerMode::Single => "SINGLE",
            TriggerMode::Stop => "STOP",
        }
    }

    fn parse(response: &str) -> ScopeResult<Self> {
        match response.trim() {
            "AUTO" => Ok(TriggerMode::Auto),
            "NORM" => Ok(TriggerMode::Normal),
            "SINGLE" => Ok(TriggerMode::Single),
            "STOP" => Ok(TriggerMode::Stop),
            other => Err(ScopeError::Response {
                query: "TRMD?".to_string(),
                reason: format!("unknown trigger mode {other:?}"),
            }),
        }
    }
}

impl fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter statistics from a `PAST? CUST` readout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub value: f64,
    pub average: f64,
    pub sigma: f64,
    pub high: f64,
    pub low: f64,
    pub sweeps: f64,
}

/// Parse a `PAST? CUST, Pn` response into a [`Measurement`]
///
/// The response is a flat list of `name,value` pairs; values carry a unit
/// suffix after a space. Any missing or non-numeric field is an error, never
/// a placeholder.
fn parse_measurement(response: &str) -> ScopeResult<Measurement> {
    let fields: Vec<&str> = response.split(',').map(str::trim).collect();
    let numeric = |index: usize| -> ScopeResult<f64> {
        let field = fields.get(index).ok_or_else(|| ScopeError::Response {
            query: "PAST? CUST".to_string(),
            reason: format!("missing field {index} in {response:?}"),
        })?;
        let token = field.split_whitespace().next().unwrap_or("");
        token.parse().map_err(|_| ScopeError::Response {
            query: "PAST? CUST".to_string(),
            reason: format!("field {index} is not a number: {field:?}"),
        })
    };

    Ok(Measurement {
        average: numeric(5)?,
        high: numeric(7)?,
        value: numeric(9)?,
        low: numeric(11)?,
        sigma: numeric(13)?,
        sweeps: numeric(15)?,
    })
}

/// Async command/response client for a LeCroy oscilloscope
///
/// Generic over the byte stream so tests can substitute a mock transport for
/// the TCP connection.
pub struct ScopeClient<S> {
    stream: S,
    sequence: u8,
    read_timeout: Duration,
    settle: Duration,
}

impl ScopeClient<TcpStream> {
    /// Connect to the instrument over TCP
    pub async fn connect(config: &ScopeConfig) -> ScopeResult<Self> {
        let addr = format!("{}:{}", config.host, config.port);
        let stream = TcpStream::connect(&addr).await?;
        stream.set_nodelay(true)?;
        info!(addr = %addr, "connected to oscilloscope");
        Ok(Self::with_stream(stream, config))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> ScopeClient<S> {
    /// Build a client over an already-connected stream
    pub fn with_stream(stream: S, config: &ScopeConfig) -> Self {
        Self {
            stream,
            sequence: 0,
            read_timeout: Duration::from_millis(config.read_timeout_ms),
            settle: Duration::from_millis(config.settle_ms),
        }
    }

    /// Send a command without waiting for a response
    pub async fn write(&mut self, command: &str) -> ScopeResult<()> {
        self.sequence = self.sequence.wrapping_add(1);
        let header = Header::command(self.sequence, command.len() as u32);
        self.stream.write_all(&header.to_bytes()).await?;
        self.stream.write_all(command.as_bytes()).await?;
        self.stream.flush().await?;
        debug!(command, sequence = self.sequence, "command sent");
        Ok(())
    }

    /// Read one complete logical response, accumulating packets until EOI
    pub async fn read_raw(&mut self) -> ScopeResult<Vec<u8>> {
        let mut message = BytesMut::new();
        loop {
            let mut head = [0u8; vicp::HEADER_SIZE];
            self.read_exact_timed(&mut head, "response header").await?;
            let header = Header::from_bytes(&head)?;

            let mut payload = vec![0u8; header.length as usize];
            self.read_exact_timed(&mut payload, "response payload")
                .await?;
            if header.is_data() {
                message.extend_from_slice(&payload);
            }
            if header.is_eoi() {
                break;
            }
        }
        Ok(message.to_vec())
    }

    /// Send a query and return the response as trimmed text
    pub async fn ask(&mut self, command: &str) -> ScopeResult<String> {
        self.write(command).await?;
        let raw = self.read_raw().await?;
        Ok(String::from_utf8_lossy(&raw)
            .trim_end_matches(['\r', '\n'])
            .to_string())
    }

    async fn read_exact_timed(&mut self, buf: &mut [u8], what: &str) -> ScopeResult<()> {
        timeout(self.read_timeout, self.stream.read_exact(buf))
            .await
            .map_err(|_| ScopeError::Timeout(what.to_string()))??;
        Ok(())
    }

    async fn settle(&self) {
        if !self.settle.is_zero() {
            sleep(self.settle).await;
        }
    }

    fn parse_f64(query: &str, response: &str) -> ScopeResult<f64> {
        response.trim().parse().map_err(|_| ScopeError::Response {
            query: query.to_string(),
            reason: format!("expected a number, got {response:?}"),
        })
    }

    // ------------------------------------------------------------------
    // Display and housekeeping
    // ------------------------------------------------------------------

    pub async fn display_on(&mut self) -> ScopeResult<()> {
        self.write("DISP ON").await
    }

    pub async fn display_off(&mut self) -> ScopeResult<()> {
        self.write("DISP OFF").await
    }

    pub async fn beep(&mut self) -> ScopeResult<()> {
        self.write("BUZZ BEEP").await
    }

    pub async fn clear_sweeps(&mut self) -> ScopeResult<()> {
        self.write("CLSW").await
    }

    /// Reset a function trace
    pub async fn function_reset(&mut self, function: Origin) -> ScopeResult<()> {
        self.write(&format!("{function}:FRST")).await
    }

    // ------------------------------------------------------------------
    // Trigger control
    // ------------------------------------------------------------------

    pub async fn trigger_mode(&mut self) -> ScopeResult<TriggerMode> {
        let response = self.ask("TRMD?").await?;
        TriggerMode::parse(&response)
    }

    pub async fn set_trigger_mode(&mut self, mode: TriggerMode) -> ScopeResult<()> {
        self.write(&format!("TRMD {mode}")).await
    }

    /// True once the acquisition has stopped on a trigger
    pub async fn has_triggered(&mut self) -> ScopeResult<bool> {
        Ok(self.trigger_mode().await? == TriggerMode::Stop)
    }

    pub async fn trigger_level(&mut self) -> ScopeResult<f64> {
        let response = self.ask("TRLV?").await?;
        Self::parse_f64("TRLV?", &response)
    }

    pub async fn set_trigger_level(&mut self, level: f64) -> ScopeResult<()> {
        self.write(&format!("TRLV {level}")).await?;
        self.settle().await;
        Ok(())
    }

    pub async fn arm(&mut self) -> ScopeResult<()> {
        self.write("ARM").await?;
        self.settle().await;
        Ok(())
    }

    pub async fn wait_acquisition(&mut self) -> ScopeResult<()> {
        self.write("WAIT").await
    }

    pub async fn arm_and_wait(&mut self) -> ScopeResult<()> {
        self.write("ARM;WAIT").await
    }

    // ------------------------------------------------------------------
    // Timebase and vertical setup
    // ------------------------------------------------------------------

    pub async fn time_div(&mut self) -> ScopeResult<f64> {
        let response = self.ask("TDIV?").await?;
        Self::parse_f64("TDIV?", &response)
    }

    /// Set the time per division, e.g. `"10US"` or `"1E-5"`
    pub async fn set_time_div(&mut self, time_div: &str) -> ScopeResult<()> {
        self.write(&format!("TDIV {time_div}")).await?;
        self.settle().await;
        Ok(())
    }

    pub async fn volt_div(&mut self, channel: u8) -> ScopeResult<f64> {
        let query = format!("C{channel}:VDIV?");
        let response = self.ask(&query).await?;
        Self::parse_f64(&query, &response)
    }

    pub async fn set_volt_div(&mut self, channel: u8, volt_div: f64) -> ScopeResult<()> {
        self.write(&format!("C{channel}:VDIV {volt_div}")).await?;
        self.settle().await;
        Ok(())
    }

    pub async fn vert_offset(&mut self, channel: u8) -> ScopeResult<f64> {
        let query = format!("C{channel}:OFST?");
        let response = self.ask(&query).await?;
        Self::parse_f64(&query, &response)
    }

    pub async fn set_vert_offset(&mut self, channel: u8, offset: f64) -> ScopeResult<()> {
        self.write(&format!("C{channel}:OFST {offset}")).await
    }

    pub async fn auto_setup(&mut self, channel: u8) -> ScopeResult<()> {
        self.write(&format!("C{channel}:ASET")).await
    }

    /// Put the instrument into binary waveform readout mode
    ///
    /// Selects 16-bit binary transfers, suppresses command headers in query
    /// responses, and resets the waveform transfer window to the full record.
    pub async fn prepare_data_taking(&mut self) -> ScopeResult<()> {
        self.write("CFMT DEF9,WORD,BIN").await?;
        self.write("CHDR OFF").await?;
        self.write("WFSU SP,0,NP,0,FP,0,SN,0").await?;
        self.settle().await;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Parameter readout
    // ------------------------------------------------------------------

    /// Read parameter values for a source, e.g. `"AMPL,AREA"`
    ///
    /// Returns `None` when no parameter was requested.
    pub async fn parameter(
        &mut self,
        source: Origin,
        parameter: &str,
    ) -> ScopeResult<Option<String>> {
        if parameter.is_empty() {
            return Ok(None);
        }
        let response = self.ask(&format!("{source}:PAVA? {parameter}")).await?;
        Ok(Some(response))
    }

    /// Read the setup of a custom parameter slot
    pub async fn custom_parameter_settings(&mut self, number: u8) -> ScopeResult<String> {
        let response = self.ask(&format!("PACU? {number}")).await?;
        Ok(response.replace('\n', ""))
    }

    /// Read accumulated statistics for a custom parameter slot (1-8)
    pub async fn measurement(&mut self, number: u8) -> ScopeResult<Measurement> {
        if !(1..=8).contains(&number) {
            return Err(ScopeError::InvalidParameter(format!(
                "custom parameter number {number} (expected 1-8)"
            )));
        }
        let response = self.ask(&format!("PAST? CUST, P{number}")).await?;
        parse_measurement(&response.replace('\n', ""))
    }

    // ------------------------------------------------------------------
    // Waveform readout
    // ------------------------------------------------------------------

    /// Read the raw waveform buffer for a source
    ///
    /// With `arm_first` the readout is preceded by `ARM;WAIT` so a fresh
    /// acquisition completes before the transfer.
    pub async fn raw_waveform(&mut self, source: Origin, arm_first: bool) -> ScopeResult<Vec<u8>> {
        let mut command = String::new();
        if arm_first {
            command.push_str("ARM;WAIT;");
        }
        command.push_str(&format!("{source}:WF? {source}"));
        self.write(&command).await?;
        self.read_raw().await
    }

    /// Read and decode one waveform
    pub async fn waveform(&mut self, source: Origin, arm_first: bool) -> ScopeResult<Waveform> {
        let raw = self.raw_waveform(source, arm_first).await?;
        debug!(source = %source, bytes = raw.len(), "waveform read");
        Ok(Waveform::decode(&raw)?)
    }

    /// Store waveforms to the instrument's local disk
    pub async fn store_waveforms(&mut self, channels: &[u8]) -> ScopeResult<()> {
        let mut command = String::from("ARM;WAIT");
        for channel in channels {
            command.push_str(&format!(";STO C{channel},FILE"));
        }
        self.write(&command).await?;
        self.settle().await;
        Ok(())
    }

    /// Acquire one sample: a waveform (and optional parameter reading) for
    /// every requested channel and function
    ///
    /// The first readout is preceded by `ARM;WAIT` so all sources come from
    /// the same acquisition.
    pub async fn acquire_sample(
        &mut self,
        channels: &[u8],
        functions: &[u8],
        parameter: Option<&str>,
    ) -> ScopeResult<Sample> {
        let mut sample = Sample::new();
        let mut first = true;

        let mut sources = Vec::new();
        for &channel in channels {
            sources.push(Origin::analog(channel).ok_or_else(|| {
                ScopeError::InvalidParameter(format!("channel {channel} (expected 1-4)"))
            })?);
        }
        for &function in functions {
            sources.push(Origin::function(function).ok_or_else(|| {
                ScopeError::InvalidParameter(format!("function {function} (expected 1-4)"))
            })?);
        }

        for origin in sources {
            let waveform = self.waveform(origin, first).await?;
            first = false;
            let reading = match parameter {
                Some(p) => self.parameter(origin, p).await?,
                None => None,
            };
            sample.add_response(waveform, reading);
        }
        Ok(sample)
    }
}
