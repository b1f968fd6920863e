//! Serial link to the LED board.
//!
//! Commands are fire-and-forget: a token line is written and flushed, and
//! nothing is ever read back.

use std::io::Write;
use std::time::Duration;

use led_protocol::CommandToken;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use thiserror::Error;
use tracing::{debug, info};

/// Baud rate of the reference firmware.
pub const DEFAULT_BAUD: u32 = 9600;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("cannot open serial port {port}: {source}")]
    Open { port: String, source: serialport::Error },

    #[error("write to {port} failed: {source}")]
    Write { port: String, source: std::io::Error },

    #[error("cannot list serial ports: {0}")]
    List(#[from] serialport::Error),

    #[error("serial port {0:?} not found")]
    NotFound(String),
}

// ════════════════════════════════════════════════════════════════════════════
// CommandSink: abstraction over serialport / null (for testing)
// ════════════════════════════════════════════════════════════════════════════

/// Where command tokens go.
pub trait CommandSink {
    fn send(&mut self, token: CommandToken) -> Result<(), LinkError>;

    /// Short name for status lines.
    fn name(&self) -> &str;
}

impl<T: CommandSink + ?Sized> CommandSink for Box<T> {
    fn send(&mut self, token: CommandToken) -> Result<(), LinkError> {
        (**self).send(token)
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}

// ── serialport backend ────────────────────────────────────────────────────

pub struct SerialLink {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialLink {
    /// Open `name` at `baud`, 8N1, no flow control.
    pub fn open(name: &str, baud: u32) -> Result<Self, LinkError> {
        let port = serialport::new(name, baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(100))
            .open()
            .map_err(|source| LinkError::Open { port: name.to_string(), source })?;
        info!("opened serial port {} at {} baud", name, baud);
        Ok(SerialLink { port, name: name.to_string() })
    }
}

impl CommandSink for SerialLink {
    fn send(&mut self, token: CommandToken) -> Result<(), LinkError> {
        self.port
            .write_all(token.line().as_bytes())
            .and_then(|_| self.port.flush())
            .map_err(|source| LinkError::Write { port: self.name.clone(), source })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ── null backend (dry run) ────────────────────────────────────────────────

/// Accepts every command and discards it.
#[derive(Debug, Default)]
pub struct NullLink;

impl CommandSink for NullLink {
    fn send(&mut self, token: CommandToken) -> Result<(), LinkError> {
        debug!("dry run: {}", token);
        Ok(())
    }

    fn name(&self) -> &str {
        "dry-run"
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Port discovery
// ════════════════════════════════════════════════════════════════════════════

/// Names of the serial ports the OS reports.
pub fn available_ports() -> Result<Vec<String>, LinkError> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(|p| p.port_name)
        .collect())
}

/// Resolve what the user typed at the port prompt.
///
/// * an exact port name is taken as is;
/// * a bare number `N` picks `COMN` if such a port exists, otherwise the
///   `N`th entry (1-based) of `ports`.
pub fn resolve_port(choice: &str, ports: &[String]) -> Result<String, LinkError> {
    let choice = choice.trim();
    if let Some(p) = ports.iter().find(|p| p.as_str() == choice) {
        return Ok(p.clone());
    }
    if let Ok(n) = choice.parse::<usize>() {
        let com = format!("COM{}", n);
        if let Some(p) = ports.iter().find(|p| **p == com) {
            return Ok(p.clone());
        }
        if let Some(p) = n.checked_sub(1).and_then(|i| ports.get(i)) {
            return Ok(p.clone());
        }
    }
    Err(LinkError::NotFound(choice.to_string()))
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
