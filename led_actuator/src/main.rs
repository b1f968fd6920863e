//! led_bench: runs the LED actuator loop on a host, standing in for the
//! microcontroller. Reads command lines from a serial port (or stdin) on a
//! fixed tick and logs the resulting LED pattern.
//!
//! ```text
//! led_bench --port /dev/ttyUSB0 --baud 9600
//! printf 'TWO\nBANANA\nFIVE\n' | led_bench --stdin
//! ```

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serialport::{DataBits, Parity, SerialPort, StopBits};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use led_actuator::{Actuator, ByteSource, LedBank, RecordingPins, Report, TickConfig};

const DEFAULT_BAUD: u32 = 9600;

// ════════════════════════════════════════════════════════════════════════════
// Byte sources
// ════════════════════════════════════════════════════════════════════════════

/// A real serial port, polled with `bytes_to_read` so reads never block.
struct SerialSource {
    port: Box<dyn SerialPort>,
}

impl ByteSource for SerialSource {
    fn read_available(&mut self, buf: &mut [u8]) -> usize {
        let pending = match self.port.bytes_to_read() {
            Ok(n) => n as usize,
            Err(e) => {
                warn!("serial poll failed: {}", e);
                return 0;
            }
        };
        if pending == 0 {
            return 0;
        }
        let want = pending.min(buf.len());
        match self.port.read(&mut buf[..want]) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => 0,
            Err(e) => {
                warn!("serial read failed: {}", e);
                0
            }
        }
    }
}

/// Stdin, read on a helper thread so the tick loop only ever does a
/// non-blocking `try_recv`.
struct StdinSource {
    rx: Receiver<Vec<u8>>,
    pending: VecDeque<u8>,
    closed: bool,
}

impl StdinSource {
    fn spawn() -> Self {
        let (tx, rx) = mpsc::channel::<Vec<u8>>();
        thread::spawn(move || {
            let mut stdin = io::stdin().lock();
            let mut chunk = [0u8; 256];
            loop {
                match stdin.read(&mut chunk) {
                    Ok(0) | Err(_) => return,
                    Ok(n) => {
                        if tx.send(chunk[..n].to_vec()).is_err() {
                            return;
                        }
                    }
                }
            }
        });
        StdinSource { rx, pending: VecDeque::new(), closed: false }
    }

    /// Stdin hit EOF and every byte has been handed to the actuator.
    fn exhausted(&self) -> bool {
        self.closed && self.pending.is_empty()
    }
}

impl ByteSource for StdinSource {
    fn read_available(&mut self, buf: &mut [u8]) -> usize {
        loop {
            match self.rx.try_recv() {
                Ok(chunk) => self.pending.extend(chunk),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
        let n = buf.len().min(self.pending.len());
        for (slot, b) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *slot = b;
        }
        n
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Configuration
// ════════════════════════════════════════════════════════════════════════════

enum Input {
    Port(String),
    Stdin,
    Prompt,
}

struct BenchConfig {
    input: Input,
    baud: u32,
    tick: TickConfig,
    list_only: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<BenchConfig> {
    let mut cfg = BenchConfig {
        input: Input::Prompt,
        baud: DEFAULT_BAUD,
        tick: TickConfig::default(),
        list_only: false,
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--port" => {
                let p = args.next().context("--port needs a port name")?;
                cfg.input = Input::Port(p);
            }
            "--stdin" => cfg.input = Input::Stdin,
            "--baud" => {
                let b = args.next().context("--baud needs a value")?;
                cfg.baud = b.parse().with_context(|| format!("bad baud rate {:?}", b))?;
            }
            "--interval-ms" => {
                let ms = args.next().context("--interval-ms needs a value")?;
                let ms: u64 = ms.parse().with_context(|| format!("bad interval {:?}", ms))?;
                cfg.tick.period = Duration::from_millis(ms);
            }
            "--list" => cfg.list_only = true,
            other => bail!("unknown argument {:?}", other),
        }
    }
    Ok(cfg)
}

// ════════════════════════════════════════════════════════════════════════════
// main
// ════════════════════════════════════════════════════════════════════════════

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = parse_args(std::env::args().skip(1))?;

    if cfg.list_only {
        for p in serialport::available_ports().context("listing serial ports")? {
            println!("  - {}", p.port_name);
        }
        return Ok(());
    }

    println!();
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║          LED Bench — five-LED actuator loop          ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    match cfg.input {
        Input::Stdin => {
            info!("reading commands from stdin, tick every {:?}", cfg.tick.period);
            let mut actuator = Actuator::new(StdinSource::spawn(), RecordingPins::new());
            loop {
                let report = actuator.tick();
                if report.is_idle() && actuator.source_mut().exhausted() {
                    if actuator.queued() > 0 {
                        warn!("stdin closed mid-line, {} bytes never terminated", actuator.queued());
                    }
                    info!("stdin closed");
                    return Ok(());
                }
                log_report(&report, actuator.bank());
                thread::sleep(cfg.tick.period);
            }
        }
        Input::Port(name) => run_port(&name, cfg.baud, cfg.tick),
        Input::Prompt => {
            let name = prompt_port()?;
            run_port(&name, cfg.baud, cfg.tick)
        }
    }
}

fn run_port(name: &str, baud: u32, tick: TickConfig) -> Result<()> {
    let port = serialport::new(name, baud)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .timeout(Duration::from_millis(10))
        .open()
        .with_context(|| format!("opening serial port {}", name))?;
    info!("listening on {} at {} baud, tick every {:?}", name, baud, tick.period);

    let mut actuator = Actuator::new(SerialSource { port }, RecordingPins::new());
    loop {
        let report = actuator.tick();
        log_report(&report, actuator.bank());
        thread::sleep(tick.period);
    }
}

fn log_report(report: &Report, bank: &LedBank) {
    match report {
        Report::Idle => debug!("idle"),
        Report::Applied { .. } => info!("{}  {}", report, render_bank(bank)),
        Report::Unknown { .. } => warn!("{}", report),
    }
}

/// `[#][#][ ][ ][ ]  pins 2,4 on`
fn render_bank(bank: &LedBank) -> String {
    let cells: String = bank
        .states()
        .iter()
        .map(|&on| if on { "[#]" } else { "[ ]" })
        .collect();
    let on: Vec<String> = bank.pins().filter(|&(_, on)| on).map(|(p, _)| p.to_string()).collect();
    if on.is_empty() {
        format!("{}  all off", cells)
    } else {
        format!("{}  pins {} on", cells, on.join(","))
    }
}

fn prompt_port() -> Result<String> {
    let ports = serialport::available_ports().context("listing serial ports")?;
    println!("  Available serial ports:");
    for p in &ports {
        println!("    - {}", p.port_name);
    }
    let choice = read_line("  Port to listen on: ");
    let choice = choice.trim();
    if choice.is_empty() {
        bail!("no port selected");
    }
    Ok(choice.to_string())
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
