//! Top-level application loop.
//!
//! `AppState` owns the [`Perception`] step and the status line. [`run`]
//! opens the serial link, starts the landmark source, and then drains frames
//! into the perception step while the overlay (if any) renders them.

use std::io::{self, BufReader};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use anyhow::{bail, Context};
use led_protocol::Thresholds;
use tracing::{info, warn};

use crate::landmark::{FrameGeometry, HandFrame};
use crate::link::{CommandSink, NullLink, SerialLink, DEFAULT_BAUD};
use crate::perception::{EmitPolicy, Observation, Perception, PerceptionMode, Step};
use crate::source::{
    spawn_landmark_source, DetectorCommand, DetectorGuard, DetectorSource, ReaderSource, SimInput,
    SimSource, SourceEvent,
};
use crate::visualizer::Visualizer;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Where hand landmarks come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Mouse-driven hand in the overlay window.
    Sim,
    /// Spawn a detector process that owns the camera.
    Detector(DetectorCommand),
    /// Detection lines piped into our stdin.
    Stdin,
    #[cfg(feature = "leap")]
    Leap,
}

/// Configuration for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub source: SourceKind,
    /// Serial port of the LED board; `None` runs without one (dry run).
    pub port: Option<String>,
    pub baud: u32,
    pub thresholds: Thresholds,
    pub geometry: FrameGeometry,
    pub policy: EmitPolicy,
    pub mode: PerceptionMode,
    /// Skip the overlay window.
    pub headless: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            source: SourceKind::Sim,
            port: None,
            baud: DEFAULT_BAUD,
            thresholds: Thresholds::default(),
            geometry: FrameGeometry::default(),
            policy: EmitPolicy::default(),
            mode: PerceptionMode::default(),
            headless: false,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    perception: Perception,
    link_name: String,
    pub status: String,
}

impl AppState {
    pub fn new(cfg: &AppConfig, link_name: &str) -> Self {
        AppState {
            perception: Perception::new(cfg.thresholds, cfg.geometry, cfg.policy).with_mode(cfg.mode),
            link_name: link_name.to_string(),
            status: format!("Ready - link: {}", link_name),
        }
    }

    /// Run one frame through perception and refresh the status line.
    pub fn handle_frame(&mut self, frame: &HandFrame, sink: &mut dyn CommandSink) -> Step {
        let step = self.perception.step(frame, sink);
        let stats = self.perception.stats();

        let what = match &step {
            Step::Skipped => "no hand".to_string(),
            Step::Unchanged(t) => format!("holding {}", t),
            Step::Sent(t) => format!("sent {}", t),
            Step::SendFailed(t, _) => format!("send {} failed", t),
        };
        let distance = match self.perception.last_observation() {
            Observation::Measured { pinch, count, .. } => match self.perception.mode() {
                PerceptionMode::Pinch => format!("{:.0}px = {} leds", pinch.distance, count),
                PerceptionMode::Fingers => format!("{} fingers = {} leds", count, count),
            },
            Observation::NoHand => "-".to_string(),
        };
        self.status = format!(
            "{}  {}  |  {}  frames {} sent {} failed {}",
            distance, what, self.link_name, stats.frames, stats.sent, stats.failures
        );
        step
    }

    pub fn perception(&self) -> &Perception {
        &self.perception
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// Startup is strict: a port that cannot be opened or a camera/detector that
/// cannot be started ends the program before any frame is processed. After
/// that nothing is fatal; failed sends are logged and the loop goes on.
pub fn run(cfg: AppConfig) -> anyhow::Result<()> {
    if cfg.headless && cfg.source == SourceKind::Sim {
        bail!("--headless needs a camera or piped landmarks; the simulation is driven by the window");
    }

    // ── Link first: no port, no point starting the camera ────────────────
    let mut link = open_link(&cfg)?;

    // ── Landmark source ───────────────────────────────────────────────────
    // `_detector` keeps the detector process (and its camera) alive until
    // this function returns, whichever way it returns.
    let RunningSource { events, sim_tx, detector: _detector } = start_source(&cfg.source)?;

    let mut app = AppState::new(&cfg, link.name());

    if cfg.headless {
        info!("running headless");
        drive(&events, &mut app, link.as_mut())
    } else {
        let mut vis = Visualizer::new(cfg.geometry, sim_tx).context("cannot open overlay window")?;
        run_windowed(&mut vis, &events, &mut app, link.as_mut())
    }
}

fn open_link(cfg: &AppConfig) -> anyhow::Result<Box<dyn CommandSink>> {
    match &cfg.port {
        Some(port) => {
            let link = SerialLink::open(port, cfg.baud)?;
            Ok(Box::new(link))
        }
        None => {
            info!("no serial port: dry run");
            Ok(Box::new(NullLink))
        }
    }
}

/// A started landmark source and whatever must outlive the loop reading it.
struct RunningSource {
    events: Receiver<SourceEvent>,
    /// Feeds the simulation from the overlay window.
    sim_tx: Option<Sender<SimInput>>,
    detector: Option<DetectorGuard>,
}

impl RunningSource {
    fn events(events: Receiver<SourceEvent>) -> Self {
        RunningSource { events, sim_tx: None, detector: None }
    }
}

fn start_source(kind: &SourceKind) -> anyhow::Result<RunningSource> {
    match kind {
        SourceKind::Sim => {
            let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
            Ok(RunningSource {
                sim_tx: Some(sim_tx),
                ..RunningSource::events(spawn_landmark_source(SimSource { rx: sim_rx }))
            })
        }
        SourceKind::Detector(cmd) => {
            let (source, guard) = DetectorSource::start(cmd)
                .with_context(|| format!("camera unavailable ({})", cmd.display()))?;
            Ok(RunningSource {
                detector: Some(guard),
                ..RunningSource::events(spawn_landmark_source(source))
            })
        }
        SourceKind::Stdin => {
            info!("reading landmarks from stdin");
            Ok(RunningSource::events(spawn_landmark_source(ReaderSource::new(BufReader::new(io::stdin())))))
        }
        #[cfg(feature = "leap")]
        SourceKind::Leap => Ok(RunningSource::events(spawn_landmark_source(crate::source::LeapSource))),
    }
}

/// Block on source events until the source closes.
pub fn drive(
    events: &Receiver<SourceEvent>,
    app: &mut AppState,
    sink: &mut dyn CommandSink,
) -> anyhow::Result<()> {
    for event in events.iter() {
        if !handle_event(event, app, sink)? {
            break;
        }
    }
    Ok(())
}

/// Returns `Ok(false)` once the source has closed.
fn handle_event(
    event: SourceEvent,
    app: &mut AppState,
    sink: &mut dyn CommandSink,
) -> anyhow::Result<bool> {
    match event {
        SourceEvent::Frame(frame) => {
            app.handle_frame(&frame, sink);
            Ok(true)
        }
        SourceEvent::Closed => {
            info!("landmark source closed");
            Ok(false)
        }
        SourceEvent::Failed(e) => bail!("landmark source failed: {}", e),
    }
}

fn run_windowed(
    vis: &mut Visualizer,
    events: &Receiver<SourceEvent>,
    app: &mut AppState,
    sink: &mut dyn CommandSink,
) -> anyhow::Result<()> {
    while vis.is_open() {
        // 1. Poll window input (the simulation source is fed from here)
        if !vis.poll_input() {
            break;
        }

        // 2. Drain landmark events
        loop {
            match events.try_recv() {
                Ok(event) => {
                    if !handle_event(event, app, sink)? {
                        return Ok(());
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("landmark source went away");
                    return Ok(());
                }
            }
        }

        // 3. Render
        let p = app.perception();
        vis.render(&p.last_observation(), p.last_sent(), p.thresholds(), &app.status);
    }
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
