//! Landmark sources: an external detector process, a JSON stream, a
//! LeapMotion controller, or the mouse simulation.
//!
//! The public interface is [`SourceEvent`] delivered over a `mpsc` channel.
//! Consumers don't need to know whether frames came from a camera, a pipe,
//! or the simulator.
//!
//! ## Detector protocol
//!
//! The detector is any program that owns the camera and the hand-landmark
//! model. It prints `READY` once the camera is open, then one JSON object
//! per captured frame:
//!
//! ```text
//! READY
//! {"hands":[{"landmarks":[{"x":0.41,"y":0.62}, … 21 points …],"score":0.97}]}
//! {"hands":[]}
//! {"hands":[],"error":"frame grab failed"}
//! ```

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::landmark::{Hand, HandFrame, Landmark};

/// Line the detector prints once it is ready to stream frames.
pub const READY_LINE: &str = "READY";

// ════════════════════════════════════════════════════════════════════════════
// SourceEvent / SourceError
// ════════════════════════════════════════════════════════════════════════════

/// What a landmark source delivers.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceEvent {
    /// One processed camera frame (possibly with no hands in it).
    Frame(HandFrame),
    /// The source ended normally (EOF, window closed, quit key).
    Closed,
    /// The source stopped because of an error.
    Failed(String),
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to start detector {command:?}: {source}")]
    Spawn { command: String, source: std::io::Error },

    #[error("detector did not signal READY, got {0:?}")]
    NotReady(String),

    #[error("empty detector command")]
    EmptyCommand,

    #[error(
        "detector script {0:?} not found; install the detector with \
         `python3 -m pip install mediapipe opencv-python` and pass --detector \"python3 /path/to/hand_detect.py\""
    )]
    MissingScript(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed detection: {0}")]
    Json(#[from] serde_json::Error),
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait: unified interface for detector, pipe, hw and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`SourceEvent`]s over a channel.
pub trait LandmarkSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>);
}

/// Spawn a landmark source on its own thread and return the receiving end.
pub fn spawn_landmark_source<S: LandmarkSource>(source: S) -> Receiver<SourceEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// JSON detection lines
// ════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize, Debug)]
struct HandJson {
    landmarks: Vec<Landmark>,
    #[serde(default)]
    score: Option<f32>,
}

#[derive(Deserialize, Debug)]
struct DetectionJson {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

/// Parse one detector line into a frame.
///
/// A detector-side error is a perception miss: it is logged and yields an
/// empty frame rather than an `Err`.
pub fn parse_detection(line: &str) -> Result<HandFrame, SourceError> {
    let result: DetectionJson = serde_json::from_str(line)?;
    if let Some(error) = result.error {
        warn!("detector error: {}", error);
        return Ok(HandFrame::empty());
    }
    let hands = result
        .hands
        .into_iter()
        .map(|h| {
            debug!("hand: {} landmarks, score {:?}", h.landmarks.len(), h.score);
            Hand { landmarks: h.landmarks }
        })
        .collect();
    Ok(HandFrame { hands })
}

/// Read detection lines until EOF, forwarding each as a frame.
fn pump_lines<R: BufRead>(reader: R, tx: &Sender<SourceEvent>) {
    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                let _ = tx.send(SourceEvent::Failed(e.to_string()));
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_detection(&line) {
            Ok(frame) => {
                if tx.send(SourceEvent::Frame(frame)).is_err() {
                    return;
                }
            }
            Err(e) => warn!("skipping frame: {}", e),
        }
    }
    let _ = tx.send(SourceEvent::Closed);
}

// ════════════════════════════════════════════════════════════════════════════
// DetectorSource: external hand-landmark detector subprocess
// ════════════════════════════════════════════════════════════════════════════

/// Detector script shipped with this crate.
pub const DEFAULT_DETECTOR_SCRIPT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/detector/hand_detect.py");

/// How to launch the detector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectorCommand {
    /// Program followed by its arguments.
    pub argv: Vec<String>,
    /// Camera device index, passed as `--camera N`.
    pub camera: u32,
}

impl Default for DetectorCommand {
    fn default() -> Self {
        DetectorCommand {
            argv: vec!["python3".to_string(), DEFAULT_DETECTOR_SCRIPT.to_string()],
            camera: 0,
        }
    }
}

impl DetectorCommand {
    /// Split a shell-style command line on whitespace.
    pub fn from_command_line(cmd: &str, camera: u32) -> Self {
        DetectorCommand {
            argv: cmd.split_whitespace().map(str::to_string).collect(),
            camera,
        }
    }

    pub fn display(&self) -> String {
        format!("{} --camera {}", self.argv.join(" "), self.camera)
    }

    /// First argument naming a Python script that is not on disk.
    fn missing_script(&self) -> Option<&str> {
        self.argv
            .iter()
            .skip(1)
            .map(String::as_str)
            .find(|a| a.ends_with(".py") && !Path::new(a).exists())
    }
}

/// Owns the detector process. Dropping it kills the process, which releases
/// the camera and ends the matching [`DetectorSource`] stream.
#[derive(Debug)]
pub struct DetectorGuard {
    child: Child,
}

impl DetectorGuard {
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    fn shutdown(&mut self) {
        match self.child.try_wait() {
            Ok(Some(status)) => debug!("hand detector already exited: {}", status),
            _ => {
                let _ = self.child.kill();
                let _ = self.child.wait();
                info!("hand detector stopped");
            }
        }
    }
}

impl Drop for DetectorGuard {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Streams frames from the stdout of a detector subprocess.
pub struct DetectorSource {
    stdout: BufReader<ChildStdout>,
}

impl DetectorSource {
    /// Launch the detector and wait for its `READY` line. Any failure here
    /// means the camera (or the model) is unavailable.
    ///
    /// The stream goes to the reader thread; the guard stays with the caller
    /// and decides how long the process lives.
    pub fn start(cmd: &DetectorCommand) -> Result<(DetectorSource, DetectorGuard), SourceError> {
        let (program, args) = cmd.argv.split_first().ok_or(SourceError::EmptyCommand)?;
        if let Some(script) = cmd.missing_script() {
            return Err(SourceError::MissingScript(script.to_string()));
        }
        info!("starting hand detector: {}", cmd.display());

        let mut child = Command::new(program)
            .args(args)
            .arg("--camera")
            .arg(cmd.camera.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| SourceError::Spawn { command: cmd.display(), source })?;

        let stdout = child.stdout.take();
        // From here on an early return kills the process.
        let guard = DetectorGuard { child };
        let mut stdout = BufReader::new(stdout.ok_or_else(|| SourceError::NotReady("no stdout".to_string()))?);

        let mut ready = String::new();
        stdout.read_line(&mut ready)?;
        if ready.trim() != READY_LINE {
            return Err(SourceError::NotReady(ready.trim().to_string()));
        }

        info!("hand detector ready (pid {})", guard.id());
        Ok((DetectorSource { stdout }, guard))
    }
}

impl LandmarkSource for DetectorSource {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        pump_lines(self.stdout, &tx);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ReaderSource: detection lines from any reader (e.g. stdin)
// ════════════════════════════════════════════════════════════════════════════

/// Streams frames from an already-running detector piped into us.
pub struct ReaderSource<R: BufRead + Send + 'static> {
    reader: R,
}

impl<R: BufRead + Send + 'static> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        ReaderSource { reader }
    }
}

impl<R: BufRead + Send + 'static> LandmarkSource for ReaderSource<R> {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        pump_lines(self.reader, &tx);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapSource: real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Landmark source backed by a LeapMotion controller.
///
/// The thumb and index distal joints are projected onto the x/y plane and
/// normalized over a field of [`LEAP_FIELD_MM`] so the usual pixel
/// thresholds apply.
#[cfg(feature = "leap")]
pub struct LeapSource;

/// Width and height of the interaction box mapped onto one frame.
#[cfg(feature = "leap")]
pub const LEAP_FIELD_MM: f32 = 400.0;

#[cfg(feature = "leap")]
impl LandmarkSource for LeapSource {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        use leaprs::*;

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c) => c,
            Err(e) => {
                let _ = tx.send(SourceEvent::Failed(format!("LeapC connection: {:?}", e)));
                return;
            }
        };
        if let Err(e) = connection.open() {
            let _ = tx.send(SourceEvent::Failed(format!("LeapMotion device: {:?}", e)));
            return;
        }

        let normalize = |x: f32, y: f32| {
            Landmark::new(
                (x + LEAP_FIELD_MM / 2.0) / LEAP_FIELD_MM,
                1.0 - y / LEAP_FIELD_MM,
            )
        };

        loop {
            let msg = match connection.poll(100) {
                Ok(m) => m,
                Err(_) => continue,
            };

            if let Event::Tracking(frame) = msg.event() {
                let hands: Vec<Hand> = frame
                    .hands()
                    .filter_map(|h| {
                        let digits: Vec<_> = h.digits().collect();
                        if digits.len() < 2 {
                            return None;
                        }
                        let t = digits[0].distal().next_joint();
                        let i = digits[1].distal().next_joint();
                        Some(Hand::from_tips(normalize(t.x, t.y), normalize(i.x, i.y)))
                    })
                    .collect();
                if tx.send(SourceEvent::Frame(HandFrame { hands })).is_err() {
                    return;
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimSource: mouse simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Landmark source driven by [`SimInput`] events from the overlay window.
///
/// The visualizer sends one `SimInput` per rendered frame; this translator
/// turns it into a [`SourceEvent`]. This decouples the window event loop
/// from landmark handling.
pub struct SimSource {
    pub rx: Receiver<SimInput>,
}

/// Raw input from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    /// Mouse held: a hand with the given thumb and index tips.
    Pinch { thumb: Landmark, index: Landmark },
    /// Mouse released: no hand in view.
    NoHand,
    Quit,
}

impl LandmarkSource for SimSource {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        for input in self.rx {
            let event = match input {
                SimInput::Pinch { thumb, index } => {
                    SourceEvent::Frame(HandFrame::single(Hand::from_tips(thumb, index)))
                }
                SimInput::NoHand => SourceEvent::Frame(HandFrame::empty()),
                SimInput::Quit => {
                    let _ = tx.send(SourceEvent::Closed);
                    return;
                }
            };
            if tx.send(event).is_err() {
                return;
            }
        }
        let _ = tx.send(SourceEvent::Closed);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::landmarks;
    use std::io::Cursor;
    use std::time::Duration;

    fn hand_json(thumb: (f32, f32), index: (f32, f32)) -> String {
        let pts: Vec<String> = (0..landmarks::COUNT)
            .map(|i| {
                let (x, y) = match i {
                    landmarks::THUMB_TIP => thumb,
                    landmarks::INDEX_FINGER_TIP => index,
                    _ => (0.0, 0.0),
                };
                format!("{{\"x\":{},\"y\":{}}}", x, y)
            })
            .collect();
        format!("{{\"hands\":[{{\"landmarks\":[{}],\"score\":0.95}}]}}", pts.join(","))
    }

    fn recv(rx: &Receiver<SourceEvent>) -> SourceEvent {
        rx.recv_timeout(Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn parse_single_hand() {
        let frame = parse_detection(&hand_json((0.1, 0.2), (0.3, 0.4))).unwrap();
        let hand = frame.primary().unwrap();
        assert_eq!(hand.landmarks.len(), landmarks::COUNT);
        assert_eq!(hand.thumb_tip(), Some(Landmark::new(0.1, 0.2)));
        assert_eq!(hand.index_tip(), Some(Landmark::new(0.3, 0.4)));
    }

    #[test]
    fn parse_no_hands() {
        assert_eq!(parse_detection("{\"hands\":[]}").unwrap(), HandFrame::empty());
        assert_eq!(parse_detection("{}").unwrap(), HandFrame::empty());
    }

    #[test]
    fn detector_error_is_a_miss() {
        let frame = parse_detection("{\"hands\":[],\"error\":\"grab failed\"}").unwrap();
        assert_eq!(frame, HandFrame::empty());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(matches!(parse_detection("not json"), Err(SourceError::Json(_))));
    }

    #[test]
    fn reader_source_streams_then_closes() {
        let input = format!("{}\n\nnot json\n{{\"hands\":[]}}\n", hand_json((0.0, 0.0), (0.0, 0.5)));
        let rx = spawn_landmark_source(ReaderSource::new(Cursor::new(input)));
        assert!(matches!(recv(&rx), SourceEvent::Frame(f) if f.hands.len() == 1));
        assert_eq!(recv(&rx), SourceEvent::Frame(HandFrame::empty()));
        assert_eq!(recv(&rx), SourceEvent::Closed);
    }

    #[test]
    fn sim_source_translates_inputs() {
        let (tx, sim_rx) = mpsc::channel();
        let rx = spawn_landmark_source(SimSource { rx: sim_rx });
        let thumb = Landmark::new(0.2, 0.2);
        let index = Landmark::new(0.2, 0.6);
        tx.send(SimInput::Pinch { thumb, index }).unwrap();
        tx.send(SimInput::NoHand).unwrap();
        tx.send(SimInput::Quit).unwrap();
        assert_eq!(recv(&rx), SourceEvent::Frame(HandFrame::single(Hand::from_tips(thumb, index))));
        assert_eq!(recv(&rx), SourceEvent::Frame(HandFrame::empty()));
        assert_eq!(recv(&rx), SourceEvent::Closed);
    }

    #[test]
    fn missing_detector_fails_to_start() {
        let cmd = DetectorCommand::from_command_line("/nonexistent/hand-detector", 0);
        assert!(matches!(DetectorSource::start(&cmd), Err(SourceError::Spawn { .. })));
    }

    #[test]
    fn missing_script_is_reported_before_spawn() {
        let cmd = DetectorCommand::from_command_line("python3 /nonexistent/hand_detect.py", 0);
        let err = DetectorSource::start(&cmd).err().unwrap();
        assert!(matches!(&err, SourceError::MissingScript(s) if s == "/nonexistent/hand_detect.py"));
        assert!(err.to_string().contains("pip install mediapipe"));
    }

    #[test]
    fn default_detector_script_is_shipped() {
        assert_eq!(DetectorCommand::default().missing_script(), None);
    }

    #[cfg(unix)]
    fn sh_detector(script: &str) -> DetectorCommand {
        DetectorCommand { argv: vec!["sh".into(), "-c".into(), script.into()], camera: 0 }
    }

    #[cfg(unix)]
    #[test]
    fn dropping_guard_stops_detector() {
        let (source, mut guard) = DetectorSource::start(&sh_detector("echo READY; exec sleep 5")).unwrap();
        let pid = guard.id();
        let rx = spawn_landmark_source(source);
        assert!(matches!(guard.child.try_wait(), Ok(None)));

        drop(guard);
        assert_eq!(recv(&rx), SourceEvent::Closed);
        let alive = std::process::Command::new("kill")
            .args(["-0", &pid.to_string()])
            .stderr(Stdio::null())
            .status()
            .unwrap()
            .success();
        assert!(!alive, "detector pid {} still running", pid);
    }

    #[cfg(unix)]
    #[test]
    fn detector_frames_flow_while_guard_held() {
        let script = format!("echo READY; echo '{}'; exec sleep 5", hand_json((0.1, 0.1), (0.1, 0.5)));
        let (source, guard) = DetectorSource::start(&sh_detector(&script)).unwrap();
        let rx = spawn_landmark_source(source);
        assert!(matches!(recv(&rx), SourceEvent::Frame(f) if f.hands.len() == 1));
        drop(guard);
        assert_eq!(recv(&rx), SourceEvent::Closed);
    }

    #[cfg(unix)]
    #[test]
    fn detector_without_ready_is_stopped() {
        let err = DetectorSource::start(&sh_detector("echo camera busy; exec sleep 5")).err().unwrap();
        assert!(matches!(err, SourceError::NotReady(ref l) if l == "camera busy"));
    }

    #[test]
    fn empty_detector_command() {
        let cmd = DetectorCommand::from_command_line("   ", 0);
        assert!(matches!(DetectorSource::start(&cmd), Err(SourceError::EmptyCommand)));
    }

    #[test]
    fn detector_command_line() {
        let cmd = DetectorCommand::from_command_line("python3  detect.py --model m.task", 2);
        assert_eq!(cmd.argv, vec!["python3", "detect.py", "--model", "m.task"]);
        assert_eq!(cmd.display(), "python3 detect.py --model m.task --camera 2");
    }
}
