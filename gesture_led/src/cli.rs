//! Command-line flags → [`AppConfig`].

use led_protocol::{ProtocolError, Thresholds};
use thiserror::Error;

use crate::app::{AppConfig, SourceKind};
use crate::landmark::FrameGeometry;
use crate::perception::{EmitPolicy, PerceptionMode};
use crate::source::DetectorCommand;

pub const USAGE: &str = "\
usage: gesture_led [options]

  --port P              serial port of the LED board (prompted if omitted)
  --baud N              baud rate (default 9600)
  --dry-run             run without a serial port
  --camera N            camera index for the detector (default 0)
  --detector \"CMD ...\"  detector command (default: python3 detector/hand_detect.py)
  --landmarks -         read detection lines from stdin
  --sim                 mouse simulation in the overlay window (default)
  --leap                LeapMotion controller (build with --features leap)
  --thresholds a,b,c,d,e  five pixel breakpoints
  --range MIN,MAX       evenly spaced breakpoints (default 15,200)
  --frame WxH           camera frame size in pixels (default 640x480)
  --mode pinch|fingers  count from the pinch distance (default) or from
                        the number of extended fingers
  --every-frame         send on every frame, not only on change
  --headless            no overlay window
  --list-ports          list serial ports and exit
  --quick               defaults, no prompts
";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} needs a value")]
    MissingValue(String),

    #[error("invalid value for {flag}: {value:?}")]
    InvalidValue { flag: String, value: String },

    #[error("unknown option {0:?}")]
    UnknownFlag(String),

    #[error("{0} and {1} cannot be combined")]
    Conflict(&'static str, &'static str),

    #[error("bad calibration: {0}")]
    Thresholds(#[from] ProtocolError),

    #[error("--leap needs a build with the `leap` feature")]
    LeapDisabled,

    #[error("--landmarks - takes stdin, so the port cannot be prompted for; pass --port or --dry-run")]
    StdinNeedsPort,
}

/// Everything `main` needs from the command line.
#[derive(Clone, Debug, Default)]
pub struct CliArgs {
    pub config: AppConfig,
    pub dry_run: bool,
    pub quick: bool,
    pub list_ports: bool,
    pub help: bool,
}

impl CliArgs {
    /// `main` should ask for a port interactively. Never when stdin carries
    /// landmarks.
    pub fn wants_port_prompt(&self) -> bool {
        self.config.port.is_none()
            && !self.dry_run
            && !self.quick
            && self.config.source != SourceKind::Stdin
    }
}

/// Parse the arguments after the program name.
pub fn parse_args<I>(args: I) -> Result<CliArgs, ConfigError>
where
    I: IntoIterator<Item = String>,
{
    let mut out = CliArgs::default();
    let mut args = args.into_iter();

    let mut source: Option<(&'static str, SourceKind)> = None;
    let mut detector: Option<String> = None;
    let mut camera: Option<u32> = None;
    let mut calibration: Option<&'static str> = None;

    let mut pick = |flag: &'static str, kind: SourceKind| {
        if let Some((other, _)) = &source {
            if *other != flag {
                return Err(ConfigError::Conflict(*other, flag));
            }
        }
        source = Some((flag, kind));
        Ok(())
    };

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| args.next().ok_or_else(|| ConfigError::MissingValue(flag.to_string()));

        match arg.as_str() {
            "--port" => out.config.port = Some(value("--port")?),
            "--baud" => out.config.baud = parse_num("--baud", &value("--baud")?)?,
            "--camera" => camera = Some(parse_num("--camera", &value("--camera")?)?),
            "--detector" => detector = Some(value("--detector")?),
            "--landmarks" => {
                let v = value("--landmarks")?;
                if v != "-" {
                    return Err(invalid("--landmarks", &v));
                }
                pick("--landmarks", SourceKind::Stdin)?;
            }
            "--sim" => pick("--sim", SourceKind::Sim)?,
            "--leap" => {
                #[cfg(feature = "leap")]
                pick("--leap", SourceKind::Leap)?;
                #[cfg(not(feature = "leap"))]
                return Err(ConfigError::LeapDisabled);
            }
            "--thresholds" => {
                if let Some(other) = calibration.replace("--thresholds") {
                    return Err(ConfigError::Conflict(other, "--thresholds"));
                }
                let v = value("--thresholds")?;
                let list = parse_floats("--thresholds", &v)?;
                let breakpoints: [f32; 5] =
                    list.as_slice().try_into().map_err(|_| invalid("--thresholds", &v))?;
                out.config.thresholds = Thresholds::new(breakpoints)?;
            }
            "--range" => {
                if let Some(other) = calibration.replace("--range") {
                    return Err(ConfigError::Conflict(other, "--range"));
                }
                let v = value("--range")?;
                match parse_floats("--range", &v)?.as_slice() {
                    &[min, max] => out.config.thresholds = Thresholds::linear(min, max)?,
                    _ => return Err(invalid("--range", &v)),
                }
            }
            "--frame" => {
                let v = value("--frame")?;
                out.config.geometry = parse_frame(&v).ok_or_else(|| invalid("--frame", &v))?;
            }
            "--mode" => {
                let v = value("--mode")?;
                out.config.mode = PerceptionMode::parse(&v).ok_or_else(|| invalid("--mode", &v))?;
            }
            "--every-frame" => out.config.policy = EmitPolicy::EveryFrame,
            "--dry-run" => out.dry_run = true,
            "--headless" => out.config.headless = true,
            "--list-ports" => out.list_ports = true,
            "--quick" => out.quick = true,
            "-h" | "--help" => out.help = true,
            other => return Err(ConfigError::UnknownFlag(other.to_string())),
        }
    }

    // A detector or camera flag selects the detector unless another source
    // was asked for explicitly.
    if detector.is_some() || camera.is_some() {
        let cmd = match &detector {
            Some(line) => DetectorCommand::from_command_line(line, camera.unwrap_or(0)),
            None => DetectorCommand { camera: camera.unwrap_or(0), ..DetectorCommand::default() },
        };
        if cmd.argv.is_empty() {
            return Err(invalid("--detector", detector.as_deref().unwrap_or("")));
        }
        pick("--detector", SourceKind::Detector(cmd))?;
    }
    if let Some((_, kind)) = source {
        out.config.source = kind;
    }

    if out.dry_run && out.config.port.is_some() {
        return Err(ConfigError::Conflict("--port", "--dry-run"));
    }
    if out.config.source == SourceKind::Stdin && out.config.port.is_none() && !out.dry_run && !out.quick {
        return Err(ConfigError::StdinNeedsPort);
    }

    Ok(out)
}

fn invalid(flag: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue { flag: flag.to_string(), value: value.to_string() }
}

fn parse_num<T: std::str::FromStr>(flag: &str, v: &str) -> Result<T, ConfigError> {
    v.trim().parse().map_err(|_| invalid(flag, v))
}

fn parse_floats(flag: &str, v: &str) -> Result<Vec<f32>, ConfigError> {
    v.split(',').map(|s| parse_num(flag, s)).collect()
}

fn parse_frame(v: &str) -> Option<FrameGeometry> {
    let (w, h) = v.split_once(['x', 'X'])?;
    let width: u32 = w.trim().parse().ok()?;
    let height: u32 = h.trim().parse().ok()?;
    (width > 0 && height > 0).then_some(FrameGeometry { width, height })
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<CliArgs, ConfigError> {
        parse_args(line.split_whitespace().map(str::to_string))
    }

    #[test]
    fn no_args_is_sim_with_prompt() {
        let args = parse("").unwrap();
        assert_eq!(args.config.source, SourceKind::Sim);
        assert!(args.wants_port_prompt());
    }

    #[test]
    fn port_and_baud() {
        let args = parse("--port COM3 --baud 115200").unwrap();
        assert_eq!(args.config.port.as_deref(), Some("COM3"));
        assert_eq!(args.config.baud, 115200);
        assert!(!args.wants_port_prompt());
    }

    #[test]
    fn dry_run_and_quick_skip_prompt() {
        assert!(!parse("--dry-run").unwrap().wants_port_prompt());
        assert!(!parse("--quick").unwrap().wants_port_prompt());
    }

    #[test]
    fn camera_selects_default_detector() {
        let args = parse("--camera 1").unwrap();
        match args.config.source {
            SourceKind::Detector(cmd) => {
                assert_eq!(cmd.camera, 1);
                assert_eq!(cmd.argv, DetectorCommand::default().argv);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn detector_command_is_split() {
        let args = parse_args(
            ["--detector", "python3 my_detect.py --model hand.task", "--camera", "2"]
                .map(str::to_string),
        )
        .unwrap();
        assert_eq!(
            args.config.source,
            SourceKind::Detector(DetectorCommand {
                argv: vec!["python3".into(), "my_detect.py".into(), "--model".into(), "hand.task".into()],
                camera: 2,
            })
        );
    }

    #[test]
    fn stdin_landmarks() {
        assert_eq!(parse("--landmarks - --headless --dry-run").unwrap().config.source, SourceKind::Stdin);
        assert!(matches!(parse("--landmarks file.json"), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn stdin_landmarks_never_prompt_for_port() {
        assert_eq!(parse("--landmarks - --headless").unwrap_err(), ConfigError::StdinNeedsPort);
        for line in ["--landmarks - --port COM4", "--landmarks - --dry-run", "--landmarks - --quick"] {
            let args = parse(line).unwrap();
            assert_eq!(args.config.source, SourceKind::Stdin);
            assert!(!args.wants_port_prompt(), "{}", line);
        }
    }

    #[test]
    fn sources_conflict() {
        assert_eq!(
            parse("--sim --landmarks -").unwrap_err(),
            ConfigError::Conflict("--sim", "--landmarks")
        );
        assert_eq!(
            parse("--landmarks - --camera 0").unwrap_err(),
            ConfigError::Conflict("--landmarks", "--detector")
        );
        assert_eq!(
            parse("--landmarks - --sim --dry-run").unwrap_err(),
            ConfigError::Conflict("--landmarks", "--sim")
        );
    }

    #[test]
    fn thresholds_list() {
        let args = parse("--thresholds 10,20,30,40,50").unwrap();
        assert_eq!(args.config.thresholds.breakpoints(), &[10.0, 20.0, 30.0, 40.0, 50.0]);
    }

    #[test]
    fn thresholds_need_five_sorted_values() {
        assert!(matches!(parse("--thresholds 10,20,30"), Err(ConfigError::InvalidValue { .. })));
        assert!(matches!(
            parse("--thresholds 10,20,5,40,50"),
            Err(ConfigError::Thresholds(ProtocolError::DecreasingThresholds { index: 2 }))
        ));
        assert!(matches!(parse("--thresholds a,b,c,d,e"), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn range_is_linear() {
        let args = parse("--range 0,100").unwrap();
        assert_eq!(args.config.thresholds.breakpoints(), &[20.0, 40.0, 60.0, 80.0, 100.0]);
        assert!(matches!(parse("--range 100,0"), Err(ConfigError::Thresholds(_))));
        assert_eq!(
            parse("--range 0,100 --thresholds 1,2,3,4,5").unwrap_err(),
            ConfigError::Conflict("--range", "--thresholds")
        );
    }

    #[test]
    fn frame_size() {
        let args = parse("--frame 1280x720").unwrap();
        assert_eq!(args.config.geometry, FrameGeometry { width: 1280, height: 720 });
        assert!(matches!(parse("--frame 0x720"), Err(ConfigError::InvalidValue { .. })));
        assert!(matches!(parse("--frame wide"), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn perception_mode() {
        assert_eq!(parse("").unwrap().config.mode, PerceptionMode::Pinch);
        assert_eq!(parse("--mode fingers").unwrap().config.mode, PerceptionMode::Fingers);
        assert!(matches!(parse("--mode fist"), Err(ConfigError::InvalidValue { .. })));
        assert_eq!(parse("--mode").unwrap_err(), ConfigError::MissingValue("--mode".into()));
    }

    #[test]
    fn flags() {
        let args = parse("--every-frame --headless --list-ports --camera 0").unwrap();
        assert_eq!(args.config.policy, EmitPolicy::EveryFrame);
        assert!(args.config.headless);
        assert!(args.list_ports);
    }

    #[test]
    fn errors() {
        assert_eq!(parse("--port").unwrap_err(), ConfigError::MissingValue("--port".into()));
        assert_eq!(parse("--bogus").unwrap_err(), ConfigError::UnknownFlag("--bogus".into()));
        assert!(matches!(parse("--baud fast"), Err(ConfigError::InvalidValue { .. })));
        assert_eq!(parse("--port COM1 --dry-run").unwrap_err(), ConfigError::Conflict("--port", "--dry-run"));
    }

    #[cfg(not(feature = "leap"))]
    #[test]
    fn leap_needs_feature() {
        assert_eq!(parse("--leap").unwrap_err(), ConfigError::LeapDisabled);
    }
}
