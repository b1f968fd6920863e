//! gesture_led: interactive entry point.

use std::io::{self, Write};

use anyhow::{bail, Context};
use gesture_led::app::run;
use gesture_led::cli::{parse_args, CliArgs, USAGE};
use gesture_led::link::{available_ports, resolve_port};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = parse_args(std::env::args().skip(1)).context("bad command line (try --help)")?;
    if args.help {
        print!("{}", USAGE);
        return Ok(());
    }
    if args.list_ports {
        list_ports()?;
        return Ok(());
    }

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Gesture LED — thumb/index distance → LED count        ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Build: LeapMotion support enabled");
    println!("  Source: {:?}", args.config.source);
    println!("  Mode: {:?}", args.config.mode);
    println!(
        "  Thresholds (px): {:?}",
        args.config.thresholds.breakpoints()
    );
    println!();

    if args.wants_port_prompt() {
        args.config.port = Some(prompt_port()?);
    }

    match &args.config.port {
        Some(p) => println!("  Serial: {} @ {} baud", p, args.config.baud),
        None => println!("  Serial: none (dry run)"),
    }
    if !args.config.headless {
        println!("  Opening overlay window…  (q / Esc to quit)");
    }
    println!();

    let CliArgs { config, .. } = args;
    run(config)
}

fn list_ports() -> anyhow::Result<()> {
    let ports = available_ports()?;
    if ports.is_empty() {
        println!("no serial ports found");
    }
    for (i, p) in ports.iter().enumerate() {
        println!("  {}. {}", i + 1, p);
    }
    Ok(())
}

fn prompt_port() -> anyhow::Result<String> {
    let ports = available_ports()?;
    if ports.is_empty() {
        bail!("no serial ports found; connect the LED board or use --dry-run");
    }
    println!("  Available ports:");
    for (i, p) in ports.iter().enumerate() {
        println!("    {}. {}", i + 1, p);
    }
    let choice = read_line("  Select port (name, COM number or list index): ")?;
    let port = resolve_port(&choice, &ports)?;
    Ok(port)
}

fn read_line(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut buf = String::new();
    io::stdin().read_line(&mut buf)?;
    Ok(buf)
}
