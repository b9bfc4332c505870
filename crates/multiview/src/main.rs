//! Multiview simulator
//!
//! Runs the router against the headless platform: opens the root surface,
//! lets its content "load", answers the display query and prints where
//! everything ended up.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use calloop::EventLoop;

use multiview::backend::headless::HeadlessPlatform;
use multiview::config::Config;
use multiview::events::event_channel;
use multiview::Orchestrator;

/// Upper bound on dispatch rounds before giving up on reaching idle
const MAX_SETTLE_ROUNDS: usize = 64;

struct Args {
    config: Option<PathBuf>,
    outputs: Vec<String>,
    answer: String,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        config: None,
        outputs: Vec::new(),
        answer: "null".to_string(),
    };

    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().context("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            "--outputs" => {
                let list = iter.next().context("--outputs needs a comma separated list")?;
                args.outputs = list
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(String::from)
                    .collect();
            }
            "--answer" => {
                args.answer = iter.next().context("--answer needs a payload")?;
            }
            "-h" | "--help" => {
                println!("usage: multiview [--config PATH] [--outputs NAME,NAME,...] [--answer PAYLOAD]");
                std::process::exit(0);
            }
            other => bail!("unknown argument: {other}"),
        }
    }

    Ok(args)
}

fn main() -> Result<()> {
    setup_logging();

    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load(),
    };

    let names: Vec<&str> = args.outputs.iter().map(String::as_str).collect();
    let platform = HeadlessPlatform::with_outputs(&names);

    let (sink, channel) = event_channel();
    let mut discovery = platform.discovery();
    let mut orchestrator = Orchestrator::new(config, platform.collaborators(), &mut discovery, sink);

    let mut event_loop: EventLoop<Orchestrator> =
        EventLoop::try_new().context("failed to create event loop")?;
    Orchestrator::attach_to_loop(&event_loop.handle(), channel)
        .context("failed to register lifecycle channel")?;

    let root = orchestrator.open_root().context("failed to open root surface")?;
    platform.finish_loading(root);
    settle(&mut event_loop, &mut orchestrator)?;

    if !platform.answer_script(root, &args.answer) {
        tracing::warn!(surface = %root, "root surface issued no display query");
    }
    settle(&mut event_loop, &mut orchestrator)?;

    let snapshot = orchestrator.snapshot();
    println!("{}", snapshot.to_json()?);

    tracing::info!(
        views = snapshot.views.len(),
        events = orchestrator.events_handled(),
        "simulation finished"
    );
    Ok(())
}

/// Dispatch until a round handles no events
fn settle(event_loop: &mut EventLoop<Orchestrator>, orchestrator: &mut Orchestrator) -> Result<()> {
    for _ in 0..MAX_SETTLE_ROUNDS {
        let before = orchestrator.events_handled();
        event_loop
            .dispatch(Some(Duration::ZERO), orchestrator)
            .context("event loop dispatch failed")?;
        if orchestrator.events_handled() == before {
            return Ok(());
        }
    }
    tracing::warn!(rounds = MAX_SETTLE_ROUNDS, "event loop did not go idle");
    Ok(())
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Respect NO_COLOR environment variable for testing
    let use_ansi = std::env::var("NO_COLOR").is_err();

    // stdout carries the snapshot
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true)
                .with_ansi(use_ansi),
        )
        .with(filter)
        .init();
}
