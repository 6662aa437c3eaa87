//! Foreground timer driven by stdin commands.
//!
//! Events are printed to stdout as JSON lines; logs and prompts go to stderr.

use std::sync::Arc;

use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use studytimer_core::notify::{DesktopNotifier, QueuedNotifier, TerminalNotifier};
use studytimer_core::recorder::{FanoutRecorder, HttpRecorder, QueuedRecorder};
use studytimer_core::timer::IntervalTicks;
use studytimer_core::{spawn_driver, Config, Database, Event, Notifier, TimerEngine, TimerHandle};

#[derive(Args)]
pub struct RunArgs {
    /// Start the first work phase immediately
    #[arg(long)]
    start: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Pause,
    Stop,
    /// Shift remaining time by this many seconds.
    Adjust(i64),
    Status,
    Quit,
}

/// Parse one stdin line. Blank lines yield `Ok(None)`.
fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    let command = match line {
        "" => return Ok(None),
        "start" | "s" => Command::Start,
        "pause" | "p" => Command::Pause,
        "stop" | "x" => Command::Stop,
        "status" => Command::Status,
        "quit" | "q" => Command::Quit,
        _ => {
            let (sign, digits) = if let Some(rest) = line.strip_prefix('+') {
                (1, rest)
            } else if let Some(rest) = line.strip_prefix('-') {
                (-1, rest)
            } else {
                return Err(format!("unknown command: {line}"));
            };
            let digits = digits.trim();
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(format!("invalid minutes: {line}"));
            }
            let minutes: i64 = digits
                .parse()
                .map_err(|_| format!("invalid minutes: {line}"))?;
            Command::Adjust(sign * minutes.saturating_mul(60))
        }
    };
    Ok(Some(command))
}

fn build_engine(config: &Config) -> Result<TimerEngine, Box<dyn std::error::Error>> {
    let mut recorder = FanoutRecorder::new();
    if config.recorder.local {
        let db = QueuedRecorder::spawn("database", Arc::new(Database::open_default()?))?;
        recorder = recorder.with("database", Arc::new(db));
    }
    if let Some(url) = config.remote_url() {
        let http = HttpRecorder::new(url, config.recorder.access_token.clone())?;
        info!(endpoint = %http.endpoint(), "recording sessions remotely");
        recorder = recorder.with("http", Arc::new(http));
    }

    let notifier: Arc<dyn Notifier> = if config.notifications.desktop {
        Arc::new(QueuedNotifier::spawn(Arc::new(DesktopNotifier::new("Study Timer")))?)
    } else {
        Arc::new(TerminalNotifier::new(config.notifications.bell))
    };

    Ok(TimerEngine::new(config.timer)?
        .with_recorder(Arc::new(recorder))
        .with_notifier(notifier))
}

fn print_event(event: &Event) {
    match serde_json::to_string(event) {
        Ok(json) => println!("{json}"),
        Err(e) => warn!(error = %e, "failed to serialize event"),
    }
}

async fn dispatch(handle: &TimerHandle, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Start => handle.start().await?,
        Command::Pause => handle.pause().await?,
        Command::Stop => handle.stop().await?,
        Command::Adjust(delta) => handle.adjust(delta).await?,
        Command::Status => {
            let event = handle.snapshot_event().await?;
            print_event(&event);
            if let Event::StateSnapshot { snapshot, .. } = event {
                eprintln!("{} {}", snapshot.phase.label(), snapshot.clock_face());
            }
        }
        Command::Quit => {}
    }
    Ok(())
}

async fn run_timer(config: Config, start: bool) -> Result<(), Box<dyn std::error::Error>> {
    let engine = build_engine(&config)?;
    let (handle, task) = spawn_driver(engine, IntervalTicks::every_second());

    let mut events = handle.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event output lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    if start {
        handle.start().await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => dispatch(&handle, command).await?,
            Ok(None) => {}
            Err(message) => eprintln!("{message}"),
        }
    }

    handle.shutdown().await?;
    let engine = task.await?;
    drop(handle);
    printer.await?;
    info!(
        completed_work_cycles = engine.completed_work_cycles(),
        "timer exited"
    );
    Ok(())
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_timer(config, args.start))
}
