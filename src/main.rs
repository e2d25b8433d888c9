/// Entry point: line-oriented console driver.
///
/// One command per stdin line. Session commands (`left`, `right`, `up`,
/// `save`, `undo`, `replay`, `choose <id>`, `reset`, `quit`) go straight to
/// the session; `tick [n]` advances time and `show` reprints the snapshot.
/// With `driver.realtime` a ticker thread advances the session on its own.
///
/// Snapshots go to stdout, logs to stderr.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use gridhop::config::OutputFormat;
use gridhop::{Command, GameConfig, Session, SessionError, SessionStatus, SharedSession};

fn main() {
    init_tracing();
    let config = GameConfig::load();

    let session = match Session::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "could not start session");
            std::process::exit(1);
        }
    };
    let shared = SharedSession::new(session);

    let stop = Arc::new(AtomicBool::new(false));
    let ticker = if config.driver.realtime {
        let rate = Duration::from_millis(config.driver.tick_rate_ms);
        match spawn_ticker(shared.clone(), rate, Arc::clone(&stop)) {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!(error = %e, "could not start ticker thread");
                None
            }
        }
    } else {
        None
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let result = run(&shared, config.driver.output, stdin.lock(), stdout.lock());

    stop.store(true, Ordering::Relaxed);
    if let Some(handle) = ticker {
        if handle.join().is_err() {
            error!("ticker thread panicked");
        }
    }

    match result {
        Ok(status) => info!(?status, ticks = shared.with(|s| s.ticks()), "session ended"),
        Err(e) => error!(error = %e, "console I/O failed"),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn spawn_ticker(
    shared: SharedSession,
    rate: Duration,
    stop: Arc<AtomicBool>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new().name("ticker".into()).spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            thread::sleep(rate);
            if shared.tick() != SessionStatus::InProgress {
                break;
            }
        }
    })
}

// ══════════════════════════════════════════════════════════════
// Console protocol
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ConsoleLine {
    Session(Command),
    Tick(u32),
    Show,
    Blank,
}

fn parse_line(line: &str) -> Result<ConsoleLine, SessionError> {
    let trimmed = line.trim();
    let mut parts = trimmed.split_whitespace();
    match parts.next().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(ConsoleLine::Blank),
        Some("show") => Ok(ConsoleLine::Show),
        Some("tick") => {
            let n = match parts.next() {
                Some(raw) => raw
                    .parse::<u32>()
                    .map_err(|_| SessionError::InvalidCommand(trimmed.to_string()))?,
                None => 1,
            };
            Ok(ConsoleLine::Tick(n))
        }
        Some(_) => trimmed.parse::<Command>().map(ConsoleLine::Session),
    }
}

/// Read lines until EOF or the session leaves `InProgress`.
fn run<R: BufRead, W: Write>(
    shared: &SharedSession,
    format: OutputFormat,
    input: R,
    mut out: W,
) -> io::Result<SessionStatus> {
    emit(&mut out, format, shared)?;

    for line in input.lines() {
        let line = line?;
        let parsed = match parse_line(&line) {
            Ok(p) => p,
            Err(e) => {
                report(&mut out, format, &e)?;
                continue;
            }
        };

        match parsed {
            ConsoleLine::Blank => continue,
            ConsoleLine::Show => {}
            ConsoleLine::Tick(n) => {
                for _ in 0..n {
                    if shared.tick() != SessionStatus::InProgress {
                        break;
                    }
                }
            }
            ConsoleLine::Session(cmd) => {
                if let Err(e) = shared.apply_command(cmd) {
                    report(&mut out, format, &e)?;
                }
            }
        }

        for event in shared.drain_events() {
            debug!(?event, "event");
        }
        emit(&mut out, format, shared)?;

        let status = shared.status();
        if status != SessionStatus::InProgress {
            return Ok(status);
        }
    }
    Ok(shared.status())
}

fn emit<W: Write>(out: &mut W, format: OutputFormat, shared: &SharedSession) -> io::Result<()> {
    let snapshot = shared.snapshot();
    match format {
        OutputFormat::Text => write!(out, "{}", snapshot.render_text())?,
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, &snapshot)?;
            writeln!(out)?;
        }
    }
    out.flush()
}

fn report<W: Write>(out: &mut W, format: OutputFormat, err: &SessionError) -> io::Result<()> {
    match format {
        OutputFormat::Text => writeln!(out, "! {err}"),
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, &serde_json::json!({ "error": err.to_string() }))?;
            writeln!(out)
        }
    }
}
