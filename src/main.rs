use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Duration, Instant, Interval, interval_at};

mod alert;
mod engine;
mod view;
mod ws;

use engine::engine::{
    DEFAULT_LONG_BREAK_MINUTES, DEFAULT_SHORT_BREAK_MINUTES, DEFAULT_WORK_MINUTES, Phase, Settings,
    TICK_PERIOD_MS, TimerEngine,
};

const CONTROL_ADDR: &str = "127.0.0.1:8765";

/// Append-only log of phase transitions and commands, one line per event.
struct SessionLog {
    path: Option<String>,
}

impl SessionLog {
    fn new(path: Option<String>) -> Self {
        if let Some(ref p) = path {
            let _ = Self::append(
                p,
                &format!(
                    "=== Session started at {} ===",
                    Local::now().format("%Y-%m-%d %H:%M:%S")
                ),
            );
        }
        Self { path }
    }

    fn append(path: &str, message: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", message)?;
        Ok(())
    }

    fn log(&self, message: &str) {
        if let Some(ref path) = self.path {
            let line = format!("[{}] {}", Local::now().format("%H:%M:%S"), message);
            let _ = Self::append(path, &line);
        }
    }
}

enum LoopEvent {
    Tick,
    Command(String),
    Eof,
}

fn minutes_arg(args: &[String], name: &str, default: u32) -> u32 {
    if let Some(pos) = args.iter().position(|a| a == name) {
        if let Some(value) = args.get(pos + 1).and_then(|v| v.parse().ok()) {
            return value;
        }
    }
    default
}

/// Keep the tick source in lockstep with the running flag: created when the
/// engine starts, dropped when it stops. At most one interval exists at any
/// time.
fn sync_ticker(ticker: &mut Option<Interval>, running: bool) {
    match (running, ticker.is_some()) {
        (true, false) => {
            let period = Duration::from_millis(TICK_PERIOD_MS);
            *ticker = Some(interval_at(Instant::now() + period, period));
        }
        (false, true) => {
            *ticker = None;
        }
        _ => {}
    }
}

fn print_settings_banner(settings: &Settings) {
    println!(
        "Pomodoro settings: {}min work / {}min short break / {}min long break",
        settings.work_seconds / 60,
        settings.short_break_seconds / 60,
        settings.long_break_seconds / 60
    );
}

fn on_phase_complete(finished: Phase, engine: &TimerEngine, session_log: &SessionLog) {
    let message = format!(
        "🔔 {} Next: {} ({} sessions)",
        alert::alert::phase_complete_summary(finished),
        engine.phase().as_str(),
        engine.completed_work_sessions()
    );
    println!("{}", message);
    session_log.log(&message);
    alert::alert::announce(finished);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    let settings = view::view::settings_from_minutes(
        minutes_arg(&args, "--work", DEFAULT_WORK_MINUTES),
        minutes_arg(&args, "--short", DEFAULT_SHORT_BREAK_MINUTES),
        minutes_arg(&args, "--long", DEFAULT_LONG_BREAK_MINUTES),
    );

    // Check for log file argument
    let log_file = if let Some(pos) = args.iter().position(|a| a == "--log") {
        args.get(pos + 1).cloned()
    } else {
        Some(format!(
            "{}/.local/share/pomato/session.log",
            std::env::var("HOME").unwrap_or_else(|_| ".".to_string())
        ))
    };

    // Create log directory if needed
    if let Some(ref path) = log_file {
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
    }

    if args.contains(&"--daemon".to_string()) {
        return run_daemon_mode(settings, log_file).await;
    }

    println!("🍅 Pomato - Pomodoro Timer");
    println!("==========================");
    print_settings_banner(&settings);
    if let Some(ref path) = log_file {
        println!("Logging to: {}", path);
    }
    view::view::print_help();
    println!();

    let mut engine = TimerEngine::new(settings);
    let session_log = SessionLog::new(log_file);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut ticker: Option<Interval> = None;

    view::view::print_status(&engine);

    loop {
        sync_ticker(&mut ticker, engine.is_running());

        let event = if let Some(interval) = ticker.as_mut() {
            tokio::select! {
                _ = interval.tick() => LoopEvent::Tick,
                line = lines.next_line() => match line? {
                    Some(command) => LoopEvent::Command(command),
                    None => LoopEvent::Eof,
                },
            }
        } else {
            match lines.next_line().await? {
                Some(command) => LoopEvent::Command(command),
                None => LoopEvent::Eof,
            }
        };

        match event {
            LoopEvent::Tick => {
                if let Some(finished) = engine.tick() {
                    println!();
                    on_phase_complete(finished, &engine, &session_log);
                }
                view::view::print_status(&engine);
            }
            LoopEvent::Command(command) => {
                if !handle_command(command.trim(), &mut engine, &session_log) {
                    break;
                }
                view::view::print_status(&engine);
            }
            LoopEvent::Eof => break,
        }
    }

    println!();
    session_log.log("Session ended");
    Ok(())
}

/// Returns false when the user asked to quit.
fn handle_command(command: &str, engine: &mut TimerEngine, session_log: &SessionLog) -> bool {
    let parts: Vec<&str> = command.split_whitespace().collect();
    match parts.as_slice() {
        [] | ["p"] => {
            engine.toggle_running();
            session_log.log(if engine.is_running() {
                "Timer started"
            } else {
                "Timer paused"
            });
        }
        ["r"] => {
            engine.reset();
            session_log.log("Timer reset");
        }
        ["s"] => {
            let skipped = engine.phase();
            engine.skip();
            session_log.log(&format!(
                "Skipped {} to {}",
                skipped.as_str(),
                engine.phase().as_str()
            ));
        }
        ["set", work, short_break, long_break] => {
            match (work.parse(), short_break.parse(), long_break.parse()) {
                (Ok(w), Ok(s), Ok(l)) => {
                    let settings = view::view::settings_from_minutes(w, s, l);
                    engine.apply_settings(settings);
                    session_log.log(&format!(
                        "Settings changed to {}/{}/{} minutes",
                        settings.work_seconds / 60,
                        settings.short_break_seconds / 60,
                        settings.long_break_seconds / 60
                    ));
                }
                _ => println!("Usage: set <work> <short> <long> (minutes)"),
            }
        }
        ["h"] | ["help"] => {
            println!();
            view::view::print_help();
        }
        ["q"] | ["quit"] => return false,
        _ => println!("Unknown command: {} (h for help)", command),
    }
    true
}

/// Run headless with the WebSocket control surface driving the engine.
async fn run_daemon_mode(
    settings: Settings,
    log_file: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🍅 Pomato - Daemon Mode");
    println!("==========================");
    print_settings_banner(&settings);
    println!("Control server on ws://{}", CONTROL_ADDR);
    if let Some(ref path) = log_file {
        println!("Logging to: {}", path);
    }
    println!();

    let mut engine = TimerEngine::new(settings);
    let session_log = SessionLog::new(log_file);

    let (command_tx, mut command_rx) = ws::control_server::create_command_channel();
    let (snapshot_tx, snapshot_rx) = tokio::sync::watch::channel(engine.snapshot());

    let ws_addr = CONTROL_ADDR.parse()?;
    tokio::spawn(async move {
        if let Err(e) =
            ws::control_server::start_control_server(ws_addr, command_tx, snapshot_rx).await
        {
            eprintln!("Control server error: {}", e);
        }
    });

    let mut ticker: Option<Interval> = None;

    loop {
        sync_ticker(&mut ticker, engine.is_running());

        let command = if let Some(interval) = ticker.as_mut() {
            tokio::select! {
                _ = interval.tick() => None,
                cmd = command_rx.recv() => Some(cmd),
            }
        } else {
            Some(command_rx.recv().await)
        };

        match command {
            None => {
                if let Some(finished) = engine.tick() {
                    on_phase_complete(finished, &engine, &session_log);
                }
            }
            Some(Some(message)) => {
                apply_control_message(&message, &mut engine, &session_log);
            }
            // All command senders are gone; nothing can drive us anymore.
            Some(None) => break,
        }

        let _ = snapshot_tx.send(engine.snapshot());
    }

    Ok(())
}

fn apply_control_message(
    message: &ws::control_server::ControlMessage,
    engine: &mut TimerEngine,
    session_log: &SessionLog,
) {
    match message.action.as_str() {
        "toggle" => {
            engine.toggle_running();
            session_log.log(if engine.is_running() {
                "Timer started (remote)"
            } else {
                "Timer paused (remote)"
            });
        }
        "reset" => {
            engine.reset();
            session_log.log("Timer reset (remote)");
        }
        "skip" => {
            let skipped = engine.phase();
            engine.skip();
            session_log.log(&format!(
                "Skipped {} to {} (remote)",
                skipped.as_str(),
                engine.phase().as_str()
            ));
        }
        "settings" => {
            let current = engine.settings();
            let settings = view::view::settings_from_minutes(
                message.work_minutes.unwrap_or(current.work_seconds / 60),
                message
                    .short_break_minutes
                    .unwrap_or(current.short_break_seconds / 60),
                message
                    .long_break_minutes
                    .unwrap_or(current.long_break_seconds / 60),
            );
            engine.apply_settings(settings);
            session_log.log(&format!(
                "Settings changed to {}/{}/{} minutes (remote)",
                settings.work_seconds / 60,
                settings.short_break_seconds / 60,
                settings.long_break_seconds / 60
            ));
        }
        // The server already rejects these; a late entry is only logged.
        other => eprintln!("Ignoring unknown control action: {}", other),
    }
}
