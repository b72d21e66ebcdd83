use std::io::{self, Write};

use crate::engine::engine::{SESSIONS_PER_LONG_BREAK, Settings, TimerEngine};

pub const MIN_MINUTES: u32 = 1;
pub const MAX_WORK_MINUTES: u32 = 60;
pub const MAX_SHORT_BREAK_MINUTES: u32 = 30;
pub const MAX_LONG_BREAK_MINUTES: u32 = 60;

const BAR_WIDTH: usize = 20;

/// Clamp raw minute values to the product ranges and convert to seconds.
/// The engine trusts positivity, so everything that reaches it goes
/// through here first.
pub fn settings_from_minutes(work: u32, short_break: u32, long_break: u32) -> Settings {
    Settings {
        work_seconds: work.clamp(MIN_MINUTES, MAX_WORK_MINUTES) * 60,
        short_break_seconds: short_break.clamp(MIN_MINUTES, MAX_SHORT_BREAK_MINUTES) * 60,
        long_break_seconds: long_break.clamp(MIN_MINUTES, MAX_LONG_BREAK_MINUTES) * 60,
    }
}

pub fn status_line(engine: &TimerEngine) -> String {
    let phase = engine.phase();
    let state = if engine.is_running() {
        "running"
    } else {
        "paused"
    };
    format!(
        "{} {:<11} {}  {}  {}  {} sessions  [{}]",
        phase.emoji(),
        phase.as_str(),
        engine.display_time(),
        progress_bar(engine.progress()),
        session_dots(engine.completed_work_sessions()),
        engine.completed_work_sessions(),
        state,
    )
}

/// Terminal stand-in for the progress ring.
pub fn progress_bar(progress: f64) -> String {
    let filled = (progress.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// Four dots marking progress toward the next long break.
pub fn session_dots(completed_work_sessions: u32) -> String {
    let filled = (completed_work_sessions % SESSIONS_PER_LONG_BREAK) as usize;
    let mut dots = String::new();
    for i in 0..SESSIONS_PER_LONG_BREAK as usize {
        dots.push(if i < filled { '●' } else { '○' });
    }
    dots
}

/// Redraw the status line in place.
pub fn print_status(engine: &TimerEngine) {
    print!("\r\x1b[2K{}", status_line(engine));
    let _ = io::stdout().flush();
}

pub fn print_help() {
    println!("Commands:");
    println!("  <enter> / p   start or pause the timer");
    println!("  s             skip to the next phase");
    println!("  r             reset");
    println!("  set W S L     work/short/long durations in minutes");
    println!("  h             this help");
    println!("  q             quit");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_are_clamped_to_product_ranges() {
        let settings = settings_from_minutes(0, 999, 61);
        assert_eq!(settings.work_seconds, 60);
        assert_eq!(settings.short_break_seconds, 30 * 60);
        assert_eq!(settings.long_break_seconds, 60 * 60);

        let settings = settings_from_minutes(25, 5, 15);
        assert_eq!(settings.work_seconds, 25 * 60);
        assert_eq!(settings.short_break_seconds, 5 * 60);
        assert_eq!(settings.long_break_seconds, 15 * 60);
    }

    #[test]
    fn progress_bar_fills_with_progress() {
        assert_eq!(progress_bar(0.0), format!("[{}]", "-".repeat(20)));
        assert_eq!(progress_bar(1.0), format!("[{}]", "#".repeat(20)));
        assert_eq!(progress_bar(0.5), format!("[{}{}]", "#".repeat(10), "-".repeat(10)));
    }

    #[test]
    fn session_dots_wrap_every_four() {
        assert_eq!(session_dots(0), "○○○○");
        assert_eq!(session_dots(2), "●●○○");
        assert_eq!(session_dots(4), "○○○○");
        assert_eq!(session_dots(6), "●●○○");
    }

    #[test]
    fn status_line_carries_the_countdown() {
        let engine = TimerEngine::new(settings_from_minutes(25, 5, 15));
        let line = status_line(&engine);
        assert!(line.contains("25:00"));
        assert!(line.contains("WORK"));
        assert!(line.contains("[paused]"));
        assert!(line.contains("0 sessions"));
    }
}
