use std::io::{self, Write};

use notify_rust::Notification;

use crate::engine::engine::Phase;

pub fn phase_complete_summary(finished: Phase) -> &'static str {
    if finished.is_work() {
        "Work session complete!"
    } else {
        "Break complete!"
    }
}

pub fn phase_complete_body(finished: Phase) -> &'static str {
    if finished.is_work() {
        "Time for a break!"
    } else {
        "Ready to work?"
    }
}

/// Announce a naturally completed phase: terminal bell plus a desktop
/// notification. Failures are reported and swallowed here; they never
/// reach the engine.
pub fn announce(finished: Phase) {
    print!("\x07");
    let _ = io::stdout().flush();

    if let Err(e) = send_notification(finished) {
        eprintln!("Failed to send notification: {}", e);
    }
}

fn send_notification(finished: Phase) -> Result<(), Box<dyn std::error::Error>> {
    Notification::new()
        .summary(phase_complete_summary(finished))
        .body(phase_complete_body(finished))
        .timeout(0) // No auto-dismiss
        .show()?;
    Ok(())
}
