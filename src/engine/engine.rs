use serde::{Deserialize, Serialize};

pub const TICK_PERIOD_MS: u64 = 1000; // One countdown step per second
pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_SHORT_BREAK_MINUTES: u32 = 5;
pub const DEFAULT_LONG_BREAK_MINUTES: u32 = 15;
pub const SESSIONS_PER_LONG_BREAK: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn as_str(&self) -> &str {
        match self {
            Phase::Work => "WORK",
            Phase::ShortBreak => "SHORT BREAK",
            Phase::LongBreak => "LONG BREAK",
        }
    }

    pub fn emoji(&self) -> &str {
        match self {
            Phase::Work => "💼",
            Phase::ShortBreak => "☕",
            Phase::LongBreak => "🌴",
        }
    }

    pub fn is_work(&self) -> bool {
        matches!(self, Phase::Work)
    }
}

/// Interval durations in seconds. All values must be strictly positive;
/// the input layer clamps raw minutes before these are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub work_seconds: u32,
    pub short_break_seconds: u32,
    pub long_break_seconds: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_seconds: DEFAULT_WORK_MINUTES * 60,
            short_break_seconds: DEFAULT_SHORT_BREAK_MINUTES * 60,
            long_break_seconds: DEFAULT_LONG_BREAK_MINUTES * 60,
        }
    }
}

impl Settings {
    pub(crate) fn duration_for(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.work_seconds,
            Phase::ShortBreak => self.short_break_seconds,
            Phase::LongBreak => self.long_break_seconds,
        }
    }
}

/// State pushed to control clients after every change.
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub phase: String,
    pub display: String,
    pub remaining_seconds: u32,
    pub running: bool,
    pub completed_work_sessions: u32,
    pub progress: f64,
}

/// The interval state machine. Counts a phase down one tick at a time,
/// alternating strictly between work and a break, with a long break after
/// every fourth completed work session.
///
/// All operations are total; the engine raises nothing and touches no
/// clock, audio, or notification API itself. Natural completions are
/// reported through `tick`'s return value.
#[derive(Debug)]
pub struct TimerEngine {
    settings: Settings,
    phase: Phase,
    remaining_seconds: u32,
    running: bool,
    completed_work_sessions: u32,
}

impl TimerEngine {
    pub fn new(settings: Settings) -> Self {
        Self {
            phase: Phase::Work,
            remaining_seconds: settings.work_seconds,
            running: false,
            completed_work_sessions: 0,
            settings,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn completed_work_sessions(&self) -> u32 {
        self.completed_work_sessions
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Advance the countdown by one second. Ignored while paused. A tick
    /// that arrives with the countdown already at zero completes the phase,
    /// pauses the engine, and returns the phase just finished so the caller
    /// can alert on it.
    pub fn tick(&mut self) -> Option<Phase> {
        if !self.running {
            return None;
        }
        if self.remaining_seconds > 0 {
            self.remaining_seconds -= 1;
            return None;
        }
        self.running = false;
        Some(self.complete_phase())
    }

    pub fn toggle_running(&mut self) {
        self.running = !self.running;
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.phase = Phase::Work;
        self.remaining_seconds = self.settings.work_seconds;
        self.completed_work_sessions = 0;
    }

    /// Force the current phase over without waiting for the countdown.
    /// Follows the same transition rules as a natural completion, but is
    /// not announced.
    pub fn skip(&mut self) {
        self.running = false;
        self.complete_phase();
    }

    /// Replace the interval durations. An idle countdown is reloaded for
    /// the current phase; a running one keeps its remaining time and picks
    /// up the new durations on the next phase transition.
    pub fn apply_settings(&mut self, settings: Settings) {
        self.settings = settings;
        if !self.running {
            self.remaining_seconds = self.settings.duration_for(self.phase);
        }
    }

    /// Fraction of the current phase already elapsed, in [0, 1].
    pub fn progress(&self) -> f64 {
        let total = self.settings.duration_for(self.phase) as f64;
        let elapsed = total - self.remaining_seconds as f64;
        (elapsed / total).clamp(0.0, 1.0)
    }

    /// Remaining time as zero-padded `MM:SS`. Minutes run past 59 for
    /// durations over an hour; there is no hour field.
    pub fn display_time(&self) -> String {
        let mins = self.remaining_seconds / 60;
        let secs = self.remaining_seconds % 60;
        format!("{:02}:{:02}", mins, secs)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            phase: self.phase.as_str().to_string(),
            display: self.display_time(),
            remaining_seconds: self.remaining_seconds,
            running: self.running,
            completed_work_sessions: self.completed_work_sessions,
            progress: self.progress(),
        }
    }

    fn complete_phase(&mut self) -> Phase {
        let finished = self.phase;
        match self.phase {
            Phase::Work => {
                self.completed_work_sessions += 1;
                self.phase = if self.completed_work_sessions % SESSIONS_PER_LONG_BREAK == 0 {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                };
            }
            Phase::ShortBreak | Phase::LongBreak => {
                self.phase = Phase::Work;
            }
        }
        self.remaining_seconds = self.settings.duration_for(self.phase);
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings() -> Settings {
        Settings {
            work_seconds: 25 * 60,
            short_break_seconds: 5 * 60,
            long_break_seconds: 15 * 60,
        }
    }

    fn running_engine() -> TimerEngine {
        let mut engine = TimerEngine::new(test_settings());
        engine.toggle_running();
        engine
    }

    /// Run the countdown to zero, then one more tick for the transition.
    fn complete_current_phase(engine: &mut TimerEngine) -> Option<Phase> {
        if !engine.is_running() {
            engine.toggle_running();
        }
        for _ in 0..engine.remaining_seconds() {
            assert_eq!(engine.tick(), None);
        }
        assert_eq!(engine.remaining_seconds(), 0);
        engine.tick()
    }

    #[test]
    fn new_engine_starts_idle_in_work() {
        let engine = TimerEngine::new(test_settings());
        assert_eq!(engine.phase(), Phase::Work);
        assert_eq!(engine.remaining_seconds(), 25 * 60);
        assert!(!engine.is_running());
        assert_eq!(engine.completed_work_sessions(), 0);
        assert_eq!(engine.progress(), 0.0);
    }

    #[test]
    fn tick_is_ignored_while_paused() {
        let mut engine = TimerEngine::new(test_settings());
        assert_eq!(engine.tick(), None);
        assert_eq!(engine.remaining_seconds(), 25 * 60);
        assert_eq!(engine.phase(), Phase::Work);
    }

    #[test]
    fn countdown_completes_on_the_tick_after_zero() {
        let mut engine = running_engine();
        engine.remaining_seconds = 5;

        for _ in 0..5 {
            assert_eq!(engine.tick(), None);
        }
        assert_eq!(engine.remaining_seconds(), 0);
        assert!(engine.is_running());

        assert_eq!(engine.tick(), Some(Phase::Work));
        assert_eq!(engine.phase(), Phase::ShortBreak);
        assert_eq!(engine.remaining_seconds(), 5 * 60);
        assert!(!engine.is_running());
        assert_eq!(engine.completed_work_sessions(), 1);
    }

    #[test]
    fn every_fourth_work_session_earns_a_long_break() {
        let mut engine = TimerEngine::new(test_settings());
        for n in 1..=8u32 {
            engine.remaining_seconds = 1;
            assert_eq!(complete_current_phase(&mut engine), Some(Phase::Work));
            assert_eq!(engine.completed_work_sessions(), n);
            if n % 4 == 0 {
                assert_eq!(engine.phase(), Phase::LongBreak);
                assert_eq!(engine.remaining_seconds(), 15 * 60);
            } else {
                assert_eq!(engine.phase(), Phase::ShortBreak);
                assert_eq!(engine.remaining_seconds(), 5 * 60);
            }

            engine.remaining_seconds = 1;
            let finished = complete_current_phase(&mut engine);
            assert!(matches!(
                finished,
                Some(Phase::ShortBreak) | Some(Phase::LongBreak)
            ));
            assert_eq!(engine.phase(), Phase::Work);
            // Finishing a break never bumps the session count.
            assert_eq!(engine.completed_work_sessions(), n);
        }
    }

    #[test]
    fn completing_a_break_returns_to_work() {
        let mut engine = TimerEngine::new(test_settings());
        engine.skip();
        assert_eq!(engine.phase(), Phase::ShortBreak);

        engine.remaining_seconds = 1;
        assert_eq!(complete_current_phase(&mut engine), Some(Phase::ShortBreak));
        assert_eq!(engine.phase(), Phase::Work);
        assert_eq!(engine.remaining_seconds(), 25 * 60);
        assert_eq!(engine.completed_work_sessions(), 1);
    }

    #[test]
    fn reset_restores_the_initial_state() {
        let mut engine = running_engine();
        for _ in 0..3 {
            engine.skip();
        }
        engine.toggle_running();
        engine.reset();
        assert_eq!(engine.phase(), Phase::Work);
        assert_eq!(engine.remaining_seconds(), 25 * 60);
        assert!(!engine.is_running());
        assert_eq!(engine.completed_work_sessions(), 0);
    }

    #[test]
    fn skip_at_three_sessions_enters_the_long_break() {
        let mut engine = running_engine();
        engine.completed_work_sessions = 3;
        engine.skip();
        assert_eq!(engine.phase(), Phase::LongBreak);
        assert_eq!(engine.remaining_seconds(), 15 * 60);
        assert_eq!(engine.completed_work_sessions(), 4);
        assert!(!engine.is_running());
    }

    #[test]
    fn skipping_through_four_work_phases_reaches_the_long_break() {
        let mut engine = TimerEngine::new(test_settings());
        engine.reset();
        // work→short→work→short→work→short→work→long
        for _ in 0..7 {
            engine.skip();
        }
        assert_eq!(engine.phase(), Phase::LongBreak);
        assert_eq!(engine.remaining_seconds(), 900);
        assert_eq!(engine.completed_work_sessions(), 4);
        assert!(!engine.is_running());
    }

    #[test]
    fn apply_settings_while_idle_reloads_the_current_phase() {
        let mut engine = TimerEngine::new(test_settings());
        engine.skip();
        assert_eq!(engine.phase(), Phase::ShortBreak);

        let mut settings = test_settings();
        settings.short_break_seconds = 7 * 60;
        engine.apply_settings(settings);
        assert_eq!(engine.remaining_seconds(), 7 * 60);
    }

    #[test]
    fn apply_settings_while_running_keeps_the_countdown() {
        let mut engine = running_engine();
        engine.tick();
        let remaining = engine.remaining_seconds();

        let mut settings = test_settings();
        settings.work_seconds = 50 * 60;
        engine.apply_settings(settings);
        assert_eq!(engine.remaining_seconds(), remaining);
        assert_eq!(engine.settings().work_seconds, 50 * 60);

        // The new duration shows up on the next transition.
        engine.skip();
        engine.skip();
        assert_eq!(engine.phase(), Phase::Work);
        assert_eq!(engine.remaining_seconds(), 50 * 60);
    }

    #[test]
    fn toggle_at_zero_is_inert_until_the_next_tick() {
        let mut engine = TimerEngine::new(test_settings());
        engine.remaining_seconds = 0;
        engine.toggle_running();
        assert!(engine.is_running());
        assert_eq!(engine.phase(), Phase::Work);
        assert_eq!(engine.remaining_seconds(), 0);

        assert_eq!(engine.tick(), Some(Phase::Work));
        assert_eq!(engine.phase(), Phase::ShortBreak);
    }

    #[test]
    fn progress_spans_the_phase() {
        let mut engine = running_engine();
        assert_eq!(engine.progress(), 0.0);

        engine.tick();
        assert!(engine.progress() > 0.0);

        engine.remaining_seconds = 1;
        assert!(engine.progress() < 1.0);
        engine.tick();
        assert_eq!(engine.progress(), 1.0);
    }

    #[test]
    fn progress_stays_in_range_after_a_mid_phase_shrink() {
        let mut engine = running_engine();
        // Remaining time (25min) now exceeds the new work duration (1min);
        // the fraction must clamp rather than go negative.
        engine.apply_settings(Settings {
            work_seconds: 60,
            short_break_seconds: 5 * 60,
            long_break_seconds: 15 * 60,
        });
        assert_eq!(engine.progress(), 0.0);
    }

    #[test]
    fn display_time_zero_pads_and_never_rolls_into_hours() {
        let mut engine = TimerEngine::new(test_settings());
        assert_eq!(engine.display_time(), "25:00");
        engine.remaining_seconds = 65;
        assert_eq!(engine.display_time(), "01:05");
        engine.remaining_seconds = 0;
        assert_eq!(engine.display_time(), "00:00");
        engine.remaining_seconds = 90 * 60;
        assert_eq!(engine.display_time(), "90:00");
    }

    #[test]
    fn snapshot_serializes_for_control_clients() {
        let engine = TimerEngine::new(test_settings());
        let json = serde_json::to_string(&engine.snapshot()).unwrap();
        assert!(json.contains("\"phase\":\"WORK\""));
        assert!(json.contains("\"display\":\"25:00\""));
        assert!(json.contains("\"running\":false"));
        assert!(json.contains("\"completed_work_sessions\":0"));
    }
}
