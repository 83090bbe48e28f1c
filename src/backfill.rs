/// How many extra ticks one backfill round asks for.
pub const BACKFILL_INCREMENT: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackfillState {
    Idle,
    Loading,
}

/// Two-input state machine behind "load more history while the sentinel is
/// visible": a fixed cadence samples the visibility signal, and a fire is
/// allowed only while no fetch is outstanding. Sampling on a cadence rather
/// than reacting to every visibility flip rate-limits backfill during fast
/// scrolling and layout churn.
#[derive(Debug)]
pub struct BackfillTrigger {
    state: BackfillState,
}

impl Default for BackfillTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl BackfillTrigger {
    pub fn new() -> Self {
        Self {
            state: BackfillState::Idle,
        }
    }

    pub fn state(&self) -> BackfillState {
        self.state
    }

    /// One cadence tick. Resynchronizes with the outstanding-fetch counter
    /// (the counter is authoritative: it is bumped synchronously at issue
    /// time), then fires at most once per idle period. The caller widens
    /// the window and calls the scheduler on a true return.
    pub fn on_cadence(&mut self, sentinel_visible: bool, outstanding: u32) -> bool {
        self.state = if outstanding > 0 {
            BackfillState::Loading
        } else {
            BackfillState::Idle
        };
        if sentinel_visible && self.state == BackfillState::Idle {
            self.state = BackfillState::Loading;
            return true;
        }
        false
    }
}
