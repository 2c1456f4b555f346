/***************************************/
/*        3rd party libraries          */
/***************************************/
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::DoorConfig;
use crate::shared::DoorState;

impl DoorConfig {
    /// How long the doors stay in `phase` before moving to the next one.
    pub fn hold_time(&self, phase: DoorState) -> Duration {
        let ms = match phase {
            DoorState::OpeningStarted => self.opening_start_ms,
            DoorState::Opening => self.opening_ms,
            DoorState::Opened => self.opened_ms,
            DoorState::WaitingStarted => self.waiting_start_ms,
            DoorState::Waiting => self.waiting_ms,
            DoorState::WaitingFinished => self.waiting_finished_ms,
            DoorState::ClosingStarted => self.closing_start_ms,
            DoorState::Closing => self.closing_ms,
            DoorState::Closed => 0,
        };
        Duration::from_millis(ms)
    }

    /// Total time of one open / wait / close cycle.
    pub fn cycle_time(&self) -> Duration {
        DoorState::CYCLE.iter().map(|phase| self.hold_time(*phase)).sum()
    }
}

/// One running door cycle. It cannot be cancelled once started.
#[derive(Debug, Clone)]
pub struct DoorCycle {
    phase: DoorState,
    timings: DoorConfig,
}

impl DoorCycle {
    pub fn start(timings: &DoorConfig) -> DoorCycle {
        DoorCycle {
            phase: DoorState::OpeningStarted,
            timings: timings.clone(),
        }
    }

    pub fn phase(&self) -> DoorState {
        self.phase
    }

    pub fn hold_time(&self) -> Duration {
        self.timings.hold_time(self.phase)
    }

    /// Moves to the next phase and returns it, or `None` when already closed.
    pub fn advance(&mut self) -> Option<DoorState> {
        let next = self.phase.next()?;
        self.phase = next;
        Some(next)
    }

    pub fn is_finished(&self) -> bool {
        self.phase == DoorState::Closed
    }
}

/***************************************/
/*             Unit tests              */
/***************************************/
