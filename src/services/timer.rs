//! Interval timer state machine for gym routines.
//!
//! A pure four-state clock-tick loop: countdown → work → rest → work → …
//! → finished, with a pause flag. There is no I/O and no notion of wall
//! time here; the caller drives the machine by calling [`IntervalTimer::tick`]
//! once per second and forwards the returned audio cues.

use serde::{Deserialize, Serialize};

use crate::api::GymRoutine;

/// Number of trailing seconds of each phase that beep.
const BEEP_WINDOW_SEC: u32 = 3;

/// Errors rejecting a routine at timer construction.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("routine must have at least one round")]
    ZeroRounds,
    #[error("work phase must last at least one second")]
    ZeroWork,
}

/// Timer phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Countdown,
    Work,
    Rest,
    Finished,
}

/// Audio cue emitted by a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    /// Short beep during the last seconds of any phase.
    CountdownBeep,
    /// A work phase begins.
    WorkStart,
    /// A rest phase begins.
    RestStart,
    /// The routine is complete.
    Finished,
}

/// The interval timer state machine.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    routine: GymRoutine,
    phase: Phase,
    seconds_left: u32,
    /// Current work round, 1-based. Zero during the initial countdown.
    round: u32,
    paused: bool,
}

impl IntervalTimer {
    /// Build a timer for a routine. Zero-round and zero-work routines are
    /// rejected; a zero countdown starts directly in the first work phase.
    pub fn new(routine: GymRoutine) -> Result<Self, TimerError> {
        if routine.rounds == 0 {
            return Err(TimerError::ZeroRounds);
        }
        if routine.work_sec == 0 {
            return Err(TimerError::ZeroWork);
        }

        let timer = if routine.countdown_sec > 0 {
            Self {
                routine,
                phase: Phase::Countdown,
                seconds_left: routine.countdown_sec,
                round: 0,
                paused: false,
            }
        } else {
            Self {
                routine,
                phase: Phase::Work,
                seconds_left: routine.work_sec,
                round: 1,
                paused: false,
            }
        };
        Ok(timer)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn seconds_left(&self) -> u32 {
        self.seconds_left
    }

    /// Current work round (1-based); zero during the initial countdown.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn rounds(&self) -> u32 {
        self.routine.rounds
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Number of fully completed work rounds so far.
    pub fn rounds_completed(&self) -> u32 {
        match self.phase {
            Phase::Countdown => 0,
            Phase::Work => self.round.saturating_sub(1),
            Phase::Rest => self.round,
            Phase::Finished => self.routine.rounds,
        }
    }

    /// Cue announcing the phase the timer currently sits in, used when a
    /// session starts without an initial countdown.
    pub fn entry_cue(&self) -> Option<Cue> {
        match self.phase {
            Phase::Work => Some(Cue::WorkStart),
            Phase::Rest => Some(Cue::RestStart),
            _ => None,
        }
    }

    pub fn pause(&mut self) {
        if !self.is_finished() {
            self.paused = true;
        }
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Advance the clock by one second.
    ///
    /// Paused and finished timers do not move. Returns the audio cues the
    /// tick produced: a beep inside the last seconds of a phase, and a
    /// start/finish cue on phase transitions.
    pub fn tick(&mut self) -> Vec<Cue> {
        if self.paused || self.is_finished() {
            return Vec::new();
        }

        let mut cues = Vec::new();
        self.seconds_left -= 1;

        if self.seconds_left > 0 {
            if self.seconds_left <= BEEP_WINDOW_SEC {
                cues.push(Cue::CountdownBeep);
            }
            return cues;
        }

        // Phase expired; move to the next one.
        match self.phase {
            Phase::Countdown => self.enter_work(self.round + 1, &mut cues),
            Phase::Work => {
                if self.round >= self.routine.rounds {
                    self.phase = Phase::Finished;
                    self.seconds_left = 0;
                    cues.push(Cue::Finished);
                } else if self.routine.rest_sec > 0 {
                    self.phase = Phase::Rest;
                    self.seconds_left = self.routine.rest_sec;
                    cues.push(Cue::RestStart);
                } else {
                    // No rest configured: straight into the next round.
                    self.enter_work(self.round + 1, &mut cues);
                }
            }
            Phase::Rest => self.enter_work(self.round + 1, &mut cues),
            Phase::Finished => unreachable!("finished timers do not tick"),
        }

        cues
    }

    fn enter_work(&mut self, round: u32, cues: &mut Vec<Cue>) {
        self.phase = Phase::Work;
        self.round = round;
        self.seconds_left = self.routine.work_sec;
        cues.push(Cue::WorkStart);
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod timer_tests;
