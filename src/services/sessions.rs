//! In-memory gym timer sessions.
//!
//! A session wraps one [`IntervalTimer`] behind a registry keyed by UUID.
//! A background driver ticks the machine once per second; every cue becomes
//! a timestamped event that handlers can poll or stream. When the timer
//! finishes, the outcome is written back to the task's gym sub-record.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::api::{GymRoutine, TaskId, UserId};
use crate::db::repository::FullRepository;
use crate::services::timer::{Cue, IntervalTimer, Phase, TimerError};

/// A timestamped timer event, delivered over the session event stream.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TimerEvent {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub cue: Cue,
    pub phase: Phase,
    pub seconds_left: u32,
    pub round: u32,
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub task_id: TaskId,
    pub phase: Phase,
    pub seconds_left: u32,
    pub round: u32,
    pub rounds: u32,
    pub rounds_completed: u32,
    pub paused: bool,
}

struct Session {
    user_id: UserId,
    task_id: TaskId,
    timer: IntervalTimer,
    events: Vec<TimerEvent>,
}

impl Session {
    fn snapshot(&self, session_id: &str) -> SessionSnapshot {
        SessionSnapshot {
            session_id: session_id.to_string(),
            task_id: self.task_id,
            phase: self.timer.phase(),
            seconds_left: self.timer.seconds_left(),
            round: self.timer.round(),
            rounds: self.timer.rounds(),
            rounds_completed: self.timer.rounds_completed(),
            paused: self.timer.is_paused(),
        }
    }

    fn push_event(&mut self, cue: Cue) {
        self.events.push(TimerEvent {
            timestamp: chrono::Utc::now(),
            cue,
            phase: self.timer.phase(),
            seconds_left: self.timer.seconds_left(),
            round: self.timer.round(),
        });
    }
}

/// Outcome of one driver tick.
pub(crate) enum TickOutcome {
    /// The session is gone; stop driving.
    Gone,
    /// The timer is still running.
    Running,
    /// The timer just finished with this many completed rounds.
    Finished(u32),
}

/// In-memory registry of running timer sessions.
#[derive(Clone, Default)]
pub struct TimerRegistry {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for a routine and return its id.
    pub fn create_session(
        &self,
        user_id: UserId,
        task_id: TaskId,
        routine: GymRoutine,
    ) -> Result<String, TimerError> {
        let timer = IntervalTimer::new(routine)?;
        let session_id = Uuid::new_v4().to_string();
        let mut session = Session {
            user_id,
            task_id,
            timer,
            events: Vec::new(),
        };
        // A zero-countdown routine starts mid-phase; announce it.
        if let Some(cue) = session.timer.entry_cue() {
            session.push_event(cue);
        }
        self.sessions.write().insert(session_id.clone(), session);
        Ok(session_id)
    }

    /// Snapshot a session owned by the user.
    pub fn snapshot(&self, user_id: UserId, session_id: &str) -> Option<SessionSnapshot> {
        let sessions = self.sessions.read();
        sessions
            .get(session_id)
            .filter(|s| s.user_id == user_id)
            .map(|s| s.snapshot(session_id))
    }

    /// Pause a running session. Returns false when the session is unknown.
    pub fn pause(&self, user_id: UserId, session_id: &str) -> bool {
        let mut sessions = self.sessions.write();
        match sessions.get_mut(session_id).filter(|s| s.user_id == user_id) {
            Some(session) => {
                session.timer.pause();
                true
            }
            None => false,
        }
    }

    /// Resume a paused session. Returns false when the session is unknown.
    pub fn resume(&self, user_id: UserId, session_id: &str) -> bool {
        let mut sessions = self.sessions.write();
        match sessions.get_mut(session_id).filter(|s| s.user_id == user_id) {
            Some(session) => {
                session.timer.resume();
                true
            }
            None => false,
        }
    }

    /// Abandon a session. Returns false when the session is unknown.
    pub fn remove(&self, user_id: UserId, session_id: &str) -> bool {
        let mut sessions = self.sessions.write();
        if sessions
            .get(session_id)
            .is_some_and(|s| s.user_id == user_id)
        {
            sessions.remove(session_id);
            true
        } else {
            false
        }
    }

    /// Events recorded so far for a session owned by the user.
    pub fn events(&self, user_id: UserId, session_id: &str) -> Option<Vec<TimerEvent>> {
        let sessions = self.sessions.read();
        sessions
            .get(session_id)
            .filter(|s| s.user_id == user_id)
            .map(|s| s.events.clone())
    }

    /// Whether the session exists and has finished.
    pub fn is_finished(&self, user_id: UserId, session_id: &str) -> Option<bool> {
        let sessions = self.sessions.read();
        sessions
            .get(session_id)
            .filter(|s| s.user_id == user_id)
            .map(|s| s.timer.is_finished())
    }

    /// Advance a session by one second. Used by the driver task.
    pub(crate) fn tick(&self, session_id: &str) -> TickOutcome {
        let mut sessions = self.sessions.write();
        let Some(session) = sessions.get_mut(session_id) else {
            return TickOutcome::Gone;
        };

        let cues = session.timer.tick();
        for cue in cues {
            session.push_event(cue);
        }

        if session.timer.is_finished() {
            TickOutcome::Finished(session.timer.rounds_completed())
        } else {
            TickOutcome::Running
        }
    }
}

/// Spawn the background task that ticks a session once per second and
/// records the result when the routine completes.
pub fn spawn_session_driver(
    registry: TimerRegistry,
    repository: Arc<dyn FullRepository>,
    user_id: UserId,
    task_id: TaskId,
    session_id: String,
) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(1)).await;
            match registry.tick(&session_id) {
                TickOutcome::Gone => break,
                TickOutcome::Running => {}
                TickOutcome::Finished(rounds_completed) => {
                    if let Err(e) = repository
                        .record_gym_result(
                            user_id,
                            task_id,
                            rounds_completed as i32,
                            chrono::Utc::now(),
                        )
                        .await
                    {
                        log::warn!(
                            "failed to record gym result for task {}: {}",
                            task_id.value(),
                            e
                        );
                    }
                    break;
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_routine() -> GymRoutine {
        GymRoutine {
            countdown_sec: 0,
            work_sec: 1,
            rest_sec: 0,
            rounds: 2,
        }
    }

    #[test]
    fn create_and_snapshot() {
        let registry = TimerRegistry::new();
        let user = UserId::new(1);
        let sid = registry
            .create_session(user, TaskId::new(7), quick_routine())
            .unwrap();

        let snap = registry.snapshot(user, &sid).unwrap();
        assert_eq!(snap.task_id, TaskId::new(7));
        assert_eq!(snap.phase, Phase::Work);
        assert_eq!(snap.rounds, 2);
        assert!(!snap.paused);

        // The zero-countdown start is announced.
        let events = registry.events(user, &sid).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].cue, Cue::WorkStart);
    }

    #[test]
    fn sessions_are_scoped_by_user() {
        let registry = TimerRegistry::new();
        let owner = UserId::new(1);
        let stranger = UserId::new(2);
        let sid = registry
            .create_session(owner, TaskId::new(7), quick_routine())
            .unwrap();

        assert!(registry.snapshot(stranger, &sid).is_none());
        assert!(!registry.pause(stranger, &sid));
        assert!(!registry.remove(stranger, &sid));
        assert!(registry.snapshot(owner, &sid).is_some());
    }

    #[test]
    fn tick_runs_session_to_completion() {
        let registry = TimerRegistry::new();
        let user = UserId::new(1);
        let sid = registry
            .create_session(user, TaskId::new(7), quick_routine())
            .unwrap();

        assert!(matches!(registry.tick(&sid), TickOutcome::Running));
        match registry.tick(&sid) {
            TickOutcome::Finished(rounds) => assert_eq!(rounds, 2),
            _ => panic!("expected session to finish on the second tick"),
        }
        assert_eq!(registry.is_finished(user, &sid), Some(true));
    }

    #[test]
    fn pause_and_resume() {
        let registry = TimerRegistry::new();
        let user = UserId::new(1);
        let sid = registry
            .create_session(user, TaskId::new(7), quick_routine())
            .unwrap();

        assert!(registry.pause(user, &sid));
        assert!(matches!(registry.tick(&sid), TickOutcome::Running));
        let snap = registry.snapshot(user, &sid).unwrap();
        assert!(snap.paused);
        assert_eq!(snap.seconds_left, 1);

        assert!(registry.resume(user, &sid));
        assert!(matches!(registry.tick(&sid), TickOutcome::Running));
    }

    #[test]
    fn removed_session_reports_gone() {
        let registry = TimerRegistry::new();
        let user = UserId::new(1);
        let sid = registry
            .create_session(user, TaskId::new(7), quick_routine())
            .unwrap();
        assert!(registry.remove(user, &sid));
        assert!(matches!(registry.tick(&sid), TickOutcome::Gone));
    }

    #[test]
    fn rejects_invalid_routine() {
        let registry = TimerRegistry::new();
        let result = registry.create_session(
            UserId::new(1),
            TaskId::new(7),
            GymRoutine {
                countdown_sec: 0,
                work_sec: 0,
                rest_sec: 0,
                rounds: 1,
            },
        );
        assert!(result.is_err());
    }
}
