//! End-of-session progress pipeline.
//!
//! When a session ends, four steps run in order against the progress
//! backend: record the played level's score, record a zero-score
//! watermark on the next level, move the player's current level, then
//! refresh the sign-in. Every step is best effort. A failure is logged
//! and the pipeline moves on, with one exception: the level move is
//! skipped when its unlock watermark did not land, so the player is
//! never pointed at a level the backend does not know about.

use crate::backend::{device_id, ProgressBackend, TrainingRecord};
use crate::game::session::SessionReport;
use crossbeam_channel::{bounded, Receiver};
use std::thread;
use tracing::{info, warn};

/// What the pipeline managed to get through to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceOutcome {
    /// Score record for the played level landed
    pub score_recorded: bool,
    /// Zero-score watermark for the next level landed
    pub unlock_recorded: bool,
    /// Current level moved to the next level
    pub level_updated: bool,
    /// Sign-in refresh landed
    pub signed_in: bool,
}

impl std::fmt::Display for SequenceOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn mark(ok: bool) -> &'static str {
            if ok {
                "ok"
            } else {
                "failed"
            }
        }
        write!(
            f,
            "score {}, unlock {}, level {}, sign-in {}",
            mark(self.score_recorded),
            mark(self.unlock_recorded),
            mark(self.level_updated),
            mark(self.signed_in)
        )
    }
}

/// Runs the end-of-session steps against a progress backend.
pub struct EndOfSessionSequencer {
    backend: Box<dyn ProgressBackend>,
    kind: String,
    level: u32,
    device_id: String,
}

impl EndOfSessionSequencer {
    /// Create a sequencer for one training kind and the level that was played.
    pub fn new(backend: Box<dyn ProgressBackend>, kind: impl Into<String>, level: u32) -> Self {
        Self {
            backend,
            kind: kind.into(),
            level,
            device_id: device_id(),
        }
    }

    /// Run the pipeline synchronously and report what landed.
    pub fn run(&self, report: &SessionReport) -> SequenceOutcome {
        let score = TrainingRecord::new(
            &self.kind,
            self.level,
            report.caught,
            report.active_secs,
            &self.device_id,
        );
        let score_recorded = match self.backend.record_training(&score) {
            Ok(()) => true,
            Err(e) => {
                warn!("score record for level {} failed: {e}", self.level);
                false
            }
        };

        let unlock = TrainingRecord::new(&self.kind, self.level + 1, 0, 0, &self.device_id);
        let unlock_recorded = match self.backend.record_training(&unlock) {
            Ok(()) => true,
            Err(e) => {
                warn!("unlock record for level {} failed: {e}", self.level + 1);
                false
            }
        };

        // Never point the player at a level the backend has no record of
        let level_updated = if unlock_recorded {
            match self.backend.update_current_level(&self.kind, self.level + 1) {
                Ok(()) => true,
                Err(e) => {
                    warn!("current level update to {} failed: {e}", self.level + 1);
                    false
                }
            }
        } else {
            false
        };

        let signed_in = match self.backend.sign_in() {
            Ok(()) => true,
            Err(e) => {
                warn!("sign-in refresh failed: {e}");
                false
            }
        };

        let outcome = SequenceOutcome {
            score_recorded,
            unlock_recorded,
            level_updated,
            signed_in,
        };
        info!("session {} progress sync: {outcome}", report.session_id);
        outcome
    }

    /// Run the pipeline on a detached thread.
    ///
    /// The returned receiver yields the outcome once. If the caller is
    /// gone by then the send is dropped and the completion is a no-op.
    pub fn spawn(self, report: SessionReport) -> Receiver<SequenceOutcome> {
        let (sender, receiver) = bounded(1);
        thread::spawn(move || {
            let outcome = self.run(&report);
            let _ = sender.send(outcome);
        });
        receiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, CATCH_TRAINING};
    use chrono::Utc;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use uuid::Uuid;

    struct ScriptedBackend {
        calls: Arc<Mutex<Vec<String>>>,
        fail_record_levels: Vec<u32>,
        fail_level_update: bool,
        fail_sign_in: bool,
    }

    impl ScriptedBackend {
        fn new(calls: Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                calls,
                fail_record_levels: Vec::new(),
                fail_level_update: false,
                fail_sign_in: false,
            }
        }

        fn refused() -> BackendError {
            BackendError::Server {
                status: 503,
                message: "scripted failure".to_string(),
            }
        }
    }

    impl ProgressBackend for ScriptedBackend {
        fn record_training(&self, record: &TrainingRecord) -> Result<(), BackendError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("record:{}:{}", record.level, record.score));
            if self.fail_record_levels.contains(&record.level) {
                return Err(Self::refused());
            }
            Ok(())
        }

        fn update_current_level(&self, _kind: &str, level: u32) -> Result<(), BackendError> {
            self.calls.lock().unwrap().push(format!("level:{level}"));
            if self.fail_level_update {
                return Err(Self::refused());
            }
            Ok(())
        }

        fn sign_in(&self) -> Result<(), BackendError> {
            self.calls.lock().unwrap().push("sign_in".to_string());
            if self.fail_sign_in {
                return Err(Self::refused());
            }
            Ok(())
        }
    }

    fn report(caught: u32) -> SessionReport {
        SessionReport {
            session_id: Uuid::new_v4(),
            caught,
            target: 10,
            success: caught >= 10,
            active_secs: 180,
            ended_at: Utc::now(),
        }
    }

    #[test]
    fn test_steps_run_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let backend = ScriptedBackend::new(calls.clone());
        let sequencer = EndOfSessionSequencer::new(Box::new(backend), CATCH_TRAINING, 4);

        let outcome = sequencer.run(&report(7));

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["record:4:7", "record:5:0", "level:5", "sign_in"]
        );
        assert!(outcome.score_recorded);
        assert!(outcome.unlock_recorded);
        assert!(outcome.level_updated);
        assert!(outcome.signed_in);
    }

    #[test]
    fn test_score_failure_does_not_stop_the_rest() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut backend = ScriptedBackend::new(calls.clone());
        backend.fail_record_levels = vec![4];
        let sequencer = EndOfSessionSequencer::new(Box::new(backend), CATCH_TRAINING, 4);

        let outcome = sequencer.run(&report(2));

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["record:4:2", "record:5:0", "level:5", "sign_in"]
        );
        assert!(!outcome.score_recorded);
        assert!(outcome.unlock_recorded);
        assert!(outcome.level_updated);
        assert!(outcome.signed_in);
    }

    #[test]
    fn test_failed_unlock_skips_level_move() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut backend = ScriptedBackend::new(calls.clone());
        backend.fail_record_levels = vec![5];
        let sequencer = EndOfSessionSequencer::new(Box::new(backend), CATCH_TRAINING, 4);

        let outcome = sequencer.run(&report(11));

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["record:4:11", "record:5:0", "sign_in"]
        );
        assert!(outcome.score_recorded);
        assert!(!outcome.unlock_recorded);
        assert!(!outcome.level_updated);
        assert!(outcome.signed_in);
    }

    #[test]
    fn test_sign_in_failure_is_contained() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut backend = ScriptedBackend::new(calls.clone());
        backend.fail_sign_in = true;
        let sequencer = EndOfSessionSequencer::new(Box::new(backend), CATCH_TRAINING, 1);

        let outcome = sequencer.run(&report(0));

        assert!(outcome.score_recorded);
        assert!(outcome.level_updated);
        assert!(!outcome.signed_in);
    }

    #[test]
    fn test_spawn_delivers_outcome() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let backend = ScriptedBackend::new(calls.clone());
        let sequencer = EndOfSessionSequencer::new(Box::new(backend), CATCH_TRAINING, 1);

        let receiver = sequencer.spawn(report(10));
        let outcome = receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("outcome should arrive");

        assert!(outcome.score_recorded);
        assert_eq!(calls.lock().unwrap().len(), 4);
    }

    #[test]
    fn test_spawn_with_dropped_receiver_still_runs() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let backend = ScriptedBackend::new(calls.clone());
        let sequencer = EndOfSessionSequencer::new(Box::new(backend), CATCH_TRAINING, 1);

        drop(sequencer.spawn(report(10)));

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while calls.lock().unwrap().len() < 4 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(calls.lock().unwrap().len(), 4);
    }
}
