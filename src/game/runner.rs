//! Serialized session loop.
//!
//! One thread owns the whole game state. Frames arrive over the
//! single-slot classification feed, the three one-second cadences
//! (countdown, game clock, watchdog) are checked between frames, and
//! every state change leaves as a [`GameEvent`] through the caller's
//! sink. Nothing in here locks; serialization is the loop itself.

use crate::game::session::{GameEvent, SessionController, SessionPhase, SessionReport};
use crate::hand::feed::ClassificationFeed;
use crate::sequencer::EndOfSessionSequencer;
use crossbeam_channel::RecvTimeoutError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const RECV_TIMEOUT: Duration = Duration::from_millis(50);
const TICK_INTERVAL: Duration = Duration::from_secs(1);
const SYNC_WAIT: Duration = Duration::from_secs(30);

/// Drives a [`SessionController`] from a frame feed until the session
/// ends or the running flag is cleared.
pub struct SessionRunner {
    session: SessionController,
    feed: ClassificationFeed,
    sequencer: EndOfSessionSequencer,
    running: Arc<AtomicBool>,
}

impl SessionRunner {
    /// Create a runner. The running flag is shared with whoever owns
    /// shutdown (typically a Ctrl+C handler).
    pub fn new(
        session: SessionController,
        feed: ClassificationFeed,
        sequencer: EndOfSessionSequencer,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            session,
            feed,
            sequencer,
            running,
        }
    }

    /// Run the session to completion.
    ///
    /// Blocks until the session expires or the running flag drops.
    /// On a natural end the progress pipeline runs and `run` waits up
    /// to thirty seconds for its outcome before returning without it;
    /// on early teardown the pipeline never starts and the report is
    /// `None`.
    pub fn run<F>(mut self, mut sink: F) -> Option<SessionReport>
    where
        F: FnMut(GameEvent),
    {
        let receiver = self.feed.receiver().clone();

        self.session.start();
        for event in self.session.take_events() {
            sink(event);
        }

        let mut last_countdown = Instant::now();
        let mut last_clock = Instant::now();
        let mut last_watchdog = Instant::now();
        let mut report = None;

        while self.running.load(Ordering::SeqCst) {
            match receiver.recv_timeout(RECV_TIMEOUT) {
                Ok(frame) => self.session.on_frame(&frame, Instant::now()),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("classification feed disconnected, stopping session loop");
                    break;
                }
            }

            let now = Instant::now();

            if self.session.phase() == SessionPhase::Countdown
                && last_countdown.elapsed() >= TICK_INTERVAL
            {
                self.session.tick_countdown(now);
                last_countdown = now;
                if self.session.phase() == SessionPhase::Active {
                    // The clock and watchdog cadences begin with the active phase
                    last_clock = now;
                    last_watchdog = now;
                }
            }

            if self.session.phase() == SessionPhase::Active {
                if last_clock.elapsed() >= TICK_INTERVAL {
                    self.session.tick_clock(now);
                    last_clock = now;
                }
                if last_watchdog.elapsed() >= TICK_INTERVAL {
                    self.session.tick_watchdog(now);
                    last_watchdog = now;
                }
            }

            self.session.poll(now);

            for event in self.session.take_events() {
                sink(event);
            }

            if let Some(finished) = self.session.take_report() {
                report = Some(finished);
                break;
            }
        }

        // Drop any frame still parked in the feed slot
        self.feed.drain();

        match report {
            Some(finished) => {
                let outcome_rx = self.sequencer.spawn(finished.clone());
                match outcome_rx.recv_timeout(SYNC_WAIT) {
                    Ok(outcome) => info!("progress sync finished: {outcome}"),
                    Err(_) => warn!("progress sync still pending at loop exit"),
                }
                Some(finished)
            }
            None => {
                info!("session loop stopped before the session ended");
                None
            }
        }
    }
}
