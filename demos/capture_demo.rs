//! Demonstration of the Gripcatch capture engine.
//!
//! This example shows how to:
//! 1. Build a game configuration
//! 2. Feed simulated landmark frames into the classification feed
//! 3. Run a session through the serialized loop
//! 4. Read the final session report
//!
//! Run with: cargo run --example capture_demo

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use gripcatch_engine::{
    backend::{NullBackend, CATCH_TRAINING},
    config::GameConfig,
    game::{SessionController, SessionRunner, Viewport},
    hand::ClassificationFeed,
    sequencer::EndOfSessionSequencer,
    sim::ScriptedHand,
    PRIVACY_DECLARATION,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn main() {
    println!("Gripcatch Engine - Capture Demo");
    println!("================================");
    println!();

    // Display privacy declaration
    println!("{PRIVACY_DECLARATION}");
    println!();

    // A short game so the demo finishes quickly
    let mut config = GameConfig::default();
    config.session_duration = Duration::from_secs(20);
    config.target_count = 3;

    let viewport = Viewport {
        width: config.viewport_width,
        height: config.viewport_height,
    };
    let session = SessionController::new(&config, viewport, SmallRng::seed_from_u64(2024))
        .expect("demo config is valid");

    let feed = ClassificationFeed::new();
    let publisher = feed.publisher();
    let running = Arc::new(AtomicBool::new(true));

    // Scripted hand: two-second clenches with a pause between them
    let source_running = running.clone();
    let source = thread::spawn(move || {
        let mut hand = ScriptedHand::new(Duration::from_secs(2), Duration::from_millis(1500));
        while source_running.load(Ordering::SeqCst) {
            publisher.publish(hand.next_frame());
            thread::sleep(Duration::from_millis(50));
        }
    });

    let sequencer = EndOfSessionSequencer::new(Box::new(NullBackend), CATCH_TRAINING, 1);
    let runner = SessionRunner::new(session, feed, sequencer, running.clone());

    println!(
        "Playing a {}s session, {} captures to win...",
        config.session_duration.as_secs(),
        config.target_count
    );
    println!();

    let report = runner.run(|event| println!("  {event:?}"));

    running.store(false, Ordering::SeqCst);
    let _ = source.join();

    println!();
    match report {
        Some(report) => {
            println!(
                "Caught {}/{} in {}s (success: {})",
                report.caught, report.target, report.active_secs, report.success
            );
        }
        None => {
            println!("Demo stopped before the session ended.");
        }
    }
}
