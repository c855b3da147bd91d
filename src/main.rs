//! Gripcatch CLI
//!
//! Gesture-driven capture game for hand rehabilitation.

use chrono::Utc;
use clap::{Parser, Subcommand};
use gripcatch_engine::{
    backend::{NullBackend, ProgressBackend},
    config::GameConfig,
    game::{CreatureEvent, GameEvent, SessionController, SessionRunner, Viewport},
    hand::{ClassificationFeed, FistClassifier, Landmark},
    sequencer::EndOfSessionSequencer,
    sim::ScriptedHand,
    PRIVACY_DECLARATION, VERSION,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[cfg(feature = "http")]
use gripcatch_engine::{
    backend::BackendError, config::BackendSettings, ApiConfig, BlockingApiClient,
};

#[derive(Parser)]
#[command(name = "gripcatch")]
#[command(version = VERSION)]
#[command(about = "Gesture-driven capture game for hand rehabilitation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a capture session with the simulated hand
    Run {
        /// Seed for spawn randomness (random when omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Session length in seconds (overrides the config file)
        #[arg(long)]
        duration: Option<u64>,

        /// Captures required for success (overrides the config file)
        #[arg(long)]
        target: Option<u32>,

        /// Level to play and report (overrides the config file)
        #[arg(long)]
        level: Option<u32>,

        /// Seconds the simulated hand stays clenched each cycle
        #[arg(long, default_value = "2.0")]
        clench_secs: f64,

        /// Seconds the simulated hand stays open each cycle
        #[arg(long, default_value = "1.5")]
        release_secs: f64,

        /// Enable progress sync to the therapy backend (requires http feature)
        #[arg(long)]
        backend: bool,

        /// Backend base URL (overrides the config file)
        #[arg(long)]
        backend_url: Option<String>,

        /// Backend bearer token (overrides the config file)
        #[arg(long)]
        backend_token: Option<String>,
    },

    /// Classify a single landmark frame from a JSON file
    Classify {
        /// Path to a JSON array of {x, y} landmarks
        input: PathBuf,
    },

    /// Display privacy declaration
    Privacy,

    /// Show configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gripcatch_engine=info".into()),
        )
        .init();

    match cli.command {
        Commands::Run {
            seed,
            duration,
            target,
            level,
            clench_secs,
            release_secs,
            backend,
            backend_url,
            backend_token,
        } => {
            cmd_run(
                seed,
                duration,
                target,
                level,
                clench_secs,
                release_secs,
                backend,
                backend_url,
                backend_token,
            );
        }
        Commands::Classify { input } => {
            cmd_classify(input);
        }
        Commands::Privacy => {
            cmd_privacy();
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

#[allow(unused_variables)]
fn cmd_run(
    seed: Option<u64>,
    duration: Option<u64>,
    target: Option<u32>,
    level: Option<u32>,
    clench_secs: f64,
    release_secs: f64,
    enable_backend: bool,
    backend_url: Option<String>,
    backend_token: Option<String>,
) {
    println!("Gripcatch Engine v{VERSION}");
    println!();

    let mut hand = match ScriptedHand::from_cycle_secs(clench_secs, release_secs) {
        Some(hand) => hand,
        None => {
            eprintln!(
                "Error: --clench-secs must be a positive number of seconds \
                 and --release-secs non-negative"
            );
            std::process::exit(1);
        }
    };

    // Load or create configuration, then apply CLI overrides
    let mut config = GameConfig::load().unwrap_or_default();
    if let Some(secs) = duration {
        config.session_duration = Duration::from_secs(secs);
    }
    if let Some(count) = target {
        config.target_count = count;
    }
    if let Some(level) = level {
        config.current_level = level;
    }

    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    println!("Starting session...");
    println!("  Level: {}", config.current_level);
    println!("  Duration: {}s", config.session_duration.as_secs());
    println!("  Target: {} captures", config.target_count);
    println!(
        "  Hold threshold: {:.1}s",
        config.hold_threshold.as_secs_f64()
    );
    println!("  Simulated hand: clench {clench_secs:.1}s / release {release_secs:.1}s");

    // Pick the progress backend
    #[cfg(feature = "http")]
    let backend: Box<dyn ProgressBackend> = if enable_backend {
        match create_backend(config.backend.as_ref(), backend_url, backend_token) {
            Ok(client) => {
                println!("  Progress sync: enabled");
                println!("  Device ID: {}", client.device_id());
                Box::new(client)
            }
            Err(e) => {
                eprintln!("Warning: Backend initialization failed: {e}");
                eprintln!("Continuing without progress sync.");
                Box::new(NullBackend)
            }
        }
    } else {
        println!("  Progress sync: disabled");
        Box::new(NullBackend)
    };

    #[cfg(not(feature = "http"))]
    let backend: Box<dyn ProgressBackend> = {
        if enable_backend {
            eprintln!("Warning: --backend flag ignored (http feature not enabled at compile time)");
        }
        Box::new(NullBackend)
    };

    println!();
    println!("Press Ctrl+C to stop");
    println!();

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    let viewport = Viewport {
        width: config.viewport_width,
        height: config.viewport_height,
    };
    let rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };
    let session = match SessionController::new(&config, viewport, rng) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let feed = ClassificationFeed::new();
    let publisher = feed.publisher();

    // Simulated landmark source; a camera pipeline would publish here instead
    let sim_running = running.clone();
    let sim_handle = thread::spawn(move || {
        while sim_running.load(Ordering::SeqCst) {
            publisher.publish(hand.next_frame());
            thread::sleep(Duration::from_millis(50));
        }
    });

    let sequencer = EndOfSessionSequencer::new(
        backend,
        config.training_kind.clone(),
        config.current_level,
    );
    let runner = SessionRunner::new(session, feed, sequencer, running.clone());

    let report = runner.run(|event| print_event(&event));

    // Stop the simulated source before reporting
    running.store(false, Ordering::SeqCst);
    let _ = sim_handle.join();

    println!();
    match report {
        Some(report) => {
            println!(
                "Session over: {}/{} caught in {}s",
                report.caught, report.target, report.active_secs
            );
            if report.success {
                println!("Success! Level {} cleared.", config.current_level);
            } else {
                println!("Target not reached this time.");
            }
        }
        None => {
            println!("Session aborted.");
        }
    }
}

fn cmd_classify(input: PathBuf) {
    let content = match std::fs::read_to_string(&input) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading {input:?}: {e}");
            std::process::exit(1);
        }
    };

    let landmarks: Vec<Landmark> = match serde_json::from_str(&content) {
        Ok(landmarks) => landmarks,
        Err(e) => {
            eprintln!("Error parsing {input:?}: {e}");
            std::process::exit(1);
        }
    };

    let classifier = FistClassifier::default();
    match classifier.score(&landmarks) {
        Some(score) => {
            let verdict = if classifier.classify(&landmarks) {
                "clenched"
            } else {
                "open"
            };
            println!("{} landmarks: {verdict} (score {score:.1})", landmarks.len());
        }
        None => {
            println!(
                "{} landmarks: not a full hand (need 21), treated as open",
                landmarks.len()
            );
        }
    }
}

fn cmd_privacy() {
    println!("{PRIVACY_DECLARATION}");
}

fn cmd_config() {
    let config = GameConfig::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", GameConfig::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

fn print_event(event: &GameEvent) {
    match event {
        GameEvent::CountdownTick(digit) => {
            println!("  {digit}...");
        }
        GameEvent::Started { remaining_secs } => {
            println!("Go! {remaining_secs}s on the clock");
        }
        GameEvent::Creature(creature) => print_creature_event(creature),
        GameEvent::ScoreChanged { caught, target } => {
            println!("  Score: {caught}/{target}");
        }
        GameEvent::RemainingChanged { secs } => {
            if *secs > 0 && (*secs % 30 == 0 || *secs <= 5) {
                println!("  {secs}s remaining");
            }
        }
        GameEvent::Ended(_) => {}
    }
}

fn print_creature_event(event: &CreatureEvent) {
    let stamp = Utc::now().format("%H:%M:%S");
    match event {
        CreatureEvent::Spawned { direction, .. } => {
            println!("[{stamp}] A creature darts out, heading {direction:?}");
        }
        CreatureEvent::LaidDown { .. } => {
            println!("[{stamp}] It lies low");
        }
        CreatureEvent::GotUp { .. } => {
            println!("[{stamp}] It gets back up and runs");
        }
        CreatureEvent::CaptureStarted { .. } => {
            println!("[{stamp}] Grabbed! Carrying it to the basket...");
        }
        CreatureEvent::Caught { .. } => {
            println!("[{stamp}] Caught!");
        }
        CreatureEvent::Escaped { .. } => {
            println!("[{stamp}] It slipped off the edge");
        }
        CreatureEvent::Removed { .. } => {}
    }
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");
}

/// Create a backend client from CLI args or the config file.
#[cfg(feature = "http")]
fn create_backend(
    settings: Option<&BackendSettings>,
    url: Option<String>,
    token: Option<String>,
) -> Result<BlockingApiClient, BackendError> {
    // If both URL and token are provided, use them directly
    if let (Some(url), Some(token)) = (url.clone(), token.clone()) {
        return BlockingApiClient::new(ApiConfig::new(url, token));
    }

    if url.is_some() || token.is_some() {
        eprintln!("Warning: Partial backend flags provided, falling back to the config file...");
    }

    match settings {
        Some(settings) => {
            let mut api = ApiConfig::new(settings.base_url.clone(), settings.token.clone());
            api.timeout = Duration::from_secs(settings.timeout_secs);
            BlockingApiClient::new(api)
        }
        None => Err(BackendError::Config(
            "no backend configured; pass --backend-url and --backend-token or add one to the config file".to_string(),
        )),
    }
}
