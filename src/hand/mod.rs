//! Hand input pipeline: landmark frames in, hold events out.
//!
//! This module contains:
//! - The 21-point landmark topology and frame geometry
//! - The weighted fist classifier
//! - The debounced hold tracker
//! - The single-slot frame feed from the landmark oracle

pub mod feed;
pub mod fist;
pub mod hold;
pub mod landmarks;

// Re-export commonly used types
pub use feed::{ClassificationFeed, FramePublisher};
pub use fist::{FistClassifier, FistConfig};
pub use hold::{GestureEvent, HoldTracker};
pub use landmarks::{HandFrame, HandLandmark, Landmark, LANDMARK_COUNT};
