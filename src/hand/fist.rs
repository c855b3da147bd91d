//! Fist detection from hand landmarks.
//!
//! A weighted score over five independent pose tests (four finger-curl
//! tests plus a thumb-tuck test) decides whether the hand is clenched.
//! The classifier is pure: same landmarks in, same verdict out.

use crate::hand::landmarks::{
    distance, interior_angle_deg, midpoint, HandLandmark, Landmark, LANDMARK_COUNT,
};

/// Thresholds for the fist score.
#[derive(Debug, Clone)]
pub struct FistConfig {
    /// Maximum tip-to-wrist over knuckle-to-wrist ratio for a curled finger
    pub curl_ratio_max: f32,
    /// Maximum interior angle (degrees) at the middle joint for a curled finger
    pub curl_angle_max_deg: f32,
    /// Maximum thumb-tip distance to the knuckle midpoint, as a multiple of
    /// the thumb-knuckle distance to the same midpoint
    pub thumb_ratio_max: f32,
    /// Minimum score (out of 5) to call the hand clenched
    pub clench_threshold: f32,
}

impl Default for FistConfig {
    fn default() -> Self {
        Self {
            curl_ratio_max: 1.3,
            curl_angle_max_deg: 160.0,
            thumb_ratio_max: 1.2,
            clench_threshold: 3.0,
        }
    }
}

/// Weighted fist classifier over a 21-landmark hand frame.
#[derive(Debug, Clone, Default)]
pub struct FistClassifier {
    config: FistConfig,
}

/// The four non-thumb fingers as (knuckle, middle joint, tip) triples.
const FINGERS: [(HandLandmark, HandLandmark, HandLandmark); 4] = [
    (
        HandLandmark::IndexMcp,
        HandLandmark::IndexPip,
        HandLandmark::IndexTip,
    ),
    (
        HandLandmark::MiddleMcp,
        HandLandmark::MiddlePip,
        HandLandmark::MiddleTip,
    ),
    (
        HandLandmark::RingMcp,
        HandLandmark::RingPip,
        HandLandmark::RingTip,
    ),
    (
        HandLandmark::PinkyMcp,
        HandLandmark::PinkyPip,
        HandLandmark::PinkyTip,
    ),
];

impl FistClassifier {
    /// Create a classifier with the given thresholds.
    pub fn new(config: FistConfig) -> Self {
        Self { config }
    }

    /// Whether the landmarks describe a clenched hand.
    ///
    /// An undetermined frame (fewer than 21 landmarks) is never clenched.
    pub fn classify(&self, landmarks: &[Landmark]) -> bool {
        match self.score(landmarks) {
            Some(score) => score >= self.config.clench_threshold,
            None => false,
        }
    }

    /// Raw fist score out of 5.0, or `None` for an undetermined frame.
    ///
    /// Each of the four fingers contributes 1.0 when curled; the thumb
    /// contributes 1.0 when tucked across the palm.
    pub fn score(&self, landmarks: &[Landmark]) -> Option<f32> {
        if landmarks.len() < LANDMARK_COUNT {
            return None;
        }

        let mut score = 0.0;
        for (mcp, pip, tip) in FINGERS {
            if self.finger_curled(landmarks, mcp, pip, tip) {
                score += 1.0;
            }
        }
        if self.thumb_tucked(landmarks) {
            score += 1.0;
        }
        Some(score)
    }

    /// A finger is curled only when all three sub-tests agree:
    /// the tip has drawn in toward the wrist, the tip sits below the
    /// middle joint on screen, and the middle joint is sharply bent.
    fn finger_curled(
        &self,
        landmarks: &[Landmark],
        mcp: HandLandmark,
        pip: HandLandmark,
        tip: HandLandmark,
    ) -> bool {
        let wrist = &landmarks[HandLandmark::Wrist.idx()];
        let mcp = &landmarks[mcp.idx()];
        let pip = &landmarks[pip.idx()];
        let tip = &landmarks[tip.idx()];

        // Tip drawn in: tip-to-wrist short relative to knuckle-to-wrist.
        // A knuckle on top of the wrist is a degenerate frame, not a curl.
        let base = distance(mcp, wrist);
        if base <= f32::EPSILON {
            return false;
        }
        if distance(tip, wrist) / base >= self.config.curl_ratio_max {
            return false;
        }

        // Tip below the middle joint (y grows downward).
        if tip.y <= pip.y {
            return false;
        }

        // Middle joint sharply bent.
        interior_angle_deg(pip, mcp, tip) < self.config.curl_angle_max_deg
    }

    /// The thumb is tucked when its tip has crossed toward the index and
    /// middle knuckles: either close to their midpoint relative to the
    /// thumb knuckle, or horizontally between the two knuckles.
    fn thumb_tucked(&self, landmarks: &[Landmark]) -> bool {
        let thumb_tip = &landmarks[HandLandmark::ThumbTip.idx()];
        let thumb_mcp = &landmarks[HandLandmark::ThumbMcp.idx()];
        let index_mcp = &landmarks[HandLandmark::IndexMcp.idx()];
        let middle_mcp = &landmarks[HandLandmark::MiddleMcp.idx()];

        let (mx, my) = midpoint(index_mcp, middle_mcp);
        let mid = Landmark::new(mx, my);

        if distance(thumb_tip, &mid) < self.config.thumb_ratio_max * distance(thumb_mcp, &mid) {
            return true;
        }

        let lo = index_mcp.x.min(middle_mcp.x);
        let hi = index_mcp.x.max(middle_mcp.x);
        thumb_tip.x >= lo && thumb_tip.x <= hi
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim;

    #[test]
    fn test_clenched_hand_scores_full() {
        let classifier = FistClassifier::default();
        let landmarks = sim::clenched_hand();

        assert_eq!(classifier.score(&landmarks), Some(5.0));
        assert!(classifier.classify(&landmarks));
    }

    #[test]
    fn test_open_hand_is_not_clenched() {
        let classifier = FistClassifier::default();
        let landmarks = sim::open_hand();

        let score = classifier.score(&landmarks).unwrap();
        assert!(score < 3.0, "open hand scored {score}");
        assert!(!classifier.classify(&landmarks));
    }

    #[test]
    fn test_short_frame_is_undetermined() {
        let classifier = FistClassifier::default();

        assert_eq!(classifier.score(&[]), None);
        assert!(!classifier.classify(&[]));

        let partial: Vec<Landmark> = sim::clenched_hand().into_iter().take(10).collect();
        assert_eq!(classifier.score(&partial), None);
        assert!(!classifier.classify(&partial));
    }

    #[test]
    fn test_score_boundary_is_inclusive() {
        let classifier = FistClassifier::default();

        // Open up the pinky and push the thumb away: exactly three
        // curled fingers remain, landing on the 3.0 decision boundary.
        let mut landmarks = sim::clenched_hand();
        landmarks[HandLandmark::PinkyPip.idx()] = Landmark::new(0.64, 0.57);
        landmarks[HandLandmark::PinkyDip.idx()] = Landmark::new(0.65, 0.52);
        landmarks[HandLandmark::PinkyTip.idx()] = Landmark::new(0.66, 0.46);
        landmarks[HandLandmark::ThumbTip.idx()] = Landmark::new(0.20, 0.60);

        assert_eq!(classifier.score(&landmarks), Some(3.0));
        assert!(classifier.classify(&landmarks));
    }

    #[test]
    fn test_two_passing_tests_stay_open() {
        let classifier = FistClassifier::default();

        // Same hand with the ring finger opened as well: two curled
        // fingers score 2.0, below the threshold.
        let mut landmarks = sim::clenched_hand();
        landmarks[HandLandmark::PinkyPip.idx()] = Landmark::new(0.64, 0.57);
        landmarks[HandLandmark::PinkyDip.idx()] = Landmark::new(0.65, 0.52);
        landmarks[HandLandmark::PinkyTip.idx()] = Landmark::new(0.66, 0.46);
        landmarks[HandLandmark::RingPip.idx()] = Landmark::new(0.57, 0.52);
        landmarks[HandLandmark::RingDip.idx()] = Landmark::new(0.58, 0.45);
        landmarks[HandLandmark::RingTip.idx()] = Landmark::new(0.58, 0.38);
        landmarks[HandLandmark::ThumbTip.idx()] = Landmark::new(0.20, 0.60);

        assert_eq!(classifier.score(&landmarks), Some(2.0));
        assert!(!classifier.classify(&landmarks));
    }

    #[test]
    fn test_degenerate_knuckle_fails_curl() {
        let classifier = FistClassifier::default();

        // Collapse the index knuckle onto the wrist; the ratio test must
        // fail that finger rather than divide by zero.
        let mut landmarks = sim::clenched_hand();
        let wrist = landmarks[HandLandmark::Wrist.idx()];
        landmarks[HandLandmark::IndexMcp.idx()] = wrist;

        assert_eq!(classifier.score(&landmarks), Some(4.0));
    }

    #[test]
    fn test_thumb_between_knuckles_counts_as_tucked() {
        let classifier = FistClassifier::default();

        // Push the thumb tip far from the knuckle midpoint but keep its
        // x between the index and middle knuckles: the positional
        // fallback alone must count it as tucked.
        let mut landmarks = sim::clenched_hand();
        landmarks[HandLandmark::ThumbTip.idx()] = Landmark::new(0.46, 0.20);
        landmarks[HandLandmark::ThumbMcp.idx()] = Landmark::new(0.47, 0.60);

        assert_eq!(classifier.score(&landmarks), Some(5.0));
    }
}
