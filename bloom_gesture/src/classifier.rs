//! Landmark geometry classifier.
//!
//! Pure, deterministic, a fixed handful of comparisons per call.  The
//! classifier never remembers anything between frames; smoothing over
//! time is the debouncer's job.
//!
//! # Algorithm
//!
//! Each finger gets a boolean "extended" flag:
//!
//! * **Thumb**: extended when the lateral distance from tip to the MCP
//!   joint exceeds 1.2x the lateral distance from the IP joint to the
//!   MCP joint.  The thumb moves sideways relative to the palm, so a
//!   vertical test would misread it.
//! * **Other fingers**: extended when the tip sits above the PIP joint
//!   in frame coordinates (y grows downward, so "above" is the smaller
//!   value).
//!
//! The five flags are then matched against an ordered rule table;
//! the first matching rule wins.  Peace deliberately ignores the thumb
//! while IndexUp requires it retracted; that asymmetry is the shipped
//! behavior, not an oversight to correct.

use crate::landmark::{
    LandmarkSet, INDEX_PIP, INDEX_TIP, MIDDLE_PIP, MIDDLE_TIP, PINKY_PIP, PINKY_TIP, RING_PIP,
    RING_TIP, THUMB_IP, THUMB_MCP, THUMB_TIP,
};

/// Lateral tip/IP ratio above which the thumb counts as extended.
const THUMB_SPREAD_RATIO: f32 = 1.2;

// ════════════════════════════════════════════════════════════════════════════
// GestureLabel
// ════════════════════════════════════════════════════════════════════════════

/// The discrete gesture vocabulary.
///
/// `None` covers both "no finger pattern matched" and "no hand in
/// frame"; it is a real label that can itself become the stable signal
/// after debouncing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GestureLabel {
    IndexUp,
    Peace,
    Rock,
    Ily,
    Open,
    Fist,
    None,
}

impl GestureLabel {
    /// Short display name for the status line.
    pub fn name(self) -> &'static str {
        match self {
            GestureLabel::IndexUp => "index up",
            GestureLabel::Peace => "peace",
            GestureLabel::Rock => "rock",
            GestureLabel::Ily => "I-love-you",
            GestureLabel::Open => "open hand",
            GestureLabel::Fist => "fist",
            GestureLabel::None => "none",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Finger flags
// ════════════════════════════════════════════════════════════════════════════

/// Per-finger extension flags derived from one landmark set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FingerFlags {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerFlags {
    pub fn from_landmarks(hand: &LandmarkSet) -> FingerFlags {
        let lateral = |a: usize, b: usize| (hand.point(a).x - hand.point(b).x).abs();
        // Tip above PIP means extended; y grows downward in frame space.
        let raised = |tip: usize, pip: usize| hand.point(tip).y < hand.point(pip).y;

        FingerFlags {
            thumb: lateral(THUMB_TIP, THUMB_MCP) > lateral(THUMB_IP, THUMB_MCP) * THUMB_SPREAD_RATIO,
            index: raised(INDEX_TIP, INDEX_PIP),
            middle: raised(MIDDLE_TIP, MIDDLE_PIP),
            ring: raised(RING_TIP, RING_PIP),
            pinky: raised(PINKY_TIP, PINKY_PIP),
        }
    }

    /// Number of fingers currently read as extended, thumb included.
    pub fn extended_count(self) -> usize {
        [self.thumb, self.index, self.middle, self.ring, self.pinky]
            .iter()
            .filter(|&&f| f)
            .count()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// classify
// ════════════════════════════════════════════════════════════════════════════

/// Classify one landmark set into a gesture label.
pub fn classify(hand: &LandmarkSet) -> GestureLabel {
    classify_flags(FingerFlags::from_landmarks(hand))
}

/// The ordered rule table.  Evaluated top to bottom, first match wins;
/// overlapping poses (Ily vs Rock, Rock vs IndexUp) resolve by order.
pub fn classify_flags(f: FingerFlags) -> GestureLabel {
    let n = f.extended_count();
    let rules: [(bool, GestureLabel); 6] = [
        (f.thumb && f.index && !f.middle && !f.ring && f.pinky, GestureLabel::Ily),
        (!f.thumb && f.index && !f.middle && !f.ring && f.pinky, GestureLabel::Rock),
        (f.index && f.middle && !f.ring && !f.pinky, GestureLabel::Peace),
        (!f.thumb && f.index && !f.middle && !f.ring && !f.pinky, GestureLabel::IndexUp),
        (n >= 4, GestureLabel::Open),
        (n <= 1, GestureLabel::Fist),
    ];
    rules
        .iter()
        .find(|(hit, _)| *hit)
        .map(|&(_, label)| label)
        .unwrap_or(GestureLabel::None)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{Landmark, LANDMARK_COUNT, THUMB_CMC};

    /// Build a landmark set with the given fingers extended.
    ///
    /// Geometry is schematic: the palm sits at y = 0.6, extended finger
    /// tips at y = 0.3 (above their PIP joints), curled tips at y = 0.65
    /// (below).  The thumb is driven laterally from its MCP joint.
    fn hand(thumb: bool, index: bool, middle: bool, ring: bool, pinky: bool) -> LandmarkSet {
        let mut pts = [Landmark::default(); LANDMARK_COUNT];
        for p in pts.iter_mut() {
            *p = Landmark::new(0.5, 0.6, 0.0);
        }

        // Thumb chain: MCP at x=0.45, IP a little out, tip far out when
        // extended (ratio > 1.2), barely past the IP when curled.
        pts[THUMB_CMC] = Landmark::new(0.47, 0.62, 0.0);
        pts[THUMB_MCP] = Landmark::new(0.45, 0.60, 0.0);
        pts[THUMB_IP] = Landmark::new(0.40, 0.55, 0.0);
        let tip_x = if thumb { 0.30 } else { 0.41 };
        pts[THUMB_TIP] = Landmark::new(tip_x, 0.52, 0.0);

        let mut set_finger = |pip: usize, tip: usize, up: bool| {
            pts[pip] = Landmark::new(0.5, 0.5, 0.0);
            pts[tip] = Landmark::new(0.5, if up { 0.3 } else { 0.65 }, 0.0);
        };
        set_finger(INDEX_PIP, INDEX_TIP, index);
        set_finger(MIDDLE_PIP, MIDDLE_TIP, middle);
        set_finger(RING_PIP, RING_TIP, ring);
        set_finger(PINKY_PIP, PINKY_TIP, pinky);

        LandmarkSet::from_points(&pts).unwrap()
    }

    #[test]
    fn ily_thumb_index_pinky() {
        assert_eq!(classify(&hand(true, true, false, false, true)), GestureLabel::Ily);
    }

    #[test]
    fn ily_wins_over_rock() {
        // Same silhouette as Rock plus the thumb; priority must pick Ily.
        let flags = FingerFlags { thumb: true, index: true, middle: false, ring: false, pinky: true };
        assert_eq!(classify_flags(flags), GestureLabel::Ily);
    }

    #[test]
    fn rock_without_thumb() {
        assert_eq!(classify(&hand(false, true, false, false, true)), GestureLabel::Rock);
    }

    #[test]
    fn peace_ignores_thumb() {
        assert_eq!(classify(&hand(false, true, true, false, false)), GestureLabel::Peace);
        assert_eq!(classify(&hand(true, true, true, false, false)), GestureLabel::Peace);
    }

    #[test]
    fn index_up_requires_thumb_retracted() {
        assert_eq!(classify(&hand(false, true, false, false, false)), GestureLabel::IndexUp);
        // Thumb out plus index alone is two extended fingers in no
        // covered pattern.
        assert_eq!(classify(&hand(true, true, false, false, false)), GestureLabel::None);
    }

    #[test]
    fn open_at_four_or_five() {
        assert_eq!(classify(&hand(false, true, true, true, true)), GestureLabel::Open);
        assert_eq!(classify(&hand(true, true, true, true, true)), GestureLabel::Open);
    }

    #[test]
    fn fist_at_zero_or_one() {
        assert_eq!(classify(&hand(false, false, false, false, false)), GestureLabel::Fist);
        assert_eq!(classify(&hand(true, false, false, false, false)), GestureLabel::Fist);
    }

    #[test]
    fn ambiguous_two_or_three_is_none() {
        // index + ring matches nothing.
        assert_eq!(classify(&hand(false, true, false, true, false)), GestureLabel::None);
        // index + middle + ring matches nothing either.
        assert_eq!(classify(&hand(false, true, true, true, false)), GestureLabel::None);
    }

    #[test]
    fn classifier_is_deterministic() {
        let h = hand(true, true, false, false, true);
        let first = classify(&h);
        for _ in 0..10 {
            assert_eq!(classify(&h), first);
        }
    }
}
