//! Merging of touching blobs: the larger (or equal) one absorbs the other.
//!
//! Implemented once for anything that exposes [`Mergeable`]; seeds and any
//! other absorbable entity share the same rules.

use serde::{Deserialize, Serialize};

use crate::math::Color;

/// Sizes closer than this count as equal.
const SAME_SIZE_EPSILON: f32 = 0.001;

/// Capability needed to take part in a merge.
pub trait Mergeable {
    fn size(&self) -> f32;
    fn set_scale(&mut self, scale: f32);
    fn color(&self) -> Color;
    fn set_color(&mut self, color: Color);
    fn is_locked(&self) -> bool;
    /// Mark as about to be absorbed, so it cannot absorb anything this frame.
    fn lock_for_absorption(&mut self);
}

/// Which size relations allow absorption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MergeRule {
    #[default]
    SameSizeOnly,
    SameSizeOrSmaller,
}

/// How `other` compares to the absorber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeComparison {
    Smaller,
    SameSize,
    Larger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// `other` was absorbed and should be removed by the caller
    Absorbed,
    /// No merge; sizes or locks did not allow it
    Rejected,
}

pub fn compare_size(absorber: &impl Mergeable, other: &impl Mergeable) -> SizeComparison {
    let (a, b) = (absorber.size(), other.size());
    if (a - b).abs() < SAME_SIZE_EPSILON {
        SizeComparison::SameSize
    } else if b < a {
        SizeComparison::Smaller
    } else {
        SizeComparison::Larger
    }
}

/// Try to have `absorber` take in `other`: scales add, colors average.
pub fn try_absorb(
    absorber: &mut impl Mergeable,
    other: &mut impl Mergeable,
    rule: MergeRule,
) -> MergeOutcome {
    if absorber.is_locked() || other.is_locked() {
        return MergeOutcome::Rejected;
    }
    let allowed = match compare_size(absorber, other) {
        SizeComparison::SameSize => true,
        SizeComparison::Smaller => rule == MergeRule::SameSizeOrSmaller,
        SizeComparison::Larger => false,
    };
    if !allowed {
        return MergeOutcome::Rejected;
    }

    other.lock_for_absorption();
    absorber.set_scale(absorber.size() + other.size());
    absorber.set_color(Color::average(&[absorber.color(), other.color()]));
    MergeOutcome::Absorbed
}
