//! Per-transition safety classification from posterior confidence intervals.
//!
//! The safety feature of a transition is the directed slope
//! `(alt(target) − alt(source)) / distance`, bounded symmetrically: a
//! transition is safe iff its true slope lies in `[-h, h]`. This is the
//! crate's declared sign convention; the oracle tests validate it.
//!
//! Classification is pure. Two kinds of evidence can certify an edge:
//! a direct confidence interval from the belief model, or an interval
//! propagated from a nearby certified edge widened by `L · distance`.
//! Safety is the union of both certificates: whichever evidence says Safe
//! wins.

use serde::{Deserialize, Serialize};

/// Safety label of a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyLabel {
    /// Not enough evidence either way.
    Unknown,
    /// Confidence interval entirely within `[-h, h]`.
    Safe,
    /// Confidence interval entirely outside `[-h, h]`.
    Unsafe,
}

/// A closed interval bounding the true safety feature of one edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

impl Interval {
    /// The vacuous bound: every value is possible.
    pub fn unbounded() -> Self {
        Self {
            lo: f64::NEG_INFINITY,
            hi: f64::INFINITY,
        }
    }

    /// Confidence interval `[mean − β·sd, mean + β·sd]`.
    ///
    /// Returns `None` when the variance is negative or non-finite (a
    /// numerically unstable belief model must read as Unknown, never as
    /// spurious certainty). The mean must be finite as well.
    pub fn confidence(mean: f64, var: f64, beta: f64) -> Option<Self> {
        if !mean.is_finite() || !var.is_finite() || var < 0.0 {
            return None;
        }
        let half = beta * var.sqrt();
        Some(Self {
            lo: mean - half,
            hi: mean + half,
        })
    }

    /// Intersection with another bound on the same quantity.
    ///
    /// Both inputs are valid bounds on the same true value, so the
    /// intersection is too. This is what makes labels monotone over time:
    /// bounds only ever tighten.
    pub fn intersect(self, other: Interval) -> Interval {
        Interval {
            lo: self.lo.max(other.lo),
            hi: self.hi.min(other.hi),
        }
    }

    /// Widen by a non-negative amount on both sides (Lipschitz slack).
    pub fn widen(self, amount: f64) -> Interval {
        Interval {
            lo: self.lo - amount,
            hi: self.hi + amount,
        }
    }

    /// Mirror the interval (reverse traversal direction of the edge).
    pub fn negate(self) -> Interval {
        Interval {
            lo: -self.hi,
            hi: -self.lo,
        }
    }

    /// Interval width, infinite for the vacuous bound.
    pub fn width(self) -> f64 {
        self.hi - self.lo
    }
}

/// Classify an interval against the symmetric safety threshold `h`.
///
/// Safe iff the interval is entirely within `[-h, h]`; Unsafe iff it is
/// entirely outside; Unknown otherwise. An empty interval (contradictory
/// evidence intersected to nothing) carries no information and reads as
/// Unknown; label stickiness lives in the engine's stores, not here.
pub fn classify(interval: Interval, h: f64) -> SafetyLabel {
    if interval.lo > interval.hi {
        return SafetyLabel::Unknown;
    }
    if interval.lo >= -h && interval.hi <= h {
        SafetyLabel::Safe
    } else if interval.lo > h || interval.hi < -h {
        SafetyLabel::Unsafe
    } else {
        SafetyLabel::Unknown
    }
}

/// Derive the interval certified for an edge at `distance` from a safe
/// edge, then re-classify. The true feature can differ by at most
/// `L · distance` from the source edge's feature.
pub fn propagate(
    source: Interval,
    distance: f64,
    lipschitz: f64,
    h: f64,
) -> (Interval, SafetyLabel) {
    let derived = source.widen(lipschitz * distance);
    let label = classify(derived, h);
    (derived, label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_safe() {
        let iv = Interval { lo: -0.2, hi: 0.3 };
        assert_eq!(classify(iv, 0.5), SafetyLabel::Safe);
    }

    #[test]
    fn test_classify_unsafe_both_sides() {
        assert_eq!(
            classify(Interval { lo: 0.6, hi: 0.9 }, 0.5),
            SafetyLabel::Unsafe
        );
        assert_eq!(
            classify(Interval { lo: -2.0, hi: -0.7 }, 0.5),
            SafetyLabel::Unsafe
        );
    }

    #[test]
    fn test_classify_unknown_straddles() {
        let iv = Interval { lo: -0.2, hi: 0.8 };
        assert_eq!(classify(iv, 0.5), SafetyLabel::Unknown);
    }

    #[test]
    fn test_confidence_rejects_invalid_variance() {
        assert!(Interval::confidence(0.0, -1.0, 2.0).is_none());
        assert!(Interval::confidence(0.0, f64::NAN, 2.0).is_none());
        assert!(Interval::confidence(0.0, f64::INFINITY, 2.0).is_none());
        assert!(Interval::confidence(f64::NAN, 1.0, 2.0).is_none());
        assert!(Interval::confidence(0.0, 0.0, 2.0).is_some());
    }

    #[test]
    fn test_confidence_width() {
        let iv = Interval::confidence(1.0, 4.0, 3.0).unwrap();
        assert!((iv.lo - (1.0 - 6.0)).abs() < 1e-12);
        assert!((iv.hi - (1.0 + 6.0)).abs() < 1e-12);
    }

    #[test]
    fn test_intersect_tightens() {
        let a = Interval { lo: -1.0, hi: 1.0 };
        let b = Interval { lo: -0.5, hi: 2.0 };
        let c = a.intersect(b);
        assert_eq!(c, Interval { lo: -0.5, hi: 1.0 });
        // Intersection never widens.
        assert!(c.width() <= a.width());
        assert!(c.width() <= b.width());
    }

    #[test]
    fn test_consistent_evidence_never_flips_safe() {
        let safe = Interval { lo: -0.3, hi: 0.3 };
        assert_eq!(classify(safe, 0.5), SafetyLabel::Safe);
        let narrower = safe.intersect(Interval { lo: 0.1, hi: 0.2 });
        assert_eq!(classify(narrower, 0.5), SafetyLabel::Safe);
    }

    #[test]
    fn test_empty_interval_is_unknown() {
        // Contradictory evidence intersects to an empty interval; it must
        // classify neither way, no matter where it sits relative to h.
        let inside = Interval { lo: 0.4, hi: 0.2 };
        assert_eq!(classify(inside, 0.5), SafetyLabel::Unknown);
        let outside = Interval { lo: 1.4, hi: 1.2 };
        assert_eq!(classify(outside, 0.5), SafetyLabel::Unknown);
    }

    #[test]
    fn test_propagate_widens_and_reclassifies() {
        let src = Interval { lo: -0.1, hi: 0.1 };
        let (derived, label) = propagate(src, 0.5, 0.4, 0.5);
        assert!((derived.lo - (-0.3)).abs() < 1e-12);
        assert!((derived.hi - 0.3).abs() < 1e-12);
        assert_eq!(label, SafetyLabel::Safe);

        let (_, far_label) = propagate(src, 2.0, 0.4, 0.5);
        assert_eq!(far_label, SafetyLabel::Unknown);
    }

    #[test]
    fn test_negate_mirrors() {
        let iv = Interval { lo: -0.2, hi: 0.7 };
        let n = iv.negate();
        assert_eq!(n, Interval { lo: -0.7, hi: 0.2 });
    }

    #[test]
    fn test_unbounded_is_unknown() {
        assert_eq!(classify(Interval::unbounded(), 0.5), SafetyLabel::Unknown);
    }
}
