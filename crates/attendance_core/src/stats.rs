//! crates/attendance_core/src/stats.rs
//!
//! Numeric helpers shared by the ledgers and the insight aggregator.
//!
//! Every ratio goes through [`ratio`], which reports 0 for a zero denominator,
//! so no view ever carries NaN or infinity.

use serde::Serialize;

use crate::domain::SubjectMarks;

/// CIE1 and CIE2 are each scored out of this.
pub const CIE_MAX: f64 = 50.0;
/// Weight of the averaged CIE score inside the overall internal score.
pub const CIE_OVERALL_WEIGHT: f64 = 20.0;
/// The assignment component is scored out of this.
pub const ASSIGNMENT_MAX: f64 = 10.0;
/// Overall internal score maximum: `CIE_OVERALL_WEIGHT + ASSIGNMENT_MAX`.
pub const OVERALL_MAX: f64 = CIE_OVERALL_WEIGHT + ASSIGNMENT_MAX;
/// A score below this fraction of its maximum is "below threshold".
pub const PASS_FRACTION: f64 = 0.4;

pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / whole × 100`, rounded to two decimals; 0 when `whole` is 0.
pub fn percentage(part: f64, whole: f64) -> f64 {
    round2(ratio(part, whole) * 100.0)
}

/// Overall internal score out of [`OVERALL_MAX`]: the CIE average scaled to
/// [`CIE_OVERALL_WEIGHT`] plus the assignment score.
pub fn overall_score(marks: &SubjectMarks) -> f64 {
    let cie_average = (marks.cie1 + marks.cie2) / 2.0;
    cie_average * (CIE_OVERALL_WEIGHT / CIE_MAX) + marks.assignment
}

fn below(score: f64, max: f64) -> bool {
    score < max * PASS_FRACTION
}

/// Students scoring under the pass fraction, per component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BelowThreshold {
    pub cie1: usize,
    pub cie2: usize,
    pub overall: usize,
}

impl BelowThreshold {
    pub fn count(marks: &[SubjectMarks]) -> Self {
        marks.iter().fold(Self::default(), |mut acc, m| {
            acc.cie1 += usize::from(below(m.cie1, CIE_MAX));
            acc.cie2 += usize::from(below(m.cie2, CIE_MAX));
            acc.overall += usize::from(below(overall_score(m), OVERALL_MAX));
            acc
        })
    }

    /// Each count as a percentage of the class size.
    pub fn share_of(&self, class_size: usize) -> BelowThresholdShare {
        let size = class_size as f64;
        BelowThresholdShare {
            cie1: percentage(self.cie1 as f64, size),
            cie2: percentage(self.cie2 as f64, size),
            overall: percentage(self.overall as f64, size),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BelowThresholdShare {
    pub cie1: f64,
    pub cie2: f64,
    pub overall: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marks(cie1: f64, cie2: f64, assignment: f64) -> SubjectMarks {
        SubjectMarks {
            subject: "Math".to_string(),
            cie1,
            cie2,
            assignment,
        }
    }

    #[test]
    fn zero_denominator_reports_zero() {
        assert_eq!(ratio(5.0, 0.0), 0.0);
        assert_eq!(percentage(0.0, 0.0), 0.0);
        assert!(!percentage(3.0, 0.0).is_nan());
    }

    #[test]
    fn percentage_rounds_to_two_decimals() {
        assert_eq!(percentage(2.0, 3.0), 66.67);
        assert_eq!(percentage(1.0, 8.0), 12.5);
    }

    #[test]
    fn overall_score_scales_cie_average() {
        // (40 + 30) / 2 = 35 of 50 -> 14 of 20, plus 8.
        assert_eq!(overall_score(&marks(40.0, 30.0, 8.0)), 22.0);
    }

    #[test]
    fn below_threshold_counts_each_component() {
        let all = [
            marks(19.0, 25.0, 9.0), // cie1 below
            marks(20.0, 10.0, 2.0), // cie2 below, overall = 6 + 2 = 8 below
            marks(45.0, 45.0, 10.0),
        ];
        let counts = BelowThreshold::count(&all);
        assert_eq!(
            counts,
            BelowThreshold {
                cie1: 1,
                cie2: 1,
                overall: 1
            }
        );
        assert_eq!(counts.share_of(3).cie1, 33.33);
        assert_eq!(counts.share_of(0).overall, 0.0);
    }
}
