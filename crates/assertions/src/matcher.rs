//! Match an observed page against a captured state

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{AssertionResult, Comparison, FrameId, QueryKey, SessionAssertions};

impl Comparison {
    /// Whether `observed` satisfies an `expected` result under this operator.
    ///
    /// Bounds only hold between numbers.
    pub fn holds(&self, expected: &AssertionResult, observed: &AssertionResult) -> bool {
        match self {
            Comparison::Equal => expected == observed,
            Comparison::AtLeast => match (expected.as_number(), observed.as_number()) {
                (Some(bound), Some(value)) => value >= bound,
                _ => false,
            },
            Comparison::AtMost => match (expected.as_number(), observed.as_number()) {
                (Some(bound), Some(value)) => value <= bound,
                _ => false,
            },
        }
    }
}

/// An expected assertion that the observed state contradicts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionMismatch {
    pub frame_id: FrameId,
    pub key: QueryKey,
    pub comparison: Comparison,
    pub expected: AssertionResult,
    pub observed: AssertionResult,
}

/// Outcome of matching an observed state against an expected one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub passed: usize,
    pub failed: Vec<AssertionMismatch>,
    /// Expected assertions the observed state has no entry for
    pub missing: Vec<(FrameId, QueryKey)>,
}

impl MatchReport {
    pub fn total(&self) -> usize {
        self.passed + self.failed.len() + self.missing.len()
    }

    /// With no minimum every expected assertion must pass; with one, at
    /// least that many must pass and none may fail.
    pub fn is_match(&self, min_valid: Option<usize>) -> bool {
        match min_valid {
            None => self.failed.is_empty() && self.missing.is_empty(),
            Some(min) => self.failed.is_empty() && self.passed >= min,
        }
    }
}

/// Check every assertion of `expected` against the same frame and key in
/// `observed`. Extra observed assertions are ignored.
pub fn match_state(expected: &SessionAssertions, observed: &SessionAssertions) -> MatchReport {
    let mut report = MatchReport::default();

    for (frame_id, expected_frame) in expected {
        let observed_frame = observed.get(frame_id);

        for (key, expected_assert) in expected_frame {
            let Some(observed_assert) = observed_frame.and_then(|frame| frame.get(key)) else {
                report.missing.push((frame_id.clone(), key.clone()));
                continue;
            };

            if expected_assert
                .comparison
                .holds(&expected_assert.result, &observed_assert.result)
            {
                report.passed += 1;
            } else {
                report.failed.push(AssertionMismatch {
                    frame_id: frame_id.clone(),
                    key: key.clone(),
                    comparison: expected_assert.comparison,
                    expected: expected_assert.result.clone(),
                    observed: observed_assert.result.clone(),
                });
            }
        }
    }

    debug!(
        passed = report.passed,
        failed = report.failed.len(),
        missing = report.missing.len(),
        "Matched observed state"
    );
    report
}
