//! Hysteresis classifier over a round of probe results.
//!
//! # Responsibilities
//! - Keep consecutive-outcome counters per target
//! - Maintain the working healthy/unhealthy sets
//! - Purge all state of targets that stop being monitored
//!
//! # Design Decisions
//! - Pure computation, no I/O; owned exclusively by the driver
//! - Targets are independent, so result order within a round is irrelevant
//! - A target is in at most one set; in neither while unclassified

use std::collections::{BTreeSet, HashMap};

use crate::health::state::{Classification, ConsecutiveCounters, Thresholds};
use crate::health::target::{ProbeResult, Target};

/// A change of observable classification caused by a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub target: Target,
    pub from: Classification,
    pub to: Classification,
}

/// Per-target hysteresis state and the working classification sets.
#[derive(Debug)]
pub struct HealthClassifier {
    thresholds: Thresholds,
    counters: HashMap<Target, ConsecutiveCounters>,
    healthy: BTreeSet<Target>,
    unhealthy: BTreeSet<Target>,
}

impl HealthClassifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            counters: HashMap::new(),
            healthy: BTreeSet::new(),
            unhealthy: BTreeSet::new(),
        }
    }

    /// Apply one complete round of results.
    ///
    /// Returns the classification changes in the order the results were given.
    pub fn apply(&mut self, results: &[ProbeResult]) -> Vec<Transition> {
        let mut transitions = Vec::new();

        for result in results {
            let from = self.classification(&result.target);
            let verdict = self
                .counters
                .entry(result.target.clone())
                .or_default()
                .record(result.is_success(), self.thresholds);

            match verdict {
                Some(Classification::Healthy) => {
                    self.unhealthy.remove(&result.target);
                    self.healthy.insert(result.target.clone());
                }
                Some(Classification::Unhealthy) => {
                    self.healthy.remove(&result.target);
                    self.unhealthy.insert(result.target.clone());
                }
                Some(Classification::Unclassified) | None => {}
            }

            let to = self.classification(&result.target);
            if from != to {
                transitions.push(Transition {
                    target: result.target.clone(),
                    from,
                    to,
                });
            }
        }

        transitions
    }

    /// Drop counters and set membership of a target.
    ///
    /// Returns the classification it held before removal.
    pub fn forget(&mut self, target: &Target) -> Classification {
        let previous = self.classification(target);
        self.counters.remove(target);
        self.healthy.remove(target);
        self.unhealthy.remove(target);
        previous
    }

    pub fn classification(&self, target: &Target) -> Classification {
        if self.healthy.contains(target) {
            Classification::Healthy
        } else if self.unhealthy.contains(target) {
            Classification::Unhealthy
        } else {
            Classification::Unclassified
        }
    }

    pub fn counters(&self, target: &Target) -> Option<ConsecutiveCounters> {
        self.counters.get(target).copied()
    }

    pub fn healthy(&self) -> &BTreeSet<Target> {
        &self.healthy
    }

    pub fn unhealthy(&self) -> &BTreeSet<Target> {
        &self.unhealthy
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::probe::ProbeError;

    fn classifier(healthy: u32, unhealthy: u32) -> HealthClassifier {
        HealthClassifier::new(Thresholds::new(healthy, unhealthy).unwrap())
    }

    fn fail(target: &str) -> ProbeResult {
        ProbeResult::failure(target, ProbeError::Connect("connection refused".into()))
    }

    fn names(set: &BTreeSet<Target>) -> Vec<&str> {
        set.iter().map(Target::as_str).collect()
    }

    #[test]
    fn test_failure_marks_unhealthy_with_threshold_one() {
        let mut c = classifier(1, 1);

        let transitions = c.apply(&[fail("master-0")]);
        assert_eq!(names(c.unhealthy()), vec!["master-0"]);
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].from, Classification::Unclassified);
        assert_eq!(transitions[0].to, Classification::Unhealthy);

        // Repeated failure changes nothing
        assert!(c.apply(&[fail("master-0")]).is_empty());
        assert_eq!(names(c.unhealthy()), vec!["master-0"]);
    }

    #[test]
    fn test_one_member_fails() {
        let mut c = classifier(1, 1);
        c.apply(&[
            ProbeResult::success("m0"),
            ProbeResult::success("m1"),
            ProbeResult::success("m2"),
        ]);
        assert_eq!(names(c.healthy()), vec!["m0", "m1", "m2"]);

        c.apply(&[ProbeResult::success("m0"), fail("m1"), ProbeResult::success("m2")]);
        assert_eq!(names(c.healthy()), vec!["m0", "m2"]);
        assert_eq!(names(c.unhealthy()), vec!["m1"]);
    }

    #[test]
    fn test_unclassified_until_threshold() {
        let mut c = classifier(3, 2);

        c.apply(&[fail("a"), ProbeResult::success("b")]);
        assert!(c.healthy().is_empty());
        assert!(c.unhealthy().is_empty());
        assert_eq!(c.classification(&Target::from("a")), Classification::Unclassified);

        c.apply(&[fail("a"), ProbeResult::success("b")]);
        assert_eq!(names(c.unhealthy()), vec!["a"]);
        assert!(c.healthy().is_empty());

        c.apply(&[ProbeResult::success("b")]);
        assert_eq!(names(c.healthy()), vec!["b"]);
    }

    #[test]
    fn test_healthy_target_tolerates_failures_below_threshold() {
        let mut c = classifier(1, 3);
        c.apply(&[ProbeResult::success("a")]);

        c.apply(&[fail("a")]);
        c.apply(&[fail("a")]);
        assert_eq!(c.classification(&Target::from("a")), Classification::Healthy);

        let transitions = c.apply(&[fail("a")]);
        assert_eq!(c.classification(&Target::from("a")), Classification::Unhealthy);
        assert_eq!(transitions[0].from, Classification::Healthy);
        assert!(c.healthy().is_empty());
    }

    #[test]
    fn test_order_within_round_is_irrelevant() {
        let mut forward = classifier(2, 2);
        let mut reverse = classifier(2, 2);

        for _ in 0..2 {
            forward.apply(&[ProbeResult::success("a"), fail("b"), ProbeResult::success("c")]);
            reverse.apply(&[ProbeResult::success("c"), fail("b"), ProbeResult::success("a")]);
        }

        assert_eq!(forward.healthy(), reverse.healthy());
        assert_eq!(forward.unhealthy(), reverse.unhealthy());
    }

    #[test]
    fn test_forget_purges_everything() {
        let mut c = classifier(1, 1);
        c.apply(&[fail("d"), ProbeResult::success("a")]);

        assert_eq!(c.forget(&Target::from("d")), Classification::Unhealthy);
        assert!(c.unhealthy().is_empty());
        assert!(c.counters(&Target::from("d")).is_none());
        assert_eq!(names(c.healthy()), vec!["a"]);

        assert_eq!(c.forget(&Target::from("missing")), Classification::Unclassified);
    }

    #[test]
    fn test_sets_stay_disjoint() {
        let mut c = classifier(1, 1);
        let rounds = [[true, false], [false, true], [false, false], [true, true]];
        for round in rounds {
            let results: Vec<_> = ["x", "y"]
                .iter()
                .zip(round)
                .map(|(t, ok)| if ok { ProbeResult::success(*t) } else { fail(t) })
                .collect();
            c.apply(&results);
            assert!(c.healthy().is_disjoint(c.unhealthy()));
        }
    }
}
