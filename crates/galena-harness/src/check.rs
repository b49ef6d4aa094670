//! Pass/fail accounting within one subtest.

use tracing::error;

use crate::report::Outcome;

struct Check {
    label: String,
    passed: bool,
}

/// Collects the expectations of one subtest. Nothing short-circuits:
/// a failed check is recorded and the subtest keeps sampling, so a
/// single run reports everything that is off.
#[derive(Default)]
pub struct Checks {
    entries: Vec<Check>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one expectation under a label describing what was
    /// observed.
    pub fn expect(&mut self, label: &str, passed: bool) {
        if !passed {
            error!(check = label, "expectation failed");
        }
        self.entries.push(Check { label: label.to_owned(), passed });
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn all_passed(&self) -> bool {
        self.entries.iter().all(|c| c.passed)
    }

    pub fn into_outcome(self) -> Outcome {
        let checks = self.entries.len();
        let failures: Vec<String> =
            self.entries.into_iter().filter(|c| !c.passed).map(|c| c.label).collect();
        if failures.is_empty() {
            Outcome::Passed { checks }
        } else {
            Outcome::Failed { checks, failures }
        }
    }
}
