//! Suite results and the human-readable summary.

/// What one subtest concluded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Passed {
        checks: usize,
    },
    Failed {
        checks: usize,
        failures: Vec<String>,
    },
    /// Catalog slot reserved for coverage that is not written yet; the
    /// subtest body documents the intent.
    NotImplemented,
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubtestResult {
    pub name: &'static str,
    pub outcome: Outcome,
}

/// Results of one suite run, in execution order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SuiteReport {
    pub results: Vec<SubtestResult>,
}

impl SuiteReport {
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| matches!(r.outcome, Outcome::Passed { .. })).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_failure()).count()
    }

    pub fn not_implemented_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome == Outcome::NotImplemented).count()
    }

    /// True when nothing failed. Unimplemented subtests do not count
    /// against a run.
    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }

    pub fn print_summary(&self) {
        eprintln!(
            "=== depth-freeze validation: {} passed, {} failed, {} not implemented ===",
            self.passed_count(),
            self.failed_count(),
            self.not_implemented_count(),
        );
        for result in &self.results {
            match &result.outcome {
                Outcome::Passed { checks } => {
                    eprintln!("  pass {} ({} checks)", result.name, checks);
                }
                Outcome::NotImplemented => {
                    eprintln!("  skip {}", result.name);
                }
                Outcome::Failed { checks, failures } => {
                    eprintln!(
                        "  FAIL {} ({}/{} checks failed)",
                        result.name,
                        failures.len(),
                        checks,
                    );
                    for failure in failures {
                        eprintln!("       - {failure}");
                    }
                }
            }
        }
    }
}
