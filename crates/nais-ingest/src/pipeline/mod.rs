//! Resumable pipeline passes
//!
//! Both passes walk a fixed stage sequence per work unit. Every stage checks
//! for its completion artifact before doing anything, so re-invoking a run
//! resumes from the first stage whose artifact is missing. A stage failure
//! aborts the remaining stages of the work unit; there are no retries.

pub mod mmsi;
pub mod month;
pub mod prompt;

/// What a stage did when the sequencer reached it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage performed its side effect
    Completed,
    /// The completion artifact already existed; nothing was done
    Skipped,
    /// The user declined a required confirmation; the pass stops here
    Cancelled,
}

/// One stage's result within a work unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    /// Stage name, fixed per pass
    pub stage: &'static str,
    pub outcome: StageOutcome,
}

impl StageReport {
    pub fn new(stage: &'static str, outcome: StageOutcome) -> Self {
        Self { stage, outcome }
    }
}

impl std::fmt::Display for StageReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.outcome {
            StageOutcome::Completed => write!(f, "{}: completed", self.stage),
            StageOutcome::Skipped => write!(f, "{}: skipped", self.stage),
            StageOutcome::Cancelled => write!(f, "{}: cancelled by user", self.stage),
        }
    }
}
