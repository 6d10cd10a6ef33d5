use crate::metric::MetricName;

/// Boxed error returned by actions, reset actions and samplers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The matcher argument did not have one of the accepted shapes.
    /// Raised before any trial runs.
    #[error("Invalid parameters: expect([fn, fn, opts]) got expect({0})")]
    InvalidParameters(String),

    #[error("unknown metric name: {0}")]
    UnknownMetric(String),

    #[error("snapshot is missing metric {0}")]
    IncompleteSnapshot(MetricName),

    #[error(transparent)]
    Trial(#[from] TrialError),
}

/// Which external call failed during a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Sample,
    Action,
    Reset,
}

/// An external call failed while the trial loop was running.
///
/// Displays as the raw source error so the harness shows the collaborator's
/// own message as the failure reason.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct TrialError {
    pub stage: Stage,
    /// Zero-based index of the trial that failed.
    pub trial: u32,
    pub source: BoxError,
}

impl TrialError {
    pub(crate) fn new(stage: Stage, trial: u32, source: BoxError) -> Self {
        Self {
            stage,
            trial,
            source,
        }
    }
}
