//! The trial loop that ties normalization, sampling, accumulation and
//! comparison together.
//!
//! # Flow
//! 1. The matcher argument is normalized into [`MatcherParams`]. A malformed
//!    argument is returned as [`crate::Error::InvalidParameters`] before anything
//!    else happens.
//! 2. For each of `options.repeats` trials, strictly in sequence:
//!    - take a start snapshot,
//!    - run the action,
//!    - take an end snapshot and record the deltas,
//!    - run the reset action, if there is one.
//! 3. The accumulated averages are compared against the expected bounds and
//!    turned into a [`MatchResult`].
//!
//! Trials never overlap: the start snapshot of one trial has to observe what
//! the previous trial's reset left behind.
//!
//! # Failures
//! The first failing sample, action or reset ends the assertion. Remaining
//! trials are not run, the partial accumulator is dropped without a
//! comparison, and the result is a failure whose message is the raw error.

use typed_builder::TypedBuilder;

use crate::{
    aggregate::Accumulator,
    error::{Result, Stage, TrialError},
    params::{MatcherArg, MatcherParams},
    report::{Bounds, Comparison, MatchResult, MessageStyle},
    sampler::Sampler,
};

/// Runs an action repeatedly between snapshots and checks the average deltas.
///
/// ```rust,ignore
/// let result = Matcher::builder()
///     .average_precision(3)
///     .build()
///     .assert(&sampler, MatcherArg::action(open_menu), &Bounds::from([(MetricName::Nodes, 100.0)]))
///     .await?;
/// assert!(result.pass, "{}", result.message());
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct Matcher {
    /// Name shown in the message header.
    #[builder(default = String::from("toMatchAverageMetrics"), setter(into))]
    pub name: String,
    /// Fraction digits of the averaged value.
    #[builder(default = 5)]
    pub average_precision: usize,
    /// Fraction digits of each per-trial value.
    #[builder(default = 3)]
    pub trial_precision: usize,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Matcher {
    /// Normalizes `arg`, runs the trials against `sampler` and compares the
    /// averages with `expected`.
    ///
    /// Only a malformed `arg` is an `Err`. A failing external call and a
    /// violated bound are both reported as a failed [`MatchResult`].
    pub async fn assert<S>(
        &self,
        sampler: &S,
        arg: MatcherArg,
        expected: &Bounds,
    ) -> Result<MatchResult>
    where
        S: Sampler,
    {
        let params = MatcherParams::try_from(arg)?;
        tracing::info!(
            "Running {} with {} trial(s){}",
            self.name,
            params.options.repeats,
            if params.reset.is_some() { " and a reset" } else { "" }
        );

        let acc = match run_trials(sampler, params).await {
            Ok(acc) => acc,
            Err(err) => {
                tracing::warn!(
                    "{} aborted in trial {} ({:?}): {}",
                    self.name,
                    err.trial,
                    err.stage,
                    err
                );
                return Ok(MatchResult::failure(err.to_string()));
            }
        };

        let comparison = Comparison::new(&acc, expected);
        let violations = comparison.violations().count();
        tracing::info!(
            "Done running {}: {} of {} bound(s) violated",
            self.name,
            violations,
            comparison.checks.len()
        );
        Ok(comparison.into_result(self.style()))
    }

    fn style(&self) -> MessageStyle {
        MessageStyle {
            matcher_name: self.name.clone(),
            average_precision: self.average_precision,
            trial_precision: self.trial_precision,
        }
    }
}

/// Runs every trial, stopping at the first failed external call.
pub async fn run_trials<S>(
    sampler: &S,
    mut params: MatcherParams,
) -> Result<Accumulator, TrialError>
where
    S: Sampler,
{
    let mut acc = Accumulator::new();
    for trial in 0..params.options.repeats {
        let start = sampler
            .sample()
            .await
            .map_err(|e| TrialError::new(Stage::Sample, trial, e))?;
        params
            .action
            .run()
            .await
            .map_err(|e| TrialError::new(Stage::Action, trial, e))?;
        let end = sampler
            .sample()
            .await
            .map_err(|e| TrialError::new(Stage::Sample, trial, e))?;
        acc.record_trial(&start, &end);

        if let Some(reset) = params.reset.as_mut() {
            reset
                .run()
                .await
                .map_err(|e| TrialError::new(Stage::Reset, trial, e))?;
        }
        tracing::debug!("Trial {} recorded", trial);
    }
    Ok(acc)
}

/// Asserts with the default [`Matcher`].
pub async fn to_match_average_metrics<S>(
    sampler: &S,
    arg: MatcherArg,
    expected: &Bounds,
) -> Result<MatchResult>
where
    S: Sampler,
{
    Matcher::default().assert(sampler, arg, expected).await
}
