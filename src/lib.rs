//! metrics-matcher — assert how much an action costs the page it runs on.
//!
//! The matcher samples the browser's performance counters before and after a
//! user-supplied action, repeats that a configurable number of times, averages
//! the per-trial deltas and checks the averages against upper bounds. When a
//! bound is exceeded the message lists every offending counter, and with more
//! than one trial every individual trial, so noisy runs can be told apart from
//! real regressions.
//!
//! # Architecture
//!
//! - [`MetricName`] / [`Snapshot`]: the closed set of counters and one atomic
//!   reading of all of them.
//! - [`Sampler`]: the browser side. Anything that can produce a [`Snapshot`]
//!   on demand.
//! - [`MatcherArg`] / [`MatcherParams`]: what to run. The caller's argument is
//!   normalized once into an action, an optional reset action and options.
//! - [`Accumulator`]: per-metric deltas across trials and their averages.
//! - [`Comparison`] / [`MatchResult`]: the pass/fail decision and the lazily
//!   formatted diagnostic handed back to the test harness.
//! - [`Matcher`]: the trial loop gluing it all together.
//!
//! # Example
//!
//! ```rust,ignore
//! use metrics_matcher::{Bounds, MatcherArg, MetricName, to_match_average_metrics};
//!
//! let open_menu = {
//!     let page = page.clone();
//!     move || {
//!         let page = page.clone();
//!         async move { page.click("#menu").await.map_err(Into::into) }
//!     }
//! };
//! let close_menu = /* ... */;
//!
//! let result = to_match_average_metrics(
//!     &sampler,
//!     MatcherArg::tuple([Action::new(open_menu), Action::new(close_menu)]),
//!     &Bounds::from([(MetricName::Nodes, 200.0), (MetricName::LayoutCount, 2.0)]),
//! )
//! .await?;
//! assert!(result.pass, "{}", result.message());
//! ```
//!
//! See `demos/in_memory_page.rs` for a runnable version against a fake page.

/// Per-trial delta collection
pub mod aggregate;
/// Errors
pub mod error;
/// The trial loop
pub mod matcher;
/// Metric names and snapshots
pub mod metric;
/// Matcher argument normalization
pub mod params;
/// Comparison against bounds and the diagnostic message
pub mod report;
/// The browser-side snapshot source
pub mod sampler;

pub use aggregate::Accumulator;
pub use error::{BoxError, Error, Result, Stage, TrialError};
pub use matcher::{Matcher, to_match_average_metrics};
pub use metric::{MetricMap, MetricName, Snapshot};
pub use params::{Action, ArgValue, MatcherArg, MatcherOptions, MatcherParams};
pub use report::{Bounds, Comparison, MatchResult, MessageStyle, MetricCheck};
pub use sampler::Sampler;
