//! Comparison of averaged deltas against expected upper bounds.
//!
//! [`Comparison`] is the pure result of checking an [`Accumulator`] against
//! [`Bounds`]: which metrics were checked, their averages and raw trials, and
//! which of them are violations. It holds no I/O and can be serialized as is.
//! [`MatchResult`] is what the harness consumes: a pass flag and a message
//! that is only formatted when asked for.

use std::{collections::BTreeMap, fmt, sync::Arc};

use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::{aggregate::Accumulator, metric::MetricName};

/// Upper bounds for some of the metrics.
///
/// Metrics without a bound are not checked at all. Deserializes from a map
/// keyed by the browser names, e.g. `{"Nodes": 100, "LayoutDuration": 0.5}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bounds(BTreeMap<MetricName, f64>);

impl Bounds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: MetricName, bound: f64) -> Self {
        self.0.insert(name, bound);
        self
    }

    pub fn get(&self, name: MetricName) -> Option<f64> {
        self.0.get(&name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(MetricName, f64)> for Bounds {
    fn from_iter<I: IntoIterator<Item = (MetricName, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[(MetricName, f64); N]> for Bounds {
    fn from(pairs: [(MetricName, f64); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// The outcome for one bounded metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricCheck {
    pub name: MetricName,
    pub expected: f64,
    pub average: f64,
    /// Per-trial deltas, in trial order.
    pub trials: Vec<f64>,
    /// `average > expected`. A tie passes.
    pub violated: bool,
}

impl MetricCheck {
    /// Whether one trial on its own exceeds the bound.
    pub fn trial_exceeds(&self, value: f64) -> bool {
        self.expected < value
    }
}

/// Every bounded metric checked against its average, in canonical order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub trial_count: usize,
    pub checks: Vec<MetricCheck>,
}

impl Comparison {
    pub fn new(acc: &Accumulator, expected: &Bounds) -> Self {
        let averages = acc.averages();
        let checks = MetricName::ALL
            .into_iter()
            .filter_map(|name| {
                let bound = expected.get(name)?;
                let average = averages[name];
                Some(MetricCheck {
                    name,
                    expected: bound,
                    average,
                    trials: acc.raw_values(name).to_vec(),
                    violated: bound < average,
                })
            })
            .collect();
        Self {
            trial_count: acc.trial_count(),
            checks,
        }
    }

    pub fn pass(&self) -> bool {
        self.checks.iter().all(|check| !check.violated)
    }

    pub fn violations(&self) -> impl Iterator<Item = &MetricCheck> {
        self.checks.iter().filter(|check| check.violated)
    }

    /// Formats the diagnostic: a header line followed by one block per
    /// violation. The per-trial breakdown is only shown when more than one
    /// trial ran.
    pub fn render(&self, style: &MessageStyle) -> String {
        let mut msg = format!("{}\n\n", matcher_hint(&style.matcher_name));
        for check in self.violations() {
            msg.push_str(&format!(
                "   Expected {}:\n",
                quoted(&format!("{} < {}", check.name, check.expected)).green()
            ));
            let received = format!("{:.*}", style.average_precision, check.average);
            msg.push_str(&format!("   Received {}\n", quoted(&received).red()));
            if self.trial_count > 1 {
                let trials: Vec<String> = check
                    .trials
                    .iter()
                    .map(|&value| {
                        let text = format!("{:.*}", style.trial_precision, value);
                        if check.trial_exceeds(value) {
                            text.red().to_string()
                        } else {
                            text.green().to_string()
                        }
                    })
                    .collect();
                msg.push_str(&format!("   All Metrics: {}\n\n", trials.join(" ")));
            } else {
                msg.push('\n');
            }
        }
        msg
    }

    pub fn into_result(self, style: MessageStyle) -> MatchResult {
        let pass = self.pass();
        MatchResult::new(pass, move || self.render(&style))
    }
}

/// Presentation knobs for [`Comparison::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageStyle {
    pub matcher_name: String,
    pub average_precision: usize,
    pub trial_precision: usize,
}

impl Default for MessageStyle {
    fn default() -> Self {
        Self {
            matcher_name: "toMatchAverageMetrics".to_string(),
            average_precision: 5,
            trial_precision: 3,
        }
    }
}

fn matcher_hint(name: &str) -> String {
    format!(
        "{}{}{}{}{}",
        "expect(".dimmed(),
        "received".red(),
        format!(").{name}(").dimmed(),
        "expected".green(),
        ")".dimmed()
    )
}

fn quoted(text: &str) -> String {
    format!("\"{text}\"")
}

type MessageFn = dyn Fn() -> String + Send + Sync;

/// What the harness gets back: pass/fail and a lazily formatted message.
#[derive(Clone)]
pub struct MatchResult {
    pub pass: bool,
    message: Arc<MessageFn>,
}

impl MatchResult {
    pub fn new<F>(pass: bool, message: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            pass,
            message: Arc::new(message),
        }
    }

    /// A failed assertion whose message is the given text verbatim.
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(false, move || message.clone())
    }

    pub fn message(&self) -> String {
        (self.message)()
    }
}

impl fmt::Debug for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchResult")
            .field("pass", &self.pass)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::Snapshot;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn accumulator(name: MetricName, deltas: &[f64]) -> Accumulator {
        let mut acc = Accumulator::new();
        let start = Snapshot::default();
        for &value in deltas {
            let mut end = Snapshot::default();
            end.set(name, value);
            acc.record_trial(&start, &end);
        }
        acc
    }

    fn plain() {
        colored::control::set_override(false);
    }

    mod comparison {
        use super::*;

        #[test]
        fn within_bound_passes() {
            let acc = accumulator(MetricName::Nodes, &[50.0]);
            let cmp = Comparison::new(&acc, &Bounds::from([(MetricName::Nodes, 100.0)]));
            assert!(cmp.pass());
            assert_eq!(cmp.violations().count(), 0);
        }

        #[test]
        fn tie_passes() {
            let acc = accumulator(MetricName::Nodes, &[90.0, 110.0]);
            let cmp = Comparison::new(&acc, &Bounds::from([(MetricName::Nodes, 100.0)]));
            assert_eq!(cmp.checks[0].average, 100.0);
            assert!(cmp.pass());
        }

        #[test]
        fn above_bound_fails() {
            let acc = accumulator(MetricName::Nodes, &[150.0]);
            let cmp = Comparison::new(&acc, &Bounds::from([(MetricName::Nodes, 100.0)]));
            assert!(!cmp.pass());
            let violation = cmp.violations().next().unwrap();
            assert_eq!(violation.name, MetricName::Nodes);
            assert_eq!(violation.average, 150.0);
        }

        #[test]
        fn unbounded_metrics_are_skipped() {
            let acc = accumulator(MetricName::Nodes, &[1_000_000.0]);
            let cmp = Comparison::new(&acc, &Bounds::from([(MetricName::Frames, 0.0)]));
            assert!(cmp.pass());
            assert_eq!(cmp.checks.len(), 1);
            assert_eq!(cmp.checks[0].name, MetricName::Frames);
        }

        #[test]
        fn empty_bounds_pass() {
            let acc = accumulator(MetricName::Nodes, &[5.0]);
            let cmp = Comparison::new(&acc, &Bounds::new());
            assert!(cmp.pass());
            assert!(cmp.checks.is_empty());
        }

        #[test]
        fn checks_follow_canonical_order() {
            let acc = Accumulator::new();
            let bounds: Bounds = [
                (MetricName::JsHeapUsedSize, 1.0),
                (MetricName::Timestamp, 1.0),
                (MetricName::Nodes, 1.0),
            ]
            .into_iter()
            .collect();
            let names: Vec<_> = Comparison::new(&acc, &bounds)
                .checks
                .iter()
                .map(|c| c.name)
                .collect();
            assert_eq!(
                names,
                [
                    MetricName::Timestamp,
                    MetricName::Nodes,
                    MetricName::JsHeapUsedSize
                ]
            );
        }

        #[test]
        fn no_trials_never_violate() {
            let acc = Accumulator::new();
            let cmp = Comparison::new(&acc, &Bounds::from([(MetricName::Nodes, 0.0)]));
            assert!(cmp.checks[0].average.is_nan());
            assert!(cmp.pass());
        }

        #[test]
        fn serializes_to_json() {
            let acc = accumulator(MetricName::Nodes, &[150.0]);
            let cmp = Comparison::new(&acc, &Bounds::from([(MetricName::Nodes, 100.0)]));
            let value = serde_json::to_value(&cmp).unwrap();
            assert_eq!(value["trial_count"], 1);
            assert_eq!(value["checks"][0]["name"], "Nodes");
            assert_eq!(value["checks"][0]["violated"], true);
        }
    }

    mod render {
        use super::*;

        #[test]
        fn header_then_blank_line() {
            plain();
            let acc = accumulator(MetricName::Nodes, &[1.0]);
            let msg = Comparison::new(&acc, &Bounds::new()).render(&MessageStyle::default());
            assert_eq!(msg, "expect(received).toMatchAverageMetrics(expected)\n\n");
        }

        #[test]
        fn single_trial_block() {
            plain();
            let acc = accumulator(MetricName::Nodes, &[150.0]);
            let msg = Comparison::new(&acc, &Bounds::from([(MetricName::Nodes, 100.0)]))
                .render(&MessageStyle::default());
            assert_eq!(
                msg,
                "expect(received).toMatchAverageMetrics(expected)\n\n   \
                 Expected \"Nodes < 100\":\n   \
                 Received \"150.00000\"\n\n"
            );
            assert!(!msg.contains("All Metrics"));
        }

        #[test]
        fn multi_trial_block_lists_every_trial() {
            plain();
            let acc = accumulator(MetricName::LayoutDuration, &[10.0, 20.0, 30.0]);
            let msg = Comparison::new(&acc, &Bounds::from([(MetricName::LayoutDuration, 15.0)]))
                .render(&MessageStyle::default());
            assert!(msg.contains("   Expected \"LayoutDuration < 15\":\n"));
            assert!(msg.contains("   Received \"20.00000\"\n"));
            assert!(msg.contains("   All Metrics: 10.000 20.000 30.000\n\n"));
        }

        #[test]
        fn only_violations_are_listed() {
            plain();
            let mut acc = Accumulator::new();
            acc.record_trial(
                &Snapshot::default(),
                &Snapshot {
                    nodes: 150.0,
                    frames: 1.0,
                    layout_count: 9.0,
                    ..Default::default()
                },
            );
            let bounds = Bounds::from([
                (MetricName::Nodes, 100.0),
                (MetricName::Frames, 2.0),
                (MetricName::LayoutCount, 3.0),
            ]);
            let msg = Comparison::new(&acc, &bounds).render(&MessageStyle::default());
            assert!(msg.contains("Nodes < 100"));
            assert!(msg.contains("LayoutCount < 3"));
            assert!(!msg.contains("Frames"));
            assert!(msg.find("Nodes").unwrap() < msg.find("LayoutCount").unwrap());
        }

        #[test]
        fn precision_is_configurable() {
            plain();
            let acc = accumulator(MetricName::ScriptDuration, &[0.24, 0.56]);
            let style = MessageStyle {
                matcher_name: "toStayFast".to_string(),
                average_precision: 2,
                trial_precision: 1,
            };
            let msg = Comparison::new(&acc, &Bounds::from([(MetricName::ScriptDuration, 0.1)]))
                .render(&style);
            assert!(msg.starts_with("expect(received).toStayFast(expected)"));
            assert!(msg.contains("Received \"0.40\""));
            assert!(msg.contains("All Metrics: 0.2 0.6"));
        }
    }

    #[test]
    fn message_is_formatted_on_demand() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let result = MatchResult::new(false, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            "boom".to_string()
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(result.message(), "boom");
        assert_eq!(result.message(), "boom");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn bounds_deserialize_from_browser_names() {
        let bounds: Bounds =
            serde_json::from_str(r#"{"Nodes": 100, "JSHeapUsedSize": 2048.5}"#).unwrap();
        assert_eq!(bounds.len(), 2);
        assert_eq!(bounds.get(MetricName::Nodes), Some(100.0));
        assert_eq!(bounds.get(MetricName::JsHeapUsedSize), Some(2048.5));
        assert_eq!(bounds.get(MetricName::Frames), None);
    }
}
