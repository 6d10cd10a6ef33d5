use crate::metric::{MetricMap, MetricName, Snapshot};

/// Collects the per-trial deltas of every tracked metric for one assertion.
///
/// Every trial appends exactly one delta to each metric, so all thirteen
/// sequences always have the same length as [`Accumulator::trial_count`].
/// Values are kept in trial order so the report can show each trial next to
/// the average.
///
/// An accumulator lives for a single assertion and is not shared.
///
/// # Example
/// ```rust
/// use metrics_matcher::{Accumulator, MetricName, Snapshot};
///
/// let mut acc = Accumulator::new();
/// let start = Snapshot::default();
/// acc.record_trial(&start, &Snapshot { nodes: 10.0, ..start });
/// acc.record_trial(&start, &Snapshot { nodes: 30.0, ..start });
///
/// assert_eq!(acc.trial_count(), 2);
/// assert_eq!(acc.average_of(MetricName::Nodes), 20.0);
/// assert_eq!(acc.raw_values(MetricName::Nodes), [10.0, 30.0]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulator {
    deltas: MetricMap<Vec<f64>>,
    trials: usize,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `end - start` for every metric and counts one trial.
    pub fn record_trial(&mut self, start: &Snapshot, end: &Snapshot) {
        let delta = start.delta(end);
        for (name, value) in delta.iter() {
            self.deltas[name].push(*value);
        }
        self.trials += 1;
    }

    pub fn trial_count(&self) -> usize {
        self.trials
    }

    /// Arithmetic mean of the recorded deltas for `name`.
    ///
    /// `NaN` when no trial has been recorded.
    pub fn average_of(&self, name: MetricName) -> f64 {
        mean(&self.deltas[name])
    }

    pub fn averages(&self) -> MetricMap<f64> {
        self.deltas.map(|_, values| mean(values))
    }

    /// The per-trial deltas for `name`, in trial order.
    pub fn raw_values(&self, name: MetricName) -> &[f64] {
        &self.deltas[name]
    }

    pub fn raw_all(&self) -> &MetricMap<Vec<f64>> {
        &self.deltas
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(f: impl Fn(MetricName) -> f64) -> Snapshot {
        let mut snapshot = Snapshot::default();
        for name in MetricName::ALL {
            snapshot.set(name, f(name));
        }
        snapshot
    }

    #[test]
    fn starts_empty() {
        let acc = Accumulator::new();
        assert_eq!(acc.trial_count(), 0);
        for name in MetricName::ALL {
            assert!(acc.raw_values(name).is_empty());
            assert!(acc.average_of(name).is_nan());
        }
    }

    #[test]
    fn every_metric_gets_one_delta_per_trial() {
        let mut acc = Accumulator::new();
        let start = snapshot(|_| 1.0);
        for trial in 1..=4 {
            let end = snapshot(|name| 1.0 + trial as f64 * (name as usize as f64));
            acc.record_trial(&start, &end);
            assert_eq!(acc.trial_count(), trial);
            for (_, values) in acc.raw_all().iter() {
                assert_eq!(values.len(), trial);
            }
        }
    }

    #[test]
    fn averages_are_arithmetic_means() {
        let mut acc = Accumulator::new();
        let start = Snapshot::default();
        for value in [10.0, 20.0, 30.0] {
            let end = Snapshot {
                layout_duration: value,
                nodes: value * 2.0,
                ..Default::default()
            };
            acc.record_trial(&start, &end);
        }

        assert_eq!(acc.average_of(MetricName::LayoutDuration), 20.0);
        assert_eq!(acc.average_of(MetricName::Nodes), 40.0);
        assert_eq!(acc.average_of(MetricName::Frames), 0.0);

        let averages = acc.averages();
        for name in MetricName::ALL {
            assert_eq!(averages[name], acc.average_of(name));
        }
    }

    #[test]
    fn duplicate_deltas_are_kept() {
        let mut acc = Accumulator::new();
        let start = Snapshot::default();
        let end = Snapshot {
            nodes: 5.0,
            ..Default::default()
        };
        acc.record_trial(&start, &end);
        acc.record_trial(&start, &end);
        assert_eq!(acc.raw_values(MetricName::Nodes), [5.0, 5.0]);
        assert_eq!(acc.trial_count(), 2);
    }

    #[test]
    fn reads_do_not_mutate() {
        let mut acc = Accumulator::new();
        acc.record_trial(
            &Snapshot::default(),
            &Snapshot {
                script_duration: 0.5,
                ..Default::default()
            },
        );
        let before = acc.clone();
        let first = acc.averages();
        let second = acc.averages();
        assert_eq!(first, second);
        assert_eq!(
            acc.raw_values(MetricName::ScriptDuration),
            acc.raw_values(MetricName::ScriptDuration)
        );
        assert_eq!(acc, before);
    }

    #[test]
    fn deltas_follow_trial_order() {
        let mut acc = Accumulator::new();
        let start = Snapshot::default();
        for value in [3.0, 1.0, 2.0] {
            acc.record_trial(
                &start,
                &Snapshot {
                    task_duration: value,
                    ..Default::default()
                },
            );
        }
        assert_eq!(acc.raw_values(MetricName::TaskDuration), [3.0, 1.0, 2.0]);
    }
}
