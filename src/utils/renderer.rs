use std::collections::BTreeMap;

use burn::train::renderer::{MetricState, MetricsRenderer, TrainingProgress};

/// The latest reported state of a single metric
#[derive(Debug, Clone, PartialEq)]
struct Reading {
    formatted: String,
    value: Option<f64>,
}

/// A renderer for TUI-disabled modes, reporting progress through the `log` facade.
///
/// Numeric training metrics are logged every `interval` iterations, and a summary of every
/// metric is logged when an epoch's training or validation pass completes.
pub struct Log {
    interval: usize,
    train: BTreeMap<String, Reading>,
    valid: BTreeMap<String, Reading>,
}

impl Log {
    /// Create a renderer that logs training metrics every `interval` iterations
    pub fn new(interval: usize) -> Self {
        Self {
            interval: interval.max(1),
            train: BTreeMap::new(),
            valid: BTreeMap::new(),
        }
    }

    fn record(metrics: &mut BTreeMap<String, Reading>, state: MetricState) {
        let (entry, value) = match state {
            MetricState::Generic(entry) => (entry, None),
            MetricState::Numeric(entry, value) => (entry, Some(value)),
        };

        metrics.insert(
            entry.name,
            Reading {
                formatted: entry.formatted,
                value,
            },
        );
    }

    fn should_log(&self, iteration: usize) -> bool {
        iteration > 0 && iteration % self.interval == 0
    }

    fn values(metrics: &BTreeMap<String, Reading>) -> String {
        metrics
            .iter()
            .filter_map(|(name, reading)| reading.value.map(|value| format!("{name}: {value:.4}")))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn summary(metrics: &BTreeMap<String, Reading>) -> String {
        metrics
            .iter()
            .map(|(name, reading)| format!("{name}: {}", reading.formatted))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn is_epoch_end(item: &TrainingProgress) -> bool {
        item.progress.items_total > 0 && item.progress.items_processed >= item.progress.items_total
    }
}

impl MetricsRenderer for Log {
    fn update_train(&mut self, state: MetricState) {
        Self::record(&mut self.train, state);
    }

    fn update_valid(&mut self, state: MetricState) {
        Self::record(&mut self.valid, state);
    }

    fn render_train(&mut self, item: TrainingProgress) {
        if self.should_log(item.iteration) {
            log::info!(
                "Epoch[{}/{}] Iteration[{}] {}",
                item.epoch,
                item.epoch_total,
                item.iteration,
                Self::values(&self.train)
            );
        }

        if Self::is_epoch_end(&item) {
            log::info!(
                "Training Results - Epoch: {} - {}",
                item.epoch,
                Self::summary(&self.train)
            );
        }
    }

    fn render_valid(&mut self, item: TrainingProgress) {
        if Self::is_epoch_end(&item) {
            log::info!(
                "Validation Results - Epoch: {} - {}",
                item.epoch,
                Self::summary(&self.valid)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn reading(formatted: &str, value: Option<f64>) -> Reading {
        Reading {
            formatted: formatted.to_string(),
            value,
        }
    }

    #[test]
    fn test_logs_on_interval_only() {
        let renderer = Log::new(50);

        assert!(!renderer.should_log(0));
        assert!(!renderer.should_log(49));
        assert!(renderer.should_log(50));
        assert!(renderer.should_log(100));
    }

    #[test]
    fn test_zero_interval_logs_every_iteration() {
        let renderer = Log::new(0);

        assert!(renderer.should_log(1));
        assert!(renderer.should_log(2));
    }

    #[test]
    fn test_values_skip_generic_metrics() {
        let mut metrics = BTreeMap::new();
        metrics.insert("Loss".to_string(), reading("epoch 0.693 - batch 0.701", Some(0.701)));
        metrics.insert("Device".to_string(), reading("cpu", None));

        assert_eq!(Log::values(&metrics), "Loss: 0.7010");
        assert_eq!(
            Log::summary(&metrics),
            "Device: cpu, Loss: epoch 0.693 - batch 0.701"
        );
    }
}
