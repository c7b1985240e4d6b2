use std::collections::BTreeMap;

/// Key for the unweighted mean over classes
pub static MACRO_AVG: &str = "macro avg";

/// Per-class precision, recall and F-beta, with their macro average.
///
/// Classes with no predictions or no support score 0 rather than NaN.
#[derive(Debug, Clone)]
pub struct ClassificationReport {
    labels: Vec<String>,
    beta: f64,
    true_positives: Vec<usize>,
    predicted: Vec<usize>,
    actual: Vec<usize>,
}

impl ClassificationReport {
    /// Create an empty report for the given class labels, in class id order
    pub fn new(labels: Vec<String>) -> Self {
        let n_classes = labels.len();

        Self {
            labels,
            beta: 1.0,
            true_positives: vec![0; n_classes],
            predicted: vec![0; n_classes],
            actual: vec![0; n_classes],
        }
    }

    /// Weight recall `beta` times as much as precision
    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    /// Accumulate a batch of predicted and ground-truth class ids
    pub fn update(&mut self, predictions: &[usize], targets: &[usize]) {
        debug_assert_eq!(
            predictions.len(),
            targets.len(),
            "predictions and targets must pair up"
        );

        for (&prediction, &target) in predictions.iter().zip(targets) {
            self.grow(prediction.max(target) + 1);

            self.predicted[prediction] += 1;
            self.actual[target] += 1;

            if prediction == target {
                self.true_positives[target] += 1;
            }
        }
    }

    /// Forget everything accumulated so far
    pub fn reset(&mut self) {
        let n_classes = self.labels.len();

        self.true_positives = vec![0; n_classes];
        self.predicted = vec![0; n_classes];
        self.actual = vec![0; n_classes];
    }

    fn grow(&mut self, n_classes: usize) {
        if n_classes > self.actual.len() {
            self.true_positives.resize(n_classes, 0);
            self.predicted.resize(n_classes, 0);
            self.actual.resize(n_classes, 0);
        }
    }

    /// Precision for each class
    pub fn precision(&self) -> Vec<f64> {
        ratios(&self.true_positives, &self.predicted)
    }

    /// Recall for each class
    pub fn recall(&self) -> Vec<f64> {
        ratios(&self.true_positives, &self.actual)
    }

    /// F-beta for each class
    pub fn fbeta(&self) -> Vec<f64> {
        let beta2 = self.beta * self.beta;

        self.precision()
            .into_iter()
            .zip(self.recall())
            .map(|(precision, recall)| {
                let denominator = beta2 * precision + recall;

                if denominator == 0.0 {
                    0.0
                } else {
                    (1.0 + beta2) * precision * recall / denominator
                }
            })
            .collect()
    }

    /// Scores keyed by class label, plus [`MACRO_AVG`]
    pub fn compute(&self) -> BTreeMap<String, BTreeMap<String, f64>> {
        let f_key = format!("f{}-score", self.beta);

        let precision = self.precision();
        let recall = self.recall();
        let fbeta = self.fbeta();

        let scores = |p: f64, r: f64, f: f64| {
            BTreeMap::from([
                ("precision".to_string(), p),
                ("recall".to_string(), r),
                (f_key.clone(), f),
            ])
        };

        let mut report: BTreeMap<String, BTreeMap<String, f64>> = (0..precision.len())
            .map(|class| {
                (
                    self.label(class),
                    scores(precision[class], recall[class], fbeta[class]),
                )
            })
            .collect();

        report.insert(
            MACRO_AVG.to_string(),
            scores(mean(&precision), mean(&recall), mean(&fbeta)),
        );

        report
    }

    /// The report as a JSON object
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.compute())
    }

    fn label(&self, class: usize) -> String {
        self.labels
            .get(class)
            .cloned()
            .unwrap_or_else(|| class.to_string())
    }
}

fn ratios(numerators: &[usize], denominators: &[usize]) -> Vec<f64> {
    numerators
        .iter()
        .zip(denominators)
        .map(|(&n, &d)| if d == 0 { 0.0 } else { n as f64 / d as f64 })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
