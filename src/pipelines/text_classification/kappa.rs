use std::fmt::Display;

/// How disagreements between classes are penalized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Weighting {
    /// Every disagreement costs the same
    #[default]
    Unweighted,

    /// Cost grows with the distance between class ids
    Linear,

    /// Cost grows with the squared distance between class ids
    Quadratic,
}

impl Weighting {
    /// Parse an optional weighting name, where `None` means unweighted
    pub fn from_name(name: Option<&str>) -> Result<Self, KappaError> {
        name.map_or(Ok(Weighting::Unweighted), Self::try_from)
    }

    fn penalty(&self, row: usize, col: usize) -> f64 {
        let distance = row.abs_diff(col) as f64;

        match self {
            Weighting::Unweighted => distance.min(1.0),
            Weighting::Linear => distance,
            Weighting::Quadratic => distance * distance,
        }
    }
}

impl TryFrom<&str> for Weighting {
    type Error = KappaError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "none" => Ok(Weighting::Unweighted),
            "linear" => Ok(Weighting::Linear),
            "quadratic" => Ok(Weighting::Quadratic),
            _ => Err(KappaError::UnknownWeighting(value.to_string())),
        }
    }
}

impl Display for Weighting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Weighting::Unweighted => "none",
            Weighting::Linear => "linear",
            Weighting::Quadratic => "quadratic",
        };

        write!(f, "{}", name)
    }
}

/// Cohen's kappa between predicted and ground-truth class ids, accumulated over an epoch
#[derive(Debug, Clone, PartialEq)]
pub struct CohenKappa {
    weighting: Weighting,

    /// `confusion[target][prediction]`
    confusion: Vec<Vec<u64>>,
}

impl CohenKappa {
    /// Create an empty accumulator
    pub fn new(weighting: Weighting) -> Self {
        Self {
            weighting,
            confusion: Vec::new(),
        }
    }

    /// The configured weighting
    pub fn weighting(&self) -> Weighting {
        self.weighting
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

            self.confusion[target][prediction] += 1;
        }
    }

    /// Forget everything accumulated so far
    pub fn reset(&mut self) {
        self.confusion.clear();
    }

    /// The number of accumulated pairs
    pub fn count(&self) -> u64 {
        self.confusion.iter().flatten().sum()
    }

    /// Agreement corrected for chance: 1 is perfect, 0 is no better than chance.
    ///
    /// When every pair falls in a single class the expected disagreement is zero, and the
    /// observed agreement is perfect, so the score is 1.
    pub fn compute(&self) -> Result<f64, KappaError> {
        let total = self.count();

        if total == 0 {
            return Err(KappaError::Empty);
        }

        let n_classes = self.confusion.len();
        let total = total as f64;

        let actual: Vec<f64> = self
            .confusion
            .iter()
            .map(|row| row.iter().sum::<u64>() as f64)
            .collect();
        let predicted: Vec<f64> = (0..n_classes)
            .map(|col| self.confusion.iter().map(|row| row[col]).sum::<u64>() as f64)
            .collect();

        let mut observed = 0.0;
        let mut expected = 0.0;

        for (row, counts) in self.confusion.iter().enumerate() {
            for (col, count) in counts.iter().enumerate() {
                let penalty = self.weighting.penalty(row, col);

                observed += penalty * *count as f64;
                expected += penalty * actual[row] * predicted[col] / total;
            }
        }

        if expected == 0.0 {
            return Ok(1.0);
        }

        Ok(1.0 - observed / expected)
    }

    fn grow(&mut self, n_classes: usize) {
        if n_classes <= self.confusion.len() {
            return;
        }

        for row in self.confusion.iter_mut() {
            row.resize(n_classes, 0);
        }

        self.confusion.resize(n_classes, vec![0; n_classes]);
    }
}

/// Cohen's Kappa Error
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum KappaError {
    /// The weighting is not one of none, linear or quadratic
    #[error("unknown kappa weighting {0:?}, expected one of none, linear, quadratic")]
    UnknownWeighting(String),

    /// Nothing was accumulated
    #[error("Cohen's kappa needs at least one prediction")]
    Empty,
}
