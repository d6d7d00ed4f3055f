use serde::{Serialize, Deserialize};
use std::collections::VecDeque;

/// Metrics recorded for one training step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationStats {
    pub iteration: u64,
    pub cost: f64,
    /// Running accuracy over every step seen so far, in [0, 1].
    pub accuracy: f64,
    /// Running macro-averaged precision, in [0, 1].
    pub precision: f64,
    /// Running macro-averaged recall, in [0, 1].
    pub recall: f64,
}

/// Counts of `(actual, predicted)` class pairs.
///
/// A single-output network is read as a binary classifier with a 0.5
/// threshold; wider outputs use argmax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    counts: Vec<Vec<u64>>,
}

impl ConfusionMatrix {
    pub fn new(classes: usize) -> ConfusionMatrix {
        let classes = classes.max(2);
        ConfusionMatrix { counts: vec![vec![0; classes]; classes] }
    }

    pub fn classes(&self) -> usize {
        self.counts.len()
    }

    /// Steps whose target was class `actual` and prediction class `predicted`;
    /// `None` for a class index outside the matrix.
    pub fn count(&self, actual: usize, predicted: usize) -> Option<u64> {
        self.counts.get(actual)?.get(predicted).copied()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    pub fn record(&mut self, prediction: &[f64], target: &[f64]) {
        let actual = classify(target).min(self.classes() - 1);
        let predicted = classify(prediction).min(self.classes() - 1);
        self.counts[actual][predicted] += 1;
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: u64 = (0..self.classes()).map(|c| self.counts[c][c]).sum();
        correct as f64 / total as f64
    }

    /// Mean precision over classes that were predicted at least once.
    pub fn precision(&self) -> f64 {
        self.macro_average(|c| {
            let predicted: u64 = self.counts.iter().map(|row| row[c]).sum();
            (self.counts[c][c], predicted)
        })
    }

    /// Mean recall over classes that occurred at least once.
    pub fn recall(&self) -> f64 {
        self.macro_average(|c| (self.counts[c][c], self.counts[c].iter().sum()))
    }

    fn macro_average<F>(&self, hits_and_total: F) -> f64
    where
        F: Fn(usize) -> (u64, u64),
    {
        let ratios: Vec<f64> = (0..self.classes())
            .map(&hits_and_total)
            .filter(|&(_, total)| total > 0)
            .map(|(hits, total)| hits as f64 / total as f64)
            .collect();
        if ratios.is_empty() {
            0.0
        } else {
            ratios.iter().sum::<f64>() / ratios.len() as f64
        }
    }
}

/// Rolling log of the most recent training steps, keyed by iteration.
#[derive(Debug, Clone)]
pub struct TrainingLog {
    capacity: usize,
    entries: VecDeque<IterationStats>,
    confusion: Option<ConfusionMatrix>,
}

impl TrainingLog {
    pub fn new(capacity: usize) -> TrainingLog {
        TrainingLog {
            capacity,
            entries: VecDeque::new(),
            confusion: None,
        }
    }

    /// Records one step and returns the stats stored for it.
    pub fn append(
        &mut self,
        iteration: u64,
        cost: f64,
        prediction: &[f64],
        target: &[f64],
    ) -> IterationStats {
        let confusion = self.confusion
            .get_or_insert_with(|| ConfusionMatrix::new(prediction.len()));
        confusion.record(prediction, target);

        let stats = IterationStats {
            iteration,
            cost,
            accuracy: confusion.accuracy(),
            precision: confusion.precision(),
            recall: confusion.recall(),
        };

        self.entries.push_back(stats.clone());
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&IterationStats> {
        self.entries.back()
    }

    pub fn get(&self, iteration: u64) -> Option<&IterationStats> {
        self.entries
            .binary_search_by_key(&iteration, |s| s.iteration)
            .ok()
            .and_then(|i| self.entries.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &IterationStats> {
        self.entries.iter()
    }

    /// Mean cost over the retained window.
    pub fn mean_cost(&self) -> Option<f64> {
        if self.entries.is_empty() {
            return None;
        }
        Some(self.entries.iter().map(|s| s.cost).sum::<f64>() / self.entries.len() as f64)
    }

    pub fn confusion(&self) -> Option<&ConfusionMatrix> {
        self.confusion.as_ref()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.confusion = None;
    }
}

impl Default for TrainingLog {
    fn default() -> Self {
        TrainingLog::new(1000)
    }
}

/// Class index of an output vector.
fn classify(values: &[f64]) -> usize {
    match values {
        [single] => usize::from(*single >= 0.5),
        _ => argmax(values),
    }
}

/// Index of the maximum element in a slice.
fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
