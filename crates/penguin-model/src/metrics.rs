//! Evaluation metrics reported after training.

/// Fraction of predictions equal to the truth.
pub fn accuracy(truth: &[usize], pred: &[usize]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let hits = truth.iter().zip(pred).filter(|(t, p)| t == p).count();
    hits as f64 / truth.len() as f64
}

/// Per-class F1 averaged with class-support weights.
pub fn weighted_f1(truth: &[usize], pred: &[usize], n_classes: usize) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let mut total = 0.0;
    for class in 0..n_classes {
        let tp = truth
            .iter()
            .zip(pred)
            .filter(|(&t, &p)| t == class && p == class)
            .count() as f64;
        let fp = truth
            .iter()
            .zip(pred)
            .filter(|(&t, &p)| t != class && p == class)
            .count() as f64;
        let fn_ = truth
            .iter()
            .zip(pred)
            .filter(|(&t, &p)| t == class && p != class)
            .count() as f64;
        let support = tp + fn_;
        if support == 0.0 {
            continue;
        }
        let precision = if tp + fp > 0.0 { tp / (tp + fp) } else { 0.0 };
        let recall = tp / support;
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        total += f1 * support;
    }
    total / truth.len() as f64
}
