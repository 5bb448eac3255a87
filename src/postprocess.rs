use crate::error::ModelError;
use crate::labels::ClassLabels;

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// `(label, probability)` in label order.
    pub distribution: Vec<(String, f64)>,
    pub top_class: String,
    pub top_probability: f64,
}

/// Numerically stable softmax: shift by the max before exponentiating.
pub fn softmax(scores: &[f32]) -> Result<Vec<f64>, ModelError> {
    if scores.is_empty() {
        return Err(ModelError::InvalidScores("score vector is empty".to_string()));
    }
    if let Some(pos) = scores.iter().position(|s| !s.is_finite()) {
        return Err(ModelError::InvalidScores(format!(
            "non-finite score {} at index {}",
            scores[pos], pos
        )));
    }

    let max = scores
        .iter()
        .map(|&s| s as f64)
        .fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|&s| (s as f64 - max).exp()).collect();
    // The max element contributes exp(0) = 1, so the sum is never zero.
    let sum: f64 = exps.iter().sum();
    Ok(exps.into_iter().map(|e| e / sum).collect())
}

/// Index of the first maximum, scanning left to right.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Turn raw scores into a labelled distribution plus its top-1 entry.
pub fn predict(labels: &ClassLabels, scores: &[f32]) -> Result<Prediction, ModelError> {
    if scores.len() != labels.len() {
        return Err(ModelError::LabelMismatch {
            labels: labels.len(),
            outputs: scores.len(),
        });
    }
    let probs = softmax(scores)?;
    let top = argmax(&probs)
        .ok_or_else(|| ModelError::InvalidScores("score vector is empty".to_string()))?;

    let distribution: Vec<(String, f64)> = labels
        .iter()
        .zip(&probs)
        .map(|(label, &p)| (label.to_string(), p))
        .collect();
    let (top_class, top_probability) = distribution[top].clone();

    Ok(Prediction {
        distribution,
        top_class,
        top_probability,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-6;

    fn sample_scores() -> Vec<Vec<f32>> {
        vec![
            vec![0.0; 10],
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0],
            vec![-3.2, 0.5, 12.0, -7.7, 4.4, 0.0, 1.1, -0.1, 2.5, 8.0],
            vec![1000.0, 999.0, -1000.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            vec![-1e30, -1e30, -1e30, -1e30, 0.0, -1e30, -1e30, -1e30, -1e30, -1e30],
        ]
    }

    #[test]
    fn test_softmax_sums_to_one() {
        for scores in sample_scores() {
            let probs = softmax(&scores).unwrap();
            let sum: f64 = probs.iter().sum();
            assert!((sum - 1.0).abs() < TOLERANCE, "sum {} for {:?}", sum, scores);
            assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
        }
    }

    #[test]
    fn test_softmax_large_scores_do_not_overflow() {
        let probs = softmax(&[1000.0, 1000.0]).unwrap();
        assert!((probs[0] - 0.5).abs() < TOLERANCE);
        assert!((probs[1] - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn test_softmax_shift_invariant() {
        let base = vec![-3.2f32, 0.5, 12.0, -7.7, 4.4, 0.0, 1.1, -0.1, 2.5, 8.0];
        let expected = softmax(&base).unwrap();
        for shift in [-100.0f32, -1.5, 0.25, 42.0, 500.0] {
            let shifted: Vec<f32> = base.iter().map(|s| s + shift).collect();
            let probs = softmax(&shifted).unwrap();
            for (a, b) in probs.iter().zip(&expected) {
                // f32 addition of the shift loses a little precision
                assert!((a - b).abs() < 1e-4, "shift {}: {} vs {}", shift, a, b);
            }
        }
    }

    #[test]
    fn test_softmax_rejects_invalid_scores() {
        assert!(matches!(softmax(&[]), Err(ModelError::InvalidScores(_))));
        assert!(softmax(&[1.0, f32::NAN]).is_err());
        assert!(softmax(&[f32::INFINITY, 0.0]).is_err());
        assert!(softmax(&[f32::NEG_INFINITY, 0.0]).is_err());
    }

    #[test]
    fn test_argmax_first_max_wins() {
        assert_eq!(argmax(&[0.1, 0.4, 0.4, 0.1]), Some(1));
        assert_eq!(argmax(&[0.25; 4]), Some(0));
        assert_eq!(argmax(&[0.1, 0.2, 0.7]), Some(2));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_predict_top_class_matches_argmax() {
        let labels = ClassLabels::default();
        let scores = vec![0.1f32, 0.2, 0.3, 0.4, 5.0, 0.6, 0.7, 0.8, 0.9, 1.0];
        let prediction = predict(&labels, &scores).unwrap();

        assert_eq!(prediction.top_class, "glass");
        let max = prediction
            .distribution
            .iter()
            .map(|(_, p)| *p)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(prediction.top_probability, max);
        let keys: Vec<&str> = prediction.distribution.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(keys, labels.iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_predict_tie_goes_to_earliest_label() {
        let labels = ClassLabels::default();
        let mut scores = vec![0.0f32; 10];
        scores[3] = 2.0;
        scores[7] = 2.0;
        let prediction = predict(&labels, &scores).unwrap();
        assert_eq!(prediction.top_class, "clothes");

        let uniform = predict(&labels, &[1.5; 10]).unwrap();
        assert_eq!(uniform.top_class, "battery");
        assert!((uniform.top_probability - 0.1).abs() < TOLERANCE);
    }

    #[test]
    fn test_predict_label_mismatch() {
        let labels = ClassLabels::default();
        let err = predict(&labels, &[0.0; 9]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::LabelMismatch {
                labels: 10,
                outputs: 9
            }
        ));
    }
}
