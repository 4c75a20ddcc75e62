use crate::error::InferenceError;

const DISTRIBUTION_TOLERANCE: f32 = 1e-3;

/// Turns raw model scores into a probability distribution.
///
/// Scores that already look like one (softmax inside the graph) are kept
/// as-is; anything else is treated as logits.
pub fn to_probabilities(scores: &[f32]) -> Result<Vec<f32>, InferenceError> {
    if let Some(index) = scores.iter().position(|score| !score.is_finite()) {
        return Err(InferenceError::NonFinite(index));
    }

    if is_distribution(scores) {
        return Ok(scores.to_vec());
    }

    Ok(softmax(scores))
}

fn is_distribution(scores: &[f32]) -> bool {
    let in_range = scores.iter().all(|score| (0.0..=1.0).contains(score));
    let sum: f32 = scores.iter().sum();
    in_range && (sum - 1.0).abs() <= DISTRIBUTION_TOLERANCE
}

pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|logit| (logit - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|value| value / sum).collect()
}
