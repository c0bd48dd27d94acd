use crate::error::PredictError;
use serde::Serialize;

/// The answer returned to the client: which plant was asked about, the
/// winning label, and its confidence rounded to three decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub plant: String,
    pub label: String,
    pub confidence: f64,
}

/// Pick the winning label from a flattened model output. The score vector
/// must be exactly as long as the label list; on a tie the first maximum in
/// iteration order wins.
pub fn rank(plant: &str, labels: &[String], scores: &[f32]) -> Result<Prediction, PredictError> {
    if scores.len() != labels.len() {
        return Err(PredictError::LabelMismatch {
            outputs: scores.len(),
            labels: labels.len(),
        });
    }

    let (index, max) = scores
        .iter()
        .copied()
        .enumerate()
        .reduce(|best, candidate| if candidate.1 > best.1 { candidate } else { best })
        .ok_or_else(|| PredictError::Internal("model produced no scores".to_string()))?;

    Ok(Prediction {
        plant: plant.to_string(),
        label: labels[index].clone(),
        confidence: round3(max),
    })
}

/// Round to three decimals, half away from zero, by shifting the value's
/// shortest decimal representation. Shifting the decimal string instead of
/// multiplying keeps 0.1235 at exactly 123.5 before rounding, so it lands on
/// 0.124 rather than 0.123.
pub fn round3(value: f32) -> f64 {
    let shifted = format!("{value}e3")
        .parse::<f64>()
        .unwrap_or(f64::from(value) * 1000.);
    shifted.round() / 1000.
}
