//! Burnout risk scoring over recent mood samples.
//!
//! The caller guarantees one sample per calendar day, ordered oldest to
//! newest. Scoring looks at the most recent window of up to
//! [`WINDOW_SIZE`] samples and weighs three signals: how low the mood
//! average is, how steeply it is falling, and how erratic it is.

use serde::{Deserialize, Serialize};

/// Below this many samples the signal is too thin to call anything but Low.
pub const MIN_SAMPLES: usize = 5;
/// Most recent samples considered by the score.
pub const WINDOW_SIZE: usize = 7;

const HIGH_THRESHOLD: f64 = 60.0;
const MEDIUM_THRESHOLD: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "burnout_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// One-line suggestion surfaced alongside the risk category.
    pub fn tip(&self) -> &'static str {
        match self {
            RiskLevel::High => {
                "Consider taking a day off to recharge. Your wellbeing matters."
            }
            RiskLevel::Medium => {
                "Try scheduling short breaks throughout your day to prevent burnout."
            }
            RiskLevel::Low => {
                "Keep up the good work! Regular self-care helps maintain your wellbeing."
            }
        }
    }
}

/// Map a chronologically ordered mood history (values 0-100) to a risk
/// category. Total and deterministic: short or empty input is `Low`.
pub fn evaluate(values: &[i32]) -> RiskLevel {
    if values.len() < MIN_SAMPLES {
        return RiskLevel::Low;
    }

    let start = values.len().saturating_sub(WINDOW_SIZE);
    let window: Vec<f64> = values[start..].iter().map(|&v| f64::from(v)).collect();

    let average = window.iter().sum::<f64>() / window.len() as f64;
    // Negative trend = mood worsening across the window.
    let trend = window[window.len() - 1] - window[0];
    let volatility = rms_successive_diffs(&window);

    let score = (100.0 - average) * 0.5 + (-trend).max(0.0) * 0.3 + volatility * 0.2;

    if score > HIGH_THRESHOLD {
        RiskLevel::High
    } else if score > MEDIUM_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Root-mean-square of successive differences; 0 for fewer than two samples.
fn rms_successive_diffs(window: &[f64]) -> f64 {
    if window.len() < 2 {
        return 0.0;
    }
    let sum_sq: f64 = window
        .windows(2)
        .map(|pair| {
            let d = pair[1] - pair[0];
            d * d
        })
        .sum();
    (sum_sq / (window.len() - 1) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_histories_are_always_low() {
        assert_eq!(evaluate(&[]), RiskLevel::Low);
        assert_eq!(evaluate(&[0]), RiskLevel::Low);
        assert_eq!(evaluate(&[0, 0, 0, 0]), RiskLevel::Low);
    }

    #[test]
    fn constant_history_reduces_to_the_average_term() {
        // trend and volatility are both zero, so score = (100 - v) * 0.5.
        // v = 20 lands exactly on the Medium threshold; the comparison is
        // strict, so exactly 40 is still Low.
        assert_eq!(evaluate(&[20; 5]), RiskLevel::Low);
        // v = 19 -> score 40.5, just over the line.
        assert_eq!(evaluate(&[19; 5]), RiskLevel::Medium);
        // v = 80 -> score 10.
        assert_eq!(evaluate(&[80; 7]), RiskLevel::Low);
        // v = 0 -> score 50.
        assert_eq!(evaluate(&[0; 5]), RiskLevel::Medium);
    }

    #[test]
    fn declining_week_from_the_worked_example() {
        // average 67 -> 16.5; trend -30 -> 9.0; volatility sqrt(62.5) -> ~1.58.
        // Score ~27.1, comfortably Low despite the decline.
        assert_eq!(evaluate(&[80, 75, 70, 60, 50]), RiskLevel::Low);
    }

    #[test]
    fn sharp_collapse_is_high_risk() {
        // average 10 -> 45; trend -50 -> 15; volatility 25 -> 5. Score 65.
        assert_eq!(evaluate(&[50, 0, 0, 0, 0]), RiskLevel::High);
    }

    #[test]
    fn only_the_recent_window_counts() {
        // Old misery followed by a steady good week: the 7-sample window
        // sees only the good values.
        let mut history = vec![5, 5, 5, 5, 5];
        history.extend_from_slice(&[80; 7]);
        assert_eq!(evaluate(&history), RiskLevel::Low);
    }

    #[test]
    fn recovery_is_not_penalized_as_trend() {
        // Rising trend contributes nothing: max(0, -trend) clamps at zero.
        assert_eq!(evaluate(&[50, 55, 60, 65, 70]), RiskLevel::Low);
    }

    #[test]
    fn rms_of_flat_window_is_zero() {
        assert_eq!(rms_successive_diffs(&[42.0, 42.0, 42.0]), 0.0);
        assert_eq!(rms_successive_diffs(&[42.0]), 0.0);
    }
}
