use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::super::domain::{Application, PolicyId};
use super::policy::{LenderPolicy, PolicyConfigError};
use super::rules::NumericField;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Factors that contribute to the fit score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringFactorKind {
    FicoScore,
    PaynetScore,
    Revenue,
    BusinessDuration,
    TradeLines,
    LoanToRevenue,
}

impl ScoringFactorKind {
    pub const fn field(self) -> NumericField {
        match self {
            ScoringFactorKind::FicoScore => NumericField::FicoScore,
            ScoringFactorKind::PaynetScore => NumericField::PaynetScore,
            ScoringFactorKind::Revenue => NumericField::Revenue,
            ScoringFactorKind::BusinessDuration => NumericField::BusinessDuration,
            ScoringFactorKind::TradeLines => NumericField::TradeLines,
            ScoringFactorKind::LoanToRevenue => NumericField::LoanToRevenue,
        }
    }

    pub const fn label(self) -> &'static str {
        self.field().label()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub input: f64,
    pub score: f64,
}

/// Piecewise-linear mapping from a raw value onto 0..=100.
///
/// Points are sorted by `input`; values outside the curve take the nearest end point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizationCurve {
    pub points: Vec<CurvePoint>,
}

impl NormalizationCurve {
    pub fn linear(low: f64, high: f64) -> Self {
        Self {
            points: vec![
                CurvePoint {
                    input: low,
                    score: 0.0,
                },
                CurvePoint {
                    input: high,
                    score: 100.0,
                },
            ],
        }
    }

    pub fn normalize(&self, value: f64) -> f64 {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return 0.0;
        };

        let raw = if value <= first.input {
            first.score
        } else if value >= last.input {
            last.score
        } else {
            self.points
                .windows(2)
                .find(|pair| value <= pair[1].input)
                .map(|pair| {
                    let (low, high) = (pair[0], pair[1]);
                    low.score
                        + (value - low.input) * (high.score - low.score) / (high.input - low.input)
                })
                .unwrap_or(last.score)
        };

        raw.clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringFactor {
    pub factor: ScoringFactorKind,
    pub weight: f64,
    pub curve: NormalizationCurve,
}

/// Discrete contribution to a fit score, allowing transparent audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: ScoringFactorKind,
    pub raw_value: Option<f64>,
    pub normalized: f64,
    pub weight: f64,
    pub weighted: f64,
}

/// Per-factor breakdown in policy declaration order. Missing values normalize to zero.
pub fn score_components(application: &Application, policy: &LenderPolicy) -> Vec<ScoreComponent> {
    policy
        .scoring
        .iter()
        .map(|factor| {
            let raw_value = factor
                .factor
                .field()
                .read(application, policy.duration_unit);
            let normalized = raw_value
                .map(|value| factor.curve.normalize(value))
                .unwrap_or(0.0);
            ScoreComponent {
                factor: factor.factor,
                raw_value,
                normalized,
                weight: factor.weight,
                weighted: factor.weight * normalized,
            }
        })
        .collect()
}

/// Fit score in 0..=100, computed regardless of eligibility.
pub fn score(application: &Application, policy: &LenderPolicy) -> u8 {
    total(&score_components(application, policy))
}

pub(crate) fn total(components: &[ScoreComponent]) -> u8 {
    let sum: f64 = components.iter().map(|component| component.weighted).sum();
    sum.round().clamp(0.0, 100.0) as u8
}

pub(crate) fn validate_factors(
    policy: PolicyId,
    factors: &[ScoringFactor],
) -> Result<(), PolicyConfigError> {
    if factors.is_empty() {
        return Err(PolicyConfigError::NoScoringFactors { policy });
    }

    let mut seen = HashSet::new();
    let mut sum = 0.0;

    for factor in factors {
        if !seen.insert(factor.factor) {
            return Err(PolicyConfigError::DuplicateFactor {
                policy,
                factor: factor.factor,
            });
        }
        if !factor.weight.is_finite() || factor.weight < 0.0 {
            return Err(PolicyConfigError::InvalidWeight {
                policy,
                factor: factor.factor,
            });
        }
        validate_curve(policy, factor.factor, &factor.curve)?;
        sum += factor.weight;
    }

    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(PolicyConfigError::WeightSum { policy, sum });
    }

    Ok(())
}

fn validate_curve(
    policy: PolicyId,
    factor: ScoringFactorKind,
    curve: &NormalizationCurve,
) -> Result<(), PolicyConfigError> {
    let invalid = |reason| PolicyConfigError::InvalidCurve {
        policy,
        factor,
        reason,
    };

    if curve.points.is_empty() {
        return Err(invalid("needs at least one point"));
    }
    if curve
        .points
        .iter()
        .any(|point| !point.input.is_finite() || !point.score.is_finite())
    {
        return Err(invalid("has non-finite points"));
    }
    if curve
        .points
        .iter()
        .any(|point| !(0.0..=100.0).contains(&point.score))
    {
        return Err(invalid("has scores outside 0..=100"));
    }
    if curve
        .points
        .windows(2)
        .any(|pair| pair[1].input <= pair[0].input)
    {
        return Err(invalid("inputs must be strictly increasing"));
    }

    Ok(())
}
