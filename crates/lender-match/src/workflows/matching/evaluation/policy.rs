use serde::{Deserialize, Serialize};

use super::super::domain::{DurationUnit, PolicyId};
use super::rules::{validate_rules, Rule};
use super::scoring::{validate_factors, ScoringFactor, ScoringFactorKind};
use super::tiers::{validate_bands, TierBand};

/// A lender's configured rule set, scoring weights, and tier bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LenderPolicy {
    pub id: PolicyId,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Unit used by business-duration thresholds and curves in this policy.
    #[serde(default)]
    pub duration_unit: DurationUnit,
    pub rules: Vec<Rule>,
    pub scoring: Vec<ScoringFactor>,
    pub tiers: Vec<TierBand>,
    /// Eligible applications scoring below this are turned down.
    #[serde(default)]
    pub minimum_fit_score: Option<u8>,
}

fn default_active() -> bool {
    true
}

impl LenderPolicy {
    /// Load-time invariants; a policy failing these must never be evaluated.
    pub fn validate(&self) -> Result<(), PolicyConfigError> {
        if self.name.trim().is_empty() {
            return Err(PolicyConfigError::EmptyName { policy: self.id });
        }

        validate_rules(self.id, &self.rules)?;
        validate_factors(self.id, &self.scoring)?;
        validate_bands(self.id, &self.tiers)?;

        if let Some(minimum) = self.minimum_fit_score {
            if minimum > 100 {
                return Err(PolicyConfigError::MinimumFitScoreOutOfRange {
                    policy: self.id,
                    found: minimum,
                });
            }
        }

        Ok(())
    }

    pub fn summary(&self) -> PolicySummary {
        PolicySummary {
            id: self.id,
            name: self.name.clone(),
            rule_count: self.rules.len(),
            tiers: self.tiers.iter().map(|band| band.name.clone()).collect(),
            minimum_fit_score: self.minimum_fit_score,
        }
    }
}

/// Public view of a policy; rule thresholds stay private to the lender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySummary {
    pub id: PolicyId,
    pub name: String,
    pub rule_count: usize,
    pub tiers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_fit_score: Option<u8>,
}

/// A loaded policy violates its invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyConfigError {
    #[error("policy {policy}: name must not be empty")]
    EmptyName { policy: PolicyId },
    #[error("policy {policy}: rule id must not be empty")]
    EmptyRuleId { policy: PolicyId },
    #[error("policy {policy}: duplicate rule id '{rule}'")]
    DuplicateRule { policy: PolicyId, rule: String },
    #[error("policy {policy}: rule '{rule}' needs a rejection message")]
    EmptyMessage { policy: PolicyId, rule: String },
    #[error("policy {policy}: rule '{rule}' message must not contain commas")]
    CommaInMessage { policy: PolicyId, rule: String },
    #[error("policy {policy}: rule '{rule}' threshold must be a finite number")]
    NonFiniteThreshold { policy: PolicyId, rule: String },
    #[error("policy {policy}: rule '{rule}' must list at least one value")]
    EmptyValueSet { policy: PolicyId, rule: String },
    #[error("policy {policy}: at least one scoring factor is required")]
    NoScoringFactors { policy: PolicyId },
    #[error("policy {policy}: duplicate scoring factor {factor:?}")]
    DuplicateFactor {
        policy: PolicyId,
        factor: ScoringFactorKind,
    },
    #[error("policy {policy}: weight for {factor:?} must be finite and non-negative")]
    InvalidWeight {
        policy: PolicyId,
        factor: ScoringFactorKind,
    },
    #[error("policy {policy}: scoring weights sum to {sum:.4}, expected 1.0")]
    WeightSum { policy: PolicyId, sum: f64 },
    #[error("policy {policy}: curve for {factor:?} {reason}")]
    InvalidCurve {
        policy: PolicyId,
        factor: ScoringFactorKind,
        reason: &'static str,
    },
    #[error("policy {policy}: tier bands {reason}")]
    InvalidTiers {
        policy: PolicyId,
        reason: &'static str,
    },
    #[error("policy {policy}: minimum fit score {found} exceeds 100")]
    MinimumFitScoreOutOfRange { policy: PolicyId, found: u8 },
}

impl PolicyConfigError {
    pub fn policy(&self) -> PolicyId {
        match self {
            PolicyConfigError::EmptyName { policy }
            | PolicyConfigError::EmptyRuleId { policy }
            | PolicyConfigError::DuplicateRule { policy, .. }
            | PolicyConfigError::EmptyMessage { policy, .. }
            | PolicyConfigError::CommaInMessage { policy, .. }
            | PolicyConfigError::NonFiniteThreshold { policy, .. }
            | PolicyConfigError::EmptyValueSet { policy, .. }
            | PolicyConfigError::NoScoringFactors { policy }
            | PolicyConfigError::DuplicateFactor { policy, .. }
            | PolicyConfigError::InvalidWeight { policy, .. }
            | PolicyConfigError::WeightSum { policy, .. }
            | PolicyConfigError::InvalidCurve { policy, .. }
            | PolicyConfigError::InvalidTiers { policy, .. }
            | PolicyConfigError::MinimumFitScoreOutOfRange { policy, .. } => *policy,
        }
    }
}
