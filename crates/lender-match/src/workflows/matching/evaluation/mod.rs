mod policy;
mod rules;
mod scoring;
mod tiers;

pub use policy::{LenderPolicy, PolicyConfigError, PolicySummary};
pub use rules::{evaluate, Comparator, NumericField, Predicate, Rule, RuleVerdict, TextField};
pub use scoring::{
    score, score_components, CurvePoint, NormalizationCurve, ScoreComponent, ScoringFactor,
    ScoringFactorKind,
};
pub use tiers::{classify, TierBand};

use super::domain::{Application, PolicyId};
use serde::{Deserialize, Serialize};

/// Everything one policy concludes about one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyAssessment {
    pub policy_id: PolicyId,
    pub eligible: bool,
    pub failed_reasons: Vec<String>,
    pub fit_score: u8,
    pub matching_tier: Option<String>,
    pub components: Vec<ScoreComponent>,
}

/// Run the rule evaluator, scorer, and classifier for a single policy.
///
/// The policy is assumed to have passed [`LenderPolicy::validate`].
pub fn assess(application: &Application, policy: &LenderPolicy) -> PolicyAssessment {
    let RuleVerdict {
        mut failed_reasons, ..
    } = evaluate(application, policy);

    let components = score_components(application, policy);
    let fit_score = scoring::total(&components);

    if let Some(minimum) = policy.minimum_fit_score {
        if fit_score < minimum {
            failed_reasons.push(format!(
                "fit score {fit_score} below lender minimum {minimum}"
            ));
        }
    }

    let eligible = failed_reasons.is_empty();
    let matching_tier = classify(fit_score, eligible, &policy.tiers);

    PolicyAssessment {
        policy_id: policy.id,
        eligible,
        failed_reasons,
        fit_score,
        matching_tier,
        components,
    }
}
