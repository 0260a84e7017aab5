use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::matching::domain::{
    Application, ApplicationId, ApplicationSubmission, BusinessId, GuarantorId, NumericInput,
    PolicyId,
};
use crate::workflows::matching::evaluation::{
    Comparator, LenderPolicy, NormalizationCurve, NumericField, Predicate, Rule, ScoringFactor,
    ScoringFactorKind, TierBand,
};
use crate::workflows::matching::intake::IntakeConfig;
use crate::workflows::matching::repository::{
    MatchingRecord, PolicyRepository, RepositoryError, ResultStore,
};
use crate::workflows::matching::{matching_router, MatchingService};

pub(super) fn standard_tiers() -> Vec<TierBand> {
    vec![
        TierBand::new("Prime", 85),
        TierBand::new("Near-Prime", 65),
        TierBand::new("Subprime", 40),
        TierBand::new("Marginal", 0),
    ]
}

pub(super) fn fico_floor(threshold: f64) -> Rule {
    Rule {
        id: "fico_floor".to_string(),
        predicate: Predicate::Numeric {
            field: NumericField::FicoScore,
            comparator: Comparator::Gte,
            threshold,
        },
        message: "FICO score {value} below minimum {threshold}".to_string(),
    }
}

pub(super) fn numeric_rule(
    id: &str,
    field: NumericField,
    comparator: Comparator,
    threshold: f64,
    message: &str,
) -> Rule {
    Rule {
        id: id.to_string(),
        predicate: Predicate::Numeric {
            field,
            comparator,
            threshold,
        },
        message: message.to_string(),
    }
}

/// FICO 600..750 at 0.6 and PayNet 0..100 at 0.4, with a FICO floor of 650.
pub(super) fn two_factor_policy(id: u32, name: &str) -> LenderPolicy {
    LenderPolicy {
        id: PolicyId(id),
        name: name.to_string(),
        active: true,
        duration_unit: Default::default(),
        rules: vec![fico_floor(650.0)],
        scoring: vec![
            ScoringFactor {
                factor: ScoringFactorKind::FicoScore,
                weight: 0.6,
                curve: NormalizationCurve::linear(600.0, 750.0),
            },
            ScoringFactor {
                factor: ScoringFactorKind::PaynetScore,
                weight: 0.4,
                curve: NormalizationCurve::linear(0.0, 100.0),
            },
        ],
        tiers: standard_tiers(),
        minimum_fit_score: None,
    }
}

/// Scores the FICO score alone on a linear curve, so the curve pins the fit score.
pub(super) fn fico_only_policy(id: u32, name: &str, low: f64, high: f64) -> LenderPolicy {
    LenderPolicy {
        scoring: vec![ScoringFactor {
            factor: ScoringFactorKind::FicoScore,
            weight: 1.0,
            curve: NormalizationCurve::linear(low, high),
        }],
        rules: Vec::new(),
        ..two_factor_policy(id, name)
    }
}

pub(super) fn application() -> Application {
    Application {
        application_id: ApplicationId("app-test".to_string()),
        business_id: BusinessId("biz-lone-star-haulers".to_string()),
        business_name: "Lone Star Haulers".to_string(),
        geographic_location: Some("TX".to_string()),
        industry_type: Some("Transportation".to_string()),
        revenue: Some(1_250_000.0),
        equipment_type: Some("Class 8 Truck".to_string()),
        business_duration_months: Some(48.0),
        paynet_score: Some(60),
        personal_guarantor_id: GuarantorId("pg-dana-ortiz".to_string()),
        personal_guarantor_name: "Dana Ortiz".to_string(),
        fico_score: Some(720),
        trade_lines: Some(8),
        credit_history_flags: BTreeSet::new(),
        loan_amount: 185_000.0,
    }
}

pub(super) fn submission() -> ApplicationSubmission {
    ApplicationSubmission {
        business_name: Some("Lone Star Haulers".to_string()),
        geographic_location: Some("TX".to_string()),
        industry_type: Some("Transportation".to_string()),
        revenue: Some(NumericInput::Text("1,250,000".to_string())),
        equipment_type: Some("Class 8 Truck".to_string()),
        business_duration: Some(NumericInput::Number(48.0)),
        paynet_score: Some(NumericInput::Number(60.0)),
        personal_guarantor_name: Some("Dana Ortiz".to_string()),
        fico_score: Some(NumericInput::Number(720.0)),
        trade_lines: Some(NumericInput::Text("8".to_string())),
        credit_history_flags: None,
        loan_amount: Some(NumericInput::Number(185_000.0)),
    }
}

#[derive(Default)]
pub(super) struct MemoryPolicies {
    policies: RwLock<Vec<Arc<LenderPolicy>>>,
}

impl MemoryPolicies {
    pub(super) fn with(policies: Vec<LenderPolicy>) -> Self {
        Self {
            policies: RwLock::new(policies.into_iter().map(Arc::new).collect()),
        }
    }

    pub(super) fn replace(&self, policy: LenderPolicy) {
        let mut guard = self.policies.write().expect("policy lock poisoned");
        guard.retain(|existing| existing.id != policy.id);
        guard.push(Arc::new(policy));
    }
}

impl PolicyRepository for MemoryPolicies {
    fn active_policies(&self) -> Result<Vec<Arc<LenderPolicy>>, RepositoryError> {
        let guard = self.policies.read().expect("policy lock poisoned");
        Ok(guard.iter().filter(|policy| policy.active).cloned().collect())
    }
}

#[derive(Default)]
pub(super) struct MemoryResults {
    records: Mutex<HashMap<ApplicationId, MatchingRecord>>,
    writes: Mutex<usize>,
}

impl MemoryResults {
    pub(super) fn writes(&self) -> usize {
        *self.writes.lock().expect("write counter poisoned")
    }

    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("result mutex poisoned").len()
    }
}

impl ResultStore for MemoryResults {
    fn store(&self, record: MatchingRecord) -> Result<(), RepositoryError> {
        *self.writes.lock().expect("write counter poisoned") += 1;
        self.records
            .lock()
            .expect("result mutex poisoned")
            .insert(record.application_id().clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<MatchingRecord>, RepositoryError> {
        Ok(self
            .records
            .lock()
            .expect("result mutex poisoned")
            .get(id)
            .cloned())
    }
}

pub(super) struct UnavailableStore;

impl ResultStore for UnavailableStore {
    fn store(&self, _record: MatchingRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<MatchingRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn build_service(
    policies: Vec<LenderPolicy>,
) -> (
    MatchingService<MemoryPolicies, MemoryResults>,
    Arc<MemoryPolicies>,
    Arc<MemoryResults>,
) {
    let repository = Arc::new(MemoryPolicies::with(policies));
    let store = Arc::new(MemoryResults::default());
    let service = MatchingService::new(repository.clone(), store.clone(), IntakeConfig::default());
    (service, repository, store)
}

pub(super) fn router_with(policies: Vec<LenderPolicy>) -> axum::Router {
    let (service, _, _) = build_service(policies);
    matching_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
