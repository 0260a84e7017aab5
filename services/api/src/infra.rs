use lender_match::config::AppConfig;
use lender_match::error::AppError;
use lender_match::workflows::matching::{
    ApplicationId, DurationUnit, IntakeConfig, LenderPolicy, MatchingRecord, MatchingService,
    PolicyCatalog, PolicyId, PolicyRepository, RepositoryError, ResultStore,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, RwLock};
use tracing::info;

pub(crate) type EngineService = MatchingService<InMemoryPolicyRepository, InMemoryResultStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Policy store keyed by id. Snapshots hand out `Arc`s, so edits never touch a running match.
#[derive(Default)]
pub(crate) struct InMemoryPolicyRepository {
    policies: RwLock<BTreeMap<PolicyId, Arc<LenderPolicy>>>,
}

impl InMemoryPolicyRepository {
    pub(crate) fn from_policies(policies: Vec<LenderPolicy>) -> Self {
        let repository = Self::default();
        for policy in policies {
            repository.upsert(policy);
        }
        repository
    }

    pub(crate) fn upsert(&self, policy: LenderPolicy) {
        let mut guard = self
            .policies
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.insert(policy.id, Arc::new(policy));
    }
}

impl PolicyRepository for InMemoryPolicyRepository {
    fn active_policies(&self) -> Result<Vec<Arc<LenderPolicy>>, RepositoryError> {
        let guard = self
            .policies
            .read()
            .map_err(|_| RepositoryError::Unavailable("policy lock poisoned".to_string()))?;
        Ok(guard
            .values()
            .filter(|policy| policy.active)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryResultStore {
    records: Mutex<HashMap<ApplicationId, MatchingRecord>>,
}

impl ResultStore for InMemoryResultStore {
    fn store(&self, record: MatchingRecord) -> Result<(), RepositoryError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("result mutex poisoned".to_string()))?;
        guard.insert(record.application_id().clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<MatchingRecord>, RepositoryError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("result mutex poisoned".to_string()))?;
        Ok(guard.get(id).cloned())
    }
}

/// Load the configured catalog (or the bundled one) and wire it into a service.
pub(crate) fn build_service(
    policy_file: Option<&Path>,
    intake: IntakeConfig,
) -> Result<EngineService, AppError> {
    let policies = PolicyCatalog::load(policy_file)?;
    info!(
        policies = policies.len(),
        source = policy_file
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "standard".to_string()),
        "lender policies loaded"
    );

    Ok(MatchingService::new(
        Arc::new(InMemoryPolicyRepository::from_policies(policies)),
        Arc::new(InMemoryResultStore::default()),
        intake,
    ))
}

/// Service for one-shot CLI commands: environment config with optional flag overrides.
pub(crate) fn build_cli_service(
    policy_file: Option<&Path>,
    duration_unit: Option<DurationUnit>,
) -> Result<EngineService, AppError> {
    let config = AppConfig::load()?;
    let mut intake = config.matching.intake();
    if let Some(unit) = duration_unit {
        intake.submitted_duration_unit = unit;
    }
    let policy_file = policy_file.or(config.matching.policy_file.as_deref());
    build_service(policy_file, intake)
}

pub(crate) fn parse_duration_unit(raw: &str) -> Result<DurationUnit, String> {
    DurationUnit::parse(raw).ok_or_else(|| format!("expected 'months' or 'years', got '{raw}'"))
}
