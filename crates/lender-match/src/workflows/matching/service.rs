use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::domain::{Application, ApplicationId, ApplicationSubmission};
use super::evaluation::PolicySummary;
use super::intake::{IntakeConfig, IntakeGuard, ValidationError};
use super::orchestrator::{CancellationFlag, MatchingError, MatchingOrchestrator, MatchingRun};
use super::repository::{MatchingRecord, PolicyRepository, RepositoryError, ResultStore};

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

/// Service composing intake, the orchestrator, and the result store.
pub struct MatchingService<P, S> {
    guard: IntakeGuard,
    policies: Arc<P>,
    store: Arc<S>,
    orchestrator: MatchingOrchestrator<P, S>,
}

impl<P, S> MatchingService<P, S>
where
    P: PolicyRepository + 'static,
    S: ResultStore + 'static,
{
    pub fn new(policies: Arc<P>, store: Arc<S>, config: IntakeConfig) -> Self {
        let orchestrator = MatchingOrchestrator::new(policies.clone(), store.clone());
        Self {
            guard: IntakeGuard::new(config),
            policies,
            store,
            orchestrator,
        }
    }

    /// Validate a submission and assign it a fresh application id.
    pub fn intake(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<Application, MatchingServiceError> {
        let mut application = self.guard.application_from_submission(submission)?;
        application.application_id = next_application_id();
        Ok(application)
    }

    /// Intake plus a full, uncancellable run.
    pub fn submit(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<MatchingRecord, MatchingServiceError> {
        let application = self.intake(submission)?;
        let run = self.orchestrator.run(&application)?;
        Ok(run.record)
    }

    pub fn run(
        &self,
        application: &Application,
        cancel: &CancellationFlag,
    ) -> Result<MatchingRun, MatchingServiceError> {
        Ok(self.orchestrator.run_with_cancellation(application, cancel)?)
    }

    /// Stored results for an application that has completed a run.
    pub fn results(&self, id: &ApplicationId) -> Result<MatchingRecord, MatchingServiceError> {
        let record = self.store.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn active_policies(&self) -> Result<Vec<PolicySummary>, MatchingServiceError> {
        let policies = self.policies.active_policies()?;
        Ok(policies.iter().map(|policy| policy.summary()).collect())
    }
}

/// Error raised by the matching service.
#[derive(Debug, thiserror::Error)]
pub enum MatchingServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Matching(#[from] MatchingError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
