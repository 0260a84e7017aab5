use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::domain::{
    Application, Eligibility, MatchResultId, MatchingResult, REJECTION_REASON_SEPARATOR,
};
use super::evaluation::{assess, LenderPolicy, PolicyAssessment, PolicyConfigError};
use super::repository::{MatchingRecord, PolicyRepository, RepositoryError, ResultStore};

static RESULT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_result_id() -> MatchResultId {
    let id = RESULT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    MatchResultId(format!("match-{id:06}"))
}

/// Cooperative stop signal shared between a caller and an in-flight run.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Guard that cancels the flag when dropped, e.g. with an abandoned request.
    pub fn cancel_on_drop(&self) -> CancelOnDrop {
        CancelOnDrop(self.clone())
    }
}

pub struct CancelOnDrop(CancellationFlag);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Outcome of a run. Incomplete runs carry whatever finished before cancellation.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingRun {
    pub record: MatchingRecord,
    pub complete: bool,
}

/// Errors that abort a whole run.
#[derive(Debug, thiserror::Error)]
pub enum MatchingError {
    #[error(transparent)]
    PolicyConfig(#[from] PolicyConfigError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Evaluates an application against every active lender policy.
pub struct MatchingOrchestrator<P, S> {
    policies: Arc<P>,
    store: Arc<S>,
}

impl<P, S> MatchingOrchestrator<P, S>
where
    P: PolicyRepository + 'static,
    S: ResultStore + 'static,
{
    pub fn new(policies: Arc<P>, store: Arc<S>) -> Self {
        Self { policies, store }
    }

    pub fn run(&self, application: &Application) -> Result<MatchingRun, MatchingError> {
        self.run_with_cancellation(application, &CancellationFlag::new())
    }

    /// Snapshot, validate, evaluate, sort, then persist.
    ///
    /// A cancelled run stops launching policy evaluations, keeps what already finished,
    /// and is not persisted.
    pub fn run_with_cancellation(
        &self,
        application: &Application,
        cancel: &CancellationFlag,
    ) -> Result<MatchingRun, MatchingError> {
        let snapshot = self.policies.active_policies()?;

        for policy in &snapshot {
            if let Err(err) = policy.validate() {
                error!(
                    application_id = %application.application_id,
                    policy_id = %err.policy(),
                    error = %err,
                    "lender policy misconfigured; aborting matching run"
                );
                return Err(err.into());
            }
        }

        let mut results = Vec::with_capacity(snapshot.len());
        let mut complete = true;

        for policy in &snapshot {
            if cancel.is_cancelled() {
                complete = false;
                break;
            }

            let assessment = assess(application, policy);
            debug!(
                application_id = %application.application_id,
                policy_id = %policy.id,
                eligible = assessment.eligible,
                fit_score = assessment.fit_score,
                "policy evaluated"
            );
            results.push(build_result(application, policy, assessment));
        }

        sort_results(&mut results);

        let record = MatchingRecord {
            application: application.clone(),
            results,
            evaluated_at: Utc::now(),
        };

        if !complete {
            warn!(
                application_id = %application.application_id,
                evaluated = record.results.len(),
                policies = snapshot.len(),
                "matching run cancelled"
            );
            return Ok(MatchingRun {
                record,
                complete,
            });
        }

        self.store.store(record.clone())?;

        info!(
            application_id = %application.application_id,
            policies = snapshot.len(),
            eligible = record.eligible_count(),
            "matching run complete"
        );

        Ok(MatchingRun { record, complete })
    }
}

/// Highest fit score first, then lowest policy id.
pub fn sort_results(results: &mut [MatchingResult]) {
    results.sort_by(|left, right| {
        right
            .fit_score
            .cmp(&left.fit_score)
            .then_with(|| left.lender_policy_id.cmp(&right.lender_policy_id))
    });
}

fn build_result(
    application: &Application,
    policy: &LenderPolicy,
    assessment: PolicyAssessment,
) -> MatchingResult {
    let rejection_reason = (!assessment.failed_reasons.is_empty())
        .then(|| assessment.failed_reasons.join(REJECTION_REASON_SEPARATOR));

    MatchingResult {
        id: next_result_id(),
        eligibility: Eligibility::from_eligible(assessment.eligible),
        matching_tier: assessment.matching_tier,
        rejection_reason,
        fit_score: assessment.fit_score,
        lender_policy_id: policy.id,
        lender_name: policy.name.clone(),
        business_name: application.business_name.clone(),
        personal_guarantor_name: application.personal_guarantor_name.clone(),
        business_id: application.business_id.clone(),
        personal_guarantor_id: application.personal_guarantor_id.clone(),
    }
}
