//! Lender matching: intake, per-policy rule evaluation, fit scoring, tier classification,
//! and the orchestrator that ranks every active lender for one application.
//!
//! Policies are data. Each [`LenderPolicy`] carries its rules, scoring weights and
//! normalization curves, and tier bands; the evaluators in [`evaluation`] interpret them.

pub mod batch;
pub mod catalog;
pub mod domain;
pub mod evaluation;
pub mod intake;
pub mod orchestrator;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use batch::{ApplicationCsvImporter, BatchImportError};
pub use catalog::{CatalogError, PolicyCatalog};
pub use domain::{
    Application, ApplicationId, ApplicationSubmission, BusinessId, DurationUnit, Eligibility,
    GuarantorId, MatchResultId, MatchingResult, NumericInput, PolicyId,
    REJECTION_REASON_SEPARATOR,
};
pub use evaluation::{
    assess, LenderPolicy, PolicyAssessment, PolicyConfigError, PolicySummary, TierBand,
};
pub use intake::{IntakeConfig, IntakeGuard, ValidationError};
pub use orchestrator::{
    sort_results, CancelOnDrop, CancellationFlag, MatchingError, MatchingOrchestrator,
    MatchingRun,
};
pub use repository::{MatchingRecord, PolicyRepository, RepositoryError, ResultStore};
pub use router::{
    matching_router, MatchingResponse, ResponseStatus, APPLICATION_ID_HEADER, ENGINE_UNAVAILABLE,
};
pub use service::{MatchingService, MatchingServiceError};
