//! End-to-end matching scenarios against the bundled lender catalog.
//!
//! Everything goes through the public service facade, CSV importer, and HTTP router.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use lender_match::workflows::matching::{
        ApplicationId, ApplicationSubmission, IntakeConfig, LenderPolicy, MatchingRecord,
        MatchingService, NumericInput, PolicyCatalog, PolicyRepository, RepositoryError,
        ResultStore,
    };

    pub(super) struct CatalogPolicies(pub(super) Vec<Arc<LenderPolicy>>);

    impl PolicyRepository for CatalogPolicies {
        fn active_policies(&self) -> Result<Vec<Arc<LenderPolicy>>, RepositoryError> {
            Ok(self.0.iter().filter(|policy| policy.active).cloned().collect())
        }
    }

    #[derive(Default)]
    pub(super) struct MemoryResults {
        records: Mutex<HashMap<ApplicationId, MatchingRecord>>,
    }

    impl ResultStore for MemoryResults {
        fn store(&self, record: MatchingRecord) -> Result<(), RepositoryError> {
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

    pub(super) fn service() -> MatchingService<CatalogPolicies, MemoryResults> {
        let policies = PolicyCatalog::standard()
            .expect("standard catalog")
            .into_iter()
            .map(Arc::new)
            .collect();
        MatchingService::new(
            Arc::new(CatalogPolicies(policies)),
            Arc::new(MemoryResults::default()),
            IntakeConfig::default(),
        )
    }

    pub(super) fn established_hauler() -> ApplicationSubmission {
        ApplicationSubmission {
            business_name: Some("Lone Star Haulers LLC".to_string()),
            geographic_location: Some("TX".to_string()),
            industry_type: Some("Transportation".to_string()),
            revenue: Some(NumericInput::Text("$2,400,000".to_string())),
            equipment_type: Some("Class 8 Truck".to_string()),
            business_duration: Some(NumericInput::Number(84.0)),
            paynet_score: Some(NumericInput::Number(78.0)),
            personal_guarantor_name: Some("Dana Ortiz".to_string()),
            fico_score: Some(NumericInput::Number(762.0)),
            trade_lines: Some(NumericInput::Number(11.0)),
            credit_history_flags: Some(String::new()),
            loan_amount: Some(NumericInput::Number(310_000.0)),
        }
    }

    pub(super) fn distressed_grower() -> ApplicationSubmission {
        ApplicationSubmission {
            business_name: Some("Riverbend Grow Co".to_string()),
            geographic_location: Some("CO".to_string()),
            industry_type: Some("Cannabis".to_string()),
            revenue: Some(NumericInput::Number(900_000.0)),
            equipment_type: Some("Greenhouse System".to_string()),
            business_duration: Some(NumericInput::Number(30.0)),
            paynet_score: Some(NumericInput::Number(61.0)),
            personal_guarantor_name: Some("Alex Kim".to_string()),
            fico_score: Some(NumericInput::Number(604.0)),
            trade_lines: Some(NumericInput::Number(4.0)),
            credit_history_flags: Some("Tax Lien".to_string()),
            loan_amount: Some(NumericInput::Number(520_000.0)),
        }
    }
}

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::*;
use lender_match::workflows::matching::{
    matching_router, ApplicationCsvImporter, Eligibility, PolicyCatalog, PolicyId,
};
use tower::ServiceExt;

#[test]
fn established_applicant_is_ranked_across_every_lender() {
    let service = service();

    let record = service
        .submit(established_hauler())
        .expect("submission matches");

    assert_eq!(record.results.len(), 4);
    assert_eq!(record.eligible_count(), 3);
    assert!(record
        .results
        .windows(2)
        .all(|pair| pair[0].fit_score >= pair[1].fit_score));

    let summit = record
        .results
        .iter()
        .find(|result| result.lender_policy_id == PolicyId(3))
        .expect("startup lender evaluated");
    assert_eq!(summit.eligibility, Eligibility::No);
    assert_eq!(
        summit.rejection_reason.as_deref(),
        Some("Requested amount $310000 exceeds the $150000 program limit")
    );

    for result in record.results.iter().filter(|result| result.is_eligible()) {
        assert!(result.matching_tier.is_some());
        assert!(result.rejection_reason.is_none());
    }
}

#[test]
fn distressed_applicant_is_declined_everywhere_with_reasons() {
    let service = service();

    let record = service
        .submit(distressed_grower())
        .expect("submission matches");

    assert_eq!(record.eligible_count(), 0);
    for result in &record.results {
        assert_eq!(result.matching_tier, None);
        assert!(!result.rejection_reasons().is_empty());
    }

    let apex = record
        .results
        .iter()
        .find(|result| result.lender_policy_id == PolicyId(1))
        .expect("prime lender evaluated");
    let reasons = apex.rejection_reasons();
    assert!(reasons.len() >= 4);
    assert!(reasons.contains(&"Credit history shows disqualifying items: tax_lien"));
}

#[test]
fn resubmitting_produces_the_same_ranking() {
    let service = service();

    let first = service.submit(established_hauler()).expect("first run");
    let second = service.submit(established_hauler()).expect("second run");

    let ranking = |record: &lender_match::workflows::matching::MatchingRecord| {
        record
            .results
            .iter()
            .map(|result| (result.lender_policy_id, result.fit_score, result.eligibility))
            .collect::<Vec<_>>()
    };
    assert_eq!(ranking(&first), ranking(&second));
    assert_eq!(
        first.results[0].business_id,
        second.results[0].business_id
    );
}

#[test]
fn csv_batches_run_through_the_service() {
    let csv = "\
business_name,personal_guarantor_name,fico_score,paynet_score,revenue,business_duration,trade_lines,loan_amount,industry_type,geographic_location,equipment_type,credit_history_flags
Lone Star Haulers LLC,Dana Ortiz,762,78,\"2,400,000\",84,11,310000,Transportation,TX,Class 8 Truck,
,Nobody,700,70,100000,12,3,50000,Retail,TX,Forklift,
";

    let submissions = ApplicationCsvImporter::from_reader(csv.as_bytes()).expect("csv parses");
    assert_eq!(submissions.len(), 2);

    let service = service();
    let mut outcomes = submissions
        .into_iter()
        .map(|submission| service.submit(submission));

    let first = outcomes
        .next()
        .expect("first row")
        .expect("first row matches");
    assert_eq!(first.eligible_count(), 3);

    let second = outcomes.next().expect("second row");
    assert!(second.is_err(), "row without a business name is rejected");
}

#[test]
fn policy_catalog_loads_from_a_file() {
    let policies = PolicyCatalog::standard().expect("standard catalog");
    let path = std::env::temp_dir().join(format!(
        "lender-match-catalog-{}.json",
        std::process::id()
    ));
    std::fs::write(
        &path,
        serde_json::to_vec(&policies[..2]).expect("serialize catalog"),
    )
    .expect("write catalog");

    let loaded = PolicyCatalog::from_path(&path).expect("catalog loads");
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[1].name, "Heartland Equipment Finance");
}

#[tokio::test]
async fn http_round_trip_returns_the_wire_contract() {
    let router = matching_router(Arc::new(service()));
    let body = serde_json::json!({
        "business_name": "Lone Star Haulers LLC",
        "geographic_location": "TX",
        "industry_type": "Transportation",
        "revenue": "2400000",
        "equipment_type": "Class 8 Truck",
        "business_duration": "84",
        "paynet_score": "78",
        "personal_guarantor_name": "Dana Ortiz",
        "fico_score": "762",
        "trade_lines": "11",
        "credit_history_flags": "",
        "loan_amount": "310000"
    });

    let response = router
        .oneshot(
            Request::post("/api/v1/matching-engine")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let payload: serde_json::Value = serde_json::from_slice(&bytes).expect("json payload");

    assert_eq!(payload["status"], "success");
    let first = &payload["data"][0];
    for field in [
        "id",
        "eligibility",
        "matching_tier",
        "rejection_reason",
        "fit_score",
        "lender_policy_id",
        "business_name",
        "personal_guarantor_name",
        "business_id",
        "personal_guarantor_id",
    ] {
        assert!(first.get(field).is_some(), "missing wire field {field}");
    }
    assert_eq!(first["business_name"], "Lone Star Haulers LLC");
}
