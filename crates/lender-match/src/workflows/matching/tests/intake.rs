use super::common::*;

use crate::workflows::matching::domain::{DurationUnit, NumericInput};
use crate::workflows::matching::intake::{IntakeConfig, IntakeGuard, ValidationError};

fn guard() -> IntakeGuard {
    IntakeGuard::default()
}

#[test]
fn submission_becomes_an_application() {
    let application = guard()
        .application_from_submission(submission())
        .expect("valid submission");

    assert_eq!(application.business_id.0, "biz-lone-star-haulers");
    assert_eq!(application.personal_guarantor_id.0, "pg-dana-ortiz");
    assert_eq!(application.revenue, Some(1_250_000.0));
    assert_eq!(application.trade_lines, Some(8));
    assert_eq!(application.fico_score, Some(720));
    assert_eq!(application.business_duration_months, Some(48.0));
    assert!(application.credit_history_flags.is_empty());
}

#[test]
fn business_and_guarantor_names_are_required() {
    let mut blank_business = submission();
    blank_business.business_name = Some("   ".to_string());
    assert_eq!(
        guard().application_from_submission(blank_business),
        Err(ValidationError::MissingField {
            field: "business_name"
        })
    );

    let mut no_guarantor = submission();
    no_guarantor.personal_guarantor_name = None;
    assert_eq!(
        guard().application_from_submission(no_guarantor),
        Err(ValidationError::MissingField {
            field: "personal_guarantor_name"
        })
    );
}

#[test]
fn loan_amount_must_be_positive_and_numeric() {
    let mut zero = submission();
    zero.loan_amount = Some(NumericInput::Number(0.0));
    assert!(matches!(
        guard().application_from_submission(zero),
        Err(ValidationError::NonPositiveLoanAmount { .. })
    ));

    let mut garbled = submission();
    garbled.loan_amount = Some(NumericInput::Text("lots".to_string()));
    assert!(matches!(
        guard().application_from_submission(garbled),
        Err(ValidationError::NotNumeric {
            field: "loan_amount",
            ..
        })
    ));

    let mut missing = submission();
    missing.loan_amount = None;
    assert!(matches!(
        guard().application_from_submission(missing),
        Err(ValidationError::MissingField {
            field: "loan_amount"
        })
    ));
}

#[test]
fn credit_scores_outside_their_domain_are_rejected() {
    let mut fico = submission();
    fico.fico_score = Some(NumericInput::Number(900.0));
    assert!(matches!(
        guard().application_from_submission(fico),
        Err(ValidationError::OutOfRange {
            field: "fico_score",
            ..
        })
    ));

    let mut paynet = submission();
    paynet.paynet_score = Some(NumericInput::Number(72.5));
    assert!(matches!(
        guard().application_from_submission(paynet),
        Err(ValidationError::NotWholeNumber {
            field: "paynet_score",
            ..
        })
    ));

    let mut revenue = submission();
    revenue.revenue = Some(NumericInput::Number(-1.0));
    assert!(matches!(
        guard().application_from_submission(revenue),
        Err(ValidationError::Negative {
            field: "revenue",
            ..
        })
    ));
}

#[test]
fn unparseable_optional_numbers_become_missing() {
    let mut submission = submission();
    submission.fico_score = Some(NumericInput::Text("n/a".to_string()));
    submission.paynet_score = None;

    let application = guard()
        .application_from_submission(submission)
        .expect("optional fields may be blank");

    assert_eq!(application.fico_score, None);
    assert_eq!(application.paynet_score, None);
}

#[test]
fn submitted_duration_unit_is_configurable() {
    let guard = IntakeGuard::new(IntakeConfig {
        submitted_duration_unit: DurationUnit::Years,
    });
    let mut submission = submission();
    submission.business_duration = Some(NumericInput::Number(4.0));

    let application = guard
        .application_from_submission(submission)
        .expect("valid submission");

    assert_eq!(application.business_duration_months, Some(48.0));
}

#[test]
fn credit_flags_are_split_and_normalized() {
    let mut submission = submission();
    submission.credit_history_flags = Some("Bankruptcy,  Tax Lien ,".to_string());

    let application = guard()
        .application_from_submission(submission)
        .expect("valid submission");

    let flags: Vec<&str> = application
        .credit_history_flags
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(flags, vec!["bankruptcy", "tax_lien"]);
}
