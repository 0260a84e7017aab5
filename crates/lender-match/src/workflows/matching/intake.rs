use super::domain::{
    parse_credit_flags, Application, ApplicationId, ApplicationSubmission, BusinessId,
    DurationUnit, GuarantorId, NumericInput,
};

/// Validation errors raised while accepting a submission.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
    #[error("{field} must be a number (received '{raw}')")]
    NotNumeric { field: &'static str, raw: String },
    #[error("{field} must be between {min} and {max} (found {found})")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        found: f64,
    },
    #[error("{field} must be a whole number (found {found})")]
    NotWholeNumber { field: &'static str, found: f64 },
    #[error("{field} must not be negative (found {found})")]
    Negative { field: &'static str, found: f64 },
    #[error("loan_amount must be greater than zero (found {found})")]
    NonPositiveLoanAmount { found: f64 },
}

/// Intake dials supplied by service configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntakeConfig {
    pub submitted_duration_unit: DurationUnit,
}

const FICO_RANGE: (f64, f64) = (300.0, 850.0);
const PAYNET_RANGE: (f64, f64) = (0.0, 100.0);

/// Guard responsible for producing `Application` instances.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard {
    config: IntakeConfig,
}

impl IntakeGuard {
    pub fn new(config: IntakeConfig) -> Self {
        Self { config }
    }

    /// Convert an inbound submission into a validated application.
    ///
    /// Unparseable optional numbers become "missing" so rules can explain them; values that
    /// parse but sit outside their domain are rejected outright.
    pub fn application_from_submission(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<Application, ValidationError> {
        let business_name = required_text("business_name", submission.business_name)?;
        let personal_guarantor_name =
            required_text("personal_guarantor_name", submission.personal_guarantor_name)?;

        let loan_amount = match submission.loan_amount {
            None => return Err(ValidationError::MissingField { field: "loan_amount" }),
            Some(input) => input.as_f64().ok_or_else(|| ValidationError::NotNumeric {
                field: "loan_amount",
                raw: raw_text(&input),
            })?,
        };
        if loan_amount <= 0.0 {
            return Err(ValidationError::NonPositiveLoanAmount { found: loan_amount });
        }

        let fico_score = optional_number(submission.fico_score.as_ref())
            .map(|value| whole_in_range("fico_score", value, FICO_RANGE))
            .transpose()?
            .map(|value| value as u16);

        let paynet_score = optional_number(submission.paynet_score.as_ref())
            .map(|value| whole_in_range("paynet_score", value, PAYNET_RANGE))
            .transpose()?
            .map(|value| value as u8);

        let trade_lines = optional_number(submission.trade_lines.as_ref())
            .map(|value| whole_in_range("trade_lines", value, (0.0, u32::MAX as f64)))
            .transpose()?
            .map(|value| value as u32);

        let revenue = optional_number(submission.revenue.as_ref())
            .map(|value| non_negative("revenue", value))
            .transpose()?;

        let business_duration_months = optional_number(submission.business_duration.as_ref())
            .map(|value| non_negative("business_duration", value))
            .transpose()?
            .map(|value| self.config.submitted_duration_unit.to_months(value));

        let credit_history_flags = submission
            .credit_history_flags
            .as_deref()
            .map(parse_credit_flags)
            .unwrap_or_default();

        Ok(Application {
            application_id: ApplicationId("pending".to_string()),
            business_id: BusinessId(format!("biz-{}", slug(&business_name))),
            business_name,
            geographic_location: optional_text(submission.geographic_location),
            industry_type: optional_text(submission.industry_type),
            revenue,
            equipment_type: optional_text(submission.equipment_type),
            business_duration_months,
            paynet_score,
            personal_guarantor_id: GuarantorId(format!("pg-{}", slug(&personal_guarantor_name))),
            personal_guarantor_name,
            fico_score,
            trade_lines,
            credit_history_flags,
            loan_amount,
        })
    }
}

fn required_text(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    optional_text(value).ok_or(ValidationError::MissingField { field })
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn optional_number(input: Option<&NumericInput>) -> Option<f64> {
    input.and_then(NumericInput::as_f64)
}

fn raw_text(input: &NumericInput) -> String {
    match input {
        NumericInput::Number(value) => value.to_string(),
        NumericInput::Text(raw) => raw.clone(),
    }
}

fn whole_in_range(
    field: &'static str,
    value: f64,
    (min, max): (f64, f64),
) -> Result<f64, ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            found: value,
        });
    }
    if value.fract() != 0.0 {
        return Err(ValidationError::NotWholeNumber { field, found: value });
    }
    Ok(value)
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value < 0.0 {
        return Err(ValidationError::Negative {
            field,
            found: value,
        });
    }
    Ok(value)
}

fn slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}
