use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identifier derived from the business name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessId(pub String);

/// Stable identifier derived from the personal guarantor name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuarantorId(pub String);

/// Lender policy number, as shown to borrowers ("Lender Policy #3").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyId(pub u32);

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a single (application, policy) result row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchResultId(pub String);

/// Unit a business duration is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    #[default]
    Months,
    Years,
}

impl DurationUnit {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "month" | "months" => Some(Self::Months),
            "year" | "years" => Some(Self::Years),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            DurationUnit::Months => "months",
            DurationUnit::Years => "years",
        }
    }

    pub fn to_months(self, value: f64) -> f64 {
        match self {
            DurationUnit::Months => value,
            DurationUnit::Years => value * 12.0,
        }
    }

    pub fn from_months(self, months: f64) -> f64 {
        match self {
            DurationUnit::Months => months,
            DurationUnit::Years => months / 12.0,
        }
    }
}

/// Numeric form input. Browsers post numbers, spreadsheet exports post strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
}

impl NumericInput {
    /// Finite numeric value, tolerating `$` prefixes and thousands separators in text.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            NumericInput::Number(value) => *value,
            NumericInput::Text(raw) => {
                let cleaned: String = raw
                    .trim()
                    .trim_start_matches('$')
                    .chars()
                    .filter(|ch| *ch != ',' && *ch != '_')
                    .collect();
                cleaned.parse::<f64>().ok()?
            }
        };

        value.is_finite().then_some(value)
    }
}

impl From<f64> for NumericInput {
    fn from(value: f64) -> Self {
        NumericInput::Number(value)
    }
}

/// Loan application exactly as posted by the intake form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub geographic_location: Option<String>,
    #[serde(default)]
    pub industry_type: Option<String>,
    #[serde(default)]
    pub revenue: Option<NumericInput>,
    #[serde(default)]
    pub equipment_type: Option<String>,
    #[serde(default)]
    pub business_duration: Option<NumericInput>,
    #[serde(default)]
    pub paynet_score: Option<NumericInput>,
    #[serde(default)]
    pub personal_guarantor_name: Option<String>,
    #[serde(default)]
    pub fico_score: Option<NumericInput>,
    #[serde(default)]
    pub trade_lines: Option<NumericInput>,
    #[serde(default)]
    pub credit_history_flags: Option<String>,
    #[serde(default)]
    pub loan_amount: Option<NumericInput>,
}

/// Validated, immutable application handed to the matching engine.
///
/// Credit fields stay optional: a missing value is reported by the rules that need it
/// instead of rejecting the whole application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub application_id: ApplicationId,
    pub business_id: BusinessId,
    pub business_name: String,
    pub geographic_location: Option<String>,
    pub industry_type: Option<String>,
    pub revenue: Option<f64>,
    pub equipment_type: Option<String>,
    pub business_duration_months: Option<f64>,
    pub paynet_score: Option<u8>,
    pub personal_guarantor_id: GuarantorId,
    pub personal_guarantor_name: String,
    pub fico_score: Option<u16>,
    pub trade_lines: Option<u32>,
    pub credit_history_flags: BTreeSet<String>,
    pub loan_amount: f64,
}

impl Application {
    /// Loan amount over annual revenue; undefined without positive revenue.
    pub fn loan_to_revenue(&self) -> Option<f64> {
        self.revenue
            .filter(|revenue| *revenue > 0.0)
            .map(|revenue| self.loan_amount / revenue)
    }
}

/// Canonical spelling for credit flags: lowercase words joined by underscores.
pub fn normalize_flag(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Split the comma-delimited flag field into a normalized set.
pub fn parse_credit_flags(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(normalize_flag)
        .filter(|flag| !flag.is_empty())
        .collect()
}

/// Binary eligibility on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Eligibility {
    Yes,
    No,
}

impl Eligibility {
    pub const fn from_eligible(eligible: bool) -> Self {
        if eligible {
            Eligibility::Yes
        } else {
            Eligibility::No
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Eligibility::Yes => "YES",
            Eligibility::No => "NO",
        }
    }
}

/// Separator for `rejection_reason`; clients split on the comma and trim.
pub const REJECTION_REASON_SEPARATOR: &str = ", ";

/// One lender's verdict for one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingResult {
    pub id: MatchResultId,
    pub eligibility: Eligibility,
    pub matching_tier: Option<String>,
    pub rejection_reason: Option<String>,
    pub fit_score: u8,
    pub lender_policy_id: PolicyId,
    pub lender_name: String,
    pub business_name: String,
    pub personal_guarantor_name: String,
    pub business_id: BusinessId,
    pub personal_guarantor_id: GuarantorId,
}

impl MatchingResult {
    pub fn is_eligible(&self) -> bool {
        self.eligibility == Eligibility::Yes
    }

    /// Individual reasons, split the same way the intake client splits them.
    pub fn rejection_reasons(&self) -> Vec<&str> {
        self.rejection_reason
            .as_deref()
            .map(|joined| {
                joined
                    .split(',')
                    .map(str::trim)
                    .filter(|reason| !reason.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}
