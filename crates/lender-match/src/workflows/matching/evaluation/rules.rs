use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use super::super::domain::{normalize_flag, Application, DurationUnit, PolicyId};
use super::policy::{LenderPolicy, PolicyConfigError};

/// Numeric application fields a rule or scoring factor can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    FicoScore,
    PaynetScore,
    Revenue,
    BusinessDuration,
    TradeLines,
    LoanAmount,
    LoanToRevenue,
}

impl NumericField {
    pub const fn label(self) -> &'static str {
        match self {
            NumericField::FicoScore => "fico_score",
            NumericField::PaynetScore => "paynet_score",
            NumericField::Revenue => "revenue",
            NumericField::BusinessDuration => "business_duration",
            NumericField::TradeLines => "trade_lines",
            NumericField::LoanAmount => "loan_amount",
            NumericField::LoanToRevenue => "loan_to_revenue",
        }
    }

    /// Value in the policy's units; `None` when the applicant left it out.
    pub fn read(self, application: &Application, duration_unit: DurationUnit) -> Option<f64> {
        match self {
            NumericField::FicoScore => application.fico_score.map(f64::from),
            NumericField::PaynetScore => application.paynet_score.map(f64::from),
            NumericField::Revenue => application.revenue,
            NumericField::BusinessDuration => application
                .business_duration_months
                .map(|months| duration_unit.from_months(months)),
            NumericField::TradeLines => application.trade_lines.map(f64::from),
            NumericField::LoanAmount => Some(application.loan_amount),
            NumericField::LoanToRevenue => application.loan_to_revenue(),
        }
    }
}

/// Enum-like text fields matched against lender allow/deny lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    IndustryType,
    GeographicLocation,
    EquipmentType,
}

impl TextField {
    pub const fn label(self) -> &'static str {
        match self {
            TextField::IndustryType => "industry_type",
            TextField::GeographicLocation => "geographic_location",
            TextField::EquipmentType => "equipment_type",
        }
    }

    pub fn read(self, application: &Application) -> Option<&str> {
        match self {
            TextField::IndustryType => application.industry_type.as_deref(),
            TextField::GeographicLocation => application.geographic_location.as_deref(),
            TextField::EquipmentType => application.equipment_type.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Gte,
    Lte,
    Gt,
    Lt,
    Eq,
}

impl Comparator {
    pub fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparator::Gte => value >= threshold,
            Comparator::Lte => value <= threshold,
            Comparator::Gt => value > threshold,
            Comparator::Lt => value < threshold,
            Comparator::Eq => value == threshold,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Comparator::Gte => ">=",
            Comparator::Lte => "<=",
            Comparator::Gt => ">",
            Comparator::Lt => "<",
            Comparator::Eq => "==",
        }
    }
}

/// Data-driven rule predicate interpreted by [`evaluate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    Numeric {
        field: NumericField,
        comparator: Comparator,
        threshold: f64,
    },
    /// Fails when any application credit flag is in the disqualifying set.
    ExcludesFlags { flags: BTreeSet<String> },
    /// Passes only when the field matches one of the values (case-insensitive).
    AllowList {
        field: TextField,
        values: BTreeSet<String>,
    },
    /// Fails when the field matches one of the values (case-insensitive).
    DenyList {
        field: TextField,
        values: BTreeSet<String>,
    },
}

/// A predicate plus the borrower-facing message used when it fails.
///
/// Message placeholders: `{field}`, `{value}`, `{threshold}`, `{flags}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub predicate: Predicate,
    pub message: String,
}

/// Aggregate verdict of a policy's rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleVerdict {
    pub eligible: bool,
    pub failed_reasons: Vec<String>,
}

/// Check every rule of the policy, collecting all failures in declaration order.
pub fn evaluate(application: &Application, policy: &LenderPolicy) -> RuleVerdict {
    let failed_reasons: Vec<String> = policy
        .rules
        .iter()
        .filter_map(|rule| check_rule(rule, application, policy.duration_unit))
        .collect();

    RuleVerdict {
        eligible: failed_reasons.is_empty(),
        failed_reasons,
    }
}

/// `None` when the rule passes, otherwise the rendered rejection message.
fn check_rule(rule: &Rule, application: &Application, unit: DurationUnit) -> Option<String> {
    match &rule.predicate {
        Predicate::Numeric {
            field,
            comparator,
            threshold,
        } => {
            let Some(value) = field.read(application, unit) else {
                return Some(missing_data(field.label()));
            };
            if comparator.holds(value, *threshold) {
                return None;
            }
            Some(render(
                &rule.message,
                field.label(),
                &format_number(value),
                &format_number(*threshold),
                "",
            ))
        }
        Predicate::ExcludesFlags { flags } => {
            let disqualifying: HashSet<String> =
                flags.iter().map(|flag| normalize_flag(flag)).collect();
            let hits: Vec<&str> = application
                .credit_history_flags
                .iter()
                .filter(|flag| disqualifying.contains(flag.as_str()))
                .map(String::as_str)
                .collect();
            if hits.is_empty() {
                return None;
            }
            let hits = join_values(hits.iter().copied());
            Some(render(
                &rule.message,
                "credit_history_flags",
                &hits,
                &join_values(flags.iter().map(String::as_str)),
                &hits,
            ))
        }
        Predicate::AllowList { field, values } => {
            let Some(value) = field.read(application) else {
                return Some(missing_data(field.label()));
            };
            if contains_ignore_case(values, value) {
                return None;
            }
            Some(render(
                &rule.message,
                field.label(),
                value,
                &join_values(values.iter().map(String::as_str)),
                "",
            ))
        }
        Predicate::DenyList { field, values } => {
            let value = field.read(application)?;
            if !contains_ignore_case(values, value) {
                return None;
            }
            Some(render(
                &rule.message,
                field.label(),
                value,
                &join_values(values.iter().map(String::as_str)),
                "",
            ))
        }
    }
}

fn missing_data(field: &str) -> String {
    format!("missing data: field {field}")
}

fn contains_ignore_case(values: &BTreeSet<String>, candidate: &str) -> bool {
    let candidate = candidate.trim().to_lowercase();
    values
        .iter()
        .any(|value| value.trim().to_lowercase() == candidate)
}

/// Fill placeholders; substituted text may not introduce commas into the joined reason.
fn render(template: &str, field: &str, value: &str, threshold: &str, flags: &str) -> String {
    template
        .replace("{field}", &strip_commas(field))
        .replace("{value}", &strip_commas(value))
        .replace("{threshold}", &strip_commas(threshold))
        .replace("{flags}", &strip_commas(flags))
}

fn strip_commas(text: &str) -> String {
    text.replace(',', " ")
}

fn join_values<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values.collect::<Vec<_>>().join(" / ")
}

/// Whole numbers print without decimals; everything else with two.
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value:.2}")
    }
}

pub(crate) fn validate_rules(policy: PolicyId, rules: &[Rule]) -> Result<(), PolicyConfigError> {
    let mut seen = HashSet::new();

    for rule in rules {
        if rule.id.trim().is_empty() {
            return Err(PolicyConfigError::EmptyRuleId { policy });
        }
        if !seen.insert(rule.id.as_str()) {
            return Err(PolicyConfigError::DuplicateRule {
                policy,
                rule: rule.id.clone(),
            });
        }
        if rule.message.trim().is_empty() {
            return Err(PolicyConfigError::EmptyMessage {
                policy,
                rule: rule.id.clone(),
            });
        }
        if rule.message.contains(',') {
            return Err(PolicyConfigError::CommaInMessage {
                policy,
                rule: rule.id.clone(),
            });
        }

        match &rule.predicate {
            Predicate::Numeric { threshold, .. } if !threshold.is_finite() => {
                return Err(PolicyConfigError::NonFiniteThreshold {
                    policy,
                    rule: rule.id.clone(),
                });
            }
            Predicate::ExcludesFlags { flags: values }
            | Predicate::AllowList { values, .. }
            | Predicate::DenyList { values, .. }
                if values.iter().all(|value| value.trim().is_empty()) =>
            {
                return Err(PolicyConfigError::EmptyValueSet {
                    policy,
                    rule: rule.id.clone(),
                });
            }
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparators_use_exact_semantics() {
        assert!(Comparator::Gte.holds(650.0, 650.0));
        assert!(!Comparator::Gt.holds(650.0, 650.0));
        assert!(Comparator::Lte.holds(0.5, 0.5));
        assert!(!Comparator::Lt.holds(0.5, 0.5));
        assert!(Comparator::Eq.holds(3.0, 3.0));
        assert!(!Comparator::Eq.holds(3.0, 3.0000001));
    }

    #[test]
    fn render_strips_commas_from_substitutions() {
        let rendered = render(
            "{field} value {value} outside {threshold}",
            "industry_type",
            "Construction, Heavy",
            "Trucking / Retail",
            "",
        );
        assert_eq!(
            rendered,
            "industry_type value Construction  Heavy outside Trucking / Retail"
        );
    }

    #[test]
    fn numbers_format_without_separators() {
        assert_eq!(format_number(1_250_000.0), "1250000");
        assert_eq!(format_number(0.4), "0.40");
        assert_eq!(format_number(650.0), "650");
    }
}
