use crate::infra::{build_cli_service, parse_duration_unit};
use clap::Args;
use lender_match::error::AppError;
use lender_match::workflows::matching::{
    ApplicationCsvImporter, ApplicationSubmission, DurationUnit, MatchingResult,
    MatchingServiceError, NumericInput, PolicyCatalog,
};
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct MatchArgs {
    /// JSON file holding one application in the intake form shape
    #[arg(long, conflicts_with = "business_name")]
    pub(crate) file: Option<PathBuf>,
    #[arg(long)]
    pub(crate) business_name: Option<String>,
    #[arg(long)]
    pub(crate) personal_guarantor_name: Option<String>,
    #[arg(long)]
    pub(crate) loan_amount: Option<f64>,
    #[arg(long)]
    pub(crate) fico_score: Option<f64>,
    #[arg(long)]
    pub(crate) paynet_score: Option<f64>,
    #[arg(long)]
    pub(crate) revenue: Option<f64>,
    /// Time in business, in the submitted duration unit
    #[arg(long)]
    pub(crate) business_duration: Option<f64>,
    #[arg(long)]
    pub(crate) trade_lines: Option<f64>,
    #[arg(long)]
    pub(crate) industry_type: Option<String>,
    #[arg(long)]
    pub(crate) geographic_location: Option<String>,
    #[arg(long)]
    pub(crate) equipment_type: Option<String>,
    /// Comma-separated credit history flags, e.g. "bankruptcy, tax lien"
    #[arg(long)]
    pub(crate) credit_history_flags: Option<String>,
    #[command(flatten)]
    pub(crate) engine: EngineArgs,
    /// Print the response envelope as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// CSV export with one application per row
    pub(crate) csv: PathBuf,
    #[command(flatten)]
    pub(crate) engine: EngineArgs,
    /// Only print the top-ranked lender for each application
    #[arg(long)]
    pub(crate) top: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct PoliciesArgs {
    /// JSON lender policy catalog to validate (defaults to the bundled catalog)
    #[arg(long)]
    pub(crate) policy_file: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct EngineArgs {
    /// JSON lender policy catalog (defaults to APP_POLICY_FILE, then the bundled catalog)
    #[arg(long)]
    pub(crate) policy_file: Option<PathBuf>,
    /// Unit of submitted business_duration values (months or years)
    #[arg(long, value_parser = parse_duration_unit)]
    pub(crate) duration_unit: Option<DurationUnit>,
}

pub(crate) fn run_match(args: MatchArgs) -> Result<(), AppError> {
    let service = build_cli_service(
        args.engine.policy_file.as_deref(),
        args.engine.duration_unit,
    )?;
    let json = args.json;
    let submission = submission_from_args(args)?;

    let record = service.submit(submission)?;

    if json {
        let envelope = serde_json::json!({
            "status": "success",
            "message": "",
            "data": record.results,
        });
        println!("{envelope:#}");
    } else {
        println!(
            "Application {} | {} | guarantor {}",
            record.application_id(),
            record.application.business_name,
            record.application.personal_guarantor_name
        );
        render_results(&record.results);
    }

    Ok(())
}

pub(crate) fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let service = build_cli_service(
        args.engine.policy_file.as_deref(),
        args.engine.duration_unit,
    )?;
    let submissions = ApplicationCsvImporter::from_path(&args.csv)?;

    println!("Matching {} applications from {}", submissions.len(), args.csv.display());

    let mut rejected = 0usize;
    for (row, submission) in submissions.into_iter().enumerate() {
        let label = submission
            .business_name
            .clone()
            .unwrap_or_else(|| format!("row {}", row + 1));

        match service.submit(submission) {
            Ok(record) => {
                println!(
                    "\n{} ({}) - {} of {} lenders eligible",
                    label,
                    record.application_id(),
                    record.eligible_count(),
                    record.results.len()
                );
                if args.top {
                    render_results(&record.results[..record.results.len().min(1)]);
                } else {
                    render_results(&record.results);
                }
            }
            Err(MatchingServiceError::Validation(error)) => {
                rejected += 1;
                println!("\n{label} - skipped: {error}");
            }
            Err(other) => return Err(other.into()),
        }
    }

    if rejected > 0 {
        println!("\n{rejected} row(s) failed validation");
    }

    Ok(())
}

pub(crate) fn run_policies(args: PoliciesArgs) -> Result<(), AppError> {
    let policies = PolicyCatalog::load(args.policy_file.as_deref())?;

    println!("{} lender policies (all valid)", policies.len());
    for policy in &policies {
        let summary = policy.summary();
        println!(
            "- #{} {}{} | {} rules | {} scoring factors | tiers: {}{}",
            summary.id,
            summary.name,
            if policy.active { "" } else { " (inactive)" },
            summary.rule_count,
            policy.scoring.len(),
            summary.tiers.join(" > "),
            summary
                .minimum_fit_score
                .map(|minimum| format!(" | minimum fit score {minimum}"))
                .unwrap_or_default()
        );
    }

    Ok(())
}

fn submission_from_args(args: MatchArgs) -> Result<ApplicationSubmission, AppError> {
    if let Some(path) = args.file {
        let raw = std::fs::read_to_string(&path)?;
        return serde_json::from_str(&raw).map_err(|err| {
            AppError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{} is not a valid application: {err}", path.display()),
            ))
        });
    }

    Ok(ApplicationSubmission {
        business_name: args.business_name,
        geographic_location: args.geographic_location,
        industry_type: args.industry_type,
        revenue: args.revenue.map(NumericInput::from),
        equipment_type: args.equipment_type,
        business_duration: args.business_duration.map(NumericInput::from),
        paynet_score: args.paynet_score.map(NumericInput::from),
        personal_guarantor_name: args.personal_guarantor_name,
        fico_score: args.fico_score.map(NumericInput::from),
        trade_lines: args.trade_lines.map(NumericInput::from),
        credit_history_flags: args.credit_history_flags,
        loan_amount: args.loan_amount.map(NumericInput::from),
    })
}

pub(crate) fn render_results(results: &[MatchingResult]) {
    for (rank, result) in results.iter().enumerate() {
        println!(
            "  {:>2}. {:<32} {:>3} | {:<3} | {}",
            rank + 1,
            format!("#{} {}", result.lender_policy_id, result.lender_name),
            result.fit_score,
            result.eligibility.label(),
            result.matching_tier.as_deref().unwrap_or("-"),
        );
        for reason in result.rejection_reasons() {
            println!("        - {reason}");
        }
    }
}
