use crate::commands::render_results;
use crate::infra::build_service;
use clap::Args;
use lender_match::error::AppError;
use lender_match::workflows::matching::{
    assess, ApplicationSubmission, IntakeConfig, NumericInput, PolicyCatalog,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Show the weighted score breakdown for each application's top lender
    #[arg(long)]
    pub(crate) breakdown: bool,
}

struct SampleApplicant {
    business_name: &'static str,
    guarantor: &'static str,
    location: &'static str,
    industry: &'static str,
    equipment: &'static str,
    revenue: f64,
    duration_months: f64,
    paynet: f64,
    fico: f64,
    trade_lines: f64,
    flags: &'static str,
    loan_amount: f64,
}

impl SampleApplicant {
    fn submission(&self) -> ApplicationSubmission {
        ApplicationSubmission {
            business_name: Some(self.business_name.to_string()),
            geographic_location: Some(self.location.to_string()),
            industry_type: Some(self.industry.to_string()),
            revenue: Some(NumericInput::from(self.revenue)),
            equipment_type: Some(self.equipment.to_string()),
            business_duration: Some(NumericInput::from(self.duration_months)),
            paynet_score: Some(NumericInput::from(self.paynet)),
            personal_guarantor_name: Some(self.guarantor.to_string()),
            fico_score: Some(NumericInput::from(self.fico)),
            trade_lines: Some(NumericInput::from(self.trade_lines)),
            credit_history_flags: Some(self.flags.to_string()),
            loan_amount: Some(NumericInput::from(self.loan_amount)),
        }
    }
}

const SAMPLES: [SampleApplicant; 3] = [
    SampleApplicant {
        business_name: "Lone Star Haulers LLC",
        guarantor: "Dana Ortiz",
        location: "TX",
        industry: "Transportation",
        equipment: "Class 8 Truck",
        revenue: 2_400_000.0,
        duration_months: 84.0,
        paynet: 78.0,
        fico: 762.0,
        trade_lines: 11.0,
        flags: "",
        loan_amount: 310_000.0,
    },
    SampleApplicant {
        business_name: "Bayou Bakery",
        guarantor: "Sam Lee",
        location: "LA",
        industry: "Food Service",
        equipment: "Commercial Oven",
        revenue: 260_000.0,
        duration_months: 14.0,
        paynet: 55.0,
        fico: 668.0,
        trade_lines: 3.0,
        flags: "late payments",
        loan_amount: 45_000.0,
    },
    SampleApplicant {
        business_name: "Riverbend Grow Co",
        guarantor: "Alex Kim",
        location: "CO",
        industry: "Cannabis",
        equipment: "Greenhouse System",
        revenue: 900_000.0,
        duration_months: 30.0,
        paynet: 61.0,
        fico: 604.0,
        trade_lines: 4.0,
        flags: "tax lien",
        loan_amount: 520_000.0,
    },
];

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = build_service(None, IntakeConfig::default())?;
    let policies = PolicyCatalog::standard()?;

    println!("Lender matching demo ({} lenders)", policies.len());

    for sample in &SAMPLES {
        let record = service.submit(sample.submission())?;
        println!(
            "\n{} | FICO {} | PayNet {} | ${} requested",
            record.application.business_name, sample.fico, sample.paynet, sample.loan_amount
        );
        println!(
            "{} of {} lenders eligible",
            record.eligible_count(),
            record.results.len()
        );
        render_results(&record.results);

        if !args.breakdown {
            continue;
        }
        let Some(top) = record.results.first() else {
            continue;
        };
        let Some(policy) = policies
            .iter()
            .find(|policy| policy.id == top.lender_policy_id)
        else {
            continue;
        };

        println!("  Score breakdown for {}:", policy.name);
        for component in assess(&record.application, policy).components {
            println!(
                "    {:<18} raw {:>12} -> {:>5.1} x {:.2} = {:>5.1}",
                component.factor.label(),
                component
                    .raw_value
                    .map(|value| format!("{value:.2}"))
                    .unwrap_or_else(|| "missing".to_string()),
                component.normalized,
                component.weight,
                component.weighted
            );
        }
    }

    Ok(())
}
