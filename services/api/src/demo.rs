use crate::infra::{parse_amount, Desk};
use chrono::NaiveDate;
use clap::Args;
use loan_origination::error::AppError;
use loan_origination::workflows::origination::emi::{self, EmiQuote, Installment};
use loan_origination::workflows::origination::{
    ApplicationStatus, ApplicationWizard, DocumentCategory, EmploymentDetails, EmploymentType,
    FileUpload, LoanApplication, LoanRequest, Notification, PersonalDetails, Role, SanctionLetter,
    Session, WizardStep, ANNUAL_RATE_PCT,
};
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct EmiArgs {
    /// Principal amount (grouping separators allowed, e.g. 50,000)
    #[arg(long, value_parser = parse_amount)]
    pub(crate) principal: u64,
    /// Tenure in months
    #[arg(long)]
    pub(crate) tenure: u32,
    /// Annual interest rate in percent
    #[arg(long, default_value_t = ANNUAL_RATE_PCT)]
    pub(crate) rate: f64,
    /// Print the month-by-month repayment schedule
    #[arg(long)]
    pub(crate) schedule: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Requested loan amount
    #[arg(long, value_parser = parse_amount, default_value = "20000")]
    pub(crate) amount: u64,
    /// Requested tenure in months
    #[arg(long, default_value_t = 24)]
    pub(crate) tenure: u32,
    /// Stated purpose of the loan
    #[arg(long, default_value = "Education")]
    pub(crate) purpose: String,
    /// Stop after submission instead of running the reviewer decision
    #[arg(long)]
    pub(crate) skip_review: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ExportArgs {
    /// Write the CSV to this path instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

pub(crate) fn run_emi(args: EmiArgs) -> Result<(), AppError> {
    let EmiArgs {
        principal,
        tenure,
        rate,
        schedule,
    } = args;

    let quote = emi::quote(principal, tenure, rate)?;
    render_quote(&quote);

    if schedule {
        render_schedule(&emi::schedule(principal, tenure, rate)?);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let desk = Desk::build(true)?;
    let api = &desk.api;

    println!("Loan Origination Desk Demo");
    println!("==========================\n");

    let applicant = api.auth.login_as(Role::Applicant)?;
    println!(
        "Signed in as {} ({})",
        applicant.user.name,
        applicant.role().label()
    );

    let application = walk_wizard(&desk, &applicant, args.amount, args.tenure, args.purpose)?;
    render_application(&application);

    if args.skip_review {
        render_notifications(&api.applications.notifications(&applicant)?.notifications);
        return Ok(());
    }

    let officer = api.auth.login_as(Role::Officer)?;
    let manager = api.auth.login_as(Role::Manager)?;
    api.applications
        .update_status(&officer, &application.id, ApplicationStatus::UnderReview)?;
    api.applications
        .update_status(&officer, &application.id, ApplicationStatus::Verified)?;
    let approved = api.applications.approve(
        &manager,
        &application.id,
        Some("Income and identity proofs verified".to_string()),
    )?;
    println!(
        "\nReviewer decision: {} by {}",
        approved.status.label(),
        manager.user.name
    );

    let letter = api
        .applications
        .sanction_letter(&applicant, &application.id)?;
    render_sanction_letter(&letter);

    let summary = api.applications.dashboard(&manager)?;
    println!("\nDesk dashboard");
    println!("  Applications: {}", summary.total_applications);
    println!("  Approved:     {}", summary.approved);
    println!("  Pending:      {}", summary.pending);
    println!("  Requested:    {}", summary.total_requested_amount);

    render_notifications(&api.applications.notifications(&applicant)?.notifications);
    Ok(())
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let desk = Desk::build(true)?;
    let applicant = desk.api.auth.login_as(Role::Applicant)?;
    walk_wizard(&desk, &applicant, 20_000, 24, "Education".to_string())?;

    let manager = desk.api.auth.login_as(Role::Manager)?;
    let rows = match args.output {
        Some(path) => {
            let file = File::create(&path)?;
            let rows = desk.api.applications.export_register(&manager, file)?;
            eprintln!("Wrote {rows} applications to {}", path.display());
            rows
        }
        None => {
            let stdout = io::stdout();
            let handle = stdout.lock();
            desk.api.applications.export_register(&manager, handle)?
        }
    };
    tracing::debug!(rows, "register exported");
    Ok(())
}

fn walk_wizard(
    desk: &Desk,
    applicant: &Session,
    amount: u64,
    tenure_months: u32,
    purpose: String,
) -> Result<LoanApplication, AppError> {
    let api = &desk.api;
    let mut wizard = ApplicationWizard::new();
    announce_step(wizard.current_step());

    let step = wizard.save_personal(PersonalDetails {
        full_name: "Jane Doe".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1995, 5, 5).unwrap_or_default(),
        pan: None,
        aadhaar: None,
        email: "jane@x.com".to_string(),
        phone: "9998887777".to_string(),
        address: "1 Elm St".to_string(),
    })?;
    announce_step(step);
    let step = wizard.save_employment(EmploymentDetails {
        employment_type: EmploymentType::Salaried,
        employer_name: Some("Northwind Traders".to_string()),
        monthly_income: 6_000,
        experience_years: 3.0,
    })?;
    announce_step(step);
    let step = wizard.save_loan(LoanRequest {
        amount,
        tenure_months,
        purpose,
    })?;
    if let Some(preview) = wizard.loan_preview() {
        println!("\nLoan preview");
        render_quote(&preview);
    }
    announce_step(step);

    for (file_name, category) in [
        ("aadhaar.jpg", DocumentCategory::IdentityProof),
        ("salary-slip.pdf", DocumentCategory::IncomeProof),
        ("bank-statement.pdf", DocumentCategory::BankStatement),
    ] {
        let document = api.documents.upload(
            applicant,
            FileUpload {
                file_name: file_name.to_string(),
                size_bytes: 180_000,
            },
            category,
        )?;
        println!("Uploaded {} as {}", document.name, category.label());
        wizard.attach_document(document)?;
    }
    announce_step(wizard.complete_documents()?);

    let submission = wizard.into_submission()?;
    Ok(api.applications.submit(applicant, submission)?)
}

fn announce_step(step: WizardStep) {
    println!(
        "\n[{}/{}] {}",
        step.index() + 1,
        WizardStep::ALL.len(),
        step.title()
    );
}

fn render_quote(quote: &EmiQuote) {
    println!("  Principal:      {}", quote.principal);
    println!("  Tenure:         {} months", quote.tenure_months);
    println!("  Annual rate:    {:.2}%", quote.annual_rate_pct);
    println!("  Monthly EMI:    {}", quote.emi);
    println!("  Total interest: {}", quote.total_interest);
    println!("  Total payable:  {}", quote.total_payable);
}

fn render_schedule(rows: &[Installment]) {
    println!(
        "\n{:>5} {:>14} {:>12} {:>12} {:>14}",
        "Month", "Opening", "Interest", "Principal", "Closing"
    );
    for row in rows {
        println!(
            "{:>5} {:>14.2} {:>12.2} {:>12.2} {:>14.2}",
            row.month, row.opening_balance, row.interest, row.principal, row.closing_balance
        );
    }
}

fn render_application(application: &LoanApplication) {
    println!("\nSubmitted application {}", application.id);
    println!("  Status:    {}", application.status.label());
    if let Some(submitted_at) = application.submitted_at {
        println!("  Submitted: {}", submitted_at.to_rfc3339());
    }
    if let Some(terms) = &application.loan_details {
        println!(
            "  Terms:     {} over {} months at {:.2}% (EMI {})",
            terms.amount(),
            terms.tenure_months(),
            terms.annual_rate_pct(),
            terms.calculated_emi()
        );
    }
    println!("  Documents: {}", application.documents.len());
}

fn render_sanction_letter(letter: &SanctionLetter) {
    println!("\nSanction letter {}", letter.reference);
    println!("  Applicant:      {}", letter.applicant_name);
    println!("  Amount:         {}", letter.sanctioned_amount);
    println!("  Tenure:         {} months", letter.tenure_months);
    println!("  Rate:           {:.2}%", letter.annual_rate_pct);
    println!("  Monthly EMI:    {}", letter.emi);
    println!("  Total interest: {}", letter.total_interest);
    println!("  Total payable:  {}", letter.total_payable);
}

fn render_notifications(notifications: &[Notification]) {
    println!("\nApplicant inbox");
    if notifications.is_empty() {
        println!("  (empty)");
        return;
    }
    for notification in notifications {
        let marker = if notification.read { " " } else { "*" };
        println!("  {marker} {}: {}", notification.title, notification.message);
    }
}
