use std::io::Write;

use serde::Serialize;

use super::domain::LoanApplication;

#[derive(Debug, Serialize)]
struct RegisterRow<'a> {
    #[serde(rename = "Application ID")]
    id: &'a str,
    #[serde(rename = "Applicant")]
    applicant: &'a str,
    #[serde(rename = "Status")]
    status: &'static str,
    #[serde(rename = "Amount")]
    amount: u64,
    #[serde(rename = "Tenure (months)")]
    tenure_months: Option<u32>,
    #[serde(rename = "EMI")]
    emi: Option<u64>,
    #[serde(rename = "Submitted At")]
    submitted_at: Option<String>,
    #[serde(rename = "Updated At")]
    updated_at: String,
}

impl<'a> From<&'a LoanApplication> for RegisterRow<'a> {
    fn from(application: &'a LoanApplication) -> Self {
        let terms = application.loan_details.as_ref();
        Self {
            id: &application.id.0,
            applicant: &application.applicant_name,
            status: application.status.label(),
            amount: application.requested_amount(),
            tenure_months: terms.map(|terms| terms.tenure_months()),
            emi: terms.map(|terms| terms.calculated_emi()),
            submitted_at: application.submitted_at.map(|at| at.to_rfc3339()),
            updated_at: application.updated_at.to_rfc3339(),
        }
    }
}

/// Write one CSV row per application, returning how many rows were written.
pub fn write_register<W: Write>(
    writer: W,
    applications: &[LoanApplication],
) -> Result<usize, csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);
    for application in applications {
        csv_writer.serialize(RegisterRow::from(application))?;
    }
    csv_writer.flush()?;
    Ok(applications.len())
}
