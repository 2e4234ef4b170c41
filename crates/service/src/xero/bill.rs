//! Draft bill (accounts payable invoice) built from an approved claim.
use serde::{Deserialize, Serialize};

use models::{expense, expense_claim};
use crate::errors::ServiceError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Bill {
    #[serde(rename = "Type")]
    pub kind: String,
    pub contact: BillContact,
    /// `YYYY-MM-DD`
    pub date: String,
    pub due_date: String,
    pub reference: String,
    pub currency_code: String,
    pub status: String,
    pub line_amount_types: String,
    pub line_items: Vec<BillLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BillContact {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BillLine {
    pub description: String,
    pub quantity: f64,
    pub unit_amount: f64,
    pub account_code: String,
    pub tax_type: String,
    pub tax_amount: f64,
}

/// An expense together with the account code of its category, if any.
#[derive(Debug, Clone)]
pub struct BillSource {
    pub expense: expense::Model,
    pub account_code: Option<String>,
}

/// Bill defaults taken from the `[xero]` config section.
#[derive(Debug, Clone)]
pub struct BillDefaults {
    pub currency: String,
    pub default_account_code: String,
}

fn pounds(pence: i64) -> f64 {
    pence as f64 / 100.0
}

/// Unit amounts exclude VAT and the VAT is sent as an explicit tax amount,
/// so the bill total equals the claim total.
pub fn build_bill(claim: &expense_claim::Model, lines: &[BillSource], defaults: &BillDefaults) -> Result<Bill, ServiceError> {
    if lines.is_empty() {
        return Err(ServiceError::Validation("claim has no expenses to bill".into()));
    }
    let contact = claim.claimant_name.trim();
    let line_items = lines
        .iter()
        .map(|src| {
            let e = &src.expense;
            let description = if e.description.trim().is_empty() {
                e.title.clone()
            } else {
                format!("{} - {}", e.title, e.description.trim())
            };
            let account_code = src
                .account_code
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or(&defaults.default_account_code)
                .to_string();
            BillLine {
                description,
                quantity: 1.0,
                unit_amount: pounds(e.amount_before_vat_pence),
                account_code,
                tax_type: if e.vat_pence > 0 { "INPUT2".into() } else { "NONE".into() },
                tax_amount: pounds(e.vat_pence),
            }
        })
        .collect();

    Ok(Bill {
        kind: "ACCPAY".into(),
        contact: BillContact { name: if contact.is_empty() { "Unknown".into() } else { contact.to_string() } },
        date: claim.start_date.format("%Y-%m-%d").to_string(),
        due_date: claim.end_date.format("%Y-%m-%d").to_string(),
        reference: claim.bill_reference(),
        currency_code: defaults.currency.clone(),
        status: "DRAFT".into(),
        line_amount_types: "Exclusive".into(),
        line_items,
    })
}
