use serde::{Deserialize, Serialize};

use super::dates::parse_calendar_date;
use crate::error::{CrmError, CrmResult};

pub const DEFAULT_INVOICE_STATUS: &str = "unpaid";

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Invoice {
    pub iid: i64,
    pub cid: i64,
    pub amount: f64,
    pub issue_date: String,
    pub status: String,
    pub description: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct InvoiceInput {
    pub cid: Option<i64>,
    pub amount: Option<f64>,
    pub issue_date: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoice {
    pub cid: i64,
    pub amount: f64,
    pub issue_date: String,
    pub status: String,
    pub description: Option<String>,
}

impl InvoiceInput {
    pub fn validate(self) -> CrmResult<NewInvoice> {
        let (Some(cid), Some(amount), Some(issue_date)) = (self.cid, self.amount, self.issue_date)
        else {
            return Err(CrmError::Validation(
                "Customer, amount, and issue date are required".into(),
            ));
        };

        if !amount.is_finite() || amount < 0.0 {
            return Err(CrmError::Validation("Amount must be zero or more".into()));
        }

        let issue_date = parse_calendar_date(&issue_date)
            .ok_or_else(|| CrmError::Validation("Issue date is invalid".into()))?;

        Ok(NewInvoice {
            cid,
            amount,
            issue_date: issue_date.format("%Y-%m-%d").to_string(),
            status: self
                .status
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_INVOICE_STATUS.to_string()),
            description: self.description.filter(|d| !d.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_defaults_to_unpaid() {
        let input: InvoiceInput =
            serde_json::from_str(r#"{"cid":1,"amount":120.5,"issue_date":"2024-02-01T00:00:00Z"}"#)
                .unwrap();

        let invoice = input.validate().unwrap();
        assert_eq!(invoice.status, "unpaid");
        assert_eq!(invoice.issue_date, "2024-02-01");
        assert_eq!(invoice.description, None);
    }

    #[test]
    fn test_invoice_rejects_negative_amount() {
        let input: InvoiceInput =
            serde_json::from_str(r#"{"cid":1,"amount":-3,"issue_date":"2024-02-01"}"#).unwrap();

        assert!(matches!(input.validate(), Err(CrmError::Validation(_))));
    }
}
