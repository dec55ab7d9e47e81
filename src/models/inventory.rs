use serde::{Deserialize, Serialize};

use super::dates::parse_calendar_date;
use crate::error::{CrmError, CrmResult};

/// Stock movement booked against a project
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StockTransaction {
    pub tid: i64,
    pub pid: i64,
    pub item: String,
    pub quantity: i64,
    pub transaction_date: String,
}

/// Inventory spending charged to a project
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Spending {
    pub sid: i64,
    pub pid: i64,
    pub item: String,
    pub amount: f64,
    pub spent_at: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct StockTransactionInput {
    pub pid: Option<i64>,
    pub item: Option<String>,
    pub quantity: Option<i64>,
    pub transaction_date: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct SpendingInput {
    pub pid: Option<i64>,
    pub item: Option<String>,
    pub amount: Option<f64>,
    pub spent_at: Option<String>,
}

fn calendar_date(value: &str, field: &str) -> CrmResult<String> {
    parse_calendar_date(value)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .ok_or_else(|| CrmError::Validation(format!("{} is invalid", field)))
}

impl StockTransactionInput {
    pub fn validate(self) -> CrmResult<StockTransaction> {
        let item = self.item.filter(|item| !item.trim().is_empty());
        let (Some(pid), Some(item), Some(quantity), Some(date)) =
            (self.pid, item, self.quantity, self.transaction_date)
        else {
            return Err(CrmError::Validation(
                "Project, item, quantity, and transaction date are required".into(),
            ));
        };

        Ok(StockTransaction {
            tid: 0,
            pid,
            item,
            quantity,
            transaction_date: calendar_date(&date, "Transaction date")?,
        })
    }
}

impl SpendingInput {
    pub fn validate(self) -> CrmResult<Spending> {
        let item = self.item.filter(|item| !item.trim().is_empty());
        let (Some(pid), Some(item), Some(amount), Some(spent_at)) =
            (self.pid, item, self.amount, self.spent_at)
        else {
            return Err(CrmError::Validation(
                "Project, item, amount, and spending date are required".into(),
            ));
        };

        if !amount.is_finite() || amount < 0.0 {
            return Err(CrmError::Validation("Amount must be zero or more".into()));
        }

        Ok(Spending {
            sid: 0,
            pid,
            item,
            amount,
            spent_at: calendar_date(&spent_at, "Spending date")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_transaction_requires_item() {
        let input: StockTransactionInput = serde_json::from_str(
            r#"{"pid":2,"item":"","quantity":4,"transaction_date":"2024-01-01"}"#,
        )
        .unwrap();

        assert!(matches!(input.validate(), Err(CrmError::Validation(_))));
    }

    #[test]
    fn test_spending_normalizes_date() {
        let input: SpendingInput = serde_json::from_str(
            r#"{"pid":2,"item":"Cement","amount":80.0,"spent_at":"2024-01-01T10:00:00Z"}"#,
        )
        .unwrap();

        let spending = input.validate().unwrap();
        assert_eq!(spending.spent_at, "2024-01-01");
    }
}
