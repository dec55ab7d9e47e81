use super::Database;
use crate::error::{CrmError, CrmResult};
use crate::models::{Invoice, NewInvoice};

const INVOICE_COLUMNS: &str =
    "SELECT iid, cid, amount, issue_date, status, description FROM invoices";

impl Database {
    pub async fn get_invoices(&self, cid: Option<i64>) -> CrmResult<Vec<Invoice>> {
        // Newest first, optionally for one customer
        let invoices = match cid {
            Some(cid) => {
                sqlx::query_as::<_, Invoice>(&format!(
                    "{INVOICE_COLUMNS} WHERE cid = ? ORDER BY issue_date DESC, iid DESC"
                ))
                .bind(cid)
                .fetch_all(self.get_pool())
                .await?
            }
            None => {
                sqlx::query_as::<_, Invoice>(&format!(
                    "{INVOICE_COLUMNS} ORDER BY issue_date DESC, iid DESC"
                ))
                .fetch_all(self.get_pool())
                .await?
            }
        };

        Ok(invoices)
    }

    pub async fn get_invoice(&self, iid: i64) -> CrmResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!("{INVOICE_COLUMNS} WHERE iid = ?"))
            .bind(iid)
            .fetch_optional(self.get_pool())
            .await?;

        Ok(invoice)
    }

    pub async fn create_invoice(&self, invoice: &NewInvoice) -> CrmResult<Invoice> {
        // Insert the invoice, then read back the stored row
        let result = sqlx::query(
            r#"
            INSERT INTO invoices (cid, amount, issue_date, status, description)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(invoice.cid)
        .bind(invoice.amount)
        .bind(invoice.issue_date.clone())
        .bind(invoice.status.clone())
        .bind(invoice.description.clone())
        .execute(self.get_pool())
        .await?;

        let iid = result
            .last_insert_id()
            .ok_or_else(|| CrmError::Internal("insert did not report an invoice id".into()))?;

        self.get_invoice(iid)
            .await?
            .ok_or_else(|| CrmError::Internal(format!("invoice {} vanished after insert", iid)))
    }

    /// Returns whether a row was removed
    pub async fn delete_invoice(&self, iid: i64) -> CrmResult<bool> {
        let result = sqlx::query("DELETE FROM invoices WHERE iid = ?")
            .bind(iid)
            .execute(self.get_pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
