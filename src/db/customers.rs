use sqlx::AnyConnection;

use super::{abort, Database};
use crate::error::{CrmError, CrmResult};
use crate::models::{Customer, CustomerDeletion, CustomerPatch, NewCustomer};

const CUSTOMER_COLUMNS: &str = "SELECT cid, cname, cphone, location, status, remark FROM customer";

impl Database {
    pub async fn get_customers(&self) -> CrmResult<Vec<Customer>> {
        let customers =
            sqlx::query_as::<_, Customer>(&format!("{CUSTOMER_COLUMNS} ORDER BY cid ASC"))
                .fetch_all(self.get_pool())
                .await?;

        Ok(customers)
    }

    pub async fn get_customer(&self, cid: i64) -> CrmResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!("{CUSTOMER_COLUMNS} WHERE cid = ?"))
            .bind(cid)
            .fetch_optional(self.get_pool())
            .await?;

        Ok(customer)
    }

    pub async fn customer_exists(&self, cid: i64) -> CrmResult<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customer WHERE cid = ?")
            .bind(cid)
            .fetch_one(self.get_pool())
            .await?;

        Ok(found > 0)
    }

    pub async fn create_customer(&self, customer: &NewCustomer) -> CrmResult<Customer> {
        // Insert the customer, then read back the stored row
        let result = sqlx::query(
            "INSERT INTO customer (cname, cphone, location, status, remark) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(customer.cname.clone())
        .bind(customer.cphone.clone())
        .bind(customer.location.clone())
        .bind(customer.status.clone())
        .bind(customer.remark.clone())
        .execute(self.get_pool())
        .await?;

        let cid = result
            .last_insert_id()
            .ok_or_else(|| CrmError::Internal("insert did not report a customer id".into()))?;

        self.get_customer(cid)
            .await?
            .ok_or_else(|| CrmError::Internal(format!("customer {} vanished after insert", cid)))
    }

    /// Merge `patch` over the stored customer and write every mutable column
    /// back. Returns `None` when the customer does not exist.
    pub async fn update_customer(
        &self,
        cid: i64,
        patch: CustomerPatch,
    ) -> CrmResult<Option<Customer>> {
        let Some(existing) = self.get_customer(cid).await? else {
            return Ok(None);
        };

        // Only supplied fields change, the rest keep their stored value
        let merged = patch.merge(existing)?;

        sqlx::query(
            r#"
            UPDATE customer
            SET cname = ?, cphone = ?, location = ?, status = ?, remark = ?
            WHERE cid = ?
            "#,
        )
        .bind(merged.cname.clone())
        .bind(merged.cphone.clone())
        .bind(merged.location.clone())
        .bind(merged.status.clone())
        .bind(merged.remark.clone())
        .bind(cid)
        .execute(self.get_pool())
        .await?;

        Ok(Some(merged))
    }

    /// Delete a customer together with its invoices.
    ///
    /// Both deletes run in one transaction; on any failure it is rolled back
    /// and nothing is removed.
    pub async fn delete_customer(&self, cid: i64) -> CrmResult<CustomerDeletion> {
        const CONTEXT: &str = "Failed to delete customer";

        // Start a transaction
        let mut tx = self.pool.begin().await?;

        match purge_customer(&mut tx, cid).await {
            Ok(deletion) => {
                // Commit the transaction
                tx.commit()
                    .await
                    .map_err(|source| CrmError::DeleteFailed { context: CONTEXT, source })?;
                Ok(deletion)
            }
            Err(source) => Err(abort(tx, CrmError::DeleteFailed { context: CONTEXT, source }).await),
        }
    }
}

async fn purge_customer(conn: &mut AnyConnection, cid: i64) -> Result<CustomerDeletion, sqlx::Error> {
    // Invoices reference the customer, so they go first
    let invoices = sqlx::query("DELETE FROM invoices WHERE cid = ?")
        .bind(cid)
        .execute(&mut *conn)
        .await?;

    // Delete the customer itself
    let customer = sqlx::query("DELETE FROM customer WHERE cid = ?")
        .bind(cid)
        .execute(&mut *conn)
        .await?;

    Ok(CustomerDeletion {
        message: "Customer deleted successfully".into(),
        deleted_invoices: invoices.rows_affected(),
        customer_deleted: customer.rows_affected() > 0,
    })
}
