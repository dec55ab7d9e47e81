use super::Database;
use crate::error::{CrmError, CrmResult};
use crate::models::{Spending, StockTransaction};

impl Database {
    // Stock transactions
    pub async fn get_stock_transactions(&self, pid: Option<i64>) -> CrmResult<Vec<StockTransaction>> {
        let sql = "SELECT tid, pid, item, quantity, transaction_date FROM stock_transactions";

        let transactions = match pid {
            Some(pid) => {
                sqlx::query_as::<_, StockTransaction>(&format!("{sql} WHERE pid = ? ORDER BY tid ASC"))
                    .bind(pid)
                    .fetch_all(self.get_pool())
                    .await?
            }
            None => {
                sqlx::query_as::<_, StockTransaction>(&format!("{sql} ORDER BY tid ASC"))
                    .fetch_all(self.get_pool())
                    .await?
            }
        };

        Ok(transactions)
    }

    pub async fn create_stock_transaction(
        &self,
        transaction: &StockTransaction,
    ) -> CrmResult<StockTransaction> {
        let result = sqlx::query(
            r#"
            INSERT INTO stock_transactions (pid, item, quantity, transaction_date)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(transaction.pid)
        .bind(transaction.item.clone())
        .bind(transaction.quantity)
        .bind(transaction.transaction_date.clone())
        .execute(self.get_pool())
        .await?;

        // The inserted row is the input plus its new id
        let tid = result
            .last_insert_id()
            .ok_or_else(|| CrmError::Internal("insert did not report a transaction id".into()))?;

        Ok(StockTransaction {
            tid,
            ..transaction.clone()
        })
    }

    // Spending
    pub async fn get_spending(&self, pid: Option<i64>) -> CrmResult<Vec<Spending>> {
        let sql = "SELECT sid, pid, item, amount, spent_at FROM inventory_spending";

        let spending = match pid {
            Some(pid) => {
                sqlx::query_as::<_, Spending>(&format!("{sql} WHERE pid = ? ORDER BY sid ASC"))
                    .bind(pid)
                    .fetch_all(self.get_pool())
                    .await?
            }
            None => {
                sqlx::query_as::<_, Spending>(&format!("{sql} ORDER BY sid ASC"))
                    .fetch_all(self.get_pool())
                    .await?
            }
        };

        Ok(spending)
    }

    pub async fn create_spending(&self, spending: &Spending) -> CrmResult<Spending> {
        let result = sqlx::query(
            r#"
            INSERT INTO inventory_spending (pid, item, amount, spent_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(spending.pid)
        .bind(spending.item.clone())
        .bind(spending.amount)
        .bind(spending.spent_at.clone())
        .execute(self.get_pool())
        .await?;

        let sid = result
            .last_insert_id()
            .ok_or_else(|| CrmError::Internal("insert did not report a spending id".into()))?;

        Ok(Spending {
            sid,
            ..spending.clone()
        })
    }
}
