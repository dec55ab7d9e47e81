use sqlx::AnyConnection;

use super::{abort, Database};
use crate::error::{CrmError, CrmResult};
use crate::models::{NewProject, Project, ProjectDeletion, RelatedRecords};

const PROJECT_COLUMNS: &str = r#"
    SELECT
        p.pid,
        p.pname,
        p.start_date,
        p.end_date,
        p.status,
        p.cid,
        c.cname
    FROM project p
    LEFT JOIN customer c ON c.cid = p.cid
"#;

impl Database {
    pub async fn get_projects(&self) -> CrmResult<Vec<Project>> {
        let projects =
            sqlx::query_as::<_, Project>(&format!("{PROJECT_COLUMNS} ORDER BY p.pid ASC"))
                .fetch_all(self.get_pool())
                .await?;

        Ok(projects)
    }

    pub async fn get_project(&self, pid: i64) -> CrmResult<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(&format!("{PROJECT_COLUMNS} WHERE p.pid = ?"))
            .bind(pid)
            .fetch_optional(self.get_pool())
            .await?;

        Ok(project)
    }

    pub async fn project_exists(&self, pid: i64) -> CrmResult<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM project WHERE pid = ?")
            .bind(pid)
            .fetch_one(self.get_pool())
            .await?;

        Ok(found > 0)
    }

    pub async fn create_project(&self, project: &NewProject) -> CrmResult<Project> {
        // Insert the project, then read it back with the customer name
        let result = sqlx::query(
            r#"
            INSERT INTO project (pname, start_date, end_date, status, cid)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(project.pname.clone())
        .bind(project.start_date_string())
        .bind(project.end_date_string())
        .bind(project.status.as_str())
        .bind(project.cid)
        .execute(self.get_pool())
        .await?;

        let pid = result
            .last_insert_id()
            .ok_or_else(|| CrmError::Internal("insert did not report a project id".into()))?;

        self.get_project(pid)
            .await?
            .ok_or_else(|| CrmError::Internal(format!("project {} vanished after insert", pid)))
    }

    pub async fn update_project(&self, pid: i64, project: &NewProject) -> CrmResult<Option<Project>> {
        let result = sqlx::query(
            r#"
            UPDATE project
            SET pname = ?, start_date = ?, end_date = ?, status = ?, cid = ?
            WHERE pid = ?
            "#,
        )
        .bind(project.pname.clone())
        .bind(project.start_date_string())
        .bind(project.end_date_string())
        .bind(project.status.as_str())
        .bind(project.cid)
        .bind(pid)
        .execute(self.get_pool())
        .await?;

        // MySQL reports 0 rows for an update that changes nothing
        if result.rows_affected() == 0 && !self.project_exists(pid).await? {
            return Ok(None);
        }

        self.get_project(pid).await
    }

    /// Delete a project.
    ///
    /// Without `cascade` the delete is refused with
    /// [`CrmError::RelatedRecords`] while dependent rows exist. With it, the
    /// dependents are removed first. Everything happens in one transaction.
    pub async fn delete_project(&self, pid: i64, cascade: bool) -> CrmResult<ProjectDeletion> {
        // Start a transaction
        let mut tx = self.pool.begin().await?;

        match purge_project(&mut tx, pid, cascade).await {
            Ok(deletion) => {
                // Commit the transaction
                tx.commit().await.map_err(delete_failed)?;
                Ok(deletion)
            }
            Err(e) => Err(abort(tx, e).await),
        }
    }
}

fn delete_failed(source: sqlx::Error) -> CrmError {
    CrmError::DeleteFailed {
        context: "Failed to delete project",
        source,
    }
}

/// Count the stock transactions and spending records hanging off a project
async fn count_related(conn: &mut AnyConnection, pid: i64) -> Result<RelatedRecords, sqlx::Error> {
    let stock = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stock_transactions WHERE pid = ?")
        .bind(pid)
        .fetch_one(&mut *conn)
        .await?;

    let spending = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM inventory_spending WHERE pid = ?")
        .bind(pid)
        .fetch_one(&mut *conn)
        .await?;

    Ok(RelatedRecords::new(stock, spending))
}

async fn purge_project(conn: &mut AnyConnection, pid: i64, cascade: bool) -> CrmResult<ProjectDeletion> {
    let related = count_related(conn, pid).await.map_err(delete_failed)?;

    if !cascade && !related.is_empty() {
        return Err(CrmError::RelatedRecords(related));
    }

    // Dependents are only touched when the caller asked for a cascade
    let (deleted_transactions, deleted_spending) = if cascade {
        let transactions = sqlx::query("DELETE FROM stock_transactions WHERE pid = ?")
            .bind(pid)
            .execute(&mut *conn)
            .await
            .map_err(delete_failed)?;

        let spending = sqlx::query("DELETE FROM inventory_spending WHERE pid = ?")
            .bind(pid)
            .execute(&mut *conn)
            .await
            .map_err(delete_failed)?;

        (transactions.rows_affected(), spending.rows_affected())
    } else {
        (0, 0)
    };

    // Delete the project itself
    let project = sqlx::query("DELETE FROM project WHERE pid = ?")
        .bind(pid)
        .execute(&mut *conn)
        .await
        .map_err(delete_failed)?;

    let message = if deleted_transactions + deleted_spending == 0 {
        "Project deleted successfully"
    } else {
        "Project and related records deleted successfully"
    };

    Ok(ProjectDeletion {
        message: message.into(),
        deleted_transactions,
        deleted_spending,
        project_deleted: project.rows_affected() > 0,
    })
}
