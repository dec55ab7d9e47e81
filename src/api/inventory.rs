use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::optional_id;
use crate::db::Database;
use crate::error::{CrmError, CrmResult};
use crate::models::{SpendingInput, StockTransactionInput};

#[derive(Deserialize, Debug, Default)]
pub struct ProjectFilter {
    pub pid: Option<String>,
}

async fn ensure_project(db: &Database, pid: i64) -> CrmResult<()> {
    if db.project_exists(pid).await? {
        Ok(())
    } else {
        Err(CrmError::Validation(format!("Project {} does not exist", pid)))
    }
}

pub async fn get_transactions(
    State(db): State<Database>,
    Query(filter): Query<ProjectFilter>,
) -> CrmResult<Response> {
    let pid = optional_id(filter.pid.as_deref(), "Project")?;
    let transactions = db.get_stock_transactions(pid).await?;

    Ok(Json(json!({ "transactions": transactions })).into_response())
}

pub async fn create_transaction(
    State(db): State<Database>,
    payload: Result<Json<StockTransactionInput>, JsonRejection>,
) -> CrmResult<Response> {
    let Json(input) = payload?;
    // Validate, then make sure the project is there
    let transaction = input.validate()?;
    ensure_project(&db, transaction.pid).await?;

    let transaction = db.create_stock_transaction(&transaction).await?;

    tracing::info!(tid = transaction.tid, pid = transaction.pid, "stock transaction recorded");
    Ok((StatusCode::CREATED, Json(transaction)).into_response())
}

pub async fn get_spending(
    State(db): State<Database>,
    Query(filter): Query<ProjectFilter>,
) -> CrmResult<Response> {
    let pid = optional_id(filter.pid.as_deref(), "Project")?;
    let spending = db.get_spending(pid).await?;

    Ok(Json(json!({ "spending": spending })).into_response())
}

pub async fn create_spending(
    State(db): State<Database>,
    payload: Result<Json<SpendingInput>, JsonRejection>,
) -> CrmResult<Response> {
    let Json(input) = payload?;
    let spending = input.validate()?;
    ensure_project(&db, spending.pid).await?;

    let spending = db.create_spending(&spending).await?;

    tracing::info!(sid = spending.sid, pid = spending.pid, "spending recorded");
    Ok((StatusCode::CREATED, Json(spending)).into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::api::testing::{app, call};

    #[tokio::test]
    async fn test_rows_require_an_existing_project() {
        let (app, _db) = app().await;

        let (status, error) = call(
            &app,
            Method::POST,
            "/api/inventory/transactions",
            Some(json!({ "pid": 8, "item": "Beam", "quantity": 1, "transaction_date": "2024-01-01" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "Project 8 does not exist");

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/inventory/spending",
            Some(json!({ "pid": 8, "item": "Paint" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_lists_filter_by_project() {
        let (app, _db) = app().await;
        let (_, customer) = call(
            &app,
            Method::POST,
            "/api/customers",
            Some(json!({ "cname": "Acme", "cphone": "1", "location": "LA" })),
        )
        .await;
        let (_, project) = call(
            &app,
            Method::POST,
            "/api/tasks",
            Some(json!({ "pname": "Fit-out", "start_date": "2024-01-01", "cid": customer["cid"] })),
        )
        .await;
        call(
            &app,
            Method::POST,
            "/api/inventory/spending",
            Some(json!({ "pid": project["pid"], "item": "Paint", "amount": 9.5, "spent_at": "2024-01-02" })),
        )
        .await;

        let uri = format!("/api/inventory/spending?pid={}", project["pid"]);
        let (status, body) = call(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["spending"][0]["item"], "Paint");
        assert_eq!(body["spending"][0]["amount"], 9.5);

        let (_, other) = call(&app, Method::GET, "/api/inventory/spending?pid=999", None).await;
        assert_eq!(other["spending"], json!([]));
    }
}
