use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::{optional_id, require_id, IdQuery};
use crate::db::Database;
use crate::error::{CrmError, CrmResult};
use crate::models::{CustomerInput, CustomerPatch};

fn not_found() -> CrmError {
    CrmError::NotFound("Customer not found".into())
}

/// `GET /api/customers` lists everyone, `GET /api/customers?id=` fetches one
pub async fn get_customers(
    State(db): State<Database>,
    Query(query): Query<IdQuery>,
) -> CrmResult<Response> {
    // An empty `?id=` lists everyone too
    let Some(cid) = optional_id(query.id.as_deref(), "Customer")? else {
        let customers = db.get_customers().await?;
        return Ok(Json(json!({ "customers": customers })).into_response());
    };

    let customer = db.get_customer(cid).await?.ok_or_else(not_found)?;

    Ok(Json(customer).into_response())
}

pub async fn create_customer(
    State(db): State<Database>,
    payload: Result<Json<CustomerInput>, JsonRejection>,
) -> CrmResult<Response> {
    let Json(input) = payload?;
    let customer = db.create_customer(&input.validate()?).await?;

    tracing::info!(cid = customer.cid, "customer created");
    Ok((StatusCode::CREATED, Json(customer)).into_response())
}

pub async fn update_customer(
    State(db): State<Database>,
    Query(query): Query<IdQuery>,
    payload: Result<Json<CustomerPatch>, JsonRejection>,
) -> CrmResult<Response> {
    let cid = require_id(query.id.as_deref(), "Customer")?;
    let Json(patch) = payload?;

    let customer = db.update_customer(cid, patch).await?.ok_or_else(not_found)?;

    tracing::info!(cid, "customer updated");
    Ok(Json(customer).into_response())
}

pub async fn delete_customer(
    State(db): State<Database>,
    Query(query): Query<IdQuery>,
) -> CrmResult<Response> {
    let cid = require_id(query.id.as_deref(), "Customer")?;

    if db.get_customer(cid).await?.is_none() {
        return Err(not_found());
    }

    // Invoices and customer go together, or not at all
    let deletion = db.delete_customer(cid).await?;

    tracing::info!(cid, invoices = deletion.deleted_invoices, "customer deleted");
    Ok(Json(deletion).into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::api::testing::{app, call};
    use crate::db::testing::{block_deletes, count};

    #[tokio::test]
    async fn test_create_then_delete_customer() {
        let (app, _db) = app().await;

        let (status, created) = call(
            &app,
            Method::POST,
            "/api/customers",
            Some(json!({ "cname": "Acme", "cphone": "555", "location": "NYC" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "lead");
        assert_eq!(created["remark"], serde_json::Value::Null);

        let uri = format!("/api/customers?id={}", created["cid"]);
        let (status, deleted) = call(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["deletedInvoices"], 0);
        assert_eq!(deleted["customerDeleted"], true);
        assert_eq!(deleted["message"], "Customer deleted successfully");
    }

    #[tokio::test]
    async fn test_create_with_missing_fields_writes_nothing() {
        let (app, db) = app().await;

        for body in [
            json!({ "cphone": "555", "location": "NYC" }),
            json!({ "cname": "Acme", "location": "NYC" }),
            json!({ "cname": "Acme", "cphone": "555" }),
            json!({ "cname": "", "cphone": "555", "location": "NYC" }),
        ] {
            let (status, error) = call(&app, Method::POST, "/api/customers", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(error["error"], "Name, phone, and location are required");
        }

        assert_eq!(count(&db, "customer").await, 0);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let (app, _db) = app().await;

        let (status, error) = call(
            &app,
            Method::POST,
            "/api/customers",
            Some(json!({ "cname": ["not", "a", "string"] })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error["error"].as_str().unwrap().starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn test_get_lists_and_fetches_customers() {
        let (app, _db) = app().await;
        for name in ["Acme", "Globex"] {
            call(
                &app,
                Method::POST,
                "/api/customers",
                Some(json!({ "cname": name, "cphone": "1", "location": "LA" })),
            )
            .await;
        }

        let (status, list) = call(&app, Method::GET, "/api/customers", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["customers"].as_array().unwrap().len(), 2);

        let (status, same) = call(&app, Method::GET, "/api/customers?id=", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(same, list);

        let cid = &list["customers"][1]["cid"];
        let (status, one) = call(&app, Method::GET, &format!("/api/customers?id={cid}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(one["cname"], "Globex");
    }

    #[tokio::test]
    async fn test_unknown_customer_is_not_found() {
        let (app, _db) = app().await;

        for method in [Method::GET, Method::DELETE] {
            let (status, error) = call(&app, method, "/api/customers?id=404", None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(error["error"], "Customer not found");
        }

        let (status, _) = call(
            &app,
            Method::PUT,
            "/api/customers?cid=404",
            Some(json!({ "cname": "Nobody" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_id_is_bad_request() {
        let (app, _db) = app().await;

        let (status, error) = call(&app, Method::DELETE, "/api/customers", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "Customer ID is required");

        let (status, _) = call(&app, Method::PUT, "/api/customers", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_merges_supplied_fields() {
        let (app, _db) = app().await;
        let (_, created) = call(
            &app,
            Method::POST,
            "/api/customers",
            Some(json!({ "cname": "Acme", "cphone": "555", "location": "NYC", "remark": "vip" })),
        )
        .await;
        let uri = format!("/api/customers?cid={}", created["cid"]);

        let (status, updated) =
            call(&app, Method::PUT, &uri, Some(json!({ "cphone": "777" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["cphone"], "777");
        assert_eq!(updated["cname"], "Acme");
        assert_eq!(updated["remark"], "vip");

        let (_, again) = call(&app, Method::PUT, &uri, Some(updated.clone())).await;
        assert_eq!(again, updated);
    }

    #[tokio::test]
    async fn test_failed_delete_rolls_back_and_reports() {
        let (app, db) = app().await;
        let (_, created) = call(
            &app,
            Method::POST,
            "/api/customers",
            Some(json!({ "cname": "Acme", "cphone": "555", "location": "NYC" })),
        )
        .await;
        call(
            &app,
            Method::POST,
            "/api/invoices",
            Some(json!({ "cid": created["cid"], "amount": 10.0, "issue_date": "2024-03-01" })),
        )
        .await;
        block_deletes(&db, "invoices").await;

        let uri = format!("/api/customers?id={}", created["cid"]);
        let (status, error) = call(&app, Method::DELETE, &uri, None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error["error"], "Failed to delete customer");
        assert!(error["details"].as_str().unwrap().contains("invoices is locked"));
        assert_eq!(count(&db, "customer").await, 1);
        assert_eq!(count(&db, "invoices").await, 1);
    }
}
