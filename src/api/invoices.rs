use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::{optional_id, require_id, IdQuery};
use crate::db::Database;
use crate::error::{CrmError, CrmResult};
use crate::models::InvoiceInput;

#[derive(Deserialize, Debug, Default)]
pub struct InvoiceFilter {
    pub cid: Option<String>,
}

pub async fn get_invoices(
    State(db): State<Database>,
    Query(filter): Query<InvoiceFilter>,
) -> CrmResult<Response> {
    let cid = optional_id(filter.cid.as_deref(), "Customer")?;
    let invoices = db.get_invoices(cid).await?;

    Ok(Json(json!({ "invoices": invoices })).into_response())
}

pub async fn create_invoice(
    State(db): State<Database>,
    payload: Result<Json<InvoiceInput>, JsonRejection>,
) -> CrmResult<Response> {
    let Json(input) = payload?;
    let invoice = input.validate()?;

    // The invoice must point at an existing customer
    if !db.customer_exists(invoice.cid).await? {
        return Err(CrmError::Validation(format!(
            "Customer {} does not exist",
            invoice.cid
        )));
    }

    let invoice = db.create_invoice(&invoice).await?;

    tracing::info!(iid = invoice.iid, cid = invoice.cid, "invoice created");
    Ok((StatusCode::CREATED, Json(invoice)).into_response())
}

pub async fn delete_invoice(
    State(db): State<Database>,
    Query(query): Query<IdQuery>,
) -> CrmResult<Response> {
    let iid = require_id(query.id.as_deref(), "Invoice")?;

    if !db.delete_invoice(iid).await? {
        return Err(CrmError::NotFound("Invoice not found".into()));
    }

    Ok(Json(json!({ "message": "Invoice deleted successfully" })).into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::api::testing::{app, call};

    #[tokio::test]
    async fn test_invoices_filter_by_customer() {
        let (app, _db) = app().await;
        let mut cids = Vec::new();
        for name in ["Acme", "Globex"] {
            let (_, customer) = call(
                &app,
                Method::POST,
                "/api/customers",
                Some(json!({ "cname": name, "cphone": "1", "location": "LA" })),
            )
            .await;
            cids.push(customer["cid"].clone());
        }
        for (cid, amount) in [(&cids[0], 10.0), (&cids[0], 20.0), (&cids[1], 30.0)] {
            let (status, invoice) = call(
                &app,
                Method::POST,
                "/api/invoices",
                Some(json!({ "cid": cid, "amount": amount, "issue_date": "2024-04-01" })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(invoice["status"], "unpaid");
        }

        let (_, all) = call(&app, Method::GET, "/api/invoices", None).await;
        assert_eq!(all["invoices"].as_array().unwrap().len(), 3);

        let uri = format!("/api/invoices?cid={}", cids[0]);
        let (_, acme) = call(&app, Method::GET, &uri, None).await;
        assert_eq!(acme["invoices"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invoice_for_unknown_customer_is_rejected() {
        let (app, _db) = app().await;

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/invoices",
            Some(json!({ "cid": 5, "amount": 1.0, "issue_date": "2024-04-01" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_invoice() {
        let (app, _db) = app().await;
        let (_, customer) = call(
            &app,
            Method::POST,
            "/api/customers",
            Some(json!({ "cname": "Acme", "cphone": "1", "location": "LA" })),
        )
        .await;
        let (_, invoice) = call(
            &app,
            Method::POST,
            "/api/invoices",
            Some(json!({ "cid": customer["cid"], "amount": 5.0, "issue_date": "2024-04-01" })),
        )
        .await;

        let uri = format!("/api/invoices?id={}", invoice["iid"]);
        let (status, _) = call(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
