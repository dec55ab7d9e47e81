//! HTTP JSON API
//!
//! One handler module per resource. Every handler borrows a pooled
//! connection through [`Database`], validates its input and answers with a
//! JSON body; failures go through [`CrmError`]'s `IntoResponse`.

mod customers;
mod inventory;
mod invoices;
mod tasks;

use anyhow::Result;
use axum::{
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Database;
use crate::error::{CrmError, CrmResult};

/// Build the API router over a database handle
pub fn router(db: Database) -> Router {
    Router::new()
        .route(
            "/api/customers",
            get(customers::get_customers)
                .post(customers::create_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        )
        .route(
            "/api/tasks",
            get(tasks::get_projects)
                .post(tasks::create_project)
                .put(tasks::update_project)
                .delete(tasks::delete_project),
        )
        .route(
            "/api/invoices",
            get(invoices::get_invoices)
                .post(invoices::create_invoice)
                .delete(invoices::delete_invoice),
        )
        .route(
            "/api/inventory/transactions",
            get(inventory::get_transactions).post(inventory::create_transaction),
        )
        .route(
            "/api/inventory/spending",
            get(inventory::get_spending).post(inventory::create_spending),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(db)
}

/// Serve the API until the process is stopped
pub async fn serve(config: &Config, db: Database) -> Result<()> {
    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router(db)).await?;

    Ok(())
}

/// `?id=` (or `?cid=`) query parameter
#[derive(Deserialize, Debug, Default)]
pub struct IdQuery {
    #[serde(alias = "cid")]
    pub id: Option<String>,
}

/// Parse a required row id from the query string
pub(crate) fn require_id(raw: Option<&str>, entity: &str) -> CrmResult<i64> {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Err(CrmError::Validation(format!("{} ID is required", entity))),
        Some(raw) => raw
            .parse()
            .map_err(|_| CrmError::Validation(format!("Invalid {} ID: {}", entity.to_lowercase(), raw))),
    }
}

/// Parse an optional filter id from the query string
pub(crate) fn optional_id(raw: Option<&str>, entity: &str) -> CrmResult<Option<i64>> {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(None),
        Some(raw) => require_id(Some(raw), entity).map(Some),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::db::testing::memory_db;
    use crate::db::Database;

    pub async fn app() -> (Router, Database) {
        let db = memory_db().await;
        (super::router(db.clone()), db)
    }

    /// Send one request through the router and decode the JSON answer
    pub async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }
}
