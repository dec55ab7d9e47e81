use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::RelatedRecords;

#[derive(Error, Debug)]
pub enum CrmError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Cannot delete project: {} related record(s) exist", .0.related_records)]
    RelatedRecords(RelatedRecords),

    #[error("{context}: {source}")]
    DeleteFailed {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CrmResult<T> = Result<T, CrmError>;

impl From<JsonRejection> for CrmError {
    fn from(rejection: JsonRejection) -> Self {
        CrmError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl CrmError {
    pub fn status(&self) -> StatusCode {
        match self {
            CrmError::Validation(_) => StatusCode::BAD_REQUEST,
            CrmError::NotFound(_) => StatusCode::NOT_FOUND,
            CrmError::RelatedRecords(_) => StatusCode::CONFLICT,
            CrmError::DeleteFailed { .. } | CrmError::Database(_) | CrmError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for CrmError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            CrmError::Validation(msg) | CrmError::NotFound(msg) => json!({ "error": msg }),
            CrmError::RelatedRecords(related) => {
                tracing::info!(
                    related = related.related_records,
                    stock = related.stock_transactions(),
                    spending = related.spending_records,
                    "project delete blocked by related records"
                );
                json!({
                    "error": self.to_string(),
                    "type": "related_records_exist",
                    "relatedRecords": related.related_records,
                    "hasSpending": related.has_spending,
                    "spendingRecords": related.spending_records,
                })
            }
            CrmError::DeleteFailed { context, source } => {
                tracing::error!("Delete error: {:?}", source);
                json!({ "error": context, "details": source.to_string() })
            }
            CrmError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                json!({ "error": "Internal Server Error" })
            }
            CrmError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                json!({ "error": "Internal Server Error" })
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(error: CrmError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_conflict_body_carries_counts() {
        let (status, body) = body_of(CrmError::RelatedRecords(RelatedRecords::new(2, 1))).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["type"], "related_records_exist");
        assert_eq!(body["relatedRecords"], 3);
        assert_eq!(body["hasSpending"], true);
        assert_eq!(body["spendingRecords"], 1);
    }

    #[tokio::test]
    async fn test_database_errors_are_generic() {
        let (status, body) = body_of(CrmError::Database(sqlx::Error::RowNotFound)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal Server Error" }));
    }

    #[tokio::test]
    async fn test_delete_failure_reports_details() {
        let (status, body) = body_of(CrmError::DeleteFailed {
            context: "Failed to delete customer",
            source: sqlx::Error::PoolClosed,
        })
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to delete customer");
        assert!(body["details"].is_string());
    }
}
