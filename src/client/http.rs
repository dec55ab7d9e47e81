use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::{ApiError, CrmApi, DeleteAttempt};
use crate::models::{Customer, Project, ProjectPayload, RelatedRecords};

/// [`CrmApi`] over HTTP
#[derive(Clone)]
pub struct HttpCrmApi {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct CustomerList {
    customers: Vec<Customer>,
}

impl HttpCrmApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turn a non-success response into an error carrying the server's message
async fn status_error(response: Response, fallback: &str) -> ApiError {
    let status = response.status().as_u16();
    let message = response
        .json::<Value>()
        .await
        .ok()
        .as_ref()
        .and_then(|body| body.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string());

    ApiError::Status { status, message }
}

#[async_trait]
impl CrmApi for HttpCrmApi {
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        let response = self.client.get(self.url("/api/tasks")).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response, "Failed to fetch projects").await);
        }

        Ok(response.json().await?)
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, ApiError> {
        let response = self.client.get(self.url("/api/customers")).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response, "Failed to fetch customers").await);
        }

        let list: CustomerList = response.json().await?;
        Ok(list.customers)
    }

    async fn create_project(&self, payload: &ProjectPayload) -> Result<Project, ApiError> {
        let response = self
            .client
            .post(self.url("/api/tasks"))
            .json(payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response, "Failed to save project").await);
        }

        Ok(response.json().await?)
    }

    async fn update_project(&self, pid: i64, payload: &ProjectPayload) -> Result<Project, ApiError> {
        let response = self
            .client
            .put(self.url(&format!("/api/tasks?pid={}", pid)))
            .json(payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response, "Failed to save project").await);
        }

        Ok(response.json().await?)
    }

    async fn delete_project(&self, pid: i64, cascade: bool) -> Result<DeleteAttempt, ApiError> {
        let (path, fallback) = if cascade {
            (
                format!("/api/tasks?pid={}&cascade=true", pid),
                "Failed to delete project and related records",
            )
        } else {
            (format!("/api/tasks?pid={}", pid), "Failed to delete project")
        };

        let response = self.client.delete(self.url(&path)).send().await?;
        let status = response.status();

        if status == StatusCode::CONFLICT {
            let body: Value = response.json().await?;
            if body.get("type").and_then(Value::as_str) == Some("related_records_exist") {
                let related: RelatedRecords = serde_json::from_value(body)?;
                return Ok(DeleteAttempt::Blocked(related));
            }
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or(fallback)
                .to_string();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if !status.is_success() {
            return Err(status_error(response, fallback).await);
        }

        Ok(DeleteAttempt::Deleted(response.json().await?))
    }
}
