//! Client side of the CRM API, used by the terminal pages.

mod http;

pub use http::HttpCrmApi;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Customer, Project, ProjectDeletion, ProjectPayload, RelatedRecords};

#[derive(Error, Debug)]
pub enum ApiError {
    /// Non-success answer; `message` is the server's `error` text when it
    /// sent one
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Outcome of a delete request that the server did not reject outright
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteAttempt {
    Deleted(ProjectDeletion),
    /// 409 `related_records_exist`: the project still has dependents
    Blocked(RelatedRecords),
}

/// Operations the projects page needs from the API
#[async_trait]
pub trait CrmApi: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError>;

    async fn list_customers(&self) -> Result<Vec<Customer>, ApiError>;

    async fn create_project(&self, payload: &ProjectPayload) -> Result<Project, ApiError>;

    async fn update_project(&self, pid: i64, payload: &ProjectPayload) -> Result<Project, ApiError>;

    async fn delete_project(&self, pid: i64, cascade: bool) -> Result<DeleteAttempt, ApiError>;
}
