use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::require_id;
use crate::db::Database;
use crate::error::{CrmError, CrmResult};
use crate::models::{NewProject, ProjectPayload};

#[derive(Deserialize, Debug, Default)]
pub struct TaskQuery {
    #[serde(alias = "id")]
    pub pid: Option<String>,
    pub cascade: Option<String>,
}

impl TaskQuery {
    fn cascade(&self) -> bool {
        self.cascade
            .as_deref()
            .is_some_and(|flag| flag.eq_ignore_ascii_case("true") || flag == "1")
    }
}

fn not_found() -> CrmError {
    CrmError::NotFound("Project not found".into())
}

async fn ensure_customer(db: &Database, project: &NewProject) -> CrmResult<()> {
    if db.customer_exists(project.cid).await? {
        Ok(())
    } else {
        Err(CrmError::Validation(format!(
            "Customer {} does not exist",
            project.cid
        )))
    }
}

/// `GET /api/tasks` answers a bare array, `GET /api/tasks?pid=` one project
pub async fn get_projects(
    State(db): State<Database>,
    Query(query): Query<TaskQuery>,
) -> CrmResult<Response> {
    if query.pid.is_none() {
        return Ok(Json(db.get_projects().await?).into_response());
    }

    let pid = require_id(query.pid.as_deref(), "Project")?;
    let project = db.get_project(pid).await?.ok_or_else(not_found)?;

    Ok(Json(project).into_response())
}

pub async fn create_project(
    State(db): State<Database>,
    payload: Result<Json<ProjectPayload>, JsonRejection>,
) -> CrmResult<Response> {
    let Json(payload) = payload?;
    let project = payload.validate()?;
    ensure_customer(&db, &project).await?;

    let project = db.create_project(&project).await?;

    tracing::info!(pid = project.pid, cid = project.cid, "project created");
    Ok((StatusCode::CREATED, Json(project)).into_response())
}

pub async fn update_project(
    State(db): State<Database>,
    Query(query): Query<TaskQuery>,
    payload: Result<Json<ProjectPayload>, JsonRejection>,
) -> CrmResult<Response> {
    let pid = require_id(query.pid.as_deref(), "Project")?;
    let Json(payload) = payload?;

    // Fields left out of the body keep their stored value
    let existing = db.get_project(pid).await?.ok_or_else(not_found)?;
    let project = payload.merged_over(&existing).validate()?;
    if project.cid != existing.cid {
        ensure_customer(&db, &project).await?;
    }

    let project = db.update_project(pid, &project).await?.ok_or_else(not_found)?;

    tracing::info!(pid, "project updated");
    Ok(Json(project).into_response())
}

/// Refuses with 409 while stock or spending rows exist, unless
/// `cascade=true` is passed
pub async fn delete_project(
    State(db): State<Database>,
    Query(query): Query<TaskQuery>,
) -> CrmResult<Response> {
    let pid = require_id(query.pid.as_deref(), "Project")?;
    let cascade = query.cascade();

    if !db.project_exists(pid).await? {
        return Err(not_found());
    }

    // Dependents turn a plain delete into a 409
    let deletion = db.delete_project(pid, cascade).await?;

    tracing::info!(
        pid,
        cascade,
        transactions = deletion.deleted_transactions,
        spending = deletion.deleted_spending,
        "project deleted"
    );
    Ok(Json(deletion).into_response())
}
