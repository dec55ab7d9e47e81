use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates::{self, parse_calendar_date};
use crate::error::{CrmError, CrmResult};

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Project {
    pub pid: i64,
    pub pname: String,
    pub start_date: String,
    #[serde(with = "dates::tbd", default)]
    pub end_date: Option<String>,
    pub status: String,
    pub cid: i64,
    /// Name of the owning customer, joined in on reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cname: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectStatus {
    Ongoing,
    OnHold,
    Completed,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 3] = [
        ProjectStatus::Ongoing,
        ProjectStatus::OnHold,
        ProjectStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Ongoing => "ongoing",
            ProjectStatus::OnHold => "on hold",
            ProjectStatus::Completed => "completed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::Ongoing => "Ongoing",
            ProjectStatus::OnHold => "On Hold",
            ProjectStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                CrmError::Validation(format!(
                    "Status must be one of: ongoing, on hold, completed (got '{}')",
                    s
                ))
            })
    }
}

/// Project fields as they travel over the wire.
///
/// Used both for creation, where `pname`, `start_date` and `cid` are
/// required, and for updates, where missing fields keep their stored value.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ProjectPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<i64>,
}

/// A validated project row
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub pname: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: ProjectStatus,
    pub cid: i64,
}

impl NewProject {
    pub fn start_date_string(&self) -> String {
        self.start_date.format("%Y-%m-%d").to_string()
    }

    pub fn end_date_string(&self) -> Option<String> {
        self.end_date.map(|date| date.format("%Y-%m-%d").to_string())
    }
}

impl ProjectPayload {
    pub fn validate(self) -> CrmResult<NewProject> {
        let pname = self.pname.filter(|name| !name.trim().is_empty());
        let start_date = self.start_date.filter(|date| !date.trim().is_empty());

        let (Some(pname), Some(start_date), Some(cid)) = (pname, start_date, self.cid) else {
            return Err(CrmError::Validation(
                "Project name, start date, and customer are required".into(),
            ));
        };

        let start_date = parse_calendar_date(&start_date)
            .ok_or_else(|| CrmError::Validation("Start date is invalid".into()))?;

        let end_date = match self.end_date.as_deref() {
            Some(end) if !dates::is_absent(end) => Some(
                parse_calendar_date(end)
                    .ok_or_else(|| CrmError::Validation("End date is invalid".into()))?,
            ),
            _ => None,
        };

        if end_date.is_some_and(|end| end < start_date) {
            return Err(CrmError::Validation(
                "End date cannot be before the start date".into(),
            ));
        }

        let status = match self.status.as_deref() {
            Some(status) if !status.trim().is_empty() => status.parse()?,
            _ => ProjectStatus::Ongoing,
        };

        Ok(NewProject {
            pname,
            start_date,
            end_date,
            status,
            cid,
        })
    }

    /// Fill the fields this payload leaves out from `existing`.
    ///
    /// An `end_date` of `"TBD"` clears the stored end date.
    pub fn merged_over(self, existing: &Project) -> ProjectPayload {
        ProjectPayload {
            pname: self.pname.or_else(|| Some(existing.pname.clone())),
            start_date: self
                .start_date
                .or_else(|| Some(existing.start_date.clone())),
            end_date: self.end_date.or_else(|| existing.end_date.clone()),
            status: self.status.or_else(|| Some(existing.status.clone())),
            cid: self.cid.or(Some(existing.cid)),
        }
    }
}

/// Dependent rows that block a project delete
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RelatedRecords {
    /// Total dependent rows, stock transactions plus spending records
    pub related_records: i64,
    pub has_spending: bool,
    pub spending_records: i64,
}

impl RelatedRecords {
    pub fn new(stock_transactions: i64, spending_records: i64) -> Self {
        Self {
            related_records: stock_transactions + spending_records,
            has_spending: spending_records > 0,
            spending_records,
        }
    }

    pub fn stock_transactions(&self) -> i64 {
        self.related_records - self.spending_records
    }

    pub fn is_empty(&self) -> bool {
        self.related_records == 0
    }
}

/// Result of a project delete that went through
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDeletion {
    pub message: String,
    pub deleted_transactions: u64,
    pub deleted_spending: u64,
    pub project_deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> ProjectPayload {
        serde_json::from_str(json).unwrap()
    }

    fn existing() -> Project {
        Project {
            pid: 3,
            pname: "Warehouse fit-out".into(),
            start_date: "2024-01-10".into(),
            end_date: Some("2024-06-30".into()),
            status: "on hold".into(),
            cid: 1,
            cname: Some("Acme".into()),
        }
    }

    #[test]
    fn test_validate_defaults_status_and_tbd_end_date() {
        let project = payload(
            r#"{"pname":"Roof","start_date":"2024-05-01","end_date":"TBD","cid":4}"#,
        )
        .validate()
        .unwrap();

        assert_eq!(project.status, ProjectStatus::Ongoing);
        assert_eq!(project.end_date, None);
        assert_eq!(project.start_date_string(), "2024-05-01");
    }

    #[test]
    fn test_validate_requires_name_start_and_customer() {
        for body in [
            r#"{"start_date":"2024-05-01","cid":4}"#,
            r#"{"pname":"Roof","cid":4}"#,
            r#"{"pname":"Roof","start_date":"2024-05-01"}"#,
            r#"{"pname":"  ","start_date":"2024-05-01","cid":4}"#,
        ] {
            assert!(matches!(payload(body).validate(), Err(CrmError::Validation(_))));
        }
    }

    #[test]
    fn test_validate_rejects_bad_dates_and_status() {
        for body in [
            r#"{"pname":"Roof","start_date":"soon","cid":4}"#,
            r#"{"pname":"Roof","start_date":"2024-05-01","end_date":"later","cid":4}"#,
            r#"{"pname":"Roof","start_date":"2024-05-01","end_date":"2024-04-01","cid":4}"#,
            r#"{"pname":"Roof","start_date":"2024-05-01","status":"paused","cid":4}"#,
        ] {
            assert!(matches!(payload(body).validate(), Err(CrmError::Validation(_))));
        }
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!("On Hold".parse::<ProjectStatus>().unwrap(), ProjectStatus::OnHold);
        assert_eq!("completed".parse::<ProjectStatus>().unwrap(), ProjectStatus::Completed);
    }

    #[test]
    fn test_merge_keeps_unsupplied_fields() {
        let merged = payload(r#"{"status":"completed"}"#).merged_over(&existing());
        let project = merged.validate().unwrap();

        assert_eq!(project.pname, "Warehouse fit-out");
        assert_eq!(project.status, ProjectStatus::Completed);
        assert_eq!(project.end_date_string().as_deref(), Some("2024-06-30"));
    }

    #[test]
    fn test_merge_tbd_clears_end_date() {
        let merged = payload(r#"{"end_date":"TBD"}"#).merged_over(&existing());
        assert_eq!(merged.validate().unwrap().end_date, None);
    }

    #[test]
    fn test_project_end_date_travels_as_tbd() {
        let project = Project { end_date: None, ..existing() };
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["end_date"], "TBD");

        let back: Project = serde_json::from_value(json).unwrap();
        assert_eq!(back.end_date, None);
    }

    #[test]
    fn test_related_records_totals() {
        let related = RelatedRecords::new(3, 2);
        assert_eq!(related.related_records, 5);
        assert_eq!(related.stock_transactions(), 3);
        assert!(related.has_spending);

        let json = serde_json::to_value(related).unwrap();
        assert_eq!(json["relatedRecords"], 5);
        assert_eq!(json["hasSpending"], true);
        assert_eq!(json["spendingRecords"], 2);
    }
}
