use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CrmError, CrmResult};

pub const DEFAULT_STATUS: &str = "lead";

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Customer {
    pub cid: i64,
    pub cname: String,
    pub cphone: String,
    pub location: String,
    pub status: String,
    pub remark: Option<String>,
}

/// Body of a customer create request
#[derive(Deserialize, Debug, Default)]
pub struct CustomerInput {
    pub cname: Option<String>,
    pub cphone: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub remark: Option<String>,
}

/// A validated customer ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    pub cname: String,
    pub cphone: String,
    pub location: String,
    pub status: String,
    pub remark: Option<String>,
}

/// Result of a customer delete
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDeletion {
    pub message: String,
    pub deleted_invoices: u64,
    pub customer_deleted: bool,
}

/// Partial update of a customer; fields left out keep their stored value.
///
/// Only the mutable columns are recognised, anything else in the body is
/// ignored. `remark: null` clears the remark.
#[derive(Deserialize, Debug, Default)]
pub struct CustomerPatch {
    pub cname: Option<String>,
    pub cphone: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub remark: Option<Option<String>>,
}

fn explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn status_or_default(status: Option<String>) -> String {
    non_empty(status).unwrap_or_else(|| DEFAULT_STATUS.to_string())
}

impl CustomerInput {
    pub fn validate(self) -> CrmResult<NewCustomer> {
        match (
            non_empty(self.cname),
            non_empty(self.cphone),
            non_empty(self.location),
        ) {
            (Some(cname), Some(cphone), Some(location)) => Ok(NewCustomer {
                cname,
                cphone,
                location,
                status: status_or_default(self.status),
                remark: non_empty(self.remark),
            }),
            _ => Err(CrmError::Validation(
                "Name, phone, and location are required".into(),
            )),
        }
    }
}

impl CustomerPatch {
    /// Shallow-merge the supplied fields over `existing`
    pub fn merge(self, existing: Customer) -> CrmResult<Customer> {
        let merged = Customer {
            cid: existing.cid,
            cname: self.cname.unwrap_or(existing.cname),
            cphone: self.cphone.unwrap_or(existing.cphone),
            location: self.location.unwrap_or(existing.location),
            status: status_or_default(self.status.or(Some(existing.status))),
            remark: non_empty(self.remark.unwrap_or(existing.remark)),
        };

        if [&merged.cname, &merged.cphone, &merged.location]
            .iter()
            .any(|v| v.trim().is_empty())
        {
            return Err(CrmError::Validation(
                "Name, phone, and location cannot be empty".into(),
            ));
        }

        Ok(merged)
    }
}
