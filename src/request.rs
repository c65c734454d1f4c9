//! Analytics request record - the document written by the persister.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Requester identity, produced by a successful validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BasicInfo {
    pub name: String,
    pub role: String,
    pub department: String,
    /// When the requester needs the work completed
    pub timeline: String,
    #[serde(deserialize_with = "local_timestamp")]
    pub collected_at: DateTime<Local>,
}

/// Parse an ISO 8601 timestamp.
///
/// RFC 3339 values keep their instant; values without an offset are read as
/// local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    if let Ok(stamped) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamped.with_timezone(&Local));
    }
    let naive: NaiveDateTime = raw.parse().ok()?;
    Local.from_local_datetime(&naive).earliest()
}

fn local_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Local>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp `{}`", raw)))
}

/// Which specialist handles the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    /// One-off reports
    Reports,
    /// New dashboards or changes to existing ones
    Dashboard,
    /// Updates to existing reports or analytics
    Updates,
}

impl RequestType {
    pub const ALL: [RequestType; 3] = [Self::Reports, Self::Dashboard, Self::Updates];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reports => "reports",
            Self::Dashboard => "dashboard",
            Self::Updates => "updates",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown request type `{0}` (expected reports, dashboard or updates)")]
pub struct UnknownRequestType(pub String);

impl FromStr for RequestType {
    type Err = UnknownRequestType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "report" | "reports" => Ok(Self::Reports),
            "2" | "dashboard" | "dashboards" => Ok(Self::Dashboard),
            "3" | "update" | "updates" => Ok(Self::Updates),
            other => Err(UnknownRequestType(other.to_string())),
        }
    }
}

/// A single requirement answer: free text or a list of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RequirementValue {
    Text(String),
    List(Vec<String>),
}

impl RequirementValue {
    /// Split a list answer on commas and semicolons, dropping blank items
    pub fn list_from_answer(answer: &str) -> Self {
        let items = answer
            .split([',', ';'])
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();
        Self::List(items)
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Text(_) => 1,
            Self::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }
}

impl From<&str> for RequirementValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<&str>> for RequirementValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(str::to_string).collect())
    }
}

pub type Requirements = BTreeMap<String, RequirementValue>;

/// Review state of a persisted request.
///
/// The persister only ever writes `pending_review`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    PendingReview,
    InReview,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RequestMetadata {
    #[serde(deserialize_with = "local_timestamp")]
    pub created_at: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub status: RequestStatus,
}

/// Error payload stored in place of a summary when generation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SummaryFailure {
    pub status: String,
    pub message: String,
}

/// Prose recap of a request, or the failure that prevented one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RequestSummary {
    Generated(String),
    Failed(SummaryFailure),
}

impl RequestSummary {
    pub fn failed(cause: impl fmt::Display) -> Self {
        Self::Failed(SummaryFailure {
            status: "error".to_string(),
            message: format!("Failed to generate summary: {}", cause),
        })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// The full intake document.
///
/// Top-level keys this crate does not model are kept in `extra` and written
/// back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalyticsRequest {
    pub basic_info: BasicInfo,
    pub request_type: RequestType,
    #[serde(default)]
    pub requirements: Requirements,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_summary: Option<RequestSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RequestMetadata>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalyticsRequest {
    pub fn new(
        basic_info: BasicInfo,
        request_type: RequestType,
        requirements: Requirements,
    ) -> Self {
        Self {
            basic_info,
            request_type,
            requirements,
            request_summary: None,
            metadata: None,
            extra: Map::new(),
        }
    }

    /// Short one-line description returned to the driver after a save
    pub fn short_summary(&self) -> String {
        format!(
            "Request type: {}, Requester: {}",
            self.request_type, self.basic_info.name
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IncompleteRecord {
    #[error("basic info has not been validated yet")]
    MissingBasicInfo,
    #[error("request type has not been chosen yet")]
    MissingRequestType,
}

/// Intake record accumulated over a conversation, before persistence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntakeRecord {
    pub draft: BasicInfoDraft,
    pub basic_info: Option<BasicInfo>,
    pub request_type: Option<RequestType>,
    pub requirements: Requirements,
}

/// Raw, unvalidated answers for the four basic fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasicInfoDraft {
    pub name: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub timeline: Option<String>,
}

impl BasicInfoDraft {
    pub fn is_complete(&self) -> bool {
        self.name.is_some()
            && self.role.is_some()
            && self.department.is_some()
            && self.timeline.is_some()
    }
}

impl IntakeRecord {
    pub fn finalize(self) -> Result<AnalyticsRequest, IncompleteRecord> {
        let basic_info = self.basic_info.ok_or(IncompleteRecord::MissingBasicInfo)?;
        let request_type = self
            .request_type
            .ok_or(IncompleteRecord::MissingRequestType)?;
        Ok(AnalyticsRequest::new(
            basic_info,
            request_type,
            self.requirements,
        ))
    }
}
