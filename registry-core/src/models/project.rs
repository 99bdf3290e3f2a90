use serde::{Deserialize, Serialize};

/// A stored research project, keyed by `project_number`.
///
/// Investigator ids are soft references into the researcher directory; they
/// may dangle if a researcher is renamed or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub project_number: String,
    pub project_type: String,
    pub project_name: String,
    pub principal_investigator_id: String,
    pub co_investigator_id: Option<String>,
    pub delivery_campus: String,
    pub delivery_location: String,
    pub install_campus: String,
    pub install_location: String,
}

/// A create-or-update submission.
///
/// Every field is optional on the wire so that missing required values are
/// reported as validation failures rather than decode errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconcileProjectInput {
    pub project_number: Option<String>,
    pub project_type: Option<String>,
    pub project_name: Option<String>,
    pub principal_investigator_id: Option<String>,
    pub co_investigator_id: Option<String>,
    pub delivery_campus: Option<String>,
    pub delivery_location: Option<String>,
    pub install_campus: Option<String>,
    pub install_location: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    Created,
    Updated,
}

impl ReconcileOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileResponse {
    pub status: ReconcileOutcome,
}
