use serde::{Deserialize, Serialize};

/// Directory entry: a stable researcher id and its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Researcher {
    pub id: String,
    pub name: String,
}
