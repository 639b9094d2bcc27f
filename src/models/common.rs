use serde::{Deserialize, Serialize};

/// Reference to another ARM resource by id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubResource {
    /// Resource id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl SubResource {
    /// Reference `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }
}

/// One page of a list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<T> {
    /// Items on this page
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    /// URL of the next page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
}
