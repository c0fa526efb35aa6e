//! Document tree models: folders, file links and their versions.

use serde::{Deserialize, Serialize};

/// Type discriminator for documents managed by the tree.
pub const FILE_LINK_TYPE: &str = "file-link";

/// A node in a project's folder/file forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub project_id: String,
    pub owner_id: String,
    pub title: String,
    pub is_folder: bool,
    pub parent_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub doc_type: String,
    /// Resolved from the most recent version; always `None` for folders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Immutable snapshot of a file's content reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentVersion {
    pub id: String,
    pub document_id: String,
    pub file_url: String,
    pub uploaded_by: String,
    pub created_at: String,
}

/// Tree listing node consumed by the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentNode {
    pub id: String,
    pub name: String,
    pub is_folder: bool,
    pub parent_id: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocumentNode>,
}

impl From<&Document> for DocumentNode {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            name: doc.title.clone(),
            is_folder: doc.is_folder,
            parent_id: doc.parent_id.clone(),
            created_at: doc.created_at.clone(),
            url: doc.url.clone(),
            children: Vec::new(),
        }
    }
}

/// Request body for creating a folder or file link.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub is_folder: bool,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Request body for appending a new version to a file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddVersionRequest {
    pub url: String,
}

/// Query string for the tree endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeQuery {
    #[serde(default)]
    pub parent_id: Option<String>,
}
