//! Document tree API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;

use super::{created, success, ApiResult};
use crate::auth::Caller;
use crate::models::{
    AddVersionRequest, CreateDocumentRequest, Document, DocumentNode, DocumentVersion, TreeQuery,
};
use crate::portal::documents;
use crate::AppState;

/// Response for a recursive delete.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedDocuments {
    pub deleted_ids: Vec<String>,
}

/// GET /api/projects/{projectId}/folders - All folders in the project.
pub async fn list_folders(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<String>,
) -> ApiResult<Vec<DocumentNode>> {
    success(documents::list_folders(&state, &caller, &project_id).await?)
}

/// GET /api/projects/{projectId}/files - All files in the project.
pub async fn list_files(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<String>,
) -> ApiResult<Vec<DocumentNode>> {
    success(documents::list_files(&state, &caller, &project_id).await?)
}

/// GET /api/projects/{projectId}/tree?parentId= - Assembled folder/file forest.
pub async fn get_tree(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<String>,
    Query(query): Query<TreeQuery>,
) -> ApiResult<Vec<DocumentNode>> {
    success(documents::tree(&state, &caller, &project_id, query.parent_id.as_deref()).await?)
}

/// POST /api/projects/{projectId}/documents - Create a folder or file link.
pub async fn create_document(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<String>,
    Json(request): Json<CreateDocumentRequest>,
) -> ApiResult<Document> {
    created(documents::create(&state, &caller, &project_id, &request).await?)
}

/// DELETE /api/documents/{documentId} - Delete a document and its subtree.
pub async fn delete_document(
    State(state): State<AppState>,
    caller: Caller,
    Path(document_id): Path<String>,
) -> ApiResult<DeletedDocuments> {
    let deleted_ids = documents::delete(&state, &caller, &document_id).await?;
    success(DeletedDocuments { deleted_ids })
}

/// GET /api/documents/{documentId}/versions - Version history.
pub async fn list_versions(
    State(state): State<AppState>,
    caller: Caller,
    Path(document_id): Path<String>,
) -> ApiResult<Vec<DocumentVersion>> {
    success(documents::list_versions(&state, &caller, &document_id).await?)
}

/// POST /api/documents/{documentId}/versions - Append a version.
pub async fn add_version(
    State(state): State<AppState>,
    caller: Caller,
    Path(document_id): Path<String>,
    Json(request): Json<AddVersionRequest>,
) -> ApiResult<DocumentVersion> {
    created(documents::add_version(&state, &caller, &document_id, &request).await?)
}
