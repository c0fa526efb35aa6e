//! Document tree manager: folders and file links attached to a project.

use tracing::info;

use crate::auth::Caller;
use crate::errors::AppError;
use crate::models::{
    AddVersionRequest, CreateDocumentRequest, Document, DocumentNode, DocumentVersion,
};
use crate::portal::access::{authorize_project, require_project_owner};
use crate::portal::tree::build_tree;
use crate::AppState;

const MAX_NAME_LEN: usize = 255;

fn validate_url(url: &str) -> Result<(), AppError> {
    if url.trim().is_empty() {
        return Err(AppError::Validation("URL cannot be empty".to_string()));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(AppError::Validation(
            "URL must start with http:// or https://".to_string(),
        ));
    }
    Ok(())
}

fn validate_create(request: &CreateDocumentRequest) -> Result<CreateDocumentRequest, AppError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Name cannot be longer than {} characters",
            MAX_NAME_LEN
        )));
    }

    match (&request.url, request.is_folder) {
        (Some(_), true) => {
            return Err(AppError::Validation(
                "Folders cannot carry a URL".to_string(),
            ))
        }
        (None, false) => {
            return Err(AppError::Validation("Files require a URL".to_string()));
        }
        (Some(url), false) => validate_url(url)?,
        (None, true) => {}
    }

    Ok(CreateDocumentRequest {
        name: name.to_string(),
        url: request.url.as_ref().map(|u| u.trim().to_string()),
        parent_id: request.parent_id.clone().filter(|p| !p.is_empty()),
        is_folder: request.is_folder,
        tags: request.tags.clone(),
    })
}

/// Create a folder or a file link. Files are subject to the quota.
pub async fn create(
    state: &AppState,
    caller: &Caller,
    project_id: &str,
    request: &CreateDocumentRequest,
) -> Result<Document, AppError> {
    let project = require_project_owner(&state.repo, caller, project_id).await?;
    let request = validate_create(request)?;

    let document = state
        .repo
        .create_document(
            &project,
            &caller.id,
            caller.subscribed,
            &state.config.quota,
            &request,
        )
        .await?;

    info!(
        project_id = %project.id,
        document_id = %document.id,
        is_folder = document.is_folder,
        "Document created"
    );
    Ok(document)
}

/// Every folder in the project as a flat list.
pub async fn list_folders(
    state: &AppState,
    caller: &Caller,
    project_id: &str,
) -> Result<Vec<DocumentNode>, AppError> {
    let (project, _) = authorize_project(&state.repo, caller, project_id).await?;
    let folders = state.repo.list_documents(&project.id, true).await?;
    Ok(folders.iter().map(DocumentNode::from).collect())
}

/// Every file in the project as a flat list.
pub async fn list_files(
    state: &AppState,
    caller: &Caller,
    project_id: &str,
) -> Result<Vec<DocumentNode>, AppError> {
    let (project, _) = authorize_project(&state.repo, caller, project_id).await?;
    let files = state.repo.list_documents(&project.id, false).await?;
    Ok(files.iter().map(DocumentNode::from).collect())
}

/// Assemble the project's forest, optionally starting below `parent_id`.
pub async fn tree(
    state: &AppState,
    caller: &Caller,
    project_id: &str,
    parent_id: Option<&str>,
) -> Result<Vec<DocumentNode>, AppError> {
    let (project, _) = authorize_project(&state.repo, caller, project_id).await?;

    let folders = state.repo.list_documents(&project.id, true).await?;
    let files = state.repo.list_documents(&project.id, false).await?;

    let parent_id = parent_id.filter(|p| !p.is_empty());
    if let Some(parent_id) = parent_id {
        if !folders.iter().any(|f| f.id == parent_id) {
            return Err(AppError::NotFound(format!(
                "Folder {} not found in this project",
                parent_id
            )));
        }
    }

    Ok(build_tree(&folders, &files, parent_id))
}

/// Delete a document and everything below it. Only the creating owner may.
pub async fn delete(
    state: &AppState,
    caller: &Caller,
    document_id: &str,
) -> Result<Vec<String>, AppError> {
    let deleted = state
        .repo
        .delete_document_tree(document_id, &caller.id)
        .await?;

    info!(
        document_id = %document_id,
        deleted = deleted.len(),
        "Document tree deleted"
    );
    Ok(deleted)
}

/// Append a version to a file owned by the caller.
pub async fn add_version(
    state: &AppState,
    caller: &Caller,
    document_id: &str,
    request: &AddVersionRequest,
) -> Result<DocumentVersion, AppError> {
    let document = state
        .repo
        .get_document(document_id)
        .await?
        .filter(|d| d.owner_id == caller.id)
        .ok_or_else(|| AppError::NotFound(format!("Document {} not found", document_id)))?;

    if document.is_folder {
        return Err(AppError::Validation(
            "Folders do not have versions".to_string(),
        ));
    }

    let url = request.url.trim();
    validate_url(url)?;

    let version = state.repo.add_version(&document, url, &caller.id).await?;

    info!(document_id = %document.id, version_id = %version.id, "Version added");
    Ok(version)
}

/// Version history of a document, newest first. Folders have none.
pub async fn list_versions(
    state: &AppState,
    caller: &Caller,
    document_id: &str,
) -> Result<Vec<DocumentVersion>, AppError> {
    let document = state
        .repo
        .get_document(document_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {} not found", document_id)))?;

    authorize_project(&state.repo, caller, &document.project_id).await?;

    if document.is_folder {
        return Ok(Vec::new());
    }
    state.repo.list_versions(&document.id).await
}
