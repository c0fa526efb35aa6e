//! Database repository for portal, membership and document operations.
//!
//! Uses prepared statements and transactions for data integrity. Every
//! multi-statement mutation runs inside a single transaction.

use std::collections::HashSet;

use chrono::{SecondsFormat, Utc};
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    actions, ActivityEntry, CreateDocumentRequest, CreateProjectRequest, Document,
    DocumentVersion, MemberRole, MemberStatus, MemberView, Portal, PortalMember, Project,
    ProjectView, FILE_LINK_TYPE,
};
use crate::portal::quota::QuotaPolicy;

/// Timestamps are fixed-width RFC 3339 so that text ordering matches time ordering.
pub fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

const PROJECT_COLUMNS: &str = r#"p.id, p.owner_id, p.name, p.description, p.created_at,
    p.updated_at, po.id AS portal_id"#;

const MEMBER_COLUMNS: &str = r#"pm.id, pm.portal_id, pm.user_id, pm.email, pm.role, pm.status,
    pm.invited_by, pm.invite_token, pm.created_at, pm.updated_at"#;

const DOCUMENT_COLUMNS: &str = r#"d.id, d.project_id, d.owner_id, d.title, d.is_folder,
    d.parent_id, d.tags, d.doc_type, d.created_at, d.updated_at,
    (SELECT v.file_url FROM document_versions v
        WHERE v.document_id = d.id
        ORDER BY v.created_at DESC, v.rowid DESC LIMIT 1) AS url"#;

/// Outcome of an invite upsert.
#[derive(Debug, Clone)]
pub struct InviteOutcome {
    pub member: PortalMember,
    /// False when the row was already active and left untouched
    pub changed: bool,
}

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ==================== USER OPERATIONS ====================

    /// Find the registered account that owns an email, if any.
    pub async fn find_user_id_by_email(&self, email: &str) -> Result<Option<String>, AppError> {
        let id = sqlx::query_scalar(
            "SELECT id FROM users WHERE email = ? ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    // ==================== PROJECT OPERATIONS ====================

    /// Create a project together with its portal.
    ///
    /// The owner's row is written first so concurrent creations for the same
    /// owner serialize on the writer lock before the count is taken.
    pub async fn create_project(
        &self,
        owner_id: &str,
        owner_email: &str,
        subscribed: bool,
        quota: &QuotaPolicy,
        request: &CreateProjectRequest,
    ) -> Result<Project, AppError> {
        let mut tx = self.pool.begin().await?;

        upsert_user(&mut tx, owner_id, owner_email).await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_one(&mut *tx)
            .await?;

        if !quota.can_create_project(subscribed, count) {
            return Err(AppError::QuotaExceeded(format!(
                "Free plan is limited to {} projects; upgrade to create more",
                quota.max_free_projects
            )));
        }

        let now = now();
        let project_id = uuid::Uuid::new_v4().to_string();
        let portal_id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO projects (id, owner_id, name, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&project_id)
        .bind(owner_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO portals (id, project_id, name, owner_id, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&portal_id)
        .bind(&project_id)
        .bind(&request.name)
        .bind(owner_id)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        insert_activity(&mut tx, &project_id, owner_id, actions::PROJECT_CREATED, None).await?;

        tx.commit().await?;

        Ok(Project {
            id: project_id,
            owner_id: owner_id.to_string(),
            name: request.name.clone(),
            description: request.description.clone(),
            portal_id,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Get a project by ID.
    pub async fn get_project(&self, id: &str) -> Result<Option<Project>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects p JOIN portals po ON po.project_id = p.id WHERE p.id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(project_from_row))
    }

    /// List projects the caller owns or is an active member of.
    pub async fn list_projects_for(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<Vec<ProjectView>, AppError> {
        let rows = sqlx::query(&format!(
            r#"SELECT {PROJECT_COLUMNS},
                   CASE WHEN p.owner_id = ?1 THEN 'owner' ELSE (
                       SELECT pm.role FROM portal_members pm
                       WHERE pm.portal_id = po.id AND pm.status = 'active'
                         AND (pm.user_id = ?1 OR pm.email = ?2)
                       LIMIT 1
                   ) END AS role
               FROM projects p JOIN portals po ON po.project_id = p.id
               WHERE p.owner_id = ?1 OR EXISTS (
                   SELECT 1 FROM portal_members pm
                   WHERE pm.portal_id = po.id AND pm.status = 'active'
                     AND (pm.user_id = ?1 OR pm.email = ?2)
               )
               ORDER BY p.created_at DESC"#
        ))
        .bind(user_id)
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let role: Option<String> = row.get("role");
                ProjectView {
                    project: project_from_row(row),
                    role: role
                        .as_deref()
                        .and_then(MemberRole::parse)
                        .unwrap_or_default(),
                }
            })
            .collect())
    }

    /// Delete a project and everything hanging off it.
    pub async fn delete_project(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM document_versions WHERE document_id IN (SELECT id FROM documents WHERE project_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        // Single statement, so parent references are only checked once the whole set is gone
        sqlx::query("DELETE FROM documents WHERE project_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Project {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }

    // ==================== PORTAL OPERATIONS ====================

    /// Get a portal by ID.
    pub async fn get_portal(&self, id: &str) -> Result<Option<Portal>, AppError> {
        let row = sqlx::query(
            "SELECT id, project_id, name, owner_id, created_at FROM portals WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(portal_from_row))
    }

    // ==================== MEMBERSHIP OPERATIONS ====================

    /// Get a membership row by ID.
    pub async fn get_member(&self, id: &str) -> Result<Option<PortalMember>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {MEMBER_COLUMNS} FROM portal_members pm WHERE pm.id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(member_from_row))
    }

    /// Get the membership row for an email in a portal, whatever its status.
    pub async fn find_member_by_email(
        &self,
        portal_id: &str,
        email: &str,
    ) -> Result<Option<PortalMember>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {MEMBER_COLUMNS} FROM portal_members pm WHERE pm.portal_id = ? AND pm.email = ?"
        ))
        .bind(portal_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(member_from_row))
    }

    /// Find the caller's membership in a portal, matched by account or email.
    ///
    /// With `active_only`, rows in any other state are ignored.
    pub async fn find_membership_for(
        &self,
        portal_id: &str,
        user_id: &str,
        email: &str,
        active_only: bool,
    ) -> Result<Option<PortalMember>, AppError> {
        let status_filter = if active_only {
            "AND pm.status = 'active'"
        } else {
            ""
        };
        // Prefer the row linked to the account, then the active one
        let row = sqlx::query(&format!(
            r#"SELECT {MEMBER_COLUMNS} FROM portal_members pm
               WHERE pm.portal_id = ? AND (pm.user_id = ? OR pm.email = ?) {status_filter}
               ORDER BY (pm.user_id = ?) DESC, (pm.status = 'active') DESC
               LIMIT 1"#
        ))
        .bind(portal_id)
        .bind(user_id)
        .bind(email)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(member_from_row))
    }

    /// List all membership rows of a portal with their display email.
    pub async fn list_members(&self, portal_id: &str) -> Result<Vec<MemberView>, AppError> {
        let rows = sqlx::query(&format!(
            r#"SELECT {MEMBER_COLUMNS}, COALESCE(u.email, pm.email) AS display_email
               FROM portal_members pm
               LEFT JOIN users u ON u.id = pm.user_id
               WHERE pm.portal_id = ?
               ORDER BY pm.created_at, pm.email"#
        ))
        .bind(portal_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| MemberView {
                member: member_from_row(row),
                display_email: row.get("display_email"),
            })
            .collect())
    }

    /// Insert or update the membership keyed on `(portal_id, email)`.
    ///
    /// With `user_id` the row becomes `active` with no token; without it the
    /// row becomes `invited` carrying `token`. Rows that are already active are
    /// left as they are.
    pub async fn upsert_invite(
        &self,
        portal: &Portal,
        email: &str,
        role: MemberRole,
        invited_by: &str,
        user_id: Option<&str>,
        token: Option<&str>,
    ) -> Result<InviteOutcome, AppError> {
        let status = if user_id.is_some() {
            MemberStatus::Active
        } else {
            MemberStatus::Invited
        };
        let token = if user_id.is_some() { None } else { token };
        let now = now();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"INSERT INTO portal_members (
                   id, portal_id, user_id, email, role, status, invited_by, invite_token,
                   created_at, updated_at
               ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT (portal_id, email) DO UPDATE SET
                   user_id = excluded.user_id,
                   role = excluded.role,
                   status = excluded.status,
                   invited_by = excluded.invited_by,
                   invite_token = excluded.invite_token,
                   updated_at = excluded.updated_at
               WHERE portal_members.status != 'active'"#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(&portal.id)
        .bind(user_id)
        .bind(email)
        .bind(role.as_str())
        .bind(status.as_str())
        .bind(invited_by)
        .bind(token)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let changed = result.rows_affected() > 0;

        let row = sqlx::query(&format!(
            "SELECT {MEMBER_COLUMNS} FROM portal_members pm WHERE pm.portal_id = ? AND pm.email = ?"
        ))
        .bind(&portal.id)
        .bind(email)
        .fetch_one(&mut *tx)
        .await?;
        let member = member_from_row(&row);

        if changed {
            let action = match member.status {
                MemberStatus::Active => actions::MEMBER_ADDED,
                _ => actions::MEMBER_INVITED,
            };
            insert_activity(&mut tx, &portal.project_id, invited_by, action, Some(email)).await?;
        }

        tx.commit().await?;

        Ok(InviteOutcome { member, changed })
    }

    /// Redeem an invite token. Returns `None` when no `invited` row carries it.
    ///
    /// The update is conditional on the row still being `invited`, so a
    /// concurrent sweep and redemption cannot both activate it.
    pub async fn accept_invite(
        &self,
        token: &str,
        user_id: &str,
        email: &str,
    ) -> Result<Option<PortalMember>, AppError> {
        let mut tx = self.pool.begin().await?;

        upsert_user(&mut tx, user_id, email).await?;

        let row = sqlx::query(
            r#"SELECT pm.id, po.project_id FROM portal_members pm
               JOIN portals po ON po.id = pm.portal_id
               WHERE pm.invite_token = ? AND pm.status = 'invited'"#,
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let member_id: String = row.get("id");
        let project_id: String = row.get("project_id");

        if !activate_member(&mut tx, &member_id, user_id, Some(token)).await? {
            return Ok(None);
        }
        insert_activity(&mut tx, &project_id, user_id, actions::INVITE_ACCEPTED, None).await?;

        let row = sqlx::query(&format!(
            "SELECT {MEMBER_COLUMNS} FROM portal_members pm WHERE pm.id = ?"
        ))
        .bind(&member_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(member_from_row(&row)))
    }

    /// Activate every pending invitation addressed to `email`, across all portals.
    ///
    /// Returns the number of rows this call activated.
    pub async fn activate_pending_invites(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        upsert_user(&mut tx, user_id, email).await?;

        let pending = sqlx::query(
            r#"SELECT pm.id, po.project_id FROM portal_members pm
               JOIN portals po ON po.id = pm.portal_id
               WHERE pm.email = ? AND pm.status = 'invited'"#,
        )
        .bind(email)
        .fetch_all(&mut *tx)
        .await?;

        let mut activated = 0;
        for row in &pending {
            let member_id: String = row.get("id");
            let project_id: String = row.get("project_id");
            if activate_member(&mut tx, &member_id, user_id, None).await? {
                insert_activity(&mut tx, &project_id, user_id, actions::INVITE_ACCEPTED, None)
                    .await?;
                activated += 1;
            }
        }

        tx.commit().await?;
        Ok(activated)
    }

    /// Mark a non-owner membership as removed. Returns false if nothing changed.
    pub async fn remove_member(
        &self,
        member: &PortalMember,
        project_id: &str,
        actor_id: &str,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"UPDATE portal_members
               SET status = 'removed', invite_token = NULL, updated_at = ?
               WHERE id = ? AND role != 'owner'"#,
        )
        .bind(now())
        .bind(&member.id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        insert_activity(
            &mut tx,
            project_id,
            actor_id,
            actions::MEMBER_REMOVED,
            Some(member.email.as_str()),
        )
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    // ==================== DOCUMENT OPERATIONS ====================

    /// Get a document by ID with its current URL resolved.
    pub async fn get_document(&self, id: &str) -> Result<Option<Document>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents d WHERE d.id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(document_from_row))
    }

    /// List every folder (or every file) in a project, regardless of parent.
    pub async fn list_documents(
        &self,
        project_id: &str,
        folders: bool,
    ) -> Result<Vec<Document>, AppError> {
        let rows = sqlx::query(&format!(
            r#"SELECT {DOCUMENT_COLUMNS} FROM documents d
               WHERE d.project_id = ? AND d.is_folder = ? AND d.doc_type = ?
               ORDER BY d.title"#
        ))
        .bind(project_id)
        .bind(folders as i32)
        .bind(FILE_LINK_TYPE)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(document_from_row).collect())
    }

    /// Create a folder or file link.
    ///
    /// For files the project row is touched before counting, so the quota
    /// check and the insert happen under the same writer lock.
    pub async fn create_document(
        &self,
        project: &Project,
        owner_id: &str,
        subscribed: bool,
        quota: &QuotaPolicy,
        request: &CreateDocumentRequest,
    ) -> Result<Document, AppError> {
        let now = now();
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE projects SET updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(&project.id)
            .execute(&mut *tx)
            .await?;

        if let Some(parent_id) = &request.parent_id {
            let parent = sqlx::query("SELECT project_id, is_folder FROM documents WHERE id = ?")
                .bind(parent_id)
                .fetch_optional(&mut *tx)
                .await?;

            let parent_project: Option<String> = parent.as_ref().map(|r| r.get("project_id"));
            // A parent in another project is as invisible as a missing one
            if parent_project.as_deref() != Some(project.id.as_str()) {
                return Err(AppError::NotFound(format!(
                    "Parent folder {} not found in this project",
                    parent_id
                )));
            }
            let parent_is_folder: i32 = parent.as_ref().map(|r| r.get("is_folder")).unwrap_or(0);
            if parent_is_folder == 0 {
                return Err(AppError::Validation(
                    "Parent must be a folder".to_string(),
                ));
            }
        }

        if !request.is_folder {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM documents WHERE project_id = ? AND is_folder = 0",
            )
            .bind(&project.id)
            .fetch_one(&mut *tx)
            .await?;

            if !quota.can_create_file(subscribed, count) {
                return Err(AppError::QuotaExceeded(format!(
                    "Free plan is limited to {} files per project; upgrade to add more",
                    quota.max_free_files
                )));
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let tags = request.tags.clone().unwrap_or_default();
        let tags_json = serde_json::to_string(&tags)?;

        sqlx::query(
            r#"INSERT INTO documents (
                   id, project_id, owner_id, title, is_folder, parent_id, tags, doc_type,
                   created_at, updated_at
               ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&id)
        .bind(&project.id)
        .bind(owner_id)
        .bind(&request.name)
        .bind(request.is_folder as i32)
        .bind(&request.parent_id)
        .bind(&tags_json)
        .bind(FILE_LINK_TYPE)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let url = match (&request.url, request.is_folder) {
            (Some(url), false) => {
                insert_version(&mut tx, &id, url, owner_id, &now).await?;
                Some(url.clone())
            }
            _ => None,
        };

        insert_activity(
            &mut tx,
            &project.id,
            owner_id,
            actions::DOCUMENT_CREATED,
            Some(request.name.as_str()),
        )
        .await?;

        tx.commit().await?;

        Ok(Document {
            id,
            project_id: project.id.clone(),
            owner_id: owner_id.to_string(),
            title: request.name.clone(),
            is_folder: request.is_folder,
            parent_id: request.parent_id.clone(),
            tags,
            doc_type: FILE_LINK_TYPE.to_string(),
            url,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Delete a document owned by `owner_id` together with its whole subtree.
    ///
    /// Nodes are removed children first (versions, then the node) inside one
    /// transaction. Returns the deleted IDs in deletion order.
    pub async fn delete_document_tree(
        &self,
        id: &str,
        owner_id: &str,
    ) -> Result<Vec<String>, AppError> {
        let mut tx = self.pool.begin().await?;

        let root = sqlx::query("SELECT project_id, title FROM documents WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))?;
        let project_id: String = root.get("project_id");
        let title: String = root.get("title");

        let order = collect_subtree(&mut tx, id).await?;

        for doc_id in &order {
            sqlx::query("DELETE FROM document_versions WHERE document_id = ?")
                .bind(doc_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM documents WHERE id = ?")
                .bind(doc_id)
                .execute(&mut *tx)
                .await?;
        }

        insert_activity(
            &mut tx,
            &project_id,
            owner_id,
            actions::DOCUMENT_DELETED,
            Some(title.as_str()),
        )
        .await?;

        tx.commit().await?;
        Ok(order)
    }

    /// Append a version to a file; it becomes the current one.
    pub async fn add_version(
        &self,
        document: &Document,
        url: &str,
        uploaded_by: &str,
    ) -> Result<DocumentVersion, AppError> {
        let now = now();
        let mut tx = self.pool.begin().await?;

        let version = insert_version(&mut tx, &document.id, url, uploaded_by, &now).await?;

        sqlx::query("UPDATE documents SET updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(&document.id)
            .execute(&mut *tx)
            .await?;

        insert_activity(
            &mut tx,
            &document.project_id,
            uploaded_by,
            actions::VERSION_ADDED,
            Some(document.title.as_str()),
        )
        .await?;

        tx.commit().await?;
        Ok(version)
    }

    /// List a document's versions, newest first.
    pub async fn list_versions(&self, document_id: &str) -> Result<Vec<DocumentVersion>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, document_id, file_url, uploaded_by, created_at
               FROM document_versions WHERE document_id = ?
               ORDER BY created_at DESC, rowid DESC"#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(version_from_row).collect())
    }

    // ==================== ACTIVITY OPERATIONS ====================

    /// Record an activity entry outside of a larger transaction.
    pub async fn record_activity(
        &self,
        project_id: &str,
        actor_id: &str,
        action: &str,
        detail: Option<&str>,
    ) -> Result<(), AppError> {
        let mut conn = self.pool.acquire().await?;
        insert_activity(&mut conn, project_id, actor_id, action, detail).await
    }

    /// List a project's activity, newest first.
    pub async fn list_activity(&self, project_id: &str) -> Result<Vec<ActivityEntry>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, project_id, actor_id, action, detail, created_at
               FROM activity WHERE project_id = ?
               ORDER BY created_at DESC, rowid DESC"#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| ActivityEntry {
                id: row.get("id"),
                project_id: row.get("project_id"),
                actor_id: row.get("actor_id"),
                action: row.get("action"),
                detail: row.get("detail"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}

// Statement helpers shared by pool and transaction callers

async fn upsert_user(conn: &mut SqliteConnection, id: &str, email: &str) -> Result<(), AppError> {
    let now = now();
    sqlx::query(
        r#"INSERT INTO users (id, email, created_at, updated_at) VALUES (?, ?, ?, ?)
           ON CONFLICT (id) DO UPDATE SET email = excluded.email, updated_at = excluded.updated_at"#,
    )
    .bind(id)
    .bind(email)
    .bind(&now)
    .bind(&now)
    .execute(conn)
    .await?;
    Ok(())
}

/// Compare-and-swap `invited -> active`. Returns whether this call won.
async fn activate_member(
    conn: &mut SqliteConnection,
    member_id: &str,
    user_id: &str,
    token: Option<&str>,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"UPDATE portal_members
           SET user_id = ?, status = 'active', invite_token = NULL, updated_at = ?
           WHERE id = ? AND status = 'invited' AND (?4 IS NULL OR invite_token = ?4)"#,
    )
    .bind(user_id)
    .bind(now())
    .bind(member_id)
    .bind(token)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

async fn insert_version(
    conn: &mut SqliteConnection,
    document_id: &str,
    url: &str,
    uploaded_by: &str,
    created_at: &str,
) -> Result<DocumentVersion, AppError> {
    let id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO document_versions (id, document_id, file_url, uploaded_by, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(document_id)
    .bind(url)
    .bind(uploaded_by)
    .bind(created_at)
    .execute(conn)
    .await?;

    Ok(DocumentVersion {
        id,
        document_id: document_id.to_string(),
        file_url: url.to_string(),
        uploaded_by: uploaded_by.to_string(),
        created_at: created_at.to_string(),
    })
}

async fn insert_activity(
    conn: &mut SqliteConnection,
    project_id: &str,
    actor_id: &str,
    action: &str,
    detail: Option<&str>,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO activity (id, project_id, actor_id, action, detail, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(project_id)
    .bind(actor_id)
    .bind(action)
    .bind(detail)
    .bind(now())
    .execute(conn)
    .await?;
    Ok(())
}

/// Depth-first walk below `root_id`, returning IDs in post-order (children before parents).
async fn collect_subtree(
    conn: &mut SqliteConnection,
    root_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    let mut order = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![(root_id.to_string(), false)];

    while let Some((id, expanded)) = stack.pop() {
        if expanded {
            order.push(id);
            continue;
        }
        if !seen.insert(id.clone()) {
            continue;
        }

        let children: Vec<String> =
            sqlx::query_scalar("SELECT id FROM documents WHERE parent_id = ? ORDER BY created_at")
                .bind(&id)
                .fetch_all(&mut *conn)
                .await?;

        stack.push((id, true));
        stack.extend(children.into_iter().map(|child| (child, false)));
    }

    Ok(order)
}

// Helper functions for row conversion

fn project_from_row(row: &sqlx::sqlite::SqliteRow) -> Project {
    Project {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        name: row.get("name"),
        description: row.get("description"),
        portal_id: row.get("portal_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn portal_from_row(row: &sqlx::sqlite::SqliteRow) -> Portal {
    Portal {
        id: row.get("id"),
        project_id: row.get("project_id"),
        name: row.get("name"),
        owner_id: row.get("owner_id"),
        created_at: row.get("created_at"),
    }
}

fn member_from_row(row: &sqlx::sqlite::SqliteRow) -> PortalMember {
    let role: String = row.get("role");
    let status: String = row.get("status");
    PortalMember {
        id: row.get("id"),
        portal_id: row.get("portal_id"),
        user_id: row.get("user_id"),
        email: row.get("email"),
        role: MemberRole::parse(&role).unwrap_or_default(),
        // Unknown states never grant access
        status: MemberStatus::parse(&status).unwrap_or(MemberStatus::Removed),
        invited_by: row.get("invited_by"),
        invite_token: row.get("invite_token"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn document_from_row(row: &sqlx::sqlite::SqliteRow) -> Document {
    let is_folder: i32 = row.get("is_folder");
    let tags_str: Option<String> = row.get("tags");
    Document {
        id: row.get("id"),
        project_id: row.get("project_id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        is_folder: is_folder != 0,
        parent_id: row.get("parent_id"),
        tags: tags_str.map(|s| parse_json_array(&s)).unwrap_or_default(),
        doc_type: row.get("doc_type"),
        url: if is_folder != 0 { None } else { row.get("url") },
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn version_from_row(row: &sqlx::sqlite::SqliteRow) -> DocumentVersion {
    DocumentVersion {
        id: row.get("id"),
        document_id: row.get("document_id"),
        file_url: row.get("file_url"),
        uploaded_by: row.get("uploaded_by"),
        created_at: row.get("created_at"),
    }
}

fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}
