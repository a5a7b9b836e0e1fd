use std::collections::HashMap;

use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use classhero_config::EmailConfig;
use classhero_core::file_storage::{ensure_mime_type, sanitize_filename};
use classhero_core::{AppError, FileStorage, PaginationMeta};

use crate::modules::users::model::{
    AvatarUserSummary, PaginatedUsersResponse, USER_COLUMNS, UpdateUserInfoDto, User, UserAvatar,
    UserFilterParams, UserOption, UserOptionsParams, UserWithAvatars,
};
use crate::utils::email::EmailService;
use crate::utils::multipart::UploadedFile;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_OPTIONS: i64 = 50;
const AVATAR_FOLDER: &str = "users/avatars";
const AVATAR_MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp", "image/gif"];

/// Emails are compared in lowercase without surrounding whitespace.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Appends `AND <column> = <bool>` for every flag filter that is set.
fn push_flag_filters(where_clause: &mut String, flags: &[(&str, Option<bool>)]) {
    for (column, value) in flags {
        if let Some(value) = value {
            where_clause.push_str(&format!(" AND {} = {}", column, value));
        }
    }
}

/// Outcome of [`UserService::update_info`].
#[derive(Debug)]
pub struct UpdateInfoOutcome {
    pub email: String,
    /// Human-readable list of the fields that changed.
    pub changes: Vec<String>,
}

pub struct UserService;

impl UserService {
    #[instrument]
    pub async fn get_users(
        db: &PgPool,
        filters: UserFilterParams,
    ) -> Result<PaginatedUsersResponse, AppError> {
        let limit = filters.pagination.limit_or(DEFAULT_PAGE_SIZE);
        let page = filters.pagination.page();
        let offset = filters.pagination.offset_for(limit);

        let mut where_clause = String::from(" WHERE 1=1");
        let mut params: Vec<String> = Vec::new();

        if let Some(search) = &filters.search {
            params.push(format!("%{}%", search));
            where_clause.push_str(&format!(
                " AND (email ILIKE ${0} OR name ILIKE ${0})",
                params.len()
            ));
        }

        push_flag_filters(
            &mut where_clause,
            &[
                ("is_a_admin", filters.is_a_admin),
                ("is_a_teacher", filters.is_a_teacher),
                ("is_a_student", filters.is_a_student),
                ("is_validated", filters.is_validated),
            ],
        );

        let count_query = format!("SELECT COUNT(*) FROM users{}", where_clause);
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_sql = count_sql.bind(param);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            "SELECT {} FROM users{} ORDER BY name ASC NULLS LAST, email ASC LIMIT {} OFFSET {}",
            USER_COLUMNS, where_clause, limit, offset
        );
        let mut data_sql = sqlx::query_as::<_, User>(&data_query);
        for param in params {
            data_sql = data_sql.bind(param);
        }
        let users = data_sql.fetch_all(db).await?;

        let data = Self::attach_avatars(db, users).await?;

        Ok(PaginatedUsersResponse {
            data,
            meta: PaginationMeta::new(total, page, limit),
        })
    }

    /// Loads the avatars of `users` in one query and pairs them up.
    async fn attach_avatars(
        db: &PgPool,
        users: Vec<User>,
    ) -> Result<Vec<UserWithAvatars>, AppError> {
        if users.is_empty() {
            return Ok(Vec::new());
        }

        let emails: Vec<String> = users.iter().map(|u| u.email.clone()).collect();

        let rows = sqlx::query_as::<_, (String, String, bool)>(
            r#"SELECT email, avatar_url, is_active
               FROM users_avatars
               WHERE email = ANY($1)
               ORDER BY created_at DESC"#,
        )
        .bind(&emails)
        .fetch_all(db)
        .await?;

        let mut by_email: HashMap<String, Vec<UserAvatar>> = HashMap::new();
        for (email, avatar_url, is_active) in rows {
            by_email.entry(email).or_default().push(UserAvatar {
                avatar_url,
                is_active,
            });
        }

        Ok(users
            .into_iter()
            .map(|user| {
                let users_avatars = by_email.remove(&user.email).unwrap_or_default();
                UserWithAvatars {
                    user,
                    users_avatars,
                }
            })
            .collect())
    }

    #[instrument]
    pub async fn get_user_options(
        db: &PgPool,
        params: UserOptionsParams,
    ) -> Result<Vec<UserOption>, AppError> {
        let mut query = String::from("SELECT email, name FROM users WHERE 1=1");
        let mut binds: Vec<String> = Vec::new();

        if let Some(search) = &params.search {
            binds.push(format!("%{}%", search));
            query.push_str(&format!(
                " AND (email ILIKE ${0} OR name ILIKE ${0})",
                binds.len()
            ));
        }

        push_flag_filters(
            &mut query,
            &[
                ("is_a_student", params.is_a_student),
                ("is_a_teacher", params.is_a_teacher),
            ],
        );

        query.push_str(&format!(
            " ORDER BY name ASC NULLS LAST, email ASC LIMIT {}",
            MAX_OPTIONS
        ));

        let mut sql = sqlx::query_as::<_, UserOption>(&query);
        for bind in binds {
            sql = sql.bind(bind);
        }

        Ok(sql.fetch_all(db).await?)
    }

    #[instrument]
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<User, AppError> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }

    #[instrument]
    pub async fn get_user_with_avatars(
        db: &PgPool,
        email: &str,
    ) -> Result<UserWithAvatars, AppError> {
        let user = Self::find_by_email(db, email).await?;

        Self::attach_avatars(db, vec![user])
            .await?
            .pop()
            .ok_or_else(|| AppError::internal_error("User lookup returned no row".to_string()))
    }

    /// Applies a profile edit.
    ///
    /// Admin edits are written as given. Any other edit only changes the
    /// name: role flags sent along are ignored and the account goes back to
    /// waiting for validation.
    #[instrument]
    pub async fn update_info(
        db: &PgPool,
        email: &str,
        by_admin: bool,
        dto: UpdateUserInfoDto,
    ) -> Result<UpdateInfoOutcome, AppError> {
        let dto = if by_admin { dto } else { dto.restricted_to_name() };

        let existing = Self::find_by_email(db, email).await?;

        let name = dto.name.map(|n| n.trim().to_string());
        let is_validated = dto.is_validated;

        let mut changes = Vec::new();
        if let Some(name) = &name
            && existing.name.as_deref() != Some(name.as_str())
        {
            changes.push(format!(
                "name: {} -> {}",
                existing.name.as_deref().unwrap_or("(empty)"),
                name
            ));
        }
        for (field, old, new) in [
            ("is_a_admin", existing.is_a_admin, dto.is_a_admin),
            ("is_a_teacher", existing.is_a_teacher, dto.is_a_teacher),
            ("is_a_student", existing.is_a_student, dto.is_a_student),
            ("is_validated", existing.is_validated, is_validated),
        ] {
            if let Some(new) = new
                && new != old
            {
                changes.push(format!("{}: {} -> {}", field, old, new));
            }
        }

        sqlx::query(
            r#"UPDATE users
               SET name = COALESCE($2, name),
                   is_a_admin = COALESCE($3, is_a_admin),
                   is_a_teacher = COALESCE($4, is_a_teacher),
                   is_a_student = COALESCE($5, is_a_student),
                   is_validated = COALESCE($6, is_validated),
                   updated_at = NOW()
               WHERE email = $1"#,
        )
        .bind(email)
        .bind(&name)
        .bind(dto.is_a_admin)
        .bind(dto.is_a_teacher)
        .bind(dto.is_a_student)
        .bind(is_validated)
        .execute(db)
        .await?;

        info!(email = %email, by_admin, changed = changes.len(), "User info updated");

        Ok(UpdateInfoOutcome {
            email: email.to_string(),
            changes,
        })
    }

    /// Stores a new avatar and makes it the only active one.
    ///
    /// The account goes back to waiting for validation. The stored file is
    /// removed again if the database update fails.
    #[instrument(skip(storage, file), fields(filename = %file.filename, size = file.bytes.len()))]
    pub async fn upload_avatar(
        db: &PgPool,
        storage: &dyn FileStorage,
        email: &str,
        file: UploadedFile,
    ) -> Result<String, AppError> {
        ensure_mime_type(&file.content_type, AVATAR_MIME_TYPES)
            .map_err(|e| e.into_app_error())?;

        Self::find_by_email(db, email).await?;

        let key = format!(
            "{}/{}_{}",
            AVATAR_FOLDER,
            Uuid::new_v4(),
            sanitize_filename(&file.filename)
        );
        storage
            .save(&key, &file.bytes)
            .await
            .map_err(|e| e.into_app_error())?;
        let avatar_url = storage.get_url(&key).map_err(|e| e.into_app_error())?;

        if let Err(e) = Self::activate_new_avatar(db, email, &avatar_url).await {
            if let Err(cleanup) = storage.delete(&key).await {
                warn!(key = %key, error = %cleanup, "Failed to remove orphaned avatar");
            }
            return Err(e);
        }

        info!(email = %email, "Avatar uploaded");

        Ok(avatar_url)
    }

    async fn activate_new_avatar(db: &PgPool, email: &str, avatar_url: &str) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        sqlx::query("UPDATE users_avatars SET is_active = FALSE WHERE email = $1 AND is_active")
            .bind(email)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO users_avatars (email, avatar_url, is_active) VALUES ($1, $2, TRUE)")
            .bind(email)
            .bind(avatar_url)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE users SET is_validated = FALSE, updated_at = NOW() WHERE email = $1")
            .bind(email)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Re-activates one of the user's previous avatars.
    #[instrument]
    pub async fn set_avatar_by_url(
        db: &PgPool,
        email: &str,
        avatar_url: &str,
    ) -> Result<AvatarUserSummary, AppError> {
        Self::find_by_email(db, email).await?;

        let mut tx = db.begin().await?;

        sqlx::query("UPDATE users_avatars SET is_active = FALSE WHERE email = $1 AND is_active")
            .bind(email)
            .execute(&mut *tx)
            .await?;

        let activated = sqlx::query(
            "UPDATE users_avatars SET is_active = TRUE WHERE email = $1 AND avatar_url = $2",
        )
        .bind(email)
        .bind(avatar_url)
        .execute(&mut *tx)
        .await?;

        if activated.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Avatar not found")));
        }

        let summary = sqlx::query_as::<_, AvatarUserSummary>(
            r#"UPDATE users
               SET is_validated = FALSE, updated_at = NOW()
               WHERE email = $1
               RETURNING email, $2::text AS avatar_url, is_validated"#,
        )
        .bind(email)
        .bind(avatar_url)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(summary)
    }

    /// Deletes the account and, best effort, its stored avatar files.
    #[instrument(skip(storage))]
    pub async fn delete_user(
        db: &PgPool,
        storage: &dyn FileStorage,
        email: &str,
    ) -> Result<(), AppError> {
        let avatar_urls = sqlx::query_scalar::<_, String>(
            "SELECT avatar_url FROM users_avatars WHERE email = $1",
        )
        .bind(email)
        .fetch_all(db)
        .await?;

        let result = sqlx::query("DELETE FROM users WHERE email = $1")
            .bind(email)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("User not found")));
        }

        for url in avatar_urls {
            if let Some(key) = storage.key_from_url(&url)
                && let Err(e) = storage.delete(&key).await
            {
                warn!(key = %key, error = %e, "Failed to remove avatar file");
            }
        }

        info!(email = %email, "User deleted");

        Ok(())
    }

    /// Tells the administrator that a profile needs validation again.
    /// Delivery problems are logged and never fail the caller.
    pub async fn notify_admin(email_config: &EmailConfig, user_email: &str, changes: &[String]) {
        let Some(admin_email) = email_config.admin_notification_email.as_deref() else {
            warn!(user = %user_email, "ADMIN_NOTIFICATION_EMAIL not set, skipping notice");
            return;
        };

        let email_service = EmailService::new(email_config.clone());
        if let Err(e) = email_service
            .send_profile_update_notice(admin_email, user_email, changes)
            .await
        {
            warn!(user = %user_email, error = %e.error, "Failed to notify admin of profile update");
        }
    }
}
