use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use classhero_core::{AppError, FileStorage};

use crate::modules::themes::model::{CreateThemeDto, Theme, UpdateThemeDto};
use crate::utils::db::{is_foreign_key_violation, is_unique_violation};

const THEME_COLUMNS: &str = r#"theme_id AS id, title, description, "order""#;

fn map_write_error(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) {
        return AppError::bad_request(anyhow!(
            "A theme with this order already exists for this discipline"
        ));
    }
    if is_foreign_key_violation(&err) {
        return AppError::bad_request(anyhow!("Class discipline not found"));
    }
    AppError::from(err)
}

pub struct ThemeService;

impl ThemeService {
    #[instrument]
    pub async fn get_by_class_discipline(
        db: &PgPool,
        class_discipline_id: Uuid,
    ) -> Result<Vec<Theme>, AppError> {
        let query = format!(
            r#"SELECT {} FROM themes WHERE class_discipline_id = $1 ORDER BY "order" ASC"#,
            THEME_COLUMNS
        );
        let themes = sqlx::query_as::<_, Theme>(&query)
            .bind(class_discipline_id)
            .fetch_all(db)
            .await?;

        Ok(themes)
    }

    #[instrument]
    pub async fn create_theme(db: &PgPool, dto: CreateThemeDto) -> Result<Theme, AppError> {
        let query = format!(
            r#"INSERT INTO themes (class_discipline_id, title, description, "order")
               VALUES ($1, $2, $3, $4)
               RETURNING {}"#,
            THEME_COLUMNS
        );
        let theme = sqlx::query_as::<_, Theme>(&query)
            .bind(dto.class_discipline_id)
            .bind(dto.title.trim())
            .bind(dto.description)
            .bind(dto.order)
            .fetch_one(db)
            .await
            .map_err(map_write_error)?;

        info!(theme_id = %theme.id, "Theme created");

        Ok(theme)
    }

    #[instrument]
    pub async fn update_theme(
        db: &PgPool,
        theme_id: Uuid,
        dto: UpdateThemeDto,
    ) -> Result<Theme, AppError> {
        let query = format!(
            r#"UPDATE themes
               SET title = COALESCE($2, title),
                   description = COALESCE($3, description),
                   class_discipline_id = COALESCE($4, class_discipline_id),
                   updated_at = NOW()
               WHERE theme_id = $1
               RETURNING {}"#,
            THEME_COLUMNS
        );
        let theme = sqlx::query_as::<_, Theme>(&query)
            .bind(theme_id)
            .bind(dto.title.as_deref().map(str::trim))
            .bind(dto.description)
            .bind(dto.class_discipline_id)
            .fetch_optional(db)
            .await
            .map_err(map_write_error)?
            .ok_or_else(|| AppError::not_found(anyhow!("Theme not found")))?;

        Ok(theme)
    }

    /// Deletes the theme and its materials, then removes the stored
    /// material files best effort.
    #[instrument(skip(storage))]
    pub async fn delete_theme(
        db: &PgPool,
        storage: &dyn FileStorage,
        theme_id: Uuid,
    ) -> Result<(), AppError> {
        let file_urls = sqlx::query_scalar::<_, String>(
            "SELECT content FROM theme_materials WHERE theme_id = $1",
        )
        .bind(theme_id)
        .fetch_all(db)
        .await?;

        let result = sqlx::query("DELETE FROM themes WHERE theme_id = $1")
            .bind(theme_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Theme not found")));
        }

        for url in file_urls {
            if let Some(key) = storage.key_from_url(&url)
                && let Err(e) = storage.delete(&key).await
            {
                warn!(key = %key, error = %e, "Failed to remove material file");
            }
        }

        info!(theme_id = %theme_id, "Theme deleted");

        Ok(())
    }
}
