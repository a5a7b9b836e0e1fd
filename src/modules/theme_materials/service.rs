use anyhow::anyhow;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use classhero_core::file_storage::{ensure_mime_type, sanitize_filename};
use classhero_core::{AppError, FileStorage};

use crate::metrics::{track_material_created, track_quiz_generated};
use crate::modules::theme_materials::model::{
    MaterialChanges, MaterialType, NewMaterial, ThemeMaterial,
};
use crate::utils::curator::{CuratorClient, GeneratedQuestion};
use crate::utils::db::is_foreign_key_violation;
use crate::utils::multipart::UploadedFile;

const PDF_MIME_TYPES: &[&str] = &["application/pdf"];
const QUESTION_PARAMS: usize = 11;

const MATERIAL_COLUMNS: &str = r#"material_id, theme_id, title, description, type, content, "order",
    youtube_pt_url, youtube_en_url, created_at, updated_at"#;

/// Stores `file` under the folder of `material_type`. Returns the key and
/// its public URL.
async fn store_pdf(
    storage: &dyn FileStorage,
    material_type: MaterialType,
    file: &UploadedFile,
) -> Result<(String, String), AppError> {
    ensure_mime_type(&file.content_type, PDF_MIME_TYPES).map_err(|e| e.into_app_error())?;

    let key = format!(
        "{}/{}_{}",
        material_type.storage_folder(),
        Uuid::new_v4(),
        sanitize_filename(&file.filename)
    );
    storage
        .save(&key, &file.bytes)
        .await
        .map_err(|e| e.into_app_error())?;
    let url = storage.get_url(&key).map_err(|e| e.into_app_error())?;

    Ok((key, url))
}

async fn remove_file(storage: &dyn FileStorage, key: &str) {
    if let Err(e) = storage.delete(key).await {
        warn!(key = %key, error = %e, "Failed to remove material file");
    }
}

async fn insert_questions(
    tx: &mut Transaction<'_, Postgres>,
    material_id: Uuid,
    questions: &[GeneratedQuestion],
) -> Result<(), AppError> {
    if questions.is_empty() {
        return Ok(());
    }

    let mut query = String::from(
        r#"INSERT INTO quiz_questions
           (material_id, type, level, question, options, correct_answers,
            guidance_on_error, guidance_on_success, times_used, status, extra)
           VALUES "#,
    );
    for i in 0..questions.len() {
        if i > 0 {
            query.push_str(", ");
        }
        let base = i * QUESTION_PARAMS;
        let placeholders: Vec<String> = (1..=QUESTION_PARAMS)
            .map(|n| format!("${}", base + n))
            .collect();
        query.push_str(&format!("({})", placeholders.join(", ")));
    }

    let mut sql = sqlx::query(&query);
    for question in questions {
        sql = sql
            .bind(material_id)
            .bind(&question.question_type)
            .bind(&question.level)
            .bind(&question.question)
            .bind(&question.options)
            .bind(&question.correct_answers)
            .bind(&question.guidance_on_error)
            .bind(&question.guidance_on_success)
            .bind(question.times_used())
            .bind(question.status())
            .bind(&question.extra);
    }
    sql.execute(&mut **tx).await?;

    Ok(())
}

fn map_theme_error(err: sqlx::Error) -> AppError {
    if is_foreign_key_violation(&err) {
        return AppError::bad_request(anyhow!("Theme not found"));
    }
    AppError::from(err)
}

pub struct ThemeMaterialService;

impl ThemeMaterialService {
    /// Creates a material.
    ///
    /// PDF and quiz materials store their file first and point `content` at
    /// it. Quiz materials are then generated by the curator, whose title and
    /// description replace the submitted ones, and the questions are written
    /// in the same transaction as the material. The stored file is removed
    /// if anything after the upload fails.
    #[instrument(skip(storage, curator, material), fields(theme_id = %material.theme_id, material_type = %material.material_type))]
    pub async fn create_material(
        db: &PgPool,
        storage: &dyn FileStorage,
        curator: &CuratorClient,
        mut material: NewMaterial,
    ) -> Result<ThemeMaterial, AppError> {
        let material_type = material.material_type;

        let file = if material_type.requires_file() {
            let file = material.file.take().ok_or_else(|| {
                AppError::bad_request(anyhow!("A PDF file is required for pdf and quiz materials"))
            })?;
            Some(file)
        } else {
            None
        };

        let (content, stored_key) = match &file {
            Some(file) => {
                let (key, url) = store_pdf(storage, material_type, file).await?;
                (url, Some(key))
            }
            None => {
                let content = material.content.take().ok_or_else(|| {
                    AppError::bad_request(anyhow!("Content is required for this material type"))
                })?;
                (content, None)
            }
        };

        let result = Self::persist_new(db, curator, material, file, content).await;

        if result.is_err()
            && let Some(key) = &stored_key
        {
            remove_file(storage, key).await;
        }

        let created = result?;

        track_material_created(material_type.as_str());
        info!(material_id = %created.material_id, "Theme material created");

        Ok(created)
    }

    async fn persist_new(
        db: &PgPool,
        curator: &CuratorClient,
        material: NewMaterial,
        file: Option<UploadedFile>,
        content: String,
    ) -> Result<ThemeMaterial, AppError> {
        let mut title = material.title;
        let mut description = material.description;
        let mut questions = Vec::new();

        if material.material_type == MaterialType::Quiz
            && let Some(file) = file
        {
            let quiz = curator
                .generate_quiz(&file.filename, file.bytes.to_vec())
                .await?;
            title = quiz.title;
            description = quiz.description;
            questions = quiz.questions;
        }

        let mut tx = db.begin().await?;

        let query = format!(
            r#"INSERT INTO theme_materials
               (theme_id, title, description, type, content, "order", youtube_pt_url, youtube_en_url)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING {}"#,
            MATERIAL_COLUMNS
        );
        let created = sqlx::query_as::<_, ThemeMaterial>(&query)
            .bind(material.theme_id)
            .bind(&title)
            .bind(&description)
            .bind(material.material_type.as_str())
            .bind(&content)
            .bind(material.order)
            .bind(&material.youtube_pt_url)
            .bind(&material.youtube_en_url)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_theme_error)?;

        insert_questions(&mut tx, created.material_id, &questions).await?;

        tx.commit().await?;

        if !questions.is_empty() {
            track_quiz_generated(questions.len());
        }

        Ok(created)
    }

    #[instrument]
    pub async fn get_by_theme(db: &PgPool, theme_id: Uuid) -> Result<Vec<ThemeMaterial>, AppError> {
        let query = format!(
            r#"SELECT {} FROM theme_materials WHERE theme_id = $1 ORDER BY "order" ASC, created_at ASC"#,
            MATERIAL_COLUMNS
        );
        let materials = sqlx::query_as::<_, ThemeMaterial>(&query)
            .bind(theme_id)
            .fetch_all(db)
            .await?;

        Ok(materials)
    }

    /// Applies `changes` to a material.
    ///
    /// A new file replaces the stored one and `content` points at it; the
    /// type becomes `pdf` unless one is given. The previous file is removed
    /// once the row is updated.
    #[instrument(skip(storage, changes))]
    pub async fn update_material(
        db: &PgPool,
        storage: &dyn FileStorage,
        material_id: Uuid,
        mut changes: MaterialChanges,
    ) -> Result<ThemeMaterial, AppError> {
        let previous_content = sqlx::query_scalar::<_, String>(
            "SELECT content FROM theme_materials WHERE material_id = $1",
        )
        .bind(material_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Material not found")))?;

        let mut stored_key = None;
        if let Some(file) = changes.file.take() {
            let material_type = *changes.material_type.get_or_insert(MaterialType::Pdf);
            let (key, url) = store_pdf(storage, material_type, &file).await?;
            changes.content = Some(url);
            stored_key = Some(key);
        }

        let query = format!(
            r#"UPDATE theme_materials
               SET type = COALESCE($2, type),
                   title = COALESCE($3, title),
                   description = COALESCE($4, description),
                   content = COALESCE($5, content),
                   "order" = $6,
                   youtube_pt_url = COALESCE($7, youtube_pt_url),
                   youtube_en_url = COALESCE($8, youtube_en_url),
                   updated_at = NOW()
               WHERE material_id = $1
               RETURNING {}"#,
            MATERIAL_COLUMNS
        );
        let result = sqlx::query_as::<_, ThemeMaterial>(&query)
            .bind(material_id)
            .bind(changes.material_type.map(|t| t.as_str()))
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(&changes.content)
            .bind(changes.order)
            .bind(&changes.youtube_pt_url)
            .bind(&changes.youtube_en_url)
            .fetch_optional(db)
            .await
            .map_err(AppError::from)
            .and_then(|row| row.ok_or_else(|| AppError::not_found(anyhow!("Material not found"))));

        let updated = match result {
            Ok(updated) => updated,
            Err(e) => {
                if let Some(key) = &stored_key {
                    remove_file(storage, key).await;
                }
                return Err(e);
            }
        };

        if stored_key.is_some()
            && let Some(old_key) = storage.key_from_url(&previous_content)
        {
            remove_file(storage, &old_key).await;
        }

        info!(material_id = %material_id, "Theme material updated");

        Ok(updated)
    }

    /// Deletes the material, its questions, and its stored file if
    /// `content` points into storage.
    #[instrument(skip(storage))]
    pub async fn delete_material(
        db: &PgPool,
        storage: &dyn FileStorage,
        material_id: Uuid,
    ) -> Result<(), AppError> {
        let content = sqlx::query_scalar::<_, String>(
            "DELETE FROM theme_materials WHERE material_id = $1 RETURNING content",
        )
        .bind(material_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Material not found")))?;

        if let Some(key) = storage.key_from_url(&content) {
            remove_file(storage, &key).await;
        }

        info!(material_id = %material_id, "Theme material deleted");

        Ok(())
    }
}
