use anyhow::anyhow;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, instrument};
use uuid::Uuid;

use classhero_core::{AppError, PaginationMeta};

use crate::modules::courses::model::CourseOption;
use crate::modules::disciplines::model::{
    CreateDisciplineDto, Discipline, DisciplineFilterParams, DisciplineOption,
    DisciplineWithCourses, PaginatedDisciplinesResponse, UpdateDisciplineDto,
};
use crate::utils::db::is_foreign_key_violation;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_SEARCH_RESULTS: i64 = 50;

/// Links `discipline_id` to every course in `course_ids`.
async fn link_courses(
    tx: &mut Transaction<'_, Postgres>,
    discipline_id: Uuid,
    course_ids: &[Uuid],
) -> Result<(), AppError> {
    if course_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"INSERT INTO courses_disciplines (course_id, discipline_id)
           SELECT UNNEST($1::uuid[]), $2
           ON CONFLICT DO NOTHING"#,
    )
    .bind(course_ids)
    .bind(discipline_id)
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e) {
            return AppError::bad_request(anyhow!("One or more courses do not exist"));
        }
        AppError::from(e)
    })?;

    Ok(())
}

pub struct DisciplineService;

impl DisciplineService {
    #[instrument]
    pub async fn get_disciplines(
        db: &PgPool,
        filters: DisciplineFilterParams,
    ) -> Result<PaginatedDisciplinesResponse, AppError> {
        let limit = filters.pagination.limit_or(DEFAULT_PAGE_SIZE);
        let page = filters.pagination.page();
        let offset = filters.pagination.offset_for(limit);

        let search = filters.search.map(|s| format!("%{}%", s));
        let where_clause = if search.is_some() {
            " WHERE name ILIKE $1"
        } else {
            ""
        };

        let count_query = format!("SELECT COUNT(*) FROM disciplines{}", where_clause);
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(search) = &search {
            count_sql = count_sql.bind(search);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            "SELECT discipline_id, name, syllabus, workload_hours FROM disciplines{} ORDER BY name ASC LIMIT {} OFFSET {}",
            where_clause, limit, offset
        );
        let mut data_sql = sqlx::query_as::<_, Discipline>(&data_query);
        if let Some(search) = search {
            data_sql = data_sql.bind(search);
        }
        let disciplines = data_sql.fetch_all(db).await?;

        Ok(PaginatedDisciplinesResponse {
            data: disciplines,
            meta: PaginationMeta::new(total, page, limit),
        })
    }

    #[instrument]
    pub async fn search_disciplines(
        db: &PgPool,
        q: Option<String>,
    ) -> Result<Vec<DisciplineOption>, AppError> {
        let disciplines = sqlx::query_as::<_, DisciplineOption>(
            r#"SELECT discipline_id, name
               FROM disciplines
               WHERE $1::text IS NULL OR name ILIKE '%' || $1 || '%'
               ORDER BY name ASC
               LIMIT $2"#,
        )
        .bind(q)
        .bind(MAX_SEARCH_RESULTS)
        .fetch_all(db)
        .await?;

        Ok(disciplines)
    }

    #[instrument]
    pub async fn get_discipline_by_id(
        db: &PgPool,
        discipline_id: Uuid,
    ) -> Result<DisciplineWithCourses, AppError> {
        let discipline = sqlx::query_as::<_, Discipline>(
            "SELECT discipline_id, name, syllabus, workload_hours FROM disciplines WHERE discipline_id = $1",
        )
        .bind(discipline_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Discipline not found")))?;

        let courses = sqlx::query_as::<_, CourseOption>(
            r#"SELECT c.course_id, c.name
               FROM courses_disciplines cd
               JOIN courses c ON c.course_id = cd.course_id
               WHERE cd.discipline_id = $1
               ORDER BY c.name ASC"#,
        )
        .bind(discipline_id)
        .fetch_all(db)
        .await?;

        Ok(DisciplineWithCourses {
            discipline,
            courses,
        })
    }

    /// Inserts the discipline and its course links in one transaction.
    #[instrument]
    pub async fn create_discipline(
        db: &PgPool,
        dto: CreateDisciplineDto,
    ) -> Result<Uuid, AppError> {
        let mut tx = db.begin().await?;

        let discipline_id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO disciplines (name, syllabus, workload_hours)
               VALUES ($1, $2, $3)
               RETURNING discipline_id"#,
        )
        .bind(dto.name.trim())
        .bind(&dto.syllabus)
        .bind(dto.workload_hours)
        .fetch_one(&mut *tx)
        .await?;

        link_courses(&mut tx, discipline_id, &dto.course_ids).await?;

        tx.commit().await?;

        info!(discipline_id = %discipline_id, courses = dto.course_ids.len(), "Discipline created");

        Ok(discipline_id)
    }

    /// Updates the given fields. When `course_ids` is present the course
    /// links are replaced inside the same transaction.
    #[instrument]
    pub async fn update_discipline(
        db: &PgPool,
        discipline_id: Uuid,
        dto: UpdateDisciplineDto,
    ) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let result = sqlx::query(
            r#"UPDATE disciplines
               SET name = COALESCE($2, name),
                   syllabus = COALESCE($3, syllabus),
                   workload_hours = COALESCE($4, workload_hours),
                   updated_at = NOW()
               WHERE discipline_id = $1"#,
        )
        .bind(discipline_id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(&dto.syllabus)
        .bind(dto.workload_hours)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Discipline not found")));
        }

        if let Some(course_ids) = &dto.course_ids {
            sqlx::query("DELETE FROM courses_disciplines WHERE discipline_id = $1")
                .bind(discipline_id)
                .execute(&mut *tx)
                .await?;

            link_courses(&mut tx, discipline_id, course_ids).await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Deletes a discipline that no course or class references.
    #[instrument]
    pub async fn delete_discipline(db: &PgPool, discipline_id: Uuid) -> Result<(), AppError> {
        let (in_course, in_class) = sqlx::query_as::<_, (bool, bool)>(
            r#"SELECT
                EXISTS(SELECT 1 FROM courses_disciplines WHERE discipline_id = $1),
                EXISTS(SELECT 1 FROM class_disciplines WHERE discipline_id = $1)"#,
        )
        .bind(discipline_id)
        .fetch_one(db)
        .await?;

        if in_course {
            return Err(AppError::bad_request(anyhow!(
                "This discipline is linked to one or more courses and cannot be deleted"
            )));
        }
        if in_class {
            return Err(AppError::bad_request(anyhow!(
                "This discipline is linked to one or more classes and cannot be deleted"
            )));
        }

        let result = sqlx::query("DELETE FROM disciplines WHERE discipline_id = $1")
            .bind(discipline_id)
            .execute(db)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    return AppError::bad_request(anyhow!(
                        "This discipline is still in use and cannot be deleted"
                    ));
                }
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Discipline not found")));
        }

        info!(discipline_id = %discipline_id, "Discipline deleted");

        Ok(())
    }
}
