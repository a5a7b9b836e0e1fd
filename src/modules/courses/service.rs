use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use classhero_core::{AppError, PaginationMeta};

use crate::modules::courses::model::{
    Course, CourseFilterParams, CourseOption, CourseStatus, CourseSummary, CreateCourseDto,
    PaginatedCoursesResponse, UpdateCourseDto,
};
use crate::utils::db::{constraint_name, is_foreign_key_violation, is_unique_violation};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_SEARCH_RESULTS: i64 = 50;
const COURSE_COLUMNS: &str = "course_id, name, acronym, status, created_at, updated_at";

/// Turns a duplicate name or acronym into a 400 with the offending field.
fn map_write_error(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) {
        let message = match constraint_name(&err) {
            Some("idx_courses_acronym") => "The acronym is already in use",
            Some("idx_courses_name") => "The course name is already in use",
            _ => "A course with these values already exists",
        };
        return AppError::bad_request(anyhow!(message));
    }
    AppError::from(err)
}

pub struct CourseService;

impl CourseService {
    #[instrument]
    pub async fn create_course(db: &PgPool, dto: CreateCourseDto) -> Result<Course, AppError> {
        let query = format!(
            "INSERT INTO courses (name, acronym, status) VALUES ($1, $2, $3) RETURNING {}",
            COURSE_COLUMNS
        );

        let course = sqlx::query_as::<_, Course>(&query)
            .bind(dto.name.trim())
            .bind(dto.acronym.trim())
            .bind(dto.status.as_str())
            .fetch_one(db)
            .await
            .map_err(map_write_error)?;

        info!(course_id = %course.course_id, "Course created");

        Ok(course)
    }

    #[instrument]
    pub async fn get_courses(
        db: &PgPool,
        filters: CourseFilterParams,
    ) -> Result<PaginatedCoursesResponse, AppError> {
        let limit = filters.pagination.limit_or(DEFAULT_PAGE_SIZE);
        let page = filters.pagination.page();
        let offset = filters.pagination.offset_for(limit);

        let search = filters.search.map(|s| format!("%{}%", s));
        let where_clause = if search.is_some() {
            " WHERE name ILIKE $1 OR acronym ILIKE $1"
        } else {
            ""
        };

        let count_query = format!("SELECT COUNT(*) FROM courses{}", where_clause);
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(search) = &search {
            count_sql = count_sql.bind(search);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            "SELECT course_id, name, acronym, status FROM courses{} ORDER BY name ASC LIMIT {} OFFSET {}",
            where_clause, limit, offset
        );
        let mut data_sql = sqlx::query_as::<_, CourseSummary>(&data_query);
        if let Some(search) = search {
            data_sql = data_sql.bind(search);
        }
        let courses = data_sql.fetch_all(db).await?;

        Ok(PaginatedCoursesResponse {
            data: courses,
            meta: PaginationMeta::new(total, page, limit),
        })
    }

    /// Active courses whose name matches `q`, for select inputs.
    #[instrument]
    pub async fn search_courses(
        db: &PgPool,
        q: Option<String>,
    ) -> Result<Vec<CourseOption>, AppError> {
        let courses = sqlx::query_as::<_, CourseOption>(
            r#"SELECT course_id, name
               FROM courses
               WHERE status = $1 AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%')
               ORDER BY name ASC
               LIMIT $3"#,
        )
        .bind(CourseStatus::Active.as_str())
        .bind(q)
        .bind(MAX_SEARCH_RESULTS)
        .fetch_all(db)
        .await?;

        Ok(courses)
    }

    #[instrument]
    pub async fn get_course_by_id(db: &PgPool, course_id: Uuid) -> Result<Course, AppError> {
        let query = format!("SELECT {} FROM courses WHERE course_id = $1", COURSE_COLUMNS);

        sqlx::query_as::<_, Course>(&query)
            .bind(course_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Course not found")))
    }

    #[instrument]
    pub async fn update_course(
        db: &PgPool,
        course_id: Uuid,
        dto: UpdateCourseDto,
    ) -> Result<(), AppError> {
        let status = dto.status.unwrap_or(CourseStatus::Inactive);

        let result = sqlx::query(
            r#"UPDATE courses
               SET name = COALESCE($2, name),
                   acronym = COALESCE($3, acronym),
                   status = $4,
                   updated_at = NOW()
               WHERE course_id = $1"#,
        )
        .bind(course_id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(dto.acronym.as_deref().map(str::trim))
        .bind(status.as_str())
        .execute(db)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Course not found")));
        }

        Ok(())
    }

    /// Deletes a course that no discipline references.
    #[instrument]
    pub async fn delete_course(db: &PgPool, course_id: Uuid) -> Result<(), AppError> {
        let linked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM courses_disciplines WHERE course_id = $1)",
        )
        .bind(course_id)
        .fetch_one(db)
        .await?;

        if linked {
            return Err(AppError::bad_request(anyhow!(
                "This course is linked to one or more disciplines and cannot be deleted"
            )));
        }

        let result = sqlx::query("DELETE FROM courses WHERE course_id = $1")
            .bind(course_id)
            .execute(db)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    return AppError::bad_request(anyhow!(
                        "This course is linked to one or more disciplines and cannot be deleted"
                    ));
                }
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Course not found")));
        }

        info!(course_id = %course_id, "Course deleted");

        Ok(())
    }
}
