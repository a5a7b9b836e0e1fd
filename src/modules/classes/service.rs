use std::collections::HashSet;

use anyhow::anyhow;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use classhero_core::{AppError, FileStorage, PaginationMeta};

use crate::modules::classes::model::{
    Class, ClassDetail, ClassDisciplineDetail, ClassDto, ClassFilterParams, ClassStudent,
    ClassSummary, PaginatedClassesResponse,
};
use crate::modules::users::service::normalize_email;
use crate::utils::db::{is_foreign_key_violation, is_unique_violation};

const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maps constraint violations of class writes to 400s.
fn map_write_error(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) {
        return AppError::bad_request(anyhow!("The class code is already in use"));
    }
    if is_foreign_key_violation(&err) {
        return AppError::bad_request(anyhow!(
            "One or more disciplines, teachers or students do not exist"
        ));
    }
    AppError::from(err)
}

/// Normalized relation sets of a [`ClassDto`].
struct ClassLinks {
    discipline_ids: Vec<Uuid>,
    teacher_emails: Vec<Option<String>>,
    student_emails: Vec<String>,
}

impl ClassLinks {
    fn from_dto(dto: &ClassDto) -> Result<Self, AppError> {
        let mut seen = HashSet::new();
        if !dto.disciplines.iter().all(|d| seen.insert(d.discipline_id)) {
            return Err(AppError::bad_request(anyhow!(
                "A discipline can only be added once per class"
            )));
        }

        let mut student_emails: Vec<String> =
            dto.student_emails.iter().map(|e| normalize_email(e)).collect();
        student_emails.sort();
        student_emails.dedup();

        Ok(Self {
            discipline_ids: dto.disciplines.iter().map(|d| d.discipline_id).collect(),
            teacher_emails: dto
                .disciplines
                .iter()
                .map(|d| {
                    d.teacher_email
                        .as_deref()
                        .map(normalize_email)
                        .filter(|e| !e.is_empty())
                })
                .collect(),
            student_emails,
        })
    }
}

/// Inserts missing class-discipline rows and updates the teacher of
/// existing ones. Rows keep their id, so attached themes survive.
async fn upsert_disciplines(
    tx: &mut Transaction<'_, Postgres>,
    class_id: Uuid,
    links: &ClassLinks,
) -> Result<(), AppError> {
    if links.discipline_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"INSERT INTO class_disciplines (class_id, discipline_id, teacher_email)
           SELECT $1, d.discipline_id, d.teacher_email
           FROM UNNEST($2::uuid[], $3::text[]) AS d(discipline_id, teacher_email)
           ON CONFLICT ON CONSTRAINT unique_discipline_per_class
           DO UPDATE SET teacher_email = EXCLUDED.teacher_email"#,
    )
    .bind(class_id)
    .bind(&links.discipline_ids)
    .bind(&links.teacher_emails)
    .execute(&mut **tx)
    .await
    .map_err(map_write_error)?;

    Ok(())
}

async fn replace_students(
    tx: &mut Transaction<'_, Postgres>,
    class_id: Uuid,
    student_emails: &[String],
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM class_users WHERE class_id = $1")
        .bind(class_id)
        .execute(&mut **tx)
        .await?;

    if student_emails.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"INSERT INTO class_users (class_id, user_email)
           SELECT $1, UNNEST($2::text[])
           ON CONFLICT DO NOTHING"#,
    )
    .bind(class_id)
    .bind(student_emails)
    .execute(&mut **tx)
    .await
    .map_err(map_write_error)?;

    Ok(())
}

pub struct ClassService;

impl ClassService {
    #[instrument]
    pub async fn get_classes(
        db: &PgPool,
        filters: ClassFilterParams,
    ) -> Result<PaginatedClassesResponse, AppError> {
        let limit = filters.pagination.limit_or(DEFAULT_PAGE_SIZE);
        let page = filters.pagination.page();
        let offset = filters.pagination.offset_for(limit);

        let search = filters.search.map(|s| format!("%{}%", s));
        let where_clause = if search.is_some() {
            " WHERE c.code ILIKE $1"
        } else {
            ""
        };

        let count_query = format!("SELECT COUNT(*) FROM classes c{}", where_clause);
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(search) = &search {
            count_sql = count_sql.bind(search);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            r#"SELECT
                c.class_id,
                c.code,
                c.year,
                c.semester,
                (SELECT COUNT(*) FROM class_disciplines cd WHERE cd.class_id = c.class_id) AS discipline_count,
                (SELECT COUNT(*) FROM class_users cu WHERE cu.class_id = c.class_id) AS student_count
               FROM classes c{}
               ORDER BY c.code ASC
               LIMIT {} OFFSET {}"#,
            where_clause, limit, offset
        );
        let mut data_sql = sqlx::query_as::<_, ClassSummary>(&data_query);
        if let Some(search) = search {
            data_sql = data_sql.bind(search);
        }
        let classes = data_sql.fetch_all(db).await?;

        Ok(PaginatedClassesResponse {
            data: classes,
            meta: PaginationMeta::new(total, page, limit),
        })
    }

    #[instrument]
    pub async fn get_class_by_id(db: &PgPool, class_id: Uuid) -> Result<ClassDetail, AppError> {
        let class = sqlx::query_as::<_, Class>(
            "SELECT class_id, code, year, semester FROM classes WHERE class_id = $1",
        )
        .bind(class_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Class not found")))?;

        let disciplines = sqlx::query_as::<_, ClassDisciplineDetail>(
            r#"SELECT
                cd.class_discipline_id,
                cd.discipline_id,
                d.name,
                cd.teacher_email,
                u.name AS teacher_name
               FROM class_disciplines cd
               JOIN disciplines d ON d.discipline_id = cd.discipline_id
               LEFT JOIN users u ON u.email = cd.teacher_email
               WHERE cd.class_id = $1
               ORDER BY d.name ASC"#,
        )
        .bind(class_id)
        .fetch_all(db)
        .await?;

        let students = sqlx::query_as::<_, ClassStudent>(
            r#"SELECT u.email, u.name
               FROM class_users cu
               JOIN users u ON u.email = cu.user_email
               WHERE cu.class_id = $1
               ORDER BY u.name ASC NULLS LAST, u.email ASC"#,
        )
        .bind(class_id)
        .fetch_all(db)
        .await?;

        Ok(ClassDetail {
            class,
            disciplines,
            students,
        })
    }

    /// Inserts the class, its disciplines and its students in one transaction.
    #[instrument]
    pub async fn create_class(db: &PgPool, dto: ClassDto) -> Result<Uuid, AppError> {
        let links = ClassLinks::from_dto(&dto)?;
        let mut tx = db.begin().await?;

        let class_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO classes (code, year, semester) VALUES ($1, $2, $3) RETURNING class_id",
        )
        .bind(dto.code.trim())
        .bind(dto.year)
        .bind(dto.semester)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        upsert_disciplines(&mut tx, class_id, &links).await?;
        replace_students(&mut tx, class_id, &links.student_emails).await?;

        tx.commit().await?;

        info!(
            class_id = %class_id,
            disciplines = links.discipline_ids.len(),
            students = links.student_emails.len(),
            "Class created"
        );

        Ok(class_id)
    }

    /// Rewrites the class and syncs its relations in one transaction.
    ///
    /// Class-discipline rows still listed keep their id and get the new
    /// teacher, unlisted ones are deleted. The student set is replaced.
    #[instrument]
    pub async fn update_class(db: &PgPool, class_id: Uuid, dto: ClassDto) -> Result<(), AppError> {
        let links = ClassLinks::from_dto(&dto)?;
        let mut tx = db.begin().await?;

        let result = sqlx::query(
            r#"UPDATE classes
               SET code = $2, year = $3, semester = $4, updated_at = NOW()
               WHERE class_id = $1"#,
        )
        .bind(class_id)
        .bind(dto.code.trim())
        .bind(dto.year)
        .bind(dto.semester)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Class not found")));
        }

        sqlx::query(
            "DELETE FROM class_disciplines WHERE class_id = $1 AND NOT (discipline_id = ANY($2))",
        )
        .bind(class_id)
        .bind(&links.discipline_ids)
        .execute(&mut *tx)
        .await?;

        upsert_disciplines(&mut tx, class_id, &links).await?;
        replace_students(&mut tx, class_id, &links.student_emails).await?;

        tx.commit().await?;

        info!(class_id = %class_id, "Class updated");

        Ok(())
    }

    /// Deletes the class with its themes and materials, then removes the
    /// stored material files best effort.
    #[instrument(skip(storage))]
    pub async fn delete_class(
        db: &PgPool,
        storage: &dyn FileStorage,
        class_id: Uuid,
    ) -> Result<(), AppError> {
        let file_urls = sqlx::query_scalar::<_, String>(
            r#"SELECT tm.content
               FROM theme_materials tm
               JOIN themes t ON t.theme_id = tm.theme_id
               JOIN class_disciplines cd ON cd.class_discipline_id = t.class_discipline_id
               WHERE cd.class_id = $1"#,
        )
        .bind(class_id)
        .fetch_all(db)
        .await?;

        let result = sqlx::query("DELETE FROM classes WHERE class_id = $1")
            .bind(class_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Class not found")));
        }

        for url in file_urls {
            if let Some(key) = storage.key_from_url(&url)
                && let Err(e) = storage.delete(&key).await
            {
                warn!(key = %key, error = %e, "Failed to remove material file");
            }
        }

        info!(class_id = %class_id, "Class deleted");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::classes::model::DisciplineAssignmentDto;

    fn dto(disciplines: Vec<DisciplineAssignmentDto>, students: Vec<&str>) -> ClassDto {
        ClassDto {
            code: "CS-1".to_string(),
            year: 2025,
            semester: 1,
            disciplines,
            student_emails: students.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn test_links_reject_duplicate_disciplines() {
        let id = Uuid::new_v4();
        let assignment = DisciplineAssignmentDto {
            discipline_id: id,
            teacher_email: None,
        };
        let err = ClassLinks::from_dto(&dto(vec![assignment.clone(), assignment], vec![]))
            .err()
            .unwrap();
        assert_eq!(err.status.as_u16(), 400);
    }

    #[test]
    fn test_links_normalize_emails() {
        let id = Uuid::new_v4();
        let links = ClassLinks::from_dto(&dto(
            vec![DisciplineAssignmentDto {
                discipline_id: id,
                teacher_email: Some(" Prof@School.edu ".to_string()),
            }],
            vec!["B@x.com", "a@x.com", "b@x.com"],
        ))
        .unwrap();

        assert_eq!(links.discipline_ids, vec![id]);
        assert_eq!(links.teacher_emails, vec![Some("prof@school.edu".to_string())]);
        assert_eq!(links.student_emails, vec!["a@x.com", "b@x.com"]);
    }
}
