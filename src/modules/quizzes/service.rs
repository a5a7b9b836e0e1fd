use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use classhero_core::{AppError, PaginationMeta};

use crate::modules::quizzes::model::{PaginatedQuestionsResponse, QuizFilterParams, QuizQuestion};

const DEFAULT_PAGE_SIZE: i64 = 10;

const QUESTION_COLUMNS: &str = "question_id, material_id, type, level, question, options, correct_answers, guidance_on_error, guidance_on_success, times_used, status, extra, created_at, updated_at";

pub struct QuizService;

impl QuizService {
    /// Lists the questions of one quiz material.
    #[instrument]
    pub async fn get_questions(
        db: &PgPool,
        filters: QuizFilterParams,
    ) -> Result<PaginatedQuestionsResponse, AppError> {
        let material_id = filters
            .material_id
            .ok_or_else(|| AppError::bad_request(anyhow!("material_id is required")))?;

        let limit = filters.pagination.limit_or(DEFAULT_PAGE_SIZE);
        let page = filters.pagination.page();
        let offset = filters.pagination.offset_for(limit);

        // $1 is the material id; text filters follow.
        let mut where_clause = String::from(" WHERE material_id = $1");
        let mut params: Vec<String> = Vec::new();

        if let Some(search) = filters.search {
            params.push(format!("%{}%", search));
            where_clause.push_str(&format!(" AND question ILIKE ${}", params.len() + 1));
        }

        for (column, value) in [
            ("status", filters.status),
            ("type", filters.question_type),
            ("level", filters.level),
        ] {
            if let Some(value) = value {
                params.push(value);
                where_clause.push_str(&format!(" AND {} = ${}", column, params.len() + 1));
            }
        }

        let count_query = format!("SELECT COUNT(*) FROM quiz_questions{}", where_clause);
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query).bind(material_id);
        for param in &params {
            count_sql = count_sql.bind(param);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            "SELECT {} FROM quiz_questions{} ORDER BY created_at ASC, question_id ASC LIMIT {} OFFSET {}",
            QUESTION_COLUMNS, where_clause, limit, offset
        );
        let mut data_sql = sqlx::query_as::<_, QuizQuestion>(&data_query).bind(material_id);
        for param in params {
            data_sql = data_sql.bind(param);
        }
        let questions = data_sql.fetch_all(db).await?;

        Ok(PaginatedQuestionsResponse {
            data: questions,
            meta: PaginationMeta::new(total, page, limit),
        })
    }

    #[instrument]
    pub async fn get_question(db: &PgPool, question_id: Uuid) -> Result<QuizQuestion, AppError> {
        let query = format!(
            "SELECT {} FROM quiz_questions WHERE question_id = $1",
            QUESTION_COLUMNS
        );
        sqlx::query_as::<_, QuizQuestion>(&query)
            .bind(question_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Question not found")))
    }
}
