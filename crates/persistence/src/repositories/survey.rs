//! Survey repository for database operations.

use domain::models::SurveyQuestion;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{SurveyEntity, SurveyResponseEntity};
use crate::metrics::QueryTimer;

const SURVEY_COLUMNS: &str =
    "id, title, slug, description, questions, is_active, event_id, created_at, updated_at";

const RESPONSE_COLUMNS: &str = "id, survey_id, event_id, respondent_email, answers, created_at";

/// Repository for survey database operations.
#[derive(Clone)]
pub struct SurveyRepository {
    pool: PgPool,
}

impl SurveyRepository {
    /// Creates a new SurveyRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new survey.
    pub async fn create(
        &self,
        title: &str,
        slug: &str,
        description: Option<&str>,
        questions: &[SurveyQuestion],
        is_active: bool,
        event_id: Option<Uuid>,
    ) -> Result<SurveyEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_survey");
        let sql = format!(
            r#"
            INSERT INTO surveys (title, slug, description, questions, is_active, event_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SURVEY_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, SurveyEntity>(&sql)
            .bind(title)
            .bind(slug)
            .bind(description)
            .bind(Json(questions))
            .bind(is_active)
            .bind(event_id)
            .fetch_one(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Find a survey by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<SurveyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_survey_by_id");
        let sql = format!("SELECT {SURVEY_COLUMNS} FROM surveys WHERE id = $1");
        let result = sqlx::query_as::<_, SurveyEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Find an active survey by slug.
    pub async fn find_active_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<SurveyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_active_survey_by_slug");
        let sql = format!("SELECT {SURVEY_COLUMNS} FROM surveys WHERE slug = $1 AND is_active = true");
        let result = sqlx::query_as::<_, SurveyEntity>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Store a submitted answer set.
    pub async fn insert_response(
        &self,
        survey_id: Uuid,
        event_id: Option<Uuid>,
        respondent_email: Option<&str>,
        answers: &Map<String, Value>,
    ) -> Result<SurveyResponseEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_survey_response");
        let sql = format!(
            r#"
            INSERT INTO survey_responses (survey_id, event_id, respondent_email, answers)
            VALUES ($1, $2, $3, $4)
            RETURNING {RESPONSE_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, SurveyResponseEntity>(&sql)
            .bind(survey_id)
            .bind(event_id)
            .bind(respondent_email)
            .bind(Json(answers))
            .fetch_one(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Responses to a survey, newest first.
    pub async fn list_responses(
        &self,
        survey_id: Uuid,
    ) -> Result<Vec<SurveyResponseEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_survey_responses");
        let sql = format!(
            r#"
            SELECT {RESPONSE_COLUMNS}
            FROM survey_responses
            WHERE survey_id = $1
            ORDER BY created_at DESC
            "#
        );
        let result = sqlx::query_as::<_, SurveyResponseEntity>(&sql)
            .bind(survey_id)
            .fetch_all(&self.pool)
            .await;
        timer.finish(result)
    }
}
