//! Survey and survey response entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{Survey, SurveyQuestion, SurveyResponse};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the surveys table.
#[derive(Debug, Clone, FromRow)]
pub struct SurveyEntity {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub questions: Json<Vec<SurveyQuestion>>,
    pub is_active: bool,
    pub event_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SurveyEntity> for Survey {
    fn from(entity: SurveyEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            slug: entity.slug,
            description: entity.description,
            questions: entity.questions.0,
            is_active: entity.is_active,
            event_id: entity.event_id,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the survey_responses table.
#[derive(Debug, Clone, FromRow)]
pub struct SurveyResponseEntity {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub event_id: Option<Uuid>,
    pub respondent_email: Option<String>,
    pub answers: Json<serde_json::Map<String, serde_json::Value>>,
    pub created_at: DateTime<Utc>,
}

impl From<SurveyResponseEntity> for SurveyResponse {
    fn from(entity: SurveyResponseEntity) -> Self {
        Self {
            id: entity.id,
            survey_id: entity.survey_id,
            event_id: entity.event_id,
            respondent_email: entity.respondent_email,
            answers: entity.answers.0,
            created_at: entity.created_at,
        }
    }
}
