//! Survey routes.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use domain::models::survey::{
    validate_answers, validate_questions, CreateSurveyRequest, SubmitSurveyRequest,
    SubmitSurveyResponse, SurveyResponsesList,
};
use domain::models::{Survey, SurveyResponse};
use persistence::repositories::SurveyRepository;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AppJson, AppPath};

/// GET /api/surveys/:slug
pub async fn get_survey(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> Result<Json<Survey>, ApiError> {
    let repo = SurveyRepository::new(state.pool.clone());
    let survey = repo
        .find_active_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Survey not found".to_string()))?;
    Ok(Json(survey.into()))
}

/// Submit answers to an active survey.
///
/// POST /api/surveys/respond
pub async fn submit_response(
    State(state): State<AppState>,
    AppJson(request): AppJson<SubmitSurveyRequest>,
) -> Result<(StatusCode, Json<SubmitSurveyResponse>), ApiError> {
    request.validate()?;

    let repo = SurveyRepository::new(state.pool.clone());
    let survey: Survey = repo
        .find_by_id(request.survey_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Survey not found".to_string()))?
        .into();
    if !survey.is_active {
        return Err(ApiError::Validation(
            "This survey is no longer accepting responses".to_string(),
        ));
    }

    validate_answers(&survey.questions, &request.answers)?;

    let email = request
        .respondent_email
        .as_deref()
        .map(shared::validation::normalize_email)
        .filter(|e| !e.is_empty());
    let response = repo
        .insert_response(
            survey.id,
            request.event_id.or(survey.event_id),
            email.as_deref(),
            &request.answers,
        )
        .await?;

    info!(survey_id = %survey.id, response_id = %response.id, "Survey response recorded");
    Ok((
        StatusCode::CREATED,
        Json(SubmitSurveyResponse {
            success: true,
            response_id: response.id,
        }),
    ))
}

/// POST /api/admin/surveys
pub async fn create_survey(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateSurveyRequest>,
) -> Result<(StatusCode, Json<Survey>), ApiError> {
    request.validate()?;
    validate_questions(&request.questions)?;

    let slug = match &request.slug {
        Some(slug) => slug.clone(),
        None => shared::validation::slugify(&request.title),
    };
    if slug.is_empty() {
        return Err(ApiError::Validation(
            "Title must contain at least one letter or digit".to_string(),
        ));
    }

    let repo = SurveyRepository::new(state.pool.clone());
    let survey: Survey = repo
        .create(
            request.title.trim(),
            &slug,
            request.description.as_deref(),
            &request.questions,
            request.is_active,
            request.event_id,
        )
        .await?
        .into();

    info!(
        survey_id = %survey.id,
        slug = %survey.slug,
        questions = survey.questions.len(),
        "Survey created"
    );
    Ok((StatusCode::CREATED, Json(survey)))
}

/// GET /api/admin/surveys/:id/responses
pub async fn list_responses(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<SurveyResponsesList>, ApiError> {
    let repo = SurveyRepository::new(state.pool.clone());
    let survey: Survey = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Survey not found".to_string()))?
        .into();

    let data: Vec<SurveyResponse> = repo
        .list_responses(id)
        .await?
        .into_iter()
        .map(SurveyResponse::from)
        .collect();

    Ok(Json(SurveyResponsesList {
        survey,
        total: data.len(),
        data,
    }))
}
