//! Survey domain models and answer validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

/// Lowest accepted rating answer.
pub const RATING_MIN: i64 = 1;
/// Highest accepted rating answer.
pub const RATING_MAX: i64 = 5;

/// Input widget / answer type of a survey question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Text,
    Textarea,
    Rating,
    Choice,
    MultiChoice,
    YesNo,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Text => "text",
            QuestionKind::Textarea => "textarea",
            QuestionKind::Rating => "rating",
            QuestionKind::Choice => "choice",
            QuestionKind::MultiChoice => "multi_choice",
            QuestionKind::YesNo => "yes_no",
        }
    }

    pub fn has_options(&self) -> bool {
        matches!(self, QuestionKind::Choice | QuestionKind::MultiChoice)
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(QuestionKind::Text),
            "textarea" => Ok(QuestionKind::Textarea),
            "rating" => Ok(QuestionKind::Rating),
            "choice" => Ok(QuestionKind::Choice),
            "multi_choice" => Ok(QuestionKind::MultiChoice),
            "yes_no" => Ok(QuestionKind::YesNo),
            _ => Err(format!("Invalid question kind: {}", s)),
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One question definition, stored inside the survey's JSON question list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyQuestion {
    pub id: String,
    pub label: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub questions: Vec<SurveyQuestion>,
    pub is_active: bool,
    pub event_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResponse {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub event_id: Option<Uuid>,
    pub respondent_email: Option<String>,
    pub answers: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

/// Problems found in a survey definition or a submitted answer set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurveyError {
    #[error("Survey must have at least one question")]
    NoQuestions,

    #[error("Duplicate question id: {0}")]
    DuplicateQuestion(String),

    #[error("Question {0} needs at least one option")]
    MissingOptions(String),

    #[error("Question {0} is required")]
    MissingAnswer(String),

    #[error("Unknown question: {0}")]
    UnknownQuestion(String),

    #[error("Invalid answer for question {0}")]
    InvalidAnswer(String),

    #[error("Rating for question {0} must be between 1 and 5")]
    RatingOutOfRange(String),
}

/// Checks that question ids are unique and choice questions list options.
pub fn validate_questions(questions: &[SurveyQuestion]) -> Result<(), SurveyError> {
    if questions.is_empty() {
        return Err(SurveyError::NoQuestions);
    }

    let mut seen = HashSet::new();
    for question in questions {
        if !seen.insert(question.id.as_str()) {
            return Err(SurveyError::DuplicateQuestion(question.id.clone()));
        }
        if question.kind.has_options() && question.options.is_empty() {
            return Err(SurveyError::MissingOptions(question.id.clone()));
        }
    }
    Ok(())
}

/// Checks a submitted answer set against the survey's questions.
///
/// Blank strings and empty arrays count as unanswered. Answers to questions
/// the survey does not define are rejected.
pub fn validate_answers(
    questions: &[SurveyQuestion],
    answers: &Map<String, Value>,
) -> Result<(), SurveyError> {
    for key in answers.keys() {
        if !questions.iter().any(|q| &q.id == key) {
            return Err(SurveyError::UnknownQuestion(key.clone()));
        }
    }

    for question in questions {
        let answer = answers.get(&question.id).filter(|v| !is_blank(v));
        let Some(answer) = answer else {
            if question.required {
                return Err(SurveyError::MissingAnswer(question.id.clone()));
            }
            continue;
        };
        validate_answer(question, answer)?;
    }
    Ok(())
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn validate_answer(question: &SurveyQuestion, answer: &Value) -> Result<(), SurveyError> {
    let invalid = || SurveyError::InvalidAnswer(question.id.clone());

    match question.kind {
        QuestionKind::Text | QuestionKind::Textarea => {
            answer.as_str().ok_or_else(invalid)?;
        }
        QuestionKind::Rating => {
            let rating = answer.as_i64().ok_or_else(invalid)?;
            if !(RATING_MIN..=RATING_MAX).contains(&rating) {
                return Err(SurveyError::RatingOutOfRange(question.id.clone()));
            }
        }
        QuestionKind::Choice => {
            let choice = answer.as_str().ok_or_else(invalid)?;
            if !question.options.iter().any(|o| o == choice) {
                return Err(invalid());
            }
        }
        QuestionKind::MultiChoice => {
            let choices = answer.as_array().ok_or_else(invalid)?;
            for choice in choices {
                let choice = choice.as_str().ok_or_else(invalid)?;
                if !question.options.iter().any(|o| o == choice) {
                    return Err(invalid());
                }
            }
        }
        QuestionKind::YesNo => match answer {
            Value::Bool(_) => {}
            Value::String(s) if s == "yes" || s == "no" => {}
            _ => return Err(invalid()),
        },
    }
    Ok(())
}

/// Admin request to create a survey.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSurveyRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(custom(function = "shared::validation::validate_slug"))]
    pub slug: Option<String>,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    pub questions: Vec<SurveyQuestion>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub event_id: Option<Uuid>,
}

fn default_true() -> bool {
    true
}

/// Public survey submission.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSurveyRequest {
    pub survey_id: Uuid,
    pub event_id: Option<Uuid>,
    #[validate(custom(function = "shared::validation::validate_email_shape"))]
    pub respondent_email: Option<String>,
    #[serde(default)]
    pub answers: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSurveyResponse {
    pub success: bool,
    pub response_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResponsesList {
    pub survey: Survey,
    pub data: Vec<SurveyResponse>,
    pub total: usize,
}
