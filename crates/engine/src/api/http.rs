//! HTTP routes.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use questline_domain::{
    Badge, DomainError, OnboardingProgress, QuestTemplate, StepDefinition, TemplateId, UserId,
};

use crate::app::App;
use crate::use_cases::{BadgeError, OnboardingError};

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/onboarding/{user_id}/start", post(start_onboarding))
        .route(
            "/api/onboarding/{user_id}/steps/{step_id}/complete",
            post(complete_step),
        )
        .route(
            "/api/onboarding/{user_id}/steps/{step_id}/skip",
            post(skip_step),
        )
        .route("/api/onboarding/{user_id}", get(get_progress))
        .route("/api/onboarding/{user_id}/next-step", get(get_next_step))
        .route("/api/users/{user_id}/badges", get(list_badges))
        .route("/api/templates", get(list_templates))
        .route("/api/templates/{id}", get(get_template))
}

async fn health() -> &'static str {
    "OK"
}

// =============================================================================
// Onboarding
// =============================================================================

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartRequest {
    #[serde(default)]
    template_id: Option<TemplateId>,
}

async fn start_onboarding(
    State(app): State<Arc<App>>,
    Path(user_id): Path<String>,
    Json(request): Json<StartRequest>,
) -> Result<Json<OnboardingProgress>, ApiError> {
    let user_id = UserId::new(user_id)?;
    let progress = app
        .use_cases
        .start
        .execute(user_id, request.template_id)
        .await?;
    Ok(Json(progress))
}

async fn complete_step(
    State(app): State<Arc<App>>,
    Path((user_id, step_id)): Path<(String, String)>,
) -> Result<Json<OnboardingProgress>, ApiError> {
    let user_id = UserId::new(user_id)?;
    let step_id = questline_domain::StepId::new(step_id)?;
    let progress = app.use_cases.complete_step.execute(user_id, step_id).await?;
    Ok(Json(progress))
}

async fn skip_step(
    State(app): State<Arc<App>>,
    Path((user_id, step_id)): Path<(String, String)>,
) -> Result<Json<OnboardingProgress>, ApiError> {
    let user_id = UserId::new(user_id)?;
    let step_id = questline_domain::StepId::new(step_id)?;
    let progress = app.use_cases.skip_step.execute(user_id, step_id).await?;
    Ok(Json(progress))
}

async fn get_progress(
    State(app): State<Arc<App>>,
    Path(user_id): Path<String>,
) -> Result<Json<OnboardingProgress>, ApiError> {
    let user_id = UserId::new(user_id)?;
    let progress = app
        .use_cases
        .queries
        .get(&user_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(progress))
}

async fn get_next_step(
    State(app): State<Arc<App>>,
    Path(user_id): Path<String>,
) -> Result<Json<Option<StepDefinition>>, ApiError> {
    let user_id = UserId::new(user_id)?;
    let next = app.use_cases.queries.next_step(&user_id).await?;
    Ok(Json(next))
}

// =============================================================================
// Badges
// =============================================================================

async fn list_badges(
    State(app): State<Arc<App>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Badge>>, ApiError> {
    let user_id = UserId::new(user_id)?;
    let badges = app.use_cases.badges.list(&user_id).await?;
    Ok(Json(badges))
}

// =============================================================================
// Templates
// =============================================================================

async fn list_templates(
    State(app): State<Arc<App>>,
) -> Result<Json<Vec<QuestTemplate>>, ApiError> {
    let templates = app.use_cases.templates.list_active().await?;
    Ok(Json(templates))
}

async fn get_template(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
) -> Result<Json<QuestTemplate>, ApiError> {
    let id = TemplateId::new(id)?;
    let template = app.use_cases.templates.get_active(Some(&id)).await?;
    Ok(Json(template))
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    Conflict(String),
    UnprocessableEntity(String),
    Internal(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::NotFound => {
                (axum::http::StatusCode::NOT_FOUND, "Not found").into_response()
            }
            ApiError::BadRequest(msg) => {
                (axum::http::StatusCode::BAD_REQUEST, msg).into_response()
            }
            ApiError::Conflict(msg) => {
                (axum::http::StatusCode::CONFLICT, msg).into_response()
            }
            ApiError::UnprocessableEntity(msg) => {
                (axum::http::StatusCode::UNPROCESSABLE_ENTITY, msg).into_response()
            }
            ApiError::Internal(_) => (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error",
            )
                .into_response(),
        }
    }
}

impl From<OnboardingError> for ApiError {
    fn from(e: OnboardingError) -> Self {
        match e {
            OnboardingError::TemplateNotFound(_)
            | OnboardingError::NoDefaultTemplate
            | OnboardingError::ProgressNotFound(_)
            | OnboardingError::StepNotFound(_) => ApiError::NotFound,
            OnboardingError::CannotSkipRequiredStep(_) => {
                ApiError::UnprocessableEntity(e.to_string())
            }
            OnboardingError::AlreadyTerminal => ApiError::Conflict(e.to_string()),
            OnboardingError::PersistenceUnavailable(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<BadgeError> for ApiError {
    fn from(e: BadgeError) -> Self {
        match e {
            BadgeError::UnknownBadge(_) => ApiError::NotFound,
            BadgeError::PersistenceUnavailable(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}
