use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::identity::Identity;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OnboardingResponse {
    pub completed: bool,
    pub user: Identity,
}

#[derive(Debug, Deserialize)]
pub struct OnboardingUpdate {
    pub completed: bool,
}

/// GET /api/v1/onboarding
pub async fn handle_get_onboarding(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<OnboardingResponse>, AppError> {
    let sub = identity.require_sub()?;
    let completed = state.onboarding.is_completed(sub).await?;
    Ok(Json(OnboardingResponse {
        completed,
        user: identity,
    }))
}

/// PUT /api/v1/onboarding
pub async fn handle_set_onboarding(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<OnboardingUpdate>,
) -> Result<Json<OnboardingResponse>, AppError> {
    let sub = identity.require_sub()?;
    state.onboarding.set_completed(sub, req.completed).await?;
    Ok(Json(OnboardingResponse {
        completed: req.completed,
        user: identity,
    }))
}
