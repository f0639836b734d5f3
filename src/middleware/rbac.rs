// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedAgent, i18n::Locale},
    models::auth::Agent,
    services::policy::ensure_admin,
};

/// Guardião das rotas administrativas: só passa quem tem papel ADMIN.
pub struct AdminOnly(pub Agent);

impl<S> FromRequestParts<S> for AdminOnly
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let Ok(locale) = Locale::from_request_parts(parts, state).await;

        let translate = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

        // A. Corretor autenticado (inserido pelo auth_guard)
        let agent = parts
            .extensions
            .get::<AuthenticatedAgent>()
            .map(|a| a.0.clone())
            .ok_or(AppError::InvalidToken)
            .map_err(translate)?;

        // B. Papel
        ensure_admin(&agent).map_err(translate)?;

        Ok(AdminOnly(agent))
    }
}
