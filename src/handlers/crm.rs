// src/handlers/crm.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedAgent, i18n::Locale, rbac::AdminOnly},
    models::{
        ai::SuggestionResponse,
        crm::{
            Activity, ActivityPayload, Client, ClientDetail, ClientListQuery, ClientPayload, InterestPayload,
            RestoreClientPayload,
        },
        development::DevelopmentSummary,
    },
};

// =============================================================================
//  ÁREA 1: CLIENTES
// =============================================================================

// GET /api/clients
#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "Clients",
    params(
        ("search" = Option<String>, Query, description = "Parte do nome"),
        ("status" = Option<String>, Query, description = "NEW_LEAD, IN_CONTACT, NEGOTIATING, PURCHASED ou DISCARDED")
    ),
    responses(
        (status = 200, description = "Clientes ativos visíveis ao corretor", body = Vec<Client>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_clients(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedAgent(agent): AuthenticatedAgent,
    Query(query): Query<ClientListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let clients = app_state
        .crm_service
        .list_clients(&agent, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(clients)))
}

// POST /api/clients
#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "Clients",
    request_body = ClientPayload,
    responses(
        (status = 201, description = "Cliente cadastrado", body = Client),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "CPF ou e-mail já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_client(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedAgent(agent): AuthenticatedAgent,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let client = app_state
        .crm_service
        .create_client(&agent, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(client)))
}

// GET /api/clients/{id}
#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente com interesses e atividades", body = ClientDetail),
        (status = 403, description = "Cliente de outro corretor"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_client(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedAgent(agent): AuthenticatedAgent,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .crm_service
        .get_client_detail(&agent, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// PUT /api/clients/{id}
#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = ClientPayload,
    responses(
        (status = 200, description = "Cliente atualizado", body = Client),
        (status = 409, description = "CPF ou e-mail já cadastrado em outro cliente")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_client(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedAgent(agent): AuthenticatedAgent,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let client = app_state
        .crm_service
        .update_client(&agent, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(client)))
}

// POST /api/clients/{id}/discard
#[utoipa::path(
    post,
    path = "/api/clients/{id}/discard",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses((status = 204, description = "Cliente movido para a lixeira")),
    security(("api_jwt" = []))
)]
pub async fn discard_client(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedAgent(agent): AuthenticatedAgent,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .crm_service
        .discard_client(&agent, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/clients/discarded
#[utoipa::path(
    get,
    path = "/api/clients/discarded",
    tag = "Clients",
    responses(
        (status = 200, description = "Lixeira de clientes", body = Vec<Client>),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_discarded(
    State(app_state): State<AppState>,
    locale: Locale,
    AdminOnly(admin): AdminOnly,
) -> Result<impl IntoResponse, ApiError> {
    let clients = app_state
        .crm_service
        .list_discarded(&admin)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(clients)))
}

// POST /api/clients/{id}/restore
#[utoipa::path(
    post,
    path = "/api/clients/{id}/restore",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = RestoreClientPayload,
    responses(
        (status = 200, description = "Cliente restaurado com novo dono", body = Client),
        (status = 404, description = "Cliente ou corretor não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn restore_client(
    State(app_state): State<AppState>,
    locale: Locale,
    AdminOnly(admin): AdminOnly,
    Path(id): Path<Uuid>,
    Json(payload): Json<RestoreClientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let client = app_state
        .crm_service
        .restore_client(&admin, id, payload.new_owner_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(client)))
}

// DELETE /api/clients/{id}
#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 204, description = "Cliente excluído permanentemente"),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_client(
    State(app_state): State<AppState>,
    locale: Locale,
    AdminOnly(admin): AdminOnly,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .crm_service
        .delete_client(&admin, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ÁREA 2: ATIVIDADES
// =============================================================================

// POST /api/clients/{id}/activities
#[utoipa::path(
    post,
    path = "/api/clients/{id}/activities",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = ActivityPayload,
    responses((status = 201, description = "Atividade registrada", body = Activity)),
    security(("api_jwt" = []))
)]
pub async fn add_activity(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedAgent(agent): AuthenticatedAgent,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<ActivityPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let activity = app_state
        .crm_service
        .add_activity(&agent, client_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(activity)))
}

// PUT /api/activities/{id}
#[utoipa::path(
    put,
    path = "/api/activities/{id}",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "ID da atividade")),
    request_body = ActivityPayload,
    responses((status = 200, description = "Atividade atualizada", body = Activity)),
    security(("api_jwt" = []))
)]
pub async fn update_activity(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedAgent(agent): AuthenticatedAgent,
    Path(id): Path<Uuid>,
    Json(payload): Json<ActivityPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let activity = app_state
        .crm_service
        .update_activity(&agent, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(activity)))
}

// DELETE /api/activities/{id}
#[utoipa::path(
    delete,
    path = "/api/activities/{id}",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "ID da atividade")),
    responses((status = 204, description = "Atividade excluída")),
    security(("api_jwt" = []))
)]
pub async fn delete_activity(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedAgent(agent): AuthenticatedAgent,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .crm_service
        .delete_activity(&agent, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ÁREA 3: INTERESSES E SUGESTÕES
// =============================================================================

// POST /api/clients/{id}/interests
#[utoipa::path(
    post,
    path = "/api/clients/{id}/interests",
    tag = "Interests",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = InterestPayload,
    responses((status = 204, description = "Interesse registrado (repetir não duplica)")),
    security(("api_jwt" = []))
)]
pub async fn add_interest(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedAgent(agent): AuthenticatedAgent,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<InterestPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .interest_service
        .add(&agent, client_id, payload.development_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// DELETE /api/clients/{id}/interests/{development_id}
#[utoipa::path(
    delete,
    path = "/api/clients/{id}/interests/{development_id}",
    tag = "Interests",
    params(
        ("id" = Uuid, Path, description = "ID do cliente"),
        ("development_id" = Uuid, Path, description = "ID do empreendimento")
    ),
    responses((status = 204, description = "Interesse removido (ausente é ignorado)")),
    security(("api_jwt" = []))
)]
pub async fn remove_interest(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedAgent(agent): AuthenticatedAgent,
    Path((client_id, development_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .interest_service
        .remove(&agent, client_id, development_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/clients/{id}/available-developments
#[utoipa::path(
    get,
    path = "/api/clients/{id}/available-developments",
    tag = "Interests",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses((status = 200, description = "Empreendimentos ainda sem interesse do cliente", body = Vec<DevelopmentSummary>)),
    security(("api_jwt" = []))
)]
pub async fn list_available_developments(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedAgent(agent): AuthenticatedAgent,
    Path(client_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, available) = app_state
        .interest_service
        .available_for(&agent, client_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(available)))
}

// POST /api/clients/{id}/suggestions
#[utoipa::path(
    post,
    path = "/api/clients/{id}/suggestions",
    tag = "Interests",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses((status = 200, description = "Sugestão da IA (ou frase padrão com aviso)", body = SuggestionResponse)),
    security(("api_jwt" = []))
)]
pub async fn suggest_developments(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedAgent(agent): AuthenticatedAgent,
    Path(client_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let suggestion = app_state
        .matcher_service
        .suggest(&agent, client_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(suggestion)))
}
