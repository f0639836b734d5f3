// src/handlers/developments.rs

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    handlers::documents::read_files,
    middleware::{auth::AuthenticatedAgent, i18n::Locale, rbac::AdminOnly},
    models::development::{
        Development, DevelopmentDetail, DevelopmentPayload, DevelopmentSummary, Material, OperationReport,
        RenameMaterialPayload, UploadReport,
    },
};

/// Corpo multipart do upload de materiais (campo `arquivos`, repetível).
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct MaterialUpload {
    #[schema(value_type = Vec<String>, format = Binary)]
    arquivos: Vec<Vec<u8>>,
}

// =============================================================================
//  ÁREA 1: EMPREENDIMENTOS
// =============================================================================

// GET /api/developments
#[utoipa::path(
    get,
    path = "/api/developments",
    tag = "Developments",
    responses((status = 200, description = "Todos os empreendimentos, por nome", body = Vec<Development>)),
    security(("api_jwt" = []))
)]
pub async fn list_developments(
    State(app_state): State<AppState>,
    locale: Locale,
    _agent: AuthenticatedAgent,
) -> Result<impl IntoResponse, ApiError> {
    let developments = app_state
        .development_service
        .list()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(developments)))
}

// GET /api/developments/{id}
#[utoipa::path(
    get,
    path = "/api/developments/{id}",
    tag = "Developments",
    params(("id" = Uuid, Path, description = "ID do empreendimento")),
    responses(
        (status = 200, description = "Empreendimento com materiais", body = DevelopmentDetail),
        (status = 404, description = "Empreendimento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_development(
    State(app_state): State<AppState>,
    locale: Locale,
    _agent: AuthenticatedAgent,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .development_service
        .get_detail(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// POST /api/developments
#[utoipa::path(
    post,
    path = "/api/developments",
    tag = "Developments",
    request_body = DevelopmentPayload,
    responses(
        (status = 201, description = "Empreendimento criado (com materiais já enviados)", body = DevelopmentDetail),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_development(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedAgent(agent): AuthenticatedAgent,
    Json(payload): Json<DevelopmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .development_service
        .create(&agent, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(detail)))
}

// PUT /api/developments/{id}
#[utoipa::path(
    put,
    path = "/api/developments/{id}",
    tag = "Developments",
    params(("id" = Uuid, Path, description = "ID do empreendimento")),
    request_body = DevelopmentPayload,
    responses((status = 200, description = "Empreendimento atualizado", body = Development)),
    security(("api_jwt" = []))
)]
pub async fn update_development(
    State(app_state): State<AppState>,
    locale: Locale,
    _agent: AuthenticatedAgent,
    Path(id): Path<Uuid>,
    Json(payload): Json<DevelopmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let development = app_state
        .development_service
        .update(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(development)))
}

// DELETE /api/developments/{id}
#[utoipa::path(
    delete,
    path = "/api/developments/{id}",
    tag = "Developments",
    params(("id" = Uuid, Path, description = "ID do empreendimento")),
    responses(
        (status = 200, description = "Empreendimento excluído (com avisos de arquivos)", body = OperationReport),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_development(
    State(app_state): State<AppState>,
    locale: Locale,
    AdminOnly(admin): AdminOnly,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .development_service
        .delete(&admin, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}

// GET /api/v1/developments
#[utoipa::path(
    get,
    path = "/api/v1/developments",
    tag = "Public",
    responses((status = 200, description = "Empreendimentos públicos", body = Vec<DevelopmentSummary>))
)]
pub async fn list_public_developments(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let developments = app_state
        .development_service
        .list_public()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(developments)))
}

// =============================================================================
//  ÁREA 2: MATERIAIS
// =============================================================================

// POST /api/developments/{id}/materials
#[utoipa::path(
    post,
    path = "/api/developments/{id}/materials",
    tag = "Developments",
    params(("id" = Uuid, Path, description = "ID do empreendimento")),
    request_body(content = MaterialUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Materiais anexados", body = UploadReport),
        (status = 400, description = "Nenhum arquivo enviado"),
        (status = 404, description = "Empreendimento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_materials(
    State(app_state): State<AppState>,
    locale: Locale,
    _agent: AuthenticatedAgent,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let files = read_files(&mut multipart, "arquivos")
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let report = app_state
        .development_service
        .upload_materials(id, files)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(report)))
}

// PUT /api/materials/{id}
#[utoipa::path(
    put,
    path = "/api/materials/{id}",
    tag = "Developments",
    params(("id" = Uuid, Path, description = "ID do material")),
    request_body = RenameMaterialPayload,
    responses((status = 200, description = "Material renomeado", body = Material)),
    security(("api_jwt" = []))
)]
pub async fn rename_material(
    State(app_state): State<AppState>,
    locale: Locale,
    _agent: AuthenticatedAgent,
    Path(id): Path<Uuid>,
    Json(payload): Json<RenameMaterialPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let material = app_state
        .development_service
        .rename_material(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(material)))
}

// DELETE /api/materials/{id}
#[utoipa::path(
    delete,
    path = "/api/materials/{id}",
    tag = "Developments",
    params(("id" = Uuid, Path, description = "ID do material")),
    responses(
        (status = 200, description = "Material excluído", body = OperationReport),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_material(
    State(app_state): State<AppState>,
    locale: Locale,
    AdminOnly(admin): AdminOnly,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .development_service
        .delete_material(&admin, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}
