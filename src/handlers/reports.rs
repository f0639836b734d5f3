// src/handlers/reports.rs

use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use utoipa::ToSchema;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::documents::read_files,
    middleware::{auth::AuthenticatedAgent, i18n::Locale},
    models::crm::ImportSummary,
};

const EXPORT_FILENAME: &str = "relatorio_clientes.csv";

/// Corpo multipart da importação (campo `arquivo`, um `.csv`).
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct CsvUpload {
    #[schema(value_type = String, format = Binary)]
    arquivo: Vec<u8>,
}

// GET /api/reports/clients.csv
#[utoipa::path(
    get,
    path = "/api/reports/clients.csv",
    tag = "Reports",
    responses(
        (status = 200, description = "Clientes ativos em CSV (;, UTF-8 com BOM)", content_type = "text/csv"),
        (status = 404, description = "Nenhum cliente para exportar")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_clients_csv(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedAgent(agent): AuthenticatedAgent,
) -> Result<Response, ApiError> {
    let bytes = app_state
        .report_service
        .export_clients(&agent)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", EXPORT_FILENAME)),
    ];

    Ok((headers, bytes).into_response())
}

// POST /api/clients/import
#[utoipa::path(
    post,
    path = "/api/clients/import",
    tag = "Reports",
    request_body(content = CsvUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Resumo da importação", body = ImportSummary),
        (status = 400, description = "Arquivo ausente, não-CSV ou sem as colunas obrigatórias")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_clients(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedAgent(agent): AuthenticatedAgent,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut files = read_files(&mut multipart, "arquivo")
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    let file = files.swap_remove(0);

    if !file.name.to_lowercase().ends_with(".csv") {
        return Err(AppError::InvalidUpload("envie um arquivo .csv".into())
            .to_api_error(&locale, &app_state.i18n_store));
    }

    let summary = app_state
        .report_service
        .import_clients(&agent, &file.bytes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(summary)))
}
