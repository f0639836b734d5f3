// src/handlers/documents.rs

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use utoipa::ToSchema;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedAgent, i18n::Locale},
    models::ai::ExtractionResponse,
    services::document_service::UploadedFile,
};

/// Corpo multipart do upload de PDFs (campo `documento`, repetível).
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct DocumentUpload {
    #[schema(value_type = Vec<String>, format = Binary)]
    documento: Vec<Vec<u8>>,
}

/// Lê todos os arquivos do campo `field` (partes sem nome de arquivo são ignoradas).
pub async fn read_files(multipart: &mut Multipart, field: &str) -> Result<Vec<UploadedFile>, AppError> {
    let mut files = Vec::new();

    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidUpload(e.to_string()))?
    {
        if part.name() != Some(field) {
            continue;
        }
        let Some(name) = part.file_name().map(str::to_string).filter(|n| !n.trim().is_empty()) else {
            continue;
        };
        let bytes = part
            .bytes()
            .await
            .map_err(|e| AppError::InvalidUpload(e.to_string()))?;
        files.push(UploadedFile { name, bytes: bytes.to_vec() });
    }

    if files.is_empty() {
        return Err(AppError::InvalidUpload("nenhum arquivo enviado".into()));
    }
    Ok(files)
}

// POST /api/developments/extract
#[utoipa::path(
    post,
    path = "/api/developments/extract",
    tag = "Developments",
    request_body(content = DocumentUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Campos pré-preenchidos pela IA (com avisos, se houver)", body = ExtractionResponse),
        (status = 400, description = "Nenhum documento enviado")
    ),
    security(("api_jwt" = []))
)]
pub async fn extract_documents(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedAgent(agent): AuthenticatedAgent,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let files = read_files(&mut multipart, "documento")
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!("🤖 {} enviou {} documento(s) para extração", agent.id, files.len());
    let response = app_state.extraction_service.prefill(files).await;

    Ok((StatusCode::OK, Json(response)))
}

// GET /api/uploads/{filename}
#[utoipa::path(
    get,
    path = "/api/uploads/{filename}",
    tag = "Developments",
    params(("filename" = String, Path, description = "Nome armazenado do arquivo")),
    responses(
        (status = 200, description = "Conteúdo do arquivo"),
        (status = 404, description = "Arquivo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn download_upload(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = app_state
        .development_service
        .read_upload(&filename)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mime = mime_guess::from_path(&filename).first_or_octet_stream();
    let headers = [
        (header::CONTENT_TYPE, mime.to_string()),
        (header::CONTENT_DISPOSITION, inline_disposition(&filename)),
    ];

    Ok((headers, bytes).into_response())
}

// Aspas, barras invertidas e controles quebrariam o parâmetro `filename`.
fn inline_disposition(filename: &str) -> String {
    let quoted: String = filename
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    format!("inline; filename=\"{}\"", quoted)
}

#[cfg(test)]
mod tests {
    use axum::{extract::DefaultBodyLimit, routing::post, Router};
    use tokio::net::TcpListener;

    use super::*;
    use crate::config::DEFAULT_UPLOAD_MAX_BYTES;

    const BOUNDARY: &str = "----crm-boundary";

    async fn total_bytes(mut multipart: Multipart) -> Result<String, StatusCode> {
        let files = read_files(&mut multipart, "documento")
            .await
            .map_err(|_| StatusCode::BAD_REQUEST)?;
        Ok(files.iter().map(|f| f.bytes.len()).sum::<usize>().to_string())
    }

    fn multipart_body(filename: &str, content: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"documento\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn post_upload(app: Router, body: Vec<u8>) -> reqwest::Result<(reqwest::StatusCode, String)> {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/upload"))
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(body)
            .send()
            .await?;
        let status = response.status();
        Ok((status, response.text().await?))
    }

    #[test]
    fn disposition_filename_cannot_break_out_of_the_quotes() {
        assert_eq!(inline_disposition("12_planta.pdf"), "inline; filename=\"12_planta.pdf\"");

        let header = inline_disposition("planta \"A\"\\x.pdf\r\nX-Injetado: 1");
        assert_eq!(header, "inline; filename=\"planta _A__x.pdf__X-Injetado: 1\"");
        assert!(axum::http::HeaderValue::from_str(&header).is_ok());
    }

    #[tokio::test]
    async fn upload_routes_accept_files_past_the_default_body_limit() {
        let pdf = vec![b'x'; 3 * 1024 * 1024];
        let app = Router::new()
            .route("/upload", post(total_bytes))
            .layer(DefaultBodyLimit::max(DEFAULT_UPLOAD_MAX_BYTES));

        let (status, body) = post_upload(app, multipart_body("memorial.pdf", &pdf)).await.unwrap();

        assert_eq!(status, reqwest::StatusCode::OK);
        assert_eq!(body, pdf.len().to_string());
    }

    #[tokio::test]
    async fn without_the_limit_layer_a_large_file_is_refused() {
        let pdf = vec![b'x'; 3 * 1024 * 1024];
        let app = Router::new().route("/upload", post(total_bytes));

        // O servidor pode responder 400 ou fechar a conexão antes de ler o resto
        let result = post_upload(app, multipart_body("memorial.pdf", &pdf)).await;

        assert!(result.map_or(true, |(status, _)| status != reqwest::StatusCode::OK));
    }
}
