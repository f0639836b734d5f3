use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::LazyLock;
use thiserror::Error;

use crate::common::i18n::{I18nStore, DEFAULT_LANG};
use crate::middleware::i18n::Locale;

// Nosso tipo de erro, agora com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Campo obrigatório ausente: {0}")]
    MissingField(&'static str),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("{field} já cadastrado: {value}")]
    DuplicateField { field: &'static str, value: String },

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    AgentNotFound,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Ação restrita a administradores")]
    AdminOnly,

    #[error("{0} não encontrado")]
    NotFound(&'static str),

    #[error("Upload inválido: {0}")]
    InvalidUpload(String),

    #[error("CSV inválido: {0}")]
    InvalidCsv(String),

    #[error("Nada para exportar")]
    NothingToExport,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro de E/S: {0}")]
    IoError(#[from] std::io::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// O erro que efetivamente sai na resposta HTTP (já traduzido).
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl AppError {
    /// Código estável usado como chave no catálogo de mensagens.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation",
            AppError::MissingField(_) => "missing_field",
            AppError::EmailAlreadyExists => "email_already_exists",
            AppError::DuplicateField { .. } => "duplicate_field",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken => "invalid_token",
            AppError::AgentNotFound => "agent_not_found",
            AppError::Forbidden => "forbidden",
            AppError::AdminOnly => "admin_only",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidUpload(_) => "invalid_upload",
            AppError::InvalidCsv(_) => "invalid_csv",
            AppError::NothingToExport => "nothing_to_export",
            _ => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::MissingField(_)
            | AppError::InvalidUpload(_)
            | AppError::InvalidCsv(_) => StatusCode::BAD_REQUEST,
            AppError::EmailAlreadyExists | AppError::DuplicateField { .. } => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden | AppError::AdminOnly => StatusCode::FORBIDDEN,
            AppError::AgentNotFound | AppError::NotFound(_) | AppError::NothingToExport => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro de domínio na resposta traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        let code = self.code();

        let error = match self {
            AppError::MissingField(field) => store.translate(&locale.0, code, &[("field", field)]),
            AppError::DuplicateField { field, value } => {
                store.translate(&locale.0, code, &[("field", field), ("value", value)])
            }
            AppError::NotFound(entity) => store.translate(&locale.0, code, &[("entity", entity)]),
            AppError::InvalidUpload(reason) | AppError::InvalidCsv(reason) => {
                store.translate(&locale.0, code, &[("reason", reason)])
            }
            e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                // O detalhe fica só no log
                tracing::error!("Erro Interno do Servidor: {}", e);
                store.translate(&locale.0, code, &[])
            }
            _ => store.translate(&locale.0, code, &[]),
        };

        // Retorna todos os detalhes da validação, campo a campo.
        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                Some(Value::Object(details))
            }
            _ => None,
        };

        ApiError { status, error, details }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

static FALLBACK_STORE: LazyLock<I18nStore> = LazyLock::new(I18nStore::new);

// Usado onde não há Locale disponível (ex: middleware de autenticação)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale(DEFAULT_LANG.to_string()), &FALLBACK_STORE)
            .into_response()
    }
}

/// Mapeia violação de chave única do Postgres para o campo correspondente.
pub fn map_unique_violation(e: sqlx::Error, field: &'static str, value: Option<&str>) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::DuplicateField {
                field,
                value: value.unwrap_or("?").to_string(),
            };
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt() -> Locale {
        Locale("pt".to_string())
    }

    #[test]
    fn duplicate_field_is_conflict_with_field_and_value() {
        let store = I18nStore::new();
        let err = AppError::DuplicateField { field: "CPF", value: "111.222.333-44".into() };
        let api = err.to_api_error(&pt(), &store);
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert_eq!(api.error, "Erro: CPF 111.222.333-44 já está cadastrado.");
    }

    #[test]
    fn internal_errors_hide_details() {
        let store = I18nStore::new();
        let err = AppError::InternalServerError(anyhow::anyhow!("senha do banco vazou"));
        let api = err.to_api_error(&Locale("en".into()), &store);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.error, "An unexpected error occurred.");
    }

    #[test]
    fn authorization_errors_map_to_403() {
        let store = I18nStore::new();
        assert_eq!(AppError::Forbidden.to_api_error(&pt(), &store).status, StatusCode::FORBIDDEN);
        assert_eq!(AppError::AdminOnly.to_api_error(&pt(), &store).status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn not_found_names_the_entity() {
        let store = I18nStore::new();
        let api = AppError::NotFound("Cliente").to_api_error(&pt(), &store);
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.error, "Cliente não encontrado.");
    }
}
