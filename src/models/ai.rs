// src/models/ai.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::development::{DevelopmentFields, StoredFile};

/// Avisos não fatais do fluxo de extração. Nunca interrompem a requisição.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractionWarning {
    /// Um arquivo não pôde ser lido como PDF.
    FileUnreadable { file: String, reason: String },
    /// Um arquivo não pôde ser gravado no servidor.
    FileNotStored { file: String, reason: String },
    /// Nenhum texto saiu dos PDFs (provavelmente PDF de imagem).
    NoTextExtracted,
    /// A IA respondeu, mas nem a autocorreção produziu JSON válido.
    MalformedResponse { raw: String },
    /// Falha de transporte ou de parse ao falar com a IA.
    InferenceFailed { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractionStatus {
    /// JSON válido na primeira resposta.
    Parsed,
    /// JSON válido após a autocorreção.
    Corrected,
    /// Resultado vazio; o formulário deve ser preenchido à mão.
    Empty,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResponse {
    pub extracted: DevelopmentFields,
    pub status: ExtractionStatus,
    // Texto original, devolvido no envio do formulário para o exemplo de correção
    pub source_text: String,
    pub uploaded_files: Vec<StoredFile>,
    // Os mesmos pares no formato do campo oculto: "orig|armazenado,orig|armazenado"
    pub uploaded_files_field: String,
    pub warnings: Vec<ExtractionWarning>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionResponse {
    pub suggestion: String,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionExample {
    pub id: Uuid,
    pub source_text: String,
    pub corrected_json: String,
    pub created_at: DateTime<Utc>,
}
