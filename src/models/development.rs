// src/models/development.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- EMPREENDIMENTO ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Development {
    pub id: Uuid,
    #[schema(example = "Residencial Alpha")]
    pub name: String,
    pub status: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub is_public: bool,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_estimate: Option<String>,
    pub average_unit_price: Option<String>,
    pub starting_price: Option<String>,
    pub unit_size: Option<String>,
    pub parking_spaces: Option<String>,
    pub land_size: Option<String>,
    pub tower_count: Option<i32>,
    pub basement_levels: Option<i32>,
    pub floor_count: Option<i32>,
    pub promotional_campaign: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Visão resumida. É também o formato da API pública.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct DevelopmentSummary {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: Uuid,
    pub development_id: Uuid,
    #[schema(example = "Book de vendas.pdf")]
    pub original_name: String,
    #[schema(example = "20250101120000_Book_de_vendas.pdf")]
    pub stored_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DevelopmentDetail {
    pub development: Development,
    pub materials: Vec<Material>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DevelopmentPayload {
    #[validate(length(min = 1, max = 150, message = "O nome do empreendimento é obrigatório (até 150 caracteres)."))]
    #[schema(example = "Residencial Alpha")]
    pub name: String,
    #[validate(length(max = 50))]
    pub status: Option<String>,
    #[validate(length(max = 250))]
    pub address: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    pub delivery_date: Option<NaiveDate>,
    #[validate(length(max = 100))]
    pub delivery_estimate: Option<String>,
    #[validate(length(max = 50))]
    pub average_unit_price: Option<String>,
    #[validate(length(max = 50))]
    pub starting_price: Option<String>,
    #[validate(length(max = 100))]
    pub unit_size: Option<String>,
    #[validate(length(max = 50))]
    pub parking_spaces: Option<String>,
    #[validate(length(max = 50))]
    pub land_size: Option<String>,
    #[validate(range(min = 0))]
    pub tower_count: Option<i32>,
    #[validate(range(min = 0))]
    pub basement_levels: Option<i32>,
    #[validate(range(min = 0))]
    pub floor_count: Option<i32>,
    pub promotional_campaign: Option<String>,

    // Pares "original|armazenado" já enviados na etapa de extração
    #[schema(example = "book.pdf|20250101120000_book.pdf")]
    pub uploaded_files: Option<String>,
    // O formulário veio pré-preenchido pela IA?
    #[serde(default)]
    pub ai_originated: bool,
    pub ai_source_text: Option<String>,
}

/// Arquivo já gravado em disco: nome enviado pelo usuário e nome no servidor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub original_name: String,
    pub stored_name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenameMaterialPayload {
    #[validate(length(min = 1, max = 200, message = "O nome do material é obrigatório (até 200 caracteres)."))]
    pub original_name: String,
}

/// Resposta de operações que concluem mas podem ter avisos (ex: arquivo que não saiu do disco).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperationReport {
    pub message: String,
    pub warnings: Vec<String>,
}

/// Materiais anexados num upload e os arquivos que não puderam ser gravados.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    pub materials: Vec<Material>,
    pub warnings: Vec<String>,
}

// --- ESQUEMA DA EXTRAÇÃO POR IA ---

/// Os 12 campos que a IA devolve (e que o humano corrige).
/// As chaves JSON são as do prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DevelopmentFields {
    #[serde(rename = "nome", default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "endereco", default)]
    pub address: String,
    #[serde(rename = "descricao", default)]
    pub description: String,
    #[serde(rename = "previsao_entrega", default)]
    pub delivery_estimate: String,
    #[serde(rename = "valor_a_partir_de", default)]
    pub starting_price: String,
    #[serde(rename = "tamanho_apartamentos_planta", default)]
    pub unit_size: String,
    #[serde(rename = "vagas_garagem", default)]
    pub parking_spaces: String,
    #[serde(rename = "quantidade_torres", default)]
    pub tower_count: String,
    #[serde(rename = "subsolos", default)]
    pub basement_levels: String,
    #[serde(rename = "andares", default)]
    pub floor_count: String,
    #[serde(rename = "campanha_promocional", default)]
    pub promotional_campaign: String,
}

fn json_to_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn opt_text(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

fn opt_number(value: Option<i32>) -> String {
    value.map(|n| n.to_string()).unwrap_or_default()
}

impl DevelopmentFields {
    /// Lê o objeto devolvido pelo modelo de forma tolerante:
    /// números viram texto e chaves ausentes viram "".
    pub fn from_json(obj: &Value) -> Self {
        let get = |key: &str| json_to_text(obj.get(key));
        Self {
            name: get("nome"),
            status: get("status"),
            address: get("endereco"),
            description: get("descricao"),
            delivery_estimate: get("previsao_entrega"),
            starting_price: get("valor_a_partir_de"),
            unit_size: get("tamanho_apartamentos_planta"),
            parking_spaces: get("vagas_garagem"),
            tower_count: get("quantidade_torres"),
            basement_levels: get("subsolos"),
            floor_count: get("andares"),
            promotional_campaign: get("campanha_promocional"),
        }
    }

    /// Os valores como o humano os submeteu no formulário.
    pub fn from_payload(payload: &DevelopmentPayload) -> Self {
        Self {
            name: payload.name.trim().to_string(),
            status: opt_text(&payload.status),
            address: opt_text(&payload.address),
            description: opt_text(&payload.description),
            delivery_estimate: opt_text(&payload.delivery_estimate),
            starting_price: opt_text(&payload.starting_price),
            unit_size: opt_text(&payload.unit_size),
            parking_spaces: opt_text(&payload.parking_spaces),
            tower_count: opt_number(payload.tower_count),
            basement_levels: opt_number(payload.basement_levels),
            floor_count: opt_number(payload.floor_count),
            promotional_campaign: opt_text(&payload.promotional_campaign),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use validator::Validate;

    #[test]
    fn from_json_accepts_numbers_and_missing_keys() {
        let obj = json!({ "nome": " Alpha ", "andares": 25, "subsolos": "2" });
        let fields = DevelopmentFields::from_json(&obj);
        assert_eq!(fields.name, "Alpha");
        assert_eq!(fields.floor_count, "25");
        assert_eq!(fields.basement_levels, "2");
        assert_eq!(fields.address, "");
    }

    #[test]
    fn from_payload_uses_the_submitted_values() {
        let payload = DevelopmentPayload {
            name: "Alpha Corrigido".into(),
            tower_count: Some(3),
            starting_price: Some("R$ 500 mil".into()),
            ..Default::default()
        };
        let fields = DevelopmentFields::from_payload(&payload);
        assert_eq!(fields.name, "Alpha Corrigido");
        assert_eq!(fields.tower_count, "3");
        assert_eq!(fields.starting_price, "R$ 500 mil");
        assert_eq!(fields.floor_count, "");
    }

    #[test]
    fn prefilled_values_longer_than_the_columns_fail_validation() {
        let payload = DevelopmentPayload {
            name: "Alpha".into(),
            status: Some("Em construção, com entrega prevista para o segundo semestre".into()),
            starting_price: Some("a partir de R$ 450.000,00 à vista ou financiado em até 120x".into()),
            ..Default::default()
        };
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("status"));
        assert!(fields.contains_key("starting_price"));

        let fits = DevelopmentPayload {
            name: "Alpha".into(),
            status: Some("Em construção".into()),
            ..Default::default()
        };
        assert!(fits.validate().is_ok());
    }
}
