// src/models/crm.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value; // <--- JSONB (endereço, cônjuge)
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::development::DevelopmentSummary;

// --- ENUMS ---

/// Enum com rótulo em português (o que aparece na tela e no CSV).
pub trait Labeled: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn label(&self) -> &'static str;
    fn code(&self) -> &'static str;

    /// Aceita tanto o rótulo ("Em Contato") quanto o código ("IN_CONTACT").
    fn from_label(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.iter().copied().find(|v| {
            v.label().eq_ignore_ascii_case(raw) || v.code().eq_ignore_ascii_case(raw)
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "client_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientStatus {
    NewLead,
    InContact,
    Negotiating,
    Purchased,
    Discarded,
}

impl Labeled for ClientStatus {
    const ALL: &'static [Self] = &[
        ClientStatus::NewLead,
        ClientStatus::InContact,
        ClientStatus::Negotiating,
        ClientStatus::Purchased,
        ClientStatus::Discarded,
    ];

    fn label(&self) -> &'static str {
        match self {
            ClientStatus::NewLead => "Lead Novo",
            ClientStatus::InContact => "Em Contato",
            ClientStatus::Negotiating => "Em Negociação",
            ClientStatus::Purchased => "Comprou",
            ClientStatus::Discarded => "Descartado",
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ClientStatus::NewLead => "NEW_LEAD",
            ClientStatus::InContact => "IN_CONTACT",
            ClientStatus::Negotiating => "NEGOTIATING",
            ClientStatus::Purchased => "PURCHASED",
            ClientStatus::Discarded => "DISCARDED",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "lead_temperature", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadTemperature {
    Hot,
    Warm,
    Cold,
}

impl Labeled for LeadTemperature {
    const ALL: &'static [Self] = &[LeadTemperature::Hot, LeadTemperature::Warm, LeadTemperature::Cold];

    fn label(&self) -> &'static str {
        match self {
            LeadTemperature::Hot => "Quente",
            LeadTemperature::Warm => "Morno",
            LeadTemperature::Cold => "Frio",
        }
    }

    fn code(&self) -> &'static str {
        match self {
            LeadTemperature::Hot => "HOT",
            LeadTemperature::Warm => "WARM",
            LeadTemperature::Cold => "COLD",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "marital_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaritalStatus {
    Single,
    Married,
    Divorced,
    Widowed,
    CivilUnion,
}

impl Labeled for MaritalStatus {
    const ALL: &'static [Self] = &[
        MaritalStatus::Single,
        MaritalStatus::Married,
        MaritalStatus::Divorced,
        MaritalStatus::Widowed,
        MaritalStatus::CivilUnion,
    ];

    fn label(&self) -> &'static str {
        match self {
            MaritalStatus::Single => "Solteiro(a)",
            MaritalStatus::Married => "Casado(a)",
            MaritalStatus::Divorced => "Divorciado(a)",
            MaritalStatus::Widowed => "Viúvo(a)",
            MaritalStatus::CivilUnion => "União Estável",
        }
    }

    fn code(&self) -> &'static str {
        match self {
            MaritalStatus::Single => "SINGLE",
            MaritalStatus::Married => "MARRIED",
            MaritalStatus::Divorced => "DIVORCED",
            MaritalStatus::Widowed => "WIDOWED",
            MaritalStatus::CivilUnion => "CIVIL_UNION",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "activity_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    Call,
    Email,
    Whatsapp,
    Meeting,
    Visit,
    FollowUp,
    Other,
}

impl Labeled for ActivityKind {
    const ALL: &'static [Self] = &[
        ActivityKind::Call,
        ActivityKind::Email,
        ActivityKind::Whatsapp,
        ActivityKind::Meeting,
        ActivityKind::Visit,
        ActivityKind::FollowUp,
        ActivityKind::Other,
    ];

    fn label(&self) -> &'static str {
        match self {
            ActivityKind::Call => "Ligação",
            ActivityKind::Email => "Email",
            ActivityKind::Whatsapp => "WhatsApp",
            ActivityKind::Meeting => "Reunião",
            ActivityKind::Visit => "Visita",
            ActivityKind::FollowUp => "Follow-up",
            ActivityKind::Other => "Outro",
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ActivityKind::Call => "CALL",
            ActivityKind::Email => "EMAIL",
            ActivityKind::Whatsapp => "WHATSAPP",
            ActivityKind::Meeting => "MEETING",
            ActivityKind::Visit => "VISIT",
            ActivityKind::FollowUp => "FOLLOW_UP",
            ActivityKind::Other => "OTHER",
        }
    }
}

// --- CLIENTE ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,

    #[schema(example = "Maria da Silva")]
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    #[schema(example = "123.456.789-00")]
    pub cpf: Option<String>,
    pub rg: Option<String>,
    pub profession: Option<String>,
    pub email: Option<String>,
    pub business_email: Option<String>,

    pub phone_area_code: String,
    pub phone_number: String,
    pub phone2_area_code: Option<String>,
    pub phone2_number: Option<String>,
    pub home_area_code: Option<String>,
    pub home_phone: Option<String>,
    pub work_area_code: Option<String>,
    pub work_phone: Option<String>,

    // Endereço residencial flexível (cep, logradouro, número, ...)
    pub address: Option<Value>,
    pub employer: Option<String>,
    pub business_address: Option<String>,

    pub marital_status: Option<MaritalStatus>,
    // Dados do cônjuge
    pub spouse: Option<Value>,

    pub lead_source: Option<String>,
    pub first_contact_date: Option<NaiveDate>,
    pub temperature: Option<LeadTemperature>,
    pub status: ClientStatus,
    pub income_bracket: Option<String>,
    pub target_price: Option<String>,
    pub notes: Option<String>,
    pub discarded: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dados de criação/edição de cliente.
/// Strings vazias viram `None` em `normalize()`, antes da validação.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientPayload {
    #[validate(length(min = 1, max = 150, message = "O nome completo é obrigatório (até 150 caracteres)."))]
    #[schema(example = "Maria da Silva")]
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    #[validate(length(max = 14, message = "CPF inválido."))]
    pub cpf: Option<String>,
    #[validate(length(max = 20, message = "RG inválido."))]
    pub rg: Option<String>,
    #[validate(length(max = 100))]
    pub profession: Option<String>,
    #[validate(email(message = "E-mail pessoal inválido."), length(max = 120))]
    pub email: Option<String>,
    #[validate(email(message = "E-mail comercial inválido."), length(max = 120))]
    pub business_email: Option<String>,

    #[validate(required(message = "O DDD e o Telefone Pessoal são obrigatórios."), length(max = 2))]
    #[schema(example = "11")]
    pub phone_area_code: Option<String>,
    #[validate(required(message = "O DDD e o Telefone Pessoal são obrigatórios."), length(max = 9))]
    #[schema(example = "912345678")]
    pub phone_number: Option<String>,
    #[validate(length(max = 2, message = "DDD inválido."))]
    pub phone2_area_code: Option<String>,
    #[validate(length(max = 9, message = "Telefone inválido."))]
    pub phone2_number: Option<String>,
    #[validate(length(max = 2, message = "DDD inválido."))]
    pub home_area_code: Option<String>,
    #[validate(length(max = 9, message = "Telefone inválido."))]
    pub home_phone: Option<String>,
    #[validate(length(max = 2, message = "DDD inválido."))]
    pub work_area_code: Option<String>,
    #[validate(length(max = 9, message = "Telefone inválido."))]
    pub work_phone: Option<String>,

    pub address: Option<Value>,
    #[validate(length(max = 150))]
    pub employer: Option<String>,
    pub business_address: Option<String>,
    pub marital_status: Option<MaritalStatus>,
    pub spouse: Option<Value>,

    #[validate(length(max = 100))]
    pub lead_source: Option<String>,
    pub first_contact_date: Option<NaiveDate>,
    pub temperature: Option<LeadTemperature>,
    pub status: Option<ClientStatus>,
    #[validate(length(max = 50))]
    pub income_bracket: Option<String>,
    #[validate(length(max = 50))]
    pub target_price: Option<String>,
    pub notes: Option<String>,
}

fn blank_to_none(value: &mut Option<String>) {
    if let Some(v) = value {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            *value = None;
        } else if trimmed.len() != v.len() {
            *v = trimmed.to_string();
        }
    }
}

impl ClientPayload {
    pub fn normalize(&mut self) {
        self.full_name = self.full_name.trim().to_string();
        for field in [
            &mut self.cpf,
            &mut self.rg,
            &mut self.profession,
            &mut self.email,
            &mut self.business_email,
            &mut self.phone_area_code,
            &mut self.phone_number,
            &mut self.phone2_area_code,
            &mut self.phone2_number,
            &mut self.home_area_code,
            &mut self.home_phone,
            &mut self.work_area_code,
            &mut self.work_phone,
            &mut self.employer,
            &mut self.business_address,
            &mut self.lead_source,
            &mut self.income_bracket,
            &mut self.target_price,
            &mut self.notes,
        ] {
            blank_to_none(field);
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientListQuery {
    pub search: Option<String>,
    pub status: Option<ClientStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestoreClientPayload {
    pub new_owner_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetail {
    pub client: Client,
    pub interests: Vec<DevelopmentSummary>,
    pub activities: Vec<Activity>,
}

/// Resultado da importação de clientes por CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped_duplicates: usize,
    pub skipped_invalid: usize,
}

// --- ATIVIDADES ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Uuid,
    pub kind: ActivityKind,
    pub summary: String,
    pub client_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPayload {
    pub kind: ActivityKind,
    #[validate(length(min = 1, message = "O resumo da atividade é obrigatório."))]
    #[schema(example = "Cliente pediu tabela de preços")]
    pub summary: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InterestPayload {
    pub development_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn labels_and_codes_are_both_accepted() {
        assert_eq!(ClientStatus::from_label("Em Negociação"), Some(ClientStatus::Negotiating));
        assert_eq!(ClientStatus::from_label("in_contact"), Some(ClientStatus::InContact));
        assert_eq!(MaritalStatus::from_label(" solteiro(a) "), Some(MaritalStatus::Single));
        assert_eq!(LeadTemperature::from_label("Tépido"), None);
    }

    #[test]
    fn normalize_turns_blank_strings_into_none() {
        let mut payload = ClientPayload {
            full_name: "  Maria ".into(),
            cpf: Some("   ".into()),
            email: Some("".into()),
            phone_area_code: Some(" 11 ".into()),
            phone_number: Some("912345678".into()),
            ..Default::default()
        };
        payload.normalize();
        assert_eq!(payload.full_name, "Maria");
        assert_eq!(payload.cpf, None);
        assert_eq!(payload.email, None);
        assert_eq!(payload.phone_area_code.as_deref(), Some("11"));
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn personal_phone_is_required() {
        let mut payload = ClientPayload {
            full_name: "Maria".into(),
            phone_area_code: Some("11".into()),
            phone_number: Some(" ".into()),
            ..Default::default()
        };
        payload.normalize();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("phone_number"));
    }

    #[test]
    fn values_longer_than_the_columns_are_rejected() {
        let mut payload = ClientPayload {
            full_name: "Maria".into(),
            rg: Some("1".repeat(31)),
            phone_area_code: Some("11".into()),
            phone_number: Some("912345678".into()),
            home_phone: Some("3333-4444 ramal 12".into()),
            target_price: Some("R$ ".repeat(20)),
            ..Default::default()
        };
        payload.normalize();
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("rg"));
        assert!(fields.contains_key("home_phone"));
        assert!(fields.contains_key("target_price"));

        let too_long_name = ClientPayload {
            full_name: "a".repeat(151),
            phone_area_code: Some("11".into()),
            phone_number: Some("912345678".into()),
            ..Default::default()
        };
        assert!(too_long_name.validate().unwrap_err().field_errors().contains_key("full_name"));
    }
}
