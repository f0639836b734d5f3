// src/services/matcher.rs

use std::fmt::Write as _;
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        ai::SuggestionResponse,
        auth::Agent,
        crm::{Client, Labeled},
        development::DevelopmentSummary,
    },
    services::{inference::InferenceClient, interest_service::InterestService},
};

pub const NO_CANDIDATES: &str = "Nenhum.";
pub const FALLBACK_SUGGESTION: &str = "Não foi possível gerar uma sugestão.";

/// Perfil do cliente seguido da lista de empreendimentos candidatos.
pub fn build_prompt(client: &Client, candidates: &[DevelopmentSummary]) -> String {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();

    let mut prompt = format!(
        "Perfil do cliente: - Nome: {}, Status: {}, Profissão: {}, Renda: {}, Valor Buscado: {}, Estado Civil: {}, Observações: {} --- \
         Com base neste perfil, sugira os 3 empreendimentos mais adequados da lista abaixo, justificando brevemente. \
         Empreendimentos disponíveis: ",
        client.full_name,
        client.status.label(),
        text(&client.profession),
        text(&client.income_bracket),
        text(&client.target_price),
        client.marital_status.map(|m| m.label()).unwrap_or_default(),
        text(&client.notes),
    );

    if candidates.is_empty() {
        prompt.push_str(NO_CANDIDATES);
    } else {
        for development in candidates {
            let _ = writeln!(
                prompt,
                "- {}: {}",
                development.name,
                development.description.as_deref().unwrap_or_default()
            );
        }
    }
    prompt
}

#[derive(Clone)]
pub struct MatcherService {
    client: Arc<dyn InferenceClient>,
    interests: InterestService,
}

impl MatcherService {
    pub fn new(client: Arc<dyn InferenceClient>, interests: InterestService) -> Self {
        Self { client, interests }
    }

    /// Texto livre da IA. Falha da IA não é erro: devolve a frase padrão com aviso.
    pub async fn suggest_for(&self, client: &Client, candidates: &[DevelopmentSummary]) -> SuggestionResponse {
        let prompt = build_prompt(client, candidates);
        match self.client.generate(&prompt).await {
            Ok(suggestion) => SuggestionResponse { suggestion, warning: None },
            Err(e) => {
                tracing::warn!("Não foi possível contatar a IA para o cliente {}: {}", client.id, e);
                SuggestionResponse {
                    suggestion: FALLBACK_SUGGESTION.to_string(),
                    warning: Some(format!("Não foi possível contatar a IA. Erro: {}", e)),
                }
            }
        }
    }

    pub async fn suggest(&self, agent: &Agent, client_id: Uuid) -> Result<SuggestionResponse, AppError> {
        let (client, candidates) = self.interests.available_for(agent, client_id).await?;
        Ok(self.suggest_for(&client, &candidates).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CrmRepository, DevelopmentRepository};
    use crate::models::crm::{ClientStatus, MaritalStatus};
    use crate::services::{
        extraction_service::tests::ScriptedClient,
        inference::InferenceError,
    };
    use chrono::Utc;
    use sqlx::postgres::PgPoolOptions;

    fn client() -> Client {
        Client {
            id: Uuid::new_v4(),
            owner_id: None,
            full_name: "Maria da Silva".into(),
            birth_date: None,
            cpf: None,
            rg: None,
            profession: Some("Médica".into()),
            email: None,
            business_email: None,
            phone_area_code: "11".into(),
            phone_number: "912345678".into(),
            phone2_area_code: None,
            phone2_number: None,
            home_area_code: None,
            home_phone: None,
            work_area_code: None,
            work_phone: None,
            address: None,
            employer: None,
            business_address: None,
            marital_status: Some(MaritalStatus::Married),
            spouse: None,
            lead_source: None,
            first_contact_date: None,
            temperature: None,
            status: ClientStatus::Negotiating,
            income_bracket: Some("20k+".into()),
            target_price: Some("1,2 mi".into()),
            notes: None,
            discarded: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn development(name: &str, description: &str) -> DevelopmentSummary {
        DevelopmentSummary {
            id: Uuid::new_v4(),
            name: name.into(),
            address: None,
            status: None,
            description: Some(description.into()),
        }
    }

    // Pool preguiçoso: estes testes não tocam no banco
    fn matcher(client: Arc<ScriptedClient>) -> MatcherService {
        let pool = PgPoolOptions::new().connect_lazy("postgres://localhost/nao_usado").unwrap();
        let interests = InterestService::new(
            CrmRepository::new(pool.clone()),
            DevelopmentRepository::new(pool.clone()),
            pool,
        );
        MatcherService::new(client, interests)
    }

    #[test]
    fn prompt_lists_profile_and_candidates() {
        let prompt = build_prompt(
            &client(),
            &[development("Alpha", "Frente mar"), development("Beta", "Centro")],
        );
        assert!(prompt.contains("Nome: Maria da Silva"));
        assert!(prompt.contains("Status: Em Negociação"));
        assert!(prompt.contains("Estado Civil: Casado(a)"));
        assert!(prompt.contains("- Alpha: Frente mar\n- Beta: Centro\n"));
        assert!(!prompt.contains(NO_CANDIDATES));
    }

    #[test]
    fn empty_candidate_list_uses_sentinel() {
        let prompt = build_prompt(&client(), &[]);
        assert!(prompt.ends_with("Empreendimentos disponíveis: Nenhum."));
    }

    #[tokio::test]
    async fn returns_raw_text_from_inference() {
        let scripted = ScriptedClient::new(vec![Ok("1. Alpha - perto do trabalho".into())]);
        let response = matcher(scripted).suggest_for(&client(), &[development("Alpha", "x")]).await;
        assert_eq!(response.suggestion, "1. Alpha - perto do trabalho");
        assert!(response.warning.is_none());
    }

    #[tokio::test]
    async fn inference_failure_falls_back() {
        let scripted = ScriptedClient::new(vec![Err(InferenceError::NotConfigured)]);
        let response = matcher(scripted).suggest_for(&client(), &[]).await;
        assert_eq!(response.suggestion, FALLBACK_SUGGESTION);
        assert!(response.warning.is_some());
    }
}
