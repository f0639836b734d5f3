// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Mapeia o CREATE TYPE agent_role do banco
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "agent_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentRole {
    Admin,
    Broker,
}

impl AgentRole {
    /// O primeiro corretor cadastrado vira administrador; os demais, corretores.
    pub fn for_new_agent(existing_agents: i64) -> Self {
        if existing_agents == 0 {
            AgentRole::Admin
        } else {
            AgentRole::Broker
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgentRole::Admin => "Admin",
            AgentRole::Broker => "Corretor",
        }
    }
}

// Representa um corretor (usuário do sistema) vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: Uuid,
    #[schema(example = "Ana Corretora")]
    pub name: String,
    #[schema(example = "ana@imobiliaria.com")]
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub role: AgentRole,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    pub fn is_admin(&self) -> bool {
        self.role == AgentRole::Admin
    }
}

// Dados para registro de um novo corretor
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterAgentPayload {
    #[validate(length(min = 1, max = 100, message = "O nome é obrigatório (até 100 caracteres)."))]
    #[schema(example = "Ana Corretora")]
    pub name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."), length(max = 100))]
    #[schema(example = "ana@imobiliaria.com")]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do corretor)
    pub exp: usize, // Expiration time
    pub iat: usize, // Issued At
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_agent_is_admin_and_the_rest_are_brokers() {
        assert_eq!(AgentRole::for_new_agent(0), AgentRole::Admin);
        assert_eq!(AgentRole::for_new_agent(1), AgentRole::Broker);
        assert_eq!(AgentRole::for_new_agent(42), AgentRole::Broker);
    }
}
