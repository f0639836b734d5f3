// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::AgentRepository,
    models::auth::{Agent, AgentRole, Claims},
};

const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Clone)]
pub struct AuthService {
    agent_repo: AgentRepository,
    jwt_secret: String,
    pool: PgPool,
}

impl AuthService {
    pub fn new(agent_repo: AgentRepository, jwt_secret: String, pool: PgPool) -> Self {
        Self { agent_repo, jwt_secret, pool }
    }

    pub async fn register_agent(&self, name: &str, email: &str, password: &str) -> Result<String, AppError> {
        // 1. Hashing fora da transação (não toca no banco)
        let password_clone = password.to_owned();
        let hashed_password = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let mut tx = self.pool.begin().await?;

        // 2. Dois cadastros simultâneos não podem virar admin ao mesmo tempo
        self.agent_repo.lock_registration(&mut *tx).await?;
        let existing = self.agent_repo.count(&mut *tx).await?;
        let role = AgentRole::for_new_agent(existing);

        let agent = self
            .agent_repo
            .create_agent(&mut *tx, name.trim(), email.trim(), &hashed_password, role)
            .await?;

        tx.commit().await?;

        tracing::info!("👤 Corretor {} registrado como {}", agent.id, role.label());
        self.create_token(agent.id)
    }

    pub async fn login_agent(&self, email: &str, password: &str) -> Result<String, AppError> {
        let agent = self
            .agent_repo
            .find_by_email(email.trim())
            .await?
            .filter(|a| a.active)
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = agent.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.create_token(agent.id)
    }

    /// Token válido e corretor ainda ativo.
    pub async fn validate_token(&self, token: &str) -> Result<Agent, AppError> {
        let claims = self.decode_token(token)?;

        self.agent_repo
            .find_by_id(claims.sub)
            .await?
            .filter(|a| a.active)
            .ok_or(AppError::AgentNotFound)
    }

    pub async fn list_agents(&self) -> Result<Vec<Agent>, AppError> {
        self.agent_repo.list_all().await
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }

    fn create_token(&self, agent_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(TOKEN_TTL_DAYS);

        let claims = Claims {
            sub: agent_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn service(secret: &str) -> AuthService {
        let pool = PgPoolOptions::new().connect_lazy("postgres://localhost/nao_usado").unwrap();
        AuthService::new(AgentRepository::new(pool.clone()), secret.into(), pool)
    }

    #[tokio::test]
    async fn token_round_trips_the_agent_id() {
        let auth = service("segredo");
        let id = Uuid::new_v4();
        let token = auth.create_token(id).unwrap();

        let claims = auth.decode_token(&token).unwrap();
        assert_eq!(claims.sub, id);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let token = service("outro").create_token(Uuid::new_v4()).unwrap();
        assert!(matches!(service("segredo").decode_token(&token), Err(AppError::InvalidToken)));
        assert!(matches!(service("segredo").decode_token("lixo"), Err(AppError::InvalidToken)));
    }
}
