// src/db/agent_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{Agent, AgentRole},
};

// Chave do advisory lock que serializa a decisão "primeiro corretor vira admin"
const FIRST_AGENT_LOCK_KEY: i64 = 0x4352_4d5f_4147_454e;

// O repositório de corretores, responsável pela tabela 'agents'
#[derive(Clone)]
pub struct AgentRepository {
    pool: PgPool,
}

impl AgentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Agent>, AppError> {
        let agent = sqlx::query_as::<_, Agent>("SELECT * FROM agents WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(agent)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Agent>, AppError> {
        let agent = sqlx::query_as::<_, Agent>("SELECT * FROM agents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(agent)
    }

    /// Só corretores ativos podem receber clientes restaurados.
    pub async fn find_active<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Agent>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let agent = sqlx::query_as::<_, Agent>("SELECT * FROM agents WHERE id = $1 AND active = TRUE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(agent)
    }

    pub async fn list_all(&self) -> Result<Vec<Agent>, AppError> {
        let agents = sqlx::query_as::<_, Agent>("SELECT * FROM agents ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(agents)
    }

    // Trava válida até o fim da transação do executor
    pub async fn lock_registration<'e, E>(&self, executor: E) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(FIRST_AGENT_LOCK_KEY)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn count<'e, E>(&self, executor: E) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agents")
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    // Cria um novo corretor, tratando e-mail duplicado
    pub async fn create_agent<'e, E>(
        &self,
        executor: E,
        name: &str,
        email: &str,
        password_hash: &str,
        role: AgentRole,
    ) -> Result<Agent, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Agent>(
            r#"
            INSERT INTO agents (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() && db_err.constraint() == Some("agents_email_key") {
                    return AppError::EmailAlreadyExists;
                }
            }
            e.into()
        })
    }
}
