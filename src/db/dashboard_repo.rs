// src/db/dashboard_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{crm::Client, dashboard::DashboardSummary, development::DevelopmentSummary},
};

// Quantos itens aparecem nas listas "mais recentes"
const LATEST_LIMIT: i64 = 5;

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resumo da página inicial. `owner = None` traz a visão do administrador.
    pub async fn get_summary(&self, owner: Option<Uuid>) -> Result<DashboardSummary, AppError> {
        // Snapshot consistente dos números
        let mut tx = self.pool.begin().await?;

        let total_clients: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM clients WHERE discarded = FALSE AND ($1::uuid IS NULL OR owner_id = $1)",
        )
        .bind(owner)
        .fetch_one(&mut *tx)
        .await?;

        let total_developments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM developments")
            .fetch_one(&mut *tx)
            .await?;

        let latest_clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT * FROM clients
            WHERE discarded = FALSE AND ($1::uuid IS NULL OR owner_id = $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(owner)
        .bind(LATEST_LIMIT)
        .fetch_all(&mut *tx)
        .await?;

        let latest_developments = sqlx::query_as::<_, DevelopmentSummary>(
            r#"
            SELECT id, name, address, status, description
            FROM developments
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(LATEST_LIMIT)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(DashboardSummary {
            total_clients,
            total_developments,
            latest_clients,
            latest_developments,
        })
    }
}
