// src/db/development_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::development::{Development, DevelopmentPayload, DevelopmentSummary, Material},
};

#[derive(Clone)]
pub struct DevelopmentRepository {
    pool: PgPool,
}

impl DevelopmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  EMPREENDIMENTOS
    // =========================================================================

    pub async fn list_all(&self) -> Result<Vec<Development>, AppError> {
        let developments = sqlx::query_as::<_, Development>("SELECT * FROM developments ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(developments)
    }

    /// Resumo de todos os empreendimentos, por nome (base do grafo de interesses).
    pub async fn list_summaries<'e, E>(&self, executor: E) -> Result<Vec<DevelopmentSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let developments = sqlx::query_as::<_, DevelopmentSummary>(
            "SELECT id, name, address, status, description FROM developments ORDER BY name ASC",
        )
        .fetch_all(executor)
        .await?;
        Ok(developments)
    }

    // API pública: só os marcados como públicos
    pub async fn list_public(&self) -> Result<Vec<DevelopmentSummary>, AppError> {
        let developments = sqlx::query_as::<_, DevelopmentSummary>(
            r#"
            SELECT id, name, address, status, description
            FROM developments
            WHERE is_public = TRUE
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(developments)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Development>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let development = sqlx::query_as::<_, Development>("SELECT * FROM developments WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(development)
    }

    pub async fn create<'e, E>(&self, executor: E, p: &DevelopmentPayload) -> Result<Development, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let development = sqlx::query_as::<_, Development>(
            r#"
            INSERT INTO developments (
                name, status, address, description, is_public,
                delivery_date, delivery_estimate, average_unit_price, starting_price,
                unit_size, parking_spaces, land_size,
                tower_count, basement_levels, floor_count, promotional_campaign
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(p.name.trim())
        .bind(&p.status)
        .bind(&p.address)
        .bind(&p.description)
        .bind(p.is_public)
        .bind(p.delivery_date)
        .bind(&p.delivery_estimate)
        .bind(&p.average_unit_price)
        .bind(&p.starting_price)
        .bind(&p.unit_size)
        .bind(&p.parking_spaces)
        .bind(&p.land_size)
        .bind(p.tower_count)
        .bind(p.basement_levels)
        .bind(p.floor_count)
        .bind(&p.promotional_campaign)
        .fetch_one(executor)
        .await?;
        Ok(development)
    }

    pub async fn update<'e, E>(&self, executor: E, id: Uuid, p: &DevelopmentPayload) -> Result<Option<Development>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let development = sqlx::query_as::<_, Development>(
            r#"
            UPDATE developments SET
                name = $2, status = $3, address = $4, description = $5, is_public = $6,
                delivery_date = $7, delivery_estimate = $8, average_unit_price = $9,
                starting_price = $10, unit_size = $11, parking_spaces = $12, land_size = $13,
                tower_count = $14, basement_levels = $15, floor_count = $16,
                promotional_campaign = $17, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(p.name.trim())
        .bind(&p.status)
        .bind(&p.address)
        .bind(&p.description)
        .bind(p.is_public)
        .bind(p.delivery_date)
        .bind(&p.delivery_estimate)
        .bind(&p.average_unit_price)
        .bind(&p.starting_price)
        .bind(&p.unit_size)
        .bind(&p.parking_spaces)
        .bind(&p.land_size)
        .bind(p.tower_count)
        .bind(p.basement_levels)
        .bind(p.floor_count)
        .bind(&p.promotional_campaign)
        .fetch_optional(executor)
        .await?;
        Ok(development)
    }

    // Materiais, interesses e agendamentos caem junto (ON DELETE CASCADE)
    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM developments WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    //  MATERIAIS
    // =========================================================================

    pub async fn list_materials<'e, E>(&self, executor: E, development_id: Uuid) -> Result<Vec<Material>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let materials = sqlx::query_as::<_, Material>(
            "SELECT * FROM materials WHERE development_id = $1 ORDER BY created_at ASC, original_name ASC",
        )
        .bind(development_id)
        .fetch_all(executor)
        .await?;
        Ok(materials)
    }

    pub async fn find_material(&self, id: Uuid) -> Result<Option<Material>, AppError> {
        let material = sqlx::query_as::<_, Material>("SELECT * FROM materials WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(material)
    }

    pub async fn add_material<'e, E>(
        &self,
        executor: E,
        development_id: Uuid,
        original_name: &str,
        stored_name: &str,
    ) -> Result<Material, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Material>(
            r#"
            INSERT INTO materials (development_id, original_name, stored_name)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(development_id)
        .bind(original_name)
        .bind(stored_name)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, "O arquivo", Some(stored_name)))
    }

    pub async fn rename_material(&self, id: Uuid, original_name: &str) -> Result<Option<Material>, AppError> {
        let material = sqlx::query_as::<_, Material>(
            "UPDATE materials SET original_name = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(original_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(material)
    }

    pub async fn delete_material(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM materials WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
