// src/db/schedule_repo.rs

use chrono::NaiveDateTime;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::schedule::{Appointment, AppointmentPayload},
};

#[derive(Clone)]
pub struct ScheduleRepository {
    pool: PgPool,
}

impl ScheduleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// `owner = None` lista a agenda de todos (administrador).
    pub async fn list(&self, owner: Option<Uuid>) -> Result<Vec<Appointment>, AppError> {
        let appointments = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments
            WHERE ($1::uuid IS NULL OR owner_id = $1)
            ORDER BY starts_at ASC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(appointments)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, AppError> {
        let appointment = sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(appointment)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        starts_at: NaiveDateTime,
        p: &AppointmentPayload,
    ) -> Result<Appointment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (title, starts_at, ends_at, description, owner_id, client_id, development_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(p.title.trim())
        .bind(starts_at)
        .bind(p.ends_at)
        .bind(&p.description)
        .bind(owner_id)
        .bind(p.client_id)
        .bind(p.development_id)
        .fetch_one(executor)
        .await?;
        Ok(appointment)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        starts_at: NaiveDateTime,
        p: &AppointmentPayload,
    ) -> Result<Appointment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments SET
                title = $2, starts_at = $3, ends_at = $4, description = $5,
                client_id = $6, development_id = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(p.title.trim())
        .bind(starts_at)
        .bind(p.ends_at)
        .bind(&p.description)
        .bind(p.client_id)
        .bind(p.development_id)
        .fetch_one(executor)
        .await?;
        Ok(appointment)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
