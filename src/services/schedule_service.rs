// src/services/schedule_service.rs

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{CrmRepository, ScheduleRepository},
    models::{
        auth::Agent,
        schedule::{Appointment, AppointmentPayload, CalendarEvent},
    },
    services::{crm_service::owner_scope, policy::ensure_access},
};

#[derive(Clone)]
pub struct ScheduleService {
    repo: ScheduleRepository,
    crm_repo: CrmRepository,
    pool: PgPool,
}

impl ScheduleService {
    pub fn new(repo: ScheduleRepository, crm_repo: CrmRepository, pool: PgPool) -> Self {
        Self { repo, crm_repo, pool }
    }

    pub async fn list(&self, agent: &Agent) -> Result<Vec<Appointment>, AppError> {
        self.repo.list(owner_scope(agent)).await
    }

    /// Eventos no formato do calendário.
    pub async fn feed(&self, agent: &Agent) -> Result<Vec<CalendarEvent>, AppError> {
        let appointments = self.list(agent).await?;
        Ok(appointments.iter().map(CalendarEvent::from).collect())
    }

    pub async fn get(&self, agent: &Agent, id: Uuid) -> Result<Appointment, AppError> {
        let appointment = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("Agendamento"))?;
        ensure_access(agent, appointment)
    }

    pub async fn create(&self, agent: &Agent, payload: AppointmentPayload) -> Result<Appointment, AppError> {
        payload.validate()?;
        let starts_at = payload.starts_at.ok_or(AppError::MissingField("startsAt"))?;

        let mut tx = self.pool.begin().await?;
        self.check_client(&mut tx, agent, payload.client_id).await?;
        let appointment = self.repo.create(&mut *tx, agent.id, starts_at, &payload).await?;
        tx.commit().await?;

        tracing::info!("📅 Agendamento {} criado por {}", appointment.id, agent.id);
        Ok(appointment)
    }

    pub async fn update(&self, agent: &Agent, id: Uuid, payload: AppointmentPayload) -> Result<Appointment, AppError> {
        payload.validate()?;
        let existing = self.get(agent, id).await?;
        // Sem novo início, mantém o atual
        let starts_at = payload.starts_at.unwrap_or(existing.starts_at);

        let mut tx = self.pool.begin().await?;
        self.check_client(&mut tx, agent, payload.client_id).await?;
        let appointment = self.repo.update(&mut *tx, existing.id, starts_at, &payload).await?;
        tx.commit().await?;

        Ok(appointment)
    }

    pub async fn delete(&self, agent: &Agent, id: Uuid) -> Result<(), AppError> {
        let appointment = self.get(agent, id).await?;
        self.repo.delete(appointment.id).await
    }

    // Só se agenda com cliente que o corretor pode acessar
    async fn check_client(&self, conn: &mut PgConnection, agent: &Agent, client_id: Option<Uuid>) -> Result<(), AppError> {
        let Some(client_id) = client_id else { return Ok(()) };
        let client = self
            .crm_repo
            .find_client(&mut *conn, client_id)
            .await?
            .ok_or(AppError::NotFound("Cliente"))?;
        ensure_access(agent, client)?;
        Ok(())
    }
}
