// src/services/crm_service.rs

use chrono::Local;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{
        crm_repo::{ClientWrite, UniqueClientField},
        AgentRepository, CrmRepository,
    },
    models::{
        auth::Agent,
        crm::{
            Activity, ActivityPayload, Client, ClientDetail, ClientListQuery, ClientPayload, ClientStatus,
            LeadTemperature,
        },
    },
    services::policy::{ensure_access, ensure_admin},
};

/// Escopo das listagens: admin vê todos, corretor vê os seus.
pub fn owner_scope(agent: &Agent) -> Option<Uuid> {
    if agent.is_admin() { None } else { Some(agent.id) }
}

#[derive(Clone)]
pub struct CrmService {
    repo: CrmRepository,
    agent_repo: AgentRepository,
    pool: PgPool,
}

impl CrmService {
    pub fn new(repo: CrmRepository, agent_repo: AgentRepository, pool: PgPool) -> Self {
        Self { repo, agent_repo, pool }
    }

    // =========================================================================
    //  1. CLIENTES
    // =========================================================================

    pub async fn list_clients(&self, agent: &Agent, query: &ClientListQuery) -> Result<Vec<Client>, AppError> {
        self.repo
            .list_clients(owner_scope(agent), query.search.as_deref(), query.status, false)
            .await
    }

    pub async fn list_discarded(&self, agent: &Agent) -> Result<Vec<Client>, AppError> {
        ensure_admin(agent)?;
        self.repo.list_clients(None, None, None, true).await
    }

    pub async fn get_client(&self, agent: &Agent, id: Uuid) -> Result<Client, AppError> {
        let client = self
            .repo
            .find_client(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("Cliente"))?;
        ensure_access(agent, client)
    }

    /// Cliente + interesses (por nome) + atividades (mais recentes primeiro).
    pub async fn get_client_detail(&self, agent: &Agent, id: Uuid) -> Result<ClientDetail, AppError> {
        let client = self.get_client(agent, id).await?;
        let interests = self.repo.list_interest_developments(client.id).await?;
        let activities = self.repo.list_activities(client.id).await?;
        Ok(ClientDetail { client, interests, activities })
    }

    pub async fn create_client(&self, agent: &Agent, mut payload: ClientPayload) -> Result<Client, AppError> {
        payload.normalize();
        payload.validate()?;

        let mut tx = self.pool.begin().await?;

        self.check_uniqueness(&mut tx, &payload, None).await?;

        let write = ClientWrite {
            payload: &payload,
            status: payload.status.unwrap_or(ClientStatus::NewLead),
            temperature: Some(payload.temperature.unwrap_or(LeadTemperature::Warm)),
            first_contact_date: Some(payload.first_contact_date.unwrap_or_else(|| Local::now().date_naive())),
        };
        let client = self.repo.create_client(&mut *tx, agent.id, write).await?;

        tx.commit().await?;

        tracing::info!("Cliente {} cadastrado por {}", client.id, agent.id);
        Ok(client)
    }

    pub async fn update_client(&self, agent: &Agent, id: Uuid, mut payload: ClientPayload) -> Result<Client, AppError> {
        payload.normalize();
        payload.validate()?;

        let mut tx = self.pool.begin().await?;

        let existing = self
            .repo
            .find_client(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Cliente"))?;
        let existing = ensure_access(agent, existing)?;

        self.check_uniqueness(&mut tx, &payload, Some(existing.id)).await?;

        // Campos omitidos na edição mantêm o valor atual
        let write = ClientWrite {
            payload: &payload,
            status: payload.status.unwrap_or(existing.status),
            temperature: payload.temperature.or(existing.temperature),
            first_contact_date: payload.first_contact_date.or(existing.first_contact_date),
        };
        let client = self.repo.update_client(&mut *tx, existing.id, write).await?;

        tx.commit().await?;
        Ok(client)
    }

    /// Lixeira: o cliente some das listagens, mas pode ser restaurado.
    pub async fn discard_client(&self, agent: &Agent, id: Uuid) -> Result<(), AppError> {
        let client = self.get_client(agent, id).await?;
        self.repo.discard_client(&self.pool, client.id).await?;
        tracing::info!("Cliente {} movido para a lixeira por {}", client.id, agent.id);
        Ok(())
    }

    pub async fn restore_client(&self, agent: &Agent, id: Uuid, new_owner_id: Option<Uuid>) -> Result<Client, AppError> {
        ensure_admin(agent)?;
        let new_owner_id = new_owner_id.ok_or(AppError::MissingField("newOwnerId"))?;

        let mut tx = self.pool.begin().await?;

        self.repo
            .find_client(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Cliente"))?;
        let owner = self
            .agent_repo
            .find_active(&mut *tx, new_owner_id)
            .await?
            .ok_or(AppError::NotFound("Corretor"))?;

        let client = self.repo.restore_client(&mut *tx, id, owner.id).await?;
        tx.commit().await?;

        tracing::info!("Cliente {} restaurado para {}", client.id, owner.name);
        Ok(client)
    }

    /// Exclusão definitiva (admin). Atividades, agendamentos e interesses vão junto.
    pub async fn delete_client(&self, agent: &Agent, id: Uuid) -> Result<(), AppError> {
        ensure_admin(agent)?;
        let deleted = self.repo.delete_client(&self.pool, id).await?;
        if deleted == 0 {
            return Err(AppError::NotFound("Cliente"));
        }
        tracing::info!("Cliente {} excluído permanentemente por {}", id, agent.id);
        Ok(())
    }

    // CPF, e-mail pessoal e e-mail comercial são únicos quando preenchidos
    async fn check_uniqueness(
        &self,
        conn: &mut PgConnection,
        payload: &ClientPayload,
        exclude: Option<Uuid>,
    ) -> Result<(), AppError> {
        let candidates = [
            (UniqueClientField::Cpf, payload.cpf.as_deref()),
            (UniqueClientField::Email, payload.email.as_deref()),
            (UniqueClientField::BusinessEmail, payload.business_email.as_deref()),
        ];

        for (field, value) in candidates {
            let Some(value) = value else { continue };
            if self.repo.exists_with(&mut *conn, field, value, exclude).await? {
                return Err(AppError::DuplicateField {
                    field: field.label(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    //  2. ATIVIDADES
    // =========================================================================

    pub async fn add_activity(&self, agent: &Agent, client_id: Uuid, payload: ActivityPayload) -> Result<Activity, AppError> {
        payload.validate()?;
        let client = self.get_client(agent, client_id).await?;

        self.repo
            .create_activity(&self.pool, client.id, agent.id, payload.kind, payload.summary.trim())
            .await
    }

    pub async fn update_activity(&self, agent: &Agent, activity_id: Uuid, payload: ActivityPayload) -> Result<Activity, AppError> {
        payload.validate()?;
        let activity = self.accessible_activity(agent, activity_id).await?;

        self.repo
            .update_activity(&self.pool, activity.id, payload.kind, payload.summary.trim())
            .await
    }

    pub async fn delete_activity(&self, agent: &Agent, activity_id: Uuid) -> Result<(), AppError> {
        let activity = self.accessible_activity(agent, activity_id).await?;
        self.repo.delete_activity(&self.pool, activity.id).await
    }

    async fn accessible_activity(&self, agent: &Agent, activity_id: Uuid) -> Result<Activity, AppError> {
        let activity = self
            .repo
            .find_activity(activity_id)
            .await?
            .ok_or(AppError::NotFound("Atividade"))?;
        ensure_access(agent, activity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::AgentRole;
    use crate::services::policy::tests::agent;

    #[test]
    fn brokers_are_scoped_to_their_own_clients() {
        let admin = agent(AgentRole::Admin);
        let broker = agent(AgentRole::Broker);
        assert_eq!(owner_scope(&admin), None);
        assert_eq!(owner_scope(&broker), Some(broker.id));
    }
}
