// src/services/interest_service.rs

//! Grafo de interesses: relação N:N entre clientes e empreendimentos,
//! tratada como um conjunto de pares.

use std::collections::HashSet;

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CrmRepository, DevelopmentRepository},
    models::{auth::Agent, crm::Client, development::DevelopmentSummary},
    services::policy::ensure_access,
};

/// Conjunto de pares (cliente, empreendimento). Inserir duas vezes não duplica.
#[derive(Debug, Default, Clone)]
pub struct InterestSet {
    pairs: HashSet<(Uuid, Uuid)>,
}

impl InterestSet {
    pub fn from_pairs<I: IntoIterator<Item = (Uuid, Uuid)>>(pairs: I) -> Self {
        Self { pairs: pairs.into_iter().collect() }
    }

    /// `true` quando o par ainda não existia.
    pub fn add(&mut self, client_id: Uuid, development_id: Uuid) -> bool {
        self.pairs.insert((client_id, development_id))
    }

    /// `true` quando o par existia.
    pub fn remove(&mut self, client_id: Uuid, development_id: Uuid) -> bool {
        self.pairs.remove(&(client_id, development_id))
    }

    pub fn contains(&self, client_id: Uuid, development_id: Uuid) -> bool {
        self.pairs.contains(&(client_id, development_id))
    }

    /// Empreendimentos sem vínculo com o cliente, na ordem recebida.
    pub fn available_for(&self, client_id: Uuid, all: &[DevelopmentSummary]) -> Vec<DevelopmentSummary> {
        all.iter()
            .filter(|d| !self.contains(client_id, d.id))
            .cloned()
            .collect()
    }
}

#[derive(Clone)]
pub struct InterestService {
    crm_repo: CrmRepository,
    development_repo: DevelopmentRepository,
    pool: PgPool,
}

impl InterestService {
    pub fn new(crm_repo: CrmRepository, development_repo: DevelopmentRepository, pool: PgPool) -> Self {
        Self { crm_repo, development_repo, pool }
    }

    pub async fn add(&self, agent: &Agent, client_id: Uuid, development_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let client = self.accessible_client(&mut tx, agent, client_id).await?;
        self.development_repo
            .find_by_id(&mut *tx, development_id)
            .await?
            .ok_or(AppError::NotFound("Empreendimento"))?;

        let mut set = InterestSet::from_pairs(self.crm_repo.list_interest_pairs(&mut *tx, client.id).await?);
        if set.add(client.id, development_id) {
            self.crm_repo.insert_interest(&mut *tx, client.id, development_id).await?;
            tracing::info!("Interesse registrado: cliente {} -> empreendimento {}", client.id, development_id);
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn remove(&self, agent: &Agent, client_id: Uuid, development_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let client = self.accessible_client(&mut tx, agent, client_id).await?;

        let mut set = InterestSet::from_pairs(self.crm_repo.list_interest_pairs(&mut *tx, client.id).await?);
        if set.remove(client.id, development_id) {
            self.crm_repo.delete_interest(&mut *tx, client.id, development_id).await?;
            tracing::info!("Interesse removido: cliente {} -> empreendimento {}", client.id, development_id);
        }

        tx.commit().await?;
        Ok(())
    }

    /// Empreendimentos que ainda não interessam ao cliente, por nome.
    pub async fn available_for(&self, agent: &Agent, client_id: Uuid) -> Result<(Client, Vec<DevelopmentSummary>), AppError> {
        let mut conn = self.pool.acquire().await?;

        let client = self
            .crm_repo
            .find_client(&mut *conn, client_id)
            .await?
            .ok_or(AppError::NotFound("Cliente"))?;
        let client = ensure_access(agent, client)?;

        let set = InterestSet::from_pairs(self.crm_repo.list_interest_pairs(&mut *conn, client.id).await?);
        let all = self.development_repo.list_summaries(&mut *conn).await?;
        let available = set.available_for(client.id, &all);

        Ok((client, available))
    }

    async fn accessible_client(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        agent: &Agent,
        client_id: Uuid,
    ) -> Result<Client, AppError> {
        let client = self
            .crm_repo
            .find_client(&mut **tx, client_id)
            .await?
            .ok_or(AppError::NotFound("Cliente"))?;
        ensure_access(agent, client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn development(name: &str) -> DevelopmentSummary {
        DevelopmentSummary {
            id: Uuid::new_v4(),
            name: name.into(),
            address: None,
            status: None,
            description: None,
        }
    }

    #[test]
    fn adding_twice_keeps_a_single_pair() {
        let (client, dev) = (Uuid::new_v4(), Uuid::new_v4());
        let mut set = InterestSet::default();
        assert!(set.add(client, dev));
        assert!(!set.add(client, dev));
        assert!(set.contains(client, dev));

        set.remove(client, dev);
        assert!(!set.contains(client, dev));
    }

    #[test]
    fn add_then_remove_restores_previous_state() {
        let client = Uuid::new_v4();
        let existing = Uuid::new_v4();
        let mut set = InterestSet::from_pairs([(client, existing)]);

        let new_dev = Uuid::new_v4();
        set.add(client, new_dev);
        set.remove(client, new_dev);

        assert!(set.contains(client, existing));
        assert!(!set.contains(client, new_dev));
        assert!(!set.remove(client, new_dev));
    }

    #[test]
    fn available_excludes_linked_and_keeps_order() {
        let client = Uuid::new_v4();
        let all = vec![development("Alpha"), development("Beta"), development("Gama")];
        let set = InterestSet::from_pairs([(client, all[1].id), (Uuid::new_v4(), all[0].id)]);

        let available = set.available_for(client, &all);
        let names: Vec<_> = available.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["Alpha", "Gama"]);

        // Todo empreendimento está ou no conjunto do cliente ou na lista de disponíveis
        for d in &all {
            assert_ne!(set.contains(client, d.id), available.iter().any(|a| a.id == d.id));
        }
    }
}
