// src/services/policy.rs

//! Regra única de autorização: administrador acessa tudo,
//! corretor só acessa o que é dele.

use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::{
    auth::Agent,
    crm::{Activity, Client},
    schedule::Appointment,
};

/// Registro que pertence a um corretor.
pub trait Owned {
    fn owner_id(&self) -> Option<Uuid>;
}

impl Owned for Client {
    fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }
}

impl Owned for Appointment {
    fn owner_id(&self) -> Option<Uuid> {
        Some(self.owner_id)
    }
}

// Atividade "pertence" a quem a registrou
impl Owned for Activity {
    fn owner_id(&self) -> Option<Uuid> {
        Some(self.author_id)
    }
}

pub fn can_access<R: Owned + ?Sized>(agent: &Agent, resource: &R) -> bool {
    agent.is_admin() || resource.owner_id() == Some(agent.id)
}

/// Versão que devolve o recurso ou `Forbidden`.
pub fn ensure_access<R: Owned>(agent: &Agent, resource: R) -> Result<R, AppError> {
    if can_access(agent, &resource) {
        Ok(resource)
    } else {
        tracing::warn!("Corretor {} tentou acessar recurso de outro dono", agent.id);
        Err(AppError::Forbidden)
    }
}

pub fn ensure_admin(agent: &Agent) -> Result<(), AppError> {
    if agent.is_admin() {
        Ok(())
    } else {
        Err(AppError::AdminOnly)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::auth::AgentRole;
    use chrono::Utc;

    pub(crate) fn agent(role: AgentRole) -> Agent {
        Agent {
            id: Uuid::new_v4(),
            name: "Corretor".into(),
            email: "corretor@imobiliaria.com".into(),
            password_hash: String::new(),
            role,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[derive(Debug)]
    struct Record(Option<Uuid>);

    impl Owned for Record {
        fn owner_id(&self) -> Option<Uuid> {
            self.0
        }
    }

    #[test]
    fn broker_accesses_only_own_records() {
        let broker = agent(AgentRole::Broker);
        assert!(can_access(&broker, &Record(Some(broker.id))));
        assert!(!can_access(&broker, &Record(Some(Uuid::new_v4()))));
    }

    #[test]
    fn orphan_records_are_admin_only() {
        let broker = agent(AgentRole::Broker);
        let admin = agent(AgentRole::Admin);
        assert!(!can_access(&broker, &Record(None)));
        assert!(can_access(&admin, &Record(None)));
    }

    #[test]
    fn admin_bypasses_ownership() {
        let admin = agent(AgentRole::Admin);
        assert!(can_access(&admin, &Record(Some(Uuid::new_v4()))));
        assert!(ensure_admin(&admin).is_ok());
    }

    #[test]
    fn ensure_access_rejects_with_forbidden() {
        let broker = agent(AgentRole::Broker);
        let err = ensure_access(&broker, Record(Some(Uuid::new_v4()))).unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
        assert!(matches!(ensure_admin(&broker), Err(AppError::AdminOnly)));
    }
}
