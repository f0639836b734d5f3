// src/services/dashboard_service.rs

use crate::{
    common::error::AppError,
    db::DashboardRepository,
    models::{auth::Agent, dashboard::DashboardSummary},
    services::crm_service::owner_scope,
};

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository) -> Self {
        Self { repo }
    }

    pub async fn get_summary(&self, agent: &Agent) -> Result<DashboardSummary, AppError> {
        self.repo.get_summary(owner_scope(agent)).await
    }
}
