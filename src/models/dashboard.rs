// src/models/dashboard.rs

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{crm::Client, development::DevelopmentSummary};

// Os cards e listas da página inicial
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_clients: i64,        // Clientes ativos visíveis ao corretor
    pub total_developments: i64,
    pub latest_clients: Vec<Client>,
    pub latest_developments: Vec<DevelopmentSummary>,
}
