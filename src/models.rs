pub mod ai;
pub mod auth;
pub mod crm;
pub mod dashboard;
pub mod development;
pub mod schedule;
