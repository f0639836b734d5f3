pub mod auth;
pub mod crm;
pub mod dashboard;
pub mod developments;
pub mod documents;
pub mod reports;
pub mod schedule;
