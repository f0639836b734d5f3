pub mod auth;
pub mod correction_service;
pub mod crm_service;
pub mod dashboard_service;
pub mod development_service;
pub mod document_service;
pub mod extraction_service;
pub mod inference;
pub mod interest_service;
pub mod matcher;
pub mod policy;
pub mod report_service;
pub mod schedule_service;
pub mod storage;
