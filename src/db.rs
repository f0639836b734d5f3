pub mod agent_repo;
pub use agent_repo::AgentRepository;
pub mod crm_repo;
pub use crm_repo::CrmRepository;
pub mod development_repo;
pub use development_repo::DevelopmentRepository;
pub mod schedule_repo;
pub use schedule_repo::ScheduleRepository;
pub mod correction_repo;
pub use correction_repo::CorrectionRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
