// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::list_agents,

        // --- Clients ---
        handlers::crm::list_clients,
        handlers::crm::create_client,
        handlers::crm::get_client,
        handlers::crm::update_client,
        handlers::crm::discard_client,
        handlers::crm::list_discarded,
        handlers::crm::restore_client,
        handlers::crm::delete_client,
        handlers::crm::add_activity,
        handlers::crm::update_activity,
        handlers::crm::delete_activity,

        // --- Interests ---
        handlers::crm::add_interest,
        handlers::crm::remove_interest,
        handlers::crm::list_available_developments,
        handlers::crm::suggest_developments,

        // --- Developments ---
        handlers::developments::list_developments,
        handlers::developments::get_development,
        handlers::developments::create_development,
        handlers::developments::update_development,
        handlers::developments::delete_development,
        handlers::developments::upload_materials,
        handlers::developments::rename_material,
        handlers::developments::delete_material,
        handlers::documents::extract_documents,
        handlers::documents::download_upload,

        // --- Public ---
        handlers::developments::list_public_developments,

        // --- Appointments ---
        handlers::schedule::list_appointments,
        handlers::schedule::calendar_feed,
        handlers::schedule::create_appointment,
        handlers::schedule::get_appointment,
        handlers::schedule::update_appointment,
        handlers::schedule::delete_appointment,

        // --- Reports ---
        handlers::reports::export_clients_csv,
        handlers::reports::import_clients,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::AgentRole,
            models::auth::Agent,
            models::auth::RegisterAgentPayload,
            models::auth::LoginPayload,
            models::auth::AuthResponse,

            // --- CRM ---
            models::crm::ClientStatus,
            models::crm::LeadTemperature,
            models::crm::MaritalStatus,
            models::crm::ActivityKind,
            models::crm::Client,
            models::crm::ClientPayload,
            models::crm::ClientDetail,
            models::crm::RestoreClientPayload,
            models::crm::ImportSummary,
            models::crm::Activity,
            models::crm::ActivityPayload,
            models::crm::InterestPayload,

            // --- Developments ---
            models::development::Development,
            models::development::DevelopmentSummary,
            models::development::DevelopmentDetail,
            models::development::DevelopmentPayload,
            models::development::DevelopmentFields,
            models::development::Material,
            models::development::StoredFile,
            models::development::RenameMaterialPayload,
            models::development::OperationReport,
            models::development::UploadReport,

            // --- IA ---
            models::ai::ExtractionWarning,
            models::ai::ExtractionStatus,
            models::ai::ExtractionResponse,
            models::ai::SuggestionResponse,

            // --- Appointments ---
            models::schedule::Appointment,
            models::schedule::AppointmentPayload,
            models::schedule::CalendarEvent,

            // --- Dashboard ---
            models::dashboard::DashboardSummary,

            // --- Uploads ---
            handlers::documents::DocumentUpload,
            handlers::developments::MaterialUpload,
            handlers::reports::CsvUpload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Corretores"),
        (name = "Clients", description = "Clientes, lixeira e atividades"),
        (name = "Interests", description = "Interesses e sugestões da IA"),
        (name = "Developments", description = "Empreendimentos, materiais e extração por IA"),
        (name = "Public", description = "API pública (sem autenticação)"),
        (name = "Appointments", description = "Agenda e calendário"),
        (name = "Reports", description = "Exportação e importação de clientes em CSV"),
        (name = "Dashboard", description = "Indicadores da página inicial")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_public_and_protected_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/developments"));
        assert!(doc.paths.paths.contains_key("/api/appointments/feed"));
        assert!(doc.paths.paths.contains_key("/api/clients/{id}/interests/{development_id}"));
        let schemes = doc.components.expect("components").security_schemes;
        assert!(schemes.contains_key("api_jwt"));
    }
}
