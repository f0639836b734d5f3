// src/main.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Settings};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Sem configuração ou banco a aplicação não deve iniciar.
    let settings = Settings::from_env().expect("Falha ao ler a configuração.");
    let app_state = AppState::new(&settings)
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas públicas
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/", get(handlers::auth::list_agents))
        .route("/me", get(handlers::auth::get_me));

    let client_routes = Router::new()
        .route("/", get(handlers::crm::list_clients).post(handlers::crm::create_client))
        .route("/discarded", get(handlers::crm::list_discarded))
        .route("/import", post(handlers::reports::import_clients))
        .route(
            "/{id}",
            get(handlers::crm::get_client)
                .put(handlers::crm::update_client)
                .delete(handlers::crm::delete_client),
        )
        .route("/{id}/discard", post(handlers::crm::discard_client))
        .route("/{id}/restore", post(handlers::crm::restore_client))
        .route("/{id}/activities", post(handlers::crm::add_activity))
        .route("/{id}/interests", post(handlers::crm::add_interest))
        .route("/{id}/interests/{development_id}", delete(handlers::crm::remove_interest))
        .route("/{id}/available-developments", get(handlers::crm::list_available_developments))
        .route("/{id}/suggestions", post(handlers::crm::suggest_developments))
        .layer(DefaultBodyLimit::max(settings.upload_max_bytes));

    let activity_routes = Router::new().route(
        "/{id}",
        put(handlers::crm::update_activity).delete(handlers::crm::delete_activity),
    );

    let development_routes = Router::new()
        .route(
            "/",
            get(handlers::developments::list_developments).post(handlers::developments::create_development),
        )
        .route("/extract", post(handlers::documents::extract_documents))
        .route(
            "/{id}",
            get(handlers::developments::get_development)
                .put(handlers::developments::update_development)
                .delete(handlers::developments::delete_development),
        )
        .route("/{id}/materials", post(handlers::developments::upload_materials))
        // PDFs e plantas passam fácil dos 2 MB padrão
        .layer(DefaultBodyLimit::max(settings.upload_max_bytes));

    let material_routes = Router::new().route(
        "/{id}",
        put(handlers::developments::rename_material).delete(handlers::developments::delete_material),
    );

    let appointment_routes = Router::new()
        .route(
            "/",
            get(handlers::schedule::list_appointments).post(handlers::schedule::create_appointment),
        )
        .route("/feed", get(handlers::schedule::calendar_feed))
        .route(
            "/{id}",
            get(handlers::schedule::get_appointment)
                .put(handlers::schedule::update_appointment)
                .delete(handlers::schedule::delete_appointment),
        );

    // Tudo abaixo exige um corretor autenticado e ativo
    let protected_routes = Router::new()
        .nest("/api/users", user_routes)
        .nest("/api/clients", client_routes)
        .nest("/api/activities", activity_routes)
        .nest("/api/developments", development_routes)
        .nest("/api/materials", material_routes)
        .nest("/api/appointments", appointment_routes)
        .route("/api/uploads/{filename}", get(handlers::documents::download_upload))
        .route("/api/reports/clients.csv", get(handlers::reports::export_clients_csv))
        .route("/api/dashboard/summary", get(handlers::dashboard::get_summary))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/v1/developments", get(handlers::developments::list_public_developments))
        .nest("/api/auth", auth_routes)
        .merge(protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let listener = TcpListener::bind(&settings.bind_addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", settings.bind_addr);
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
