// src/config.rs

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        AgentRepository, CorrectionRepository, CrmRepository, DashboardRepository, DevelopmentRepository,
        ScheduleRepository,
    },
    services::{
        auth::AuthService,
        correction_service::CorrectionService,
        crm_service::CrmService,
        dashboard_service::DashboardService,
        development_service::DevelopmentService,
        document_service::DocumentService,
        extraction_service::{ExtractionConfig, ExtractionService, DEFAULT_MAX_CHARS, DEFAULT_MAX_CORRECTIONS},
        inference::{GeminiClient, InferenceClient, DEFAULT_BASE_URL, DEFAULT_MODEL},
        interest_service::InterestService,
        matcher::MatcherService,
        report_service::ReportService,
        schedule_service::ScheduleService,
        storage::UploadStore,
    },
};

/// Configuração lida do ambiente (e do `.env`).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub upload_dir: PathBuf,
    pub inference_api_key: String,
    pub inference_model: String,
    pub inference_base_url: String,
    pub inference_timeout: Duration,
    pub extraction_max_chars: usize,
    pub extraction_max_corrections: usize,
    /// Teto do corpo das rotas de upload (o padrão do axum é 2 MB).
    pub upload_max_bytes: usize,
}

pub const DEFAULT_UPLOAD_MAX_BYTES: usize = 50 * 1024 * 1024;

fn var_or(name: &str, default: &str) -> String {
    env::var(name).ok().filter(|v| !v.trim().is_empty()).unwrap_or_else(|| default.to_string())
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} inválido ({}): {}", name, raw, e)),
        _ => Ok(default),
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let inference_api_key = env::var("INFERENCE_API_KEY").unwrap_or_default();
        if inference_api_key.is_empty() {
            tracing::warn!("INFERENCE_API_KEY não definida: os recursos de IA vão responder com avisos");
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000"),
            upload_dir: PathBuf::from(var_or("UPLOAD_DIR", "static/uploads")),
            inference_api_key,
            inference_model: var_or("INFERENCE_MODEL", DEFAULT_MODEL),
            inference_base_url: var_or("INFERENCE_BASE_URL", DEFAULT_BASE_URL),
            inference_timeout: Duration::from_secs(parsed_or("INFERENCE_TIMEOUT_SECS", 60)?),
            extraction_max_chars: parsed_or("EXTRACTION_MAX_CHARS", DEFAULT_MAX_CHARS)?,
            extraction_max_corrections: parsed_or("EXTRACTION_MAX_CORRECTIONS", DEFAULT_MAX_CORRECTIONS)?,
            upload_max_bytes: parsed_or("UPLOAD_MAX_BYTES", DEFAULT_UPLOAD_MAX_BYTES)?,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub crm_service: CrmService,
    pub interest_service: InterestService,
    pub matcher_service: MatcherService,
    pub development_service: DevelopmentService,
    pub extraction_service: ExtractionService,
    pub schedule_service: ScheduleService,
    pub report_service: ReportService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let store = UploadStore::new(&settings.upload_dir);
        store
            .ensure_dir()
            .await
            .with_context(|| format!("Não foi possível criar {}", settings.upload_dir.display()))?;

        let inference: Arc<dyn InferenceClient> = Arc::new(GeminiClient::new(
            settings.inference_api_key.clone(),
            settings.inference_model.clone(),
            settings.inference_base_url.clone(),
            settings.inference_timeout,
        )?);

        Ok(Self::build(db_pool, store, inference, settings))
    }

    // --- Monta o gráfico de dependências ---
    pub fn build(db_pool: PgPool, store: UploadStore, inference: Arc<dyn InferenceClient>, settings: &Settings) -> Self {
        let agent_repo = AgentRepository::new(db_pool.clone());
        let crm_repo = CrmRepository::new(db_pool.clone());
        let development_repo = DevelopmentRepository::new(db_pool.clone());
        let schedule_repo = ScheduleRepository::new(db_pool.clone());
        let dashboard_repo = DashboardRepository::new(db_pool.clone());

        let auth_service = AuthService::new(agent_repo.clone(), settings.jwt_secret.clone(), db_pool.clone());
        let crm_service = CrmService::new(crm_repo.clone(), agent_repo, db_pool.clone());
        let interest_service = InterestService::new(crm_repo.clone(), development_repo.clone(), db_pool.clone());
        let matcher_service = MatcherService::new(inference.clone(), interest_service.clone());
        let development_service = DevelopmentService::new(
            development_repo,
            CorrectionService::new(CorrectionRepository::new()),
            store.clone(),
            db_pool.clone(),
        );
        let extraction_service = ExtractionService::new(
            inference,
            DocumentService::new(store),
            ExtractionConfig {
                max_chars: settings.extraction_max_chars,
                max_corrections: settings.extraction_max_corrections,
                ..Default::default()
            },
        );
        let schedule_service = ScheduleService::new(schedule_repo, crm_repo.clone(), db_pool.clone());
        let report_service = ReportService::new(crm_repo, db_pool.clone());
        let dashboard_service = DashboardService::new(dashboard_repo);

        Self {
            db_pool,
            i18n_store: Arc::new(I18nStore::new()),
            auth_service,
            crm_service,
            interest_service,
            matcher_service,
            development_service,
            extraction_service,
            schedule_service,
            report_service,
            dashboard_service,
        }
    }
}
