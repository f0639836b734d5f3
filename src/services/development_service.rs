// src/services/development_service.rs

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::DevelopmentRepository,
    models::{
        auth::Agent,
        development::{
            Development, DevelopmentDetail, DevelopmentFields, DevelopmentPayload, DevelopmentSummary, Material,
            OperationReport, RenameMaterialPayload, StoredFile, UploadReport,
        },
    },
    services::{
        correction_service::CorrectionService,
        document_service::UploadedFile,
        policy::ensure_admin,
        storage::{parse_uploaded_pairs, UploadStore},
    },
};

#[derive(Clone)]
pub struct DevelopmentService {
    repo: DevelopmentRepository,
    corrections: CorrectionService,
    store: UploadStore,
    pool: PgPool,
}

impl DevelopmentService {
    pub fn new(repo: DevelopmentRepository, corrections: CorrectionService, store: UploadStore, pool: PgPool) -> Self {
        Self { repo, corrections, store, pool }
    }

    // =========================================================================
    //  1. EMPREENDIMENTOS
    // =========================================================================

    pub async fn list(&self) -> Result<Vec<Development>, AppError> {
        self.repo.list_all().await
    }

    pub async fn list_public(&self) -> Result<Vec<DevelopmentSummary>, AppError> {
        self.repo.list_public().await
    }

    pub async fn get_detail(&self, id: Uuid) -> Result<DevelopmentDetail, AppError> {
        let development = self
            .repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("Empreendimento"))?;
        let materials = self.repo.list_materials(&self.pool, development.id).await?;
        Ok(DevelopmentDetail { development, materials })
    }

    /// Cria o empreendimento, anexa os arquivos já enviados na extração e,
    /// se o formulário veio da IA, guarda o exemplo de correção. Tudo numa transação.
    pub async fn create(&self, agent: &Agent, payload: DevelopmentPayload) -> Result<DevelopmentDetail, AppError> {
        payload.validate()?;
        let uploaded = parse_uploaded_pairs(payload.uploaded_files.as_deref().unwrap_or_default())?;

        let mut tx = self.pool.begin().await?;

        let development = self.repo.create(&mut *tx, &payload).await?;

        let mut materials = Vec::with_capacity(uploaded.len());
        for file in &uploaded {
            let material = self
                .repo
                .add_material(&mut *tx, development.id, &file.original_name, &file.stored_name)
                .await?;
            materials.push(material);
        }

        if payload.ai_originated {
            let source_text = payload.ai_source_text.as_deref().unwrap_or_default();
            self.corrections
                .record(&mut *tx, source_text, &DevelopmentFields::from_payload(&payload))
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            "🏢 Empreendimento {} criado por {} com {} material(is)",
            development.id,
            agent.id,
            materials.len()
        );
        Ok(DevelopmentDetail { development, materials })
    }

    pub async fn update(&self, id: Uuid, payload: DevelopmentPayload) -> Result<Development, AppError> {
        payload.validate()?;
        self.repo
            .update(&self.pool, id, &payload)
            .await?
            .ok_or(AppError::NotFound("Empreendimento"))
    }

    /// Apaga o registro (e em cascata materiais, interesses e agendamentos)
    /// e depois os arquivos. Arquivo que não sai do disco vira aviso.
    pub async fn delete(&self, agent: &Agent, id: Uuid) -> Result<OperationReport, AppError> {
        ensure_admin(agent)?;

        let mut tx = self.pool.begin().await?;
        let development = self
            .repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Empreendimento"))?;
        let materials = self.repo.list_materials(&mut *tx, development.id).await?;
        self.repo.delete(&mut *tx, development.id).await?;
        tx.commit().await?;

        let mut warnings = Vec::new();
        for material in &materials {
            if let Err(e) = self.store.remove(&material.stored_name).await {
                tracing::warn!("Não foi possível remover o arquivo {}: {}", material.stored_name, e);
                warnings.push(format!("Não foi possível remover o arquivo {}: {}", material.original_name, e));
            }
        }

        Ok(OperationReport {
            message: format!("Empreendimento \"{}\" excluído.", development.name),
            warnings,
        })
    }

    // =========================================================================
    //  2. MATERIAIS
    // =========================================================================

    /// Anexa arquivos a um empreendimento existente; falha de gravação pula só o arquivo.
    /// Os registros entram numa única transação: se ela falhar, nenhum material
    /// fica gravado e os arquivos desta requisição são apagados.
    pub async fn upload_materials(&self, id: Uuid, files: Vec<UploadedFile>) -> Result<UploadReport, AppError> {
        let development = self
            .repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("Empreendimento"))?;

        let mut warnings = Vec::new();
        let mut saved: Vec<StoredFile> = Vec::with_capacity(files.len());
        for file in files {
            match self.store.save(&file.name, &file.bytes).await {
                Ok(stored) => saved.push(stored),
                Err(e) => {
                    tracing::warn!("Falha ao gravar o arquivo {}: {}", file.name, e);
                    warnings.push(format!("Erro ao salvar o arquivo {}: {}", file.name, e));
                }
            }
        }

        let materials = self
            .store
            .persist_or_discard(&saved, self.record_materials(development.id, &saved))
            .await?;

        Ok(UploadReport { materials, warnings })
    }

    async fn record_materials(&self, development_id: Uuid, saved: &[StoredFile]) -> Result<Vec<Material>, AppError> {
        if saved.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;
        let mut materials = Vec::with_capacity(saved.len());
        for file in saved {
            let material = self
                .repo
                .add_material(&mut *tx, development_id, &file.original_name, &file.stored_name)
                .await?;
            materials.push(material);
        }
        tx.commit().await?;

        Ok(materials)
    }

    pub async fn rename_material(&self, id: Uuid, payload: RenameMaterialPayload) -> Result<Material, AppError> {
        payload.validate()?;
        self.repo
            .rename_material(id, payload.original_name.trim())
            .await?
            .ok_or(AppError::NotFound("Material"))
    }

    /// O registro sai mesmo que o arquivo não possa ser removido.
    pub async fn delete_material(&self, agent: &Agent, id: Uuid) -> Result<OperationReport, AppError> {
        ensure_admin(agent)?;
        let material = self.repo.find_material(id).await?.ok_or(AppError::NotFound("Material"))?;

        self.repo.delete_material(material.id).await?;

        let mut warnings = Vec::new();
        if let Err(e) = self.store.remove(&material.stored_name).await {
            tracing::warn!("Não foi possível remover o arquivo {}: {}", material.stored_name, e);
            warnings.push(format!("Não foi possível remover o arquivo {}: {}", material.original_name, e));
        }

        Ok(OperationReport {
            message: format!("Material \"{}\" excluído.", material.original_name),
            warnings,
        })
    }

    pub async fn read_upload(&self, stored_name: &str) -> Result<Vec<u8>, AppError> {
        self.store.read(stored_name).await
    }
}
