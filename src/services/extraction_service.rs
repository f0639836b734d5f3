// src/services/extraction_service.rs

//! Extração estruturada: texto dos PDFs -> prompt -> JSON dos 12 campos.
//! Qualquer falha vira resultado vazio com aviso; este fluxo nunca devolve erro.

use std::sync::Arc;

use serde_json::Value;

use crate::{
    models::{
        ai::{ExtractionResponse, ExtractionStatus, ExtractionWarning},
        development::DevelopmentFields,
    },
    services::{
        document_service::{DocumentService, UploadedFile},
        inference::InferenceClient,
        storage::format_uploaded_pairs,
    },
};

pub const DEFAULT_MAX_CHARS: usize = 8000;
pub const DEFAULT_MAX_CORRECTIONS: usize = 1;

const EXTRACTION_PROMPT: &str = r#"Você é um assistente que extrai dados de documentos de empreendimentos imobiliários para um CRM. Leia o texto abaixo e responda SOMENTE com um objeto JSON válido, sem nenhum texto antes ou depois. Quando uma informação não aparecer no texto, use a string vazia "". Formato: {"nome": "...", "status": "...", "endereco": "...", "descricao": "...", "previsao_entrega": "...", "valor_a_partir_de": "...", "tamanho_apartamentos_planta": "...", "vagas_garagem": "...", "quantidade_torres": 1, "subsolos": 2, "andares": 25, "campanha_promocional": "..."} TEXTO DOS DOCUMENTOS: --- {texto} ---"#;

const CORRECTION_PROMPT: &str = "Sua resposta anterior não veio no formato JSON pedido. A resposta foi: '{resposta}'. Corrija e devolva APENAS o objeto JSON válido, sem nenhuma outra palavra ou explicação.";

/// Parâmetros do laço de extração/autocorreção.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub max_chars: usize,
    pub max_corrections: usize,
    /// Modelo do prompt inicial; `{texto}` recebe o texto truncado.
    pub extraction_prompt: String,
    /// Modelo do prompt de correção; `{resposta}` recebe a resposta malformada.
    pub correction_prompt: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            max_corrections: DEFAULT_MAX_CORRECTIONS,
            extraction_prompt: EXTRACTION_PROMPT.to_string(),
            correction_prompt: CORRECTION_PROMPT.to_string(),
        }
    }
}

impl ExtractionConfig {
    pub fn extraction_prompt_for(&self, text: &str) -> String {
        self.extraction_prompt.replace("{texto}", truncate_chars(text, self.max_chars))
    }

    pub fn correction_prompt_for(&self, malformed: &str) -> String {
        self.correction_prompt.replace("{resposta}", malformed)
    }
}

/// Corta em `max` caracteres sem quebrar UTF-8.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Do primeiro `{` ao último `}`, inclusive.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Lê os campos, desembrulhando `{"project": {...}}` quando presente.
pub fn parse_fields(json: &str) -> Result<DevelopmentFields, serde_json::Error> {
    let value: Value = serde_json::from_str(json)?;
    let object = match value.get("project") {
        Some(inner) if inner.is_object() => inner,
        _ => &value,
    };
    Ok(DevelopmentFields::from_json(object))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOutcome {
    pub fields: DevelopmentFields,
    pub status: ExtractionStatus,
    pub warnings: Vec<ExtractionWarning>,
}

impl ExtractionOutcome {
    fn parsed(fields: DevelopmentFields, corrections: usize) -> Self {
        let status = if corrections == 0 { ExtractionStatus::Parsed } else { ExtractionStatus::Corrected };
        Self { fields, status, warnings: Vec::new() }
    }

    fn empty(warning: ExtractionWarning) -> Self {
        Self {
            fields: DevelopmentFields::default(),
            status: ExtractionStatus::Empty,
            warnings: vec![warning],
        }
    }
}

#[derive(Clone)]
pub struct ExtractionService {
    client: Arc<dyn InferenceClient>,
    documents: DocumentService,
    config: ExtractionConfig,
}

impl ExtractionService {
    pub fn new(client: Arc<dyn InferenceClient>, documents: DocumentService, config: ExtractionConfig) -> Self {
        Self { client, documents, config }
    }

    /// Uma chamada à IA e, se não vier `{...}`, até `max_corrections` pedidos de correção.
    pub async fn extract_fields(&self, text: &str) -> ExtractionOutcome {
        let prompt = self.config.extraction_prompt_for(text);

        let mut response = match self.client.generate(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("A IA não conseguiu processar os documentos: {}", e);
                return ExtractionOutcome::empty(ExtractionWarning::InferenceFailed { reason: e.to_string() });
            }
        };

        let mut corrections = 0;
        loop {
            if let Some(json) = extract_json_object(&response) {
                return match parse_fields(json) {
                    Ok(fields) => ExtractionOutcome::parsed(fields, corrections),
                    Err(e) => {
                        tracing::error!("JSON devolvido pela IA é inválido: {}", e);
                        ExtractionOutcome::empty(ExtractionWarning::InferenceFailed {
                            reason: format!("JSON inválido: {}", e),
                        })
                    }
                };
            }

            if corrections >= self.config.max_corrections {
                tracing::warn!("A autocorreção da IA também falhou");
                return ExtractionOutcome::empty(ExtractionWarning::MalformedResponse { raw: response });
            }

            corrections += 1;
            tracing::warn!("Resposta da IA sem JSON, tentando autocorreção ({})", corrections);
            let prompt = self.config.correction_prompt_for(&response);
            response = match self.client.generate(&prompt).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!("Falha na autocorreção da IA: {}", e);
                    return ExtractionOutcome::empty(ExtractionWarning::InferenceFailed { reason: e.to_string() });
                }
            };
        }
    }

    /// Fluxo completo do upload: grava os arquivos, extrai o texto e pede o JSON à IA.
    pub async fn prefill(&self, files: Vec<UploadedFile>) -> ExtractionResponse {
        let documents = self.documents.extract(files).await;
        let uploaded_files_field = format_uploaded_pairs(&documents.stored);

        // Sem texto não há o que mandar para a IA
        if !documents.has_text() {
            return ExtractionResponse {
                extracted: DevelopmentFields::default(),
                status: ExtractionStatus::Empty,
                source_text: String::new(),
                uploaded_files: documents.stored,
                uploaded_files_field,
                warnings: documents.warnings,
            };
        }

        let outcome = self.extract_fields(&documents.text).await;

        let mut warnings = documents.warnings;
        warnings.extend(outcome.warnings);

        ExtractionResponse {
            extracted: outcome.fields,
            status: outcome.status,
            source_text: documents.text,
            uploaded_files: documents.stored,
            uploaded_files_field,
            warnings,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::services::{inference::InferenceError, storage::UploadStore};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Cliente de IA com respostas roteirizadas; registra os prompts recebidos.
    #[derive(Default)]
    pub(crate) struct ScriptedClient {
        replies: Mutex<VecDeque<Result<String, InferenceError>>>,
        pub(crate) prompts: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        pub(crate) fn new(replies: Vec<Result<String, InferenceError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl InferenceClient for ScriptedClient {
        async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(InferenceError::EmptyContent))
        }
    }

    fn service(client: Arc<ScriptedClient>, dir: &std::path::Path) -> ExtractionService {
        ExtractionService::new(
            client,
            DocumentService::new(UploadStore::new(dir)),
            ExtractionConfig::default(),
        )
    }

    #[test]
    fn json_object_is_found_inside_prose() {
        assert_eq!(extract_json_object("Aqui está: {\"a\": {\"b\": 1}} espero ter ajudado"), Some("{\"a\": {\"b\": 1}}"));
        assert_eq!(extract_json_object("sem chaves"), None);
        assert_eq!(extract_json_object("} ao contrário {"), None);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("ação", 2), "aç");
        assert_eq!(truncate_chars("abc", 10), "abc");
        let config = ExtractionConfig { max_chars: 3, ..Default::default() };
        let prompt = config.extraction_prompt_for("abcdef");
        assert!(prompt.contains("--- abc ---"));
    }

    #[tokio::test]
    async fn prose_around_json_is_recovered() {
        let dir = tempfile::tempdir().unwrap();
        let client = ScriptedClient::new(vec![Ok("Claro! {\"nome\": \"Alpha\", \"andares\": 25} Abraços".into())]);
        let outcome = service(client.clone(), dir.path()).extract_fields("texto").await;

        assert_eq!(outcome.status, ExtractionStatus::Parsed);
        assert_eq!(outcome.fields.name, "Alpha");
        assert_eq!(outcome.fields.floor_count, "25");
        assert!(outcome.warnings.is_empty());
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn no_braces_twice_gives_empty_result_and_warning() {
        let dir = tempfile::tempdir().unwrap();
        let client = ScriptedClient::new(vec![Ok("não sei".into()), Ok("ainda não sei".into())]);
        let outcome = service(client.clone(), dir.path()).extract_fields("texto").await;

        assert_eq!(outcome.status, ExtractionStatus::Empty);
        assert_eq!(outcome.fields, DevelopmentFields::default());
        assert_eq!(
            outcome.warnings,
            vec![ExtractionWarning::MalformedResponse { raw: "ainda não sei".into() }]
        );
        // Exatamente uma autocorreção, citando a resposta malformada
        assert_eq!(client.calls(), 2);
        assert!(client.prompts.lock().unwrap()[1].contains("'não sei'"));
    }

    #[tokio::test]
    async fn successful_correction_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let client = ScriptedClient::new(vec![Ok("ops".into()), Ok("{\"nome\": \"Beta\"}".into())]);
        let outcome = service(client, dir.path()).extract_fields("texto").await;

        assert_eq!(outcome.status, ExtractionStatus::Corrected);
        assert_eq!(outcome.fields.name, "Beta");
    }

    #[tokio::test]
    async fn project_wrapper_is_unwrapped() {
        let dir = tempfile::tempdir().unwrap();
        let client = ScriptedClient::new(vec![Ok("{\"project\": {\"nome\": \"Gama\", \"subsolos\": 2}}".into())]);
        let outcome = service(client, dir.path()).extract_fields("texto").await;

        assert_eq!(outcome.fields.name, "Gama");
        assert_eq!(outcome.fields.basement_levels, "2");
    }

    #[tokio::test]
    async fn transport_and_parse_errors_degrade_to_warnings() {
        let dir = tempfile::tempdir().unwrap();

        let client = ScriptedClient::new(vec![Err(InferenceError::NotConfigured)]);
        let outcome = service(client, dir.path()).extract_fields("texto").await;
        assert_eq!(outcome.status, ExtractionStatus::Empty);
        assert!(matches!(outcome.warnings[0], ExtractionWarning::InferenceFailed { .. }));

        let client = ScriptedClient::new(vec![Ok("{nome: Alpha}".into())]);
        let outcome = service(client.clone(), dir.path()).extract_fields("texto").await;
        assert_eq!(outcome.status, ExtractionStatus::Empty);
        assert!(matches!(outcome.warnings[0], ExtractionWarning::InferenceFailed { .. }));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn upload_without_text_skips_inference_and_keeps_files() {
        let dir = tempfile::tempdir().unwrap();
        let client = ScriptedClient::new(vec![]);
        let response = service(client.clone(), dir.path())
            .prefill(vec![UploadedFile { name: "planta.png".into(), bytes: vec![1, 2, 3] }])
            .await;

        assert_eq!(client.calls(), 0);
        assert_eq!(response.status, ExtractionStatus::Empty);
        assert_eq!(response.warnings, vec![ExtractionWarning::NoTextExtracted]);
        assert_eq!(response.uploaded_files.len(), 1);
        assert_eq!(
            response.uploaded_files_field,
            format!("planta.png|{}", response.uploaded_files[0].stored_name)
        );
    }
}
