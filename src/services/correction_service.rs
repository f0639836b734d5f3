// src/services/correction_service.rs

use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    db::CorrectionRepository,
    models::{ai::CorrectionExample, development::DevelopmentFields},
};

/// JSON a ser guardado, ou `None` quando não há texto original.
/// As chaves saem na ordem do esquema de extração.
pub fn prepare(source_text: &str, corrected: &DevelopmentFields) -> Result<Option<String>, AppError> {
    if source_text.trim().is_empty() {
        return Ok(None);
    }
    let json = serde_json::to_string_pretty(corrected).map_err(anyhow::Error::from)?;
    Ok(Some(json))
}

#[derive(Clone)]
pub struct CorrectionService {
    repo: CorrectionRepository,
}

impl CorrectionService {
    pub fn new(repo: CorrectionRepository) -> Self {
        Self { repo }
    }

    /// Guarda o par (texto original, campos corrigidos pelo humano). Só inserção.
    pub async fn record<'e, E>(
        &self,
        executor: E,
        source_text: &str,
        corrected: &DevelopmentFields,
    ) -> Result<Option<CorrectionExample>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let Some(json) = prepare(source_text, corrected)? else {
            return Ok(None);
        };

        let example = self.repo.insert(executor, source_text, &json).await?;
        tracing::info!("🧠 Exemplo de correção {} armazenado", example.id);
        Ok(Some(example))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_source_text_is_ignored() {
        let fields = DevelopmentFields { name: "Alpha".into(), ..Default::default() };
        assert_eq!(prepare("   \n", &fields).unwrap(), None);
    }

    #[test]
    fn corrected_fields_are_pretty_json_in_schema_order() {
        let fields = DevelopmentFields {
            name: "Alpha Corrigido".into(),
            floor_count: "25".into(),
            ..Default::default()
        };
        let json = prepare("texto do PDF", &fields).unwrap().unwrap();

        assert!(json.contains('\n'));
        let nome = json.find("\"nome\"").unwrap();
        let status = json.find("\"status\"").unwrap();
        let campanha = json.find("\"campanha_promocional\"").unwrap();
        assert!(nome < status && status < campanha);

        let back: DevelopmentFields = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fields);
    }
}
