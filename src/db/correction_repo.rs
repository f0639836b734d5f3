// src/db/correction_repo.rs

use sqlx::{Executor, Postgres};

use crate::{common::error::AppError, models::ai::CorrectionExample};

// Só inserção: os exemplos corrigidos nunca são editados nem apagados
#[derive(Clone, Default)]
pub struct CorrectionRepository;

impl CorrectionRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert<'e, E>(&self, executor: E, source_text: &str, corrected_json: &str) -> Result<CorrectionExample, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let example = sqlx::query_as::<_, CorrectionExample>(
            r#"
            INSERT INTO correction_examples (source_text, corrected_json)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(source_text)
        .bind(corrected_json)
        .fetch_one(executor)
        .await?;
        Ok(example)
    }
}
