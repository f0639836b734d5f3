// src/db/crm_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        crm::{Activity, ActivityKind, Client, ClientPayload, ClientStatus, LeadTemperature},
        development::DevelopmentSummary,
    },
};

/// Campos de cliente com unicidade global (quando preenchidos).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueClientField {
    Cpf,
    Email,
    BusinessEmail,
}

impl UniqueClientField {
    pub fn label(&self) -> &'static str {
        match self {
            UniqueClientField::Cpf => "O CPF",
            UniqueClientField::Email => "O Email Pessoal",
            UniqueClientField::BusinessEmail => "O Email Comercial",
        }
    }

    fn from_constraint(constraint: &str) -> Option<Self> {
        match constraint {
            "clients_cpf_key" => Some(UniqueClientField::Cpf),
            "clients_email_key" => Some(UniqueClientField::Email),
            "clients_business_email_key" => Some(UniqueClientField::BusinessEmail),
            _ => None,
        }
    }
}

/// Valores resolvidos (padrões já aplicados) para gravar um cliente.
pub struct ClientWrite<'a> {
    pub payload: &'a ClientPayload,
    pub status: ClientStatus,
    pub temperature: Option<LeadTemperature>,
    pub first_contact_date: Option<NaiveDate>,
}

// Tradução do erro de unicidade do Postgres para o campo do cliente
fn map_client_write_error(e: sqlx::Error, payload: &ClientPayload) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if let Some(field) = db_err.constraint().and_then(UniqueClientField::from_constraint) {
                let value = match field {
                    UniqueClientField::Cpf => payload.cpf.as_deref(),
                    UniqueClientField::Email => payload.email.as_deref(),
                    UniqueClientField::BusinessEmail => payload.business_email.as_deref(),
                };
                return AppError::DuplicateField {
                    field: field.label(),
                    value: value.unwrap_or("?").to_string(),
                };
            }
        }
    }
    e.into()
}

#[derive(Clone)]
pub struct CrmRepository {
    pool: PgPool,
}

impl CrmRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    pub async fn find_client<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(client)
    }

    /// Lista filtrada. `owner = None` significa "todos os donos" (visão de admin).
    pub async fn list_clients(
        &self,
        owner: Option<Uuid>,
        search: Option<&str>,
        status: Option<ClientStatus>,
        discarded: bool,
    ) -> Result<Vec<Client>, AppError> {
        let search_term = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT * FROM clients
            WHERE discarded = $1
              AND ($2::uuid IS NULL OR owner_id = $2)
              AND ($3::text IS NULL OR full_name ILIKE $3)
              AND ($4::client_status IS NULL OR status = $4)
            ORDER BY full_name ASC
            "#,
        )
        .bind(discarded)
        .bind(owner)
        .bind(search_term)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }

    /// Existe outro cliente com este valor? (`exclude` ignora o próprio cliente na edição)
    pub async fn exists_with<'e, E>(
        &self,
        executor: E,
        field: UniqueClientField,
        value: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = match field {
            UniqueClientField::Cpf => {
                "SELECT EXISTS(SELECT 1 FROM clients WHERE cpf = $1 AND ($2::uuid IS NULL OR id <> $2))"
            }
            UniqueClientField::Email => {
                "SELECT EXISTS(SELECT 1 FROM clients WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))"
            }
            UniqueClientField::BusinessEmail => {
                "SELECT EXISTS(SELECT 1 FROM clients WHERE business_email = $1 AND ($2::uuid IS NULL OR id <> $2))"
            }
        };

        let exists: bool = sqlx::query_scalar(sql)
            .bind(value)
            .bind(exclude)
            .fetch_one(executor)
            .await?;
        Ok(exists)
    }

    /// CPFs e e-mails já cadastrados entre os candidatos (usado na importação).
    pub async fn existing_identities<'e, E>(
        &self,
        executor: E,
        cpfs: &[String],
        emails: &[String],
    ) -> Result<Vec<(Option<String>, Option<String>, Option<String>)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, (Option<String>, Option<String>, Option<String>)>(
            r#"
            SELECT cpf, email, business_email FROM clients
            WHERE cpf = ANY($1) OR email = ANY($2) OR business_email = ANY($2)
            "#,
        )
        .bind(cpfs)
        .bind(emails)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn create_client<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        write: ClientWrite<'_>,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let p = write.payload;
        sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (
                owner_id, full_name, birth_date, cpf, rg, profession, email, business_email,
                phone_area_code, phone_number, phone2_area_code, phone2_number,
                home_area_code, home_phone, work_area_code, work_phone,
                address, employer, business_address, marital_status, spouse,
                lead_source, first_contact_date, temperature, status,
                income_bracket, target_price, notes
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8,
                $9, $10, $11, $12,
                $13, $14, $15, $16,
                $17, $18, $19, $20, $21,
                $22, $23, $24, $25,
                $26, $27, $28
            )
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(&p.full_name)
        .bind(p.birth_date)
        .bind(&p.cpf)
        .bind(&p.rg)
        .bind(&p.profession)
        .bind(&p.email)
        .bind(&p.business_email)
        .bind(&p.phone_area_code)
        .bind(&p.phone_number)
        .bind(&p.phone2_area_code)
        .bind(&p.phone2_number)
        .bind(&p.home_area_code)
        .bind(&p.home_phone)
        .bind(&p.work_area_code)
        .bind(&p.work_phone)
        .bind(&p.address)
        .bind(&p.employer)
        .bind(&p.business_address)
        .bind(p.marital_status)
        .bind(&p.spouse)
        .bind(&p.lead_source)
        .bind(write.first_contact_date)
        .bind(write.temperature)
        .bind(write.status)
        .bind(&p.income_bracket)
        .bind(&p.target_price)
        .bind(&p.notes)
        .fetch_one(executor)
        .await
        .map_err(|e| map_client_write_error(e, p))
    }

    pub async fn update_client<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        write: ClientWrite<'_>,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let p = write.payload;
        sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients SET
                full_name = $2, birth_date = $3, cpf = $4, rg = $5, profession = $6,
                email = $7, business_email = $8,
                phone_area_code = $9, phone_number = $10, phone2_area_code = $11, phone2_number = $12,
                home_area_code = $13, home_phone = $14, work_area_code = $15, work_phone = $16,
                address = $17, employer = $18, business_address = $19,
                marital_status = $20, spouse = $21,
                lead_source = $22, first_contact_date = $23, temperature = $24, status = $25,
                income_bracket = $26, target_price = $27, notes = $28,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&p.full_name)
        .bind(p.birth_date)
        .bind(&p.cpf)
        .bind(&p.rg)
        .bind(&p.profession)
        .bind(&p.email)
        .bind(&p.business_email)
        .bind(&p.phone_area_code)
        .bind(&p.phone_number)
        .bind(&p.phone2_area_code)
        .bind(&p.phone2_number)
        .bind(&p.home_area_code)
        .bind(&p.home_phone)
        .bind(&p.work_area_code)
        .bind(&p.work_phone)
        .bind(&p.address)
        .bind(&p.employer)
        .bind(&p.business_address)
        .bind(p.marital_status)
        .bind(&p.spouse)
        .bind(&p.lead_source)
        .bind(write.first_contact_date)
        .bind(write.temperature)
        .bind(write.status)
        .bind(&p.income_bracket)
        .bind(&p.target_price)
        .bind(&p.notes)
        .fetch_one(executor)
        .await
        .map_err(|e| map_client_write_error(e, p))
    }

    /// Move para a lixeira (soft delete).
    pub async fn discard_client<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE clients SET discarded = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Tira da lixeira atribuindo um novo dono.
    pub async fn restore_client<'e, E>(&self, executor: E, id: Uuid, new_owner: Uuid) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>(
            "UPDATE clients SET discarded = FALSE, owner_id = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(new_owner)
        .fetch_one(executor)
        .await?;
        Ok(client)
    }

    // Atividades, agendamentos e interesses caem junto (ON DELETE CASCADE)
    pub async fn delete_client<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    //  ATIVIDADES
    // =========================================================================

    pub async fn list_activities(&self, client_id: Uuid) -> Result<Vec<Activity>, AppError> {
        let activities = sqlx::query_as::<_, Activity>(
            "SELECT * FROM activities WHERE client_id = $1 ORDER BY created_at DESC",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(activities)
    }

    pub async fn find_activity(&self, id: Uuid) -> Result<Option<Activity>, AppError> {
        let activity = sqlx::query_as::<_, Activity>("SELECT * FROM activities WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(activity)
    }

    pub async fn create_activity<'e, E>(
        &self,
        executor: E,
        client_id: Uuid,
        author_id: Uuid,
        kind: ActivityKind,
        summary: &str,
    ) -> Result<Activity, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let activity = sqlx::query_as::<_, Activity>(
            r#"
            INSERT INTO activities (client_id, author_id, kind, summary)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(client_id)
        .bind(author_id)
        .bind(kind)
        .bind(summary)
        .fetch_one(executor)
        .await?;
        Ok(activity)
    }

    pub async fn update_activity<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        kind: ActivityKind,
        summary: &str,
    ) -> Result<Activity, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let activity = sqlx::query_as::<_, Activity>(
            "UPDATE activities SET kind = $2, summary = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(kind)
        .bind(summary)
        .fetch_one(executor)
        .await?;
        Ok(activity)
    }

    pub async fn delete_activity<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM activities WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // =========================================================================
    //  INTERESSES (pares cliente ↔ empreendimento)
    // =========================================================================

    pub async fn list_interest_pairs<'e, E>(&self, executor: E, client_id: Uuid) -> Result<Vec<(Uuid, Uuid)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pairs = sqlx::query_as::<_, (Uuid, Uuid)>(
            "SELECT client_id, development_id FROM interests WHERE client_id = $1",
        )
        .bind(client_id)
        .fetch_all(executor)
        .await?;
        Ok(pairs)
    }

    pub async fn insert_interest<'e, E>(&self, executor: E, client_id: Uuid, development_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "INSERT INTO interests (client_id, development_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(client_id)
        .bind(development_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete_interest<'e, E>(&self, executor: E, client_id: Uuid, development_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM interests WHERE client_id = $1 AND development_id = $2")
            .bind(client_id)
            .bind(development_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Empreendimentos em que o cliente tem interesse, por nome.
    pub async fn list_interest_developments(&self, client_id: Uuid) -> Result<Vec<DevelopmentSummary>, AppError> {
        let developments = sqlx::query_as::<_, DevelopmentSummary>(
            r#"
            SELECT d.id, d.name, d.address, d.status, d.description
            FROM developments d
            INNER JOIN interests i ON i.development_id = d.id
            WHERE i.client_id = $1
            ORDER BY d.name ASC
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(developments)
    }
}
