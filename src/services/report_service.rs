// src/services/report_service.rs

//! Exportação e importação de clientes em CSV (`;`, UTF-8 com BOM).

use std::collections::{HashMap, HashSet};

use chrono::{Local, NaiveDate};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{crm_repo::ClientWrite, CrmRepository},
    models::{
        auth::Agent,
        crm::{Client, ClientPayload, ClientStatus, ImportSummary, Labeled, LeadTemperature, MaritalStatus},
    },
    services::crm_service::owner_scope,
};

const BOM: &[u8] = b"\xEF\xBB\xBF";
const DELIMITER: u8 = b';';

pub const CLIENT_HEADERS: [&str; 22] = [
    "Nome Completo",
    "Email Pessoal",
    "Email Comercial",
    "DDD Pessoal",
    "Telefone Pessoal",
    "DDD Pessoal 2",
    "Telefone Pessoal 2",
    "DDD Residencial",
    "Telefone Residencial",
    "DDD Comercial",
    "Telefone Comercial",
    "CPF",
    "RG",
    "Data de Nascimento",
    "Profissão",
    "Estado Civil",
    "Status",
    "Temperatura",
    "Origem do Lead",
    "Renda",
    "Valor Buscado",
    "Observações",
];

const REQUIRED_IMPORT_HEADERS: [&str; 5] = ["Nome Completo", "CPF", "Email Pessoal", "DDD Pessoal", "Telefone Pessoal"];

fn client_row(c: &Client) -> [String; 22] {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    [
        c.full_name.clone(),
        text(&c.email),
        text(&c.business_email),
        c.phone_area_code.clone(),
        c.phone_number.clone(),
        text(&c.phone2_area_code),
        text(&c.phone2_number),
        text(&c.home_area_code),
        text(&c.home_phone),
        text(&c.work_area_code),
        text(&c.work_phone),
        text(&c.cpf),
        text(&c.rg),
        c.birth_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
        text(&c.profession),
        c.marital_status.map(|m| m.label().to_string()).unwrap_or_default(),
        c.status.label().to_string(),
        c.temperature.map(|t| t.label().to_string()).unwrap_or_default(),
        text(&c.lead_source),
        text(&c.income_bracket),
        text(&c.target_price),
        text(&c.notes),
    ]
}

pub fn write_clients_csv(clients: &[Client]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_writer(BOM.to_vec());

    let to_internal = |e: csv::Error| AppError::InternalServerError(e.into());

    writer.write_record(CLIENT_HEADERS).map_err(to_internal)?;
    for client in clients {
        writer.write_record(client_row(client)).map_err(to_internal)?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("Falha ao gerar o CSV: {}", e)))
}

/// Aceita `AAAA-MM-DD` e `DD/MM/AAAA`; qualquer outra coisa vira vazio.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
}

#[derive(Debug, Clone)]
pub enum ImportRow {
    Valid(ClientPayload),
    Invalid,
}

fn parse_row(get: impl Fn(&str) -> Option<String>) -> ImportRow {
    let Some(full_name) = get("Nome Completo") else {
        return ImportRow::Invalid;
    };

    let mut payload = ClientPayload {
        full_name,
        email: get("Email Pessoal"),
        business_email: get("Email Comercial"),
        phone_area_code: get("DDD Pessoal"),
        phone_number: get("Telefone Pessoal"),
        phone2_area_code: get("DDD Pessoal 2"),
        phone2_number: get("Telefone Pessoal 2"),
        home_area_code: get("DDD Residencial"),
        home_phone: get("Telefone Residencial"),
        work_area_code: get("DDD Comercial"),
        work_phone: get("Telefone Comercial"),
        cpf: get("CPF"),
        rg: get("RG"),
        birth_date: get("Data de Nascimento").as_deref().and_then(parse_date),
        profession: get("Profissão"),
        marital_status: get("Estado Civil").as_deref().and_then(MaritalStatus::from_label),
        status: get("Status").as_deref().and_then(ClientStatus::from_label),
        temperature: get("Temperatura").as_deref().and_then(LeadTemperature::from_label),
        lead_source: get("Origem do Lead"),
        income_bracket: get("Renda"),
        target_price: get("Valor Buscado"),
        notes: get("Observações"),
        ..Default::default()
    };
    payload.normalize();

    if payload.validate().is_err() {
        return ImportRow::Invalid;
    }
    ImportRow::Valid(payload)
}

/// Lê o CSV de importação. Cabeçalho obrigatório ausente é erro; linha ruim não.
pub fn parse_import(bytes: &[u8]) -> Result<Vec<ImportRow>, AppError> {
    let bytes = bytes.strip_prefix(BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader.headers().map_err(|e| AppError::InvalidCsv(e.to_string()))?.clone();
    let index: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, h)| (h, i)).collect();

    if let Some(missing) = REQUIRED_IMPORT_HEADERS.iter().find(|h| !index.contains_key(*h)) {
        return Err(AppError::InvalidCsv(format!("coluna obrigatória ausente: {}", missing)));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AppError::InvalidCsv(e.to_string()))?;
        let get = |header: &str| {
            index
                .get(header)
                .and_then(|&i| record.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        rows.push(parse_row(get));
    }
    Ok(rows)
}

#[derive(Debug, Default)]
pub struct ImportPlan {
    pub to_insert: Vec<ClientPayload>,
    pub skipped_duplicates: usize,
    pub skipped_invalid: usize,
}

/// Decide o que entra: linha cujo CPF ou e-mail já existe (no banco ou
/// em linha anterior do arquivo) é pulada.
pub fn plan_import(rows: Vec<ImportRow>, mut taken_cpfs: HashSet<String>, mut taken_emails: HashSet<String>) -> ImportPlan {
    let mut plan = ImportPlan::default();

    for row in rows {
        let payload = match row {
            ImportRow::Valid(payload) => payload,
            ImportRow::Invalid => {
                plan.skipped_invalid += 1;
                continue;
            }
        };

        let emails: Vec<&String> = payload.email.iter().chain(payload.business_email.iter()).collect();
        let duplicate = payload.cpf.as_ref().is_some_and(|cpf| taken_cpfs.contains(cpf))
            || emails.iter().any(|email| taken_emails.contains(*email));
        if duplicate {
            plan.skipped_duplicates += 1;
            continue;
        }

        if let Some(cpf) = &payload.cpf {
            taken_cpfs.insert(cpf.clone());
        }
        for email in emails {
            taken_emails.insert(email.clone());
        }
        plan.to_insert.push(payload);
    }
    plan
}

#[derive(Clone)]
pub struct ReportService {
    crm_repo: CrmRepository,
    pool: PgPool,
}

impl ReportService {
    pub fn new(crm_repo: CrmRepository, pool: PgPool) -> Self {
        Self { crm_repo, pool }
    }

    /// Clientes ativos (do corretor, ou todos para o admin) em CSV.
    pub async fn export_clients(&self, agent: &Agent) -> Result<Vec<u8>, AppError> {
        let clients = self.crm_repo.list_clients(owner_scope(agent), None, None, false).await?;
        if clients.is_empty() {
            return Err(AppError::NothingToExport);
        }
        write_clients_csv(&clients)
    }

    pub async fn import_clients(&self, agent: &Agent, bytes: &[u8]) -> Result<ImportSummary, AppError> {
        let rows = parse_import(bytes)?;

        let mut cpfs = Vec::new();
        let mut emails = Vec::new();
        for row in &rows {
            if let ImportRow::Valid(p) = row {
                cpfs.extend(p.cpf.clone());
                emails.extend(p.email.clone());
                emails.extend(p.business_email.clone());
            }
        }

        let mut tx = self.pool.begin().await?;

        let mut taken_cpfs = HashSet::new();
        let mut taken_emails = HashSet::new();
        for (cpf, email, business_email) in self.crm_repo.existing_identities(&mut *tx, &cpfs, &emails).await? {
            taken_cpfs.extend(cpf);
            taken_emails.extend(email);
            taken_emails.extend(business_email);
        }

        let plan = plan_import(rows, taken_cpfs, taken_emails);
        let today = Local::now().date_naive();

        for payload in &plan.to_insert {
            let write = ClientWrite {
                payload,
                status: payload.status.unwrap_or(ClientStatus::NewLead),
                temperature: Some(payload.temperature.unwrap_or(LeadTemperature::Warm)),
                first_contact_date: Some(payload.first_contact_date.unwrap_or(today)),
            };
            self.crm_repo.create_client(&mut *tx, agent.id, write).await?;
        }

        tx.commit().await?;

        let summary = ImportSummary {
            imported: plan.to_insert.len(),
            skipped_duplicates: plan.skipped_duplicates,
            skipped_invalid: plan.skipped_invalid,
        };
        tracing::info!("📥 Importação de {}: {:?}", agent.id, summary);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn client() -> Client {
        Client {
            id: Uuid::new_v4(),
            owner_id: None,
            full_name: "Maria da Silva".into(),
            birth_date: NaiveDate::from_ymd_opt(1985, 7, 21),
            cpf: Some("123.456.789-00".into()),
            rg: Some("12.345.678-9".into()),
            profession: Some("Médica".into()),
            email: Some("maria@exemplo.com".into()),
            business_email: Some("maria@clinica.com".into()),
            phone_area_code: "11".into(),
            phone_number: "912345678".into(),
            phone2_area_code: None,
            phone2_number: None,
            home_area_code: Some("11".into()),
            home_phone: Some("33334444".into()),
            work_area_code: None,
            work_phone: None,
            address: None,
            employer: None,
            business_address: None,
            marital_status: Some(MaritalStatus::CivilUnion),
            spouse: None,
            lead_source: Some("Instagram".into()),
            first_contact_date: None,
            temperature: Some(LeadTemperature::Hot),
            status: ClientStatus::InContact,
            income_bracket: Some("20k+".into()),
            target_price: Some("R$ 1,2 mi".into()),
            notes: Some("Prefere andar alto; tem dois filhos\nligar à tarde".into()),
            discarded: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn export_has_bom_and_fixed_header() {
        let csv = write_clients_csv(&[client()]).unwrap();
        assert!(csv.starts_with(BOM));
        let text = String::from_utf8(csv[BOM.len()..].to_vec()).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header, CLIENT_HEADERS.join(";"));
    }

    #[test]
    fn exported_csv_imports_back_to_the_same_client() {
        let original = client();
        let csv = write_clients_csv(std::slice::from_ref(&original)).unwrap();

        let rows = parse_import(&csv).unwrap();
        assert_eq!(rows.len(), 1);
        let ImportRow::Valid(p) = &rows[0] else { panic!("linha deveria ser válida") };

        assert_eq!(p.full_name, original.full_name);
        assert_eq!(p.cpf, original.cpf);
        assert_eq!(p.email, original.email);
        assert_eq!(p.business_email, original.business_email);
        assert_eq!(p.phone_area_code.as_deref(), Some("11"));
        assert_eq!(p.phone_number.as_deref(), Some("912345678"));
        assert_eq!(p.home_phone, original.home_phone);
        assert_eq!(p.birth_date, original.birth_date);
        assert_eq!(p.marital_status, original.marital_status);
        assert_eq!(p.status, Some(original.status));
        assert_eq!(p.temperature, original.temperature);
        assert_eq!(p.notes, original.notes);
        assert_eq!(p.work_phone, None);
    }

    #[test]
    fn duplicates_in_store_and_in_file_are_skipped() {
        let csv = "\u{feff}Nome Completo;CPF;Email Pessoal;DDD Pessoal;Telefone Pessoal;Data de Nascimento\n\
                   Ana;111.111.111-11;ana@x.com;11;911111111;21/07/1985\n\
                   Bruno;222.222.222-22;bruno@x.com;11;922222222;\n\
                   Bruno de novo;333.333.333-33;bruno@x.com;11;933333333;\n\
                   Carla;;carla@x.com;11;;\n\
                   ;444.444.444-44;;11;944444444;\n\
                   Daniel;555.555.555-55;;21;955555555;1990-01-02\n";

        let rows = parse_import(csv.as_bytes()).unwrap();
        let existing_cpfs = HashSet::from(["111.111.111-11".to_string()]);
        let plan = plan_import(rows, existing_cpfs, HashSet::new());

        let names: Vec<_> = plan.to_insert.iter().map(|p| p.full_name.as_str()).collect();
        assert_eq!(names, ["Bruno", "Daniel"]);
        assert_eq!(plan.skipped_duplicates, 2);
        assert_eq!(plan.skipped_invalid, 2);
        assert_eq!(plan.to_insert[1].birth_date, NaiveDate::from_ymd_opt(1990, 1, 2));
    }

    #[test]
    fn cells_longer_than_the_columns_make_the_row_invalid() {
        let csv = "Nome Completo;CPF;Email Pessoal;DDD Pessoal;Telefone Pessoal;Telefone Residencial;RG\n\
                   Ana;111.111.111-11;ana@x.com;11;911111111;3333-4444 ramal 12;\n\
                   Bruno;222.222.222-22;bruno@x.com;11;922222222;;1234567890123456789012345678901\n\
                   Carla;333.333.333-33;carla@x.com;11;933333333;33334444;12.345.678-9\n";

        let rows = parse_import(csv.as_bytes()).unwrap();
        let plan = plan_import(rows, HashSet::new(), HashSet::new());

        let names: Vec<_> = plan.to_insert.iter().map(|p| p.full_name.as_str()).collect();
        assert_eq!(names, ["Carla"]);
        assert_eq!(plan.skipped_invalid, 2);
    }

    #[test]
    fn missing_required_header_is_rejected() {
        let csv = "Nome Completo;Email Pessoal\nAna;ana@x.com\n";
        assert!(matches!(parse_import(csv.as_bytes()), Err(AppError::InvalidCsv(_))));
    }

    #[test]
    fn dates_accept_iso_and_brazilian_formats() {
        assert_eq!(parse_date("2024-02-29"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(parse_date("29/02/2024"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(parse_date("ontem"), None);
    }
}
