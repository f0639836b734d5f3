// src/models/schedule.rs

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    #[schema(example = "Visita ao decorado")]
    pub title: String,
    #[schema(value_type = String, example = "2025-03-10T14:00:00")]
    pub starts_at: NaiveDateTime,
    #[schema(value_type = Option<String>)]
    pub ends_at: Option<NaiveDateTime>,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub client_id: Option<Uuid>,
    pub development_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentPayload {
    #[validate(length(min = 1, max = 200, message = "O título é obrigatório (até 200 caracteres)."))]
    pub title: String,
    // Obrigatório na criação; na edição, se ausente, mantém o atual
    #[schema(value_type = Option<String>, example = "2025-03-10T14:00:00")]
    pub starts_at: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>)]
    pub ends_at: Option<NaiveDateTime>,
    pub description: Option<String>,
    pub client_id: Option<Uuid>,
    pub development_id: Option<Uuid>,
}

// Cor fixa dos eventos no calendário
pub const EVENT_COLOR: &str = "#007BFF";
pub const EVENT_TEXT_COLOR: &str = "white";

/// Evento no formato esperado pelo calendário do front end.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub title: String,
    pub start: String,
    pub end: Option<String>,
    pub url: String,
    pub color: &'static str,
    pub text_color: &'static str,
}

impl From<&Appointment> for CalendarEvent {
    fn from(appointment: &Appointment) -> Self {
        Self {
            title: appointment.title.clone(),
            start: appointment.starts_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            end: appointment
                .ends_at
                .map(|end| end.format("%Y-%m-%dT%H:%M:%S").to_string()),
            url: format!("/api/appointments/{}", appointment.id),
            color: EVENT_COLOR,
            text_color: EVENT_TEXT_COLOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn appointment(ends_at: Option<NaiveDateTime>) -> Appointment {
        Appointment {
            id: Uuid::nil(),
            title: "Visita".into(),
            starts_at: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap().and_hms_opt(14, 0, 0).unwrap(),
            ends_at,
            description: None,
            owner_id: Uuid::nil(),
            client_id: None,
            development_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn event_uses_iso_dates_and_fixed_colors() {
        let end = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap().and_hms_opt(15, 30, 0).unwrap();
        let event = CalendarEvent::from(&appointment(Some(end)));
        assert_eq!(event.start, "2025-03-10T14:00:00");
        assert_eq!(event.end.as_deref(), Some("2025-03-10T15:30:00"));
        assert_eq!(event.color, "#007BFF");
        assert_eq!(event.text_color, "white");
        assert_eq!(event.url, format!("/api/appointments/{}", Uuid::nil()));
    }

    #[test]
    fn open_ended_event_serializes_null_end() {
        let event = CalendarEvent::from(&appointment(None));
        let json = serde_json::to_value(&event).unwrap();
        assert!(json["end"].is_null());
        assert_eq!(json["textColor"], "white");
    }
}
