use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::fields::{lenient_id, lenient_string, lenient_timestamp, EntityId, Timestamp};
use super::status::AppointmentStatus;
use super::{or_not_registered, Entity, HasStatus, RESOURCE_APPOINTMENTS};
use crate::text::non_blank;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: EntityId,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub fecha: Option<Timestamp>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hora: Option<String>,
    #[serde(default)]
    pub estado: AppointmentStatus,
    #[serde(default, deserialize_with = "lenient_string")]
    pub motivo: Option<String>,
    #[serde(default, alias = "tipoLente", deserialize_with = "lenient_string")]
    pub tipo_lente: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub graduacion: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub notas: Option<String>,
    #[serde(default, alias = "clienteId", deserialize_with = "lenient_id")]
    pub cliente_id: Option<EntityId>,
    #[serde(default, alias = "createdAt", deserialize_with = "lenient_timestamp")]
    pub created_at: Option<Timestamp>,
}

impl Appointment {
    pub fn scheduled_at(&self) -> Option<NaiveDateTime> {
        self.fecha
            .as_ref()
            .and_then(|fecha| fecha.with_time(self.hora.as_deref()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppointmentInput {
    pub fecha: String,
    pub hora: String,
    pub motivo: String,
    #[serde(deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub tipo_lente: Option<String>,
    #[serde(deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub graduacion: Option<String>,
    #[serde(deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub notas: Option<String>,
    #[serde(deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub cliente_id: Option<EntityId>,
    #[serde(deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentDisplay {
    pub fecha: String,
    pub hora: String,
    pub estado: &'static str,
    pub motivo: String,
    pub tipo_lente: String,
    pub graduacion: String,
    pub notas: String,
}

impl Entity for Appointment {
    const RESOURCE: &'static str = RESOURCE_APPOINTMENTS;
    const NAME: &'static str = "cita";

    type Input = AppointmentInput;
    type Display = AppointmentDisplay;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn apply_input(&self, input: &AppointmentInput) -> Self {
        let mut next = self.clone();
        next.fecha = non_blank(Some(input.fecha.as_str())).map(Timestamp::parse);
        next.hora = non_blank(Some(input.hora.as_str())).map(str::to_string);
        next.motivo = non_blank(Some(input.motivo.as_str())).map(str::to_string);
        next.tipo_lente = input.tipo_lente.clone();
        next.graduacion = input.graduacion.clone();
        next.notas = input.notas.clone();
        if input.cliente_id.is_some() {
            next.cliente_id = input.cliente_id.clone();
        }
        if let Some(estado) = input.estado.as_deref() {
            next.estado = AppointmentStatus::from_raw(estado);
        }
        next
    }

    fn display(&self) -> AppointmentDisplay {
        AppointmentDisplay {
            fecha: self
                .fecha
                .as_ref()
                .and_then(Timestamp::at)
                .map(|at| at.format("%d/%m/%Y").to_string())
                .unwrap_or_else(|| or_not_registered(None)),
            hora: or_not_registered(self.hora.as_deref()),
            estado: self.estado.label(),
            motivo: or_not_registered(self.motivo.as_deref()),
            tipo_lente: or_not_registered(self.tipo_lente.as_deref()),
            graduacion: or_not_registered(self.graduacion.as_deref()),
            notas: non_blank(self.notas.as_deref())
                .unwrap_or("Sin notas")
                .to_string(),
        }
    }
}

impl HasStatus for Appointment {
    type Status = AppointmentStatus;

    fn current_status(&self) -> AppointmentStatus {
        self.estado
    }

    fn set_status(&mut self, status: AppointmentStatus) {
        self.estado = status;
    }
}
