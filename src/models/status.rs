use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::text::canonical;

pub const STATUS_ACTIVE: &str = "activo";
pub const STATUS_INACTIVE: &str = "inactivo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntityStatus {
    Active,
    #[default]
    Inactive,
}

impl EntityStatus {
    pub fn from_raw(raw: &str) -> Self {
        match canonical(raw).as_str() {
            "activo" | "activa" | "active" | "1" | "true" => Self::Active,
            _ => Self::Inactive,
        }
    }

    pub fn parse_strict(raw: &str) -> Option<Self> {
        match canonical(raw).as_str() {
            "activo" | "activa" | "active" => Some(Self::Active),
            "inactivo" | "inactiva" | "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => STATUS_ACTIVE,
            Self::Inactive => STATUS_INACTIVE,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl Serialize for EntityStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntityStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(raw)) => Self::from_raw(&raw),
            Some(Value::Bool(true)) => Self::Active,
            Some(Value::Number(number)) if number.as_i64() == Some(1) => Self::Active,
            _ => Self::Inactive,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppointmentStatus {
    Scheduled,
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    #[default]
    Unknown,
}

impl AppointmentStatus {
    pub const KNOWN: [AppointmentStatus; 5] = [
        Self::Scheduled,
        Self::Pending,
        Self::Confirmed,
        Self::Completed,
        Self::Cancelled,
    ];

    pub fn from_raw(raw: &str) -> Self {
        match canonical(raw).as_str() {
            "programada" | "programado" | "agendada" | "agendado" | "scheduled" => Self::Scheduled,
            "pendiente" | "pending" => Self::Pending,
            "confirmada" | "confirmado" | "confirmed" => Self::Confirmed,
            "completada" | "completado" | "completed" => Self::Completed,
            "cancelada" | "cancelado" | "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "programada",
            Self::Pending => "pendiente",
            Self::Confirmed => "confirmada",
            Self::Completed => "completada",
            Self::Cancelled => "cancelada",
            Self::Unknown => "sin estado",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Scheduled => "Programada",
            Self::Pending => "Pendiente",
            Self::Confirmed => "Confirmada",
            Self::Completed => "Completada",
            Self::Cancelled => "Cancelada",
            Self::Unknown => "Sin estado",
        }
    }
}

impl Serialize for AppointmentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AppointmentStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(raw)) => Self::from_raw(&raw),
            _ => Self::Unknown,
        })
    }
}
