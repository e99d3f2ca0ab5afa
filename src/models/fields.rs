use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl EntityId {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(number) => Self::Number(number),
            Err(_) => Self::Text(raw.to_string()),
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Number(number) => number
                .as_i64()
                .map(Self::Number)
                .or_else(|| Some(Self::Text(number.to_string()))),
            Value::String(text) if !text.trim().is_empty() => Some(Self::parse(&text)),
            _ => None,
        }
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(number) => serializer.serialize_i64(*number),
            Self::Text(text) => serializer.serialize_str(text),
        }
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).ok_or_else(|| serde::de::Error::custom("id must be a number or a string"))
    }
}

pub fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<EntityId>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(EntityId::from_value))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    raw: String,
    at: Option<NaiveDateTime>,
}

impl Timestamp {
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            at: parse_datetime(raw.trim()),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn at(&self) -> Option<NaiveDateTime> {
        self.at
    }

    pub fn with_time(&self, time: Option<&str>) -> Option<NaiveDateTime> {
        let at = self.at?;
        match time.and_then(parse_time) {
            Some(time) => Some(at.date().and_time(time)),
            None => Some(at),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

pub fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Timestamp>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(raw)) if !raw.trim().is_empty() => Some(Timestamp::parse(&raw)),
        Some(Value::Number(millis)) => millis.as_i64().and_then(|millis| {
            DateTime::<Utc>::from_timestamp_millis(millis).map(|at| Timestamp {
                raw: at.to_rfc3339(),
                at: Some(at.naive_utc()),
            })
        }),
        _ => None,
    })
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.naive_utc());
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(at) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(at);
        }
    }
    for format in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

pub fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        _ => None,
    })
}

pub fn lenient_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
    .filter(|amount| amount.is_finite()))
}

pub fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(text)) => text.trim().parse::<u32>().ok(),
        _ => None,
    })
}

pub fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(flag)) => Some(flag),
        Some(Value::Number(number)) => number.as_i64().map(|n| n != 0),
        Some(Value::String(text)) => match text.trim().to_lowercase().as_str() {
            "true" | "1" | "si" | "sí" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Address {
    Structured {
        #[serde(skip_serializing_if = "Option::is_none")]
        calle: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        ciudad: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        departamento: Option<String>,
    },
    Text(String),
}

impl Address {
    pub fn display(&self) -> Option<String> {
        match self {
            Self::Text(text) => crate::text::non_blank(Some(text.as_str())).map(str::to_string),
            Self::Structured {
                calle,
                ciudad,
                departamento,
            } => {
                let parts: Vec<&str> = [calle, ciudad, departamento]
                    .into_iter()
                    .filter_map(|part| crate::text::non_blank(part.as_deref()))
                    .collect();
                (!parts.is_empty()).then(|| parts.join(", "))
            }
        }
    }
}

pub fn lenient_address<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Address>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(Address::Text(text)),
        Some(Value::Object(map)) => {
            let field = |name: &str| {
                map.get(name)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            };
            Some(Address::Structured {
                calle: field("calle"),
                ciudad: field("ciudad"),
                departamento: field("departamento"),
            })
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_strings_become_numeric_ids() {
        let id: EntityId = serde_json::from_str("\"12\"").unwrap();
        assert_eq!(id, EntityId::Number(12));
        let id: EntityId = serde_json::from_str("\"abc-1\"").unwrap();
        assert_eq!(id, EntityId::Text("abc-1".to_string()));
    }

    #[test]
    fn timestamps_accept_common_shapes() {
        assert!(Timestamp::parse("2024-03-01T10:00:00.000Z").at().is_some());
        assert!(Timestamp::parse("2024-03-01 10:00:00").at().is_some());
        assert!(Timestamp::parse("2024-03-01").at().is_some());
        assert!(Timestamp::parse("01/03/2024").at().is_some());
        assert!(Timestamp::parse("ayer").at().is_none());
    }

    #[test]
    fn with_time_combines_date_and_hour() {
        let date = Timestamp::parse("2024-03-01");
        let combined = date.with_time(Some("14:30")).unwrap();
        assert_eq!(combined.format("%Y-%m-%d %H:%M").to_string(), "2024-03-01 14:30");
        assert_eq!(date.with_time(Some("tarde")), date.at());
    }

    #[test]
    fn structured_address_joins_present_parts() {
        let address = Address::Structured {
            calle: Some("Calle 5".to_string()),
            ciudad: None,
            departamento: Some("San Salvador".to_string()),
        };
        assert_eq!(address.display().as_deref(), Some("Calle 5, San Salvador"));
    }
}
