use serde::{Deserialize, Serialize};

use super::fields::{
    lenient_address, lenient_count, lenient_string, lenient_timestamp, Address, EntityId, Timestamp,
};
use super::status::EntityStatus;
use super::{full_name, or_not_registered, Entity, HasStatus, RESOURCE_CLIENTS};
use crate::text::non_blank;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: EntityId,
    #[serde(default, deserialize_with = "lenient_string")]
    pub nombre: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub apellido: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub edad: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub dui: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub telefono: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_address")]
    pub direccion: Option<Address>,
    #[serde(default)]
    pub estado: EntityStatus,
    #[serde(default, alias = "fechaRegistro", deserialize_with = "lenient_timestamp")]
    pub fecha_registro: Option<Timestamp>,
    #[serde(default, alias = "fechaActualizacion", deserialize_with = "lenient_timestamp")]
    pub fecha_actualizacion: Option<Timestamp>,
    #[serde(default, alias = "createdAt", deserialize_with = "lenient_timestamp")]
    pub created_at: Option<Timestamp>,
    #[serde(default, alias = "updatedAt", deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientInput {
    pub nombre: String,
    pub apellido: String,
    #[serde(deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub edad: Option<u32>,
    #[serde(deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub dui: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub telefono: Option<String>,
    #[serde(deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<EntityStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientDisplay {
    pub nombre_completo: String,
    pub dui: String,
    pub telefono: String,
    pub email: String,
    pub direccion: String,
    pub edad: String,
}

impl Entity for Client {
    const RESOURCE: &'static str = RESOURCE_CLIENTS;
    const NAME: &'static str = "cliente";

    type Input = ClientInput;
    type Display = ClientDisplay;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn apply_input(&self, input: &ClientInput) -> Self {
        let mut next = self.clone();
        next.nombre = non_blank(Some(input.nombre.as_str())).map(str::to_string);
        next.apellido = non_blank(Some(input.apellido.as_str())).map(str::to_string);
        next.edad = input.edad;
        next.dui = input.dui.clone();
        next.telefono = input.telefono.clone();
        next.email = input.email.clone();
        next.direccion = input.direccion.clone().map(Address::Text);
        if let Some(estado) = input.estado {
            next.estado = estado;
        }
        next
    }

    fn display(&self) -> ClientDisplay {
        ClientDisplay {
            nombre_completo: full_name(self.nombre.as_deref(), self.apellido.as_deref()),
            dui: or_not_registered(self.dui.as_deref()),
            telefono: or_not_registered(self.telefono.as_deref()),
            email: or_not_registered(self.email.as_deref()),
            direccion: or_not_registered(
                self.direccion.as_ref().and_then(Address::display).as_deref(),
            ),
            edad: self
                .edad
                .map(|edad| format!("{edad} años"))
                .unwrap_or_else(|| or_not_registered(None)),
        }
    }
}

impl HasStatus for Client {
    type Status = EntityStatus;

    fn current_status(&self) -> EntityStatus {
        self.estado
    }

    fn set_status(&mut self, status: EntityStatus) {
        self.estado = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_client_deserializes() {
        let client: Client = serde_json::from_str(r#"{"id": 4, "nombre": "Ana", "telefono": 70001234}"#).unwrap();
        assert_eq!(client.telefono.as_deref(), Some("70001234"));
        assert_eq!(client.estado, EntityStatus::Inactive);
        let display = client.display();
        assert_eq!(display.nombre_completo, "Ana");
        assert_eq!(display.email, "No registrado");
        assert_eq!(display.direccion, "No registrado");
    }

    #[test]
    fn structured_address_is_accepted() {
        let client: Client = serde_json::from_str(
            r#"{"id": "9", "estado": "Activo", "direccion": {"calle": "Av. Norte", "ciudad": "Santa Ana"}}"#,
        )
        .unwrap();
        assert_eq!(client.id, EntityId::Number(9));
        assert!(client.estado.is_active());
        assert_eq!(client.display().direccion, "Av. Norte, Santa Ana");
    }

    #[test]
    fn apply_input_keeps_identity_and_timestamps() {
        let client: Client = serde_json::from_str(
            r#"{"id": 1, "nombre": "Ana", "estado": "activo", "fecha_registro": "2024-01-01"}"#,
        )
        .unwrap();
        let input = ClientInput {
            nombre: " Ana María ".to_string(),
            apellido: "López".to_string(),
            ..ClientInput::default()
        };
        let next = client.apply_input(&input);
        assert_eq!(next.id, client.id);
        assert_eq!(next.nombre.as_deref(), Some("Ana María"));
        assert_eq!(next.estado, EntityStatus::Active);
        assert_eq!(next.fecha_registro, client.fecha_registro);
    }
}
