use serde::{Deserialize, Serialize};

use super::fields::{lenient_string, lenient_timestamp, EntityId, Timestamp};
use super::{or_not_registered, Entity, RESOURCE_CATEGORIES};
use crate::text::non_blank;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: EntityId,
    #[serde(default, deserialize_with = "lenient_string")]
    pub nombre: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub descripcion: Option<String>,
    #[serde(default, alias = "icon", deserialize_with = "lenient_string")]
    pub icono: Option<String>,
    #[serde(default, alias = "createdAt", deserialize_with = "lenient_timestamp")]
    pub created_at: Option<Timestamp>,
    #[serde(default, alias = "updatedAt", deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tipo", content = "valor", rename_all = "snake_case")]
pub enum IconKind {
    Imagen(String),
    Icono(String),
    Ninguno,
}

impl IconKind {
    pub fn classify(icono: Option<&str>) -> Self {
        match non_blank(icono) {
            None => Self::Ninguno,
            Some(value) if is_image_url(value) => Self::Imagen(value.to_string()),
            Some(value) => Self::Icono(value.to_string()),
        }
    }
}

pub fn is_image_url(value: &str) -> bool {
    let lower = value.to_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("file://")
        || lower.starts_with("data:image/")
}

impl Category {
    pub fn has_icon(&self) -> bool {
        non_blank(self.icono.as_deref()).is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryInput {
    pub nombre: String,
    #[serde(deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub icono: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryDisplay {
    pub nombre: String,
    pub descripcion: String,
    pub icono: IconKind,
}

impl Entity for Category {
    const RESOURCE: &'static str = RESOURCE_CATEGORIES;
    const NAME: &'static str = "categoria";

    type Input = CategoryInput;
    type Display = CategoryDisplay;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn apply_input(&self, input: &CategoryInput) -> Self {
        let mut next = self.clone();
        next.nombre = non_blank(Some(input.nombre.as_str())).map(str::to_string);
        next.descripcion = input.descripcion.clone();
        next.icono = input.icono.clone();
        next
    }

    fn display(&self) -> CategoryDisplay {
        CategoryDisplay {
            nombre: or_not_registered(self.nombre.as_deref()),
            descripcion: non_blank(self.descripcion.as_deref())
                .unwrap_or("Sin descripción")
                .to_string(),
            icono: IconKind::classify(self.icono.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_kinds() {
        assert_eq!(
            IconKind::classify(Some("https://cdn.example.com/lente.png")),
            IconKind::Imagen("https://cdn.example.com/lente.png".to_string())
        );
        assert_eq!(IconKind::classify(Some("glasses-outline")), IconKind::Icono("glasses-outline".to_string()));
        assert_eq!(IconKind::classify(Some("   ")), IconKind::Ninguno);
        assert_eq!(IconKind::classify(None), IconKind::Ninguno);
    }

    #[test]
    fn blank_icon_is_not_an_icon() {
        let category: Category = serde_json::from_str(r#"{"id": 1, "icono": ""}"#).unwrap();
        assert!(!category.has_icon());
        let category: Category = serde_json::from_str(r#"{"id": 1, "icon": "eye"}"#).unwrap();
        assert!(category.has_icon());
    }
}
