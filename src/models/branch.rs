use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::fields::{lenient_bool, EntityId};
use super::status::EntityStatus;
use crate::text::{canonical, non_blank};

pub const NO_BRANCH: &str = "Sin sucursal";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub id: EntityId,
    #[serde(default)]
    pub nombre: String,
    #[serde(default, alias = "activo", deserialize_with = "lenient_bool")]
    pub activa: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estado: Option<EntityStatus>,
}

impl Branch {
    pub fn is_active(&self) -> bool {
        match (self.activa, self.estado) {
            (Some(flag), _) => flag,
            (None, Some(status)) => status.is_active(),
            (None, None) => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BranchRef {
    Embedded {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<EntityId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        nombre: Option<String>,
    },
    Id(EntityId),
    Name(String),
}

impl BranchRef {
    pub fn id(&self) -> Option<&EntityId> {
        match self {
            Self::Embedded { id, .. } => id.as_ref(),
            Self::Id(id) => Some(id),
            Self::Name(_) => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Embedded { nombre, .. } => non_blank(nombre.as_deref()),
            Self::Id(_) => None,
            Self::Name(name) => non_blank(Some(name.as_str())),
        }
    }
}

pub fn lenient_branch_ref<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<BranchRef>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_i64().map(|id| BranchRef::Id(id.into())),
        Some(Value::String(text)) => {
            let text = text.trim();
            if text.is_empty() {
                None
            } else if let Ok(id) = text.parse::<i64>() {
                Some(BranchRef::Id(id.into()))
            } else {
                Some(BranchRef::Name(text.to_string()))
            }
        }
        Some(Value::Object(map)) => {
            let id = map
                .get("id")
                .or_else(|| map.get("_id"))
                .cloned()
                .and_then(|value| serde_json::from_value::<EntityId>(value).ok());
            let nombre = map
                .get("nombre")
                .and_then(Value::as_str)
                .map(str::to_string);
            Some(BranchRef::Embedded { id, nombre })
        }
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedBranch {
    pub id: Option<EntityId>,
    pub nombre: String,
    #[serde(skip)]
    pub key: String,
}

impl ResolvedBranch {
    pub fn new(id: Option<EntityId>, nombre: &str) -> Self {
        Self {
            id,
            nombre: nombre.trim().to_string(),
            key: canonical(nombre),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BranchDirectory {
    names: HashMap<EntityId, String>,
    inactive: HashSet<EntityId>,
}

impl BranchDirectory {
    pub fn new(branches: &[Branch]) -> Self {
        let mut directory = Self::default();
        for branch in branches {
            if !branch.is_active() {
                directory.inactive.insert(branch.id.clone());
                continue;
            }
            if let Some(name) = non_blank(Some(branch.nombre.as_str())) {
                directory.names.insert(branch.id.clone(), name.to_string());
            }
        }
        directory
    }

    pub fn is_inactive(&self, id: &EntityId) -> bool {
        self.inactive.contains(id)
    }

    pub fn name_of(&self, id: &EntityId) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn resolve(
        &self,
        branch_id: Option<&EntityId>,
        fallback_name: Option<&str>,
    ) -> Option<ResolvedBranch> {
        if let Some(id) = branch_id {
            if let Some(name) = self.name_of(id) {
                return Some(ResolvedBranch::new(Some(id.clone()), name));
            }
            // A closed branch never groups, whatever name the employee carries.
            if self.is_inactive(id) {
                return None;
            }
        }
        non_blank(fallback_name).map(|name| ResolvedBranch::new(branch_id.cloned(), name))
    }
}
