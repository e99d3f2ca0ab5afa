use serde::{Deserialize, Serialize};

use super::branch::{lenient_branch_ref, BranchDirectory, BranchRef, ResolvedBranch};
use super::fields::{
    lenient_address, lenient_bool, lenient_decimal, lenient_id, lenient_string, lenient_timestamp,
    Address, EntityId, Timestamp,
};
use super::status::EntityStatus;
use super::{full_name, or_not_registered, Entity, HasStatus, NO_BRANCH, RESOURCE_EMPLOYEES};
use crate::display::{role_style, RoleStyle};
use crate::text::non_blank;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EntityId,
    #[serde(default, deserialize_with = "lenient_string")]
    pub nombre: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub apellido: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub dui: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub telefono: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_address")]
    pub direccion: Option<Address>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cargo: Option<String>,
    #[serde(default, deserialize_with = "lenient_branch_ref")]
    pub sucursal: Option<BranchRef>,
    #[serde(default, alias = "sucursalId", deserialize_with = "lenient_id")]
    pub sucursal_id: Option<EntityId>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub salario: Option<f64>,
    #[serde(default, alias = "fechaContratacion", deserialize_with = "lenient_timestamp")]
    pub fecha_contratacion: Option<Timestamp>,
    #[serde(default)]
    pub estado: EntityStatus,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub verificado: Option<bool>,
    #[serde(default, alias = "fotoPerfil", alias = "foto", deserialize_with = "lenient_string")]
    pub foto_perfil: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub disponible: Option<bool>,
    #[serde(default, alias = "createdAt", deserialize_with = "lenient_timestamp")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub sucursal_resuelta: Option<ResolvedBranch>,
}

impl Employee {
    pub fn branch_id(&self) -> Option<&EntityId> {
        self.sucursal_id
            .as_ref()
            .or_else(|| self.sucursal.as_ref().and_then(BranchRef::id))
    }

    pub fn is_available(&self) -> bool {
        self.disponible.unwrap_or(true)
    }

    pub fn branch(&self) -> Option<&ResolvedBranch> {
        self.sucursal_resuelta.as_ref()
    }

    pub fn branch_key(&self) -> Option<&str> {
        self.sucursal_resuelta
            .as_ref()
            .map(|branch| branch.key.as_str())
            .filter(|key| !key.is_empty())
    }

    pub fn resolve_with(&self, directory: &BranchDirectory) -> Option<ResolvedBranch> {
        directory.resolve(
            self.branch_id(),
            self.sucursal.as_ref().and_then(BranchRef::name),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeeInput {
    pub nombre: String,
    pub apellido: String,
    #[serde(deserialize_with = "lenient_string")]
    pub dui: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub telefono: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    pub cargo: String,
    #[serde(alias = "sucursalId", deserialize_with = "lenient_id")]
    pub sucursal_id: Option<EntityId>,
    #[serde(deserialize_with = "lenient_decimal")]
    pub salario: Option<f64>,
    #[serde(deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub fecha_contratacion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<EntityStatus>,
    #[serde(deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub foto_perfil: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployeeDisplay {
    pub nombre_completo: String,
    pub cargo: String,
    pub sucursal: String,
    pub telefono: String,
    pub email: String,
    pub direccion: String,
    pub salario: String,
    pub rol: RoleStyle,
    pub verificado: bool,
    pub disponible: bool,
}

impl Entity for Employee {
    const RESOURCE: &'static str = RESOURCE_EMPLOYEES;
    const NAME: &'static str = "empleado";
    const NEEDS_BRANCHES: bool = true;

    type Input = EmployeeInput;
    type Display = EmployeeDisplay;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn apply_input(&self, input: &EmployeeInput) -> Self {
        let mut next = self.clone();
        next.nombre = non_blank(Some(input.nombre.as_str())).map(str::to_string);
        next.apellido = non_blank(Some(input.apellido.as_str())).map(str::to_string);
        next.dui = input.dui.clone();
        next.telefono = input.telefono.clone();
        next.email = input.email.clone();
        next.direccion = input.direccion.clone().map(Address::Text);
        next.cargo = non_blank(Some(input.cargo.as_str())).map(str::to_string);
        if input.sucursal_id.is_some() && input.sucursal_id != self.branch_id().cloned() {
            next.sucursal_id = input.sucursal_id.clone();
            next.sucursal = input.sucursal_id.clone().map(BranchRef::Id);
            next.sucursal_resuelta = None;
        }
        next.salario = input.salario;
        if let Some(fecha) = input.fecha_contratacion.as_deref() {
            next.fecha_contratacion = Some(Timestamp::parse(fecha));
        }
        if let Some(estado) = input.estado {
            next.estado = estado;
        }
        if input.foto_perfil.is_some() {
            next.foto_perfil = input.foto_perfil.clone();
        }
        next
    }

    fn display(&self) -> EmployeeDisplay {
        EmployeeDisplay {
            nombre_completo: full_name(self.nombre.as_deref(), self.apellido.as_deref()),
            cargo: or_not_registered(self.cargo.as_deref()),
            sucursal: self
                .branch()
                .map(|branch| branch.nombre.clone())
                .unwrap_or_else(|| NO_BRANCH.to_string()),
            telefono: or_not_registered(self.telefono.as_deref()),
            email: or_not_registered(self.email.as_deref()),
            direccion: or_not_registered(
                self.direccion.as_ref().and_then(Address::display).as_deref(),
            ),
            salario: self
                .salario
                .map(|salario| format!("${salario:.2}"))
                .unwrap_or_else(|| or_not_registered(None)),
            rol: role_style(self.cargo.as_deref()),
            verificado: self.verificado.unwrap_or(false),
            disponible: self.is_available(),
        }
    }

    fn resolve_branches(&mut self, directory: &BranchDirectory) {
        self.sucursal_resuelta = self.resolve_with(directory);
    }
}

impl HasStatus for Employee {
    type Status = EntityStatus;

    fn current_status(&self) -> EntityStatus {
        self.estado
    }

    fn set_status(&mut self, status: EntityStatus) {
        self.estado = status;
    }
}
