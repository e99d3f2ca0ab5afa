mod appointment;
mod branch;
mod category;
mod client;
mod employee;
mod fields;
mod status;

use serde::{de::DeserializeOwned, Serialize};

pub use appointment::{Appointment, AppointmentDisplay, AppointmentInput};
pub use branch::{lenient_branch_ref, Branch, BranchDirectory, BranchRef, ResolvedBranch, NO_BRANCH};
pub use category::{is_image_url, Category, CategoryDisplay, CategoryInput, IconKind};
pub use client::{Client, ClientDisplay, ClientInput};
pub use employee::{Employee, EmployeeDisplay, EmployeeInput};
pub use fields::{parse_time, Address, EntityId, Timestamp};
pub use status::{AppointmentStatus, EntityStatus, STATUS_ACTIVE, STATUS_INACTIVE};

use crate::validation::Validate;

pub const NOT_REGISTERED: &str = "No registrado";

pub const RESOURCE_CLIENTS: &str = "clientes";
pub const RESOURCE_EMPLOYEES: &str = "empleados";
pub const RESOURCE_CATEGORIES: &str = "categorias";
pub const RESOURCE_APPOINTMENTS: &str = "citas";
pub const RESOURCE_BRANCHES: &str = "sucursales";

pub trait Entity: Clone + PartialEq + Serialize + DeserializeOwned + Send + 'static {
    const RESOURCE: &'static str;
    const NAME: &'static str;
    const NEEDS_BRANCHES: bool = false;

    type Input: Validate + Serialize + DeserializeOwned + Send + 'static;
    type Display: Serialize;

    fn id(&self) -> &EntityId;

    /// Local copy of `self` with the form values applied, used for optimistic edits.
    fn apply_input(&self, input: &Self::Input) -> Self;

    fn display(&self) -> Self::Display;

    fn resolve_branches(&mut self, _directory: &BranchDirectory) {}
}

pub trait StatusValue: Copy + PartialEq + Send + 'static {
    fn token(&self) -> &'static str;
    fn parse_value(raw: &str) -> Option<Self>;

    /// Whether a status change may send this value to the backend.
    fn is_assignable(&self) -> bool {
        true
    }
}

pub trait HasStatus: Entity {
    type Status: StatusValue;

    fn current_status(&self) -> Self::Status;
    fn set_status(&mut self, status: Self::Status);
}

impl StatusValue for EntityStatus {
    fn token(&self) -> &'static str {
        self.as_str()
    }

    fn parse_value(raw: &str) -> Option<Self> {
        EntityStatus::parse_strict(raw)
    }
}

impl StatusValue for AppointmentStatus {
    fn token(&self) -> &'static str {
        self.as_str()
    }

    fn parse_value(raw: &str) -> Option<Self> {
        match AppointmentStatus::from_raw(raw) {
            AppointmentStatus::Unknown => match crate::text::canonical(raw).as_str() {
                "sin estado" | "unknown" => Some(AppointmentStatus::Unknown),
                _ => None,
            },
            status => Some(status),
        }
    }

    fn is_assignable(&self) -> bool {
        *self != AppointmentStatus::Unknown
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoStatus {}

impl StatusValue for NoStatus {
    fn token(&self) -> &'static str {
        match *self {}
    }

    fn parse_value(_raw: &str) -> Option<Self> {
        None
    }
}

pub fn or_not_registered(value: Option<&str>) -> String {
    crate::text::non_blank(value)
        .unwrap_or(NOT_REGISTERED)
        .to_string()
}

pub fn full_name(nombre: Option<&str>, apellido: Option<&str>) -> String {
    let parts: Vec<&str> = [nombre, apellido]
        .into_iter()
        .filter_map(crate::text::non_blank)
        .collect();
    if parts.is_empty() {
        NOT_REGISTERED.to_string()
    } else {
        parts.join(" ")
    }
}
