use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{
    is_image_url, parse_time, AppointmentInput, AppointmentStatus, CategoryInput, ClientInput,
    EmployeeInput,
};
use crate::text::non_blank;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

pub trait Validate {
    const FIELDS: &'static [&'static str];

    fn check_field(&self, field: &str) -> Option<String>;

    fn knows_field(field: &str) -> bool {
        Self::FIELDS.contains(&field)
    }

    /// Single-field check, run when a form input loses focus.
    fn validate_field(&self, field: &str) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if let Some(message) = self.check_field(field) {
            errors.add(field, message);
        }
        errors.into_result()
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        for field in Self::FIELDS {
            if let Some(message) = self.check_field(field) {
                errors.add(field, message);
            }
        }
        errors.into_result()
    }
}

fn required(value: Option<&str>, message: &str) -> Option<String> {
    non_blank(value).is_none().then(|| message.to_string())
}

pub fn is_email(value: &str) -> bool {
    let value = value.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

pub fn is_phone(value: &str) -> bool {
    let digits: String = value
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '-'))
        .collect();
    digits.len() == 8 && digits.chars().all(|ch| ch.is_ascii_digit())
}

pub fn is_dui(value: &str) -> bool {
    let value = value.trim();
    let Some((number, check)) = value.split_once('-') else {
        return false;
    };
    number.len() == 8
        && check.len() == 1
        && number.chars().chain(check.chars()).all(|ch| ch.is_ascii_digit())
}

pub fn is_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").is_ok()
}

pub fn is_icon(value: &str) -> bool {
    let value = value.trim();
    is_image_url(value)
        || (!value.is_empty()
            && value
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_')))
}

fn check_name(value: &str, label: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return Some(format!("{label} es obligatorio"));
    }
    if value.chars().count() < 2 {
        return Some(format!("{label} debe tener al menos 2 caracteres"));
    }
    if value.chars().count() > 50 {
        return Some(format!("{label} no puede exceder 50 caracteres"));
    }
    None
}

fn check_phone(value: Option<&str>) -> Option<String> {
    match non_blank(value) {
        None => Some("El teléfono es obligatorio".to_string()),
        Some(phone) if !is_phone(phone) => Some("El teléfono debe tener 8 dígitos".to_string()),
        Some(_) => None,
    }
}

fn check_optional_email(value: Option<&str>) -> Option<String> {
    match non_blank(value) {
        Some(email) if !is_email(email) => Some("El correo electrónico no es válido".to_string()),
        _ => None,
    }
}

fn check_dui(value: Option<&str>, mandatory: bool) -> Option<String> {
    match non_blank(value) {
        None if mandatory => Some("El DUI es obligatorio".to_string()),
        None => None,
        Some(dui) if !is_dui(dui) => Some("El DUI debe tener el formato 00000000-0".to_string()),
        Some(_) => None,
    }
}

impl Validate for ClientInput {
    const FIELDS: &'static [&'static str] = &["nombre", "apellido", "edad", "dui", "telefono", "email"];

    fn check_field(&self, field: &str) -> Option<String> {
        match field {
            "nombre" => check_name(&self.nombre, "El nombre"),
            "apellido" => check_name(&self.apellido, "El apellido"),
            "edad" => self
                .edad
                .filter(|edad| *edad > 120)
                .map(|_| "La edad debe estar entre 0 y 120 años".to_string()),
            "dui" => check_dui(self.dui.as_deref(), false),
            "telefono" => check_phone(self.telefono.as_deref()),
            "email" => check_optional_email(self.email.as_deref()),
            _ => None,
        }
    }
}

impl Validate for EmployeeInput {
    const FIELDS: &'static [&'static str] = &[
        "nombre",
        "apellido",
        "dui",
        "telefono",
        "email",
        "cargo",
        "sucursal_id",
        "salario",
        "fecha_contratacion",
    ];

    fn check_field(&self, field: &str) -> Option<String> {
        match field {
            "nombre" => check_name(&self.nombre, "El nombre"),
            "apellido" => check_name(&self.apellido, "El apellido"),
            "dui" => check_dui(self.dui.as_deref(), true),
            "telefono" => check_phone(self.telefono.as_deref()),
            "email" => match non_blank(self.email.as_deref()) {
                None => Some("El correo electrónico es obligatorio".to_string()),
                Some(_) => check_optional_email(self.email.as_deref()),
            },
            "cargo" => required(Some(self.cargo.as_str()), "El cargo es obligatorio"),
            "sucursal_id" => self
                .sucursal_id
                .is_none()
                .then(|| "Selecciona una sucursal".to_string()),
            "salario" => match self.salario {
                None => Some("El salario es obligatorio".to_string()),
                Some(salario) if salario < 0.0 => Some("El salario no puede ser negativo".to_string()),
                Some(_) => None,
            },
            "fecha_contratacion" => match non_blank(self.fecha_contratacion.as_deref()) {
                Some(fecha) if !is_date(fecha) => {
                    Some("La fecha debe tener el formato AAAA-MM-DD".to_string())
                }
                _ => None,
            },
            _ => None,
        }
    }
}

impl Validate for CategoryInput {
    const FIELDS: &'static [&'static str] = &["nombre", "descripcion", "icono"];

    fn check_field(&self, field: &str) -> Option<String> {
        match field {
            "nombre" => check_name(&self.nombre, "El nombre"),
            "descripcion" => self
                .descripcion
                .as_deref()
                .filter(|descripcion| descripcion.chars().count() > 255)
                .map(|_| "La descripción no puede exceder 255 caracteres".to_string()),
            "icono" => match non_blank(self.icono.as_deref()) {
                Some(icono) if !is_icon(icono) => {
                    Some("El icono debe ser un nombre de icono o una URL de imagen".to_string())
                }
                _ => None,
            },
            _ => None,
        }
    }
}

impl Validate for AppointmentInput {
    const FIELDS: &'static [&'static str] = &["fecha", "hora", "motivo", "estado"];

    fn check_field(&self, field: &str) -> Option<String> {
        match field {
            "fecha" => match non_blank(Some(self.fecha.as_str())) {
                None => Some("La fecha es obligatoria".to_string()),
                Some(fecha) if !is_date(fecha) => {
                    Some("La fecha debe tener el formato AAAA-MM-DD".to_string())
                }
                Some(_) => None,
            },
            "hora" => match non_blank(Some(self.hora.as_str())) {
                None => Some("La hora es obligatoria".to_string()),
                Some(hora) if parse_time(hora).is_none() => {
                    Some("La hora debe tener el formato HH:MM".to_string())
                }
                Some(_) => None,
            },
            "motivo" => required(Some(self.motivo.as_str()), "El motivo es obligatorio"),
            "estado" => match non_blank(self.estado.as_deref()) {
                Some(estado) if AppointmentStatus::from_raw(estado) == AppointmentStatus::Unknown => {
                    Some("Estado de cita no reconocido".to_string())
                }
                _ => None,
            },
            _ => None,
        }
    }
}
