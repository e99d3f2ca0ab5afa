use std::cmp::Reverse;

use chrono::NaiveDateTime;

use crate::models::{
    Appointment, AppointmentStatus, Category, Client, Employee, EntityStatus, NoStatus, StatusValue,
};
use crate::text::{canonical, contains_folded};

pub trait Filterable {
    type Status: StatusValue;

    /// `needle` is already trimmed and lower-cased.
    fn matches_text(&self, needle: &str) -> bool;

    fn phone(&self) -> Option<&str> {
        None
    }

    fn filter_status(&self) -> Option<Self::Status>;

    fn branch_key(&self) -> Option<&str> {
        None
    }

    fn sort_timestamp(&self) -> Option<NaiveDateTime>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    raw: String,
    needle: String,
}

impl SearchQuery {
    pub fn new(raw: &str) -> Self {
        let raw = raw.trim();
        Self {
            raw: raw.to_string(),
            needle: raw.to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn matches<T: Filterable>(&self, item: &T) -> bool {
        if self.is_empty() {
            return true;
        }
        item.matches_text(&self.needle)
            || item
                .phone()
                .is_some_and(|phone| phone.contains(self.raw.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter<S> {
    #[default]
    All,
    Only(S),
}

impl<S: StatusValue> StatusFilter<S> {
    /// Accepts `todos`/`todas`/`all` and singular or plural status tokens.
    pub fn parse(token: &str) -> Option<Self> {
        let token = canonical(token);
        if matches!(token.as_str(), "" | "todos" | "todas" | "all") {
            return Some(Self::All);
        }
        S::parse_value(&token)
            .or_else(|| token.strip_suffix('s').and_then(S::parse_value))
            .map(Self::Only)
    }

    pub fn matches(&self, status: Option<S>) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => status == Some(*expected),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BranchFilter {
    #[default]
    All,
    Only(String),
}

impl BranchFilter {
    pub fn parse(token: &str) -> Self {
        let token = canonical(token);
        if matches!(token.as_str(), "" | "todas" | "todos" | "all") {
            Self::All
        } else {
            Self::Only(token)
        }
    }

    pub fn matches(&self, branch_key: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => branch_key == Some(expected.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criteria<S> {
    pub search: SearchQuery,
    pub status: StatusFilter<S>,
    pub branch: BranchFilter,
}

impl<S> Default for Criteria<S> {
    fn default() -> Self {
        Self {
            search: SearchQuery::default(),
            status: StatusFilter::All,
            branch: BranchFilter::All,
        }
    }
}

impl<S: StatusValue> Criteria<S> {
    pub fn accepts<T: Filterable<Status = S>>(&self, item: &T) -> bool {
        self.status.matches(item.filter_status())
            && self.branch.matches(item.branch_key())
            && self.search.matches(item)
    }
}

pub fn filter_sort<'a, T: Filterable>(items: &'a [T], criteria: &Criteria<T::Status>) -> Vec<&'a T> {
    let mut view: Vec<&T> = items.iter().filter(|item| criteria.accepts(*item)).collect();
    sort_newest_first(&mut view);
    view
}

/// Stable: records with equal or missing timestamps keep their source order, missing ones last.
pub fn sort_newest_first<T: Filterable>(view: &mut [&T]) {
    view.sort_by_cached_key(|item| match item.sort_timestamp() {
        Some(at) => (false, Reverse(Some(at))),
        None => (true, Reverse(None)),
    });
}

impl Filterable for Client {
    type Status = EntityStatus;

    fn matches_text(&self, needle: &str) -> bool {
        [&self.nombre, &self.apellido, &self.dui, &self.email]
            .into_iter()
            .any(|field| contains_folded(field.as_deref(), needle))
    }

    fn phone(&self) -> Option<&str> {
        self.telefono.as_deref()
    }

    fn filter_status(&self) -> Option<EntityStatus> {
        Some(self.estado)
    }

    fn sort_timestamp(&self) -> Option<NaiveDateTime> {
        self.fecha_registro
            .as_ref()
            .and_then(|at| at.at())
            .or_else(|| self.created_at.as_ref().and_then(|at| at.at()))
    }
}

impl Filterable for Employee {
    type Status = EntityStatus;

    fn matches_text(&self, needle: &str) -> bool {
        [&self.nombre, &self.apellido, &self.dui, &self.email, &self.cargo]
            .into_iter()
            .any(|field| contains_folded(field.as_deref(), needle))
    }

    fn phone(&self) -> Option<&str> {
        self.telefono.as_deref()
    }

    fn filter_status(&self) -> Option<EntityStatus> {
        Some(self.estado)
    }

    fn branch_key(&self) -> Option<&str> {
        Employee::branch_key(self)
    }

    fn sort_timestamp(&self) -> Option<NaiveDateTime> {
        self.fecha_contratacion
            .as_ref()
            .and_then(|at| at.at())
            .or_else(|| self.created_at.as_ref().and_then(|at| at.at()))
    }
}

impl Filterable for Category {
    type Status = NoStatus;

    fn matches_text(&self, needle: &str) -> bool {
        [&self.nombre, &self.descripcion]
            .into_iter()
            .any(|field| contains_folded(field.as_deref(), needle))
    }

    fn filter_status(&self) -> Option<NoStatus> {
        None
    }

    fn sort_timestamp(&self) -> Option<NaiveDateTime> {
        self.created_at.as_ref().and_then(|at| at.at())
    }
}

impl Filterable for Appointment {
    type Status = AppointmentStatus;

    fn matches_text(&self, needle: &str) -> bool {
        [&self.motivo, &self.tipo_lente, &self.notas, &self.graduacion]
            .into_iter()
            .any(|field| contains_folded(field.as_deref(), needle))
    }

    fn filter_status(&self) -> Option<AppointmentStatus> {
        Some(self.estado)
    }

    fn sort_timestamp(&self) -> Option<NaiveDateTime> {
        self.scheduled_at()
            .or_else(|| self.created_at.as_ref().and_then(|at| at.at()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BranchDirectory, Entity};

    fn employee(json: &str) -> Employee {
        let mut employee: Employee = serde_json::from_str(json).unwrap();
        employee.resolve_branches(&BranchDirectory::default());
        employee
    }

    fn ids<T: Entity>(view: &[&T]) -> Vec<String> {
        view.iter().map(|item| item.id().to_string()).collect()
    }

    fn staff() -> Vec<Employee> {
        vec![
            employee(r#"{"id": 1, "nombre": "Ana", "cargo": "Vendedor", "estado": "Activo", "sucursal": "Escalón", "fecha_contratacion": "2022-01-10"}"#),
            employee(r#"{"id": 2, "nombre": "Luis", "cargo": "Optometrista", "estado": "Inactivo", "sucursal": "Centro", "fecha_contratacion": "2023-05-01", "telefono": 77889900}"#),
            employee(r#"{"id": 3, "nombre": "Marta", "apellido": "Anaya", "estado": "activo", "sucursal": "escalon", "created_at": "2024-02-01T08:00:00Z"}"#),
            employee(r#"{"id": 4, "nombre": "Pedro", "estado": "activo"}"#),
        ]
    }

    #[test]
    fn search_matches_any_configured_field() {
        let staff = staff();
        let criteria = Criteria {
            search: SearchQuery::new("  VEND "),
            ..Criteria::default()
        };
        assert_eq!(ids(&filter_sort(&staff, &criteria)), vec!["1"]);

        let criteria = Criteria {
            search: SearchQuery::new("AN"),
            ..Criteria::default()
        };
        assert_eq!(ids(&filter_sort(&staff, &criteria)), vec!["3", "1"]);
    }

    #[test]
    fn phone_is_matched_as_raw_substring() {
        let staff = staff();
        let criteria = Criteria {
            search: SearchQuery::new("8899"),
            ..Criteria::default()
        };
        assert_eq!(ids(&filter_sort(&staff, &criteria)), vec!["2"]);
    }

    #[test]
    fn blank_query_keeps_everything_sorted_newest_first() {
        let staff = staff();
        let criteria = Criteria {
            search: SearchQuery::new("   "),
            ..Criteria::default()
        };
        assert_eq!(ids(&filter_sort(&staff, &criteria)), vec!["3", "2", "1", "4"]);
    }

    #[test]
    fn branch_filter_is_accent_insensitive() {
        let staff = staff();
        let criteria = Criteria {
            branch: BranchFilter::parse("Escalón"),
            ..Criteria::default()
        };
        assert_eq!(ids(&filter_sort(&staff, &criteria)), vec!["3", "1"]);
        let criteria = Criteria {
            branch: BranchFilter::parse("ESCALON"),
            ..Criteria::default()
        };
        assert_eq!(ids(&filter_sort(&staff, &criteria)), vec!["3", "1"]);
    }

    #[test]
    fn filters_are_anded() {
        let staff = staff();
        let criteria = Criteria {
            search: SearchQuery::new("a"),
            status: StatusFilter::parse("activos").unwrap(),
            branch: BranchFilter::parse("escalon"),
        };
        assert_eq!(ids(&filter_sort(&staff, &criteria)), vec!["3", "1"]);
        let criteria = Criteria {
            status: StatusFilter::parse("inactivos").unwrap(),
            branch: BranchFilter::parse("escalon"),
            ..Criteria::default()
        };
        assert!(filter_sort(&staff, &criteria).is_empty());
    }

    #[test]
    fn status_tokens_parse() {
        assert_eq!(StatusFilter::<EntityStatus>::parse("Todos"), Some(StatusFilter::All));
        assert_eq!(
            StatusFilter::<EntityStatus>::parse("ACTIVOS"),
            Some(StatusFilter::Only(EntityStatus::Active))
        );
        assert_eq!(
            StatusFilter::<AppointmentStatus>::parse("completadas"),
            Some(StatusFilter::Only(AppointmentStatus::Completed))
        );
        assert_eq!(StatusFilter::<EntityStatus>::parse("quizas"), None);
        assert_eq!(StatusFilter::<NoStatus>::parse("todas"), Some(StatusFilter::All));
        assert_eq!(StatusFilter::<NoStatus>::parse("activas"), None);
    }

    #[test]
    fn source_is_untouched() {
        let staff = staff();
        let before = staff.clone();
        let _ = filter_sort(&staff, &Criteria::default());
        assert_eq!(staff, before);
    }

    #[test]
    fn appointments_sort_by_date_and_hour() {
        let appointments: Vec<Appointment> = serde_json::from_str(
            r#"[
                {"id": 1, "fecha": "2024-05-01", "hora": "09:00", "estado": "pendiente"},
                {"id": 2, "fecha": "2024-05-01", "hora": "15:00", "estado": "confirmada"},
                {"id": 3, "fecha": "2024-04-30", "hora": "18:00", "estado": "pendiente"},
                {"id": 4, "estado": "pendiente"}
            ]"#,
        )
        .unwrap();
        let view = filter_sort(&appointments, &Criteria::default());
        assert_eq!(ids(&view), vec!["2", "1", "3", "4"]);
        let criteria = Criteria {
            status: StatusFilter::parse("pendientes").unwrap(),
            ..Criteria::default()
        };
        assert_eq!(ids(&filter_sort(&appointments, &criteria)), vec!["1", "3", "4"]);
    }
}
