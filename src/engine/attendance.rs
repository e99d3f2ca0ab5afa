use std::collections::HashMap;

use serde::Serialize;

use crate::display::{role_style, RoleStyle};
use crate::models::{full_name, or_not_registered, Branch, BranchDirectory, Employee, EntityId, NO_BRANCH};
use crate::text::canonical;

use super::stats::percentage;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceEntry {
    pub id: EntityId,
    pub nombre: String,
    pub cargo: String,
    pub foto_perfil: Option<String>,
    pub rol: RoleStyle,
    pub disponible: bool,
}

impl AttendanceEntry {
    fn from_employee(employee: &Employee) -> Self {
        Self {
            id: employee.id.clone(),
            nombre: full_name(employee.nombre.as_deref(), employee.apellido.as_deref()),
            cargo: or_not_registered(employee.cargo.as_deref()),
            foto_perfil: employee.foto_perfil.clone(),
            rol: role_style(employee.cargo.as_deref()),
            disponible: employee.is_available(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchBucket {
    pub sucursal_id: Option<EntityId>,
    pub sucursal: String,
    pub empleados: Vec<AttendanceEntry>,
    pub disponibles: usize,
    pub no_disponibles: usize,
    pub total: usize,
}

impl BranchBucket {
    fn new(sucursal_id: Option<EntityId>, sucursal: String) -> Self {
        Self {
            sucursal_id,
            sucursal,
            empleados: Vec::new(),
            disponibles: 0,
            no_disponibles: 0,
            total: 0,
        }
    }

    fn push(&mut self, entry: AttendanceEntry) -> usize {
        if entry.disponible {
            self.disponibles += 1;
        } else {
            self.no_disponibles += 1;
        }
        self.total += 1;
        self.empleados.push(entry);
        self.empleados.len() - 1
    }

    pub fn is_consistent(&self) -> bool {
        self.disponibles + self.no_disponibles == self.total && self.total == self.empleados.len()
    }

    pub fn is_sentinel(&self) -> bool {
        self.sucursal_id.is_none() && self.sucursal == NO_BRANCH
    }
}

/// Query token that selects the "Sin sucursal" bucket.
pub const UNASSIGNED_TOKEN: &str = "sin_sucursal";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BranchSelector {
    #[default]
    All,
    Branch(EntityId),
    Unassigned,
}

impl BranchSelector {
    fn selects(&self, bucket: &BranchBucket) -> bool {
        match self {
            Self::All => true,
            Self::Branch(id) => bucket.sucursal_id.as_ref() == Some(id),
            Self::Unassigned => bucket.is_sentinel(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceFilter {
    pub sucursal: BranchSelector,
    pub disponible: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BucketView<'a> {
    pub sucursal_id: Option<&'a EntityId>,
    pub sucursal: &'a str,
    pub empleados: Vec<&'a AttendanceEntry>,
    pub disponibles: usize,
    pub no_disponibles: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceSummary {
    pub disponibles: usize,
    pub no_disponibles: usize,
    pub total: usize,
    pub porcentaje_disponibles: u32,
    pub sucursales: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceBoard {
    buckets: Vec<BranchBucket>,
    index: HashMap<EntityId, (usize, usize)>,
}

impl AttendanceBoard {
    /// Groups active employees by resolved branch; buckets appear in first-seen order.
    pub fn build(employees: &[Employee], branches: &[Branch]) -> Self {
        let directory = BranchDirectory::new(branches);
        let mut board = Self::default();
        let mut by_key: HashMap<String, usize> = HashMap::new();

        for employee in employees.iter().filter(|employee| employee.estado.is_active()) {
            if board.index.contains_key(&employee.id) {
                continue;
            }
            let (branch_id, branch_name) = match employee.resolve_with(&directory) {
                Some(resolved) => (resolved.id, resolved.nombre),
                None => (None, NO_BRANCH.to_string()),
            };
            let key = canonical(&branch_name);
            let slot = match by_key.get(&key) {
                Some(&slot) => {
                    let bucket = &mut board.buckets[slot];
                    if bucket.sucursal_id.is_none() && branch_id.is_some() {
                        bucket.sucursal_id = branch_id;
                    }
                    slot
                }
                None => {
                    board.buckets.push(BranchBucket::new(branch_id, branch_name));
                    by_key.insert(key, board.buckets.len() - 1);
                    board.buckets.len() - 1
                }
            };
            let position = board.buckets[slot].push(AttendanceEntry::from_employee(employee));
            board.index.insert(employee.id.clone(), (slot, position));
        }
        board
    }

    pub fn buckets(&self) -> &[BranchBucket] {
        &self.buckets
    }

    pub fn bucket_of(&self, employee_id: &EntityId) -> Option<&BranchBucket> {
        let (slot, _) = self.index.get(employee_id)?;
        self.buckets.get(*slot)
    }

    pub fn entry(&self, employee_id: &EntityId) -> Option<&AttendanceEntry> {
        let (slot, position) = self.index.get(employee_id)?;
        self.buckets.get(*slot)?.empleados.get(*position)
    }

    /// Flips one employee and moves only that bucket's counters. `None` when the id is not on the board.
    pub fn toggle(&mut self, employee_id: &EntityId) -> Option<bool> {
        let (slot, position) = *self.index.get(employee_id)?;
        let bucket = self.buckets.get_mut(slot)?;
        let entry = bucket.empleados.get_mut(position)?;
        entry.disponible = !entry.disponible;
        let disponible = entry.disponible;
        if disponible {
            bucket.disponibles += 1;
            bucket.no_disponibles = bucket.no_disponibles.saturating_sub(1);
        } else {
            bucket.no_disponibles += 1;
            bucket.disponibles = bucket.disponibles.saturating_sub(1);
        }
        debug_assert!(bucket.is_consistent());
        Some(disponible)
    }

    pub fn view(&self, filter: &AttendanceFilter) -> Vec<BucketView<'_>> {
        self.buckets
            .iter()
            .filter(|bucket| filter.sucursal.selects(bucket))
            .filter_map(|bucket| {
                let empleados: Vec<&AttendanceEntry> = bucket
                    .empleados
                    .iter()
                    .filter(|entry| filter.disponible.map_or(true, |flag| entry.disponible == flag))
                    .collect();
                if empleados.is_empty() {
                    return None;
                }
                let disponibles = empleados.iter().filter(|entry| entry.disponible).count();
                Some(BucketView {
                    sucursal_id: bucket.sucursal_id.as_ref(),
                    sucursal: &bucket.sucursal,
                    total: empleados.len(),
                    no_disponibles: empleados.len() - disponibles,
                    disponibles,
                    empleados,
                })
            })
            .collect()
    }

    pub fn summary(&self) -> AttendanceSummary {
        let mut summary = AttendanceSummary::default();
        for bucket in &self.buckets {
            summary.disponibles += bucket.disponibles;
            summary.no_disponibles += bucket.no_disponibles;
            summary.total += bucket.total;
            if !bucket.is_sentinel() {
                summary.sucursales += 1;
            }
        }
        summary.porcentaje_disponibles = percentage(summary.disponibles, summary.total);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employees(json: &str) -> Vec<Employee> {
        serde_json::from_str(json).unwrap()
    }

    fn branch(id: i64, nombre: &str, activa: bool) -> Branch {
        Branch {
            id: id.into(),
            nombre: nombre.to_string(),
            activa: Some(activa),
            estado: None,
        }
    }

    #[test]
    fn groups_and_toggles_centro_example() {
        let staff = employees(
            r#"[
                {"id": 1, "nombre": "Ana", "estado": "Activo", "sucursal": "Centro", "disponible": true},
                {"id": 2, "nombre": "Luis", "estado": "Activo", "sucursal": "Centro", "disponible": false}
            ]"#,
        );
        let mut board = AttendanceBoard::build(&staff, &[]);
        assert_eq!(board.buckets().len(), 1);
        let centro = &board.buckets()[0];
        assert_eq!(centro.sucursal, "Centro");
        assert_eq!((centro.total, centro.disponibles, centro.no_disponibles), (2, 1, 1));

        assert_eq!(board.toggle(&2.into()), Some(true));
        let centro = &board.buckets()[0];
        assert_eq!((centro.total, centro.disponibles, centro.no_disponibles), (2, 2, 0));
        assert!(centro.is_consistent());
    }

    #[test]
    fn branch_objects_win_and_missing_branch_uses_sentinel() {
        let staff = employees(
            r#"[
                {"id": 1, "estado": "activo", "sucursal": {"id": 10, "nombre": "Nombre viejo"}},
                {"id": 2, "estado": "activo", "sucursal_id": 11},
                {"id": 3, "estado": "activo"},
                {"id": 4, "estado": "inactivo", "sucursal_id": 10}
            ]"#,
        );
        let board = AttendanceBoard::build(
            &staff,
            &[branch(10, "Escalón", true), branch(11, "Merliot", false)],
        );
        let names: Vec<&str> = board.buckets().iter().map(|bucket| bucket.sucursal.as_str()).collect();
        assert_eq!(names, vec!["Escalón", NO_BRANCH]);
        assert_eq!(board.bucket_of(&2.into()).unwrap().sucursal, NO_BRANCH);
        assert!(board.entry(&4.into()).is_none());
        assert_eq!(board.summary().sucursales, 1);
    }

    #[test]
    fn missing_availability_is_available() {
        let staff = employees(r#"[{"id": 1, "estado": "activo", "sucursal": "Centro"}]"#);
        let board = AttendanceBoard::build(&staff, &[]);
        assert!(board.entry(&1.into()).unwrap().disponible);
    }

    #[test]
    fn toggle_unknown_id_is_a_no_op() {
        let staff = employees(r#"[{"id": 1, "estado": "activo", "sucursal": "Centro"}]"#);
        let mut board = AttendanceBoard::build(&staff, &[]);
        let before = board.clone();
        assert_eq!(board.toggle(&99.into()), None);
        assert_eq!(board, before);
    }

    #[test]
    fn toggle_leaves_other_buckets_untouched() {
        let staff = employees(
            r#"[
                {"id": 1, "estado": "activo", "sucursal": "Centro"},
                {"id": 2, "estado": "activo", "sucursal": "Escalón", "disponible": false},
                {"id": 3, "estado": "activo", "sucursal": "escalon"}
            ]"#,
        );
        let mut board = AttendanceBoard::build(&staff, &[]);
        assert_eq!(board.buckets().len(), 2);
        let centro_before = board.buckets()[0].clone();
        assert_eq!(board.toggle(&3.into()), Some(false));
        assert_eq!(board.buckets()[0], centro_before);
        let escalon = &board.buckets()[1];
        assert_eq!((escalon.disponibles, escalon.no_disponibles, escalon.total), (0, 2, 2));
    }

    #[test]
    fn filtered_view_recounts_and_drops_empty_buckets() {
        let staff = employees(
            r#"[
                {"id": 1, "estado": "activo", "sucursal_id": 10, "disponible": true},
                {"id": 2, "estado": "activo", "sucursal_id": 10, "disponible": false},
                {"id": 3, "estado": "activo", "sucursal_id": 20, "disponible": true}
            ]"#,
        );
        let board = AttendanceBoard::build(&staff, &[branch(10, "Centro", true), branch(20, "Soyapango", true)]);
        let before = board.clone();

        let unavailable = board.view(&AttendanceFilter {
            disponible: Some(false),
            ..AttendanceFilter::default()
        });
        assert_eq!(unavailable.len(), 1);
        assert_eq!(unavailable[0].sucursal, "Centro");
        assert_eq!((unavailable[0].total, unavailable[0].no_disponibles), (1, 1));

        let soyapango = board.view(&AttendanceFilter {
            sucursal: BranchSelector::Branch(20.into()),
            disponible: None,
        });
        assert_eq!(soyapango.len(), 1);
        assert_eq!(soyapango[0].disponibles, 1);

        assert_eq!(board, before);
        let summary = board.summary();
        assert_eq!((summary.disponibles, summary.no_disponibles, summary.total), (2, 1, 3));
        assert_eq!(summary.porcentaje_disponibles, 67);
        assert_eq!(summary.sucursales, 2);
    }

    #[test]
    fn mixed_branch_shapes_share_the_directory_id() {
        let staff = employees(
            r#"[
                {"id": 1, "estado": "activo", "sucursal": "Centro"},
                {"id": 2, "estado": "activo", "sucursal_id": 10}
            ]"#,
        );
        let board = AttendanceBoard::build(&staff, &[branch(10, "Centro", true)]);
        assert_eq!(board.buckets().len(), 1);
        assert_eq!(board.buckets()[0].sucursal_id, Some(10.into()));

        let centro = board.view(&AttendanceFilter {
            sucursal: BranchSelector::Branch(10.into()),
            disponible: None,
        });
        assert_eq!(centro.len(), 1);
        assert_eq!(centro[0].total, 2);
    }

    #[test]
    fn employees_of_closed_branches_fall_into_the_sentinel() {
        let staff = employees(
            r#"[
                {"id": 1, "estado": "activo", "sucursal": {"id": 11, "nombre": "Merliot"}},
                {"id": 2, "estado": "activo", "sucursal": "Centro"}
            ]"#,
        );
        let board = AttendanceBoard::build(&staff, &[branch(11, "Merliot", false)]);
        let names: Vec<&str> = board.buckets().iter().map(|bucket| bucket.sucursal.as_str()).collect();
        assert_eq!(names, vec![NO_BRANCH, "Centro"]);
        assert!(board.bucket_of(&1.into()).unwrap().is_sentinel());
        assert_eq!(board.summary().sucursales, 1);
    }

    #[test]
    fn unassigned_selector_picks_the_sentinel_bucket() {
        let staff = employees(
            r#"[
                {"id": 1, "estado": "activo"},
                {"id": 2, "estado": "activo", "sucursal": "Centro"}
            ]"#,
        );
        let board = AttendanceBoard::build(&staff, &[]);
        let unassigned = board.view(&AttendanceFilter {
            sucursal: BranchSelector::Unassigned,
            disponible: None,
        });
        assert_eq!(unassigned.len(), 1);
        assert_eq!(unassigned[0].sucursal, NO_BRANCH);
        assert_eq!(unassigned[0].empleados[0].id, EntityId::from(1));
    }
}
