use std::collections::HashSet;

use serde::Serialize;

use crate::models::{Appointment, AppointmentStatus, Category, Client, Employee};

pub fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as u32
}

pub trait Summarize: Sized {
    type Summary: Serialize;

    fn summarize(items: &[Self]) -> Self::Summary;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClientStats {
    pub total: usize,
    pub activos: usize,
    pub inactivos: usize,
    pub porcentaje_activos: u32,
    pub porcentaje_inactivos: u32,
}

impl Summarize for Client {
    type Summary = ClientStats;

    fn summarize(items: &[Self]) -> ClientStats {
        let total = items.len();
        let activos = items.iter().filter(|client| client.estado.is_active()).count();
        let inactivos = total - activos;
        ClientStats {
            total,
            activos,
            inactivos,
            porcentaje_activos: percentage(activos, total),
            porcentaje_inactivos: percentage(inactivos, total),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmployeeStats {
    pub total: usize,
    pub activos: usize,
    pub inactivos: usize,
    pub sucursales: usize,
    pub nomina: f64,
    pub porcentaje_activos: u32,
}

impl Summarize for Employee {
    type Summary = EmployeeStats;

    fn summarize(items: &[Self]) -> EmployeeStats {
        let mut activos = 0;
        let mut nomina = 0.0;
        let mut branches: HashSet<&str> = HashSet::new();
        for employee in items {
            if employee.estado.is_active() {
                activos += 1;
                nomina += employee.salario.unwrap_or(0.0).max(0.0);
            }
            if let Some(key) = employee.branch_key() {
                branches.insert(key);
            }
        }
        let total = items.len();
        EmployeeStats {
            total,
            activos,
            inactivos: total - activos,
            sucursales: branches.len(),
            nomina,
            porcentaje_activos: percentage(activos, total),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryStats {
    pub total: usize,
    pub con_icono: usize,
    pub sin_icono: usize,
    pub porcentaje_con_icono: u32,
    pub porcentaje_sin_icono: u32,
}

impl Summarize for Category {
    type Summary = CategoryStats;

    fn summarize(items: &[Self]) -> CategoryStats {
        let total = items.len();
        let con_icono = items.iter().filter(|category| category.has_icon()).count();
        let sin_icono = total - con_icono;
        CategoryStats {
            total,
            con_icono,
            sin_icono,
            porcentaje_con_icono: percentage(con_icono, total),
            porcentaje_sin_icono: percentage(sin_icono, total),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusBucket {
    pub cantidad: usize,
    pub porcentaje: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppointmentStats {
    pub total: usize,
    pub programadas: StatusBucket,
    pub pendientes: StatusBucket,
    pub confirmadas: StatusBucket,
    pub completadas: StatusBucket,
    pub canceladas: StatusBucket,
    pub sin_estado: StatusBucket,
}

impl AppointmentStats {
    pub fn bucket(&self, status: AppointmentStatus) -> StatusBucket {
        match status {
            AppointmentStatus::Scheduled => self.programadas,
            AppointmentStatus::Pending => self.pendientes,
            AppointmentStatus::Confirmed => self.confirmadas,
            AppointmentStatus::Completed => self.completadas,
            AppointmentStatus::Cancelled => self.canceladas,
            AppointmentStatus::Unknown => self.sin_estado,
        }
    }

    fn bucket_mut(&mut self, status: AppointmentStatus) -> &mut StatusBucket {
        match status {
            AppointmentStatus::Scheduled => &mut self.programadas,
            AppointmentStatus::Pending => &mut self.pendientes,
            AppointmentStatus::Confirmed => &mut self.confirmadas,
            AppointmentStatus::Completed => &mut self.completadas,
            AppointmentStatus::Cancelled => &mut self.canceladas,
            AppointmentStatus::Unknown => &mut self.sin_estado,
        }
    }

    pub fn bucket_sum(&self) -> usize {
        AppointmentStatus::KNOWN
            .iter()
            .map(|status| self.bucket(*status).cantidad)
            .sum::<usize>()
            + self.sin_estado.cantidad
    }
}

impl Summarize for Appointment {
    type Summary = AppointmentStats;

    fn summarize(items: &[Self]) -> AppointmentStats {
        let mut stats = AppointmentStats {
            total: items.len(),
            ..AppointmentStats::default()
        };
        for appointment in items {
            stats.bucket_mut(appointment.estado).cantidad += 1;
        }
        let total = stats.total;
        for status in AppointmentStatus::KNOWN
            .into_iter()
            .chain([AppointmentStatus::Unknown])
        {
            let bucket = stats.bucket_mut(status);
            bucket.porcentaje = percentage(bucket.cantidad, total);
        }
        stats
    }
}
