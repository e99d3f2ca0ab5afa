use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::state::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/status").route(web::get().to(status)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

#[derive(Serialize)]
struct MountedScreens {
    clientes: usize,
    empleados: usize,
    categorias: usize,
    citas: usize,
    asistencia: usize,
}

#[derive(Serialize)]
struct ServiceStatus<'a> {
    gateway: &'a str,
    screens: MountedScreens,
    subscribers: usize,
}

async fn status(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ServiceStatus {
        gateway: state.gateway.base_url(),
        screens: MountedScreens {
            clientes: state.clients.len(),
            empleados: state.employees.len(),
            categorias: state.categories.len(),
            citas: state.appointments.len(),
            asistencia: state.attendance.len(),
        },
        subscribers: state.events.receiver_count(),
    })
}
