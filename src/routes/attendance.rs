use actix_web::{web, HttpResponse, HttpResponseBuilder};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    auth::{bearer_validator, Credentials},
    engine::AttendanceFilter,
    error::ApiError,
    models::EntityId,
    screens::{self, lock, AttendanceQuery, ReloadOutcome},
    state::{AppState, ATTENDANCE},
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope(&format!("/{ATTENDANCE}"))
            .wrap(HttpAuthentication::bearer(bearer_validator))
            .service(web::resource("/screens").route(web::post().to(mount_screen)))
            .service(
                web::resource("/screens/{sid}")
                    .route(web::get().to(view_screen))
                    .route(web::delete().to(unmount_screen)),
            )
            .service(web::resource("/screens/{sid}/reload").route(web::post().to(reload_screen)))
            .service(
                web::resource("/screens/{sid}/empleados/{id}/toggle")
                    .route(web::post().to(toggle_employee)),
            ),
    );
}

fn render(
    state: &AppState,
    screen_id: Uuid,
    filter: &AttendanceFilter,
    mut response: HttpResponseBuilder,
) -> Result<HttpResponse, ApiError> {
    let screen = state.attendance.get(&screen_id)?;
    let guard = lock(&screen);
    Ok(response.json(guard.view(screen_id, filter)))
}

async fn mount_screen(
    state: web::Data<AppState>,
    credentials: web::ReqData<Credentials>,
) -> Result<HttpResponse, ApiError> {
    let screen_id = screens::mount_attendance(&state, &credentials).await;
    render(&state, screen_id, &AttendanceFilter::default(), HttpResponse::Created())
}

async fn view_screen(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<AttendanceQuery>,
) -> Result<HttpResponse, ApiError> {
    let filter = query.filter()?;
    render(&state, path.into_inner(), &filter, HttpResponse::Ok())
}

async fn unmount_screen(state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, ApiError> {
    let screen_id = path.into_inner();
    if !state.attendance.unmount(&screen_id) {
        return Err(ApiError::ScreenNotFound);
    }
    log::info!("Unmounted {ATTENDANCE} screen {screen_id}");
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Serialize)]
struct ReloadResponse {
    outcome: ReloadOutcome,
}

async fn reload_screen(
    state: web::Data<AppState>,
    credentials: web::ReqData<Credentials>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let outcome = screens::reload_attendance(&state, path.into_inner(), &credentials).await?;
    Ok(HttpResponse::Ok().json(ReloadResponse { outcome }))
}

async fn toggle_employee(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, String)>,
) -> Result<HttpResponse, ApiError> {
    let (screen_id, id) = path.into_inner();
    let outcome = screens::toggle_attendance(&state, screen_id, &EntityId::parse(&id))?;
    Ok(HttpResponse::Ok().json(outcome))
}
