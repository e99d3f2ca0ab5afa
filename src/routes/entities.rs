use actix_web::{web, HttpResponse, HttpResponseBuilder};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{bearer_validator, Credentials},
    engine::Criteria,
    error::ApiError,
    models::{EntityId, HasStatus},
    screens::{self, lock, ItemView, ReloadOutcome, ScreenEntity, ViewQuery},
    state::AppState,
    validation::{Validate, ValidationErrors},
};

pub fn scope<T: ScreenEntity>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope(&format!("/{}", T::RESOURCE))
            .wrap(HttpAuthentication::bearer(bearer_validator))
            .configure(item_routes::<T>),
    );
}

pub fn status_scope<T: ScreenEntity + HasStatus>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope(&format!("/{}", T::RESOURCE))
            .wrap(HttpAuthentication::bearer(bearer_validator))
            .configure(item_routes::<T>)
            .service(
                web::resource("/screens/{sid}/items/{id}/estado")
                    .route(web::patch().to(change_item_status::<T>)),
            ),
    );
}

fn item_routes<T: ScreenEntity>(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/screens").route(web::post().to(mount_screen::<T>)))
        .service(
            web::resource("/screens/{sid}")
                .route(web::get().to(view_screen::<T>))
                .route(web::delete().to(unmount_screen::<T>)),
        )
        .service(web::resource("/screens/{sid}/reload").route(web::post().to(reload_screen::<T>)))
        .service(web::resource("/screens/{sid}/items").route(web::post().to(create_item::<T>)))
        .service(
            web::resource("/screens/{sid}/items/{id}")
                .route(web::put().to(update_item::<T>))
                .route(web::delete().to(delete_item::<T>)),
        )
        .service(web::resource("/validate").route(web::post().to(validate_form::<T>)));
}

fn render<T: ScreenEntity>(
    state: &AppState,
    screen_id: Uuid,
    criteria: &Criteria<T::Status>,
    mut response: HttpResponseBuilder,
) -> Result<HttpResponse, ApiError> {
    let screen = T::registry(state).get(&screen_id)?;
    let guard = lock(&screen);
    Ok(response.json(guard.view(screen_id, criteria)))
}

fn item_response<T: ScreenEntity>(item: &T, mut response: HttpResponseBuilder) -> HttpResponse {
    response.json(ItemView {
        item,
        display: item.display(),
    })
}

async fn mount_screen<T: ScreenEntity>(
    state: web::Data<AppState>,
    credentials: web::ReqData<Credentials>,
) -> Result<HttpResponse, ApiError> {
    let screen_id = screens::mount::<T>(&state, &credentials).await;
    render::<T>(&state, screen_id, &Criteria::default(), HttpResponse::Created())
}

async fn view_screen<T: ScreenEntity>(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<ViewQuery>,
) -> Result<HttpResponse, ApiError> {
    let criteria = query.criteria::<T>()?;
    render::<T>(&state, path.into_inner(), &criteria, HttpResponse::Ok())
}

async fn unmount_screen<T: ScreenEntity>(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let screen_id = path.into_inner();
    if !T::registry(&state).unmount(&screen_id) {
        return Err(ApiError::ScreenNotFound);
    }
    log::info!("Unmounted {} screen {screen_id}", T::RESOURCE);
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Serialize)]
struct ReloadResponse {
    outcome: ReloadOutcome,
}

async fn reload_screen<T: ScreenEntity>(
    state: web::Data<AppState>,
    credentials: web::ReqData<Credentials>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let outcome = screens::reload::<T>(&state, path.into_inner(), &credentials).await?;
    Ok(HttpResponse::Ok().json(ReloadResponse { outcome }))
}

async fn create_item<T: ScreenEntity>(
    state: web::Data<AppState>,
    credentials: web::ReqData<Credentials>,
    path: web::Path<Uuid>,
    input: web::Json<T::Input>,
) -> Result<HttpResponse, ApiError> {
    let created = screens::create::<T>(&state, path.into_inner(), &credentials, input.into_inner()).await?;
    Ok(item_response(&created, HttpResponse::Created()))
}

async fn update_item<T: ScreenEntity>(
    state: web::Data<AppState>,
    credentials: web::ReqData<Credentials>,
    path: web::Path<(Uuid, String)>,
    input: web::Json<T::Input>,
) -> Result<HttpResponse, ApiError> {
    let (screen_id, id) = path.into_inner();
    let id = EntityId::parse(&id);
    let updated = screens::update::<T>(&state, screen_id, &credentials, &id, input.into_inner()).await?;
    Ok(item_response(&updated, HttpResponse::Ok()))
}

#[derive(Deserialize)]
struct StatusForm {
    estado: String,
}

async fn change_item_status<T: ScreenEntity + HasStatus>(
    state: web::Data<AppState>,
    credentials: web::ReqData<Credentials>,
    path: web::Path<(Uuid, String)>,
    form: web::Json<StatusForm>,
) -> Result<HttpResponse, ApiError> {
    let (screen_id, id) = path.into_inner();
    let id = EntityId::parse(&id);
    let updated = screens::change_status::<T>(&state, screen_id, &credentials, &id, &form.estado).await?;
    Ok(item_response(&updated, HttpResponse::Ok()))
}

async fn delete_item<T: ScreenEntity>(
    state: web::Data<AppState>,
    credentials: web::ReqData<Credentials>,
    path: web::Path<(Uuid, String)>,
) -> Result<HttpResponse, ApiError> {
    let (screen_id, id) = path.into_inner();
    screens::delete::<T>(&state, screen_id, &credentials, &EntityId::parse(&id)).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Deserialize)]
struct ValidateQuery {
    field: Option<String>,
}

#[derive(Serialize)]
struct ValidationReport {
    valid: bool,
    errors: ValidationErrors,
}

async fn validate_form<T: ScreenEntity>(
    query: web::Query<ValidateQuery>,
    input: web::Json<T::Input>,
) -> Result<HttpResponse, ApiError> {
    let result = match query.field.as_deref().map(str::trim) {
        Some(field) if !field.is_empty() => {
            if !<T::Input as Validate>::knows_field(field) {
                return Err(ApiError::UnknownField(field.to_string()));
            }
            input.validate_field(field)
        }
        _ => input.validate(),
    };
    let errors = result.err().unwrap_or_default();
    Ok(HttpResponse::Ok().json(ValidationReport {
        valid: errors.is_empty(),
        errors,
    }))
}
