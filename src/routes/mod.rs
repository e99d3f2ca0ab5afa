pub mod attendance;
pub mod entities;
pub mod events;
pub mod public;

use actix_web::web;
use actix_web_httpauth::extractors::bearer;

use crate::auth::AUTH_REALM;
use crate::models::{Appointment, Category, Client, Employee};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(bearer::Config::default().realm(AUTH_REALM))
        .configure(public::configure)
        .configure(events::configure)
        .configure(entities::status_scope::<Client>)
        .configure(entities::status_scope::<Employee>)
        .configure(entities::scope::<Category>)
        .configure(entities::status_scope::<Appointment>)
        .configure(attendance::configure);
}
