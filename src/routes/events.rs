use actix_web::{http::header, web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::{
    auth::bearer_validator,
    state::{AppState, StoreEvent},
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/events")
            .wrap(HttpAuthentication::bearer(bearer_validator))
            .route(web::get().to(stream_events)),
    );
}

#[derive(Deserialize)]
struct EventsQuery {
    entity: Option<String>,
}

async fn stream_events(state: web::Data<AppState>, query: web::Query<EventsQuery>) -> HttpResponse {
    let entity = query.into_inner().entity.filter(|entity| !entity.trim().is_empty());
    let rx = state.events.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let event = match result {
            Ok(event) => event,
            Err(err) => {
                log::warn!("SSE subscriber fell behind: {err}");
                return None;
            }
        };
        if entity.as_deref().is_some_and(|entity| entity != event.entity) {
            return None;
        }
        Some(Ok::<web::Bytes, actix_web::Error>(event_to_bytes(&event)))
    });

    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(stream)
}

fn event_to_bytes(event: &StoreEvent) -> web::Bytes {
    let payload = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    web::Bytes::from(format!("event: {}\ndata: {}\n\n", event.kind, payload))
}
