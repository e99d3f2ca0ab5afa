#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::{dev::ServerHandle, http::StatusCode, web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::{json, Value};

use optica_bff::gateway::Gateway;
use optica_bff::state::AppState;

pub const TOKEN: &str = "token-de-prueba";

#[derive(Clone, Debug)]
pub struct Call {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct Backend {
    collections: HashMap<String, Vec<Value>>,
    scripted: HashMap<String, (u16, Value, Option<Duration>)>,
    calls: Vec<Call>,
    next_id: i64,
    delay: Option<Duration>,
    wrap_lists: bool,
}

/// REST backend double served by a real actix server on an ephemeral port.
pub struct FakeGateway {
    pub url: String,
    backend: Arc<Mutex<Backend>>,
    handle: ServerHandle,
}

impl FakeGateway {
    pub async fn start() -> Self {
        let backend = Arc::new(Mutex::new(Backend {
            next_id: 100,
            ..Backend::default()
        }));
        let data = web::Data::from(Arc::clone(&backend));
        let server = HttpServer::new(move || App::new().app_data(data.clone()).default_service(web::to(handle)))
            .workers(1)
            .bind(("127.0.0.1", 0))
            .expect("bind fake gateway");
        let address = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        Self {
            url: format!("http://{address}/api"),
            backend,
            handle,
        }
    }

    pub fn seed(&self, resource: &str, items: Value) -> &Self {
        let items = match items {
            Value::Array(items) => items,
            other => vec![other],
        };
        self.backend.lock().unwrap().collections.insert(resource.to_string(), items);
        self
    }

    /// Answers `METHOD /path` with a fixed status and body until cleared.
    pub fn script(&self, method: &str, path: &str, status: u16, body: Value) -> &Self {
        self.script_inner(method, path, status, body, None)
    }

    /// Like `script`, but the answer is held back for `delay`.
    pub fn script_delayed(&self, method: &str, path: &str, status: u16, body: Value, delay: Duration) -> &Self {
        self.script_inner(method, path, status, body, Some(delay))
    }

    fn script_inner(&self, method: &str, path: &str, status: u16, body: Value, delay: Option<Duration>) -> &Self {
        self.backend
            .lock()
            .unwrap()
            .scripted
            .insert(format!("{method} {path}"), (status, body, delay));
        self
    }

    pub fn clear_scripts(&self) {
        self.backend.lock().unwrap().scripted.clear();
    }

    pub fn delay(&self, delay: Duration) {
        self.backend.lock().unwrap().delay = Some(delay);
    }

    pub fn wrap_lists(&self) {
        self.backend.lock().unwrap().wrap_lists = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.backend.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, method: &str, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.method == method && call.path == path)
            .count()
    }

    pub fn collection(&self, resource: &str) -> Vec<Value> {
        self.backend
            .lock()
            .unwrap()
            .collections
            .get(resource)
            .cloned()
            .unwrap_or_default()
    }

    pub fn state(&self) -> AppState {
        AppState::new(Gateway::new(&self.url, Duration::from_secs(5)).unwrap(), 16)
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

/// Gateway pointing at a port nothing listens on.
pub fn unreachable_state() -> AppState {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);
    AppState::new(
        Gateway::new(&format!("http://{address}/api"), Duration::from_secs(2)).unwrap(),
        16,
    )
}

fn same_id(item: &Value, id: &str) -> bool {
    match &item["id"] {
        Value::Number(number) => number.to_string() == id,
        Value::String(text) => text == id,
        _ => false,
    }
}

async fn handle(req: HttpRequest, body: web::Bytes, backend: web::Data<Mutex<Backend>>) -> HttpResponse {
    let method = req.method().to_string();
    let path = req.path().trim_start_matches("/api").to_string();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let key = format!("{method} {path}");
    let delay = {
        let mut backend = backend.lock().unwrap();
        backend.calls.push(Call {
            method: method.clone(),
            path: path.clone(),
            authorization: req
                .headers()
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
            body: body.clone(),
        });
        backend
            .scripted
            .get(&key)
            .and_then(|(_, _, delay)| *delay)
            .or(backend.delay)
    };
    if let Some(delay) = delay {
        actix_web::rt::time::sleep(delay).await;
    }

    let mut backend = backend.lock().unwrap();
    if let Some((status, payload, _)) = backend.scripted.get(&key).cloned() {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return HttpResponse::build(status).json(payload);
    }

    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match (method.as_str(), segments.as_slice()) {
        ("GET", [resource]) => {
            let items = backend.collections.get(*resource).cloned().unwrap_or_default();
            if backend.wrap_lists {
                HttpResponse::Ok().json(json!({ "data": items }))
            } else {
                HttpResponse::Ok().json(items)
            }
        }
        ("POST", [resource]) => {
            backend.next_id += 1;
            let mut item = body;
            item["id"] = json!(backend.next_id);
            backend
                .collections
                .entry(resource.to_string())
                .or_default()
                .push(item.clone());
            HttpResponse::Created().json(json!({ "data": item }))
        }
        ("PUT", [resource, id]) => {
            let items = backend.collections.entry(resource.to_string()).or_default();
            match items.iter_mut().find(|item| same_id(item, id)) {
                Some(item) => {
                    if let (Value::Object(target), Value::Object(patch)) = (item, body) {
                        target.extend(patch);
                    }
                    let item = items.iter().find(|item| same_id(item, id)).cloned();
                    HttpResponse::Ok().json(item)
                }
                None => HttpResponse::NotFound().json(json!({ "message": "Registro no encontrado" })),
            }
        }
        ("PATCH", [resource, id, "estado"]) => {
            let items = backend.collections.entry(resource.to_string()).or_default();
            match items.iter_mut().find(|item| same_id(item, id)) {
                Some(item) => {
                    item["estado"] = body["estado"].clone();
                    HttpResponse::Ok().json(item.clone())
                }
                None => HttpResponse::NotFound().json(json!({ "message": "Registro no encontrado" })),
            }
        }
        ("DELETE", [resource, id]) => {
            let items = backend.collections.entry(resource.to_string()).or_default();
            let before = items.len();
            items.retain(|item| !same_id(item, id));
            if items.len() < before {
                HttpResponse::NoContent().finish()
            } else {
                HttpResponse::NotFound().json(json!({ "message": "Registro no encontrado" }))
            }
        }
        _ => HttpResponse::NotFound().finish(),
    }
}
