use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GatewayError, FALLBACK_MESSAGE};
use crate::models::EntityId;

#[derive(Debug, Deserialize)]
struct Rejection {
    message: Option<String>,
    error: Option<String>,
}

#[derive(Serialize)]
struct StatusChange<'a> {
    estado: &'a str,
}

/// Client for the optical shop REST API. Cheap to clone; all clones share one connection pool.
#[derive(Clone, Debug)]
pub struct Gateway {
    client: reqwest::Client,
    base_url: String,
}

impl Gateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        self.client.request(method, url).bearer_auth(token)
    }

    /// Elements that fail to decode are skipped so one bad record cannot blank a screen.
    pub async fn list<T: DeserializeOwned>(
        &self,
        resource: &str,
        token: &str,
    ) -> Result<Vec<T>, GatewayError> {
        let response = self.request(Method::GET, resource, token).send().await?;
        let body = read_body(response).await?;
        let items = match unwrap_data(body) {
            Value::Array(items) => items,
            other => {
                return Err(GatewayError::Decode(format!(
                    "expected a list from /{resource}, got {}",
                    kind_of(&other)
                )))
            }
        };
        let total = items.len();
        let decoded: Vec<T> = items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value(item) {
                Ok(item) => Some(item),
                Err(err) => {
                    log::warn!("Skipping malformed /{resource} element {index}: {err}");
                    None
                }
            })
            .collect();
        log::debug!("Loaded {}/{} elements from /{resource}", decoded.len(), total);
        Ok(decoded)
    }

    pub async fn create<T, B>(&self, resource: &str, token: &str, body: &B) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .request(Method::POST, resource, token)
            .json(body)
            .send()
            .await?;
        let body = read_body(response).await?;
        serde_json::from_value(unwrap_data(body))
            .map_err(|err| GatewayError::Decode(format!("created /{resource} element: {err}")))
    }

    /// `Ok(None)` when the server accepted the change but returned no usable entity.
    pub async fn update<T, B>(
        &self,
        resource: &str,
        id: &EntityId,
        token: &str,
        body: &B,
    ) -> Result<Option<T>, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let path = format!("{resource}/{id}");
        let response = self.request(Method::PUT, &path, token).json(body).send().await?;
        Ok(decode_optional(&path, read_body(response).await?))
    }

    pub async fn set_status<T: DeserializeOwned>(
        &self,
        resource: &str,
        id: &EntityId,
        token: &str,
        estado: &str,
    ) -> Result<Option<T>, GatewayError> {
        let path = format!("{resource}/{id}/estado");
        let response = self
            .request(Method::PATCH, &path, token)
            .json(&StatusChange { estado })
            .send()
            .await?;
        Ok(decode_optional(&path, read_body(response).await?))
    }

    pub async fn delete(&self, resource: &str, id: &EntityId, token: &str) -> Result<(), GatewayError> {
        let path = format!("{resource}/{id}");
        let response = self.request(Method::DELETE, &path, token).send().await?;
        read_body(response).await.map(|_| ())
    }
}

async fn read_body(response: Response) -> Result<Value, GatewayError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    if !status.is_success() {
        let message = serde_json::from_slice::<Rejection>(&bytes)
            .ok()
            .and_then(|rejection| rejection.message.or(rejection.error))
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
        log::warn!("Gateway answered {status}: {message}");
        return Err(GatewayError::Rejected {
            status: status.as_u16(),
            message,
        });
    }
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes).map_err(|err| GatewayError::Decode(err.to_string()))
}

/// Accepts both bare payloads and `{"data": ...}` envelopes.
fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn decode_optional<T: DeserializeOwned>(path: &str, body: Value) -> Option<T> {
    let body = unwrap_data(body);
    if body.is_null() {
        return None;
    }
    match serde_json::from_value(body) {
        Ok(item) => Some(item),
        Err(err) => {
            log::warn!("Ignoring undecodable response from /{path}: {err}");
            None
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
