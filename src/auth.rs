use actix_web::{dev::ServiceRequest, error::ErrorUnauthorized, Error, HttpMessage};
use actix_web_httpauth::extractors::bearer::BearerAuth;

pub const AUTH_REALM: &str = "Optica";

/// Caller session token, forwarded untouched to the gateway.
#[derive(Clone)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("token", &"***").finish()
    }
}

pub async fn bearer_validator(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let token = credentials.token().trim();
    if token.is_empty() {
        log::warn!("Rejected request to {} with an empty bearer token", req.path());
        return Err((ErrorUnauthorized("Unauthorized"), req));
    }
    req.extensions_mut().insert(Credentials::new(token));
    Ok(req)
}
