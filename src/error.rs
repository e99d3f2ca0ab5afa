use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

use crate::validation::ValidationErrors;

pub const FALLBACK_MESSAGE: &str = "Ocurrió un error al procesar la solicitud";
const NETWORK_MESSAGE: &str = "No se pudo conectar con el servidor";

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway unreachable: {0}")]
    Network(#[from] reqwest::Error),
    #[error("gateway rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected gateway payload: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => NETWORK_MESSAGE.to_string(),
            Self::Rejected { message, .. } => message.clone(),
            Self::Decode(_) => FALLBACK_MESSAGE.to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Rejected { status, .. } if (400..500).contains(status) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("screen not mounted")]
    ScreenNotFound,
    #[error("{0} not found")]
    ItemNotFound(&'static str),
    #[error("invalid filter value: {0}")]
    InvalidFilter(String),
    #[error("invalid status: {0}")]
    InvalidStatus(String),
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("validation failed")]
    Validation(ValidationErrors),
    #[error("load failed: {0}")]
    Load(GatewayError),
    #[error(transparent)]
    Gateway(GatewayError),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<GatewayError> for ApiError {
    fn from(error: GatewayError) -> Self {
        Self::Gateway(error)
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: String,
    retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a ValidationErrors>,
}

impl ApiError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Load(error) if error.is_network())
    }

    fn message(&self) -> String {
        match self {
            Self::ScreenNotFound => "La pantalla no está abierta".to_string(),
            Self::ItemNotFound(name) => format!("No se encontró el {name}"),
            Self::InvalidFilter(value) => format!("Filtro no válido: {value}"),
            Self::InvalidStatus(value) => format!("Estado no válido: {value}"),
            Self::UnknownField(field) => format!("Campo desconocido: {field}"),
            Self::Validation(_) => "Revisa los campos del formulario".to_string(),
            Self::Load(error) | Self::Gateway(error) => error.user_message(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ScreenNotFound | Self::ItemNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidFilter(_) | Self::InvalidStatus(_) | Self::UnknownField(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Load(error) | Self::Gateway(error) => error.status(),
        }
    }

    fn error_response(&self) -> HttpResponse {
        let errors = match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        };
        HttpResponse::build(self.status_code()).json(ErrorBody {
            message: self.message(),
            retryable: self.is_retryable(),
            errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(status: u16) -> GatewayError {
        GatewayError::Rejected {
            status,
            message: "DUI ya registrado".to_string(),
        }
    }

    #[test]
    fn rejections_keep_server_message_and_client_status() {
        let error = ApiError::Gateway(rejected(409));
        assert_eq!(error.status_code(), StatusCode::CONFLICT);
        assert_eq!(error.message(), "DUI ya registrado");
        assert!(!error.is_retryable());

        let error = ApiError::Gateway(rejected(500));
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn decode_failures_are_not_retryable() {
        let error = ApiError::Load(GatewayError::Decode("expected array".to_string()));
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(error.message(), FALLBACK_MESSAGE);
        assert!(!error.is_retryable());
    }

    #[test]
    fn validation_maps_to_unprocessable() {
        let mut errors = ValidationErrors::default();
        errors.add("email", "El correo no es válido");
        let error = ApiError::from(errors);
        assert_eq!(error.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
