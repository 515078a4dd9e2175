use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("{0}")]
    Invalid(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl DirectoryError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        let status = match err {
            DirectoryError::NotFound { .. } => StatusCode::NOT_FOUND,
            DirectoryError::Invalid(_) => StatusCode::BAD_REQUEST,
            DirectoryError::Storage(_) | DirectoryError::Encoding(_) => return Self::internal(err),
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_errors_map_to_status() {
        let missing: AppError = DirectoryError::not_found("business", "b9").into();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.message, "business 'b9' not found");

        let invalid: AppError = DirectoryError::invalid("name must not be empty").into();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let storage: AppError = DirectoryError::from(io).into();
        assert_eq!(storage.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
