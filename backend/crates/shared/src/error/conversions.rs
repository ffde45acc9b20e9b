//! Error conversions - HTTP rendering of [`AppError`]
//!
//! Every failure is rendered as the service envelope:
//! `transaction_info`, `status_code`, `message` and `translation.en`.

#[cfg(feature = "axum")]
use super::app_error::AppError;

#[cfg(feature = "axum")]
impl AppError {
    /// Body of the error envelope.
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({
            "transaction_info": self.transaction_info(),
            "status_code": self.status_code(),
            "message": self.message(),
            "translation": { "en": self.translation().unwrap_or_else(|| self.message()) },
        })
    }
}

// ============================================================================
// Axum conversions (feature-gated)
// ============================================================================

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(self.to_body())).into_response()
    }
}

#[cfg(all(test, feature = "axum"))]
mod tests {
    use super::*;
    use crate::error::app_error::RequestInfo;
    use axum::response::IntoResponse;

    #[test]
    fn test_envelope_body() {
        let err = AppError::unauthorized("Akses tidak diijinkan! Silakan login kembali!")
            .with_translation("Access not authorized! Please login again!")
            .with_request(RequestInfo {
                request_uri: "/api/oauth2".into(),
                request_method: "POST".into(),
                request_id: "req-1".into(),
            });

        let body = err.to_body();
        assert_eq!(body["status_code"], 401);
        assert_eq!(body["transaction_info"]["error_code"], 401000);
        assert_eq!(body["transaction_info"]["request_uri"], "/api/oauth2");
        assert_eq!(
            body["translation"]["en"],
            "Access not authorized! Please login again!"
        );
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::not_found("Data tidak ditemukan!").into_response();
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    }
}
