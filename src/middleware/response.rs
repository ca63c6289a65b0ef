use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

/// Success envelope: `{"success": true, "message", "code", "data"}`
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub message: &'static str,
    pub code: u16,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK
    pub fn success(data: T, message: &'static str, code: u16) -> Self {
        Self {
            data,
            message,
            code,
            status_code: None,
        }
    }

    pub fn with_status(data: T, message: &'static str, code: u16, status_code: StatusCode) -> Self {
        Self {
            data,
            message,
            code,
            status_code: Some(status_code),
        }
    }

    /// 201 Created
    pub fn created(data: T, message: &'static str, code: u16) -> Self {
        Self::with_status(data, message, code, StatusCode::CREATED)
    }
}

impl ApiResponse<()> {
    /// 200 with `"data": null`, for deletes and logout
    pub fn empty(message: &'static str, code: u16) -> Self {
        Self::success((), message, code)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "error": true,
                        "message": "Failed to serialize response data"
                    })),
                )
                    .into_response();
            }
        };

        let envelope = json!({
            "success": true,
            "message": self.message,
            "code": self.code,
            "data": data_value
        });

        (status, Json(envelope)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn envelope_carries_message_and_code() {
        let response = ApiResponse::created(json!({"id": 5}), "product created", 100).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["code"], 100);
        assert_eq!(value["message"], "product created");
        assert_eq!(value["data"]["id"], 5);
    }

    #[tokio::test]
    async fn empty_response_has_null_data() {
        let response = ApiResponse::empty("product deleted", 101).into_response();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(value["data"].is_null());
    }
}
