use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;
use utoipa::ToSchema;

/// Success envelope shared by every endpoint. Errors use the matching shape
/// produced by `AppError::error_response`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

pub fn success<T: Serialize>(message: impl Into<String>, data: T) -> HttpResponse {
    success_with_status(StatusCode::OK, message, data)
}

pub fn success_with_status<T: Serialize>(
    status: StatusCode,
    message: impl Into<String>,
    data: T,
) -> HttpResponse {
    HttpResponse::build(status).json(ApiResponse {
        success: true,
        message: message.into(),
        data,
    })
}
