// HTTP handlers for authentication endpoints

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::auth::{
    middleware::CurrentUser,
    models::{
        ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse,
        RegisterRequest, RegisterResponse, ResetPasswordRequest,
    },
};
use crate::error::{ApiError, AppJson};
use crate::AppState;

const RESET_REQUESTED_MESSAGE: &str = "If the email exists, a reset link will be sent";

/// Register a new user
/// POST /auth/register
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Invalid input data"),
        (status = 409, description = "Email already registered")
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    request.validate()?;

    let user_id = state.auth_service.register(request).await?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id })))
}

/// Exchange credentials for a bearer token
/// POST /auth/login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid email or password")
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let response = state
        .auth_service
        .authenticate(&request.email, &request.password)
        .await?;
    Ok(Json(response))
}

/// Stateless logout; the client discards its token
/// POST /auth/logout
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 200, description = "Logged out", body = MessageResponse)),
    tag = "auth"
)]
pub async fn logout_handler() -> Json<MessageResponse> {
    Json(MessageResponse::new("Logged out successfully"))
}

/// Start a password reset
/// POST /auth/forgot-password
///
/// Answers identically whether or not the email is registered.
#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses((status = 200, description = "Reset requested", body = MessageResponse)),
    tag = "auth"
)]
pub async fn forgot_password_handler(
    State(state): State<AppState>,
    AppJson(request): AppJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;

    let token = state.auth_service.request_password_reset(&request.email).await?;

    let mut response = MessageResponse::new(RESET_REQUESTED_MESSAGE);
    if state.config.expose_reset_token {
        response.token = token;
    }
    Ok(Json(response))
}

/// Redeem a reset token
/// POST /auth/reset-password
#[utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Invalid or expired reset token")
    ),
    tag = "auth"
)]
pub async fn reset_password_handler(
    State(state): State<AppState>,
    AppJson(request): AppJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;

    state
        .auth_service
        .reset_password(&request.token, &request.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password has been reset successfully")))
}

/// Change the caller's password
/// POST /auth/change-password
#[utoipa::path(
    post,
    path = "/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Incorrect old password"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn change_password_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    AppJson(request): AppJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;

    state
        .auth_service
        .change_password(&current.user, &request.old_password, &request.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password updated successfully")))
}
