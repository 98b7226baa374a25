//! Authentication API handlers.
//!
//! ```text
//! POST /api/v1/auth/register {"email":"a@b.c","password":"hunter22","displayName":"Ada"}
//! POST /api/v1/auth/login {"email":"a@b.c","password":"hunter22"}
//! POST /api/v1/auth/logout
//! POST /api/v1/auth/password-reset {"email":"a@b.c"}
//! POST /api/v1/auth/password-reset/confirm {"token":"...","newPassword":"..."}
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{
    AuthValidationError, EmailAddress, Error, LoginCredentials, PasswordResetConfirmation,
    Registration,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::{UserResponse, map_user_validation_error};

/// Registration request body for `POST /api/v1/auth/register`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub password: String,
    #[schema(example = "Ada Lovelace")]
    pub display_name: String,
}

/// Login request body for `POST /api/v1/auth/login`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub password: String,
}

/// Body for `POST /api/v1/auth/password-reset`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Body for `POST /api/v1/auth/password-reset/confirm`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetConfirmRequest {
    pub token: String,
    pub new_password: String,
}

impl TryFrom<RegisterRequest> for Registration {
    type Error = AuthValidationError;

    fn try_from(value: RegisterRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password, &value.display_name)
    }
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = AuthValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password)
    }
}

pub(crate) fn map_auth_validation_error(err: AuthValidationError) -> Error {
    let (field, code) = match &err {
        AuthValidationError::InvalidEmail => ("email", "invalid_email"),
        AuthValidationError::EmptyPassword => ("password", "empty_password"),
        AuthValidationError::WeakPassword { .. } => ("password", "weak_password"),
        AuthValidationError::EmptyResetToken => ("token", "empty_token"),
        AuthValidationError::DisplayName(inner) => {
            return map_user_validation_error(inner.clone());
        }
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

/// Create an account and sign it in.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already in use", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration =
        Registration::try_from(payload.into_inner()).map_err(map_auth_validation_error)?;
    let account = state.auth.register(registration).await?;
    session.sign_in(account.id())?;
    Ok(HttpResponse::Created().json(UserResponse::from(account)))
}

/// Authenticate and establish a session.
///
/// Unknown emails and wrong passwords produce the same `401` so callers
/// cannot discover which accounts exist.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = UserResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_auth_validation_error)?;
    let account = state.auth.login(credentials).await?;
    session.sign_in(account.id())?;
    Ok(HttpResponse::Ok().json(UserResponse::from(account)))
}

/// End the current session. Succeeds whether or not one exists.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses((status = 204, description = "Signed out")),
    tags = ["auth"],
    operation_id = "logout",
    security([])
)]
#[post("/auth/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.sign_out();
    HttpResponse::NoContent().finish()
}

/// Request a password reset token.
///
/// Always answers `202 Accepted` for a well-formed email, whether or not an
/// account exists.
#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 202, description = "Reset requested"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "requestPasswordReset",
    security([])
)]
#[post("/auth/password-reset")]
pub async fn request_password_reset(
    state: web::Data<HttpState>,
    payload: web::Json<PasswordResetRequest>,
) -> ApiResult<HttpResponse> {
    let email = EmailAddress::new(&payload.email)
        .map_err(|_| map_auth_validation_error(AuthValidationError::InvalidEmail))?;
    state.auth.request_password_reset(&email).await?;
    Ok(HttpResponse::Accepted().finish())
}

/// Set a new password using a reset token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset/confirm",
    request_body = PasswordResetConfirmRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Invalid request or token", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "confirmPasswordReset",
    security([])
)]
#[post("/auth/password-reset/confirm")]
pub async fn confirm_password_reset(
    state: web::Data<HttpState>,
    payload: web::Json<PasswordResetConfirmRequest>,
) -> ApiResult<HttpResponse> {
    let confirmation =
        PasswordResetConfirmation::try_from_parts(&payload.token, &payload.new_password)
            .map_err(map_auth_validation_error)?;
    state.auth.confirm_password_reset(confirmation).await?;
    Ok(HttpResponse::NoContent().finish())
}
