//! Account lifecycle handlers: signup, login and logout.
//!
//! ```text
//! POST /api/v1/signup {"nickname":"Night Owl","email":"owl@example.com","password":"..."}
//! POST /api/v1/login {"email":"owl@example.com","password":"..."}
//! POST /api/v1/logout
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Age, Email, Error, Gender, LoginCredentials, NewAccount, Nickname, Password};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::PrivateProfileResponse;
use crate::inbound::http::validation::{login_error, user_error};

/// Request body for `POST /api/v1/signup`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[schema(example = "Night Owl")]
    pub nickname: String,
    #[schema(example = "owl@example.com")]
    pub email: String,
    #[schema(example = "correct horse battery")]
    pub password: String,
    pub age: Option<u8>,
    pub gender: Option<String>,
}

impl TryFrom<SignupRequest> for NewAccount {
    type Error = Error;

    fn try_from(value: SignupRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            nickname: Nickname::new(value.nickname).map_err(user_error)?,
            email: Email::new(&value.email).map_err(user_error)?,
            password: Password::new(&value.password).map_err(user_error)?,
            age: value.age.map(Age::new).transpose().map_err(user_error)?,
            gender: value
                .gender
                .as_deref()
                .map(Gender::new)
                .transpose()
                .map_err(user_error)?,
        })
    }
}

/// Request body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login payload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: Uuid,
}

/// Create an account and sign it in.
#[utoipa::path(
    post,
    path = "/api/v1/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = PrivateProfileResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "signup",
    security([])
)]
#[post("/signup")]
pub async fn signup(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignupRequest>,
) -> ApiResult<HttpResponse> {
    let account = NewAccount::try_from(payload.into_inner())?;
    let user = state.accounts.signup(account).await?;
    session.persist_user(&user.id)?;
    let profile = state.accounts.current_user(&user.id).await?;
    Ok(HttpResponse::Created().json(PrivateProfileResponse::from(profile)))
}

/// Authenticate and establish a session.
///
/// Unknown emails and wrong passwords share one response.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = LoginResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let LoginRequest { email, password } = payload.into_inner();
    let credentials = LoginCredentials::try_from_parts(&email, &password).map_err(login_error)?;
    let user_id = state.accounts.login(&credentials).await?;
    session.persist_user(&user_id)?;
    Ok(web::Json(LoginResponse {
        user_id: *user_id.as_uuid(),
    }))
}

/// End the current session. Succeeds without a session too.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["accounts"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}
