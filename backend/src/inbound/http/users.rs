//! Profile handlers.
//!
//! ```text
//! GET    /api/v1/users/me
//! PATCH  /api/v1/users/me {"bio":"Night writer"}
//! DELETE /api/v1/users/me
//! GET    /api/v1/users/{id}
//! GET    /api/v1/users/{id}/subscribers
//! ```

use actix_web::{HttpResponse, delete, get, patch, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    Age, Bio, Error, Gender, PrivateProfile, ProfileTheme, ProfileUpdate, PublicProfile, UserId,
    UserSummary,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id, user_error};

/// Profile returned to its owner.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrivateProfileResponse {
    pub id: Uuid,
    pub nickname: String,
    pub email: String,
    pub age: Option<u8>,
    pub gender: Option<String>,
    #[schema(example = "QuietHeron4821")]
    pub anonymous_name: String,
    #[schema(value_type = Object)]
    pub profile_theme: Value,
    pub coins: i64,
    pub bio: String,
    pub subscriber_count: u64,
    pub last_notification_check: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<PrivateProfile> for PrivateProfileResponse {
    fn from(profile: PrivateProfile) -> Self {
        let PrivateProfile {
            user,
            subscriber_count,
        } = profile;
        Self {
            id: *user.id.as_uuid(),
            nickname: user.nickname.as_str().to_owned(),
            email: user.email.as_str().to_owned(),
            age: user.age.map(Age::value),
            gender: user.gender.map(|gender| gender.as_str().to_owned()),
            anonymous_name: user.anonymous_name,
            profile_theme: user.profile_theme.into(),
            coins: user.coins,
            bio: user.bio.as_str().to_owned(),
            subscriber_count,
            last_notification_check: user.last_notification_check,
            created_at: user.created_at,
        }
    }
}

/// Profile as other users see it. Carries no nickname or email.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileResponse {
    pub user_id: Uuid,
    pub anonymous_name: String,
    pub bio: String,
    #[schema(value_type = Object)]
    pub profile_theme: Value,
    pub subscriber_count: u64,
    pub is_subscribed: bool,
}

impl From<PublicProfile> for PublicProfileResponse {
    fn from(profile: PublicProfile) -> Self {
        Self {
            user_id: *profile.user_id.as_uuid(),
            anonymous_name: profile.anonymous_name,
            bio: profile.bio.as_str().to_owned(),
            profile_theme: profile.profile_theme.into(),
            subscriber_count: profile.subscriber_count,
            is_subscribed: profile.is_subscribed,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummaryResponse {
    pub user_id: Uuid,
    pub anonymous_name: String,
    #[schema(value_type = Object)]
    pub profile_theme: Value,
}

impl From<UserSummary> for UserSummaryResponse {
    fn from(summary: UserSummary) -> Self {
        Self {
            user_id: *summary.user_id.as_uuid(),
            anonymous_name: summary.anonymous_name,
            profile_theme: summary.profile_theme.into(),
        }
    }
}

/// Body for `PATCH /api/v1/users/me`. Omitted fields stay unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub bio: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub profile_theme: Option<Value>,
    pub age: Option<u8>,
    pub gender: Option<String>,
}

impl TryFrom<ProfileUpdateRequest> for ProfileUpdate {
    type Error = Error;

    fn try_from(value: ProfileUpdateRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            bio: value.bio.map(Bio::new).transpose().map_err(user_error)?,
            profile_theme: value
                .profile_theme
                .map(ProfileTheme::new)
                .transpose()
                .map_err(user_error)?,
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

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Own profile", body = PrivateProfileResponse),
        (status = 401, description = "Login required", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<PrivateProfileResponse>> {
    let user_id = session.require_user_id()?;
    let profile = state.accounts.current_user(&user_id).await?;
    Ok(web::Json(profile.into()))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated profile", body = PrivateProfileResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateCurrentUser"
)]
#[patch("/users/me")]
pub async fn update_current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ProfileUpdateRequest>,
) -> ApiResult<web::Json<PrivateProfileResponse>> {
    let user_id = session.require_user_id()?;
    let update = ProfileUpdate::try_from(payload.into_inner())?;
    let profile = state.accounts.update_profile(&user_id, update).await?;
    Ok(web::Json(profile.into()))
}

/// Delete the signed-in account with everything it owns, then end the
/// session.
#[utoipa::path(
    delete,
    path = "/api/v1/users/me",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Login required", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "deleteCurrentUser"
)]
#[delete("/users/me")]
pub async fn delete_current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    state.accounts.delete_account(&user_id).await?;
    session.clear();
    Ok(HttpResponse::NoContent().finish())
}

/// Public profile. Anonymous callers see `isSubscribed: false`.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User identifier")),
    responses(
        (status = 200, description = "Public profile", body = PublicProfileResponse),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "publicProfile",
    security([])
)]
#[get("/users/{id}")]
pub async fn public_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<PublicProfileResponse>> {
    let user_id: UserId = parse_id(&path.into_inner(), FieldName::new("id"))?;
    let profile = state
        .accounts
        .public_profile(&user_id, session.user_id()?)
        .await?;
    Ok(web::Json(profile.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/subscribers",
    params(("id" = String, Path, description = "User identifier")),
    responses(
        (status = 200, description = "Followers, most recent first", body = [UserSummaryResponse]),
        (status = 404, description = "Unknown user", body = ErrorSchema)
    ),
    tags = ["subscriptions"],
    operation_id = "subscribers",
    security([])
)]
#[get("/users/{id}/subscribers")]
pub async fn subscribers(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<UserSummaryResponse>>> {
    let user_id: UserId = parse_id(&path.into_inner(), FieldName::new("id"))?;
    let followers = state.subscriptions.subscribers(&user_id).await?;
    Ok(web::Json(
        followers.into_iter().map(UserSummaryResponse::from).collect(),
    ))
}
