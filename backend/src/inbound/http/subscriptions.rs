//! Follow graph handlers.
//!
//! ```text
//! POST /api/v1/subscribe {"targetUserId":".."}
//! GET  /api/v1/subscriptions
//! POST /api/v1/subscriptions/checked
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{FollowedAuthor, SubscriptionToggle, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub target_user_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResponse {
    pub subscribed: bool,
    #[schema(example = "Subscribed successfully")]
    pub message: String,
    /// Follower count of the target after the toggle.
    pub subscriber_count: u64,
}

impl From<SubscriptionToggle> for SubscribeResponse {
    fn from(toggle: SubscriptionToggle) -> Self {
        Self {
            subscribed: toggle.subscribed,
            message: toggle.message().to_owned(),
            subscriber_count: toggle.subscriber_count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowedAuthorResponse {
    pub user_id: Uuid,
    pub anonymous_name: String,
    #[schema(value_type = Object)]
    pub profile_theme: Value,
    pub has_new_content: bool,
    pub new_journals_count: u64,
}

impl From<FollowedAuthor> for FollowedAuthorResponse {
    fn from(author: FollowedAuthor) -> Self {
        Self {
            has_new_content: author.has_new_content(),
            user_id: *author.user_id.as_uuid(),
            anonymous_name: author.anonymous_name,
            profile_theme: author.profile_theme.into(),
            new_journals_count: author.new_journals_count,
        }
    }
}

/// Follow the target user, or unfollow when already following.
#[utoipa::path(
    post,
    path = "/api/v1/subscribe",
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "Follow toggled", body = SubscribeResponse),
        (status = 400, description = "Invalid id or self-subscription", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 404, description = "Unknown target", body = ErrorSchema)
    ),
    tags = ["subscriptions"],
    operation_id = "toggleSubscription"
)]
#[post("/subscribe")]
pub async fn toggle_subscription(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SubscribeRequest>,
) -> ApiResult<web::Json<SubscribeResponse>> {
    let subscriber = session.require_user_id()?;
    let target: UserId = parse_id(&payload.target_user_id, FieldName::new("targetUserId"))?;
    let toggle = state.subscriptions.toggle(&subscriber, &target).await?;
    Ok(web::Json(toggle.into()))
}

/// Followed authors with how many public entries each published since the
/// caller last checked.
#[utoipa::path(
    get,
    path = "/api/v1/subscriptions",
    responses(
        (status = 200, description = "Followed authors", body = [FollowedAuthorResponse]),
        (status = 401, description = "Login required", body = ErrorSchema)
    ),
    tags = ["subscriptions"],
    operation_id = "listSubscriptions"
)]
#[get("/subscriptions")]
pub async fn list_subscriptions(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<FollowedAuthorResponse>>> {
    let user = session.require_user_id()?;
    let authors = state
        .subscriptions
        .subscriptions_with_notifications(&user)
        .await?;
    Ok(web::Json(authors.into_iter().map(Into::into).collect()))
}

/// Reset the new-content counters. Mail state is untouched.
#[utoipa::path(
    post,
    path = "/api/v1/subscriptions/checked",
    responses(
        (status = 204, description = "Counters reset"),
        (status = 401, description = "Login required", body = ErrorSchema)
    ),
    tags = ["subscriptions"],
    operation_id = "markSubscriptionsChecked"
)]
#[post("/subscriptions/checked")]
pub async fn mark_checked(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user = session.require_user_id()?;
    state.subscriptions.mark_notifications_checked(&user).await?;
    Ok(HttpResponse::NoContent().finish())
}
