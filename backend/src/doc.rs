//! OpenAPI document for the journal API.
//!
//! Served by Swagger UI in debug builds and printed by the `openapi-dump`
//! binary.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::accounts::{LoginRequest, LoginResponse, SignupRequest};
use crate::inbound::http::comments::{
    CommentPageResponse, CommentResponse, CreateCommentRequest, DeleteCommentResponse,
};
use crate::inbound::http::engagement::{LikeResponse, SaveResponse};
use crate::inbound::http::journal_dto::{
    CreateJournalRequest, FeedItemResponse, FeedPageResponse, JournalDetailResponse,
    JournalPageResponse, JournalResponse, UpdateJournalRequest,
};
use crate::inbound::http::mail::{
    ClaimRewardResponse, MailResponse, MailboxEntryResponse, SystemMailRequest,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::subscriptions::{
    FollowedAuthorResponse, SubscribeRequest, SubscribeResponse,
};
use crate::inbound::http::users::{
    PrivateProfileResponse, ProfileUpdateRequest, PublicProfileResponse, UserSummaryResponse,
};

/// Registers the `session` cookie as the default security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);
        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/signup or /api/v1/login.",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Journal API",
        description = "Anonymous journaling with likes, comments, follows, a personal feed and mail."
    ),
    servers((url = "/", description = "Relative to the deployment base URL")),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::accounts::signup,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::logout,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::update_current_user,
        crate::inbound::http::users::delete_current_user,
        crate::inbound::http::users::public_profile,
        crate::inbound::http::users::subscribers,
        crate::inbound::http::journals::create_journal,
        crate::inbound::http::journals::list_public,
        crate::inbound::http::journals::list_by_tag,
        crate::inbound::http::journals::list_own,
        crate::inbound::http::journals::list_collections,
        crate::inbound::http::journals::get_journal,
        crate::inbound::http::journals::update_journal,
        crate::inbound::http::journals::delete_journal,
        crate::inbound::http::engagement::like_journal,
        crate::inbound::http::engagement::save_journal,
        crate::inbound::http::engagement::journal_likers,
        crate::inbound::http::engagement::saved_journals,
        crate::inbound::http::comments::list_comments,
        crate::inbound::http::comments::create_comment,
        crate::inbound::http::comments::like_comment,
        crate::inbound::http::comments::delete_comment,
        crate::inbound::http::subscriptions::toggle_subscription,
        crate::inbound::http::subscriptions::list_subscriptions,
        crate::inbound::http::subscriptions::mark_checked,
        crate::inbound::http::feed::get_feed,
        crate::inbound::http::mail::list_mails,
        crate::inbound::http::mail::send_system_mail,
        crate::inbound::http::mail::mark_read,
        crate::inbound::http::mail::claim_reward,
        crate::inbound::http::mail::delete_mail,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        SignupRequest,
        LoginRequest,
        LoginResponse,
        PrivateProfileResponse,
        PublicProfileResponse,
        UserSummaryResponse,
        ProfileUpdateRequest,
        JournalResponse,
        JournalDetailResponse,
        JournalPageResponse,
        FeedItemResponse,
        FeedPageResponse,
        CreateJournalRequest,
        UpdateJournalRequest,
        LikeResponse,
        SaveResponse,
        CommentResponse,
        CommentPageResponse,
        CreateCommentRequest,
        DeleteCommentResponse,
        SubscribeRequest,
        SubscribeResponse,
        FollowedAuthorResponse,
        MailResponse,
        MailboxEntryResponse,
        SystemMailRequest,
        ClaimRewardResponse,
    )),
    tags(
        (name = "accounts", description = "Sign-up, login and logout"),
        (name = "users", description = "Profiles"),
        (name = "journals", description = "Journal entries"),
        (name = "engagement", description = "Likes and saved entries"),
        (name = "comments", description = "Comments and replies"),
        (name = "subscriptions", description = "Follow graph"),
        (name = "feed", description = "Personal feed"),
        (name = "mail", description = "Notifications and system mail"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;
