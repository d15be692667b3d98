//! Mailbox handlers.
//!
//! ```text
//! GET    /api/v1/mails
//! POST   /api/v1/mails/system {"title":"Welcome","content":"..","sendToAllUsers":true,"expiryDate":"2026-12-31T00:00:00Z"}
//! PUT    /api/v1/mail/{id}/read
//! PUT    /api/v1/mail/{id}/claim-reward
//! DELETE /api/v1/mail/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Error, Mail, MailAudience, MailId, MailboxEntry, SystemMailDraft, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, mail_error, parse_id, parse_id_list, parse_optional_rfc3339_timestamp,
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MailResponse {
    pub id: Uuid,
    /// `new_like`, `new_comment`, `new_comment_like`, `new_follower` or `system`.
    #[schema(example = "new_like")]
    pub kind: String,
    pub title: String,
    pub content: String,
    pub sender_id: Option<Uuid>,
    pub journal_id: Option<Uuid>,
    pub is_system_mail: bool,
    pub send_to_all_users: bool,
    pub reward_coins: i64,
    pub expiry_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Mail> for MailResponse {
    fn from(mail: Mail) -> Self {
        Self {
            id: *mail.id.as_uuid(),
            kind: mail.kind.as_str().to_owned(),
            title: mail.title,
            content: mail.content,
            sender_id: mail.sender_id.map(|id| *id.as_uuid()),
            journal_id: mail.journal_id.map(|id| *id.as_uuid()),
            is_system_mail: mail.is_system_mail,
            send_to_all_users: mail.send_to_all_users,
            reward_coins: mail.reward_coins,
            expiry_date: mail.expiry_date,
            created_at: mail.created_at,
        }
    }
}

/// A mail with the caller's read and reward state.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MailboxEntryResponse {
    #[serde(flatten)]
    pub mail: MailResponse,
    pub read: bool,
    pub reward_claimed: bool,
    pub received_at: DateTime<Utc>,
}

impl From<MailboxEntry> for MailboxEntryResponse {
    fn from(entry: MailboxEntry) -> Self {
        Self {
            mail: entry.mail.into(),
            read: entry.read,
            reward_claimed: entry.reward_claimed,
            received_at: entry.received_at,
        }
    }
}

/// Body for `POST /api/v1/mails/system`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemMailRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub reward_coins: i64,
    /// RFC 3339 timestamp. Required for broadcasts.
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub send_to_all_users: bool,
    /// User ids; ignored for broadcasts.
    #[serde(default)]
    pub recipients: Vec<String>,
}

impl TryFrom<SystemMailRequest> for SystemMailDraft {
    type Error = Error;

    fn try_from(value: SystemMailRequest) -> Result<Self, Self::Error> {
        let expiry = parse_optional_rfc3339_timestamp(
            value.expiry_date.as_deref(),
            FieldName::new("expiryDate"),
        )?;
        let audience = if value.send_to_all_users {
            MailAudience::AllUsers
        } else {
            MailAudience::Users(parse_id_list::<UserId>(
                &value.recipients,
                FieldName::new("recipients"),
            )?)
        };
        Self::new(
            &value.title,
            &value.content,
            value.reward_coins,
            expiry,
            audience,
        )
        .map_err(mail_error)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClaimRewardResponse {
    /// Coin balance after the claim.
    pub coins: i64,
}

fn mail_id(raw: String) -> Result<MailId, Error> {
    parse_id(&raw, FieldName::new("id"))
}

/// The caller's mailbox, newest first. Expired mail is left out.
#[utoipa::path(
    get,
    path = "/api/v1/mails",
    responses(
        (status = 200, description = "Mailbox", body = [MailboxEntryResponse]),
        (status = 401, description = "Login required", body = ErrorSchema)
    ),
    tags = ["mail"],
    operation_id = "listMails"
)]
#[get("/mails")]
pub async fn list_mails(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<MailboxEntryResponse>>> {
    let user = session.require_user_id()?;
    let entries = state.mailbox.mailbox(&user).await?;
    Ok(web::Json(entries.into_iter().map(Into::into).collect()))
}

/// Send a system mail to chosen users or to everyone. Administrators only.
#[utoipa::path(
    post,
    path = "/api/v1/mails/system",
    request_body = SystemMailRequest,
    responses(
        (status = 201, description = "Mail sent", body = MailResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Not an administrator", body = ErrorSchema),
        (status = 404, description = "Unknown recipient", body = ErrorSchema)
    ),
    tags = ["mail"],
    operation_id = "sendSystemMail"
)]
#[post("/mails/system")]
pub async fn send_system_mail(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SystemMailRequest>,
) -> ApiResult<HttpResponse> {
    let sender = session.require_user_id()?;
    let draft = SystemMailDraft::try_from(payload.into_inner())?;
    let mail = state.mailbox.send_system_mail(&sender, draft).await?;
    Ok(HttpResponse::Created().json(MailResponse::from(mail)))
}

#[utoipa::path(
    put,
    path = "/api/v1/mail/{id}/read",
    params(("id" = String, Path, description = "Mail identifier")),
    responses(
        (status = 204, description = "Marked read"),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 404, description = "Not in the caller's mailbox", body = ErrorSchema)
    ),
    tags = ["mail"],
    operation_id = "markMailRead"
)]
#[put("/mail/{id}/read")]
pub async fn mark_read(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user = session.require_user_id()?;
    state.mailbox.mark_read(&mail_id(path.into_inner())?, &user).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Credit the mail's coins and mark it read.
#[utoipa::path(
    put,
    path = "/api/v1/mail/{id}/claim-reward",
    params(("id" = String, Path, description = "Mail identifier")),
    responses(
        (status = 200, description = "Reward credited", body = ClaimRewardResponse),
        (status = 400, description = "Mail carries no reward", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 404, description = "Not in the caller's mailbox", body = ErrorSchema),
        (status = 409, description = "Already claimed", body = ErrorSchema)
    ),
    tags = ["mail"],
    operation_id = "claimMailReward"
)]
#[put("/mail/{id}/claim-reward")]
pub async fn claim_reward(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ClaimRewardResponse>> {
    let user = session.require_user_id()?;
    let coins = state
        .mailbox
        .claim_reward(&mail_id(path.into_inner())?, &user)
        .await?;
    Ok(web::Json(ClaimRewardResponse { coins }))
}

/// Hide the mail from the caller's mailbox only.
#[utoipa::path(
    delete,
    path = "/api/v1/mail/{id}",
    params(("id" = String, Path, description = "Mail identifier")),
    responses(
        (status = 204, description = "Mail hidden"),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 404, description = "Not in the caller's mailbox", body = ErrorSchema)
    ),
    tags = ["mail"],
    operation_id = "deleteMail"
)]
#[delete("/mail/{id}")]
pub async fn delete_mail(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user = session.require_user_id()?;
    state
        .mailbox
        .delete_mail(&mail_id(path.into_inner())?, &user)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
