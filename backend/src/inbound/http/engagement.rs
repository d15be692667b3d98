//! Like and save toggles on entries.
//!
//! ```text
//! POST /api/v1/journals/{id}/like
//! POST /api/v1/journals/{id}/save
//! GET  /api/v1/journals/{id}/likes
//! GET  /api/v1/journals/saved?page=1&limit=10
//! ```

use actix_web::{get, post, web};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Error, JournalId, LikeToggle};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::journal_dto::{JournalPageResponse, PageQuery};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, page_request, parse_id};

/// Like state after a toggle. Shared by entries and comments.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub like_count: u64,
    pub is_liked: bool,
}

impl From<LikeToggle> for LikeResponse {
    fn from(toggle: LikeToggle) -> Self {
        Self {
            like_count: toggle.like_count,
            is_liked: toggle.liked,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaveResponse {
    pub saved: bool,
}

fn journal_id(raw: String) -> Result<JournalId, Error> {
    parse_id(&raw, FieldName::new("id"))
}

/// Like the entry, or take the like back.
///
/// A new like from someone other than the author mails the author. Taking
/// a like back leaves that mail in place.
#[utoipa::path(
    post,
    path = "/api/v1/journals/{id}/like",
    params(("id" = String, Path, description = "Entry identifier")),
    responses(
        (status = 200, description = "Like toggled", body = LikeResponse),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 404, description = "Unknown or hidden entry", body = ErrorSchema)
    ),
    tags = ["engagement"],
    operation_id = "toggleJournalLike"
)]
#[post("/journals/{id}/like")]
pub async fn like_journal(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<LikeResponse>> {
    let user = session.require_user_id()?;
    let id = journal_id(path.into_inner())?;
    let toggle = state.engagement.toggle_like(&id, &user).await?;
    Ok(web::Json(toggle.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/journals/{id}/save",
    params(("id" = String, Path, description = "Entry identifier")),
    responses(
        (status = 200, description = "Save toggled", body = SaveResponse),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 404, description = "Unknown or hidden entry", body = ErrorSchema)
    ),
    tags = ["engagement"],
    operation_id = "toggleJournalSave"
)]
#[post("/journals/{id}/save")]
pub async fn save_journal(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<SaveResponse>> {
    let user = session.require_user_id()?;
    let id = journal_id(path.into_inner())?;
    let saved = state.engagement.toggle_save(&id, &user).await?;
    Ok(web::Json(SaveResponse { saved }))
}

#[utoipa::path(
    get,
    path = "/api/v1/journals/{id}/likes",
    params(("id" = String, Path, description = "Entry identifier")),
    responses(
        (status = 200, description = "Ids of users who like the entry", body = [Uuid]),
        (status = 404, description = "Unknown or hidden entry", body = ErrorSchema)
    ),
    tags = ["engagement"],
    operation_id = "journalLikers",
    security([])
)]
#[get("/journals/{id}/likes")]
pub async fn journal_likers(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<Uuid>>> {
    let id = journal_id(path.into_inner())?;
    let likers = state.engagement.likers(&id, session.user_id()?).await?;
    Ok(web::Json(likers.iter().map(|id| *id.as_uuid()).collect()))
}

/// Entries the caller saved, newest save first.
#[utoipa::path(
    get,
    path = "/api/v1/journals/saved",
    params(PageQuery),
    responses(
        (status = 200, description = "Saved entries", body = JournalPageResponse),
        (status = 401, description = "Login required", body = ErrorSchema)
    ),
    tags = ["engagement"],
    operation_id = "savedJournals"
)]
#[get("/journals/saved")]
pub async fn saved_journals(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<JournalPageResponse>> {
    let user = session.require_user_id()?;
    let page = page_request(query.page, query.limit)?;
    let page = state.engagement.saved_entries(&user, page).await?;
    Ok(web::Json(page.into()))
}
