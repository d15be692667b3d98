//! Comment handlers.
//!
//! ```text
//! GET    /api/v1/journals/{id}/comments?page=1&limit=20
//! POST   /api/v1/comments {"journalId":"..","content":"Lovely","parentId":null}
//! POST   /api/v1/comments/{id}/like
//! DELETE /api/v1/comments/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use chrono::{DateTime, Utc};
use pagination::Page;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    Comment, CommentBody, CommentId, CommentView, JournalId, NewComment,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::engagement::LikeResponse;
use crate::inbound::http::journal_dto::PageQuery;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, comment_error, page_request, parse_id};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub journal_id: Uuid,
    pub user_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub author_name: String,
    #[schema(value_type = Object)]
    pub profile_theme: Value,
    pub like_count: u64,
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
}

impl From<CommentView> for CommentResponse {
    fn from(view: CommentView) -> Self {
        let CommentView {
            comment,
            like_count,
            is_liked,
        } = view;
        Self {
            id: *comment.id.as_uuid(),
            journal_id: *comment.journal_id.as_uuid(),
            user_id: *comment.user_id.as_uuid(),
            parent_id: comment.parent_id.map(|id| *id.as_uuid()),
            content: comment.content.as_str().to_owned(),
            author_name: comment.author_name,
            profile_theme: comment.profile_theme.into(),
            like_count,
            is_liked,
            created_at: comment.created_at,
        }
    }
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        CommentView {
            comment,
            like_count: 0,
            is_liked: false,
        }
        .into()
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentPageResponse {
    pub comments: Vec<CommentResponse>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub has_more: bool,
}

impl From<Page<CommentView>> for CommentPageResponse {
    fn from(page: Page<CommentView>) -> Self {
        Self {
            page: page.page(),
            limit: page.limit(),
            total: page.total(),
            has_more: page.has_more(),
            comments: page.into_items().into_iter().map(Into::into).collect(),
        }
    }
}

/// Body for `POST /api/v1/comments`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub journal_id: String,
    #[schema(example = "Lovely writing")]
    pub content: String,
    /// Top-level comment this replies to.
    pub parent_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteCommentResponse {
    /// The comment plus its direct replies.
    pub deleted: u64,
}

#[utoipa::path(
    get,
    path = "/api/v1/journals/{id}/comments",
    params(("id" = String, Path, description = "Entry identifier"), PageQuery),
    responses(
        (status = 200, description = "Comments, newest first", body = CommentPageResponse),
        (status = 404, description = "Unknown or hidden entry", body = ErrorSchema)
    ),
    tags = ["comments"],
    operation_id = "listComments",
    security([])
)]
#[get("/journals/{id}/comments")]
pub async fn list_comments(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<CommentPageResponse>> {
    let journal_id: JournalId = parse_id(&path.into_inner(), FieldName::new("id"))?;
    let page = page_request(query.page, query.limit)?;
    let page = state
        .comments
        .list(&journal_id, session.user_id()?, page)
        .await?;
    Ok(web::Json(page.into()))
}

/// Comment on a public entry, or reply to a top-level comment.
#[utoipa::path(
    post,
    path = "/api/v1/comments",
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Invalid body or nested reply", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Entry is private", body = ErrorSchema),
        (status = 404, description = "Unknown entry or parent", body = ErrorSchema)
    ),
    tags = ["comments"],
    operation_id = "createComment"
)]
#[post("/comments")]
pub async fn create_comment(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateCommentRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let CreateCommentRequest {
        journal_id,
        content,
        parent_id,
    } = payload.into_inner();
    let input = NewComment {
        journal_id: parse_id(&journal_id, FieldName::new("journalId"))?,
        user_id,
        content: CommentBody::new(content).map_err(comment_error)?,
        parent_id: parent_id
            .as_deref()
            .map(|raw| parse_id::<CommentId>(raw, FieldName::new("parentId")))
            .transpose()?,
    };
    let comment = state.comments.create(input).await?;
    Ok(HttpResponse::Created().json(CommentResponse::from(comment)))
}

#[utoipa::path(
    post,
    path = "/api/v1/comments/{id}/like",
    params(("id" = String, Path, description = "Comment identifier")),
    responses(
        (status = 200, description = "Like toggled", body = LikeResponse),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 404, description = "Unknown comment", body = ErrorSchema)
    ),
    tags = ["comments"],
    operation_id = "toggleCommentLike"
)]
#[post("/comments/{id}/like")]
pub async fn like_comment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<LikeResponse>> {
    let user = session.require_user_id()?;
    let id: CommentId = parse_id(&path.into_inner(), FieldName::new("id"))?;
    let toggle = state.comments.toggle_like(&id, &user).await?;
    Ok(web::Json(toggle.into()))
}

/// Delete a comment with its replies. Only the comment author may.
#[utoipa::path(
    delete,
    path = "/api/v1/comments/{id}",
    params(("id" = String, Path, description = "Comment identifier")),
    responses(
        (status = 200, description = "Comments removed", body = DeleteCommentResponse),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Not the comment author", body = ErrorSchema),
        (status = 404, description = "Unknown comment", body = ErrorSchema)
    ),
    tags = ["comments"],
    operation_id = "deleteComment"
)]
#[delete("/comments/{id}")]
pub async fn delete_comment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<DeleteCommentResponse>> {
    let user = session.require_user_id()?;
    let id: CommentId = parse_id(&path.into_inner(), FieldName::new("id"))?;
    let deleted = state.comments.delete(&id, &user).await?;
    Ok(web::Json(DeleteCommentResponse { deleted }))
}
