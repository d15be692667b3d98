//! Entry handlers: publishing, reading, editing and listing.
//!
//! ```text
//! POST   /api/v1/journals {"title":"A quiet morning","content":"<p>..</p>","isPublic":true}
//! GET    /api/v1/journals/public?page=1&limit=10&sort=popular&category=story
//! GET    /api/v1/journals/by-tag/{tag}
//! GET    /api/v1/journals/mine?collection=Travel
//! GET    /api/v1/journals/collections
//! GET    /api/v1/journals/{slug}
//! PUT    /api/v1/journals/{id}
//! DELETE /api/v1/journals/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::domain::{Error, JournalDraft, JournalId, JournalUpdate, Slug};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::journal_dto::{
    CreateJournalRequest, JournalDetailResponse, JournalPageResponse, JournalResponse,
    OwnListQuery, PublicListQuery, UpdateJournalRequest,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, page_request, parse_id};

#[utoipa::path(
    post,
    path = "/api/v1/journals",
    request_body = CreateJournalRequest,
    responses(
        (status = 201, description = "Entry published", body = JournalResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema)
    ),
    tags = ["journals"],
    operation_id = "createJournal"
)]
#[post("/journals")]
pub async fn create_journal(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateJournalRequest>,
) -> ApiResult<HttpResponse> {
    let author = session.require_user_id()?;
    let draft = JournalDraft::try_from(payload.into_inner())?;
    let view = state.journals.publish(&author, draft).await?;
    Ok(HttpResponse::Created().json(JournalResponse::from(view)))
}

#[utoipa::path(
    get,
    path = "/api/v1/journals/public",
    params(PublicListQuery),
    responses(
        (status = 200, description = "Public entries", body = JournalPageResponse),
        (status = 400, description = "Invalid query", body = ErrorSchema)
    ),
    tags = ["journals"],
    operation_id = "listPublicJournals",
    security([])
)]
#[get("/journals/public")]
pub async fn list_public(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<PublicListQuery>,
) -> ApiResult<web::Json<JournalPageResponse>> {
    let page = page_request(query.page, query.limit)?;
    let page = state
        .journals
        .list_public(query.category()?, query.sort()?, page, session.user_id()?)
        .await?;
    Ok(web::Json(page.into()))
}

/// Public entries carrying a tag. Matching ignores case.
#[utoipa::path(
    get,
    path = "/api/v1/journals/by-tag/{tag}",
    params(("tag" = String, Path, description = "Tag to match"), PublicListQuery),
    responses(
        (status = 200, description = "Matching entries", body = JournalPageResponse),
        (status = 400, description = "Invalid query", body = ErrorSchema)
    ),
    tags = ["journals"],
    operation_id = "listJournalsByTag",
    security([])
)]
#[get("/journals/by-tag/{tag}")]
pub async fn list_by_tag(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    query: web::Query<PublicListQuery>,
) -> ApiResult<web::Json<JournalPageResponse>> {
    let page = page_request(query.page, query.limit)?;
    let page = state
        .journals
        .list_by_tag(
            &path.into_inner(),
            query.category()?,
            query.sort()?,
            page,
            session.user_id()?,
        )
        .await?;
    Ok(web::Json(page.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/journals/mine",
    params(OwnListQuery),
    responses(
        (status = 200, description = "The caller's entries", body = JournalPageResponse),
        (status = 401, description = "Login required", body = ErrorSchema)
    ),
    tags = ["journals"],
    operation_id = "listOwnJournals"
)]
#[get("/journals/mine")]
pub async fn list_own(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<OwnListQuery>,
) -> ApiResult<web::Json<JournalPageResponse>> {
    let author = session.require_user_id()?;
    let OwnListQuery {
        page,
        limit,
        collection,
    } = query.into_inner();
    let page = state
        .journals
        .list_own(&author, collection, page_request(page, limit)?)
        .await?;
    Ok(web::Json(page.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/journals/collections",
    responses(
        (status = 200, description = "Collection names, `All` first", body = [String]),
        (status = 401, description = "Login required", body = ErrorSchema)
    ),
    tags = ["journals"],
    operation_id = "listCollections"
)]
#[get("/journals/collections")]
pub async fn list_collections(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<String>>> {
    let author = session.require_user_id()?;
    Ok(web::Json(state.journals.collections(&author).await?))
}

/// Entry detail. Private entries answer 404 to everyone but their author.
#[utoipa::path(
    get,
    path = "/api/v1/journals/{slug}",
    params(("slug" = String, Path, description = "Entry slug")),
    responses(
        (status = 200, description = "Entry detail", body = JournalDetailResponse),
        (status = 404, description = "Unknown or hidden entry", body = ErrorSchema)
    ),
    tags = ["journals"],
    operation_id = "getJournal",
    security([])
)]
#[get("/journals/{slug}")]
pub async fn get_journal(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<JournalDetailResponse>> {
    let slug =
        Slug::parse(path.into_inner()).map_err(|_| Error::not_found("journal not found"))?;
    let detail = state
        .journals
        .get_by_slug(&slug, session.user_id()?)
        .await?;
    Ok(web::Json(detail.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/journals/{id}",
    params(("id" = String, Path, description = "Entry identifier")),
    request_body = UpdateJournalRequest,
    responses(
        (status = 200, description = "Entry updated", body = JournalResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Not the author", body = ErrorSchema),
        (status = 404, description = "Unknown entry", body = ErrorSchema)
    ),
    tags = ["journals"],
    operation_id = "updateJournal"
)]
#[put("/journals/{id}")]
pub async fn update_journal(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateJournalRequest>,
) -> ApiResult<web::Json<JournalResponse>> {
    let author = session.require_user_id()?;
    let id: JournalId = parse_id(&path.into_inner(), FieldName::new("id"))?;
    let update = JournalUpdate::try_from(payload.into_inner())?;
    let view = state.journals.update(&id, &author, update).await?;
    Ok(web::Json(view.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/journals/{id}",
    params(("id" = String, Path, description = "Entry identifier")),
    responses(
        (status = 204, description = "Entry deleted with its comments, likes and saves"),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Not the author", body = ErrorSchema),
        (status = 404, description = "Unknown entry", body = ErrorSchema)
    ),
    tags = ["journals"],
    operation_id = "deleteJournal"
)]
#[delete("/journals/{id}")]
pub async fn delete_journal(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let author = session.require_user_id()?;
    let id: JournalId = parse_id(&path.into_inner(), FieldName::new("id"))?;
    state.journals.delete(&id, &author).await?;
    Ok(HttpResponse::NoContent().finish())
}
