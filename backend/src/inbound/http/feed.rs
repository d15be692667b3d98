//! Personal feed: followed authors first, then everyone else.

use actix_web::{get, web};

use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::journal_dto::{FeedPageResponse, PageQuery};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::page_request;

/// One page of the caller's feed.
///
/// Public entries by followed authors come first, newest first, followed by
/// all other public entries. No entry appears twice across pages.
#[utoipa::path(
    get,
    path = "/api/v1/feed",
    params(PageQuery),
    responses(
        (status = 200, description = "Feed page", body = FeedPageResponse),
        (status = 400, description = "Invalid paging", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema)
    ),
    tags = ["feed"],
    operation_id = "getFeed"
)]
#[get("/feed")]
pub async fn get_feed(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<FeedPageResponse>> {
    let user = session.require_user_id()?;
    let page = page_request(query.page, query.limit)?;
    let page = state.feed.get_feed(&user, page).await?;
    Ok(web::Json(page.into()))
}
