//! Request and response bodies shared by the entry, engagement and feed
//! handlers.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use pagination::Page;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::{
    Category, Collections, Content, Error, FeedItem, JournalDetail, JournalDraft, JournalSort,
    JournalUpdate, JournalView, MetaDescription, Tags, Title,
};
use crate::inbound::http::validation::journal_error;

/// Entry with the caller's engagement figures.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JournalResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    #[schema(example = "a-quiet-morning")]
    pub slug: String,
    pub content: String,
    #[schema(example = "journal")]
    pub category: String,
    pub tags: Vec<String>,
    pub collections: Vec<String>,
    pub is_public: bool,
    pub author_name: Option<String>,
    pub thumbnail: Option<String>,
    pub meta_description: Option<String>,
    pub like_count: u64,
    pub is_liked: bool,
    pub is_saved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<JournalView> for JournalResponse {
    fn from(view: JournalView) -> Self {
        let JournalView {
            journal,
            engagement,
        } = view;
        Self {
            id: *journal.id.as_uuid(),
            author_id: *journal.author_id.as_uuid(),
            title: journal.title.as_str().to_owned(),
            slug: journal.slug.as_str().to_owned(),
            content: journal.content.as_str().to_owned(),
            category: journal.category.as_str().to_owned(),
            tags: journal.tags.into_inner(),
            collections: journal.collections.into_inner(),
            is_public: journal.is_public,
            author_name: journal.author_name,
            thumbnail: journal.thumbnail,
            meta_description: journal
                .meta_description
                .map(|meta| meta.as_str().to_owned()),
            like_count: engagement.like_count,
            is_liked: engagement.is_liked,
            is_saved: engagement.is_saved,
            created_at: journal.created_at,
            updated_at: journal.updated_at,
        }
    }
}

/// Entry detail including who likes it.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JournalDetailResponse {
    #[serde(flatten)]
    pub journal: JournalResponse,
    /// Ids of users who like the entry, oldest like first.
    pub likes: Vec<Uuid>,
}

impl From<JournalDetail> for JournalDetailResponse {
    fn from(detail: JournalDetail) -> Self {
        Self {
            journal: detail.view.into(),
            likes: detail.likes.iter().map(|id| *id.as_uuid()).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedItemResponse {
    #[serde(flatten)]
    pub journal: JournalResponse,
    /// Whether the author is someone the caller follows.
    pub from_subscription: bool,
}

impl From<FeedItem> for FeedItemResponse {
    fn from(item: FeedItem) -> Self {
        Self {
            journal: item.view.into(),
            from_subscription: item.from_subscription,
        }
    }
}

/// One page of entries.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JournalPageResponse {
    pub journals: Vec<JournalResponse>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub has_more: bool,
}

impl From<Page<JournalView>> for JournalPageResponse {
    fn from(page: Page<JournalView>) -> Self {
        Self {
            page: page.page(),
            limit: page.limit(),
            total: page.total(),
            has_more: page.has_more(),
            journals: page.into_items().into_iter().map(Into::into).collect(),
        }
    }
}

/// One page of the caller's feed.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedPageResponse {
    pub journals: Vec<FeedItemResponse>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub has_more: bool,
}

impl From<Page<FeedItem>> for FeedPageResponse {
    fn from(page: Page<FeedItem>) -> Self {
        Self {
            page: page.page(),
            limit: page.limit(),
            total: page.total(),
            has_more: page.has_more(),
            journals: page.into_items().into_iter().map(Into::into).collect(),
        }
    }
}

/// Body for `POST /api/v1/journals`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateJournalRequest {
    #[schema(example = "A quiet morning")]
    pub title: String,
    /// HTML body, stored as-is.
    pub content: String,
    /// `journal` (default) or `story`.
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub collections: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
    pub thumbnail: Option<String>,
    /// Stories only.
    pub meta_description: Option<String>,
}

fn parse_category(raw: &str) -> Result<Category, Error> {
    Category::from_str(raw).map_err(journal_error)
}

impl TryFrom<CreateJournalRequest> for JournalDraft {
    type Error = Error;

    fn try_from(value: CreateJournalRequest) -> Result<Self, Self::Error> {
        let category = value
            .category
            .as_deref()
            .map(parse_category)
            .transpose()?
            .unwrap_or(Category::Journal);
        let draft = Self {
            title: Title::new(&value.title).map_err(journal_error)?,
            content: Content::new(value.content).map_err(journal_error)?,
            category,
            tags: Tags::new(&value.tags).map_err(journal_error)?,
            collections: Collections::new(&value.collections).map_err(journal_error)?,
            is_public: value.is_public,
            thumbnail: value.thumbnail.filter(|url| !url.trim().is_empty()),
            meta_description: value
                .meta_description
                .as_deref()
                .map(MetaDescription::new)
                .transpose()
                .map_err(journal_error)?,
        };
        draft.validate().map_err(journal_error)
    }
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Body for `PUT /api/v1/journals/{id}`. Omitted fields stay unchanged;
/// `"thumbnail": null` clears the thumbnail.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJournalRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub collections: Option<Vec<String>>,
    pub is_public: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub thumbnail: Option<Option<String>>,
    pub meta_description: Option<String>,
}

impl TryFrom<UpdateJournalRequest> for JournalUpdate {
    type Error = Error;

    fn try_from(value: UpdateJournalRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            title: value
                .title
                .as_deref()
                .map(Title::new)
                .transpose()
                .map_err(journal_error)?,
            content: value
                .content
                .map(Content::new)
                .transpose()
                .map_err(journal_error)?,
            category: value.category.as_deref().map(parse_category).transpose()?,
            tags: value
                .tags
                .map(Tags::new)
                .transpose()
                .map_err(journal_error)?,
            collections: value
                .collections
                .map(Collections::new)
                .transpose()
                .map_err(journal_error)?,
            is_public: value.is_public,
            thumbnail: value.thumbnail,
            meta_description: value
                .meta_description
                .as_deref()
                .map(MetaDescription::new)
                .transpose()
                .map_err(journal_error)?,
        })
    }
}

/// Paging for listings without further filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size, clamped to 50.
    pub limit: Option<u32>,
}

/// Query for public listings.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PublicListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// `newest` (default), `oldest` or `popular`.
    pub sort: Option<String>,
    /// `journal` or `story`.
    pub category: Option<String>,
}

impl PublicListQuery {
    pub fn sort(&self) -> Result<JournalSort, Error> {
        self.sort
            .as_deref()
            .map(JournalSort::from_str)
            .transpose()
            .map(Option::unwrap_or_default)
            .map_err(journal_error)
    }

    pub fn category(&self) -> Result<Option<Category>, Error> {
        self.category.as_deref().map(parse_category).transpose()
    }
}

/// Query for the caller's own entries.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OwnListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Only entries filed under this collection.
    pub collection: Option<String>,
}
