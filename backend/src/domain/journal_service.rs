//! Entry store use-cases: publish, read, edit, delete and list entries.

use std::collections::BTreeSet;
use std::sync::Arc;

use mockable::Clock;
use pagination::{Page, PageRequest};
use tracing::debug;

use super::ports::{EngagementRepository, JournalRepository, JournalRepositoryError, UserRepository};
use super::{
    Category, DEFAULT_COLLECTION, Error, Journal, JournalDetail, JournalDraft, JournalId,
    JournalSort, JournalUpdate, JournalView, PublicJournalFilter, Slug, User, UserId,
    normalize_tag,
};

const SLUG_ATTEMPTS: usize = 3;

/// Attach like and save figures for `viewer` to each entry, keeping order.
pub(crate) async fn attach_engagement(
    engagement: &dyn EngagementRepository,
    journals: Vec<Journal>,
    viewer: Option<UserId>,
) -> Result<Vec<JournalView>, Error> {
    if journals.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<JournalId> = journals.iter().map(|journal| journal.id).collect();
    let figures = engagement.engagement_for(&ids, viewer).await?;
    Ok(journals
        .into_iter()
        .map(|journal| JournalView {
            engagement: figures.get(&journal.id).copied().unwrap_or_default(),
            journal,
        })
        .collect())
}

async fn attach_engagement_page(
    engagement: &dyn EngagementRepository,
    page: Page<Journal>,
    viewer: Option<UserId>,
) -> Result<Page<JournalView>, Error> {
    let ids: Vec<JournalId> = page.items().iter().map(|journal| journal.id).collect();
    let figures = if ids.is_empty() {
        Default::default()
    } else {
        engagement.engagement_for(&ids, viewer).await?
    };
    Ok(page.map(|journal| JournalView {
        engagement: figures.get(&journal.id).copied().unwrap_or_default(),
        journal,
    }))
}

/// Entry store service.
#[derive(Clone)]
pub struct JournalService {
    journals: Arc<dyn JournalRepository>,
    engagement: Arc<dyn EngagementRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl JournalService {
    pub fn new(
        journals: Arc<dyn JournalRepository>,
        engagement: Arc<dyn EngagementRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            journals,
            engagement,
            users,
            clock,
        }
    }

    async fn require_author(&self, author: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(author)
            .await?
            .ok_or_else(|| Error::not_found("user not found"))
    }

    async fn require_owned(&self, id: &JournalId, author: &UserId) -> Result<Journal, Error> {
        let journal = self
            .journals
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("journal not found"))?;
        if journal.author_id != *author {
            return Err(Error::forbidden("only the author may change this entry"));
        }
        Ok(journal)
    }

    /// Publish a new entry under a fresh unique slug.
    ///
    /// The slug lookup and insert race with concurrent publishers; a lost race
    /// picks the next free suffix.
    pub async fn publish(&self, author: &UserId, draft: JournalDraft) -> Result<JournalView, Error> {
        let draft = draft.validate()?;
        let user = self.require_author(author).await?;
        let base = Slug::from_title(draft.title.as_str());
        let now = self.clock.utc();

        let mut attempt = 0;
        let journal = loop {
            attempt += 1;
            let taken = self.journals.slugs_with_prefix(base.as_str()).await?;
            let slug = base.first_free(taken.iter().map(String::as_str));
            let journal = draft
                .clone()
                .into_journal(*author, &user.anonymous_name, slug, now);
            match self.journals.insert(&journal).await {
                Ok(()) => break journal,
                Err(JournalRepositoryError::DuplicateSlug { .. }) if attempt < SLUG_ATTEMPTS => {}
                Err(err) => return Err(err.into()),
            }
        };

        debug!(journal_id = %journal.id, slug = %journal.slug, "entry published");
        Ok(JournalView {
            journal,
            engagement: Default::default(),
        })
    }

    /// Entry detail by slug. Private entries are hidden from everyone but
    /// their author.
    pub async fn get_by_slug(
        &self,
        slug: &Slug,
        viewer: Option<UserId>,
    ) -> Result<JournalDetail, Error> {
        let journal = self
            .journals
            .find_by_slug(slug)
            .await?
            .filter(|journal| journal.is_visible_to(viewer.as_ref()))
            .ok_or_else(|| Error::not_found("journal not found"))?;
        let likes = self.engagement.likers(&journal.id).await?;
        let view = attach_engagement(self.engagement.as_ref(), vec![journal], viewer)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::internal("entry vanished while loading"))?;
        Ok(JournalDetail { view, likes })
    }

    pub async fn update(
        &self,
        id: &JournalId,
        author: &UserId,
        update: JournalUpdate,
    ) -> Result<JournalView, Error> {
        let mut journal = self.require_owned(id, author).await?;
        let user = self.require_author(author).await?;
        update.apply(&mut journal, &user.anonymous_name, self.clock.utc())?;
        self.journals.update(&journal).await?;
        debug!(journal_id = %journal.id, "entry updated");
        attach_engagement(self.engagement.as_ref(), vec![journal], Some(*author))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::internal("entry vanished while loading"))
    }

    /// Delete an entry with its comments, likes and saves.
    pub async fn delete(&self, id: &JournalId, author: &UserId) -> Result<(), Error> {
        self.require_owned(id, author).await?;
        if !self.journals.delete(id).await? {
            return Err(Error::not_found("journal not found"));
        }
        debug!(journal_id = %id, "entry deleted");
        Ok(())
    }

    pub async fn list_public(
        &self,
        category: Option<Category>,
        sort: JournalSort,
        page: PageRequest,
        viewer: Option<UserId>,
    ) -> Result<Page<JournalView>, Error> {
        let filter = PublicJournalFilter {
            category,
            tag: None,
            sort,
        };
        let journals = self.journals.list_public(&filter, page).await?;
        attach_engagement_page(self.engagement.as_ref(), journals, viewer).await
    }

    /// Public entries carrying `tag`, matched case-insensitively.
    pub async fn list_by_tag(
        &self,
        tag: &str,
        category: Option<Category>,
        sort: JournalSort,
        page: PageRequest,
        viewer: Option<UserId>,
    ) -> Result<Page<JournalView>, Error> {
        let tag = normalize_tag(tag);
        if tag.is_empty() {
            return Err(Error::invalid_request("tag must not be empty"));
        }
        let filter = PublicJournalFilter {
            category,
            tag: Some(tag),
            sort,
        };
        let journals = self.journals.list_public(&filter, page).await?;
        attach_engagement_page(self.engagement.as_ref(), journals, viewer).await
    }

    /// The author's own entries, public and private.
    pub async fn list_own(
        &self,
        author: &UserId,
        collection: Option<String>,
        page: PageRequest,
    ) -> Result<Page<JournalView>, Error> {
        let collection = collection
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty());
        let journals = self
            .journals
            .list_by_author(author, collection, page)
            .await?;
        attach_engagement_page(self.engagement.as_ref(), journals, Some(*author)).await
    }

    /// Sorted distinct collection names, `"All"` first.
    pub async fn collections(&self, author: &UserId) -> Result<Vec<String>, Error> {
        let names: BTreeSet<String> = self
            .journals
            .collections(author)
            .await?
            .into_iter()
            .filter(|name| name != DEFAULT_COLLECTION)
            .collect();
        let mut collections = Vec::with_capacity(names.len() + 1);
        collections.push(DEFAULT_COLLECTION.to_owned());
        collections.extend(names);
        Ok(collections)
    }
}

#[cfg(test)]
mod tests;
