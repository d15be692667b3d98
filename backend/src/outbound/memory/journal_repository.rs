use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest};

use crate::domain::ports::{JournalRepository, JournalRepositoryError, JournalWindow};
use crate::domain::{Journal, JournalId, JournalSort, PublicJournalFilter, Slug, UserId};

use super::{MemoryStore, State, count, newest_first, page_of, window};

impl State {
    fn public_window(&self, keep: impl Fn(&Journal) -> bool, skip: u64, limit: u32) -> JournalWindow {
        let matching: Vec<Journal> =
            newest_first(self.journals.iter(), |journal| journal.created_at)
                .into_iter()
                .filter(|journal| journal.is_public && keep(journal))
                .cloned()
                .collect();
        JournalWindow {
            journals: window(&matching, skip, limit),
            total: count(matching.iter()),
        }
    }
}

#[async_trait]
impl JournalRepository for MemoryStore {
    async fn insert(&self, journal: &Journal) -> Result<(), JournalRepositoryError> {
        let mut state = self.lock();
        if state.journals.iter().any(|existing| existing.slug == journal.slug) {
            return Err(JournalRepositoryError::duplicate_slug(journal.slug.as_str()));
        }
        state.journals.push(journal.clone());
        Ok(())
    }

    async fn update(&self, journal: &Journal) -> Result<(), JournalRepositoryError> {
        let mut state = self.lock();
        let stored = state
            .journals
            .iter_mut()
            .find(|existing| existing.id == journal.id)
            .ok_or_else(|| JournalRepositoryError::query(format!("journal {} not found", journal.id)))?;
        *stored = journal.clone();
        Ok(())
    }

    async fn delete(&self, id: &JournalId) -> Result<bool, JournalRepositoryError> {
        Ok(self.lock().remove_journals(&[*id]) > 0)
    }

    async fn find_by_id(&self, id: &JournalId) -> Result<Option<Journal>, JournalRepositoryError> {
        Ok(self.lock().journal(id).cloned())
    }

    async fn find_many(&self, ids: &[JournalId]) -> Result<Vec<Journal>, JournalRepositoryError> {
        Ok(self
            .lock()
            .journals
            .iter()
            .filter(|journal| ids.contains(&journal.id))
            .cloned()
            .collect())
    }

    async fn find_by_slug(&self, slug: &Slug) -> Result<Option<Journal>, JournalRepositoryError> {
        Ok(self
            .lock()
            .journals
            .iter()
            .find(|journal| journal.slug == *slug)
            .cloned())
    }

    async fn slugs_with_prefix(&self, prefix: &str) -> Result<Vec<String>, JournalRepositoryError> {
        let suffixed = format!("{prefix}-");
        Ok(self
            .lock()
            .journals
            .iter()
            .map(|journal| journal.slug.as_str())
            .filter(|slug| *slug == prefix || slug.starts_with(&suffixed))
            .map(str::to_owned)
            .collect())
    }

    async fn list_public(
        &self,
        filter: &PublicJournalFilter,
        page: PageRequest,
    ) -> Result<Page<Journal>, JournalRepositoryError> {
        let state = self.lock();
        let mut matching: Vec<&Journal> =
            newest_first(state.journals.iter(), |journal| journal.created_at)
                .into_iter()
                .filter(|journal| journal.is_public)
                .filter(|journal| filter.category.is_none_or(|category| journal.category == category))
                .filter(|journal| {
                    filter
                        .tag
                        .as_deref()
                        .is_none_or(|tag| journal.tags.contains(tag))
                })
                .collect();
        match filter.sort {
            JournalSort::Newest => {}
            JournalSort::Oldest => matching.reverse(),
            JournalSort::Popular => matching.sort_by_key(|journal| {
                std::cmp::Reverse(state.journal_like_count(&journal.id))
            }),
        }
        let rows: Vec<Journal> = matching.into_iter().cloned().collect();
        Ok(page_of(&rows, page))
    }

    async fn list_by_author(
        &self,
        author: &UserId,
        collection: Option<String>,
        page: PageRequest,
    ) -> Result<Page<Journal>, JournalRepositoryError> {
        let state = self.lock();
        let rows: Vec<Journal> = newest_first(state.journals.iter(), |journal| journal.created_at)
            .into_iter()
            .filter(|journal| journal.author_id == *author)
            .filter(|journal| {
                collection
                    .as_deref()
                    .is_none_or(|name| journal.collections.contains(name))
            })
            .cloned()
            .collect();
        Ok(page_of(&rows, page))
    }

    async fn list_public_by_authors(
        &self,
        authors: &[UserId],
        skip: u64,
        limit: u32,
    ) -> Result<JournalWindow, JournalRepositoryError> {
        Ok(self
            .lock()
            .public_window(|journal| authors.contains(&journal.author_id), skip, limit))
    }

    async fn list_public_excluding_authors(
        &self,
        authors: &[UserId],
        skip: u64,
        limit: u32,
    ) -> Result<JournalWindow, JournalRepositoryError> {
        Ok(self
            .lock()
            .public_window(|journal| !authors.contains(&journal.author_id), skip, limit))
    }

    async fn count_public_since(
        &self,
        authors: &[UserId],
        since: DateTime<Utc>,
    ) -> Result<HashMap<UserId, u64>, JournalRepositoryError> {
        let mut counts = HashMap::new();
        for journal in self.lock().journals.iter().filter(|journal| {
            journal.is_public && journal.created_at > since && authors.contains(&journal.author_id)
        }) {
            *counts.entry(journal.author_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn collections(&self, author: &UserId) -> Result<Vec<String>, JournalRepositoryError> {
        Ok(self
            .lock()
            .journals
            .iter()
            .filter(|journal| journal.author_id == *author)
            .flat_map(|journal| journal.collections.as_slice().iter().cloned())
            .collect())
    }
}
