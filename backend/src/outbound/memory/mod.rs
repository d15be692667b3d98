//! In-process adapter implementing every repository port.
//!
//! Used when no database URL is configured and by the HTTP test suites. All
//! state sits behind one mutex, so each port call is atomic the way a
//! database transaction would be. The lock is never held across an await.
//!
//! Rows are kept in insertion order. Listings sort with a stable sort over
//! the reversed rows, so entries created at the same instant come out
//! newest insert first.

mod comment_repository;
mod engagement_repository;
mod journal_repository;
mod mail_repository;
mod subscription_repository;
mod user_repository;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest};

use crate::domain::{
    Comment, CommentId, Journal, JournalId, Mail, MailId, RecipientState, User, UserId,
};

/// A `(target, user)` join row with its creation time.
#[derive(Debug, Clone, Copy)]
struct JoinRow<T> {
    target: T,
    user: UserId,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    subscriber: UserId,
    target: UserId,
}

#[derive(Debug, Clone, Copy)]
struct RecipientRow {
    mail: MailId,
    user: UserId,
    state: RecipientState,
}

#[derive(Debug, Default)]
struct State {
    users: Vec<User>,
    journals: Vec<Journal>,
    journal_likes: Vec<JoinRow<JournalId>>,
    saves: Vec<JoinRow<JournalId>>,
    comments: Vec<Comment>,
    comment_likes: Vec<JoinRow<CommentId>>,
    subscriptions: Vec<Edge>,
    mails: Vec<Mail>,
    recipients: Vec<RecipientRow>,
}

impl State {
    fn user_mut(&mut self, id: &UserId) -> Option<&mut User> {
        self.users.iter_mut().find(|user| user.id == *id)
    }

    fn journal(&self, id: &JournalId) -> Option<&Journal> {
        self.journals.iter().find(|journal| journal.id == *id)
    }

    fn comment(&self, id: &CommentId) -> Option<&Comment> {
        self.comments.iter().find(|comment| comment.id == *id)
    }

    fn journal_like_count(&self, id: &JournalId) -> u64 {
        count(self.journal_likes.iter().filter(|row| row.target == *id))
    }

    fn comment_like_count(&self, id: &CommentId) -> u64 {
        count(self.comment_likes.iter().filter(|row| row.target == *id))
    }

    /// Remove comments together with their direct replies.
    fn remove_comments(&mut self, doomed: &[CommentId]) -> u64 {
        let replies: Vec<CommentId> = self
            .comments
            .iter()
            .filter(|comment| comment.parent_id.is_some_and(|parent| doomed.contains(&parent)))
            .map(|comment| comment.id)
            .collect();
        let doomed = [doomed, replies.as_slice()].concat();
        let before = self.comments.len();
        self.comments.retain(|comment| !doomed.contains(&comment.id));
        self.comment_likes.retain(|row| !doomed.contains(&row.target));
        u64::try_from(before - self.comments.len()).unwrap_or(u64::MAX)
    }

    fn remove_journals(&mut self, doomed: &[JournalId]) -> usize {
        let before = self.journals.len();
        self.journals.retain(|journal| !doomed.contains(&journal.id));
        self.journal_likes.retain(|row| !doomed.contains(&row.target));
        self.saves.retain(|row| !doomed.contains(&row.target));
        let orphaned: Vec<CommentId> = self
            .comments
            .iter()
            .filter(|comment| doomed.contains(&comment.journal_id))
            .map(|comment| comment.id)
            .collect();
        self.remove_comments(&orphaned);
        for mail in &mut self.mails {
            if mail.journal_id.is_some_and(|id| doomed.contains(&id)) {
                mail.journal_id = None;
            }
        }
        before - self.journals.len()
    }
}

fn count<I: Iterator>(iter: I) -> u64 {
    u64::try_from(iter.count()).unwrap_or(u64::MAX)
}

/// Newest first; ties keep the most recent insert first.
fn newest_first<'a, T: 'a>(
    rows: impl DoubleEndedIterator<Item = &'a T>,
    created_at: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<&'a T> {
    let mut sorted: Vec<&T> = rows.rev().collect();
    sorted.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    sorted
}

/// Remove the row for `(target, user)` if present, otherwise add it.
/// Returns whether the row exists afterwards.
fn toggle_row<T: PartialEq + Copy>(
    rows: &mut Vec<JoinRow<T>>,
    target: T,
    user: UserId,
    now: DateTime<Utc>,
) -> bool {
    if let Some(pos) = rows
        .iter()
        .position(|row| row.target == target && row.user == user)
    {
        rows.remove(pos);
        false
    } else {
        rows.push(JoinRow {
            target,
            user,
            created_at: now,
        });
        true
    }
}

fn window<T: Clone>(items: &[T], skip: u64, limit: u32) -> Vec<T> {
    let skip = usize::try_from(skip).unwrap_or(usize::MAX);
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    items.iter().skip(skip).take(limit).cloned().collect()
}

fn page_of<T: Clone>(items: &[T], request: PageRequest) -> Page<T> {
    Page::new(request.window(items), request, count(items.iter()))
}

/// Shared in-memory store. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
