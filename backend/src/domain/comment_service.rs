//! Comment threads on public entries.

use std::sync::Arc;

use mockable::Clock;
use pagination::{Page, PageRequest};
use serde_json::json;
use tracing::debug;

use super::ports::{CommentRepository, JournalRepository, UserRepository};
use super::{
    Comment, CommentBody, CommentId, CommentView, Error, Journal, JournalId, LikeToggle,
    NotificationEvent, Notifier, User, UserId,
};

/// Input for a new comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub journal_id: JournalId,
    pub user_id: UserId,
    pub content: CommentBody,
    pub parent_id: Option<CommentId>,
}

fn invalid_parent(message: &str, code: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": "parentId",
        "code": code,
    }))
}

/// Comment use-cases.
#[derive(Clone)]
pub struct CommentService {
    journals: Arc<dyn JournalRepository>,
    comments: Arc<dyn CommentRepository>,
    users: Arc<dyn UserRepository>,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
}

impl CommentService {
    pub fn new(
        journals: Arc<dyn JournalRepository>,
        comments: Arc<dyn CommentRepository>,
        users: Arc<dyn UserRepository>,
        notifier: Notifier,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            journals,
            comments,
            users,
            notifier,
            clock,
        }
    }

    async fn require_user(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("user not found"))
    }

    async fn require_journal(&self, id: &JournalId) -> Result<Journal, Error> {
        self.journals
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("journal not found"))
    }

    async fn check_parent(&self, parent_id: &CommentId, journal_id: &JournalId) -> Result<(), Error> {
        let parent = self
            .comments
            .find_by_id(parent_id)
            .await?
            .ok_or_else(|| Error::not_found("parent comment not found"))?;
        if parent.journal_id != *journal_id {
            return Err(invalid_parent(
                "parent comment belongs to another entry",
                "parent_mismatch",
            ));
        }
        if parent.is_reply() {
            return Err(invalid_parent(
                "replies cannot be nested more than one level",
                "reply_depth_exceeded",
            ));
        }
        Ok(())
    }

    /// Post a comment or a reply on a public entry.
    pub async fn create(&self, input: NewComment) -> Result<Comment, Error> {
        let journal = self.require_journal(&input.journal_id).await?;
        if !journal.is_public {
            return Err(Error::forbidden("comments are only allowed on public entries"));
        }
        if let Some(parent_id) = &input.parent_id {
            self.check_parent(parent_id, &journal.id).await?;
        }
        let author = self.require_user(&input.user_id).await?;

        let comment = Comment {
            id: CommentId::random(),
            journal_id: journal.id,
            user_id: author.id,
            parent_id: input.parent_id,
            content: input.content,
            author_name: author.anonymous_name.clone(),
            profile_theme: author.profile_theme.clone(),
            created_at: self.clock.utc(),
        };
        self.comments.insert(&comment).await?;
        debug!(comment_id = %comment.id, journal_id = %journal.id, "comment created");

        self.notifier
            .notify(NotificationEvent::NewComment {
                recipient: journal.author_id,
                sender: author.id,
                sender_name: author.anonymous_name,
                journal_id: journal.id,
                journal_title: journal.title.as_str().to_owned(),
                excerpt: comment.content.as_str().to_owned(),
            })
            .await;
        Ok(comment)
    }

    /// Like or unlike a comment on an entry the user can see.
    pub async fn toggle_like(&self, id: &CommentId, user: &UserId) -> Result<LikeToggle, Error> {
        let comment = self
            .comments
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("comment not found"))?;
        let journal = self.require_journal(&comment.journal_id).await?;
        if !journal.is_visible_to(Some(user)) {
            return Err(Error::not_found("comment not found"));
        }

        let toggle = self.comments.toggle_like(id, user, self.clock.utc()).await?;
        debug!(comment_id = %id, %user, liked = toggle.liked, "comment like toggled");

        if toggle.liked && comment.user_id != *user {
            let liker = self.require_user(user).await?;
            self.notifier
                .notify(NotificationEvent::NewCommentLike {
                    recipient: comment.user_id,
                    sender: *user,
                    sender_name: liker.anonymous_name,
                    journal_id: comment.journal_id,
                    excerpt: comment.content.as_str().to_owned(),
                })
                .await;
        }
        Ok(toggle)
    }

    /// Delete a comment and its replies. Only the comment author may do so.
    ///
    /// Returns how many comments were removed.
    pub async fn delete(&self, id: &CommentId, user: &UserId) -> Result<u64, Error> {
        let comment = self
            .comments
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("comment not found"))?;
        if comment.user_id != *user {
            return Err(Error::forbidden("only the author may delete this comment"));
        }
        let removed = self.comments.delete_with_replies(id).await?;
        if removed == 0 {
            return Err(Error::not_found("comment not found"));
        }
        debug!(comment_id = %id, removed, "comment deleted");
        Ok(removed)
    }

    /// Comments on an entry, newest first.
    pub async fn list(
        &self,
        journal_id: &JournalId,
        viewer: Option<UserId>,
        page: PageRequest,
    ) -> Result<Page<CommentView>, Error> {
        let journal = self.require_journal(journal_id).await?;
        if !journal.is_visible_to(viewer.as_ref()) {
            return Err(Error::not_found("journal not found"));
        }
        Ok(self.comments.list_for_journal(journal_id, viewer, page).await?)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{
        MockCommentRepository, MockJournalRepository, MockMailRepository, MockUserRepository,
    };
    use crate::domain::{ErrorCode, MailKind};
    use crate::test_support::{MutableClock, fixed_now, sample_journal, sample_user};
    use rstest::rstest;

    struct Mocks {
        journals: MockJournalRepository,
        comments: MockCommentRepository,
        users: MockUserRepository,
        mails: MockMailRepository,
    }

    impl Mocks {
        fn new(journal: Journal, users: Vec<User>) -> Self {
            let mut journals = MockJournalRepository::new();
            journals
                .expect_find_by_id()
                .returning(move |_| Ok(Some(journal.clone())));
            let mut user_repo = MockUserRepository::new();
            user_repo
                .expect_find_by_id()
                .returning(move |id| Ok(users.iter().find(|user| user.id == *id).cloned()));
            Self {
                journals,
                comments: MockCommentRepository::new(),
                users: user_repo,
                mails: MockMailRepository::new(),
            }
        }

        fn into_service(self) -> CommentService {
            let clock: Arc<dyn Clock> = Arc::new(MutableClock::new(fixed_now()));
            CommentService::new(
                Arc::new(self.journals),
                Arc::new(self.comments),
                Arc::new(self.users),
                Notifier::new(Arc::new(self.mails), clock.clone()),
                clock,
            )
        }
    }

    fn stored_comment(journal: &Journal, author: &User, parent: Option<CommentId>) -> Comment {
        Comment {
            id: CommentId::random(),
            journal_id: journal.id,
            user_id: author.id,
            parent_id: parent,
            content: CommentBody::new("Lovely words").expect("body"),
            author_name: author.anonymous_name.clone(),
            profile_theme: author.profile_theme.clone(),
            created_at: fixed_now(),
        }
    }

    fn new_comment(journal: &Journal, user: &User, parent: Option<CommentId>) -> NewComment {
        NewComment {
            journal_id: journal.id,
            user_id: user.id,
            content: CommentBody::new("  So true  ").expect("body"),
            parent_id: parent,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn comments_snapshot_the_author_and_notify_the_entry_author() {
        let author = sample_user("Author");
        let reader = sample_user("Reader");
        let journal = sample_journal(&author, "Dawn", true, fixed_now());
        let input = new_comment(&journal, &reader, None);
        let author_id = author.id;
        let mut mocks = Mocks::new(journal, vec![author, reader.clone()]);
        mocks.comments.expect_insert().times(1).returning(|_| Ok(()));
        mocks
            .mails
            .expect_insert()
            .withf(move |mail, recipients| {
                mail.kind == MailKind::NewComment
                    && mail.content.contains("So true")
                    && recipients == [author_id]
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let comment = mocks.into_service().create(input).await.expect("comment");
        assert_eq!(comment.content.as_str(), "So true");
        assert_eq!(comment.author_name, reader.anonymous_name);
        assert!(!comment.is_reply());
    }

    #[rstest]
    #[tokio::test]
    async fn private_entries_reject_comments() {
        let author = sample_user("Author");
        let journal = sample_journal(&author, "Secret", false, fixed_now());
        let input = new_comment(&journal, &author, None);
        let mut mocks = Mocks::new(journal, vec![author]);
        mocks.comments.expect_insert().never();

        let err = mocks.into_service().create(input).await.expect_err("private");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn replies_to_replies_are_rejected() {
        let author = sample_user("Author");
        let journal = sample_journal(&author, "Dawn", true, fixed_now());
        let top = stored_comment(&journal, &author, None);
        let reply = stored_comment(&journal, &author, Some(top.id));
        let input = new_comment(&journal, &author, Some(reply.id));
        let mut mocks = Mocks::new(journal, vec![author]);
        mocks
            .comments
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(reply)));
        mocks.comments.expect_insert().never();

        let err = mocks.into_service().create(input).await.expect_err("too deep");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        let details = err.details().expect("details");
        assert_eq!(details["code"], "reply_depth_exceeded");
    }

    #[rstest]
    #[tokio::test]
    async fn parents_must_belong_to_the_same_entry() {
        let author = sample_user("Author");
        let journal = sample_journal(&author, "Dawn", true, fixed_now());
        let other = sample_journal(&author, "Dusk", true, fixed_now());
        let foreign = stored_comment(&other, &author, None);
        let input = new_comment(&journal, &author, Some(foreign.id));
        let mut mocks = Mocks::new(journal, vec![author]);
        mocks
            .comments
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(foreign)));

        let err = mocks.into_service().create(input).await.expect_err("mismatch");
        assert_eq!(err.details().expect("details")["code"], "parent_mismatch");
    }

    #[rstest]
    #[tokio::test]
    async fn only_the_comment_author_may_delete() {
        let author = sample_user("Author");
        let reader = sample_user("Reader");
        let journal = sample_journal(&author, "Dawn", true, fixed_now());
        let comment = stored_comment(&journal, &reader, None);
        let comment_id = comment.id;
        let mut mocks = Mocks::new(journal, vec![author.clone(), reader.clone()]);
        mocks
            .comments
            .expect_find_by_id()
            .returning(move |_| Ok(Some(comment.clone())));
        mocks
            .comments
            .expect_delete_with_replies()
            .times(1)
            .return_once(|_| Ok(3));
        let service = mocks.into_service();

        let err = service
            .delete(&comment_id, &author.id)
            .await
            .expect_err("entry author is not the comment author");
        assert_eq!(err.code(), ErrorCode::Forbidden);

        let removed = service.delete(&comment_id, &reader.id).await.expect("delete");
        assert_eq!(removed, 3);
    }

    #[rstest]
    #[tokio::test]
    async fn comment_likes_notify_the_comment_author() {
        let author = sample_user("Author");
        let reader = sample_user("Reader");
        let journal = sample_journal(&author, "Dawn", true, fixed_now());
        let comment = stored_comment(&journal, &author, None);
        let comment_id = comment.id;
        let author_id = author.id;
        let mut mocks = Mocks::new(journal, vec![author, reader.clone()]);
        mocks
            .comments
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(comment)));
        mocks.comments.expect_toggle_like().return_once(|_, _, _| {
            Ok(LikeToggle {
                liked: true,
                like_count: 1,
            })
        });
        mocks
            .mails
            .expect_insert()
            .withf(move |mail, recipients| {
                mail.kind == MailKind::NewCommentLike && recipients == [author_id]
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let toggle = mocks
            .into_service()
            .toggle_like(&comment_id, &reader.id)
            .await
            .expect("like");
        assert_eq!(toggle.like_count, 1);
    }
}
