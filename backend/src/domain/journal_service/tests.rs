//! Unit tests for the entry store service.

use std::collections::HashMap;
use std::sync::Arc;

use pagination::{Page, PageRequest};
use rstest::rstest;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::{MockEngagementRepository, MockJournalRepository, MockUserRepository};
use crate::test_support::{MutableClock, fixed_now, sample_draft, sample_journal, sample_user};

struct Mocks {
    journals: MockJournalRepository,
    engagement: MockEngagementRepository,
    users: MockUserRepository,
}

impl Mocks {
    fn new() -> Self {
        Self {
            journals: MockJournalRepository::new(),
            engagement: MockEngagementRepository::new(),
            users: MockUserRepository::new(),
        }
    }

    fn with_user(mut self, user: &User) -> Self {
        let stored = user.clone();
        self.users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        self
    }

    fn into_service(self) -> JournalService {
        JournalService::new(
            Arc::new(self.journals),
            Arc::new(self.engagement),
            Arc::new(self.users),
            Arc::new(MutableClock::new(fixed_now())),
        )
    }
}

#[rstest]
#[tokio::test]
async fn publish_takes_the_first_free_slug() {
    let author = sample_user("Dreamer");
    let mut mocks = Mocks::new().with_user(&author);
    mocks
        .journals
        .expect_slugs_with_prefix()
        .withf(|prefix| prefix == "my-day")
        .return_once(|_| Ok(vec!["my-day".to_owned(), "my-day-3".to_owned()]));
    mocks
        .journals
        .expect_insert()
        .withf(|journal| journal.slug.as_str() == "my-day-2")
        .times(1)
        .return_once(|_| Ok(()));

    let view = mocks
        .into_service()
        .publish(&author.id, sample_draft("My Day", &["Life"], true))
        .await
        .expect("publish succeeds");

    assert_eq!(view.journal.slug.as_str(), "my-day-2");
    assert_eq!(view.journal.tags.as_slice(), ["life"]);
    assert_eq!(
        view.journal.author_name.as_deref(),
        Some(author.anonymous_name.as_str())
    );
    assert_eq!(view.engagement.like_count, 0);
}

#[rstest]
#[tokio::test]
async fn publish_retries_after_losing_a_slug_race() {
    let author = sample_user("Dreamer");
    let mut mocks = Mocks::new().with_user(&author);
    let mut lookups = 0;
    mocks
        .journals
        .expect_slugs_with_prefix()
        .times(2)
        .returning(move |_| {
            lookups += 1;
            Ok(if lookups == 1 {
                Vec::new()
            } else {
                vec!["rain".to_owned()]
            })
        });
    let mut inserts = 0;
    mocks
        .journals
        .expect_insert()
        .times(2)
        .returning(move |journal| {
            inserts += 1;
            if inserts == 1 {
                Err(JournalRepositoryError::duplicate_slug(journal.slug.as_str()))
            } else {
                Ok(())
            }
        });

    let view = mocks
        .into_service()
        .publish(&author.id, sample_draft("Rain", &[], false))
        .await
        .expect("second attempt succeeds");
    assert_eq!(view.journal.slug.as_str(), "rain-2");
    assert_eq!(view.journal.author_name, None);
}

#[rstest]
#[tokio::test]
async fn update_by_another_user_is_forbidden() {
    let author = sample_user("Author");
    let intruder = sample_user("Intruder");
    let journal = sample_journal(&author, "Mine", true, fixed_now());
    let journal_id = journal.id;
    let mut mocks = Mocks::new();
    mocks
        .journals
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(journal)));
    mocks.journals.expect_update().never();

    let err = mocks
        .into_service()
        .update(&journal_id, &intruder.id, JournalUpdate::default())
        .await
        .expect_err("not the author");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn private_entries_are_hidden_from_other_viewers() {
    let author = sample_user("Author");
    let journal = sample_journal(&author, "Secret", false, fixed_now());
    let slug = journal.slug.clone();
    let mut mocks = Mocks::new();
    mocks
        .journals
        .expect_find_by_slug()
        .returning(move |_| Ok(Some(journal.clone())));
    mocks.engagement.expect_likers().returning(|_| Ok(Vec::new()));
    mocks
        .engagement
        .expect_engagement_for()
        .returning(|_, _| Ok(HashMap::new()));
    let service = mocks.into_service();

    let err = service
        .get_by_slug(&slug, Some(UserId::random()))
        .await
        .expect_err("hidden");
    assert_eq!(err.code(), ErrorCode::NotFound);

    let detail = service
        .get_by_slug(&slug, Some(author.id))
        .await
        .expect("author sees own entry");
    assert_eq!(detail.view.journal.slug, slug);
}

#[rstest]
#[case("fantasy")]
#[case("FANTASY")]
#[case("  Fantasy ")]
#[tokio::test]
async fn tag_queries_are_case_insensitive(#[case] raw_tag: &str) {
    let author = sample_user("Author");
    let mut tagged = sample_journal(&author, "Dragons", true, fixed_now());
    tagged.tags = crate::domain::Tags::new(["Fantasy"]).expect("tags");
    let mut mocks = Mocks::new();
    mocks
        .journals
        .expect_list_public()
        .withf(|filter, _| filter.tag.as_deref() == Some("fantasy"))
        .times(1)
        .return_once(move |filter, page| {
            let matches = filter
                .tag
                .as_deref()
                .is_some_and(|tag| tagged.tags.contains(tag));
            let items = if matches { vec![tagged] } else { Vec::new() };
            let total = items.len() as u64;
            Ok(Page::new(items, page, total))
        });
    mocks
        .engagement
        .expect_engagement_for()
        .returning(|_, _| Ok(HashMap::new()));

    let page = mocks
        .into_service()
        .list_by_tag(raw_tag, None, JournalSort::Newest, PageRequest::first(), None)
        .await
        .expect("listing succeeds");
    assert_eq!(page.items().len(), 1);
}

#[rstest]
#[tokio::test]
async fn collections_are_sorted_with_all_first() {
    let mut mocks = Mocks::new();
    mocks.journals.expect_collections().return_once(|_| {
        Ok(vec![
            "Travel".to_owned(),
            "All".to_owned(),
            "Dreams".to_owned(),
            "Travel".to_owned(),
        ])
    });

    let collections = mocks
        .into_service()
        .collections(&UserId::random())
        .await
        .expect("collections");
    assert_eq!(collections, ["All", "Dreams", "Travel"]);
}

#[rstest]
#[tokio::test]
async fn blank_tags_are_rejected() {
    let err = Mocks::new()
        .into_service()
        .list_by_tag("   ", None, JournalSort::Newest, PageRequest::first(), None)
        .await
        .expect_err("blank tag");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}
