//! Integration tests for `DieselJournalRepository` against embedded PostgreSQL.
//!
//! Covers the listing queries the feed and the public browse pages rely on:
//! popularity and tag filters, the followed/other author windows, and the
//! per-author count of new entries.

use backend::domain::ports::{EngagementRepository, JournalRepository};
use backend::domain::{JournalId, JournalSort, PublicJournalFilter};
use chrono::Duration;
use pagination::PageRequest;
use rstest::rstest;

mod support;

use support::diesel_context::{diesel_context, now};
use support::DieselContext;

fn ids(journals: &[backend::domain::Journal]) -> Vec<JournalId> {
    journals.iter().map(|journal| journal.id).collect()
}

#[rstest]
fn popular_listing_orders_by_likes_then_recency(diesel_context: Option<DieselContext>) {
    let Some(ctx) = diesel_context else {
        eprintln!("SKIP-TEST-CLUSTER: popular_listing_orders_by_likes_then_recency skipped");
        return;
    };
    let at = now();
    let author = ctx.add_user("Author");
    let fans = [ctx.add_user("Fan One"), ctx.add_user("Fan Two")];
    let old_hit = ctx.add_journal(&author, "Old hit", &[], true, at - Duration::hours(5));
    let fresh = ctx.add_journal(&author, "Fresh", &[], true, at);
    let middle = ctx.add_journal(&author, "Middle", &[], true, at - Duration::hours(2));
    ctx.add_journal(&author, "Hidden", &[], false, at);

    let engagement = ctx.engagement();
    ctx.block_on(async {
        for fan in &fans {
            engagement
                .toggle_journal_like(&old_hit.id, &fan.id, at)
                .await
                .expect("like old hit");
        }
        engagement
            .toggle_journal_like(&middle.id, &fans[0].id, at)
            .await
            .expect("like middle");
    });

    let filter = PublicJournalFilter {
        sort: JournalSort::Popular,
        ..PublicJournalFilter::default()
    };
    let page = ctx
        .block_on(ctx.journals().list_public(&filter, PageRequest::first()))
        .expect("popular listing");

    assert_eq!(ids(page.items()), [old_hit.id, middle.id, fresh.id]);
    assert_eq!(page.total(), 3);
}

#[rstest]
fn tag_filter_matches_normalised_tags_only(diesel_context: Option<DieselContext>) {
    let Some(ctx) = diesel_context else {
        eprintln!("SKIP-TEST-CLUSTER: tag_filter_matches_normalised_tags_only skipped");
        return;
    };
    let at = now();
    let author = ctx.add_user("Author");
    let tagged = ctx.add_journal(&author, "Tagged", &["Life", "Travel"], true, at);
    ctx.add_journal(&author, "Untagged", &["Work"], true, at);
    ctx.add_journal(&author, "Private", &["life"], false, at);

    let filter = PublicJournalFilter {
        tag: Some("life".to_owned()),
        ..PublicJournalFilter::default()
    };
    let page = ctx
        .block_on(ctx.journals().list_public(&filter, PageRequest::first()))
        .expect("tag listing");

    assert_eq!(ids(page.items()), [tagged.id]);
}

#[rstest]
fn feed_windows_split_followed_and_other_authors(diesel_context: Option<DieselContext>) {
    let Some(ctx) = diesel_context else {
        eprintln!("SKIP-TEST-CLUSTER: feed_windows_split_followed_and_other_authors skipped");
        return;
    };
    let at = now();
    let followed = ctx.add_user("Followed");
    let stranger = ctx.add_user("Stranger");
    let newest = ctx.add_journal(&followed, "Newest", &[], true, at);
    let older = ctx.add_journal(&followed, "Older", &[], true, at - Duration::hours(1));
    let oldest = ctx.add_journal(&followed, "Oldest", &[], true, at - Duration::hours(2));
    ctx.add_journal(&followed, "Draft", &[], false, at);
    let other = ctx.add_journal(&stranger, "Other", &[], true, at);

    let journals = ctx.journals();
    let (first, second, rest) = ctx.block_on(async {
        let authors = [followed.id];
        (
            journals
                .list_public_by_authors(&authors, 0, 2)
                .await
                .expect("first window"),
            journals
                .list_public_by_authors(&authors, 2, 2)
                .await
                .expect("second window"),
            journals
                .list_public_excluding_authors(&authors, 0, 10)
                .await
                .expect("other authors"),
        )
    });

    assert_eq!(ids(&first.journals), [newest.id, older.id]);
    assert_eq!(first.total, 3);
    assert_eq!(ids(&second.journals), [oldest.id]);
    assert_eq!(second.total, 3);
    assert_eq!(ids(&rest.journals), [other.id]);
    assert_eq!(rest.total, 1);
}

#[rstest]
fn new_entries_are_counted_per_author_after_the_check(diesel_context: Option<DieselContext>) {
    let Some(ctx) = diesel_context else {
        eprintln!("SKIP-TEST-CLUSTER: new_entries_are_counted_per_author_after_the_check skipped");
        return;
    };
    let at = now();
    let since = at - Duration::hours(3);
    let busy = ctx.add_user("Busy");
    let quiet = ctx.add_user("Quiet");
    let idle = ctx.add_user("Idle");
    ctx.add_journal(&busy, "One", &[], true, at - Duration::hours(1));
    ctx.add_journal(&busy, "Two", &[], true, at - Duration::hours(2));
    ctx.add_journal(&busy, "Before", &[], true, at - Duration::hours(4));
    ctx.add_journal(&busy, "Secret", &[], false, at);
    ctx.add_journal(&quiet, "Only", &[], true, at);
    ctx.add_journal(&idle, "Ancient", &[], true, at - Duration::days(2));

    let counts = ctx
        .block_on(
            ctx.journals()
                .count_public_since(&[busy.id, quiet.id, idle.id], since),
        )
        .expect("grouped counts");

    assert_eq!(counts.get(&busy.id), Some(&2));
    assert_eq!(counts.get(&quiet.id), Some(&1));
    assert!(!counts.contains_key(&idle.id));
}

#[rstest]
fn deleting_an_entry_removes_its_likes(diesel_context: Option<DieselContext>) {
    let Some(ctx) = diesel_context else {
        eprintln!("SKIP-TEST-CLUSTER: deleting_an_entry_removes_its_likes skipped");
        return;
    };
    let at = now();
    let author = ctx.add_user("Author");
    let fan = ctx.add_user("Fan");
    let journal = ctx.add_journal(&author, "Short lived", &[], true, at);
    let engagement = ctx.engagement();
    let journals = ctx.journals();

    ctx.block_on(async {
        engagement
            .toggle_journal_like(&journal.id, &fan.id, at)
            .await
            .expect("like");
        assert!(journals.delete(&journal.id).await.expect("delete"));
        assert!(!journals.delete(&journal.id).await.expect("second delete"));
        assert!(engagement.likers(&journal.id).await.expect("likers").is_empty());
        assert_eq!(journals.find_by_id(&journal.id).await.expect("find"), None);
    });
}
