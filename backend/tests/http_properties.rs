//! End-to-end properties of the journal API over the in-memory store.

#[allow(dead_code)]
#[path = "support/api.rs"]
mod support_api;

use std::collections::HashSet;

use actix_web::http::StatusCode;
use backend::domain::ports::CommentRepository;
use backend::domain::{Comment, CommentBody, CommentId, ProfileTheme};
use chrono::Utc;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use support_api::{Account, TestApi};

#[fixture]
fn api() -> TestApi {
    TestApi::new()
}

async fn detail(api: &TestApi, slug: &str, viewer: Option<&Account>) -> Value {
    let reply = api.get(&format!("/api/v1/journals/{slug}"), viewer).await;
    assert_eq!(reply.status, StatusCode::OK);
    reply.body
}

async fn toggle_like(api: &TestApi, id: &str, who: &Account) -> Value {
    let reply = api
        .post(&format!("/api/v1/journals/{id}/like"), who, None)
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    reply.body
}

#[rstest]
#[actix_web::test]
async fn liking_twice_restores_the_original_state(api: TestApi) {
    let author = api.signup("Quill Owl").await;
    let reader = api.signup("Eager Owl").await;
    let id = api.publish(&author, "Morning pages", &[]).await;

    let first = toggle_like(&api, &id, &reader).await;
    assert_eq!(first, json!({ "likeCount": 1, "isLiked": true }));
    let second = toggle_like(&api, &id, &reader).await;
    assert_eq!(second, json!({ "likeCount": 0, "isLiked": false }));
}

#[rstest]
#[actix_web::test]
async fn like_count_always_matches_the_likers(api: TestApi) {
    let author = api.signup("Counting Owl").await;
    let fans = [
        api.signup("Fan One").await,
        api.signup("Fan Two").await,
        api.signup("Fan Three").await,
    ];
    let id = api.publish(&author, "Tally", &[]).await;
    let slug = api.slug_of(&author, &id).await;

    for fan in fans.iter().chain(fans.iter().take(2)) {
        toggle_like(&api, &id, fan).await;
        let body = detail(&api, &slug, None).await;
        let likes = body["likes"].as_array().expect("likes").len() as u64;
        assert_eq!(body["likeCount"].as_u64(), Some(likes));
    }
    let body = detail(&api, &slug, Some(&fans[2])).await;
    assert_eq!(body["likes"], json!([fans[2].id]));
    assert_eq!(body["isLiked"], true);
}

#[rstest]
#[actix_web::test]
async fn self_subscription_changes_nothing(api: TestApi) {
    let owl = api.signup("Mirror Owl").await;
    let reply = api
        .post(
            "/api/v1/subscribe",
            &owl,
            Some(json!({ "targetUserId": owl.id })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let profile = api.get(&format!("/api/v1/users/{}", owl.id), None).await;
    assert_eq!(profile.body["subscriberCount"], 0);
    let following = api.get("/api/v1/subscriptions", Some(&owl)).await;
    assert_eq!(following.body, json!([]));
}

#[rstest]
#[actix_web::test]
async fn subscribing_twice_restores_both_sides(api: TestApi) {
    let reader = api.signup("Loyal Owl").await;
    let writer = api.signup("Famous Owl").await;
    let before = api.get(&format!("/api/v1/users/{}", writer.id), None).await;

    for expected in [true, false] {
        let reply = api
            .post(
                "/api/v1/subscribe",
                &reader,
                Some(json!({ "targetUserId": writer.id })),
            )
            .await;
        assert_eq!(reply.body["subscribed"], expected);
    }

    let after = api.get(&format!("/api/v1/users/{}", writer.id), None).await;
    assert_eq!(after.body["subscriberCount"], before.body["subscriberCount"]);
    let followers = api
        .get(&format!("/api/v1/users/{}/subscribers", writer.id), None)
        .await;
    assert_eq!(followers.body, json!([]));
    let following = api.get("/api/v1/subscriptions", Some(&reader)).await;
    assert_eq!(following.body, json!([]));
}

#[rstest]
#[actix_web::test]
async fn deleting_a_comment_takes_its_replies_only(api: TestApi) {
    let owl = api.signup("Gardener Owl").await;
    let journal = api.publish(&owl, "Pruning", &[]).await;
    let comment = |content: &str, parent: Option<&str>| {
        json!({ "journalId": journal, "content": content, "parentId": parent })
    };

    let top = api
        .post("/api/v1/comments", &owl, Some(comment("root", None)))
        .await
        .body;
    let top_id = top["id"].as_str().expect("id").to_owned();
    let mut replies = Vec::new();
    for text in ["left", "right"] {
        let reply = api
            .post("/api/v1/comments", &owl, Some(comment(text, Some(&top_id))))
            .await;
        replies.push(reply.body["id"].as_str().expect("id").to_owned());
    }

    let grandchild = Comment {
        id: CommentId::random(),
        journal_id: journal.parse().expect("journal id"),
        user_id: owl.id.parse().expect("user id"),
        parent_id: Some(replies[0].parse().expect("reply id")),
        content: CommentBody::new("leaf").expect("body"),
        author_name: "Imported".into(),
        profile_theme: ProfileTheme::default(),
        created_at: Utc::now(),
    };
    CommentRepository::insert(&api.store, &grandchild)
        .await
        .expect("insert grandchild");

    let deleted = api
        .delete(&format!("/api/v1/comments/{top_id}"), &owl)
        .await;
    assert_eq!(deleted.body["deleted"], 3);

    let remaining = api
        .get(&format!("/api/v1/journals/{journal}/comments"), None)
        .await;
    let ids: Vec<&str> = remaining.body["comments"]
        .as_array()
        .expect("comments")
        .iter()
        .filter_map(|c| c["id"].as_str())
        .collect();
    assert_eq!(ids, [grandchild.id.to_string().as_str()]);
}

#[rstest]
#[case("fantasy")]
#[case("FANTASY")]
#[case("Fantasy")]
#[actix_web::test]
async fn tag_lookup_ignores_case(api: TestApi, #[case] query: &str) {
    let owl = api.signup("Dreaming Owl").await;
    let id = api.publish(&owl, "Dragons", &["Fantasy"]).await;
    api.publish(&owl, "Taxes", &["Life"]).await;

    let reply = api
        .get(&format!("/api/v1/journals/by-tag/{query}"), None)
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["total"], 1);
    assert_eq!(reply.body["journals"][0]["id"], id.as_str());
}

#[rstest]
#[actix_web::test]
async fn feed_leads_with_followed_authors_without_repeats(api: TestApi) {
    let reader = api.signup("Curious Owl").await;
    let followed = api.signup("Beloved Owl").await;
    let crowd = api.signup("Busy Owl").await;

    let mut followed_ids = HashSet::new();
    for n in 0..3 {
        followed_ids.insert(api.publish(&followed, &format!("Letter {n}"), &[]).await);
    }
    for n in 0..7 {
        api.publish(&crowd, &format!("Note {n}"), &[]).await;
    }
    api.post(
        "/api/v1/subscribe",
        &reader,
        Some(json!({ "targetUserId": followed.id })),
    )
    .await;

    let page = api.get("/api/v1/feed?limit=5", Some(&reader)).await.body;
    let items = page["journals"].as_array().expect("items");
    assert_eq!(items.len(), 5);
    let ids: Vec<String> = items
        .iter()
        .filter_map(|item| item["id"].as_str().map(str::to_owned))
        .collect();
    assert!(ids[..3].iter().all(|id| followed_ids.contains(id)));
    assert!(ids[3..].iter().all(|id| !followed_ids.contains(id)));
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 5);
    assert!(
        items[..3]
            .iter()
            .all(|item| item["fromSubscription"] == true)
    );
}

#[rstest]
#[actix_web::test]
async fn authenticated_endpoints_reject_anonymous_callers(api: TestApi) {
    for uri in [
        "/api/v1/users/me",
        "/api/v1/journals/mine",
        "/api/v1/feed",
        "/api/v1/mails",
        "/api/v1/subscriptions",
    ] {
        let reply = api.get(uri, None).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(reply.body["code"], "unauthorized");
    }
}
