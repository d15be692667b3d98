//! HTTP inbound adapter exposing the REST endpoints under `/api/v1`.

use actix_web::web;

pub mod accounts;
pub mod comments;
pub mod engagement;
pub mod error;
pub mod feed;
pub mod health;
pub mod journal_dto;
pub mod journals;
pub mod mail;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
pub mod subscriptions;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;

/// Register every `/api/v1` handler.
///
/// Actix matches routes in registration order, so fixed paths such as
/// `/journals/public` and `/users/me` come before their `{slug}` / `{id}`
/// siblings.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(validation::json_config())
        .app_data(validation::query_config())
        .service(accounts::signup)
        .service(accounts::login)
        .service(accounts::logout)
        .service(users::current_user)
        .service(users::update_current_user)
        .service(users::delete_current_user)
        .service(users::public_profile)
        .service(users::subscribers)
        .service(journals::create_journal)
        .service(journals::list_public)
        .service(journals::list_by_tag)
        .service(journals::list_own)
        .service(journals::list_collections)
        .service(engagement::saved_journals)
        .service(journals::get_journal)
        .service(journals::update_journal)
        .service(journals::delete_journal)
        .service(engagement::like_journal)
        .service(engagement::save_journal)
        .service(engagement::journal_likers)
        .service(comments::list_comments)
        .service(comments::create_comment)
        .service(comments::like_comment)
        .service(comments::delete_comment)
        .service(subscriptions::toggle_subscription)
        .service(subscriptions::list_subscriptions)
        .service(subscriptions::mark_checked)
        .service(feed::get_feed)
        .service(mail::list_mails)
        .service(mail::send_system_mail)
        .service(mail::mark_read)
        .service(mail::claim_reward)
        .service(mail::delete_mail);
}
