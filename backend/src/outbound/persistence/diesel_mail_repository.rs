//! PostgreSQL-backed `MailRepository` implementation.
//!
//! Mail rows are left-joined with the caller's recipient row. SQL narrows
//! the candidates to unexpired mail the user has a row for or live
//! broadcasts; the final decision always goes through [`Mail::is_visible`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{MailRepository, MailRepositoryError};
use crate::domain::{ClaimOutcome, Mail, MailId, MailboxEntry, RecipientState, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{MailRow, NewMailRow, RecipientRow};
use super::pool::{DbPool, PoolError};
use super::row_conversion::{mail_from_row, recipient_state};
use super::schema::{mail_recipients, mails, users};

/// Diesel-backed implementation of the mail repository port.
#[derive(Clone)]
pub struct DieselMailRepository {
    pool: DbPool,
}

impl DieselMailRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failures raised inside a mail transaction.
#[derive(Debug)]
enum TxError {
    Diesel(diesel::result::Error),
    Row(String),
}

impl From<diesel::result::Error> for TxError {
    fn from(value: diesel::result::Error) -> Self {
        Self::Diesel(value)
    }
}

impl From<TxError> for MailRepositoryError {
    fn from(value: TxError) -> Self {
        match value {
            TxError::Diesel(error) => map_diesel_error(error),
            TxError::Row(message) => Self::query(message),
        }
    }
}

fn map_pool_error(error: PoolError) -> MailRepositoryError {
    map_basic_pool_error(error, MailRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> MailRepositoryError {
    map_basic_diesel_error(
        error,
        MailRepositoryError::query,
        MailRepositoryError::connection,
    )
}

type MailWithRecipient = (Mail, Option<RecipientRow>);

fn convert(rows: Vec<(MailRow, Option<RecipientRow>)>) -> Result<Vec<MailWithRecipient>, String> {
    rows.into_iter()
        .map(|(mail, recipient)| Ok((mail_from_row(mail)?, recipient)))
        .collect()
}

fn visible(entry: &MailWithRecipient, now: DateTime<Utc>) -> bool {
    let (mail, recipient) = entry;
    mail.is_visible(recipient.as_ref().map(recipient_state).as_ref(), now)
}

/// Unexpired candidate mail for `user`, optionally narrowed to a single id.
async fn load_candidates(
    conn: &mut AsyncPgConnection,
    user: Uuid,
    only: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<Vec<MailWithRecipient>, TxError> {
    let mut query = mails::table
        .left_join(
            mail_recipients::table.on(mail_recipients::mail_id
                .eq(mails::id)
                .and(mail_recipients::user_id.eq(user))),
        )
        .filter(
            mail_recipients::mail_id
                .is_not_null()
                .and(mails::expiry_date.is_null().or(mails::expiry_date.gt(now)))
                .or(mails::is_system_mail
                    .and(mails::send_to_all_users)
                    .and(mails::expiry_date.gt(now))),
        )
        .into_boxed();
    if let Some(id) = only {
        query = query.filter(mails::id.eq(id));
    }

    let rows: Vec<(MailRow, Option<RecipientRow>)> = query
        .order((mails::created_at.desc(), mails::id.desc()))
        .select((MailRow::as_select(), Option::<RecipientRow>::as_select()))
        .load(conn)
        .await?;
    convert(rows).map_err(TxError::Row)
}

async fn visible_entry(
    conn: &mut AsyncPgConnection,
    mail: Uuid,
    user: Uuid,
    now: DateTime<Utc>,
) -> Result<Option<MailWithRecipient>, TxError> {
    Ok(load_candidates(conn, user, Some(mail), now)
        .await?
        .into_iter()
        .find(|entry| visible(entry, now)))
}

/// Write the user's recipient row, inserting it for untouched broadcasts.
async fn store_recipient(
    conn: &mut AsyncPgConnection,
    mail: Uuid,
    user: Uuid,
    state: RecipientState,
) -> Result<(), TxError> {
    let row = RecipientRow {
        mail_id: mail,
        user_id: user,
        read: state.read,
        reward_claimed: state.reward_claimed,
        received_at: state.received_at,
        deleted: state.deleted,
    };
    diesel::insert_into(mail_recipients::table)
        .values(&row)
        .on_conflict((mail_recipients::mail_id, mail_recipients::user_id))
        .do_update()
        .set((
            mail_recipients::read.eq(row.read),
            mail_recipients::reward_claimed.eq(row.reward_claimed),
            mail_recipients::deleted.eq(row.deleted),
        ))
        .execute(conn)
        .await?;
    Ok(())
}

/// Apply `change` to the visible mail's recipient state. Returns `false`
/// when the mail is not visible to the user.
async fn update_recipient(
    conn: &mut AsyncPgConnection,
    mail: Uuid,
    user: Uuid,
    now: DateTime<Utc>,
    change: fn(&mut RecipientState),
) -> Result<bool, TxError> {
    let Some((_, recipient)) = visible_entry(conn, mail, user, now).await? else {
        return Ok(false);
    };
    let mut state = recipient
        .as_ref()
        .map_or_else(|| RecipientState::unread(now), recipient_state);
    change(&mut state);
    store_recipient(conn, mail, user, state).await?;
    Ok(true)
}

impl DieselMailRepository {
    async fn with_recipient_change(
        &self,
        id: &MailId,
        user: &UserId,
        now: DateTime<Utc>,
        change: fn(&mut RecipientState),
    ) -> Result<bool, MailRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (mail, user) = (*id.as_uuid(), *user.as_uuid());
        conn.transaction(|conn| {
            async move { update_recipient(conn, mail, user, now, change).await }.scope_boxed()
        })
        .await
        .map_err(MailRepositoryError::from)
    }
}

#[async_trait]
impl MailRepository for DieselMailRepository {
    async fn insert(&self, mail: &Mail, recipients: &[UserId]) -> Result<(), MailRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewMailRow {
            id: *mail.id.as_uuid(),
            kind: mail.kind.as_str(),
            title: &mail.title,
            content: &mail.content,
            sender_id: mail.sender_id.map(|id| *id.as_uuid()),
            journal_id: mail.journal_id.map(|id| *id.as_uuid()),
            is_system_mail: mail.is_system_mail,
            send_to_all_users: mail.send_to_all_users,
            reward_coins: mail.reward_coins,
            expiry_date: mail.expiry_date,
            created_at: mail.created_at,
        };
        let recipient_rows: Vec<RecipientRow> = recipients
            .iter()
            .map(|user| RecipientRow {
                mail_id: row.id,
                user_id: *user.as_uuid(),
                read: false,
                reward_claimed: false,
                received_at: mail.created_at,
                deleted: false,
            })
            .collect();

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(mails::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                if !recipient_rows.is_empty() {
                    diesel::insert_into(mail_recipients::table)
                        .values(&recipient_rows)
                        .on_conflict_do_nothing()
                        .execute(conn)
                        .await?;
                }
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn mailbox(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<MailboxEntry>, MailRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let candidates = load_candidates(&mut conn, *user.as_uuid(), None, now).await?;
        Ok(candidates
            .into_iter()
            .filter(|entry| visible(entry, now))
            .map(|(mail, recipient)| {
                MailboxEntry::from_parts(mail, recipient.as_ref().map(recipient_state))
            })
            .collect())
    }

    async fn mark_read(
        &self,
        id: &MailId,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<bool, MailRepositoryError> {
        self.with_recipient_change(id, user, now, |state| state.read = true)
            .await
    }

    async fn claim_reward(
        &self,
        id: &MailId,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome, MailRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (mail_id, user_id) = (*id.as_uuid(), *user.as_uuid());

        conn.transaction(|conn| {
            async move {
                // Locking the account serialises concurrent claims by one user.
                users::table
                    .find(user_id)
                    .select(users::id)
                    .for_update()
                    .first::<Uuid>(conn)
                    .await?;

                let Some((mail, recipient)) = visible_entry(conn, mail_id, user_id, now).await?
                else {
                    return Ok(ClaimOutcome::NotFound);
                };
                if mail.reward_coins <= 0 {
                    return Ok(ClaimOutcome::NoReward);
                }
                let mut state = recipient
                    .as_ref()
                    .map_or_else(|| RecipientState::unread(now), recipient_state);
                if state.reward_claimed {
                    return Ok(ClaimOutcome::AlreadyClaimed);
                }
                state.read = true;
                state.reward_claimed = true;
                store_recipient(conn, mail_id, user_id, state).await?;

                let coins: i64 = diesel::update(users::table.find(user_id))
                    .set(users::coins.eq(users::coins + mail.reward_coins))
                    .returning(users::coins)
                    .get_result(conn)
                    .await?;
                Ok::<_, TxError>(ClaimOutcome::Claimed { coins })
            }
            .scope_boxed()
        })
        .await
        .map_err(MailRepositoryError::from)
    }

    async fn hide(
        &self,
        id: &MailId,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<bool, MailRepositoryError> {
        self.with_recipient_change(id, user, now, |state| state.deleted = true)
            .await
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for error mapping and visibility filtering.
    use chrono::{Duration, TimeZone};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::MailKind;

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn broadcast(now: DateTime<Utc>, expiry: DateTime<Utc>) -> Mail {
        Mail {
            id: MailId::random(),
            kind: MailKind::System,
            title: "Gift".to_owned(),
            content: "Coins".to_owned(),
            sender_id: None,
            journal_id: None,
            is_system_mail: true,
            send_to_all_users: true,
            reward_coins: 10,
            expiry_date: Some(expiry),
            created_at: now,
        }
    }

    fn recipient(mail: &Mail, deleted: bool) -> RecipientRow {
        RecipientRow {
            mail_id: *mail.id.as_uuid(),
            user_id: Uuid::new_v4(),
            read: false,
            reward_claimed: false,
            received_at: mail.created_at,
            deleted,
        }
    }

    #[rstest]
    fn transaction_row_errors_map_to_query_errors() {
        let err = MailRepositoryError::from(TxError::Row("invalid mails.kind".to_owned()));
        assert_eq!(err, MailRepositoryError::query("invalid mails.kind"));
    }

    #[rstest]
    fn transaction_diesel_errors_use_basic_mapping() {
        let err = MailRepositoryError::from(TxError::Diesel(diesel::result::Error::NotFound));
        assert!(err.to_string().contains("record not found"));
    }

    #[rstest]
    fn untouched_live_broadcasts_are_visible(now: DateTime<Utc>) {
        let mail = broadcast(now, now + Duration::days(1));
        assert!(visible(&(mail, None), now));
    }

    #[rstest]
    fn hidden_broadcasts_are_not_visible(now: DateTime<Utc>) {
        let mail = broadcast(now, now + Duration::days(1));
        let row = recipient(&mail, true);
        assert!(!visible(&(mail, Some(row)), now));
    }

    #[rstest]
    fn expired_broadcasts_are_not_visible(now: DateTime<Utc>) {
        let mail = broadcast(now - Duration::days(2), now - Duration::days(1));
        assert!(!visible(&(mail, None), now));
    }
}
