//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every malformed input becomes a `400 invalid_request` whose `details`
//! carry the offending `field` and a machine-readable `code`.

use std::fmt::Display;
use std::str::FromStr;

use actix_web::web;
use chrono::{DateTime, Utc};
use pagination::{PageRequest, PageRequestError};
use serde_json::json;

use crate::domain::{
    CommentValidationError, Error, InvalidId, JournalValidationError, LoginValidationError,
    MailValidationError, UserValidationError,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidUuid,
    InvalidTimestamp,
    InvalidValue,
    InvalidBody,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidTimestamp => "invalid_timestamp",
            ErrorCode::InvalidValue => "invalid_value",
            ErrorCode::InvalidBody => "invalid_body",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, message: impl Into<String>, code: ErrorCode) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

/// A value that parsed but broke a domain rule.
pub(crate) fn invalid_value_error(field: FieldName, error: impl Display) -> Error {
    field_error(field, error.to_string(), ErrorCode::InvalidValue)
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let name = field.as_str();
    Error::invalid_request(format!("{name} must be a valid UUID")).with_details(json!({
        "field": name,
        "value": value,
        "code": ErrorCode::InvalidUuid.as_str(),
    }))
}

/// Parse an identifier newtype from a path or body string.
pub(crate) fn parse_id<T>(value: &str, field: FieldName) -> Result<T, Error>
where
    T: FromStr<Err = InvalidId>,
{
    value.parse().map_err(|_| invalid_uuid_error(field, value))
}

/// Parse a list of identifiers, reporting the first bad index.
pub(crate) fn parse_id_list<T>(values: &[String], field: FieldName) -> Result<Vec<T>, Error>
where
    T: FromStr<Err = InvalidId>,
{
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            value.parse().map_err(|_| {
                invalid_uuid_error(field, value).with_details(json!({
                    "field": field.as_str(),
                    "index": index,
                    "value": value,
                    "code": ErrorCode::InvalidUuid.as_str(),
                }))
            })
        })
        .collect()
}

pub(crate) fn parse_optional_rfc3339_timestamp(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<DateTime<Utc>>, Error> {
    value
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|timestamp| timestamp.with_timezone(&Utc))
                .map_err(|_| {
                    field_error(
                        field,
                        format!("{} must be an RFC 3339 timestamp", field.as_str()),
                        ErrorCode::InvalidTimestamp,
                    )
                })
        })
        .transpose()
}

/// Build a page request from optional query values.
pub(crate) fn page_request(page: Option<u32>, limit: Option<u32>) -> Result<PageRequest, Error> {
    PageRequest::from_query(page, limit).map_err(|error| {
        let field = match error {
            PageRequestError::ZeroPage => FieldName::new("page"),
            PageRequestError::ZeroLimit => FieldName::new("limit"),
        };
        invalid_value_error(field, error)
    })
}

pub(crate) fn user_error(error: UserValidationError) -> Error {
    invalid_value_error(FieldName::new(error.field()), error)
}

pub(crate) fn journal_error(error: JournalValidationError) -> Error {
    invalid_value_error(FieldName::new(error.field()), error)
}

pub(crate) fn comment_error(error: CommentValidationError) -> Error {
    invalid_value_error(FieldName::new("content"), error)
}

pub(crate) fn mail_error(error: MailValidationError) -> Error {
    invalid_value_error(FieldName::new(error.field()), error)
}

pub(crate) fn login_error(error: LoginValidationError) -> Error {
    let field = match error {
        LoginValidationError::InvalidEmail => FieldName::new("email"),
        LoginValidationError::EmptyPassword => FieldName::new("password"),
    };
    invalid_value_error(field, error)
}

fn malformed(error: impl Display) -> actix_web::Error {
    Error::invalid_request(error.to_string())
        .with_details(json!({ "code": ErrorCode::InvalidBody.as_str() }))
        .into()
}

/// JSON extractor configuration returning the shared error payload.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|error, _req| malformed(error))
}

/// Query extractor configuration returning the shared error payload.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|error, _req| malformed(error))
}
