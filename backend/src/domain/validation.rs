//! Conversion of value-object validation failures into domain errors.
//!
//! Every failure becomes `invalid_request` with `details.field` naming the
//! offending request field and `details.code` set to `invalid_field`.

use serde_json::json;

use super::Error;
use super::comment::CommentValidationError;
use super::journal::JournalValidationError;
use super::mail::MailValidationError;
use super::user::UserValidationError;

fn invalid_field(field: &str, message: String) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "code": "invalid_field",
    }))
}

impl From<UserValidationError> for Error {
    fn from(value: UserValidationError) -> Self {
        invalid_field(value.field(), value.to_string())
    }
}

impl From<JournalValidationError> for Error {
    fn from(value: JournalValidationError) -> Self {
        invalid_field(value.field(), value.to_string())
    }
}

impl From<CommentValidationError> for Error {
    fn from(value: CommentValidationError) -> Self {
        invalid_field("content", value.to_string())
    }
}

impl From<MailValidationError> for Error {
    fn from(value: MailValidationError) -> Self {
        invalid_field(value.field(), value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;

    #[test]
    fn validation_errors_carry_their_field() {
        let error: Error = JournalValidationError::EmptyTitle.into();
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        let details = error.details().expect("details present");
        assert_eq!(details["field"], "title");
        assert_eq!(details["code"], "invalid_field");
    }
}
