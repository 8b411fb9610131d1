//! Tests for the domain error payload.

use super::*;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case(Error::already_exists("taken"), ErrorCode::AlreadyExists)]
#[case(Error::invalid_credentials("nope"), ErrorCode::InvalidCredentials)]
#[case(Error::self_follow_rejected("self"), ErrorCode::SelfFollowRejected)]
#[case(Error::not_found("gone"), ErrorCode::NotFound)]
#[case(Error::forbidden("not yours"), ErrorCode::Forbidden)]
#[case(Error::conflict("ended"), ErrorCode::Conflict)]
#[case(Error::capture_denied("no camera"), ErrorCode::CaptureDenied)]
#[case(Error::internal("boom"), ErrorCode::InternalError)]
fn constructors_set_codes(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn new_falls_back_to_generic_message() {
    let error = Error::new(ErrorCode::NotFound, "");
    assert_eq!(error.message(), "not found");
}

#[rstest]
fn serialises_with_snake_case_code() {
    let error = Error::self_follow_rejected("users cannot follow themselves")
        .with_details(json!({ "userId": "u1" }));
    let value = serde_json::to_value(&error).expect("serialise error");
    assert_eq!(
        value,
        json!({
            "code": "self_follow_rejected",
            "message": "users cannot follow themselves",
            "details": { "userId": "u1" },
        })
    );
}

#[rstest]
fn deserialising_blank_message_fails() {
    let result: Result<Error, _> =
        serde_json::from_value(json!({ "code": "not_found", "message": " " }));
    assert!(result.is_err());
}

#[rstest]
fn details_are_omitted_when_absent() {
    let value = serde_json::to_value(Error::conflict("stream ended")).expect("serialise");
    assert!(value.get("details").is_none());
}
