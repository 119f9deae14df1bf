use super::*;

#[test]
fn error_message_prefers_structured_message() {
    let body = r#"{"message":"user still owns tasks","error":"Conflict"}"#;
    assert_eq!(error_message(409, body), "user still owns tasks");
}

#[test]
fn error_message_falls_back_to_error_field() {
    assert_eq!(error_message(400, r#"{"error":"email taken"}"#), "email taken");
}

#[test]
fn error_message_uses_raw_text_for_plain_bodies() {
    assert_eq!(error_message(500, "  Internal Server Error \n"), "Internal Server Error");
}

#[test]
fn error_message_uses_raw_json_when_no_known_field() {
    assert_eq!(error_message(422, r#"{"detail":"nope"}"#), r#"{"detail":"nope"}"#);
}

#[test]
fn error_message_empty_body_names_status() {
    assert_eq!(error_message(404, ""), "HTTP 404");
}

#[test]
fn from_status_maps_auth_rejections() {
    assert_eq!(ApiError::from_status(401, "Invalid email or password"), ApiError::Auth("Invalid email or password".to_owned()));
    assert!(ApiError::from_status(403, "").is_auth());
}

#[test]
fn from_status_maps_other_failures_to_validation() {
    let err = ApiError::from_status(400, r#"{"message":"bad role"}"#);
    assert_eq!(err, ApiError::Validation { status: 400, message: "bad role".to_owned() });
    assert!(!err.is_auth());
}

#[test]
fn display_includes_status_and_message() {
    let err = ApiError::Validation { status: 409, message: "conflict".to_owned() };
    assert_eq!(err.to_string(), "request rejected (409): conflict");
}
