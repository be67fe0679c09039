use std::error::Error;

use aws_actions::errors::ActionError;

#[test]
fn test_action_error_implements_error_trait() {
    fn assert_error<T: Error + Send + Sync + 'static>(_: &T) {}

    let error = ActionError::InvalidInput("test error".to_string());
    assert_error(&error);
}

#[test]
fn test_action_error_display() {
    let error = ActionError::service("ResourceNotFoundException", "Requested resource not found");
    assert_eq!(
        format!("{error}"),
        "AWS service error (ResourceNotFoundException): Requested resource not found"
    );

    let error = ActionError::Service {
        code: None,
        message: "dispatch failure".to_string(),
    };
    assert_eq!(format!("{error}"), "AWS service error: dispatch failure");

    let error = ActionError::Timeout("table movies".to_string());
    assert_eq!(format!("{error}"), "Timed out waiting for table movies");

    let error = ActionError::InvalidInput("max_messages must be between 1 and 10".to_string());
    assert_eq!(
        format!("{error}"),
        "Invalid input: max_messages must be between 1 and 10"
    );
}

#[test]
fn test_service_error_code() {
    let error = ActionError::service("ThrottlingException", "slow down");
    assert_eq!(error.code(), Some("ThrottlingException"));
    assert_eq!(ActionError::NotFound("x".into()).code(), None);
}

#[test]
fn test_is_not_found() {
    assert!(ActionError::NotFound("queue".into()).is_not_found());
    assert!(ActionError::service("ResourceNotFoundException", "gone").is_not_found());
    assert!(ActionError::service("ParameterNotFound", "gone").is_not_found());
    assert!(ActionError::service("NoSuchBucket", "gone").is_not_found());
    assert!(!ActionError::service("AccessDenied", "nope").is_not_found());
    assert!(!ActionError::Timeout("cluster".into()).is_not_found());
}

#[test]
fn test_action_error_from_conversions() {
    let json_err = serde_json::from_str::<serde_json::Value>("{broken").unwrap_err();
    let error: ActionError = json_err.into();
    assert!(matches!(error, ActionError::Serialization(_)));

    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.txt");
    let error: ActionError = io_err.into();
    match error {
        ActionError::Io(msg) => assert!(msg.contains("missing.txt")),
        other => panic!("Unexpected error type: {other:?}"),
    }

    let build_err = aws_sdk_dynamodb::types::KeySchemaElement::builder()
        .key_type(aws_sdk_dynamodb::types::KeyType::Hash)
        .build()
        .unwrap_err();
    let error: ActionError = build_err.into();
    assert!(matches!(error, ActionError::InvalidInput(_)));
}
