use aws_actions::commands::{ActionCommand, DynamoDbAction, SchedulerAction};
use aws_actions::handler::parse_event;
use aws_actions::services::dynamodb::{attribute_to_json, json_to_attribute, json_to_item};
use aws_actions::services::s3::{content_type_for, copy_source, parse_s3_uri};
use aws_actions::services::scheduler::{
    one_time_expression, validate_expression, validate_timezone,
};
use chrono::{TimeZone, Utc};
use serde_json::json;

#[test]
fn test_lambda_event_selects_service_and_action() {
    let command = parse_event(json!({
        "service": "dynamodb",
        "action": "put_item",
        "table": "movies",
        "item": {"title": "Heat", "year": 1995}
    }))
    .unwrap();

    assert_eq!(command.service(), "dynamodb");
    let ActionCommand::Dynamodb(DynamoDbAction::PutItem { table, item }) = command else {
        panic!("Expected a put_item command");
    };
    assert_eq!(table, "movies");
    assert_eq!(item["year"], 1995);
}

#[test]
fn test_lambda_event_applies_defaults() {
    let command = parse_event(json!({
        "service": "scheduler",
        "action": "delete_schedule",
        "name": "nightly"
    }))
    .unwrap();

    assert_eq!(
        command,
        ActionCommand::Scheduler(SchedulerAction::DeleteSchedule {
            name: "nightly".into(),
            group: "default".into()
        })
    );
}

#[test]
fn test_lambda_event_missing_field_rejected() {
    let result = parse_event(json!({"service": "dynamodb", "action": "describe_table"}));
    assert!(result.is_err());
}

#[test]
fn test_scheduler_expressions() {
    assert!(validate_expression("rate(5 minutes)").is_ok());
    assert!(validate_expression("rate(1 day)").is_ok());
    assert!(validate_expression("cron(0 12 * * ? *)").is_ok());
    assert!(validate_expression("at(2026-01-31T08:30:00)").is_ok());

    assert!(validate_expression("rate(0 minutes)").is_err());
    assert!(validate_expression("rate(5 weeks)").is_err());
    assert!(validate_expression("cron(0 12 * *)").is_err());
    assert!(validate_expression("at(2026-02-30T08:30:00)").is_err());
    assert!(validate_expression("every day").is_err());
}

#[test]
fn test_one_time_expression_is_valid() {
    let when = Utc.with_ymd_and_hms(2026, 10, 18, 9, 5, 0).unwrap();
    let expression = one_time_expression(when);
    assert_eq!(expression, "at(2026-10-18T09:05:00)");
    assert!(validate_expression(&expression).is_ok());
}

#[test]
fn test_scheduler_timezones() {
    assert!(validate_timezone("Europe/Berlin").is_ok());
    assert!(validate_timezone("UTC").is_ok());
    assert!(validate_timezone("Mars/Olympus_Mons").is_err());
}

#[test]
fn test_s3_uri_helpers() {
    let location = parse_s3_uri("s3://my-bucket/reports/2026/q3.csv").unwrap();
    assert_eq!(location.bucket, "my-bucket");
    assert_eq!(location.key, "reports/2026/q3.csv");

    assert!(parse_s3_uri("https://my-bucket/key").is_err());
    assert!(parse_s3_uri("not a uri").is_err());

    assert_eq!(content_type_for("q3.csv"), "text/csv");
    assert_eq!(content_type_for("blob"), "application/octet-stream");
    assert_eq!(copy_source("src", "a b/c.txt"), "src/a%20b%2Fc.txt");
}

#[test]
fn test_dynamodb_json_mapping() {
    let item = json_to_item(&json!({
        "title": "Heat",
        "year": 1995,
        "rating": 8.3,
        "cast": ["Pacino", "De Niro"],
        "info": {"sequel": null, "color": true}
    }))
    .unwrap();

    assert_eq!(item.len(), 5);
    assert_eq!(attribute_to_json(&item["year"]), json!(1995));
    assert_eq!(attribute_to_json(&item["rating"]), json!(8.3));
    assert_eq!(
        attribute_to_json(&item["info"]),
        json!({"sequel": null, "color": true})
    );
    assert_eq!(
        attribute_to_json(&json_to_attribute(&json!(["a", 1]))),
        json!(["a", 1])
    );

    assert!(json_to_item(&json!(["not", "an", "object"])).is_err());
}
