//! End-to-end calls through `XmlHttpStack` with a scripted transport.

use http::{Method, StatusCode};
use relay::prelude::*;
use relay_middleware::StackConfig;
use relay_test::{xml_response, MockTransport};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreateQueue {
    queue_name: String,
    delay_seconds: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct QueueAttributes {
    attribute_names: Vec<String>,
}

struct CreateQueueInput {
    body: CreateQueue,
    query: QueueAttributes,
}

impl HttpRequestInput for CreateQueueInput {
    type Body = CreateQueue;
    type Query = QueueAttributes;

    fn body(&self) -> Option<&CreateQueue> {
        Some(&self.body)
    }

    fn query(&self) -> Option<&QueueAttributes> {
        Some(&self.query)
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
struct CreateQueueResult {
    queue_url: String,
    #[serde(default)]
    attribute_names: Vec<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
#[serde(rename_all = "PascalCase")]
struct QueueFault {
    code: String,
    message: String,
}

fn credentials() -> Arc<dyn CredentialsProvider> {
    Arc::new(StaticCredentialsProvider::new(Credentials::new(
        "AKIDEXAMPLE",
        "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
    )))
}

fn query_protocol_options() -> XmlOptions {
    XmlOptions::default()
        .with_list_decoding(ListDecodingStrategy::CollapseListUsingItemTag(
            "member".to_string(),
        ))
        .with_map_decoding(MapDecodingStrategy::SeparateEntriesWith {
            key_tag: "key".to_string(),
            value_tag: "value".to_string(),
        })
        .with_query_list_strategy(ListEncodingStrategy::ExpandListWithIndexAndItemTag(
            "member".to_string(),
        ))
}

fn stack(transport: &Arc<MockTransport>, options: XmlOptions) -> XmlHttpStack<QueueFault> {
    let config = StackConfig::new(
        credentials(),
        Region::US_WEST_2,
        "sqs",
        "sqs.us-west-2.amazonaws.com",
    )
    .with_content_type("application/xml");
    XmlHttpStack::new(config, options, transport.clone())
}

fn input() -> CreateQueueInput {
    CreateQueueInput {
        body: CreateQueue {
            queue_name: "jobs".to_string(),
            delay_seconds: 5,
        },
        query: QueueAttributes {
            attribute_names: vec!["All".to_string(), "Policy".to_string()],
        },
    }
}

#[tokio::test]
async fn test_create_queue_round_trip() {
    let transport = Arc::new(MockTransport::new().with_response(xml_response(
        StatusCode::OK,
        "<CreateQueueResult>\
            <QueueUrl>https://sqs.us-west-2.amazonaws.com/123/jobs</QueueUrl>\
            <AttributeNames><member>All</member><member>Policy</member></AttributeNames>\
            <Tags><entry><key>team</key><value>billing</value></entry></Tags>\
         </CreateQueueResult>",
    )));
    let stack = stack(&transport, query_protocol_options());
    let ctx = InvocationContext::new();

    let output: CreateQueueResult = stack
        .operation(input(), Method::POST, "/")
        .execute(&ctx)
        .await
        .unwrap();

    assert_eq!(output.queue_url, "https://sqs.us-west-2.amazonaws.com/123/jobs");
    assert_eq!(output.attribute_names, ["All", "Policy"]);
    assert_eq!(output.tags.get("team").map(String::as_str), Some("billing"));

    let request = transport.last_request().unwrap();
    assert_eq!(
        std::str::from_utf8(request.body()).unwrap(),
        "<CreateQueue><QueueName>jobs</QueueName><DelaySeconds>5</DelaySeconds></CreateQueue>"
    );
    assert_eq!(
        request.query_string(),
        "AttributeNames.member.1=All&AttributeNames.member.2=Policy"
    );
    assert_eq!(request.header("content-type"), Some("application/xml"));
    assert!(request
        .header("authorization")
        .unwrap()
        .contains("/us-west-2/sqs/aws4_request"));
}

#[tokio::test]
async fn test_root_key_override() {
    let transport = Arc::new(MockTransport::new().with_response(xml_response(
        StatusCode::OK,
        "<CreateQueueResult><QueueUrl>q</QueueUrl></CreateQueueResult>",
    )));
    let stack = stack(
        &transport,
        query_protocol_options().with_root_key("CreateQueueRequest"),
    );
    let ctx = InvocationContext::new();

    let _: CreateQueueResult = stack
        .operation(input(), Method::POST, "/")
        .execute(&ctx)
        .await
        .unwrap();

    let request = transport.last_request().unwrap();
    let body = std::str::from_utf8(request.body()).unwrap();
    assert!(body.starts_with("<CreateQueueRequest>"));
    assert!(body.ends_with("</CreateQueueRequest>"));
}

#[tokio::test]
async fn test_typed_xml_fault() {
    let transport = Arc::new(MockTransport::new().with_response(xml_response(
        StatusCode::BAD_REQUEST,
        "<ErrorResponse><Code>QueueAlreadyExists</Code><Message>jobs exists</Message></ErrorResponse>",
    )));
    let stack = stack(&transport, query_protocol_options());
    let ctx = InvocationContext::new();

    let err = stack
        .operation::<_, CreateQueueResult>(input(), Method::POST, "/")
        .execute(&ctx)
        .await
        .unwrap_err();

    let fault = err
        .service_error()
        .and_then(ServiceError::payload::<QueueFault>)
        .unwrap();
    assert_eq!(fault.code, "QueueAlreadyExists");
    assert_eq!(fault.message, "jobs exists");
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_void_mode_with_empty_body() {
    let transport = Arc::new(MockTransport::new().with_response(HttpResponse::ok()));
    let stack = stack(&transport, XmlOptions::default());
    let ctx = InvocationContext::new();

    stack
        .operation::<_, ()>(input(), Method::POST, "/")
        .execute_void(&ctx)
        .await
        .unwrap();

    assert_eq!(transport.call_count(), 1);
}
