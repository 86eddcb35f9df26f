// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::sync::Arc;

use aws_credential_types::provider::SharedCredentialsProvider;
use aws_credential_types::Credentials;
use chrono::Utc;
use mockito::{Matcher, Server};
use serde_json::json;
use sqs_out::sqs::{BatchEntry, QueueClient, SendBatchRequest, SqsClient};
use sqs_out::{DispatchError, Error, FieldValue, SqsOut, SqsOutConfig};

const QUEUE_URL: &str = "https://sqs.us-east-1.amazonaws.com/123456789/test-queue";
const FIFO_URL: &str = "https://sqs.us-east-1.amazonaws.com/123456789/test-queue.fifo";

fn credentials() -> SharedCredentialsProvider {
    SharedCredentialsProvider::new(Credentials::new(
        "AKIDEXAMPLE",
        "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
        None,
        None,
        "test",
    ))
}

fn config(queue_url: &str, endpoint: &str) -> SqsOutConfig {
    let mut config = SqsOutConfig::new(QUEUE_URL, "us-east-1", 2).expect("valid config");
    config.queue_url = queue_url.to_string();
    config.endpoint_url = Some(endpoint.to_string());
    config
}

fn request(ids: &[&str]) -> SendBatchRequest {
    SendBatchRequest {
        queue_url: QUEUE_URL.to_string(),
        entries: ids
            .iter()
            .map(|id| BatchEntry {
                id: (*id).to_string(),
                message_body: "{\"message\":\"test\"}".to_string(),
                message_group_id: None,
                message_attributes: BTreeMap::new(),
            })
            .collect(),
    }
}

#[tokio::test]
async fn send_batch_signs_and_parses_response() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_header("content-type", "application/x-amz-json-1.0")
        .match_header("x-amz-target", "AmazonSQS.SendMessageBatch")
        .match_header(
            "authorization",
            Matcher::Regex("^AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/\\d{8}/us-east-1/sqs/aws4_request".to_string()),
        )
        .match_header("x-amz-date", Matcher::Any)
        .match_body(Matcher::PartialJson(json!({
            "QueueUrl": QUEUE_URL,
            "Entries": [
                {"Id": "msg-1", "MessageBody": "{\"message\":\"test\"}"},
                {"Id": "msg-2", "MessageBody": "{\"message\":\"test\"}"}
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/x-amz-json-1.0")
        .with_body(
            json!({
                "Successful": [{"Id": "msg-1", "MessageId": "m-1", "MD5OfMessageBody": "x"}],
                "Failed": [{"Id": "msg-2", "Code": "InternalError", "SenderFault": false}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = SqsClient::new(&config(QUEUE_URL, &server.url()), credentials())
        .expect("client");
    let output = client
        .send_batch(&request(&["msg-1", "msg-2"]))
        .await
        .expect("send");

    mock.assert_async().await;
    assert_eq!(output.successful.len(), 1);
    assert_eq!(output.successful[0].id, "msg-1");
    assert_eq!(output.failed.len(), 1);
    assert_eq!(output.failed[0].id, "msg-2");
    assert_eq!(output.failed[0].code, "InternalError");
}

#[tokio::test]
async fn service_error_is_a_dispatch_error() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(400)
        .with_header("x-amzn-query-error", "AWS.SimpleQueueService.NonExistentQueue;Sender")
        .with_body(
            json!({
                "__type": "com.amazonaws.sqs#QueueDoesNotExist",
                "message": "The specified queue does not exist."
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let client = SqsClient::new(&config(QUEUE_URL, &server.url()), credentials())
        .expect("client");
    let err = client
        .send_batch(&request(&["msg-1"]))
        .await
        .expect_err("must fail");

    mock.assert_async().await;
    assert_eq!(
        err,
        DispatchError::Service {
            status: 400,
            code: "AWS.SimpleQueueService.NonExistentQueue".to_string(),
            message: "The specified queue does not exist.".to_string(),
        }
    );
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let client = SqsClient::new(&config(QUEUE_URL, "http://127.0.0.1:1"), credentials())
        .expect("client");
    let err = client
        .send_batch(&request(&["msg-1"]))
        .await
        .expect_err("must fail");

    assert!(matches!(err, DispatchError::Transport(_)));
}

#[tokio::test]
async fn fifo_output_ships_group_id_and_tag_attribute() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({
            "QueueUrl": FIFO_URL,
            "Entries": [
                {
                    "Id": "MessageNumber-1",
                    "MessageGroupId": "group-1",
                    "MessageAttributes": {
                        "fluent_tag": {"DataType": "String", "StringValue": "app.logs"}
                    }
                },
                {"Id": "MessageNumber-2", "MessageGroupId": "group-1"}
            ]
        })))
        .with_status(200)
        .with_body(
            json!({
                "Successful": [{"Id": "MessageNumber-1"}, {"Id": "MessageNumber-2"}]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let mut config = config(FIFO_URL, &server.url());
    config.message_group_id = Some("group-1".to_string());
    config.tag_attribute = Some("fluent_tag".to_string());
    config.validate().expect("valid config");

    let client = SqsClient::new(&config, credentials()).expect("client");
    let out = SqsOut::new(Arc::new(config), Arc::new(client));
    let now = Utc::now();
    for n in 1..=2 {
        out.submit(&now, "app.logs", &[("n".to_string(), FieldValue::Int(n))])
            .await
            .expect("submit");
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn throttled_batch_surfaces_from_submit() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(400)
        .with_body(
            json!({
                "__type": "com.amazonaws.sqs#RequestThrottled",
                "message": "Rate exceeded"
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let config = config(QUEUE_URL, &server.url());
    let client = SqsClient::new(&config, credentials()).expect("client");
    let out = SqsOut::new(Arc::new(config), Arc::new(client));
    let now = Utc::now();

    out.submit(&now, "t", &[]).await.expect("first submit buffers");
    let err = out.submit(&now, "t", &[]).await.expect_err("batch send fails");

    mock.assert_async().await;
    assert!(matches!(
        err,
        Error::Dispatch(DispatchError::Service { ref code, .. }) if code == "RequestThrottled"
    ));
    assert_eq!(out.pending().await, 0);
}
