use aws_lambda_events::event::apigw::ApiGatewayWebsocketProxyRequest;
use aws_lambda_events::event::dynamodb::{Event as StreamEvent, EventRecord};
use serde::Deserialize;
use serde_json::Value;

/// What one invocation of this lambda can carry: a DynamoDB stream batch
/// or a WebSocket lifecycle request. Both arrive on the same function,
/// so the payload shape decides the path.
#[derive(Debug, PartialEq)]
pub enum Incoming {
    /// Stream batch; `true` when any record touched a task item.
    Stream { tasks_changed: bool },
    Connect { connection_id: String },
    Disconnect { connection_id: String },
    Unknown,
}

pub fn classify(payload: &Value) -> Incoming {
    if payload.get("Records").is_some() {
        return match serde_json::from_value::<StreamEvent>(payload.clone()) {
            Ok(event) => Incoming::Stream {
                tasks_changed: event.records.iter().any(record_touches_task),
            },
            Err(e) => {
                tracing::warn!("Unparseable stream batch: {}", e);
                Incoming::Unknown
            }
        };
    }

    if let Ok(request) = serde_json::from_value::<ApiGatewayWebsocketProxyRequest>(payload.clone())
    {
        let context = request.request_context;
        if let Some(connection_id) = context.connection_id {
            match context.route_key.as_deref() {
                Some("$connect") => return Incoming::Connect { connection_id },
                Some("$disconnect") => return Incoming::Disconnect { connection_id },
                _ => {}
            }
        }
    }

    Incoming::Unknown
}

#[derive(Debug, Deserialize)]
struct RowKey {
    #[serde(rename = "SK")]
    sk: String,
}

/// Only task rows matter to listeners; profile, proof and notification
/// records in the same table are ignored.
fn record_touches_task(record: &EventRecord) -> bool {
    let key: Result<RowKey, _> = serde_dynamo::from_item(record.change.keys.clone());
    key.map(|key| key.sk.starts_with("TASK#")).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stream_record(sk: &str) -> Value {
        json!({
            "awsRegion": "ap-southeast-2",
            "eventID": "1",
            "eventName": "MODIFY",
            "eventSource": "aws:dynamodb",
            "eventSourceARN": "arn:aws:dynamodb:ap-southeast-2:123456789012:table/taskproof/stream/2026-08-26T00:00:00.000",
            "eventVersion": "1.1",
            "dynamodb": {
                "ApproximateCreationDateTime": 1756209600.0,
                "Keys": {"PK": {"S": "TASK"}, "SK": {"S": sk}},
                "SequenceNumber": "111",
                "SizeBytes": 26,
                "StreamViewType": "KEYS_ONLY"
            }
        })
    }

    fn socket_request(route_key: &str) -> Value {
        json!({
            "headers": {},
            "multiValueHeaders": {},
            "isBase64Encoded": false,
            "requestContext": {
                "routeKey": route_key,
                "eventType": "CONNECT",
                "messageDirection": "IN",
                "stage": "production",
                "connectedAt": 1756209600000i64,
                "requestTimeEpoch": 1756209600000i64,
                "requestId": "req-1",
                "extendedRequestId": "req-1",
                "apiId": "api123",
                "domainName": "ws.example.com",
                "connectionId": "abc=",
                "identity": {}
            }
        })
    }

    #[test]
    fn task_record_triggers_broadcast() {
        let payload = json!({"Records": [stream_record("TASK#t-1")]});
        assert_eq!(classify(&payload), Incoming::Stream { tasks_changed: true });
    }

    #[test]
    fn non_task_records_are_ignored() {
        let payload = json!({"Records": [
            stream_record("NOTIF#n-1"),
            stream_record("PROOF#p-1"),
        ]});
        assert_eq!(classify(&payload), Incoming::Stream { tasks_changed: false });
    }

    #[test]
    fn one_task_record_among_many_is_enough() {
        let payload = json!({"Records": [
            stream_record("NOTIF#n-1"),
            stream_record("TASK#t-9"),
        ]});
        assert_eq!(classify(&payload), Incoming::Stream { tasks_changed: true });
    }

    #[test]
    fn connect_and_disconnect_routes_carry_the_connection() {
        assert_eq!(
            classify(&socket_request("$connect")),
            Incoming::Connect { connection_id: "abc=".to_string() }
        );
        assert_eq!(
            classify(&socket_request("$disconnect")),
            Incoming::Disconnect { connection_id: "abc=".to_string() }
        );
    }

    #[test]
    fn anything_else_is_unknown() {
        assert_eq!(classify(&json!({"hello": "world"})), Incoming::Unknown);
        assert_eq!(classify(&socket_request("$default")), Incoming::Unknown);
    }
}
