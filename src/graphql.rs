//! GraphQL-over-HTTP envelope: `{query, variables?}` out, `{data, errors?}` in.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FeedError, FeedResult};

#[derive(Debug, Clone, Serialize)]
pub struct GraphqlRequest<'a> {
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Map<String, Value>>,
}

impl<'a> GraphqlRequest<'a> {
    pub fn new(query: &'a str) -> Self {
        Self {
            query,
            variables: None,
        }
    }

    /// Values only ever travel here, never spliced into `query`.
    pub fn with_variable(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.variables
            .get_or_insert_with(Map::new)
            .insert(name.to_string(), value.into());
        self
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<ErrorEntry>>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    message: Option<String>,
}

/// Decodes a response body into the typed `data` payload.
///
/// An `errors` array wins over everything else, including a non-2xx status.
pub fn decode_response<T: DeserializeOwned>(status: u16, raw: &str) -> FeedResult<T> {
    let success = (200..300).contains(&status);
    let envelope: Envelope = match serde_json::from_str(raw.trim()) {
        Ok(envelope) => envelope,
        Err(_) if !success => return Err(FeedError::Server(format!("http {status}"))),
        Err(err) => return Err(FeedError::Protocol(format!("invalid json: {err}"))),
    };

    if let Some(first) = envelope.errors.as_ref().and_then(|errors| errors.first()) {
        let message = first
            .message
            .as_deref()
            .map(str::trim)
            .filter(|msg| !msg.is_empty())
            .unwrap_or("unknown graphql error");
        return Err(FeedError::Server(message.to_string()));
    }
    if !success {
        return Err(FeedError::Server(format!("http {status}")));
    }

    let data = match envelope.data {
        None | Some(Value::Null) => {
            return Err(FeedError::Protocol("response has no data".to_string()));
        }
        Some(data) => data,
    };
    serde_json::from_value(data)
        .map_err(|err| FeedError::Protocol(format!("unexpected data shape: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Probe {
        value: u32,
    }

    #[test]
    fn request_omits_variables_when_unset() {
        let body = serde_json::to_value(GraphqlRequest::new("query { x }")).unwrap();
        assert_eq!(body, serde_json::json!({ "query": "query { x }" }));
    }

    #[test]
    fn request_carries_variables() {
        let req = GraphqlRequest::new("q").with_variable("matchId", "a\"b");
        let body = serde_json::to_value(req).unwrap();
        assert_eq!(body["variables"]["matchId"], "a\"b");
        assert_eq!(body["query"], "q");
    }

    #[test]
    fn first_error_message_wins() {
        let raw = r#"{"data":null,"errors":[{"message":"boom"},{"message":"later"}]}"#;
        let err = decode_response::<Probe>(200, raw).unwrap_err();
        assert_eq!(err, FeedError::Server("boom".to_string()));
    }

    #[test]
    fn errors_beat_http_status() {
        let raw = r#"{"errors":[{"message":"Cannot query field"}]}"#;
        let err = decode_response::<Probe>(400, raw).unwrap_err();
        assert_eq!(err, FeedError::Server("Cannot query field".to_string()));
    }

    #[test]
    fn non_json_error_page_is_server_error() {
        let err = decode_response::<Probe>(502, "<html>bad gateway</html>").unwrap_err();
        assert_eq!(err, FeedError::Server("http 502".to_string()));
    }

    #[test]
    fn missing_data_is_protocol_error() {
        let err = decode_response::<Probe>(200, "{}").unwrap_err();
        assert!(matches!(err, FeedError::Protocol(_)));
        let err = decode_response::<Probe>(200, "not json").unwrap_err();
        assert!(matches!(err, FeedError::Protocol(_)));
    }

    #[test]
    fn decodes_typed_data() {
        let probe: Probe = decode_response(200, r#"{"data":{"value":7}}"#).unwrap();
        assert_eq!(probe.value, 7);
    }
}
