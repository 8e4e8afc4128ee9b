// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

use eventbus_type::FieldSpec;
use serde::Serialize;
use serde_json::Value;

/// The outer JSON object written back for every request line.
#[derive(Debug, Serialize)]
pub struct Response {
    pub operation: String,
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl Response {
    pub fn success(operation: impl Into<String>, body: Option<Value>) -> Self {
        Self { operation: operation.into(), status: true, body, reason: None, context: None }
    }

    pub fn failure(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            status: false,
            body: None,
            reason: Some(reason.into()),
            context: None,
        }
    }

    pub fn missing_fields(operation: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            operation: operation.into(),
            status: false,
            body: None,
            reason: Some("missing required fields".to_string()),
            context: Some(serde_json::json!({ "body": fields })),
        }
    }

    /// Serializes this response as a single line, without a trailing
    /// newline; the connection layer owns framing.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"operation":"decode_request","status":false,"reason":"invalid json provided"}"#
                .to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_response_omits_reason_and_context() {
        let res = Response::success("health", None);
        assert_eq!(res.encode(), r#"{"operation":"health","status":true}"#);
    }

    #[test]
    fn failure_response_carries_reason_only() {
        let res = Response::failure("create_stream", "stream: 'x' already exists");
        let encoded = res.encode();
        assert!(encoded.contains(r#""status":false"#));
        assert!(encoded.contains(r#""reason":"stream: 'x' already exists""#));
        assert!(!encoded.contains("context"));
    }

    #[test]
    fn missing_fields_response_reports_required_field_list() {
        let res = Response::missing_fields(
            "create_stream",
            vec![FieldSpec::new("stream_name", "string", true)],
        );
        let encoded = res.encode();
        assert!(encoded.contains(r#""reason":"missing required fields""#));
        assert!(encoded.contains(r#""name":"stream_name""#));
    }
}
