// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

pub const HEALTH: &str = "health";
pub const EXIT: &str = "exit";
pub const CREATE_STREAM: &str = "create_stream";
pub const DELETE_STREAM: &str = "delete_stream";
pub const GET_STREAM_INFO: &str = "get_stream_info";
pub const GET_STREAM_EVENTS: &str = "get_stream_events";
pub const WRITE_EVENT: &str = "write_event";
pub const MARK_EVENT: &str = "mark_event";
pub const PROCESS_EVENTS: &str = "process_events";
pub const RETRY_EVENTS: &str = "retry_events";

/// The operation attributed to router-level failures: decode errors and
/// unknown operations never reached a real handler.
pub const DECODE_REQUEST: &str = "decode_request";

/// Every recognized operation, in the order the "operation must be one
/// of" error reports them.
const KNOWN_OPERATIONS: &[&str] = &[
    HEALTH,
    CREATE_STREAM,
    DELETE_STREAM,
    GET_STREAM_INFO,
    GET_STREAM_EVENTS,
    WRITE_EVENT,
    MARK_EVENT,
    PROCESS_EVENTS,
    RETRY_EVENTS,
    EXIT,
];

pub fn is_known(operation: &str) -> bool {
    KNOWN_OPERATIONS.contains(&operation)
}

pub fn unknown_operation_reason() -> String {
    let quoted: Vec<String> = KNOWN_OPERATIONS.iter().map(|op| format!("'{op}'")).collect();
    format!("operation must be one of: {}", quoted.join(", "))
}

/// Operations that do not require an `auth` object on the request.
pub fn requires_auth(operation: &str) -> bool {
    !matches!(operation, HEALTH | EXIT)
}
