// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

use std::sync::Arc;

use eventbus_auth::CredentialStore;
use eventbus_bus::{Bus, BusError};
use eventbus_protocol::{Response, decode_request};
use eventbus_type::RequiredFields;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::value::RawValue;
use tracing::{debug, instrument, warn};

use crate::body::{MarkEventBody, StreamNameBody, WriteEventBody};
use crate::operation::{
    CREATE_STREAM, DECODE_REQUEST, DELETE_STREAM, EXIT, GET_STREAM_EVENTS, GET_STREAM_INFO,
    HEALTH, MARK_EVENT, PROCESS_EVENTS, RETRY_EVENTS, WRITE_EVENT, is_known, requires_auth,
    unknown_operation_reason,
};

/// Decodes, authenticates, and executes request lines against a [`Bus`].
///
/// One `Router` is shared across every connection; all of its state is
/// either immutable (`credentials`) or already internally synchronized
/// (`bus`), so dispatch never needs a lock of its own.
pub struct Router {
    bus: Arc<Bus>,
    credentials: Arc<CredentialStore>,
}

impl Router {
    pub fn new(bus: Arc<Bus>, credentials: Arc<CredentialStore>) -> Self {
        Self { bus, credentials }
    }

    /// Decodes and executes one newline-framed request line.
    ///
    /// Returns the response to write back and whether the caller should
    /// close the connection after sending it.
    #[instrument(skip(self, line))]
    pub fn dispatch(&self, line: &str) -> (Response, bool) {
        let request = match decode_request(line) {
            Ok(request) => request,
            Err(err) => return (Response::failure(DECODE_REQUEST, err.to_string()), false),
        };

        if request.operation == HEALTH {
            return (Response::success(HEALTH, None), false);
        }
        if request.operation == EXIT {
            return (Response::success(EXIT, None), true);
        }
        if !is_known(&request.operation) {
            return (Response::failure(DECODE_REQUEST, unknown_operation_reason()), false);
        }

        if requires_auth(&request.operation) {
            let authorized = request
                .auth
                .as_ref()
                .is_some_and(|auth| self.credentials.authenticate(&auth.client_id, &auth.client_secret));
            if !authorized {
                debug!(operation = %request.operation, "rejected unauthorized request");
                return (
                    Response::failure(&request.operation, "unauthorized to make request"),
                    false,
                );
            }
        }

        (self.invoke(&request.operation, request.body), false)
    }

    fn invoke(&self, operation: &str, body: Option<Box<RawValue>>) -> Response {
        match operation {
            CREATE_STREAM => self.with_body::<StreamNameBody, _>(operation, body, |b| {
                self.bus.create_stream(&b.stream_name).map(|stream| Some(serde_json::json!({ "stream": stream })))
            }),
            DELETE_STREAM => self.with_body::<StreamNameBody, _>(operation, body, |b| {
                self.bus.delete_stream(&b.stream_name).map(|_| None)
            }),
            GET_STREAM_INFO => self.with_body::<StreamNameBody, _>(operation, body, |b| {
                self.bus.get_stream_info(&b.stream_name).map(|stream| Some(serde_json::json!({ "stream": stream })))
            }),
            GET_STREAM_EVENTS => self.with_body::<StreamNameBody, _>(operation, body, |b| {
                self.bus
                    .get_stream_events(&b.stream_name)
                    .map(|events| Some(serde_json::json!({ "events": events })))
            }),
            WRITE_EVENT => self.with_body::<WriteEventBody, _>(operation, body, |b| {
                self.bus.write_event(&b.stream_name, b.event).map(|_| None)
            }),
            MARK_EVENT => self.with_body::<MarkEventBody, _>(operation, body, |b| {
                self.bus.mark_event(&b.event_id, b.status).map(|_| None)
            }),
            PROCESS_EVENTS => self.with_body::<StreamNameBody, _>(operation, body, |b| {
                self.bus
                    .process_events(&b.stream_name, false)
                    .map(|events| Some(serde_json::json!({ "events": events })))
            }),
            RETRY_EVENTS => self.with_body::<StreamNameBody, _>(operation, body, |b| {
                self.bus
                    .process_events(&b.stream_name, true)
                    .map(|events| Some(serde_json::json!({ "events": events })))
            }),
            _ => unreachable!("operation '{operation}' passed is_known but has no handler"),
        }
    }

    /// Parses `body` into `T`, reporting the missing-fields context if it
    /// is absent, then runs `f` and turns its result into a response.
    fn with_body<T, F>(&self, operation: &str, body: Option<Box<RawValue>>, f: F) -> Response
    where
        T: RequiredFields + DeserializeOwned,
        F: FnOnce(T) -> Result<Option<Value>, BusError>,
    {
        let Some(raw) = body else {
            return Response::missing_fields(operation, T::fields());
        };

        let parsed: T = match serde_json::from_str(raw.get()) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(operation, error = %err, "could not parse request body");
                return Response::failure(operation, "invalid json provided");
            }
        };

        match f(parsed) {
            Ok(body) => Response::success(operation, body),
            Err(err) => Response::failure(operation, err.to_string()),
        }
    }
}
