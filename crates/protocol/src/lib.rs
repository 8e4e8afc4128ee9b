// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

// The newline-delimited JSON envelope shared by every request and
// response line on the wire. Decoding a request only gets as far as the
// operation name and a raw, unparsed body; the router is what knows the
// shape each operation's body must take.

mod error;
mod request;
mod response;

pub use error::{ProtocolError, Result};
pub use request::{Auth, Request, decode_request};
pub use response::Response;
