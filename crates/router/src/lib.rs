// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

// The operation dispatch table: decodes a request line, authenticates it
// against the configured client credentials, validates its body against
// the operation's declared shape, and invokes the bus.
//
// `health` and `exit` are side channels handled before authentication:
// `health` never touches the bus, and `exit` only signals the connection
// layer to close without the router doing anything else.

mod body;
mod operation;
mod router;

pub use operation::DECODE_REQUEST;
pub use router::Router;
