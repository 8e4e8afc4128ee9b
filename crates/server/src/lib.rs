// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

// The TCP connection server: a tracked accept loop, newline-framed
// request dispatch, and a two-phase shutdown that drains in-flight
// connections before the store closes.

mod registry;
mod server;

pub use registry::ConnectionRegistry;
pub use server::{Server, ServerSettings};
