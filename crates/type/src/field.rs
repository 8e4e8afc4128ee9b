// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

use serde::Serialize;

/// Describes one field of an operation's request body.
///
/// This is the strongly-typed stand-in for the reflection-driven field
/// report the original service derived at runtime from a struct's tags:
/// every operation body declares its own `FieldSpec` list once, and that
/// same list is both the `context.body` payload sent back when the body is
/// missing and (indirectly, via each operation's parser) the source of
/// truth for what the body actually deserializes into.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
	pub name: &'static str,
	#[serde(rename = "type")]
	pub type_name: &'static str,
	pub required: bool,
}

impl FieldSpec {
	pub const fn new(name: &'static str, type_name: &'static str, required: bool) -> Self {
		Self { name, type_name, required }
	}
}

/// Implemented by every operation's request body type so the router can
/// report its shape without a body ever having been received.
pub trait RequiredFields {
	fn fields() -> Vec<FieldSpec>;
}
