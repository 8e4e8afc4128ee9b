// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

// Shared, dependency-light types used across the event bus crate family.
//
// Kept deliberately small: this crate exists so that the request codec and
// the router can agree on the shape of a "required fields" report without
// either one depending on the other.

mod field;

pub use field::{FieldSpec, RequiredFields};
