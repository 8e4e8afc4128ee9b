// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

use serde::Deserialize;

use crate::crypto::constant_time_eq;

/// One configured client's credential pair, as loaded from the `auth`
/// section of the server config.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientCredential {
    pub client_id: String,
    pub client_secret: String,
}

/// The set of credential pairs a request's `auth` object is checked
/// against. A request authenticates if it matches *any* configured entry.
///
/// Comparison is constant-time per field so that timing does not leak how
/// many characters of a guessed id or secret were correct.
pub struct CredentialStore {
    credentials: Vec<ClientCredential>,
}

impl CredentialStore {
    pub fn new(credentials: Vec<ClientCredential>) -> Self {
        Self { credentials }
    }

    pub fn authenticate(&self, client_id: &str, client_secret: &str) -> bool {
        self.credentials.iter().any(|c| {
            constant_time_eq(c.client_id.as_bytes(), client_id.as_bytes())
                && constant_time_eq(c.client_secret.as_bytes(), client_secret.as_bytes())
        })
    }
}
