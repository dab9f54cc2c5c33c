//! In-memory grant verifier for resource owner credentials, assertions, and trusted clients.

use crate::errors::StorageError;
use crate::oauth::grants::{GrantCheck, GrantVerifier};
use crate::storage::inmemory::oauth::SeedData;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Resource owner known to the in-memory verifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
    /// Scope granted when this user's credentials are accepted
    #[serde(default)]
    pub scope: Option<String>,
}

/// Assertion accepted by the in-memory verifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedAssertion {
    pub assertion_type: String,
    pub assertion: String,
    /// Restricts the assertion to one client when set
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// In-memory grant verifier
#[derive(Debug, Default)]
pub struct MemoryGrantVerifier {
    users: HashMap<String, SeedUser>,
    assertions: Vec<SeedAssertion>,
    trusted_clients: HashSet<String>,
}

impl MemoryGrantVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: &SeedData) -> Self {
        let mut verifier = Self::new();
        for user in &seed.users {
            verifier = verifier.with_user(user.clone());
        }
        for assertion in &seed.assertions {
            verifier = verifier.with_assertion(assertion.clone());
        }
        for client_id in &seed.trusted_clients {
            verifier = verifier.with_trusted_client(client_id);
        }
        verifier
    }

    pub fn with_user(mut self, user: SeedUser) -> Self {
        self.users.insert(user.username.clone(), user);
        self
    }

    pub fn with_assertion(mut self, assertion: SeedAssertion) -> Self {
        self.assertions.push(assertion);
        self
    }

    pub fn with_trusted_client(mut self, client_id: &str) -> Self {
        self.trusted_clients.insert(client_id.to_string());
        self
    }
}

#[async_trait]
impl GrantVerifier for MemoryGrantVerifier {
    async fn check_user_credentials(
        &self,
        _client_id: &str,
        username: &str,
        password: &str,
    ) -> Result<GrantCheck, StorageError> {
        Ok(match self.users.get(username) {
            Some(user) if user.password == password => GrantCheck::Granted(user.scope.clone()),
            _ => GrantCheck::Denied,
        })
    }

    async fn check_assertion(
        &self,
        client_id: &str,
        assertion_type: &str,
        assertion: &str,
    ) -> Result<GrantCheck, StorageError> {
        let matched = self.assertions.iter().find(|candidate| {
            candidate.assertion_type == assertion_type
                && candidate.assertion == assertion
                && candidate
                    .client_id
                    .as_deref()
                    .is_none_or(|bound| bound == client_id)
        });

        Ok(match matched {
            Some(found) => GrantCheck::Granted(found.scope.clone()),
            None => GrantCheck::Denied,
        })
    }

    async fn check_implicit_trust(&self, client_id: &str) -> Result<GrantCheck, StorageError> {
        Ok(if self.trusted_clients.contains(client_id) {
            GrantCheck::Granted(None)
        } else {
            GrantCheck::Denied
        })
    }
}
