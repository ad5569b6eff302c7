//! Maps roster identifiers to user accounts.

use std::sync::Arc;

use crate::error::Result;
use crate::store::UserStore;
use crate::types::{IdentifierField, User};

/// Resolves a roster identifier to a user. No caching: each call queries.
pub struct UserResolver {
    store: Arc<dyn UserStore>,
}

impl UserResolver {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Exact match on `field`. Blank identifiers never resolve.
    pub async fn resolve(&self, value: &str, field: IdentifierField) -> Result<Option<User>> {
        if value.is_empty() {
            return Ok(None);
        }
        self.store.find_by_field(field, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;
    use crate::types::UserId;

    async fn resolver_with_alice() -> UserResolver {
        let backend = Arc::new(InMemoryBackend::new());
        backend
            .insert_user(User {
                id: UserId::new(),
                username: "alice".to_string(),
                id_number: Some("A-001".to_string()),
                email: Some("alice@example.com".to_string()),
                first_name: "Alice".to_string(),
                last_name: "Martin".to_string(),
            })
            .await;
        UserResolver::new(backend)
    }

    #[tokio::test]
    async fn test_resolve_by_each_field() {
        let resolver = resolver_with_alice().await;

        for (value, field) in [
            ("alice", IdentifierField::Username),
            ("A-001", IdentifierField::IdNumber),
            ("alice@example.com", IdentifierField::Email),
        ] {
            let user = resolver.resolve(value, field).await.unwrap();
            assert_eq!(user.map(|u| u.username), Some("alice".to_string()));
        }
    }

    #[tokio::test]
    async fn test_resolve_is_exact_match() {
        let resolver = resolver_with_alice().await;
        assert!(resolver
            .resolve("Alice", IdentifierField::Username)
            .await
            .unwrap()
            .is_none());
        assert!(resolver
            .resolve("alice", IdentifierField::Email)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_blank_identifier_is_unknown() {
        let resolver = resolver_with_alice().await;
        assert!(resolver
            .resolve("", IdentifierField::Username)
            .await
            .unwrap()
            .is_none());
    }
}
