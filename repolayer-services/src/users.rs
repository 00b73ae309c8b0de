//! User accounts: creation with credential hashing, and login verification.

use bson::Uuid;
use repolayer_core::{client::StoreClient, filter::Filter, repository::Repository};
use repolayer_macros::Document;
use serde::{Deserialize, Serialize};
use std::{ops::Deref, sync::Arc};
use tracing::info;

use crate::error::{ServiceError, ServiceResult};

#[derive(Document, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[document(collection = "users")]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub email: String,
    /// bcrypt hash, never the plaintext credential.
    #[document(redact)]
    pub password: String,
    pub created_at: bson::DateTime,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug)]
pub struct UserRepository(Repository<User>);

impl UserRepository {
    pub fn new(client: Arc<dyn StoreClient>) -> Self {
        Self(Repository::new(client))
    }

    pub async fn find_by_email(&self, email: &str) -> repolayer_core::error::RepositoryResult<User> {
        self.0.find_one(&Filter::eq("email", email)).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> repolayer_core::error::RepositoryResult<User> {
        self.0.find_one(&Filter::eq("id", id)).await
    }
}

impl Deref for UserRepository {
    type Target = Repository<User>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Clone)]
pub struct UsersService {
    repository: UserRepository,
}

impl UsersService {
    pub fn new(repository: UserRepository) -> Self {
        Self { repository }
    }

    /// Registers an account. The password is hashed before anything reaches
    /// the repository; the stored document never holds plaintext.
    pub async fn create(&self, request: CreateUser) -> ServiceResult<User> {
        if request.email.trim().is_empty() || !request.email.contains('@') {
            return Err(ServiceError::InvalidRequest(
                "a valid email address is required".to_string(),
            ));
        }
        if request.password.is_empty() {
            return Err(ServiceError::InvalidRequest(
                "a password is required".to_string(),
            ));
        }
        self.ensure_email_unused(&request.email).await?;

        let hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
            .map_err(|err| ServiceError::InvalidRequest(err.to_string()))?;

        let user = self
            .repository
            .create(&User {
                id: None,
                email: request.email,
                password: hash,
                created_at: bson::DateTime::now(),
            })
            .await?;

        info!(email = %user.email, "user created");
        Ok(user)
    }

    /// Checks a presented password against the stored hash.
    ///
    /// An unknown email and a wrong password fail identically, so the
    /// response never reveals which accounts exist.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> ServiceResult<User> {
        let user = match self.repository.find_by_email(email).await {
            Ok(user) => user,
            Err(err) if err.is_not_found() => return Err(ServiceError::InvalidCredentials),
            Err(err) => return Err(err.into()),
        };

        let valid = bcrypt::verify(password, &user.password)
            .map_err(|_| ServiceError::InvalidCredentials)?;
        if !valid {
            return Err(ServiceError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> ServiceResult<User> {
        Ok(self.repository.find_by_id(id).await?)
    }

    async fn ensure_email_unused(&self, email: &str) -> ServiceResult<()> {
        match self.repository.find_by_email(email).await {
            Ok(_) => Err(ServiceError::InvalidRequest(format!(
                "an account already exists for '{email}'"
            ))),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repolayer_memory::InMemoryClient;

    fn service() -> UsersService {
        let client = Arc::new(InMemoryClient::new());
        UsersService::new(UserRepository::new(client))
    }

    fn request() -> CreateUser {
        CreateUser {
            email: "alice@example.com".to_string(),
            password: "hunter2".to_string(),
        }
    }

    #[tokio::test]
    async fn stored_password_is_a_hash() {
        let service = service();
        let user = service.create(request()).await.unwrap();

        assert!(user.id.is_some());
        assert_ne!(user.password, "hunter2");
        assert!(bcrypt::verify("hunter2", &user.password).unwrap());
    }

    #[tokio::test]
    async fn duplicate_emails_are_rejected() {
        let service = service();
        service.create(request()).await.unwrap();

        let err = service.create(request()).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn verification_accepts_the_right_password_only() {
        let service = service();
        service.create(request()).await.unwrap();

        let user = service
            .verify_credentials("alice@example.com", "hunter2")
            .await
            .unwrap();
        assert_eq!(user.email, "alice@example.com");

        let err = service
            .verify_credentials("alice@example.com", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn unknown_accounts_fail_like_wrong_passwords() {
        let service = service();

        let err = service
            .verify_credentials("nobody@example.com", "hunter2")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn malformed_requests_never_reach_the_store() {
        let service = service();

        let err = service
            .create(CreateUser { email: "not-an-email".to_string(), password: "x".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest(_)));
    }
}
