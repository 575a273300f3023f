use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::entity::user;
use crate::error::AppError;
use crate::store::IdentityStore;
use crate::utils::hash;

/// Secret behind the hash checked for unknown usernames. Nothing can log in with it.
const DUMMY_SECRET: &str = "no-account-uses-this-secret";

/// Checks presented credentials against stored Argon2 hashes.
///
/// An unknown username still costs one Argon2 verification, so response time
/// does not reveal which accounts exist.
#[derive(Clone)]
pub struct CredentialVerifier {
    identities: Arc<dyn IdentityStore>,
    dummy_hash: Arc<OnceCell<String>>,
}

impl CredentialVerifier {
    pub fn new(identities: Arc<dyn IdentityStore>) -> Self {
        Self {
            identities,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Returns the matching user, or `None` on an unknown username or a wrong
    /// secret. Only store failures surface as errors.
    pub async fn verify(
        &self,
        username: &str,
        secret: &str,
    ) -> Result<Option<user::Model>, AppError> {
        let Some(user) = self.identities.find_user_by_username(username).await? else {
            debug!("Unknown username");
            self.burn_verification(secret).await?;
            return Ok(None);
        };

        let matched = hash::verify_password(secret, &user.password)
            .await
            .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;

        Ok(matched.then_some(user))
    }

    async fn burn_verification(&self, secret: &str) -> Result<(), AppError> {
        let dummy = self
            .dummy_hash
            .get_or_try_init(|| hash::hash_password(DUMMY_SECRET))
            .await
            .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;
        hash::verify_password(secret, dummy)
            .await
            .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
        Ok(())
    }
}
