//! Accounts and sessions.

use fastfood_backend::{unique_id, Query, Session};
use fastfood_core::{Error, Result};
use serde_json::json;
use tracing::{debug, info};

use crate::types::{CreateUserParams, SignInParams, User};
use crate::Api;

impl Api {
    /// Create an account, sign it in and write its user document.
    ///
    /// Not atomic: if the user document cannot be written the account
    /// and session remain.
    pub async fn create_user(&self, params: CreateUserParams) -> Result<User> {
        let account = self
            .backend
            .create_account(&unique_id(), &params.email, &params.password, &params.name)
            .await?;
        debug!("Created account {}", account.id);

        self.sign_in(SignInParams {
            email: params.email.clone(),
            password: params.password,
        })
        .await?;

        let avatar = self.backend.avatar_initials_url(&params.name);
        let doc = self
            .backend
            .create_document(
                &self.config.user_collection_id,
                &unique_id(),
                json!({
                    "accountId": account.id,
                    "email": params.email,
                    "name": params.name,
                    "avatar": avatar,
                }),
            )
            .await?;

        info!("Registered user {} ({})", doc.id, account.email);
        doc.parse()
    }

    pub async fn sign_in(&self, params: SignInParams) -> Result<Session> {
        let session = self
            .backend
            .create_email_password_session(&params.email, &params.password)
            .await?;
        debug!("Signed in {} (session {})", session.user_id, session.id);
        Ok(session)
    }

    /// The user document belonging to the signed-in account.
    pub async fn get_current_user(&self) -> Result<User> {
        let account = self.backend.get_account().await?;
        let docs = self
            .backend
            .list_documents(
                &self.config.user_collection_id,
                &[Query::equal("accountId", account.id.as_str()), Query::limit(1)],
            )
            .await?;

        docs.first()
            .ok_or_else(|| Error::NotFound(format!("no user document for account {}", account.id)))?
            .parse()
    }
}
