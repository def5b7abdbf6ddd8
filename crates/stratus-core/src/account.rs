use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use stratus_db::Database;
use stratus_types::models::{TokenKind, User, UserStatus};

use crate::capabilities::{CredentialVerifier, Notifier};
use crate::error::CoreError;
use crate::mail::{self, MailMessage};
use crate::token::TokenStore;

/// Sign-up, activation, login, and password recovery.
///
/// Accounts start inactive and stay that way until the activation secret from
/// the welcome mail comes back. Mail is composed here but dispatched in the
/// background; no account operation waits on delivery.
pub struct AccountLifecycle {
    db: Arc<Database>,
    tokens: TokenStore,
    verifier: Arc<dyn CredentialVerifier>,
    notifier: Arc<dyn Notifier>,
    public_url: String,
}

/// Sign-up form contents.
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl AccountLifecycle {
    pub fn new(
        db: Arc<Database>,
        tokens: TokenStore,
        verifier: Arc<dyn CredentialVerifier>,
        notifier: Arc<dyn Notifier>,
        public_url: String,
    ) -> Self {
        Self {
            db,
            tokens,
            verifier,
            notifier,
            public_url,
        }
    }

    /// Creates an inactive account and queues the activation mail. Returns
    /// as soon as the user row and token exist; delivery happens in the
    /// background and its failure does not undo the registration.
    pub fn register(&self, form: NewAccount) -> Result<User, CoreError> {
        if self.db.get_user_by_email(&form.email)?.is_some() {
            return Err(CoreError::Conflict("email already registered".into()));
        }

        let password_hash = self.verifier.hash(&form.password)?;
        let user = User {
            id: Uuid::new_v4(),
            first_name: form.first_name,
            last_name: form.last_name,
            email: form.email,
            password_hash,
            status: UserStatus::Inactive,
            created_at: Utc::now(),
        };
        self.db.insert_user(&user)?;

        let token = self.tokens.issue(user.id, TokenKind::Activation)?;
        self.dispatch(mail::activation_email(&user, &token.secret, &self.public_url));

        Ok(user)
    }

    /// Redeems an activation secret. The account flips to active first and
    /// the token is burned second; when two requests race on the same
    /// secret, the one that burns it reports success and the other sees an
    /// already-spent token.
    pub fn activate(&self, secret: &str) -> Result<User, CoreError> {
        let token = self.tokens.lookup(secret, TokenKind::Activation)?;
        let user = self
            .db
            .get_user_by_id(token.user_id)?
            .ok_or(CoreError::NotFound("user"))?;

        self.db.set_user_status(user.id, UserStatus::Active)?;
        if !self.tokens.consume(token.id)? {
            return Err(CoreError::InvalidToken);
        }

        Ok(User {
            status: UserStatus::Active,
            ..user
        })
    }

    /// Checks credentials against an active account. Unknown email, wrong
    /// password, and not-yet-activated accounts all fail identically.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<User, CoreError> {
        let user = self
            .db
            .get_user_by_email(email)?
            .ok_or(CoreError::Unauthorized)?;

        if user.status != UserStatus::Active {
            return Err(CoreError::Unauthorized);
        }
        if !self.verifier.verify(password, &user.password_hash)? {
            return Err(CoreError::Unauthorized);
        }

        Ok(user)
    }

    /// Issues a reset token and queues the reset mail. Unlike login, this
    /// path does say whether the email is registered: an unknown address is
    /// `NotFound`, not a silent success.
    pub fn request_password_reset(&self, email: &str) -> Result<(), CoreError> {
        let user = self
            .db
            .get_user_by_email(email)?
            .ok_or(CoreError::NotFound("email"))?;

        let token = self.tokens.issue(user.id, TokenKind::Reset)?;
        self.dispatch(mail::reset_email(&user, &token.secret, &self.public_url));

        Ok(())
    }

    /// Redeems a reset secret and stores the new password hash. Same
    /// write-then-burn order as activation, with the same single-winner
    /// outcome under a race.
    pub fn reset_password(&self, secret: &str, new_password: &str) -> Result<(), CoreError> {
        let token = self.tokens.lookup(secret, TokenKind::Reset)?;
        let user = self
            .db
            .get_user_by_id(token.user_id)?
            .ok_or(CoreError::NotFound("user"))?;

        let password_hash = self.verifier.hash(new_password)?;
        self.db.set_user_password(user.id, &password_hash)?;
        if !self.tokens.consume(token.id)? {
            return Err(CoreError::InvalidToken);
        }

        Ok(())
    }

    pub fn profile(&self, user_id: Uuid) -> Result<User, CoreError> {
        self.db
            .get_user_by_id(user_id)?
            .ok_or(CoreError::NotFound("user"))
    }

    /// Queues the message and returns immediately. The caller's operation
    /// has already committed by the time the send resolves, so a delivery
    /// failure can only be logged.
    fn dispatch(&self, mail: MailMessage) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(err) = notifier.send(&mail).await {
                warn!(to = %mail.to, subject = %mail.subject, "mail delivery failed: {err:#}");
                // The body carries the activation/reset link, so a local
                // setup without a mail API can still complete the flow.
                debug!(to = %mail.to, "undelivered message body: {}", mail.html);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{self, FailingNotifier, PlainVerifier, RecordingNotifier};

    fn lifecycle(
        db: Arc<Database>,
        notifier: Arc<dyn Notifier>,
    ) -> (AccountLifecycle, TokenStore) {
        let tokens = TokenStore::new(db.clone());
        let accounts = AccountLifecycle::new(
            db,
            tokens.clone(),
            Arc::new(PlainVerifier),
            notifier,
            "https://app.example.com".to_string(),
        );
        (accounts, tokens)
    }

    fn form(email: &str) -> NewAccount {
        NewAccount {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            password: "engine-no-9".into(),
        }
    }

    #[tokio::test]
    async fn register_creates_inactive_account_and_mails_the_secret() {
        let db = testutil::memory_db();
        let notifier = Arc::new(RecordingNotifier::default());
        let (accounts, tokens) = lifecycle(db, notifier.clone());

        let user = accounts.register(form("ada@example.com")).unwrap();
        assert_eq!(user.status, UserStatus::Inactive);

        let sent = notifier.wait_for(1).await;
        assert_eq!(sent[0].to, "ada@example.com");

        // The mailed link carries a secret that actually resolves.
        let secret = testutil::extract_link_secret(&sent[0].html, "/activate/");
        assert!(tokens.lookup(&secret, TokenKind::Activation).is_ok());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let db = testutil::memory_db();
        let (accounts, _) = lifecycle(db, Arc::new(RecordingNotifier::default()));

        accounts.register(form("dup@example.com")).unwrap();
        assert!(matches!(
            accounts.register(form("dup@example.com")),
            Err(CoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn registration_survives_a_dead_mailer() {
        let db = testutil::memory_db();
        let (accounts, _) = lifecycle(db.clone(), Arc::new(FailingNotifier));

        let user = accounts.register(form("offline@example.com")).unwrap();
        tokio::task::yield_now().await;

        // The account is there regardless of what happened to the mail.
        assert!(db.get_user_by_id(user.id).unwrap().is_some());
    }

    #[tokio::test]
    async fn activation_is_single_use() {
        let db = testutil::memory_db();
        let notifier = Arc::new(RecordingNotifier::default());
        let (accounts, _) = lifecycle(db, notifier.clone());

        accounts.register(form("once@example.com")).unwrap();
        let sent = notifier.wait_for(1).await;
        let secret = testutil::extract_link_secret(&sent[0].html, "/activate/");

        let activated = accounts.activate(&secret).unwrap();
        assert_eq!(activated.status, UserStatus::Active);

        assert!(matches!(
            accounts.activate(&secret),
            Err(CoreError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn login_fails_uniformly() {
        let db = testutil::memory_db();
        let notifier = Arc::new(RecordingNotifier::default());
        let (accounts, _) = lifecycle(db, notifier.clone());

        accounts.register(form("who@example.com")).unwrap();

        // Inactive account, correct password.
        assert!(matches!(
            accounts.authenticate("who@example.com", "engine-no-9"),
            Err(CoreError::Unauthorized)
        ));
        // Unknown email.
        assert!(matches!(
            accounts.authenticate("ghost@example.com", "engine-no-9"),
            Err(CoreError::Unauthorized)
        ));

        let sent = notifier.wait_for(1).await;
        let secret = testutil::extract_link_secret(&sent[0].html, "/activate/");
        accounts.activate(&secret).unwrap();

        // Active account, wrong password: still the same error.
        assert!(matches!(
            accounts.authenticate("who@example.com", "wrong"),
            Err(CoreError::Unauthorized)
        ));

        let user = accounts
            .authenticate("who@example.com", "engine-no-9")
            .unwrap();
        assert_eq!(user.email, "who@example.com");
    }

    #[tokio::test]
    async fn forgot_password_reveals_unknown_addresses() {
        let db = testutil::memory_db();
        let (accounts, _) = lifecycle(db, Arc::new(RecordingNotifier::default()));

        assert!(matches!(
            accounts.request_password_reset("nobody@example.com"),
            Err(CoreError::NotFound("email"))
        ));
    }

    #[tokio::test]
    async fn reset_flow_replaces_the_password_once() {
        let db = testutil::memory_db();
        let notifier = Arc::new(RecordingNotifier::default());
        let (accounts, _) = lifecycle(db, notifier.clone());

        accounts.register(form("reset@example.com")).unwrap();
        let sent = notifier.wait_for(1).await;
        let activation = testutil::extract_link_secret(&sent[0].html, "/activate/");
        accounts.activate(&activation).unwrap();

        accounts
            .request_password_reset("reset@example.com")
            .unwrap();
        let sent = notifier.wait_for(2).await;
        let secret = testutil::extract_link_secret(&sent[1].html, "?token=");

        accounts.reset_password(&secret, "new-password-1").unwrap();

        // Old password is dead, new one works.
        assert!(matches!(
            accounts.authenticate("reset@example.com", "engine-no-9"),
            Err(CoreError::Unauthorized)
        ));
        accounts
            .authenticate("reset@example.com", "new-password-1")
            .unwrap();

        // Second redemption of the same secret is refused.
        assert!(matches!(
            accounts.reset_password(&secret, "another-one"),
            Err(CoreError::InvalidToken)
        ));
    }
}
