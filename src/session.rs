//! Authenticated session lifecycle.
//!
//! [`SessionStore`] owns the client and a durable [`KeyValueStore`].  It is
//! passed by reference to whatever needs the current identity; mutators take
//! `&mut self`, so two logins can never interleave on one store.
//!
//! ```text
//! Loading ──init──> Unauthenticated ──login/signup──> Authenticated
//!    │                     ^                               │
//!    └───init (persisted)──┼──────────────> Authenticated  │
//!                          └──── logout / rejected refresh ┘
//! ```

use crate::client::FinChat;
use crate::error::{Error, Result};
use crate::observability::{
    SESSION_LOGIN_FAILURES, SESSION_LOGINS, SESSION_LOGOUTS, SESSION_REFRESH_REJECTIONS,
};
use crate::storage::{KeyValueStore, TOKEN_KEY, USER_KEY};
use crate::types::{ApiResult, AuthOutcome, AuthResponse, User};

const LOGIN_FAILED: &str = "Login failed";
const SIGNUP_FAILED: &str = "Signup failed";
const CONNECTION_FAILED: &str = "Could not connect to server";

/// An authenticated identity and the token that proves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Where the session store is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Persisted state has not been read yet.
    Loading,
    /// No valid credentials are held.
    Unauthenticated,
    /// Credentials are held and were last accepted by the server.
    Authenticated(Session),
}

/// Holds the current session and keeps it in sync with durable storage.
pub struct SessionStore<S: KeyValueStore> {
    client: FinChat,
    storage: S,
    state: SessionState,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Create a store in the `Loading` state.  Call [`init`](Self::init) next.
    pub fn new(client: FinChat, storage: S) -> Self {
        Self {
            client,
            storage,
            state: SessionState::Loading,
        }
    }

    /// Restore persisted credentials and confirm them with the server.
    ///
    /// Unreadable or corrupt persisted state leaves the store unauthenticated.
    /// When credentials are restored the identity refresh result is returned.
    pub async fn init(&mut self) -> Option<ApiResult<User>> {
        match self.load_persisted().await {
            Ok(Some(session)) => {
                tracing::debug!(user_id = session.user.id, "restored persisted session");
                self.state = SessionState::Authenticated(session);
                Some(self.refresh_identity().await)
            }
            Ok(None) => {
                self.state = SessionState::Unauthenticated;
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "discarding unreadable persisted session");
                self.state = SessionState::Unauthenticated;
                if let Err(err) = self.clear_persisted().await {
                    tracing::warn!(error = %err, "failed to purge persisted session");
                }
                None
            }
        }
    }

    async fn load_persisted(&self) -> Result<Option<Session>> {
        let token = self.storage.get(TOKEN_KEY).await?;
        let user = self.storage.get(USER_KEY).await?;
        match (token, user) {
            (Some(token), Some(user)) if !token.is_empty() => {
                let user: User = serde_json::from_str(&user)?;
                Ok(Some(Session { user, token }))
            }
            _ => Ok(None),
        }
    }

    /// Authenticate with email and password.
    pub async fn login(&mut self, email: &str, password: &str) -> AuthOutcome {
        let result = self.client.login(email, password).await;
        self.complete_auth(result, LOGIN_FAILED).await
    }

    /// Create an account and authenticate as it.
    pub async fn signup(&mut self, name: &str, email: &str, password: &str) -> AuthOutcome {
        let result = self.client.signup(name, email, password).await;
        self.complete_auth(result, SIGNUP_FAILED).await
    }

    async fn complete_auth(
        &mut self,
        result: ApiResult<AuthResponse>,
        fallback: &str,
    ) -> AuthOutcome {
        let response = match result.into_result() {
            Ok(response) => response,
            Err(err) => {
                SESSION_LOGIN_FAILURES.click();
                tracing::info!(error = %err, "authentication failed");
                return AuthOutcome::failure(auth_failure_message(&err, fallback));
            }
        };

        let session = Session {
            user: response.user,
            token: response.access_token,
        };
        if let Err(err) = self.persist(&session).await {
            SESSION_LOGIN_FAILURES.click();
            tracing::warn!(error = %err, "could not persist session");
            if let Err(err) = self.clear_persisted().await {
                tracing::warn!(error = %err, "failed to purge partial session");
            }
            self.state = SessionState::Unauthenticated;
            return AuthOutcome::failure(format!("Could not save session: {}", err.message()));
        }

        SESSION_LOGINS.click();
        tracing::info!(user_id = session.user.id, "authenticated");
        self.state = SessionState::Authenticated(session);
        AuthOutcome::success(response.message.unwrap_or_default())
    }

    /// Re-fetch the identity behind the held token.
    ///
    /// A server rejection logs the session out.  Transport failures keep the
    /// session as is; the returned result carries the error either way.
    pub async fn refresh_identity(&mut self) -> ApiResult<User> {
        let Some(token) = self.token().map(String::from) else {
            return ApiResult::err(Error::authentication("not logged in"));
        };

        let result = self.client.me(&token).await;
        if let Some(user) = result.data.clone() {
            let session = Session { user, token };
            if let Err(err) = self.persist(&session).await {
                tracing::warn!(error = %err, "could not persist refreshed identity");
            }
            self.state = SessionState::Authenticated(session);
        } else if result.is_rejection() {
            SESSION_REFRESH_REJECTIONS.click();
            tracing::info!(status = result.status, "identity refresh rejected; logging out");
            if let Err(err) = self.logout().await {
                tracing::warn!(error = %err, "failed to purge persisted session");
            }
        } else {
            tracing::warn!(
                error = result.error_or("unknown error"),
                "identity refresh failed; keeping session"
            );
        }
        result
    }

    /// Forget the session in memory and in storage.
    ///
    /// The in-memory state is cleared even if storage fails; calling this
    /// when already logged out is harmless.
    pub async fn logout(&mut self) -> Result<()> {
        if self.is_authenticated() {
            SESSION_LOGOUTS.click();
            tracing::info!("logged out");
        }
        self.state = SessionState::Unauthenticated;
        self.clear_persisted().await
    }

    async fn persist(&self, session: &Session) -> Result<()> {
        let user = serde_json::to_string(&session.user)?;
        self.storage.set(TOKEN_KEY, &session.token).await?;
        self.storage.set(USER_KEY, &user).await
    }

    async fn clear_persisted(&self) -> Result<()> {
        let token = self.storage.remove(TOKEN_KEY).await;
        let user = self.storage.remove(USER_KEY).await;
        token.and(user)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.session().map(|session| &session.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.session().map(|session| session.token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Loading)
    }

    pub fn client(&self) -> &FinChat {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut FinChat {
        &mut self.client
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

fn auth_failure_message(err: &Error, fallback: &str) -> String {
    if err.is_connection() || err.is_timeout() {
        return CONNECTION_FAILED.to_string();
    }
    if err.is_abort() {
        return err.message().to_string();
    }
    let message = err.message().trim();
    if err.is_rejection() && !message.is_empty() {
        message.to_string()
    } else {
        fallback.to_string()
    }
}
