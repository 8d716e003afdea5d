//! Login, session tokens and the bearer-token middleware.
//!
//! Credentials are checked against the user store first and the built-in
//! demo accounts second. Each login issues a random token that expires after
//! a configured lifetime; the token table is persisted as JSON so sessions
//! survive a restart.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use helpdesk_chat::Participant;
use helpdesk_core::error::{HelpdeskError, Result};
use helpdesk_core::types::{UserAccount, UserRecord};
use helpdesk_storage::FallbackRepository;

use crate::error::ApiError;
use crate::state::AppState;

/// Generate a random 32-character hex token.
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    hex::encode(bytes)
}

// =============================================================================
// Token store
// =============================================================================

/// A signed-in account and when its token was issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenEntry {
    account: UserAccount,
    issued_at: DateTime<Utc>,
}

/// Token -> account table, optionally mirrored to a file.
///
/// Tokens expire `ttl` after issue. Expired tokens are never returned and
/// are pruned on load and on every login.
#[derive(Debug)]
pub struct TokenStore {
    path: Option<PathBuf>,
    ttl: TimeDelta,
    sessions: Mutex<HashMap<String, TokenEntry>>,
}

impl TokenStore {
    /// A store that lives only in memory.
    pub fn in_memory(ttl: TimeDelta) -> Self {
        Self {
            path: None,
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Load sessions from `path`. A missing or unreadable file starts empty.
    pub fn load(path: &Path, ttl: TimeDelta) -> Self {
        let mut sessions = match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<HashMap<String, TokenEntry>>(&contents) {
                Ok(sessions) => sessions,
                Err(e) => {
                    warn!(error = %e, "Ignoring corrupt session file {}", path.display());
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        let loaded = sessions.len();
        let cutoff = Utc::now() - ttl;
        sessions.retain(|_, entry| entry.issued_at > cutoff);
        if loaded > 0 {
            info!(
                count = sessions.len(),
                expired = loaded - sessions.len(),
                "Sessions loaded from {}",
                path.display()
            );
        }
        Self {
            path: Some(path.to_path_buf()),
            ttl,
            sessions: Mutex::new(sessions),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, TokenEntry>>> {
        self.sessions
            .lock()
            .map_err(|e| HelpdeskError::Storage(format!("session lock poisoned: {}", e)))
    }

    fn cutoff(&self) -> DateTime<Utc> {
        Utc::now() - self.ttl
    }

    /// The account behind a live token.
    pub fn get(&self, token: &str) -> Option<UserAccount> {
        let cutoff = self.cutoff();
        let sessions = self.lock().ok()?;
        sessions
            .get(token)
            .filter(|entry| entry.issued_at > cutoff)
            .map(|entry| entry.account.clone())
    }

    pub fn insert(&self, token: String, account: UserAccount) -> Result<()> {
        let cutoff = self.cutoff();
        let mut sessions = self.lock()?;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.issued_at > cutoff);
        if sessions.len() < before {
            debug!(pruned = before - sessions.len(), "Pruned expired sessions");
        }
        sessions.insert(
            token,
            TokenEntry {
                account,
                issued_at: Utc::now(),
            },
        );
        self.persist(&sessions);
        Ok(())
    }

    /// Remove a token. Returns whether it existed.
    pub fn remove(&self, token: &str) -> Result<bool> {
        let mut sessions = self.lock()?;
        let removed = sessions.remove(token).is_some();
        if removed {
            self.persist(&sessions);
        }
        Ok(removed)
    }

    /// Number of stored tokens, including any not yet pruned.
    pub fn len(&self) -> usize {
        self.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self, sessions: &HashMap<String, TokenEntry>) {
        let Some(path) = &self.path else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let contents = match serde_json::to_string_pretty(sessions) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to serialize sessions");
                return;
            }
        };
        if let Err(e) = std::fs::write(path, contents) {
            warn!(error = %e, "Failed to save sessions to {}", path.display());
            return;
        }
        // Restrict the session file to owner-only access.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
        }
    }
}

// =============================================================================
// Auth gate
// =============================================================================

pub struct AuthGate {
    users: Arc<FallbackRepository<UserRecord>>,
    demo_users: Vec<UserRecord>,
    tokens: TokenStore,
}

impl AuthGate {
    pub fn new(
        users: Arc<FallbackRepository<UserRecord>>,
        demo_users: Vec<UserRecord>,
        tokens: TokenStore,
    ) -> Self {
        Self {
            users,
            demo_users,
            tokens,
        }
    }

    /// Match credentials and open a session.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, UserAccount)> {
        let email = email.trim();
        let fetched = self.users.fetch_all().await;

        let record = fetched
            .records
            .iter()
            .find(|u| u.matches(email, password))
            .or_else(|| self.demo_users.iter().find(|u| u.matches(email, password)));

        let Some(record) = record else {
            info!(email, "Login rejected");
            return Err(HelpdeskError::InvalidCredentials);
        };

        let account = record.account();
        let token = generate_token();
        self.tokens.insert(token.clone(), account.clone())?;
        info!(
            user_id = account.id,
            role = ?account.role,
            from_fallback = fetched.is_fallback(),
            "Login succeeded"
        );
        Ok((token, account))
    }

    pub fn logout(&self, token: &str) -> Result<bool> {
        self.tokens.remove(token)
    }

    pub fn account(&self, token: &str) -> Option<UserAccount> {
        self.tokens.get(token)
    }

    pub fn session_count(&self) -> usize {
        self.tokens.len()
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("sessions", &self.tokens.len())
            .finish()
    }
}

// =============================================================================
// Middleware
// =============================================================================

/// The authenticated caller, placed in request extensions by `require_auth`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub token: String,
    pub account: UserAccount,
}

impl CurrentUser {
    /// The caller as seen by the chat orchestrator.
    pub fn participant(&self) -> Participant {
        if self.account.role.is_admin() {
            Participant::admin(self.account.id)
        } else {
            Participant::user(self.account.id)
        }
    }
}

fn reject(status: StatusCode, error: &str, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": error,
            "message": message
        })),
    )
        .into_response()
}

/// Middleware that validates Bearer token authentication.
///
/// Looks the token up in the session table and stores the account in the
/// request extensions. Returns 401 if missing or unknown.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let value_str = match req.headers().get("authorization") {
        Some(value) => match value.to_str() {
            Ok(s) => s.to_string(),
            Err(_) => {
                return reject(
                    StatusCode::UNAUTHORIZED,
                    "unauthorized",
                    "Invalid Authorization header encoding",
                );
            }
        },
        None => {
            return reject(
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Missing Authorization header",
            );
        }
    };

    if let Some(token) = value_str.strip_prefix("Bearer ") {
        if let Some(account) = state.auth.account(token) {
            req.extensions_mut().insert(CurrentUser {
                token: token.to_string(),
                account,
            });
            return next.run(req).await;
        }
    }

    reject(
        StatusCode::UNAUTHORIZED,
        "unauthorized",
        "Invalid bearer token",
    )
}

/// Middleware that only lets admins through. Runs inside `require_auth`.
pub async fn require_admin(req: Request, next: Next) -> Response {
    let is_admin = req
        .extensions()
        .get::<CurrentUser>()
        .map(|u| u.account.role.is_admin())
        .unwrap_or(false);
    if is_admin {
        next.run(req).await
    } else {
        ApiError::from(HelpdeskError::Forbidden(
            "Administrator access required".to_string(),
        ))
        .into_response()
    }
}
