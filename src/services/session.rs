use serde::Serialize;
use uuid::Uuid;

/// Anonymous identity for the lifetime of the running dashboard
///
/// Nothing here is persisted. `anonymous_id` only changes on [`new_user`],
/// and every identity change also yields a fresh `session_id`.
///
/// [`new_user`]: SessionIdentity::new_user
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SessionIdentity {
    anonymous_id: String,
    session_id: String,
}

impl Default for SessionIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionIdentity {
    pub fn new() -> Self {
        Self {
            anonymous_id: generate_anonymous_id(),
            session_id: generate_session_id(),
        }
    }

    pub fn anonymous_id(&self) -> &str {
        &self.anonymous_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Keeps the user, starts a new session
    pub fn new_session(&mut self) {
        self.session_id = generate_session_id();
        tracing::info!(anonymous_id = %self.anonymous_id, session_id = %self.session_id, "New session");
    }

    /// Switches to a brand new anonymous user, which also starts a new session
    pub fn new_user(&mut self) {
        self.anonymous_id = generate_anonymous_id();
        self.session_id = generate_session_id();
        tracing::info!(anonymous_id = %self.anonymous_id, session_id = %self.session_id, "New anonymous user");
    }
}

/// `anon_` followed by six lowercase hex characters
fn generate_anonymous_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("anon_{}", &hex[..6])
}

fn generate_session_id() -> String {
    Uuid::new_v4().to_string()
}
