use std::sync::RwLock;

use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::Platform;

const USER_ID_LENGTH: usize = 16;

/// Generate a random 16-character alphanumeric user identifier.
///
/// The identifier is only meant to group telemetry from one client instance. It comes from a
/// non-cryptographic generator and must not be used as a secret or for authentication.
pub fn generate_user_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(USER_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// Who the client is talking to the server as.
///
/// Everything is fixed at construction except the user id, which callers may overwrite to bind a
/// real user.
pub(crate) struct ClientIdentity {
    pub api_key: String,
    pub app_id: String,
    pub platform: Platform,
    user_id: RwLock<String>,
}

impl ClientIdentity {
    pub fn new(
        api_key: String,
        app_id: String,
        platform: Platform,
        user_id: Option<String>,
    ) -> ClientIdentity {
        ClientIdentity {
            api_key,
            app_id,
            platform,
            user_id: RwLock::new(user_id.unwrap_or_else(generate_user_id)),
        }
    }

    pub fn user_id(&self) -> String {
        // A poisoned lock still holds a valid String; the writer only ever replaces it whole.
        match self.user_id.read() {
            Ok(user_id) => user_id.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_user_id(&self, user_id: String) {
        match self.user_id.write() {
            Ok(mut slot) => *slot = user_id,
            Err(poisoned) => *poisoned.into_inner() = user_id,
        }
    }
}
