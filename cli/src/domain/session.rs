//! Credentialed execution context for calls into the container platform.

use std::fmt;

/// Temporary credentials obtained by assuming a role.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .finish()
    }
}

/// A session scoped to one environment (or the default account).
///
/// Sessions are never shared across environments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub region: Option<String>,
    /// Named profile for default sessions.
    pub profile: Option<String>,
    /// Assumed-role credentials; `None` means ambient credentials.
    pub credentials: Option<Credentials>,
    /// Role this session was assumed from.
    pub role_arn: Option<String>,
}

impl Session {
    /// Environment variables that make the AWS CLI act as this session.
    #[must_use]
    pub fn env_vars(&self) -> Vec<(String, String)> {
        let mut vars = Vec::new();
        if let Some(region) = &self.region {
            vars.push(("AWS_REGION".to_string(), region.clone()));
            vars.push(("AWS_DEFAULT_REGION".to_string(), region.clone()));
        }
        if let Some(creds) = &self.credentials {
            vars.push(("AWS_ACCESS_KEY_ID".to_string(), creds.access_key_id.clone()));
            vars.push((
                "AWS_SECRET_ACCESS_KEY".to_string(),
                creds.secret_access_key.clone(),
            ));
            vars.push(("AWS_SESSION_TOKEN".to_string(), creds.session_token.clone()));
        } else if let Some(profile) = &self.profile {
            vars.push(("AWS_PROFILE".to_string(), profile.clone()));
        }
        vars
    }
}
