//! Provider-specific process environments

use std::collections::HashMap;

use secrecy::{ExposeSecret, SecretString};

use crate::models::request::Provider;

/// Account-level Railway token; project init/link/whoami run under it
pub const RAILWAY_ACCOUNT_TOKEN_VAR: &str = "RAILWAY_API_TOKEN";

/// Project-scoped Railway token; takes precedence over the account-level
/// variable and silently blocks account-level operations when present
pub const RAILWAY_PROJECT_TOKEN_VAR: &str = "RAILWAY_TOKEN";

pub const NETLIFY_AUTH_TOKEN_VAR: &str = "NETLIFY_AUTH_TOKEN";

/// Build the full environment for a provider CLI invocation.
///
/// Starts from the ambient environment so PATH and friends survive, then
/// layers the provider's auth and non-interactive settings on top.
pub fn build_environment(provider: Provider, token: &SecretString) -> HashMap<String, String> {
    let mut env: HashMap<String, String> = std::env::vars().collect();
    apply_provider_env(&mut env, provider, token);
    env
}

pub(crate) fn apply_provider_env(
    env: &mut HashMap<String, String>,
    provider: Provider,
    token: &SecretString,
) {
    // Shared CI flag keeps either CLI from blocking on a terminal it
    // does not have.
    env.insert("CI".to_string(), "true".to_string());

    match provider {
        Provider::Railway => {
            env.remove(RAILWAY_PROJECT_TOKEN_VAR);
            env.insert(
                RAILWAY_ACCOUNT_TOKEN_VAR.to_string(),
                token.expose_secret().to_string(),
            );
        }
        Provider::Netlify => {
            env.insert(
                NETLIFY_AUTH_TOKEN_VAR.to_string(),
                token.expose_secret().to_string(),
            );
            env.insert("NETLIFY_NON_INTERACTIVE".to_string(), "true".to_string());
            env.insert("NODE_ENV".to_string(), "production".to_string());
        }
    }
}
