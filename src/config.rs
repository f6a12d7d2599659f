// src/config.rs
//! Credential resolution for the remote quote service.
//!
//! Lookup order per secret: build-time injected constant (`option_env!`,
//! the deployment's analogue of a bundler define) → process-wide injected
//! runtime value → process environment variable. Empty values fall through
//! to the next source. Absence of either secret disables remote rendering
//! for the run; nothing here retries or crashes.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

pub const EMAIL_VAR: &str = "HITOKOTO_EMAIL";
pub const PASSWORD_VAR: &str = "HITOKOTO_PASSWORD";

const BUILD_EMAIL: Option<&str> = option_env!("HITOKOTO_EMAIL");
const BUILD_PASSWORD: Option<&str> = option_env!("HITOKOTO_PASSWORD");

static INJECTED: Lazy<RwLock<HashMap<String, String>>> = Lazy::new(Default::default);

/// Inject a runtime value for `name`, shadowing the environment for every
/// later [`resolve`] in this process. Host applications use this when the
/// secrets come from somewhere other than the environment.
pub fn inject(name: &str, value: impl Into<String>) {
    INJECTED
        .write()
        .expect("credential override lock poisoned")
        .insert(name.to_string(), value.into());
}

/// Drop a previously injected value.
pub fn clear_injected(name: &str) {
    INJECTED
        .write()
        .expect("credential override lock poisoned")
        .remove(name);
}

/// Resolve one named secret through the three-stage chain.
pub fn resolve(name: &str) -> Option<String> {
    let build_time = match name {
        EMAIL_VAR => BUILD_EMAIL,
        PASSWORD_VAR => BUILD_PASSWORD,
        _ => None,
    };
    if let Some(v) = build_time.filter(|v| !v.is_empty()) {
        return Some(v.to_string());
    }

    if let Some(v) = INJECTED
        .read()
        .expect("credential override lock poisoned")
        .get(name)
        .filter(|v| !v.is_empty())
    {
        return Some(v.clone());
    }

    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    // keep the password out of logs
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"..")
            .finish()
    }
}

/// Both secrets, or `None` if either is missing — half-configured
/// deployments degrade to local-only rendering instead of erroring.
pub fn resolve_credentials() -> Option<Credentials> {
    Some(Credentials {
        email: resolve(EMAIL_VAR)?,
        password: resolve(PASSWORD_VAR)?,
    })
}

/// Resolution function handed to the orchestrator at construction, so the
/// core stays testable without touching the real environment.
pub type CredentialSource = Arc<dyn Fn() -> Option<Credentials> + Send + Sync>;

/// The default source: the full three-stage chain.
pub fn default_source() -> CredentialSource {
    Arc::new(resolve_credentials)
}
