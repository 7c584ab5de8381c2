use crate::model::CategoryFilter;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug)]
pub struct Config {
    pub supabase: SupabaseConfig,
    pub catalog: CatalogConfig,
    pub demo_config: DemoConfig,
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    /// Resumes an existing session instead of starting anonymous
    pub access_token: Option<String>,
    pub request_timeout: Duration,
    pub max_retries: u32,
}

/// Where events and their images live on the backend
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub collection: String,
    pub bucket: String,
}

/// Drives the binary: who to sign in as and what to show
#[derive(Debug, Clone, Default)]
pub struct DemoConfig {
    pub sign_in: Option<Credentials>,
    pub query: String,
    pub category: CategoryFilter,
    pub mine_only: bool,
}

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be set.")]
    Missing(&'static str),

    #[error("Invalid config '{name}'. Expected {expected}.")]
    Invalid {
        name: &'static str,
        expected: &'static str,
    },
}
