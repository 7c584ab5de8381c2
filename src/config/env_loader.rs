use crate::config::model::{
    CatalogConfig, Config, ConfigError, Credentials, DemoConfig, SupabaseConfig,
};
use crate::model::CategoryFilter;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_COLLECTION: &str = "events";
const DEFAULT_BUCKET: &str = "event-images";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 5;

pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(|name| env::var(name).ok())
}

pub fn load_config_from<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let supabase = SupabaseConfig {
        url: load_required(&lookup, "SUPABASE_URL")?,
        anon_key: load_required(&lookup, "SUPABASE_ANON_KEY")?,
        access_token: load_optional(&lookup, "SUPABASE_ACCESS_TOKEN"),
        request_timeout: Duration::from_secs(load_number_config(
            &lookup,
            "REQUEST_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?),
        max_retries: load_number_config(&lookup, "MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
    };

    let catalog = CatalogConfig {
        collection: load_optional(&lookup, "EVENTS_COLLECTION")
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
        bucket: load_optional(&lookup, "IMAGES_BUCKET")
            .unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
    };

    let sign_in = match (
        load_optional(&lookup, "SIGN_IN_EMAIL"),
        load_optional(&lookup, "SIGN_IN_PASSWORD"),
    ) {
        (Some(email), Some(password)) => Some(Credentials { email, password }),
        (Some(_), None) => return Err(ConfigError::Missing("SIGN_IN_PASSWORD")),
        (None, Some(_)) => return Err(ConfigError::Missing("SIGN_IN_EMAIL")),
        (None, None) => None,
    };

    let category = match load_optional(&lookup, "FILTER_CATEGORY") {
        Some(value) => CategoryFilter::from_str(&value).map_err(|_| ConfigError::Invalid {
            name: "FILTER_CATEGORY",
            expected: "'all' or one of rock, jazz, indie, pop, electronic, country",
        })?,
        None => CategoryFilter::All,
    };

    Ok(Config {
        supabase,
        catalog,
        demo_config: DemoConfig {
            sign_in,
            query: load_optional(&lookup, "FILTER_QUERY").unwrap_or_default(),
            category,
            mine_only: load_bool_config(&lookup, "FILTER_MINE_ONLY", false)?,
        },
    })
}

fn load_optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|value| !value.trim().is_empty())
}

fn load_required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    load_optional(lookup, name).ok_or(ConfigError::Missing(name))
}

fn load_bool_config<F>(lookup: &F, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match load_optional(lookup, name) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected: "either 'true' or 'false'",
        }),
        None => Ok(default),
    }
}

fn load_number_config<F, N>(lookup: &F, name: &'static str, default: N) -> Result<N, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    N: FromStr,
{
    match load_optional(lookup, name) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected: "a non-negative integer number",
        }),
        None => Ok(default),
    }
}
