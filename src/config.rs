use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::core::{ConflictRule, DEFAULT_INSTITUTION_DOMAIN};
use crate::models::Resource;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub supabase: SupabaseSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Catalog entries added after the standard ones
    #[serde(default)]
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseSettings {
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_profiles_table")]
    pub profiles_table: String,
    #[serde(default = "default_sessions_table")]
    pub sessions_table: String,
}

fn default_timeout_secs() -> u64 { 30 }
fn default_profiles_table() -> String { "profiles".to_string() }
fn default_sessions_table() -> String { "sessions".to_string() }

/// Direct database access; sessions stay on the REST API when `url` is unset
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    pub redis_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    #[serde(default = "default_audience")]
    pub audience: String,
}

fn default_audience() -> String { "authenticated".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_institution_domain")]
    pub institution_domain: String,
    #[serde(default)]
    pub conflict_rule: ConflictRule,
    #[serde(default = "default_limit")]
    pub default_limit: u16,
    #[serde(default = "default_max_limit")]
    pub max_limit: u16,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            institution_domain: default_institution_domain(),
            conflict_rule: ConflictRule::default(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

fn default_institution_domain() -> String { DEFAULT_INSTITUTION_DOMAIN.to_string() }
fn default_limit() -> u16 { 20 }
fn default_max_limit() -> u16 { 100 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

/// Output layout of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl LogFormat {
    /// Unknown names fall back to JSON lines
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "compact" | "text" => LogFormat::Compact,
            _ => LogFormat::Json,
        }
    }
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with CASEPAIR__)
    /// 5. Well-known secrets (SUPABASE_URL, SUPABASE_SERVICE_KEY, ...)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., CASEPAIR__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("CASEPAIR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        substitute_env_vars(settings, |name| std::env::var(name).ok())?.try_deserialize()
    }
}

/// Secrets read from plain environment variables, and the key each one sets
const SECRET_OVERRIDES: [(&str, &str); 4] = [
    ("SUPABASE_URL", "supabase.url"),
    ("SUPABASE_SERVICE_KEY", "supabase.api_key"),
    ("SUPABASE_JWT_SECRET", "auth.jwt_secret"),
    ("DATABASE_URL", "database.url"),
];

/// Override config keys from well-known environment variables
///
/// `lookup` resolves a variable name; unset variables leave the key as is.
fn substitute_env_vars<F>(settings: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder().add_source(settings);

    for (var, key) in SECRET_OVERRIDES {
        if let Some(value) = lookup(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceCategory;
    use config::FileFormat;

    const MINIMAL: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 8080

        [supabase]
        url = "${SUPABASE_URL}"
        api_key = "${SUPABASE_SERVICE_KEY}"

        [auth]
        jwt_secret = "${SUPABASE_JWT_SECRET}"
    "#;

    fn from_str(toml: &str) -> Config {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
    }

    #[test]
    fn test_default_matching() {
        let matching = MatchingSettings::default();
        assert_eq!(matching.institution_domain, "hec.edu");
        assert_eq!(matching.conflict_rule, ConflictRule::EitherParticipant);
        assert_eq!(matching.default_limit, 20);
        assert_eq!(matching.max_limit, 100);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
        assert_eq!(LogFormat::parse(&logging.format), LogFormat::Json);
    }

    #[test]
    fn test_log_format_names() {
        assert_eq!(LogFormat::parse("Pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("compact"), LogFormat::Compact);
        assert_eq!(LogFormat::parse("text"), LogFormat::Compact);
        assert_eq!(LogFormat::parse("bogus"), LogFormat::Json);
    }

    #[test]
    fn test_secrets_substituted() {
        let config = substitute_env_vars(from_str(MINIMAL), |name| match name {
            "SUPABASE_URL" => Some("https://project.supabase.test".to_string()),
            "SUPABASE_SERVICE_KEY" => Some("service".to_string()),
            "SUPABASE_JWT_SECRET" => Some("jwt".to_string()),
            _ => None,
        })
        .unwrap();

        let settings: Settings = config.try_deserialize().unwrap();
        assert_eq!(settings.supabase.url, "https://project.supabase.test");
        assert_eq!(settings.supabase.api_key, "service");
        assert_eq!(settings.supabase.timeout_secs, 30);
        assert_eq!(settings.auth.jwt_secret, "jwt");
        assert_eq!(settings.auth.audience, "authenticated");
        assert!(settings.database.url.is_none());
        assert!(settings.cache.redis_url.is_none());
        assert!(settings.resources.is_empty());
    }

    #[test]
    fn test_extra_resources_from_file() {
        let toml = format!(
            "{}\n[[resources]]\nid = \"alumni\"\ntitle = \"Alumni Network\"\ndescription = \"Mentors from past cohorts\"\ncategory = \"special\"\nicon = \"Users\"\nurl = \"#\"\n",
            MINIMAL
        );
        let settings: Settings = substitute_env_vars(from_str(&toml), |_| None)
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.resources.len(), 1);
        assert_eq!(settings.resources[0].category, ResourceCategory::Special);
        assert!(!settings.resources[0].featured);
    }

    #[test]
    fn test_conflict_rule_from_file() {
        let toml = format!("{}\n[matching]\nconflict_rule = \"both_slots\"\n", MINIMAL);
        let settings: Settings = substitute_env_vars(from_str(&toml), |_| None)
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.matching.conflict_rule, ConflictRule::BothSlots);
        assert_eq!(settings.matching.institution_domain, "hec.edu");
    }
}
