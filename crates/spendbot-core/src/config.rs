use std::{env, fs, path::Path, path::PathBuf, time::Duration};

use crate::{errors::Error, Result};

pub const DEFAULT_EXTRACTION_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_EXTRACTION_MODEL: &str = "llama3-70b-8192";
pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";

/// Typed configuration for the bot.
///
/// Secrets (bot token, extraction API key) are only ever read from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    // Transport
    pub telegram_bot_token: String,
    /// Empty means every user may talk to the bot.
    pub telegram_allowed_users: Vec<i64>,

    // Store
    pub database_path: PathBuf,

    // Extraction service
    pub extraction_api_key: String,
    pub extraction_base_url: String,
    pub extraction_model: String,
    pub extraction_timeout: Duration,

    // Presentation
    pub currency_symbol: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the process environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").ok_or_else(|| {
            Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
        })?;
        let telegram_allowed_users = parse_csv_i64(get("TELEGRAM_ALLOWED_USERS"));

        let database_path =
            PathBuf::from(get("DATABASE_PATH").unwrap_or_else(|| "spendbot.db".to_string()));

        let extraction_api_key = get("EXTRACTION_API_KEY")
            .or_else(|| get("GROQ_API_KEY"))
            .ok_or_else(|| {
                Error::Config(
                    "EXTRACTION_API_KEY (or GROQ_API_KEY) environment variable is required"
                        .to_string(),
                )
            })?;
        let extraction_base_url = get("EXTRACTION_BASE_URL")
            .unwrap_or_else(|| DEFAULT_EXTRACTION_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let extraction_model =
            get("EXTRACTION_MODEL").unwrap_or_else(|| DEFAULT_EXTRACTION_MODEL.to_string());
        let extraction_timeout = Duration::from_millis(
            get("EXTRACTION_TIMEOUT_MS")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(10_000),
        );

        let currency_symbol =
            get("CURRENCY_SYMBOL").unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOL.to_string());

        Ok(Self {
            telegram_bot_token,
            telegram_allowed_users,
            database_path,
            extraction_api_key,
            extraction_base_url,
            extraction_model,
            extraction_timeout,
            currency_symbol,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_keys_are_missing() {
        let cfg = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "tok"),
            ("GROQ_API_KEY", "gsk"),
        ]))
        .unwrap();

        assert_eq!(cfg.extraction_api_key, "gsk");
        assert_eq!(cfg.extraction_base_url, DEFAULT_EXTRACTION_BASE_URL);
        assert_eq!(cfg.extraction_model, DEFAULT_EXTRACTION_MODEL);
        assert_eq!(cfg.extraction_timeout, Duration::from_secs(10));
        assert_eq!(cfg.currency_symbol, "₹");
        assert_eq!(cfg.database_path, PathBuf::from("spendbot.db"));
        assert!(cfg.telegram_allowed_users.is_empty());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let cfg = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "tok"),
            ("EXTRACTION_API_KEY", "primary"),
            ("GROQ_API_KEY", "fallback"),
            ("EXTRACTION_BASE_URL", "http://localhost:8080/v1/"),
            ("EXTRACTION_TIMEOUT_MS", "2500"),
            ("TELEGRAM_ALLOWED_USERS", "1, 2,,x,3"),
            ("CURRENCY_SYMBOL", "$"),
        ]))
        .unwrap();

        assert_eq!(cfg.extraction_api_key, "primary");
        assert_eq!(cfg.extraction_base_url, "http://localhost:8080/v1");
        assert_eq!(cfg.extraction_timeout, Duration::from_millis(2500));
        assert_eq!(cfg.telegram_allowed_users, vec![1, 2, 3]);
        assert_eq!(cfg.currency_symbol, "$");
    }

    #[test]
    fn missing_secrets_are_config_errors() {
        let err = Config::from_lookup(lookup(&[("GROQ_API_KEY", "gsk")])).unwrap_err();
        assert!(matches!(err, Error::Config(m) if m.contains("TELEGRAM_BOT_TOKEN")));

        let err = Config::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "tok")])).unwrap_err();
        assert!(matches!(err, Error::Config(m) if m.contains("EXTRACTION_API_KEY")));
    }

    #[test]
    fn dotenv_parsing_skips_comments_and_strips_quotes() {
        let parsed = parse_dotenv("# comment\n\nA=1\nB = \"two\"\nC='3'\nnot a pair\n=x\n");
        assert_eq!(
            parsed,
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "two".to_string()),
                ("C".to_string(), "3".to_string()),
            ]
        );
    }
}
