// src/config.rs
//! Process configuration, read once at startup and passed down by reference.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::artifact::DEFAULT_ARTIFACT_PATH;
use crate::error::{RelayError, Result};
use crate::ledger::DEFAULT_LEDGER_PATH;
use crate::orchestrator::DEFAULT_MAX_KEYWORDS;

pub const DEFAULT_AFFILIATE_ENDPOINT: &str = "https://open-api.affiliate.shopee.com.br/graphql";
pub const DEFAULT_PUBLIC_SEARCH_ENDPOINT: &str = "https://shopee.com.br/api/v4/search/search_items";
pub const DEFAULT_KEYWORDS: &str = "brinquedos;moda feminina;casa;eletronicos";

static KEYWORD_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[;,]").expect("static regex"));

#[derive(Clone)]
pub struct RelayConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub alert_chat_id: Option<String>,
    pub app_id: String,
    pub app_secret: String,
    pub affiliate_endpoint: String,
    pub public_search_endpoint: String,
    pub keywords: Vec<String>,
    pub match_id: Option<i64>,
    pub max_keywords: usize,
    pub page_limit: u32,
    pub ledger_path: PathBuf,
    pub artifact_path: PathBuf,
    pub delivery_spacing: Duration,
    pub fetch_spacing: Duration,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup; blank values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| {
            lookup(k)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |k: &'static str| get(k).ok_or(RelayError::ConfigMissing(k));

        let bot_token = required("TELEGRAM_BOT_TOKEN")?;
        let chat_id = required("TELEGRAM_CHAT_ID")?;
        let app_id = required("SHOPEE_APP_ID")?;
        let app_secret = required("SHOPEE_APP_SECRET")?;

        let keywords = match get("SHOPEE_KEYWORDS_PATH") {
            Some(p) => load_keywords_from(Path::new(&p))?,
            None => split_keywords(
                &get("SHOPEE_KEYWORDS").unwrap_or_else(|| DEFAULT_KEYWORDS.to_string()),
            ),
        };

        Ok(Self {
            bot_token,
            chat_id,
            alert_chat_id: get("TELEGRAM_ALERT_CHAT_ID"),
            app_id,
            app_secret,
            affiliate_endpoint: get("SHOPEE_AFFILIATE_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_AFFILIATE_ENDPOINT.to_string()),
            public_search_endpoint: get("SHOPEE_PUBLIC_SEARCH_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_PUBLIC_SEARCH_ENDPOINT.to_string()),
            keywords,
            match_id: parse_opt("SHOPEE_MATCH_ID", get("SHOPEE_MATCH_ID"))?,
            max_keywords: parse_opt("SHOPEE_MAX_KEYWORDS", get("SHOPEE_MAX_KEYWORDS"))?
                .unwrap_or(DEFAULT_MAX_KEYWORDS),
            page_limit: parse_opt("SHOPEE_PAGE_LIMIT", get("SHOPEE_PAGE_LIMIT"))?.unwrap_or(20),
            ledger_path: get("SENT_STORE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_PATH)),
            artifact_path: get("RUN_ARTIFACT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_PATH)),
            delivery_spacing: Duration::from_millis(
                parse_opt("DELIVERY_SPACING_MS", get("DELIVERY_SPACING_MS"))?.unwrap_or(1500),
            ),
            fetch_spacing: Duration::from_millis(
                parse_opt("FETCH_SPACING_MS", get("FETCH_SPACING_MS"))?.unwrap_or(800),
            ),
        })
    }

    /// Where operational alerts go.
    pub fn alert_destination(&self) -> &str {
        self.alert_chat_id.as_deref().unwrap_or(&self.chat_id)
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("alert_chat_id", &self.alert_chat_id)
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .field("affiliate_endpoint", &self.affiliate_endpoint)
            .field("public_search_endpoint", &self.public_search_endpoint)
            .field("keywords", &self.keywords)
            .field("match_id", &self.match_id)
            .field("max_keywords", &self.max_keywords)
            .field("page_limit", &self.page_limit)
            .field("ledger_path", &self.ledger_path)
            .field("artifact_path", &self.artifact_path)
            .finish_non_exhaustive()
    }
}

fn parse_opt<T>(key: &'static str, raw: Option<String>) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    raw.map(|v| {
        v.parse::<T>().map_err(|e| RelayError::ConfigInvalid {
            key,
            reason: format!("{v:?}: {e}"),
        })
    })
    .transpose()
}

/// "a; b,c" -> ["a", "b", "c"], order kept, blanks and repeats dropped.
pub fn split_keywords(raw: &str) -> Vec<String> {
    clean_list(KEYWORD_SPLIT.split(raw).map(str::to_string))
}

/// Keyword file: TOML `keywords = [..]` or a JSON array of strings.
pub fn load_keywords_from(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| RelayError::ConfigInvalid {
        key: "SHOPEE_KEYWORDS_PATH",
        reason: format!("reading {}: {e}", path.display()),
    })?;
    let is_toml = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    parse_keywords(&content, is_toml).ok_or_else(|| RelayError::ConfigInvalid {
        key: "SHOPEE_KEYWORDS_PATH",
        reason: format!("{} is neither a TOML keyword table nor a JSON array", path.display()),
    })
}

fn parse_keywords(s: &str, toml_first: bool) -> Option<Vec<String>> {
    #[derive(serde::Deserialize)]
    struct TomlKeywords {
        keywords: Vec<String>,
    }
    let from_toml = || toml::from_str::<TomlKeywords>(s).ok().map(|t| t.keywords);
    let from_json = || serde_json::from_str::<Vec<String>>(s).ok();

    let list = if toml_first {
        from_toml().or_else(from_json)
    } else {
        from_json().or_else(from_toml)
    }?;
    Some(clean_list(list))
}

fn clean_list<I: IntoIterator<Item = String>>(items: I) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for it in items {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|k| k == t) {
            out.push(t.to_string());
        }
    }
    out
}
