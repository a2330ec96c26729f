// tests/config_env.rs
use offer_relay::{RelayConfig, RelayError};
use std::{env, fs};

const KEYS: [&str; 6] = [
    "TELEGRAM_BOT_TOKEN",
    "TELEGRAM_CHAT_ID",
    "SHOPEE_APP_ID",
    "SHOPEE_APP_SECRET",
    "SHOPEE_KEYWORDS",
    "SHOPEE_KEYWORDS_PATH",
];

fn clear() {
    for k in KEYS {
        env::remove_var(k);
    }
}

#[serial_test::serial]
#[test]
fn from_env_requires_credentials() {
    clear();
    env::set_var("TELEGRAM_BOT_TOKEN", "123:ABC");
    let err = RelayConfig::from_env().unwrap_err();
    assert!(matches!(err, RelayError::ConfigMissing("TELEGRAM_CHAT_ID")));
    clear();
}

#[serial_test::serial]
#[test]
fn keyword_file_takes_precedence_over_inline_list() {
    clear();
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("keywords.toml");
    fs::write(&p, r#"keywords = ["fones", "smartwatch"]"#).unwrap();

    env::set_var("TELEGRAM_BOT_TOKEN", "123:ABC");
    env::set_var("TELEGRAM_CHAT_ID", "-100");
    env::set_var("SHOPEE_APP_ID", "1830");
    env::set_var("SHOPEE_APP_SECRET", "s3cr3t");
    env::set_var("SHOPEE_KEYWORDS", "casa;moda");

    let inline = RelayConfig::from_env().unwrap();
    assert_eq!(inline.keywords, vec!["casa", "moda"]);

    env::set_var("SHOPEE_KEYWORDS_PATH", p.display().to_string());
    let from_file = RelayConfig::from_env().unwrap();
    assert_eq!(from_file.keywords, vec!["fones", "smartwatch"]);

    clear();
}
