use crate::output::{detail_table, Output};
use cinetrack_config::{Config, CredentialStore, PathManager, Secrets};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use owo_colors::OwoColorize;
use serde_json::json;

pub fn run_config_show(paths: &PathManager, config: &Config, full: bool, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    let mut credentials = CredentialStore::new(paths.credentials_file());
    credentials
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;
    let secrets = Secrets::from_env(&credentials);

    let show = |value: &Option<String>| match value {
        Some(v) if full => v.clone(),
        Some(v) => mask_string(v),
        None => "<not set>".to_string(),
    };
    let secret_rows = [
        ("TMDB API key", show(&secrets.tmdb_api_key)),
        ("Store anon key", show(&secrets.store_anon_key)),
        ("Store service key", show(&secrets.store_service_key)),
        ("Session secret", show(&secrets.session_secret)),
        (
            "Session",
            if credentials.get_session_token().is_some() { "stored" } else { "none" }.to_string(),
        ),
    ];

    let payload = json!({
        "config_file": config_file.display().to_string(),
        "credentials_file": paths.credentials_file().display().to_string(),
        "config": config,
        "secrets": secret_rows.iter().map(|(k, v)| json!({ "name": k, "value": v })).collect::<Vec<_>>(),
    });

    output.data(&payload, |_| {
        if !config_file.exists() {
            println!("{}", format!("No config file at {}, showing defaults", config_file.display()).bright_black());
        }
        let settings = [
            ("Config file", config_file.display().to_string()),
            ("Metadata API", config.content.base_url.clone()),
            ("Image CDN", config.content.image_base_url.clone()),
            ("Language", config.content.language.clone().unwrap_or_else(|| "-".to_string())),
            ("Store URL", config.store.url.clone().unwrap_or_else(|| "<not set>".to_string())),
            ("Cache TTL", format!("{}s", config.cache.ttl_secs)),
            ("HTTP timeout", format!("{}s", config.http.timeout_secs)),
            ("Log level", config.logging.level.clone()),
        ];
        println!("{}", detail_table("Configuration", &settings));
        println!("{}", detail_table("Secrets", &secret_rows));
    });
    Ok(())
}

fn mask_string(s: &str) -> String {
    if s.is_empty() {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_string() {
        assert_eq!(mask_string(""), "<not set>");
        assert_eq!(mask_string("abcd"), "****");
        assert_eq!(mask_string("eyJhbGciOiJIUzI1NiJ9"), "ey***J9");
    }
}
