use std::env;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_APP_ORIGIN: &str = "http://localhost:5173";

// Scaffold keys shipped in .env templates must not count as configured.
const GEMINI_PLACEHOLDER: &str = "your-gemini-api-key";

/// Process-wide configuration, loaded once at startup and passed explicitly
/// to the components that need it. Read-only after initialization.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub jwt_secret: String,
    pub app_origin: String,
    pub gemini_api_key: Option<String>,
    pub unsplash_access_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let mongodb_uri = env::var("MONGODB_URI").expect("MONGODB_URI must be set");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");
        let app_origin = env::var("APP_ORIGIN").unwrap_or_else(|_| DEFAULT_APP_ORIGIN.to_string());

        Self {
            host,
            port,
            mongodb_uri,
            jwt_secret,
            app_origin,
            gemini_api_key: configured_key(env::var("GEMINI_API_KEY").ok(), GEMINI_PLACEHOLDER),
            unsplash_access_key: configured_key(env::var("UNSPLASH_ACCESS_KEY").ok(), ""),
        }
    }
}

fn configured_key(value: Option<String>, placeholder: &str) -> Option<String> {
    match value {
        Some(key) if !key.is_empty() && key != placeholder => Some(key),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_key_is_not_configured() {
        assert_eq!(
            configured_key(Some(GEMINI_PLACEHOLDER.to_string()), GEMINI_PLACEHOLDER),
            None
        );
    }

    #[test]
    fn empty_and_missing_keys_are_not_configured() {
        assert_eq!(configured_key(Some(String::new()), ""), None);
        assert_eq!(configured_key(None, ""), None);
    }

    #[test]
    fn real_key_is_configured() {
        assert_eq!(
            configured_key(Some("abc123".to_string()), GEMINI_PLACEHOLDER),
            Some("abc123".to_string())
        );
    }
}
