//! API endpoint configuration shared by the remote pipeline store and the
//! remote dataset backend.

const BASE_URL_ENV: &str = "ARTINTEL_API_URL";
const TOKEN_ENV: &str = "ARTINTEL_API_TOKEN";
const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let token = std::env::var(TOKEN_ENV)
            .ok()
            .filter(|token| !token.trim().is_empty());

        Self { base_url, token }
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Extracts a human-readable message from a JSON error body, falling back to
/// the provided default when the body has no `message` field or is not JSON.
pub fn error_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(|message| message.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_paths() {
        let config = ApiConfig::new("http://localhost:8000/api/v1/");
        assert_eq!(
            config.endpoint("/datasets/1"),
            "http://localhost:8000/api/v1/datasets/1"
        );
        assert_eq!(
            config.endpoint("pipelines"),
            "http://localhost:8000/api/v1/pipelines"
        );
    }

    #[test]
    fn error_message_prefers_json_body() {
        assert_eq!(
            error_message(r#"{"message":"quota exceeded"}"#, "Failed"),
            "quota exceeded"
        );
        assert_eq!(error_message("not json", "Failed"), "Failed");
        assert_eq!(error_message(r#"{"code":500}"#, "Failed"), "Failed");
    }
}
