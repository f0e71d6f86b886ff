//! Dostana API client (profile lookups)

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};

use crate::models::{FetchState, Profile};

/// Remote profile lookups
#[allow(async_fn_in_trait)]
pub trait ProfileApi {
    /// Fetch a user's profile
    async fn fetch_profile(&self, user_id: &str) -> Result<Profile>;

    /// Fetch a profile as a display tri-state
    async fn load_profile(&self, user_id: &str) -> FetchState<Profile> {
        self.fetch_profile(user_id).await.into()
    }
}

/// HTTP client for the Dostana API
pub struct ProfileClient {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

impl ProfileClient {
    /// Create a new client
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: None,
        }
    }

    /// Authenticate requests with a bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Build API URL
    fn api_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn profile_request(&self, user_id: &str) -> RequestBuilder {
        let url = self.api_url(&format!("/users/{user_id}"));

        let request = self.client.get(url);
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl ProfileApi for ProfileClient {
    async fn fetch_profile(&self, user_id: &str) -> Result<Profile> {
        let response = self
            .profile_request(user_id)
            .send()
            .await
            .context("Failed to fetch profile")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Dostana API error {status}: {body}");
        }

        response
            .json()
            .await
            .context("Failed to parse profile response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticProfiles;

    impl ProfileApi for StaticProfiles {
        async fn fetch_profile(&self, user_id: &str) -> Result<Profile> {
            if user_id == "missing" {
                anyhow::bail!("Dostana API error 404 Not Found: no such user");
            }
            Ok(Profile {
                id: user_id.to_string(),
                name: "Meera".to_string(),
                username: "meera".to_string(),
                profile_image: None,
                bio: None,
            })
        }
    }

    #[test]
    fn test_api_url_strips_trailing_slash() {
        let client = ProfileClient::new("https://api.dostana.app/");
        assert_eq!(client.api_url("/users/1"), "https://api.dostana.app/users/1");
    }

    #[test]
    fn test_token_sent_as_bearer() {
        let request = ProfileClient::new("https://api.dostana.app")
            .with_token("s3cret")
            .profile_request("u1")
            .build()
            .unwrap();
        assert_eq!(request.url().as_str(), "https://api.dostana.app/users/u1");
        assert_eq!(request.headers()["authorization"], "Bearer s3cret");

        let anonymous = ProfileClient::new("https://api.dostana.app")
            .profile_request("u1")
            .build()
            .unwrap();
        assert!(anonymous.headers().get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_load_profile_tri_state() {
        let api = StaticProfiles;
        let ok = api.load_profile("u1").await;
        assert_eq!(ok.data().map(|p| p.name.as_str()), Some("Meera"));

        let err = api.load_profile("missing").await;
        assert!(matches!(err, FetchState::Error(msg) if msg.contains("404")));
    }
}
