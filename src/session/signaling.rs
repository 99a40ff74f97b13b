//! Daily signaling REST client
//!
//! The live-session regime needs one room and two credentials per session:
//! an owner token for the human participant and a restricted token for the
//! bot. Only the REST contract lives here; the media plane is the signaling
//! service's problem.

use serde::{Deserialize, Serialize};

use crate::config::SignalingConfig;
use crate::{Error, Result};

#[derive(Serialize)]
struct CreateRoomRequest {
    properties: RoomProperties,
}

#[derive(Serialize)]
struct RoomProperties {
    exp: u64,
    enable_chat: bool,
    enable_screenshare: bool,
}

#[derive(Deserialize)]
struct RoomResponse {
    url: String,
    name: String,
}

#[derive(Serialize)]
struct CreateTokenRequest<'a> {
    properties: TokenProperties<'a>,
}

#[derive(Serialize)]
struct TokenProperties<'a> {
    room_name: &'a str,
    is_owner: bool,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

/// A room created for one live session
#[derive(Debug, Clone)]
pub struct Room {
    /// Join URL handed to clients
    pub url: String,
    /// Room name used when minting tokens
    pub name: String,
}

/// REST client for the Daily signaling service
#[derive(Debug)]
pub struct SignalingClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    room_expiry: std::time::Duration,
}

impl SignalingClient {
    /// Create a signaling client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot
    /// be constructed. A missing key is fatal for the live-session regime
    /// only; the synchronous endpoints run without one.
    pub fn new(
        api_key: String,
        config: &SignalingConfig,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("DAILY_API_KEY not set".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            room_expiry: config.room_expiry,
        })
    }

    /// Create a room with the configured expiry
    ///
    /// # Errors
    ///
    /// Returns error if the signaling service is unreachable or rejects
    /// the request.
    pub async fn create_room(&self) -> Result<Room> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| Error::Session(format!("system clock before epoch: {e}")))?;
        let request = CreateRoomRequest {
            properties: RoomProperties {
                exp: (now + self.room_expiry).as_secs(),
                enable_chat: true,
                enable_screenshare: false,
            },
        };

        let response = self
            .client
            .post(format!("{}/rooms", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Session(format!("failed to reach signaling service: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Session(format!(
                "failed to create room: HTTP {status}: {body}"
            )));
        }

        let room: RoomResponse = response
            .json()
            .await
            .map_err(|e| Error::Session(format!("unparseable room response: {e}")))?;

        tracing::info!(room = %room.name, "created signaling room");
        Ok(Room {
            url: room.url,
            name: room.name,
        })
    }

    /// Mint a meeting token for `room`
    ///
    /// Owner tokens go to the human participant; the bot joins restricted.
    ///
    /// # Errors
    ///
    /// Returns error if the signaling service is unreachable or rejects
    /// the request.
    pub async fn create_token(&self, room_name: &str, owner: bool) -> Result<String> {
        let request = CreateTokenRequest {
            properties: TokenProperties {
                room_name,
                is_owner: owner,
            },
        };

        let response = self
            .client
            .post(format!("{}/meeting-tokens", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Session(format!("failed to reach signaling service: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Session(format!(
                "failed to create token: HTTP {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Session(format!("unparseable token response: {e}")))?;

        Ok(token.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SignalingConfig {
        SignalingConfig {
            base_url: "https://api.daily.co/v1/".to_string(),
            room_expiry: std::time::Duration::from_secs(300),
        }
    }

    #[test]
    fn missing_api_key_is_config_error() {
        let err = SignalingClient::new(
            String::new(),
            &test_config(),
            std::time::Duration::from_secs(30),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = SignalingClient::new(
            "key".to_string(),
            &test_config(),
            std::time::Duration::from_secs(30),
        )
        .unwrap();
        assert_eq!(client.base_url, "https://api.daily.co/v1");
    }
}
