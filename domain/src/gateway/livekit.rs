//! LiveKit room management.
//!
//! Only room teardown is needed here: once a session completes its room is deleted
//! through LiveKit's Twirp `RoomService`, authorised by a short-lived room-admin token.

use crate::error::{DomainErrorKind, Error, ExternalErrorKind};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use log::*;
use serde::Serialize;
use service::config::Config;
use std::sync::Arc;

const DELETE_ROOM_PATH: &str = "/twirp/livekit.RoomService/DeleteRoom";
const TOKEN_TTL_MINUTES: i64 = 10;

/// Closes meeting rooms. Implemented by [`LiveKitClient`] and mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MeetingService: Send + Sync {
    async fn end_meeting(&self, room_name: &str) -> Result<(), Error>;
}

#[derive(Debug, Serialize)]
struct RoomAdminClaims {
    iss: String,
    nbf: usize,
    exp: usize,
    video: VideoGrant,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoGrant {
    room_admin: bool,
    room: String,
}

#[derive(Debug, Serialize)]
struct DeleteRoomRequest<'a> {
    room: &'a str,
}

pub struct LiveKitClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl LiveKitClient {
    /// `url` may be given in its websocket form (`wss://...`), the API is reached over HTTP(S).
    pub fn new(url: &str, api_key: &str, api_secret: &str) -> Result<Self, Error> {
        let client = reqwest::Client::builder().use_rustls_tls().build()?;

        Ok(Self {
            client,
            base_url: http_base_url(url),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let url = config
            .livekit_url()
            .ok_or_else(|| Error::config("LIVEKIT_URL"))?;
        let api_key = config
            .livekit_api_key()
            .ok_or_else(|| Error::config("LIVEKIT_API_KEY"))?;
        let api_secret = config
            .livekit_api_secret()
            .ok_or_else(|| Error::config("LIVEKIT_API_SECRET"))?;

        Self::new(&url, &api_key, &api_secret)
    }

    fn room_admin_token(&self, room_name: &str) -> Result<String, Error> {
        let now = Utc::now();
        let claims = RoomAdminClaims {
            iss: self.api_key.clone(),
            nbf: now.timestamp() as usize,
            exp: (now + Duration::minutes(TOKEN_TTL_MINUTES)).timestamp() as usize,
            video: VideoGrant {
                room_admin: true,
                room: room_name.to_string(),
            },
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.api_secret.as_bytes()),
        )?)
    }
}

#[async_trait]
impl MeetingService for LiveKitClient {
    async fn end_meeting(&self, room_name: &str) -> Result<(), Error> {
        let url = format!("{}{}", self.base_url, DELETE_ROOM_PATH);
        let token = self.room_admin_token(room_name)?;

        debug!("Deleting LiveKit room {room_name}");

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&DeleteRoomRequest { room: room_name })
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to reach LiveKit while deleting room {room_name}: {e:?}");
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
                }
            })?;

        let status = response.status();
        if status.is_success() {
            info!("LiveKit room {room_name} deleted");
            Ok(())
        } else if status == reqwest::StatusCode::NOT_FOUND {
            debug!("LiveKit room {room_name} was already gone");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!("LiveKit refused to delete room {room_name}: {status} {body}");
            Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::Other(format!(
                    "LiveKit responded with {status}"
                ))),
            })
        }
    }
}

/// Used when LiveKit is not configured. Rooms are left to expire on the server.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMeetingService;

#[async_trait]
impl MeetingService for NoopMeetingService {
    async fn end_meeting(&self, room_name: &str) -> Result<(), Error> {
        debug!("LiveKit is not configured, leaving room {room_name} open");
        Ok(())
    }
}

/// The LiveKit client, or [`NoopMeetingService`] when no LiveKit URL is configured.
/// A URL without its API credentials is still an error.
pub fn meeting_service_from_config(config: &Config) -> Result<Arc<dyn MeetingService>, Error> {
    if config.livekit_url().is_none() {
        warn!("LIVEKIT_URL is not set, meeting rooms will not be closed");
        return Ok(Arc::new(NoopMeetingService));
    }

    Ok(Arc::new(LiveKitClient::from_config(config)?))
}

fn http_base_url(url: &str) -> String {
    let url = url.trim_end_matches('/');
    if let Some(rest) = url.strip_prefix("wss://") {
        format!("https://{rest}")
    } else if let Some(rest) = url.strip_prefix("ws://") {
        format!("http://{rest}")
    } else {
        url.to_string()
    }
}
