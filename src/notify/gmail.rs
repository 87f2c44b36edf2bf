//! Gmail API delivery through a Google service account with domain-wide
//! delegation.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::EmailConfig;
use crate::error::NotificationError;
use crate::notify::{MailTransport, OutgoingMessage};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SEND_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";
const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
struct ServiceAccountClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct SendResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Sends mail as the impersonated user via `users.messages.send`.
pub struct GmailTransport {
    client: Client,
    client_email: String,
    private_key: SecretString,
    impersonated_user: String,
}

impl GmailTransport {
    pub fn new(config: &EmailConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            client_email: config.client_email.clone(),
            private_key: config.private_key.clone(),
            impersonated_user: config.impersonated_user.clone(),
        }
    }

    /// Sign the RS256 assertion exchanged for an access token.
    fn signed_assertion(&self) -> Result<String, NotificationError> {
        if self.private_key.expose_secret().trim().is_empty() {
            return Err(NotificationError::MissingCredential(
                "GOOGLE_PRIVATE_KEY".to_string(),
            ));
        }

        let iat = Utc::now().timestamp();
        let claims = ServiceAccountClaims {
            iss: &self.client_email,
            sub: &self.impersonated_user,
            scope: GMAIL_SEND_SCOPE,
            aud: TOKEN_URL,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.private_key.expose_secret().as_bytes())?;
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &key,
        )?)
    }

    async fn access_token(&self) -> Result<SecretString, NotificationError> {
        let assertion = self.signed_assertion()?;

        let resp = self
            .client
            .post(TOKEN_URL)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected {
                stage: "token exchange",
                status,
                body,
            });
        }

        let token: TokenResponse = resp.json().await?;
        Ok(SecretString::from(token.access_token))
    }
}

#[async_trait]
impl MailTransport for GmailTransport {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), NotificationError> {
        let token = self.access_token().await?;
        let raw = encode_raw_message(message);

        let resp = self
            .client
            .post(SEND_URL)
            .bearer_auth(token.expose_secret())
            .json(&serde_json::json!({ "raw": raw }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected {
                stage: "gmail send",
                status,
                body,
            });
        }

        let sent: SendResponse = resp.json().await?;
        tracing::debug!(message_id = ?sent.id, "Gmail accepted message");
        Ok(())
    }
}

/// RFC 822 message, base64url-encoded without padding as the Gmail API
/// expects in the `raw` field.
pub fn encode_raw_message(message: &OutgoingMessage) -> String {
    URL_SAFE_NO_PAD.encode(message.to_rfc822())
}
