// LinkedIn REST API v2 client for UGC posts and image uploads
// Docs: https://learn.microsoft.com/en-us/linkedin/consumer/integrations/self-serve/share-on-linkedin

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

const UPLOAD_MECHANISM_KEY: &str = "com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest";

#[derive(Error, Debug)]
pub enum LinkedInError {
    #[error("{step} failed: {status} - {body}")]
    Http {
        step: &'static str,
        status: u16,
        body: String,
    },
    #[error("request error during {step}: {source}")]
    Request {
        step: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected response during {step}: {message}")]
    InvalidResponse { step: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct LinkedInClient {
    client: Client,
    access_token: String,
    base_url: String,
    timeout: Duration,
}

/// Where to PUT the media bytes and the asset URN to reference afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRegistration {
    pub upload_url: String,
    pub asset: String,
}

// ============================================================================
// Register Upload Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct RegisterUploadResponse {
    value: RegisterUploadValue,
}

#[derive(Debug, Deserialize)]
struct RegisterUploadValue {
    asset: String,
    #[serde(rename = "uploadMechanism")]
    upload_mechanism: UploadMechanism,
}

#[derive(Debug, Deserialize)]
struct UploadMechanism {
    #[serde(rename = "com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest")]
    http_request: UploadHttpRequest,
}

#[derive(Debug, Deserialize)]
struct UploadHttpRequest {
    #[serde(rename = "uploadUrl")]
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct CreatePostResponse {
    id: Option<String>,
}

/// Builds `urn:li:person:{id}`, leaving an already-qualified URN untouched.
pub fn person_urn(user_id: &str) -> String {
    if user_id.starts_with("urn:li:person:") {
        user_id.to_string()
    } else {
        format!("urn:li:person:{}", user_id)
    }
}

impl LinkedInClient {
    pub fn new(access_token: String) -> Self {
        Self {
            client: Client::new(),
            access_token,
            base_url: "https://api.linkedin.com/v2".to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Publishes a public post. With `image_asset`, the post carries that
    /// uploaded image; otherwise it is text-only. Returns the post id.
    pub async fn create_post(
        &self,
        author_urn: &str,
        text: &str,
        image_asset: Option<&str>,
    ) -> Result<String, LinkedInError> {
        const STEP: &str = "create post";

        let share_content = match image_asset {
            Some(asset) => json!({
                "shareCommentary": { "text": text },
                "shareMediaCategory": "IMAGE",
                "media": [
                    { "status": "READY", "media": asset }
                ]
            }),
            None => json!({
                "shareCommentary": { "text": text },
                "shareMediaCategory": "NONE"
            }),
        };

        let payload = json!({
            "author": author_urn,
            "lifecycleState": "PUBLISHED",
            "specificContent": {
                "com.linkedin.ugc.ShareContent": share_content
            },
            "visibility": {
                "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC"
            }
        });

        let response = self
            .client
            .post(format!("{}/ugcPosts", self.base_url))
            .bearer_auth(&self.access_token)
            .header("X-Restli-Protocol-Version", "2.0.0")
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|source| LinkedInError::Request { step: STEP, source })?;

        let status = response.status();
        let header_id = response
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response
            .text()
            .await
            .map_err(|source| LinkedInError::Request { step: STEP, source })?;

        if status != StatusCode::CREATED {
            tracing::error!("❌ Failed to post: {} - {}", status, body);
            return Err(LinkedInError::Http {
                step: STEP,
                status: status.as_u16(),
                body,
            });
        }

        let body_id = serde_json::from_str::<CreatePostResponse>(&body)
            .ok()
            .and_then(|r| r.id);

        body_id
            .or(header_id)
            .ok_or_else(|| LinkedInError::InvalidResponse {
                step: STEP,
                message: format!("no post id in response: {}", body),
            })
    }

    /// Step 1 of an image upload: ask LinkedIn for an upload URL and asset URN.
    pub async fn register_image_upload(
        &self,
        owner_urn: &str,
    ) -> Result<UploadRegistration, LinkedInError> {
        const STEP: &str = "register upload";

        let payload = json!({
            "registerUploadRequest": {
                "recipes": ["urn:li:digitalmediaRecipe:feedshare-image"],
                "owner": owner_urn,
                "serviceRelationships": [
                    {
                        "relationshipType": "OWNER",
                        "identifier": "urn:li:userGeneratedContent"
                    }
                ]
            }
        });

        let response = self
            .client
            .post(format!("{}/assets?action=registerUpload", self.base_url))
            .bearer_auth(&self.access_token)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|source| LinkedInError::Request { step: STEP, source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| LinkedInError::Request { step: STEP, source })?;

        if !status.is_success() {
            tracing::error!("❌ Failed to register upload: {} - {}", status, body);
            return Err(LinkedInError::Http {
                step: STEP,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: RegisterUploadResponse =
            serde_json::from_str(&body).map_err(|e| LinkedInError::InvalidResponse {
                step: STEP,
                message: format!("{} (missing {}?)", e, UPLOAD_MECHANISM_KEY),
            })?;

        Ok(UploadRegistration {
            upload_url: parsed.value.upload_mechanism.http_request.upload_url,
            asset: parsed.value.asset,
        })
    }

    /// Step 2 of an image upload: PUT the raw bytes to the registered URL.
    pub async fn upload_image(&self, upload_url: &str, bytes: Vec<u8>) -> Result<(), LinkedInError> {
        const STEP: &str = "upload image";

        let response = self
            .client
            .put(upload_url)
            .bearer_auth(&self.access_token)
            .timeout(self.timeout)
            .body(bytes)
            .send()
            .await
            .map_err(|source| LinkedInError::Request { step: STEP, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("❌ Failed to upload image: {} - {}", status, body);
            return Err(LinkedInError::Http {
                step: STEP,
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
