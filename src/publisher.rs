// publisher.rs - Previews or publishes the generated post on LinkedIn
use crate::config::Settings;
use crate::linkedin_client::{person_urn, LinkedInClient, LinkedInError};
use crate::types::{PublishFailure, PublishResult};
use std::path::Path;

pub struct Publisher {
    auto_post: bool,
    has_credentials: bool,
    user_id: String,
    client: LinkedInClient,
}

impl Publisher {
    pub fn new(settings: &Settings) -> Self {
        let client = LinkedInClient::new(settings.linkedin_access_token.clone())
            .with_base_url(settings.linkedin_api_base_url.clone())
            .with_timeout(settings.http_timeout);

        Self {
            auto_post: settings.auto_post,
            has_credentials: settings.has_linkedin_credentials(),
            user_id: settings.linkedin_user_id.clone(),
            client,
        }
    }

    pub fn auto_post(&self) -> bool {
        self.auto_post
    }

    /// Makes exactly one publish attempt.
    ///
    /// With auto-post disabled nothing is sent and a preview is returned. A
    /// video takes precedence over an image; video upload is not supported and
    /// yields [`PublishResult::Unsupported`].
    pub async fn publish(
        &self,
        post_text: &str,
        video_path: Option<&Path>,
        image_path: Option<&Path>,
    ) -> PublishResult {
        tracing::info!("📤 Preparing to post to LinkedIn");

        if !self.auto_post {
            tracing::info!("Auto-post is disabled. Content prepared but not posted.");
            return PublishResult::Previewed {
                text: post_text.to_string(),
                video: video_path.map(Path::to_path_buf),
                image: image_path.map(Path::to_path_buf),
            };
        }

        if !self.has_credentials {
            let reason = PublishFailure::MissingCredentials;
            tracing::error!("{}", reason);
            return PublishResult::Failed { reason };
        }

        if let Some(video) = video_path {
            return self.post_with_video(video);
        }

        let result = match image_path {
            Some(image) => self.post_with_image(post_text, image).await,
            None => self.post_text_only(post_text).await,
        };

        match result {
            Ok(post_id) => {
                tracing::info!("✅ Post published successfully: {}", post_id);
                PublishResult::Published { post_id }
            }
            Err(reason) => {
                tracing::error!("Error posting to LinkedIn: {}", reason);
                PublishResult::Failed { reason }
            }
        }
    }

    async fn post_text_only(&self, post_text: &str) -> Result<String, PublishFailure> {
        tracing::info!("Posting text-only to LinkedIn");
        self.client
            .create_post(&person_urn(&self.user_id), post_text, None)
            .await
            .map_err(failure_from)
    }

    async fn post_with_image(&self, post_text: &str, image_path: &Path) -> Result<String, PublishFailure> {
        tracing::info!("Posting with image: {}", image_path.display());

        let bytes = tokio::fs::read(image_path)
            .await
            .map_err(|e| PublishFailure::Io {
                message: format!("{}: {}", image_path.display(), e),
            })?;

        let owner = person_urn(&self.user_id);
        let registration = self
            .client
            .register_image_upload(&owner)
            .await
            .map_err(failure_from)?;
        self.client
            .upload_image(&registration.upload_url, bytes)
            .await
            .map_err(failure_from)?;
        tracing::info!("Image uploaded successfully: {}", registration.asset);

        self.client
            .create_post(&owner, post_text, Some(&registration.asset))
            .await
            .map_err(failure_from)
    }

    fn post_with_video(&self, video_path: &Path) -> PublishResult {
        tracing::warn!("Video posting to LinkedIn requires a chunked upload, which is not supported");
        PublishResult::Unsupported {
            message: format!(
                "Video posting requires additional setup.\n\n\
                 LinkedIn video posts require:\n\
                 1. Registering video upload\n\
                 2. Chunked upload process\n\
                 3. Video processing time\n\n\
                 For now, please:\n\
                 1. Upload the video manually from: {}\n\
                 2. Or use the text-only post and add video later",
                video_path.display()
            ),
        }
    }
}

fn failure_from(error: LinkedInError) -> PublishFailure {
    match error {
        LinkedInError::Http { step, status, body } => PublishFailure::Api {
            step: step.to_string(),
            status,
            body,
        },
        LinkedInError::Request { step, source } => PublishFailure::Transport {
            message: format!("{}: {}", step, source),
        },
        LinkedInError::InvalidResponse { step, message } => PublishFailure::Transport {
            message: format!("{}: {}", step, message),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;
    use wiremock::matchers::{body_bytes, body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn publish_settings(server: &MockServer, token: &str, user_id: &str) -> Settings {
        Settings {
            auto_post: true,
            linkedin_access_token: token.to_string(),
            linkedin_user_id: user_id.to_string(),
            linkedin_api_base_url: server.uri(),
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn test_preview_mode_never_calls_network() {
        let server = MockServer::start().await;
        let settings = Settings {
            auto_post: false,
            linkedin_api_base_url: server.uri(),
            ..Settings::default()
        };
        let publisher = Publisher::new(&settings);

        let text = "Launching Acme 🚀\n#rust";
        let video = PathBuf::from("output/acme.mp4");
        let result = publisher.publish(text, Some(&video), None).await;

        assert_eq!(
            result,
            PublishResult::Previewed {
                text: text.to_string(),
                video: Some(video),
                image: None,
            }
        );
        assert!(result.render().contains(text));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_without_network() {
        let server = MockServer::start().await;
        for (token, user) in [("", "abc"), ("token", ""), ("", "")] {
            let publisher = Publisher::new(&publish_settings(&server, token, user));
            let result = publisher.publish("any text", None, None).await;
            assert_eq!(
                result,
                PublishResult::Failed {
                    reason: PublishFailure::MissingCredentials
                }
            );
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_text_post_published() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ugcPosts"))
            .and(header("authorization", "Bearer token"))
            .and(body_partial_json(json!({
                "author": "urn:li:person:abc",
                "lifecycleState": "PUBLISHED",
                "specificContent": {
                    "com.linkedin.ugc.ShareContent": {
                        "shareCommentary": { "text": "Hello" },
                        "shareMediaCategory": "NONE"
                    }
                },
                "visibility": { "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC" }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "abc123" })))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = Publisher::new(&publish_settings(&server, "token", "abc"));
        let result = publisher.publish("Hello", None, None).await;

        assert_eq!(
            result,
            PublishResult::Published {
                post_id: "abc123".to_string()
            }
        );
        assert!(result.is_success());
        assert!(result.render().contains("abc123"));
    }

    #[tokio::test]
    async fn test_rejected_token_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ugcPosts"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid access token"))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = Publisher::new(&publish_settings(&server, "expired", "abc"));
        let result = publisher.publish("Hello", None, None).await;

        match &result {
            PublishResult::Failed {
                reason: PublishFailure::Api { status, body, .. },
            } => {
                assert_eq!(*status, 401);
                assert_eq!(body, "Invalid access token");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!result.is_success());
        assert!(result.render().contains("401"));
    }

    #[tokio::test]
    async fn test_image_post_uploads_then_references_asset() {
        let server = MockServer::start().await;
        let dir = tempfile::TempDir::new().unwrap();
        let image = dir.path().join("shot.png");
        std::fs::write(&image, b"PNGDATA").unwrap();

        Mock::given(method("POST"))
            .and(path("/assets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": {
                    "uploadMechanism": {
                        "com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest": {
                            "uploadUrl": format!("{}/upload/asset-1", server.uri())
                        }
                    },
                    "asset": "urn:li:digitalmediaAsset:asset-1"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/upload/asset-1"))
            .and(body_bytes(b"PNGDATA".to_vec()))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/ugcPosts"))
            .and(body_partial_json(json!({
                "specificContent": {
                    "com.linkedin.ugc.ShareContent": {
                        "shareMediaCategory": "IMAGE",
                        "media": [
                            { "status": "READY", "media": "urn:li:digitalmediaAsset:asset-1" }
                        ]
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "urn:li:share:7" })))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = Publisher::new(&publish_settings(&server, "token", "abc"));
        let result = publisher.publish("With a picture", None, Some(&image)).await;
        assert_eq!(
            result,
            PublishResult::Published {
                post_id: "urn:li:share:7".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_failed_upload_short_circuits_post() {
        let server = MockServer::start().await;
        let dir = tempfile::TempDir::new().unwrap();
        let image = dir.path().join("shot.png");
        std::fs::write(&image, b"PNGDATA").unwrap();

        Mock::given(method("POST"))
            .and(path("/assets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": {
                    "uploadMechanism": {
                        "com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest": {
                            "uploadUrl": format!("{}/upload/asset-2", server.uri())
                        }
                    },
                    "asset": "urn:li:digitalmediaAsset:asset-2"
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/upload/asset-2"))
            .respond_with(ResponseTemplate::new(500).set_body_string("storage down"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/ugcPosts"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let publisher = Publisher::new(&publish_settings(&server, "token", "abc"));
        let result = publisher.publish("With a picture", None, Some(&image)).await;
        assert_eq!(
            result,
            PublishResult::Failed {
                reason: PublishFailure::Api {
                    step: "upload image".to_string(),
                    status: 500,
                    body: "storage down".to_string(),
                }
            }
        );
    }

    #[tokio::test]
    async fn test_failed_registration_short_circuits_upload_and_post() {
        let server = MockServer::start().await;
        let dir = tempfile::TempDir::new().unwrap();
        let image = dir.path().join("shot.png");
        std::fs::write(&image, b"PNGDATA").unwrap();

        Mock::given(method("POST"))
            .and(path("/assets"))
            .respond_with(ResponseTemplate::new(403).set_body_string("scope w_member_social missing"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/ugcPosts"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let publisher = Publisher::new(&publish_settings(&server, "token", "abc"));
        let result = publisher.publish("With a picture", None, Some(&image)).await;
        assert_eq!(
            result,
            PublishResult::Failed {
                reason: PublishFailure::Api {
                    step: "register upload".to_string(),
                    status: 403,
                    body: "scope w_member_social missing".to_string(),
                }
            }
        );
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_image_file_is_io_failure() {
        let server = MockServer::start().await;
        let publisher = Publisher::new(&publish_settings(&server, "token", "abc"));
        let result = publisher
            .publish("text", None, Some(Path::new("/nonexistent/image.png")))
            .await;
        assert!(matches!(
            result,
            PublishResult::Failed {
                reason: PublishFailure::Io { .. }
            }
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_video_is_reported_unsupported() {
        let server = MockServer::start().await;
        let publisher = Publisher::new(&publish_settings(&server, "token", "abc"));
        let video = PathBuf::from("output/acme-1234.mp4");
        let result = publisher
            .publish("text", Some(&video), Some(Path::new("shot.png")))
            .await;

        match &result {
            PublishResult::Unsupported { message } => {
                assert!(message.contains("output/acme-1234.mp4"));
                assert!(message.contains("Chunked upload"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
