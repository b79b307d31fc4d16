// types.rs - Common data structures shared by the promotion components
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Style category that selects the prompt template for a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Casual,
    Enthusiastic,
    Technical,
}

impl Tone {
    pub const ALL: [Tone; 4] = [
        Tone::Professional,
        Tone::Casual,
        Tone::Enthusiastic,
        Tone::Technical,
    ];

    /// Strict lookup, `None` for anything that is not a known tone name.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "professional" => Some(Tone::Professional),
            "casual" => Some(Tone::Casual),
            "enthusiastic" => Some(Tone::Enthusiastic),
            "technical" => Some(Tone::Technical),
            _ => None,
        }
    }

    /// Lenient lookup: unrecognized names fall back to `Professional`.
    pub fn from_name(name: &str) -> Self {
        Self::parse(name).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Casual => "casual",
            Tone::Enthusiastic => "enthusiastic",
            Tone::Technical => "technical",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Input files are hand-written, so an unknown tone degrades instead of rejecting the file.
impl<'de> Deserialize<'de> for Tone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Tone::from_name(&name))
    }
}

/// A single promotion run's input. Created by the caller, consumed once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectPromotionRequest {
    pub project_name: String,
    pub website_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub key_features: Vec<String>,
    #[serde(default)]
    pub tone: Option<Tone>,
}

impl ProjectPromotionRequest {
    /// Request used when the CLI gets neither an input file nor interactive answers.
    pub fn example(website_url: &str) -> Self {
        Self {
            project_name: "CarbonTrack".to_string(),
            website_url: website_url.to_string(),
            description:
                "A sustainability tracking app that helps users reduce their carbon footprint"
                    .to_string(),
            key_features: vec![
                "Carbon footprint tracking".to_string(),
                "AI-powered recommendations".to_string(),
                "Community challenges".to_string(),
            ],
            tone: Some(Tone::Professional),
        }
    }
}

/// Post text returned by the generator; never longer than the configured limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPost {
    pub text: String,
    pub truncated: bool,
}

/// A recorded demo video and the parameters it was produced with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoArtifact {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub format: String,
    pub duration_seconds: u64,
}

/// Why a publish attempt did not produce a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PublishFailure {
    MissingCredentials,
    Api {
        step: String,
        status: u16,
        body: String,
    },
    Io {
        message: String,
    },
    Transport {
        message: String,
    },
}

impl fmt::Display for PublishFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishFailure::MissingCredentials => write!(
                f,
                "missing credentials: set LINKEDIN_ACCESS_TOKEN and LINKEDIN_USER_ID"
            ),
            PublishFailure::Api { step, status, body } => {
                write!(f, "{} failed: {} - {}", step, status, body)
            }
            PublishFailure::Io { message } => write!(f, "file error: {}", message),
            PublishFailure::Transport { message } => write!(f, "request error: {}", message),
        }
    }
}

/// Outcome of one publish invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PublishResult {
    /// Auto-post disabled: nothing left the machine.
    Previewed {
        text: String,
        video: Option<PathBuf>,
        image: Option<PathBuf>,
    },
    Published {
        post_id: String,
    },
    /// A capability the platform integration does not cover (video upload).
    Unsupported {
        message: String,
    },
    Failed {
        reason: PublishFailure,
    },
}

impl PublishResult {
    pub fn is_success(&self) -> bool {
        !matches!(self, PublishResult::Failed { .. })
    }

    /// Human-readable rendering for the console.
    pub fn render(&self) -> String {
        match self {
            PublishResult::Previewed { text, video, image } => {
                let attachment = |p: &Option<PathBuf>| {
                    p.as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "None".to_string())
                };
                format!(
                    "📝 LinkedIn Post Preview\n========================\n\n{}\n\nAttachments:\n- Video: {}\n- Image: {}\n\nStatus: Ready to post (auto_post is disabled)\nTo enable auto-posting, set AUTO_POST=true in .env\n========================",
                    text,
                    attachment(video),
                    attachment(image)
                )
            }
            PublishResult::Published { post_id } => {
                format!("✅ Post published successfully! Post ID: {}", post_id)
            }
            PublishResult::Unsupported { message } => format!("⚠️ {}", message),
            PublishResult::Failed { reason } => format!("❌ Error: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_parsing_is_case_insensitive() {
        assert_eq!(Tone::parse(" Casual "), Some(Tone::Casual));
        assert_eq!(Tone::parse("TECHNICAL"), Some(Tone::Technical));
        assert_eq!(Tone::parse("snarky"), None);
        assert_eq!(Tone::from_name("snarky"), Tone::Professional);
    }

    #[test]
    fn test_request_deserializes_with_unknown_tone() {
        let json = r#"{
            "project_name": "Acme",
            "website_url": "https://acme.test",
            "key_features": ["fast", "free"],
            "tone": "sarcastic"
        }"#;
        let request: ProjectPromotionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.tone, Some(Tone::Professional));
        assert_eq!(request.description, "");
        assert_eq!(request.key_features, vec!["fast", "free"]);
    }

    #[test]
    fn test_preview_rendering_contains_text_and_attachments() {
        let result = PublishResult::Previewed {
            text: "Hello LinkedIn".to_string(),
            video: Some(PathBuf::from("output/demo.mp4")),
            image: None,
        };
        let rendered = result.render();
        assert!(rendered.contains("Hello LinkedIn"));
        assert!(rendered.contains("output/demo.mp4"));
        assert!(rendered.contains("Image: None"));
        assert!(result.is_success());
    }

    #[test]
    fn test_failed_rendering_mentions_status() {
        let result = PublishResult::Failed {
            reason: PublishFailure::Api {
                step: "create post".to_string(),
                status: 401,
                body: "unauthorized".to_string(),
            },
        };
        assert!(!result.is_success());
        assert!(result.render().contains("401"));
    }
}
