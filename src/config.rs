// config.rs - Settings resolved once at startup and handed to each component
use crate::types::Tone;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_VIDEO_DIMENSIONS: (u32, u32) = (1920, 1080);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unsupported LLM provider: {0} (expected 'ollama' or 'grok')")]
    UnsupportedProvider(String),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
    #[error("{0} must be set when LLM_PROVIDER=grok")]
    MissingApiKey(&'static str),
}

/// Which completion backend generates posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// Self-hosted Ollama server
    Ollama,
    /// xAI Grok, OpenAI-compatible hosted API
    Grok,
}

impl LlmProvider {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_lowercase().as_str() {
            "ollama" | "local-llm" | "local" => Ok(LlmProvider::Ollama),
            "grok" | "xai" => Ok(LlmProvider::Grok),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Ollama => "ollama",
            LlmProvider::Grok => "grok",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoSettings {
    pub duration_seconds: u64,
    /// `WIDTHxHEIGHT`, parsed lazily by [`VideoSettings::dimensions`]
    pub resolution: String,
    pub fps: u32,
    pub format: String,
}

impl VideoSettings {
    /// Parses the resolution string. Any malformed or non-positive value
    /// yields 1920x1080 instead of an error.
    pub fn dimensions(&self) -> (u32, u32) {
        parse_resolution(&self.resolution).unwrap_or(DEFAULT_VIDEO_DIMENSIONS)
    }
}

fn parse_resolution(value: &str) -> Option<(u32, u32)> {
    let (width, height) = value.trim().split_once('x')?;
    let width: u32 = width.trim().parse().ok()?;
    let height: u32 = height.trim().parse().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some((width, height))
}

#[derive(Debug, Clone)]
pub struct Settings {
    // LLM
    pub llm_provider: LlmProvider,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub grok_api_key: String,
    pub grok_model: String,
    pub grok_base_url: String,

    // LinkedIn
    pub linkedin_access_token: String,
    pub linkedin_user_id: String,
    pub linkedin_api_base_url: String,

    pub project_website_url: String,

    pub video: VideoSettings,
    pub output_dir: PathBuf,

    // Agent behavior
    pub default_post_tone: Tone,
    pub auto_post: bool,
    pub max_post_length: usize,
    pub http_timeout: Duration,

    // Logging
    pub log_level: String,
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm_provider: LlmProvider::Ollama,
            ollama_base_url: "http://localhost:11434".to_string(),
            ollama_model: "llama2".to_string(),
            grok_api_key: String::new(),
            grok_model: "grok-beta".to_string(),
            grok_base_url: "https://api.x.ai/v1".to_string(),
            linkedin_access_token: String::new(),
            linkedin_user_id: String::new(),
            linkedin_api_base_url: "https://api.linkedin.com/v2".to_string(),
            project_website_url: "https://github.com".to_string(),
            video: VideoSettings {
                duration_seconds: 30,
                resolution: "1920x1080".to_string(),
                fps: 30,
                format: "mp4".to_string(),
            },
            output_dir: PathBuf::from("output"),
            default_post_tone: Tone::Professional,
            auto_post: false,
            max_post_length: 2000,
            http_timeout: Duration::from_secs(120),
            log_level: "info".to_string(),
            log_file: PathBuf::from("project-promoter.log"),
        }
    }
}

impl Settings {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut settings = Settings::default();

        if let Some(provider) = get("LLM_PROVIDER") {
            settings.llm_provider = LlmProvider::parse(&provider)?;
        }
        set_string(&get, "OLLAMA_BASE_URL", &mut settings.ollama_base_url);
        set_string(&get, "OLLAMA_MODEL", &mut settings.ollama_model);
        set_string(&get, "GROK_API_KEY", &mut settings.grok_api_key);
        set_string(&get, "GROK_MODEL", &mut settings.grok_model);
        set_string(&get, "GROK_BASE_URL", &mut settings.grok_base_url);
        set_string(&get, "LINKEDIN_ACCESS_TOKEN", &mut settings.linkedin_access_token);
        set_string(&get, "LINKEDIN_USER_ID", &mut settings.linkedin_user_id);
        set_string(&get, "LINKEDIN_API_BASE_URL", &mut settings.linkedin_api_base_url);
        set_string(&get, "PROJECT_WEBSITE_URL", &mut settings.project_website_url);
        set_string(&get, "VIDEO_RESOLUTION", &mut settings.video.resolution);
        set_string(&get, "VIDEO_FORMAT", &mut settings.video.format);
        set_string(&get, "LOG_LEVEL", &mut settings.log_level);

        if let Some(duration) = get("VIDEO_DURATION") {
            settings.video.duration_seconds = parse_number("VIDEO_DURATION", &duration)?;
        }
        if let Some(fps) = get("VIDEO_FPS") {
            settings.video.fps = parse_number("VIDEO_FPS", &fps)?;
        }
        if let Some(max_len) = get("MAX_POST_LENGTH") {
            settings.max_post_length = parse_number("MAX_POST_LENGTH", &max_len)?;
        }
        if let Some(timeout) = get("HTTP_TIMEOUT_SECS") {
            settings.http_timeout =
                Duration::from_secs(parse_number("HTTP_TIMEOUT_SECS", &timeout)?);
        }
        if let Some(auto_post) = get("AUTO_POST") {
            settings.auto_post = parse_bool("AUTO_POST", &auto_post)?;
        }
        if let Some(tone) = get("DEFAULT_POST_TONE") {
            settings.default_post_tone = Tone::parse(&tone).ok_or(ConfigError::InvalidValue {
                key: "DEFAULT_POST_TONE".to_string(),
                value: tone,
            })?;
        }
        if let Some(dir) = get("OUTPUT_DIR") {
            settings.output_dir = PathBuf::from(dir);
        }
        if let Some(file) = get("LOG_FILE") {
            settings.log_file = PathBuf::from(file);
        }

        if settings.llm_provider == LlmProvider::Grok && settings.grok_api_key.is_empty() {
            return Err(ConfigError::MissingApiKey("GROK_API_KEY"));
        }

        Ok(settings)
    }

    pub fn get_video_dimensions(&self) -> (u32, u32) {
        self.video.dimensions()
    }

    pub fn has_linkedin_credentials(&self) -> bool {
        !self.linkedin_access_token.is_empty() && !self.linkedin_user_id.is_empty()
    }

    pub fn model_name(&self) -> &str {
        match self.llm_provider {
            LlmProvider::Ollama => &self.ollama_model,
            LlmProvider::Grok => &self.grok_model,
        }
    }
}

fn set_string<G>(get: &G, key: &str, target: &mut String)
where
    G: Fn(&str) -> Option<String>,
{
    if let Some(value) = get(key) {
        *target = value;
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

// ============================================================================
// Post templates
// ============================================================================

const PROFESSIONAL_TEMPLATE: &str = "
Create a professional LinkedIn post about {project_name}.

Project Description: {description}
Key Features: {features}
Website: {website_url}

The post should:
- Be engaging and informative
- Highlight the key value proposition
- Include relevant hashtags
- Be under {max_length} characters
- Have a professional tone
- Include a call-to-action
";

const CASUAL_TEMPLATE: &str = "
Write a friendly, casual LinkedIn post about {project_name}.

What it does: {description}
Cool features: {features}
Check it out: {website_url}

Make it:
- Conversational and approachable
- Exciting but not overhyped
- Easy to read
- Under {max_length} characters
- Include emojis where appropriate
- End with an invitation to try it
";

const ENTHUSIASTIC_TEMPLATE: &str = "
Create an enthusiastic LinkedIn post announcing {project_name}!

What makes it amazing: {description}
Standout features: {features}
Link: {website_url}

Make it:
- Exciting and energetic
- Show genuine passion
- Inspire curiosity
- Under {max_length} characters
- Use powerful language
- Create FOMO (fear of missing out)
";

const TECHNICAL_TEMPLATE: &str = "
Write a technical LinkedIn post about {project_name}.

Technical overview: {description}
Key capabilities: {features}
Project link: {website_url}

The post should:
- Focus on technical details
- Mention architecture or tech stack if relevant
- Appeal to developers and technical professionals
- Be under {max_length} characters
- Include relevant technical hashtags
- Invite technical feedback
";

/// Placeholders every template contains.
pub const TEMPLATE_PLACEHOLDERS: [&str; 5] = [
    "project_name",
    "description",
    "features",
    "website_url",
    "max_length",
];

pub fn get_post_template(tone: Tone) -> &'static str {
    match tone {
        Tone::Professional => PROFESSIONAL_TEMPLATE,
        Tone::Casual => CASUAL_TEMPLATE,
        Tone::Enthusiastic => ENTHUSIASTIC_TEMPLATE,
        Tone::Technical => TECHNICAL_TEMPLATE,
    }
}

/// Template lookup by name; unknown names get the professional template.
pub fn get_post_template_by_name(tone: &str) -> &'static str {
    get_post_template(Tone::from_name(tone))
}

/// Replaces each `{key}` in `template` with its value.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{}}}", key), value)
    })
}
