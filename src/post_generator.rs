// post_generator.rs - Turns project metadata into a LinkedIn post via the completion backend
use crate::completion::{CompletionBackend, CompletionError, POST_TEMPERATURE};
use crate::config::{get_post_template, render_template, Settings};
use crate::types::{GeneratedPost, Tone};
use std::sync::Arc;

pub const ELLIPSIS: &str = "...";

/// Prefix of the single-channel error string returned by [`PostGenerator::generate_text`].
pub const ERROR_PREFIX: &str = "Error generating post:";

pub struct PostGenerator {
    backend: Arc<dyn CompletionBackend>,
    max_post_length: usize,
}

impl PostGenerator {
    pub fn new(backend: Arc<dyn CompletionBackend>, settings: &Settings) -> Self {
        Self {
            backend,
            max_post_length: settings.max_post_length,
        }
    }

    /// Fills the tone's template with the project details.
    pub fn build_prompt(
        &self,
        project_name: &str,
        description: &str,
        website_url: &str,
        key_features: &[String],
        tone: Tone,
    ) -> String {
        let features = format_features(key_features);
        let max_length = self.max_post_length.to_string();

        render_template(
            get_post_template(tone),
            &[
                ("project_name", project_name),
                ("description", description),
                ("features", &features),
                ("website_url", website_url),
                ("max_length", &max_length),
            ],
        )
    }

    pub async fn generate(
        &self,
        project_name: &str,
        description: &str,
        website_url: &str,
        key_features: &[String],
        tone: Tone,
    ) -> Result<GeneratedPost, CompletionError> {
        tracing::info!("✍️ Generating {} post for project: {}", tone, project_name);

        let prompt = self.build_prompt(project_name, description, website_url, key_features, tone);
        let raw = self.backend.complete(&prompt, POST_TEMPERATURE).await.map_err(|e| {
            tracing::error!("Error generating post via {}: {}", self.backend.name(), e);
            e
        })?;

        let post = truncate_post(&raw, self.max_post_length);
        if post.truncated {
            tracing::warn!(
                "Post too long ({} chars), truncated to {}",
                raw.chars().count(),
                self.max_post_length
            );
        }

        tracing::info!("✅ Post generated successfully ({} chars)", post.text.chars().count());
        Ok(post)
    }

    /// Same as [`generate`](Self::generate) but folds failures into the text,
    /// prefixed with [`ERROR_PREFIX`].
    pub async fn generate_text(
        &self,
        project_name: &str,
        description: &str,
        website_url: &str,
        key_features: &[String],
        tone: Tone,
    ) -> String {
        match self
            .generate(project_name, description, website_url, key_features, tone)
            .await
        {
            Ok(post) => post.text,
            Err(e) => format!("{} {}", ERROR_PREFIX, e),
        }
    }
}

/// One `- feature` line per feature.
pub fn format_features(features: &[String]) -> String {
    features
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .map(|f| format!("- {}", f))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Caps `text` at `max_length` characters, ending in `...` when cut.
pub fn truncate_post(text: &str, max_length: usize) -> GeneratedPost {
    if text.chars().count() <= max_length {
        return GeneratedPost {
            text: text.to_string(),
            truncated: false,
        };
    }

    let ellipsis_len = ELLIPSIS.chars().count();
    let text = if max_length < ellipsis_len {
        text.chars().take(max_length).collect()
    } else {
        let mut cut: String = text.chars().take(max_length - ellipsis_len).collect();
        cut.push_str(ELLIPSIS);
        cut
    };

    GeneratedPost {
        text,
        truncated: true,
    }
}
