// Promotion pipeline state
// Generate → Record → Publish, with the outcome of each step kept in the report

use crate::types::{GeneratedPost, PublishResult, Tone, VideoArtifact};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Next step the pipeline will execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    GeneratePost,
    RecordVideo,
    Publish,
    Done,
}

impl PipelineStep {
    pub fn to_user_message(&self) -> &'static str {
        match self {
            PipelineStep::GeneratePost => "✍️ Generating LinkedIn post",
            PipelineStep::RecordVideo => "🎥 Recording demo video",
            PipelineStep::Publish => "📤 Publishing to LinkedIn",
            PipelineStep::Done => "✅ Done",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VideoOutcome {
    Skipped,
    Recorded { artifact: VideoArtifact },
    Failed { error: String },
}

impl VideoOutcome {
    pub fn artifact(&self) -> Option<&VideoArtifact> {
        match self {
            VideoOutcome::Recorded { artifact } => Some(artifact),
            _ => None,
        }
    }
}

/// Everything one promotion run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionReport {
    pub instruction: String,
    pub tone: Tone,
    pub post: Option<GeneratedPost>,
    pub post_error: Option<String>,
    pub video: VideoOutcome,
    pub publish: Option<PublishResult>,
    pub steps_executed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl PromotionReport {
    pub fn new(instruction: String, tone: Tone) -> Self {
        Self {
            instruction,
            tone,
            post: None,
            post_error: None,
            video: VideoOutcome::Skipped,
            publish: None,
            steps_executed: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// A post was generated and the publish step did not fail.
    pub fn succeeded(&self) -> bool {
        self.post.is_some() && self.publish.as_ref().is_some_and(|p| p.is_success())
    }

    pub fn summary(&self) -> String {
        let mut msg = String::new();

        match (&self.post, &self.post_error) {
            (Some(post), _) => {
                msg.push_str(&format!("📝 Post ({} tone, {} chars)", self.tone, post.text.chars().count()));
                if post.truncated {
                    msg.push_str(" [truncated]");
                }
                msg.push('\n');
            }
            (None, Some(error)) => msg.push_str(&format!("❌ Error generating post: {}\n", error)),
            (None, None) => msg.push_str("📝 Post: not generated\n"),
        }

        match &self.video {
            VideoOutcome::Skipped => msg.push_str("🎥 Video: skipped\n"),
            VideoOutcome::Recorded { artifact } => msg.push_str(&format!(
                "🎥 Video: {} ({}x{}, {}s, {})\n",
                artifact.path.display(),
                artifact.width,
                artifact.height,
                artifact.duration_seconds,
                artifact.format
            )),
            VideoOutcome::Failed { error } => {
                msg.push_str(&format!("⚠️ Video: Error creating video: {}\n", error))
            }
        }

        if let Some(publish) = &self.publish {
            msg.push('\n');
            msg.push_str(&publish.render());
            msg.push('\n');
        }

        msg.push_str(&format!("\nSteps executed: {}", self.steps_executed));
        msg
    }
}
