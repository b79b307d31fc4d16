// Promotion pipeline - drives post generation, video recording and publishing in order
use super::state::{PipelineStep, PromotionReport, VideoOutcome};
use crate::config::Settings;
use crate::post_generator::{format_features, PostGenerator};
use crate::publisher::Publisher;
use crate::recorder::VideoRecorder;
use crate::types::{ProjectPromotionRequest, Tone};
use crate::utils::unique_output_name;

/// Upper bound on executed steps per run.
pub const MAX_ITERATIONS: usize = 5;

pub struct PromotionPipeline {
    generator: PostGenerator,
    recorder: Option<VideoRecorder>,
    publisher: Publisher,
    default_tone: Tone,
    video_duration: u64,
}

impl PromotionPipeline {
    /// `recorder: None` skips the video step and publishes text only.
    pub fn new(
        settings: &Settings,
        generator: PostGenerator,
        recorder: Option<VideoRecorder>,
        publisher: Publisher,
    ) -> Self {
        Self {
            generator,
            recorder,
            publisher,
            default_tone: settings.default_post_tone,
            video_duration: settings.video.duration_seconds,
        }
    }

    pub fn resolve_tone(&self, request: &ProjectPromotionRequest) -> Tone {
        request.tone.unwrap_or(self.default_tone)
    }

    /// Natural-language summary of the plan for this request.
    pub fn instruction(&self, request: &ProjectPromotionRequest) -> String {
        let tone = self.resolve_tone(request);
        let video_step = if self.recorder.is_some() {
            format!("Create a {}-second demo video of the website", self.video_duration)
        } else {
            "Skip the demo video".to_string()
        };
        let publish_step = if self.publisher.auto_post() {
            "Automatically post"
        } else {
            "Prepare to post"
        };

        format!(
            "Please promote the following project on LinkedIn:\n\n\
             Project: {}\n\
             Website: {}\n\
             Description: {}\n\n\
             Key Features:\n{}\n\n\
             Tone: {}\n\n\
             Steps to complete:\n\
             1. Generate a {} LinkedIn post about this project\n\
             2. {}\n\
             3. {} the content to LinkedIn",
            request.project_name,
            request.website_url,
            request.description,
            format_features(&request.key_features),
            tone,
            tone,
            video_step,
            publish_step
        )
    }

    /// Runs the steps in order. A post-generation failure ends the run; a
    /// recording failure falls back to a text-only publish.
    pub async fn run(&self, request: &ProjectPromotionRequest) -> PromotionReport {
        let tone = self.resolve_tone(request);
        let instruction = self.instruction(request);
        tracing::info!("🚀 Starting promotion for project: {}", request.project_name);
        tracing::debug!("Plan:\n{}", instruction);

        let mut report = PromotionReport::new(instruction, tone);
        let mut step = PipelineStep::GeneratePost;
        let mut iterations = 0;

        while step != PipelineStep::Done && iterations < MAX_ITERATIONS {
            iterations += 1;
            tracing::info!("{} (step {})", step.to_user_message(), iterations);

            step = match step {
                PipelineStep::GeneratePost => self.generate_step(request, tone, &mut report).await,
                PipelineStep::RecordVideo => self.record_step(request, &mut report).await,
                PipelineStep::Publish => self.publish_step(&mut report).await,
                PipelineStep::Done => PipelineStep::Done,
            };
        }

        if step != PipelineStep::Done {
            tracing::warn!("Stopped after {} iterations before completing", MAX_ITERATIONS);
        }

        report.steps_executed = iterations;
        report.finished_at = Some(chrono::Utc::now());
        tracing::info!(
            "Promotion finished in {} steps (success: {})",
            iterations,
            report.succeeded()
        );
        report
    }

    async fn generate_step(
        &self,
        request: &ProjectPromotionRequest,
        tone: Tone,
        report: &mut PromotionReport,
    ) -> PipelineStep {
        let generated = self
            .generator
            .generate(
                &request.project_name,
                &request.description,
                &request.website_url,
                &request.key_features,
                tone,
            )
            .await;

        match generated {
            Ok(post) => {
                report.post = Some(post);
                if self.recorder.is_some() {
                    PipelineStep::RecordVideo
                } else {
                    PipelineStep::Publish
                }
            }
            Err(e) => {
                tracing::error!("Aborting promotion, post generation failed: {}", e);
                report.post_error = Some(e.to_string());
                PipelineStep::Done
            }
        }
    }

    async fn record_step(
        &self,
        request: &ProjectPromotionRequest,
        report: &mut PromotionReport,
    ) -> PipelineStep {
        let Some(recorder) = &self.recorder else {
            return PipelineStep::Publish;
        };

        let output_name = unique_output_name(&request.project_name);
        report.video = match recorder
            .record(&request.website_url, self.video_duration, &output_name)
            .await
        {
            Ok(artifact) => VideoOutcome::Recorded { artifact },
            Err(e) => {
                tracing::error!("Error creating video: {}; continuing without video", e);
                VideoOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        PipelineStep::Publish
    }

    async fn publish_step(&self, report: &mut PromotionReport) -> PipelineStep {
        if let Some(post) = &report.post {
            let video = report.video.artifact().map(|a| a.path.as_path());
            report.publish = Some(self.publisher.publish(&post.text, video, None).await);
        }
        PipelineStep::Done
    }
}
