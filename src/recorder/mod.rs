// src/recorder/mod.rs - Records a scrolling demo video of a website
pub mod browser;
pub mod scroll;
pub mod transcode;

pub use browser::{BrowserLauncher, BrowserSession, ChromeLauncher};
pub use scroll::{ScrollPlan, TICK_INTERVAL};
pub use transcode::{FfmpegTranscoder, TranscodeError, Transcoder};

use crate::config::{Settings, VideoSettings};
use crate::types::VideoArtifact;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Container the browser capture is written in before any transcoding.
pub const NATIVE_FORMAT: &str = "mjpeg";

const NETWORK_QUIET_PERIOD: Duration = Duration::from_millis(500);
const NETWORK_POLL_INTERVAL: Duration = Duration::from_millis(250);
const NETWORK_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("invalid website URL '{0}': only http and https are supported")]
    InvalidUrl(String),
    #[error("video duration must be at least one second")]
    InvalidDuration,
    #[error("browser error: {0}")]
    Browser(String),
    #[error("No video file was created")]
    NoCapture,
    #[error("file error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct VideoRecorder {
    launcher: Arc<dyn BrowserLauncher>,
    transcoder: Arc<dyn Transcoder>,
    video: VideoSettings,
    output_dir: PathBuf,
}

impl VideoRecorder {
    pub fn new(
        settings: &Settings,
        launcher: Arc<dyn BrowserLauncher>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self {
            launcher,
            transcoder,
            video: settings.video.clone(),
            output_dir: settings.output_dir.clone(),
        }
    }

    /// Recorder backed by headless Chrome and the `ffmpeg` binary.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings,
            Arc::new(ChromeLauncher::default()),
            Arc::new(FfmpegTranscoder::default()),
        )
    }

    /// Records `website_url` for `duration_seconds` into
    /// `{output_dir}/{output_name}.{format}`.
    ///
    /// When the configured format cannot be produced the native `.mjpeg`
    /// capture is delivered instead and the artifact reports that format.
    pub async fn record(
        &self,
        website_url: &str,
        duration_seconds: u64,
        output_name: &str,
    ) -> Result<VideoArtifact, RecordError> {
        validate_url(website_url)?;
        if duration_seconds == 0 {
            return Err(RecordError::InvalidDuration);
        }

        tracing::info!(
            "🎥 Creating {}s demo video of {}",
            duration_seconds,
            website_url
        );

        tokio::fs::create_dir_all(&self.output_dir).await?;
        // Removed on drop, so frames never outlive a failed or cancelled run.
        let capture_dir = tempfile::Builder::new()
            .prefix(".capture-")
            .tempdir_in(&self.output_dir)?;

        let (width, height) = self.video.dimensions();
        let mut session = self
            .launcher
            .launch(width, height, self.video.fps, capture_dir.path())
            .await?;

        let driven = self
            .drive(session.as_mut(), website_url, duration_seconds)
            .await;
        let finished = session.finish().await;
        let ticks = driven?;
        tracing::debug!("Scrolled {} ticks", ticks);

        let native = finished?.ok_or(RecordError::NoCapture)?;
        if !tokio::fs::try_exists(&native).await.unwrap_or(false) {
            return Err(RecordError::NoCapture);
        }

        let artifact = self
            .deliver(
                &native,
                capture_dir.path(),
                output_name,
                width,
                height,
                duration_seconds,
            )
            .await?;
        tracing::info!("✅ Video created successfully: {}", artifact.path.display());
        Ok(artifact)
    }

    /// Navigates, waits for the page to settle, then scrolls until the
    /// recording window has elapsed. Returns the number of ticks.
    async fn drive(
        &self,
        session: &mut dyn BrowserSession,
        website_url: &str,
        duration_seconds: u64,
    ) -> Result<u64, RecordError> {
        session.goto(website_url).await?;
        wait_for_network_idle(session).await?;

        let page_height = session.page_height().await?;
        let plan = ScrollPlan::new(page_height, duration_seconds);
        tracing::debug!(
            "Page height {}px, scrolling {:.1}px every {:?}",
            page_height,
            plan.step(),
            TICK_INTERVAL
        );

        session.start_capture().await?;

        let window = Duration::from_secs(duration_seconds);
        let start = Instant::now();
        let mut tick = 0;
        while start.elapsed() < window {
            session.scroll_to(plan.position_at(tick)).await?;
            tokio::time::sleep(TICK_INTERVAL).await;
            tick += 1;
        }

        Ok(tick)
    }

    async fn deliver(
        &self,
        native: &Path,
        capture_dir: &Path,
        output_name: &str,
        width: u32,
        height: u32,
        duration_seconds: u64,
    ) -> Result<VideoArtifact, RecordError> {
        let format = self.video.format.trim().to_lowercase();
        let target = self.output_dir.join(format!("{}.{}", output_name, format));
        let artifact = |path: PathBuf, format: &str| VideoArtifact {
            path,
            width,
            height,
            fps: self.video.fps,
            format: format.to_string(),
            duration_seconds,
        };

        if format == NATIVE_FORMAT {
            tokio::fs::rename(native, &target).await?;
            return Ok(artifact(target, NATIVE_FORMAT));
        }

        // Transcode inside the capture dir so a cancelled run never leaves a
        // partial file in the output directory.
        let staged = capture_dir.join(format!("out.{}", format));
        match self
            .transcoder
            .transcode(native, &staged, self.video.fps)
            .await
        {
            Ok(()) => {
                tokio::fs::rename(&staged, &target).await?;
                Ok(artifact(target, &format))
            }
            Err(e) => {
                tracing::warn!("{}; keeping {} format", e, NATIVE_FORMAT);
                let fallback = target.with_extension(NATIVE_FORMAT);
                tokio::fs::rename(native, &fallback).await?;
                Ok(artifact(fallback, NATIVE_FORMAT))
            }
        }
    }
}

fn validate_url(website_url: &str) -> Result<(), RecordError> {
    match reqwest::Url::parse(website_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(RecordError::InvalidUrl(website_url.to_string())),
    }
}

/// Waits until the document is complete and its resource count has not
/// changed for [`NETWORK_QUIET_PERIOD`]. Gives up (without failing) after
/// [`NETWORK_IDLE_TIMEOUT`].
async fn wait_for_network_idle(session: &mut dyn BrowserSession) -> Result<(), RecordError> {
    let deadline = Instant::now() + NETWORK_IDLE_TIMEOUT;
    let mut last_count = None;
    let mut stable_since = Instant::now();

    loop {
        let count = session.loaded_resource_count().await?;
        let now = Instant::now();

        if count.is_some() && count == last_count {
            if now.duration_since(stable_since) >= NETWORK_QUIET_PERIOD {
                return Ok(());
            }
        } else {
            last_count = count;
            stable_since = now;
        }

        if now >= deadline {
            tracing::warn!("Page did not go network-idle within {:?}, recording anyway", NETWORK_IDLE_TIMEOUT);
            return Ok(());
        }

        tokio::time::sleep(NETWORK_POLL_INTERVAL).await;
    }
}
