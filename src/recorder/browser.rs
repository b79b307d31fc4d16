// Headless Chrome backend for the recorder, driven over CDP with chromiumoxide
use super::RecordError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    EventScreencastFrame, ScreencastFrameAckParams, StartScreencastFormat,
    StartScreencastParams, StopScreencastParams,
};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// File name of the native capture inside the capture directory.
pub const NATIVE_CAPTURE_FILE: &str = "capture.mjpeg";

/// Starts isolated browser instances.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Launches a browser with a `width`x`height` viewport. The native capture
    /// must be written inside `capture_dir`.
    async fn launch(
        &self,
        width: u32,
        height: u32,
        fps: u32,
        capture_dir: &Path,
    ) -> Result<Box<dyn BrowserSession>, RecordError>;
}

/// One page of a running browser that can be scrolled and recorded.
#[async_trait]
pub trait BrowserSession: Send {
    async fn goto(&mut self, url: &str) -> Result<(), RecordError>;

    /// Number of loaded resources once the document is complete, `None` while
    /// it is still loading.
    async fn loaded_resource_count(&mut self) -> Result<Option<u64>, RecordError>;

    async fn page_height(&mut self) -> Result<f64, RecordError>;

    async fn start_capture(&mut self) -> Result<(), RecordError>;

    async fn scroll_to(&mut self, y: f64) -> Result<(), RecordError>;

    /// Stops the capture and closes the browser. Returns the native capture
    /// file, or `None` when no frame was ever recorded.
    async fn finish(self: Box<Self>) -> Result<Option<PathBuf>, RecordError>;
}

pub struct ChromeLauncher {
    jpeg_quality: i64,
}

impl Default for ChromeLauncher {
    fn default() -> Self {
        Self { jpeg_quality: 80 }
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(
        &self,
        width: u32,
        height: u32,
        fps: u32,
        capture_dir: &Path,
    ) -> Result<Box<dyn BrowserSession>, RecordError> {
        let config = BrowserConfig::builder()
            .window_size(width, height)
            .viewport(Viewport {
                width,
                height,
                ..Default::default()
            })
            .arg("--no-sandbox") // Required for containerized environments
            .arg("--disable-dev-shm-usage")
            .arg("--hide-scrollbars")
            .build()
            .map_err(|e| RecordError::Browser(format!("Failed to build browser config: {}", e)))?;

        tracing::info!("🌐 Launching headless browser ({}x{})", width, height);

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RecordError::Browser(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(RecordError::Browser(e.to_string()));
            }
        };

        Ok(Box::new(ChromeSession {
            browser,
            handler_task,
            page,
            width,
            height,
            fps: fps.max(1),
            jpeg_quality: self.jpeg_quality,
            capture_path: capture_dir.join(NATIVE_CAPTURE_FILE),
            capture: None,
        }))
    }
}

struct CaptureTask {
    stop_tx: oneshot::Sender<()>,
    writer: JoinHandle<Result<u64, RecordError>>,
}

pub struct ChromeSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Page,
    width: u32,
    height: u32,
    fps: u32,
    jpeg_quality: i64,
    capture_path: PathBuf,
    capture: Option<CaptureTask>,
}

impl ChromeSession {
    async fn eval<T: serde::de::DeserializeOwned>(&self, expression: &str) -> Result<T, RecordError> {
        self.page
            .evaluate(expression)
            .await
            .map_err(|e| RecordError::Browser(e.to_string()))?
            .into_value()
            .map_err(|e| RecordError::Browser(e.to_string()))
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn goto(&mut self, url: &str) -> Result<(), RecordError> {
        tracing::info!("Loading website: {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| RecordError::Browser(format!("Navigation to {} failed: {}", url, e)))?;
        Ok(())
    }

    async fn loaded_resource_count(&mut self) -> Result<Option<u64>, RecordError> {
        let count: i64 = self
            .eval(
                "document.readyState === 'complete' ? performance.getEntriesByType('resource').length : -1",
            )
            .await?;
        Ok(u64::try_from(count).ok())
    }

    async fn page_height(&mut self) -> Result<f64, RecordError> {
        self.eval("document.body ? document.body.scrollHeight : 0").await
    }

    async fn start_capture(&mut self) -> Result<(), RecordError> {
        let mut frames = self
            .page
            .event_listener::<EventScreencastFrame>()
            .await
            .map_err(|e| RecordError::Browser(e.to_string()))?;

        let params = StartScreencastParams::builder()
            .format(StartScreencastFormat::Jpeg)
            .quality(self.jpeg_quality)
            .max_width(self.width as i64)
            .max_height(self.height as i64)
            .every_nth_frame(1)
            .build();
        self.page
            .execute(params)
            .await
            .map_err(|e| RecordError::Browser(format!("Failed to start screencast: {}", e)))?;

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let page = self.page.clone();
        let path = self.capture_path.clone();
        let frame_interval = Duration::from_secs_f64(1.0 / self.fps as f64);

        // Chrome only emits a frame when the page repaints, so the writer
        // resamples the latest frame at a constant rate.
        let writer = tokio::spawn(async move {
            let mut file = tokio::fs::File::create(&path).await?;
            let mut latest: Option<Vec<u8>> = None;
            let mut written = 0u64;
            let mut ticker = tokio::time::interval(frame_interval);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    frame = frames.next() => {
                        let Some(frame) = frame else { break };
                        match BASE64_STANDARD.decode(&frame.data) {
                            Ok(bytes) => latest = Some(bytes),
                            Err(e) => tracing::warn!("Dropping undecodable screencast frame: {}", e),
                        }
                        if let Err(e) = page.execute(ScreencastFrameAckParams::new(frame.session_id)).await {
                            tracing::debug!("Screencast ack failed: {}", e);
                        }
                    }
                    _ = ticker.tick() => {
                        if let Some(bytes) = &latest {
                            file.write_all(bytes).await?;
                            written += 1;
                        }
                    }
                }
            }

            file.flush().await?;
            Ok::<u64, RecordError>(written)
        });

        self.capture = Some(CaptureTask { stop_tx, writer });
        tracing::info!("🔴 Recording video...");
        Ok(())
    }

    async fn scroll_to(&mut self, y: f64) -> Result<(), RecordError> {
        self.page
            .evaluate(format!("window.scrollTo(0, {})", y))
            .await
            .map_err(|e| RecordError::Browser(e.to_string()))?;
        Ok(())
    }

    async fn finish(mut self: Box<Self>) -> Result<Option<PathBuf>, RecordError> {
        tracing::info!("Finalizing video...");

        let mut frames_written = 0;
        if let Some(capture) = self.capture.take() {
            if let Err(e) = self.page.execute(StopScreencastParams::default()).await {
                tracing::warn!("Failed to stop screencast cleanly: {}", e);
            }
            let _ = capture.stop_tx.send(());
            frames_written = match capture.writer.await {
                Ok(result) => result?,
                Err(e) => return Err(RecordError::Browser(format!("Capture task failed: {}", e))),
            };
        }

        if let Err(e) = self.browser.close().await {
            tracing::warn!("Browser did not close cleanly: {}", e);
        }
        self.handler_task.abort();

        tracing::debug!("Capture finished with {} frames", frames_written);
        if frames_written == 0 {
            return Ok(None);
        }
        Ok(Some(self.capture_path.clone()))
    }
}
