// Converts the native Motion-JPEG capture into the configured container
use crate::utils::{check_ffmpeg_available, execute_ffmpeg_command};
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscodeError {
    #[error("transcoder unavailable: {0}")]
    Unavailable(String),
    #[error("transcoding failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Re-encodes the MJPEG stream at `input` into `output`, whose extension
    /// selects the container.
    async fn transcode(&self, input: &Path, output: &Path, fps: u32)
        -> Result<(), TranscodeError>;
}

pub struct FfmpegTranscoder {
    binary: String,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
        }
    }
}

impl FfmpegTranscoder {
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn codec_args(format: &str) -> &'static [&'static str] {
        match format {
            "mp4" | "mov" | "mkv" => &["-c:v", "libx264", "-pix_fmt", "yuv420p", "-crf", "23"],
            "webm" => &["-c:v", "libvpx-vp9", "-b:v", "0", "-crf", "32"],
            "gif" => &["-vf", "scale=iw/2:-1"],
            _ => &[],
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        fps: u32,
    ) -> Result<(), TranscodeError> {
        check_ffmpeg_available(&self.binary)
            .await
            .map_err(TranscodeError::Unavailable)?;

        let format = output
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();

        tracing::info!(
            "🎞️ Converting capture from mjpeg to {} ({} fps)",
            format,
            fps
        );

        let mut command = Command::new(&self.binary);
        command
            .arg("-y")
            .arg("-f")
            .arg("mjpeg")
            .arg("-framerate")
            .arg(fps.to_string())
            .arg("-i")
            .arg(input)
            .args(Self::codec_args(&format))
            .arg("-r")
            .arg(fps.to_string())
            .arg(output);

        execute_ffmpeg_command(command)
            .await
            .map(|_| ())
            .map_err(TranscodeError::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let transcoder = FfmpegTranscoder::with_binary("no-such-ffmpeg-here");
        let err = transcoder
            .transcode(Path::new("in.mjpeg"), Path::new("out.mp4"), 30)
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::Unavailable(_)));
    }

    #[test]
    fn test_codec_selection() {
        assert!(FfmpegTranscoder::codec_args("mp4").contains(&"libx264"));
        assert!(FfmpegTranscoder::codec_args("webm").contains(&"libvpx-vp9"));
        assert!(FfmpegTranscoder::codec_args("avi").is_empty());
    }
}
