// utils.rs - Output naming and FFmpeg process helpers
use lazy_static::lazy_static;
use regex::Regex;
use std::process::Stdio;
use tokio::process::Command;

lazy_static! {
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

/// Lowercase, dash-separated form of `name` that is safe in a file name.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let slug = NON_SLUG_CHARS.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "demo".to_string()
    } else {
        slug.to_string()
    }
}

/// `{slug}-{8 hex chars}`, distinct for every call so concurrent runs
/// sharing an output directory never overwrite each other.
pub fn unique_output_name(project_name: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", slugify(project_name), &id[..8])
}

/// Runs an FFmpeg command, returning stdout or the captured stderr on failure.
pub async fn execute_ffmpeg_command(mut command: Command) -> Result<String, String> {
    tracing::debug!("Executing FFmpeg: {:?}", command);

    // The child must not outlive a cancelled caller.
    let output = command
        .kill_on_drop(true)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| format!("Failed to execute FFmpeg: {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("FFmpeg error: {}", stderr));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Check if the FFmpeg binary can be started
pub async fn check_ffmpeg_available(binary: &str) -> Result<(), String> {
    let status = Command::new(binary)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => Ok(()),
        _ => Err(format!("{} not found. Please install FFmpeg.", binary)),
    }
}
