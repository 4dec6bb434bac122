//! Audio conversion for the voice pipeline.
//!
//! ffmpeg does the format work (OGG Opus from Telegram in, OGG Opus back
//! out). Every intermediate file lives behind a `TempAudio` guard, so the
//! disk is clean after each step whichever branch ran.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

static SEQ: AtomicU64 = AtomicU64::new(0);

/// A temp file path removed on drop.
pub struct TempAudio {
    path: PathBuf,
}

impl TempAudio {
    pub fn new(label: &str, ext: &str) -> Self {
        let n = SEQ.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "omnibot_{label}_{}_{n}.{ext}",
            std::process::id()
        ));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempAudio {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Convert OGG Opus audio to 16KHz mono f32 PCM samples for Whisper.
pub fn ogg_to_pcm(ogg_data: &[u8]) -> Result<Vec<f32>, String> {
    // ffmpeg needs seekable input for OGG, so the clip goes through a file.
    let input = TempAudio::new("stt_in", "ogg");
    std::fs::write(input.path(), ogg_data)
        .map_err(|e| format!("Failed to write temp input: {e}"))?;

    // Output format: 16-bit signed little-endian, 16KHz, mono, to stdout.
    let output = Command::new("ffmpeg")
        .args([
            "-i",
            input.path().to_str().ok_or("Invalid temp path")?,
            "-ar",
            "16000",
            "-ac",
            "1",
            "-f",
            "s16le",
            "-acodec",
            "pcm_s16le",
            "-y",
            "pipe:1",
        ])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .output()
        .map_err(|e| format!("Failed to run ffmpeg: {e}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("ffmpeg failed: {stderr}"));
    }

    let samples: Vec<f32> = output
        .stdout
        .chunks_exact(2)
        .map(|chunk| {
            let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
            sample as f32 / 32768.0
        })
        .collect();

    debug!("Converted {} bytes of OGG to {} PCM samples", ogg_data.len(), samples.len());
    Ok(samples)
}

/// Convert WAV audio to OGG Opus for a Telegram voice message.
///
/// Pads 300ms of silence at the start; Telegram clips the first ~200ms of
/// voice playback.
pub fn wav_to_ogg(wav_data: &[u8]) -> Result<Vec<u8>, String> {
    let input = TempAudio::new("tts_in", "wav");
    let output_file = TempAudio::new("tts_out", "ogg");

    std::fs::write(input.path(), wav_data)
        .map_err(|e| format!("Failed to write temp WAV: {e}"))?;

    let output = Command::new("ffmpeg")
        .args([
            "-y",
            "-f",
            "lavfi",
            "-i",
            "anullsrc=r=44100:cl=mono",
            "-i",
            input.path().to_str().ok_or("Invalid temp path")?,
            "-filter_complex",
            "[0]atrim=0:0.3[silence];[silence][1:a]concat=n=2:v=0:a=1",
            "-c:a",
            "libopus",
            "-b:a",
            "64k",
            output_file.path().to_str().ok_or("Invalid temp path")?,
        ])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .output()
        .map_err(|e| format!("Failed to run ffmpeg: {e}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("ffmpeg conversion failed: {stderr}"));
    }

    let ogg_data = std::fs::read(output_file.path())
        .map_err(|e| format!("Failed to read OGG output: {e}"))?;

    debug!("Converted WAV ({} bytes) to OGG ({} bytes)", wav_data.len(), ogg_data.len());
    Ok(ogg_data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_audio_removed_on_drop() {
        let path = {
            let tmp = TempAudio::new("test", "bin");
            std::fs::write(tmp.path(), b"data").unwrap();
            assert!(tmp.path().exists());
            tmp.path().to_path_buf()
        };
        assert!(!path.exists(), "temp file should be gone after drop");
    }

    #[test]
    fn test_temp_audio_drop_tolerates_missing_file() {
        // Guard for a file that was never written; drop must not panic.
        let tmp = TempAudio::new("test_missing", "bin");
        assert!(!tmp.path().exists());
        drop(tmp);
    }

    #[test]
    fn test_temp_audio_cleanup_on_error_branch() {
        // Mimic a failing pipeline step: the guard still cleans up when the
        // function exits early with an error.
        fn failing_step(tmp: &TempAudio) -> Result<(), String> {
            std::fs::write(tmp.path(), b"partial").unwrap();
            Err("decode failed".into())
        }

        let path = {
            let tmp = TempAudio::new("test_err", "bin");
            let result = failing_step(&tmp);
            assert!(result.is_err());
            tmp.path().to_path_buf()
        };
        assert!(!path.exists(), "temp file should be gone even after a failure");
    }

    #[test]
    fn test_temp_audio_paths_are_unique() {
        let a = TempAudio::new("test", "bin");
        let b = TempAudio::new("test", "bin");
        assert_ne!(a.path(), b.path());
    }
}
