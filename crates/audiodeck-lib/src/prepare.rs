//! Pair preparation — turn a text file into numbered `.txt` / `.wav` pairs.
//!
//! Every non-empty line becomes `<NNN>.txt`; its speech is synthesized through
//! a Kokoro (OpenAI-compatible) `/v1/audio/speech` endpoint as raw PCM and
//! wrapped into `<NNN>.wav`. A failed synthesis is logged and skipped so one
//! bad line never stops the batch.

use std::path::Path;

use futures_util::StreamExt;
use tracing::{error, info};

use audiodeck_core::text_prep::{numbered_lines, preview};
use audiodeck_core::types::{Identifier, ResourceKind};
use audiodeck_core::wav::{PCM_SAMPLE_RATE, bytes_to_i16, write_wav};

use crate::config::TtsConfig;
use crate::error::PrepareError;

/// Outcome of one `prepare` run.
#[derive(Debug, Clone, Default)]
pub struct PrepareReport {
    /// Identifiers whose `.txt` was written, in order.
    pub written: Vec<Identifier>,
    /// Identifiers whose `.wav` could not be synthesized.
    pub audio_failures: Vec<Identifier>,
}

impl PrepareReport {
    /// The `count = N` catalog setting that lists exactly these pairs.
    pub fn count(&self) -> usize {
        self.written.len()
    }
}

/// Split `input` into numbered pairs under `out_dir`.
///
/// With `tts = None` only the text halves are written.
pub async fn prepare(
    input: &Path,
    out_dir: &Path,
    tts: Option<&TtsConfig>,
) -> Result<PrepareReport, PrepareError> {
    if !input.is_file() {
        return Err(PrepareError::InputMissing(input.to_path_buf()));
    }
    let text = tokio::fs::read_to_string(input).await?;
    let lines = numbered_lines(&text);
    if lines.is_empty() {
        return Err(PrepareError::NoLines(input.to_path_buf()));
    }

    tokio::fs::create_dir_all(out_dir).await?;
    info!("prepare: {} lines to process", lines.len());

    let client = reqwest::Client::new();
    let mut report = PrepareReport::default();
    let total = lines.len();

    for (i, (id, line)) in lines.into_iter().enumerate() {
        info!("prepare: {}/{total} '{}'", i + 1, preview(&line));

        let text_path = out_dir.join(id.file_name(ResourceKind::Text));
        tokio::fs::write(&text_path, &line).await?;
        report.written.push(id.clone());

        let Some(tts) = tts else {
            continue;
        };
        match synthesize(&client, tts, &line).await {
            Ok(wav) => {
                let audio_path = out_dir.join(id.file_name(ResourceKind::Audio));
                tokio::fs::write(&audio_path, wav).await?;
            }
            Err(e) => {
                error!("prepare: TTS failed for {id}: {e}");
                report.audio_failures.push(id);
            }
        }
    }

    info!(
        "prepare: wrote {} pairs to {} ({} without audio)",
        report.count(),
        out_dir.display(),
        report.audio_failures.len()
    );
    Ok(report)
}

/// POST one line to the speech endpoint and return a complete WAV file.
pub async fn synthesize(
    client: &reqwest::Client,
    tts: &TtsConfig,
    text: &str,
) -> Result<Vec<u8>, String> {
    let url = format!("{}/v1/audio/speech", tts.url.trim_end_matches('/'));
    let body = serde_json::json!({
        "input": text,
        "voice": tts.voice,
        "model": "kokoro",
        "response_format": "pcm",
        "stream": true,
        "speed": tts.speed,
    });

    let resp = client
        .post(&url)
        .json(&body)
        .send()
        .await
        .map_err(|e| format!("request failed: {e}"))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let detail = resp.text().await.unwrap_or_default();
        return Err(format!("TTS error {status}: {detail}"));
    }

    let mut samples = Vec::new();
    let mut leftover = None;
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| format!("stream error: {e}"))?;
        let (decoded, lo) = bytes_to_i16(&chunk, leftover.take());
        samples.extend(decoded);
        leftover = lo;
    }

    if samples.is_empty() {
        return Err("TTS returned no audio".into());
    }
    Ok(write_wav(&samples, PCM_SAMPLE_RATE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Json;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;

    /// Fake speech endpoint: 4 samples of PCM, or 500 for input containing "fail".
    async fn spawn_tts() -> TtsConfig {
        async fn speech(Json(body): Json<serde_json::Value>) -> axum::response::Response {
            let input = body["input"].as_str().unwrap_or_default();
            if input.contains("fail") {
                return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
            }
            vec![1u8, 0, 2, 0, 3, 0, 4, 0].into_response()
        }

        let app = Router::new().route("/v1/audio/speech", post(speech));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        TtsConfig {
            url: format!("http://{addr}"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn writes_numbered_text_only() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.txt");
        std::fs::write(&input, "Hello there.\n\n  Second line.  \n").unwrap();
        let out = dir.path().join("audio");

        let report = prepare(&input, &out, None).await.unwrap();

        assert_eq!(report.count(), 2);
        assert_eq!(std::fs::read_to_string(out.join("001.txt")).unwrap(), "Hello there.");
        assert_eq!(std::fs::read_to_string(out.join("002.txt")).unwrap(), "Second line.");
        assert!(!out.join("001.wav").exists());
    }

    #[tokio::test]
    async fn synthesizes_wav_and_skips_failures() {
        let tts = spawn_tts().await;
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.txt");
        std::fs::write(&input, "one\nthis will fail\nthree\n").unwrap();
        let out = dir.path().join("audio");

        let report = prepare(&input, &out, Some(&tts)).await.unwrap();

        assert_eq!(report.count(), 3);
        assert_eq!(report.audio_failures, vec![Identifier::ordinal(2)]);
        let wav = std::fs::read(out.join("001.wav")).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(wav.len(), 44 + 8);
        assert!(out.join("002.txt").exists());
        assert!(!out.join("002.wav").exists());
        assert!(out.join("003.wav").exists());
    }

    #[tokio::test]
    async fn rejects_missing_or_blank_input() {
        let dir = tempfile::tempdir().unwrap();
        let missing = prepare(&dir.path().join("nope.txt"), dir.path(), None).await;
        assert!(matches!(missing, Err(PrepareError::InputMissing(_))));

        let blank = dir.path().join("blank.txt");
        std::fs::write(&blank, "\n   \n").unwrap();
        let empty = prepare(&blank, dir.path(), None).await;
        assert!(matches!(empty, Err(PrepareError::NoLines(_))));
    }
}
