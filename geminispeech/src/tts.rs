//! Speech synthesis call and wire types.

use aloud_audio::{PcmFormat, wav};
use aloud_speech::{AudioClip, CloudEngine, CloudError, redact_secret, truncate_chars};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::{Client, MAX_TEXT_CHARS};
use crate::Result;

/// Maximum characters of a non-success response body kept in an error.
const MAX_ERROR_BODY_CHARS: usize = 300;

// ================== Request ==================

/// `models:generateContent` request body for speech generation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<RequestContent>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestContent {
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextPart {
    pub text: String,
}

/// Audio-modality generation parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
    pub speech_config: SpeechConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

impl GenerateContentRequest {
    /// Builds a speech request, truncating `text` to [`MAX_TEXT_CHARS`].
    pub fn speech(text: &str, voice_name: &str) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![TextPart {
                    text: truncate_chars(text, MAX_TEXT_CHARS),
                }],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice_name.to_string(),
                        },
                    },
                },
            },
        }
    }
}

// ================== Response ==================

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(rename = "inlineData", alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: Option<String>,
    #[serde(rename = "mimeType", alias = "mime_type")]
    mime_type: Option<String>,
}

// ================== Synthesis ==================

impl Client {
    /// Synthesizes `text` with the named prebuilt voice.
    ///
    /// Text is truncated to [`MAX_TEXT_CHARS`] characters before sending;
    /// callers must not assume over-length input is spoken in full. Raw
    /// PCM replies (s16le mono 24 kHz) come back wrapped as `audio/wav`;
    /// any other MIME type passes through unchanged.
    pub async fn synthesize(
        &self,
        text: &str,
        voice_name: &str,
        api_key: &str,
    ) -> Result<AudioClip> {
        if api_key.is_empty() {
            return Err(CloudError::Config("no API key provided".into()));
        }
        if text.is_empty() {
            return Err(CloudError::Config("no text provided".into()));
        }

        let endpoint = self.endpoint(api_key)?;
        let body = GenerateContentRequest::speech(text, voice_name);

        debug!(voice = voice_name, chars = body.contents[0].parts[0].text.chars().count(),
            "requesting speech generation");

        let response = self
            .http
            .post(endpoint)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e, api_key))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let sanitized = truncate_chars(&redact_secret(&body, api_key),
                MAX_ERROR_BODY_CHARS);
            warn!(status = status.as_u16(), "speech generation rejected");
            return Err(CloudError::Api {
                status: status.as_u16(),
                body: sanitized,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|_| CloudError::Protocol("invalid JSON response".into()))?;

        let inline = extract_inline_audio(parsed)?;
        let bytes = BASE64
            .decode(inline.data.as_deref().unwrap_or_default())
            .map_err(|e| CloudError::Protocol(format!("bad base64 audio: {e}")))?;

        let mime = inline.mime_type.unwrap_or_default();
        Ok(repackage(bytes, &mime))
    }

    /// Maps a transport failure, scrubbing the key: reqwest errors can
    /// embed the full request URL, and the key rides in its query string.
    fn transport_error(&self, err: reqwest::Error, api_key: &str) -> CloudError {
        if err.is_timeout() {
            return CloudError::Timeout(self.timeout.as_secs());
        }
        CloudError::Network(redact_secret(&err.to_string(), api_key))
    }
}

/// Walks `candidates[0].content.parts[0].inlineData`; any missing level is
/// a protocol error.
fn extract_inline_audio(response: GenerateContentResponse) -> Result<InlineData> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| CloudError::Protocol("no candidates in response".into()))?;
    let content = candidate
        .content
        .ok_or_else(|| CloudError::Protocol("candidate has no content".into()))?;
    let part = content
        .parts
        .into_iter()
        .next()
        .ok_or_else(|| CloudError::Protocol("content has no parts".into()))?;
    let inline = part
        .inline_data
        .ok_or_else(|| CloudError::Protocol("no inline audio data in response".into()))?;
    if inline.data.as_deref().unwrap_or_default().is_empty() {
        return Err(CloudError::Protocol("no inline audio data in response".into()));
    }
    Ok(inline)
}

/// Returns true if the MIME type indicates raw PCM / LINEAR16.
fn is_pcm_mime(mime: &str) -> bool {
    let lower = mime.to_lowercase();
    lower.contains("pcm")
        || lower.contains("l16")
        || lower.contains("linear16")
        || lower == "audio/raw"
}

/// Wraps raw PCM replies in a WAV container; passes anything else through.
fn repackage(bytes: Vec<u8>, mime: &str) -> AudioClip {
    if mime.is_empty() || is_pcm_mime(mime) {
        let wav = wav::encode(&bytes, PcmFormat::S16LE_MONO_24K);
        AudioClip::new(wav, "audio/wav")
    } else {
        AudioClip::new(bytes, mime)
    }
}

#[async_trait]
impl CloudEngine for Client {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        api_key: &str,
    ) -> std::result::Result<AudioClip, CloudError> {
        Client::synthesize(self, text, voice, api_key).await
    }
}
