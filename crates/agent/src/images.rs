//! Image payload normalization for the vision path.
//!
//! Attachments arrive as raw base64 or as `data:` URLs with whatever MIME
//! information the client bothered to send. Everything is reduced to a clean
//! base64 payload plus a data URL the provider accepts inline.

use agentdesk_config::VisionConfig;
use agentdesk_core::conversation::Attachment;
use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use tracing::{debug, warn};

const FALLBACK_MIME: &str = "image/jpeg";

/// Standard alphabet, trailing `=` optional.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// An image ready to be sent to a vision model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub name: String,
    pub mime_type: String,
    /// Base64 without prefix or whitespace.
    pub payload: String,
    /// `data:<mime>;base64,<payload>`
    pub data_url: String,
}

/// Why an image attachment was left out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("attachment has no data")]
    Empty,

    #[error("payload is not valid base64")]
    InvalidBase64,

    #[error("payload is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("more than {0} images attached")]
    OverLimit(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedImage {
    pub name: String,
    pub reason: SkipReason,
}

/// Result of normalizing a request's attachments.
#[derive(Debug, Clone, Default)]
pub struct NormalizedImages {
    pub images: Vec<NormalizedImage>,
    pub skipped: Vec<SkippedImage>,
}

impl NormalizedImages {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn data_urls(&self) -> Vec<String> {
        self.images.iter().map(|i| i.data_url.clone()).collect()
    }
}

/// Converts attachments into provider-ready images.
#[derive(Debug, Clone)]
pub struct ImagePayloadAdapter {
    max_images: usize,
    max_encoded_bytes: usize,
}

impl Default for ImagePayloadAdapter {
    fn default() -> Self {
        Self::new(&VisionConfig::default())
    }
}

impl ImagePayloadAdapter {
    pub fn new(config: &VisionConfig) -> Self {
        Self {
            max_images: config.max_images,
            max_encoded_bytes: config.max_encoded_bytes,
        }
    }

    /// Normalize the image attachments, ignoring everything else.
    ///
    /// Bad images are reported in `skipped`; this never fails.
    pub fn normalize(&self, attachments: &[Attachment]) -> NormalizedImages {
        let mut out = NormalizedImages::default();

        for attachment in attachments.iter().filter(|a| a.is_image()) {
            if out.images.len() >= self.max_images {
                out.skipped.push(SkippedImage {
                    name: attachment.name.clone(),
                    reason: SkipReason::OverLimit(self.max_images),
                });
                continue;
            }

            match self.normalize_one(attachment) {
                Ok(image) => {
                    debug!(
                        name = %image.name,
                        mime = %image.mime_type,
                        bytes = image.payload.len(),
                        "Normalized image"
                    );
                    out.images.push(image);
                }
                Err(reason) => {
                    warn!(name = %attachment.name, reason = %reason, "Skipping image attachment");
                    out.skipped.push(SkippedImage {
                        name: attachment.name.clone(),
                        reason,
                    });
                }
            }
        }

        out
    }

    fn normalize_one(&self, attachment: &Attachment) -> Result<NormalizedImage, SkipReason> {
        let raw = attachment.encoded_data.as_deref().unwrap_or_default();
        let (url_mime, body) = split_data_url(raw);

        let mut payload: String = body.chars().filter(|c| !c.is_whitespace()).collect();
        if payload.is_empty() {
            return Err(SkipReason::Empty);
        }
        if payload.len() > self.max_encoded_bytes {
            return Err(SkipReason::TooLarge {
                size: payload.len(),
                limit: self.max_encoded_bytes,
            });
        }
        if LENIENT.decode(&payload).is_err() {
            return Err(SkipReason::InvalidBase64);
        }
        while payload.len() % 4 != 0 {
            payload.push('=');
        }

        let mime_type = attachment
            .mime_type
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from)
            .or(url_mime)
            .or_else(|| guess_mime(&attachment.name))
            .unwrap_or_else(|| FALLBACK_MIME.to_string());

        let data_url = format!("data:{mime_type};base64,{payload}");
        Ok(NormalizedImage {
            name: attachment.name.clone(),
            mime_type,
            payload,
            data_url,
        })
    }
}

/// Split `data:<mime>;base64,<body>` into its MIME type and body.
/// Anything without a `data:` prefix is returned as the body.
fn split_data_url(raw: &str) -> (Option<String>, &str) {
    let trimmed = raw.trim_start();
    if !trimmed.starts_with("data:") {
        return (None, raw);
    }
    match trimmed.split_once(',') {
        Some((header, body)) => {
            let mime = header["data:".len()..]
                .split(';')
                .next()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from);
            (mime, body)
        }
        None => (None, ""),
    }
}

fn guess_mime(name: &str) -> Option<String> {
    mime_guess::from_path(name)
        .first()
        .filter(|m| m.type_() == mime_guess::mime::IMAGE)
        .map(|m| m.essence_str().to_string())
}
