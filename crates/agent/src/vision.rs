//! Vision degradation ladder.
//!
//! Strategies are tried in order until one succeeds. Only the last
//! strategy's failure is reported to the caller.

use agentdesk_core::message::Message;

use crate::images::NormalizedImages;

/// Marker prepended to answers produced without the attached images.
pub const DEGRADED_MARKER: &str = "⚠️";

/// One way of presenting images to a vision model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisionStrategy {
    /// Text part followed by every image.
    Multimodal,
    /// Text part followed by the first image only.
    FirstImage,
    /// Query annotated that images were received but not processed.
    TextOnly,
}

impl VisionStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Multimodal => "multimodal",
            Self::FirstImage => "first_image",
            Self::TextOnly => "text_only",
        }
    }

    /// Whether a success under this strategy counts as degraded.
    pub fn is_degraded(self) -> bool {
        self == Self::TextOnly
    }

    /// The ladder for a set of images, most capable first.
    pub fn ladder(images: &NormalizedImages) -> Vec<Self> {
        match images.images.len() {
            0 => vec![Self::TextOnly],
            1 => vec![Self::Multimodal, Self::TextOnly],
            _ => vec![Self::Multimodal, Self::FirstImage, Self::TextOnly],
        }
    }

    /// The user message this strategy sends.
    pub fn user_message(self, query: &str, images: &NormalizedImages) -> Message {
        match self {
            Self::Multimodal => Message::user_with_images(query, images.data_urls()),
            Self::FirstImage => Message::user_with_images(
                query,
                images.images.iter().take(1).map(|i| i.data_url.clone()),
            ),
            Self::TextOnly => Message::user(annotate(query, images)),
        }
    }

    /// Post-process the model's text for this strategy.
    pub fn finish(self, text: String) -> String {
        if self.is_degraded() {
            format!("{DEGRADED_MARKER} Images could not be processed; this answer is based on text only.\n\n{text}")
        } else {
            text
        }
    }
}

fn annotate(query: &str, images: &NormalizedImages) -> String {
    let received = images.images.len() + images.skipped.len();
    format!(
        "{query}\n\n[Note: the user attached {received} image(s) that could not be processed. Answer from the text alone.]"
    )
}
