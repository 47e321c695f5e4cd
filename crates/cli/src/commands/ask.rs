//! `agentdesk ask`: One-shot query through the request router.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use agentdesk_agent::{AgentRegistry, RequestRouter};
use agentdesk_config::AppConfig;
use agentdesk_core::conversation::{Attachment, GenerationRequest, Outcome};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

pub async fn run(
    agent: String,
    query: String,
    vision: bool,
    images: Vec<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let providers = agentdesk_providers::build_from_config(&config)?;
    let provider = providers.default().ok_or("No default provider configured")?;
    let registry = Arc::new(AgentRegistry::from_config(&config));
    let router = RequestRouter::from_config(provider, registry, &config);

    if !images.is_empty() && !vision {
        eprintln!("  Note: images are only sent with --vision");
    }

    let attachments = images
        .iter()
        .map(PathBuf::as_path)
        .map(read_image)
        .collect::<Result<Vec<_>, _>>()?;

    let mut request = GenerationRequest::new(agent, query);
    request.use_vision_model = vision;
    request.attachments = attachments;

    let result = router.ask(request).await?;
    println!("{}", result.text);
    eprintln!();
    eprintln!("  agent: {}  model: {}", result.agent_used, result.model_used);
    if result.outcome == Outcome::Degraded {
        eprintln!("  images could not be processed; answer is text-only");
    }

    Ok(())
}

/// Read an image file into a base64 attachment.
fn read_image(path: &Path) -> Result<Attachment, String> {
    let bytes =
        std::fs::read(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut attachment = Attachment::image(name, None, STANDARD.encode(&bytes));
    attachment.size_bytes = Some(bytes.len() as u64);
    Ok(attachment)
}
