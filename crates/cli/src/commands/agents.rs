//! `agentdesk agents`: Print the agent catalog.

use agentdesk_agent::AgentRegistry;
use agentdesk_config::AppConfig;

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let registry = AgentRegistry::from_config(&config);

    if json {
        let agents = serde_json::json!({ "agents": registry.list_all() });
        println!("{}", serde_json::to_string_pretty(&agents)?);
        return Ok(());
    }

    println!("Available agents");
    println!("================");
    for agent in registry.descriptors() {
        let vision = if agent.vision_capable { " [vision]" } else { "" };
        println!("  {:<10} {}{vision}", agent.id, agent.display_name);
        println!("  {:<10} {} ({})", "", agent.description, agent.model);
    }

    Ok(())
}
