use colored::*;

use super::context::build_client;

pub async fn handle_health_command() -> Result<(), Box<dyn std::error::Error>> {
    let client = build_client().await?;

    match client.health().await {
        Ok(health) => {
            let service = health.service.as_deref().unwrap_or("seva-backend");
            let version = health.version.as_deref().unwrap_or("unknown");

            println!(
                "{} {} is {} ({})",
                "✅".green(),
                service.bold(),
                health.status.green(),
                version
            );
            println!("{} {}", "Endpoint:".cyan(), client.config().api_base_url);
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "❌ Backend unreachable:".red(), e);
            eprintln!("{} {}", "Endpoint:".cyan(), client.config().api_base_url);
            Err(e.into())
        }
    }
}
