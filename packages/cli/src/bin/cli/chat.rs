use colored::*;
use inquire::{InquireError, Text};
use seva_client::{ApiClient, ChatReply, ClientError};
use uuid::Uuid;

use super::context::build_client;

pub async fn handle_chat_command(
    message: Option<String>,
    session: Option<Uuid>,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_client().await?;

    if !client.auth().is_authenticated().await? {
        eprintln!("{}", "Not signed in".yellow());
        eprintln!("{}", "Use 'seva login' to sign in".dimmed());
        return Err("Not signed in".into());
    }

    match message {
        Some(text) => send_once(&client, &text, session).await,
        None => interactive_chat(&client, session).await,
    }
}

async fn send_once(
    client: &ApiClient,
    message: &str,
    session: Option<Uuid>,
) -> Result<(), Box<dyn std::error::Error>> {
    let reply = client.chat().send(message, session).await?;

    print_reply(&reply);
    println!();
    println!(
        "{} {}",
        "Session:".dimmed(),
        reply.session_id.to_string().dimmed()
    );

    Ok(())
}

async fn interactive_chat(
    client: &ApiClient,
    session: Option<Uuid>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "💬 Seva companion chat".blue().bold());
    println!("{}", "Type a message, or 'exit' to leave".dimmed());
    println!();

    let mut current_session = session;

    loop {
        let line = match Text::new("You:").prompt() {
            Ok(line) => line,
            Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            break;
        }

        match client.chat().send(trimmed, current_session).await {
            Ok(reply) => {
                current_session = Some(reply.session_id);
                println!("{} {}", "Seva:".green().bold(), reply.ai_message.content);
                println!();
            }
            Err(ClientError::Validation(msg)) => {
                eprintln!("{}", msg.yellow());
            }
            Err(e) if e.is_auth_error() => {
                eprintln!(
                    "{}",
                    "Session expired, sign in again with 'seva login'".red()
                );
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        }
    }

    if let Some(id) = current_session {
        println!();
        println!("{} {}", "Session:".dimmed(), id.to_string().dimmed());
    }
    println!("{}", "👋 Take care!".green());

    Ok(())
}

fn print_reply(reply: &ChatReply) {
    println!("{} {}", "You:".cyan().bold(), reply.user_message.content);
    println!("{} {}", "Seva:".green().bold(), reply.ai_message.content);
}
