use clap::Subcommand;
use colored::*;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use inquire::Confirm;
use seva_client::{ChatSession, Sender};
use uuid::Uuid;

use super::context::build_client;
use super::format::{format_date, format_datetime, truncate};

#[derive(Subcommand)]
pub enum SessionsCommands {
    /// List conversation sessions
    List {
        /// Page to fetch
        #[arg(long, default_value = "1")]
        page: u32,
        /// Sessions per page
        #[arg(long, default_value = "20")]
        page_size: u32,
    },
    /// Show a session transcript
    Show {
        /// Session ID to show
        id: Uuid,
    },
    /// Delete a session
    Delete {
        /// Session ID to delete
        id: Uuid,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn handle_sessions_command(
    command: SessionsCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        SessionsCommands::List { page, page_size } => list_sessions(page, page_size).await,
        SessionsCommands::Show { id } => show_session(id).await,
        SessionsCommands::Delete { id, yes } => delete_session_cmd(id, yes).await,
    }
}

async fn list_sessions(page: u32, page_size: u32) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_client().await?;
    let listing = client.chat().sessions(page, page_size).await?;

    if listing.sessions.is_empty() {
        println!("{}", "No conversation sessions found".yellow());
        println!("{}", "Use 'seva chat' to start a conversation".dimmed());
        return Ok(());
    }

    println!("{}", "💬 Conversation Sessions".blue().bold());
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec!["ID", "Title", "Started", "Messages", "Active"]);

    for session in &listing.sessions {
        table.add_row(vec![
            session.id.to_string(),
            truncate(session_title(session), 30),
            format_date(&session.started_at),
            session.message_count.to_string(),
            if session.is_active { "Yes" } else { "No" }.to_string(),
        ]);
    }

    println!("{}", table);

    let page_size = listing.page_size.max(1);
    let total_pages = ((listing.total + page_size - 1) / page_size).max(1);
    println!(
        "Page {} of {} ({} total)",
        listing.page,
        total_pages,
        listing.total.to_string().cyan()
    );

    Ok(())
}

async fn show_session(id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_client().await?;
    let detail = client.chat().session(id).await?;

    println!(
        "{}",
        format!("💬 {}", session_title(&detail.session)).blue().bold()
    );
    println!();
    println!("{:<15} {}", "ID:".cyan(), detail.session.id);
    println!(
        "{:<15} {}",
        "Started:".cyan(),
        format_datetime(&detail.session.started_at)
    );
    if let Some(ended) = &detail.session.ended_at {
        println!("{:<15} {}", "Ended:".cyan(), format_datetime(ended));
    }
    println!("{:<15} {}", "Messages:".cyan(), detail.session.message_count);
    println!();

    if detail.messages.is_empty() {
        println!("{}", "No messages in this session".yellow());
        return Ok(());
    }

    for message in &detail.messages {
        let speaker = match message.sender {
            Sender::User => "You:".cyan().bold(),
            Sender::Ai => "Seva:".green().bold(),
        };
        println!(
            "{} {} {}",
            format_datetime(&message.created_at).dimmed(),
            speaker,
            message.content
        );
    }

    Ok(())
}

async fn delete_session_cmd(
    id: Uuid,
    skip_confirmation: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_client().await?;
    let detail = client.chat().session(id).await?;

    let confirmed = if skip_confirmation {
        true
    } else {
        Confirm::new(&format!(
            "Delete '{}' and its {} messages?",
            session_title(&detail.session),
            detail.session.message_count
        ))
        .with_default(false)
        .prompt()?
    };

    if confirmed {
        client.chat().delete_session(id).await?;
        println!("{}", "✅ Session deleted".green());
    } else {
        println!("{}", "Operation cancelled".yellow());
    }

    Ok(())
}

fn session_title(session: &ChatSession) -> &str {
    session.title.as_deref().unwrap_or("Untitled")
}
