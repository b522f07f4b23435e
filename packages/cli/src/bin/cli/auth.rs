use colored::*;
use inquire::{Password, PasswordDisplayMode, Text};
use seva_client::{ClientError, User};

use super::context::build_client;
use super::format::{format_date, format_datetime};

pub async fn handle_register_command(
    email: Option<String>,
    full_name: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "📝 Create a Seva account".blue().bold());
    println!();

    let email = match email {
        Some(e) => e,
        None => Text::new("Email:").prompt()?,
    };

    let full_name = match full_name {
        Some(n) => n,
        None => Text::new("Full name:").prompt()?,
    };

    let password = Password::new("Password:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Minimum 8 characters")
        .prompt()?;

    if password.len() < 8 {
        eprintln!("{}", "❌ Password must be at least 8 characters".red());
        return Err("Password too short".into());
    }

    let password_confirm = Password::new("Confirm password:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;

    if password != password_confirm {
        eprintln!("{}", "❌ Passwords do not match".red());
        return Err("Passwords do not match".into());
    }

    let client = build_client().await?;
    let user = client
        .auth()
        .register(&email, &password, &full_name)
        .await?;

    println!();
    println!(
        "{}",
        format!("✅ Account created for {}", user.email).green()
    );
    println!("{}", "Use 'seva login' to sign in".dimmed());

    Ok(())
}

pub async fn handle_login_command(
    email: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "🔐 Sign in to Seva".blue().bold());
    println!();

    let email = match email {
        Some(e) => e,
        None => Text::new("Email:").prompt()?,
    };

    let password = Password::new("Password:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;

    let client = build_client().await?;

    match client.auth().login(&email, &password).await {
        Ok(_) => {
            println!();
            println!("{}", format!("✅ Signed in as {}", email).green());
            Ok(())
        }
        Err(ClientError::Unauthorized(_)) => {
            eprintln!("{}", "❌ Invalid email or password".red());
            Err("Login failed".into())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn handle_logout_command() -> Result<(), Box<dyn std::error::Error>> {
    let client = build_client().await?;

    if !client.auth().is_authenticated().await? {
        println!("{}", "No active session".yellow());
        return Ok(());
    }

    client.auth().logout().await?;
    println!("{}", "✅ Signed out, local session cleared".green());

    Ok(())
}

pub async fn handle_whoami_command() -> Result<(), Box<dyn std::error::Error>> {
    let client = build_client().await?;

    match client.auth().me().await {
        Ok(user) => {
            println!("{}", "👤 Signed-in user".blue().bold());
            println!();
            print_user_details(&user);
            Ok(())
        }
        Err(e) if e.is_auth_error() => {
            eprintln!("{}", "Not signed in".yellow());
            eprintln!("{}", "Use 'seva login' to sign in".dimmed());
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_user_details(user: &User) {
    println!("{:<15} {}", "Email:".cyan(), user.email);
    println!("{:<15} {}", "Name:".cyan(), user.full_name);
    println!("{:<15} {}", "Role:".cyan(), user.role);

    let verified = if user.is_verified {
        "Yes".green()
    } else {
        "No".yellow()
    };
    println!("{:<15} {}", "Verified:".cyan(), verified);
    println!(
        "{:<15} {}",
        "Member since:".cyan(),
        format_date(&user.created_at)
    );

    if let Some(last_login) = &user.last_login_at {
        println!("{:<15} {}", "Last login:".cyan(), format_datetime(last_login));
    }

    if let Some(profile) = &user.profile {
        if let Some(phone) = &profile.phone_number {
            println!("{:<15} {}", "Phone:".cyan(), phone);
        }
        if let Some(contact) = &profile.emergency_contact_name {
            println!("{:<15} {}", "Emergency:".cyan(), contact);
        }
    }
}
