#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use learngate::{
    gate::{ContentGate, GateType},
    oauth::{AuthIntent, AuthProvider, OAuthCallback},
    session::SessionSnapshot,
    settings::GateSettings,
    store::require_durable_store,
};

#[derive(Parser)]
#[command(name = "learngate", version, about = "OAuth + PKCE sign-in and content gating")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start an authorization attempt and print where to send the browser
    Authorize {
        /// signin or signup
        #[arg(long, default_value = "signin")]
        intent: AuthIntent,
    },
    /// Complete an attempt from the URL the provider redirected back to
    Callback {
        /// Full callback URL including `?code=...&state=...`
        url: String,
    },
    /// Print the gate view for a content type
    Gate {
        /// quiz, summary, exercise or premium
        #[arg(long = "type", default_value = "premium")]
        gate_type: GateType,
        /// Pretend a session exists
        #[arg(long)]
        signed_in: bool,
        /// Keep the gate locked regardless of session
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from Settings.toml and environment variables.
    // This also loads the .env file and initializes the logger.
    let settings = GateSettings::load().context("Failed to load settings")?;

    match cli.command {
        Command::Authorize { intent } => authorize(&settings, intent),
        Command::Callback { url } => callback(&settings, &url).await,
        Command::Gate {
            gate_type,
            signed_in,
            force,
        } => {
            print_gate(gate_type, signed_in, force);
            Ok(())
        }
    }
}

fn authorize(settings: &GateSettings, intent: AuthIntent) -> Result<()> {
    require_durable_store(settings)?;
    let provider = AuthProvider::from_settings(settings)?;
    let request = provider.authorization_url(intent)?;

    println!("state: {}", request.state);
    println!("code_challenge: {}", request.code_challenge);
    println!("{}", request.navigation_url(provider.config()));
    Ok(())
}

async fn callback(settings: &GateSettings, url: &str) -> Result<()> {
    require_durable_store(settings)?;
    let provider = AuthProvider::from_settings(settings)?;
    let callback = OAuthCallback::from_url(url)?;

    let (tokens, identity) = provider
        .complete_callback(&callback)
        .await
        .context("Sign-in could not be completed")?;

    println!("signed in as {}", identity.id);
    if let Some(email) = &identity.email {
        println!("email: {email}");
    }
    if let Some(expires_in) = tokens.expires_in {
        println!("access token expires in {expires_in}s");
    }
    Ok(())
}

fn print_gate(gate_type: GateType, signed_in: bool, force: bool) {
    let snapshot = if signed_in {
        SessionSnapshot::signed_in(learngate::Identity::new("cli-user"))
    } else {
        SessionSnapshot::signed_out()
    };

    let mut gate = ContentGate::new(gate_type, format!("<{gate_type} content>")).force_gate(force);
    let now = Utc::now();
    gate.apply(&snapshot, now);
    print!("{}", gate.view(now));
}
