//! KidsGPT CLI - a command-line front end for the KidsGPT backend.
//!
//! # Usage
//!
//! ```bash
//! # Parent login and child management
//! kidsgpt auth login -e parent@example.com
//! kidsgpt children create -n Maya -a 8
//! kidsgpt children select 3
//!
//! # Chat as the selected child
//! kidsgpt chat send "why is the sky blue?"
//!
//! # Kid login on a shared device
//! kidsgpt auth kid-login -p 482916
//! ```
//!
//! # Commands
//!
//! - `auth` - Login, logout, session inspection
//! - `children` - Child profile management (parent session)
//! - `chat` - Chat and conversation history
//! - `admin` - Platform oversight (admin session)
//!
//! # Environment Variables
//!
//! - `KIDSGPT_API_URL` - Backend base URL (default `http://localhost:8000/api`)
//! - `KIDSGPT_STATE_DIR` - Session storage directory (default `~/.kidsgpt`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use kidsgpt_client::api::types::ChildUpdate;
use kidsgpt_client::session::TokenStore;
use kidsgpt_client::{ApiClient, AuthSessionManager, ClientConfig};

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "kidsgpt")]
#[command(author, version, about = "KidsGPT command-line client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Login, logout, and session inspection
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Manage child profiles (parent session)
    Children {
        #[command(subcommand)]
        action: ChildrenAction,
    },
    /// Chat and conversation history
    Chat {
        #[command(subcommand)]
        action: ChatAction,
    },
    /// Platform oversight (admin session)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Log in a parent or admin by email
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Log in with an identity-provider ID token
    TokenLogin {
        /// The raw ID token
        #[arg(short, long)]
        token: String,

        /// Display name for first-time logins
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Register a new parent account
    Register {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Log a child in with their PIN
    KidLogin {
        /// Six-digit PIN
        #[arg(short, long)]
        pin: String,
    },
    /// Log out and clear the stored session
    Logout,
    /// Show the current session
    Whoami,
    /// Switch portal (`kids`, `parent`, `admin`)
    SwitchPortal {
        /// Target portal
        portal: String,
    },
}

#[derive(Subcommand)]
enum ChildrenAction {
    /// List children with usage stats
    List,
    /// Create a child profile
    Create {
        /// Child's name
        #[arg(short, long)]
        name: String,

        /// Child's age
        #[arg(short, long)]
        age: u8,

        /// Interests, repeatable
        #[arg(short, long)]
        interest: Vec<String>,

        /// Daily message limit (backend default if omitted)
        #[arg(long)]
        daily_limit: Option<u32>,
    },
    /// Show one child in detail
    Show {
        /// Child ID
        id: i64,
    },
    /// Update a child profile
    Update {
        /// Child ID
        id: i64,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New age
        #[arg(short, long)]
        age: Option<u8>,

        /// New daily message limit
        #[arg(long)]
        daily_limit: Option<u32>,

        /// Activate or deactivate the profile
        #[arg(long)]
        active: Option<bool>,
    },
    /// Delete a child profile and its history
    Remove {
        /// Child ID
        id: i64,
    },
    /// Issue a fresh login PIN
    RegeneratePin {
        /// Child ID
        id: i64,
    },
    /// Focus chat and history commands on one child
    Select {
        /// Child ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum ChatAction {
    /// Send a message and print the reply
    Send {
        /// The message text
        message: String,

        /// Continue an existing conversation
        #[arg(short, long)]
        conversation: Option<i64>,
    },
    /// Show today's usage for the active child
    Today,
    /// List the selected child's conversations
    History {
        /// Page size
        #[arg(long, default_value_t = 20)]
        limit: u32,

        /// Page offset
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Print one conversation in full
    Show {
        /// Conversation ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Show platform-wide aggregates
    Stats,
    /// List user accounts
    Users {
        /// Page size
        #[arg(long, default_value_t = 50)]
        limit: u32,

        /// Page offset
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Show the platform configuration
    Config,
    /// Update parts of the platform configuration
    SetConfig {
        /// New default daily message limit
        #[arg(long)]
        daily_limit: Option<u32>,

        /// New content filter level (`strict`, `moderate`)
        #[arg(long)]
        filter_level: Option<String>,
    },
    /// Change a user's subscription tier
    SetTier {
        /// User ID
        #[arg(short, long)]
        user: i64,

        /// Tier (`free`, `basic`, `premium`)
        #[arg(short, long)]
        tier: String,
    },
    /// Flip a user between active and deactivated
    ToggleActive {
        /// User ID
        user: i64,
    },
    /// List conversations flagged for review
    Flagged {
        /// Maximum number to show
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Bootstrap the first admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let api = ApiClient::new(&config);
    let store = TokenStore::new(&config.state_dir);
    let ctx = Context {
        sessions: AuthSessionManager::new(api, store),
    };

    match cli.command {
        Commands::Auth { action } => match action {
            AuthAction::Login { email } => commands::auth::login(&ctx, &email).await?,
            AuthAction::TokenLogin { token, name } => {
                commands::auth::login_with_token(&ctx, token, name.as_deref()).await?;
            }
            AuthAction::Register { email, name } => {
                commands::auth::register(&ctx, &email, name.as_deref()).await?;
            }
            AuthAction::KidLogin { pin } => commands::auth::kid_login(&ctx, &pin).await?,
            AuthAction::Logout => commands::auth::logout(&ctx),
            AuthAction::Whoami => commands::auth::whoami(&ctx).await?,
            AuthAction::SwitchPortal { portal } => commands::auth::switch_portal(&ctx, &portal)?,
        },
        Commands::Children { action } => match action {
            ChildrenAction::List => commands::children::list(&ctx).await?,
            ChildrenAction::Create {
                name,
                age,
                interest,
                daily_limit,
            } => commands::children::create(&ctx, &name, age, interest, daily_limit).await?,
            ChildrenAction::Show { id } => commands::children::show(&ctx, id).await?,
            ChildrenAction::Update {
                id,
                name,
                age,
                daily_limit,
                active,
            } => {
                let update = ChildUpdate {
                    name,
                    age,
                    daily_message_limit: daily_limit,
                    is_active: active,
                    ..ChildUpdate::default()
                };
                commands::children::update(&ctx, id, update).await?;
            }
            ChildrenAction::Remove { id } => commands::children::remove(&ctx, id).await?,
            ChildrenAction::RegeneratePin { id } => {
                commands::children::regenerate_pin(&ctx, id).await?;
            }
            ChildrenAction::Select { id } => commands::children::select(&ctx, id).await?,
        },
        Commands::Chat { action } => match action {
            ChatAction::Send {
                message,
                conversation,
            } => commands::chat::send(&ctx, &message, conversation).await?,
            ChatAction::Today => commands::chat::today(&ctx).await?,
            ChatAction::History { limit, offset } => {
                commands::chat::history(&ctx, limit, offset).await?;
            }
            ChatAction::Show { id } => commands::chat::show(&ctx, id).await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::Stats => commands::admin::stats(&ctx).await?,
            AdminAction::Users { limit, offset } => {
                commands::admin::users(&ctx, limit, offset).await?;
            }
            AdminAction::Config => commands::admin::show_config(&ctx).await?,
            AdminAction::SetConfig {
                daily_limit,
                filter_level,
            } => commands::admin::set_config(&ctx, daily_limit, filter_level).await?,
            AdminAction::SetTier { user, tier } => {
                commands::admin::set_tier(&ctx, user, &tier).await?;
            }
            AdminAction::ToggleActive { user } => {
                commands::admin::toggle_active(&ctx, user).await?;
            }
            AdminAction::Flagged { limit } => commands::admin::flagged(&ctx, limit).await?,
            AdminAction::Create { email, name } => {
                commands::admin::create(&ctx, &email, &name).await?;
            }
        },
    }
    Ok(())
}
