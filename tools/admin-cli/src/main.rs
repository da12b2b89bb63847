//! Operator CLI for account bootstrap.
//!
//! # Usage
//!
//! ```bash
//! # Make the first administrator
//! cargo run -p citywatch-admin -- promote --username root
//!
//! # Mark an account verified without the mailed link
//! cargo run -p citywatch-admin -- verify --username alice
//! ```

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use sea_orm::Database;
use uuid::Uuid;

use citywatch_api::domain::repository::UserRepository;
use citywatch_api::domain::types::User;
use citywatch_api::infra::db::DbUserRepository;
use citywatch_core::tracing::init_tracing;
use citywatch_domain::user::ADMIN_ROLE;

#[derive(Parser)]
#[command(about = "Administer Citywatch accounts directly in the database")]
struct Args {
    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Grant the admin role to an account
    Promote {
        #[arg(long)]
        username: String,
    },
    /// Mark an account's email as verified
    Verify {
        #[arg(long)]
        username: String,
    },
}

async fn find_user(users: &DbUserRepository, username: &str) -> Result<User> {
    match users.find_by_username(username).await? {
        Some(user) => Ok(user),
        None => bail!("no account named {username:?}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();

    let db = Database::connect(&args.database_url)
        .await
        .context("connect to database")?;
    let users = DbUserRepository { db };

    match args.command {
        Command::Promote { username } => {
            let user = find_user(&users, &username).await?;
            users.update_role(user.id, ADMIN_ROLE).await?;
            tracing::info!(user_id = %user.id, %username, "granted admin role");
            println!("{username} is now {ADMIN_ROLE}");
        }
        Command::Verify { username } => {
            let user = find_user(&users, &username).await?;
            if user.email_verify {
                println!("{username} is already verified");
                return Ok(());
            }
            users.verify_email(user.verify_token, Uuid::new_v4()).await?;
            tracing::info!(user_id = %user.id, %username, "marked email verified");
            println!("{username} is verified");
        }
    }
    Ok(())
}
