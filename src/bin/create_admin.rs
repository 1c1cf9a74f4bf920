use std::io::{self, Write};

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use validator::Validate;

use accounts_api::auth::{AuthError, PasswordPolicy, PasswordService, Role};
use accounts_api::users::{NewAccount, NewUser, PgUserStore, UserStore};

#[derive(Parser, Debug)]
#[command(name = "create_admin", about = "Create an administrator account")]
struct Args {
    /// Email address for the account (stored exactly as given).
    #[arg(long)]
    email: String,

    /// Plaintext password; must satisfy the password strength rules.
    #[arg(long)]
    password: String,

    /// Display name for the account.
    #[arg(long, default_value = "System Administrator")]
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    let account = NewAccount {
        name: args.name,
        email: args.email.trim().to_string(),
        password: args.password,
        role: Some(Role::Admin),
    };

    if let Err(errors) = account.validate() {
        writeln!(io::stderr(), "error: {}", AuthError::from(errors))?;
        std::process::exit(1);
    }

    if let Err(err) = PasswordPolicy::new().validate_strength(
        &account.password,
        Some(&account.email),
        Some(&account.name),
    ) {
        writeln!(io::stderr(), "error: {err}")?;
        std::process::exit(1);
    }

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;
    accounts_api::db::run_migrations(&pool).await?;
    let store = PgUserStore::new(pool);

    let password_hash = PasswordService::new()?.hash_password(&account.password)?;
    let email = account.email;
    let created = store
        .create(NewUser {
            name: account.name,
            email: email.clone(),
            password_hash,
            role: Role::Admin,
        })
        .await;

    match created {
        Ok(user) => {
            println!("Created admin user '{}' with id {}", user.email, user.id);
            Ok(())
        }
        Err(AuthError::Conflict(_)) => {
            writeln!(io::stderr(), "error: a user with email '{email}' already exists.")?;
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}
