//! Companion binary: create a staff + superuser account from the command
//! line, e.g. `createsuperuser admin@example.com s3cret`.

use anyhow::{bail, Context};
use sqlx::postgres::PgPoolOptions;

use recipebox::auth::password::{hash_password, MIN_PASSWORD_LEN};
use recipebox::auth::repo::{is_valid_email, normalize_email, User};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()))
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(email), Some(password)) = (args.next(), args.next()) else {
        bail!("usage: createsuperuser <email> <password>");
    };
    let email = normalize_email(&email);
    if email.is_empty() {
        bail!("user must have an email address");
    }
    if !is_valid_email(&email) {
        bail!("enter a valid email address");
    }
    if password.len() < MIN_PASSWORD_LEN {
        bail!("password must be at least {MIN_PASSWORD_LEN} characters");
    }

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let db = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .context("connect to database")?;

    let hash = hash_password(&password)?;
    let user = User::create_superuser(&db, &email, &hash).await?;
    println!("superuser {} created (id {})", user.email, user.id);
    Ok(())
}
