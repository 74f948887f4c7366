//! Interactive login against musicbrainz.org from a terminal.
//!
//! ```text
//! MUSICBRAINZ_OAUTH_CLIENT_ID=... MUSICBRAINZ_OAUTH_CLIENT_SECRET=... \
//!     cargo run -p core-auth --example desktop_login -- [login|logout|status]
//! ```

use anyhow::Context;
use bridge_desktop::{StdinPrompt, SystemBrowserLauncher};
use bridge_traits::time::LogLevel;
use core_auth::{CollectionReloader, LoginOutcome, OAuthSession, DEFAULT_SCOPES};
use core_runtime::config::CoreConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Info),
    )
    .context("failed to initialize logging")?;

    let settings_path = std::env::temp_dir().join("mbaccount").join("settings.db");
    let config = CoreConfig::builder()
        .settings_path(settings_path)
        .build()
        .context("invalid configuration")?;

    let session = OAuthSession::from_config(
        &config,
        Arc::new(SystemBrowserLauncher::new()),
        Arc::new(StdinPrompt::new()),
    )
    .await?;
    session.add_observer(Arc::new(CollectionReloader::new(|| {
        println!("(collections would reload here)")
    })));

    match std::env::args().nth(1).as_deref().unwrap_or("status") {
        "login" => {
            println!("Approve access in your browser, then paste the code below.");
            match session.login(DEFAULT_SCOPES).await? {
                LoginOutcome::LoggedIn { username } => {
                    println!("Logged in as {}", username.as_deref().unwrap_or("(unknown)"))
                }
                LoginOutcome::Cancelled => println!("Login cancelled"),
                LoginOutcome::Superseded => println!("Login abandoned"),
            }
        }
        "logout" => {
            session.logout().await;
            println!("Logged out");
        }
        _ => {
            let status = session.status();
            match (status.logged_in, status.username) {
                (true, Some(username)) => println!("Logged in as {}", username),
                (true, None) => println!("Logged in"),
                (false, _) => println!("Not logged in"),
            }
        }
    }

    Ok(())
}
