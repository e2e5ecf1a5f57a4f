use anyhow::{Context, Result};
use dossier_auth::{
    api::{self, LogResetSender},
    auth::{AuthState, MemoryUserStore},
    cli,
};
use std::sync::Arc;

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::start()?;

    let auth_state =
        Arc::new(AuthState::new(args.config).context("invalid auth configuration")?);
    let store = Arc::new(MemoryUserStore::new());
    let sender = Arc::new(LogResetSender);

    api::serve(args.port, auth_state, store, sender).await?;

    Ok(())
}
