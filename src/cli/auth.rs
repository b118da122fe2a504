//! `register` and `sign-in` commands, plus the credential step shared by
//! every protected command.

use std::sync::Arc;

use anyhow::{Result, anyhow, bail};

use super::AuthArgs;
use crate::config::SyncConfig;
use crate::logger::{status_error, status_success};
use crate::remote::{Credentials, RemoteClient, describe_sign_in_error};

/// Bind credentials into `client`.
///
/// `--token/--user-id` are injected as-is; otherwise the configured
/// email/password sign in against the identity provider.
pub async fn authenticate(
    client: &RemoteClient,
    args: &AuthArgs,
    config: &SyncConfig,
) -> Result<Arc<Credentials>> {
    if let (Some(token), Some(user_id)) = (&args.token, &args.user_id) {
        client.set_auth(token, user_id);
        crate::debug!("auth"; "using supplied token for {}", user_id);
        return Ok(client.credentials()?);
    }

    let Some((email, password)) = config.auth.password_login() else {
        bail!("no credentials: pass --email and --password, or --token and --user-id");
    };

    match client.sign_in(email, password).await {
        Ok(credentials) => Ok(Arc::new(credentials)),
        Err(e) => {
            let friendly = describe_sign_in_error(&e);
            status_error("sign-in failed", &friendly);
            Err(anyhow!(friendly))
        }
    }
}

pub async fn sign_in(client: &RemoteClient, args: &AuthArgs, config: &SyncConfig) -> Result<()> {
    let credentials = authenticate(client, args, config).await?;
    println!("{}", credentials.user_id);
    status_success(&format!("signed in as {}", client.display_name()));
    Ok(())
}

pub async fn register(client: &RemoteClient, name: &str, config: &SyncConfig) -> Result<()> {
    let Some((email, password)) = config.auth.password_login() else {
        bail!("register needs --email and --password");
    };

    let (user, credentials) = client
        .register_and_sign_in(name, email, password)
        .await
        .inspect_err(|e| status_error("registration failed", &e.to_string()))?;

    println!("{}", credentials.user_id);
    status_success(&format!("registered {} <{}>", user.name, user.email));
    Ok(())
}
