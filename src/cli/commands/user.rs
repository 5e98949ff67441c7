use serde_json::json;

use crate::auth::{PasswordService, Role, TokenService};
use crate::cli::utils::{output_field, output_success};
use crate::cli::OutputFormat;
use crate::services::AuthService;

pub fn hash_password(password: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let digest = PasswordService::new().hash(password)?;

    match output_format {
        OutputFormat::Json => output_success(output_format, "Password hashed", Some(json!({ "hash": digest }))),
        // Bare digest so it can be piped into SQL
        OutputFormat::Text => {
            println!("{}", digest);
            Ok(())
        }
    }
}

/// Bootstraps an account, skipping the special-password gate that
/// `/register` applies to privileged roles.
pub async fn create_user(
    username: &str,
    password: &str,
    role: Role,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let (config, store) = super::open_store().await?;
    store.migrate().await?;

    let tokens = TokenService::new(&config.security.jwt_secret, config.security.jwt_expiry_hours)?;
    let auth = AuthService::new(store.clone(), tokens, &config.security);

    let result = auth.create_user(username, password, role).await;
    store.close().await;
    let profile = result?;

    output_success(
        output_format,
        &format!("Created user '{}'", profile.username),
        Some(serde_json::to_value(&profile)?),
    )?;
    output_field(output_format, "ID", &profile.id.to_string());
    output_field(output_format, "Role", profile.role.as_str());
    Ok(())
}
