use anyhow::Context;
use serde_json::{json, Value};

use crate::cli::utils::{output_error, output_field, output_success};
use crate::cli::OutputFormat;

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Hits `/health` and reports the store status.
pub async fn ping(base_url: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let url = endpoint(base_url, "/health");
    let response = reqwest::get(&url)
        .await
        .with_context(|| format!("failed to reach {}", url))?;

    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    let database = body
        .get("database")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    if status.is_success() {
        output_success(
            output_format,
            &format!("{} is healthy", base_url),
            Some(json!({ "status": status.as_u16(), "health": body })),
        )?;
        output_field(output_format, "Database", &database);
        Ok(())
    } else {
        output_error(
            output_format,
            &format!("{} is unhealthy (HTTP {}, database {})", base_url, status.as_u16(), database),
            Some("SERVICE_UNAVAILABLE"),
        )?;
        anyhow::bail!("health check failed")
    }
}

/// Posts credentials to `/login` and prints the issued token.
pub async fn login(
    base_url: &str,
    username: &str,
    password: &str,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let url = endpoint(base_url, "/login");
    let response = reqwest::Client::new()
        .post(&url)
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .with_context(|| format!("failed to reach {}", url))?;

    let status = response.status();
    let body: Value = response
        .json()
        .await
        .context("server returned a non-JSON response")?;

    if !status.is_success() {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("Login failed");
        let code = body.get("code").and_then(Value::as_str);
        output_error(output_format, message, code)?;
        anyhow::bail!("login failed with HTTP {}", status.as_u16());
    }

    let token = body.get("token").and_then(Value::as_str).unwrap_or_default();
    let role = body.get("role").and_then(Value::as_str).unwrap_or_default();

    match output_format {
        OutputFormat::Json => output_success(output_format, "Login successful", Some(body.clone()))?,
        OutputFormat::Text => {
            output_success(output_format, &format!("Logged in as {} ({})", username, role), None)?;
            output_field(output_format, "Token", token);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::endpoint;

    #[test]
    fn joins_base_url_without_double_slash() {
        assert_eq!(endpoint("http://localhost:3000/", "/health"), "http://localhost:3000/health");
        assert_eq!(endpoint("http://localhost:3000", "/login"), "http://localhost:3000/login");
    }
}
