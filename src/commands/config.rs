use anyhow::Result;
use colored::Colorize;
use cost_analytics::config::{self, Config};
use std::path::Path;
use tracing::info;

/// Execute the config show command
///
/// Displays the effective configuration with secrets masked
pub fn show(path: &Path) -> Result<()> {
    println!("{}", "Loading configuration...".yellow());
    info!(path = %path.display(), "Loading configuration for display");

    let cfg = config::load_config(path)?;
    let sanitized = sanitize_secrets(&cfg);

    println!("{}", "Current Configuration:".green().bold());
    println!();

    let toml_string = toml::to_string_pretty(&sanitized)?;
    println!("{}", toml_string);

    Ok(())
}

/// Execute the config validate command
pub fn validate(path: &Path) -> Result<()> {
    println!("{}", "Validating configuration...".yellow());
    info!(path = %path.display(), "Validating configuration file");

    let cfg = config::load_config(path)?;

    println!("{}", "✓ Configuration is valid".green());
    println!();
    println!("{}", "Summary:".bold());
    println!("  {}: {}:{}", "Server".cyan(), cfg.server.host, cfg.server.port);
    println!("  {}: {} ({})", "Log Level".cyan(), cfg.server.log_level, cfg.server.log_format);
    println!("  {}: {}", "Static Dir".cyan(), cfg.server.static_dir.display());
    println!(
        "  {}: {}",
        "Report Hosts".cyan(),
        cfg.azure.allowed_report_hosts.join(", ")
    );

    // Credentials are optional at startup; report what the remote routes will see
    let credentials = match cfg.azure.subscription_credentials(None) {
        Ok(_) => "complete".green(),
        Err(e) => e.to_string().yellow(),
    };
    println!("  {}: {}", "Credentials".cyan(), credentials);

    Ok(())
}

/// Sanitize secrets in configuration for safe display
fn sanitize_secrets(cfg: &Config) -> Config {
    let mut sanitized = cfg.clone();
    sanitized.azure.client_secret = sanitized
        .azure
        .client_secret
        .as_deref()
        .map(mask_secret);
    sanitized
}

/// Mask a secret for safe display
///
/// Shows first 4 and last 4 characters with dots in between
/// Example: "abcd1234efgh5678" -> "abcd...5678"
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "***".to_string();
    }

    let prefix: String = chars[..4].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();

    format!("{}...{}", prefix, suffix)
}
