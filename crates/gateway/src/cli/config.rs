use ic_domain::config::{Config, ConfigSeverity};

/// Parse and validate the config, printing any issues.
///
/// Returns `false` when errors were found (caller exits with code 1).
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();

    if issues.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let warning_count = issues.len() - error_count;

    for issue in &issues {
        println!("{issue}");
    }

    println!("\n{error_count} error(s), {warning_count} warning(s) in {config_path}");

    error_count == 0
}

/// Render the resolved config (defaults and env overrides applied) as TOML.
/// A plaintext `llm.auth.key` is masked.
pub fn render(config: &Config) -> Result<String, toml::ser::Error> {
    let mut redacted = config.clone();
    if redacted.llm.auth.key.is_some() {
        redacted.llm.auth.key = Some("********".into());
    }
    toml::to_string_pretty(&redacted)
}

pub fn show(config: &Config) -> anyhow::Result<()> {
    let output = render(config)?;
    print!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_masks_plaintext_key() {
        let mut config = Config::default();
        config.llm.auth.key = Some("sk-very-secret".into());
        let out = render(&config).unwrap();
        assert!(!out.contains("sk-very-secret"));
        assert!(out.contains("********"));
    }

    #[test]
    fn rendered_config_reparses() {
        let out = render(&Config::default()).unwrap();
        let back: Config = toml::from_str(&out).unwrap();
        assert_eq!(back.server.port, 3000);
    }
}
