use cp_domain::config::{Config, ConfigSeverity};

/// Validate the config and print any issues. Returns `false` on errors.
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

/// Render the resolved config (with all defaults filled in) as TOML.
pub fn render(config: &Config) -> anyhow::Result<String> {
    toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("serializing config: {e}"))
}

pub fn show(config: &Config) -> anyhow::Result<()> {
    print!("{}", render(config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_render_and_parse_back() {
        let rendered = render(&Config::default()).unwrap();
        assert!(rendered.contains("[cache]"));
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.cache.ttl_hours, Config::default().cache.ttl_hours);
        assert_eq!(parsed.guardrail.bias_threshold, 70);
    }

    #[test]
    fn default_config_validates() {
        assert!(validate(&Config::default(), "config.toml"));
    }
}
