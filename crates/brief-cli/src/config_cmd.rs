use crate::config::{Config, ConfigError, ConfigPaths};
use brief_core::provider::{ProviderId, lookup};
use clap::Args;
use std::process::Command;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Print config with secrets redacted
    #[arg(long)]
    pub print: bool,

    /// Edit config in $EDITOR
    #[arg(long)]
    pub edit: bool,

    /// Set a config value (dotted key=value)
    #[arg(long, value_name = "key=value")]
    pub set: Vec<String>,
}

pub fn run(args: &ConfigArgs, paths: &ConfigPaths) -> Result<(), ConfigError> {
    if args.edit && (!args.set.is_empty() || args.print) {
        return Err(ConfigError::Validation(
            "--edit cannot be combined with --set or --print".into(),
        ));
    }

    let mut config = Config::load_or_create(paths)?;

    if args.edit {
        edit_config(paths)?;
        config = Config::load(paths)?;
        config.validate()?;
        return Ok(());
    }

    if !args.set.is_empty() {
        for assignment in &args.set {
            apply_set(&mut config, assignment)?;
        }
        config.validate()?;
        Config::write(paths, &config)?;
    }

    if args.print || args.set.is_empty() {
        let redacted = config.redacted();
        let output = toml::to_string_pretty(&redacted)?;
        println!("{output}");
    }

    Ok(())
}

fn edit_config(paths: &ConfigPaths) -> Result<(), ConfigError> {
    let editor = std::env::var("EDITOR")
        .map_err(|_| ConfigError::Validation("$EDITOR not set; use --set or set EDITOR".into()))?;
    let parts = split_editor_command(&editor)?;
    let (program, args) = parts
        .split_first()
        .ok_or_else(|| ConfigError::Validation("$EDITOR is empty".into()))?;
    let status = Command::new(program)
        .args(args)
        .arg(&paths.config_path)
        .status()
        .map_err(ConfigError::Io)?;
    if !status.success() {
        return Err(ConfigError::Validation(
            "editor exited with a non-zero status".into(),
        ));
    }
    Ok(())
}

fn split_editor_command(editor: &str) -> Result<Vec<String>, ConfigError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut chars = editor.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '\\' if !in_single => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ch if ch.is_whitespace() && !in_single && !in_double => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }

    if in_single || in_double {
        return Err(ConfigError::Validation(
            "$EDITOR has unmatched quotes".into(),
        ));
    }
    if !current.is_empty() {
        parts.push(current);
    }
    if parts.is_empty() {
        return Err(ConfigError::Validation("$EDITOR is empty".into()));
    }
    Ok(parts)
}

fn apply_set(config: &mut Config, assignment: &str) -> Result<(), ConfigError> {
    let (key, value) = assignment
        .split_once('=')
        .ok_or_else(|| ConfigError::Validation("expected key=value for --set".into()))?;
    let key = key.trim();
    let value = value.trim();
    match key {
        "summarize.provider" => {
            let spec = lookup(value).map_err(|e| ConfigError::Validation(e.to_string()))?;
            if spec.id.to_string() != config.summarize.provider {
                // A model from the old provider would fail validation.
                config.summarize.model = spec.default_model().to_string();
            }
            config.summarize.provider = spec.id.to_string();
        }
        "summarize.model" => {
            config.summarize.model = value.to_string();
        }
        "summarize.temperature" => {
            config.summarize.temperature = parse_f32(value, key)?;
        }
        "summarize.recursive_reduce" => {
            config.summarize.recursive_reduce = parse_bool(value, key)?;
        }
        "http.timeout_secs" => {
            config.http.timeout_secs = parse_u64(value, key)?;
        }
        "output.export_dir" => {
            config.output.export_dir = value.to_string();
        }
        other => {
            let Some((id, field)) = provider_key(other) else {
                return Err(ConfigError::Validation(format!(
                    "unknown config key: {other}"
                )));
            };
            let profile = config.providers.get_mut(id);
            match field {
                "api_key" => profile.api_key = value.to_string(),
                "base_url" => profile.base_url = value.to_string(),
                _ => {
                    return Err(ConfigError::Validation(format!(
                        "unknown config key: {other}"
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Splits `providers.<key>.<field>` into the provider and field name.
fn provider_key(key: &str) -> Option<(ProviderId, &str)> {
    let rest = key.strip_prefix("providers.")?;
    let (provider, field) = rest.split_once('.')?;
    let id = ProviderId::ALL
        .into_iter()
        .find(|id| id.key() == provider)?;
    Some((id, field))
}

fn parse_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::Validation(format!(
            "{key} expects true or false"
        ))),
    }
}

fn parse_u64(value: &str, key: &str) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("{key} expects an unsigned integer")))
}

fn parse_f32(value: &str, key: &str) -> Result<f32, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("{key} expects a number")))
}
