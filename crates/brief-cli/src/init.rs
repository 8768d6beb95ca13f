use brief_core::env::EnvSnapshot;
use brief_core::provider::lookup;
use clap::Args;
use std::fs;
use std::io;
use std::path::Path;

const ENV_FILE: &str = ".env";

#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    /// Provider whose credential to store (e.g. OpenAI, "Hugging Face", ollama)
    #[arg(long)]
    pub provider: String,

    /// Credential to write (defaults to the provider's variable from the current env)
    #[arg(long)]
    pub api_key: Option<String>,
}

pub fn run(args: &InitArgs, env: &EnvSnapshot) -> Result<(), Box<dyn std::error::Error>> {
    let spec = lookup(&args.provider)?;
    let value = match args.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => env
            .get(spec.env_var)
            .map(str::to_string)
            .ok_or_else(|| {
                io::Error::other(format!(
                    "no {} given; pass --api-key or set {}",
                    spec.credential_label, spec.env_var
                ))
            })?,
    };

    write_env_file(Path::new(ENV_FILE), spec.env_var, &value)?;
    println!("wrote {} to {ENV_FILE}", spec.env_var);
    Ok(())
}

fn write_env_file(path: &Path, key: &str, value: &str) -> Result<(), io::Error> {
    let mut lines = match fs::read_to_string(path) {
        Ok(contents) => contents.lines().map(|l| l.to_string()).collect(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
        Err(err) => return Err(err),
    };

    upsert_env_var(&mut lines, key, value);

    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(path, content)?;
    Ok(())
}

fn upsert_env_var(lines: &mut Vec<String>, key: &str, value: &str) {
    let prefix = format!("{key}=");
    for line in lines.iter_mut() {
        if line.starts_with(&prefix) {
            *line = format!("{key}={value}");
            return;
        }
    }
    lines.push(format!("{key}={value}"));
}
