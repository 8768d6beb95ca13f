use brief_core::provider::{ProviderId, lookup};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const CONFIG_VERSION: u32 = 1;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("home directory not found; set HOME")]
    HomeMissing,
    #[error("config io error: {0}")]
    Io(#[from] io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub base_dir: PathBuf,
    pub config_path: PathBuf,
}

impl ConfigPaths {
    pub fn from_home() -> Result<Self, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::HomeMissing)?;
        Ok(Self::from_base(PathBuf::from(home).join(".brief")))
    }

    pub fn from_base(base_dir: PathBuf) -> Self {
        let config_path = base_dir.join("config.toml");
        Self {
            base_dir,
            config_path,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: u32,
    pub summarize: SummarizeConfig,
    pub http: HttpConfig,
    pub output: OutputConfig,
    pub providers: ProvidersConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            summarize: SummarizeConfig::default(),
            http: HttpConfig::default(),
            output: OutputConfig::default(),
            providers: ProvidersConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizeConfig {
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub recursive_reduce: bool,
}

impl Default for SummarizeConfig {
    fn default() -> Self {
        Self {
            provider: ProviderId::OpenAI.to_string(),
            model: ProviderId::OpenAI.spec().default_model().to_string(),
            temperature: brief_core::client::DEFAULT_TEMPERATURE,
            recursive_reduce: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds; 0 disables it.
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub export_dir: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openai: ProviderConfig,
    pub mistral: ProviderConfig,
    pub claude: ProviderConfig,
    pub gemini: ProviderConfig,
    pub hugging_face: ProviderConfig,
    pub ollama: ProviderConfig,
}

impl ProvidersConfig {
    pub fn get(&self, id: ProviderId) -> &ProviderConfig {
        match id {
            ProviderId::OpenAI => &self.openai,
            ProviderId::Mistral => &self.mistral,
            ProviderId::Claude => &self.claude,
            ProviderId::Gemini => &self.gemini,
            ProviderId::HuggingFace => &self.hugging_face,
            ProviderId::Ollama => &self.ollama,
        }
    }

    pub fn get_mut(&mut self, id: ProviderId) -> &mut ProviderConfig {
        match id {
            ProviderId::OpenAI => &mut self.openai,
            ProviderId::Mistral => &mut self.mistral,
            ProviderId::Claude => &mut self.claude,
            ProviderId::Gemini => &mut self.gemini,
            ProviderId::HuggingFace => &mut self.hugging_face,
            ProviderId::Ollama => &mut self.ollama,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
}

impl Config {
    pub fn load_or_create(paths: &ConfigPaths) -> Result<Self, ConfigError> {
        ensure_dirs(paths)?;
        if paths.config_path.exists() {
            let config = Self::load(paths)?;
            return Ok(config);
        }

        let config = Self::default();
        Self::write(paths, &config)?;
        Ok(config)
    }

    pub fn load(paths: &ConfigPaths) -> Result<Self, ConfigError> {
        ensure_dirs(paths)?;
        let content = fs::read_to_string(&paths.config_path)?;
        let raw: toml::Value = toml::from_str(&content)?;
        let file_version = raw
            .get("version")
            .and_then(|value| value.as_integer())
            .unwrap_or(0) as u32;

        let mut config: Config = toml::from_str(&content)?;
        let mut migrated = false;

        if file_version < CONFIG_VERSION {
            config.version = CONFIG_VERSION;
            migrated = true;
        } else if file_version > CONFIG_VERSION {
            tracing::warn!(
                file_version,
                supported = CONFIG_VERSION,
                "config version is newer than supported; proceeding"
            );
        }

        warn_if_loose_permissions(&paths.config_path)?;

        if migrated {
            Self::write(paths, &config)?;
        }

        Ok(config)
    }

    pub fn write(paths: &ConfigPaths, config: &Config) -> Result<(), ConfigError> {
        ensure_dirs(paths)?;
        let content = toml::to_string_pretty(config)?;
        write_atomic(&paths.config_path, content.as_bytes())?;
        Ok(())
    }

    pub fn redacted(&self) -> Self {
        let mut redacted = self.clone();
        for id in ProviderId::ALL {
            let profile = redacted.providers.get_mut(id);
            if !profile.api_key.trim().is_empty() {
                profile.api_key = "<redacted>".to_string();
            }
        }
        redacted
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let spec = lookup(&self.summarize.provider).map_err(|_| {
            ConfigError::Validation(format!(
                "summarize.provider must be one of {} (got {})",
                provider_names(),
                self.summarize.provider
            ))
        })?;
        let model = self.summarize.model.trim();
        if !model.is_empty() && !spec.supports(model) {
            return Err(ConfigError::Validation(format!(
                "summarize.model {model} is not available for {}; choose one of {}",
                spec.id,
                spec.models.join(", ")
            )));
        }
        if !(0.0..=2.0).contains(&self.summarize.temperature) {
            return Err(ConfigError::Validation(
                "summarize.temperature must be between 0 and 2".into(),
            ));
        }

        for id in ProviderId::ALL {
            let base_url = self.providers.get(id).base_url.trim();
            if base_url.is_empty() {
                continue;
            }
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                return Err(ConfigError::Validation(format!(
                    "providers.{}.base_url must start with http:// or https://",
                    id.key()
                )));
            }
        }

        Ok(())
    }

    pub fn export_dir(&self) -> Option<PathBuf> {
        let dir = self.output.export_dir.trim();
        (!dir.is_empty()).then(|| PathBuf::from(dir))
    }
}

pub fn provider_names() -> String {
    ProviderId::ALL
        .iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn ensure_dirs(paths: &ConfigPaths) -> Result<(), ConfigError> {
    fs::create_dir_all(&paths.base_dir)?;
    Ok(())
}

pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::other("path missing parent directory"))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("path missing file name"))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = parent.join(tmp_name);
    fs::write(&tmp_path, contents)?;
    set_strict_permissions(&tmp_path)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn set_strict_permissions(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        let perm = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, perm)?;
    }
    Ok(())
}

fn warn_if_loose_permissions(path: &Path) -> Result<(), ConfigError> {
    #[cfg(unix)]
    {
        let metadata = fs::metadata(path)?;
        let mode = metadata.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            tracing::warn!(
                path = %path.display(),
                "config file is group/world readable; set permissions to 0600"
            );
        }
    }
    Ok(())
}
