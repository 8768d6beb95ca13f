mod chat;
mod config;
mod config_cmd;
mod export;
mod init;
mod logging;

use brief_core::PipelineError;
use brief_core::chunker::TextChunker;
use brief_core::client::{ClientFactory, ClientOptions};
use brief_core::env::EnvSnapshot;
use brief_core::extract::{extract_path, fetch_url, preview};
use brief_core::http::default_agent;
use brief_core::provider::{PROVIDERS, lookup};
use brief_core::session::{GenerateRequest, Session};
use brief_core::summarize::{ReduceStrategy, Summarizer};
use clap::{ArgAction, Parser, Subcommand};
use config::{Config, ConfigPaths};
use export::{ExportError, ExportHandle};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser)]
#[command(
    name = "brief",
    version,
    about = "summarize documents and web pages with a choice of LLM providers",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,

    /// More log output (-v info, -vv debug); BRIEF_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Store a provider credential in ./.env
    Init(init::InitArgs),
    /// Show or change ~/.brief/config.toml
    Config(config_cmd::ConfigArgs),
    /// List providers, models and credential variables
    Providers,
}

#[derive(Parser, Debug, Clone, Default)]
struct RunArgs {
    /// Document to summarize (txt, pdf, docx, doc, xlsx, xls, csv)
    #[arg(value_name = "FILE", conflicts_with = "url")]
    file: Option<PathBuf>,

    /// Web page to summarize instead of a file
    #[arg(long)]
    url: Option<String>,

    /// Provider (OpenAI, Mistral, Claude, Gemini, "Hugging Face", Ollama)
    #[arg(long)]
    provider: Option<String>,

    /// Model for the selected provider
    #[arg(long)]
    model: Option<String>,

    /// API key, or endpoint for Ollama; falls back to config then environment
    #[arg(long, value_name = "key")]
    api_key: Option<String>,

    /// Export directory for the summary and session metadata
    #[arg(long, value_name = "dir")]
    out: Option<PathBuf>,

    /// Print the first 500 characters of the extracted text to stderr
    #[arg(long)]
    preview: bool,

    /// Ask follow-up questions about the summary
    #[arg(long)]
    chat: bool,
}

#[derive(Debug, Error)]
enum RunError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

enum Input {
    File(PathBuf),
    Url(String),
}

impl RunArgs {
    fn input(&self) -> Result<Input, RunError> {
        match (&self.file, &self.url) {
            (Some(path), None) => Ok(Input::File(path.clone())),
            (None, Some(url)) => Ok(Input::Url(url.clone())),
            (Some(_), Some(_)) => Err(RunError::Usage(
                "give either a FILE or --url, not both".into(),
            )),
            (None, None) => Err(RunError::Usage(
                "nothing to summarize; give a FILE or --url (see brief --help)".into(),
            )),
        }
    }

    /// Flags win over the config file. A provider given on the command line
    /// without a model uses that provider's default model.
    fn request(&self, config: &Config) -> Result<GenerateRequest, PipelineError> {
        let provider = self
            .provider
            .clone()
            .unwrap_or_else(|| config.summarize.provider.clone());
        let spec = lookup(&provider)?;
        let provider_changed = self.provider.is_some()
            && lookup(&config.summarize.provider).map(|s| s.id).ok() != Some(spec.id);

        let model = match &self.model {
            Some(model) => model.clone(),
            None if provider_changed => String::new(),
            None => config.summarize.model.clone(),
        };
        let credential = self
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .unwrap_or_else(|| config.providers.get(spec.id).api_key.clone());

        Ok(GenerateRequest {
            provider: spec.id.to_string(),
            model,
            credential,
        })
    }
}

fn client_options(config: &Config) -> ClientOptions {
    let base_urls: HashMap<_, _> = PROVIDERS
        .iter()
        .filter_map(|spec| {
            let base_url = config.providers.get(spec.id).base_url.trim();
            (!base_url.is_empty()).then(|| (spec.id, base_url.to_string()))
        })
        .collect();
    ClientOptions {
        temperature: config.summarize.temperature,
        timeout: config.http.timeout(),
        base_urls,
    }
}

fn summarizer(config: &Config) -> Summarizer {
    let reduce = if config.summarize.recursive_reduce {
        ReduceStrategy::Recursive
    } else {
        ReduceStrategy::Single
    };
    Summarizer::new(TextChunker::default(), reduce)
}

fn run(args: RunArgs, config: &Config, env: &EnvSnapshot) -> Result<(), RunError> {
    let input = args.input()?;
    let request = args.request(config)?;
    let options = client_options(config);

    let (text, source) = match input {
        Input::File(path) => {
            let text = extract_path(&path).map_err(PipelineError::from)?;
            (text, path.display().to_string())
        }
        Input::Url(url) => {
            let agent = default_agent(options.timeout);
            let text = fetch_url(&agent, &url).map_err(PipelineError::from)?;
            (text, url)
        }
    };

    if args.preview {
        eprintln!("--- text preview (first 500 characters) ---");
        eprintln!("{}", preview(&text));
        eprintln!("---");
    }

    let factory = ClientFactory::with_defaults(options);
    let mut session = Session::new(summarizer(config));
    let result = session.generate(&factory, env, &request, &text, &source)?;
    println!("{}", result.summary);

    let export_dir = args.out.clone().or_else(|| config.export_dir());
    let mut exported = match export_dir {
        Some(dir) => {
            let handle = ExportHandle::write(&dir, result)?;
            eprintln!("summary saved to {}", handle.dir().display());
            Some(handle)
        }
        None => None,
    };

    if args.chat {
        chat::run(&mut session, io::stdin().lock(), io::stdout())?;
        if let Some(handle) = exported.as_mut() {
            handle.write_transcript(session.transcript())?;
        }
    }

    Ok(())
}

fn print_providers() {
    for spec in &PROVIDERS {
        let credential = if spec.credential_optional {
            format!("{} (optional)", spec.credential_label)
        } else {
            spec.credential_label.to_string()
        };
        println!("{}", spec.id);
        println!("  models:     {}", spec.models.join(", "));
        println!("  credential: {credential}, env {}", spec.env_var);
        println!("  config:     providers.{}", spec.id.key());
    }
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let env = EnvSnapshot::from_process();

    let paths = match ConfigPaths::from_home() {
        Ok(paths) => paths,
        Err(err) => {
            eprintln!("config paths error: {err}");
            std::process::exit(1);
        }
    };

    if let Some(command) = cli.command {
        match command {
            Command::Init(args) => {
                if let Err(e) = init::run(&args, &env) {
                    eprintln!("init failed: {e}");
                    std::process::exit(1);
                }
            }
            Command::Config(args) => {
                if let Err(e) = config_cmd::run(&args, &paths) {
                    eprintln!("config failed: {e}");
                    std::process::exit(1);
                }
            }
            Command::Providers => print_providers(),
        }
        return;
    }

    let config = match Config::load_or_create(&paths).and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config load failed: {err}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli.run, &config, &env) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
