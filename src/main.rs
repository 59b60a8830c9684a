use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use glrest::config::Config;
use glrest::gitlab::auth::Credentials;
use glrest::gitlab::client::{format_gitlab_error, GitlabClient};
use glrest::gitlab::error::GitlabError;
use glrest::resource::path::Bindings;
use glrest::resource::registry::{get_all_resource_keys, require_resource, ActionTarget};
use glrest::resource::{ListOptions, ListParams, RestManager};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Command-line access to GitLab resources
#[derive(Parser, Debug)]
#[command(name = "glrest", version, about, long_about = None)]
struct Args {
    /// GitLab instance URL
    #[arg(long, global = true)]
    url: Option<String>,

    /// Personal access token
    #[arg(long, global = true)]
    private_token: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json", global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List known resources with their operations and actions
    Resources,
    /// Persist connection settings
    Configure {
        #[arg(long)]
        per_page: Option<u32>,
        #[arg(long)]
        timeout_secs: Option<u64>,
        #[arg(long)]
        ssl_verify: Option<bool>,
    },
    /// Call an operation or action on a resource
    Call(CallArgs),
}

#[derive(ClapArgs, Debug)]
struct CallArgs {
    /// Resource key, e.g. project-issues
    resource: String,

    /// list, get, create, update, delete or a declared action
    action: String,

    /// Path binding, e.g. project_id=42
    #[arg(long = "parent", value_parser = parse_key_value)]
    parents: Vec<(String, String)>,

    /// Object identifier for get/update/delete and object actions
    #[arg(long)]
    id: Option<String>,

    /// Attribute or filter, e.g. title=bug or labels='["a","b"]'
    #[arg(long = "attr", value_parser = parse_key_value)]
    attrs: Vec<(String, String)>,

    /// Follow every page when listing
    #[arg(long)]
    all: bool,

    #[arg(long)]
    page: Option<u32>,

    #[arg(long)]
    per_page: Option<u32>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got {raw}"))
}

/// Values that parse as JSON keep their type, everything else is a string
fn parse_attr_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Cannot open log file {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("glrest started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("glrest").join("glrest.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".glrest").join("glrest.log");
    }
    PathBuf::from("glrest.log")
}

fn print_value(value: &Value, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn build_client(args: &Args, config: &Config) -> Result<GitlabClient> {
    let url = args.url.clone().unwrap_or_else(|| config.effective_url());
    let credentials = match &args.private_token {
        Some(token) => Credentials::PrivateToken(token.clone()),
        None => config.effective_credentials(),
    };

    tracing::info!("Using {} as {}", url, credentials.kind());

    let mut client = GitlabClient::with_options(
        &url,
        credentials,
        config.timeout_secs.map(Duration::from_secs),
        config.ssl_verify.unwrap_or(true),
    )
    .context("Failed to create GitLab client")?;
    client.per_page = config.per_page;
    Ok(client)
}

fn list_resources(format: OutputFormat) -> Result<()> {
    let mut listing = Map::new();
    for key in get_all_resource_keys() {
        let def = require_resource(key)?;
        let operations: Vec<&str> = def.operations.iter().map(|op| op.as_str()).collect();
        let actions: Vec<&str> = def.actions.iter().map(|a| a.key.as_str()).collect();
        listing.insert(
            key.to_string(),
            serde_json::json!({
                "name": def.display_name,
                "path": def.path,
                "operations": operations,
                "actions": actions,
            }),
        );
    }
    print_value(&Value::Object(listing), format)
}

async fn call(client: &GitlabClient, call: &CallArgs) -> Result<Value, GitlabError> {
    let bindings: Bindings = call.parents.iter().cloned().collect();
    let manager = RestManager::with_bindings(client, &call.resource, bindings)?;

    let attrs: Map<String, Value> = call
        .attrs
        .iter()
        .map(|(k, v)| (k.clone(), parse_attr_value(v)))
        .collect();

    let id = || {
        call.id.clone().ok_or_else(|| GitlabError::MissingAttributes {
            operation: call.action.clone(),
            missing: vec!["id".to_string()],
        })
    };

    match call.action.as_str() {
        "list" => {
            let options = ListOptions {
                page: call.page,
                per_page: call.per_page,
                all: call.all,
            };
            let objects = manager.list(&ListParams::from(attrs), &options).await?;
            Ok(Value::Array(objects.iter().map(|o| o.to_json()).collect()))
        }
        "get" => Ok(manager.get(&id()?).await?.to_json()),
        "create" => manager.create_raw(&attrs).await,
        "update" => manager.update(&id()?, &attrs).await,
        "delete" => {
            manager.delete(&id()?).await?;
            Ok(Value::Null)
        }
        action => {
            let target = manager
                .def()
                .get_action(action)
                .map(|a| a.target)
                .ok_or_else(|| GitlabError::UnknownAction {
                    resource: call.resource.clone(),
                    action: action.to_string(),
                })?;

            match target {
                ActionTarget::Manager => manager.action(action, &attrs).await,
                ActionTarget::Object => {
                    let id_attr = manager.def().id_attr.clone().unwrap_or_else(|| "id".to_string());
                    let mut stub = Map::new();
                    stub.insert(id_attr, Value::String(id()?));
                    let mut obj = manager.wrap(Value::Object(stub))?;
                    manager.object_action(&mut obj, action, &attrs).await
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let mut config = Config::load();

    match &args.command {
        Command::Resources => list_resources(args.output),
        Command::Configure {
            per_page,
            timeout_secs,
            ssl_verify,
        } => {
            if let Some(url) = &args.url {
                config.url = Some(url.clone());
            }
            if let Some(token) = &args.private_token {
                config.private_token = Some(token.clone());
            }
            config.per_page = per_page.or(config.per_page);
            config.timeout_secs = timeout_secs.or(config.timeout_secs);
            config.ssl_verify = ssl_verify.or(config.ssl_verify);
            config.save().context("Failed to save configuration")?;
            if let Some(path) = Config::config_path() {
                eprintln!("Saved {}", path.display());
            }
            Ok(())
        }
        Command::Call(call_args) => {
            let client = build_client(&args, &config)?;
            match call(&client, call_args).await {
                Ok(value) => print_value(&value, args.output),
                Err(err) => {
                    tracing::error!("{} {} failed: {}", call_args.resource, call_args.action, err);
                    if err.is_local() {
                        bail!("{}", err);
                    }
                    bail!("{}", format_gitlab_error(&err));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("project_id=42").unwrap(),
            ("project_id".to_string(), "42".to_string())
        );
        assert_eq!(
            parse_key_value("name_regex=a=b").unwrap(),
            ("name_regex".to_string(), "a=b".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_parse_attr_value() {
        assert_eq!(parse_attr_value("42"), Value::from(42));
        assert_eq!(parse_attr_value("true"), Value::from(true));
        assert_eq!(parse_attr_value(r#"["a","b"]"#), serde_json::json!(["a", "b"]));
        assert_eq!(parse_attr_value("crash on save"), Value::from("crash on save"));
    }

    #[test]
    fn test_cli_parses_call() {
        let args = Args::try_parse_from([
            "glrest",
            "call",
            "project-registry-tags",
            "delete_in_bulk",
            "--parent",
            "project_id=42",
            "--parent",
            "repository_id=3",
            "--attr",
            "keep_n=5",
        ])
        .unwrap();

        let Command::Call(call) = args.command else {
            panic!("expected call");
        };
        assert_eq!(call.resource, "project-registry-tags");
        assert_eq!(call.parents.len(), 2);
        assert_eq!(call.attrs, vec![("keep_n".to_string(), "5".to_string())]);
    }
}
