use std::path::{Path, PathBuf};

use anyhow::Context as _;
use bindery::{CacheConfig, ComponentRegistry, ConstructorArgs, ContentCache};
use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser, Debug)]
#[command(name = "bindery", version)]
struct Cli {
    /// Cache root. Defaults to `$GRADIO_TEMP_DIR`, then `<system temp>/gradio`.
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered component tags.
    Components,
    /// Print a component's example payload and API schema.
    Example(ComponentArgs),
    /// Decode and preprocess a payload, then print a summary of the value.
    Preprocess(PayloadArgs),
    /// Preprocess a payload, postprocess the value, and print the resulting payload.
    Roundtrip(PayloadArgs),
    /// Content cache operations.
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Parser, Debug)]
struct ComponentArgs {
    /// Component tag, e.g. `image` or `dataframe`.
    tag: String,

    /// Constructor arguments as a JSON object.
    #[arg(long, default_value = "{}")]
    args: String,
}

#[derive(Parser, Debug)]
struct PayloadArgs {
    #[command(flatten)]
    component: ComponentArgs,

    /// JSON file holding the payload.
    #[arg(long)]
    payload: PathBuf,
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
    /// Store a file and print its cached path.
    Put { file: PathBuf },
    /// Print the cache key of a file without storing it.
    Hash { file: PathBuf },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = ComponentRegistry::with_builtins().with_chatbot();
    match cli.cmd {
        Command::Components => {
            for tag in registry.tags() {
                println!("{tag}");
            }
            Ok(())
        }
        Command::Example(args) => cmd_example(&registry, &args),
        Command::Preprocess(args) => {
            let cache = open_cache(cli.cache_dir)?;
            cmd_preprocess(&registry, &cache, &args)
        }
        Command::Roundtrip(args) => {
            let cache = open_cache(cli.cache_dir)?;
            cmd_roundtrip(&registry, &cache, &args)
        }
        Command::Cache(CacheCommand::Put { file }) => {
            let cache = open_cache(cli.cache_dir)?;
            let stored = cache.save_file(&file)?;
            println!("{}", stored.display());
            Ok(())
        }
        Command::Cache(CacheCommand::Hash { file }) => {
            let cache = open_cache(cli.cache_dir)?;
            println!("{}", cache.hasher().hash_file(&file)?);
            Ok(())
        }
    }
}

fn open_cache(dir: Option<PathBuf>) -> anyhow::Result<ContentCache> {
    let config = match dir {
        Some(root) => CacheConfig::new(root),
        None => CacheConfig::from_env_or(std::env::temp_dir().join("gradio")),
    };
    let root = config.root.clone();
    ContentCache::new(config).with_context(|| format!("open cache '{}'", root.display()))
}

fn parse_args(raw: &str) -> anyhow::Result<ConstructorArgs> {
    match serde_json::from_str(raw).with_context(|| "parse --args JSON")? {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("--args must be a JSON object, got {other}"),
    }
}

fn read_payload(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read payload '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse payload '{}'", path.display()))
}

fn print_json(v: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(v)?);
    Ok(())
}

fn cmd_example(registry: &ComponentRegistry, args: &ComponentArgs) -> anyhow::Result<()> {
    let component = registry.create(&args.tag, &parse_args(&args.args)?)?;
    print_json(&serde_json::json!({
        "config": component.get_config(),
        "example_payload": component.example_payload_json()?,
        "api_info": component.api_info(),
    }))
}

fn cmd_preprocess(
    registry: &ComponentRegistry,
    cache: &ContentCache,
    args: &PayloadArgs,
) -> anyhow::Result<()> {
    let component = registry.create(&args.component.tag, &parse_args(&args.component.args)?)?;
    let value = component.preprocess_json(cache, &read_payload(&args.payload)?)?;
    print_json(&value.map_or(Value::Null, |v| v.summary()))
}

fn cmd_roundtrip(
    registry: &ComponentRegistry,
    cache: &ContentCache,
    args: &PayloadArgs,
) -> anyhow::Result<()> {
    let component = registry.create(&args.component.tag, &parse_args(&args.component.args)?)?;
    let value = component.preprocess_json(cache, &read_payload(&args.payload)?)?;
    tracing::debug!(tag = component.tag(), present = value.is_some(), "preprocessed");
    print_json(&component.postprocess_json(cache, value)?)
}
