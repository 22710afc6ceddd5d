use clap::Parser;
use findit::image::io::load_gray_image;
use findit::{EngineOptions, ExecuteOptions, Matcher, Verbosity};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "findit CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

fn default_engines() -> Vec<String> {
    vec!["template".to_string()]
}

#[derive(Debug, Deserialize)]
struct Config {
    target_path: PathBuf,
    #[serde(default)]
    target_name: Option<String>,
    /// Template name → image path, in matching order.
    templates: Map<String, Value>,
    #[serde(default = "default_engines")]
    engines: Vec<String>,
    #[serde(default)]
    pro_mode: bool,
    #[serde(default)]
    engine_template_mask_pic_path: Option<PathBuf>,
    #[serde(default)]
    output_path: Option<PathBuf>,
    /// Remaining `engine_*` keys.
    #[serde(flatten)]
    engine_options: Map<String, Value>,
}

fn target_label(config: &Config) -> String {
    config.target_name.clone().unwrap_or_else(|| {
        config
            .target_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    })
}

fn load_templates(
    matcher: &mut Matcher,
    templates: &Map<String, Value>,
) -> Result<(), Box<dyn std::error::Error>> {
    if templates.is_empty() {
        return Err("templates must name at least one image".into());
    }
    for (name, path) in templates {
        let path = path
            .as_str()
            .ok_or_else(|| format!("template `{name}` must map to an image path"))?;
        matcher.load_template_path(name.as_str(), Path::new(path))?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("findit=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    let options = EngineOptions::from_json(Value::Object(config.engine_options.clone()))?;

    let mut matcher = Matcher::with_options(config.engines.iter().cloned(), options)?
        .with_verbosity(Verbosity::from_pro_mode(config.pro_mode));
    load_templates(&mut matcher, &config.templates)?;

    let mask = config
        .engine_template_mask_pic_path
        .as_ref()
        .map(load_gray_image)
        .transpose()?;
    let extras = match &mask {
        Some(mask) => ExecuteOptions::with_mask(mask.view()),
        None => ExecuteOptions::default(),
    };

    let result = matcher.find_path(target_label(&config), &config.target_path, &extras)?;
    let json = serde_json::to_string_pretty(&result)?;

    match &config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
