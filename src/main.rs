//! atfcnab: CNAB bundle to ARM template generator.
use std::io::Write;
use clap::Parser;
use log::{debug, error, info};
use thiserror::Error;

mod bundle;
mod config;
mod generate;
mod image;
mod template;

/// Generate an ARM template that runs a CNAB bundle's actions in an Azure container instance,
/// and print it to standard output.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the bundle descriptor. Defaults to ./bundle.json.
    #[arg(long)]
    bundle: Option<String>,

    /// Path to the atfcnab configuration file.
    #[arg(long)]
    config: Option<String>,

    /// Registry prefix stripped from the invocation image to form the bundle name.
    #[arg(long)]
    registry_prefix: Option<String>,

    /// Indent the generated template.
    #[arg(long)]
    pretty: bool,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration file: {0}")]
    Config(#[from] config::Error),

    #[error("failed to load bundle: {0}")]
    Bundle(#[from] bundle::Error),

    #[error("{0}")]
    BundleName(#[from] image::Error),

    #[error("serialize template: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("write template: {0}")]
    Output(#[from] std::io::Error),
}

/// Read configuration file from disk and merge it with the
/// `default.toml` [built-in config](../default.toml).
///
/// If a configuration file name is not set explicitly, this function will
/// detect whether a config file with the default file name exists in the
/// working directory. If it does, it is used implicitly.
fn read_config(args: &Cli) -> Result<config::File, Error> {
    const DEFAULT_CONFIG_FILE: &str = "atfcnab.toml";

    let config_file = match &args.config {
        None => {
            if std::fs::metadata(DEFAULT_CONFIG_FILE)
                .map(|metadata| metadata.is_file())
                .unwrap_or(false)
            {
                Some(DEFAULT_CONFIG_FILE.to_string())
            } else {
                None
            }
        }
        Some(c) => Some(c.clone()),
    };

    let mut cfg = if let Some(config_file) = config_file {
        debug!("Using configuration file {config_file}");
        config::File::default_with_user_config_file(&config_file)?
    } else {
        config::File::default()
    };

    if let Some(bundle) = &args.bundle {
        cfg.bundle.path = bundle.clone();
    }
    if let Some(prefix) = &args.registry_prefix {
        cfg.registry.prefix = prefix.clone();
    }

    Ok(cfg)
}

fn main() {
    match run() {
        Ok(_) => std::process::exit(0),
        Err(err) => {
            error!("fatal: {}", err.to_string());
            std::process::exit(1)
        }
    }
}

fn run() -> Result<(), Error> {
    env_logger::init();

    let args = Cli::parse();
    let cfg = read_config(&args)?;

    info!("Loading bundle from {}", cfg.bundle.path);
    let bundle = bundle::load(&cfg.bundle.path)?;

    // TODO: resolve the name from the bundle reference once bundles are installed from a registry
    let bundle_name = image::bundle_name(&bundle.invocation_images, &cfg.registry.prefix)?;
    info!("Bundle name detected: {bundle_name}");

    let generated = generate::generate(&bundle, &bundle_name, &cfg);
    debug!(
        "Generated {} template parameters and {} environment variables",
        generated.parameters.len(),
        generated.environment_variables().len()
    );
    let output = if args.pretty {
        serde_json::to_string_pretty(&generated)?
    } else {
        serde_json::to_string(&generated)?
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{output}")?;
    Ok(())
}
