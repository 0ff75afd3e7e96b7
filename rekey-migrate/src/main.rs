use anyhow::Context;
use rekey_migrate::{MigrationConfig, CONFIG_VARIABLE, DEFAULT_CONFIG_FILE, TRIGGER_VARIABLE};
use std::path::{Path, PathBuf};
use tracing::info;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if std::env::var_os(TRIGGER_VARIABLE).is_none() {
        info!("{TRIGGER_VARIABLE} is not set, skipping userstore password migration");
        return Ok(());
    }

    let config = load_config()?;
    info!("carbon home: {}", config.carbon_home.display());

    let report = config.build_migrator().migrate()?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn load_config() -> anyhow::Result<MigrationConfig> {
    let explicit = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(CONFIG_VARIABLE).map(PathBuf::from));

    match explicit {
        Some(path) => MigrationConfig::load(&path).with_context(|| format!("loading {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            MigrationConfig::load(DEFAULT_CONFIG_FILE).with_context(|| format!("loading {DEFAULT_CONFIG_FILE}"))
        }
        None => {
            info!("no configuration file, using defaults");
            Ok(MigrationConfig::default())
        }
    }
}
