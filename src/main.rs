use std::env;
use std::fs::create_dir_all;
use std::io;
use std::path::{Path, PathBuf};

use structured_logger::json::new_writer;
use structured_logger::Builder;

use osm_normalize::config::UserConfig;
use osm_normalize::errors::Result;
use osm_normalize::etl::normalize_osm::NormalizeOsmEtl;
use osm_normalize::etl::Etl;

fn load_user_config(path: &str) -> UserConfig {
    UserConfig::load(Path::new(path)).expect("Could not load config file.")
}

fn create_output_dir(config: &UserConfig) -> Result<PathBuf> {
    let output_dir = PathBuf::from(&config.dest_path);
    create_dir_all(&output_dir)?;
    Ok(output_dir)
}

fn setup_logging() {
    Builder::with_level("info")
        .with_target_writer("*", new_writer(io::stdout()))
        .init();
}

fn main() -> Result<()> {
    setup_logging();

    let config_path = env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let user_config = load_user_config(&config_path);
    let output_dir = create_output_dir(&user_config)?;

    let mut etl = NormalizeOsmEtl::new(&user_config)?;
    etl.process(&output_dir)?;

    Ok(())
}
