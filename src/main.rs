use std::path::{Path, PathBuf};

use mandala::prelude::*;

const DEFAULT_CONFIG: &str = "mandala.toml";
const FALLBACK_TEXTURES: u32 = 8;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), MandalaError> {
    let config = load_config(std::env::args().nth(1).map(PathBuf::from))?;
    let textures = load_textures(&config.textures);

    Viewer::new()
        .with_config(config)
        .with_textures(textures)
        .with_title("Mandala")
        .run()
}

/// Config from the path given on the command line, else `mandala.toml` if
/// present, else defaults.
fn load_config(arg: Option<PathBuf>) -> Result<MandalaConfig, MandalaError> {
    let path = match arg {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG).exists() => PathBuf::from(DEFAULT_CONFIG),
        None => {
            log::info!("No config file, using defaults");
            return Ok(MandalaConfig::default());
        }
    };
    log::info!("Loading config from {}", path.display());
    Ok(MandalaConfig::load(&path)?)
}

/// Load the configured images, falling back to procedural petals so the
/// viewer still runs without an asset directory.
fn load_textures(source: &TextureSourceConfig) -> TexturePool {
    let loaded = if source.count == 0 {
        TexturePool::load_dir(&source.dir)
    } else {
        TexturePool::load_numbered(&source.dir, source.count, &source.extension)
    };
    match loaded {
        Ok(pool) => pool,
        Err(e) => {
            log::warn!("{e}; using {FALLBACK_TEXTURES} procedural textures");
            TexturePool::procedural(FALLBACK_TEXTURES)
        }
    }
}
