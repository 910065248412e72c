//! Tilelevel - tile-map level loader
//!
//! Loads a map with file-backed textures and a tracking camera, then prints
//! what was loaded.
//!
//! Usage: `tilelevel [MAP]`. Settings come from `tilelevel.cfg` when present.

mod objects;

use anyhow::Context;
use objects::{build_factory, FileTextures, FollowCamera};
use std::path::PathBuf;
use tilelevel_config::{LoaderConfig, DEFAULT_CONFIG_FILE};
use tilelevel_levels::{LevelParser, LevelSummary, ParserOptions};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let (mut config, config_error) = match LoaderConfig::load_default() {
        Ok(config) => (config, None),
        Err(e) => (LoaderConfig::default(), Some(e)),
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Some(e) = config_error {
        warn!("Failed to load {}: {}", DEFAULT_CONFIG_FILE, e);
        warn!("Using default configuration");
    }

    if let Some(map) = std::env::args().nth(1) {
        config.map = PathBuf::from(map);
    }
    config.display();

    let factory = build_factory(&config);
    let mut textures = FileTextures::default();
    let mut camera = FollowCamera::default();

    let level = LevelParser::new(&mut textures, &factory, &mut camera)
        .with_options(ParserOptions {
            asset_root: config.asset_root.clone(),
            strict_textures: config.strict_textures,
        })
        .parse_file(&config.map)
        .with_context(|| format!("failed to load level {}", config.map.display()))?;

    info!("{} textures registered", textures.len());

    let summary = level.summary();
    if config.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, &camera);
    }

    Ok(())
}

fn print_summary(summary: &LevelSummary, camera: &FollowCamera) {
    println!(
        "Map: {}x{} tiles of {}x{} px ({}x{} px)",
        summary.width,
        summary.height,
        summary.tile_width,
        summary.tile_height,
        summary.pixel_size.0,
        summary.pixel_size.1
    );

    println!("Tilesets:");
    for tileset in &summary.tilesets {
        println!(
            "  {:<16} firstgid {:<5} {} tiles ({} columns)",
            tileset.name, tileset.first_gid, tileset.tile_count, tileset.columns
        );
    }

    println!("Layers:");
    for layer in &summary.layers {
        println!(
            "  {:<16} {:?}{} {} entries",
            layer.name,
            layer.kind,
            if layer.collidable { " (collidable)" } else { "" },
            layer.entries
        );
    }

    println!("Collision layers: {}", summary.collision_layers);
    match (summary.player, camera.target()) {
        (Some(player), Some(_)) => println!(
            "Player at ({}, {}), camera at ({}, {})",
            player.x,
            player.y,
            camera.position().x,
            camera.position().y
        ),
        _ => println!("No player object"),
    }
}
