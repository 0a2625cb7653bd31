//! BN assets CLI - Inspect animations from a JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use bn_assets::{
    animation::PixelCanvas,
    schema::{AssetConfig, CachePolicy},
    store::AssetLibrary,
};

/// Largest canvas side used for the frame 0 coverage check.
const MAX_CANVAS: f64 = 2048.0;

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [animation...]", args[0]);
        eprintln!();
        eprintln!("Decode animations from the asset tree described by a configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to asset configuration file");
        eprintln!("  animation    Animations to inspect (default: list all names)");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);

    // Load configuration
    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config = AssetConfig::from_json(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    let library = AssetLibrary::from_config(&config).unwrap_or_else(|e| {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    });

    let names = &args[2..];
    if names.is_empty() {
        let start = Instant::now();
        let all = library.animation_names().unwrap_or_else(|e| {
            eprintln!("Error reading manifest: {}", e);
            std::process::exit(1);
        });
        for name in &all {
            println!("{}", name);
        }
        eprintln!("{} animations indexed in {:?}", all.len(), start.elapsed());
        return;
    }

    let mut failed = false;
    for name in names {
        if let Err(e) = inspect(&library, name) {
            eprintln!("{}: {} ({})", name, e, e.reason());
            failed = true;
        }
    }
    if failed {
        std::process::exit(1);
    }
}

fn inspect(library: &AssetLibrary, name: &str) -> bn_assets::FormatResult<()> {
    let start = Instant::now();
    let Some(player) = library.player(name)? else {
        println!("{}: not found", name);
        return Ok(());
    };
    let timeline = player.timeline();
    let bounds = player.bounds();

    println!("{}", timeline.name());
    println!("  Package: {}", timeline.package());
    println!(
        "  Version: {} (scale {})",
        timeline.version().number(),
        timeline.scale()
    );
    println!("  Frames: {}", timeline.frame_count());
    println!(
        "  Bounds: {:.3}, {:.3} {:.3}x{:.3}",
        bounds.x, bounds.y, bounds.width, bounds.height
    );
    println!(
        "  Raster: {}x{} ({}-bit{})",
        player.raster().width(),
        player.raster().height(),
        player.raster().depth().bits(),
        if player.raster().is_replaced() { ", replaced" } else { "" }
    );

    // Render frame 0 onto a canvas covering the overall bounds.
    let width = bounds.width.ceil().clamp(1.0, MAX_CANVAS) as u32;
    let height = bounds.height.ceil().clamp(1.0, MAX_CANVAS) as u32;
    let mut canvas = PixelCanvas::with_origin(width, height, glam::DVec2::new(bounds.x, bounds.y));
    if player.draw(0, &mut canvas) {
        let frame = player.frame(0).map(|f| f.polygons().len()).unwrap_or(0);
        println!(
            "  Frame 0: {} polygons, {}/{} pixels covered",
            frame,
            canvas.covered(),
            width as u64 * height as u64
        );
    }
    println!("  Loaded in {:?}", start.elapsed());
    Ok(())
}

fn print_example_config() {
    let config = AssetConfig {
        search_paths: vec![PathBuf::from("updates"), PathBuf::from("assets")],
        raster_cache: CachePolicy::Lru { capacity: 64 },
        ..AssetConfig::default()
    };

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
