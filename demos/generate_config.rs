//! Generate the default pipeline configuration file
//!
//! Creates a JSON config with all stage-internal defaults, ready to edit
//! and pass to the `cli` example with `--config`.

use underwater_color::PipelineConfig;
use std::{env, path::Path, process};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <output_config.json>", args[0]);
        eprintln!();
        eprintln!("Example:");
        eprintln!("  {} configs/default.json", args[0]);
        process::exit(1);
    }

    let output_path = Path::new(&args[1]);

    if let Some(parent) = output_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("Error creating directory: {}", e);
            process::exit(1);
        }
    }

    let config = PipelineConfig::default();

    match config.to_json_file(output_path) {
        Ok(_) => {
            eprintln!("Configuration saved to {}", output_path.display());
            eprintln!();
            eprintln!("Config summary:");
            eprintln!(
                "  Analysis: max dimension {}, structure dimension {}, green hue {}-{}, min saturation {}",
                config.analysis.max_dimension,
                config.analysis.structure_dimension,
                config.analysis.green_hue_min,
                config.analysis.green_hue_max,
                config.analysis.green_min_saturation
            );
            eprintln!(
                "  Dehaze: patch {}, omega {:.2}, transmission floor {:.2}",
                config.dehaze.patch_size, config.dehaze.omega, config.dehaze.transmission_floor
            );
            eprintln!(
                "  Contrast: CLAHE grid {}x{}",
                config.contrast.tile_grid, config.contrast.tile_grid
            );
        }
        Err(e) => {
            eprintln!("Error saving config: {}", e);
            process::exit(1);
        }
    }
}
