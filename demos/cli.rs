//! Command-line interface for underwater_color
//!
//! Tunes and corrects one image file. Set `RUST_LOG=info` to see the stage
//! decisions.

use std::{
    env,
    path::{Path, PathBuf},
    process,
};
use underwater_color::{
    auto_tune_with_report, image_loader, CorrectionPipeline, FusionMethod, PipelineConfig,
    ProcessingParameters, WaterType,
};

struct Options {
    water: Option<WaterType>,
    fusion: Option<FusionMethod>,
    equalize: bool,
    config: Option<PathBuf>,
    input: PathBuf,
    output: PathBuf,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {}", message);
            eprintln!("Use --help for usage information");
            process::exit(1);
        }
    };

    if let Err(error) = run(&options) {
        eprintln!("Correction failed: {}", error);
        if error.is_recoverable() {
            eprintln!("Suggestion: {}", error.user_message());
        }
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut water = None;
    let mut fusion = None;
    let mut equalize = false;
    let mut config = None;
    let mut paths = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--water" => {
                let value = args.get(i + 1).ok_or("--water needs lake or ocean")?;
                water = Some(value.parse::<WaterType>()?);
                i += 1;
            }
            "--fusion" => {
                let value = args.get(i + 1).ok_or("--fusion needs average, weighted or pca")?;
                fusion = Some(value.parse::<FusionMethod>()?);
                i += 1;
            }
            "--equalize" => equalize = true,
            "--config" => {
                let value = args.get(i + 1).ok_or("--config needs a file path")?;
                config = Some(PathBuf::from(value));
                i += 1;
            }
            "--help" | "-h" => {
                print_help(&args[0]);
                process::exit(0);
            }
            arg if !arg.starts_with("--") => paths.push(PathBuf::from(arg)),
            other => return Err(format!("Unknown option: {}", other)),
        }
        i += 1;
    }

    match <[PathBuf; 2]>::try_from(paths) {
        Ok([input, output]) => Ok(Options {
            water,
            fusion,
            equalize,
            config,
            input,
            output,
        }),
        Err(_) => Err("expected exactly one input and one output path".to_string()),
    }
}

fn run(options: &Options) -> underwater_color::Result<()> {
    let config = match &options.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    let image = image_loader::load_image(&options.input)?;

    let mut current = ProcessingParameters::default();
    if let Some(water_type) = options.water {
        current.water_type = water_type;
        current.auto_detect = false;
    }
    if let Some(method) = options.fusion {
        current.fusion_enabled = true;
        current.fusion_method = method;
    }
    current.fusion_equalize = options.equalize;

    let report = auto_tune_with_report(&image, Some(&current))?;
    print_report(&options.input, &report);

    let outcome = CorrectionPipeline::with_config(config).process_with_report(&image, &report.parameters)?;
    for clamp in &outcome.clamps {
        eprintln!("Clamped: {}", clamp);
    }

    image_loader::save_image(&outcome.image, &options.output)?;
    eprintln!("Saved {}", options.output.display());
    Ok(())
}

fn print_report(input: &Path, report: &underwater_color::TuneReport) {
    eprintln!(
        "{}: {} water, tuning confidence {:.2}",
        input.display(),
        report.parameters.water_type,
        report.confidence
    );
    for (stage, note) in &report.notes {
        eprintln!("  {:<22} {}", stage, note);
    }

    match serde_json::to_string_pretty(&report.parameters) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize parameters: {}", e),
    }
}

fn print_help(program_name: &str) {
    eprintln!("Usage: {} [OPTIONS] <input> <output>", program_name);
    eprintln!();
    eprintln!("Auto-tune and color-correct an underwater photograph.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --water <lake|ocean>             Skip detection and use this water type");
    eprintln!("  --fusion <average|weighted|pca>  Enable two-variant fusion");
    eprintln!("  --equalize                       Equalize the fusion detail variant");
    eprintln!("  --config <FILE>                  Pipeline configuration JSON");
    eprintln!("  --help, -h                       Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} reef.jpg reef_corrected.png", program_name);
    eprintln!("  {} --water lake --fusion pca quarry.jpg quarry_out.jpg", program_name);
}
