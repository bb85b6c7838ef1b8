//! Command-line interface for fossil_capture
//!
//! Runs the quality checks over one or more image files and prints the
//! feedback. Set `RUST_LOG=fossil_capture=debug` to see per-check metrics.

use fossil_capture::{AnalyzerConfig, QualityAnalyzer, QualityReport};
use std::{env, path::Path, process};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    let mut config_path = None;
    let mut preset = None;
    let mut json = false;
    let mut image_paths = Vec::new();

    // Parse arguments
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                match args.get(i) {
                    Some(path) => config_path = Some(path.clone()),
                    None => {
                        eprintln!("Error: --config requires a file path");
                        process::exit(1);
                    }
                }
            }
            "--preset" => {
                i += 1;
                match args.get(i).map(String::as_str) {
                    Some("post-capture") => preset = Some(AnalyzerConfig::post_capture()),
                    Some("real-time") => preset = Some(AnalyzerConfig::real_time()),
                    other => {
                        eprintln!(
                            "Error: --preset expects post-capture or real-time, got {:?}",
                            other.unwrap_or("nothing")
                        );
                        process::exit(1);
                    }
                }
            }
            "--json" => json = true,
            "--help" | "-h" => {
                print_help(&args[0]);
                process::exit(0);
            }
            arg if !arg.starts_with("--") => image_paths.push(arg.to_string()),
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                eprintln!("Use --help for usage information");
                process::exit(1);
            }
        }
        i += 1;
    }

    if image_paths.is_empty() {
        print_help(&args[0]);
        process::exit(1);
    }

    let config = match (config_path, preset) {
        (Some(path), _) => match AnalyzerConfig::from_json_file(Path::new(&path)) {
            Ok(config) => config,
            Err(error) => {
                eprintln!("Error: {}", error);
                process::exit(1);
            }
        },
        (None, Some(preset)) => preset,
        (None, None) => AnalyzerConfig::default(),
    };

    let analyzer = match QualityAnalyzer::new(config) {
        Ok(analyzer) => analyzer,
        Err(error) => {
            eprintln!("Error: {}", error);
            process::exit(1);
        }
    };

    let mut failed = false;
    for path_str in &image_paths {
        let path = Path::new(path_str);
        let result = fossil_capture::image_loader::load_image(path)
            .and_then(|image| analyzer.analyze_dynamic(&image));

        match result {
            Ok(report) if json => print_json(path, &report),
            Ok(report) => print_summary(path, &report),
            Err(error) => {
                failed = true;
                eprintln!("{}: analysis failed: {}", path.display(), error);
                if error.is_recoverable() {
                    eprintln!("Suggestion: {}", error.user_message());
                }
            }
        }
    }

    if failed {
        process::exit(1);
    }
}

fn print_help(program_name: &str) {
    eprintln!("Usage: {} [OPTIONS] <image>...", program_name);
    eprintln!();
    eprintln!("Check whether fossil specimen photos are ready for submission.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config FILE                     Load thresholds from a JSON file");
    eprintln!("  --preset post-capture|real-time   Use a built-in threshold preset");
    eprintln!("  --json                            Print the full report as JSON");
    eprintln!("  --help, -h                        Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} specimen.jpg", program_name);
    eprintln!("  {} --preset post-capture --json a.jpg b.png", program_name);
}

fn print_json(path: &Path, report: &QualityReport) {
    match report.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("{}: error serializing report: {}", path.display(), e),
    }
}

fn print_summary(path: &Path, report: &QualityReport) {
    println!("{}", path.display());
    for item in &report.feedback {
        println!("  {}", item);
    }
    let m = &report.metrics;
    println!(
        "  dark {:.2}%  bright {:.2}%  min sharpness {:.1}  dominant background {:.2}%",
        m.dark_pct, m.bright_pct, m.min_sharpness, m.dominant_bg_pct
    );
    let r = &report.ratings;
    println!(
        "  lighting {} ({:.2})  contrast {} ({:.2})  sharpness {} ({:.2})",
        r.lighting_rating,
        r.mean_luma,
        r.contrast_rating,
        r.center_edge_contrast,
        r.sharpness_rating,
        r.center_sharpness
    );
    if report.is_capture_ready() {
        println!("  Ready for submission.");
    }
}
