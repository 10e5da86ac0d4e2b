//! cam_bloom — interactive entry point.

use std::path::PathBuf;

use cam_bloom::app::{run, AppConfig};

fn main() {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        cam_bloom — gesture-controlled digital bouquet        ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Mode: LeapMotion hand tracking");
    #[cfg(not(feature = "leap"))]
    println!("  Mode: keyboard simulation  (use --features leap for hardware)");
    println!();

    let cfg = match parse_args() {
        Some(cfg) => cfg,
        None => return, // --help
    };

    println!("  Opening bouquet window…");
    println!();

    if let Err(e) = run(cfg) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn parse_args() -> Option<AppConfig> {
    let mut cfg = AppConfig::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--font" => {
                cfg.font_path = args.next().map(PathBuf::from);
                if cfg.font_path.is_none() {
                    eprintln!("--font needs a path");
                }
            }
            "--particles" => {
                cfg.particle_count = args
                    .next()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(cfg.particle_count)
                    .clamp(100, 200_000);
            }
            "--text" => {
                if let Some(t) = args.next() {
                    cfg.love_text = t;
                }
            }
            "--help" | "-h" => {
                print_usage();
                return None;
            }
            other => eprintln!("  ignoring unknown argument: {}", other),
        }
    }
    Some(cfg)
}

fn print_usage() {
    println!("  Usage: cam_bloom [options]");
    println!();
    println!("    --font <path>       TTF used for the text formations");
    println!("    --particles <n>     particle count (default 5000)");
    println!("    --text <string>     text for the LOVE formation");
    println!("    --help              this message");
    println!();
    println!("  Keys: B=cycle  C=tracking  1-6=pose  0=hand gone  Q=quit");
}
