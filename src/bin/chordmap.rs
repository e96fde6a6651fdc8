// Chordmap CLI
// Compiles a chord layout and prints or splices the generated C tables

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use chordmap_core::{describe_byte, emit, CompiledKeyboard, Keyboard};

/// Chorded keyboard table compiler
#[derive(Parser, Debug)]
#[command(name = "chordmap")]
#[command(author = "chordmap contributors")]
#[command(version)]
#[command(about = "Compile chorded keyboard layouts into firmware lookup tables", long_about = None)]
struct Args {
    /// TOML layout configuration (defaults to the built-in ASETNIOP layout)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Write the generated tables to a file instead of stdout
    #[arg(short, long, value_name = "FILE", conflicts_with = "splice")]
    output: Option<PathBuf>,

    /// Replace the generated region of an existing C source file
    #[arg(long, value_name = "FILE")]
    splice: Option<PathBuf>,

    /// Compile and validate only, write nothing
    #[arg(long, conflicts_with_all = ["output", "splice"])]
    check: bool,

    /// Show the bitmask and per-layer bytes of one chord (e.g. "as")
    #[arg(long, value_name = "KEYS", conflicts_with_all = ["output", "splice", "check"])]
    chord: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Main application state
struct Application {
    args: Args,
    keyboard: Keyboard,
}

impl Application {
    /// Load the configuration named on the command line
    fn new(args: Args) -> Result<Self> {
        let keyboard = match &args.config {
            Some(path) => Keyboard::from_toml_path(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => Keyboard::builtin().context("built-in configuration is invalid")?,
        };
        Ok(Self { args, keyboard })
    }

    fn run(&self) -> Result<()> {
        let compiled = self.keyboard.compile().context("compilation failed")?;

        if let Some(keys) = &self.args.chord {
            return Self::print_chord(&compiled, keys);
        }

        if self.args.check {
            println!(
                "{}: {} layouts, {} layers, {} scan codes OK",
                compiled.name,
                compiled.layouts.len(),
                compiled.layers.len(),
                compiled.scancodes.len()
            );
            return Ok(());
        }

        let generated = emit::render(&compiled);

        if let Some(path) = &self.args.splice {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let spliced = emit::splice(&source, &generated)
                .with_context(|| format!("cannot splice into {}", path.display()))?;
            fs::write(path, spliced).with_context(|| format!("failed to write {}", path.display()))?;
            log::info!("spliced tables into {}", path.display());
        } else if let Some(path) = &self.args.output {
            fs::write(path, &generated)
                .with_context(|| format!("failed to write {}", path.display()))?;
            log::info!("wrote tables to {}", path.display());
        } else {
            print!("{}", generated);
        }
        Ok(())
    }

    fn print_chord(compiled: &CompiledKeyboard, keys: &str) -> Result<()> {
        let lookup = compiled
            .lookup(keys)
            .with_context(|| format!("unknown chord '{}'", keys))?;
        println!(
            "chord {} ({}) mask 0x{:02X}",
            lookup.chord, lookup.layout, lookup.mask
        );
        for (layer, byte) in &lookup.bytes {
            println!("  {:<10} {}", layer, describe_byte(*byte));
        }
        Ok(())
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match Application::new(args).and_then(|app| app.run()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["chordmap"]);

        assert!(args.config.is_none());
        assert!(args.output.is_none());
        assert!(args.splice.is_none());
        assert!(args.chord.is_none());
        assert!(!args.check);
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_with_options() {
        let args = Args::parse_from([
            "chordmap",
            "--config",
            "/tmp/layout.toml",
            "--output",
            "/tmp/maps.h",
            "--verbose",
        ]);

        assert_eq!(args.config, Some(PathBuf::from("/tmp/layout.toml")));
        assert_eq!(args.output, Some(PathBuf::from("/tmp/maps.h")));
        assert!(args.verbose);
    }

    #[test]
    fn test_args_check_conflicts_with_output() {
        let result = Args::try_parse_from(["chordmap", "--check", "--output", "/tmp/maps.h"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_args_chord() {
        let args = Args::parse_from(["chordmap", "--chord", "as"]);
        assert_eq!(args.chord.as_deref(), Some("as"));
    }

    #[test]
    fn test_args_chord_conflicts_with_outputs() {
        for extra in [
            &["--output", "/tmp/maps.h"][..],
            &["--splice", "/tmp/asetniop.c"][..],
            &["--check"][..],
        ] {
            let mut argv = vec!["chordmap", "--chord", "as"];
            argv.extend_from_slice(extra);
            assert!(Args::try_parse_from(argv).is_err(), "{:?}", extra);
        }
    }

    #[test]
    fn test_default_application_compiles() {
        let app = Application::new(Args::parse_from(["chordmap", "--check"])).unwrap();
        assert!(app.run().is_ok());
    }

    #[test]
    fn test_missing_config_file_fails() {
        let args = Args::parse_from(["chordmap", "--config", "/nonexistent/chordmap.toml"]);
        let err = Application::new(args).err().unwrap();
        assert!(format!("{:#}", err).contains("failed to load /nonexistent/chordmap.toml"));
    }
}
