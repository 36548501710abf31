//! ocr-preprocess - OCR preprocessing for scanned Japanese pages
//!
//! CLI entry point

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ocr_preprocess::{
    exit_codes, Cli, CliOverrides, Commands, Config, ConfigError, LegacyArgs, OutputMode,
    PipelineResult, PreprocessError, PreprocessOptions, Preprocessor, ProcessArgs,
};

fn main() {
    let cli = Cli::parse();
    let mode = OutputMode::from_verbosity(cli.verbose, cli.quiet);
    init_tracing(mode);

    let result = match cli.command {
        Commands::Process(args) => run_process(&args, mode),
        Commands::Legacy(args) => run_legacy(&args, mode),
        Commands::Info => run_info(),
    };

    std::process::exit(match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<PreprocessError>() {
                Some(failure) => eprintln!("Error during {}: {:#}", failure.stage(), e),
                None => eprintln!("Error: {:#}", e),
            }
            exit_code_for(&e)
        }
    });
}

/// `RUST_LOG` wins; otherwise the level follows -v/-q
fn init_tracing(mode: OutputMode) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "ocr_preprocess={}",
            mode.log_level().as_str().to_lowercase()
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Pipeline failures carry their stage code; everything else is configuration
fn exit_code_for(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<PreprocessError>()
        .map_or(exit_codes::CONFIG_ERROR, PreprocessError::exit_code)
}

// ============ Process Command ============

fn run_process(args: &ProcessArgs, mode: OutputMode) -> anyhow::Result<()> {
    let file_config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    let options = file_config.merge_with_cli(&args.to_overrides())?;

    if args.dry_run {
        print_execution_plan(args, &options);
        return Ok(());
    }

    let result = Preprocessor::new(options)
        .process_file(&args.input, &args.output)
        .with_context(|| format!("processing {}", args.input.display()))?;

    print_summary(&result, mode);
    Ok(())
}

// ============ Legacy Command ============

fn run_legacy(args: &LegacyArgs, mode: OutputMode) -> anyhow::Result<()> {
    let overrides: CliOverrides = args.to_overrides().map_err(|message| {
        ConfigError::InvalidValue {
            field: "mode",
            message,
        }
    })?;
    let options = Config::default().merge_with_cli(&overrides)?;

    let result = Preprocessor::new(options)
        .process_file(&args.input, &args.output)
        .with_context(|| format!("processing {}", args.input.display()))?;

    print_summary(&result, mode);
    Ok(())
}

// ============ Helper Functions ============

fn print_summary(result: &PipelineResult, mode: OutputMode) {
    let (width, height) = result.output.dimensions();
    info!(
        width,
        height,
        negated = result.negated,
        elapsed_seconds = result.elapsed_seconds,
        "page processed"
    );

    if !mode.should_show(OutputMode::Verbose) {
        return;
    }

    println!("Output: {}x{}", width, height);
    println!("Negated: {}", if result.negated { "YES" } else { "NO" });
    if let Some(report) = &result.furigana {
        println!(
            "Furigana: {} spans, {} kept, average width {}, {} lines erased{}",
            report.spans_found,
            report.spans_kept,
            report.average_width,
            report.erased_lines(),
            if report.truncated { " (span list full)" } else { "" }
        );
    }
    println!("Time: {:.2}s", result.elapsed_seconds);
}

/// Print execution plan for dry-run mode
fn print_execution_plan(args: &ProcessArgs, options: &PreprocessOptions) {
    println!("=== Dry Run - Execution Plan ===");
    println!();
    println!("Input: {}", args.input.display());
    println!("Output: {}", args.output.display());
    println!();
    println!("Pipeline:");
    println!("  1. Grayscale");
    println!(
        "  2. Polarity: {:?} (threshold {})",
        options.polarity.mode, options.polarity.dark_bg_threshold
    );
    if options.scale.enabled {
        println!("  3. Scaling: {}x", options.scale.factor);
    } else {
        println!("  3. Scaling: DISABLED");
    }
    if options.unsharp.enabled {
        println!(
            "  4. Unsharp mask: halfwidth {}, fract {}",
            options.unsharp.halfwidth, options.unsharp.fract
        );
    } else {
        println!("  4. Unsharp mask: DISABLED");
    }
    if options.binarize.enabled {
        println!(
            "  5. Adaptive Otsu: tiles {}x{}, smoothing {}x{}, score fraction {}",
            options.binarize.tile_width,
            options.binarize.tile_height,
            options.binarize.smooth_x,
            options.binarize.smooth_y,
            options.binarize.score_fraction
        );
        println!(
            "  6. Furigana removal: {:?} (magnification {})",
            options.furigana.mode,
            options.magnification()
        );
    } else {
        println!("  5. Adaptive Otsu: DISABLED");
        println!("  6. Furigana removal: SKIPPED");
    }
    println!();
    println!("Threads: {}", options.threads.unwrap_or_else(num_cpus::get));
    println!();
    println!("Resolved options:");
    println!("{}", options.to_json());
}

// ============ Info Command ============

fn run_info() -> anyhow::Result<()> {
    println!("ocr-preprocess v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("System Information:");
    println!("  Platform: {}", std::env::consts::OS);
    println!("  Arch: {}", std::env::consts::ARCH);
    println!("  CPUs: {}", num_cpus::get());

    println!();
    println!("Config File Locations:");
    for path in Config::search_paths() {
        let status = if path.is_file() { "found" } else { "not found" };
        println!("  {} ({})", path.display(), status);
    }

    println!();
    println!("Defaults:");
    let defaults = Config::default()
        .to_toml()
        .context("serializing default config")?;
    for line in defaults.lines() {
        println!("  {}", line);
    }

    Ok(())
}
