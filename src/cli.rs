//! Command-line interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::CliOverrides;
use crate::preprocess::{FuriganaMode, NegateMode};

/// OCR preprocessing for scanned Japanese pages
#[derive(Debug, Parser)]
#[command(name = "ocr-preprocess", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Preprocess one image
    Process(ProcessArgs),
    /// Positional interface: IN OUT NEGATE DARK_BG SCALE FACTOR USM HALFWIDTH FRACT OTSU SX SY SMOOTHX SMOOTHY SCOREFRACT FURIGANA
    Legacy(LegacyArgs),
    /// Show version, defaults and config locations
    Info,
}

/// Arguments for `process`
#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// Input image
    pub input: PathBuf,

    /// Output image (format from extension)
    pub output: PathBuf,

    /// Config file (default: ./ocr-preprocess.toml, then user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Polarity normalization
    #[arg(long, value_enum)]
    pub negate: Option<NegateMode>,

    /// Border darkness that triggers inversion in auto mode (0.0-1.0)
    #[arg(long)]
    pub dark_bg_threshold: Option<f32>,

    /// Upscaling factor
    #[arg(short, long)]
    pub scale: Option<f32>,

    /// Disable upscaling
    #[arg(long, conflicts_with = "scale")]
    pub no_scale: bool,

    /// Unsharp mask half-width
    #[arg(long)]
    pub unsharp_halfwidth: Option<u32>,

    /// Unsharp mask fraction
    #[arg(long)]
    pub unsharp_fract: Option<f32>,

    /// Disable unsharp masking
    #[arg(long)]
    pub no_unsharp: bool,

    /// Disable binarization (writes grayscale, skips furigana removal)
    #[arg(long)]
    pub no_binarize: bool,

    /// Otsu tile width
    #[arg(long)]
    pub tile_width: Option<u32>,

    /// Otsu tile height
    #[arg(long)]
    pub tile_height: Option<u32>,

    /// Threshold map smoothing half-width (x)
    #[arg(long)]
    pub smooth_x: Option<u32>,

    /// Threshold map smoothing half-width (y)
    #[arg(long)]
    pub smooth_y: Option<u32>,

    /// Otsu score fraction (0.0-1.0)
    #[arg(long)]
    pub score_fraction: Option<f32>,

    /// Furigana removal
    #[arg(short, long, value_enum)]
    pub furigana: Option<FuriganaMode>,

    /// Furigana threshold magnification (default: scale factor, 1.0 when unscaled)
    #[arg(long)]
    pub furigana_magnification: Option<f32>,

    /// Worker threads (default: all CPUs)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Print the resolved options and exit
    #[arg(long)]
    pub dry_run: bool,
}

impl ProcessArgs {
    /// Values explicitly given on the command line
    pub fn to_overrides(&self) -> CliOverrides {
        CliOverrides {
            negate: self.negate,
            dark_bg_threshold: self.dark_bg_threshold,
            scale: if self.no_scale {
                Some(false)
            } else {
                self.scale.map(|_| true)
            },
            scale_factor: self.scale,
            unsharp: self.no_unsharp.then_some(false),
            unsharp_halfwidth: self.unsharp_halfwidth,
            unsharp_fract: self.unsharp_fract,
            binarize: self.no_binarize.then_some(false),
            tile_width: self.tile_width,
            tile_height: self.tile_height,
            smooth_x: self.smooth_x,
            smooth_y: self.smooth_y,
            score_fraction: self.score_fraction,
            furigana: self.furigana,
            furigana_magnification: self.furigana_magnification,
            threads: self.threads,
        }
    }
}

/// Arguments for `legacy`
///
/// Flags are integers: 0 disables, anything else enables. Furigana
/// thresholds are always magnified by the scale factor, even when scaling
/// is off.
#[derive(Debug, Args)]
pub struct LegacyArgs {
    /// Input image
    pub input: PathBuf,

    /// Output image
    pub output: PathBuf,

    /// 0 = no, 1 = yes, 2 = auto
    #[arg(value_parser = clap::value_parser!(u8).range(0..=2))]
    pub negate: u8,

    /// Border darkness threshold for auto negate
    pub dark_bg_threshold: f32,

    /// Perform scaling
    pub scale: u32,

    /// Scale factor
    pub scale_factor: f32,

    /// Perform unsharp masking
    pub unsharp: u32,

    /// Unsharp mask half-width
    pub unsharp_halfwidth: u32,

    /// Unsharp mask fraction
    pub unsharp_fract: f32,

    /// Perform Otsu binarization
    pub binarize: u32,

    /// Otsu tile width
    pub tile_width: u32,

    /// Otsu tile height
    pub tile_height: u32,

    /// Threshold map smoothing (x)
    pub smooth_x: u32,

    /// Threshold map smoothing (y)
    pub smooth_y: u32,

    /// Otsu score fraction
    pub score_fraction: f32,

    /// 0 = none, 1 = vertical, 2 = horizontal
    #[arg(value_parser = clap::value_parser!(u8).range(0..=2))]
    pub furigana: u8,
}

impl LegacyArgs {
    /// Every positional value as an override
    pub fn to_overrides(&self) -> Result<CliOverrides, String> {
        Ok(CliOverrides {
            negate: Some(NegateMode::try_from(self.negate)?),
            dark_bg_threshold: Some(self.dark_bg_threshold),
            scale: Some(self.scale != 0),
            scale_factor: Some(self.scale_factor),
            unsharp: Some(self.unsharp != 0),
            unsharp_halfwidth: Some(self.unsharp_halfwidth),
            unsharp_fract: Some(self.unsharp_fract),
            binarize: Some(self.binarize != 0),
            tile_width: Some(self.tile_width),
            tile_height: Some(self.tile_height),
            smooth_x: Some(self.smooth_x),
            smooth_y: Some(self.smooth_y),
            score_fraction: Some(self.score_fraction),
            furigana: Some(FuriganaMode::try_from(self.furigana)?),
            furigana_magnification: Some(self.scale_factor),
            threads: None,
        })
    }
}
