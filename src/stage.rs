//! Pipeline stages and output verbosity

use std::fmt;

use tracing::Level;

/// Stages of the preprocessing pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineStage {
    /// Initializing
    #[default]
    Initializing,
    /// Reading the input image
    Loading,
    /// Converting to 8-bit grayscale
    Grayscale,
    /// Normalizing to dark text on light background
    Polarity,
    /// Upscaling
    Scaling,
    /// Unsharp masking
    Sharpening,
    /// Adaptive Otsu binarization
    Binarizing,
    /// Furigana removal
    RemovingFurigana,
    /// Writing the output image
    Writing,
    /// Completed
    Completed,
}

impl PipelineStage {
    /// Get the English name of the stage
    pub fn name(&self) -> &'static str {
        match self {
            PipelineStage::Initializing => "Initializing",
            PipelineStage::Loading => "Loading",
            PipelineStage::Grayscale => "Grayscale",
            PipelineStage::Polarity => "Polarity",
            PipelineStage::Scaling => "Scaling",
            PipelineStage::Sharpening => "Sharpening",
            PipelineStage::Binarizing => "Binarizing",
            PipelineStage::RemovingFurigana => "RemovingFurigana",
            PipelineStage::Writing => "Writing",
            PipelineStage::Completed => "Completed",
        }
    }

    /// Get the Japanese description of the stage
    pub fn description_ja(&self) -> &'static str {
        match self {
            PipelineStage::Initializing => "初期化中",
            PipelineStage::Loading => "画像読込中",
            PipelineStage::Grayscale => "グレースケール変換中",
            PipelineStage::Polarity => "白黒反転判定中",
            PipelineStage::Scaling => "拡大中",
            PipelineStage::Sharpening => "シャープ化中",
            PipelineStage::Binarizing => "二値化中",
            PipelineStage::RemovingFurigana => "ルビ除去中",
            PipelineStage::Writing => "画像書出中",
            PipelineStage::Completed => "完了",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.description_ja())
    }
}

/// Output verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Warnings and errors only
    Quiet,
    /// Normal output (stage summary)
    #[default]
    Normal,
    /// Verbose output (per-stage timings)
    Verbose,
    /// Very verbose (span-level detail)
    VeryVerbose,
}

impl OutputMode {
    /// Create OutputMode from `-v` count and `--quiet`
    pub fn from_verbosity(level: u8, quiet: bool) -> Self {
        if quiet {
            return OutputMode::Quiet;
        }
        match level {
            0 => OutputMode::Normal,
            1 => OutputMode::Verbose,
            _ => OutputMode::VeryVerbose,
        }
    }

    /// Check if output should be shown at this mode
    pub fn should_show(&self, required: OutputMode) -> bool {
        use OutputMode::*;
        match (self, required) {
            (Quiet, _) => false,
            (Normal, Quiet | Normal) => true,
            (Verbose, Quiet | Normal | Verbose) => true,
            (VeryVerbose, _) => true,
            _ => false,
        }
    }

    /// Most detailed tracing level shown in this mode
    pub fn log_level(&self) -> Level {
        match self {
            OutputMode::Quiet => Level::WARN,
            OutputMode::Normal => Level::INFO,
            OutputMode::Verbose => Level::DEBUG,
            OutputMode::VeryVerbose => Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display() {
        assert_eq!(
            PipelineStage::RemovingFurigana.to_string(),
            "RemovingFurigana (ルビ除去中)"
        );
        assert_eq!(PipelineStage::default(), PipelineStage::Initializing);
    }

    #[test]
    fn test_output_mode_from_verbosity() {
        assert_eq!(OutputMode::from_verbosity(0, false), OutputMode::Normal);
        assert_eq!(OutputMode::from_verbosity(1, false), OutputMode::Verbose);
        assert_eq!(OutputMode::from_verbosity(5, false), OutputMode::VeryVerbose);
        assert_eq!(OutputMode::from_verbosity(3, true), OutputMode::Quiet);
    }

    #[test]
    fn test_should_show() {
        assert!(OutputMode::Normal.should_show(OutputMode::Normal));
        assert!(!OutputMode::Normal.should_show(OutputMode::Verbose));
        assert!(OutputMode::VeryVerbose.should_show(OutputMode::Verbose));
        assert!(!OutputMode::Quiet.should_show(OutputMode::Quiet));
    }

    #[test]
    fn test_log_level() {
        assert_eq!(OutputMode::Quiet.log_level(), Level::WARN);
        assert_eq!(OutputMode::Normal.log_level(), Level::INFO);
        assert_eq!(OutputMode::VeryVerbose.log_level(), Level::TRACE);
    }
}
