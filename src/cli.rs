use clap::Parser;
use std::path::PathBuf;

// Build version with target info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Images: image 0.25 (png, jpeg)\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Satellite globe year player
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Asset directory containing imgs/ and outputs/ (overrides settings)
    #[arg(value_name = "ASSETS_DIR")]
    pub assets_dir: Option<PathBuf>,

    /// Spectrum to show on startup (modis, aster, ceres, misr, mopitt)
    #[arg(short = 's', long = "spectrum", value_name = "NAME")]
    pub spectrum: Option<String>,

    /// Auto-play on startup
    #[arg(short = 'a', long = "autoplay")]
    pub autoplay: bool,

    /// Play range start year
    #[arg(long = "start", value_name = "YEAR")]
    pub range_start: Option<i32>,

    /// Play range end year
    #[arg(long = "end", value_name = "YEAR")]
    pub range_end: Option<i32>,

    /// Play range (shorthand for --start and --end)
    #[arg(long = "range", value_names = ["START", "END"], num_args = 2)]
    pub range: Option<Vec<i32>>,

    /// Milliseconds each year stays on screen (overrides settings)
    #[arg(long = "frame-ms", value_name = "MS")]
    pub frame_ms: Option<f64>,

    /// Show the prediction image labelled with YEAR (2025-3000)
    #[arg(long = "predict", value_name = "YEAR")]
    pub predict: Option<i32>,

    /// Start the REST API server
    #[arg(long = "serve")]
    pub serve: bool,

    /// REST API port (overrides settings)
    #[arg(long = "port", value_name = "PORT")]
    pub port: Option<u16>,

    /// Enable debug logging to file (default: terraplay.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

impl Args {
    /// Requested play range. `--range` wins over `--start`/`--end`;
    /// a missing bound falls back to `current`.
    pub fn play_range(&self, current: (i32, i32)) -> Option<(i32, i32)> {
        if let Some(range) = &self.range {
            if let [start, end] = range.as_slice() {
                return Some((*start, *end));
            }
        }
        if self.range_start.is_none() && self.range_end.is_none() {
            return None;
        }
        Some((
            self.range_start.unwrap_or(current.0),
            self.range_end.unwrap_or(current.1),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("terraplay").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert!(args.assets_dir.is_none());
        assert!(!args.autoplay);
        assert_eq!(args.verbosity, 0);
        assert!(args.log_file.is_none());
        assert_eq!(args.play_range((2000, 2025)), None);
    }

    #[test]
    fn test_verbosity_and_log() {
        let args = parse(&["-vv", "--log"]);
        assert_eq!(args.verbosity, 2);
        assert_eq!(args.log_file, Some(None));

        let args = parse(&["-l", "out.log"]);
        assert_eq!(args.log_file, Some(Some(PathBuf::from("out.log"))));
    }

    #[test]
    fn test_play_range_resolution() {
        let args = parse(&["--range", "2003", "2010", "--start", "2001"]);
        assert_eq!(args.play_range((2000, 2025)), Some((2003, 2010)));

        let args = parse(&["--start", "2005"]);
        assert_eq!(args.play_range((2000, 2025)), Some((2005, 2025)));

        let args = parse(&["--end", "2002"]);
        assert_eq!(args.play_range((2000, 2025)), Some((2000, 2002)));
    }

    #[test]
    fn test_serve_flags() {
        let args = parse(&["public", "--serve", "--port", "8080", "-s", "ceres", "-a"]);
        assert_eq!(args.assets_dir, Some(PathBuf::from("public")));
        assert!(args.serve && args.autoplay);
        assert_eq!(args.port, Some(8080));
        assert_eq!(args.spectrum.as_deref(), Some("ceres"));
    }
}
