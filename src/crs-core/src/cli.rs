//! Command lines of the two driver programs and their top-level handlers
//!
//! Handlers own the engine session for the whole run. Any error, from the
//! engine or from local validation, is propagated up to the handler, which
//! lets the session shut the engine down, prints the `ERROR:` block and maps
//! the outcome to the process exit status.

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser};
use crs_engine::{EngineApi, NoiseFilter, Session};
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use tracing::{error, info};

use crate::config::Config;
use crate::driver::{self, BatchSummary, FullRecognitionStrategy, ScriptLanguageStrategy};
use crate::report::{self, ReportWriter};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

/// Options shared by both programs
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Write a JSON summary of the run to this file
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(name = "script-language-id")]
#[command(about = "Identify the script, and optionally the language, of every page")]
#[command(
    after_help = "Example: script-language-id /opt/NovoDynamics/NovoVerus 1 newspaper.tif\n\
                  Input names starting with '-' go after '--': \
                  script-language-id /opt/NovoDynamics/NovoVerus 1 -- -scan.tif"
)]
#[command(version)]
pub struct ScriptLanguageIdArgs {
    /// Engine installation directory (license and resources)
    pub installation_directory: PathBuf,

    /// Run language identification after script identification (1|0|true|false)
    #[arg(value_parser = parse_switch, action = ArgAction::Set)]
    pub process_language_id: bool,

    /// Input documents, processed in order
    pub inputs: Vec<PathBuf>,

    /// Directory for cleaned images (default: current directory)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Noise filter level: 0 disables, 1-7 enable
    #[arg(long)]
    pub noise_filter: Option<u8>,

    /// Correct page orientation
    #[arg(long)]
    pub orientation_correction: bool,

    /// Crop page borders
    #[arg(long)]
    pub cropping: bool,

    /// Correct page skew
    #[arg(long)]
    pub deskewing: bool,

    /// Disable extended Arabic handwriting processing
    #[arg(long)]
    pub no_handwriting: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Parser, Debug)]
#[command(name = "recognize-basic")]
#[command(about = "Recognize every page of one document into cleaned image and text files")]
#[command(
    after_help = "Example: recognize-basic /opt/NovoDynamics/NovoVerus newspaper.tif newspaper-out"
)]
#[command(version)]
pub struct RecognizeArgs {
    /// Engine installation directory (license and resources)
    pub installation_directory: PathBuf,

    /// Input document
    pub input: PathBuf,

    /// Prefix of the generated files
    pub output_base: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Accepts both `1|0` and `true|false` spellings
fn parse_switch(value: &str) -> std::result::Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => Err(format!("expected 1, 0, true or false, got '{}'", other)),
    }
}

/// Parse a command line, or return the exit status to stop with.
///
/// Usage errors print the usage text and exit 1; `--help` and `--version`
/// exit 0.
pub fn parse_args<P, I, T>(args: I) -> std::result::Result<P, u8>
where
    P: Parser,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    P::try_parse_from(args).map_err(|err| {
        let _ = err.print();
        if err.use_stderr() {
            EXIT_FAILURE
        } else {
            EXIT_SUCCESS
        }
    })
}

/// Batch mode: script (and optional language) identification
pub fn script_language_id<E: EngineApi>(
    args: &ScriptLanguageIdArgs,
    engine: E,
    out: &mut dyn Write,
) -> u8 {
    let mut out = ReportWriter::new(out);
    let result = run_script_language_id(args, engine, &mut out);
    finish(result, &mut out)
}

/// Single-document mode: full recognition with text output
pub fn recognize<E: EngineApi>(args: &RecognizeArgs, engine: E, out: &mut dyn Write) -> u8 {
    let mut out = ReportWriter::new(out);
    let result = run_recognize(args, engine, &mut out);
    finish(result, &mut out)
}

fn run_script_language_id<E: EngineApi>(
    args: &ScriptLanguageIdArgs,
    engine: E,
    out: &mut dyn Write,
) -> Result<()> {
    let config = Config::load(args.common.config.as_deref())?;
    let strategy = batch_strategy(args, &config)?;
    let summary_path = args.common.summary.clone().or(config.output.summary);

    let mut session = Session::initialize(engine, &args.installation_directory)?;
    let summary = driver::run_batch(&mut session, &args.inputs, &strategy, out)?;
    session.shutdown();

    write_summary(&summary, summary_path)
}

fn run_recognize<E: EngineApi>(args: &RecognizeArgs, engine: E, out: &mut dyn Write) -> Result<()> {
    let config = Config::load(args.common.config.as_deref())?;
    let summary_path = args.common.summary.clone().or(config.output.summary);
    let strategy = FullRecognitionStrategy {
        output_base: args.output_base.clone(),
    };

    let mut session = Session::initialize(engine, &args.installation_directory)?;
    report::basename(out, &args.output_base)?;
    let summary = driver::run_batch(
        &mut session,
        std::slice::from_ref(&args.input),
        &strategy,
        out,
    )?;
    session.shutdown();

    write_summary(&summary, summary_path)
}

/// Page options from the config file with command-line overrides on top
fn batch_strategy(args: &ScriptLanguageIdArgs, config: &Config) -> Result<ScriptLanguageStrategy> {
    let mut options = config.page.clone();
    if let Some(level) = args.noise_filter {
        options.noise_filter = NoiseFilter::new(level).context("invalid --noise-filter")?;
    }
    options.orientation_correction |= args.orientation_correction;
    options.cropping |= args.cropping;
    options.deskewing |= args.deskewing;
    if args.no_handwriting {
        options.handwriting_processing = false;
    }

    Ok(ScriptLanguageStrategy {
        options,
        identify_language: args.process_language_id,
        output_dir: args
            .output_dir
            .clone()
            .or_else(|| config.output.cleaned_image_dir.clone()),
    })
}

fn write_summary(summary: &BatchSummary, path: Option<PathBuf>) -> Result<()> {
    if let Some(path) = path {
        summary
            .write_json(&path)
            .with_context(|| format!("failed to write summary {:?}", path))?;
        info!("summary written to {:?}", path);
    }
    Ok(())
}

fn finish(result: Result<()>, out: &mut ReportWriter<'_>) -> u8 {
    match result {
        Ok(()) => {
            let _ = out.flush();
            EXIT_SUCCESS
        }
        Err(err) => {
            let (code, text) = report::describe_error(&err);
            error!("run failed: {:#}", err);
            let _ = out.end_line();
            let _ = report::error(out, code, &text);
            let _ = out.flush();
            EXIT_FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_switch_spellings() {
        assert_eq!(parse_switch("1"), Ok(true));
        assert_eq!(parse_switch("0"), Ok(false));
        assert_eq!(parse_switch("True"), Ok(true));
        assert_eq!(parse_switch("FALSE"), Ok(false));
        assert!(parse_switch("maybe").is_err());
    }

    #[test]
    fn test_parse_batch_command_line() {
        let args: ScriptLanguageIdArgs = parse_args([
            "script-language-id",
            "/opt/crs",
            "1",
            "a.tif",
            "b.tif",
            "--noise-filter",
            "3",
        ])
        .unwrap();

        assert_eq!(args.installation_directory, PathBuf::from("/opt/crs"));
        assert!(args.process_language_id);
        assert_eq!(args.inputs, vec![PathBuf::from("a.tif"), PathBuf::from("b.tif")]);
        assert_eq!(args.noise_filter, Some(3));
    }

    #[test]
    fn test_dash_prefixed_inputs_after_separator() {
        assert!(parse_args::<ScriptLanguageIdArgs, _, _>([
            "script-language-id",
            "/opt/crs",
            "1",
            "-scan.tif",
        ])
        .is_err());

        let args: ScriptLanguageIdArgs = parse_args([
            "script-language-id",
            "/opt/crs",
            "1",
            "--noise-filter",
            "2",
            "--",
            "-scan.tif",
            "b.tif",
        ])
        .unwrap();
        assert_eq!(
            args.inputs,
            vec![PathBuf::from("-scan.tif"), PathBuf::from("b.tif")]
        );
        assert_eq!(args.noise_filter, Some(2));

        let help = ScriptLanguageIdArgs::command().render_help().to_string();
        assert!(help.contains("-- -scan.tif"));
    }

    #[test]
    fn test_missing_arguments_exit_with_one() {
        let status = parse_args::<ScriptLanguageIdArgs, _, _>(["script-language-id"]).unwrap_err();
        assert_eq!(status, EXIT_FAILURE);

        let status =
            parse_args::<RecognizeArgs, _, _>(["recognize-basic", "/opt/crs", "in.tif"]).unwrap_err();
        assert_eq!(status, EXIT_FAILURE);

        let status = parse_args::<RecognizeArgs, _, _>([
            "recognize-basic",
            "/opt/crs",
            "in.tif",
            "out",
            "extra",
        ])
        .unwrap_err();
        assert_eq!(status, EXIT_FAILURE);
    }

    #[test]
    fn test_help_exits_with_zero() {
        let status =
            parse_args::<RecognizeArgs, _, _>(["recognize-basic", "--help"]).unwrap_err();
        assert_eq!(status, EXIT_SUCCESS);
    }

    #[test]
    fn test_overrides_apply_on_top_of_config() {
        let args: ScriptLanguageIdArgs = parse_args([
            "script-language-id",
            "/opt/crs",
            "0",
            "--deskewing",
            "--no-handwriting",
        ])
        .unwrap();
        let mut config = Config::default();
        config.page.cropping = true;
        config.output.cleaned_image_dir = Some(PathBuf::from("cleaned"));

        let strategy = batch_strategy(&args, &config).unwrap();
        assert!(strategy.options.cropping);
        assert!(strategy.options.deskewing);
        assert!(!strategy.options.handwriting_processing);
        assert!(!strategy.identify_language);
        assert_eq!(strategy.output_dir, Some(PathBuf::from("cleaned")));
    }

    #[test]
    fn test_out_of_range_noise_filter_is_rejected() {
        let args: ScriptLanguageIdArgs =
            parse_args(["script-language-id", "/opt/crs", "0", "--noise-filter", "8"]).unwrap();
        assert!(batch_strategy(&args, &Config::default()).is_err());
    }
}
