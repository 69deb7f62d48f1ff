//! script-language-id: report the script, and optionally the language, of
//! every page of every input document.

use crs_core::cli::{self, ScriptLanguageIdArgs};
use crs_core::colored_logger::{init_component_logger, Component};
use crs_engine::NativeEngine;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: ScriptLanguageIdArgs = match cli::parse_args(std::env::args_os()) {
        Ok(args) => args,
        Err(status) => return ExitCode::from(status),
    };

    if let Err(e) = init_component_logger(Component::ScriptLanguageId, args.common.verbose) {
        eprintln!("failed to initialize logging: {}", e);
    }

    let mut stdout = std::io::stdout().lock();
    ExitCode::from(cli::script_language_id(&args, NativeEngine::new(), &mut stdout))
}
