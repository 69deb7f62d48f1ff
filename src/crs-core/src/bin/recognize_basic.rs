//! recognize-basic: recognize one document page by page into a cleaned
//! image and UTF-8/UTF-16 text files per page.

use crs_core::cli::{self, RecognizeArgs};
use crs_core::colored_logger::{init_component_logger, Component};
use crs_engine::NativeEngine;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: RecognizeArgs = match cli::parse_args(std::env::args_os()) {
        Ok(args) => args,
        Err(status) => return ExitCode::from(status),
    };

    if let Err(e) = init_component_logger(Component::Recognize, args.common.verbose) {
        eprintln!("failed to initialize logging: {}", e);
    }

    let mut stdout = std::io::stdout().lock();
    ExitCode::from(cli::recognize(&args, NativeEngine::new(), &mut stdout))
}
