//! User-visible report lines
//!
//! The formats are fixed; scripts parse them.

use crs_engine::EngineError;
use std::io::{self, Write};
use std::path::Path;

/// Code reported for failures that did not come from the engine
pub const LOCAL_ERROR_CODE: i32 = -1;

/// Report sink that remembers whether a line is still open
pub struct ReportWriter<'a> {
    inner: &'a mut dyn Write,
    at_line_start: bool,
}

impl<'a> ReportWriter<'a> {
    pub fn new(inner: &'a mut dyn Write) -> Self {
        Self {
            inner,
            at_line_start: true,
        }
    }

    /// Terminate a partially written line, if any
    pub fn end_line(&mut self) -> io::Result<()> {
        if !self.at_line_start {
            writeln!(self)?;
        }
        Ok(())
    }
}

impl Write for ReportWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        if let Some(last) = buf[..written].last() {
            self.at_line_start = *last == b'\n';
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// `File=<path> Page=<n> ` opening a batch page line
pub fn page_header(out: &mut dyn Write, document: &Path, page: u32) -> io::Result<()> {
    write!(out, "File={} Page={} ", document.display(), page)
}

pub fn alphabet(out: &mut dyn Write, alphabet: &str) -> io::Result<()> {
    write!(out, "Alphabet={} ", alphabet)
}

pub fn language(out: &mut dyn Write, language: &str) -> io::Result<()> {
    write!(out, "Language={} ", language)
}

/// Terminate the page line and name the cleaned image
pub fn cleaned_image(out: &mut dyn Write, path: &Path) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "CleanedImage={}", path.display())
}

pub fn basename(out: &mut dyn Write, base: &Path) -> io::Result<()> {
    writeln!(out, "Basename is {}", base.display())
}

pub fn page_count(out: &mut dyn Write, count: u32) -> io::Result<()> {
    writeln!(out, "Page Count: {}", count)
}

pub fn recognized_language(out: &mut dyn Write, language: &str) -> io::Result<()> {
    writeln!(out, "Language = {}", language)
}

/// Code and text shown for a failed run
pub fn describe_error(err: &anyhow::Error) -> (i32, String) {
    if let Some(engine_err) = err.downcast_ref::<EngineError>() {
        if let Some(code) = engine_err.code() {
            return (code.get(), engine_err.message());
        }
    }
    (LOCAL_ERROR_CODE, format!("{:#}", err))
}

/// The `ERROR:` block
pub fn error(out: &mut dyn Write, code: i32, text: &str) -> io::Result<()> {
    writeln!(out, "ERROR:")?;
    writeln!(out, "\tcode: {}", code)?;
    writeln!(out, "\ttext: {}", text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crs_engine::{calls, MockEngine, Session};

    fn render(f: impl FnOnce(&mut dyn Write) -> io::Result<()>) -> String {
        let mut buffer: Vec<u8> = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_batch_page_line() {
        let text = render(|out| {
            page_header(out, Path::new("news.tif"), 2)?;
            alphabet(out, "Arabic")?;
            language(out, "Urdu")?;
            cleaned_image(out, Path::new("cleanedimg-0-2.tif"))
        });
        assert_eq!(
            text,
            "File=news.tif Page=2 Alphabet=Arabic Language=Urdu \nCleanedImage=cleanedimg-0-2.tif\n"
        );
    }

    #[test]
    fn test_end_line_only_closes_open_lines() {
        let mut buffer: Vec<u8> = Vec::new();
        {
            let mut writer = ReportWriter::new(&mut buffer);
            writer.end_line().unwrap();
            page_header(&mut writer, Path::new("a.tif"), 0).unwrap();
            writer.end_line().unwrap();
            writer.end_line().unwrap();
        }
        assert_eq!(String::from_utf8(buffer).unwrap(), "File=a.tif Page=0 \n");
    }

    #[test]
    fn test_error_block() {
        let text = render(|out| error(out, 17, "license not found"));
        assert_eq!(text, "ERROR:\n\tcode: 17\n\ttext: license not found\n");
    }

    #[test]
    fn test_engine_errors_keep_engine_code() {
        let engine = MockEngine::new().fail_on(calls::PROPERTIES_INITIALIZE, 1, 8, "bad install dir");
        let err = Session::initialize(engine, Path::new("/nowhere")).err().unwrap();

        let (code, text) = describe_error(&anyhow::Error::new(err));
        assert_eq!(code, 8);
        assert_eq!(text, "bad install dir");
    }

    #[test]
    fn test_local_errors_use_fallback_code() {
        let err = anyhow::anyhow!("noise filter level 9 out of range");
        let (code, text) = describe_error(&err.context("invalid page options"));
        assert_eq!(code, LOCAL_ERROR_CODE);
        assert!(text.starts_with("invalid page options"));
        assert!(text.contains("out of range"));
    }
}
