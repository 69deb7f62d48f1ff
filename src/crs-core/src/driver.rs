//! Recognition session driver
//!
//! Walks documents in the order given and their pages in ascending order,
//! handing each page to a [`PageStrategy`]. Two strategies exist because the
//! engine supports two call sequences:
//!
//! - [`ScriptLanguageStrategy`]: phase by phase, reporting the alphabet and
//!   optionally the language of each page.
//! - [`FullRecognitionStrategy`]: one combined recognition call producing
//!   text output.
//!
//! The first error ends the batch; it is returned to the caller, which owns
//! the session and therefore its shutdown.

use anyhow::Result;
use crs_engine::{Document, EngineApi, OutputPaths, PageOptions, Session};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::outputs;
use crate::report;

/// Where a page sits in the batch
#[derive(Debug, Clone, Copy)]
pub struct PagePosition<'a> {
    /// 0-based position of the document among the inputs
    pub document_index: usize,
    pub document: &'a Path,
    /// 0-based page number within the document
    pub page: u32,
}

/// What happened to one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub page: u32,
    pub alphabet: Option<String>,
    pub language: Option<String>,
    pub outputs: OutputPaths,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub path: PathBuf,
    pub page_count: u32,
    pub pages: Vec<PageRecord>,
}

/// Everything a successful run processed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub documents: Vec<DocumentRecord>,
}

impl BatchSummary {
    pub fn pages_processed(&self) -> usize {
        self.documents.iter().map(|document| document.pages.len()).sum()
    }

    /// Write the summary as pretty JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// One way of driving a page through the engine
pub trait PageStrategy {
    /// Called once a document is bound, before its first page
    fn begin_document<E: EngineApi>(
        &self,
        _document: &Document<'_, E>,
        _out: &mut dyn Write,
    ) -> Result<()> {
        Ok(())
    }

    /// Open the next page of `document`, process it and close it
    fn process_page<E: EngineApi>(
        &self,
        document: &mut Document<'_, E>,
        position: PagePosition<'_>,
        out: &mut dyn Write,
    ) -> Result<PageRecord>;
}

/// Phase-by-phase script (and optionally language) identification
#[derive(Debug, Clone, Default)]
pub struct ScriptLanguageStrategy {
    pub options: PageOptions,
    pub identify_language: bool,
    /// Directory for cleaned images; None writes bare file names
    pub output_dir: Option<PathBuf>,
}

impl PageStrategy for ScriptLanguageStrategy {
    fn process_page<E: EngineApi>(
        &self,
        document: &mut Document<'_, E>,
        position: PagePosition<'_>,
        out: &mut dyn Write,
    ) -> Result<PageRecord> {
        report::page_header(out, position.document, position.page)?;

        let mut page = document.begin_page()?;
        page.configure(&self.options)?;

        let alphabet = page.run_script_identification()?;
        report::alphabet(out, &alphabet)?;

        let language = if self.identify_language {
            let language = page.run_language_identification()?;
            report::language(out, &language)?;
            Some(language)
        } else {
            None
        };

        let cleaned = outputs::cleaned_image_path(
            self.output_dir.as_deref(),
            position.document_index,
            position.page,
        );
        report::cleaned_image(out, &cleaned)?;

        let outputs = OutputPaths::cleaned_only(cleaned);
        page.set_output_paths(&outputs)?;
        page.write_outputs_and_close()?;

        Ok(PageRecord {
            page: position.page,
            alphabet: Some(alphabet),
            language,
            outputs,
        })
    }
}

/// Single-call recognition with cleaned image and text outputs
#[derive(Debug, Clone)]
pub struct FullRecognitionStrategy {
    /// Prefix of every generated file
    pub output_base: PathBuf,
}

impl PageStrategy for FullRecognitionStrategy {
    fn begin_document<E: EngineApi>(
        &self,
        document: &Document<'_, E>,
        out: &mut dyn Write,
    ) -> Result<()> {
        report::page_count(out, document.page_count())?;
        Ok(())
    }

    fn process_page<E: EngineApi>(
        &self,
        document: &mut Document<'_, E>,
        position: PagePosition<'_>,
        out: &mut dyn Write,
    ) -> Result<PageRecord> {
        let mut page = document.begin_page()?;

        let outputs = outputs::recognition_outputs(&self.output_base, position.page);
        page.set_output_paths(&outputs)?;

        let language = page.run_full_recognition()?;
        report::recognized_language(out, &language)?;

        page.write_outputs_and_close()?;

        Ok(PageRecord {
            page: position.page,
            alphabet: None,
            language: Some(language),
            outputs,
        })
    }
}

/// Drive every page of every input through `strategy`
pub fn run_batch<E, S>(
    session: &mut Session<E>,
    inputs: &[PathBuf],
    strategy: &S,
    out: &mut dyn Write,
) -> Result<BatchSummary>
where
    E: EngineApi,
    S: PageStrategy,
{
    let mut summary = BatchSummary::default();

    for (document_index, path) in inputs.iter().enumerate() {
        info!("processing document {}: {:?}", document_index, path);

        let mut document = session.open_document(path)?;
        strategy.begin_document(&document, out)?;

        let page_count = document.page_count();
        let mut pages = Vec::new();
        for page in 0..page_count {
            let position = PagePosition {
                document_index,
                document: path,
                page,
            };
            pages.push(strategy.process_page(&mut document, position, out)?);
        }
        out.flush()?;

        debug!("finished {:?}", path);
        summary.documents.push(DocumentRecord {
            path: path.clone(),
            page_count,
            pages,
        });
    }

    info!(
        "processed {} page(s) in {} document(s)",
        summary.pages_processed(),
        summary.documents.len()
    );
    Ok(summary)
}
