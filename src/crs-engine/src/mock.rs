//! Recording stand-in for the recognition engine
//!
//! `MockEngine` answers the [`EngineApi`] surface from an in-memory catalogue
//! of documents, journals every call into a shared [`CallLog`], and enforces
//! the engine's call ordering itself. A misordered call is answered with
//! [`SEQUENCE_ERROR_CODE`] instead of being silently accepted.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::CStr;
use std::rc::Rc;

use tracing::debug;

use crate::api::{calls, CallResult, EngineApi};
use crate::error::ErrorCode;

/// Status returned when a call violates the engine lifecycle
pub const SEQUENCE_ERROR_CODE: i32 = -9000;

/// Status returned by `set_input_path` for a path missing from the catalogue
pub const UNKNOWN_DOCUMENT_CODE: i32 = 3;

/// One recorded engine call with its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    PropertiesInitialize(String),
    SystemInitialize,
    SystemShutdown,
    SetInputPath(String),
    GetInputPageCount,
    PageInitialize,
    SetOrientationCorrection(bool),
    SetCropping(bool),
    SetDeskewing(bool),
    SetHandwriting(bool),
    SetNoiseFilter(u8),
    PreprocessAndCleanPage,
    DecomposePage,
    IdentifyLanguage,
    Recognize,
    GetAlphabetFound,
    GetLanguageFound,
    SetCleanedOutputPath(String),
    SetUtf8OutputPath(String),
    SetUtf16OutputPath(String),
    WriteOutput,
    GetErrorText,
}

impl Call {
    /// C function name of the call
    pub fn name(&self) -> &'static str {
        match self {
            Call::PropertiesInitialize(_) => calls::PROPERTIES_INITIALIZE,
            Call::SystemInitialize => calls::SYSTEM_INITIALIZE,
            Call::SystemShutdown => calls::SYSTEM_SHUTDOWN,
            Call::SetInputPath(_) => calls::SET_INPUT_PATH,
            Call::GetInputPageCount => calls::GET_INPUT_PAGE_COUNT,
            Call::PageInitialize => calls::PAGE_INITIALIZE,
            Call::SetOrientationCorrection(_) => calls::SET_ORIENTATION_CORRECTION,
            Call::SetCropping(_) => calls::SET_CROPPING,
            Call::SetDeskewing(_) => calls::SET_DESKEWING,
            Call::SetHandwriting(_) => calls::SET_HANDWRITING,
            Call::SetNoiseFilter(_) => calls::SET_NOISE_FILTER,
            Call::PreprocessAndCleanPage => calls::PHASE1_PREPROCESS,
            Call::DecomposePage => calls::PHASE2_DECOMPOSE,
            Call::IdentifyLanguage => calls::PHASE3_IDENTIFY_LANGUAGE,
            Call::Recognize => calls::RECOGNIZE,
            Call::GetAlphabetFound => calls::GET_ALPHABET_FOUND,
            Call::GetLanguageFound => calls::GET_LANGUAGE_FOUND,
            Call::SetCleanedOutputPath(_) => calls::SET_CLEANED_OUTPUT_PATH,
            Call::SetUtf8OutputPath(_) => calls::SET_UTF8_OUTPUT_PATH,
            Call::SetUtf16OutputPath(_) => calls::SET_UTF16_OUTPUT_PATH,
            Call::WriteOutput => calls::WRITE_OUTPUT,
            Call::GetErrorText => calls::GET_ERROR_TEXT,
        }
    }
}

/// Outputs flushed by one `write_output` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenPage {
    pub document: String,
    pub page: u32,
    pub cleaned_image: Option<String>,
    pub utf8_text: Option<String>,
    pub utf16_text: Option<String>,
}

impl WrittenPage {
    /// Registered paths in write order
    pub fn paths(&self) -> Vec<String> {
        self.cleaned_image
            .iter()
            .chain(self.utf8_text.iter())
            .chain(self.utf16_text.iter())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Default)]
struct Journal {
    calls: Vec<Call>,
    writes: Vec<WrittenPage>,
}

/// Shared handle on the mock's journal.
///
/// Clones observe the same journal, so a test can keep one while the engine
/// itself is moved into a session and dropped.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    inner: Rc<RefCell<Journal>>,
}

impl CallLog {
    pub fn calls(&self) -> Vec<Call> {
        self.inner.borrow().calls.clone()
    }

    /// Function names of every recorded call, in order
    pub fn names(&self) -> Vec<&'static str> {
        self.inner.borrow().calls.iter().map(Call::name).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter(|call| call.name() == name)
            .count()
    }

    pub fn writes(&self) -> Vec<WrittenPage> {
        self.inner.borrow().writes.clone()
    }

    /// Every output path registered across all written pages
    pub fn written_paths(&self) -> Vec<String> {
        self.inner
            .borrow()
            .writes
            .iter()
            .flat_map(WrittenPage::paths)
            .collect()
    }

    fn record(&self, call: Call) {
        self.inner.borrow_mut().calls.push(call);
    }

    fn record_write(&self, page: WrittenPage) {
        self.inner.borrow_mut().writes.push(page);
    }
}

/// Classification results the mock reports for one page, as engine bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockPage {
    pub alphabet: Vec<u8>,
    pub language: Vec<u8>,
}

impl MockPage {
    pub fn new(alphabet: impl Into<String>, language: impl Into<String>) -> Self {
        Self::from_bytes(alphabet.into(), language.into())
    }

    /// Page whose names need not be UTF-8, like a legacy code page
    pub fn from_bytes(alphabet: impl Into<Vec<u8>>, language: impl Into<Vec<u8>>) -> Self {
        Self {
            alphabet: alphabet.into(),
            language: language.into(),
        }
    }
}

impl Default for MockPage {
    fn default() -> Self {
        Self::new("Latin", "English")
    }
}

#[derive(Debug, Clone)]
struct Failure {
    call: &'static str,
    occurrence: usize,
    code: i32,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Fresh,
    PropertiesLoaded,
    Ready,
    ShutDown,
}

#[derive(Debug, Default)]
struct OpenPage {
    index: u32,
    cleaned: bool,
    decomposed: bool,
    language_identified: bool,
    recognized: bool,
}

#[derive(Debug)]
struct BoundDocument {
    path: String,
    pages: Vec<MockPage>,
    next_page: u32,
}

/// In-memory engine that journals calls and polices their order
#[derive(Debug)]
pub struct MockEngine {
    catalogue: HashMap<String, Vec<MockPage>>,
    reported_counts: HashMap<String, u32>,
    failures: Vec<Failure>,
    occurrences: HashMap<&'static str, usize>,
    lifecycle: Lifecycle,
    document: Option<BoundDocument>,
    page: Option<OpenPage>,
    cleaned_output: Option<String>,
    utf8_output: Option<String>,
    utf16_output: Option<String>,
    last_error: String,
    log: CallLog,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            catalogue: HashMap::new(),
            reported_counts: HashMap::new(),
            failures: Vec::new(),
            occurrences: HashMap::new(),
            lifecycle: Lifecycle::Fresh,
            document: None,
            page: None,
            cleaned_output: None,
            utf8_output: None,
            utf16_output: None,
            last_error: String::new(),
            log: CallLog::default(),
        }
    }

    /// Register a document with explicit per-page results
    pub fn with_document(mut self, path: impl Into<String>, pages: Vec<MockPage>) -> Self {
        self.catalogue.insert(path.into(), pages);
        self
    }

    /// Register a document of `count` default pages
    pub fn with_pages(self, path: impl Into<String>, count: usize) -> Self {
        self.with_document(path, vec![MockPage::default(); count])
    }

    /// Make `crs_get_input_page_count` report `count` for `path`, whatever
    /// the number of catalogued pages
    pub fn report_page_count(mut self, path: impl Into<String>, count: u32) -> Self {
        self.reported_counts.insert(path.into(), count);
        self
    }

    /// Fail the `occurrence`-th (1-based) invocation of `call`
    pub fn fail_on(
        mut self,
        call: &'static str,
        occurrence: usize,
        code: i32,
        message: impl Into<String>,
    ) -> Self {
        self.failures.push(Failure {
            call,
            occurrence,
            code,
            message: message.into(),
        });
        self
    }

    /// Handle on the call journal
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    fn enter(&mut self, call: Call) -> CallResult {
        let name = call.name();
        debug!(call = name, "mock engine call");
        self.log.record(call);

        let seen = self.occurrences.entry(name).or_insert(0);
        *seen += 1;
        let seen = *seen;

        let injected = self
            .failures
            .iter()
            .find(|failure| failure.call == name && failure.occurrence == seen)
            .cloned();
        match injected {
            Some(failure) => self.fail(failure.code, failure.message),
            None => Ok(()),
        }
    }

    fn fail(&mut self, code: i32, message: impl Into<String>) -> CallResult {
        self.last_error = message.into();
        Err(ErrorCode::raw(code))
    }

    fn require(&mut self, holds: bool, call: &'static str) -> CallResult {
        if holds {
            Ok(())
        } else {
            self.fail(SEQUENCE_ERROR_CODE, format!("{} called out of order", call))
        }
    }

    fn ready(&self) -> bool {
        self.lifecycle == Lifecycle::Ready
    }

    fn page_mut(&mut self) -> Option<&mut OpenPage> {
        self.page.as_mut()
    }

    fn current_page(&self) -> Option<&MockPage> {
        let page = self.page.as_ref()?;
        let document = self.document.as_ref()?;
        document.pages.get(page.index as usize)
    }

    fn page_setting(&mut self, call: Call) -> CallResult {
        let name = call.name();
        self.enter(call)?;
        let open = self.ready() && self.page.is_some();
        self.require(open, name)
    }
}

fn lossy(text: &CStr) -> String {
    text.to_string_lossy().into_owned()
}

impl EngineApi for MockEngine {
    fn properties_initialize(&mut self, install_dir: &CStr) -> CallResult {
        self.enter(Call::PropertiesInitialize(lossy(install_dir)))?;
        self.require(
            self.lifecycle == Lifecycle::Fresh,
            calls::PROPERTIES_INITIALIZE,
        )?;
        self.lifecycle = Lifecycle::PropertiesLoaded;
        Ok(())
    }

    fn system_initialize(&mut self) -> CallResult {
        self.enter(Call::SystemInitialize)?;
        self.require(
            self.lifecycle == Lifecycle::PropertiesLoaded,
            calls::SYSTEM_INITIALIZE,
        )?;
        self.lifecycle = Lifecycle::Ready;
        Ok(())
    }

    fn system_shutdown(&mut self) {
        debug!(call = calls::SYSTEM_SHUTDOWN, "mock engine call");
        self.log.record(Call::SystemShutdown);
        self.lifecycle = Lifecycle::ShutDown;
        self.document = None;
        self.page = None;
    }

    fn set_input_path(&mut self, path: &CStr) -> CallResult {
        let path = lossy(path);
        self.enter(Call::SetInputPath(path.clone()))?;
        let idle = self.ready() && self.page.is_none();
        self.require(idle, calls::SET_INPUT_PATH)?;

        match self.catalogue.get(&path) {
            Some(pages) => {
                self.document = Some(BoundDocument {
                    path,
                    pages: pages.clone(),
                    next_page: 0,
                });
                Ok(())
            }
            None => {
                self.document = None;
                self.fail(
                    UNKNOWN_DOCUMENT_CODE,
                    format!("cannot open input file {}", path),
                )
            }
        }
    }

    fn input_page_count(&mut self) -> CallResult<u32> {
        self.enter(Call::GetInputPageCount)?;
        let bound = self.ready() && self.document.is_some();
        self.require(bound, calls::GET_INPUT_PAGE_COUNT)?;
        Ok(self.document.as_ref().map_or(0, |document| {
            self.reported_counts
                .get(&document.path)
                .copied()
                .unwrap_or(document.pages.len() as u32)
        }))
    }

    fn page_initialize(&mut self) -> CallResult {
        self.enter(Call::PageInitialize)?;
        let next = self
            .document
            .as_ref()
            .filter(|document| (document.next_page as usize) < document.pages.len())
            .map(|document| document.next_page);
        let allowed = self.ready() && self.page.is_none() && next.is_some();
        self.require(allowed, calls::PAGE_INITIALIZE)?;

        if let (Some(index), Some(document)) = (next, self.document.as_mut()) {
            document.next_page += 1;
            self.page = Some(OpenPage {
                index,
                ..OpenPage::default()
            });
        }
        Ok(())
    }

    fn set_orientation_correction(&mut self, enabled: bool) -> CallResult {
        self.page_setting(Call::SetOrientationCorrection(enabled))
    }

    fn set_cropping(&mut self, enabled: bool) -> CallResult {
        self.page_setting(Call::SetCropping(enabled))
    }

    fn set_deskewing(&mut self, enabled: bool) -> CallResult {
        self.page_setting(Call::SetDeskewing(enabled))
    }

    fn set_handwriting_processing(&mut self, enabled: bool) -> CallResult {
        self.page_setting(Call::SetHandwriting(enabled))
    }

    fn set_noise_filter(&mut self, level: u8) -> CallResult {
        self.page_setting(Call::SetNoiseFilter(level))?;
        if level > 7 {
            return self.fail(1, format!("invalid noise filter level {}", level));
        }
        Ok(())
    }

    fn preprocess_and_clean_page(&mut self) -> CallResult {
        self.enter(Call::PreprocessAndCleanPage)?;
        let open = self.ready() && self.page.is_some();
        self.require(open, calls::PHASE1_PREPROCESS)?;
        if let Some(page) = self.page_mut() {
            page.cleaned = true;
        }
        Ok(())
    }

    fn decompose_page(&mut self) -> CallResult {
        self.enter(Call::DecomposePage)?;
        let cleaned = self.page.as_ref().map_or(false, |page| page.cleaned);
        self.require(self.ready() && cleaned, calls::PHASE2_DECOMPOSE)?;
        if let Some(page) = self.page_mut() {
            page.decomposed = true;
        }
        Ok(())
    }

    fn identify_language(&mut self) -> CallResult {
        self.enter(Call::IdentifyLanguage)?;
        let decomposed = self.page.as_ref().map_or(false, |page| page.decomposed);
        self.require(self.ready() && decomposed, calls::PHASE3_IDENTIFY_LANGUAGE)?;
        if let Some(page) = self.page_mut() {
            page.language_identified = true;
        }
        Ok(())
    }

    fn recognize(&mut self) -> CallResult {
        self.enter(Call::Recognize)?;
        let open = self.ready() && self.page.is_some();
        self.require(open, calls::RECOGNIZE)?;
        if let Some(page) = self.page_mut() {
            page.cleaned = true;
            page.decomposed = true;
            page.language_identified = true;
            page.recognized = true;
        }
        Ok(())
    }

    fn alphabet_found(&mut self) -> CallResult<Vec<u8>> {
        self.enter(Call::GetAlphabetFound)?;
        let cleaned = self.page.as_ref().map_or(false, |page| page.cleaned);
        self.require(self.ready() && cleaned, calls::GET_ALPHABET_FOUND)?;
        Ok(self
            .current_page()
            .map(|page| page.alphabet.clone())
            .unwrap_or_default())
    }

    fn language_found(&mut self) -> CallResult<Vec<u8>> {
        self.enter(Call::GetLanguageFound)?;
        let identified = self
            .page
            .as_ref()
            .map_or(false, |page| page.language_identified);
        self.require(self.ready() && identified, calls::GET_LANGUAGE_FOUND)?;
        Ok(self
            .current_page()
            .map(|page| page.language.clone())
            .unwrap_or_default())
    }

    fn set_cleaned_output_path(&mut self, path: &CStr) -> CallResult {
        let path = lossy(path);
        self.page_setting(Call::SetCleanedOutputPath(path.clone()))?;
        self.cleaned_output = Some(path);
        Ok(())
    }

    fn set_utf8_output_path(&mut self, path: &CStr) -> CallResult {
        let path = lossy(path);
        self.page_setting(Call::SetUtf8OutputPath(path.clone()))?;
        self.utf8_output = Some(path);
        Ok(())
    }

    fn set_utf16_output_path(&mut self, path: &CStr) -> CallResult {
        let path = lossy(path);
        self.page_setting(Call::SetUtf16OutputPath(path.clone()))?;
        self.utf16_output = Some(path);
        Ok(())
    }

    fn write_output(&mut self) -> CallResult {
        self.enter(Call::WriteOutput)?;
        let open = self.ready() && self.page.is_some();
        self.require(open, calls::WRITE_OUTPUT)?;

        if let (Some(page), Some(document)) = (self.page.take(), self.document.as_ref()) {
            self.log.record_write(WrittenPage {
                document: document.path.clone(),
                page: page.index,
                cleaned_image: self.cleaned_output.take(),
                utf8_text: self.utf8_output.take(),
                utf16_text: self.utf16_output.take(),
            });
        }
        Ok(())
    }

    fn error_text(&mut self, _code: ErrorCode) -> String {
        self.log.record(Call::GetErrorText);
        self.last_error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn c(text: &str) -> CString {
        CString::new(text).unwrap()
    }

    fn ready_engine() -> MockEngine {
        let mut engine = MockEngine::new().with_document(
            "scan.tif",
            vec![MockPage::new("Arabic", "Farsi"), MockPage::default()],
        );
        engine.properties_initialize(&c("/opt/crs")).unwrap();
        engine.system_initialize().unwrap();
        engine
    }

    #[test]
    fn test_walks_pages_of_catalogued_document() {
        let mut engine = ready_engine();
        let log = engine.log();

        engine.set_input_path(&c("scan.tif")).unwrap();
        assert_eq!(engine.input_page_count().unwrap(), 2);

        engine.page_initialize().unwrap();
        engine.preprocess_and_clean_page().unwrap();
        assert_eq!(engine.alphabet_found().unwrap(), b"Arabic");
        engine.decompose_page().unwrap();
        engine.identify_language().unwrap();
        assert_eq!(engine.language_found().unwrap(), b"Farsi");
        engine.set_cleaned_output_path(&c("out.tif")).unwrap();
        engine.write_output().unwrap();

        let writes = log.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].document, "scan.tif");
        assert_eq!(writes[0].page, 0);
        assert_eq!(writes[0].paths(), vec!["out.tif".to_string()]);
    }

    #[test]
    fn test_rejects_phase_without_page_context() {
        let mut engine = ready_engine();
        engine.set_input_path(&c("scan.tif")).unwrap();

        let err = engine.preprocess_and_clean_page().unwrap_err();
        assert_eq!(err.get(), SEQUENCE_ERROR_CODE);
        assert!(engine.error_text(err).contains("out of order"));
    }

    #[test]
    fn test_write_output_closes_page_context() {
        let mut engine = ready_engine();
        engine.set_input_path(&c("scan.tif")).unwrap();
        engine.page_initialize().unwrap();
        engine.write_output().unwrap();

        assert_eq!(
            engine.recognize().unwrap_err().get(),
            SEQUENCE_ERROR_CODE
        );
    }

    #[test]
    fn test_language_phase_requires_script_phase() {
        let mut engine = ready_engine();
        engine.set_input_path(&c("scan.tif")).unwrap();
        engine.page_initialize().unwrap();

        assert_eq!(
            engine.decompose_page().unwrap_err().get(),
            SEQUENCE_ERROR_CODE
        );
    }

    #[test]
    fn test_unknown_document_fails_with_text() {
        let mut engine = ready_engine();
        let err = engine.set_input_path(&c("missing.tif")).unwrap_err();
        assert_eq!(err.get(), UNKNOWN_DOCUMENT_CODE);
        assert_eq!(engine.error_text(err), "cannot open input file missing.tif");
    }

    #[test]
    fn test_injected_failure_hits_requested_occurrence() {
        let mut engine = MockEngine::new()
            .with_pages("scan.tif", 3)
            .fail_on(calls::PAGE_INITIALIZE, 2, 55, "page is damaged");
        engine.properties_initialize(&c("/opt/crs")).unwrap();
        engine.system_initialize().unwrap();
        engine.set_input_path(&c("scan.tif")).unwrap();

        engine.page_initialize().unwrap();
        engine.write_output().unwrap();
        let err = engine.page_initialize().unwrap_err();
        assert_eq!(err.get(), 55);
        assert_eq!(engine.error_text(err), "page is damaged");
    }

    #[test]
    fn test_calls_after_shutdown_are_rejected() {
        let mut engine = ready_engine();
        engine.system_shutdown();
        assert_eq!(
            engine.set_input_path(&c("scan.tif")).unwrap_err().get(),
            SEQUENCE_ERROR_CODE
        );
        assert_eq!(engine.log().count(calls::SYSTEM_SHUTDOWN), 1);
    }
}
