//! Lifecycle-safe wrappers over the engine call surface
//!
//! The engine holds one global session, at most one bound document and at
//! most one open page context. Those rules are expressed through ownership:
//!
//! - [`Session`] owns the engine and shuts it down exactly once, when it is
//!   shut down explicitly or dropped, on success and error paths alike.
//! - [`Document`] mutably borrows its session, so only one can be bound.
//! - [`Page`] mutably borrows its document, and
//!   [`Page::write_outputs_and_close`] consumes it, so no phase call can
//!   follow the write.

use std::ffi::CString;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::api::{calls, CallResult, EngineApi, MAX_TEXT_LEN};
use crate::error::{EngineError, ErrorCode, Result};
use crate::options::{OutputPaths, PageOptions};

/// An initialized engine session
pub struct Session<E: EngineApi> {
    api: E,
    shut_down: bool,
}

impl<E: EngineApi> Session<E> {
    /// Load properties from `install_dir` and initialize the engine.
    ///
    /// If either step fails the engine is still shut down before the error
    /// is returned.
    pub fn initialize(api: E, install_dir: &Path) -> Result<Self> {
        info!("initializing recognition engine from {:?}", install_dir);

        // Guard first, so every early return below releases the engine.
        let mut session = Self {
            api,
            shut_down: false,
        };

        let install_dir = engine_path(install_dir)?;
        session.call(calls::PROPERTIES_INITIALIZE, |api| {
            api.properties_initialize(&install_dir)
        })?;
        session.call(calls::SYSTEM_INITIALIZE, |api| api.system_initialize())?;

        debug!("recognition engine ready");
        Ok(session)
    }

    /// Bind the engine to a new input document
    pub fn open_document(&mut self, path: &Path) -> Result<Document<'_, E>> {
        let c_path = engine_path(path)?;
        self.call(calls::SET_INPUT_PATH, |api| api.set_input_path(&c_path))?;
        let page_count = self.call(calls::GET_INPUT_PAGE_COUNT, |api| api.input_page_count())?;

        info!("opened {:?}: {} page(s)", path, page_count);
        Ok(Document {
            session: self,
            path: path.to_path_buf(),
            page_count,
            next_page: 0,
        })
    }

    /// Translate an engine status code into the engine's diagnostic text
    pub fn error_text(&mut self, code: ErrorCode) -> String {
        self.api.error_text(code)
    }

    /// Release all engine resources
    pub fn shutdown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.api.system_shutdown();
        info!("recognition engine shut down");
    }

    fn call<T>(
        &mut self,
        call: &'static str,
        f: impl FnOnce(&mut E) -> CallResult<T>,
    ) -> Result<T> {
        debug!(call, "engine call");
        match f(&mut self.api) {
            Ok(value) => Ok(value),
            Err(code) => {
                let message = self.api.error_text(code);
                warn!(call, code = code.get(), "engine call failed: {}", message);
                Err(EngineError::Call {
                    call,
                    code,
                    message,
                })
            }
        }
    }

    /// Fetch engine text. The bound applies to the raw bytes, before any
    /// lossy decoding widens them.
    fn text(
        &mut self,
        call: &'static str,
        f: impl FnOnce(&mut E) -> CallResult<Vec<u8>>,
    ) -> Result<String> {
        let bytes = self.call(call, f)?;
        if bytes.len() > MAX_TEXT_LEN {
            return Err(EngineError::TextTooLong {
                call,
                len: bytes.len(),
                max: MAX_TEXT_LEN,
            });
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl<E: EngineApi> Drop for Session<E> {
    fn drop(&mut self) {
        self.release();
    }
}

/// An input document bound to the engine
pub struct Document<'s, E: EngineApi> {
    session: &'s mut Session<E>,
    path: PathBuf,
    page_count: u32,
    next_page: u32,
}

impl<'s, E: EngineApi> Document<'s, E> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Open the context for the next page, in ascending page order
    pub fn begin_page(&mut self) -> Result<Page<'_, E>> {
        if self.next_page >= self.page_count {
            return Err(EngineError::OutOfOrder(calls::PAGE_INITIALIZE));
        }

        let index = self.next_page;
        self.session
            .call(calls::PAGE_INITIALIZE, |api| api.page_initialize())?;
        self.next_page += 1;

        debug!("page {} of {:?} initialized", index, self.path);
        Ok(Page {
            session: &mut *self.session,
            index,
            script_identified: false,
        })
    }
}

/// An open page processing context
pub struct Page<'d, E: EngineApi> {
    session: &'d mut Session<E>,
    index: u32,
    script_identified: bool,
}

impl<'d, E: EngineApi> Page<'d, E> {
    /// Zero-based page number within the document
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn configure(&mut self, options: &PageOptions) -> Result<()> {
        let session = &mut *self.session;
        session.call(calls::SET_ORIENTATION_CORRECTION, |api| {
            api.set_orientation_correction(options.orientation_correction)
        })?;
        session.call(calls::SET_CROPPING, |api| api.set_cropping(options.cropping))?;
        session.call(calls::SET_DESKEWING, |api| {
            api.set_deskewing(options.deskewing)
        })?;
        session.call(calls::SET_HANDWRITING, |api| {
            api.set_handwriting_processing(options.handwriting_processing)
        })?;
        session.call(calls::SET_NOISE_FILTER, |api| {
            api.set_noise_filter(options.noise_filter.level())
        })?;
        Ok(())
    }

    /// Preprocess the page and identify its script. Returns the alphabet.
    pub fn run_script_identification(&mut self) -> Result<String> {
        self.session
            .call(calls::PHASE1_PREPROCESS, |api| api.preprocess_and_clean_page())?;
        self.script_identified = true;
        self.session
            .text(calls::GET_ALPHABET_FOUND, |api| api.alphabet_found())
    }

    /// Decompose the page and identify its language. Returns the language.
    pub fn run_language_identification(&mut self) -> Result<String> {
        if !self.script_identified {
            return Err(EngineError::OutOfOrder(calls::PHASE2_DECOMPOSE));
        }
        self.session
            .call(calls::PHASE2_DECOMPOSE, |api| api.decompose_page())?;
        self.session
            .call(calls::PHASE3_IDENTIFY_LANGUAGE, |api| api.identify_language())?;
        self.session
            .text(calls::GET_LANGUAGE_FOUND, |api| api.language_found())
    }

    /// Run every phase plus text recognition in one call. Returns the
    /// language used to aid recognition.
    pub fn run_full_recognition(&mut self) -> Result<String> {
        self.session.call(calls::RECOGNIZE, |api| api.recognize())?;
        self.script_identified = true;
        self.session
            .text(calls::GET_LANGUAGE_FOUND, |api| api.language_found())
    }

    /// Register output destinations; unset paths suppress that output
    pub fn set_output_paths(&mut self, outputs: &OutputPaths) -> Result<()> {
        if let Some(path) = &outputs.cleaned_image {
            let c_path = engine_path(path)?;
            self.session.call(calls::SET_CLEANED_OUTPUT_PATH, |api| {
                api.set_cleaned_output_path(&c_path)
            })?;
        }
        if let Some(path) = &outputs.utf8_text {
            let c_path = engine_path(path)?;
            self.session.call(calls::SET_UTF8_OUTPUT_PATH, |api| {
                api.set_utf8_output_path(&c_path)
            })?;
        }
        if let Some(path) = &outputs.utf16_text {
            let c_path = engine_path(path)?;
            self.session.call(calls::SET_UTF16_OUTPUT_PATH, |api| {
                api.set_utf16_output_path(&c_path)
            })?;
        }
        Ok(())
    }

    /// Write all registered outputs and destroy the page context
    pub fn write_outputs_and_close(self) -> Result<()> {
        self.session
            .call(calls::WRITE_OUTPUT, |api| api.write_output())?;
        debug!("page {} written", self.index);
        Ok(())
    }
}

/// Paths reach the engine as NUL-terminated UTF-8
fn engine_path(path: &Path) -> Result<CString> {
    path.to_str()
        .and_then(|text| CString::new(text).ok())
        .ok_or_else(|| EngineError::InvalidPath(path.to_path_buf()))
}
