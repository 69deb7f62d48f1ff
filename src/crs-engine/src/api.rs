//! Raw engine call surface
//!
//! One method per function of the C interface. Implementations report
//! failures as the engine's own [`ErrorCode`]; translating a code into a
//! user-facing error (with the engine's diagnostic text) is the job of the
//! session layer.

use std::ffi::CStr;

use crate::error::ErrorCode;

/// Size of the engine's fixed text buffers, terminator included
pub const CRS_STRING_SIZE: usize = 256;

/// Longest text the engine may hand back through a getter
pub const MAX_TEXT_LEN: usize = CRS_STRING_SIZE - 1;

/// Result of a single engine call
pub type CallResult<T = ()> = Result<T, ErrorCode>;

/// Names of the engine calls, used in error reports and call logs
pub mod calls {
    pub const PROPERTIES_INITIALIZE: &str = "crs_properties_initialize";
    pub const SYSTEM_INITIALIZE: &str = "crs_system_initialize";
    pub const SYSTEM_SHUTDOWN: &str = "crs_system_shutdown";
    pub const SET_INPUT_PATH: &str = "crs_set_input_path";
    pub const GET_INPUT_PAGE_COUNT: &str = "crs_get_input_page_count";
    pub const PAGE_INITIALIZE: &str = "crs_page_initialize";
    pub const SET_ORIENTATION_CORRECTION: &str = "crs_set_page_orientation_correction_mode";
    pub const SET_CROPPING: &str = "crs_set_page_cropping_mode";
    pub const SET_DESKEWING: &str = "crs_set_page_deskewing_correction_mode";
    pub const SET_HANDWRITING: &str = "crs_set_extendedarabic_handwriting_processing_mode";
    pub const SET_NOISE_FILTER: &str = "crs_set_noise_filter";
    pub const PHASE1_PREPROCESS: &str = "crs_phase1_preprocess_and_clean_page";
    pub const PHASE2_DECOMPOSE: &str = "crs_phase2_decompose_page";
    pub const PHASE3_IDENTIFY_LANGUAGE: &str = "crs_phase3_identify_language";
    pub const RECOGNIZE: &str = "crs_recognize";
    pub const GET_ALPHABET_FOUND: &str = "crs_get_alphabet_found";
    pub const GET_LANGUAGE_FOUND: &str = "crs_get_language_found";
    pub const SET_CLEANED_OUTPUT_PATH: &str = "crs_set_cleaned_output_path";
    pub const SET_UTF8_OUTPUT_PATH: &str = "crs_set_utf8_output_path";
    pub const SET_UTF16_OUTPUT_PATH: &str = "crs_set_utf16_output_path";
    pub const WRITE_OUTPUT: &str = "crs_write_output";
    pub const GET_ERROR_TEXT: &str = "crs_get_error_text";
}

/// The recognition engine's call surface.
///
/// The engine is stateful and not reentrant, so every method takes
/// `&mut self`. Call ordering is the caller's responsibility; see
/// [`crate::Session`] for a wrapper that makes misordering unrepresentable.
pub trait EngineApi {
    /// Load engine properties and licensing from the installation directory
    fn properties_initialize(&mut self, install_dir: &CStr) -> CallResult;

    /// Allocate engine resources
    fn system_initialize(&mut self) -> CallResult;

    /// Release all engine resources. Never fails.
    fn system_shutdown(&mut self);

    fn set_input_path(&mut self, path: &CStr) -> CallResult;

    fn input_page_count(&mut self) -> CallResult<u32>;

    /// Open a fresh page context for the next page of the bound document
    fn page_initialize(&mut self) -> CallResult;

    fn set_orientation_correction(&mut self, enabled: bool) -> CallResult;

    fn set_cropping(&mut self, enabled: bool) -> CallResult;

    fn set_deskewing(&mut self, enabled: bool) -> CallResult;

    fn set_handwriting_processing(&mut self, enabled: bool) -> CallResult;

    /// 0 disables the filter, 1-7 select its strength
    fn set_noise_filter(&mut self, level: u8) -> CallResult;

    /// Phase 1: preprocessing, cleanup and script identification
    fn preprocess_and_clean_page(&mut self) -> CallResult;

    /// Phase 2: page decomposition
    fn decompose_page(&mut self) -> CallResult;

    /// Phase 3: language identification
    fn identify_language(&mut self) -> CallResult;

    /// All phases followed by text recognition
    fn recognize(&mut self) -> CallResult;

    /// Alphabet name as the engine's raw bytes, terminator excluded
    fn alphabet_found(&mut self) -> CallResult<Vec<u8>>;

    fn language_found(&mut self) -> CallResult<Vec<u8>>;

    fn set_cleaned_output_path(&mut self, path: &CStr) -> CallResult;

    fn set_utf8_output_path(&mut self, path: &CStr) -> CallResult;

    fn set_utf16_output_path(&mut self, path: &CStr) -> CallResult;

    /// Write every registered output, then reset the page context
    fn write_output(&mut self) -> CallResult;

    /// Diagnostic text for the most recent failure. Never fails.
    fn error_text(&mut self, code: ErrorCode) -> String;
}

