//! Binding to the proprietary `crs-api` C library

use std::ffi::CStr;
use std::marker::PhantomData;
use std::os::raw::{c_char, c_int};

use tracing::trace;

use crate::api::{CallResult, EngineApi, CRS_STRING_SIZE};
use crate::error::{check_status, ErrorCode};

const CRS_ENABLE: c_int = 1;
const CRS_DISABLE: c_int = 0;

extern "C" {
    fn crs_properties_initialize(installation_dir: *const c_char) -> c_int;
    fn crs_system_initialize() -> c_int;
    fn crs_system_shutdown() -> c_int;

    fn crs_set_input_path(path: *const c_char) -> c_int;
    fn crs_get_input_page_count(page_count: *mut c_int) -> c_int;
    fn crs_page_initialize() -> c_int;

    fn crs_set_page_orientation_correction_mode(mode: c_int) -> c_int;
    fn crs_set_page_cropping_mode(mode: c_int) -> c_int;
    fn crs_set_page_deskewing_correction_mode(mode: c_int) -> c_int;
    fn crs_set_extendedarabic_handwriting_processing_mode(mode: c_int) -> c_int;
    fn crs_set_noise_filter(level: c_int) -> c_int;

    fn crs_phase1_preprocess_and_clean_page() -> c_int;
    fn crs_phase2_decompose_page() -> c_int;
    fn crs_phase3_identify_language() -> c_int;
    fn crs_recognize() -> c_int;

    fn crs_get_alphabet_found(buffer: *mut c_char, size: c_int) -> c_int;
    fn crs_get_language_found(buffer: *mut c_char, size: c_int) -> c_int;
    fn crs_get_error_text(buffer: *mut c_char, size: c_int) -> c_int;

    fn crs_set_cleaned_output_path(path: *const c_char) -> c_int;
    fn crs_set_utf8_output_path(path: *const c_char) -> c_int;
    fn crs_set_utf16_output_path(path: *const c_char) -> c_int;
    fn crs_write_output() -> c_int;
}

fn mode(enabled: bool) -> c_int {
    if enabled {
        CRS_ENABLE
    } else {
        CRS_DISABLE
    }
}

/// Fill a fixed engine buffer and copy out the bytes before the terminator
fn read_text(getter: unsafe extern "C" fn(*mut c_char, c_int) -> c_int) -> (c_int, Vec<u8>) {
    let mut buffer = vec![0 as c_char; CRS_STRING_SIZE];
    // SAFETY: the buffer is CRS_STRING_SIZE bytes long and the engine writes
    // at most `size` bytes including the terminator.
    let status = unsafe { getter(buffer.as_mut_ptr(), CRS_STRING_SIZE as c_int) };

    // Force termination in case the engine filled the whole buffer.
    if let Some(last) = buffer.last_mut() {
        *last = 0;
    }
    // SAFETY: the buffer is NUL-terminated by construction.
    let text = unsafe { CStr::from_ptr(buffer.as_ptr()) }.to_bytes().to_vec();
    (status, text)
}

/// The linked recognition engine.
///
/// The engine keeps process-global state and is not reentrant, so this handle
/// is neither `Send` nor `Sync`.
#[derive(Debug, Default)]
pub struct NativeEngine {
    _not_send: PhantomData<*const ()>,
}

impl NativeEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EngineApi for NativeEngine {
    fn properties_initialize(&mut self, install_dir: &CStr) -> CallResult {
        check_status(unsafe { crs_properties_initialize(install_dir.as_ptr()) })
    }

    fn system_initialize(&mut self) -> CallResult {
        check_status(unsafe { crs_system_initialize() })
    }

    fn system_shutdown(&mut self) {
        let status = unsafe { crs_system_shutdown() };
        trace!(status, "crs_system_shutdown returned");
    }

    fn set_input_path(&mut self, path: &CStr) -> CallResult {
        check_status(unsafe { crs_set_input_path(path.as_ptr()) })
    }

    fn input_page_count(&mut self) -> CallResult<u32> {
        let mut count: c_int = 0;
        check_status(unsafe { crs_get_input_page_count(&mut count) })?;
        Ok(count.max(0) as u32)
    }

    fn page_initialize(&mut self) -> CallResult {
        check_status(unsafe { crs_page_initialize() })
    }

    fn set_orientation_correction(&mut self, enabled: bool) -> CallResult {
        check_status(unsafe { crs_set_page_orientation_correction_mode(mode(enabled)) })
    }

    fn set_cropping(&mut self, enabled: bool) -> CallResult {
        check_status(unsafe { crs_set_page_cropping_mode(mode(enabled)) })
    }

    fn set_deskewing(&mut self, enabled: bool) -> CallResult {
        check_status(unsafe { crs_set_page_deskewing_correction_mode(mode(enabled)) })
    }

    fn set_handwriting_processing(&mut self, enabled: bool) -> CallResult {
        check_status(unsafe { crs_set_extendedarabic_handwriting_processing_mode(mode(enabled)) })
    }

    fn set_noise_filter(&mut self, level: u8) -> CallResult {
        check_status(unsafe { crs_set_noise_filter(c_int::from(level)) })
    }

    fn preprocess_and_clean_page(&mut self) -> CallResult {
        check_status(unsafe { crs_phase1_preprocess_and_clean_page() })
    }

    fn decompose_page(&mut self) -> CallResult {
        check_status(unsafe { crs_phase2_decompose_page() })
    }

    fn identify_language(&mut self) -> CallResult {
        check_status(unsafe { crs_phase3_identify_language() })
    }

    fn recognize(&mut self) -> CallResult {
        check_status(unsafe { crs_recognize() })
    }

    fn alphabet_found(&mut self) -> CallResult<Vec<u8>> {
        let (status, text) = read_text(crs_get_alphabet_found);
        check_status(status)?;
        Ok(text)
    }

    fn language_found(&mut self) -> CallResult<Vec<u8>> {
        let (status, text) = read_text(crs_get_language_found);
        check_status(status)?;
        Ok(text)
    }

    fn set_cleaned_output_path(&mut self, path: &CStr) -> CallResult {
        check_status(unsafe { crs_set_cleaned_output_path(path.as_ptr()) })
    }

    fn set_utf8_output_path(&mut self, path: &CStr) -> CallResult {
        check_status(unsafe { crs_set_utf8_output_path(path.as_ptr()) })
    }

    fn set_utf16_output_path(&mut self, path: &CStr) -> CallResult {
        check_status(unsafe { crs_set_utf16_output_path(path.as_ptr()) })
    }

    fn write_output(&mut self) -> CallResult {
        check_status(unsafe { crs_write_output() })
    }

    fn error_text(&mut self, code: ErrorCode) -> String {
        let (_, text) = read_text(crs_get_error_text);
        if text.is_empty() {
            format!("engine error {}", code)
        } else {
            String::from_utf8_lossy(&text).into_owned()
        }
    }
}

