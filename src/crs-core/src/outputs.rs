//! Generated output file names

use crs_engine::OutputPaths;
use std::path::{Path, PathBuf};

/// Batch mode cleaned image: `cleanedimg-<doc>-<page>.tif`, both 0-based
pub fn cleaned_image_name(document_index: usize, page: u32) -> String {
    format!("cleanedimg-{}-{}.tif", document_index, page)
}

/// Batch mode cleaned image, placed under `dir` when one is configured
pub fn cleaned_image_path(dir: Option<&Path>, document_index: usize, page: u32) -> PathBuf {
    let name = cleaned_image_name(document_index, page);
    match dir {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Recognition mode outputs for one page:
/// `<base>-page<NNN>-cln.tif`, `<base>-page<NNN>.utf8`, `<base>-page<NNN>.utf16`
pub fn recognition_outputs(base: &Path, page: u32) -> OutputPaths {
    OutputPaths {
        cleaned_image: Some(with_suffix(base, &format!("-page{:03}-cln.tif", page))),
        utf8_text: Some(with_suffix(base, &format!("-page{:03}.utf8", page))),
        utf16_text: Some(with_suffix(base, &format!("-page{:03}.utf16", page))),
    }
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut path = base.as_os_str().to_owned();
    path.push(suffix);
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleaned_image_names() {
        assert_eq!(cleaned_image_name(0, 0), "cleanedimg-0-0.tif");
        assert_eq!(cleaned_image_name(3, 12), "cleanedimg-3-12.tif");
        assert_eq!(
            cleaned_image_path(None, 1, 1),
            PathBuf::from("cleanedimg-1-1.tif")
        );
        assert_eq!(
            cleaned_image_path(Some(Path::new("out")), 1, 0),
            Path::new("out").join("cleanedimg-1-0.tif")
        );
    }

    #[test]
    fn test_recognition_outputs_zero_pad_page() {
        let outputs = recognition_outputs(Path::new("scans/doc"), 7);
        assert_eq!(
            outputs.cleaned_image,
            Some(PathBuf::from("scans/doc-page007-cln.tif"))
        );
        assert_eq!(outputs.utf8_text, Some(PathBuf::from("scans/doc-page007.utf8")));
        assert_eq!(outputs.utf16_text, Some(PathBuf::from("scans/doc-page007.utf16")));

        let wide = recognition_outputs(Path::new("doc"), 1234);
        assert_eq!(wide.utf8_text, Some(PathBuf::from("doc-page1234.utf8")));
    }
}
