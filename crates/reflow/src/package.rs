//! Zip helpers shared by the Office Open XML writers.

use std::io::{Seek, Write};

use reflow_core::ReflowError;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Deflated entries, the compression Word and Excel write.
pub(crate) fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated)
}

pub(crate) fn put<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    bytes: &[u8],
    options: SimpleFileOptions,
) -> Result<(), ReflowError> {
    zip.start_file(name, options).map_err(zip_error)?;
    zip.write_all(bytes)?;
    Ok(())
}

pub(crate) fn zip_error(e: zip::result::ZipError) -> ReflowError {
    ReflowError::Other(format!("zip error: {e}"))
}

/// `text` without the C0 controls XML 1.0 forbids.
pub(crate) fn xml_safe(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}
