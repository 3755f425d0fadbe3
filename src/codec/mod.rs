//! Readers and writers for the Conan file formats.
//!
//! Each codec turns file content into a [`Manifest`](crate::core::Manifest)
//! and back. None of them execute recipe code; `conanfile.py` is read
//! declaratively.

pub mod errors;
pub mod lock;
pub mod python;
pub mod text;

pub use errors::CodecError;

use crate::util::diagnostic;

/// How a codec treats a reference it cannot parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Skip the entry with a warning. Used when the file is only read.
    #[default]
    Lenient,
    /// Fail. Used when the file is rewritten from the parsed model, where a
    /// skipped entry would be lost.
    Strict,
}

impl ParseMode {
    /// Fail with `error` in strict mode; log it and carry on otherwise.
    pub(crate) fn reject(self, error: CodecError) -> Result<(), CodecError> {
        match self {
            ParseMode::Strict => Err(error),
            ParseMode::Lenient => {
                tracing::warn!("{}; skipping it", error);
                tracing::debug!("{}", diagnostic::render_report(&error, false));
                Ok(())
            }
        }
    }
}
