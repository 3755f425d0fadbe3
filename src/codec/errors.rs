//! Codec error types and diagnostics.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::core::format::ManifestFormat;
use crate::core::reference::ReferenceError;

/// Error while reading or writing a Conan file.
#[derive(Debug, Error, Diagnostic)]
pub enum CodecError {
    #[error("invalid reference `{reference}` in {file}")]
    #[diagnostic(
        code(conanfest::codec::invalid_reference),
        help("references look like `name/version`, `name/version@user/channel` or `name/[>=1.0 <2]`")
    )]
    InvalidReference {
        file: String,
        reference: String,
        #[source]
        reason: ReferenceError,
        #[source_code]
        src: NamedSource<String>,
        #[label("not a valid Conan reference")]
        span: SourceSpan,
    },

    #[error("failed to parse {file}")]
    #[diagnostic(code(conanfest::codec::json))]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown manifest file: {file}")]
    #[diagnostic(
        code(conanfest::codec::unknown_file),
        help("expected one of conanfile.py, conanfile.txt or conan.lock")
    )]
    UnknownFile { file: String },

    #[error("{file} has no recipe class deriving from ConanFile")]
    #[diagnostic(code(conanfest::codec::no_recipe_class))]
    NoRecipeClass { file: String },

    #[error("{operation} is not supported for {format}")]
    #[diagnostic(code(conanfest::codec::unsupported))]
    Unsupported {
        format: ManifestFormat,
        operation: String,
    },
}

impl CodecError {
    /// Build an invalid-reference error pointing at `offset..offset+len` in `content`.
    pub fn invalid_reference(
        file: &str,
        content: &str,
        reference: &str,
        offset: usize,
        reason: ReferenceError,
    ) -> Self {
        CodecError::InvalidReference {
            file: file.to_string(),
            reference: reference.to_string(),
            reason,
            src: NamedSource::new(file, content.to_string()),
            span: (offset, reference.len()).into(),
        }
    }
}
