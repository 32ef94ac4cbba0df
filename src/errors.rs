/*!
 * Error types for the tei2lcp application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that abort the conversion of a TEI document
#[derive(Error, Debug)]
pub enum ConversionError {
    /// A structure the converter cannot do without is absent
    #[error("Missing required element '{element}' in {context}")]
    MissingElement {
        /// Element path that was looked up
        element: String,
        /// Where the lookup happened
        context: String,
    },

    /// A required attribute is absent
    #[error("Missing required attribute '{attribute}' on <{element}>")]
    MissingAttribute {
        /// Attribute name
        attribute: String,
        /// Element carrying the attribute
        element: String,
    },

    /// A start/end/from/to reference points at no timeline marker
    #[error("Unknown timeline marker: {0}")]
    UnknownMarker(String),

    /// A marker interval is not a usable number of milliseconds
    #[error("Invalid interval '{value}' on timeline marker {marker}")]
    InvalidInterval {
        /// Marker id
        marker: String,
        /// Raw attribute value
        value: String,
    },

    /// A marker reference cannot be ordered numerically
    #[error("Marker reference is not numeric: {0}")]
    InvalidMarkerReference(String),

    /// An annotation block names a speaker missing from the person list
    #[error("Unknown speaker: {0}")]
    UnknownSpeaker(String),

    /// A parallel annotation layer is shorter than the layer it is zipped with
    #[error("Annotation layer '{layer}' has no element at index {index} (length {len})")]
    MisalignedLayer {
        /// Layer type attribute, e.g. `SPK1[pos_min]`
        layer: String,
        /// Index that was accessed
        index: usize,
        /// Actual length of the layer
        len: usize,
    },
}

/// Errors that can occur when talking to the source collection API
#[derive(Error, Debug)]
pub enum SourceError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from document conversion
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Error from the source collection
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}
