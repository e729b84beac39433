//! Error type shared by every stage of the pipeline.
//!
//! All variants are fatal for a run; the binary reports them once and exits
//! with a failure code.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Which of the two templates an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateKind {
    Description,
    Name,
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateKind::Description => f.write_str("description"),
            TemplateKind::Name => f.write_str("name"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    InvalidParameter(String),

    #[error("Template path '{}' could not be opened", path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unable to parse {kind} template")]
    TemplateParse {
        kind: TemplateKind,
        #[source]
        source: tera::Error,
    },

    #[error("Unable to render {kind} template for photo '{photo_id}'")]
    TemplateRender {
        kind: TemplateKind,
        photo_id: String,
        #[source]
        source: tera::Error,
    },

    #[error("Malformed photo entry '{photo_id}': {reason}")]
    MalformedPhoto { photo_id: String, reason: String },

    #[error("Flickr API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("Flickr API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected Flickr API response: {0}")]
    Response(#[from] serde_json::Error),

    #[error("Unable to load config file '{}': {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("Unable to encode KML: {0}")]
    Encode(String),

    #[error("Unable to write KML file '{}'", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn malformed(photo_id: &str, reason: impl Into<String>) -> Self {
        Error::MalformedPhoto {
            photo_id: photo_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Formats an error together with its whole `source()` chain, one cause per
/// line.
pub fn full_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut cause = err.source();
    while let Some(c) = cause {
        out.push_str("\n  caused by: ");
        out.push_str(&c.to_string());
        cause = c.source();
    }
    out
}
