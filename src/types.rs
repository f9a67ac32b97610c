//! Core types for the Simdex system

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::embedding::ImageSource;

/// Embedding vector type (fixed length per collection)
pub type Embedding = Vec<f64>;

/// The kind of content an embedding provider serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modality::Text => f.write_str("text"),
            Modality::Image => f.write_str("image"),
        }
    }
}

/// A content reference handed to the retrieval engine
///
/// The payload stored alongside the embedding is the reference in string
/// form: raw text for the text modality, a resolvable path or URL for the
/// image modality.
#[derive(Debug, Clone)]
pub enum ContentRef {
    /// Raw text to embed and store verbatim
    Text(String),
    /// An image reference (local path, remote URL, or decoded pixels)
    Image(ImageSource),
}

impl ContentRef {
    /// Build an image reference from a string, dispatching URL vs path
    pub fn image(reference: impl AsRef<str>) -> Self {
        ContentRef::Image(ImageSource::parse(reference.as_ref()))
    }

    /// Build an image reference from a local filesystem path
    pub fn image_path(path: impl Into<PathBuf>) -> Self {
        ContentRef::Image(ImageSource::LocalPath(path.into()))
    }

    pub fn modality(&self) -> Modality {
        match self {
            ContentRef::Text(_) => Modality::Text,
            ContentRef::Image(_) => Modality::Image,
        }
    }

    /// The string payload persisted in the content column
    pub fn payload(&self) -> String {
        match self {
            ContentRef::Text(text) => text.clone(),
            ContentRef::Image(source) => source.to_string(),
        }
    }
}

/// A query hit: closest entries first, with a bounded similarity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEntry {
    pub id: u64,
    pub content: String,
    /// Similarity in [0, 1], rounded to 3 decimal digits
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_ref_modality() {
        assert_eq!(
            ContentRef::Text("hello".to_string()).modality(),
            Modality::Text
        );
        assert_eq!(ContentRef::image("cat.jpg").modality(), Modality::Image);
    }

    #[test]
    fn test_content_ref_payload_round_trips_reference() {
        let text = ContentRef::Text("hello world".to_string());
        assert_eq!(text.payload(), "hello world");

        let url = ContentRef::image("https://example.com/cat.jpg");
        assert_eq!(url.payload(), "https://example.com/cat.jpg");

        let path = ContentRef::image("images/cat.jpg");
        assert_eq!(path.payload(), "images/cat.jpg");
    }

    #[test]
    fn test_modality_display() {
        assert_eq!(Modality::Text.to_string(), "text");
        assert_eq!(Modality::Image.to_string(), "image");
    }
}
