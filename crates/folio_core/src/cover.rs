//! Cover asset types.

use serde::{Deserialize, Serialize};

/// Which cover of the book an asset belongs to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum CoverKind {
    /// Front cover: full illustration with title and author text
    #[display("front")]
    Front,
    /// Back cover: quieter composition leaving room for blurb and barcode
    #[display("back")]
    Back,
}

impl CoverKind {
    /// Database column representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverKind::Front => "front",
            CoverKind::Back => "back",
        }
    }
}

impl std::str::FromStr for CoverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "front" => Ok(CoverKind::Front),
            "back" => Ok(CoverKind::Back),
            other => Err(format!("Unknown cover kind: {}", other)),
        }
    }
}

/// The externally selected style sample a story's covers are conditioned
/// on, recorded when the story enters `needs_style`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleReference {
    /// Durable URL of the style sample image
    pub image_url: String,
    /// Interior page image URLs for visual-consistency conditioning
    pub interior_page_urls: Vec<String>,
}

/// A generated (or pending) cover image for a story.
///
/// The story reaches `covers_ready` exactly when both the front and back
/// asset carry a populated `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverAsset {
    /// Owning story
    pub story_id: i64,
    /// Front or back
    pub kind: CoverKind,
    /// Prompt the image was (or will be) generated from
    pub prompt: String,
    /// Durable URL of the uploaded image; `None` until generated
    pub url: Option<String>,
}
