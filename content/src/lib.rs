//! Typed boundary between coaching flows and a generative content service.
//!
//! # Architecture
//!
//! The session core never talks to a generator. A phase flow builds a
//! [`ContentRequest`], hands it to whatever [`ContentGenerator`] the caller
//! wired in, unpacks the returned [`ContentPayload`] with an `expect_*`
//! accessor, and feeds the result through the session manager's mutators.
//! Keeping the boundary typed means a flow can only apply the kind of
//! content it asked for.
//!
//! | Payload | Carries |
//! |---------|---------|
//! | `BrandIdentity` | Full brand kit: name, mission, palette, typography |
//! | `Personas` | Audience personas for a niche |
//! | `DailyTasks` | One day's prioritized task list |
//! | `MarketGaps` | Underserved-market findings for an industry |
//! | `Text` | Free-form copy in a requested format |
//! | `MediaRef` | Reference to rendered media (logo, video) |
//!
//! # Error Handling
//!
//! Generators report failure through [`GenerateError`]. Unpacking a payload
//! of the wrong kind yields [`GenerateError::KindMismatch`] naming both
//! sides, so a miswired flow fails loudly instead of applying the wrong
//! content to the session.

use std::future::Future;
use std::pin::Pin;

use atelier_types::{BrandIdentity, DailyTask, MarketGap, Persona, Profile};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content generation future type alias.
pub type GenerateFut<'a> =
    Pin<Box<dyn Future<Output = Result<ContentPayload, GenerateError>> + Send + 'a>>;

/// Error types for content generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The backing service could not be reached or refused the call.
    #[error("content service unavailable: {message}")]
    Unavailable { message: String },
    /// The service answered, but the answer did not decode as the requested
    /// shape.
    #[error("malformed {kind} payload: {message}")]
    Malformed { kind: &'static str, message: String },
    /// A payload of one kind was unpacked as another.
    #[error("expected {expected} payload, got {got}")]
    KindMismatch {
        expected: &'static str,
        got: &'static str,
    },
}

/// One request for generated content, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentRequest {
    /// A brand kit built from the founder's own description of the venture.
    BrandIdentity {
        description: String,
        #[serde(default)]
        preferred_name: Option<String>,
        #[serde(default)]
        profile: Option<Profile>,
    },
    /// Audience personas for a niche.
    Personas { niche: String },
    /// A day's worth of tasks for the named brand.
    DailyTasks {
        brand_name: String,
        #[serde(default)]
        profile: Option<Profile>,
    },
    /// Underserved-market analysis for an industry.
    MarketGaps { industry: String },
    /// Free-form copy in a named format ("blog", "thread", "linkedin").
    FreeText {
        prompt: String,
        format: String,
        #[serde(default)]
        profile: Option<Profile>,
    },
    /// An image render honoring the brand palette.
    Image {
        prompt: String,
        #[serde(default)]
        palette: Vec<String>,
    },
    /// A short video render.
    Video { prompt: String },
}

impl ContentRequest {
    /// Stable name of the requested kind, matching the wire tag.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BrandIdentity { .. } => "brand_identity",
            Self::Personas { .. } => "personas",
            Self::DailyTasks { .. } => "daily_tasks",
            Self::MarketGaps { .. } => "market_gaps",
            Self::FreeText { .. } => "free_text",
            Self::Image { .. } => "image",
            Self::Video { .. } => "video",
        }
    }
}

/// What a generator answers with, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ContentPayload {
    BrandIdentity(BrandIdentity),
    Personas(Vec<Persona>),
    DailyTasks(Vec<DailyTask>),
    MarketGaps(Vec<MarketGap>),
    Text(String),
    MediaRef(String),
}

impl ContentPayload {
    /// Stable name of the payload kind, matching the wire tag.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BrandIdentity(_) => "brand_identity",
            Self::Personas(_) => "personas",
            Self::DailyTasks(_) => "daily_tasks",
            Self::MarketGaps(_) => "market_gaps",
            Self::Text(_) => "text",
            Self::MediaRef(_) => "media_ref",
        }
    }

    /// Unpack a brand kit.
    pub fn expect_brand(self) -> Result<BrandIdentity, GenerateError> {
        match self {
            Self::BrandIdentity(brand) => Ok(brand),
            other => Err(GenerateError::KindMismatch {
                expected: "brand_identity",
                got: other.kind(),
            }),
        }
    }

    /// Unpack a persona set.
    pub fn expect_personas(self) -> Result<Vec<Persona>, GenerateError> {
        match self {
            Self::Personas(personas) => Ok(personas),
            other => Err(GenerateError::KindMismatch {
                expected: "personas",
                got: other.kind(),
            }),
        }
    }

    /// Unpack a task list.
    pub fn expect_daily_tasks(self) -> Result<Vec<DailyTask>, GenerateError> {
        match self {
            Self::DailyTasks(tasks) => Ok(tasks),
            other => Err(GenerateError::KindMismatch {
                expected: "daily_tasks",
                got: other.kind(),
            }),
        }
    }

    /// Unpack market gap findings.
    pub fn expect_market_gaps(self) -> Result<Vec<MarketGap>, GenerateError> {
        match self {
            Self::MarketGaps(gaps) => Ok(gaps),
            other => Err(GenerateError::KindMismatch {
                expected: "market_gaps",
                got: other.kind(),
            }),
        }
    }

    /// Unpack free-form copy.
    pub fn expect_text(self) -> Result<String, GenerateError> {
        match self {
            Self::Text(text) => Ok(text),
            other => Err(GenerateError::KindMismatch {
                expected: "text",
                got: other.kind(),
            }),
        }
    }

    /// Unpack a media reference.
    pub fn expect_media_ref(self) -> Result<String, GenerateError> {
        match self {
            Self::MediaRef(media_ref) => Ok(media_ref),
            other => Err(GenerateError::KindMismatch {
                expected: "media_ref",
                got: other.kind(),
            }),
        }
    }
}

/// Dynamic-dispatch boundary to a content generation service.
///
/// Implementations live outside the session crates: an HTTP client against
/// a hosted model in the app, a canned generator in tests. The contract is
/// one request in, one payload out; prompt construction, retries, and
/// transport are the implementor's business.
pub trait ContentGenerator: Send + Sync {
    fn generate(&self, request: ContentRequest) -> GenerateFut<'_>;
}
