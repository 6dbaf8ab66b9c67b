//! # ecotrace-types
//!
//! Core types for AI request footprint estimation. This crate defines the
//! schema shared by the ecotrace engine and any tool that reads its
//! persisted footprint records.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: the types work without a serialization
//!   framework
//! - **Optional serialization**: enable the `serde` feature for persistence
//!   and profile-file parsing
//! - **Closed curve set**: interpolation shapes are a tagged variant mapped
//!   to pure functions, so the set stays exhaustively testable
//!
//! ## Example
//!
//! ```rust
//! use ecotrace_types::{Curve, ImpactValue, ServiceProfile};
//!
//! let profile = ServiceProfile::builder("chatgpt", "ChatGPT")
//!     .hostname("chatgpt.com")
//!     .carbon(ImpactValue::adaptive(2.5, 8.0))
//!     .water(ImpactValue::adaptive(60.0, 180.0))
//!     .thresholds(2.0, 15.0)
//!     .endpoint("/conversation$")
//!     .method("POST")
//!     .use_regex(true)
//!     .build();
//!
//! assert!(profile.carbon.is_adaptive());
//! assert_eq!(Curve::default(), Curve::Linear);
//! ```

mod duration;
mod footprint;
mod impact;
mod profile;

pub use duration::*;
pub use footprint::*;
pub use impact::*;
pub use profile::*;
