#![warn(missing_docs)]
//! Data-driven configuration for `sourceview-core`.
//!
//! Hosts that do not want to define lexers and themes in code can load them
//! from JSON documents:
//!
//! - [`lexer_from_json`] builds a [`sourceview_core::Lexer`] from an ordered
//!   rule list (`words` and `regex` rules).
//! - [`theme_from_json`] builds a [`sourceview_core::Theme`] from a theme
//!   object (font, chrome colors, per-token colors).
//!
//! Both loaders are total: malformed documents degrade to the empty lexer or
//! the default theme, invalid individual entries are dropped, and every
//! degradation is logged at debug level. A bad config file can make coloring
//! worse, never make editing fail.

pub mod rules;
pub mod theme;

pub use rules::lexer_from_json;
pub use theme::theme_from_json;
