/*
 * options.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template invocation options.

use serde::Deserialize;

/// Options controlling one template invocation.
///
/// Deserializable from configuration with kebab-case keys; missing keys
/// take their defaults.
///
/// ```rust
/// use weft::TemplateOptions;
///
/// let options = TemplateOptions::default();
/// assert!(options.upgrade_plain_attributes);
/// assert!(!options.strict_imports);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TemplateOptions {
    /// Replace every plain attribute value with a reactive value.
    pub upgrade_plain_attributes: bool,

    /// Fail the invocation when a content marker produces no nodes.
    pub strict_imports: bool,

    /// Drop whitespace-only text at the top level of the built fragment.
    pub trim_fragment_whitespace: bool,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            upgrade_plain_attributes: true,
            strict_imports: false,
            trim_fragment_whitespace: true,
        }
    }
}
