use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::types::NodeTemplate;

/// Errors returned when a [`NodeTemplate`] cannot be turned into a query.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template must specify a label or at least one property")]
    Empty,

    #[error("label must be a plain identifier, got: {0:?}")]
    InvalidLabel(String),

    #[error("property name must be a plain identifier, got: {0:?}")]
    InvalidPropertyName(String),
}

/// Check that `template` can be executed as a node match.
///
/// Labels and property names end up as part of a query pattern, so both must
/// be plain identifiers. Property values are always bound as parameters and
/// are not restricted.
pub fn validate_template(template: &NodeTemplate) -> Result<(), TemplateError> {
    if template.is_empty() {
        return Err(TemplateError::Empty);
    }

    if let Some(label) = &template.label {
        validate_label(label)?;
    }

    for key in template.properties.keys() {
        if !IDENT_RE.is_match(key) {
            return Err(TemplateError::InvalidPropertyName(key.clone()));
        }
    }

    Ok(())
}

/// Check a node label on its own, as used by node creation.
pub fn validate_label(label: &str) -> Result<(), TemplateError> {
    if IDENT_RE.is_match(label) {
        Ok(())
    } else {
        Err(TemplateError::InvalidLabel(label.to_string()))
    }
}

/// `^[A-Za-z_][A-Za-z0-9_]*$`
static IDENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("invalid identifier regex")
});

// --- tests -------------------------------------------------------------------
