//! Errors raised while building nodes and rules.
//!
//! Failing to match is never an error, and neither is running out of a depth or step budget. The
//! only errors are mistakes in how a rule or node was put together, and they are reported as soon
//! as the offending value is built, before the engine ever runs.

use ariadne::Fmt;
use cas_attrs::ErrorKind;
use cas_error::{Error, ErrorKind, EXPR};
use crate::node::Arity;
use levenshtein::levenshtein;
use std::{fmt::Display, ops::Range};

/// The replacement of a rule refers to a capture that the rule's pattern never binds.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("capture `{}` is never bound by the pattern of rule `{}`", self.name, self.rule),
    labels = [format!("`{}` is used here", (&self.name).fg(EXPR))],
    help = if self.suggestions.is_empty() {
        format!("bind `{}` somewhere in the pattern, or remove it from the replacement", self.name)
    } else {
        format!("did you mean {}?", self.suggestions
            .iter()
            .map(|name| format!("`{}`", name))
            .collect::<Vec<_>>()
            .join(" or "))
    },
)]
pub struct UnboundCapture {
    /// The name of the unbound capture.
    pub name: String,

    /// The description of the rule.
    pub rule: String,

    /// The captures the pattern does bind that have a similar name, closest first.
    pub suggestions: Vec<String>,
}

/// A branch was built with the wrong number of children for its arity class.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!(
        "`{}` is {} and takes exactly {} children, but {} were given",
        self.tag,
        self.arity,
        self.expected,
        self.found,
    ),
    labels = ["this node"],
)]
pub struct ArityMismatch {
    /// The tag of the branch, or the display form of the leaf that was given children.
    pub tag: String,

    /// A description of the arity class, such as "a binary branch".
    pub arity: String,

    /// The number of children the arity class requires.
    pub expected: usize,

    /// The number of children that were given.
    pub found: usize,
}

/// Two rules were registered under the same key.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("a rule with key `{}` is already registered", self.key),
    labels = ["this rule"],
    help = "rule keys identify rules in the metadata cache and must be unique within an engine",
)]
pub struct DuplicateRuleKey {
    /// The key that was registered twice.
    pub key: String,
}

/// The maximum edit distance for a bound capture to be suggested in place of an unbound one.
const MAX_SUGGESTION_DISTANCE: usize = 2;

/// Finds the first occurrence of `name` in `text` that is not part of a longer identifier.
fn find_name(text: &str, name: &str) -> Option<Range<usize>> {
    let is_ident = |c: char| c.is_alphanumeric() || c == '_';
    text.match_indices(name)
        .map(|(start, _)| start..start + name.len())
        .find(|span| {
            let before = text[..span.start].chars().next_back();
            let after = text[span.end..].chars().next();
            !before.map(is_ident).unwrap_or(false) && !after.map(is_ident).unwrap_or(false)
        })
}

/// Builds an [`UnboundCapture`] error for the rule with the given description.
///
/// The error points at the capture inside the description if it is mentioned there, and suggests
/// the bound captures with similar names.
pub(crate) fn unbound_capture<'a>(
    name: &str,
    description: &str,
    bound: impl IntoIterator<Item = &'a str>,
) -> Error {
    let mut suggestions = bound.into_iter()
        .map(|candidate| (levenshtein(name, candidate), candidate))
        .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
        .collect::<Vec<_>>();
    suggestions.sort();

    Error::new(
        description,
        find_name(description, name).into_iter().collect(),
        UnboundCapture {
            name: name.to_string(),
            rule: description.to_string(),
            suggestions: suggestions.into_iter().map(|(_, name)| name.to_string()).collect(),
        },
    )
}

/// Builds an [`ArityMismatch`] error. An arity of [`None`] stands for a leaf.
pub(crate) fn arity_mismatch(tag: impl Display, arity: Option<Arity>, found: usize) -> Error {
    let tag = tag.to_string();
    let (arity, expected) = match arity {
        Some(arity) => (format!("a {} branch", arity), arity.len().unwrap_or(found)),
        None => ("a leaf".to_string(), 0),
    };
    Error::new(tag.clone(), Vec::new(), ArityMismatch { tag, arity, expected, found })
}

/// Builds a [`DuplicateRuleKey`] error for the rule with the given description.
pub(crate) fn duplicate_rule_key(key: &str, description: &str) -> Error {
    Error::new(description, Vec::new(), DuplicateRuleKey { key: key.to_string() })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn points_at_capture_in_description() {
        let err = unbound_capture("_y", "f(_x) -> g(_y)", ["_x"]);
        assert_eq!(err.spans, vec![11..13]);
        assert_eq!(err.source, "f(_x) -> g(_y)");
        assert_eq!(
            err.to_string(),
            "capture `_y` is never bound by the pattern of rule `f(_x) -> g(_y)`",
        );
    }

    #[test]
    fn skips_longer_identifiers() {
        assert_eq!(find_name("_xy + _x", "_x"), Some(6..8));
        assert_eq!(find_name("_xy", "_x"), None);
    }

    #[test]
    fn suggests_close_names() {
        let err = unbound_capture("_rest", "remove zero", ["_x", "_rst", "_other"]);
        let kind = err.downcast_ref::<UnboundCapture>().unwrap();
        assert_eq!(kind.suggestions, vec!["_rst".to_string()]);
        assert_eq!(err.spans, vec![0..11]);

        let report = err.report_to_string("rule");
        assert!(report.contains("did you mean `_rst`?"));
    }

    #[test]
    fn arity_message() {
        let err = arity_mismatch("pow", Some(Arity::Binary), 3);
        assert_eq!(err.to_string(), "`pow` is a binary branch and takes exactly 2 children, but 3 were given");

        let err = arity_mismatch("x", None, 1);
        assert_eq!(err.to_string(), "`x` is a leaf and takes exactly 0 children, but 1 were given");
    }
}
