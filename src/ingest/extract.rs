// src/ingest/extract.rs
//! Field extraction: locate one element relative to an order node and
//! return its normalized text.

use std::fmt;

use crate::error::PathError;
use crate::ingest::xml::XmlNode;

/// Location of a field relative to the order node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPath {
    /// Chain of direct children: `name` or `group/name`.
    Children(Vec<String>),
    /// First element with this name anywhere below the node: `.//name`.
    Descendant(String),
}

impl FieldPath {
    pub fn child(name: &str) -> Self {
        FieldPath::Children(vec![name.to_string()])
    }

    pub fn nested(group: &str, name: &str) -> Self {
        FieldPath::Children(vec![group.to_string(), name.to_string()])
    }

    pub fn descendant(name: &str) -> Self {
        FieldPath::Descendant(name.to_string())
    }

    /// Parse `name`, `./name`, `group/name`, `./group/name` or `.//name`.
    pub fn parse(expr: &str) -> Result<Self, PathError> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(PathError::Empty);
        }

        if let Some(name) = expr.strip_prefix(".//") {
            if !is_tag_name(name) {
                return Err(PathError::Invalid(expr.to_string()));
            }
            return Ok(FieldPath::Descendant(name.to_string()));
        }

        let rest = expr.strip_prefix("./").unwrap_or(expr);
        let steps: Vec<String> = rest.split('/').map(str::to_string).collect();
        if steps.iter().any(|s| !is_tag_name(s)) {
            return Err(PathError::Invalid(expr.to_string()));
        }
        Ok(FieldPath::Children(steps))
    }

    /// The element this path designates, if present.
    pub fn locate<'a>(&self, node: &'a XmlNode) -> Option<&'a XmlNode> {
        match self {
            FieldPath::Children(steps) => steps
                .iter()
                .try_fold(node, |cur, step| cur.child(step)),
            FieldPath::Descendant(name) => node.find_descendant(name),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Children(steps) => write!(f, "{}", steps.join("/")),
            FieldPath::Descendant(name) => write!(f, ".//{name}"),
        }
    }
}

fn is_tag_name(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
}

/// Text of the element at `path`, with non-breaking spaces turned into
/// ordinary spaces and surrounding whitespace trimmed.
///
/// A missing element and an empty one both yield `""`.
pub fn extract(node: &XmlNode, path: &FieldPath) -> String {
    match path.locate(node) {
        Some(el) => normalize_field_text(el.text()),
        None => String::new(),
    }
}

pub fn normalize_field_text(raw: &str) -> String {
    raw.replace('\u{00A0}', " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> XmlNode {
        XmlNode::new("order")
            .with_child(XmlNode::new("marketplace").with_text("amazon"))
            .with_child(
                XmlNode::new("order_status")
                    .with_child(XmlNode::new("marketplace").with_text("accept"))
                    .with_child(XmlNode::new("lengow").with_text("processing")),
            )
            .with_child(
                XmlNode::new("billing_address")
                    .with_child(
                        XmlNode::new("billing_address")
                            .with_text("  014 rue de la poupée\u{00A0}\u{00A0} "),
                    )
                    .with_child(XmlNode::new("billing_address_2")),
            )
    }

    #[test]
    fn absent_element_yields_empty_string() {
        let o = order();
        assert_eq!(extract(&o, &FieldPath::child("nope")), "");
        assert_eq!(extract(&o, &FieldPath::nested("order_status", "nope")), "");
        assert_eq!(extract(&o, &FieldPath::descendant("nope")), "");
    }

    #[test]
    fn empty_element_yields_empty_string() {
        assert_eq!(
            extract(&order(), &FieldPath::descendant("billing_address_2")),
            ""
        );
    }

    #[test]
    fn nbsp_is_collapsed_and_trimmed() {
        let got = extract(
            &order(),
            &FieldPath::nested("billing_address", "billing_address"),
        );
        assert_eq!(got, "014 rue de la poupée");
    }

    #[test]
    fn child_and_nested_paths_pick_different_elements() {
        let o = order();
        assert_eq!(extract(&o, &FieldPath::child("marketplace")), "amazon");
        assert_eq!(
            extract(&o, &FieldPath::nested("order_status", "marketplace")),
            "accept"
        );
        // Subtree search finds the first match in document order.
        assert_eq!(extract(&o, &FieldPath::descendant("marketplace")), "amazon");
        assert_eq!(extract(&o, &FieldPath::descendant("lengow")), "processing");
    }

    #[test]
    fn parses_path_expressions() {
        assert_eq!(FieldPath::parse("idFlux").unwrap(), FieldPath::child("idFlux"));
        assert_eq!(
            FieldPath::parse("./billing_address/billing_address").unwrap(),
            FieldPath::nested("billing_address", "billing_address")
        );
        assert_eq!(
            FieldPath::parse(".//payment_date").unwrap(),
            FieldPath::descendant("payment_date")
        );
        assert_eq!(FieldPath::parse("  "), Err(PathError::Empty));
        assert!(matches!(FieldPath::parse("a//b"), Err(PathError::Invalid(_))));
        assert!(matches!(FieldPath::parse(".//a/b"), Err(PathError::Invalid(_))));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for p in [
            FieldPath::child("order_id"),
            FieldPath::nested("order_status", "lengow"),
            FieldPath::descendant("tracking_url"),
        ] {
            assert_eq!(FieldPath::parse(&p.to_string()).unwrap(), p);
        }
    }
}
