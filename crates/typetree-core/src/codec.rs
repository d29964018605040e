//! Canonical textual notation for type trees
//!
//! Rendering follows the bracketed path-list form used in debug dumps and
//! test fixtures: `{[-1]:Pointer, [-1,0]:Float@float, [-1,4]:Float@float}`.
//! Entries are emitted in path order, so the rendering is canonical and
//! `FromStr` is its exact inverse.

use crate::lattice::{ConcreteType, FloatWidth};
use crate::path::TypePath;
use crate::tree::TypeTree;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Codec decoding failures. Never silently ignored: a malformed dump is a
/// caller-visible error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected `{expected}` at byte {at}")]
    Expected { expected: char, at: usize },

    #[error("expected an integer hop at byte {at}")]
    InvalidHop { at: usize },

    #[error("expected a type tag at byte {at}")]
    ExpectedTag { at: usize },

    #[error("unknown type tag `{tag}`")]
    UnknownTag { tag: String },

    #[error("unknown float width `{width}`")]
    UnknownWidth { width: String },

    #[error("width annotation on non-float tag `{tag}`")]
    UnexpectedWidth { tag: String },

    #[error("Float tag requires a width annotation")]
    MissingWidth,

    #[error("trailing input at byte {at}")]
    TrailingInput { at: usize },

    #[error("path {hops:?} does not address memory")]
    MalformedPath { hops: Vec<i64> },
}

impl fmt::Display for TypeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (path, tag)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{path}:{tag}")?;
        }
        write!(f, "}}")
    }
}

impl FromStr for TypeTree {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cur = Cursor::new(s);
        cur.skip_ws();
        cur.expect('{')?;
        cur.skip_ws();

        let mut tree = TypeTree::new();
        if !cur.eat('}') {
            loop {
                let (path, tag) = parse_entry(&mut cur)?;
                tree.insert(path, tag);
                cur.skip_ws();
                if cur.eat(',') {
                    cur.skip_ws();
                    continue;
                }
                cur.expect('}')?;
                break;
            }
        }

        cur.skip_ws();
        if !cur.at_end() {
            return Err(ParseError::TrailingInput { at: cur.pos });
        }
        Ok(tree)
    }
}

impl FromStr for ConcreteType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('@') {
            Some((tag, width)) => resolve_tag(tag, Some(width)),
            None => resolve_tag(s, None),
        }
    }
}

fn parse_entry(cur: &mut Cursor<'_>) -> Result<(TypePath, ConcreteType), ParseError> {
    cur.expect('[')?;
    let mut hops = Vec::new();
    cur.skip_ws();
    if !cur.eat(']') {
        loop {
            hops.push(cur.parse_int()?);
            cur.skip_ws();
            if cur.eat(',') {
                cur.skip_ws();
                continue;
            }
            cur.expect(']')?;
            break;
        }
    }
    let path =
        TypePath::try_from_hops(&hops).map_err(|_| ParseError::MalformedPath { hops })?;

    cur.skip_ws();
    cur.expect(':')?;
    cur.skip_ws();
    let tag = cur.parse_ident()?;
    let width = if cur.eat('@') {
        Some(cur.parse_ident()?)
    } else {
        None
    };
    let tag = resolve_tag(&tag, width.as_deref())?;
    Ok((path, tag))
}

fn resolve_tag(tag: &str, width: Option<&str>) -> Result<ConcreteType, ParseError> {
    let reject_width = |parsed: ConcreteType| match width {
        Some(_) => Err(ParseError::UnexpectedWidth {
            tag: tag.to_string(),
        }),
        None => Ok(parsed),
    };
    match tag {
        "Integer" => reject_width(ConcreteType::Integer),
        "Pointer" => reject_width(ConcreteType::Pointer),
        "Anything" => reject_width(ConcreteType::Anything),
        "Float" => {
            let width = width.ok_or(ParseError::MissingWidth)?;
            let width = match width {
                "half" => FloatWidth::Half,
                "float" => FloatWidth::Float,
                "double" => FloatWidth::Double,
                "fp128" => FloatWidth::Fp128,
                other => {
                    return Err(ParseError::UnknownWidth {
                        width: other.to_string(),
                    })
                }
            };
            Ok(ConcreteType::Float(width))
        }
        other => Err(ParseError::UnknownTag {
            tag: other.to_string(),
        }),
    }
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn eat(&mut self, c: char) -> bool {
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), ParseError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(ParseError::Expected {
                expected: c,
                at: self.pos,
            })
        }
    }

    fn parse_int(&mut self) -> Result<i64, ParseError> {
        let start = self.pos;
        self.eat('-');
        let digits = self.rest().bytes().take_while(u8::is_ascii_digit).count();
        self.pos += digits;
        self.src[start..self.pos]
            .parse()
            .map_err(|_| ParseError::InvalidHop { at: start })
    }

    fn parse_ident(&mut self) -> Result<String, ParseError> {
        let len = self
            .rest()
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric())
            .count();
        if len == 0 {
            return Err(ParseError::ExpectedTag { at: self.pos });
        }
        let ident = self.rest()[..len].to_string();
        self.pos += len;
        Ok(ident)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::arb_tree;
    use proptest::prelude::*;

    fn path(hops: &[i64]) -> TypePath {
        TypePath::try_from_hops(hops).unwrap()
    }

    #[test]
    fn test_display_sorted_entries() {
        let tree: TypeTree = [
            (path(&[-1, 4]), ConcreteType::Float(FloatWidth::Float)),
            (path(&[-1]), ConcreteType::Pointer),
            (path(&[-1, 0]), ConcreteType::Float(FloatWidth::Float)),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            tree.to_string(),
            "{[-1]:Pointer, [-1,0]:Float@float, [-1,4]:Float@float}"
        );
    }

    #[test]
    fn test_display_empty() {
        assert_eq!(TypeTree::new().to_string(), "{}");
    }

    #[test]
    fn test_parse_examples() {
        let tree: TypeTree = "{[-1]:Pointer, [-1,0]:Float@double}".parse().unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get(&path(&[-1])), Some(ConcreteType::Pointer));
        assert_eq!(
            tree.get(&path(&[-1, 0])),
            Some(ConcreteType::Float(FloatWidth::Double))
        );

        let empty: TypeTree = "{}".parse().unwrap();
        assert!(empty.is_empty());

        let root: TypeTree = "{[]:Integer}".parse().unwrap();
        assert_eq!(root.get(&TypePath::root()), Some(ConcreteType::Integer));
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        let tree: TypeTree = "  { [ -1 ] : Pointer , [ -1 , 0 ] : Anything }  ".parse().unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_parse_concrete_type() {
        assert_eq!("Integer".parse(), Ok(ConcreteType::Integer));
        assert_eq!(
            "Float@fp128".parse(),
            Ok(ConcreteType::Float(FloatWidth::Fp128))
        );
        assert!("Float".parse::<ConcreteType>().is_err());
    }

    #[test]
    fn test_reject_malformed_brackets() {
        assert!(matches!(
            "[-1]:Pointer".parse::<TypeTree>(),
            Err(ParseError::Expected { expected: '{', .. })
        ));
        assert!(matches!(
            "{[-1:Pointer}".parse::<TypeTree>(),
            Err(ParseError::Expected { expected: ']', .. })
        ));
        assert!(matches!(
            "{[-1]:Pointer".parse::<TypeTree>(),
            Err(ParseError::Expected { .. })
        ));
    }

    #[test]
    fn test_reject_bad_hops() {
        assert!(matches!(
            "{[x]:Integer}".parse::<TypeTree>(),
            Err(ParseError::InvalidHop { .. })
        ));
        assert!(matches!(
            "{[0,4]:Integer}".parse::<TypeTree>(),
            Err(ParseError::MalformedPath { .. })
        ));
        assert!(matches!(
            "{[-1,-1]:Pointer}".parse::<TypeTree>(),
            Err(ParseError::MalformedPath { .. })
        ));
    }

    #[test]
    fn test_reject_bad_tags() {
        assert!(matches!(
            "{[0]:Floop}".parse::<TypeTree>(),
            Err(ParseError::UnknownTag { .. })
        ));
        // Bottom is absence, never a stored tag.
        assert!(matches!(
            "{[0]:Bottom}".parse::<TypeTree>(),
            Err(ParseError::UnknownTag { .. })
        ));
        assert!(matches!(
            "{[0]:Float@quad}".parse::<TypeTree>(),
            Err(ParseError::UnknownWidth { .. })
        ));
        assert!(matches!(
            "{[0]:Integer@float}".parse::<TypeTree>(),
            Err(ParseError::UnexpectedWidth { .. })
        ));
        assert!(matches!(
            "{[0]:Float}".parse::<TypeTree>(),
            Err(ParseError::MissingWidth)
        ));
    }

    #[test]
    fn test_reject_trailing_input() {
        assert!(matches!(
            "{} {}".parse::<TypeTree>(),
            Err(ParseError::TrailingInput { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_round_trip(tree in arb_tree()) {
            let decoded: TypeTree = tree.to_string().parse().unwrap();
            prop_assert_eq!(decoded, tree);
        }
    }
}
