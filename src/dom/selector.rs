//! The selector subset the page markers need: type, `#id`, `.class` and
//! `[attr]` / `[attr="value"]` compounds joined by the descendant combinator.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::{Document, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected `{found}` at offset {offset} in `{selector}`")]
    Unexpected {
        selector: String,
        found: char,
        offset: usize,
    },
    #[error("unterminated attribute selector in `{0}`")]
    UnterminatedAttribute(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrMatch {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
}

impl Compound {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        if let Some(tag) = &self.tag {
            if !doc.tag(node).eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if doc.attr(node, "id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| doc.has_class(node, c)) {
            return false;
        }
        self.attrs.iter().all(|a| match (&a.value, doc.attr(node, &a.name)) {
            (None, found) => found.is_some(),
            (Some(want), Some(found)) => want == found,
            (Some(_), None) => false,
        })
    }
}

/// A parsed selector. Compounds are stored outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    compounds: Vec<Compound>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let mut compounds = Vec::new();
        let mut chars = source.char_indices().peekable();
        let mut current: Option<Compound> = None;

        while let Some(&(offset, c)) = chars.peek() {
            match c {
                c if c.is_whitespace() => {
                    chars.next();
                    if let Some(done) = current.take() {
                        compounds.push(done);
                    }
                }
                '.' | '#' => {
                    chars.next();
                    let name = take_ident(&mut chars);
                    if name.is_empty() {
                        return Err(unexpected(source, c, offset));
                    }
                    let compound = current.get_or_insert_with(Compound::default);
                    if c == '.' {
                        compound.classes.push(name);
                    } else {
                        compound.id = Some(name);
                    }
                }
                '[' => {
                    chars.next();
                    let attr = take_attr(source, &mut chars)?;
                    current.get_or_insert_with(Compound::default).attrs.push(attr);
                }
                c if is_ident_char(c) => {
                    let compound = current.get_or_insert_with(Compound::default);
                    if *compound != Compound::default() {
                        return Err(unexpected(source, c, offset));
                    }
                    compound.tag = Some(take_ident(&mut chars).to_ascii_lowercase());
                }
                other => return Err(unexpected(source, other, offset)),
            }
        }
        if let Some(done) = current.take() {
            compounds.push(done);
        }
        if compounds.is_empty() {
            return Err(SelectorError::Empty);
        }
        Ok(Self {
            source: source.trim().to_string(),
            compounds,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `node` is matched, looking through its ancestors for the
    /// outer compounds.
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.matches_from(doc, node, self.compounds.len() - 1)
    }

    fn matches_from(&self, doc: &Document, node: NodeId, index: usize) -> bool {
        if !self.compounds[index].matches(doc, node) {
            return false;
        }
        if index == 0 {
            return true;
        }
        let mut cursor = doc.parent(node);
        while let Some(ancestor) = cursor {
            if self.matches_from(doc, ancestor, index - 1) {
                return true;
            }
            cursor = doc.parent(ancestor);
        }
        false
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

type Chars<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(chars: &mut Chars<'_>) -> String {
    let mut out = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        out.push(c);
        chars.next();
    }
    out
}

fn take_attr(source: &str, chars: &mut Chars<'_>) -> Result<AttrMatch, SelectorError> {
    let name = take_ident(chars);
    if name.is_empty() {
        return Err(SelectorError::UnterminatedAttribute(source.to_string()));
    }
    match chars.next() {
        Some((_, ']')) => Ok(AttrMatch { name, value: None }),
        Some((_, '=')) => {
            let quote = match chars.peek() {
                Some(&(_, q @ ('"' | '\''))) => {
                    chars.next();
                    Some(q)
                }
                _ => None,
            };
            let mut value = String::new();
            loop {
                match chars.next() {
                    Some((_, c)) if Some(c) == quote => {
                        return match chars.next() {
                            Some((_, ']')) => Ok(AttrMatch {
                                name,
                                value: Some(value),
                            }),
                            _ => Err(SelectorError::UnterminatedAttribute(source.to_string())),
                        };
                    }
                    Some((_, ']')) if quote.is_none() => {
                        return Ok(AttrMatch {
                            name,
                            value: Some(value),
                        });
                    }
                    Some((_, c)) => value.push(c),
                    None => return Err(SelectorError::UnterminatedAttribute(source.to_string())),
                }
            }
        }
        Some((offset, c)) => Err(unexpected(source, c, offset)),
        None => Err(SelectorError::UnterminatedAttribute(source.to_string())),
    }
}

fn unexpected(selector: &str, found: char, offset: usize) -> SelectorError {
    SelectorError::Unexpected {
        selector: selector.to_string(),
        found,
        offset,
    }
}
