//! Minimal CSS selector support for locating host elements.
//!
//! Supported grammar:
//! - compound selectors: `tag`, `*`, `#id`, `.class`, `[attr]`, `[attr=v]`,
//!   `[attr="v"]`, `[attr~=v]`, `[attr^=v]`, `[attr*=v]`
//! - descendant (`a b`) and child (`a > b`) combinators
//!
//! Selector lists (`a, b`) and pseudo-classes are rejected as malformed.

use crate::arena::DomArena;
use crate::error::SelectorError;
use crate::types::NodeKey;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrOp {
    Exists,
    Equals(String),
    Includes(String),
    Prefix(String),
    Substring(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttrMatcher {
    pub name: String,
    pub op: AttrOp,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttrMatcher>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

/// A parsed selector. `steps[0]` is the leftmost compound; each later step
/// carries the combinator joining it to the step before it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    source: String,
    steps: Vec<(Combinator, Compound)>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let source = input.trim();
        if source.is_empty() {
            return Err(SelectorError::Empty);
        }
        let malformed = |reason| SelectorError::Malformed {
            selector: source.to_string(),
            reason,
        };

        let mut steps = Vec::new();
        let mut pending = Combinator::Descendant;
        for token in tokenize(source).map_err(malformed)? {
            if token == ">" {
                if steps.is_empty() || pending == Combinator::Child {
                    return Err(malformed("dangling `>` combinator"));
                }
                pending = Combinator::Child;
                continue;
            }
            let compound = parse_compound(token).map_err(malformed)?;
            steps.push((pending, compound));
            pending = Combinator::Descendant;
        }
        if pending == Combinator::Child {
            return Err(malformed("dangling `>` combinator"));
        }

        Ok(Self {
            source: source.to_string(),
            steps,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub(crate) fn matches(&self, arena: &DomArena, key: NodeKey) -> bool {
        match self.steps.split_last() {
            Some(((combinator, last), rest)) => {
                compound_matches(arena, key, last) && matches_rest(arena, key, *combinator, rest)
            }
            None => false,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

// `combinator` joins the already-matched `key` to the last step of `rest`.
fn matches_rest(
    arena: &DomArena,
    key: NodeKey,
    combinator: Combinator,
    rest: &[(Combinator, Compound)],
) -> bool {
    let Some(((next_combinator, compound), remaining)) = rest.split_last() else {
        return true;
    };
    let mut ancestor = parent_element(arena, key);
    while let Some(candidate) = ancestor {
        if compound_matches(arena, candidate, compound)
            && matches_rest(arena, candidate, *next_combinator, remaining)
        {
            return true;
        }
        if combinator == Combinator::Child {
            return false;
        }
        ancestor = parent_element(arena, candidate);
    }
    false
}

fn parent_element(arena: &DomArena, key: NodeKey) -> Option<NodeKey> {
    let parent = arena.get(key)?.parent?;
    arena.get(parent)?.element_name().map(|_| parent)
}

fn compound_matches(arena: &DomArena, key: NodeKey, compound: &Compound) -> bool {
    let Some(record) = arena.get(key) else {
        return false;
    };
    let Some(name) = record.element_name() else {
        return false;
    };
    if let Some(tag) = &compound.tag {
        if !name.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(want) = &compound.id {
        if record.attribute("id") != Some(want.as_str()) {
            return false;
        }
    }
    if !compound.classes.is_empty() {
        let class_list = record.attribute("class").unwrap_or("");
        let all_present = compound
            .classes
            .iter()
            .all(|want| class_list.split_whitespace().any(|c| c == want));
        if !all_present {
            return false;
        }
    }
    compound.attributes.iter().all(|matcher| {
        if !record.has_attribute(&matcher.name) {
            return false;
        }
        let value = record.attribute(&matcher.name).unwrap_or("");
        match &matcher.op {
            AttrOp::Exists => true,
            AttrOp::Equals(want) => value == want,
            AttrOp::Includes(want) => value.split_whitespace().any(|v| v == want),
            AttrOp::Prefix(want) => !want.is_empty() && value.starts_with(want.as_str()),
            AttrOp::Substring(want) => !want.is_empty() && value.contains(want.as_str()),
        }
    })
}

// Splits on whitespace and `>` outside of brackets and quotes.
fn tokenize(source: &str) -> Result<Vec<&str>, &'static str> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let mut bracket = false;
    let mut quote: Option<char> = None;

    for (i, ch) in source.char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' if bracket => quote = Some(ch),
            '[' => {
                if bracket {
                    return Err("nested `[`");
                }
                bracket = true;
                start.get_or_insert(i);
            }
            ']' => {
                if !bracket {
                    return Err("unbalanced `]`");
                }
                bracket = false;
            }
            ',' if !bracket => return Err("selector lists are not supported"),
            c if !bracket && (c.is_whitespace() || c == '>') => {
                if let Some(s) = start.take() {
                    tokens.push(&source[s..i]);
                }
                if c == '>' {
                    tokens.push(">");
                }
            }
            _ => {
                start.get_or_insert(i);
            }
        }
    }
    if bracket || quote.is_some() {
        return Err("unterminated attribute selector");
    }
    if let Some(s) = start {
        tokens.push(&source[s..]);
    }
    Ok(tokens)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(s: &str) -> (&str, &str) {
    let end = s
        .char_indices()
        .find(|&(_, c)| !is_ident_char(c))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s.split_at(end)
}

fn parse_compound(token: &str) -> Result<Compound, &'static str> {
    let mut compound = Compound::default();
    let mut rest = token;

    if let Some(after) = rest.strip_prefix('*') {
        rest = after;
    } else {
        let (tag, after) = take_ident(rest);
        if !tag.is_empty() {
            compound.tag = Some(tag.to_ascii_lowercase());
            rest = after;
        }
    }

    while let Some(first) = rest.chars().next() {
        match first {
            '#' => {
                let (ident, after) = take_ident(&rest[1..]);
                if ident.is_empty() {
                    return Err("empty id selector");
                }
                compound.id = Some(ident.to_string());
                rest = after;
            }
            '.' => {
                let (ident, after) = take_ident(&rest[1..]);
                if ident.is_empty() {
                    return Err("empty class selector");
                }
                compound.classes.push(ident.to_string());
                rest = after;
            }
            '[' => {
                let close = rest.find(']').ok_or("unterminated attribute selector")?;
                compound.attributes.push(parse_attribute(&rest[1..close])?);
                rest = &rest[close + 1..];
            }
            ':' => return Err("pseudo-classes are not supported"),
            _ => return Err("unexpected character"),
        }
    }
    Ok(compound)
}

fn parse_attribute(body: &str) -> Result<AttrMatcher, &'static str> {
    let body = body.trim();
    let (name, rest) = take_ident(body);
    if name.is_empty() {
        return Err("empty attribute name");
    }
    let name = name.to_ascii_lowercase();
    let rest = rest.trim_start();
    if rest.is_empty() {
        return Ok(AttrMatcher {
            name,
            op: AttrOp::Exists,
        });
    }

    let (ctor, value): (fn(String) -> AttrOp, &str) = if let Some(v) = rest.strip_prefix("~=") {
        (AttrOp::Includes, v)
    } else if let Some(v) = rest.strip_prefix("^=") {
        (AttrOp::Prefix, v)
    } else if let Some(v) = rest.strip_prefix("*=") {
        (AttrOp::Substring, v)
    } else if let Some(v) = rest.strip_prefix('=') {
        (AttrOp::Equals, v)
    } else {
        return Err("unsupported attribute operator");
    };

    let value = value.trim();
    let unquoted = match value.chars().next() {
        Some(q @ ('"' | '\'')) => value
            .strip_prefix(q)
            .and_then(|v| v.strip_suffix(q))
            .ok_or("unbalanced quotes in attribute value")?,
        _ => value,
    };
    Ok(AttrMatcher {
        name,
        op: ctor(unquoted.to_string()),
    })
}
