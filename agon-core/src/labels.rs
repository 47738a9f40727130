//! Label selectors used to filter listed objects
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    iter::FromIterator,
    str::FromStr,
};
use thiserror::Error;

// local type aliases
type Map = BTreeMap<String, String>;
type Expressions = Vec<Expression>;

/// A boolean predicate over the label set of an object
///
/// Listers only ever evaluate a predicate, they never build one.
/// Plain closures over the label map work too:
///
/// ```
/// use agon_core::SelectorExt;
/// use std::collections::BTreeMap;
///
/// let has_tier = |labels: &BTreeMap<String, String>| labels.contains_key("tier");
/// assert!(!has_tier.matches(&BTreeMap::new()));
/// ```
pub trait SelectorExt {
    /// Whether the given label set is selected
    fn matches(&self, labels: &Map) -> bool;
}

impl<F> SelectorExt for F
where
    F: Fn(&Map) -> bool,
{
    fn matches(&self, labels: &Map) -> bool {
        self(labels)
    }
}

/// A selector that matches every object
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Everything;

impl SelectorExt for Everything {
    fn matches(&self, _labels: &Map) -> bool {
        true
    }
}

/// A selector expression with existing operations
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum Expression {
    /// Key present with a value in the set
    In(String, BTreeSet<String>),
    /// Key absent, or present with a value outside the set
    NotIn(String, BTreeSet<String>),
    /// Key present with exactly this value
    Equal(String, String),
    /// Key absent, or present with another value
    NotEqual(String, String),
    /// Key present
    Exists(String),
    /// Key absent
    DoesNotExist(String),
    /// An unrecognised requirement; never matches
    Invalid,
}

/// Perform selection on a list of expressions
///
/// All expressions must match; an empty selector matches everything.
#[derive(Clone, Debug, Eq, PartialEq, Default, Deserialize, Serialize)]
pub struct Selector(Expressions);

impl Selector {
    /// Create a selector from a vector of expressions
    fn from_expressions(exprs: Expressions) -> Self {
        Self(exprs)
    }

    /// Create a selector from a map of key=value label matches
    fn from_map(map: Map) -> Self {
        Self(map.into_iter().map(|(k, v)| Expression::Equal(k, v)).collect())
    }

    /// Convert a selector to its string form
    pub fn to_selector_string(&self) -> String {
        let selectors: Vec<String> = self
            .0
            .iter()
            .filter(|&e| e != &Expression::Invalid)
            .map(|e| e.to_string())
            .collect();
        selectors.join(",")
    }

    /// Indicates whether this label selector matches all objects
    pub fn selects_all(&self) -> bool {
        self.0.is_empty()
    }
}

impl SelectorExt for Selector {
    fn matches(&self, labels: &Map) -> bool {
        self.0.iter().all(|expr| expr.matches(labels))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_selector_string())
    }
}

// === Expression ===

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |values: &BTreeSet<String>| values.iter().cloned().collect::<Vec<_>>().join(",");
        match self {
            Expression::In(key, values) => write!(f, "{key} in ({})", join(values)),
            Expression::NotIn(key, values) => write!(f, "{key} notin ({})", join(values)),
            Expression::Equal(key, value) => write!(f, "{key}={value}"),
            Expression::NotEqual(key, value) => write!(f, "{key}!={value}"),
            Expression::Exists(key) => write!(f, "{key}"),
            Expression::DoesNotExist(key) => write!(f, "!{key}"),
            Expression::Invalid => Ok(()),
        }
    }
}

impl SelectorExt for Expression {
    fn matches(&self, labels: &Map) -> bool {
        match self {
            Expression::In(key, values) => match labels.get(key) {
                Some(v) => values.contains(v),
                None => false,
            },
            Expression::NotIn(key, values) => match labels.get(key) {
                Some(v) => !values.contains(v),
                None => true,
            },
            Expression::Exists(key) => labels.contains_key(key),
            Expression::DoesNotExist(key) => !labels.contains_key(key),
            Expression::Equal(key, value) => labels.get(key) == Some(value),
            Expression::NotEqual(key, value) => labels.get(key) != Some(value),
            Expression::Invalid => false,
        }
    }
}

// === Parsing ===

/// Failure to parse a selector from its string form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid label selector requirement {requirement:?}: {reason}")]
pub struct ParseSelectorError {
    /// The offending comma separated fragment
    pub requirement: String,
    /// What was wrong with it
    pub reason: &'static str,
}

impl FromStr for Selector {
    type Err = ParseSelectorError;

    /// Parse the comma separated string form, e.g. `tier=a,env in (prod,staging),!canary`
    ///
    /// A blank string is the empty selector. Any other empty requirement is an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        split_requirements(s)
            .into_iter()
            .map(parse_requirement)
            .collect::<Result<Expressions, _>>()
            .map(Self::from_expressions)
    }
}

/// Characters that delimit requirements and are never part of a key or value
const RESERVED: &[char] = &['=', '!', '(', ')', ','];

/// Split on commas that are not inside a parenthesised value set
fn split_requirements(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts.into_iter().map(str::trim).collect()
}

fn parse_requirement(req: &str) -> Result<Expression, ParseSelectorError> {
    let err = |reason| ParseSelectorError {
        requirement: req.to_string(),
        reason,
    };
    let is_token = |t: &str| !t.contains(char::is_whitespace) && !t.contains(RESERVED);
    let key = |k: &str| {
        let k = k.trim();
        if !k.is_empty() && is_token(k) {
            Ok(k.to_string())
        } else {
            Err(err("invalid key"))
        }
    };
    // values may be empty, `tier=` selects an empty label value
    let value = |v: &str| {
        let v = v.trim();
        if is_token(v) {
            Ok(v.to_string())
        } else {
            Err(err("invalid value"))
        }
    };

    if req.is_empty() {
        return Err(err("empty requirement"));
    }
    if let Some(rest) = req.strip_prefix('!') {
        return Ok(Expression::DoesNotExist(key(rest)?));
    }
    if let Some((k, v)) = req.split_once("!=") {
        return Ok(Expression::NotEqual(key(k)?, value(v)?));
    }
    if let Some((k, v)) = req.split_once("==").or_else(|| req.split_once('=')) {
        return Ok(Expression::Equal(key(k)?, value(v)?));
    }
    if let Some(open) = req.find('(') {
        let values = req[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| err("unterminated value set"))?
            .split(',')
            .map(|v| match value(v)? {
                v if v.is_empty() => Err(err("empty value in set")),
                v => Ok(v),
            })
            .collect::<Result<BTreeSet<_>, _>>()?;
        let mut head = req[..open].split_whitespace();
        let (k, op) = match (head.next(), head.next(), head.next()) {
            (Some(k), Some(op), None) => (k, op),
            _ => return Err(err("expected `<key> in (...)` or `<key> notin (...)`")),
        };
        return match op {
            "in" => Ok(Expression::In(key(k)?, values)),
            "notin" => Ok(Expression::NotIn(key(k)?, values)),
            _ => Err(err("unknown set operator")),
        };
    }
    Ok(Expression::Exists(key(req)?))
}

// convenience conversions for Selector

impl FromIterator<(String, String)> for Selector {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self::from_map(iter.into_iter().collect())
    }
}

impl FromIterator<(&'static str, &'static str)> for Selector {
    fn from_iter<T: IntoIterator<Item = (&'static str, &'static str)>>(iter: T) -> Self {
        Self::from_map(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl FromIterator<Expression> for Selector {
    fn from_iter<T: IntoIterator<Item = Expression>>(iter: T) -> Self {
        Self::from_expressions(iter.into_iter().collect())
    }
}

impl From<Expression> for Selector {
    fn from(value: Expression) -> Self {
        Self(vec![value])
    }
}

impl From<LabelSelector> for Selector {
    fn from(value: LabelSelector) -> Self {
        let expressions = match value.match_expressions {
            Some(requirements) => requirements.into_iter().map(Into::into).collect(),
            None => vec![],
        };
        let mut equality: Selector = value
            .match_labels
            .map(|labels| labels.into_iter().collect())
            .unwrap_or_default();
        equality.0.extend(expressions);
        equality
    }
}

impl From<LabelSelectorRequirement> for Expression {
    fn from(requirement: LabelSelectorRequirement) -> Self {
        let key = requirement.key;
        let values = requirement.values.map(|values| values.into_iter().collect());
        match requirement.operator.as_str() {
            "In" => match values {
                Some(values) => Expression::In(key, values),
                None => Expression::Invalid,
            },
            "NotIn" => match values {
                Some(values) => Expression::NotIn(key, values),
                None => Expression::Invalid,
            },
            "Exists" => Expression::Exists(key),
            "DoesNotExist" => Expression::DoesNotExist(key),
            _ => Expression::Invalid,
        }
    }
}

impl From<Selector> for LabelSelector {
    fn from(value: Selector) -> Self {
        let mut equality = vec![];
        let mut expressions = vec![];
        for expr in value.0 {
            match expr {
                Expression::In(key, values) => expressions.push(LabelSelectorRequirement {
                    key,
                    operator: "In".into(),
                    values: Some(values.into_iter().collect()),
                }),
                Expression::NotIn(key, values) => expressions.push(LabelSelectorRequirement {
                    key,
                    operator: "NotIn".into(),
                    values: Some(values.into_iter().collect()),
                }),
                Expression::Equal(key, value) => equality.push((key, value)),
                Expression::NotEqual(key, value) => expressions.push(LabelSelectorRequirement {
                    key,
                    operator: "NotIn".into(),
                    values: Some(vec![value]),
                }),
                Expression::Exists(key) => expressions.push(LabelSelectorRequirement {
                    key,
                    operator: "Exists".into(),
                    values: None,
                }),
                Expression::DoesNotExist(key) => expressions.push(LabelSelectorRequirement {
                    key,
                    operator: "DoesNotExist".into(),
                    values: None,
                }),
                Expression::Invalid => (),
            }
        }

        LabelSelector {
            match_labels: (!equality.is_empty()).then_some(equality.into_iter().collect()),
            match_expressions: (!expressions.is_empty()).then_some(expressions),
        }
    }
}
