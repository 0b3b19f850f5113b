//! # Rustdoc implementors file.
//!
//! Rustdoc writes one `trait.impl/<path>/trait.<Name>.js` file per trait. The
//! file wraps a JSON table of `[crate, [[impl_html, ..], ..]]` pairs:
//!
//! ```text
//! (function() {
//!     var implementors = Object.fromEntries([["pkgA",[["impl <a class=\"trait\" ..>Copy</a> for <a ..>DType</a>"]]]]);
//!     ...
//! })()
//! //{"start":57,"fragment_lengths":[...]}
//! ```
//!
//! Each crate becomes one [`Fragment`] named after the crate. For every impl
//! line:
//! - subject key: text of the last `class="trait"` anchor before ` for `;
//! - implementor label: text after ` for ` up to any `where` clause, tags
//!   stripped, generic arguments kept (`Wrapper<T>`);
//! - implementor ref: when the implementor starts with an anchor, its title
//!   path followed by the trailing generic arguments (`pkg::Wrapper<T>`);
//!   otherwise (tuples, references, type parameters) the label.
//!
//! HTML entities, named and numeric, are unescaped in all three fields. The older
//! `var implementors = { "crate": [...] }` layout is accepted too.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::RegistryError;
use crate::fragments::{Entry, Fragment};

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a class="([^"]*)" href="[^"]*" title="([^"]*)">(.*?)</a>"#)
        .expect("anchor regex must compile")
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex must compile"));

static WHERE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(?:div|span) class="where[^"]*">|\swhere\s"#).expect("where regex must compile")
});

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#([0-9]+)|#[xX]([0-9a-fA-F]+)|([a-zA-Z]+));")
        .expect("entity regex must compile")
});

const FROM_ENTRIES: &str = "Object.fromEntries(";
const LEGACY_TABLE: &str = "var implementors =";
const FOR: &str = " for ";

/// Decodes a rustdoc implementors file into one fragment per crate.
///
/// # Errors
/// [`RegistryError::InvalidSource`] when no implementors table is found, the
/// table is not valid JSON, or an impl line names no trait.
pub fn fragments_from_rustdoc(source: &str) -> Result<Vec<Fragment>, RegistryError> {
    let table = extract_table(source)?;
    let crates: Vec<(String, Value)> = match table {
        Value::Array(pairs) => pairs
            .into_iter()
            .map(|pair| match pair {
                Value::Array(mut kv) if kv.len() == 2 => {
                    let impls = kv.pop().unwrap_or(Value::Null);
                    match kv.pop() {
                        Some(Value::String(name)) => Ok((name, impls)),
                        _ => Err(invalid("crate name is not a string")),
                    }
                }
                _ => Err(invalid("crate pair is not [name, impls]")),
            })
            .collect::<Result<_, _>>()?,
        Value::Object(map) => map.into_iter().collect(),
        _ => return Err(invalid("implementors table is neither an array nor an object")),
    };

    crates
        .into_iter()
        .map(|(name, impls)| crate_fragment(name, impls))
        .collect()
}

fn extract_table(source: &str) -> Result<Value, RegistryError> {
    let start = if let Some(pos) = source.find(FROM_ENTRIES) {
        pos + FROM_ENTRIES.len()
    } else if let Some(pos) = source.find(LEGACY_TABLE) {
        pos + LEGACY_TABLE.len()
    } else {
        return Err(invalid("no implementors table found"));
    };

    // Only the first JSON value is read; the JS tail and the `//{"start":..}`
    // trailer are ignored.
    serde_json::Deserializer::from_str(source[start..].trim_start())
        .into_iter::<Value>()
        .next()
        .ok_or_else(|| invalid("implementors table is empty"))?
        .map_err(|e| invalid(format!("implementors table: {e}")))
}

fn crate_fragment(name: String, impls: Value) -> Result<Fragment, RegistryError> {
    let Value::Array(items) = impls else {
        return Err(invalid(format!("impls of {name:?} are not an array")));
    };
    let entries = items
        .iter()
        .filter_map(impl_html)
        .map(parse_impl)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Fragment::new(name, entries))
}

/// Newer rustdoc writes `[html, synthetic?, [types]]`, older writes a bare
/// string or `{ "text": html }`.
fn impl_html(item: &Value) -> Option<&str> {
    match item {
        Value::String(s) => Some(s),
        Value::Array(parts) => parts.first().and_then(Value::as_str),
        Value::Object(map) => map.get("text").and_then(Value::as_str),
        _ => None,
    }
}

fn parse_impl(html: &str) -> Result<Entry, RegistryError> {
    let Some((head, tail)) = html.split_once(FOR) else {
        return Err(invalid(format!("impl without `for`: {html}")));
    };

    let subject = ANCHOR
        .captures_iter(head)
        .filter(|c| &c[1] == "trait")
        .last()
        .map(|c| unescape(&c[3]))
        .ok_or_else(|| invalid(format!("impl names no trait: {html}")))?;

    // Bounds are not part of the implementor's identity.
    let tail = WHERE.find(tail).map_or(tail, |m| &tail[..m.start()]).trim();

    let label = plain_text(tail);
    let leading_anchor = ANCHOR
        .captures(tail)
        .filter(|c| c.get(0).is_some_and(|m| m.start() == 0));
    let reference = match leading_anchor {
        Some(c) => {
            let path = c[2].split_once(' ').map_or(&c[2], |(_, path)| path);
            let anchor_end = c.get(0).map_or(tail.len(), |m| m.end());
            format!("{}{}", unescape(path), plain_text(&tail[anchor_end..]))
        }
        None => label.clone(),
    };

    Ok(Entry::new(subject, label, reference))
}

fn plain_text(html: &str) -> String {
    unescape(TAG.replace_all(html, "").trim())
}

/// Decodes `&#NNN;`, `&#xHH;` and the named entities rustdoc emits; anything
/// else is left as written.
fn unescape(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    ENTITY
        .replace_all(s, |c: &regex::Captures<'_>| {
            let decoded = if let Some(dec) = c.get(1) {
                dec.as_str().parse().ok().and_then(char::from_u32)
            } else if let Some(hex) = c.get(2) {
                u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32)
            } else {
                match c.get(3).map(|m| m.as_str()) {
                    Some("lt") => Some('<'),
                    Some("gt") => Some('>'),
                    Some("amp") => Some('&'),
                    Some("quot") => Some('"'),
                    Some("apos") => Some('\''),
                    Some("nbsp") => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| c[0].to_string(), String::from)
        })
        .into_owned()
}

fn invalid(reason: impl Into<String>) -> RegistryError {
    RegistryError::InvalidSource {
        reason: reason.into(),
    }
}
