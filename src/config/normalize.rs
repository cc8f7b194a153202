//! Conversion of flat, delimiter-separated keys into nested trees.
//!
//! Each key is inspected on its own: the first delimiter from
//! [`DELIMITERS`] found in the key splits it into path segments. Keys with no
//! delimiter are carried over as they are and the nested entries are then
//! selectively merged on top of them, so a flattened key wins over a plain
//! key of the same name.

use super::merge::merge_maps;
use crate::error::{ConfigError, Result};
use serde_json::{Map, Number, Value};

/// Candidate path delimiters, in detection priority order.
pub const DELIMITERS: [&str; 3] = [":", "$$", "__"];

/// How keys coming from a flat source are cased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyCase {
    /// Keep keys exactly as the source provides them.
    #[default]
    Preserve,
    /// Lowercase every key and path segment.
    Lower,
}

impl KeyCase {
    fn apply(self, key: &str) -> String {
        match self {
            KeyCase::Preserve => key.to_string(),
            KeyCase::Lower => key.to_lowercase(),
        }
    }
}

/// Options controlling one normalization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalizeOptions {
    /// Coerce string leaves of flattened keys into integers or decimals.
    ///
    /// Enabled for textual sources (environment, secrets listings), disabled
    /// for structured documents whose values are already typed.
    pub coerce_values: bool,
    pub key_case: KeyCase,
}

impl NormalizeOptions {
    /// Options for sources whose values are all strings.
    pub fn text(key_case: KeyCase) -> Self {
        Self {
            coerce_values: true,
            key_case,
        }
    }

    /// Options for already-typed structured documents.
    pub fn structured() -> Self {
        Self::default()
    }
}

/// Return the first candidate delimiter contained in `key`.
pub fn detect_delimiter(key: &str) -> Option<&'static str> {
    DELIMITERS.into_iter().find(|delimiter| key.contains(delimiter))
}

/// Narrow a textual value to an integer or decimal when it is syntactically
/// one, otherwise keep the string.
///
/// `"42"` becomes an integer, `"3.14"` a decimal; `"3.14.15"`, `"-1"`,
/// `".5"` and `""` stay strings.
///
/// Only ASCII digits count, so `"٤٢"` stays a string. Integers are bounded
/// by `u64`; anything larger is kept as the original string.
pub fn coerce_scalar(raw: &str) -> Value {
    if is_digits(raw) {
        if let Ok(n) = raw.parse::<u64>() {
            return Value::Number(n.into());
        }
    } else if let Some((whole, fraction)) = raw.split_once('.')
        && is_digits(whole)
        && is_digits(fraction)
        && let Some(n) = raw.parse::<f64>().ok().and_then(Number::from_f64)
    {
        return Value::Number(n);
    }
    Value::String(raw.to_string())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Turn a flat mapping into a nested tree.
///
/// The input is consumed; entries without a delimiter pass through untouched
/// (no coercion, no recasing beyond `key_case`) and the nested entries built
/// from delimited keys are merged on top of them.
///
/// # Errors
/// Returns [`ConfigError::StructuralConflict`] when a delimited key has to
/// descend through a segment that an earlier key in the same batch already
/// set to a scalar.
pub fn normalize(flat: Map<String, Value>, options: NormalizeOptions) -> Result<Map<String, Value>> {
    let mut residue = Map::new();
    let mut nested = Map::new();

    for (key, value) in flat {
        let Some(delimiter) = detect_delimiter(&key) else {
            residue.insert(options.key_case.apply(&key), value);
            continue;
        };

        let segments: Vec<String> = key
            .split(delimiter)
            .map(|segment| options.key_case.apply(segment))
            .collect();
        let value = match value {
            Value::String(ref s) if options.coerce_values => coerce_scalar(s),
            other => other,
        };
        insert_path(&mut nested, &key, &segments, value)?;
    }

    Ok(merge_maps(residue, nested))
}

/// Write `value` at `segments` inside `tree`, creating intermediate mappings.
fn insert_path(
    tree: &mut Map<String, Value>,
    key: &str,
    segments: &[String],
    value: Value,
) -> Result<()> {
    let Some((last, parents)) = segments.split_last() else {
        return Ok(());
    };

    let mut node = tree;
    for segment in parents {
        let entry = node
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if entry.is_null() {
            *entry = Value::Object(Map::new());
        }
        node = match entry {
            Value::Object(child) => child,
            _ => {
                return Err(ConfigError::StructuralConflict {
                    key: key.to_string(),
                    segment: segment.clone(),
                });
            }
        };
    }

    node.insert(last.clone(), value);
    Ok(())
}
