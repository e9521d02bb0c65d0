//! Resolution map value type and its merge algebra.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Specifier to URL table, in authored order.
///
/// Equality ignores order; serialization keeps it.
pub type SpecifierMap = IndexMap<String, String>;

/// A module resolution map: top-level `imports` plus URL-prefix `scopes`.
///
/// Missing or `null` members deserialize as empty and unknown members are
/// ignored, so `{}` is a valid (empty) map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionMap {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub imports: SpecifierMap,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub scopes: BTreeMap<String, SpecifierMap>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ResolutionMap {
    /// Builds a map with only top-level imports.
    pub fn from_imports<K, V>(imports: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            imports: imports.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            scopes: BTreeMap::new(),
        }
    }

    /// Parses the JSON text of a declarative source or fetched map.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Pretty JSON, as written into the document.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.scopes.is_empty()
    }

    #[must_use]
    pub fn get(&self, specifier: &str) -> Option<&str> {
        self.imports.get(specifier).map(String::as_str)
    }
}

/// `{imports:{}, scopes:{}}`.
#[must_use]
pub fn create_empty() -> ResolutionMap {
    ResolutionMap::default()
}

/// Right-biased union of two maps.
///
/// Keys of `patch` win in `imports` and inside every scope both sides share;
/// scopes only `patch` has are added as they are. Overwritten keys keep their
/// position and new keys are appended.
#[must_use]
pub fn merge(base: &ResolutionMap, patch: &ResolutionMap) -> ResolutionMap {
    let mut merged = base.clone();
    merged.imports.extend(patch.imports.iter().map(|(k, v)| (k.clone(), v.clone())));
    for (prefix, entries) in &patch.scopes {
        merged
            .scopes
            .entry(prefix.clone())
            .or_default()
            .extend(entries.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}

/// Folds `maps` left to right from empty; later maps win.
pub fn merge_all<'a>(maps: impl IntoIterator<Item = &'a ResolutionMap>) -> ResolutionMap {
    maps.into_iter().fold(create_empty(), |acc, next| merge(&acc, next))
}

/// Resolves every address in `map` against `base`.
///
/// Values that cannot be joined stay verbatim. Scope prefixes are left alone.
#[must_use]
pub fn rebase(map: &ResolutionMap, base: &Url) -> ResolutionMap {
    let resolve = |entries: &SpecifierMap| -> SpecifierMap {
        entries
            .iter()
            .map(|(specifier, address)| {
                let resolved =
                    base.join(address).map_or_else(|_| address.clone(), String::from);
                (specifier.clone(), resolved)
            })
            .collect()
    };

    ResolutionMap {
        imports: resolve(&map.imports),
        scopes: map.scopes.iter().map(|(prefix, entries)| (prefix.clone(), resolve(entries))).collect(),
    }
}
