//! Cookie-style mirror of override mutations for server-rendered maps.
//!
//! When the page's map is produced by a server, each override change is also
//! written as a `name=value` record the server can read back on the next
//! request. The two pure helpers here are the server half of that exchange.

use crate::map::{ResolutionMap, SpecifierMap};
use crate::overrides::{OVERRIDE_PREFIX, file_name_for};
use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;

const EXPIRED: &str = "expires=Thu, 01 Jan 1970 00:00:01 GMT;";

/// Receives mirror records, one per override mutation.
pub trait MirrorSink: Debug + Send + Sync {
    fn write(&self, record: &str);
}

/// Keeps every record in memory in write order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    records: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn records(&self) -> Vec<String> {
        self.records.lock().clone()
    }

    /// Folds the recorded writes into the header a browser would send back.
    #[must_use]
    pub fn cookie_header(&self) -> String {
        let mut live: Vec<(String, String)> = Vec::new();
        for record in self.records.lock().iter() {
            let Some((name, rest)) = record.split_once('=') else { continue };
            live.retain(|(existing, _)| existing != name);
            if !rest.contains(EXPIRED) {
                live.push((name.to_owned(), rest.to_owned()));
            }
        }
        live.iter().map(|(name, value)| format!("{name}={value}")).collect::<Vec<_>>().join("; ")
    }
}

impl MirrorSink for RecordingSink {
    fn write(&self, record: &str) {
        self.records.lock().push(record.to_owned());
    }
}

pub(crate) fn set_record(specifier: &str, url: &str) -> String {
    format!("{OVERRIDE_PREFIX}{specifier}={url}")
}

pub(crate) fn removal_record(specifier: &str) -> String {
    format!("{OVERRIDE_PREFIX}{specifier}=; {EXPIRED}")
}

/// Copies `map` and overwrites its imports with `overrides`. Scopes are carried over unchanged.
#[must_use]
pub fn apply_overrides(map: &ResolutionMap, overrides: &SpecifierMap) -> ResolutionMap {
    let mut applied = map.clone();
    applied.imports.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    applied
}

/// Extracts overrides from a `Cookie` request header.
///
/// Only names carrying the override prefix with a non-empty specifier count;
/// the first occurrence of a name wins. Digits-only values expand to
/// `<protocol>://localhost:<port>/<file>` and protocol-relative values get
/// `<protocol>:` prepended.
#[must_use]
pub fn parse_overrides_from_mirror(cookie_header: &str, protocol: &str) -> SpecifierMap {
    let mut overrides = SpecifierMap::new();

    for pair in cookie_header.split(';') {
        let Some((name, value)) = pair.split_once('=') else { continue };
        let Some(specifier) = name.trim().strip_prefix(OVERRIDE_PREFIX) else { continue };
        if specifier.is_empty() || overrides.contains_key(specifier) {
            continue;
        }

        let value = value.trim();
        let value = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(value);

        let url = if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
            format!("{protocol}://localhost:{value}/{}", file_name_for(specifier))
        } else if value.starts_with("//") {
            format!("{protocol}:{value}")
        } else {
            value.to_owned()
        };
        overrides.insert(specifier.to_owned(), url);
    }

    overrides
}
