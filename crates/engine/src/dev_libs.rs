//! Development builds of well-known libraries.

use crate::map::ResolutionMap;

const MINIFIED_SUFFIX_LIBS: [&str; 6] =
    ["vue", "vue-router", "@angular/core", "@angular/common", "@angular/router", "@angular/platform-browser"];

/// The development-build URL for `specifier`, if it is a known library.
#[must_use]
pub fn dev_lib_url(specifier: &str, url: &str) -> Option<String> {
    match specifier {
        "react" | "react-dom" => Some(url.replacen("production.min", "development", 1)),
        "single-spa" => Some(url.replacen("single-spa.min.js", "single-spa.dev.js", 1)),
        s if MINIFIED_SUFFIX_LIBS.contains(&s) => Some(url.replacen(".min.js", ".js", 1)),
        _ => None,
    }
}

#[must_use]
pub fn is_dev_lib(specifier: &str) -> bool {
    dev_lib_url(specifier, "").is_some()
}

/// Whether `overrides` contains anything other than dev-library swaps.
#[must_use]
pub fn overrides_besides_dev_libs(overrides: &ResolutionMap) -> bool {
    overrides.imports.keys().any(|specifier| !is_dev_lib(specifier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_libraries() {
        assert_eq!(
            dev_lib_url("react", "https://cdn.test/react@18/umd/react.production.min.js").as_deref(),
            Some("https://cdn.test/react@18/umd/react.development.js")
        );
        assert_eq!(
            dev_lib_url("single-spa", "https://cdn.test/single-spa.min.js").as_deref(),
            Some("https://cdn.test/single-spa.dev.js")
        );
        assert_eq!(
            dev_lib_url("@angular/core", "https://cdn.test/core.umd.min.js").as_deref(),
            Some("https://cdn.test/core.umd.js")
        );
        assert_eq!(dev_lib_url("lodash", "https://cdn.test/lodash.min.js"), None);
    }

    #[test]
    fn test_overrides_besides_dev_libs() {
        assert!(!overrides_besides_dev_libs(&ResolutionMap::from_imports([("react", "x"), ("vue", "y")])));
        assert!(overrides_besides_dev_libs(&ResolutionMap::from_imports([("react", "x"), ("app", "y")])));
        assert!(!overrides_besides_dev_libs(&ResolutionMap::default()));
    }
}
