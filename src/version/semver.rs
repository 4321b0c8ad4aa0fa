//! Semver oracle: range tests, range minimums and loose version coercion

use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

use crate::version::range::NpmRange;

static COERCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)(?:\.(\d+))?(?:\.(\d+))?").expect("coerce pattern is a valid regex")
});

/// Whether `version` falls inside the npm `range`.
///
/// A range that cannot be parsed matches nothing.
pub fn satisfies(version: &Version, range: &str) -> bool {
    NpmRange::parse(range).is_some_and(|range| range.satisfies(version))
}

/// Lowest concrete version matching `range`
///
/// Returns None for non-range specifiers (`latest`, git URLs, `file:` paths)
/// and for ranges no version can satisfy.
pub fn minimum_of(range: &str) -> Option<Version> {
    NpmRange::parse(range)?.min_version()
}

/// Normalize a loosely formatted version into a full semantic version.
///
/// Takes the first `MAJOR[.MINOR[.PATCH]]` run found in the text and
/// zero-fills the missing components:
/// - "0.6" -> 0.6.0
/// - "v16" -> 16.0.0
/// - "react-native@0.72.4-rc.1" -> 0.72.4
pub fn coerce(raw: &str) -> Option<Version> {
    let captures = COERCE_PATTERN.captures(raw)?;
    let component = |index: usize| -> Option<u64> {
        match captures.get(index) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };

    Some(Version::new(component(1)?, component(2)?, component(3)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[rstest]
    #[case("1.5.0", ">=1.0.0", true)]
    #[case("1.5.0", "^1.0.0", true)]
    #[case("1.0.0", ">=5.0.0", false)]
    #[case("0.60.0", "^0.59.0 || ^0.60.0", true)]
    #[case("1.0.0", "latest", false)]
    #[case("1.0.0", "workspace:*", false)]
    fn satisfies_returns_expected(#[case] version: &str, #[case] range: &str, #[case] expected: bool) {
        assert_eq!(satisfies(&v(version), range), expected);
    }

    #[rstest]
    #[case("^1.2.3", Some("1.2.3"))]
    #[case("~0.6", Some("0.6.0"))]
    #[case(">=2.0.0 <3.0.0", Some("2.0.0"))]
    #[case("*", Some("0.0.0"))]
    #[case("latest", None)]
    #[case("github:owner/repo", None)]
    #[case(">1.0.18446744073709551615", None)]
    #[case("<=18446744073709551615", None)]
    fn minimum_of_returns_expected(#[case] range: &str, #[case] expected: Option<&str>) {
        assert_eq!(minimum_of(range), expected.map(v));
    }

    #[rstest]
    #[case("0.6", Some("0.6.0"))]
    #[case("16", Some("16.0.0"))]
    #[case("v2.1", Some("2.1.0"))]
    #[case("1.2.3", Some("1.2.3"))]
    #[case("1.2.3-beta.1", Some("1.2.3"))]
    #[case("react-native@0.72.4", Some("0.72.4"))]
    #[case("latest", None)]
    #[case("", None)]
    fn coerce_returns_expected(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(coerce(raw), expected.map(v));
    }
}
