//! npm range dialect
//!
//! Supports the range syntax found in package.json dependency slots:
//! - `1.2.3`, `=1.2.3`, `v1.2.3` - exact match
//! - `1`, `1.2`, `1.x`, `1.2.x`, `*`, `x` - partial versions and wildcards
//! - `^1.2.3` - compatible with version (>=1.2.3 <2.0.0)
//! - `~1.2.3` - approximately equivalent (>=1.2.3 <1.3.0)
//! - `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3` - comparison operators
//! - `1.0.0 - 2.0.0` - hyphen ranges
//! - `>=1.0.0 <2.0.0` - space-separated AND
//! - `^1.0.0 || ^2.0.0` - OR

use semver::{Prerelease, Version};

/// A parsed npm range
#[derive(Debug, Clone)]
pub struct NpmRange(VersionSpec);

impl NpmRange {
    /// Returns None when the text is not a range (e.g. `latest`, `file:../x`)
    pub fn parse(spec: &str) -> Option<Self> {
        VersionSpec::parse(spec).map(NpmRange)
    }

    pub fn satisfies(&self, version: &Version) -> bool {
        self.0.satisfies(version)
    }

    /// Lowest version matching the range, if any version can
    pub fn min_version(&self) -> Option<Version> {
        self.0.min_version()
    }
}

/// Handles compound ranges (AND, OR) as well as simple ranges
#[derive(Debug, Clone)]
enum VersionSpec {
    /// Single range (^1.0.0, >=1.0.0, etc.)
    Single(VersionRange),
    /// AND of ranges (>=1.0.0 <2.0.0) - space-separated, all must satisfy
    And(Vec<VersionSpec>),
    /// OR of specs (^1.0.0 || ^2.0.0) - any must satisfy
    Or(Vec<VersionSpec>),
}

impl VersionSpec {
    fn parse(spec: &str) -> Option<Self> {
        // OR has the lowest precedence
        if spec.contains("||") {
            let specs: Option<Vec<VersionSpec>> =
                spec.split("||").map(Self::parse_comparator_set).collect();
            return specs.map(VersionSpec::Or);
        }

        Self::parse_comparator_set(spec)
    }

    /// Parse one `||`-free part: a hyphen range, an AND list or a single range
    fn parse_comparator_set(spec: &str) -> Option<Self> {
        let tokens = Self::tokens(spec);

        match tokens.as_slice() {
            // An empty set means "any version"
            [] => Some(VersionSpec::Single(VersionRange::Any)),
            [from, dash, to] if dash == "-" => Self::parse_hyphen(from, to),
            [single] => VersionRange::parse(single).map(VersionSpec::Single),
            parts => {
                let ranges: Option<Vec<VersionSpec>> = parts
                    .iter()
                    .map(|p| VersionRange::parse(p).map(VersionSpec::Single))
                    .collect();
                ranges.map(VersionSpec::And)
            }
        }
    }

    /// Split on whitespace, gluing a detached operator (`>= 1.2.3`) to its operand
    fn tokens(spec: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut pending: Option<&str> = None;

        for word in spec.split_whitespace() {
            if let Some(op) = pending.take() {
                tokens.push(format!("{op}{word}"));
            } else if OPERATORS.contains(&word) {
                pending = Some(word);
            } else {
                tokens.push(word.to_string());
            }
        }

        // A dangling operator stays as-is and fails to parse later
        if let Some(op) = pending {
            tokens.push(op.to_string());
        }

        tokens
    }

    /// `1.2.3 - 2.3.4` means >=1.2.3 <=2.3.4; a partial upper end is exclusive (`- 2.3` means <2.4.0)
    fn parse_hyphen(from: &str, to: &str) -> Option<Self> {
        let (from, _) = parse_partial(from)?;
        let (to, precision) = parse_partial(to)?;

        let upper = match precision {
            Precision::Any => VersionRange::Any,
            Precision::Major => VersionRange::Lt(Version::new(to.major.checked_add(1)?, 0, 0)),
            Precision::Minor => {
                VersionRange::Lt(Version::new(to.major, to.minor.checked_add(1)?, 0))
            }
            Precision::Patch => VersionRange::Lte(to),
        };

        Some(VersionSpec::And(vec![
            VersionSpec::Single(VersionRange::Gte(from)),
            VersionSpec::Single(upper),
        ]))
    }

    fn satisfies(&self, version: &Version) -> bool {
        match self {
            VersionSpec::Single(range) => range.satisfies(version),
            VersionSpec::And(specs) => specs.iter().all(|s| s.satisfies(version)),
            VersionSpec::Or(specs) => specs.iter().any(|s| s.satisfies(version)),
        }
    }

    /// Greatest lower bound implied by the comparators, ignoring upper bounds
    ///
    /// None when a bound lies past the largest representable version.
    fn lower_bound(&self) -> Option<Version> {
        match self {
            VersionSpec::Single(range) => range.lower_bound(),
            VersionSpec::And(specs) => specs
                .iter()
                .map(VersionSpec::lower_bound)
                .collect::<Option<Vec<_>>>()
                .map(|bounds| bounds.into_iter().max().unwrap_or_else(zero)),
            VersionSpec::Or(specs) => specs.iter().filter_map(VersionSpec::lower_bound).min(),
        }
    }

    fn min_version(&self) -> Option<Version> {
        match self {
            VersionSpec::Or(specs) => specs.iter().filter_map(VersionSpec::min_version).min(),
            _ => {
                let candidate = self.lower_bound()?;
                self.satisfies(&candidate).then_some(candidate)
            }
        }
    }
}

const OPERATORS: [&str; 8] = [">=", "<=", ">", "<", "=", "^", "~", "~>"];

/// How many components a partial version spelled out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Precision {
    /// `*`, `x`
    Any,
    /// `1`, `1.x`
    Major,
    /// `1.2`, `1.2.x`
    Minor,
    /// `1.2.3`, `1.2.3-beta.1`
    Patch,
}

/// Parse a possibly partial version, zero-filling the missing components
fn parse_partial(text: &str) -> Option<(Version, Precision)> {
    let text = text.trim().trim_start_matches(['v', 'V', '=']);
    if text.is_empty() {
        return None;
    }

    if let Ok(version) = Version::parse(text) {
        return Some((version, Precision::Patch));
    }

    let core = text.split(['-', '+']).next()?;
    let mut numbers = Vec::with_capacity(3);
    for part in core.split('.') {
        if matches!(part, "x" | "X" | "*") {
            break;
        }
        numbers.push(part.parse::<u64>().ok()?);
    }

    match numbers.as_slice() {
        [] => Some((zero(), Precision::Any)),
        [major] => Some((Version::new(*major, 0, 0), Precision::Major)),
        [major, minor] => Some((Version::new(*major, *minor, 0), Precision::Minor)),
        [major, minor, patch] => Some((Version::new(*major, *minor, *patch), Precision::Patch)),
        _ => None,
    }
}

fn zero() -> Version {
    Version::new(0, 0, 0)
}

/// Represents a single npm comparator
#[derive(Debug, Clone)]
enum VersionRange {
    /// Exact version match
    Exact(Version),
    /// Caret range: ^1.2.3 means >=1.2.3 <2.0.0 (or special cases for 0.x)
    Caret(Version),
    /// Tilde range: ~1.2.3 means >=1.2.3 <1.3.0
    Tilde(Version),
    /// Greater than or equal
    Gte(Version),
    /// Greater than
    Gt(Version),
    /// Less than or equal
    Lte(Version),
    /// Less than
    Lt(Version),
    /// Any version: * matches all versions
    Any,
    /// Wildcard major: 1.x means >=1.0.0 <2.0.0
    WildcardMajor(u64),
    /// Wildcard minor: 1.2.x means >=1.2.0 <1.3.0
    WildcardMinor(u64, u64),
}

impl VersionRange {
    fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();

        // Longest operators first so ">=" is not read as ">"
        let (op, rest) = ["~>", ">=", "<=", ">", "<", "^", "~", "="]
            .iter()
            .find_map(|op| spec.strip_prefix(*op).map(|rest| (*op, rest)))
            .unwrap_or(("", spec));

        let (version, precision) = parse_partial(rest)?;

        let range = match (op, precision) {
            (_, Precision::Any) if op == ">" || op == "<" => return None,
            (_, Precision::Any) => VersionRange::Any,

            ("" | "=", Precision::Major) => VersionRange::WildcardMajor(version.major),
            ("" | "=", Precision::Minor) => VersionRange::WildcardMinor(version.major, version.minor),
            ("" | "=", Precision::Patch) => VersionRange::Exact(version),

            ("^", Precision::Major) => VersionRange::WildcardMajor(version.major),
            ("^", Precision::Minor) if version.major == 0 => {
                VersionRange::WildcardMinor(0, version.minor)
            }
            ("^", _) => VersionRange::Caret(version),

            ("~" | "~>", Precision::Major) => VersionRange::WildcardMajor(version.major),
            ("~" | "~>", _) => VersionRange::Tilde(version),

            (">=", _) => VersionRange::Gte(version),

            // >1 means >=2.0.0, >1.2 means >=1.3.0
            (">", Precision::Major) => {
                VersionRange::Gte(Version::new(version.major.checked_add(1)?, 0, 0))
            }
            (">", Precision::Minor) => {
                VersionRange::Gte(Version::new(version.major, version.minor.checked_add(1)?, 0))
            }
            (">", _) => VersionRange::Gt(version),

            // <=1 means <2.0.0, <=1.2 means <1.3.0
            ("<=", Precision::Major) => {
                VersionRange::Lt(Version::new(version.major.checked_add(1)?, 0, 0))
            }
            ("<=", Precision::Minor) => {
                VersionRange::Lt(Version::new(version.major, version.minor.checked_add(1)?, 0))
            }
            ("<=", _) => VersionRange::Lte(version),

            ("<", _) => VersionRange::Lt(version),

            _ => return None,
        };

        Some(range)
    }

    fn satisfies(&self, version: &Version) -> bool {
        match self {
            VersionRange::Exact(v) => version == v,
            VersionRange::Caret(v) => {
                if version < v {
                    return false;
                }
                // ^1.2.3 -> >=1.2.3 <2.0.0
                // ^0.2.3 -> >=0.2.3 <0.3.0
                // ^0.0.3 -> >=0.0.3 <0.0.4
                if v.major == 0 {
                    if v.minor == 0 {
                        version.major == 0 && version.minor == 0 && version.patch == v.patch
                    } else {
                        version.major == 0 && version.minor == v.minor
                    }
                } else {
                    version.major == v.major
                }
            }
            VersionRange::Tilde(v) => {
                version >= v && version.major == v.major && version.minor == v.minor
            }
            VersionRange::Gte(v) => version >= v,
            VersionRange::Gt(v) => version > v,
            VersionRange::Lte(v) => version <= v,
            VersionRange::Lt(v) => version < v,
            VersionRange::Any => true,
            VersionRange::WildcardMajor(major) => version.major == *major,
            VersionRange::WildcardMinor(major, minor) => {
                version.major == *major && version.minor == *minor
            }
        }
    }

    fn lower_bound(&self) -> Option<Version> {
        let bound = match self {
            VersionRange::Exact(v)
            | VersionRange::Caret(v)
            | VersionRange::Tilde(v)
            | VersionRange::Gte(v) => v.clone(),
            VersionRange::Gt(v) if v.pre.is_empty() => {
                Version::new(v.major, v.minor, v.patch.checked_add(1)?)
            }
            VersionRange::Gt(v) => {
                let mut next = v.clone();
                next.pre = Prerelease::new(&format!("{}.0", v.pre)).unwrap_or_default();
                next
            }
            VersionRange::Lte(_) | VersionRange::Lt(_) | VersionRange::Any => zero(),
            VersionRange::WildcardMajor(major) => Version::new(*major, 0, 0),
            VersionRange::WildcardMinor(major, minor) => Version::new(*major, *minor, 0),
        };
        Some(bound)
    }
}
