// Catalog release-tag versions

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^v?(?P<release>\d+(?:\.\d+)*)(?:[._-]?(?P<pre>rc|alpha|beta|a|b)[._-]?(?P<pre_n>\d+)?)?$")
            .expect("Invalid catalog version regex")
    })
}

/// Pre-release phase, ordered `a < b < rc`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PreReleaseTag {
    Alpha,
    Beta,
    ReleaseCandidate,
}

impl PreReleaseTag {
    fn label(self) -> &'static str {
        match self {
            PreReleaseTag::Alpha => "a",
            PreReleaseTag::Beta => "b",
            PreReleaseTag::ReleaseCandidate => "rc",
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "a" | "alpha" => Some(PreReleaseTag::Alpha),
            "b" | "beta" => Some(PreReleaseTag::Beta),
            "rc" => Some(PreReleaseTag::ReleaseCandidate),
            _ => None,
        }
    }
}

/// A catalog release tag such as `3.0.0`, `v3.0.0a4`, or `v2.0-rc1`
///
/// Release segments compare numerically, with shorter versions padded by
/// zeros (`3.0 == 3.0.0`); any pre-release sorts before the corresponding
/// final release. `Display` renders the canonical compact form (`3.0.0a4`).
#[derive(Debug, Clone)]
pub struct CatalogVersion {
    release: Vec<u64>,
    pre: Option<(PreReleaseTag, u64)>,
}

impl CatalogVersion {
    /// Release segments as parsed (no zero padding)
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    /// True for pre-release versions (`a`/`b`/`rc`)
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }
}

impl FromStr for CatalogVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = version_re()
            .captures(s.trim())
            .ok_or_else(|| format!("Invalid catalog version: '{}'", s))?;

        let mut release = Vec::new();
        for segment in captures["release"].split('.') {
            let n = segment
                .parse::<u64>()
                .map_err(|_| format!("Invalid release segment '{}' in '{}'", segment, s))?;
            release.push(n);
        }

        let pre = match captures.name("pre") {
            Some(tag) => {
                let tag = PreReleaseTag::parse(tag.as_str())
                    .ok_or_else(|| format!("Invalid pre-release tag in '{}'", s))?;
                let n = captures
                    .name("pre_n")
                    .map(|m| m.as_str().parse::<u64>())
                    .transpose()
                    .map_err(|_| format!("Invalid pre-release number in '{}'", s))?
                    .unwrap_or(0);
                Some((tag, n))
            }
            None => None,
        };

        Ok(CatalogVersion { release, pre })
    }
}

impl fmt::Display for CatalogVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
        write!(f, "{}", release.join("."))?;
        if let Some((tag, n)) = self.pre {
            write!(f, "{}{}", tag.label(), n)?;
        }
        Ok(())
    }
}

impl Ord for CatalogVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let width = self.release.len().max(other.release.len());
        for i in 0..width {
            let a = self.release.get(i).copied().unwrap_or(0);
            let b = other.release.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        // Same release: a final version outranks any pre-release
        match (&self.pre, &other.pre) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for CatalogVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CatalogVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CatalogVersion {}

/// Normalize a release tag to `v<canonical version>` (e.g. `3.0.0A4` ->
/// `v3.0.0a4`), the form used in cache file names and raw-file URLs
pub fn normalize_tag(tag: &str) -> Result<String, String> {
    let version: CatalogVersion = tag.parse()?;
    Ok(format!("v{}", version))
}
