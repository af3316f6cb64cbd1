// SXS simulation identifiers: families, IDs, and versioned references

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

const FAMILY_PATTERN: &str = "BBH|BHNS|NSNS";

fn sxs_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"SXS:(?P<family>{FAMILY_PATTERN})(?P<extcce>_ExtCCE)?:(?P<number>[0-9]+)"
        ))
        .expect("Invalid SXS identifier regex")
    })
}

fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"^SXS:(?P<family>{FAMILY_PATTERN})(?P<extcce>_ExtCCE)?:(?P<number>[0-9]+)(?:v(?P<version>[0-9.]+))?(?:/?Lev(?P<lev>-?[0-9]+))?$"
        ))
        .expect("Invalid SXS reference regex")
    })
}

fn lev_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Lev(?P<lev>-?[0-9]+)").expect("Invalid Lev regex"))
}

/// The two-body system family encoded in an SXS ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationFamily {
    /// Binary black hole
    BBH,
    /// Black hole-neutron star
    BHNS,
    /// Binary neutron star
    NSNS,
}

impl SimulationFamily {
    /// The sorted two-object code used in metadata (`object_types`)
    pub fn object_types(&self) -> &'static str {
        match self {
            SimulationFamily::BBH => "BHBH",
            SimulationFamily::BHNS => "BHNS",
            SimulationFamily::NSNS => "NSNS",
        }
    }

    /// Descriptive text used in simulation titles
    pub fn description(&self) -> &'static str {
        match self {
            SimulationFamily::BBH => "binary black-hole",
            SimulationFamily::BHNS => "black-hole neutron-star",
            SimulationFamily::NSNS => "binary neutron-star",
        }
    }
}

impl fmt::Display for SimulationFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationFamily::BBH => write!(f, "BBH"),
            SimulationFamily::BHNS => write!(f, "BHNS"),
            SimulationFamily::NSNS => write!(f, "NSNS"),
        }
    }
}

impl FromStr for SimulationFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BBH" => Ok(SimulationFamily::BBH),
            "BHNS" => Ok(SimulationFamily::BHNS),
            "NSNS" => Ok(SimulationFamily::NSNS),
            other => Err(format!("Invalid simulation family: '{}'", other)),
        }
    }
}

/// An SXS simulation ID such as `SXS:BBH:0123` or `SXS:BBH_ExtCCE:0001`
///
/// The numeric part is kept verbatim: leading zeros are significant and
/// `Display` round-trips the original spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SxsId {
    pub family: SimulationFamily,
    pub ext_cce: bool,
    number: String,
}

impl SxsId {
    /// The digit string following the final colon, verbatim
    pub fn number(&self) -> &str {
        &self.number
    }

    /// Human-readable title, e.g. "Binary black-hole simulation SXS:BBH:0123"
    pub fn title(&self) -> String {
        let description = self.family.description();
        let mut chars = description.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        };
        format!("{} simulation {}", capitalized, self)
    }

    /// The catalog web page for this simulation
    pub fn url(&self) -> String {
        format!("https://sxs.caltech.edu/{}", self)
    }

    fn from_captures(captures: &regex::Captures<'_>) -> Self {
        // The family alternation makes this parse infallible
        let family = captures["family"]
            .parse()
            .expect("family pattern out of sync");
        SxsId {
            family,
            ext_cce: captures.name("extcce").is_some(),
            number: captures["number"].to_string(),
        }
    }
}

impl fmt::Display for SxsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let extcce = if self.ext_cce { "_ExtCCE" } else { "" };
        write!(f, "SXS:{}{}:{}", self.family, extcce, self.number)
    }
}

impl FromStr for SxsId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = reference_re()
            .captures(s)
            .ok_or_else(|| format!("Invalid SXS ID: '{}'", s))?;
        if captures.name("version").is_some() || captures.name("lev").is_some() {
            return Err(format!("'{}' is a reference, not a bare SXS ID", s));
        }
        Ok(SxsId::from_captures(&captures))
    }
}

/// An SXS ID with optional version and resolution suffixes, as written in
/// strings like `SXS:BBH:0123v2.0/Lev5`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SxsReference {
    pub id: SxsId,
    /// Version digits without the `v` prefix (`"2.0"`)
    pub version: Option<String>,
    /// Resolution level number (`Lev5` -> 5)
    pub lev: Option<i32>,
}

impl fmt::Display for SxsReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        if let Some(version) = &self.version {
            write!(f, "v{}", version)?;
        }
        if let Some(lev) = self.lev {
            write!(f, "/Lev{}", lev)?;
        }
        Ok(())
    }
}

impl FromStr for SxsReference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = reference_re()
            .captures(s)
            .ok_or_else(|| format!("Invalid SXS reference: '{}'", s))?;
        let lev = captures
            .name("lev")
            .map(|m| m.as_str().parse::<i32>())
            .transpose()
            .map_err(|_| format!("Invalid Lev number in '{}'", s))?;
        Ok(SxsReference {
            id: SxsId::from_captures(&captures),
            version: captures.name("version").map(|m| m.as_str().to_string()),
            lev,
        })
    }
}

/// Extract the first SXS ID occurring anywhere in free text
///
/// Used when scraping files like `common-metadata.txt`, whose
/// `alternative-names` line may bury the ID among other names.
pub fn sxs_id(text: &str) -> Option<SxsId> {
    sxs_id_re()
        .captures(text)
        .map(|captures| SxsId::from_captures(&captures))
}

/// The integer level from a `Lev` directory name or path (`"Lev5"` -> 5,
/// negative levels allowed); `None` when no level appears in the text
pub fn lev_number(text: &str) -> Option<i32> {
    lev_re()
        .captures(text)
        .and_then(|captures| captures["lev"].parse().ok())
}
