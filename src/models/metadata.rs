// SXS simulation metadata: lenient typed access over mixed-format key/value data

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::error::{Result, SxsError};

/// v1-era keys carried forward under their modern spellings
const RELAXED_ALIASES: [(&str, &str); 10] = [
    ("relaxed_mass1", "reference_mass1"),
    ("relaxed_mass2", "reference_mass2"),
    ("relaxed_dimensionless_spin1", "reference_dimensionless_spin1"),
    ("relaxed_dimensionless_spin2", "reference_dimensionless_spin2"),
    ("relaxed_eccentricity", "reference_eccentricity"),
    ("relaxed_mean_anomaly", "reference_mean_anomaly"),
    ("relaxed_orbital_frequency", "reference_orbital_frequency"),
    ("relaxed_position1", "reference_position1"),
    ("relaxed_position2", "reference_position2"),
    ("relaxed_measurement_time", "reference_time"),
];

/// Marker keys present in each metadata format generation
const V1_KEYS: [&str; 1] = ["relaxed_mass1"];
const V2_KEYS: [&str; 2] = ["metadata_version", "number_of_orbits"];
const V3_KEYS: [&str; 6] = [
    "internal_changelog",
    "internal_minor_version",
    "metadata_content_revision",
    "metadata_format_revision",
    "number_of_orbits_from_reference_time",
    "number_of_orbits_from_start",
];

/// One simulation's metadata
///
/// The raw catalog files have missing keys, mixed value formats, and a few
/// legacy spellings, so this is a map of JSON values with lenient typed
/// accessors rather than a fixed struct. Keys are kept in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    entries: Map<String, Value>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(entries: Map<String, Value>) -> Self {
        Metadata { entries }
    }

    /// Load metadata from a path, trying `<base>.json` first and falling
    /// back to the SpEC `<base>.txt` format
    ///
    /// The path may be given with or without an extension.
    pub fn load(path: &Path) -> Result<Metadata> {
        let base = path.with_extension("");
        let json_path = base.with_extension("json");
        let txt_path = base.with_extension("txt");
        if json_path.exists() {
            Metadata::from_json_file(&json_path)
        } else if txt_path.exists() {
            Metadata::from_txt_file(&txt_path)
        } else {
            Err(SxsError::NotFound(format!(
                "metadata file '{}.{{json,txt}}'",
                base.display()
            )))
        }
    }

    /// Parse a `metadata.json` file
    pub fn from_json_file(path: &Path) -> Result<Metadata> {
        let content = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&content)?;
        let entries = match value {
            Value::Object(map) => map,
            _ => {
                return Err(SxsError::Validation(format!(
                    "'{}' does not contain a JSON object",
                    path.display()
                )))
            }
        };
        let mut metadata = Metadata { entries };
        metadata.apply_backwards_compatibility();
        Ok(metadata)
    }

    /// Parse a SpEC `metadata.txt` file
    ///
    /// The format is `key = value` lines with `#` comments. Keys use
    /// hyphens (normalized to underscores here); values are numbers, quoted
    /// strings, or comma-separated lists; a line ending in `,` continues on
    /// the next line.
    pub fn from_txt_file(path: &Path) -> Result<Metadata> {
        let content = fs::read_to_string(path)?;
        let mut metadata = Metadata {
            entries: parse_txt(&content),
        };
        metadata.apply_backwards_compatibility();
        Ok(metadata)
    }

    /// Write as pretty-printed (2-space) JSON
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.entries)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: &str, value: Value) -> Option<Value> {
        self.entries.insert(key.to_string(), value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// Lenient float access: a number or numeric string, else `None`
    pub fn float(&self, key: &str) -> Option<f64> {
        let value = floater(self.get(key));
        if value.is_nan() {
            None
        } else {
            Some(value)
        }
    }

    /// Like [`Metadata::float`], but also accepts upper-bound strings such
    /// as `"<0.0001"`, returning the bounding value
    pub fn float_bound(&self, key: &str) -> Option<f64> {
        let value = floaterbound(self.get(key));
        if value.is_nan() {
            None
        } else {
            Some(value)
        }
    }

    /// A 3-vector value; components may individually be NaN
    pub fn vector(&self, key: &str) -> Option<[f64; 3]> {
        match self.get(key) {
            Some(Value::Array(items)) if items.len() == 3 => Some(three_vec(self.get(key))),
            _ => None,
        }
    }

    /// A list of strings; a bare string promotes to a one-element list
    pub fn string_list(&self, key: &str) -> Option<Vec<String>> {
        match self.get(key)? {
            Value::Array(items) => Some(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            Value::String(s) => Some(vec![s.clone()]),
            _ => None,
        }
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// An RFC 3339 / ISO 8601 datetime value
    pub fn datetime(&self, key: &str) -> Option<DateTime<Utc>> {
        datetime_from_value(self.get(key))
    }

    /// Copy v1-era `relaxed_*` values to their `reference_*` spellings and
    /// fill `number_of_orbits` from `number_of_orbits_from_start`
    ///
    /// Existing keys are never overwritten; the legacy keys stay in place.
    pub fn apply_backwards_compatibility(&mut self) {
        for (old, new) in RELAXED_ALIASES {
            if !self.entries.contains_key(new) {
                if let Some(value) = self.entries.get(old).cloned() {
                    self.entries.insert(new.to_string(), value);
                }
            }
        }
        if !self.entries.contains_key("number_of_orbits") {
            if let Some(value) = self.entries.get("number_of_orbits_from_start").cloned() {
                self.entries.insert("number_of_orbits".to_string(), value);
            }
        }
    }

    /// Compute standard derived parameters from whatever inputs are present
    ///
    /// Adds `object_types`, the initial and reference mass ratios,
    /// `reference_chi_eff`, and the perpendicular and total magnitudes of
    /// both reference spins. Existing keys are never overwritten; missing
    /// inputs just skip the corresponding output.
    pub fn add_standard_parameters(&mut self) {
        if !self.contains_key("object_types") {
            if let (Some(object1), Some(object2)) = (self.string("object1"), self.string("object2"))
            {
                let mut objects = [object1.to_uppercase(), object2.to_uppercase()];
                objects.sort();
                self.insert("object_types", Value::String(objects.concat()));
            }
        }

        for (ratio_key, mass1_key, mass2_key) in [
            ("initial_mass_ratio", "initial_mass1", "initial_mass2"),
            ("reference_mass_ratio", "reference_mass1", "reference_mass2"),
        ] {
            if !self.contains_key(ratio_key) {
                if let (Some(mass1), Some(mass2)) = (self.float(mass1_key), self.float(mass2_key))
                {
                    self.insert_float(ratio_key, mass1 / mass2);
                }
            }
        }

        let spin1 = self.vector("reference_dimensionless_spin1");
        let spin2 = self.vector("reference_dimensionless_spin2");

        if !self.contains_key("reference_chi_eff") {
            if let (Some(mass1), Some(mass2), Some(spin1), Some(spin2)) = (
                self.float("reference_mass1"),
                self.float("reference_mass2"),
                spin1,
                spin2,
            ) {
                let chi_eff = (mass1 * spin1[2] + mass2 * spin2[2]) / (mass1 + mass2);
                self.insert_float("reference_chi_eff", chi_eff);
            }
        }

        for (spin, perp_key, mag_key) in [
            (spin1, "reference_chi1_perp", "reference_chi1_mag"),
            (spin2, "reference_chi2_perp", "reference_chi2_mag"),
        ] {
            if let Some(spin) = spin {
                if !self.contains_key(perp_key) {
                    self.insert_float(perp_key, spin[0].hypot(spin[1]));
                }
                if !self.contains_key(mag_key) {
                    self.insert_float(mag_key, norm3(spin));
                }
            }
        }
    }

    /// Guess the metadata format generation from marker keys
    pub fn format_version(&self) -> Option<&'static str> {
        let has_all = |keys: &[&str]| keys.iter().all(|key| self.entries.contains_key(*key));
        if has_all(&V3_KEYS) {
            Some("v3.0")
        } else if has_all(&V2_KEYS) {
            Some("v2.0")
        } else if has_all(&V1_KEYS) {
            Some("v1.1")
        } else {
            None
        }
    }

    fn insert_float(&mut self, key: &str, value: f64) {
        if let Some(number) = serde_json::Number::from_f64(value) {
            self.entries.insert(key.to_string(), Value::Number(number));
        }
    }
}

impl fmt::Display for Metadata {
    /// `key = value` lines, one per entry
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            writeln!(f, "{} = {}", key, value)?;
        }
        Ok(())
    }
}

/// Lenient float conversion: a JSON number or numeric string, else NaN
pub fn floater(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(text)) => text.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Like [`floater`], but upper-bound strings such as `"<0.0001"` convert to
/// the bounding value
pub fn floaterbound(value: Option<&Value>) -> f64 {
    let converted = floater(value);
    if converted.is_nan() {
        if let Some(Value::String(text)) = value {
            if text.contains('<') {
                return text.replace('<', "").trim().parse().unwrap_or(f64::NAN);
            }
        }
    }
    converted
}

/// A 3-vector from a JSON array; all-NaN when the shape is wrong
pub fn three_vec(value: Option<&Value>) -> [f64; 3] {
    if let Some(Value::Array(items)) = value {
        if items.len() == 3 {
            let mut vector = [f64::NAN; 3];
            for (component, item) in vector.iter_mut().zip(items) {
                *component = floater(Some(item));
            }
            return vector;
        }
    }
    [f64::NAN; 3]
}

/// Euclidean norm of a 3-vector (NaN components propagate)
pub fn norm3(vector: [f64; 3]) -> f64 {
    vector.iter().map(|component| component * component).sum::<f64>().sqrt()
}

/// A datetime from an RFC 3339 / ISO 8601 string value
pub fn datetime_from_value(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let text = match value {
        Some(Value::String(text)) => text.trim(),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    None
}

fn parse_txt(content: &str) -> Map<String, Value> {
    let mut entries = Map::new();
    let mut pending = String::new();
    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        pending.push_str(line);
        if line.ends_with(',') {
            // Value list continues on the next line
            continue;
        }
        if let Some((key, value)) = parse_txt_assignment(&pending) {
            entries.insert(key, value);
        }
        pending.clear();
    }
    if !pending.is_empty() {
        if let Some((key, value)) = parse_txt_assignment(&pending) {
            entries.insert(key, value);
        }
    }
    entries
}

fn parse_txt_assignment(line: &str) -> Option<(String, Value)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim().replace('-', "_");
    if key.is_empty() {
        return None;
    }
    Some((key, parse_txt_value(value.trim())))
}

fn parse_txt_value(raw: &str) -> Value {
    if let Some(inner) = raw.strip_prefix('[') {
        let inner = inner.strip_suffix(']').unwrap_or(inner);
        let items = inner
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(parse_txt_scalar)
            .collect();
        return Value::Array(items);
    }
    if raw.contains(',') {
        let items = raw
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(parse_txt_scalar)
            .collect();
        return Value::Array(items);
    }
    parse_txt_scalar(raw)
}

fn parse_txt_scalar(raw: &str) -> Value {
    let raw = raw.trim();
    if raw.len() >= 2
        && ((raw.starts_with('"') && raw.ends_with('"'))
            || (raw.starts_with('\'') && raw.ends_with('\'')))
    {
        return Value::String(raw[1..raw.len() - 1].to_string());
    }
    if let Ok(integer) = raw.parse::<i64>() {
        return Value::Number(integer.into());
    }
    if let Ok(float) = raw.parse::<f64>() {
        // NaN and infinity have no JSON representation; keep those as text
        if let Some(number) = serde_json::Number::from_f64(float) {
            return Value::Number(number);
        }
    }
    Value::String(raw.to_string())
}
