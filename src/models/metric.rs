// Weighted squared-distance heuristic between two simulations' metadata

use serde_json::Value;

use crate::models::metadata::{floater, floaterbound, Metadata};

/// A heuristic squared distance between two metadata collections
///
/// Intended for sorting and filtering rather than strict clustering: the
/// compared parameters are typically measured at the reference time, which
/// differs between systems. Parameters may be scalars or vectors; the
/// differences are flattened into one vector before weighting. A missing
/// `reference_mass_ratio` is derived from the reference masses, and a
/// missing `reference_complex_eccentricity` (e·e^{iℓ}, flattened to two
/// real components) from the eccentricity bound and mean anomaly.
#[derive(Debug, Clone)]
pub struct MetadataMetric {
    /// Metadata fields to compare
    pub parameters: Vec<String>,
    /// Weight matrix applied to the flattened difference vector; identity
    /// when `None`. Entries missing from the matrix weigh zero.
    pub metric: Option<Vec<Vec<f64>>>,
    /// Compare systems with different object types (BHBH, BHNS, NSNS)
    /// instead of assigning them infinite distance
    pub allow_different_object_types: bool,
    /// Below this eccentricity the first system counts as non-eccentric
    pub eccentricity_threshold1: f64,
    /// Below this eccentricity the second system counts as non-eccentric
    pub eccentricity_threshold2: f64,
    /// Minimum number of orbits in the second system before the
    /// eccentricity difference may be forgiven; avoids ascribing small
    /// distances to short inspirals
    pub penalize_shorter: f64,
}

impl Default for MetadataMetric {
    fn default() -> Self {
        MetadataMetric {
            parameters: [
                "reference_mass_ratio",
                "reference_dimensionless_spin1",
                "reference_dimensionless_spin2",
                "reference_complex_eccentricity",
            ]
            .iter()
            .map(|parameter| (*parameter).to_string())
            .collect(),
            metric: None,
            allow_different_object_types: false,
            eccentricity_threshold1: 1e-2,
            eccentricity_threshold2: 1e-3,
            penalize_shorter: 20.0,
        }
    }
}

impl MetadataMetric {
    /// The squared distance between two metadata collections
    ///
    /// Infinite when the object types differ (unless allowed); NaN when a
    /// compared parameter is missing from either side and cannot be
    /// derived. The eccentricity difference is zeroed when side 1 is below
    /// threshold 1 and side 2 is below threshold 2 with more than
    /// `penalize_shorter` orbits.
    pub fn distance_squared(&self, metadata1: &Metadata, metadata2: &Metadata) -> f64 {
        if !self.allow_different_object_types {
            // Unknown objects on the two sides never match each other
            let type1 = object_code(metadata1, "A", "B");
            let type2 = object_code(metadata2, "C", "D");
            if type1 != type2 {
                return f64::INFINITY;
            }
        }

        let mut values1: Vec<Vec<f64>> = self
            .parameters
            .iter()
            .map(|parameter| parameter_values(parameter, metadata1))
            .collect();
        let values2: Vec<Vec<f64>> = self
            .parameters
            .iter()
            .map(|parameter| parameter_values(parameter, metadata2))
            .collect();

        let eccentricity_index = self
            .parameters
            .iter()
            .position(|parameter| parameter == "reference_eccentricity")
            .or_else(|| {
                self.parameters
                    .iter()
                    .position(|parameter| parameter == "reference_complex_eccentricity")
            });
        if let Some(index) = eccentricity_index {
            if group_norm(&values1[index]) < self.eccentricity_threshold1
                && group_norm(&values2[index]) < self.eccentricity_threshold2
                && orbits(metadata2) > self.penalize_shorter
            {
                values1[index] = values2[index].clone();
            }
        }

        // Flatten the per-parameter groups into one difference vector,
        // padding length mismatches (a missing vector on one side) with NaN
        let mut difference = Vec::new();
        for (group1, group2) in values1.iter().zip(&values2) {
            let length = group1.len().max(group2.len());
            for component in 0..length {
                let value1 = group1.get(component).copied().unwrap_or(f64::NAN);
                let value2 = group2.get(component).copied().unwrap_or(f64::NAN);
                difference.push(value1 - value2);
            }
        }

        match &self.metric {
            None => difference.iter().map(|delta| delta * delta).sum(),
            Some(matrix) => {
                let mut total = 0.0;
                for (i, delta_i) in difference.iter().enumerate() {
                    for (j, delta_j) in difference.iter().enumerate() {
                        let weight = matrix
                            .get(i)
                            .and_then(|row| row.get(j))
                            .copied()
                            .unwrap_or(0.0);
                        total += delta_i * weight * delta_j;
                    }
                }
                total
            }
        }
    }
}

fn object_code(metadata: &Metadata, default1: &str, default2: &str) -> String {
    if let Some(types) = metadata.string("object_types") {
        return types.to_string();
    }
    let mut objects = [
        metadata.string("object1").unwrap_or(default1).to_uppercase(),
        metadata.string("object2").unwrap_or(default2).to_uppercase(),
    ];
    objects.sort();
    objects.concat()
}

/// Extract one parameter as a flat group of floats, deriving the mass
/// ratio and complex eccentricity when the key itself is absent
fn parameter_values(parameter: &str, metadata: &Metadata) -> Vec<f64> {
    if let Some(value) = metadata.get(parameter) {
        return flatten_value(value);
    }
    match parameter {
        "reference_mass_ratio" => {
            let mass1 = floater(metadata.get("reference_mass1"));
            let mass2 = floater(metadata.get("reference_mass2"));
            vec![mass1 / mass2]
        }
        "reference_complex_eccentricity" => {
            let eccentricity = floaterbound(
                metadata
                    .get("reference_eccentricity_bound")
                    .or_else(|| metadata.get("reference_eccentricity")),
            );
            let mean_anomaly = floater(metadata.get("reference_mean_anomaly"));
            vec![
                eccentricity * mean_anomaly.cos(),
                eccentricity * mean_anomaly.sin(),
            ]
        }
        _ => vec![f64::NAN],
    }
}

fn flatten_value(value: &Value) -> Vec<f64> {
    match value {
        Value::Array(items) => items.iter().map(|item| floater(Some(item))).collect(),
        other => vec![floaterbound(Some(other))],
    }
}

fn group_norm(group: &[f64]) -> f64 {
    group.iter().map(|component| component * component).sum::<f64>().sqrt()
}

fn orbits(metadata: &Metadata) -> f64 {
    let count = floater(metadata.get("number_of_orbits"));
    if !count.is_nan() {
        return count;
    }
    let count = floater(metadata.get("number_of_orbits_from_start"));
    if !count.is_nan() {
        return count;
    }
    0.0
}
