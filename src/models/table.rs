// Flat, NaN-tolerant tabular projection of the catalog

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::metadata::{
    datetime_from_value, floater, floaterbound, norm3, three_vec, Metadata,
};
use crate::models::simulations::Simulations;

/// One simulation, flattened to typed columns
///
/// The raw metadata has missing keys and mixed formats; every numeric
/// column here is an `f64` that is NaN when the underlying value is absent
/// or unusable, so rows can be compared and filtered without error
/// handling. `reference_eccentricity_bound` converts upper-bound strings
/// such as `"<0.0001"` to the bounding value.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationRow {
    pub id: String,
    pub deprecated: bool,
    pub object_types: String,
    pub reference_mass_ratio: f64,
    pub reference_chi_eff: f64,
    pub reference_chi1_perp: f64,
    pub reference_chi2_perp: f64,
    pub reference_eccentricity: f64,
    pub reference_eccentricity_bound: f64,
    pub reference_time: f64,
    pub reference_dimensionless_spin1: [f64; 3],
    pub reference_dimensionless_spin1_mag: f64,
    pub reference_dimensionless_spin2: [f64; 3],
    pub reference_dimensionless_spin2_mag: f64,
    pub reference_chi1_mag: f64,
    pub reference_chi2_mag: f64,
    pub reference_mean_anomaly: f64,
    pub reference_orbital_frequency: [f64; 3],
    pub reference_orbital_frequency_mag: f64,
    pub reference_position1: [f64; 3],
    pub reference_position2: [f64; 3],
    pub reference_separation: f64,
    pub reference_mass1: f64,
    pub reference_mass2: f64,
    pub relaxation_time: f64,
    pub common_horizon_time: f64,
    pub remnant_mass: f64,
    pub remnant_dimensionless_spin: [f64; 3],
    pub remnant_dimensionless_spin_mag: f64,
    pub remnant_velocity: [f64; 3],
    pub remnant_velocity_mag: f64,
    #[serde(rename = "EOS")]
    pub eos: Option<String>,
    pub disk_mass: f64,
    pub ejecta_mass: f64,
    pub initial_data_type: String,
    pub initial_separation: f64,
    pub initial_orbital_frequency: f64,
    pub initial_adot: f64,
    #[serde(rename = "initial_ADM_energy")]
    pub initial_adm_energy: f64,
    #[serde(rename = "initial_ADM_linear_momentum")]
    pub initial_adm_linear_momentum: [f64; 3],
    #[serde(rename = "initial_ADM_linear_momentum_mag")]
    pub initial_adm_linear_momentum_mag: f64,
    #[serde(rename = "initial_ADM_angular_momentum")]
    pub initial_adm_angular_momentum: [f64; 3],
    #[serde(rename = "initial_ADM_angular_momentum_mag")]
    pub initial_adm_angular_momentum_mag: f64,
    pub initial_mass1: f64,
    pub initial_mass2: f64,
    pub initial_mass_ratio: f64,
    pub initial_dimensionless_spin1: [f64; 3],
    pub initial_dimensionless_spin1_mag: f64,
    pub initial_dimensionless_spin2: [f64; 3],
    pub initial_dimensionless_spin2_mag: f64,
    pub initial_position1: [f64; 3],
    pub initial_position2: [f64; 3],
    pub number_of_orbits: f64,
    pub number_of_orbits_from_start: f64,
    pub number_of_orbits_from_reference_time: f64,
    #[serde(rename = "DOI_versions")]
    pub doi_versions: Vec<String>,
    pub keywords: Vec<String>,
    pub date_link_earliest: Option<DateTime<Utc>>,
    pub date_run_earliest: Option<DateTime<Utc>>,
    pub date_run_latest: Option<DateTime<Utc>>,
    pub date_postprocessing: Option<DateTime<Utc>>,
}

impl SimulationRow {
    pub fn from_metadata(id: &str, metadata: &Metadata) -> Self {
        let float = |key| floater(metadata.get(key));
        let vector = |key| three_vec(metadata.get(key));
        let date = |key| datetime_from_value(metadata.get(key));
        let strings =
            |key: &str| metadata.string_list(key).unwrap_or_default();

        let spin1 = vector("reference_dimensionless_spin1");
        let spin2 = vector("reference_dimensionless_spin2");
        let orbital_frequency = vector("reference_orbital_frequency");
        let position1 = vector("reference_position1");
        let position2 = vector("reference_position2");
        let remnant_spin = vector("remnant_dimensionless_spin");
        let remnant_velocity = vector("remnant_velocity");
        let adm_linear = vector("initial_ADM_linear_momentum");
        let adm_angular = vector("initial_ADM_angular_momentum");
        let initial_spin1 = vector("initial_dimensionless_spin1");
        let initial_spin2 = vector("initial_dimensionless_spin2");

        let separation = norm3([
            position1[0] - position2[0],
            position1[1] - position2[1],
            position1[2] - position2[2],
        ]);

        let number_of_orbits_from_start = float("number_of_orbits_from_start");
        let mut number_of_orbits = float("number_of_orbits");
        if number_of_orbits.is_nan() {
            number_of_orbits = number_of_orbits_from_start;
        }

        let keywords = strings("keywords");
        let deprecated = keywords.iter().any(|keyword| keyword == "deprecated");

        SimulationRow {
            id: id.to_string(),
            deprecated,
            object_types: metadata.string("object_types").unwrap_or("").to_string(),
            reference_mass_ratio: float("reference_mass_ratio"),
            reference_chi_eff: float("reference_chi_eff"),
            reference_chi1_perp: float("reference_chi1_perp"),
            reference_chi2_perp: float("reference_chi2_perp"),
            reference_eccentricity: float("reference_eccentricity"),
            reference_eccentricity_bound: floaterbound(
                metadata.get("reference_eccentricity"),
            ),
            reference_time: float("reference_time"),
            reference_dimensionless_spin1: spin1,
            reference_dimensionless_spin1_mag: norm3(spin1),
            reference_dimensionless_spin2: spin2,
            reference_dimensionless_spin2_mag: norm3(spin2),
            reference_chi1_mag: norm3(spin1),
            reference_chi2_mag: norm3(spin2),
            reference_mean_anomaly: float("reference_mean_anomaly"),
            reference_orbital_frequency: orbital_frequency,
            reference_orbital_frequency_mag: norm3(orbital_frequency),
            reference_position1: position1,
            reference_position2: position2,
            reference_separation: separation,
            reference_mass1: float("reference_mass1"),
            reference_mass2: float("reference_mass2"),
            relaxation_time: float("relaxation_time"),
            common_horizon_time: float("common_horizon_time"),
            remnant_mass: float("remnant_mass"),
            remnant_dimensionless_spin: remnant_spin,
            remnant_dimensionless_spin_mag: norm3(remnant_spin),
            remnant_velocity,
            remnant_velocity_mag: norm3(remnant_velocity),
            eos: metadata
                .string("EOS")
                .or_else(|| metadata.string("eos"))
                .map(str::to_string),
            disk_mass: float("disk_mass"),
            ejecta_mass: float("ejecta_mass"),
            initial_data_type: metadata
                .string("initial_data_type")
                .unwrap_or("")
                .to_string(),
            initial_separation: float("initial_separation"),
            initial_orbital_frequency: float("initial_orbital_frequency"),
            initial_adot: float("initial_adot"),
            initial_adm_energy: float("initial_ADM_energy"),
            initial_adm_linear_momentum: adm_linear,
            initial_adm_linear_momentum_mag: norm3(adm_linear),
            initial_adm_angular_momentum: adm_angular,
            initial_adm_angular_momentum_mag: norm3(adm_angular),
            initial_mass1: float("initial_mass1"),
            initial_mass2: float("initial_mass2"),
            initial_mass_ratio: float("initial_mass_ratio"),
            initial_dimensionless_spin1: initial_spin1,
            initial_dimensionless_spin1_mag: norm3(initial_spin1),
            initial_dimensionless_spin2: initial_spin2,
            initial_dimensionless_spin2_mag: norm3(initial_spin2),
            initial_position1: vector("initial_position1"),
            initial_position2: vector("initial_position2"),
            number_of_orbits,
            number_of_orbits_from_start,
            number_of_orbits_from_reference_time: float("number_of_orbits_from_reference_time"),
            doi_versions: strings("DOI_versions"),
            keywords,
            date_link_earliest: date("date_link_earliest"),
            date_run_earliest: date("date_run_earliest"),
            date_run_latest: date("date_run_latest"),
            date_postprocessing: date("date_postprocessing"),
        }
    }
}

/// The catalog as rows, with named subset filters
///
/// Every filter returns a new table, so they chain:
/// `table.bbh().noneccentric().undeprecated()`. Comparisons against NaN are
/// false, so rows with missing values drop out of both sides of a
/// threshold filter.
#[derive(Debug, Clone, Default)]
pub struct SimulationsTable {
    pub rows: Vec<SimulationRow>,
    pub tag: Option<String>,
    pub published_at: Option<String>,
}

impl SimulationsTable {
    pub fn from_simulations(simulations: &Simulations) -> Self {
        let rows = simulations
            .iter()
            .map(|(id, metadata)| SimulationRow::from_metadata(id, metadata))
            .collect();
        SimulationsTable {
            rows,
            tag: simulations.tag.clone(),
            published_at: simulations.published_at.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimulationRow> {
        self.rows.iter()
    }

    pub fn get(&self, id: &str) -> Option<&SimulationRow> {
        self.rows.iter().find(|row| row.id == id)
    }

    /// Rows satisfying an arbitrary predicate, as a new table
    pub fn filtered<F>(&self, predicate: F) -> Self
    where
        F: Fn(&SimulationRow) -> bool,
    {
        SimulationsTable {
            rows: self.rows.iter().filter(|row| predicate(row)).cloned().collect(),
            tag: self.tag.clone(),
            published_at: self.published_at.clone(),
        }
    }

    /// Binary black-hole systems
    pub fn bbh(&self) -> Self {
        self.filtered(|row| row.object_types == "BHBH")
    }

    pub fn bhbh(&self) -> Self {
        self.bbh()
    }

    /// Black-hole neutron-star systems
    pub fn bhns(&self) -> Self {
        self.filtered(|row| row.object_types == "BHNS")
    }

    pub fn nsbh(&self) -> Self {
        self.bhns()
    }

    /// Binary neutron-star systems
    pub fn nsns(&self) -> Self {
        self.filtered(|row| row.object_types == "NSNS")
    }

    pub fn bns(&self) -> Self {
        self.nsns()
    }

    /// Systems with eccentricity bound at least 1e-3
    pub fn eccentric(&self) -> Self {
        self.filtered(|row| row.reference_eccentricity_bound >= 1e-3)
    }

    /// Systems with eccentricity bound below 1e-3
    pub fn noneccentric(&self) -> Self {
        self.filtered(|row| row.reference_eccentricity_bound < 1e-3)
    }

    /// Systems whose summed in-plane spin components reach 1e-3 at the
    /// reference time
    pub fn precessing(&self) -> Self {
        self.filtered(|row| row.reference_chi1_perp + row.reference_chi2_perp >= 1e-3)
    }

    pub fn nonprecessing(&self) -> Self {
        self.filtered(|row| row.reference_chi1_perp + row.reference_chi2_perp < 1e-3)
    }

    /// BBH systems carried through inspiral, merger, and ringdown
    ///
    /// Measured (finite) eccentricity and remnant mass are the criteria: a
    /// measured eccentricity rules out hyperbolic and head-on runs, and a
    /// remnant mass means the run reached merger.
    pub fn imr(&self) -> Self {
        self.bbh().filtered(|row| {
            row.reference_eccentricity.is_finite() && row.remnant_mass.is_finite()
        })
    }

    /// Hyperbolic encounters: normalized ADM energy above 1
    pub fn hyperbolic(&self) -> Self {
        self.filtered(|row| {
            let total_mass = row.initial_mass1 + row.initial_mass2;
            total_mass.is_finite()
                && total_mass > 0.0
                && row.initial_adm_energy / total_mass > 1.0
        })
    }

    pub fn deprecated(&self) -> Self {
        self.filtered(|row| row.deprecated)
    }

    pub fn undeprecated(&self) -> Self {
        self.filtered(|row| !row.deprecated)
    }

    /// Sort rows by reference mass ratio, NaN last
    pub fn sort_by_mass_ratio(&mut self) {
        self.rows
            .sort_by(|a, b| a.reference_mass_ratio.total_cmp(&b.reference_mass_ratio));
    }
}
