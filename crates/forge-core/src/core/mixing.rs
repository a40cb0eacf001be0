//! Mixing properties of a binary substitutional sublattice.
//!
//! The model covers the first sublattice of a phase holding two species `A < B`
//! (alphabetical), with every other sublattice occupied by a single fixed species.
//! The molar Gibbs energy of mixing, per mole of atoms, is
//!
//! ```text
//! G_mix = [a·R·T·(xA·ln xA + xB·ln xB) + xA·xB·Σ_k L_k(T)·(xA − xB)^k] / atoms
//! ```
//!
//! where `a` is the site ratio of the mixing sublattice and `L_k` are the `G`/`L`
//! interaction parameters of order `k`. Entropy, enthalpy and heat capacity of mixing
//! follow from temperature derivatives taken by central differences. Magnetic
//! contributions are not included.

use crate::core::tdb::expr::{EvalError, GAS_CONSTANT, Piecewise, StateVariables};
use crate::core::tdb::{Database, Phase, VACANCY};
use phf::phf_map;
use std::collections::HashMap;
use thiserror::Error;

const TEMPERATURE_STEP: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MixingProperty {
    Enthalpy,
    Entropy,
    HeatCapacity,
}

static PROPERTY_NAMES: phf::Map<&'static str, MixingProperty> = phf_map! {
    "HM_MIX" => MixingProperty::Enthalpy,
    "SM_MIX" => MixingProperty::Entropy,
    "CPM_MIX" => MixingProperty::HeatCapacity,
};

impl MixingProperty {
    pub const ALL: [MixingProperty; 3] = [
        MixingProperty::Enthalpy,
        MixingProperty::Entropy,
        MixingProperty::HeatCapacity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MixingProperty::Enthalpy => "HM_MIX",
            MixingProperty::Entropy => "SM_MIX",
            MixingProperty::HeatCapacity => "CPM_MIX",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        PROPERTY_NAMES.get(name).copied()
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MixingError {
    #[error("Phase '{0}' is not defined in the database")]
    UnknownPhase(String),
    #[error("Phase '{phase}' needs exactly two species on its first sublattice, found {found}")]
    NotBinary { phase: String, found: usize },
    #[error("Sublattice {index} of phase '{phase}' must hold a single species")]
    MixedSublattice { phase: String, index: usize },
    #[error("Phase '{0}' has no atoms on its fixed sublattices and a zero mixing site ratio")]
    NoAtoms(String),
    #[error("Mole fraction {0} is outside [0, 1]")]
    InvalidFraction(f64),
    #[error(transparent)]
    Evaluation(#[from] EvalError),
}

#[derive(Debug, Clone)]
struct InteractionTerm<'a> {
    order: u32,
    sign: f64,
    function: &'a Piecewise,
}

/// Redlich-Kister mixing model of one phase, bound to a database.
#[derive(Debug, Clone)]
pub struct BinaryMixingModel<'a> {
    db: &'a Database,
    phase: &'a Phase,
    components: [String; 2],
    fixed_species: Vec<String>,
    atoms_per_formula: f64,
    terms: Vec<InteractionTerm<'a>>,
}

fn mixing_species(phase: &Phase) -> Vec<&str> {
    phase
        .constituents
        .first()
        .map(|sub| {
            sub.iter()
                .map(String::as_str)
                .filter(|s| *s != VACANCY)
                .collect()
        })
        .unwrap_or_default()
}

fn is_binary_candidate(phase: &Phase) -> bool {
    mixing_species(phase).len() == 2 && phase.constituents.iter().skip(1).all(|s| s.len() == 1)
}

/// First phase, in database order, whose model fits [`BinaryMixingModel`].
pub fn find_binary_phase(db: &Database) -> Option<&Phase> {
    db.phases().iter().find(|p| is_binary_candidate(p))
}

impl<'a> BinaryMixingModel<'a> {
    pub fn new(db: &'a Database, phase_name: &str) -> Result<Self, MixingError> {
        let phase = db
            .phase(phase_name)
            .ok_or_else(|| MixingError::UnknownPhase(phase_name.to_string()))?;

        let mut species = mixing_species(phase);
        if species.len() != 2 {
            return Err(MixingError::NotBinary {
                phase: phase.name.clone(),
                found: species.len(),
            });
        }
        species.sort_unstable();
        let components = [species[0].to_string(), species[1].to_string()];

        let mut fixed_species = Vec::new();
        for (index, sub) in phase.constituents.iter().enumerate().skip(1) {
            match sub.as_slice() {
                [only] => fixed_species.push(only.clone()),
                _ => {
                    return Err(MixingError::MixedSublattice {
                        phase: phase.name.clone(),
                        index,
                    });
                }
            }
        }

        let atoms_per_formula = phase.site_ratios[0]
            + phase.site_ratios[1..]
                .iter()
                .zip(&fixed_species)
                .filter(|(_, species)| species.as_str() != VACANCY)
                .map(|(ratio, _)| ratio)
                .sum::<f64>();
        if atoms_per_formula <= 0.0 {
            return Err(MixingError::NoAtoms(phase.name.clone()));
        }

        let terms = db
            .parameters_for_phase(&phase.name)
            .filter(|p| p.kind == "G" || p.kind == "L")
            .filter(|p| p.constituent_array.len() == phase.sublattice_count())
            .filter(|p| {
                p.constituent_array[1..]
                    .iter()
                    .zip(&fixed_species)
                    .all(|(given, fixed)| matches!(given.as_slice(), [s] if s == fixed || s == "*"))
            })
            .filter_map(|p| {
                let first = &p.constituent_array[0];
                let sign = match first.as_slice() {
                    [a, b] if *a == components[0] && *b == components[1] => 1.0,
                    [b, a] if *a == components[0] && *b == components[1] => {
                        if p.order % 2 == 1 { -1.0 } else { 1.0 }
                    }
                    _ => return None,
                };
                Some(InteractionTerm {
                    order: p.order,
                    sign,
                    function: &p.function,
                })
            })
            .collect();

        Ok(Self {
            db,
            phase,
            components,
            fixed_species,
            atoms_per_formula,
            terms,
        })
    }

    pub fn phase(&self) -> &Phase {
        self.phase
    }

    /// The two mixing components, alphabetically ordered.
    pub fn components(&self) -> &[String; 2] {
        &self.components
    }

    /// Species per sublattice with the mixing sublattice restricted to the two components.
    pub fn sublattice_configuration(&self) -> Vec<Vec<String>> {
        let mut config = vec![self.components.to_vec()];
        config.extend(self.fixed_species.iter().map(|s| vec![s.clone()]));
        config
    }

    pub fn interaction_orders(&self) -> Vec<u32> {
        self.terms.iter().map(|t| t.order).collect()
    }

    /// Gibbs energy of mixing per mole of atoms at mole fraction `x_b` of the second component.
    pub fn gibbs_energy(
        &self,
        x_b: f64,
        state: StateVariables,
        overrides: Option<&HashMap<String, f64>>,
    ) -> Result<f64, MixingError> {
        self.gibbs_energy_on_branch(x_b, state, state.temperature, overrides)
    }

    /// Gibbs energy with every piecewise function evaluated on the segment that holds
    /// `segment_temperature`.
    fn gibbs_energy_on_branch(
        &self,
        x_b: f64,
        state: StateVariables,
        segment_temperature: f64,
        overrides: Option<&HashMap<String, f64>>,
    ) -> Result<f64, MixingError> {
        if !(0.0..=1.0).contains(&x_b) {
            return Err(MixingError::InvalidFraction(x_b));
        }
        let x_a = 1.0 - x_b;
        let evaluator = self
            .db
            .evaluator(state)
            .with_segment_temperature(segment_temperature);
        let evaluator = match overrides {
            Some(o) => evaluator.with_overrides(o),
            None => evaluator,
        };

        let ideal = self.phase.site_ratios[0]
            * GAS_CONSTANT
            * state.temperature
            * (x_ln_x(x_a) + x_ln_x(x_b));

        let mut excess = 0.0;
        for term in &self.terms {
            let l = evaluator.piecewise(term.function)?;
            excess += term.sign * l * (x_a - x_b).powi(term.order as i32);
        }
        excess *= x_a * x_b;

        Ok((ideal + excess) / self.atoms_per_formula)
    }

    /// Temperature derivative of the Gibbs energy of mixing at `state`.
    ///
    /// The stencil at `T ± 0.01 K` stays on the segments selected at `T`, so values at
    /// the range limits of the parameters (e.g. 298.15 K) are those of the branch in use.
    pub fn property(
        &self,
        property: MixingProperty,
        x_b: f64,
        state: StateVariables,
        overrides: Option<&HashMap<String, f64>>,
    ) -> Result<f64, MixingError> {
        let at = |dt: f64| {
            self.gibbs_energy_on_branch(
                x_b,
                StateVariables {
                    temperature: state.temperature + dt,
                    ..state
                },
                state.temperature,
                overrides,
            )
        };
        let h = TEMPERATURE_STEP;
        let t = state.temperature;
        Ok(match property {
            MixingProperty::Entropy => -(at(h)? - at(-h)?) / (2.0 * h),
            MixingProperty::Enthalpy => {
                let entropy = -(at(h)? - at(-h)?) / (2.0 * h);
                at(0.0)? + t * entropy
            }
            MixingProperty::HeatCapacity => -t * (at(h)? - 2.0 * at(0.0)? + at(-h)?) / (h * h),
        })
    }
}

fn x_ln_x(x: f64) -> f64 {
    if x <= 0.0 { 0.0 } else { x * x.ln() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::PT_W_TDB;

    fn state(t: f64) -> StateVariables {
        StateVariables {
            temperature: t,
            pressure: 101325.0,
        }
    }

    fn db() -> Database {
        PT_W_TDB.parse().unwrap()
    }

    #[test]
    fn property_names_round_trip_through_lookup() {
        for prop in MixingProperty::ALL {
            assert_eq!(MixingProperty::from_name(prop.name()), Some(prop));
        }
        assert_eq!(MixingProperty::from_name("GM_MIX"), None);
    }

    #[test]
    fn first_binary_phase_is_liquid() {
        let db = db();
        assert_eq!(find_binary_phase(&db).unwrap().name, "LIQUID");
    }

    #[test]
    fn model_collects_interaction_terms_of_the_phase() {
        let db = db();
        let model = BinaryMixingModel::new(&db, "LIQUID").unwrap();
        assert_eq!(model.components(), &["PT".to_string(), "W".to_string()]);
        assert_eq!(model.interaction_orders(), vec![0, 1]);
        assert_eq!(
            model.sublattice_configuration(),
            vec![vec!["PT".to_string(), "W".to_string()]]
        );

        let fcc = BinaryMixingModel::new(&db, "FCC_A1").unwrap();
        assert_eq!(fcc.interaction_orders(), vec![0]);
        assert_eq!(fcc.sublattice_configuration()[1], vec!["VA".to_string()]);
    }

    #[test]
    fn unknown_phase_is_rejected() {
        let db = db();
        assert_eq!(
            BinaryMixingModel::new(&db, "SIGMA").unwrap_err(),
            MixingError::UnknownPhase("SIGMA".to_string())
        );
    }

    #[test]
    fn mixing_quantities_vanish_at_pure_endpoints() {
        let db = db();
        let model = BinaryMixingModel::new(&db, "LIQUID").unwrap();
        for x in [0.0, 1.0] {
            for prop in MixingProperty::ALL {
                let value = model.property(prop, x, state(1500.0), None).unwrap();
                assert!(value.abs() < 1e-6, "{} at x={} was {}", prop.name(), x, value);
            }
        }
    }

    #[test]
    fn gibbs_energy_matches_closed_form() {
        let db = db();
        let model = BinaryMixingModel::new(&db, "LIQUID").unwrap();
        let t = 1500.0;
        let x = 0.25;
        let l0 = -12000.0 + 4.5 * t;
        let l1 = 2500.0;
        let expected = GAS_CONSTANT * t * (0.75_f64 * 0.75_f64.ln() + 0.25 * 0.25_f64.ln())
            + 0.75 * 0.25 * (l0 + l1 * (0.75 - 0.25));
        let value = model.gibbs_energy(x, state(t), None).unwrap();
        assert!((value - expected).abs() < 1e-8);
    }

    #[test]
    fn derivatives_match_linear_temperature_dependence() {
        let db = db();
        let model = BinaryMixingModel::new(&db, "LIQUID").unwrap();
        let t = 1500.0;
        let x: f64 = 0.5;
        let ideal_entropy = -GAS_CONSTANT * 2.0 * x * x.ln();
        let expected_entropy = ideal_entropy - 0.25 * 4.5;
        let expected_enthalpy = 0.25 * -12000.0;

        let sm = model
            .property(MixingProperty::Entropy, x, state(t), None)
            .unwrap();
        let hm = model
            .property(MixingProperty::Enthalpy, x, state(t), None)
            .unwrap();
        let cpm = model
            .property(MixingProperty::HeatCapacity, x, state(t), None)
            .unwrap();
        assert!((sm - expected_entropy).abs() < 1e-6);
        assert!((hm - expected_enthalpy).abs() < 1e-4);
        assert!(cpm.abs() < 1e-2);
    }

    #[test]
    fn derivatives_hold_at_the_lower_range_limit() {
        let db = db();
        let model = BinaryMixingModel::new(&db, "LIQUID").unwrap();
        let t = 298.15;
        let x: f64 = 0.5;
        let expected_entropy = -GAS_CONSTANT * 2.0 * x * x.ln() - 0.25 * 4.5;

        let hm = model
            .property(MixingProperty::Enthalpy, x, state(t), None)
            .unwrap();
        let sm = model
            .property(MixingProperty::Entropy, x, state(t), None)
            .unwrap();
        let cpm = model
            .property(MixingProperty::HeatCapacity, x, state(t), None)
            .unwrap();
        assert!((hm - 0.25 * -12000.0).abs() < 1e-4, "HM_MIX was {}", hm);
        assert!((sm - expected_entropy).abs() < 1e-6, "SM_MIX was {}", sm);
        assert!(cpm.abs() < 1e-2, "CPM_MIX was {}", cpm);
    }

    #[test]
    fn derivatives_hold_at_the_upper_range_limit() {
        let db = db();
        let model = BinaryMixingModel::new(&db, "LIQUID").unwrap();
        let t = 6000.0;
        let x: f64 = 0.25;
        let expected_enthalpy = 0.75 * 0.25 * (-12000.0 + 2500.0 * 0.5);

        let hm = model
            .property(MixingProperty::Enthalpy, x, state(t), None)
            .unwrap();
        let cpm = model
            .property(MixingProperty::HeatCapacity, x, state(t), None)
            .unwrap();
        assert!((hm - expected_enthalpy).abs() < 1e-3, "HM_MIX was {}", hm);
        assert!(cpm.abs() < 1e-1, "CPM_MIX was {}", cpm);
    }

    #[test]
    fn overrides_change_the_excess_term() {
        let db = db();
        let model = BinaryMixingModel::new(&db, "LIQUID").unwrap();
        let overrides = HashMap::from([
            ("VV0000".to_string(), 0.0),
            ("VV0001".to_string(), 0.0),
            ("VV0002".to_string(), 0.0),
        ]);
        let hm = model
            .property(MixingProperty::Enthalpy, 0.5, state(1500.0), Some(&overrides))
            .unwrap();
        assert!(hm.abs() < 1e-4);
    }

    #[test]
    fn fraction_outside_unit_interval_is_rejected() {
        let db = db();
        let model = BinaryMixingModel::new(&db, "LIQUID").unwrap();
        assert_eq!(
            model.gibbs_energy(1.5, state(1000.0), None),
            Err(MixingError::InvalidFraction(1.5))
        );
    }
}
