//! Derivation of non-equilibrium mixing records from composition points.
//!
//! Records use the non-equilibrium dataset layout of ESPEI-style assessments so that
//! they can be persisted next to, and consumed like, hand-written datasets.

use super::error::EngineError;
use crate::core::mixing::{BinaryMixingModel, MixingProperty, find_binary_phase};
use crate::core::store::{DocumentStore, StructuredRecord};
use crate::core::tdb::Database;
use crate::core::tdb::expr::StateVariables;
use serde_json::{Value, json};
use tracing::{debug, info};

pub const BASELINE_REFERENCE: &str = "phaseforge:endpoints";
pub const DERIVED_REFERENCE: &str = "phaseforge:mixing-model";

/// Resolves the phase records are derived for.
pub fn target_phase<'a>(
    db: &'a Database,
    phase: Option<&str>,
) -> Result<BinaryMixingModel<'a>, EngineError> {
    let name = match phase {
        Some(name) => name.to_string(),
        None => find_binary_phase(db)
            .map(|p| p.name.clone())
            .ok_or_else(|| {
                EngineError::Derivation(
                    "no phase has exactly two species on its first sublattice".to_string(),
                )
            })?,
    };
    Ok(BinaryMixingModel::new(db, &name)?)
}

/// Species, phase and site layout shared by every record of one derivation.
struct RecordLayout {
    phases: Vec<String>,
    components: Vec<String>,
    configuration: Vec<Value>,
    site_ratios: Vec<f64>,
}

impl RecordLayout {
    fn of_model(model: &BinaryMixingModel<'_>) -> Self {
        let sublattices = model.sublattice_configuration();
        let mut components: Vec<String> = sublattices.iter().flatten().cloned().collect();
        components.sort();
        components.dedup();
        Self {
            phases: vec![model.phase().name.clone()],
            components,
            configuration: sublattices.iter().map(|s| sublattice_entry(s)).collect(),
            site_ratios: model.phase().site_ratios.clone(),
        }
    }

    /// Layout for a database without a binary phase: the database components on a
    /// single sublattice, no phase.
    fn of_database(db: &Database) -> Self {
        let components = db.components();
        Self {
            phases: Vec::new(),
            configuration: vec![sublattice_entry(&components)],
            components,
            site_ratios: vec![1.0],
        }
    }
}

/// Builds the non-equilibrium store for `points`.
///
/// The store always starts with one endpoint record per property (occupancies `[1, 0]`
/// and `[0, 1]`, values `0`), then holds one record per property for each point, in
/// point order. With no points and no phase given, a database without a binary phase
/// still yields the endpoint records.
pub fn derive_records(
    db: &Database,
    phase: Option<&str>,
    points: &[f64],
    state: StateVariables,
) -> Result<DocumentStore, EngineError> {
    let model = match (phase, points) {
        (None, []) => find_binary_phase(db)
            .map(|p| BinaryMixingModel::new(db, &p.name))
            .transpose()?,
        _ => Some(target_phase(db, phase)?),
    };
    let layout = match &model {
        Some(model) => {
            debug!(
                "Deriving non-equilibrium records for phase {} ({}-{})",
                model.phase().name,
                model.components()[0],
                model.components()[1]
            );
            RecordLayout::of_model(model)
        }
        None => {
            debug!("No binary phase; deriving endpoint records only");
            RecordLayout::of_database(db)
        }
    };

    let mut store = DocumentStore::new();
    for property in MixingProperty::ALL {
        store.insert(record(
            &layout,
            property,
            &[0.0, 1.0],
            &[0.0, 0.0],
            state,
            BASELINE_REFERENCE,
        ));
    }
    if let Some(model) = &model {
        for &x in points {
            for property in MixingProperty::ALL {
                let value = model.property(property, x, state, None)?;
                store.insert(record(
                    &layout,
                    property,
                    &[x],
                    &[value],
                    state,
                    DERIVED_REFERENCE,
                ));
            }
        }
    }

    info!(
        "Derived {} non-equilibrium record(s) from {} composition point(s)",
        store.len(),
        points.len()
    );
    Ok(store)
}

fn sublattice_entry(species: &[String]) -> Value {
    match species {
        [only] => json!(only),
        many => json!(many),
    }
}

fn record(
    layout: &RecordLayout,
    property: MixingProperty,
    fractions: &[f64],
    values: &[f64],
    state: StateVariables,
    reference: &str,
) -> StructuredRecord {
    let configurations: Vec<Value> = fractions
        .iter()
        .map(|_| json!(layout.configuration))
        .collect();
    let occupancies: Vec<Value> = fractions
        .iter()
        .map(|&x| {
            let mut occupancy = vec![json!([1.0 - x, x])];
            occupancy.extend(layout.configuration.iter().skip(1).map(|_| json!(1.0)));
            Value::Array(occupancy)
        })
        .collect();

    let mut record = StructuredRecord::new();
    record.insert("components", json!(layout.components));
    record.insert("phases", json!(layout.phases));
    record.insert(
        "solver",
        json!({
            "mode": "manual",
            "sublattice_site_ratios": layout.site_ratios,
            "sublattice_configurations": configurations,
            "sublattice_occupancies": occupancies,
        }),
    );
    record.insert(
        "conditions",
        json!({ "P": state.pressure, "T": state.temperature }),
    );
    record.insert("output", json!(property.name()));
    record.insert("values", json!([[values]]));
    record.insert("reference", json!(reference));
    record.insert("excluded_model_contributions", json!(["mag"]));
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::PT_W_TDB;

    fn state() -> StateVariables {
        StateVariables {
            temperature: 1500.0,
            pressure: 101325.0,
        }
    }

    fn db() -> Database {
        PT_W_TDB.parse().unwrap()
    }

    #[test]
    fn empty_points_yield_three_baseline_records() {
        let store = derive_records(&db(), None, &[], state()).unwrap();
        assert_eq!(store.len(), 3);
        let outputs: Vec<_> = store.records().map(|r| r.get("output").unwrap().clone()).collect();
        assert_eq!(outputs, vec![json!("HM_MIX"), json!("SM_MIX"), json!("CPM_MIX")]);
        for record in store.records() {
            assert_eq!(record.get("values"), Some(&json!([[[0.0, 0.0]]])));
            assert_eq!(
                record.pointer("/solver/sublattice_occupancies"),
                Some(&json!([[[1.0, 0.0]], [[0.0, 1.0]]]))
            );
        }
    }

    #[test]
    fn each_point_adds_one_record_per_property() {
        let store = derive_records(&db(), None, &[0.25, 0.5], state()).unwrap();
        assert_eq!(store.len(), 9);
        assert_eq!(
            store.search_field("reference", &json!(DERIVED_REFERENCE)).len(),
            6
        );
        let first = store.get(4).unwrap();
        assert_eq!(first.get("output"), Some(&json!("HM_MIX")));
        assert_eq!(first.get("phases"), Some(&json!(["LIQUID"])));
        assert_eq!(
            first.pointer("/solver/sublattice_occupancies"),
            Some(&json!([[[0.75, 0.25]]]))
        );
        assert_eq!(first.get("conditions"), Some(&json!({"P": 101325.0, "T": 1500.0})));
    }

    #[test]
    fn fixed_sublattices_appear_as_single_species() {
        let store = derive_records(&db(), Some("FCC_A1"), &[0.5], state()).unwrap();
        let record = store.get(4).unwrap();
        assert_eq!(record.get("components"), Some(&json!(["PT", "VA", "W"])));
        assert_eq!(
            record.pointer("/solver/sublattice_configurations"),
            Some(&json!([[["PT", "W"], "VA"]]))
        );
        assert_eq!(
            record.pointer("/solver/sublattice_occupancies"),
            Some(&json!([[[0.5, 0.5], 1.0]]))
        );
        assert_eq!(
            record.pointer("/solver/sublattice_site_ratios"),
            Some(&json!([1.0, 1.0]))
        );
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = derive_records(&db(), None, &[0.1, 0.9], state()).unwrap();
        let b = derive_records(&db(), None, &[0.1, 0.9], state()).unwrap();
        assert_eq!(a.to_json_string().unwrap(), b.to_json_string().unwrap());
    }

    #[test]
    fn unknown_phase_fails_derivation() {
        let err = derive_records(&db(), Some("SIGMA"), &[], state()).unwrap_err();
        assert!(matches!(err, EngineError::Mixing { .. }));
    }

    const UNARY_TDB: &str =
        "ELEMENT PT FCC_A1 195.08 0 0 !\nPHASE FCC_A1 % 1 1 !\nCONSTITUENT FCC_A1 :PT: !";

    #[test]
    fn unary_database_still_yields_baselines_without_points() {
        let db: Database = UNARY_TDB.parse().unwrap();
        let store = derive_records(&db, None, &[], state()).unwrap();
        assert_eq!(store.len(), 3);
        for record in store.records() {
            assert_eq!(record.get("components"), Some(&json!(["PT"])));
            assert_eq!(record.get("phases"), Some(&json!([])));
            assert_eq!(record.get("reference"), Some(&json!(BASELINE_REFERENCE)));
        }
    }

    #[test]
    fn points_need_a_binary_phase() {
        let db: Database = UNARY_TDB.parse().unwrap();
        let err = derive_records(&db, None, &[0.5], state()).unwrap_err();
        assert!(matches!(err, EngineError::Derivation(_)));
    }

    #[test]
    fn records_at_the_lower_range_limit_hold_branch_values() {
        let at_limit = StateVariables {
            temperature: 298.15,
            pressure: 101325.0,
        };
        let store = derive_records(&db(), None, &[0.5], at_limit).unwrap();
        let hm = store.get(4).unwrap().pointer("/values/0/0/0").unwrap().as_f64().unwrap();
        assert_eq!(store.get(4).unwrap().get("output"), Some(&json!("HM_MIX")));
        assert!((hm - -3000.0).abs() < 1e-4, "HM_MIX was {}", hm);
    }
}
