use std::fs;
use std::path::{Path, PathBuf};

pub const PT_W_TDB: &str = r#"
$ Pt-W trial assessment used by the unit tests.
$
ELEMENT /-   ELECTRON_GAS              0.0000E+00  0.0000E+00  0.0000E+00!
ELEMENT VA   VACUUM                    0.0000E+00  0.0000E+00  0.0000E+00!
ELEMENT PT   FCC_A1                    1.9508E+02  5.7237E+03  4.1631E+01!
ELEMENT W    BCC_A2                    1.8384E+02  4.9730E+03  3.2617E+01!

FUNCTION GHSERPT  298.15 -7595.631+124.388*T-24.5526*T*LN(T)
    -.00248*T**2-1.879E-07*T**3+7974*T**(-1);  1300.00  Y
    -9253.174+161.529*T-30.2525*T*LN(T)+.00232*T**2
    -2.023E-07*T**3-272446*T**(-1);  4000.00  N !
FUNCTION GHSERW   298.15 -7646.311+130.4*T-24.1*T*LN(T)-.001936*T**2
    +2.07E-07*T**3-5.33E-11*T**4+44500*T**(-1);  6000.00  N !
FUNCTION VV0000   1.0 -12000; 10000 N !
FUNCTION VV0001   1.0 4.5; 10000 N !
FUNCTION VV0002   1.0 2500; 10000 N !

TYPE_DEFINITION % SEQ *!
DEFINE_SYSTEM_DEFAULT ELEMENT 2 !
DEFAULT_COMMAND DEF_SYS_ELEMENT VA /- !

PHASE LIQUID:L %  1  1.0  !
CONSTITUENT LIQUID:L :PT,W :  !
PARAMETER G(LIQUID,PT;0)  298.15 +19909.3-9.275*T+GHSERPT#; 6000 N REF0 !
PARAMETER G(LIQUID,W;0)   298.15 +52160.584-14.10999*T+GHSERW#; 6000 N REF0 !
PARAMETER L(LIQUID,PT,W;0) 298.15 VV0000+VV0001*T; 6000 N REF1 !
PARAMETER L(LIQUID,PT,W;1) 298.15 VV0002; 6000 N REF1 !

PHASE FCC_A1  %  2 1   1 !
CONSTITUENT FCC_A1  :PT,W : VA :  !
PARAMETER G(FCC_A1,PT:VA;0)  298.15 +GHSERPT#; 6000 N REF0 !
PARAMETER G(FCC_A1,W:VA;0)   298.15 +19300+0.63*T+GHSERW#; 6000 N REF0 !
PARAMETER G(FCC_A1,PT,W:VA;0) 298.15 -20000+4*T; 6000 N REF1 !

PHASE BCC_A2  %  2 1   3 !
CONSTITUENT BCC_A2  :PT,W : VA :  !
PARAMETER G(BCC_A2,PT:VA;0)  298.15 +15000-2.8*T+GHSERPT#; 6000 N REF0 !
PARAMETER G(BCC_A2,W:VA;0)   298.15 +GHSERW#; 6000 N REF0 !
"#;

pub const ZPF_1_YAML: &str = r#"
components: [PT, W]
phases: [LIQUID, FCC_A1]
conditions:
  P: 101325
  T: [2100, 2200]
output: ZPF
values:
  - - [LIQUID, [W], [0.30]]
    - [FCC_A1, [W], [0.22]]
  - - [LIQUID, [W], [0.34]]
    - [FCC_A1, [W], [null]]
reference: trial-solidus
"#;

pub const ZPF_2_YAML: &str = r#"
components: [PT, W]
phases: [BCC_A2, LIQUID]
conditions:
  P: 101325
  T: 2800
output: ZPF
values:
  - - [BCC_A2, [W], [0.81]]
    - [LIQUID, [W], [0.62]]
reference: trial-liquidus
"#;

/// Writes the Pt-W database and a `data/` directory with two ZPF datasets under `root`.
///
/// Returns `(database_path, data_directory)`.
pub fn write_pt_w_project(root: &Path) -> (PathBuf, PathBuf) {
    let db_path = root.join("pt-w.tdb");
    fs::write(&db_path, PT_W_TDB).unwrap();

    let data_dir = root.join("data");
    fs::create_dir_all(data_dir.join("liquidus")).unwrap();
    fs::write(data_dir.join("zpf_1.yaml"), ZPF_1_YAML).unwrap();
    fs::write(data_dir.join("liquidus").join("zpf_2.yml"), ZPF_2_YAML).unwrap();
    fs::write(data_dir.join("notes.txt"), "not a dataset").unwrap();

    (db_path, data_dir)
}
