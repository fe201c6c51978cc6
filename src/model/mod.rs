//src/model/mod.rs
pub mod amplitudes;
pub mod dial;
pub mod mode;
pub mod symmetry;
pub mod unit_cell;

// Re-exports for cleaner imports
pub use amplitudes::{AmplitudeTable, Hkl};
pub use dial::{DialKind, DialRegistry, DialSpec, Step};
pub use mode::{ExperimentMode, ModeSwitch};
pub use symmetry::{CellCoupling, SymmetryOracle};
pub use unit_cell::{UnitCell, UnitCellCoupler};
