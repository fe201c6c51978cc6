// src/model/symmetry.rs
use crate::model::unit_cell::UnitCell;

/// Answers whether a candidate cell is compatible with the crystal's space group.
///
/// Supplied by the crystallography backend; the session only queries it once,
/// at load time.
pub trait SymmetryOracle {
    fn is_compatible(&self, candidate: &UnitCell) -> bool;
}

impl<F> SymmetryOracle for F
where
    F: Fn(&UnitCell) -> bool,
{
    fn is_compatible(&self, candidate: &UnitCell) -> bool {
        self(candidate)
    }
}

/// Which of a, b, c may be edited independently, and how the others follow.
///
/// Fixed at load time and never re-evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellCoupling {
    /// a, b, c vary independently.
    AllFree,
    /// c scales with a.
    AbFree,
    /// b scales with a.
    AcFree,
    /// c scales with b, a stays nominal. Asymmetric: editing c leaves b alone.
    BcFree,
    /// b and c scale with a.
    AOnly,
    /// Any other pattern (b only, c only, none). A length without its own dial
    /// follows the relative change of the edited b.
    Partial { a: bool, b: bool, c: bool },
}

impl CellCoupling {
    /// Queries the oracle with perturbed cells.
    ///
    /// 1. c + 10 Å decides whether c is free
    /// 2. b + 10 Å decides whether b is free
    /// 3. all lengths × 1.5 decides whether a is free
    pub fn detect(nominal: &UnitCell, oracle: &dyn SymmetryOracle) -> Self {
        let test_c = nominal.with_lengths(nominal.a, nominal.b, nominal.c + 10.0);
        let test_b = nominal.with_lengths(nominal.a, nominal.b + 10.0, nominal.c);
        let test_abc = nominal.with_lengths(nominal.a * 1.5, nominal.b * 1.5, nominal.c * 1.5);

        let c = oracle.is_compatible(&test_c);
        let b = oracle.is_compatible(&test_b);
        let a = oracle.is_compatible(&test_abc);

        let coupling = Self::from_freedom(a, b, c);
        log::debug!("Unit cell coupling for {}: {:?}", nominal, coupling);
        coupling
    }

    pub fn from_freedom(a: bool, b: bool, c: bool) -> Self {
        match (a, b, c) {
            (true, true, true) => CellCoupling::AllFree,
            (true, true, false) => CellCoupling::AbFree,
            (true, false, true) => CellCoupling::AcFree,
            (false, true, true) => CellCoupling::BcFree,
            (true, false, false) => CellCoupling::AOnly,
            (a, b, c) => CellCoupling::Partial { a, b, c },
        }
    }

    /// Whether a (index 0), b (1) or c (2) keeps its own dial.
    pub fn is_free(&self, axis: usize) -> bool {
        let (a, b, c) = match *self {
            CellCoupling::AllFree => (true, true, true),
            CellCoupling::AbFree => (true, true, false),
            CellCoupling::AcFree => (true, false, true),
            CellCoupling::BcFree => (false, true, true),
            CellCoupling::AOnly => (true, false, false),
            CellCoupling::Partial { a, b, c } => (a, b, c),
        };
        [a, b, c].get(axis).copied().unwrap_or(false)
    }
}
