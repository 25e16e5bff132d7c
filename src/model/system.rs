//! Host topology: atoms, bonded term lists, constraints, and exclusions.
//!
//! Bonded interactions follow the host package's flat-list layout: each term
//! references a coefficient row in a per-kind side table plus the indices of
//! the participating atoms. The side tables are indexed by the term's
//! `coefficient` field; per-atom nonbonded parameters are indexed through
//! `type_indices` into the type-level tables.

/// Diagonal Lennard-Jones coefficients for one nonbonded type, in the host's
/// `(c6, c12)` parameterization.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PairCoefficients {
    pub c6: f64,
    pub c12: f64,
}

/// A two-atom bonded term referencing a coefficient row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BondTerm {
    pub coefficient: usize,
    pub i: usize,
    pub j: usize,
}

/// A three-atom bonded term referencing a coefficient row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AngleTerm {
    pub coefficient: usize,
    pub i: usize,
    pub j: usize,
    pub k: usize,
}

/// A four-atom bonded term referencing a coefficient row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TorsionTerm {
    pub coefficient: usize,
    pub i: usize,
    pub j: usize,
    pub k: usize,
    pub l: usize,
}

/// Harmonic bond coefficients: equilibrium length (nm) and force constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicBondParams {
    pub length: f64,
    pub k: f64,
}

/// Urey-Bradley coefficients: the 1-3 bond part plus the angle part.
///
/// The angle is in degrees, as the host stores it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UreyBradleyParams {
    pub r13: f64,
    pub k_ub: f64,
    pub theta_deg: f64,
    pub k_theta: f64,
}

/// Harmonic angle coefficients, equilibrium angle in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicAngleParams {
    pub theta_deg: f64,
    pub k: f64,
}

/// Periodic (proper) torsion coefficients, phase in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicTorsionParams {
    pub multiplicity: i32,
    pub phase_deg: f64,
    pub k: f64,
}

/// Ryckaert-Bellemans torsion coefficients C0..C5.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RbTorsionParams {
    pub c: [f64; 6],
}

/// Pairwise distance constraint coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintParams {
    pub length: f64,
}

/// A rigid three-atom (settle) group: the first atom plus the next two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleTerm {
    pub coefficient: usize,
    /// Index of the central (oxygen) atom; the two hydrogens are the next
    /// two consecutive indices, as the host lays them out.
    pub oxygen: usize,
}

/// Settle side lengths: central-to-outer and outer-to-outer distances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleParams {
    pub d_oh: f64,
    pub d_hh: f64,
}

/// An interaction list the bridge cannot translate, with its term count.
///
/// The host package carries many more interaction kinds (restraints,
/// impropers, ...) than the backend supports; the compatibility check rejects
/// the run when any of these is populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignTermList {
    pub name: String,
    pub count: usize,
}

/// Complete host topology input for one run.
///
/// Per-atom vectors (`masses`, `charges`, `type_indices`, `exclusions`) all
/// have length [`num_atoms`](HostSystem::num_atoms). Type-level tables
/// (`pair_coefficients`, `gb_radii`, `gb_scales`) are indexed through
/// `type_indices`.
#[derive(Debug, Clone, Default)]
pub struct HostSystem {
    pub masses: Vec<f64>,
    pub charges: Vec<f64>,
    pub type_indices: Vec<usize>,
    pub pair_coefficients: Vec<PairCoefficients>,
    /// Scaling factor applied to the charge product of 1-4 pairs.
    pub fudge_qq: f64,

    pub bonds: Vec<BondTerm>,
    pub bond_coefficients: Vec<HarmonicBondParams>,
    pub urey_bradley: Vec<AngleTerm>,
    pub urey_bradley_coefficients: Vec<UreyBradleyParams>,
    pub angles: Vec<AngleTerm>,
    pub angle_coefficients: Vec<HarmonicAngleParams>,
    pub periodic_torsions: Vec<TorsionTerm>,
    pub periodic_torsion_coefficients: Vec<PeriodicTorsionParams>,
    pub rb_torsions: Vec<TorsionTerm>,
    pub rb_torsion_coefficients: Vec<RbTorsionParams>,
    pub pairs_14: Vec<BondTerm>,
    pub pair_14_coefficients: Vec<PairCoefficients>,

    pub constraints: Vec<BondTerm>,
    pub constraint_coefficients: Vec<ConstraintParams>,
    pub settles: Vec<SettleTerm>,
    pub settle_coefficients: Vec<SettleParams>,

    /// Per-atom pairwise exclusion sets.
    pub exclusions: Vec<Vec<usize>>,

    /// Implicit-solvent Born radius per nonbonded type.
    pub gb_radii: Vec<f64>,
    /// Implicit-solvent screening scale per nonbonded type.
    pub gb_scales: Vec<f64>,

    pub foreign_terms: Vec<ForeignTermList>,
}

impl HostSystem {
    pub fn new() -> Self {
        Self {
            fudge_qq: 1.0,
            ..Self::default()
        }
    }

    #[inline]
    pub fn num_atoms(&self) -> usize {
        self.masses.len()
    }

    /// Total backend constraint count this topology expands to: one per
    /// pairwise constraint plus three per settle group.
    #[inline]
    pub fn num_expanded_constraints(&self) -> usize {
        self.constraints.len() + 3 * self.settles.len()
    }

    /// Registers one atom and returns its index.
    pub fn add_atom(&mut self, mass: f64, charge: f64, type_index: usize) -> usize {
        self.masses.push(mass);
        self.charges.push(charge);
        self.type_indices.push(type_index);
        self.exclusions.push(Vec::new());
        self.masses.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_atom_keeps_per_atom_vectors_aligned() {
        let mut sys = HostSystem::new();
        let a = sys.add_atom(15.999, -0.8, 0);
        let b = sys.add_atom(1.008, 0.4, 1);
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(sys.num_atoms(), 2);
        assert_eq!(sys.charges.len(), 2);
        assert_eq!(sys.type_indices.len(), 2);
        assert_eq!(sys.exclusions.len(), 2);
    }

    #[test]
    fn expanded_constraint_count_includes_settles() {
        let mut sys = HostSystem::new();
        sys.constraints.push(BondTerm {
            coefficient: 0,
            i: 0,
            j: 1,
        });
        sys.constraint_coefficients
            .push(ConstraintParams { length: 0.1 });
        sys.settles.push(SettleTerm {
            coefficient: 0,
            oxygen: 2,
        });
        sys.settle_coefficients.push(SettleParams {
            d_oh: 0.09572,
            d_hh: 0.15139,
        });
        assert_eq!(sys.num_expanded_constraints(), 4);
    }
}
