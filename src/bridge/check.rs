//! Compatibility validation of the host configuration.
//!
//! The backend supports a strict subset of the host package's features; this
//! check rejects anything outside that subset before any backend object is
//! constructed. Checks are pure and run in a fixed order; the first
//! violation fails the run with its own specific message. Three
//! configurations are accommodated with a warning instead of a failure:
//! leap-frog (substituted with velocity-Verlet), temperature coupling under
//! velocity-Verlet (Andersen is the only available thermostat), and
//! constraint algorithms other than SHAKE (constraints are enforced to the
//! SHAKE tolerance regardless).

use log::warn;

use crate::error::Error;
use crate::model::options::{
    ConstraintAlgorithm, ElectrostaticsKind, EwaldGeometry, IntegratorKind, SimulationOptions,
};
use crate::model::system::HostSystem;

/// Rejects host configurations the backend cannot represent.
///
/// Pure: neither input is mutated. The leap-frog accommodation is a warning
/// here; the translator performs the actual substitution.
pub fn check_compatibility(system: &HostSystem, options: &SimulationOptions) -> Result<(), Error> {
    check_integrator(options)?;
    check_electrostatics(options)?;
    check_coupling(options)?;
    check_unsupported_features(options)?;
    check_foreign_terms(system)?;
    check_constraints(system, options);
    check_cutoffs_and_box(options)?;
    Ok(())
}

fn check_constraints(system: &HostSystem, options: &SimulationOptions) {
    if !system.constraints.is_empty()
        && options.constraint_algorithm != ConstraintAlgorithm::Shake
    {
        warn!(
            "the backend enforces constraints to the SHAKE tolerance ({}), not with the {} \
             algorithm",
            options.shake_tolerance, options.constraint_algorithm
        );
    }
}

fn check_integrator(options: &SimulationOptions) -> Result<(), Error> {
    if options.integrator == IntegratorKind::LeapFrog {
        warn!("the backend does not support leap-frog; using the velocity-Verlet integrator");
    }

    if !options.integrator.is_velocity_verlet_family() && !options.integrator.is_stochastic() {
        return Err(Error::unsupported(format!(
            "integrator \"{}\"; supported integrators are the velocity-Verlet family, \
             Langevin, and Brownian dynamics",
            options.integrator
        )));
    }
    Ok(())
}

fn check_electrostatics(options: &SimulationOptions) -> Result<(), Error> {
    let supported = match options.electrostatics {
        ElectrostaticsKind::ReactionField | ElectrostaticsKind::Ewald | ElectrostaticsKind::Pme => {
            true
        }
        // Plain cutoff only as no-cutoff.
        ElectrostaticsKind::Cutoff => options.rcoulomb == 0.0 && options.rvdw == 0.0,
        ElectrostaticsKind::GeneralizedReactionField => false,
    };
    if !supported {
        return Err(Error::unsupported(
            "electrostatics method; supported methods are no-cutoff (rcoulomb = rvdw = 0), \
             reaction-field, Ewald, and PME"
                .to_string(),
        ));
    }

    if options.electrostatics.is_full() {
        if options.ewald_geometry != EwaldGeometry::ThreeD {
            return Err(Error::unsupported(
                "Ewald summation geometry; only 3-D geometry is supported".to_string(),
            ));
        }
        if options.epsilon_surface != 0.0 {
            return Err(Error::unsupported(
                "surface dielectric correction in Ewald summation".to_string(),
            ));
        }
    }
    Ok(())
}

fn check_coupling(options: &SimulationOptions) -> Result<(), Error> {
    if options.temperature_coupling && options.integrator.is_velocity_verlet_family() {
        warn!(
            "only the Andersen thermostat is available with the velocity-Verlet family of \
             integrators"
        );
    }

    if options.coupling_groups > 1 {
        return Err(Error::unsupported(
            "multiple temperature-coupling groups".to_string(),
        ));
    }

    if options.pressure_coupling {
        return Err(Error::unsupported("pressure coupling".to_string()));
    }

    if options.annealing {
        return Err(Error::unsupported("simulated annealing".to_string()));
    }
    Ok(())
}

fn check_unsupported_features(options: &SimulationOptions) -> Result<(), Error> {
    if options.walls != 0 {
        return Err(Error::unsupported("walls".to_string()));
    }
    if options.pulling {
        return Err(Error::unsupported("pulling".to_string()));
    }
    if options.free_energy {
        return Err(Error::unsupported(
            "free-energy perturbation".to_string(),
        ));
    }
    if options.accelerated_groups > 1 {
        return Err(Error::unsupported(
            "non-equilibrium MD (accelerated groups)".to_string(),
        ));
    }
    if options.electric_field {
        return Err(Error::unsupported("external electric fields".to_string()));
    }
    if options.qmmm {
        return Err(Error::unsupported("QM/MM".to_string()));
    }
    Ok(())
}

fn check_foreign_terms(system: &HostSystem) -> Result<(), Error> {
    for list in &system.foreign_terms {
        if list.count > 0 {
            return Err(Error::unsupported(format!(
                "interaction type \"{}\" ({} terms) has no backend counterpart",
                list.name, list.count
            )));
        }
    }
    Ok(())
}

fn check_cutoffs_and_box(options: &SimulationOptions) -> Result<(), Error> {
    if options.rcoulomb != options.rvdw {
        return Err(Error::unsupported(format!(
            "rcoulomb ({}) != rvdw ({}); the backend uses a single cutoff for Coulomb and \
             van der Waals interactions",
            options.rcoulomb, options.rvdw
        )));
    }

    if options.is_triclinic() {
        return Err(Error::unsupported("triclinic unit cells".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::options::{BoundaryKind, EwaldGeometry};
    use crate::model::system::ForeignTermList;

    fn baseline() -> (HostSystem, SimulationOptions) {
        (HostSystem::new(), SimulationOptions::default())
    }

    #[test]
    fn baseline_configuration_passes() {
        let (sys, opts) = baseline();
        check_compatibility(&sys, &opts).unwrap();
    }

    #[test]
    fn leap_frog_is_accepted_with_substitution() {
        let (sys, mut opts) = baseline();
        opts.integrator = IntegratorKind::LeapFrog;
        check_compatibility(&sys, &opts).unwrap();
    }

    #[test]
    fn steepest_descent_is_rejected() {
        let (sys, mut opts) = baseline();
        opts.integrator = IntegratorKind::SteepestDescent;
        let err = check_compatibility(&sys, &opts).unwrap_err();
        assert!(err.to_string().contains("integrator"));
    }

    #[test]
    fn plain_cutoff_requires_zero_radii() {
        let (sys, mut opts) = baseline();
        opts.electrostatics = ElectrostaticsKind::Cutoff;
        opts.boundary = BoundaryKind::None;
        opts.rcoulomb = 1.0;
        opts.rvdw = 1.0;
        assert!(check_compatibility(&sys, &opts).is_err());

        opts.rcoulomb = 0.0;
        opts.rvdw = 0.0;
        check_compatibility(&sys, &opts).unwrap();
    }

    #[test]
    fn generalized_reaction_field_is_rejected() {
        let (sys, mut opts) = baseline();
        opts.electrostatics = ElectrostaticsKind::GeneralizedReactionField;
        assert!(check_compatibility(&sys, &opts).is_err());
    }

    #[test]
    fn slab_geometry_and_surface_dielectric_are_rejected_for_full_methods() {
        let (sys, mut opts) = baseline();
        opts.ewald_geometry = EwaldGeometry::ThreeDCorrected;
        assert!(check_compatibility(&sys, &opts).is_err());

        opts.ewald_geometry = EwaldGeometry::ThreeD;
        opts.epsilon_surface = 1.0;
        assert!(check_compatibility(&sys, &opts).is_err());

        // The same settings are fine with a non-full method.
        opts.electrostatics = ElectrostaticsKind::ReactionField;
        check_compatibility(&sys, &opts).unwrap();
    }

    #[test]
    fn multiple_coupling_groups_are_rejected() {
        let (sys, mut opts) = baseline();
        opts.temperature_coupling = true;
        opts.coupling_groups = 2;
        let err = check_compatibility(&sys, &opts).unwrap_err();
        assert!(err.to_string().contains("temperature-coupling"));
    }

    #[test]
    fn pressure_coupling_is_rejected() {
        let (sys, mut opts) = baseline();
        opts.pressure_coupling = true;
        let err = check_compatibility(&sys, &opts).unwrap_err();
        assert!(err.to_string().contains("pressure"));
    }

    #[test]
    fn feature_flags_are_each_rejected() {
        let (sys, opts) = baseline();
        let setters: [fn(&mut SimulationOptions); 7] = [
            |o| o.annealing = true,
            |o| o.walls = 2,
            |o| o.pulling = true,
            |o| o.free_energy = true,
            |o| o.accelerated_groups = 2,
            |o| o.electric_field = true,
            |o| o.qmmm = true,
        ];
        for setter in setters {
            let mut tweaked = opts.clone();
            setter(&mut tweaked);
            assert!(check_compatibility(&sys, &tweaked).is_err());
        }
    }

    #[test]
    fn foreign_terms_are_rejected_by_name() {
        let (mut sys, opts) = baseline();
        sys.foreign_terms.push(ForeignTermList {
            name: "position restraints".to_string(),
            count: 3,
        });
        let err = check_compatibility(&sys, &opts).unwrap_err();
        assert!(err.to_string().contains("position restraints"));
    }

    #[test]
    fn zero_count_foreign_terms_are_fine() {
        let (mut sys, opts) = baseline();
        sys.foreign_terms.push(ForeignTermList {
            name: "distance restraints".to_string(),
            count: 0,
        });
        check_compatibility(&sys, &opts).unwrap();
    }

    #[test]
    fn non_shake_constraints_are_accepted_with_substituted_tolerance() {
        let (mut sys, mut opts) = baseline();
        sys.constraints.push(crate::model::system::BondTerm {
            coefficient: 0,
            i: 0,
            j: 1,
        });
        sys.constraint_coefficients
            .push(crate::model::system::ConstraintParams { length: 0.1 });

        opts.constraint_algorithm = ConstraintAlgorithm::Lincs;
        check_compatibility(&sys, &opts).unwrap();
        opts.constraint_algorithm = ConstraintAlgorithm::Shake;
        check_compatibility(&sys, &opts).unwrap();
    }

    #[test]
    fn mismatched_cutoffs_are_rejected() {
        let (sys, mut opts) = baseline();
        opts.rvdw = 1.2;
        let err = check_compatibility(&sys, &opts).unwrap_err();
        assert!(err.to_string().contains("rcoulomb"));
    }

    #[test]
    fn triclinic_box_is_rejected() {
        let (sys, mut opts) = baseline();
        opts.box_vectors[1][0] = 0.5;
        let err = check_compatibility(&sys, &opts).unwrap_err();
        assert!(err.to_string().contains("triclinic"));
    }
}
