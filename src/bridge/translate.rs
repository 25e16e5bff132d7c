//! Translation of the host topology and run options into the backend model.
//!
//! The translator walks the host system in a fixed order and emits the
//! backend object graph: center-of-mass motion removal, bonded force lists,
//! the nonbonded force with its exception table, implicit solvent, the
//! expanded constraint list, and finally the integrator specification.
//! Angles and torsion phases are converted from degrees to radians here;
//! Lennard-Jones coefficients go through [`lj_from_c12_c6`].
//!
//! All translation is pure and infallible at the backend; every failure mode
//! (bad indices, malformed coefficient pairs, untranslatable combinations)
//! is caught on this side and reported as a crate [`Error`].

use crate::backend::system::{
    BackendSystem, ForceTerm, HarmonicAngle, HarmonicBond, ImplicitSolventForce,
    ImplicitSolventMethod, ImplicitSolventParticle, IntegratorSpec, NonbondedException,
    NonbondedForce, NonbondedMethod, NonbondedParticle, PeriodicTorsion, RbTorsion,
};
use crate::bridge::convert::{deg_to_rad, lj_from_c12_c6};
use crate::error::{Error, Result};
use crate::model::options::{BoundaryKind, ElectrostaticsKind, SimulationOptions};
use crate::model::system::HostSystem;

/// Everything [`translate`] produces for one run.
#[derive(Debug, Clone)]
pub struct TranslatedSystem {
    pub system: BackendSystem,
    pub integrator: IntegratorSpec,
    /// Whether center-of-mass motion removal is active; the temperature
    /// calculation subtracts three degrees of freedom when it is.
    pub removes_cm: bool,
}

/// Builds the backend system and integrator from the host model.
///
/// Expects an already-validated configuration (see
/// [`check_compatibility`](crate::bridge::check::check_compatibility));
/// remaining failures indicate an inconsistent host model rather than an
/// unsupported feature choice.
pub fn translate(host: &HostSystem, options: &SimulationOptions) -> Result<TranslatedSystem> {
    let n = host.num_atoms();
    let mut system = BackendSystem::new();

    let removes_cm = options.comm_removal_interval > 0;
    if removes_cm {
        system.add_force(ForceTerm::CmMotionRemover {
            interval: options.comm_removal_interval,
        });
    }

    let (bonds, angles) = translate_bonded_pairs_and_angles(host, n)?;
    system.add_force(ForceTerm::HarmonicBonds(bonds));
    system.add_force(ForceTerm::HarmonicAngles(angles));
    system.add_force(ForceTerm::PeriodicTorsions(translate_periodic_torsions(
        host, n,
    )?));
    system.add_force(ForceTerm::RbTorsions(translate_rb_torsions(host, n)?));

    let nonbonded = translate_nonbonded(host, options, n)?;
    let nonbonded_method = nonbonded.method;
    system.add_force(ForceTerm::Nonbonded(nonbonded));

    if options.implicit_solvent {
        system.add_force(ForceTerm::ImplicitSolvent(translate_implicit_solvent(
            host,
            options,
            nonbonded_method,
        )?));
    }

    if options.temperature_coupling && options.integrator.is_velocity_verlet_family() {
        system.add_force(ForceTerm::AndersenThermostat {
            temperature: options.reference_temperature,
            frequency: friction_from_tau(options.tau_t),
        });
    }

    for &mass in &host.masses {
        system.add_particle(mass);
    }

    translate_constraints(host, n, &mut system)?;

    let integrator = build_integrator(options);

    Ok(TranslatedSystem {
        system,
        integrator,
        removes_cm,
    })
}

#[inline]
fn check_index(term: &'static str, index: usize, num_atoms: usize) -> Result<()> {
    if index >= num_atoms {
        return Err(Error::AtomIndexOutOfRange {
            term,
            index,
            num_atoms,
        });
    }
    Ok(())
}

fn coefficient<'a, T>(table: &'a [T], row: usize, term: &'static str) -> Result<&'a T> {
    table.get(row).ok_or_else(|| {
        Error::translation(format!(
            "{term} term references coefficient row {row}, but the table has {} rows",
            table.len()
        ))
    })
}

/// Harmonic bonds plus the bond and angle halves of Urey-Bradley terms.
fn translate_bonded_pairs_and_angles(
    host: &HostSystem,
    n: usize,
) -> Result<(Vec<HarmonicBond>, Vec<HarmonicAngle>)> {
    let mut bonds = Vec::with_capacity(host.bonds.len() + host.urey_bradley.len());
    let mut angles = Vec::with_capacity(host.angles.len() + host.urey_bradley.len());

    for term in &host.bonds {
        check_index("bond", term.i, n)?;
        check_index("bond", term.j, n)?;
        let p = coefficient(&host.bond_coefficients, term.coefficient, "bond")?;
        bonds.push(HarmonicBond {
            i: term.i,
            j: term.j,
            length: p.length,
            k: p.k,
        });
    }

    // A Urey-Bradley term splits into a 1-3 harmonic bond and a harmonic
    // angle over the same three atoms.
    for term in &host.urey_bradley {
        check_index("urey-bradley", term.i, n)?;
        check_index("urey-bradley", term.j, n)?;
        check_index("urey-bradley", term.k, n)?;
        let p = coefficient(
            &host.urey_bradley_coefficients,
            term.coefficient,
            "urey-bradley",
        )?;
        bonds.push(HarmonicBond {
            i: term.i,
            j: term.k,
            length: p.r13,
            k: p.k_ub,
        });
        angles.push(HarmonicAngle {
            i: term.i,
            j: term.j,
            k: term.k,
            angle: deg_to_rad(p.theta_deg),
            k_force: p.k_theta,
        });
    }

    for term in &host.angles {
        check_index("angle", term.i, n)?;
        check_index("angle", term.j, n)?;
        check_index("angle", term.k, n)?;
        let p = coefficient(&host.angle_coefficients, term.coefficient, "angle")?;
        angles.push(HarmonicAngle {
            i: term.i,
            j: term.j,
            k: term.k,
            angle: deg_to_rad(p.theta_deg),
            k_force: p.k,
        });
    }

    Ok((bonds, angles))
}

fn translate_periodic_torsions(host: &HostSystem, n: usize) -> Result<Vec<PeriodicTorsion>> {
    let mut out = Vec::with_capacity(host.periodic_torsions.len());
    for term in &host.periodic_torsions {
        for index in [term.i, term.j, term.k, term.l] {
            check_index("torsion", index, n)?;
        }
        let p = coefficient(
            &host.periodic_torsion_coefficients,
            term.coefficient,
            "torsion",
        )?;
        out.push(PeriodicTorsion {
            i: term.i,
            j: term.j,
            k: term.k,
            l: term.l,
            periodicity: p.multiplicity,
            phase: deg_to_rad(p.phase_deg),
            k_force: p.k,
        });
    }
    Ok(out)
}

fn translate_rb_torsions(host: &HostSystem, n: usize) -> Result<Vec<RbTorsion>> {
    let mut out = Vec::with_capacity(host.rb_torsions.len());
    for term in &host.rb_torsions {
        for index in [term.i, term.j, term.k, term.l] {
            check_index("rb-torsion", index, n)?;
        }
        let p = coefficient(&host.rb_torsion_coefficients, term.coefficient, "rb-torsion")?;
        out.push(RbTorsion {
            i: term.i,
            j: term.j,
            k: term.k,
            l: term.l,
            c: p.c,
        });
    }
    Ok(out)
}

/// Selects the backend nonbonded method from boundary mode and
/// electrostatics method. The compatibility check has already rejected the
/// combinations with no mapping.
fn nonbonded_method(options: &SimulationOptions) -> Result<NonbondedMethod> {
    let periodic = matches!(options.boundary, BoundaryKind::Xyz);
    let method = match (periodic, options.electrostatics) {
        (true, ElectrostaticsKind::ReactionField) => NonbondedMethod::CutoffPeriodic,
        (true, ElectrostaticsKind::Ewald) => NonbondedMethod::Ewald,
        (true, ElectrostaticsKind::Pme) => NonbondedMethod::Pme,
        (false, _) if options.rcoulomb == 0.0 => NonbondedMethod::NoCutoff,
        (false, ElectrostaticsKind::Cutoff | ElectrostaticsKind::ReactionField) => {
            NonbondedMethod::CutoffNonPeriodic
        }
        _ => {
            return Err(Error::unsupported(format!(
                "electrostatics method \"{}\" with this boundary mode",
                options.electrostatics
            )))
        }
    };
    Ok(method)
}

fn translate_nonbonded(
    host: &HostSystem,
    options: &SimulationOptions,
    n: usize,
) -> Result<NonbondedForce> {
    let method = nonbonded_method(options)?;
    let box_lengths = match method {
        NonbondedMethod::CutoffPeriodic | NonbondedMethod::Ewald | NonbondedMethod::Pme => {
            Some(options.box_diagonal())
        }
        _ => None,
    };

    let mut particles = Vec::with_capacity(n);
    for atom in 0..n {
        let type_index = host.type_indices[atom];
        let p = coefficient(&host.pair_coefficients, type_index, "nonbonded")?;
        let (sigma, epsilon) = lj_from_c12_c6(p.c12, p.c6)?;
        particles.push(NonbondedParticle {
            charge: host.charges[atom],
            sigma,
            epsilon,
        });
    }

    // 1-4 pairs become scaled exceptions; every other excluded pair becomes
    // a zero-interaction exception. A pair listed both ways keeps the 1-4
    // parameters.
    let mut exceptions = Vec::new();
    let mut covered: std::collections::HashSet<(usize, usize)> = std::collections::HashSet::new();

    for pair in &host.pairs_14 {
        check_index("1-4 pair", pair.i, n)?;
        check_index("1-4 pair", pair.j, n)?;
        let p = coefficient(&host.pair_14_coefficients, pair.coefficient, "1-4 pair")?;
        let (sigma, epsilon) = lj_from_c12_c6(p.c12, p.c6)?;
        exceptions.push(NonbondedException {
            i: pair.i,
            j: pair.j,
            charge_product: host.fudge_qq * host.charges[pair.i] * host.charges[pair.j],
            sigma,
            epsilon,
        });
        covered.insert(ordered(pair.i, pair.j));
    }

    for (i, excluded) in host.exclusions.iter().enumerate() {
        for &j in excluded {
            check_index("exclusion", j, n)?;
            if i < j && covered.insert((i, j)) {
                exceptions.push(NonbondedException {
                    i,
                    j,
                    charge_product: 0.0,
                    sigma: 1.0,
                    epsilon: 0.0,
                });
            }
        }
    }

    Ok(NonbondedForce {
        method,
        cutoff: options.rcoulomb,
        box_lengths,
        particles,
        exceptions,
    })
}

#[inline]
fn ordered(i: usize, j: usize) -> (usize, usize) {
    if i < j {
        (i, j)
    } else {
        (j, i)
    }
}

fn translate_implicit_solvent(
    host: &HostSystem,
    options: &SimulationOptions,
    nonbonded: NonbondedMethod,
) -> Result<ImplicitSolventForce> {
    let method = match nonbonded {
        NonbondedMethod::NoCutoff => ImplicitSolventMethod::NoCutoff,
        NonbondedMethod::CutoffNonPeriodic => ImplicitSolventMethod::CutoffNonPeriodic,
        NonbondedMethod::CutoffPeriodic => ImplicitSolventMethod::CutoffPeriodic,
        NonbondedMethod::Ewald | NonbondedMethod::Pme => {
            return Err(Error::unsupported(
                "implicit solvent with lattice-sum electrostatics".to_string(),
            ))
        }
    };

    let mut particles = Vec::with_capacity(host.num_atoms());
    for atom in 0..host.num_atoms() {
        let type_index = host.type_indices[atom];
        let radius = *coefficient(&host.gb_radii, type_index, "implicit-solvent")?;
        let scale = *coefficient(&host.gb_scales, type_index, "implicit-solvent")?;
        particles.push(ImplicitSolventParticle {
            charge: host.charges[atom],
            radius,
            scale,
        });
    }

    Ok(ImplicitSolventForce {
        solute_dielectric: options.epsilon_r,
        solvent_dielectric: options.gb_epsilon_solvent,
        cutoff: options.rcoulomb,
        method,
        particles,
    })
}

/// Pairwise constraints plus the three-constraint expansion of each settle
/// group (center to each outer atom at `d_oh`, outer to outer at `d_hh`).
fn translate_constraints(host: &HostSystem, n: usize, system: &mut BackendSystem) -> Result<()> {
    for term in &host.constraints {
        check_index("constraint", term.i, n)?;
        check_index("constraint", term.j, n)?;
        let p = coefficient(&host.constraint_coefficients, term.coefficient, "constraint")?;
        system.add_constraint(term.i, term.j, p.length);
    }

    for settle in &host.settles {
        let o = settle.oxygen;
        check_index("settle", o, n)?;
        check_index("settle", o + 2, n)?;
        let p = coefficient(&host.settle_coefficients, settle.coefficient, "settle")?;
        system.add_constraint(o, o + 1, p.d_oh);
        system.add_constraint(o, o + 2, p.d_oh);
        system.add_constraint(o + 1, o + 2, p.d_hh);
    }

    Ok(())
}

#[inline]
fn friction_from_tau(tau_t: f64) -> f64 {
    if tau_t > 0.0 {
        1.0 / tau_t
    } else {
        0.0
    }
}

fn build_integrator(options: &SimulationOptions) -> IntegratorSpec {
    use crate::model::options::IntegratorKind;

    match options.integrator {
        IntegratorKind::Langevin => IntegratorSpec::Langevin {
            temperature: options.reference_temperature,
            friction: friction_from_tau(options.tau_t),
            time_step: options.time_step,
            seed: options.random_seed,
            constraint_tolerance: options.shake_tolerance,
        },
        IntegratorKind::Brownian => IntegratorSpec::Brownian {
            temperature: options.reference_temperature,
            friction: friction_from_tau(options.tau_t),
            time_step: options.time_step,
            seed: options.random_seed,
            constraint_tolerance: options.shake_tolerance,
        },
        // Leap-frog lands here too; the validator has already warned about
        // the substitution.
        _ => IntegratorSpec::Verlet {
            time_step: options.time_step,
            constraint_tolerance: options.shake_tolerance,
        },
    }
}
