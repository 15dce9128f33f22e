//! Quantities derived from the current field state.
//!
//! Nothing here mutates the model. The per-cell formulas are free functions
//! so each closure variant can be checked on literal inputs; [`derive`] and
//! [`diffusivities`] apply them across a mesh.

use nalgebra::{Matrix3, Vector3};

use crate::support::{
    field::{Field, ScalarField, SymmTensorField, TensorField, VectorField, double_dot, symm},
    fv::{FvOperators, curl_from_gradient},
};

use super::{
    config::{
        Cep2Variant, Coefficients, Config, EpsHatVariant, Production, SigmaBlend, TimeScale,
        TimeScaleLimiter,
    },
    fields::FieldStore,
};

/// Anisotropy blending factor `1/(1 + 1.5 φ/k)`.
#[must_use]
pub fn alpha(phi_over_k: f64) -> f64 {
    1.0 / (1.0 + 1.5 * phi_over_k)
}

/// Share of turbulent viscosity, `νt/(νt + cNF ν)`.
#[must_use]
pub fn nut_frac(nut: f64, nu: f64, c_nf: f64) -> f64 {
    nut / (nut + c_nf * nu)
}

/// Kolmogorov time scale `6 sqrt(ν/ε)`.
#[must_use]
pub fn kolmogorov_time_scale(nu: f64, epsilon: f64) -> f64 {
    6.0 * (nu / epsilon).sqrt()
}

/// Turbulent Reynolds number `k²/(ν ε)`.
#[must_use]
pub fn turbulent_reynolds(k: f64, nu: f64, epsilon: f64) -> f64 {
    k * k / (nu * epsilon)
}

/// Effective diffusivity `νt σ + ν f`, with `f` the molecular share.
#[must_use]
pub fn effective_diffusivity(nut: f64, sigma: f64, nu: f64, nu_factor: f64) -> f64 {
    nut * sigma + nu * nu_factor
}

/// Turbulent diffusion multiplier under the selected blending.
#[must_use]
pub fn sigma(blend: SigmaBlend, init: f64, nut_frac: f64, alpha: f64) -> f64 {
    match blend {
        SigmaBlend::Constant => init,
        SigmaBlend::NutFrac => nut_frac * init + (1.0 - nut_frac),
        SigmaBlend::Alpha => alpha + (1.0 - alpha) * init,
    }
}

/// Destruction coefficient of the dissipation equation.
#[must_use]
pub fn c_ep2(variant: Cep2Variant, c: &Coefficients, re_t: f64, alpha: f64) -> f64 {
    let con = c.c_ep2_con.get();
    let c3 = c.c_ep3.get();
    match variant {
        Cep2Variant::Constant => con,
        Cep2Variant::Reynolds => con * (1.0 - c3 * (-(re_t / 6.0).powi(2)).exp()),
        Cep2Variant::Alpha => alpha * (con - c3) + (1.0 - alpha) * con,
    }
}

/// Epsilon-hat under the selected definition.
///
/// `grad_k_sqrt_sq` is `|∇√k|²`.
#[must_use]
pub fn eps_hat(
    variant: EpsHatVariant,
    c: &Coefficients,
    epsilon: f64,
    nu: f64,
    grad_k_sqrt_sq: f64,
    re_t: f64,
) -> f64 {
    match variant {
        EpsHatVariant::Epsilon => epsilon,
        EpsHatVariant::Viscous => {
            (epsilon - 2.0 * nu * grad_k_sqrt_sq).max(c.c_ehm.get() * epsilon)
        }
        EpsHatVariant::Reynolds => epsilon * re_t / (re_t + c.c_ehr.get()),
    }
}

/// Dissipation time scale before limiting.
#[must_use]
pub fn time_scale(
    variant: TimeScale,
    c: &Coefficients,
    k: f64,
    epsilon: f64,
    eps_hat: f64,
    kolmogorov: f64,
) -> f64 {
    match variant {
        TimeScale::Standard => k / epsilon,
        TimeScale::EpsHat => k / eps_hat,
        TimeScale::Additive => k / epsilon + c.g_t2.get() * kolmogorov,
    }
}

/// Applies the selected limiter to a time scale.
///
/// The realizable upper bound `gT1 k/(√6 cMu φ |S|)` is skipped where it is
/// unbounded.
#[must_use]
pub fn limit_time_scale(
    limiter: TimeScaleLimiter,
    c: &Coefficients,
    ts: f64,
    kolmogorov: f64,
    k: f64,
    phi: f64,
    strain_rate: f64,
) -> f64 {
    let lower = c.c_t.get() * kolmogorov;
    match limiter {
        TimeScaleLimiter::None => ts,
        TimeScaleLimiter::Kolmogorov => ts.max(lower),
        TimeScaleLimiter::Realizable => {
            let bounded = ts.max(lower);
            let denominator = 6.0_f64.sqrt() * c.c_mu.get() * phi * strain_rate;
            if denominator > 0.0 {
                bounded.min(c.g_t1.get() * k / denominator)
            } else {
                bounded
            }
        }
    }
}

/// Production of turbulent kinetic energy.
#[must_use]
pub fn production(
    variant: Production,
    psi: &Vector3<f64>,
    vorticity: &Vector3<f64>,
    nut: f64,
    strain: &Matrix3<f64>,
) -> f64 {
    match variant {
        Production::Vorticity => psi.dot(vorticity).max(0.0),
        Production::Strain => 2.0 * nut * double_dot(strain, strain),
        Production::Magnitude => psi.norm() * vorticity.norm(),
    }
}

/// Step-local quantities derived from the mean flow and the current state.
#[derive(Debug, Clone)]
pub struct Derived {
    /// Floored copies guarding divisions.
    pub k_safe: ScalarField,
    pub epsilon_safe: ScalarField,
    pub nut_safe: ScalarField,
    pub phi_safe: ScalarField,

    pub grad_u: TensorField,
    pub vorticity: VectorField,
    pub strain: SymmTensorField,
    /// `|S| = sqrt(2 S:S)`.
    pub strain_rate: ScalarField,

    pub grad_k: VectorField,
    pub k_sqrt: ScalarField,
    pub grad_k_sqrt: VectorField,
    /// `|∇√k|²`.
    pub grad_k_sqrt_sq: ScalarField,
    pub phi_sqrt: ScalarField,
    pub grad_phi: VectorField,
    pub grad_psi: TensorField,

    pub phi_over_k: ScalarField,
    pub alpha: ScalarField,
    pub re_t: ScalarField,
    pub nut_frac: ScalarField,

    pub eps_hat: ScalarField,
    pub eps_hat_ratio: ScalarField,
    pub kolmogorov: ScalarField,
    /// Limited dissipation time scale.
    pub time_scale: ScalarField,
    pub production: ScalarField,
    pub production_3d: ScalarField,
    pub c_ep2: ScalarField,
}

/// Effective diffusivities held fixed for one step.
#[derive(Debug, Clone)]
pub struct Diffusivities {
    pub sigma_k: ScalarField,
    pub sigma_epsilon: ScalarField,
    pub sigma_phi: ScalarField,
    pub sigma_psi: ScalarField,
    pub k: ScalarField,
    pub epsilon: ScalarField,
    pub phi: ScalarField,
    pub psi: ScalarField,
}

fn cellwise(name: &str, n_cells: usize, f: impl Fn(usize) -> f64) -> ScalarField {
    Field::new(name, (0..n_cells).map(f).collect())
}

/// Derives every step-local quantity from `velocity` and the current fields.
pub fn derive<O>(
    ops: &O,
    velocity: &VectorField,
    fields: &FieldStore,
    config: &Config,
    nu: f64,
) -> Derived
where
    O: FvOperators + ?Sized,
{
    let c = &config.coefficients;
    let s = &config.switches;
    let n = fields.n_cells();

    let k_min = c.k_min.get().value;
    let eps_min = c.epsilon_min.get().value;
    let nut_min = c.nut_min.get().value;
    let phi_min = c.phi_min.get().value;

    let k_safe = fields.k.map("kSafe", |k| k.max(k_min));
    let epsilon_safe = fields.epsilon.map("epsilonSafe", |e| e.max(eps_min));
    let nut_safe = fields.nut.map("nutSafe", |v| v.max(nut_min));
    let phi_safe = fields.phi.map("phiSafe", |p| p.max(phi_min));

    let grad_u = ops.grad_vector(velocity).renamed("grad(U)");
    let vorticity = curl_from_gradient(&grad_u).renamed("vorticity");
    let strain = grad_u.map("S", symm);
    let strain_rate = strain.map("magS", |s| (2.0 * double_dot(s, s)).sqrt());

    let grad_k = ops.grad(&fields.k).renamed("gradk");
    let k_sqrt = fields.k.map("kSqrt", |k| k.max(0.0).sqrt());
    let grad_k_sqrt = ops.grad(&k_sqrt).renamed("gradkSqrt");
    let grad_k_sqrt_sq = grad_k_sqrt.map("gradkSqrtSqr", |g| g.norm_squared());
    let phi_sqrt = fields.phi.map("phiSqrt", |p| p.max(0.0).sqrt());
    let grad_phi = ops.grad(&fields.phi).renamed("gradTpphi");
    let grad_psi = ops.grad_vector(&fields.psi).renamed("gradTppsi");

    let phi_over_k = fields.phi.zip_map(&k_safe, "PhiOverK", |p, k| p / k);
    let alpha_field = phi_over_k.map("Alpha", |r| alpha(*r));
    let re_t = cellwise("reTau", n, |i| {
        turbulent_reynolds(fields.k[i], nu, epsilon_safe[i])
    });
    let nut_frac_field = fields
        .nut
        .map("nutFrac", |v| nut_frac(*v, nu, c.c_nf.get()));

    let kolmogorov = epsilon_safe.map("kol", |e| kolmogorov_time_scale(nu, *e));
    let eps_hat_field = cellwise("epsHat", n, |i| {
        eps_hat(
            s.eps_hat,
            c,
            fields.epsilon[i],
            nu,
            grad_k_sqrt_sq[i],
            re_t[i],
        )
    });
    let eps_hat_ratio = cellwise("eHrC", n, |i| eps_hat_field[i] / epsilon_safe[i]);

    let time_scale_field = cellwise("Ts", n, |i| {
        let ts = time_scale(
            s.time_scale,
            c,
            k_safe[i],
            epsilon_safe[i],
            eps_hat_field[i].max(eps_min),
            kolmogorov[i],
        );
        limit_time_scale(
            s.limiter,
            c,
            ts,
            kolmogorov[i],
            k_safe[i],
            phi_safe[i],
            strain_rate[i],
        )
    });

    let production_field = cellwise("tpProd", n, |i| {
        production(
            s.production,
            &fields.psi[i],
            &vorticity[i],
            nut_safe[i],
            &strain[i],
        )
    });
    // −R:∇U with R = (2/3)k I − 2 νt S.
    let production_3d = cellwise("tpProd3d", n, |i| {
        -2.0 / 3.0 * fields.k[i] * grad_u[i].trace()
            + 2.0 * fields.nut[i] * double_dot(&strain[i], &grad_u[i])
    });
    let c_ep2_field = cellwise("cEp2", n, |i| {
        c_ep2(s.c_ep2, c, re_t[i], alpha_field[i])
    });

    Derived {
        k_safe,
        epsilon_safe,
        nut_safe,
        phi_safe,
        grad_u,
        vorticity,
        strain,
        strain_rate,
        grad_k,
        k_sqrt,
        grad_k_sqrt,
        grad_k_sqrt_sq,
        phi_sqrt,
        grad_phi,
        grad_psi,
        phi_over_k,
        alpha: alpha_field,
        re_t,
        nut_frac: nut_frac_field,
        eps_hat: eps_hat_field,
        eps_hat_ratio,
        kolmogorov,
        time_scale: time_scale_field,
        production: production_field,
        production_3d,
        c_ep2: c_ep2_field,
    }
}

/// Blends the diffusion multipliers and forms the effective diffusivities.
pub fn diffusivities(
    nut: &ScalarField,
    derived: &Derived,
    config: &Config,
    nu: f64,
) -> Diffusivities {
    let c = &config.coefficients;
    let s = &config.switches;
    let n = nut.len();

    let blend = |name: &str, variant: SigmaBlend, init: f64| {
        cellwise(name, n, |i| {
            sigma(variant, init, derived.nut_frac[i], derived.alpha[i])
        })
    };
    let sigma_k = blend("sigmaK", s.sigma_k, c.sigma_k_init.get());
    let sigma_epsilon = blend("sigmaEps", s.sigma_epsilon, c.sigma_eps_init.get());
    let sigma_phi = blend("sigmaPhi", s.sigma_phi, c.sigma_phi_init.get());
    let sigma_psi = blend("sigmaPsi", s.sigma_psi, c.sigma_psi_init.get());

    let effective = |name: &str, sigma: &ScalarField, nu_factor: f64| {
        cellwise(name, n, |i| effective_diffusivity(nut[i], sigma[i], nu, nu_factor))
    };
    let k = effective("DkEff", &sigma_k, 1.0);
    let epsilon = effective("DepsilonEff", &sigma_epsilon, c.sigma_eps_visc.get());
    let phi = effective("DphiEff", &sigma_phi, 1.0);
    let psi = effective("DpsiEff", &sigma_psi, c.psi_nu_frac.get());

    Diffusivities {
        sigma_k,
        sigma_epsilon,
        sigma_phi,
        sigma_psi,
        k,
        epsilon,
        phi,
        psi,
    }
}
