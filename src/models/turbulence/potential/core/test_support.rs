use std::{cell::RefCell, num::NonZeroUsize, rc::Rc};

use nalgebra::Vector3;
use uom::si::{f64::KinematicViscosity, kinematic_viscosity::square_meter_per_second};

use crate::support::{
    constraint::{Constrained, StrictlyPositive},
    dictionary::{Dictionary, DictionaryError, DictionarySource},
    field::{ScalarField, VectorField},
    fv::channel::{ChannelMesh, FaceFlux},
};

use super::{CorrectError, FieldStore, InitialFields, MeanFlow, TurbulentPotential};

pub(super) const NU: f64 = 1e-3;
const HEIGHT: f64 = 2.0;

/// A channel of height 2 advanced with time step 0.1.
pub(super) fn channel(n_cells: usize) -> ChannelMesh {
    ChannelMesh::new(
        NonZeroUsize::new(n_cells).expect("at least one cell"),
        StrictlyPositive::new(HEIGHT).unwrap(),
        StrictlyPositive::new(0.1).unwrap(),
    )
}

/// Parabolic streamwise velocity with unit centreline value.
pub(super) fn shear_velocity(mesh: &ChannelMesh) -> VectorField {
    let u = mesh
        .cell_centres()
        .into_iter()
        .map(|y| Vector3::new(bump(y), 0.0, 0.0))
        .collect();
    VectorField::new("U", u)
}

/// Turbulence that peaks at the centreline and stays positive near the walls.
pub(super) fn developed_state(n_cells: usize) -> FieldStore {
    FieldStore::new(n_cells, developed_initial(n_cells)).unwrap()
}

pub(super) fn developed_initial(n_cells: usize) -> InitialFields {
    let y = channel(n_cells).cell_centres();
    let profile = |name: &str, base: f64, peak: f64| {
        ScalarField::new(name, y.iter().map(|y| base + peak * bump(*y)).collect())
    };

    let k = profile("k", 0.01, 0.04);
    let epsilon = profile("epsilon", 0.005, 0.02);
    let phi = k.map("phi", |k| 0.5 * k);
    let nut = k.zip_map(&epsilon, "nut", |k, e| 0.09 * k * k / e);
    let psi = VectorField::new(
        "psi",
        y.iter()
            .map(|y| Vector3::new(0.0, 0.0, 0.01 * (y - 0.5 * HEIGHT)))
            .collect(),
    );

    InitialFields {
        k,
        epsilon,
        phi,
        psi,
        nut: Some(nut),
    }
}

fn bump(y: f64) -> f64 {
    4.0 * y * (HEIGHT - y) / (HEIGHT * HEIGHT)
}

pub(super) fn viscosity() -> Constrained<KinematicViscosity, StrictlyPositive> {
    StrictlyPositive::new(KinematicViscosity::new::<square_meter_per_second>(NU)).unwrap()
}

/// A dictionary the test can edit while the model holds a handle to it.
#[derive(Debug, Clone, Default)]
pub(super) struct SharedDictionary(Rc<RefCell<Dictionary>>);

impl SharedDictionary {
    /// Replaces the `turbulentPotentialCoeffs` sub-dictionary.
    pub(super) fn set_coeffs(&self, coeffs: Dictionary) {
        self.0
            .borrow_mut()
            .insert("turbulentPotentialCoeffs", coeffs);
    }
}

impl DictionarySource for SharedDictionary {
    fn coeffs(&self, model_name: &str) -> Result<Dictionary, DictionaryError> {
        self.0.borrow().coeffs(model_name)
    }
}

pub(super) type TestModel = TurbulentPotential<
    ChannelMesh,
    SharedDictionary,
    Constrained<KinematicViscosity, StrictlyPositive>,
>;

/// A model on an 8-cell channel together with its flow and dictionary.
pub(super) struct Fixture {
    pub(super) model: TestModel,
    pub(super) velocity: VectorField,
    pub(super) flux: FaceFlux,
    pub(super) dictionary: SharedDictionary,
}

impl Fixture {
    pub(super) fn new(coeffs: Dictionary) -> Self {
        let n_cells = 8;
        let mesh = channel(n_cells);
        let velocity = shear_velocity(&mesh);
        let flux = FaceFlux::zero(n_cells);
        let dictionary = SharedDictionary::default();
        dictionary.set_coeffs(coeffs);

        let model = TurbulentPotential::new(
            MeanFlow {
                velocity: &velocity,
                flux: &flux,
            },
            mesh,
            viscosity(),
            dictionary.clone(),
            developed_initial(n_cells),
        )
        .unwrap();

        Self {
            model,
            velocity,
            flux,
            dictionary,
        }
    }

    /// Runs one correction step on the fixture's flow.
    pub(super) fn step(&mut self) -> Result<(), CorrectError> {
        self.model.correct(MeanFlow {
            velocity: &self.velocity,
            flux: &self.flux,
        })
    }
}
