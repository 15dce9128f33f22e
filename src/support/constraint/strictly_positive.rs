use std::cmp::Ordering;

use num_traits::Zero;

use super::{Constrained, Constraint, ConstraintError};

/// Marker type enforcing that a value is strictly positive (greater than zero).
///
/// Every clipping floor is strictly positive, so a floored field can always
/// appear in a denominator.
///
/// # Examples
///
/// ```
/// use twine_turbulence::support::constraint::{Constrained, StrictlyPositive};
///
/// let k_min = StrictlyPositive::new(1e-12).unwrap();
/// assert_eq!(k_min.into_inner(), 1e-12);
///
/// assert!(StrictlyPositive::new(0.0).is_err());
/// assert!(StrictlyPositive::new(-1e-12).is_err());
/// assert!(StrictlyPositive::new(f64::NAN).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StrictlyPositive;

impl StrictlyPositive {
    /// Constructs a [`Constrained<T, StrictlyPositive>`] if the value is strictly positive.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is zero, negative, or not a number (`NaN`).
    pub fn new<T: PartialOrd + Zero>(
        value: T,
    ) -> Result<Constrained<T, StrictlyPositive>, ConstraintError> {
        Constrained::<T, StrictlyPositive>::new(value)
    }
}

impl<T: PartialOrd + Zero> Constraint<T> for StrictlyPositive {
    fn check(value: &T) -> Result<(), ConstraintError> {
        match value.partial_cmp(&T::zero()) {
            Some(Ordering::Greater) => Ok(()),
            Some(Ordering::Equal) => Err(ConstraintError::Zero),
            Some(Ordering::Less) => Err(ConstraintError::Negative),
            None => Err(ConstraintError::NotANumber),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use uom::si::{
        available_energy::joule_per_kilogram, f64::KinematicViscosity,
        kinematic_viscosity::square_meter_per_second,
    };

    use crate::support::units::TurbulentKineticEnergy;

    #[test]
    fn floats() {
        assert!(Constrained::<f64, StrictlyPositive>::new(1e-14).is_ok());
        assert!(StrictlyPositive::new(0.0).is_err());
        assert!(StrictlyPositive::new(-5.0).is_err());
        assert!(StrictlyPositive::new(f64::NAN).is_err());
    }

    #[test]
    fn viscosities() {
        let nu = KinematicViscosity::new::<square_meter_per_second>(1.5e-5);
        assert!(StrictlyPositive::new(nu).is_ok());

        let nu = KinematicViscosity::new::<square_meter_per_second>(0.0);
        assert!(matches!(
            StrictlyPositive::new(nu),
            Err(ConstraintError::Zero)
        ));
    }

    #[test]
    fn kinetic_energy_floor() {
        let k = TurbulentKineticEnergy::new::<joule_per_kilogram>(-1e-9);
        assert!(matches!(
            StrictlyPositive::new(k),
            Err(ConstraintError::Negative)
        ));
    }
}
