//! Value sources: quantities that vary with a scalar argument (usually time),
//! read from dictionary entries and evaluated or integrated on demand.
//!
//! ```text
//! inletVelocity  polynomial [0 1 -1 0 0 0 0] ((1 2) (2 3));
//! ```

#[macro_use]
extern crate failure;
#[macro_use]
extern crate serde_derive;
extern crate nalgebra;
extern crate num;

use num::traits::Zero;
use std::fmt::Debug;
use std::ops::{Add, AddAssign, Sub};

pub mod constant;
pub mod dictionary;
pub mod dimensions;
pub mod polynomial;
pub mod value_source;

pub use constant::Constant;
pub use dimensions::{DimensionSet, Dimensioned};
pub use polynomial::{PolynomialEntry, Term};
pub use value_source::{Registry, ValueSource};

/// The type of the independent variable and of every individual component.
pub type Scalar = f64;

/// A value that a value source can produce: a scalar, or a fixed-size vector
/// whose arithmetic in this crate is always component-wise.
pub trait Component:
  'static + Sized + Copy + Clone + Debug + PartialEq + Send + Sync +
  Add <Self, Output = Self> + Sub <Self, Output = Self> + AddAssign <Self> +
  Zero
  {
  const COMPONENTS: usize;
  fn component (&self, which: usize)->Scalar;
  fn set_component (&mut self, which: usize, value: Scalar);

  /// A value with every component equal to `value`.
  fn uniform (value: Scalar)->Self {
    Self::zero().map_components (| _ | value)
  }
  fn map_components <F: Fn(Scalar)->Scalar> (mut self, transform: F)->Self {
    for index in 0..Self::COMPONENTS {
      let new_component = (transform) (self.component (index));
      self.set_component (index, new_component);
    }
    self
  }
  fn zip_components <F: Fn(Scalar, Scalar)->Scalar> (mut self, other: Self, combine: F)->Self {
    for index in 0..Self::COMPONENTS {
      let new_component = (combine) (self.component (index), other.component (index));
      self.set_component (index, new_component);
    }
    self
  }
  fn any_component <F: Fn(Scalar)->bool> (&self, predicate: F)->bool {
    (0..Self::COMPONENTS).any (| index | predicate (self.component (index)))
  }

  fn cmpt_multiply (self, other: Self)->Self {
    self.zip_components (other, | a, b | a*b)
  }
  fn cmpt_divide (self, other: Self)->Self {
    self.zip_components (other, | a, b | a/b)
  }
  /// Raise each component to the power of the matching component of `exponent`.
  ///
  /// A negative base with a non-integer exponent gives NaN, exactly like `f64::powf`.
  fn cmpt_pow (self, exponent: Self)->Self {
    self.zip_components (exponent, Scalar::powf)
  }
}

pub mod impls {
  use super::*;
  use nalgebra::{Vector1, Vector2, Vector3, Vector4, Vector5, Vector6};
  macro_rules! impl_vector {
    ($([$components: expr, $Vector: ident],)*) => {
      $(
        impl Component for $Vector <Scalar> {
          const COMPONENTS: usize = $components;
          fn component (&self, which: usize)->Scalar {self [which]}
          fn set_component (&mut self, which: usize, value: Scalar) {self [which] = value}
        }
      )*
    }
  }
  impl_vector! ([1, Vector1], [2, Vector2], [3, Vector3], [4, Vector4], [5, Vector5], [6, Vector6],);

  impl Component for Scalar {
    const COMPONENTS: usize = 1;
    fn component (&self, _which: usize)->Scalar {*self}
    fn set_component (&mut self, _which: usize, value: Scalar) {*self = value}
    fn uniform (value: Scalar)->Self {value}
  }
}

#[cfg (test)]
mod tests {
  use super::*;
  use nalgebra::Vector3;
  use proptest::prelude::*;

  #[test]
  fn uniform_fills_every_component() {
    assert_eq!(Vector3::<Scalar>::uniform (2.5), Vector3::new (2.5, 2.5, 2.5));
    assert_eq!(Scalar::uniform (-1.0), -1.0);
  }

  #[test]
  fn vector_power_is_component_wise() {
    let base = Vector3::new (2.0, 3.0, 4.0);
    let exponent = Vector3::new (1.0, 2.0, 0.5);
    assert_eq!(base.cmpt_pow (exponent), Vector3::new (2.0, 9.0, 2.0));
  }

  #[test]
  fn negative_base_with_fractional_exponent_is_nan() {
    assert!((-8.0 as Scalar).cmpt_pow (1.0/3.0).is_nan());
  }

  proptest! {
    #[test]
    fn randomly_test_scalar_ops_match_plain_arithmetic (a in -100.0f64..100.0, b in 0.5f64..100.0) {
      prop_assert_eq!(a.cmpt_multiply (b), a*b);
      prop_assert_eq!(a.cmpt_divide (b), a/b);
      prop_assert_eq!(b.cmpt_pow (a/25.0), b.powf (a/25.0));
    }

    #[test]
    fn randomly_test_vector_ops_act_per_component (a in prop::array::uniform3 (-100.0f64..100.0), b in prop::array::uniform3 (0.5f64..100.0)) {
      let product = Vector3::from (a).cmpt_multiply (Vector3::from (b));
      for index in 0..3 {
        prop_assert_eq!(product [index], a [index]*b [index]);
      }
    }
  }
}
