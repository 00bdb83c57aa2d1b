use std::fmt::{self, Display};

use super::*;

const BASE_UNITS: usize = 7;

/// Exponents of the seven base units: mass, length, time, temperature,
/// moles, current and luminous intensity.
#[derive(Copy, Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct DimensionSet([Scalar; BASE_UNITS]);

impl DimensionSet {
  pub const BASE_UNITS: usize = BASE_UNITS;
  pub const DIMENSIONLESS: DimensionSet = DimensionSet([0.0; BASE_UNITS]);

  pub const MASS: usize = 0;
  pub const LENGTH: usize = 1;
  pub const TIME: usize = 2;
  pub const TEMPERATURE: usize = 3;
  pub const MOLES: usize = 4;
  pub const CURRENT: usize = 5;
  pub const LUMINOUS_INTENSITY: usize = 6;

  pub fn new (exponents: [Scalar; BASE_UNITS])->DimensionSet {
    DimensionSet(exponents)
  }

  /// The older five-exponent form, which has no current or luminous intensity.
  pub fn from_five (exponents: [Scalar; 5])->DimensionSet {
    let mut result = DimensionSet::DIMENSIONLESS;
    result.0 [..5].copy_from_slice (&exponents);
    result
  }

  pub fn exponent (&self, which: usize)->Scalar {
    self.0 [which]
  }
  pub fn exponents (&self)->&[Scalar; BASE_UNITS] {
    &self.0
  }
  pub fn is_dimensionless (&self)->bool {
    self.0.iter().all (| exponent | *exponent == 0.0)
  }
}

impl Display for DimensionSet {
  fn fmt (&self, formatter: &mut fmt::Formatter)->fmt::Result {
    write!(formatter, "[")?;
    for (index, exponent) in self.exponents().iter().enumerate() {
      if index > 0 {write!(formatter, " ")?;}
      write!(formatter, "{}", exponent)?;
    }
    write!(formatter, "]")
  }
}

/// A value paired with the name it was produced under and its physical dimensions.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Dimensioned <T> {
  pub name: String,
  pub dimensions: DimensionSet,
  pub value: T,
}

impl <T> Dimensioned <T> {
  pub fn new (name: impl Into <String>, dimensions: DimensionSet, value: T)->Self {
    Dimensioned {name: name.into(), dimensions, value}
  }
  pub fn dimensionless (name: impl Into <String>, value: T)->Self {
    Dimensioned::new (name, DimensionSet::DIMENSIONLESS, value)
  }
}

#[cfg (test)]
mod tests {
  use super::*;

  #[test]
  fn five_exponent_form_pads_with_zeros() {
    let velocity = DimensionSet::from_five ([0.0, 1.0, -1.0, 0.0, 0.0]);
    assert_eq!(velocity, DimensionSet::new ([0.0, 1.0, -1.0, 0.0, 0.0, 0.0, 0.0]));
    assert_eq!(velocity.exponent (DimensionSet::TIME), -1.0);
    assert!(!velocity.is_dimensionless());
    assert_eq!(velocity.exponents(), &[0.0, 1.0, -1.0, 0.0, 0.0, 0.0, 0.0]);
    assert_eq!(velocity.exponents() [DimensionSet::LENGTH], velocity.exponent (DimensionSet::LENGTH));
  }

  #[test]
  fn default_is_dimensionless() {
    assert!(DimensionSet::default().is_dimensionless());
    assert_eq!(Dimensioned::dimensionless ("x", 1.0).dimensions, DimensionSet::DIMENSIONLESS);
  }

  #[test]
  fn displays_all_seven_exponents() {
    let acceleration = DimensionSet::from_five ([0.0, 1.0, -2.0, 0.0, 0.0]);
    assert_eq!(acceleration.to_string(), "[0 1 -2 0 0 0 0]");
    assert_eq!(DimensionSet::new ([1.0, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0]).to_string(), "[1 0.5 0 0 0 0 0]");
  }
}
