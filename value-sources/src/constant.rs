use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use tracing::debug;

use super::*;
use crate::dictionary::{self, EntryReader};
use crate::value_source;

/// A value source that has the same value everywhere.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct Constant <T> {
  name: String,
  value: T,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  dimensions: Option <DimensionSet>,
}

impl <T: Component> Constant <T> {
  pub const TYPE_NAME: &'static str = "constant";

  pub fn new (name: impl Into <String>, value: T)->Self {
    Constant {name: name.into(), value, dimensions: None}
  }

  pub fn with_dimensions (mut self, dimensions: DimensionSet)->Self {
    self.dimensions = Some (dimensions);
    self
  }

  /// Read `[dimensions]? value`.
  pub fn read (name: impl Into <String>, reader: &mut EntryReader)->Result <Self, value_source::Error> {
    let dimensions = reader.read_dimensions_if_present()?;
    let value = reader.read_value()?;
    let result = Constant {name: name.into(), value, dimensions};
    debug!(entry = %result.name, "constructed constant");
    Ok (result)
  }

  pub fn name (&self)->&str {
    &self.name
  }
  pub fn dimensions (&self)->Option <&DimensionSet> {
    self.dimensions.as_ref()
  }

  pub fn value (&self)->T {
    self.value
  }

  pub fn integrate (&self, x1: Scalar, x2: Scalar)->T {
    self.value.cmpt_multiply (T::uniform (x2 - x1))
  }

  fn dimensioned (&self, value: T)->Dimensioned <T> {
    match self.dimensions {
      Some (dimensions) => Dimensioned::new (self.name.clone(), dimensions, value),
      None => Dimensioned::dimensionless (self.name.clone(), value),
    }
  }

  pub fn write_data (&self, out: &mut dyn fmt::Write)->fmt::Result {
    write!(out, "{} {}", self.name, Self::TYPE_NAME)?;
    if let Some (dimensions) = &self.dimensions {
      write!(out, " {}", dimensions)?;
    }
    write!(out, " ")?;
    dictionary::write_value (out, &self.value)?;
    write!(out, ";")
  }
}

impl <T: Component> ValueSource <T> for Constant <T> {
  fn name (&self)->&str {
    &self.name
  }
  fn type_name (&self)->&'static str {
    Self::TYPE_NAME
  }
  fn value (&self, _x: Scalar)->T {
    self.value
  }
  fn integrate (&self, x1: Scalar, x2: Scalar)->Result <T, value_source::Error> {
    Ok (Constant::integrate (self, x1, x2))
  }
  fn dim_value (&self, _x: Scalar)->Dimensioned <T> {
    self.dimensioned (self.value)
  }
  fn dim_integrate (&self, x1: Scalar, x2: Scalar)->Result <Dimensioned <T>, value_source::Error> {
    Ok (self.dimensioned (Constant::integrate (self, x1, x2)))
  }
  fn convert_time_base (&mut self, _scale_factor: Scalar) {}
  fn write_data (&self, out: &mut dyn fmt::Write)->fmt::Result {
    Constant::write_data (self, out)
  }
  fn clone_box (&self)->Box <dyn ValueSource <T>> {
    Box::new (self.clone())
  }
}

impl <T: Component> Display for Constant <T> {
  fn fmt (&self, formatter: &mut fmt::Formatter)->fmt::Result {
    Constant::write_data (self, formatter)
  }
}

#[cfg (test)]
mod tests {
  use super::*;
  use nalgebra::Vector3;

  #[test]
  fn integral_is_value_times_width() {
    let constant = Constant::new ("c", 2.5);
    assert_eq!(constant.integrate (1.0, 3.0), 5.0);
    assert_eq!(constant.integrate (3.0, 1.0), -5.0);
    let gravity = Constant::new ("g", Vector3::new (0.0, 0.0, -9.81));
    assert_eq!(gravity.integrate (0.0, 2.0), Vector3::new (0.0, 0.0, -19.62));
  }

  #[test]
  fn time_base_conversion_leaves_value_alone() {
    let mut constant = Constant::new ("c", 2.5);
    ValueSource::convert_time_base (&mut constant, 60.0);
    assert_eq!(constant.value(), 2.5);
  }

  #[test]
  fn reads_and_writes_dimensions() {
    let mut reader = EntryReader::new ("[1 -3 0 0 0] (1 2 3)").unwrap();
    let density = Constant::<Vector3 <Scalar>>::read ("rho", &mut reader).unwrap();
    assert_eq!(density.dimensions(), Some (&DimensionSet::from_five ([1.0, -3.0, 0.0, 0.0, 0.0])));
    assert_eq!(density.to_string(), "rho constant [1 -3 0 0 0 0 0] (1 2 3);");
    assert_eq!(ValueSource::dim_value (&density, 7.0).dimensions, *density.dimensions().unwrap());
  }

  #[test]
  fn dimensions_can_be_attached_after_construction() {
    let plain = Constant::new ("p", 101325.0);
    assert_eq!(ValueSource::dim_value (&plain, 0.0), Dimensioned::dimensionless ("p", 101325.0));
    assert_eq!(plain.to_string(), "p constant 101325;");

    let pressure = plain.with_dimensions (DimensionSet::from_five ([1.0, -1.0, -2.0, 0.0, 0.0]));
    assert_eq!(pressure.to_string(), "p constant [1 -1 -2 0 0 0 0] 101325;");
    let integral = ValueSource::dim_integrate (&pressure, 0.0, 2.0).unwrap();
    assert_eq!(integral.value, 202650.0);
    assert_eq!(integral.dimensions.exponents(), &[1.0, -1.0, -2.0, 0.0, 0.0, 0.0, 0.0]);

    let text = pressure.to_string();
    let mut reader = EntryReader::new (&text).unwrap();
    reader.read_word().unwrap();
    reader.read_word().unwrap();
    assert_eq!(Constant::read ("p", &mut reader).unwrap(), pressure);
  }
}
