use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::convert::TryFrom;
use std::fmt::{self, Display};
use tracing::{debug, warn};

use super::*;
use crate::dictionary::{self, EntryReader, ParseError};
use crate::value_source;

#[derive(Debug, Fail, Clone, PartialEq)]
pub enum Error {
  #[fail(display = "polynomial coefficients not found for entry {:?}", name)]
  EmptyCoefficients {
    name: String,
  },
  #[fail(
    display = "polynomial entry {:?} cannot be integrated: term {} has an exponent of -1",
    name, term
  )]
  NotIntegrable {
    name: String,
    term: usize,
  },
}

/// One addend, `coefficient * x^exponent`, of a polynomial.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Term <T> {
  pub coefficient: T,
  pub exponent: T,
}

impl <T: Component> Term <T> {
  pub fn new (coefficient: T, exponent: T)->Self {
    Term {coefficient, exponent}
  }

  /// The closed-form power rule has no answer for any component raised to -1.
  pub fn can_integrate (&self)->bool {
    !self.exponent.any_component (| exponent | exponent == -1.0)
  }

  pub fn value (&self, x: Scalar)->T {
    self.coefficient.cmpt_multiply (T::uniform (x).cmpt_pow (self.exponent))
  }

  fn antiderivative_difference (&self, x1: Scalar, x2: Scalar)->T {
    let raised = self.exponent + T::uniform (1.0);
    self.coefficient.cmpt_divide (raised).cmpt_multiply (
      T::uniform (x2).cmpt_pow (raised) - T::uniform (x1).cmpt_pow (raised)
    )
  }
}

impl <T: Component> From <(T, T)> for Term <T> {
  fn from ((coefficient, exponent): (T, T))->Self {
    Term::new (coefficient, exponent)
  }
}

type Terms <T> = SmallVec <[Term <T>; 4]>;

/// A sum of power terms `Σ c_i x^e_i` in one scalar variable.
///
/// Non-integer and negative exponents are allowed. If any exponent is exactly -1,
/// the polynomial can still be evaluated, but not integrated.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(try_from = "PolynomialEntryData<T>", into = "PolynomialEntryData<T>")]
#[serde(bound(serialize = "T: Component + Serialize", deserialize = "T: Component + Deserialize<'de>"))]
pub struct PolynomialEntry <T: Component> {
  name: String,
  terms: Terms <T>,
  can_integrate: bool,
  dimensions: Option <DimensionSet>,
}

/// The serialized form of a PolynomialEntry; `can_integrate` is always recomputed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolynomialEntryData <T> {
  pub name: String,
  pub terms: Vec <Term <T>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dimensions: Option <DimensionSet>,
}

impl <T: Component> TryFrom <PolynomialEntryData <T>> for PolynomialEntry <T> {
  type Error = Error;
  fn try_from (data: PolynomialEntryData <T>)->Result <Self, Error> {
    PolynomialEntry::build (data.name, data.terms.into_iter().collect(), data.dimensions)
  }
}

impl <T: Component> From <PolynomialEntry <T>> for PolynomialEntryData <T> {
  fn from (entry: PolynomialEntry <T>)->Self {
    PolynomialEntryData {name: entry.name, terms: entry.terms.into_vec(), dimensions: entry.dimensions}
  }
}

impl <T: Component> PolynomialEntry <T> {
  pub const TYPE_NAME: &'static str = "polynomial";

  fn build (name: String, terms: Terms <T>, dimensions: Option <DimensionSet>)->Result <Self, Error> {
    if terms.is_empty() {
      return Err (Error::EmptyCoefficients {name});
    }
    let can_integrate = terms.iter().all (Term::can_integrate);
    if !can_integrate {
      warn!(entry = %name, "polynomial has a term with exponent -1, so it can only be used to evaluate");
    }
    debug!(entry = %name, terms = terms.len(), can_integrate, "constructed polynomial");
    Ok (PolynomialEntry {name, terms, can_integrate, dimensions})
  }

  /// Construct from an explicit list of terms, with no dimensions attached.
  pub fn new <I: IntoIterator> (name: impl Into <String>, terms: I)->Result <Self, Error> where I::Item: Into <Term <T>> {
    PolynomialEntry::build (name.into(), terms.into_iter().map (Into::into).collect(), None)
  }

  /// Read the data that follows the type word: `[dimensions]? ((c1 e1) (c2 e2) ...)`.
  pub fn read (name: impl Into <String>, reader: &mut EntryReader)->Result <Self, value_source::Error> {
    let dimensions = reader.read_dimensions_if_present()?;
    let terms = reader.read_list (| reader | -> Result <Term <T>, ParseError> {
      reader.expect (dictionary::Token::BeginList)?;
      let coefficient = reader.read_value()?;
      let exponent = reader.read_value()?;
      reader.expect (dictionary::Token::EndList)?;
      Ok (Term::new (coefficient, exponent))
    })?;
    Ok (PolynomialEntry::build (name.into(), terms.into_iter().collect(), dimensions)?)
  }

  pub fn name (&self)->&str {
    &self.name
  }
  pub fn terms (&self)->&[Term <T>] {
    &self.terms
  }
  pub fn can_integrate (&self)->bool {
    self.can_integrate
  }
  pub fn dimensions (&self)->Option <&DimensionSet> {
    self.dimensions.as_ref()
  }

  pub fn value (&self, x: Scalar)->T {
    let mut result = T::zero();
    for term in &self.terms {
      result += term.value (x);
    }
    result
  }

  /// Integrate from x1 to x2 using the power rule on each term.
  pub fn integrate (&self, x1: Scalar, x2: Scalar)->Result <T, Error> {
    if !self.can_integrate {
      let term = self.terms.iter().position (| term | !term.can_integrate()).unwrap_or (0);
      return Err (Error::NotIntegrable {name: self.name.clone(), term});
    }
    let mut result = T::zero();
    for term in &self.terms {
      result += term.antiderivative_difference (x1, x2);
    }
    Ok (result)
  }

  fn dimensioned (&self, value: T)->Dimensioned <T> {
    match self.dimensions {
      Some (dimensions) => Dimensioned::new (self.name.clone(), dimensions, value),
      None => Dimensioned::dimensionless (self.name.clone(), value),
    }
  }

  pub fn dim_value (&self, x: Scalar)->Dimensioned <T> {
    self.dimensioned (self.value (x))
  }

  pub fn dim_integrate (&self, x1: Scalar, x2: Scalar)->Result <Dimensioned <T>, Error> {
    Ok (self.dimensioned (self.integrate (x1, x2)?))
  }

  /// Re-express the polynomial for a new unit of its variable, where `x_old = scale_factor * x_new`.
  ///
  /// Each coefficient is multiplied by `scale_factor^exponent`; exponents don't change.
  pub fn convert_time_base (&mut self, scale_factor: Scalar) {
    for term in &mut self.terms {
      term.coefficient = term.coefficient.cmpt_multiply (T::uniform (scale_factor).cmpt_pow (term.exponent));
    }
    debug!(entry = %self.name, scale_factor, "converted polynomial time base");
  }

  pub fn write_data (&self, out: &mut dyn fmt::Write)->fmt::Result {
    write!(out, "{} {}", self.name, Self::TYPE_NAME)?;
    if let Some (dimensions) = &self.dimensions {
      write!(out, " {}", dimensions)?;
    }
    write!(out, " (")?;
    for (index, term) in self.terms.iter().enumerate() {
      write!(out, "{}(", if index > 0 {" "} else {""})?;
      dictionary::write_value (out, &term.coefficient)?;
      write!(out, " ")?;
      dictionary::write_value (out, &term.exponent)?;
      write!(out, ")")?;
    }
    write!(out, ");")
  }
}

impl <T: Component> Display for PolynomialEntry <T> {
  fn fmt (&self, formatter: &mut fmt::Formatter)->fmt::Result {
    self.write_data (formatter)
  }
}

#[cfg (test)]
mod tests {
  use super::*;
  use nalgebra::{Vector2, Vector3};
  use proptest::prelude::*;
  use quickcheck::{quickcheck, TestResult};

  fn assert_close (actual: Scalar, expected: Scalar) {
    assert!((actual - expected).abs() <= 1e-12*expected.abs().max (1.0), "{} is not close to {}", actual, expected);
  }

  fn example()->PolynomialEntry <Scalar> {
    PolynomialEntry::new ("y", vec![(1.0, 2.0), (2.0, 3.0)]).unwrap()
  }

  fn read_scalar_entry (source: &str)->Result <PolynomialEntry <Scalar>, value_source::Error> {
    let mut reader = EntryReader::new (source)?;
    PolynomialEntry::read ("y", &mut reader)
  }

  #[test]
  fn evaluates_sum_of_terms() {
    assert_close (example().value (2.0), 20.0);
    assert_close (example().value (0.0), 0.0);
  }

  #[test]
  fn integrates_with_power_rule() {
    assert_close (example().integrate (0.0, 1.0).unwrap(), 5.0/6.0);
    assert_close (example().integrate (1.0, 0.0).unwrap(), -5.0/6.0);
    assert_close (example().integrate (2.0, 2.0).unwrap(), 0.0);
  }

  #[test]
  fn empty_coefficients_are_rejected() {
    assert_eq!(
      PolynomialEntry::<Scalar>::new ("y", Vec::<(Scalar, Scalar)>::new()),
      Err (Error::EmptyCoefficients {name: "y".to_string()})
    );
    match read_scalar_entry ("()") {
      Err (value_source::Error::Polynomial (Error::EmptyCoefficients {..})) => {}
      other => panic!("unexpected result {:?}", other),
    }
  }

  #[test]
  fn reciprocal_term_can_only_be_evaluated() {
    let entry: PolynomialEntry <Scalar> = PolynomialEntry::new ("y", vec![(3.0, 1.0), (2.0, -1.0)]).unwrap();
    assert!(!entry.can_integrate());
    assert_close (entry.value (2.0), 7.0);
    assert_eq!(entry.integrate (1.0, 2.0), Err (Error::NotIntegrable {name: "y".to_string(), term: 1}));
    assert!(entry.dim_integrate (1.0, 2.0).is_err());
  }

  #[test]
  fn vector_exponent_with_one_reciprocal_component_cannot_integrate() {
    let entry: PolynomialEntry <Vector2 <Scalar>> = PolynomialEntry::new ("v", vec![(Vector2::new (1.0, 1.0), Vector2::new (2.0, -1.0))]).unwrap();
    assert!(!entry.can_integrate());
    let entry: PolynomialEntry <Vector2 <Scalar>> = PolynomialEntry::new ("v", vec![(Vector2::new (1.0, 3.0), Vector2::new (2.0, 0.0))]).unwrap();
    assert!(entry.can_integrate());
    let integral = entry.integrate (0.0, 3.0).unwrap();
    assert_close (integral [0], 9.0);
    assert_close (integral [1], 9.0);
  }

  #[test]
  fn zero_exponent_integrates_as_a_constant() {
    let entry: PolynomialEntry <Scalar> = PolynomialEntry::new ("c", vec![(4.0, 0.0)]).unwrap();
    assert_close (entry.integrate (1.0, 3.5).unwrap(), 10.0);
  }

  #[test]
  fn reads_dimensions_and_terms_in_order() {
    let entry = read_scalar_entry ("[0 0 1 0 0] ((1 2) (2 3) (-0.5 0))").unwrap();
    assert_eq!(entry.dimensions(), Some (&DimensionSet::from_five ([0.0, 0.0, 1.0, 0.0, 0.0])));
    assert_eq!(entry.terms(), &[Term::new (1.0, 2.0), Term::new (2.0, 3.0), Term::new (-0.5, 0.0)][..]);
    assert!(entry.can_integrate());
  }

  #[test]
  fn malformed_tuple_is_a_parse_error() {
    match read_scalar_entry ("((1 2 3))") {
      Err (value_source::Error::Parse (ParseError::Unexpected {expected, ..})) => assert_eq!(expected, "')'"),
      other => panic!("unexpected result {:?}", other),
    }
  }

  #[test]
  fn dimensioned_results_carry_the_tag() {
    let tagged = read_scalar_entry ("[0 1 -1 0 0 0 0] ((1 2) (2 3))").unwrap();
    let value = tagged.dim_value (2.0);
    assert_eq!(value.name, "y");
    assert_eq!(value.value, tagged.value (2.0));
    assert_eq!(value.dimensions, DimensionSet::from_five ([0.0, 1.0, -1.0, 0.0, 0.0]));
    let integral = tagged.dim_integrate (0.0, 1.0).unwrap();
    assert_eq!(integral.value, tagged.integrate (0.0, 1.0).unwrap());
    assert_eq!(integral.dimensions, value.dimensions);

    assert!(example().dim_value (2.0).dimensions.is_dimensionless());
  }

  #[test]
  fn time_base_conversion_scales_coefficients() {
    let mut entry = example();
    entry.convert_time_base (2.0);
    assert_eq!(entry.terms(), &[Term::new (4.0, 2.0), Term::new (16.0, 3.0)][..]);
    assert!(entry.can_integrate());
    // the represented function is unchanged: f_new(x) == f_old(2x)
    assert_close (entry.value (1.0), example().value (2.0));
  }

  #[test]
  fn vector_entries_read_back_and_rescale_per_component() {
    let source = "[0 1 -1 0 0] (((1 2 3) (2 0 0.5)) ((4 5 6) (1 3 -2)))";
    let mut reader = EntryReader::new (source).unwrap();
    let entry: PolynomialEntry <Vector3 <Scalar>> = PolynomialEntry::read ("v", &mut reader).unwrap();
    assert!(reader.at_end());
    let written = entry.to_string();
    assert_eq!(written, "v polynomial [0 1 -1 0 0 0 0] (((1 2 3) (2 0 0.5)) ((4 5 6) (1 3 -2)));");

    let mut reader = EntryReader::new (&written).unwrap();
    assert_eq!(reader.read_word().unwrap(), "v");
    assert_eq!(reader.read_word().unwrap(), PolynomialEntry::<Vector3 <Scalar>>::TYPE_NAME);
    let read: PolynomialEntry <Vector3 <Scalar>> = PolynomialEntry::read ("v", &mut reader).unwrap();
    reader.expect (dictionary::Token::EndStatement).unwrap();
    assert_eq!(read, entry);

    let mut rescaled = read.clone();
    rescaled.convert_time_base (4.0);
    assert_eq!(rescaled.terms(), &[
      Term::new (Vector3::new (16.0, 2.0, 6.0), Vector3::new (2.0, 0.0, 0.5)),
      Term::new (Vector3::new (16.0, 320.0, 0.375), Vector3::new (1.0, 3.0, -2.0)),
    ][..]);
    let (new, old) = (rescaled.value (0.5), entry.value (2.0));
    for index in 0..3 {
      assert_close (new [index], old [index]);
    }
  }

  #[test]
  fn writes_a_readable_entry() {
    let entry = read_scalar_entry ("[0 0 1 0 0] ((1 2) (2.5 -3))").unwrap();
    assert_eq!(entry.to_string(), "y polynomial [0 0 1 0 0 0 0] ((1 2) (2.5 -3));");
    assert_eq!(example().to_string(), "y polynomial ((1 2) (2 3));");
  }

  #[test]
  fn serde_recomputes_can_integrate() {
    let json = r#"{"name":"y","terms":[{"coefficient":1.0,"exponent":-1.0}]}"#;
    let entry: PolynomialEntry <Scalar> = serde_json::from_str (json).unwrap();
    assert!(!entry.can_integrate());
    assert!(entry.dimensions().is_none());

    let round_tripped: PolynomialEntry <Scalar> = serde_json::from_str (&serde_json::to_string (&example()).unwrap()).unwrap();
    assert_eq!(round_tripped, example());

    assert!(serde_json::from_str::<PolynomialEntry <Scalar>> (r#"{"name":"y","terms":[]}"#).is_err());
  }

  quickcheck! {
    fn can_integrate_iff_no_reciprocal_exponent (pairs: Vec <(i8, i8)>)->TestResult {
      if pairs.is_empty() {
        return TestResult::discard();
      }
      let entry: PolynomialEntry <Scalar> = PolynomialEntry::new ("q", pairs.iter().map (| &(c, e) | (Scalar::from (c), Scalar::from (e)))).unwrap();
      TestResult::from_bool (entry.can_integrate() == pairs.iter().all (| &(_, e) | e != -1))
    }
  }

  fn relative_eq (a: Scalar, b: Scalar)->bool {
    (a - b).abs() <= 1e-9*a.abs().max (b.abs()).max (1e-300)
  }

  proptest! {
    #[test]
    fn randomly_test_round_trip_through_text (
      pairs in prop::collection::vec ((-1e6f64..1e6, -6.0f64..6.0), 1..6),
      dimensions in prop::option::of (prop::array::uniform7 (-3i8..3)),
    ) {
      let mut entry: PolynomialEntry <Scalar> = PolynomialEntry::new ("y", pairs).unwrap();
      entry.dimensions = dimensions.map (| exponents | DimensionSet::new ([
        exponents [0].into(), exponents [1].into(), exponents [2].into(), exponents [3].into(),
        exponents [4].into(), exponents [5].into(), exponents [6].into(),
      ]));
      let written = entry.to_string();
      let mut reader = EntryReader::new (&written).unwrap();
      prop_assert_eq!(reader.read_word().unwrap(), "y");
      prop_assert_eq!(reader.read_word().unwrap(), PolynomialEntry::<Scalar>::TYPE_NAME);
      let read = PolynomialEntry::<Scalar>::read ("y", &mut reader).unwrap();
      reader.expect (dictionary::Token::EndStatement).unwrap();
      prop_assert!(reader.at_end());
      prop_assert_eq!(read, entry);
    }

    #[test]
    fn randomly_test_rescale_multiplies_by_power (coefficient in -100.0f64..100.0, exponent in -4.0f64..4.0, scale in 0.01f64..100.0) {
      let mut entry: PolynomialEntry <Scalar> = PolynomialEntry::new ("y", vec![(coefficient, exponent)]).unwrap();
      entry.convert_time_base (scale);
      prop_assert_eq!(entry.terms() [0], Term::new (coefficient*scale.powf (exponent), exponent));
    }

    #[test]
    fn randomly_test_rescale_composes (
      pairs in prop::collection::vec ((-100.0f64..100.0, -4i8..5), 1..5),
      first in 0.1f64..10.0,
      second in 0.1f64..10.0,
    ) {
      let pairs: Vec <(Scalar, Scalar)> = pairs.into_iter().map (| (c, e) | (c, Scalar::from (e))).collect();
      let mut twice: PolynomialEntry <Scalar> = PolynomialEntry::new ("y", pairs.clone()).unwrap();
      twice.convert_time_base (first);
      twice.convert_time_base (second);
      let mut once: PolynomialEntry <Scalar> = PolynomialEntry::new ("y", pairs).unwrap();
      once.convert_time_base (first*second);
      for (a, b) in twice.terms().iter().zip (once.terms()) {
        prop_assert_eq!(a.exponent, b.exponent);
        prop_assert!(relative_eq (a.coefficient, b.coefficient), "{:?} != {:?}", a, b);
      }
    }

    #[test]
    fn randomly_test_integral_is_additive (
      pairs in prop::collection::vec ((-10.0f64..10.0, 0i8..5), 1..5),
      a in 0.0f64..2.0, b in 0.0f64..2.0, c in 0.0f64..2.0,
    ) {
      let entry: PolynomialEntry <Scalar> = PolynomialEntry::new ("y", pairs.into_iter().map (| (c, e) | (c, Scalar::from (e)))).unwrap();
      let whole = entry.integrate (a, c).unwrap();
      let split = entry.integrate (a, b).unwrap() + entry.integrate (b, c).unwrap();
      prop_assert!((whole - split).abs() <= 1e-9*(1.0 + whole.abs()), "{} != {}", whole, split);
    }
  }
}
