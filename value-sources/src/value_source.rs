//! The interface shared by every kind of value source, and the registry that
//! constructs them from dictionary entries by type name.

use std::collections::BTreeMap;
use std::fmt::{self, Debug, Display};
use tracing::debug;

use super::*;
use crate::dictionary::{EntryReader, ParseError, Token};

#[derive(Debug, Fail, Clone, PartialEq)]
pub enum Error {
  #[fail(
    display = "unknown value source type {:?} for entry {:?} (known types: {})",
    type_name, name, known
  )]
  UnknownType {
    name: String,
    type_name: String,
    known: String,
  },
  #[fail(display = "{}", _0)]
  Parse(#[cause] ParseError),
  #[fail(display = "{}", _0)]
  Polynomial(#[cause] polynomial::Error),
}

impl From <ParseError> for Error {
  fn from (error: ParseError)->Error {
    Error::Parse (error)
  }
}
impl From <polynomial::Error> for Error {
  fn from (error: polynomial::Error)->Error {
    Error::Polynomial (error)
  }
}

/// A named quantity that varies with one scalar argument.
pub trait ValueSource <T: Component>: Debug + Send + Sync {
  fn name (&self)->&str;
  fn type_name (&self)->&'static str;

  fn value (&self, x: Scalar)->T;
  /// The definite integral from x1 to x2.
  fn integrate (&self, x1: Scalar, x2: Scalar)->Result <T, Error>;
  fn dim_value (&self, x: Scalar)->Dimensioned <T>;
  fn dim_integrate (&self, x1: Scalar, x2: Scalar)->Result <Dimensioned <T>, Error>;

  /// Adapt to a change in the unit of the independent variable, where `x_old = scale_factor * x_new`.
  fn convert_time_base (&mut self, scale_factor: Scalar);

  /// Write the whole entry, in a form `Registry::construct` reads back.
  fn write_data (&self, out: &mut dyn fmt::Write)->fmt::Result;
  fn clone_box (&self)->Box <dyn ValueSource <T>>;
}

impl <T: Component> Clone for Box <dyn ValueSource <T>> {
  fn clone (&self)->Self {
    self.clone_box()
  }
}

impl <T: Component> Display for dyn ValueSource <T> {
  fn fmt (&self, formatter: &mut fmt::Formatter)->fmt::Result {
    self.write_data (formatter)
  }
}

impl <T: Component> ValueSource <T> for PolynomialEntry <T> {
  fn name (&self)->&str {
    PolynomialEntry::name (self)
  }
  fn type_name (&self)->&'static str {
    Self::TYPE_NAME
  }
  fn value (&self, x: Scalar)->T {
    PolynomialEntry::value (self, x)
  }
  fn integrate (&self, x1: Scalar, x2: Scalar)->Result <T, Error> {
    Ok (PolynomialEntry::integrate (self, x1, x2)?)
  }
  fn dim_value (&self, x: Scalar)->Dimensioned <T> {
    PolynomialEntry::dim_value (self, x)
  }
  fn dim_integrate (&self, x1: Scalar, x2: Scalar)->Result <Dimensioned <T>, Error> {
    Ok (PolynomialEntry::dim_integrate (self, x1, x2)?)
  }
  fn convert_time_base (&mut self, scale_factor: Scalar) {
    PolynomialEntry::convert_time_base (self, scale_factor)
  }
  fn write_data (&self, out: &mut dyn fmt::Write)->fmt::Result {
    PolynomialEntry::write_data (self, out)
  }
  fn clone_box (&self)->Box <dyn ValueSource <T>> {
    Box::new (self.clone())
  }
}

/// Reads the data following an entry's type word.
pub type Constructor <T> = fn(String, &mut EntryReader)->Result <Box <dyn ValueSource <T>>, Error>;

fn construct_constant <T: Component> (name: String, reader: &mut EntryReader)->Result <Box <dyn ValueSource <T>>, Error> {
  Ok (Box::new (Constant::<T>::read (name, reader)?))
}

fn construct_polynomial <T: Component> (name: String, reader: &mut EntryReader)->Result <Box <dyn ValueSource <T>>, Error> {
  Ok (Box::new (PolynomialEntry::<T>::read (name, reader)?))
}

/// Constructs value sources from entries like `name type data;`.
///
/// An entry with no type word (`name 5;`) is read as a constant.
#[derive(Clone)]
pub struct Registry <T: Component> {
  constructors: BTreeMap <&'static str, Constructor <T>>,
}

impl <T: Component> Default for Registry <T> {
  fn default()->Self {
    Registry::with_builtin_types()
  }
}

impl <T: Component> Debug for Registry <T> {
  fn fmt (&self, formatter: &mut fmt::Formatter)->fmt::Result {
    formatter.debug_struct ("Registry").field ("types", &self.type_names()).finish()
  }
}

impl <T: Component> Registry <T> {
  pub fn new()->Self {
    Registry {constructors: BTreeMap::new()}
  }

  pub fn with_builtin_types()->Self {
    let mut result = Registry::new();
    result.register (Constant::<T>::TYPE_NAME, construct_constant::<T>);
    result.register (PolynomialEntry::<T>::TYPE_NAME, construct_polynomial::<T>);
    result
  }

  /// Add a type, replacing any constructor previously registered under the same name.
  pub fn register (&mut self, type_name: &'static str, constructor: Constructor <T>) {
    self.constructors.insert (type_name, constructor);
  }
  pub fn is_registered (&self, type_name: &str)->bool {
    self.constructors.contains_key (type_name)
  }
  pub fn type_names (&self)->Vec <&'static str> {
    self.constructors.keys().cloned().collect()
  }

  /// Read one entry, including its terminating `;`.
  pub fn read_entry (&self, reader: &mut EntryReader)->Result <Box <dyn ValueSource <T>>, Error> {
    let name = reader.read_word()?.to_string();
    let type_name = if reader.peek() == Some (Token::Word) {reader.read_word()?} else {Constant::<T>::TYPE_NAME};
    let constructor = match self.constructors.get (type_name) {
      Some (&constructor) => constructor,
      None => return Err (Error::UnknownType {
        name,
        type_name: type_name.to_string(),
        known: self.type_names().join (", "),
      }),
    };
    let source = constructor (name, reader)?;
    reader.expect (Token::EndStatement)?;
    debug!(entry = source.name(), type_name, "read value source entry");
    Ok (source)
  }

  /// Construct the value source described by exactly one entry.
  pub fn construct (&self, source: &str)->Result <Box <dyn ValueSource <T>>, Error> {
    let mut reader = EntryReader::new (source)?;
    let result = self.read_entry (&mut reader)?;
    reader.expect_end()?;
    Ok (result)
  }

  /// Construct every entry in `source`, in order.
  pub fn construct_all (&self, source: &str)->Result <Vec <Box <dyn ValueSource <T>>>, Error> {
    let mut reader = EntryReader::new (source)?;
    let mut result = Vec::new();
    while !reader.at_end() {
      result.push (self.read_entry (&mut reader)?);
    }
    Ok (result)
  }
}

#[cfg (test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_type_lists_the_known_ones() {
    let registry = Registry::<Scalar>::default();
    match registry.construct ("a table ((0 1) (1 2));") {
      Err (Error::UnknownType {name, type_name, known}) => {
        assert_eq!(name, "a");
        assert_eq!(type_name, "table");
        assert_eq!(known, "constant, polynomial");
      }
      other => panic!("unexpected result {:?}", other),
    }
  }

  #[test]
  fn empty_registry_knows_nothing() {
    let registry = Registry::<Scalar>::new();
    assert!(!registry.is_registered ("polynomial"));
    assert!(registry.construct ("a polynomial ((1 0));").is_err());
  }

  #[test]
  fn bare_value_is_a_constant() {
    let registry = Registry::<Scalar>::default();
    let source = registry.construct ("p 101325;").unwrap();
    assert_eq!(source.type_name(), "constant");
    assert_eq!(source.value (17.0), 101325.0);
  }

  #[test]
  fn missing_semicolon_is_reported() {
    let registry = Registry::<Scalar>::default();
    match registry.construct ("a polynomial ((1 0))") {
      Err (Error::Parse (ParseError::UnexpectedEnd {expected})) => assert_eq!(expected, "';'"),
      other => panic!("unexpected result {:?}", other),
    }
    match registry.construct ("a polynomial ((1 0)); b 2;") {
      Err (Error::Parse (ParseError::Unexpected {expected, found, ..})) => {
        assert_eq!(expected, "end of input");
        assert_eq!(found, "b");
      }
      other => panic!("unexpected result {:?}", other),
    }
  }

  #[test]
  fn errors_describe_their_cause() {
    let registry = Registry::<Scalar>::default();
    let error = registry.construct ("a polynomial ();").unwrap_err();
    assert_eq!(error.to_string(), "polynomial coefficients not found for entry \"a\"");
  }
}
