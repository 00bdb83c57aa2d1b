use nalgebra::Vector3;
use time_steward_value_sources::dictionary::ParseError;
use time_steward_value_sources::polynomial;
use time_steward_value_sources::value_source::Error;
use time_steward_value_sources::{DimensionSet, PolynomialEntry, Registry, Scalar, ValueSource};

const DICTIONARY: &str = "
  // inlet conditions
  flowRate  polynomial [0 3 -1 0 0]
  (
    (1    2)
    (2    3)
  );
  gravity   constant (0 0 -9.81);
  pressure  101325;
";

fn write (source: &dyn ValueSource <Scalar>)->String {
  let mut out = String::new();
  source.write_data (&mut out).unwrap();
  out
}

#[test]
fn reads_a_whole_dictionary() {
  let registry = Registry::<Scalar>::default();
  let sources = registry.construct_all ("flowRate polynomial [0 3 -1 0 0] ((1 2) (2 3)); pressure 101325;").unwrap();
  let names: Vec <&str> = sources.iter().map (| source | source.name()).collect();
  assert_eq!(names, vec!["flowRate", "pressure"]);
  assert_eq!(sources [0].type_name(), "polynomial");
  assert!((sources [0].value (2.0) - 20.0).abs() < 1e-12);
  assert!((sources [0].integrate (0.0, 1.0).unwrap() - 5.0/6.0).abs() < 1e-12);
  assert_eq!(sources [0].dim_value (2.0).dimensions, DimensionSet::from_five ([0.0, 3.0, -1.0, 0.0, 0.0]));
}

#[test]
fn vector_registry_reads_vector_values() {
  let registry = Registry::<Vector3 <Scalar>>::default();
  let source = registry.construct ("gravity constant (0 0 -9.81);").unwrap();
  assert_eq!(source.value (3.0), Vector3::new (0.0, 0.0, -9.81));

  // a scalar registry can't read the vector from the same dictionary
  match Registry::<Scalar>::default().construct_all (DICTIONARY) {
    Err (Error::Parse (ParseError::Unexpected {expected: "a number", ..})) => {}
    other => panic!("unexpected result {:?}", other),
  }
}

#[test]
fn written_entries_read_back_identically() {
  let registry = Registry::<Scalar>::default();
  for entry in &[
    "flowRate polynomial [0 3 -1 0 0] ((1 2) (2 3));",
    "decay polynomial ((0.1 -0.5) (3 0) (-1e-7 1.25));",
    "pressure constant [1 -1 -2 0 0 0 0] 101325;",
  ] {
    let first = registry.construct (entry).unwrap();
    let written = write (&*first);
    let second = registry.construct (&written).unwrap();
    assert_eq!(write (&*second), written);
    assert_eq!(second.dim_value (0.7), first.dim_value (0.7));
  }
}

#[test]
fn clones_are_independent() {
  let registry = Registry::<Scalar>::default();
  let original = registry.construct ("y polynomial ((1 2) (2 3));").unwrap();
  let mut rescaled = original.clone();
  rescaled.convert_time_base (2.0);
  assert_eq!(write (&*original), "y polynomial ((1 2) (2 3));");
  assert_eq!(write (&*rescaled), "y polynomial ((4 2) (16 3));");
  assert_eq!(rescaled.to_string(), write (&*rescaled));
}

#[test]
fn time_base_conversion_preserves_the_function() {
  // minutes to seconds: x_minutes = x_seconds / 60
  let mut entry: PolynomialEntry <Scalar> = PolynomialEntry::new ("y", vec![(1.5, 1.0), (0.25, 2.0), (4.0, 0.5)]).unwrap();
  let before = entry.clone();
  ValueSource::convert_time_base (&mut entry, 1.0/60.0);
  for &seconds in &[0.0, 1.0, 30.0, 600.0] {
    let expected = before.value (seconds/60.0);
    assert!((entry.value (seconds) - expected).abs() <= 1e-9*expected.abs().max (1.0));
  }
}

#[test]
fn integrating_a_reciprocal_is_reported() {
  let registry = Registry::<Scalar>::default();
  let source = registry.construct ("y polynomial ((1 -1));").unwrap();
  assert_eq!(source.value (4.0), 0.25);
  match source.integrate (1.0, 2.0) {
    Err (Error::Polynomial (polynomial::Error::NotIntegrable {name, term})) => {
      assert_eq!(name, "y");
      assert_eq!(term, 0);
    }
    other => panic!("unexpected result {:?}", other),
  }
  assert!(source.dim_integrate (1.0, 2.0).is_err());
}

#[test]
fn numbers_too_large_to_write_back_are_rejected() {
  let registry = Registry::<Scalar>::default();
  match registry.construct ("y polynomial ((1e400 2));") {
    Err (Error::Parse (ParseError::InvalidNumber {text, offset})) => {
      assert_eq!(text, "1e400");
      assert_eq!(offset, 15);
    }
    other => panic!("unexpected result {:?}", other),
  }
  let largest = registry.construct ("y polynomial ((1.7976931348623157e308 2));").unwrap();
  let written = write (&*largest);
  assert_eq!(write (&*registry.construct (&written).unwrap()), written);
}

#[test]
fn block_comments_are_ignored_between_entries() {
  let registry = Registry::<Scalar>::default();
  let sources = registry.construct_all ("/**/ a polynomial /* a ** b */ ((1 2)); /* one\n two */ b 3;").unwrap();
  assert_eq!(sources.len(), 2);
  assert_eq!(sources [1].value (0.0), 3.0);
  match registry.construct_all ("a 1; /* never closed") {
    Err (Error::Parse (ParseError::UnterminatedComment {offset})) => assert_eq!(offset, 5),
    other => panic!("unexpected result {:?}", other),
  }
}
