//! Reading and writing the dictionary entry format value sources are configured with.
//!
//! An entry is a keyword, an optional type word and the type's data, ended by `;`:
//!
//! ```text
//! flowRate  polynomial [0 3 -1 0 0] ((1 2) (2 3));  // dimensions are optional
//! gravity   constant (0 0 -9.81);
//! /* a bare value is shorthand for a constant */
//! pressure  101325;
//! ```

use logos::{Filter, Lexer, Logos};
use std::fmt;

use super::*;

#[derive(Logos, Copy, Clone, PartialEq, Eq, Debug)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
  #[token("(")]
  BeginList,
  #[token(")")]
  EndList,
  #[token("[")]
  BeginDimensions,
  #[token("]")]
  EndDimensions,
  #[token(";")]
  EndStatement,
  #[regex(r"[A-Za-z_][A-Za-z0-9_.:]*")]
  Word,
  #[regex(r"[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?")]
  Number,
  /// Only produced for a `/*` with no closing `*/`; closed comments are skipped.
  #[token("/*", block_comment)]
  UnterminatedComment,
}

fn block_comment (lexer: &mut Lexer <Token>)->Filter <()> {
  match lexer.remainder().find ("*/") {
    Some (end) => {
      lexer.bump (end + 2);
      Filter::Skip
    }
    None => {
      let rest = lexer.remainder().len();
      lexer.bump (rest);
      Filter::Emit (())
    }
  }
}

impl Token {
  fn describe (self)->&'static str {
    match self {
      Token::BeginList => "'('",
      Token::EndList => "')'",
      Token::BeginDimensions => "'['",
      Token::EndDimensions => "']'",
      Token::EndStatement => "';'",
      Token::Word => "a word",
      Token::Number => "a number",
      Token::UnterminatedComment => "an unterminated comment",
    }
  }
}

#[derive(Debug, Fail, Clone, PartialEq)]
pub enum ParseError {
  #[fail(display = "unrecognized input {:?} at byte {}", text, offset)]
  UnrecognizedInput {
    text: String,
    offset: usize,
  },
  #[fail(display = "expected {} at byte {}, found {:?}", expected, offset, found)]
  Unexpected {
    expected: &'static str,
    found: String,
    offset: usize,
  },
  #[fail(display = "expected {}, found end of input", expected)]
  UnexpectedEnd {
    expected: &'static str,
  },
  #[fail(display = "comment starting at byte {} is never closed", offset)]
  UnterminatedComment {
    offset: usize,
  },
  #[fail(display = "{:?} at byte {} is not a valid finite number", text, offset)]
  InvalidNumber {
    text: String,
    offset: usize,
  },
  #[fail(display = "a dimension set has 5 or 7 exponents, but the one at byte {} has {}", offset, count)]
  DimensionCount {
    count: usize,
    offset: usize,
  },
}

#[derive(Copy, Clone, Debug)]
struct Lexeme <'a> {
  token: Token,
  text: &'a str,
  offset: usize,
}

/// A cursor over the tokens of one or more dictionary entries.
#[derive(Clone, Debug)]
pub struct EntryReader <'a> {
  lexemes: Vec <Lexeme <'a>>,
  position: usize,
}

impl <'a> EntryReader <'a> {
  pub fn new (source: &'a str)->Result <EntryReader <'a>, ParseError> {
    let mut lexemes = Vec::new();
    for (token, span) in Token::lexer (source).spanned() {
      let text = &source [span.clone()];
      match token {
        Ok (Token::UnterminatedComment) => return Err (ParseError::UnterminatedComment {offset: span.start}),
        Ok (token) => lexemes.push (Lexeme {token, text, offset: span.start}),
        Err (()) => return Err (ParseError::UnrecognizedInput {text: text.to_string(), offset: span.start}),
      }
    }
    Ok (EntryReader {lexemes, position: 0})
  }

  pub fn peek (&self)->Option <Token> {
    self.lexemes.get (self.position).map (| lexeme | lexeme.token)
  }
  pub fn at_end (&self)->bool {
    self.position >= self.lexemes.len()
  }
  pub fn expect_end (&self)->Result <(), ParseError> {
    match self.lexemes.get (self.position) {
      None => Ok (()),
      Some (lexeme) => Err (ParseError::Unexpected {expected: "end of input", found: lexeme.text.to_string(), offset: lexeme.offset}),
    }
  }

  fn next_lexeme (&mut self, expected: Token)->Result <Lexeme <'a>, ParseError> {
    let lexeme = *self.lexemes.get (self.position).ok_or (ParseError::UnexpectedEnd {expected: expected.describe()})?;
    if lexeme.token != expected {
      return Err (ParseError::Unexpected {expected: expected.describe(), found: lexeme.text.to_string(), offset: lexeme.offset});
    }
    self.position += 1;
    Ok (lexeme)
  }

  pub fn expect (&mut self, token: Token)->Result <(), ParseError> {
    self.next_lexeme (token).map (| _ | ())
  }

  /// Consume `token` if it is next; report whether it was.
  pub fn skip_if (&mut self, token: Token)->bool {
    let matched = self.peek() == Some (token);
    if matched {self.position += 1;}
    matched
  }

  pub fn read_word (&mut self)->Result <&'a str, ParseError> {
    self.next_lexeme (Token::Word).map (| lexeme | lexeme.text)
  }

  pub fn read_scalar (&mut self)->Result <Scalar, ParseError> {
    let lexeme = self.next_lexeme (Token::Number)?;
    // out-of-range literals like 1e400 overflow to infinity, which can't be written back
    match lexeme.text.parse::<Scalar>() {
      Ok (value) if value.is_finite() => Ok (value),
      _ => Err (ParseError::InvalidNumber {text: lexeme.text.to_string(), offset: lexeme.offset}),
    }
  }

  /// Read a scalar as a bare number and a vector as `(v1 ... vn)`.
  pub fn read_value <T: Component> (&mut self)->Result <T, ParseError> {
    if T::COMPONENTS == 1 {
      return Ok (T::uniform (self.read_scalar()?));
    }
    self.expect (Token::BeginList)?;
    let mut result = T::zero();
    for index in 0..T::COMPONENTS {
      result.set_component (index, self.read_scalar()?);
    }
    self.expect (Token::EndList)?;
    Ok (result)
  }

  pub fn read_dimensions_if_present (&mut self)->Result <Option <DimensionSet>, ParseError> {
    let offset = match self.lexemes.get (self.position) {
      Some (lexeme) if lexeme.token == Token::BeginDimensions => lexeme.offset,
      _ => return Ok (None),
    };
    self.position += 1;
    let mut exponents = Vec::with_capacity (DimensionSet::BASE_UNITS);
    while !self.skip_if (Token::EndDimensions) {
      exponents.push (self.read_scalar()?);
    }
    match exponents.len() {
      5 => Ok (Some (DimensionSet::from_five ([exponents [0], exponents [1], exponents [2], exponents [3], exponents [4]]))),
      DimensionSet::BASE_UNITS => {
        let mut all = [0.0; DimensionSet::BASE_UNITS];
        all.copy_from_slice (&exponents);
        Ok (Some (DimensionSet::new (all)))
      }
      count => Err (ParseError::DimensionCount {count, offset}),
    }
  }

  /// Read a parenthesized list, calling `read_item` once per element.
  pub fn read_list <U, F: FnMut(&mut Self)->Result <U, ParseError>> (&mut self, mut read_item: F)->Result <Vec <U>, ParseError> {
    self.expect (Token::BeginList)?;
    let mut items = Vec::new();
    while !self.skip_if (Token::EndList) {
      if self.at_end() {
        return Err (ParseError::UnexpectedEnd {expected: Token::EndList.describe()});
      }
      items.push ((read_item) (self)?);
    }
    Ok (items)
  }
}

/// Numbers are written in the shortest form that reads back to the same bits.
pub fn write_scalar (out: &mut dyn fmt::Write, value: Scalar)->fmt::Result {
  write!(out, "{}", value)
}

pub fn write_value <T: Component> (out: &mut dyn fmt::Write, value: &T)->fmt::Result {
  if T::COMPONENTS == 1 {
    return write_scalar (out, value.component (0));
  }
  write!(out, "(")?;
  for index in 0..T::COMPONENTS {
    if index > 0 {write!(out, " ")?;}
    write_scalar (out, value.component (index))?;
  }
  write!(out, ")")
}

#[cfg (test)]
mod tests {
  use super::*;
  use nalgebra::Vector3;
  use proptest::prelude::*;

  fn tokens (source: &str)->Vec <Token> {
    let mut reader = EntryReader::new (source).unwrap();
    let mut result = Vec::new();
    while let Some (token) = reader.peek() {
      result.push (token);
      reader.position += 1;
    }
    result
  }

  #[test]
  fn comments_and_whitespace_are_skipped() {
    assert_eq!(
      tokens ("a // line\n /* block\n comment */ polynomial (1.5 -2e3);"),
      vec![Token::Word, Token::Word, Token::BeginList, Token::Number, Token::Number, Token::EndList, Token::EndStatement]
    );
  }

  #[test]
  fn block_comments_end_at_the_first_close() {
    assert_eq!(tokens ("/**/ a"), vec![Token::Word]);
    assert_eq!(tokens ("a /* a ** b */ b"), vec![Token::Word, Token::Word]);
    assert_eq!(tokens ("a /* one\n * two\n */ (1) /* x */ ;"), vec![Token::Word, Token::BeginList, Token::Number, Token::EndList, Token::EndStatement]);
    match EntryReader::new ("a /* b */ c */") {
      Err (ParseError::UnrecognizedInput {offset, ..}) => assert_eq!(offset, 12),
      other => panic!("unexpected result {:?}", other),
    }
  }

  #[test]
  fn unterminated_block_comment_is_an_error() {
    assert_eq!(EntryReader::new ("a /* x").map (| _ | ()), Err (ParseError::UnterminatedComment {offset: 2}));
    assert_eq!(EntryReader::new ("/*").map (| _ | ()), Err (ParseError::UnterminatedComment {offset: 0}));
  }

  #[test]
  fn out_of_range_numbers_are_rejected() {
    let mut reader = EntryReader::new ("1e400 -1e400 1e-400").unwrap();
    assert_eq!(reader.read_scalar(), Err (ParseError::InvalidNumber {text: "1e400".to_string(), offset: 0}));
    assert_eq!(reader.read_scalar(), Err (ParseError::InvalidNumber {text: "-1e400".to_string(), offset: 6}));
    // underflow is still a finite number
    assert_eq!(reader.read_scalar(), Ok (0.0));
  }

  #[test]
  fn unrecognized_characters_are_reported_with_offset() {
    match EntryReader::new ("a polynomial # (1 2);") {
      Err (ParseError::UnrecognizedInput {text, offset}) => {
        assert_eq!(text, "#");
        assert_eq!(offset, 13);
      }
      other => panic!("unexpected result {:?}", other),
    }
  }

  #[test]
  fn reads_scalars_and_vectors() {
    let mut reader = EntryReader::new ("-0.25 (1 2 3) .5").unwrap();
    assert_eq!(reader.read_value::<Scalar>().unwrap(), -0.25);
    assert_eq!(reader.read_value::<Vector3 <Scalar>>().unwrap(), Vector3::new (1.0, 2.0, 3.0));
    assert_eq!(reader.read_scalar().unwrap(), 0.5);
    assert!(reader.at_end());
  }

  #[test]
  fn vector_with_too_few_components_is_an_error() {
    let mut reader = EntryReader::new ("(1 2)").unwrap();
    match reader.read_value::<Vector3 <Scalar>>() {
      Err (ParseError::Unexpected {expected, found, ..}) => {
        assert_eq!(expected, "a number");
        assert_eq!(found, ")");
      }
      other => panic!("unexpected result {:?}", other),
    }
  }

  #[test]
  fn dimensions_accept_five_or_seven_exponents() {
    let mut reader = EntryReader::new ("[0 1 -1 0 0] [1 0 0 0 0 0 2] (1)").unwrap();
    assert_eq!(reader.read_dimensions_if_present().unwrap(), Some (DimensionSet::from_five ([0.0, 1.0, -1.0, 0.0, 0.0])));
    assert_eq!(reader.read_dimensions_if_present().unwrap(), Some (DimensionSet::new ([1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0])));
    assert_eq!(reader.read_dimensions_if_present().unwrap(), None);

    let mut reader = EntryReader::new ("[0 1 -1]").unwrap();
    assert_eq!(reader.read_dimensions_if_present(), Err (ParseError::DimensionCount {count: 3, offset: 0}));
  }

  #[test]
  fn unterminated_list_is_an_error() {
    let mut reader = EntryReader::new ("(1 2").unwrap();
    assert_eq!(reader.read_list (| reader | reader.read_scalar()), Err (ParseError::UnexpectedEnd {expected: "')'"}));
  }

  #[test]
  fn writes_vectors_in_parentheses() {
    let mut out = String::new();
    write_value (&mut out, &Vector3::new (1.0, -0.5, 0.0)).unwrap();
    write_value (&mut out, &2.0).unwrap();
    assert_eq!(out, "(1 -0.5 0)2");
  }

  proptest! {
    #[test]
    fn randomly_test_written_scalars_read_back_exactly (value in any::<f64>()) {
      prop_assume!(value.is_finite());
      let mut out = String::new();
      write_scalar (&mut out, value).unwrap();
      let mut reader = EntryReader::new (&out).unwrap();
      prop_assert_eq!(reader.read_scalar().unwrap().to_bits(), value.to_bits());
    }
  }
}
