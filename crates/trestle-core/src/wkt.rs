//! Well-Known Text geometry reader.
//!
//! Grammar (keywords are case-insensitive):
//!
//! ```text
//! literal    := ['<' crs-iri '>'] geometry
//! geometry   := TYPE [Z | M | ZM] (EMPTY | body)
//! coord      := number number [number [number]]
//! ```
//!
//! Only the first two ordinates are kept. `MULTIPOINT` accepts both the
//! `(1 2, 3 4)` and `((1 2), (3 4))` spellings.

use thiserror::Error;

// ─── Geometry model ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
  pub x: f64,
  pub y: f64,
}

/// A linear ring or line: an ordered list of coordinates.
pub type Line = Vec<Coord>;

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
  /// `None` for `POINT EMPTY`.
  Point(Option<Coord>),
  LineString(Line),
  /// Exterior ring first, then holes.
  Polygon(Vec<Line>),
  MultiPoint(Vec<Coord>),
  MultiLineString(Vec<Line>),
  MultiPolygon(Vec<Vec<Line>>),
  GeometryCollection(Vec<Geometry>),
}

impl Geometry {
  /// The WKT keyword for this geometry.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Point(_) => "POINT",
      Self::LineString(_) => "LINESTRING",
      Self::Polygon(_) => "POLYGON",
      Self::MultiPoint(_) => "MULTIPOINT",
      Self::MultiLineString(_) => "MULTILINESTRING",
      Self::MultiPolygon(_) => "MULTIPOLYGON",
      Self::GeometryCollection(_) => "GEOMETRYCOLLECTION",
    }
  }

  pub fn is_empty(&self) -> bool {
    match self {
      Self::Point(p) => p.is_none(),
      Self::LineString(v) => v.is_empty(),
      Self::Polygon(v) => v.is_empty(),
      Self::MultiPoint(v) => v.is_empty(),
      Self::MultiLineString(v) => v.is_empty(),
      Self::MultiPolygon(v) => v.is_empty(),
      Self::GeometryCollection(v) => v.is_empty(),
    }
  }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}")]
pub struct WktError {
  /// Byte offset into the input.
  pub offset:  usize,
  pub message: String,
}

type Result<T> = std::result::Result<T, WktError>;

/// Deepest `GEOMETRYCOLLECTION` nesting accepted.
pub const MAX_NESTING: usize = 64;

// ─── Entry point ─────────────────────────────────────────────────────────────

/// Parse a WKT literal, optionally prefixed by a `<crs>` IRI as found in
/// GeoSPARQL `wktLiteral` values.
pub fn parse(src: &str) -> Result<Geometry> {
  let mut parser = Parser {
    src,
    pos: 0,
    depth: 0,
  };
  parser.skip_ws();
  if parser.peek() == Some(b'<') {
    match src[parser.pos..].find('>') {
      Some(end) => parser.pos += end + 1,
      None => return Err(parser.error("unterminated CRS IRI")),
    }
  }
  let geometry = parser.geometry()?;
  parser.skip_ws();
  if parser.pos != src.len() {
    return Err(parser.error("trailing input"));
  }
  Ok(geometry)
}

// ─── Parser ──────────────────────────────────────────────────────────────────

struct Parser<'a> {
  src:   &'a str,
  pos:   usize,
  /// Enclosing collections.
  depth: usize,
}

impl<'a> Parser<'a> {
  fn error(&self, message: impl Into<String>) -> WktError {
    WktError {
      offset:  self.pos,
      message: message.into(),
    }
  }

  fn peek(&self) -> Option<u8> { self.src.as_bytes().get(self.pos).copied() }

  fn skip_ws(&mut self) {
    while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
      self.pos += 1;
    }
  }

  fn eat(&mut self, byte: u8) -> bool {
    self.skip_ws();
    if self.peek() == Some(byte) {
      self.pos += 1;
      true
    } else {
      false
    }
  }

  fn expect(&mut self, byte: u8) -> Result<()> {
    if self.eat(byte) {
      Ok(())
    } else {
      Err(self.error(format!("expected '{}'", byte as char)))
    }
  }

  /// An alphabetic run, not consumed unless `consume` is set.
  fn keyword(&mut self, consume: bool) -> &'a str {
    self.skip_ws();
    let src = self.src;
    let start = self.pos;
    let len = src.as_bytes()[start..]
      .iter()
      .take_while(|b| b.is_ascii_alphabetic())
      .count();
    if consume {
      self.pos += len;
    }
    &src[start..start + len]
  }

  fn geometry(&mut self) -> Result<Geometry> {
    let kind = self.keyword(true).to_ascii_uppercase();
    if kind.is_empty() {
      return Err(self.error("expected geometry type"));
    }

    let tag = self.keyword(false);
    if tag.eq_ignore_ascii_case("Z")
      || tag.eq_ignore_ascii_case("M")
      || tag.eq_ignore_ascii_case("ZM")
    {
      self.keyword(true);
    }
    let empty = self.keyword(false).eq_ignore_ascii_case("EMPTY");
    if empty {
      self.keyword(true);
    }

    let geometry = match kind.as_str() {
      "POINT" if empty => Geometry::Point(None),
      "POINT" => {
        self.expect(b'(')?;
        let c = self.coord()?;
        self.expect(b')')?;
        Geometry::Point(Some(c))
      }
      _ if empty => match kind.as_str() {
        "LINESTRING" => Geometry::LineString(Vec::new()),
        "POLYGON" => Geometry::Polygon(Vec::new()),
        "MULTIPOINT" => Geometry::MultiPoint(Vec::new()),
        "MULTILINESTRING" => Geometry::MultiLineString(Vec::new()),
        "MULTIPOLYGON" => Geometry::MultiPolygon(Vec::new()),
        "GEOMETRYCOLLECTION" => Geometry::GeometryCollection(Vec::new()),
        other => return Err(self.error(format!("unknown geometry type {other}"))),
      },
      "LINESTRING" => Geometry::LineString(self.line()?),
      "POLYGON" => Geometry::Polygon(self.list(Self::line)?),
      "MULTIPOINT" => Geometry::MultiPoint(self.list(Self::multipoint_member)?),
      "MULTILINESTRING" => Geometry::MultiLineString(self.list(Self::line)?),
      "MULTIPOLYGON" => {
        Geometry::MultiPolygon(self.list(|p| p.list(Self::line))?)
      }
      "GEOMETRYCOLLECTION" => {
        if self.depth >= MAX_NESTING {
          return Err(self.error("geometry nested too deeply"));
        }
        self.depth += 1;
        let members = self.list(Self::geometry);
        self.depth -= 1;
        Geometry::GeometryCollection(members?)
      }
      other => return Err(self.error(format!("unknown geometry type {other}"))),
    };
    Ok(geometry)
  }

  /// `'(' item (',' item)* ')'`
  fn list<T>(
    &mut self,
    mut item: impl FnMut(&mut Self) -> Result<T>,
  ) -> Result<Vec<T>> {
    self.expect(b'(')?;
    let mut items = vec![item(self)?];
    while self.eat(b',') {
      items.push(item(self)?);
    }
    self.expect(b')')?;
    Ok(items)
  }

  fn line(&mut self) -> Result<Line> { self.list(Self::coord) }

  fn multipoint_member(&mut self) -> Result<Coord> {
    if self.eat(b'(') {
      let c = self.coord()?;
      self.expect(b')')?;
      Ok(c)
    } else {
      self.coord()
    }
  }

  fn coord(&mut self) -> Result<Coord> {
    let x = self.number()?;
    let y = self.number()?;
    // Z and M ordinates are accepted and dropped.
    for _ in 0..2 {
      self.skip_ws();
      if self.peek().is_some_and(is_number_start) {
        self.number()?;
      }
    }
    Ok(Coord { x, y })
  }

  fn number(&mut self) -> Result<f64> {
    self.skip_ws();
    let start = self.pos;
    let len = self.src.as_bytes()[start..]
      .iter()
      .take_while(|&&b| is_number_start(b) || matches!(b, b'e' | b'E'))
      .count();
    let text = &self.src[start..start + len];
    let value = text
      .parse::<f64>()
      .map_err(|_| self.error(format!("invalid number {text:?}")))?;
    self.pos += len;
    Ok(value)
  }
}

fn is_number_start(b: u8) -> bool {
  b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.')
}
