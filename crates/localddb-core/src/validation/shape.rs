//! Declarative request shapes.
//!
//! A shape names the wire type of a field and the constraints checked against
//! it. Constraints run in the order they were declared, before any child
//! shapes, so error messages come out in the service's order.

use std::sync::LazyLock;

use regex::Regex;

/// Pattern every table and index name must match.
pub static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[a-zA-Z0-9_.-]+").expect("name pattern is valid"));

/// Wire type of a field.
#[derive(Debug, Clone)]
pub enum ShapeKind {
    /// JSON boolean.
    Boolean,
    /// Integral number; fractional input is floored.
    Long,
    /// Integral number reported as `Integer` in type errors.
    Integer,
    /// JSON string.
    String,
    /// Base64 text.
    Blob,
    /// JSON array of one element shape.
    List(Box<Shape>),
    /// JSON object with arbitrary keys and one value shape.
    Map(Box<Shape>),
    /// JSON object with a fixed set of members.
    Structure(Vec<Member>),
    /// A (recursive) attribute value.
    AttributeValue,
}

/// A constraint checked during the aggregate validation pass.
#[derive(Debug, Clone, Copy)]
pub enum Constraint {
    /// Field must be present.
    NotNull,
    /// Numeric lower bound.
    GreaterThanOrEqual(i64),
    /// Numeric upper bound.
    LessThanOrEqual(i64),
    /// Minimum length of a string, list or map.
    LengthGreaterThanOrEqual(usize),
    /// Maximum length of a string, list or map.
    LengthLessThanOrEqual(usize),
    /// String must be one of the listed values.
    Enum(&'static [&'static str]),
    /// String must fully match the pattern.
    Pattern(&'static LazyLock<Regex>),
}

/// A field type together with its constraints.
#[derive(Debug, Clone)]
pub struct Shape {
    /// Wire type.
    pub kind: ShapeKind,
    /// Constraints in declaration order.
    pub constraints: Vec<Constraint>,
}

impl Shape {
    fn of(kind: ShapeKind) -> Self {
        Self {
            kind,
            constraints: Vec::new(),
        }
    }

    #[must_use]
    pub fn boolean() -> Self {
        Self::of(ShapeKind::Boolean)
    }

    #[must_use]
    pub fn long() -> Self {
        Self::of(ShapeKind::Long)
    }

    #[must_use]
    pub fn integer() -> Self {
        Self::of(ShapeKind::Integer)
    }

    #[must_use]
    pub fn string() -> Self {
        Self::of(ShapeKind::String)
    }

    #[must_use]
    pub fn blob() -> Self {
        Self::of(ShapeKind::Blob)
    }

    #[must_use]
    pub fn attribute_value() -> Self {
        Self::of(ShapeKind::AttributeValue)
    }

    #[must_use]
    pub fn list(element: Shape) -> Self {
        Self::of(ShapeKind::List(Box::new(element)))
    }

    #[must_use]
    pub fn map(value: Shape) -> Self {
        Self::of(ShapeKind::Map(Box::new(value)))
    }

    #[must_use]
    pub fn structure(members: Vec<Member>) -> Self {
        Self::of(ShapeKind::Structure(members))
    }

    /// Map of attribute name to attribute value, as used by items and keys.
    #[must_use]
    pub fn attribute_map() -> Self {
        Self::map(Self::attribute_value())
    }

    fn with(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    #[must_use]
    pub fn not_null(self) -> Self {
        self.with(Constraint::NotNull)
    }

    #[must_use]
    pub fn min(self, bound: i64) -> Self {
        self.with(Constraint::GreaterThanOrEqual(bound))
    }

    #[must_use]
    pub fn max(self, bound: i64) -> Self {
        self.with(Constraint::LessThanOrEqual(bound))
    }

    #[must_use]
    pub fn min_len(self, bound: usize) -> Self {
        self.with(Constraint::LengthGreaterThanOrEqual(bound))
    }

    #[must_use]
    pub fn max_len(self, bound: usize) -> Self {
        self.with(Constraint::LengthLessThanOrEqual(bound))
    }

    #[must_use]
    pub fn one_of(self, values: &'static [&'static str]) -> Self {
        self.with(Constraint::Enum(values))
    }

    #[must_use]
    pub fn pattern(self, regex: &'static LazyLock<Regex>) -> Self {
        self.with(Constraint::Pattern(regex))
    }
}

/// A named member of a structure.
#[derive(Debug, Clone)]
pub struct Member {
    /// Wire name, e.g. `TableName`.
    pub name: &'static str,
    /// Member shape.
    pub shape: Shape,
    /// Absence is reported on its own before the aggregate pass.
    pub required: bool,
    /// Length is checked as a table name before the aggregate pass.
    pub table_name: bool,
}

impl Member {
    #[must_use]
    pub fn new(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            shape,
            required: false,
            table_name: false,
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// A required table name member with the standard pattern.
    #[must_use]
    pub fn table_name(name: &'static str) -> Self {
        Self {
            name,
            shape: Shape::string().pattern(&NAME_PATTERN),
            required: true,
            table_name: true,
        }
    }
}
