//! Field-level validation errors shared by the wallet and transaction forms.

use core::fmt;

/// A single violation attached to the form field that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError<F, E> {
    field: F,
    error: E,
}

impl<F, E> FieldError<F, E> {
    /// Returns the offending field.
    pub fn field(&self) -> &F {
        &self.field
    }

    /// Returns the violation.
    pub fn error(&self) -> &E {
        &self.error
    }
}

impl<F, E> fmt::Display for FieldError<F, E>
where
    F: fmt::Display,
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.error)
    }
}

/// A non-empty collection of field violations.
///
/// Several violations may coexist, including more than one for the same field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors<F, E>(Vec<FieldError<F, E>>);

impl<F, E> ValidationErrors<F, E>
where
    F: PartialEq,
{
    /// Returns all violations in the order they were detected.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError<F, E>> {
        self.0.iter()
    }

    /// Returns the violations attached to `field`.
    pub fn for_field<'a>(&'a self, field: &'a F) -> impl Iterator<Item = &'a E> {
        self.0.iter().filter(move |e| e.field == *field).map(|e| &e.error)
    }

    /// Returns `true` when at least one violation is attached to `field`.
    pub fn has_field(&self, field: &F) -> bool {
        self.0.iter().any(|e| e.field == *field)
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; an empty collection is never constructed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<F, E> IntoIterator for ValidationErrors<F, E> {
    type Item = FieldError<F, E>;
    type IntoIter = std::vec::IntoIter<FieldError<F, E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<F, E> fmt::Display for ValidationErrors<F, E>
where
    F: fmt::Display,
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl<F, E> core::error::Error for ValidationErrors<F, E>
where
    F: fmt::Debug + fmt::Display,
    E: fmt::Debug + fmt::Display,
{
}

/// Accumulates violations while a form is being checked.
#[derive(Debug)]
pub(crate) struct Collector<F, E>(Vec<FieldError<F, E>>);

impl<F, E> Collector<F, E> {
    pub(crate) fn new() -> Self {
        Self(Vec::new())
    }

    pub(crate) fn push(&mut self, field: F, error: E) {
        self.0.push(FieldError { field, error });
    }

    /// Returns `value` when nothing was collected.
    ///
    /// `value` is `None` only when some part of it failed to parse, which always records a
    /// violation first.
    pub(crate) fn finish<T>(self, value: Option<T>) -> Result<T, ValidationErrors<F, E>> {
        match value {
            Some(value) if self.0.is_empty() => Ok(value),
            _ => Err(ValidationErrors(self.0)),
        }
    }
}
