// crates/geonames-core/src/schema/fields.rs
use crate::source::RawRow;
use crate::text::non_empty;
use chrono::NaiveDate;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use thiserror::Error;

/// Why a single field was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldErrorKind {
    #[error("missing required value")]
    Missing,
    #[error("shorter than {0} characters")]
    TooShort(usize),
    #[error("longer than {0} characters")]
    TooLong(usize),
    #[error("not an integer")]
    InvalidInteger,
    #[error("not a decimal number")]
    InvalidDecimal,
    #[error("not a YYYY-MM-DD date")]
    InvalidDate,
    #[error("not a boolean")]
    InvalidBoolean,
    #[error("out of range")]
    OutOfRange,
    #[error("not an allowed value")]
    NotAllowed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {kind}")]
pub struct FieldError {
    pub field: &'static str,
    pub kind: FieldErrorKind,
}

/// Non-empty list of field failures for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|e| e.field)
    }

    pub fn has(&self, field: &str, kind: &FieldErrorKind) -> bool {
        self.0.iter().any(|e| e.field == field && &e.kind == kind)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Reads typed values out of a [`RawRow`], collecting every failure instead
/// of stopping at the first one. Empty columns count as absent.
pub(crate) struct FieldReader<'r> {
    row: &'r RawRow,
    errors: Vec<FieldError>,
}

impl<'r> FieldReader<'r> {
    pub(crate) fn new(row: &'r RawRow) -> Self {
        Self {
            row,
            errors: Vec::new(),
        }
    }

    fn fail(&mut self, field: &'static str, kind: FieldErrorKind) {
        self.errors.push(FieldError { field, kind });
    }

    pub(crate) fn raw(&self, field: &str) -> Option<&'r str> {
        non_empty(self.row.get(field))
    }

    fn present(&mut self, field: &'static str, required: bool) -> Option<&'r str> {
        let value = self.raw(field);
        if value.is_none() && required {
            self.fail(field, FieldErrorKind::Missing);
        }
        value
    }

    fn checked_len(&mut self, field: &'static str, value: &str, min: usize, max: usize) -> bool {
        let len = value.chars().count();
        if len < min {
            self.fail(field, FieldErrorKind::TooShort(min));
            false
        } else if len > max {
            self.fail(field, FieldErrorKind::TooLong(max));
            false
        } else {
            true
        }
    }

    pub(crate) fn string(
        &mut self,
        field: &'static str,
        required: bool,
        min: usize,
        max: usize,
    ) -> Option<String> {
        let value = self.present(field, required)?;
        self.checked_len(field, value, min, max)
            .then(|| value.to_owned())
    }

    /// Optional text capped at `max` characters.
    pub(crate) fn text(&mut self, field: &'static str, max: usize) -> Option<String> {
        self.string(field, false, 0, max)
    }

    /// Required text capped at `max` characters.
    pub(crate) fn required_text(&mut self, field: &'static str, max: usize) -> Option<String> {
        self.string(field, true, 0, max)
    }

    /// Code of an exact length, e.g. ISO country codes.
    pub(crate) fn code(&mut self, field: &'static str, len: usize, required: bool) -> Option<String> {
        self.string(field, required, len, len)
    }

    pub(crate) fn int<T: FromStr>(&mut self, field: &'static str, required: bool) -> Option<T> {
        let value = self.present(field, required)?;
        match value.parse::<T>() {
            Ok(v) => Some(v),
            Err(_) => {
                self.fail(field, FieldErrorKind::InvalidInteger);
                None
            }
        }
    }

    pub(crate) fn int_in<T>(&mut self, field: &'static str, range: RangeInclusive<T>) -> Option<T>
    where
        T: FromStr + PartialOrd,
    {
        let value = self.int::<T>(field, false)?;
        if range.contains(&value) {
            Some(value)
        } else {
            self.fail(field, FieldErrorKind::OutOfRange);
            None
        }
    }

    pub(crate) fn decimal(&mut self, field: &'static str, range: RangeInclusive<f64>) -> Option<f64> {
        let value = self.present(field, false)?;
        match value.parse::<f64>() {
            Ok(v) if v.is_finite() && range.contains(&v) => Some(v),
            Ok(_) => {
                self.fail(field, FieldErrorKind::OutOfRange);
                None
            }
            Err(_) => {
                self.fail(field, FieldErrorKind::InvalidDecimal);
                None
            }
        }
    }

    pub(crate) fn date(&mut self, field: &'static str) -> Option<NaiveDate> {
        let value = self.present(field, false)?;
        match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            Ok(d) => Some(d),
            Err(_) => {
                self.fail(field, FieldErrorKind::InvalidDate);
                None
            }
        }
    }

    /// `1`/`0`/`true`/`false`; absent reads as `false`.
    pub(crate) fn flag(&mut self, field: &'static str) -> bool {
        match self.raw(field).map(str::to_ascii_lowercase).as_deref() {
            None | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(_) => {
                self.fail(field, FieldErrorKind::InvalidBoolean);
                false
            }
        }
    }

    /// Rejects `value` unless `allowed` holds.
    pub(crate) fn ensure(&mut self, field: &'static str, value: Option<&str>, allowed: impl Fn(&str) -> bool) {
        if let Some(v) = value {
            if !allowed(v) {
                self.fail(field, FieldErrorKind::NotAllowed);
            }
        }
    }

    pub(crate) fn finish(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(FieldErrors(self.errors))
        }
    }
}
