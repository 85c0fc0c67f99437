#![forbid(unsafe_code)]

//! Core validation types and the built-in validators the schema compiler
//! layers per field kind.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use dform_core::FileHandle;
use regex::Regex;

// ---------------------------------------------------------------------------
// Error Codes (for i18n lookup)
// ---------------------------------------------------------------------------

/// A required field has no value.
pub const ERROR_CODE_REQUIRED: &str = "required";
/// The raw value has the wrong shape and cannot be coerced.
pub const ERROR_CODE_TYPE: &str = "invalid_type";
/// Text shorter than `minLength`.
pub const ERROR_CODE_MIN_LENGTH: &str = "too_short";
/// Text longer than `maxLength`.
pub const ERROR_CODE_MAX_LENGTH: &str = "too_long";
/// Text does not match `pattern`.
pub const ERROR_CODE_PATTERN: &str = "pattern";
pub const ERROR_CODE_EMAIL: &str = "email";
pub const ERROR_CODE_URL: &str = "url";
pub const ERROR_CODE_PHONE: &str = "phone";
pub const ERROR_CODE_COLOR: &str = "color";
/// Number below `min`.
pub const ERROR_CODE_MIN: &str = "too_small";
/// Number above `max`.
pub const ERROR_CODE_MAX: &str = "too_big";
/// Number is not a multiple of `step`.
pub const ERROR_CODE_STEP: &str = "not_multiple_of";
/// Value outside the declared options.
pub const ERROR_CODE_OPTION: &str = "invalid_option";
/// Too few selected entries.
pub const ERROR_CODE_TOO_FEW: &str = "too_few";
/// Too many selected entries or tags.
pub const ERROR_CODE_TOO_MANY: &str = "too_many";
/// Too many files for the field.
pub const ERROR_CODE_FILE_COUNT: &str = "file_count";
/// A file exceeds `maxSize`.
pub const ERROR_CODE_FILE_SIZE: &str = "file_size";
/// A file does not match `accept`.
pub const ERROR_CODE_FILE_TYPE: &str = "file_type";
/// Unparsable date/time text.
pub const ERROR_CODE_DATE: &str = "invalid_date";
pub const ERROR_CODE_DATE_MIN: &str = "date_too_early";
pub const ERROR_CODE_DATE_MAX: &str = "date_too_late";
/// A custom predicate returned `false`.
pub const ERROR_CODE_CUSTOM: &str = "custom";

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// A field-level validation error with code, message template and
/// interpolation parameters.
///
/// # Example
///
/// ```rust
/// use dform_validation::ValidationError;
///
/// let error = ValidationError::new("too_small", "Minimum value is {min}").with_param("min", 18);
/// assert_eq!(error.format_message(), "Minimum value is 18");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Stable error code for programmatic handling and i18n.
    pub code: &'static str,
    /// Message template; `{key}` is replaced by the matching parameter.
    pub message: String,
    pub params: BTreeMap<String, String>,
}

impl ValidationError {
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter for message interpolation.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Format the message with parameter substitution.
    ///
    /// Each placeholder is substituted once, left to right, so parameter
    /// values are never re-expanded.
    #[must_use]
    pub fn format_message(&self) -> String {
        let mut out = String::with_capacity(self.message.len());
        let mut rest = self.message.as_str();
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            let substituted = tail.find('}').and_then(|close| {
                self.params
                    .get(&tail[1..close])
                    .map(|value| (value, close))
            });
            match substituted {
                Some((value, close)) => {
                    out.push_str(value);
                    rest = &tail[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_message())
    }
}

impl std::error::Error for ValidationError {}

// ---------------------------------------------------------------------------
// ValidationResult
// ---------------------------------------------------------------------------

/// The result of a validation operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValidationResult {
    #[default]
    Valid,
    Invalid(ValidationError),
}

impl ValidationResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    #[must_use]
    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            Self::Valid => None,
            Self::Invalid(e) => Some(e),
        }
    }

    /// The formatted message if the result is `Invalid`.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.error().map(ValidationError::format_message)
    }

    /// Combine two results, returning the first error if any.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::Valid => other,
            Self::Invalid(_) => self,
        }
    }

    /// Convert into a `Result`, for `?` inside check pipelines.
    pub fn into_result(self) -> Result<(), ValidationError> {
        match self {
            Self::Valid => Ok(()),
            Self::Invalid(e) => Err(e),
        }
    }
}

impl From<Result<(), ValidationError>> for ValidationResult {
    fn from(result: Result<(), ValidationError>) -> Self {
        match result {
            Ok(()) => Self::Valid,
            Err(e) => Self::Invalid(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Validator Trait
// ---------------------------------------------------------------------------

/// A check over values of type `T`.
///
/// ```rust
/// use dform_validation::{ValidationError, ValidationResult, Validator};
///
/// struct NoSpaces;
///
/// impl Validator<str> for NoSpaces {
///     fn validate(&self, value: &str) -> ValidationResult {
///         if value.contains(' ') {
///             ValidationResult::Invalid(ValidationError::new("no_spaces", self.error_message()))
///         } else {
///             ValidationResult::Valid
///         }
///     }
///
///     fn error_message(&self) -> &str {
///         "Value must not contain spaces"
///     }
/// }
/// ```
pub trait Validator<T: ?Sized>: Send + Sync {
    fn validate(&self, value: &T) -> ValidationResult;

    /// The default (uninterpolated) error message.
    fn error_message(&self) -> &str;
}

impl<T: ?Sized, V: Validator<T> + ?Sized> Validator<T> for Box<V> {
    fn validate(&self, value: &T) -> ValidationResult {
        (**self).validate(value)
    }

    fn error_message(&self) -> &str {
        (**self).error_message()
    }
}

fn invalid(code: &'static str, message: &str) -> ValidationResult {
    ValidationResult::Invalid(ValidationError::new(code, message))
}

// ---------------------------------------------------------------------------
// Text Validators
// ---------------------------------------------------------------------------

/// A non-blank value. Whitespace-only text counts as blank.
#[derive(Debug, Clone)]
pub struct Required {
    pub label: String,
}

impl Required {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// The error reported for a blank value.
    #[must_use]
    pub fn error(&self) -> ValidationError {
        ValidationError::new(ERROR_CODE_REQUIRED, "{label} is required")
            .with_param("label", &self.label)
    }
}

impl Validator<str> for Required {
    fn validate(&self, value: &str) -> ValidationResult {
        if value.is_empty() {
            ValidationResult::Invalid(self.error())
        } else {
            ValidationResult::Valid
        }
    }

    fn error_message(&self) -> &str {
        "{label} is required"
    }
}

/// At least `min` characters.
#[derive(Debug, Clone, Copy)]
pub struct MinLength {
    pub min: usize,
}

impl MinLength {
    #[must_use]
    pub fn new(min: usize) -> Self {
        Self { min }
    }
}

impl Validator<str> for MinLength {
    fn validate(&self, value: &str) -> ValidationResult {
        let len = value.chars().count();
        if len < self.min {
            ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_MIN_LENGTH, self.error_message())
                    .with_param("min", self.min)
                    .with_param("actual", len),
            )
        } else {
            ValidationResult::Valid
        }
    }

    fn error_message(&self) -> &str {
        "Minimum {min} characters required"
    }
}

/// At most `max` characters.
#[derive(Debug, Clone, Copy)]
pub struct MaxLength {
    pub max: usize,
}

impl MaxLength {
    #[must_use]
    pub fn new(max: usize) -> Self {
        Self { max }
    }
}

impl Validator<str> for MaxLength {
    fn validate(&self, value: &str) -> ValidationResult {
        let len = value.chars().count();
        if len > self.max {
            ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_MAX_LENGTH, self.error_message())
                    .with_param("max", self.max)
                    .with_param("actual", len),
            )
        } else {
            ValidationResult::Valid
        }
    }

    fn error_message(&self) -> &str {
        "Maximum {max} characters allowed"
    }
}

/// Text containing a match of a regular expression.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub regex: Regex,
    pub label: String,
}

impl Pattern {
    /// Compile `pattern`. Matching is an unanchored search.
    pub fn new(pattern: &str, label: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            label: label.into(),
        })
    }
}

impl Validator<str> for Pattern {
    fn validate(&self, value: &str) -> ValidationResult {
        if self.regex.is_match(value) {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_PATTERN, self.error_message())
                    .with_param("label", &self.label)
                    .with_param("pattern", self.regex.as_str()),
            )
        }
    }

    fn error_message(&self) -> &str {
        "Invalid format for {label}"
    }
}

/// An email address.
///
/// Heuristic: one `@` with text on both sides, no whitespace, and a dotted
/// domain whose last label has at least two characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Email;

impl Email {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Validator<str> for Email {
    fn validate(&self, value: &str) -> ValidationResult {
        let trimmed = value.trim();
        let Some((local, domain)) = trimmed.split_once('@') else {
            return invalid(ERROR_CODE_EMAIL, self.error_message());
        };
        if local.is_empty()
            || domain.is_empty()
            || domain.contains('@')
            || trimmed.chars().any(char::is_whitespace)
        {
            return invalid(ERROR_CODE_EMAIL, self.error_message());
        }

        let labels: Vec<&str> = domain.split('.').collect();
        if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
            return invalid(ERROR_CODE_EMAIL, self.error_message());
        }
        if let Some(tld) = labels.last()
            && tld.chars().count() < 2
        {
            return invalid(ERROR_CODE_EMAIL, self.error_message());
        }

        ValidationResult::Valid
    }

    fn error_message(&self) -> &str {
        "Invalid email address"
    }
}

/// An absolute `http://` or `https://` URL with a non-empty host part.
#[derive(Debug, Clone, Copy, Default)]
pub struct Url;

impl Url {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Validator<str> for Url {
    fn validate(&self, value: &str) -> ValidationResult {
        let trimmed = value.trim();
        let rest = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"));
        let valid = rest.is_some_and(|rest| {
            let host = rest.split(['/', '?', '#']).next().unwrap_or("");
            !host.is_empty() && !rest.chars().any(char::is_whitespace)
        });
        if valid {
            ValidationResult::Valid
        } else {
            invalid(ERROR_CODE_URL, self.error_message())
        }
    }

    fn error_message(&self) -> &str {
        "Invalid URL"
    }
}

/// Digits, whitespace and `- + ( )` only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Phone;

impl Validator<str> for Phone {
    fn validate(&self, value: &str) -> ValidationResult {
        let valid = !value.is_empty()
            && value
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_whitespace() || "-+()".contains(c));
        if valid {
            ValidationResult::Valid
        } else {
            invalid(ERROR_CODE_PHONE, self.error_message())
        }
    }

    fn error_message(&self) -> &str {
        "Invalid phone number"
    }
}

/// A `#RRGGBB` hex color.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexColor;

impl Validator<str> for HexColor {
    fn validate(&self, value: &str) -> ValidationResult {
        let valid = value
            .strip_prefix('#')
            .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()));
        if valid {
            ValidationResult::Valid
        } else {
            invalid(ERROR_CODE_COLOR, self.error_message())
        }
    }

    fn error_message(&self) -> &str {
        "Invalid color format"
    }
}

/// One of a closed set of option values.
#[derive(Debug, Clone)]
pub struct OneOf {
    pub options: Vec<String>,
}

impl OneOf {
    #[must_use]
    pub fn new(options: Vec<String>) -> Self {
        Self { options }
    }
}

impl Validator<str> for OneOf {
    fn validate(&self, value: &str) -> ValidationResult {
        if self.options.iter().any(|o| o == value) {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_OPTION, self.error_message())
                    .with_param("options", self.options.join(", "))
                    .with_param("value", value),
            )
        }
    }

    fn error_message(&self) -> &str {
        "Invalid option. Expected one of: {options}"
    }
}

// ---------------------------------------------------------------------------
// Temporal Validators
// ---------------------------------------------------------------------------

/// Which textual date/time format a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    /// `YYYY-MM-DD`
    Date,
    /// `YYYY-MM-DDTHH:MM[:SS]`
    DateTime,
    /// `HH:MM[:SS]`
    Time,
}

impl TemporalKind {
    /// Parse a field value into a comparable instant.
    ///
    /// Times are placed on a fixed day so that they order by time of day.
    #[must_use]
    pub fn parse(self, text: &str) -> Option<NaiveDateTime> {
        let text = text.trim();
        match self {
            Self::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
            Self::DateTime => NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M"))
                .ok(),
            Self::Time => NaiveTime::parse_from_str(text, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
                .ok()
                .and_then(|t| NaiveDate::from_ymd_opt(1970, 1, 1).map(|d| d.and_time(t))),
        }
    }

    /// Parse a configured bound. A date-time field also accepts a plain date.
    #[must_use]
    pub fn parse_bound(self, text: &str) -> Option<NaiveDateTime> {
        self.parse(text).or_else(|| match self {
            Self::DateTime => Self::Date.parse(text),
            _ => None,
        })
    }
}

/// A parsed inclusive bound, remembering its configured spelling for messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalBound {
    pub text: String,
    pub at: NaiveDateTime,
}

/// Parseable date/time text within optional inclusive bounds.
#[derive(Debug, Clone)]
pub struct DateRange {
    pub kind: TemporalKind,
    pub min: Option<TemporalBound>,
    pub max: Option<TemporalBound>,
}

impl DateRange {
    #[must_use]
    pub fn new(kind: TemporalKind) -> Self {
        Self {
            kind,
            min: None,
            max: None,
        }
    }
}

impl Validator<str> for DateRange {
    fn validate(&self, value: &str) -> ValidationResult {
        let Some(at) = self.kind.parse(value) else {
            return invalid(ERROR_CODE_DATE, self.error_message());
        };
        if let Some(min) = &self.min
            && at < min.at
        {
            return ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_DATE_MIN, "Date must be after {min}")
                    .with_param("min", &min.text),
            );
        }
        if let Some(max) = &self.max
            && at > max.at
        {
            return ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_DATE_MAX, "Date must be before {max}")
                    .with_param("max", &max.text),
            );
        }
        ValidationResult::Valid
    }

    fn error_message(&self) -> &str {
        "Invalid date"
    }
}

// ---------------------------------------------------------------------------
// Numeric Validators
// ---------------------------------------------------------------------------

/// A value within optional inclusive bounds; each side reports its own message.
#[derive(Debug, Clone, Copy)]
pub struct Range<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T: Copy> Range<T> {
    #[must_use]
    pub fn new(min: T, max: T) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    #[must_use]
    pub fn at_least(min: T) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    #[must_use]
    pub fn at_most(max: T) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }
}

impl<T> Validator<T> for Range<T>
where
    T: PartialOrd + fmt::Display + Copy + Send + Sync,
{
    fn validate(&self, value: &T) -> ValidationResult {
        if let Some(min) = self.min
            && *value < min
        {
            return ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_MIN, "Minimum value is {min}")
                    .with_param("min", min)
                    .with_param("actual", *value),
            );
        }
        if let Some(max) = self.max
            && *value > max
        {
            return ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_MAX, "Maximum value is {max}")
                    .with_param("max", max)
                    .with_param("actual", *value),
            );
        }
        ValidationResult::Valid
    }

    fn error_message(&self) -> &str {
        "Value out of range"
    }
}

/// A multiple of `step`, compared on decimal digits rather than raw floats
/// so that `0.3` is a multiple of `0.1`.
///
/// Steps or values too fine (or too large) for fifteen decimal digits fall
/// back to checking that `value / step` is within a relative tolerance of an
/// integer.
#[derive(Debug, Clone, Copy)]
pub struct MultipleOf {
    pub step: f64,
}

impl MultipleOf {
    #[must_use]
    pub fn new(step: f64) -> Self {
        Self { step }
    }

    fn decimals(x: f64) -> i32 {
        let text = x.abs().to_string();
        let count = text.split_once('.').map_or(0, |(_, frac)| frac.len());
        i32::try_from(count.min(15)).unwrap_or(15)
    }

    /// Whether `value` is a decimal multiple of the step.
    #[must_use]
    pub fn accepts(&self, value: f64) -> bool {
        let scale = 10f64.powi(Self::decimals(value).max(Self::decimals(self.step)));
        let scaled_value = (value * scale).round();
        let scaled_step = (self.step * scale).round();
        if scaled_step == 0.0 || !scaled_value.is_finite() || !scaled_step.is_finite() {
            return self.accepts_ratio(value);
        }
        scaled_value % scaled_step == 0.0
    }

    fn accepts_ratio(&self, value: f64) -> bool {
        const TOLERANCE: f64 = 1e-9;
        let ratio = value / self.step;
        ratio.is_finite() && (ratio - ratio.round()).abs() <= TOLERANCE * ratio.abs().max(1.0)
    }
}

impl Validator<f64> for MultipleOf {
    fn validate(&self, value: &f64) -> ValidationResult {
        if self.accepts(*value) {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_STEP, self.error_message())
                    .with_param("step", self.step),
            )
        }
    }

    fn error_message(&self) -> &str {
        "Must be a multiple of {step}"
    }
}

// ---------------------------------------------------------------------------
// List Validators
// ---------------------------------------------------------------------------

/// Every entry belongs to a closed set.
#[derive(Debug, Clone)]
pub struct EachOneOf {
    pub options: Vec<String>,
}

impl EachOneOf {
    #[must_use]
    pub fn new(options: Vec<String>) -> Self {
        Self { options }
    }
}

impl Validator<[String]> for EachOneOf {
    fn validate(&self, value: &[String]) -> ValidationResult {
        match value.iter().find(|v| !self.options.contains(v)) {
            Some(bad) => ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_OPTION, self.error_message())
                    .with_param("value", bad),
            ),
            None => ValidationResult::Valid,
        }
    }

    fn error_message(&self) -> &str {
        "Invalid option: {value}"
    }
}

/// Number of entries in a list.
#[derive(Debug, Clone)]
pub struct Count {
    pub min: Option<usize>,
    pub max: Option<usize>,
    min_message: &'static str,
    max_message: &'static str,
}

impl Count {
    /// Selection bounds of a multi-choice field.
    #[must_use]
    pub fn selection(min: Option<usize>, max: Option<usize>) -> Self {
        Self {
            min,
            max,
            min_message: "Select at least {n} option(s)",
            max_message: "Select at most {n} option(s)",
        }
    }

    /// Upper bound of a tag list.
    #[must_use]
    pub fn tags(max: usize) -> Self {
        Self {
            min: None,
            max: Some(max),
            min_message: "",
            max_message: "Maximum {n} tags allowed",
        }
    }
}

impl Validator<[String]> for Count {
    fn validate(&self, value: &[String]) -> ValidationResult {
        let len = value.len();
        if let Some(min) = self.min
            && len < min
        {
            return ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_TOO_FEW, self.min_message).with_param("n", min),
            );
        }
        if let Some(max) = self.max
            && len > max
        {
            return ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_TOO_MANY, self.max_message).with_param("n", max),
            );
        }
        ValidationResult::Valid
    }

    fn error_message(&self) -> &str {
        self.max_message
    }
}

// ---------------------------------------------------------------------------
// File Validators
// ---------------------------------------------------------------------------

/// How many files a field may hold.
#[derive(Debug, Clone, Copy)]
pub struct FileCount {
    pub multiple: bool,
    pub max: Option<usize>,
}

impl Validator<[FileHandle]> for FileCount {
    fn validate(&self, files: &[FileHandle]) -> ValidationResult {
        if !self.multiple && files.len() > 1 {
            return invalid(ERROR_CODE_FILE_COUNT, "Only one file allowed");
        }
        if let Some(max) = self.max
            && self.multiple
            && files.len() > max
        {
            return ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_FILE_COUNT, self.error_message())
                    .with_param("n", max),
            );
        }
        ValidationResult::Valid
    }

    fn error_message(&self) -> &str {
        "Maximum {n} files allowed"
    }
}

/// Every file is at most `max_bytes` long.
#[derive(Debug, Clone, Copy)]
pub struct MaxFileSize {
    pub max_bytes: u64,
    pub multiple: bool,
}

impl MaxFileSize {
    /// The limit in megabytes with two decimals.
    #[must_use]
    pub fn megabytes(&self) -> String {
        format!("{:.2}", self.max_bytes as f64 / (1024.0 * 1024.0))
    }
}

impl Validator<[FileHandle]> for MaxFileSize {
    fn validate(&self, files: &[FileHandle]) -> ValidationResult {
        if files.iter().all(|f| f.size <= self.max_bytes) {
            return ValidationResult::Valid;
        }
        ValidationResult::Invalid(
            ValidationError::new(ERROR_CODE_FILE_SIZE, self.error_message())
                .with_param("size", self.megabytes()),
        )
    }

    fn error_message(&self) -> &str {
        if self.multiple {
            "Each file must be less than {size}MB"
        } else {
            "File must be less than {size}MB"
        }
    }
}

/// One entry of an `accept` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptEntry {
    /// `.pdf`: case-insensitive suffix of the file name.
    Extension(String),
    /// `image/*`: any MIME type of the category.
    Category(String),
    /// `application/pdf`: exact MIME type.
    Mime(String),
}

impl AcceptEntry {
    #[must_use]
    pub fn parse(entry: &str) -> Self {
        let entry = entry.trim();
        if entry.starts_with('.') {
            Self::Extension(entry.to_lowercase())
        } else if let Some(category) = entry.strip_suffix("/*") {
            Self::Category(format!("{category}/"))
        } else {
            Self::Mime(entry.to_string())
        }
    }

    #[must_use]
    pub fn matches(&self, file: &FileHandle) -> bool {
        match self {
            Self::Extension(ext) => file.name.to_lowercase().ends_with(ext.as_str()),
            Self::Category(prefix) => file.mime.starts_with(prefix.as_str()),
            Self::Mime(mime) => &file.mime == mime,
        }
    }
}

/// Every file matches at least one `accept` entry.
#[derive(Debug, Clone)]
pub struct Accept {
    pub accept: String,
    pub entries: Vec<AcceptEntry>,
}

impl Accept {
    #[must_use]
    pub fn new(accept: impl Into<String>) -> Self {
        let accept = accept.into();
        let entries = accept
            .split(',')
            .filter(|e| !e.trim().is_empty())
            .map(AcceptEntry::parse)
            .collect();
        Self { accept, entries }
    }

    #[must_use]
    pub fn accepts(&self, file: &FileHandle) -> bool {
        self.entries.iter().any(|e| e.matches(file))
    }
}

impl Validator<[FileHandle]> for Accept {
    fn validate(&self, files: &[FileHandle]) -> ValidationResult {
        if files.iter().all(|f| self.accepts(f)) {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_FILE_TYPE, self.error_message())
                    .with_param("accept", &self.accept),
            )
        }
    }

    fn error_message(&self) -> &str {
        "Invalid file type. Accepted: {accept}"
    }
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Runs validators in order and stops at the first failure.
pub struct All<T: ?Sized> {
    validators: Vec<Box<dyn Validator<T>>>,
}

impl<T: ?Sized> All<T> {
    #[must_use]
    pub fn new(validators: Vec<Box<dyn Validator<T>>>) -> Self {
        Self { validators }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl<T: ?Sized> Validator<T> for All<T> {
    fn validate(&self, value: &T) -> ValidationResult {
        for validator in &self.validators {
            let result = validator.validate(value);
            if result.is_invalid() {
                return result;
            }
        }
        ValidationResult::Valid
    }

    fn error_message(&self) -> &str {
        self.validators
            .first()
            .map_or("Validation failed", |v| v.error_message())
    }
}

impl<T: ?Sized> fmt::Debug for All<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("All")
            .field(
                "validators",
                &format!("[{} validators]", self.validators.len()),
            )
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ValidatorBuilder
// ---------------------------------------------------------------------------

/// Fluent construction of an [`All`] chain.
///
/// ```rust
/// use dform_validation::{Validator, ValidatorBuilder};
///
/// let validator = ValidatorBuilder::<str>::new()
///     .min_length(3)
///     .max_length(20)
///     .build();
///
/// assert!(validator.validate("alice").is_valid());
/// assert!(!validator.validate("ab").is_valid());
/// ```
pub struct ValidatorBuilder<T: ?Sized> {
    validators: Vec<Box<dyn Validator<T>>>,
    _phantom: PhantomData<T>,
}

impl<T: ?Sized> Default for ValidatorBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> ValidatorBuilder<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
            _phantom: PhantomData,
        }
    }

    /// Add any validator.
    #[must_use]
    pub fn custom(mut self, validator: impl Validator<T> + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Add a validator when `condition` holds.
    #[must_use]
    pub fn custom_if(self, condition: bool, validator: impl Validator<T> + 'static) -> Self {
        if condition {
            self.custom(validator)
        } else {
            self
        }
    }

    #[must_use]
    pub fn build(self) -> All<T> {
        All::new(self.validators)
    }
}

impl ValidatorBuilder<str> {
    #[must_use]
    pub fn min_length(self, min: usize) -> Self {
        self.custom(MinLength::new(min))
    }

    #[must_use]
    pub fn max_length(self, max: usize) -> Self {
        self.custom(MaxLength::new(max))
    }

    #[must_use]
    pub fn email(self) -> Self {
        self.custom(Email::new())
    }

    #[must_use]
    pub fn url(self) -> Self {
        self.custom(Url::new())
    }
}

impl ValidatorBuilder<f64> {
    #[must_use]
    pub fn range(self, min: Option<f64>, max: Option<f64>) -> Self {
        self.custom_if(min.is_some() || max.is_some(), Range { min, max })
    }

    #[must_use]
    pub fn multiple_of(self, step: f64) -> Self {
        self.custom(MultipleOf::new(step))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
