//! Validation report types for structured error reporting.
//!
//! Reports can be printed for a terminal, serialized as JSON, or inspected
//! programmatically through their stable issue codes.

use serde::Serialize;
use std::fmt;

use crate::model::{SpriteId, ThingId};

/// The result of validating a catalogue and its sprite atlas.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidationReport {
    /// All issues found during validation.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Adds an issue to the report.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Returns the number of errors in the report.
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    /// Returns the number of warnings in the report.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Returns true if validation passed in strict mode (no errors or warnings).
    pub fn is_ok_strict(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues carrying the given code.
    pub fn with_code(&self, code: IssueCode) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.code == code)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Validation passed: no issues found");
        }

        writeln!(
            f,
            "Validation completed with {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// A single validation issue (error or warning).
#[derive(Clone, Debug, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// A stable code for the issue type.
    pub code: IssueCode,
    pub message: String,
    /// Where the issue occurred.
    pub context: IssueContext,
}

impl ValidationIssue {
    pub fn new(
        severity: Severity,
        code: IssueCode,
        message: impl Into<String>,
        context: IssueContext,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            context,
        }
    }

    pub fn error(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Error, code, message, context)
    }

    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Warning, code, message, context)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity, self.code, self.context, self.message
        )
    }
}

/// The severity of a validation issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Suspicious but saveable.
    Warning,
    /// The catalogue cannot be saved or the client would misrender it.
    Error,
}

/// A stable code identifying the type of validation issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IssueCode {
    // Thing structure
    /// A thing sits in another category's ID range.
    CategoryMismatch,
    /// A thing has no frame groups at all.
    MissingFrameGroups,
    /// The client version cannot store this group arrangement.
    UnsupportedGroupLayout,
    /// A frame group has a zero dimension.
    EmptyDimension,
    /// A group's sprite list length disagrees with its dimensions.
    SpriteCountMismatch,

    // Animation
    /// Duration entries disagree with the frame count.
    DurationCountMismatch,
    /// A frame's minimum duration exceeds its maximum.
    InvalidDurationRange,

    // References
    /// A frame group references a sprite beyond the sprite count.
    SpriteOutOfRange,
    /// A market flag refers to an item that does not exist.
    MissingMarketRef,

    // Sprite atlas
    /// A sprite address points outside the sprite container.
    SpriteAddressOutOfBounds,
}

/// Where a validation issue occurred.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueContext {
    /// The catalogue as a whole.
    Catalogue,
    Thing { id: ThingId },
    /// One frame group of a thing.
    FrameGroup { id: ThingId, group: usize },
    Sprite { id: SpriteId },
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::Catalogue => write!(f, "catalogue"),
            IssueContext::Thing { id } => write!(f, "thing {}", id),
            IssueContext::FrameGroup { id, group } => write!(f, "thing {} group {}", id, group),
            IssueContext::Sprite { id } => write!(f, "sprite {}", id),
        }
    }
}
