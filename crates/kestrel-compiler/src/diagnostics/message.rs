use rowan::TextRange;

/// Diagnostic kinds ordered by priority (highest priority first).
///
/// Syntax errors come first: semantic checks on a statement that failed to
/// parse are noise. Within a category, earlier variants are root causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    // Unbalanced delimiters
    UnclosedBlock,
    UnclosedParen,

    // Something required is missing
    ExpectedExpression,
    ExpectedSemicolon,
    ExpectedName,
    ExpectedType,

    // Something that does not belong
    UnexpectedToken,
    IntegerOutOfRange,

    // Names
    DuplicateSymbol,
    UnknownSymbol,
    AssignToConstant,
    NotConstant,

    // Types and values
    TypeMismatch,
    DivisionByZero,
    FloatAtRuntime,

    // Control flow
    BreakOutsideLoop,

    // Machine limits
    RegisterExhausted,
    CodeSizeExceeded,

    // Warnings
    UninitializedRead,
}

impl DiagnosticKind {
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::UninitializedRead => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Whether this kind suppresses `other` reported at the same position.
    pub fn suppresses(&self, other: &DiagnosticKind) -> bool {
        self < other
    }

    /// Base message for this diagnostic kind, used when no custom message is provided.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::UnclosedBlock => "missing closing `}`",
            Self::UnclosedParen => "missing closing `)`",

            Self::ExpectedExpression => "expected an expression",
            Self::ExpectedSemicolon => "expected `;`",
            Self::ExpectedName => "expected a name",
            Self::ExpectedType => "expected `int` or `float`",

            Self::UnexpectedToken => "unexpected token",
            Self::IntegerOutOfRange => "integer literal out of range",

            Self::DuplicateSymbol => "duplicate declaration",
            Self::UnknownSymbol => "unknown name",
            Self::AssignToConstant => "cannot assign to a constant",
            Self::NotConstant => "constant initializer is not known at compile time",

            Self::TypeMismatch => "type mismatch",
            Self::DivisionByZero => "division by zero",
            Self::FloatAtRuntime => "float arithmetic is only supported on constants",

            Self::BreakOutsideLoop => "`break` outside of a loop",

            Self::RegisterExhausted => "expression needs more registers than available",
            Self::CodeSizeExceeded => "program exceeds the code size limit",

            Self::UninitializedRead => "variable is read before it is assigned",
        }
    }

    /// Template for custom messages. Contains `{}` placeholder for caller-provided detail.
    pub fn custom_message(&self) -> String {
        match self {
            Self::DuplicateSymbol => "`{}` is already declared in this scope".to_string(),
            Self::UnknownSymbol => "`{}` is not declared".to_string(),
            Self::AssignToConstant => "cannot assign to constant `{}`".to_string(),
            Self::UninitializedRead => "`{}` is read before it is assigned".to_string(),
            Self::BreakOutsideLoop => "`{}` outside of a loop".to_string(),
            Self::IntegerOutOfRange => "integer literal `{}` is out of range".to_string(),
            Self::UnexpectedToken | Self::ExpectedName => "{}".to_string(),
            _ => format!("{}: {{}}", self.fallback_message()),
        }
    }

    /// Render the final message.
    ///
    /// - `None` → returns `fallback_message()`
    /// - `Some(detail)` → returns `custom_message()` with `{}` replaced by detail
    pub fn message(&self, msg: Option<&str>) -> String {
        match msg {
            None => self.fallback_message().to_string(),
            Some(detail) => self.custom_message().replace("{}", detail),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInfo {
    pub(crate) range: TextRange,
    pub(crate) message: String,
}

impl RelatedInfo {
    pub fn new(range: TextRange, message: impl Into<String>) -> Self {
        Self {
            range,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub(crate) kind: DiagnosticKind,
    /// The range shown to the user (underlined in output).
    pub(crate) range: TextRange,
    pub(crate) message: String,
    pub(crate) related: Vec<RelatedInfo>,
}

impl DiagnosticMessage {
    pub(crate) fn new(kind: DiagnosticKind, range: TextRange, message: impl Into<String>) -> Self {
        Self {
            kind,
            range,
            message: message.into(),
            related: Vec::new(),
        }
    }

    pub(crate) fn with_default_message(kind: DiagnosticKind, range: TextRange) -> Self {
        Self::new(kind, range, kind.fallback_message())
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.kind.default_severity()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity() == Severity::Warning
    }
}

impl std::fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}..{}: {}",
            self.severity(),
            u32::from(self.range.start()),
            u32::from(self.range.end()),
            self.message
        )?;
        for related in &self.related {
            write!(
                f,
                " (related: {} at {}..{})",
                related.message,
                u32::from(related.range.start()),
                u32::from(related.range.end())
            )?;
        }
        Ok(())
    }
}
