use std::fmt;

/// Machine-readable error codes for scripted consumers of `callnet` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InputNotFound,
    MissingColumns,
    MalformedRow,
    MissingField,
    InvalidCallType,
    InvalidDuration,
    MissingCallText,
    ConfigParseError,
    LexiconParseError,
    NonConvergence,
    EmptyGraph,
    EmptySelection,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InputNotFound => "E1001",
            Self::MissingColumns => "E1002",
            Self::MalformedRow => "E1003",
            Self::MissingField => "E1004",
            Self::InvalidCallType => "E1005",
            Self::InvalidDuration => "E1006",
            Self::MissingCallText => "E1007",
            Self::ConfigParseError => "E2001",
            Self::LexiconParseError => "E2002",
            Self::NonConvergence => "E3001",
            Self::EmptyGraph => "E3002",
            Self::EmptySelection => "E4001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InputNotFound => "Input file not found",
            Self::MissingColumns => "Required columns missing",
            Self::MalformedRow => "Malformed CSV row",
            Self::MissingField => "Required field is empty",
            Self::InvalidCallType => "Invalid call type",
            Self::InvalidDuration => "Invalid call duration",
            Self::MissingCallText => "Call_Text column missing",
            Self::ConfigParseError => "Config file parse error",
            Self::LexiconParseError => "Sentiment lexicon parse error",
            Self::NonConvergence => "Power iteration did not converge",
            Self::EmptyGraph => "Graph has no nodes",
            Self::EmptySelection => "Selection not present in partition",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InputNotFound => Some("Check the path passed to `callnet` and retry."),
            Self::MissingColumns => Some(
                "The header must contain Caller_ID, Receiver_ID, Call_Type, Duration, Location, Timestamp.",
            ),
            Self::MalformedRow => Some("Fix quoting or field count on the reported line."),
            Self::MissingField => Some("Every row needs a Caller_ID and a Receiver_ID."),
            Self::InvalidCallType => Some("Call_Type must be `Outgoing` or `Incoming`."),
            Self::InvalidDuration => Some("Duration must be a non-negative number."),
            Self::MissingCallText => Some("Add a Call_Text column to run sentiment analysis."),
            Self::ConfigParseError => Some("Fix syntax in callnet.toml and retry."),
            Self::LexiconParseError => Some("Lexicon rows must be `word,polarity` with polarity in [-1, 1]."),
            Self::NonConvergence => {
                Some("Fall back to PageRank or raise eigenvector.max_iter in callnet.toml.")
            }
            Self::EmptyGraph => None,
            Self::EmptySelection => Some("List available community ids with `callnet communities`."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    const ALL: [ErrorCode; 13] = [
        ErrorCode::InputNotFound,
        ErrorCode::MissingColumns,
        ErrorCode::MalformedRow,
        ErrorCode::MissingField,
        ErrorCode::InvalidCallType,
        ErrorCode::InvalidDuration,
        ErrorCode::MissingCallText,
        ErrorCode::ConfigParseError,
        ErrorCode::LexiconParseError,
        ErrorCode::NonConvergence,
        ErrorCode::EmptyGraph,
        ErrorCode::EmptySelection,
        ErrorCode::InternalUnexpected,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let raw = code.code();
            assert_eq!(raw.len(), 5);
            assert!(raw.starts_with('E'));
            assert!(raw.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn display_matches_code() {
        assert_eq!(ErrorCode::NonConvergence.to_string(), "E3001");
    }
}
