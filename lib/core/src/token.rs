use serde::{Deserialize, Serialize};
use std::fmt;

/// Content classification of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Alphanumeric,
    Acronym,
    Digit,
    Homogeneous,
    Symbol,
}

impl TokenKind {
    /// Classify a token value by content.
    ///
    /// A single non-alphanumeric character is a symbol; all-alphabetic runs
    /// are alphanumeric; strict dot/alphanumeric alternation with at least
    /// one dot is an acronym ("u.s.a."); all-digit runs are digits;
    /// everything else is homogeneous.
    #[must_use]
    pub fn classify(value: &str) -> TokenKind {
        let mut chars = value.chars();
        if let (Some(first), None) = (chars.next(), chars.next()) {
            if !first.is_alphanumeric() {
                return TokenKind::Symbol;
            }
        }

        if !value.is_empty() && value.chars().all(char::is_alphabetic) {
            return TokenKind::Alphanumeric;
        }

        if is_acronym(value) {
            return TokenKind::Acronym;
        }

        if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
            return TokenKind::Digit;
        }

        TokenKind::Homogeneous
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Alphanumeric => "Alphanumeric",
            TokenKind::Acronym => "Acronym",
            TokenKind::Digit => "Digit",
            TokenKind::Homogeneous => "Homogeneous",
            TokenKind::Symbol => "Symbol",
        }
    }
}

fn is_acronym(value: &str) -> bool {
    if !value.contains('.') {
        return false;
    }

    let mut previous_is_dot: Option<bool> = None;
    for c in value.chars() {
        let is_dot = c == '.';
        if !is_dot && !c.is_alphanumeric() {
            return false;
        }
        if previous_is_dot == Some(is_dot) {
            return false;
        }
        previous_is_dot = Some(is_dot);
    }

    true
}

/// A token produced by the tokenizer. Consumed read-only downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub value: String,
    pub kind: TokenKind,
    /// Whether the character immediately after the token is a space.
    pub trailing_space: bool,
}

impl Token {
    /// Build a token, classifying the value by content.
    #[must_use]
    pub fn new(value: impl Into<String>, trailing_space: bool) -> Self {
        let value = value.into();
        let kind = TokenKind::classify(&value);
        Self {
            value,
            kind,
            trailing_space,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}: {}, {})",
            self.value,
            self.kind.name(),
            self.trailing_space
        )
    }
}
