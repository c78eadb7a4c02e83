use crate::token::Token;

/// Vocabulary lookup the tokenizer matches against. The word-vector store is
/// the usual implementor.
pub trait Lexicon {
    fn contains_word(&self, candidate: &str) -> bool;

    /// Length in characters of the longest known word; bounds the
    /// longest-match scan.
    fn longest_word_len(&self) -> usize;
}

/// Symbols that may appear inside a token run.
#[inline]
#[must_use]
pub fn is_component_symbol(c: char) -> bool {
    matches!(c, '~' | '_' | '/' | '-' | '\'' | '.')
}

/// Any non-alphabetic character outside the component set ends a run.
#[inline]
#[must_use]
pub fn is_terminating_symbol(c: char) -> bool {
    !is_component_symbol(c) && !c.is_alphabetic()
}

/// Split `text` into tokens, preferring the longest run matching a known
/// vocabulary entry.
///
/// At each position every candidate length up to the vocabulary's longest
/// entry is tried; a candidate is only eligible when the character after it
/// is not alphabetic, so matches cannot straddle a word boundary. When no
/// vocabulary entry matches, single-character rules apply (digit, then
/// terminating symbol), and otherwise characters accumulate until the next
/// whitespace or terminating symbol and the run is classified by content.
/// Whitespace is a delimiter and never emitted.
pub fn tokenize<L: Lexicon>(text: &str, lexicon: &L) -> Vec<Token> {
    let chars: Vec<char> = text.chars().collect();
    let longest = lexicon.longest_word_len();
    let mut tokens = Vec::new();

    let mut index = 0;
    while index < chars.len() {
        let current = chars[index];

        if current.is_whitespace() {
            index += 1;
            continue;
        }

        if let Some(length) = longest_vocabulary_match(&chars, index, longest, lexicon) {
            let value: String = chars[index..index + length].iter().collect();
            let trailing_space = chars.get(index + length) == Some(&' ');
            tokens.push(Token::new(value, trailing_space));
            index += length;
            continue;
        }

        let trailing_space = chars.get(index + 1) == Some(&' ');

        if current.is_ascii_digit() {
            tokens.push(Token::new(current.to_string(), trailing_space));
            index += 1;
            continue;
        }

        if is_terminating_symbol(current) {
            tokens.push(Token::new(current.to_string(), trailing_space));
            index += 1;
            continue;
        }

        let mut end = index;
        while end < chars.len() && !chars[end].is_whitespace() && !is_terminating_symbol(chars[end])
        {
            end += 1;
        }

        let value: String = chars[index..end].iter().collect();
        let trailing_space = chars.get(end) == Some(&' ');
        tokens.push(Token::new(value, trailing_space));
        index = end;
    }

    tokens
}

/// Longest vocabulary entry starting at `start`, if any. A candidate only
/// counts when the character following it is not alphabetic.
fn longest_vocabulary_match<L: Lexicon>(
    chars: &[char],
    start: usize,
    longest: usize,
    lexicon: &L,
) -> Option<usize> {
    let max_length = longest.min(chars.len() - start);
    let mut best = None;

    for length in 1..=max_length {
        if let Some(after) = chars.get(start + length) {
            if after.is_alphabetic() {
                continue;
            }
        }

        let candidate: String = chars[start..start + length].iter().collect();
        if lexicon.contains_word(&candidate) {
            best = Some(length);
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    struct WordList(Vec<&'static str>);

    impl Lexicon for WordList {
        fn contains_word(&self, candidate: &str) -> bool {
            self.0.contains(&candidate)
        }

        fn longest_word_len(&self) -> usize {
            self.0.iter().map(|w| w.chars().count()).max().unwrap_or(0)
        }
    }

    #[test]
    fn test_prefers_longest_vocabulary_match() {
        let lexicon = WordList(vec!["in", "inside", "side"]);
        let tokens = tokenize("inside", &lexicon);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].value, "inside");
    }

    #[test]
    fn test_match_cannot_straddle_word_boundary() {
        // "in" is in the vocabulary but "ink" is not; the match at "in" is
        // ineligible because 'k' follows, so the fallback takes the run.
        let lexicon = WordList(vec!["in"]);
        let tokens = tokenize("ink", &lexicon);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].value, "ink");
        assert_eq!(tokens[0].kind, TokenKind::Alphanumeric);
    }

    #[test]
    fn test_whitespace_is_never_a_token() {
        let lexicon = WordList(vec![]);
        let tokens = tokenize("  one \t two  ", &lexicon);
        let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, vec!["one", "two"]);
    }

    #[test]
    fn test_trailing_space() {
        let lexicon = WordList(vec![]);
        let tokens = tokenize("one two", &lexicon);
        assert!(tokens[0].trailing_space);
        assert!(!tokens[1].trailing_space);
    }

    #[test]
    fn test_fallback_single_character_rules() {
        let lexicon = WordList(vec![]);
        let tokens = tokenize("42!", &lexicon);
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TokenKind::Digit, TokenKind::Digit, TokenKind::Symbol]
        );
    }

    #[test]
    fn test_run_accumulates_component_symbols() {
        let lexicon = WordList(vec![]);
        let tokens = tokenize("well-known words", &lexicon);
        assert_eq!(tokens[0].value, "well-known");
        assert_eq!(tokens[0].kind, TokenKind::Homogeneous);
        assert_eq!(tokens[1].value, "words");
    }

    #[test]
    fn test_run_stops_at_terminating_symbol() {
        let lexicon = WordList(vec![]);
        let tokens = tokenize("one,two", &lexicon);
        let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, vec!["one", ",", "two"]);
    }

    #[test]
    fn test_vocabulary_match_records_trailing_space() {
        let lexicon = WordList(vec!["cat"]);
        let tokens = tokenize("cat sat", &lexicon);
        assert_eq!(tokens[0].value, "cat");
        assert!(tokens[0].trailing_space);
    }
}
