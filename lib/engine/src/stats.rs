use predx_core::{Token, TokenKind};

/// Per-section statistics fed to the predictor and context networks.
/// Computed once per section, never per token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionStats {
    pub sentence_length_mean: f32,
    pub sentence_length_stddev: f32,
    pub flesch_kincaid_grade: f32,
    pub sentence_count: f32,
}

impl SectionStats {
    #[must_use]
    pub fn from_section(text: &str, tokens: &[Token]) -> Self {
        Self {
            sentence_length_mean: sentence_length_mean(tokens),
            sentence_length_stddev: sentence_length_stddev(tokens),
            flesch_kincaid_grade: flesch_kincaid_grade(text),
            sentence_count: sentence_count(tokens) as f32,
        }
    }
}

fn ends_sentence(token: &Token) -> bool {
    token.kind == TokenKind::Symbol && matches!(token.value.as_str(), "." | "!" | "?")
}

/// Words per sentence, using terminating symbol tokens as sentence ends. A
/// trailing run without a terminator counts as a sentence.
#[must_use]
pub fn sentence_lengths(tokens: &[Token]) -> Vec<usize> {
    let mut lengths = Vec::new();
    let mut words_in_sentence = 0usize;

    for token in tokens {
        if ends_sentence(token) {
            lengths.push(words_in_sentence);
            words_in_sentence = 0;
        } else if token.kind != TokenKind::Symbol {
            words_in_sentence += 1;
        }
    }

    if words_in_sentence > 0 {
        lengths.push(words_in_sentence);
    }

    lengths
}

#[must_use]
pub fn sentence_count(tokens: &[Token]) -> usize {
    sentence_lengths(tokens).len()
}

#[must_use]
pub fn sentence_length_mean(tokens: &[Token]) -> f32 {
    let lengths = sentence_lengths(tokens);
    let total: usize = lengths.iter().sum();
    total as f32 / lengths.len().max(1) as f32
}

#[must_use]
pub fn sentence_length_stddev(tokens: &[Token]) -> f32 {
    let lengths = sentence_lengths(tokens);
    let mean = sentence_length_mean(tokens);
    let variance: f32 = lengths
        .iter()
        .map(|&length| {
            let deviation = length as f32 - mean;
            deviation * deviation
        })
        .sum::<f32>()
        / lengths.len().max(1) as f32;
    variance.sqrt()
}

/// Flesch-Kincaid grade level of raw text.
///
/// Sentences split on `.`/`!`/`?`, words are alphanumeric runs, and
/// syllables are estimated by counting vowels in words that do not end in
/// 'e'. Denominators are clamped so degenerate input stays finite.
#[must_use]
pub fn flesch_kincaid_grade(text: &str) -> f32 {
    let mut sentences = 0usize;
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if matches!(c, '.' | '!' | '?') {
            sentences += 1;
        }
        if c.is_alphanumeric() {
            current.push(c);
        } else if !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    let mut syllables = 0usize;
    for word in &words {
        if word.ends_with('e') || word.ends_with('E') {
            continue;
        }
        syllables += word
            .chars()
            .filter(|c| "aeiouyAEIOUY".contains(*c))
            .count();
    }

    let average_sentence_length = words.len() as f32 / sentences.max(1) as f32;
    let average_syllables_per_word = syllables as f32 / words.len().max(1) as f32;

    0.39 * average_sentence_length + 11.8 * average_syllables_per_word - 15.59
}

#[cfg(test)]
mod tests {
    use super::*;
    use predx_core::tokenize;

    struct EmptyLexicon;

    impl predx_core::Lexicon for EmptyLexicon {
        fn contains_word(&self, _candidate: &str) -> bool {
            false
        }

        fn longest_word_len(&self) -> usize {
            0
        }
    }

    #[test]
    fn test_sentence_lengths() {
        let tokens = tokenize("one two. three four five! six", &EmptyLexicon);
        assert_eq!(sentence_lengths(&tokens), vec![2, 3, 1]);
        assert_eq!(sentence_count(&tokens), 3);
        assert!((sentence_length_mean(&tokens) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_stddev_of_uniform_lengths_is_zero() {
        let tokens = tokenize("a b. c d. e f.", &EmptyLexicon);
        assert!(sentence_length_stddev(&tokens).abs() < 1e-6);
    }

    #[test]
    fn test_empty_input_is_finite() {
        let tokens: Vec<Token> = Vec::new();
        assert_eq!(sentence_length_mean(&tokens), 0.0);
        assert_eq!(sentence_length_stddev(&tokens), 0.0);
        assert!(flesch_kincaid_grade("").is_finite());
    }

    #[test]
    fn test_flesch_kincaid_is_finite_without_terminators() {
        let grade = flesch_kincaid_grade("words without any sentence marks");
        assert!(grade.is_finite());
    }

    #[test]
    fn test_stats_from_section() {
        let text = "The cat sat. The dog ran.";
        let tokens = tokenize(text, &EmptyLexicon);
        let stats = SectionStats::from_section(text, &tokens);
        assert!((stats.sentence_count - 2.0).abs() < 1e-6);
        assert!((stats.sentence_length_mean - 3.0).abs() < 1e-6);
        assert!(stats.flesch_kincaid_grade.is_finite());
    }
}
