//! Free-text yes/no normalization for classifier responses.
//!
//! Classifier prompts ask the model to answer with a single token, but real
//! responses come back quoted, punctuated, or wrapped in extra words. This
//! module maps arbitrary generated text to a tri-state verdict. The mapping
//! is lenient: anything that is not recognizably negative counts as
//! affirmative, so an ambiguous response never blocks an otherwise valid
//! answer. That leniency is a policy choice, not a bug.

/// Normalized classifier verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Exact match of the affirmative token
    Affirmative,

    /// Exact or suffix match of the negative token
    Negative,

    /// Anything else; treated as affirmative by callers
    Ambiguous,
}

impl Verdict {
    /// Whether this verdict lets the gated item through.
    ///
    /// Only an explicit negative rejects.
    pub fn accepts(self) -> bool {
        !matches!(self, Verdict::Negative)
    }
}

/// Parse a raw model response into a verdict.
///
/// Quoting and trailing punctuation are stripped and the comparison is
/// case-insensitive. The affirmative token must match exactly; the negative
/// token matches exactly or as a suffix (models often answer with a short
/// phrase that ends in the token, e.g. "The answer is no").
pub fn parse_verdict(raw: &str, yes_token: &str, no_token: &str) -> Verdict {
    let cleaned = normalize(raw);
    let yes = yes_token.to_lowercase();
    let no = no_token.to_lowercase();

    if cleaned == yes {
        Verdict::Affirmative
    } else if cleaned == no || cleaned.ends_with(&no) {
        Verdict::Negative
    } else {
        Verdict::Ambiguous
    }
}

/// Strip quoting and trailing punctuation and fold case.
fn normalize(raw: &str) -> String {
    let without_quotes: String = raw
        .chars()
        .filter(|c| !matches!(c, '\'' | '"' | '`' | '«' | '»' | '“' | '”'))
        .collect();

    without_quotes
        .trim()
        .trim_end_matches(['.', '!', '?', ',', ':', ';', '*'])
        .trim_end()
        .to_lowercase()
}
