//! Topic Classifier
//!
//! Decides whether a user query is admitted to the finance model or answered
//! directly with a redirect message. Checks run in a fixed priority order and
//! the first one that decides wins:
//!
//! 1. jailbreak / instruction-override patterns → reject
//! 2. off-topic keywords with no finance keyword → reject
//! 3. any finance keyword → allow
//! 4. finance-question phrasing → allow
//! 5. fewer than three words → reject, ask for detail
//! 6. otherwise → allow, the model's own guardrails take over

pub mod tables;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use tables::{FINANCE_KEYWORDS, FINANCE_QUESTION_PATTERNS, JAILBREAK_RULES, OFF_TOPIC_KEYWORDS};

/// Reply for instruction-override attempts
pub const SCOPE_MESSAGE: &str = "I'm Your Finance Bro, your personal finance assistant. \
I can only help with questions about your own finances, such as your budget, spending, \
savings or accounts. How can I help you with your finances today?";

/// Reply for queries about other domains
pub const OFF_TOPIC_MESSAGE: &str = "I'm specifically designed to help with your personal \
finance questions. I can help you with:\n\
- Budgeting\n\
- Spending analysis\n\
- Savings goals\n\
- Account management\n\
- Financial planning\n\n\
What would you like to know about your finances?";

/// Reply for queries too short to judge
pub const NEED_DETAIL_MESSAGE: &str = "Could you tell me a bit more about what you'd like \
to know? I can help you with:\n\
- Budgeting\n\
- Spending analysis\n\
- Savings goals\n\
- Account management\n\
- Financial planning";

/// Queries with fewer words than this and no finance signal are rejected
const MIN_QUERY_TOKENS: usize = 3;

struct CompiledJailbreakRule {
    regex: Regex,
    unless_followed_by: Option<&'static str>,
}

lazy_static! {
    static ref JAILBREAK_REGEXES: Vec<CompiledJailbreakRule> = JAILBREAK_RULES
        .iter()
        .map(|rule| CompiledJailbreakRule {
            regex: Regex::new(rule.pattern).expect("jailbreak pattern must compile"),
            unless_followed_by: rule.unless_followed_by,
        })
        .collect();
    static ref FINANCE_QUESTION_REGEXES: Vec<Regex> = FINANCE_QUESTION_PATTERNS
        .iter()
        .map(|pattern| Regex::new(pattern).expect("finance pattern must compile"))
        .collect();
}

/// Which rule decided a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Jailbreak,
    OffTopic,
    FinanceKeyword,
    FinancePattern,
    TooShort,
    Default,
}

impl Verdict {
    pub fn is_allowed(self) -> bool {
        matches!(
            self,
            Verdict::FinanceKeyword | Verdict::FinancePattern | Verdict::Default
        )
    }

    /// Fixed user-facing reply for rejecting verdicts
    pub fn redirect_message(self) -> &'static str {
        match self {
            Verdict::Jailbreak => SCOPE_MESSAGE,
            Verdict::OffTopic => OFF_TOPIC_MESSAGE,
            Verdict::TooShort => NEED_DETAIL_MESSAGE,
            Verdict::FinanceKeyword | Verdict::FinancePattern | Verdict::Default => "",
        }
    }
}

/// Outcome of classifying one query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub is_allowed: bool,
    /// Empty when the query is allowed
    pub redirect_message: String,
    pub verdict: Verdict,
}

impl From<Verdict> for ClassificationResult {
    fn from(verdict: Verdict) -> Self {
        Self {
            is_allowed: verdict.is_allowed(),
            redirect_message: verdict.redirect_message().to_string(),
            verdict,
        }
    }
}

/// Topic classifier
pub struct TopicClassifier;

impl TopicClassifier {
    /// Classify a query as finance-related or not
    pub fn classify(query: &str) -> ClassificationResult {
        Self::verdict(query).into()
    }

    /// Run the priority checks and report the deciding rule
    pub fn verdict(query: &str) -> Verdict {
        let normalized = query.trim().to_lowercase();

        if is_jailbreak(&normalized) {
            return Verdict::Jailbreak;
        }

        // Padded so word-start entries also match at the very beginning
        let padded = format!(" {} ", normalized);
        let off_topic_count = count_keywords(&padded, OFF_TOPIC_KEYWORDS);
        let finance_count = count_keywords(&padded, FINANCE_KEYWORDS);

        if off_topic_count > 0 && finance_count == 0 {
            return Verdict::OffTopic;
        }

        if finance_count > 0 {
            return Verdict::FinanceKeyword;
        }

        if FINANCE_QUESTION_REGEXES
            .iter()
            .any(|re| re.is_match(&normalized))
        {
            return Verdict::FinancePattern;
        }

        if normalized.split_whitespace().count() < MIN_QUERY_TOKENS {
            return Verdict::TooShort;
        }

        Verdict::Default
    }
}

fn is_jailbreak(text: &str) -> bool {
    JAILBREAK_REGEXES.iter().any(|rule| {
        rule.regex.find_iter(text).any(|m| match rule.unless_followed_by {
            Some(term) => !text[m.end()..].contains(term),
            None => true,
        })
    })
}

/// Total substring occurrences of every keyword
fn count_keywords(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().map(|kw| text.matches(kw).count()).sum()
}
