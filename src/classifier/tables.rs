//! Keyword and pattern tables for the topic classifier
//!
//! Kept apart from the matching code so the tables can be reviewed, tested
//! and extended on their own. Bump [`TABLES_VERSION`] whenever an entry is
//! added, removed or reworded.

/// Version of the tables below
pub const TABLES_VERSION: u32 = 4;

/// Lowercase terms that signal a personal-finance topic.
///
/// Matched as plain substrings of the lowercased query padded with a space
/// on each side. Short abbreviations carry a leading space so they only
/// match at the start of a word.
pub const FINANCE_KEYWORDS: &[&str] = &[
    // Budgets & planning
    "budget", "saving", "savings", "financial", "finance", "net worth", "cash flow", "cashflow",
    // Spending
    "spend", "spent", "expense", "purchase", "paid", "payment", "bill", "refund",
    // Income
    "income", "salary", "earning", "credited",
    // Accounts
    "account", "balance", "bank", "deposit", "withdraw", "ifsc", "overdraft", "overdrawn",
    // Transactions
    "transaction", "transfer", "credit", "debit", " upi", "neft", "imps",
    // Money & currency
    "money", "cash", "rupee", " inr", "₹", "wallet",
    // Debt
    "loan", " emi", "debt", "mortgage", "interest rate",
    // Investments & tax
    "invest", "mutual fund", "insurance", "income tax", "taxes",
];

/// Lowercase terms that signal a non-finance domain or a prompt-injection
/// attempt.
pub const OFF_TOPIC_KEYWORDS: &[&str] = &[
    // Tech
    "python", "javascript", "java", "programming", "coding", "code", "software",
    "computer", "html", "algorithm", "compile",
    // Entertainment
    "joke", "movie", "film", "song", "music", "game", "netflix", "celebrity",
    "tv show", "anime", "poem", "tell me a story",
    // General knowledge
    "capital of", "president", "who invented", "history of", "planet", "universe",
    "translate",
    // Food
    "recipe", "cook", "bake", "ingredient", "pizza",
    // Health
    "doctor", "medicine", "symptom", "disease", "workout", "diet",
    // Weather
    "weather", "forecast", "temperature", "sunny",
    // Prompt injection
    "jailbreak", "developer mode", "dan mode", "unfiltered", "bypass",
];

/// A jailbreak regex with an optional exemption.
///
/// When `unless_followed_by` is set, a match only counts if the text after
/// it does not contain that term.
#[derive(Debug, Clone, Copy)]
pub struct JailbreakRule {
    pub pattern: &'static str,
    pub unless_followed_by: Option<&'static str>,
}

impl JailbreakRule {
    const fn always(pattern: &'static str) -> Self {
        Self {
            pattern,
            unless_followed_by: None,
        }
    }

    const fn unless(pattern: &'static str, term: &'static str) -> Self {
        Self {
            pattern,
            unless_followed_by: Some(term),
        }
    }
}

/// Instruction-override patterns, checked in order.
pub const JAILBREAK_RULES: &[JailbreakRule] = &[
    JailbreakRule::always(
        r"\bignore\s+(?:(?:all|any|your|my|the|previous|prior|above|earlier)\s+){1,3}instructions?\b",
    ),
    JailbreakRule::always(r"\bforget\s+(?:everything|all|previous|your)\b"),
    JailbreakRule::always(r"\bsystem\s+prompt\b"),
    JailbreakRule::always(r"\byour\s+prompt\b"),
    JailbreakRule::unless(r"\bact\s+as\b", "financ"),
    JailbreakRule::always(r"\bpretend\s+(?:to\s+be|you\s+are)\b"),
    JailbreakRule::unless(r"\byou\s+are\s+now\b", "financ"),
    JailbreakRule::always(r"\bnew\s+instructions?\b"),
    JailbreakRule::always(r"\bdisregard\b"),
    JailbreakRule::always(r"\boverride\b"),
];

/// Phrasings of finance questions that carry no finance keyword.
pub const FINANCE_QUESTION_PATTERNS: &[&str] = &[
    r"\bhow\s+much\b.*\b(?:spend|spent|spending|save|saved|earn|earned|owe|owed|balance|left)\b",
    r"\b(?:what|show)\b.*\b(?:expenses?|spending|income|budgets?|balances?|accounts?)\b",
    r"\b(?:total|sum|amount)\b.*\b(?:spent|expenses?|income)\b",
    r"\bcan\s+i\s+afford\b",
    r"\bwhere\b.*\b(?:money|spent|expenses?)\b",
];
