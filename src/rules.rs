//! Rule engine. The active rule set is loaded pre-sorted (priority ASC,
//! id ASC) and compiled once per import/re-apply pass; evaluation is a
//! first-match-wins scan per transaction.

use regex::{Regex, RegexBuilder};
use rusqlite::Connection;

use crate::canonical::normalize_whitespace;
use crate::error::Result;
use crate::models::{AccountKind, MatchMode};
use crate::store;

enum Matcher {
    /// Pattern uppercased once; matched against the uppercased description.
    Contains(String),
    /// Compiled case-insensitively. An invalid pattern never matches.
    Regex(Option<Regex>),
}

struct CompiledRule {
    category_id: i64,
    institution_filter: Option<String>,
    matcher: Matcher,
}

pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Load and compile the active rules in evaluation order.
    pub fn load(conn: &Connection) -> Result<Self> {
        let rules = store::list_active_rules_ordered(conn)?
            .into_iter()
            .map(|rule| CompiledRule {
                category_id: rule.category_id,
                institution_filter: rule
                    .institution_filter
                    .map(|f| normalize_whitespace(&f).to_lowercase()),
                matcher: match rule.match_mode {
                    MatchMode::Contains => Matcher::Contains(rule.pattern.to_uppercase()),
                    MatchMode::Regex => Matcher::Regex(
                        RegexBuilder::new(&rule.pattern)
                            .case_insensitive(true)
                            .build()
                            .ok(),
                    ),
                },
            })
            .collect();
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Category assigned by the first matching rule, or None (uncategorized).
    pub fn evaluate(
        &self,
        description: &str,
        institution_label: &str,
        kind: AccountKind,
    ) -> Option<i64> {
        let desc_upper = description.to_uppercase();
        let label_lower = normalize_whitespace(institution_label).to_lowercase();
        for rule in &self.rules {
            if let Some(filter) = &rule.institution_filter {
                if *filter != label_lower && filter != kind.as_str() {
                    continue;
                }
            }
            let hit = match &rule.matcher {
                Matcher::Contains(pattern) => desc_upper.contains(pattern),
                Matcher::Regex(compiled) => {
                    compiled.as_ref().map(|re| re.is_match(description)).unwrap_or(false)
                }
            };
            if hit {
                return Some(rule.category_id);
            }
        }
        None
    }
}
