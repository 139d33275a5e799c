//! Keyword fallback replies
//!
//! When the remote model is unreachable the assistant still answers, using
//! an ordered list of keyword rules. The first rule with a keyword present
//! in the message wins. Keywords match whole words or whole phrases, so
//! `"fd"` does not fire on `"feedback"`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ChatError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackRule {
    pub name: String,
    pub keywords: Vec<String>,
    pub reply: String,
}

impl FallbackRule {
    pub fn new(name: &str, keywords: &[&str], reply: &str) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            reply: reply.to_string(),
        }
    }

    /// First keyword found in an already-normalized message
    fn matched_keyword(&self, normalized: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|k| contains_phrase(normalized, k))
            .map(|k| k.as_str())
    }
}

/// A rule that can never fire because an earlier rule catches every
/// message it would match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowedRule {
    pub rule: String,
    pub shadowed_by: String,
}

/// Ordered rule list plus the reply used when nothing matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackRules {
    pub rules: Vec<FallbackRule>,
    pub default_reply: String,
}

/// Lowercase, replace punctuation with spaces, collapse runs of whitespace
/// and pad both ends with one space.
fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let words: Vec<&str> = cleaned.split_whitespace().collect();
    format!(" {} ", words.join(" "))
}

/// Whole-word or whole-phrase containment on a normalized haystack
fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    let needle = normalize(phrase);
    !needle.trim().is_empty() && normalized.contains(&needle)
}

impl FallbackRules {
    pub fn new(rules: Vec<FallbackRule>, default_reply: impl Into<String>) -> Self {
        Self {
            rules,
            default_reply: default_reply.into(),
        }
    }

    /// First rule matching `message`
    pub fn matching_rule(&self, message: &str) -> Option<&FallbackRule> {
        let normalized = normalize(message);
        self.rules.iter().find(|rule| {
            if let Some(keyword) = rule.matched_keyword(&normalized) {
                tracing::trace!(rule = %rule.name, keyword, "Fallback rule matched");
                true
            } else {
                false
            }
        })
    }

    /// Reply for `message`, the default reply when no rule matches
    pub fn reply_for(&self, message: &str) -> &str {
        self.matching_rule(message)
            .map(|rule| rule.reply.as_str())
            .unwrap_or(&self.default_reply)
    }

    /// Rules that an earlier rule makes unreachable.
    ///
    /// A later rule is shadowed when each of its keywords contains some
    /// keyword of one earlier rule as a whole word or phrase, because any
    /// message matching the later rule then matches the earlier one first.
    pub fn shadowed_rules(&self) -> Vec<ShadowedRule> {
        let mut shadowed = Vec::new();

        for (index, later) in self.rules.iter().enumerate() {
            if later.keywords.is_empty() {
                continue;
            }
            let earlier = self.rules[..index].iter().find(|earlier| {
                later.keywords.iter().all(|keyword| {
                    let keyword = normalize(keyword);
                    earlier.matched_keyword(&keyword).is_some()
                })
            });
            if let Some(earlier) = earlier {
                shadowed.push(ShadowedRule {
                    rule: later.name.clone(),
                    shadowed_by: earlier.name.clone(),
                });
            }
        }

        shadowed
    }

    fn validate(&self) -> Result<(), ChatError> {
        for rule in &self.rules {
            if rule.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(ChatError::Rules(format!("rule '{}' has no keywords", rule.name)));
            }
            if rule.reply.trim().is_empty() {
                return Err(ChatError::Rules(format!("rule '{}' has an empty reply", rule.name)));
            }
        }
        if self.default_reply.trim().is_empty() {
            return Err(ChatError::Rules("default reply is empty".to_string()));
        }
        Ok(())
    }

    /// Parse rules from YAML; shadowed rules are reported but allowed
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ChatError> {
        let rules: Self = serde_yaml::from_str(yaml).map_err(|e| ChatError::Rules(e.to_string()))?;
        rules.validate()?;

        for shadowed in rules.shadowed_rules() {
            tracing::warn!(
                rule = %shadowed.rule,
                shadowed_by = %shadowed.shadowed_by,
                "Fallback rule can never match"
            );
        }

        Ok(rules)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ChatError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ChatError::Rules(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&content)
    }
}

impl Default for FallbackRules {
    fn default() -> Self {
        Self::new(
            vec![
                FallbackRule::new(
                    "sip",
                    &["sip", "sips", "systematic investment"],
                    "A SIP (Systematic Investment Plan) invests a fixed amount every month. \
                     Regular investing averages out market ups and downs, and compounding \
                     does the heavy lifting over long periods. Try the SIP calculator to \
                     see how your monthly amount could grow.",
                ),
                FallbackRule::new(
                    "loan",
                    &["emi", "emis", "loan", "loans", "mortgage"],
                    "An EMI is the fixed monthly payment that repays a loan with interest. \
                     Early EMIs are mostly interest; later ones are mostly principal. The \
                     EMI calculator shows the full repayment schedule.",
                ),
                FallbackRule::new(
                    "fixed_deposit",
                    &["fd", "fds", "fixed deposit", "fixed deposits", "term deposit"],
                    "A fixed deposit locks a lump sum for a set tenure at a guaranteed rate, \
                     usually compounded quarterly. It suits money you need safe and on a \
                     known date. Use the FD calculator to compare tenures.",
                ),
                FallbackRule::new(
                    "tax",
                    &["tax", "taxes", "80c", "elss", "deduction", "itr"],
                    "Investments under Section 80C (ELSS, PPF, EPF, life insurance) reduce \
                     taxable income by up to ₹1.5 lakh under the old regime. The tax saver \
                     calculator shows how much you would save at your income.",
                ),
                FallbackRule::new(
                    "mutual_fund",
                    &["mutual fund", "mutual funds", "nav", "index fund", "index funds"],
                    "A mutual fund pools money from many investors into a managed portfolio. \
                     Check the expense ratio, the fund category and its long-term record \
                     rather than last year's returns.",
                ),
                FallbackRule::new(
                    "budget",
                    &[
                        "budget",
                        "budgeting",
                        "saving",
                        "savings",
                        "expense",
                        "expenses",
                        "emergency fund",
                    ],
                    "A simple starting point is the 50/30/20 rule: half of take-home pay for \
                     needs, 30% for wants and 20% for savings. Build an emergency fund of \
                     three to six months of expenses first.",
                ),
                FallbackRule::new(
                    "investing",
                    &[
                        "invest",
                        "investing",
                        "investment",
                        "investments",
                        "stock",
                        "stocks",
                        "returns",
                        "portfolio",
                    ],
                    "Match investments to goals: short-term money belongs in safer options \
                     like FDs, long-term goals can take more equity. Diversify and review \
                     once a year. The goal planner can help size monthly contributions.",
                ),
                FallbackRule::new(
                    "greeting",
                    &["hi", "hello", "hey", "namaste", "good morning", "good evening"],
                    "Hello! I can help with SIPs, fixed deposits, loans and EMIs, tax saving \
                     and budgeting. What would you like to know?",
                ),
            ],
            "I'm having trouble reaching the assistant right now. Meanwhile, the \
             calculators can answer most questions about SIPs, FDs, loans and tax \
             saving. Please try again in a moment.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_name(rules: &FallbackRules, message: &str) -> Option<String> {
        rules.matching_rule(message).map(|r| r.name.clone())
    }

    #[test]
    fn test_default_rules_have_no_shadowing() {
        assert_eq!(FallbackRules::default().shadowed_rules(), Vec::new());
    }

    #[test]
    fn test_whole_word_matching() {
        let rules = FallbackRules::default();
        assert_eq!(rule_name(&rules, "What is an FD?").as_deref(), Some("fixed_deposit"));
        assert_eq!(rule_name(&rules, "thanks for the feedback"), None);
        assert_eq!(rule_name(&rules, "which fund is this"), None);
        assert_eq!(
            rule_name(&rules, "Tell me about MUTUAL   funds!").as_deref(),
            Some("mutual_fund")
        );
    }

    #[test]
    fn test_first_match_wins() {
        let rules = FallbackRules::default();
        // Mentions both SIP and mutual funds; SIP is listed first
        assert_eq!(
            rule_name(&rules, "Should I start a SIP in mutual funds?").as_deref(),
            Some("sip")
        );
        // Tax comes before savings
        assert_eq!(rule_name(&rules, "tax savings ideas").as_deref(), Some("tax"));
        // Broad investing rule only catches what nothing specific did
        assert_eq!(rule_name(&rules, "is stock investing risky").as_deref(), Some("investing"));
        assert_eq!(rule_name(&rules, "hello, how do I invest").as_deref(), Some("investing"));
    }

    #[test]
    fn test_default_reply() {
        let rules = FallbackRules::default();
        assert_eq!(rules.reply_for("what's the weather"), rules.default_reply);
        assert_eq!(rules.reply_for(""), rules.default_reply);
    }

    #[test]
    fn test_detects_shadowed_rule() {
        let rules = FallbackRules::new(
            vec![
                FallbackRule::new("loan", &["loan"], "loan reply"),
                FallbackRule::new("home_loan", &["home loan", "housing loan"], "home reply"),
                FallbackRule::new("car", &["car loan", "vehicle"], "car reply"),
            ],
            "default",
        );
        let shadowed = rules.shadowed_rules();
        assert_eq!(
            shadowed,
            vec![ShadowedRule {
                rule: "home_loan".into(),
                shadowed_by: "loan".into(),
            }]
        );
        // "vehicle" keeps the car rule reachable
        assert_eq!(rules.reply_for("vehicle finance"), "car reply");
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
rules:
  - name: ppf
    keywords: ["ppf", "public provident fund"]
    reply: "PPF has a 15 year lock-in."
default_reply: "Sorry, try again later."
"#;
        let rules = FallbackRules::from_yaml_str(yaml).unwrap();
        assert_eq!(rules.reply_for("is PPF good?"), "PPF has a 15 year lock-in.");
        assert_eq!(rules.reply_for("hello"), "Sorry, try again later.");
    }

    #[test]
    fn test_from_yaml_rejects_empty_keywords() {
        let yaml = r#"
rules:
  - name: broken
    keywords: []
    reply: "never"
default_reply: "fallback"
"#;
        assert!(matches!(FallbackRules::from_yaml_str(yaml), Err(ChatError::Rules(_))));
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.yaml");
        std::fs::write(&path, serde_yaml::to_string(&FallbackRules::default()).unwrap()).unwrap();

        let loaded = FallbackRules::from_yaml_file(&path).unwrap();
        assert_eq!(loaded, FallbackRules::default());

        assert!(FallbackRules::from_yaml_file(dir.path().join("missing.yaml")).is_err());
    }
}
