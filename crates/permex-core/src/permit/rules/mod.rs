//! Rule-based field extraction for transport permits.
//!
//! Each scalar field is described by one or more independent [`FieldRule`]s.
//! A [`RuleSet`] evaluates its rules in order over an immutable [`TextView`];
//! the first rule that yields a value for a field wins and later rules for the
//! same field are not consulted.

pub mod fields;
pub mod patterns;
pub mod plates;

use regex::Regex;
use tracing::{debug, trace};

use crate::models::permit::{Field, FieldRecord};

pub use fields::{default_rules, normalize_date, normalize_permit_number, normalize_place};
pub use plates::{PlateGrammar, PlateMatcher};

/// Which text a rule runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The whole document, line breaks preserved.
    Document,
    /// The header block only.
    Header,
}

/// Immutable text the rules are evaluated over.
#[derive(Debug, Clone, Copy)]
pub struct TextView<'a> {
    pub document: &'a str,
    pub header: &'a str,
}

impl<'a> TextView<'a> {
    pub fn new(document: &'a str, header: &'a str) -> Self {
        Self { document, header }
    }

    fn scoped(&self, scope: Scope) -> &'a str {
        match scope {
            Scope::Document => self.document,
            Scope::Header => self.header,
        }
    }
}

/// Cleans up a captured value; `None` rejects the match.
pub type Normalizer = fn(&str) -> Option<String>;

/// One extraction rule: where to look, what to match, which group to keep.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: Field,
    pub scope: Scope,
    pub pattern: Regex,
    pub group: usize,
    pub normalize: Normalizer,
}

impl FieldRule {
    /// Rule capturing group 1 of `pattern`.
    pub fn new(field: Field, scope: Scope, pattern: &Regex, normalize: Normalizer) -> Self {
        Self {
            field,
            scope,
            pattern: pattern.clone(),
            group: 1,
            normalize,
        }
    }

    /// Capture a different group.
    pub fn with_group(mut self, group: usize) -> Self {
        self.group = group;
        self
    }

    /// First match of this rule whose capture survives normalization.
    pub fn apply(&self, view: &TextView<'_>) -> Option<String> {
        self.pattern
            .captures_iter(view.scoped(self.scope))
            .filter_map(|caps| caps.get(self.group))
            .find_map(|m| (self.normalize)(m.as_str()))
    }
}

/// Ordered, appendable list of field rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<FieldRule>,
}

impl RuleSet {
    /// An empty rule set.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule; it runs after every rule already present.
    pub fn push(&mut self, rule: FieldRule) {
        self.rules.push(rule);
    }

    /// Builder form of [`RuleSet::push`].
    pub fn with_rule(mut self, rule: FieldRule) -> Self {
        self.push(rule);
        self
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Evaluate every rule; each field is populated at most once.
    pub fn extract(&self, view: &TextView<'_>) -> FieldRecord {
        let record = self.rules.iter().fold(FieldRecord::default(), |mut record, rule| {
            if record.contains(rule.field) {
                return record;
            }
            if let Some(value) = rule.apply(view) {
                trace!("{} <- {:?} via /{}/", rule.field, value, rule.pattern.as_str());
                record.insert_first(rule.field, value);
            }
            record
        });

        for field in record.missing() {
            debug!("No rule matched {}", field);
        }
        record
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn upper(s: &str) -> Option<String> {
        Some(s.to_uppercase())
    }

    fn reject(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_first_rule_wins() {
        let a = Regex::new(r"first=(\w+)").unwrap();
        let b = Regex::new(r"second=(\w+)").unwrap();
        let rules = RuleSet::empty()
            .with_rule(FieldRule::new(Field::ToPlace, Scope::Document, &a, upper))
            .with_rule(FieldRule::new(Field::ToPlace, Scope::Document, &b, upper));

        let record = rules.extract(&TextView::new("second=x first=y", ""));
        assert_eq!(record.get(Field::ToPlace), Some("Y"));
    }

    #[test]
    fn test_rejected_capture_falls_through() {
        let a = Regex::new(r"v=(\w+)").unwrap();
        let rules = RuleSet::empty()
            .with_rule(FieldRule::new(Field::FromPlace, Scope::Document, &a, reject))
            .with_rule(FieldRule::new(Field::FromPlace, Scope::Document, &a, upper));

        let record = rules.extract(&TextView::new("v=pécs", ""));
        assert_eq!(record.get(Field::FromPlace), Some("PÉCS"));
    }

    #[test]
    fn test_scope_limits_search() {
        let a = Regex::new(r"v=(\w+)").unwrap();
        let rules = RuleSet::empty()
            .with_rule(FieldRule::new(Field::FromPlace, Scope::Header, &a, upper));

        let record = rules.extract(&TextView::new("v=győr", "no value"));
        assert_eq!(record.get(Field::FromPlace), None);
    }

    #[test]
    fn test_with_group() {
        let a = Regex::new(r"(\w+)-(\w+)").unwrap();
        let rule = FieldRule::new(Field::ValidUntil, Scope::Document, &a, upper).with_group(2);
        assert_eq!(rule.apply(&TextView::new("ab-cd", "")), Some("CD".to_string()));
    }
}
