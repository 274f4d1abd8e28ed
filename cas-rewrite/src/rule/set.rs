use cas_error::Error;
use crate::error::duplicate_rule_key;
use std::{collections::HashMap, rc::Rc};
use super::{Rule, RuleId, RuleInfo, Transform};

/// A rule registered in a [`RuleSet`].
#[derive(Debug)]
pub enum RuleEntry {
    /// A reduction rule.
    Reduce(Rule),

    /// A search rule.
    Transform(Transform),
}

impl RuleEntry {
    /// The key and description of the rule.
    pub fn info(&self) -> &RuleInfo {
        match self {
            Self::Reduce(rule) => rule.info(),
            Self::Transform(transform) => transform.info(),
        }
    }
}

/// The rules of an engine, each with a unique key and a dense [`RuleId`].
#[derive(Debug, Default)]
pub struct RuleSet {
    entries: Vec<RuleEntry>,
    keys: HashMap<Rc<str>, RuleId>,
}

impl RuleSet {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entry, returning an error if its key is taken.
    fn add(&mut self, entry: RuleEntry) -> Result<RuleId, Error> {
        let info = entry.info();
        if self.keys.contains_key(&info.key) {
            return Err(duplicate_rule_key(&info.key, &info.description));
        }

        let id = RuleId(self.entries.len() as u32);
        self.keys.insert(Rc::clone(&info.key), id);
        self.entries.push(entry);
        Ok(id)
    }

    /// Registers a reduction rule.
    pub fn add_rule(&mut self, rule: Rule) -> Result<RuleId, Error> {
        self.add(RuleEntry::Reduce(rule))
    }

    /// Registers a search rule.
    pub fn add_transform(&mut self, transform: Transform) -> Result<RuleId, Error> {
        self.add(RuleEntry::Transform(transform))
    }

    /// Returns the entry with the given id.
    pub fn get(&self, id: RuleId) -> Option<&RuleEntry> {
        self.entries.get(id.index())
    }

    /// Returns the reduction rule with the given id, if it is one.
    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        match self.get(id)? {
            RuleEntry::Reduce(rule) => Some(rule),
            RuleEntry::Transform(_) => None,
        }
    }

    /// Returns the search rule with the given id, if it is one.
    pub fn transform(&self, id: RuleId) -> Option<&Transform> {
        match self.get(id)? {
            RuleEntry::Transform(transform) => Some(transform),
            RuleEntry::Reduce(_) => None,
        }
    }

    /// Returns the id of the rule with the given key.
    pub fn id_of(&self, key: &str) -> Option<RuleId> {
        self.keys.get(key).copied()
    }

    /// Returns the number of rules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the rules in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (RuleId, &RuleEntry)> {
        self.entries.iter().enumerate().map(|(i, entry)| (RuleId(i as u32), entry))
    }
}

#[cfg(test)]
mod tests {
    use crate::{error::DuplicateRuleKey, matcher::{any, capture}, rule::Template};
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn ids_are_dense() {
        let mut set = RuleSet::new();
        let a = set.add_rule(Rule::new("a", "first", any(), Template::node(crate::Node::int(0))).unwrap()).unwrap();
        let b = set.add_rule(Rule::new("b", "second", capture("_x"), Template::capture("_x")).unwrap()).unwrap();
        assert_eq!((a.index(), b.index()), (0, 1));
        assert_eq!(set.id_of("b"), Some(b));
        assert!(set.rule(a).is_some());
        assert!(set.transform(a).is_none());
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut set = RuleSet::new();
        set.add_rule(Rule::new("same", "first", any(), Template::node(crate::Node::int(0))).unwrap()).unwrap();
        let err = set.add_rule(Rule::new("same", "second", any(), Template::node(crate::Node::int(1))).unwrap()).unwrap_err();
        assert_eq!(err.downcast_ref::<DuplicateRuleKey>().map(|kind| kind.key.as_str()), Some("same"));
        assert_eq!(set.len(), 1);
    }
}
