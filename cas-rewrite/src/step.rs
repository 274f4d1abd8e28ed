//! Recording the rules applied during a reduction.

use crate::node::Node;
use std::rc::Rc;

/// A type that collects the steps of an algorithm.
///
/// [`StepCollector`] is also implemented for the unit type `()`. This is useful when you don't
/// want to know the steps taken by the engine.
pub trait StepCollector<S> {
    /// Adds a step to the collector.
    fn push(&mut self, step: S);
}

impl<S> StepCollector<S> for () {
    #[inline]
    fn push(&mut self, _: S) {}
}

impl<S> StepCollector<S> for Vec<S> {
    #[inline]
    fn push(&mut self, step: S) {
        self.push(step);
    }
}

/// A single rule application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// The key of the rule that applied.
    pub rule: Rc<str>,

    /// The description of the rule that applied.
    pub description: Rc<str>,

    /// The node the rule was applied to.
    pub before: Node,

    /// The replacement the rule produced.
    pub after: Node,
}
