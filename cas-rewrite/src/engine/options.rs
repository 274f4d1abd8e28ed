#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Budgets that bound the work done by an [`Engine`](super::Engine).
///
/// Running out of a budget is never an error. The engine stops where it is and returns the best
/// result it has.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineOptions {
    /// How many levels of a tree are visited by a reduction or a search. Nodes deeper than this
    /// are left as they are.
    ///
    /// The default value is `64`.
    pub max_depth: usize,

    /// How many rule applications one call to [`Engine::reduce`](super::Engine::reduce) may make.
    ///
    /// The default value is `10_000`.
    pub max_reduce_steps: usize,

    /// How many candidates one call to [`Engine::simplify`](super::Engine::simplify) may expand.
    ///
    /// The default value is `256`.
    pub max_search_steps: usize,

    /// How many forms [`Engine::simplify`](super::Engine::simplify) returns at most.
    ///
    /// The default value is `5`.
    pub width: usize,
}

/// The default options for an engine. Returns an [`EngineOptions`] with the following values:
///
/// - [`max_depth`](EngineOptions::max_depth): `64`
/// - [`max_reduce_steps`](EngineOptions::max_reduce_steps): `10_000`
/// - [`max_search_steps`](EngineOptions::max_search_steps): `256`
/// - [`width`](EngineOptions::width): `5`
impl Default for EngineOptions {
    fn default() -> EngineOptions {
        EngineOptions {
            max_depth: 64,
            max_reduce_steps: 10_000,
            max_search_steps: 256,
            width: 5,
        }
    }
}

impl EngineOptions {
    /// Set the maximum depth. Returns an updated [`EngineOptions`] for chaining.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the maximum number of rule applications per reduction. Returns an updated
    /// [`EngineOptions`] for chaining.
    pub fn max_reduce_steps(mut self, max_reduce_steps: usize) -> Self {
        self.max_reduce_steps = max_reduce_steps;
        self
    }

    /// Set the maximum number of expansions per search. Returns an updated [`EngineOptions`] for
    /// chaining.
    pub fn max_search_steps(mut self, max_search_steps: usize) -> Self {
        self.max_search_steps = max_search_steps;
        self
    }

    /// Set the number of forms a search returns. Returns an updated [`EngineOptions`] for
    /// chaining.
    pub fn width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn chaining() {
        let options = EngineOptions::default().max_depth(3).width(1);
        assert_eq!(options.max_depth, 3);
        assert_eq!(options.width, 1);
        assert_eq!(options.max_reduce_steps, 10_000);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip() {
        let options = EngineOptions::default().max_search_steps(12).width(2);
        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(serde_json::from_str::<EngineOptions>(&json).unwrap(), options);

        // missing fields take their default values
        let partial = serde_json::from_str::<EngineOptions>(r#"{"max_depth": 3}"#).unwrap();
        assert_eq!(partial, EngineOptions::default().max_depth(3));
    }
}
