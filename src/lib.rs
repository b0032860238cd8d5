//! Forward-chaining dependency-vulnerability audit engine.
//!
//! `Engine` wires the rule store (`rules`), matcher (`matcher`), and
//! memoized explorer (`explorer`) into the three public operations an
//! external caller needs: `matching`, `explore`, `expand`.

pub mod broadcaster;
pub mod bundle;
pub mod condition;
pub mod error;
pub mod explorer;
pub mod matcher;
pub mod operators;
pub mod range;
pub mod requirements;
pub mod rules;
pub mod value;
pub mod version;

use explorer::{Explorer, Path};
use rules::{Rule, RuleStore};
use std::path::Path as FsPath;
use std::rc::Rc;
use value::Facts;

pub use error::EngineError;

/// Owns a loaded rule store and its explorer's memoization state.
pub struct Engine {
    store: Rc<RuleStore>,
    explorer: Explorer,
}

impl Engine {
    pub fn new(store: RuleStore) -> Engine {
        let store = Rc::new(store);
        Engine {
            store: Rc::clone(&store),
            explorer: Explorer::new(store),
        }
    }

    /// Load a rule bundle from disk and build an engine around it.
    pub fn load(path: impl AsRef<FsPath>) -> Result<Engine, EngineError> {
        Ok(Engine::new(bundle::load(path)?))
    }

    /// Rules currently applicable to `facts`.
    pub fn matching<'a>(&'a self, facts: &'a Facts) -> impl Iterator<Item = Rule> + 'a {
        matcher::matching(&self.store, facts)
    }

    /// Every path from `facts` to `goal`.
    pub fn explore(&self, facts: &Facts, goal: &Facts) -> Vec<Path> {
        self.explorer.explore(facts, goal)
    }

    /// Known versions of `name` satisfying `constraints`.
    pub fn expand<'a>(&'a self, name: &str, constraints: &'a [(String, String)]) -> impl Iterator<Item = String> + 'a {
        broadcaster::expand(&self.store, name, constraints)
    }

    /// Drop every memoized explorer path.
    pub fn clear_cache(&self) {
        self.explorer.clear_cache();
    }
}
