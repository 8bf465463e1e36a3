//! Identifier roles, case conventions and the reserved-word vocabulary.
//!
//! The grammar accepts any identifier shape in any name position; whether a
//! name fits its position is decided here, when the action node is built.
//! Concepts and relations start with an uppercase letter, individuals with a
//! lowercase one (leading underscores are skipped for individuals).

use std::collections::HashSet;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::OtherHasher;
use crate::error::{AlreadyError, Result};

lazy_static! {
    static ref CONCEPT_NAME: Regex = Regex::new(r"^[A-Z][A-Za-z0-9_]*$").unwrap();
    static ref INDIVIDUAL_NAME: Regex = Regex::new(r"^_*[a-z][A-Za-z0-9_]*$").unwrap();
}

/// Words that the grammar itself uses; none of them may name anything.
pub const DEFAULT_RESERVED_WORDS: [&str; 6] = ["some", "only", "more", "less", "exact", "equal"];

/// The position a name occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Concept,
    Individual,
    Relation,
}
impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let role = match self {
            Role::Concept => "concept",
            Role::Individual => "individual",
            Role::Relation => "relation",
        };
        write!(f, "{}", role)
    }
}

/// The reserved-word set, injected from configuration.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    reserved: HashSet<String, OtherHasher>,
}
impl Vocabulary {
    pub fn new<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reserved: reserved.into_iter().map(Into::into).collect(),
        }
    }
    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }
    pub fn len(&self) -> usize {
        self.reserved.len()
    }
    pub fn is_empty(&self) -> bool {
        self.reserved.is_empty()
    }
    /// Rejects reserved words first, then names that break the case rule of `role`.
    pub fn check(&self, name: &str, role: Role) -> Result<()> {
        let base = name.strip_prefix('$').unwrap_or(name);
        if self.is_reserved(base) {
            return Err(AlreadyError::ReservedWord { name: name.to_string() });
        }
        if conforms(name, role) {
            Ok(())
        } else {
            Err(AlreadyError::NamingConvention { name: name.to_string(), role })
        }
    }
}
impl Default for Vocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_RESERVED_WORDS)
    }
}

/// The role a `$` variable ranges over: `$Name` ranges over concepts,
/// `$name` over individuals.
pub fn variable_role(base: &str) -> Role {
    match base.trim_start_matches('_').chars().next() {
        Some(c) if c.is_ascii_uppercase() => Role::Concept,
        _ => Role::Individual,
    }
}

/// Case rule only; reserved words are not consulted.
pub fn conforms(name: &str, role: Role) -> bool {
    match role {
        Role::Concept | Role::Relation => CONCEPT_NAME.is_match(name),
        Role::Individual => INDIVIDUAL_NAME.is_match(name),
    }
}
