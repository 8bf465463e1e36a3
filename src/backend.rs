//! The capability interface the evaluator drives.
//!
//! A backend stores classes, individuals and relations and answers membership,
//! subsumption and equivalence queries. The evaluator never looks inside the
//! handles it gets back; it only threads them through the action tree.

use std::fmt;

use thiserror::Error;

/// Identity of anything the backend keeps.
pub type Thing = u64;

macro_rules! handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(Thing);
        impl $name {
            pub fn new(thing: Thing) -> Self {
                Self(thing)
            }
            pub fn thing(&self) -> Thing {
                self.0
            }
        }
    };
}

handle!(
    /// A concept, named or built from other concepts.
    Class
);
handle!(
    /// A named individual.
    Instance
);
handle!(
    /// A named relation (role).
    Property
);

/// Anything that can receive an is-a or equivalence edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Class(Class),
    Instance(Instance),
    Property(Property),
}
impl Entity {
    pub fn thing(&self) -> Thing {
        match self {
            Entity::Class(c) => c.thing(),
            Entity::Instance(i) => i.thing(),
            Entity::Property(p) => p.thing(),
        }
    }
}

/// Bound kind of a cardinality restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cardinality {
    Min,
    Max,
    Exact,
}
impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let keyword = match self {
            Cardinality::Min => "more",
            Cardinality::Max => "less",
            Cardinality::Exact => "exact",
        };
        write!(f, "{}", keyword)
    }
}

/// Failure raised by a backend; passed to the caller unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Backend error: {0}")]
pub struct BackendError(pub String);

pub type BackendResult<T> = std::result::Result<T, BackendError>;

pub trait Backend {
    /// The top concept every class specialises.
    fn top(&self) -> Class;

    // creation and mutation
    fn create_class(&mut self, name: &str, bases: &[Class]) -> BackendResult<Class>;
    fn create_individual(&mut self, name: &str, class: Class) -> BackendResult<Instance>;
    fn create_relation(&mut self, name: &str, bases: &[Property]) -> BackendResult<Property>;
    fn add_is_a(&mut self, entity: Entity, concept: Class) -> BackendResult<()>;
    fn add_equivalence(&mut self, entity: Entity, concept: Class) -> BackendResult<()>;
    fn set_domain_range(&mut self, relation: Property, domain: Class, range: Class) -> BackendResult<()>;

    // concept builders
    fn conjunction(&mut self, concepts: &[Class]) -> BackendResult<Class>;
    fn disjunction(&mut self, concepts: &[Class]) -> BackendResult<Class>;
    fn negation(&mut self, concept: Class) -> BackendResult<Class>;
    fn one_of(&mut self, individuals: &[Instance]) -> BackendResult<Class>;
    fn restriction_some(&mut self, relation: Property, concept: Class) -> BackendResult<Class>;
    fn restriction_only(&mut self, relation: Property, concept: Class) -> BackendResult<Class>;
    fn restriction_cardinality(
        &mut self,
        relation: Property,
        kind: Cardinality,
        n: u32,
        concept: Class,
    ) -> BackendResult<Class>;

    // queries
    fn is_instance_of(&self, individual: Instance, concept: Class) -> BackendResult<bool>;
    fn is_subsumed_by(&self, a: Class, b: Class) -> BackendResult<bool>;
    fn is_equivalent_to(&self, a: Class, b: Class) -> BackendResult<bool>;

    /// A readable rendering of an entity, used when printing values.
    fn describe(&self, entity: Entity) -> String;
}
