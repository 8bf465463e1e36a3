//! Declarations and definitions: the statements that mutate the backend.
//!
//! A declaration evaluates its right-hand side, creates a fresh entity in the
//! backend, attaches the remaining concepts as is-a edges and finally binds
//! the new name in the calculator. A definition differs in one respect only:
//! its right-hand side becomes an equivalence edge instead of an is-a edge.
//!
//! Names are checked against the dictionary before the backend is touched,
//! so a declaration that would shadow a built-in leaves no trace.

use tracing::debug;

use crate::action::{Action, Atom, ConceptTuple, Evaluate, MappingFormula};
use crate::backend::{Backend, Class, Entity, Property};
use crate::calculator::{Calculator, Value};
use crate::error::{AlreadyError, Result};

pub trait Create {
    /// Performs the backend mutation. `default` is the class used when the
    /// right-hand side names no atomic base.
    fn create(&self, calculator: &mut Calculator, backend: &mut dyn Backend, default: Class) -> Result<()>;
}

macro_rules! evaluate_by_creating {
    ($($declaration:ty),*) => {
        $(
            impl Evaluate for $declaration {
                fn eval(&self, calculator: &mut Calculator, backend: &mut dyn Backend) -> Result<Value> {
                    let top = backend.top();
                    self.create(calculator, backend, top)?;
                    Ok(Value::Nothing)
                }
            }
        )*
    };
}

// ------------- Declaration -------------
/// `! i : A, B, some R . C`
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    name: Atom,
    concepts: ConceptTuple,
}
impl Declaration {
    pub fn new(name: Atom, concepts: ConceptTuple) -> Self {
        Self { name, concepts }
    }
    pub fn name(&self) -> &Atom {
        &self.name
    }
    pub fn concepts(&self) -> &ConceptTuple {
        &self.concepts
    }
}
impl Create for Declaration {
    fn create(&self, calculator: &mut Calculator, backend: &mut dyn Backend, default: Class) -> Result<()> {
        let name = self.name.content();
        calculator.assignable(name)?;
        let tuple = self.concepts.evaluate(calculator, backend)?;
        let mut bases = tuple
            .bases
            .iter()
            .map(Value::as_class)
            .collect::<Result<Vec<_>>>()?;
        let others = tuple
            .others
            .iter()
            .map(Value::as_class)
            .collect::<Result<Vec<_>>>()?;
        let class = if bases.is_empty() { default } else { bases.remove(0) };
        let individual = backend.create_individual(name, class)?;
        for concept in bases.into_iter().chain(others) {
            backend.add_is_a(Entity::Instance(individual), concept)?;
        }
        debug!(name, "declared individual");
        calculator.bind(name, Value::Instance(individual))
    }
}

// ------------- ConceptDeclaration -------------
/// `! A :: B, C & D`
///
/// When every base is a relation (`! R :: S`), a sub-relation is declared
/// instead.
#[derive(Debug, Clone, PartialEq)]
pub struct ConceptDeclaration {
    name: Atom,
    concepts: ConceptTuple,
}
impl ConceptDeclaration {
    pub fn new(name: Atom, concepts: ConceptTuple) -> Self {
        Self { name, concepts }
    }
    pub fn name(&self) -> &Atom {
        &self.name
    }
    pub fn concepts(&self) -> &ConceptTuple {
        &self.concepts
    }
}
impl Create for ConceptDeclaration {
    fn create(&self, calculator: &mut Calculator, backend: &mut dyn Backend, default: Class) -> Result<()> {
        let name = self.name.content();
        calculator.assignable(name)?;
        let tuple = self.concepts.evaluate(calculator, backend)?;
        let relational = !tuple.bases.is_empty()
            && tuple.others.is_empty()
            && tuple.bases.iter().all(|b| matches!(b, Value::Property(_)));
        if relational {
            let bases = tuple
                .bases
                .iter()
                .map(Value::as_property)
                .collect::<Result<Vec<Property>>>()?;
            let relation = backend.create_relation(name, &bases)?;
            debug!(name, bases = bases.len(), "declared sub-relation");
            return calculator.bind(name, Value::Property(relation));
        }
        let mut bases = tuple
            .bases
            .iter()
            .map(Value::as_class)
            .collect::<Result<Vec<_>>>()?;
        let others = tuple
            .others
            .iter()
            .map(Value::as_class)
            .collect::<Result<Vec<_>>>()?;
        if bases.is_empty() {
            bases.push(default);
        }
        let class = backend.create_class(name, &bases)?;
        for concept in others {
            backend.add_is_a(Entity::Class(class), concept)?;
        }
        debug!(name, bases = bases.len(), "declared concept");
        calculator.bind(name, Value::Class(class))
    }
}

// ------------- RelationDeclaration -------------
/// `! R :: A -> B`
#[derive(Debug, Clone, PartialEq)]
pub struct RelationDeclaration {
    name: Atom,
    mapping: MappingFormula,
}
impl RelationDeclaration {
    pub fn new(name: Atom, mapping: MappingFormula) -> Self {
        Self { name, mapping }
    }
    pub fn name(&self) -> &Atom {
        &self.name
    }
    pub fn mapping(&self) -> &MappingFormula {
        &self.mapping
    }
}
impl Create for RelationDeclaration {
    fn create(&self, calculator: &mut Calculator, backend: &mut dyn Backend, _default: Class) -> Result<()> {
        let name = self.name.content();
        calculator.assignable(name)?;
        let mapping = self.mapping.eval(calculator, backend)?;
        let Value::Mapping { domain, range } = &mapping else {
            return Err(AlreadyError::TypeMismatch {
                expected: "mapping".into(),
                found: mapping.kind().into(),
            });
        };
        let relation = backend.create_relation(name, &[])?;
        backend.set_domain_range(relation, *domain, *range)?;
        debug!(name, "declared relation");
        calculator.bind(name, Value::Property(relation))
    }
}

// ------------- Definition -------------
/// `! D := A & some R . B`
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    name: Atom,
    concept: Box<Action>,
}
impl Definition {
    pub fn new(name: Atom, concept: Action) -> Self {
        Self {
            name,
            concept: Box::new(concept),
        }
    }
    pub fn name(&self) -> &Atom {
        &self.name
    }
    pub fn concept(&self) -> &Action {
        &self.concept
    }
}
impl Create for Definition {
    fn create(&self, calculator: &mut Calculator, backend: &mut dyn Backend, default: Class) -> Result<()> {
        let name = self.name.content();
        calculator.assignable(name)?;
        let concept = self.concept.eval(calculator, backend)?.as_class()?;
        let class = backend.create_class(name, &[default])?;
        backend.add_equivalence(Entity::Class(class), concept)?;
        debug!(name, "defined concept");
        calculator.bind(name, Value::Class(class))
    }
}

evaluate_by_creating!(Declaration, ConceptDeclaration, RelationDeclaration, Definition);
