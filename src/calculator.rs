//! The semantic calculator: the environment actions are evaluated in.
//!
//! A calculator has two tiers. The *memory* holds user bindings and is copied
//! on write, so a fork never disturbs its parent. The *dictionary* holds the
//! built-in operators and constants; it is frozen once the calculator is
//! built and its names can never be rebound. Lookups consult memory first,
//! then the dictionary, and fail otherwise. There is no fallback scope.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::OtherHasher;
use crate::action::Deferred;
use crate::backend::{Backend, Class, Entity, Instance, Property};
use crate::error::{AlreadyError, Result};

/// Memory slot holding the most recently bound value.
pub const ANAPHORA: &str = "@";

/// Built-in semantic functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Conjunction,
    Disjunction,
    ExclusiveDisjunction,
    Negation,
    SubsumedBy,
    Subsumes,
    StrictlySubsumedBy,
    StrictlySubsumes,
    EquivalentTo,
}

impl Operator {
    pub fn token(&self) -> &'static str {
        match self {
            Operator::Conjunction => "&",
            Operator::Disjunction => "|",
            Operator::ExclusiveDisjunction => "^",
            Operator::Negation => "~",
            Operator::SubsumedBy => "<=",
            Operator::Subsumes => ">=",
            Operator::StrictlySubsumedBy => "<",
            Operator::StrictlySubsumes => ">",
            Operator::EquivalentTo => "==",
        }
    }

    /// Applies the operator to already evaluated arguments.
    pub fn apply(&self, backend: &mut dyn Backend, args: &[Value]) -> Result<Value> {
        match self {
            Operator::Conjunction => Ok(Value::Class(backend.conjunction(&classes(args)?)?)),
            Operator::Disjunction => Ok(Value::Class(backend.disjunction(&classes(args)?)?)),
            Operator::ExclusiveDisjunction => {
                let operands = classes(args)?;
                let (first, rest) = operands.split_first().ok_or_else(|| arity(self, 1, 0))?;
                let mut acc = *first;
                for next in rest {
                    let not_next = backend.negation(*next)?;
                    let not_acc = backend.negation(acc)?;
                    let left = backend.conjunction(&[acc, not_next])?;
                    let right = backend.conjunction(&[not_acc, *next])?;
                    acc = backend.disjunction(&[left, right])?;
                }
                Ok(Value::Class(acc))
            }
            Operator::Negation => match args {
                [operand] => Ok(Value::Class(backend.negation(operand.as_class()?)?)),
                _ => Err(arity(self, 1, args.len())),
            },
            _ => match args {
                [left, right] => {
                    let (a, b) = (left.as_class()?, right.as_class()?);
                    Ok(Value::Boolean(self.compare(backend, a, b)?))
                }
                _ => Err(arity(self, 2, args.len())),
            },
        }
    }

    fn compare(&self, backend: &dyn Backend, a: Class, b: Class) -> Result<bool> {
        let holds = match self {
            Operator::SubsumedBy => backend.is_subsumed_by(a, b)?,
            Operator::Subsumes => backend.is_subsumed_by(b, a)?,
            Operator::StrictlySubsumedBy => {
                backend.is_subsumed_by(a, b)? && !backend.is_equivalent_to(a, b)?
            }
            Operator::StrictlySubsumes => {
                backend.is_subsumed_by(b, a)? && !backend.is_equivalent_to(a, b)?
            }
            Operator::EquivalentTo => backend.is_equivalent_to(a, b)?,
            _ => {
                return Err(AlreadyError::TypeMismatch {
                    expected: "a comparator".into(),
                    found: self.token().into(),
                });
            }
        };
        Ok(holds)
    }
}

fn classes(args: &[Value]) -> Result<Vec<Class>> {
    args.iter().map(Value::as_class).collect()
}

fn arity(operator: &Operator, expected: usize, found: usize) -> AlreadyError {
    AlreadyError::TypeMismatch {
        expected: format!("{} operand(s) for `{}`", expected, operator.token()),
        found: format!("{} operand(s)", found),
    }
}

/// An evaluated concept tuple: atomic bases and other expressions, each in
/// source order.
#[derive(Debug, Clone, Default)]
pub struct Tuple {
    pub bases: Vec<Value>,
    pub others: Vec<Value>,
}

/// Everything an action can evaluate to.
#[derive(Debug, Clone)]
pub enum Value {
    Class(Class),
    Instance(Instance),
    Property(Property),
    Boolean(bool),
    Mapping { domain: Class, range: Class },
    Tuple(Tuple),
    Deferred(Deferred),
    Operator(Operator),
    Nothing,
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Class(_) => "concept",
            Value::Instance(_) => "individual",
            Value::Property(_) => "relation",
            Value::Boolean(_) => "boolean",
            Value::Mapping { .. } => "mapping",
            Value::Tuple(_) => "concept tuple",
            Value::Deferred(_) => "unbound variable",
            Value::Operator(_) => "operator",
            Value::Nothing => "nothing",
        }
    }
    fn mismatch(&self, expected: &str) -> AlreadyError {
        AlreadyError::TypeMismatch {
            expected: expected.to_string(),
            found: self.kind().to_string(),
        }
    }
    pub fn as_class(&self) -> Result<Class> {
        match self {
            Value::Class(c) => Ok(*c),
            _ => Err(self.mismatch("concept")),
        }
    }
    pub fn as_instance(&self) -> Result<Instance> {
        match self {
            Value::Instance(i) => Ok(*i),
            _ => Err(self.mismatch("individual")),
        }
    }
    pub fn as_property(&self) -> Result<Property> {
        match self {
            Value::Property(p) => Ok(*p),
            _ => Err(self.mismatch("relation")),
        }
    }
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            _ => Err(self.mismatch("boolean")),
        }
    }
    pub fn as_operator(&self) -> Option<Operator> {
        match self {
            Value::Operator(o) => Some(*o),
            _ => None,
        }
    }
    /// The backend entity behind this value, if it is one.
    pub fn entity(&self) -> Option<Entity> {
        match self {
            Value::Class(c) => Some(Entity::Class(*c)),
            Value::Instance(i) => Some(Entity::Instance(*i)),
            Value::Property(p) => Some(Entity::Property(*p)),
            _ => None,
        }
    }
    /// Renders the value with entity names resolved by the backend.
    pub fn render(&self, backend: &dyn Backend) -> String {
        match self {
            Value::Class(_) | Value::Instance(_) | Value::Property(_) => match self.entity() {
                Some(entity) => backend.describe(entity),
                None => String::new(),
            },
            Value::Boolean(b) => b.to_string(),
            Value::Mapping { domain, range } => format!(
                "{} -> {}",
                backend.describe(Entity::Class(*domain)),
                backend.describe(Entity::Class(*range))
            ),
            Value::Tuple(tuple) => {
                let rendered: Vec<String> = tuple
                    .bases
                    .iter()
                    .chain(tuple.others.iter())
                    .map(|v| v.render(backend))
                    .collect();
                rendered.join(", ")
            }
            Value::Deferred(deferred) => deferred.to_string(),
            Value::Operator(o) => o.token().to_string(),
            Value::Nothing => String::new(),
        }
    }
}

impl PartialEq for Value {
    // deferred values never compare equal, not even to themselves
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Class(a), Value::Class(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => a == b,
            (Value::Property(a), Value::Property(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (
                Value::Mapping { domain: a, range: b },
                Value::Mapping { domain: c, range: d },
            ) => a == c && b == d,
            (Value::Tuple(a), Value::Tuple(b)) => a.bases == b.bases && a.others == b.others,
            (Value::Operator(a), Value::Operator(b)) => a == b,
            (Value::Nothing, Value::Nothing) => true,
            _ => false,
        }
    }
}

type Table = HashMap<String, Value, OtherHasher>;

/// The built-in tier. Construct it fully, then hand it to a [`Calculator`].
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: Table,
}

impl Dictionary {
    pub fn empty() -> Self {
        Self::default()
    }
    /// The default operators: `|`, `&`, `^`, `~`, `<=`, `>=` (also `=>`), `<`, `>` and `==`.
    pub fn builtin() -> Self {
        let mut dictionary = Self::empty();
        for operator in [
            Operator::Disjunction,
            Operator::Conjunction,
            Operator::ExclusiveDisjunction,
            Operator::Negation,
            Operator::SubsumedBy,
            Operator::Subsumes,
            Operator::StrictlySubsumedBy,
            Operator::StrictlySubsumes,
            Operator::EquivalentTo,
        ] {
            dictionary.entries.insert(operator.token().to_string(), Value::Operator(operator));
        }
        dictionary
            .entries
            .insert("=>".to_string(), Value::Operator(Operator::Subsumes));
        dictionary
    }
    pub fn with_constant(mut self, token: &str, value: Value) -> Self {
        self.entries.insert(token.to_string(), value);
        self
    }
    pub fn get(&self, token: &str) -> Option<&Value> {
        self.entries.get(token)
    }
    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone)]
pub struct Calculator {
    memory: Arc<Table>,
    dictionary: Arc<Dictionary>,
}

impl Calculator {
    pub fn new(dictionary: Dictionary) -> Self {
        Self {
            memory: Arc::new(Table::default()),
            dictionary: Arc::new(dictionary),
        }
    }
    /// Built-in operators plus `top_name` bound to the backend's top concept.
    pub fn for_backend(backend: &dyn Backend, top_name: &str) -> Self {
        Self::new(Dictionary::builtin().with_constant(top_name, Value::Class(backend.top())))
    }
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }
    pub fn memory(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.memory.iter().map(|(k, v)| (k.as_str(), v))
    }
    pub fn lookup(&self, name: &str) -> Result<Value> {
        self.memory
            .get(name)
            .or_else(|| self.dictionary.get(name))
            .cloned()
            .ok_or_else(|| AlreadyError::UnboundName(name.to_string()))
    }
    pub fn contains_name(&self, name: &str) -> bool {
        self.memory.contains_key(name) || self.dictionary.contains(name)
    }
    /// Fails if `name` belongs to the dictionary.
    pub fn assignable(&self, name: &str) -> Result<()> {
        if self.dictionary.contains(name) {
            Err(AlreadyError::ImmutableRebind(name.to_string()))
        } else {
            Ok(())
        }
    }
    /// Binds `name` and points the anaphora slot at the same value.
    pub fn bind(&mut self, name: &str, value: Value) -> Result<()> {
        self.assignable(name)?;
        debug!(name, kind = value.kind(), "bind");
        let memory = Arc::make_mut(&mut self.memory);
        memory.insert(name.to_string(), value.clone());
        memory.insert(ANAPHORA.to_string(), value);
        Ok(())
    }
    /// A copy of this calculator with one more binding; `self` is untouched.
    pub fn fork(&self, name: &str, value: Value) -> Result<Calculator> {
        let mut forked = self.clone();
        forked.bind(name, value)?;
        Ok(forked)
    }
    pub fn anaphora(&self) -> Option<&Value> {
        self.memory.get(ANAPHORA)
    }
    pub fn resolve_operator(&self, token: &str) -> Result<Operator> {
        match self.memory.get(token).or_else(|| self.dictionary.get(token)) {
            Some(value) => value.as_operator().ok_or_else(|| AlreadyError::TypeMismatch {
                expected: format!("an operator for `{}`", token),
                found: value.kind().to_string(),
            }),
            None => Err(AlreadyError::UnboundOperator(token.to_string())),
        }
    }
}

impl fmt::Debug for Calculator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut names: Vec<&str> = self.memory.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Calculator")
            .field("memory", &names)
            .field("dictionary", &self.dictionary.len())
            .finish()
    }
}
