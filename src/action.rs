//! Action nodes: the typed tree the parser produces.
//!
//! Every node evaluates against a [`Calculator`] and a [`Backend`]. Nodes own
//! their children, are immutable after parsing and may be evaluated any
//! number of times against different calculators. Declaration nodes live in
//! [`crate::declaration`].

use std::fmt;

use tracing::{debug, warn};

use crate::backend::{Backend, Cardinality, Class, Property};
use crate::calculator::{ANAPHORA, Calculator, Tuple, Value};
use crate::declaration::{ConceptDeclaration, Create, Declaration, Definition, RelationDeclaration};
use crate::error::{AlreadyError, Result};
use crate::naming::{Role, Vocabulary, variable_role};

pub trait Evaluate {
    fn eval(&self, calculator: &mut Calculator, backend: &mut dyn Backend) -> Result<Value>;
}

// ------------- Atom -------------
/// A name, checked against the role it is used in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    content: String,
}
impl Atom {
    pub fn new(content: &str, role: Role, vocabulary: &Vocabulary) -> Result<Self> {
        vocabulary.check(content, role)?;
        Ok(Self {
            content: content.to_string(),
        })
    }
    pub fn content(&self) -> &str {
        &self.content
    }
}
impl Evaluate for Atom {
    fn eval(&self, calculator: &mut Calculator, _backend: &mut dyn Backend) -> Result<Value> {
        calculator.lookup(&self.content)
    }
}
impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.content)
    }
}

// ------------- Variable -------------
/// `$x` ranges over individuals, `$X` over concepts; either may be typed
/// as in `$x:Person`.
///
/// Bound in the calculator, a variable evaluates to its binding. Unbound, it
/// evaluates to a [`Deferred`] value which, once applied to a candidate,
/// forks the captured calculator and evaluates the variable again there.
/// Concepts and formulas over an unbound variable defer in the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    name: String,
    ty: Option<Atom>,
    role: Role,
}
impl Variable {
    /// `base` is the name without its `$`.
    pub fn new(base: &str, ty: Option<&str>, vocabulary: &Vocabulary) -> Result<Self> {
        let role = variable_role(base);
        vocabulary.check(base, role)?;
        let ty = ty
            .map(|t| Atom::new(t, Role::Concept, vocabulary))
            .transpose()?;
        Ok(Self {
            name: format!("${}", base),
            ty,
            role,
        })
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn ty(&self) -> Option<&Atom> {
        self.ty.as_ref()
    }
    pub fn role(&self) -> Role {
        self.role
    }
    fn check_type(&self, value: &Value, calculator: &Calculator, backend: &dyn Backend) -> Result<()> {
        let Some(ty) = &self.ty else {
            return Ok(());
        };
        let class = calculator.lookup(ty.content())?.as_class()?;
        let fits = match self.role {
            Role::Individual => backend.is_instance_of(value.as_instance()?, class)?,
            _ => backend.is_subsumed_by(value.as_class()?, class)?,
        };
        if fits {
            Ok(())
        } else {
            Err(AlreadyError::TypeMismatch {
                expected: format!("{} of type {}", self.role, ty),
                found: value.render(backend),
            })
        }
    }
}
impl Evaluate for Variable {
    fn eval(&self, calculator: &mut Calculator, backend: &mut dyn Backend) -> Result<Value> {
        if !calculator.contains_name(&self.name) {
            return Ok(Value::Deferred(Deferred {
                variable: self.clone(),
                body: Box::new(Action::from(self.clone())),
                calculator: calculator.clone(),
            }));
        }
        let value = calculator.lookup(&self.name)?;
        self.check_type(&value, calculator, backend)?;
        Ok(value)
    }
}
impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.ty {
            Some(ty) => write!(f, "{}:{}", self.name, ty),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A function of one argument: the body waiting for its variable, together
/// with the calculator it was evaluated in.
#[derive(Debug, Clone)]
pub struct Deferred {
    variable: Variable,
    body: Box<Action>,
    calculator: Calculator,
}
impl Deferred {
    pub fn variable(&self) -> &Variable {
        &self.variable
    }
    pub fn body(&self) -> &Action {
        &self.body
    }
    /// Binds the variable to `value` in a fork of the captured calculator and
    /// evaluates the body there.
    pub fn apply(&self, backend: &mut dyn Backend, value: Value) -> Result<Value> {
        let mut forked = self.calculator.fork(self.variable.name(), value)?;
        self.body.eval(&mut forked, backend)
    }
    // the same pending variable, now awaited by the enclosing node
    fn over(&self, body: Action) -> Value {
        Value::Deferred(Deferred {
            variable: self.variable.clone(),
            body: Box::new(body),
            calculator: self.calculator.clone(),
        })
    }
}
impl fmt::Display for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.body.as_ref() {
            Action::IndividualVariable(v) | Action::ConceptVariable(v) if *v == self.variable => {
                write!(f, "\\{}", self.variable)
            }
            body => write!(f, "\\{}. {}", self.variable, body),
        }
    }
}

fn pending(values: &[Value]) -> Option<&Deferred> {
    values.iter().find_map(|v| match v {
        Value::Deferred(d) => Some(d),
        _ => None,
    })
}

// ------------- Quantifier -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantifier {
    Some,
    Only,
    AtLeast(u32),
    AtMost(u32),
    Exactly(u32),
}
impl Quantifier {
    /// The restriction builder this quantifier denotes for `relation`.
    pub fn builder(self, relation: Property) -> RestrictionBuilder {
        RestrictionBuilder {
            quantifier: self,
            relation,
        }
    }
}
impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Quantifier::Some => write!(f, "some"),
            Quantifier::Only => write!(f, "only"),
            Quantifier::AtLeast(n) => write!(f, "{} {}", Cardinality::Min, n),
            Quantifier::AtMost(n) => write!(f, "{} {}", Cardinality::Max, n),
            Quantifier::Exactly(n) => write!(f, "{} {}", Cardinality::Exact, n),
        }
    }
}

/// "some R", "only R", "more 2 R", ...: a function from concepts to concepts.
#[derive(Debug, Clone, Copy)]
pub struct RestrictionBuilder {
    quantifier: Quantifier,
    relation: Property,
}
impl RestrictionBuilder {
    pub fn apply(&self, backend: &mut dyn Backend, concept: Class) -> Result<Class> {
        let r = self.relation;
        let class = match self.quantifier {
            Quantifier::Some => backend.restriction_some(r, concept)?,
            Quantifier::Only => backend.restriction_only(r, concept)?,
            Quantifier::AtLeast(n) => backend.restriction_cardinality(r, Cardinality::Min, n, concept)?,
            Quantifier::AtMost(n) => backend.restriction_cardinality(r, Cardinality::Max, n, concept)?,
            Quantifier::Exactly(n) => backend.restriction_cardinality(r, Cardinality::Exact, n, concept)?,
        };
        Ok(class)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Restriction {
    pub quantifier: Quantifier,
    pub relation: Box<Action>,
    pub operand: Box<Action>,
}
impl Evaluate for Restriction {
    fn eval(&self, calculator: &mut Calculator, backend: &mut dyn Backend) -> Result<Value> {
        let relation = self.relation.eval(calculator, backend)?.as_property()?;
        let operand = self.operand.eval(calculator, backend)?;
        if let Value::Deferred(d) = &operand {
            return Ok(d.over(Action::Restriction(self.clone())));
        }
        let concept = operand.as_class()?;
        let builder = self.quantifier.builder(relation);
        Ok(Value::Class(builder.apply(backend, concept)?))
    }
}

// ------------- Connectives -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connective {
    And,
    Or,
    Xor,
}
impl Connective {
    pub fn token(&self) -> &'static str {
        match self {
            Connective::And => "&",
            Connective::Or => "|",
            Connective::Xor => "^",
        }
    }
}

// ------------- ConceptTuple -------------
/// The comma separated right-hand side of a declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConceptTuple {
    pub concepts: Vec<Action>,
}
impl ConceptTuple {
    pub fn new(concepts: Vec<Action>) -> Self {
        Self { concepts }
    }
    /// Atomic concepts become bases; everything else goes to `others`.
    pub fn evaluate(&self, calculator: &mut Calculator, backend: &mut dyn Backend) -> Result<Tuple> {
        let mut tuple = Tuple::default();
        for concept in &self.concepts {
            let value = concept.eval(calculator, backend)?;
            if matches!(concept, Action::Concept(_)) {
                tuple.bases.push(value);
            } else {
                tuple.others.push(value);
            }
        }
        Ok(tuple)
    }
}
impl Evaluate for ConceptTuple {
    fn eval(&self, calculator: &mut Calculator, backend: &mut dyn Backend) -> Result<Value> {
        Ok(Value::Tuple(self.evaluate(calculator, backend)?))
    }
}
impl fmt::Display for ConceptTuple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let concepts: Vec<String> = self.concepts.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", concepts.join(", "))
    }
}

// ------------- Formulas -------------
/// `i : C`
#[derive(Debug, Clone, PartialEq)]
pub struct ContainingFormula {
    pub individual: Box<Action>,
    pub concept: Box<Action>,
}
impl Evaluate for ContainingFormula {
    fn eval(&self, calculator: &mut Calculator, backend: &mut dyn Backend) -> Result<Value> {
        let operands = [
            self.individual.eval(calculator, backend)?,
            self.concept.eval(calculator, backend)?,
        ];
        if let Some(d) = pending(&operands) {
            return Ok(d.over(Action::ContainingFormula(self.clone())));
        }
        let individual = operands[0].as_instance()?;
        let concept = operands[1].as_class()?;
        Ok(Value::Boolean(backend.is_instance_of(individual, concept)?))
    }
}

/// `A <= B == C ...`: true iff every consecutive pair satisfies its comparator.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonFormula {
    operands: Vec<Action>,
    comparators: Vec<String>,
}
impl ComparisonFormula {
    pub fn new(first: Action, rest: Vec<(String, Action)>) -> Self {
        let mut operands = vec![first];
        let mut comparators = Vec::with_capacity(rest.len());
        for (comparator, operand) in rest {
            comparators.push(comparator);
            operands.push(operand);
        }
        Self { operands, comparators }
    }
    pub fn operands(&self) -> &[Action] {
        &self.operands
    }
    pub fn comparators(&self) -> &[String] {
        &self.comparators
    }
    /// Whether the chain mixes different comparators.
    pub fn is_hybrid(&self) -> bool {
        self.comparators.windows(2).any(|w| w[0] != w[1])
    }
}
impl Evaluate for ComparisonFormula {
    fn eval(&self, calculator: &mut Calculator, backend: &mut dyn Backend) -> Result<Value> {
        let mut values = Vec::with_capacity(self.operands.len());
        for operand in &self.operands {
            values.push(operand.eval(calculator, backend)?);
        }
        if let Some(d) = pending(&values) {
            return Ok(d.over(Action::ComparisonFormula(self.clone())));
        }
        for (pair, comparator) in values.windows(2).zip(&self.comparators) {
            let operator = calculator.resolve_operator(comparator)?;
            if !operator.apply(backend, pair)?.as_bool()? {
                return Ok(Value::Boolean(false));
            }
        }
        Ok(Value::Boolean(true))
    }
}

/// `A -> B`, the domain and range of a relation.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingFormula {
    pub domain: Box<Action>,
    pub range: Box<Action>,
}
impl Evaluate for MappingFormula {
    fn eval(&self, calculator: &mut Calculator, backend: &mut dyn Backend) -> Result<Value> {
        let domain = self.domain.eval(calculator, backend)?.as_class()?;
        let range = self.range.eval(calculator, backend)?.as_class()?;
        Ok(Value::Mapping { domain, range })
    }
}

// ------------- Action -------------
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Concept(Atom),
    Individual(Atom),
    IndividualSet(Vec<Atom>),
    Relation(Atom),
    IndividualVariable(Variable),
    ConceptVariable(Variable),
    Anaphora,
    Negation(Box<Action>),
    Restriction(Restriction),
    And(Vec<Action>),
    Or(Vec<Action>),
    Xor(Vec<Action>),
    ConceptTuple(ConceptTuple),
    Declaration(Declaration),
    ConceptDeclaration(ConceptDeclaration),
    RelationDeclaration(RelationDeclaration),
    Definition(Definition),
    ContainingFormula(ContainingFormula),
    ComparisonFormula(ComparisonFormula),
    MappingFormula(MappingFormula),
    StatementSequence(Vec<Action>),
}

impl From<Variable> for Action {
    fn from(variable: Variable) -> Self {
        match variable.role() {
            Role::Concept => Action::ConceptVariable(variable),
            _ => Action::IndividualVariable(variable),
        }
    }
}

impl Action {
    pub fn concept(name: &str, vocabulary: &Vocabulary) -> Result<Action> {
        Ok(Action::Concept(Atom::new(name, Role::Concept, vocabulary)?))
    }
    pub fn individual(name: &str, vocabulary: &Vocabulary) -> Result<Action> {
        Ok(Action::Individual(Atom::new(name, Role::Individual, vocabulary)?))
    }
    pub fn relation(name: &str, vocabulary: &Vocabulary) -> Result<Action> {
        Ok(Action::Relation(Atom::new(name, Role::Relation, vocabulary)?))
    }

    /// Joins `args` with a connective, splicing in operands that already use
    /// the same connective. A single operand is returned as is.
    pub fn connective(kind: Connective, args: Vec<Action>) -> Action {
        let mut flat = Vec::with_capacity(args.len());
        for arg in args {
            match (kind, arg) {
                (Connective::And, Action::And(inner))
                | (Connective::Or, Action::Or(inner))
                | (Connective::Xor, Action::Xor(inner)) => flat.extend(inner),
                (_, other) => flat.push(other),
            }
        }
        if flat.len() == 1 {
            return flat.remove(0);
        }
        match kind {
            Connective::And => Action::And(flat),
            Connective::Or => Action::Or(flat),
            Connective::Xor => Action::Xor(flat),
        }
    }

    /// The declaration behind this node, if it is one.
    pub fn as_create(&self) -> Option<&dyn Create> {
        match self {
            Action::Declaration(d) => Some(d),
            Action::ConceptDeclaration(d) => Some(d),
            Action::RelationDeclaration(d) => Some(d),
            Action::Definition(d) => Some(d),
            _ => None,
        }
    }

    pub fn statements(&self) -> &[Action] {
        match self {
            Action::StatementSequence(statements) => statements,
            other => std::slice::from_ref(other),
        }
    }

    pub fn depth(&self) -> usize {
        fn deepest(children: &[Action]) -> usize {
            children.iter().map(Action::depth).max().unwrap_or(0)
        }
        match self {
            Action::Concept(_)
            | Action::Individual(_)
            | Action::IndividualSet(_)
            | Action::Relation(_)
            | Action::IndividualVariable(_)
            | Action::ConceptVariable(_)
            | Action::Anaphora => 1,
            Action::Negation(operand) => 1 + operand.depth(),
            Action::Restriction(r) => 1 + r.operand.depth(),
            Action::And(args) | Action::Or(args) | Action::Xor(args) => 1 + deepest(args),
            Action::ConceptTuple(t) => 1 + deepest(&t.concepts),
            Action::Declaration(d) => 1 + deepest(&d.concepts().concepts),
            Action::ConceptDeclaration(d) => 1 + deepest(&d.concepts().concepts),
            Action::RelationDeclaration(d) => {
                1 + d.mapping().domain.depth().max(d.mapping().range.depth())
            }
            Action::Definition(d) => 1 + d.concept().depth(),
            Action::ContainingFormula(c) => 1 + c.individual.depth().max(c.concept.depth()),
            Action::ComparisonFormula(c) => 1 + deepest(c.operands()),
            Action::MappingFormula(m) => 1 + m.domain.depth().max(m.range.depth()),
            Action::StatementSequence(statements) => 1 + deepest(statements),
        }
    }

    // Binding strength when printed; lower binds tighter.
    fn precedence(&self) -> u8 {
        match self {
            Action::Negation(_) => 1,
            Action::Restriction(_) => 2,
            Action::And(_) => 3,
            Action::Or(_) => 4,
            Action::Xor(_) => 5,
            Action::Concept(_)
            | Action::Individual(_)
            | Action::IndividualSet(_)
            | Action::Relation(_)
            | Action::IndividualVariable(_)
            | Action::ConceptVariable(_)
            | Action::Anaphora => 0,
            _ => 6,
        }
    }

    fn wrapped(&self, loosest: u8) -> String {
        if self.precedence() > loosest {
            format!("({})", self)
        } else {
            self.to_string()
        }
    }
}

impl Evaluate for Action {
    fn eval(&self, calculator: &mut Calculator, backend: &mut dyn Backend) -> Result<Value> {
        match self {
            Action::Concept(atom) | Action::Individual(atom) | Action::Relation(atom) => {
                atom.eval(calculator, backend)
            }
            Action::IndividualSet(members) => {
                let mut individuals = Vec::with_capacity(members.len());
                for member in members {
                    individuals.push(member.eval(calculator, backend)?.as_instance()?);
                }
                Ok(Value::Class(backend.one_of(&individuals)?))
            }
            Action::IndividualVariable(variable) | Action::ConceptVariable(variable) => {
                variable.eval(calculator, backend)
            }
            Action::Anaphora => calculator.lookup(ANAPHORA),
            Action::Negation(operand) => {
                let operator = calculator.resolve_operator("~")?;
                let value = operand.eval(calculator, backend)?;
                if let Value::Deferred(d) = &value {
                    return Ok(d.over(self.clone()));
                }
                operator.apply(backend, &[value])
            }
            Action::Restriction(restriction) => restriction.eval(calculator, backend),
            Action::And(args) => apply_connective(Connective::And, args, calculator, backend),
            Action::Or(args) => apply_connective(Connective::Or, args, calculator, backend),
            Action::Xor(args) => apply_connective(Connective::Xor, args, calculator, backend),
            Action::ConceptTuple(tuple) => tuple.eval(calculator, backend),
            Action::Declaration(d) => d.eval(calculator, backend),
            Action::ConceptDeclaration(d) => d.eval(calculator, backend),
            Action::RelationDeclaration(d) => d.eval(calculator, backend),
            Action::Definition(d) => d.eval(calculator, backend),
            Action::ContainingFormula(f) => f.eval(calculator, backend),
            Action::ComparisonFormula(f) => f.eval(calculator, backend),
            Action::MappingFormula(f) => f.eval(calculator, backend),
            Action::StatementSequence(statements) => {
                let mut last = Value::Nothing;
                for (index, statement) in statements.iter().enumerate() {
                    debug!(index, statement = %statement, "evaluating statement");
                    last = statement
                        .eval(calculator, backend)
                        .inspect_err(|e| warn!(index, error = %e, "statement failed"))?;
                }
                Ok(last)
            }
        }
    }
}

// every operand is evaluated; backend combinators are not assumed to be lazy
fn apply_connective(
    kind: Connective,
    args: &[Action],
    calculator: &mut Calculator,
    backend: &mut dyn Backend,
) -> Result<Value> {
    let operator = calculator.resolve_operator(kind.token())?;
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(arg.eval(calculator, backend)?);
    }
    if let Some(d) = pending(&values) {
        return Ok(d.over(Action::connective(kind, args.to_vec())));
    }
    operator.apply(backend, &values)
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let joined = |args: &[Action], separator: &str, loosest: u8| {
            args.iter()
                .map(|a| a.wrapped(loosest))
                .collect::<Vec<_>>()
                .join(separator)
        };
        match self {
            Action::Concept(atom) | Action::Individual(atom) | Action::Relation(atom) => {
                write!(f, "{}", atom)
            }
            Action::IndividualSet(members) => {
                let names: Vec<&str> = members.iter().map(Atom::content).collect();
                write!(f, "{{{}}}", names.join(", "))
            }
            Action::IndividualVariable(v) | Action::ConceptVariable(v) => write!(f, "{}", v),
            Action::Anaphora => write!(f, "{}", ANAPHORA),
            Action::Negation(operand) => write!(f, "~{}", operand.wrapped(2)),
            Action::Restriction(r) => {
                write!(f, "{} {} . {}", r.quantifier, r.relation, r.operand.wrapped(2))
            }
            Action::And(args) => write!(f, "{}", joined(args, " & ", 2)),
            Action::Or(args) => write!(f, "{}", joined(args, " | ", 3)),
            Action::Xor(args) => write!(f, "{}", joined(args, " ^ ", 4)),
            Action::ConceptTuple(tuple) => write!(f, "{}", tuple),
            Action::Declaration(d) => write!(f, "! {} : {}", d.name(), d.concepts()),
            Action::ConceptDeclaration(d) => write!(f, "! {} :: {}", d.name(), d.concepts()),
            Action::RelationDeclaration(d) => write!(
                f,
                "! {} :: {} -> {}",
                d.name(),
                d.mapping().domain,
                d.mapping().range
            ),
            Action::Definition(d) => write!(f, "! {} := {}", d.name(), d.concept()),
            Action::ContainingFormula(c) => write!(f, "{} : {}", c.individual, c.concept),
            Action::ComparisonFormula(c) => {
                let mut operands = c.operands().iter();
                if let Some(first) = operands.next() {
                    write!(f, "{}", first)?;
                }
                for (comparator, operand) in c.comparators().iter().zip(operands) {
                    write!(f, " {} {}", comparator, operand)?;
                }
                Ok(())
            }
            Action::MappingFormula(m) => write!(f, "{} -> {}", m.domain, m.range),
            Action::StatementSequence(statements) => {
                let rendered: Vec<String> = statements.iter().map(|s| s.to_string()).collect();
                write!(f, "{}", rendered.join("; "))
            }
        }
    }
}
