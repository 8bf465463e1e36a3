//! An in-memory backend with structural, told-only reasoning.
//!
//! Named classes, individuals and relations are kept once per name. Class
//! expressions are kept by a keeper that guarantees their uniqueness, so that
//! building `A & B` twice (or `B & A`) hands out the same [`Class`].
//!
//! Reasoning follows told axioms only: is-a and equivalence edges, the
//! structure of class expressions and the relation hierarchy. It is sound for
//! what it answers `true` to, but makes no attempt at completeness.

use std::collections::HashMap;
use std::fmt;

use bimap::BiMap;
use roaring::RoaringTreemap;
use tracing::debug;

use crate::backend::{
    Backend, BackendError, BackendResult, Cardinality, Class, Entity, Instance, Property, Thing,
};
use crate::{OtherHasher, ThingHasher};

pub const GENESIS: Thing = 0;

#[derive(Debug)]
pub struct ThingGenerator {
    lower_bound: Thing,
}
impl ThingGenerator {
    pub fn new() -> Self {
        Self { lower_bound: GENESIS }
    }
    pub fn generate(&mut self) -> Thing {
        self.lower_bound += 1;
        self.lower_bound
    }
}
impl Default for ThingGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// ------------- Expression -------------
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    Named(String),
    And(Vec<Class>),
    Or(Vec<Class>),
    Not(Class),
    OneOf(Vec<Instance>),
    Exists(Property, Class),
    ForAll(Property, Class),
    Count(Property, Cardinality, u32, Class),
}

#[derive(Debug, Default)]
pub struct Axioms {
    is_a: Vec<Class>,
    equivalent_to: Vec<Class>,
}
impl Axioms {
    pub fn is_a(&self) -> &[Class] {
        &self.is_a
    }
    pub fn equivalent_to(&self) -> &[Class] {
        &self.equivalent_to
    }
    fn told(&self) -> impl Iterator<Item = &Class> {
        self.is_a.iter().chain(self.equivalent_to.iter())
    }
}

#[derive(Debug)]
pub struct ClassKeeper {
    kept: BiMap<Expression, Class>,
    axioms: HashMap<Class, Axioms, ThingHasher>,
}
impl ClassKeeper {
    pub fn new() -> Self {
        Self {
            kept: BiMap::new(),
            axioms: HashMap::default(),
        }
    }
    pub fn keep(&mut self, expression: Expression, generator: &mut ThingGenerator) -> (Class, bool) {
        if let Some(class) = self.kept.get_by_left(&expression) {
            return (*class, true);
        }
        let class = Class::new(generator.generate());
        self.kept.insert(expression, class);
        (class, false)
    }
    pub fn expression(&self, class: Class) -> Option<&Expression> {
        self.kept.get_by_right(&class)
    }
    pub fn named(&self, name: &str) -> Option<Class> {
        self.kept
            .get_by_left(&Expression::Named(name.to_string()))
            .copied()
    }
    pub fn axioms(&self, class: Class) -> Option<&Axioms> {
        self.axioms.get(&class)
    }
    fn axioms_mut(&mut self, class: Class) -> &mut Axioms {
        self.axioms.entry(class).or_default()
    }
}
impl Default for ClassKeeper {
    fn default() -> Self {
        Self::new()
    }
}

type Memo = HashMap<(Thing, Thing), bool, OtherHasher>;

// ------------- Ontology -------------
#[derive(Debug)]
pub struct Ontology {
    generator: ThingGenerator,
    classes: ClassKeeper,
    instances: BiMap<String, Instance>,
    types: HashMap<Instance, Vec<Class>, ThingHasher>,
    properties: BiMap<String, Property>,
    super_properties: HashMap<Property, Vec<Property>, ThingHasher>,
    domain_range: HashMap<Property, (Class, Class), ThingHasher>,
    top: Class,
}

impl Ontology {
    pub fn new(top_name: &str) -> Self {
        let mut generator = ThingGenerator::new();
        let mut classes = ClassKeeper::new();
        let (top, _) = classes.keep(Expression::Named(top_name.to_string()), &mut generator);
        Self {
            generator,
            classes,
            instances: BiMap::new(),
            types: HashMap::default(),
            properties: BiMap::new(),
            super_properties: HashMap::default(),
            domain_range: HashMap::default(),
            top,
        }
    }
    pub fn class_named(&self, name: &str) -> Option<Class> {
        self.classes.named(name)
    }
    pub fn individual_named(&self, name: &str) -> Option<Instance> {
        self.instances.get_by_left(name).copied()
    }
    pub fn relation_named(&self, name: &str) -> Option<Property> {
        self.properties.get_by_left(name).copied()
    }
    pub fn expression(&self, class: Class) -> Option<&Expression> {
        self.classes.expression(class)
    }
    pub fn axioms(&self, class: Class) -> Option<&Axioms> {
        self.classes.axioms(class)
    }
    pub fn types(&self, individual: Instance) -> &[Class] {
        self.types.get(&individual).map(Vec::as_slice).unwrap_or(&[])
    }
    pub fn super_relations(&self, relation: Property) -> &[Property] {
        self.super_properties
            .get(&relation)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
    pub fn domain_range(&self, relation: Property) -> Option<(Class, Class)> {
        self.domain_range.get(&relation).copied()
    }
    pub fn class_count(&self) -> usize {
        self.classes.kept.len()
    }
    pub fn individual_count(&self) -> usize {
        self.instances.len()
    }

    /// Told ancestors of a class: everything reachable over is-a and
    /// equivalence edges, excluding the class itself unless it sits on a cycle.
    pub fn ancestors(&self, class: Class) -> RoaringTreemap {
        let mut reached = RoaringTreemap::new();
        let mut pending = vec![class];
        while let Some(current) = pending.pop() {
            if let Some(axioms) = self.classes.axioms(current) {
                for parent in axioms.told() {
                    if reached.insert(parent.thing()) {
                        pending.push(*parent);
                    }
                }
            }
        }
        reached
    }

    /// Whether `relation` is `other` or one of its told sub-relations.
    pub fn is_sub_relation(&self, relation: Property, other: Property) -> bool {
        let mut visited = Vec::new();
        let mut pending = vec![relation];
        while let Some(current) = pending.pop() {
            if current == other {
                return true;
            }
            if visited.contains(&current) {
                continue;
            }
            visited.push(current);
            pending.extend(self.super_relations(current).iter().copied());
        }
        false
    }

    fn is_known(&self, name: &str) -> bool {
        self.classes.named(name).is_some()
            || self.instances.contains_left(name)
            || self.properties.contains_left(name)
    }
    fn fresh(&self, name: &str) -> BackendResult<()> {
        if self.is_known(name) {
            Err(BackendError(format!("`{}` already exists", name)))
        } else {
            Ok(())
        }
    }
    fn known_class(&self, class: Class) -> BackendResult<Class> {
        match self.classes.expression(class) {
            Some(_) => Ok(class),
            None => Err(BackendError(format!("unknown class #{}", class.thing()))),
        }
    }
    fn known_instance(&self, individual: Instance) -> BackendResult<Instance> {
        match self.instances.get_by_right(&individual) {
            Some(_) => Ok(individual),
            None => Err(BackendError(format!("unknown individual #{}", individual.thing()))),
        }
    }
    fn known_property(&self, relation: Property) -> BackendResult<Property> {
        match self.properties.get_by_right(&relation) {
            Some(_) => Ok(relation),
            None => Err(BackendError(format!("unknown relation #{}", relation.thing()))),
        }
    }

    // Splices nested operands of the same connective and sorts the rest,
    // so that equal expressions are kept only once.
    fn flatten(&self, concepts: &[Class], conjunctive: bool) -> BackendResult<Vec<Class>> {
        let mut flat = Vec::with_capacity(concepts.len());
        for concept in concepts {
            match (self.classes.expression(*concept), conjunctive) {
                (Some(Expression::And(inner)), true) | (Some(Expression::Or(inner)), false) => {
                    flat.extend(inner.iter().copied())
                }
                (Some(_), _) => flat.push(*concept),
                (None, _) => return Err(BackendError(format!("unknown class #{}", concept.thing()))),
            }
        }
        flat.sort_unstable();
        flat.dedup();
        Ok(flat)
    }
    fn connective(&mut self, concepts: &[Class], conjunctive: bool) -> BackendResult<Class> {
        let mut flat = self.flatten(concepts, conjunctive)?;
        match flat.len() {
            0 => Err(BackendError("a connective needs at least one operand".into())),
            1 => Ok(flat.remove(0)),
            _ => {
                let expression = if conjunctive {
                    Expression::And(flat)
                } else {
                    Expression::Or(flat)
                };
                Ok(self.classes.keep(expression, &mut self.generator).0)
            }
        }
    }
    fn build(&mut self, expression: Expression) -> Class {
        let (class, previously_kept) = self.classes.keep(expression, &mut self.generator);
        if !previously_kept {
            debug!(class = class.thing(), "kept class expression");
        }
        class
    }

    fn subsumed(&self, c: Class, d: Class, memo: &mut Memo) -> bool {
        if c == d || d == self.top {
            return true;
        }
        let key = (c.thing(), d.thing());
        if let Some(known) = memo.get(&key) {
            return *known;
        }
        // in progress: a cycle back to this pair does not prove anything
        memo.insert(key, false);
        let result = self.decide(c, d, memo);
        memo.insert(key, result);
        result
    }

    fn decide(&self, c: Class, d: Class, memo: &mut Memo) -> bool {
        let left = self.classes.expression(c);
        let right = self.classes.expression(d);
        if let Some(Expression::And(ds)) = right {
            return ds.iter().all(|x| self.subsumed(c, *x, memo));
        }
        match left {
            Some(Expression::Or(cs)) => return cs.iter().all(|x| self.subsumed(*x, d, memo)),
            Some(Expression::OneOf(is)) => return is.iter().all(|i| self.member(*i, d, memo)),
            Some(Expression::And(cs)) if cs.iter().any(|x| self.subsumed(*x, d, memo)) => {
                return true;
            }
            _ => (),
        }
        if let Some(Expression::Or(ds)) = right {
            if ds.iter().any(|x| self.subsumed(c, *x, memo)) {
                return true;
            }
        }
        if let (Some(l), Some(r)) = (left, right) {
            if self.structurally_subsumed(l, r, memo) {
                return true;
            }
        }
        if self.ancestors(c).contains(d.thing()) {
            return true;
        }
        if let Some(axioms) = self.classes.axioms(c) {
            if axioms.told().any(|p| self.subsumed(*p, d, memo)) {
                return true;
            }
        }
        // definitions of the subsumer
        match self.classes.axioms(d) {
            Some(axioms) => axioms
                .equivalent_to()
                .iter()
                .any(|e| self.subsumed(c, *e, memo)),
            None => false,
        }
    }

    fn structurally_subsumed(&self, left: &Expression, right: &Expression, memo: &mut Memo) -> bool {
        use Cardinality::{Exact, Max, Min};
        match (left, right) {
            (Expression::Not(x), Expression::Not(y)) => self.subsumed(*y, *x, memo),
            (Expression::Exists(r, x), Expression::Exists(s, y)) => {
                self.is_sub_relation(*r, *s) && self.subsumed(*x, *y, memo)
            }
            (Expression::ForAll(r, x), Expression::ForAll(s, y)) => {
                self.is_sub_relation(*s, *r) && self.subsumed(*x, *y, memo)
            }
            (Expression::Count(r, k, n, x), Expression::Count(s, l, m, y)) => match (k, l) {
                (Exact, Exact) => n == m && r == s && x == y,
                (Min | Exact, Min) => n >= m && self.is_sub_relation(*r, *s) && self.subsumed(*x, *y, memo),
                (Max | Exact, Max) => n <= m && self.is_sub_relation(*s, *r) && self.subsumed(*y, *x, memo),
                _ => false,
            },
            (Expression::Count(r, Min | Exact, n, x), Expression::Exists(s, y)) => {
                *n >= 1 && self.is_sub_relation(*r, *s) && self.subsumed(*x, *y, memo)
            }
            (Expression::Exists(r, x), Expression::Count(s, Min, m, y)) => {
                *m <= 1 && self.is_sub_relation(*r, *s) && self.subsumed(*x, *y, memo)
            }
            _ => false,
        }
    }

    fn member(&self, individual: Instance, d: Class, memo: &mut Memo) -> bool {
        if d == self.top {
            return true;
        }
        match self.classes.expression(d) {
            Some(Expression::OneOf(is)) => return is.contains(&individual),
            Some(Expression::And(ds)) => return ds.iter().all(|x| self.member(individual, *x, memo)),
            Some(Expression::Or(ds)) if ds.iter().any(|x| self.member(individual, *x, memo)) => {
                return true;
            }
            _ => (),
        }
        let key = (individual.thing(), d.thing());
        if let Some(known) = memo.get(&key) {
            return *known;
        }
        memo.insert(key, false);
        let result = self.types(individual).iter().any(|t| self.subsumed(*t, d, memo))
            || self.classes.axioms(d).is_some_and(|axioms| {
                axioms
                    .equivalent_to()
                    .iter()
                    .any(|e| self.member(individual, *e, memo))
            });
        memo.insert(key, result);
        result
    }

    fn render(&self, class: Class) -> String {
        match self.classes.expression(class) {
            Some(expression) => Rendered { ontology: self, expression }.to_string(),
            None => format!("#{}", class.thing()),
        }
    }
}
impl Default for Ontology {
    fn default() -> Self {
        Self::new("Thing")
    }
}

struct Rendered<'o> {
    ontology: &'o Ontology,
    expression: &'o Expression,
}
impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let o = self.ontology;
        let join = |classes: &[Class], separator: &str| {
            classes
                .iter()
                .map(|c| o.render(*c))
                .collect::<Vec<_>>()
                .join(separator)
        };
        match self.expression {
            Expression::Named(name) => write!(f, "{}", name),
            Expression::And(cs) => write!(f, "({})", join(cs, " & ")),
            Expression::Or(cs) => write!(f, "({})", join(cs, " | ")),
            Expression::Not(c) => write!(f, "~{}", o.render(*c)),
            Expression::OneOf(is) => {
                let names: Vec<String> = is.iter().map(|i| o.describe(Entity::Instance(*i))).collect();
                write!(f, "{{{}}}", names.join(", "))
            }
            Expression::Exists(r, c) => write!(f, "(some {} . {})", o.describe(Entity::Property(*r)), o.render(*c)),
            Expression::ForAll(r, c) => write!(f, "(only {} . {})", o.describe(Entity::Property(*r)), o.render(*c)),
            Expression::Count(r, k, n, c) => write!(f, "({} {} {} . {})", k, n, o.describe(Entity::Property(*r)), o.render(*c)),
        }
    }
}

impl Backend for Ontology {
    fn top(&self) -> Class {
        self.top
    }

    fn create_class(&mut self, name: &str, bases: &[Class]) -> BackendResult<Class> {
        self.fresh(name)?;
        for base in bases {
            self.known_class(*base)?;
        }
        let class = self.build(Expression::Named(name.to_string()));
        let top = self.top;
        let axioms = self.classes.axioms_mut(class);
        if bases.is_empty() {
            axioms.is_a.push(top);
        } else {
            axioms.is_a.extend_from_slice(bases);
        }
        debug!(class = class.thing(), name, bases = bases.len(), "created class");
        Ok(class)
    }

    fn create_individual(&mut self, name: &str, class: Class) -> BackendResult<Instance> {
        self.fresh(name)?;
        self.known_class(class)?;
        let individual = Instance::new(self.generator.generate());
        self.instances.insert(name.to_string(), individual);
        self.types.insert(individual, vec![class]);
        debug!(individual = individual.thing(), name, "created individual");
        Ok(individual)
    }

    fn create_relation(&mut self, name: &str, bases: &[Property]) -> BackendResult<Property> {
        self.fresh(name)?;
        for base in bases {
            self.known_property(*base)?;
        }
        let relation = Property::new(self.generator.generate());
        self.properties.insert(name.to_string(), relation);
        self.super_properties.insert(relation, bases.to_vec());
        debug!(relation = relation.thing(), name, "created relation");
        Ok(relation)
    }

    fn add_is_a(&mut self, entity: Entity, concept: Class) -> BackendResult<()> {
        self.known_class(concept)?;
        match entity {
            Entity::Class(class) => {
                self.known_class(class)?;
                self.classes.axioms_mut(class).is_a.push(concept);
            }
            Entity::Instance(individual) => {
                self.known_instance(individual)?;
                self.types.entry(individual).or_default().push(concept);
            }
            Entity::Property(_) => {
                return Err(BackendError("a relation cannot specialise a concept".into()));
            }
        }
        Ok(())
    }

    fn add_equivalence(&mut self, entity: Entity, concept: Class) -> BackendResult<()> {
        self.known_class(concept)?;
        match entity {
            Entity::Class(class) => {
                self.known_class(class)?;
                self.classes.axioms_mut(class).equivalent_to.push(concept);
                self.classes.axioms_mut(concept).equivalent_to.push(class);
                Ok(())
            }
            _ => Err(BackendError(format!(
                "only concepts can be equivalent to {}",
                self.render(concept)
            ))),
        }
    }

    fn set_domain_range(&mut self, relation: Property, domain: Class, range: Class) -> BackendResult<()> {
        self.known_property(relation)?;
        self.known_class(domain)?;
        self.known_class(range)?;
        self.domain_range.insert(relation, (domain, range));
        Ok(())
    }

    fn conjunction(&mut self, concepts: &[Class]) -> BackendResult<Class> {
        self.connective(concepts, true)
    }

    fn disjunction(&mut self, concepts: &[Class]) -> BackendResult<Class> {
        self.connective(concepts, false)
    }

    fn negation(&mut self, concept: Class) -> BackendResult<Class> {
        let concept = self.known_class(concept)?;
        if let Some(Expression::Not(inner)) = self.classes.expression(concept) {
            return Ok(*inner);
        }
        Ok(self.build(Expression::Not(concept)))
    }

    fn one_of(&mut self, individuals: &[Instance]) -> BackendResult<Class> {
        let mut members = Vec::with_capacity(individuals.len());
        for individual in individuals {
            members.push(self.known_instance(*individual)?);
        }
        members.sort_unstable();
        members.dedup();
        Ok(self.build(Expression::OneOf(members)))
    }

    fn restriction_some(&mut self, relation: Property, concept: Class) -> BackendResult<Class> {
        let expression = Expression::Exists(self.known_property(relation)?, self.known_class(concept)?);
        Ok(self.build(expression))
    }

    fn restriction_only(&mut self, relation: Property, concept: Class) -> BackendResult<Class> {
        let expression = Expression::ForAll(self.known_property(relation)?, self.known_class(concept)?);
        Ok(self.build(expression))
    }

    fn restriction_cardinality(
        &mut self,
        relation: Property,
        kind: Cardinality,
        n: u32,
        concept: Class,
    ) -> BackendResult<Class> {
        let expression = Expression::Count(
            self.known_property(relation)?,
            kind,
            n,
            self.known_class(concept)?,
        );
        Ok(self.build(expression))
    }

    fn is_instance_of(&self, individual: Instance, concept: Class) -> BackendResult<bool> {
        let individual = self.known_instance(individual)?;
        let concept = self.known_class(concept)?;
        Ok(self.member(individual, concept, &mut Memo::default()))
    }

    fn is_subsumed_by(&self, a: Class, b: Class) -> BackendResult<bool> {
        let a = self.known_class(a)?;
        let b = self.known_class(b)?;
        Ok(self.subsumed(a, b, &mut Memo::default()))
    }

    fn is_equivalent_to(&self, a: Class, b: Class) -> BackendResult<bool> {
        Ok(self.is_subsumed_by(a, b)? && self.is_subsumed_by(b, a)?)
    }

    fn describe(&self, entity: Entity) -> String {
        match entity {
            Entity::Class(class) => self.render(class),
            Entity::Instance(individual) => match self.instances.get_by_right(&individual) {
                Some(name) => name.clone(),
                None => format!("#{}", individual.thing()),
            },
            Entity::Property(relation) => match self.properties.get_by_right(&relation) {
                Some(name) => name.clone(),
                None => format!("#{}", relation.thing()),
            },
        }
    }
}
