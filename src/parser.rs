//! Turns source text into an [`Action`] tree.
//!
//! The grammar lives in `grammar.pest`. Builders walk the pest pairs and
//! construct actions, checking every name against the [`Vocabulary`] on the
//! way. Nothing here touches a backend, so a program that fails to parse
//! leaves no trace.

use pest::Parser;
use pest::iterators::{Pair, Pairs};
use pest_derive::Parser;

use crate::action::{
    Action, Atom, ComparisonFormula, ConceptTuple, Connective, ContainingFormula, MappingFormula,
    Quantifier, Restriction, Variable,
};
use crate::declaration::{ConceptDeclaration, Declaration, Definition, RelationDeclaration};
use crate::error::{AlreadyError, Result};
use crate::naming::{Role, Vocabulary};

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct ConceptParser;

/// Parses a `;` separated program with the default reserved words.
pub fn parse(text: &str) -> Result<Action> {
    parse_with(text, &Vocabulary::default())
}

/// Parses a `;` separated program into a statement sequence.
pub fn parse_with(text: &str, vocabulary: &Vocabulary) -> Result<Action> {
    let mut pairs = ConceptParser::parse(Rule::program, text)?;
    let program = pairs.next().ok_or_else(|| AlreadyError::Syntax {
        message: "empty parse".into(),
        line: 1,
        col: 1,
    })?;
    let builder = Builder { vocabulary };
    let mut statements = Vec::new();
    for pair in program.into_inner() {
        if pair.as_rule() == Rule::EOI {
            break;
        }
        statements.push(builder.statement(pair)?);
    }
    Ok(Action::StatementSequence(statements))
}

/// Whether `text` is a syntactically valid program. Names are not checked.
pub fn matches(text: &str) -> bool {
    ConceptParser::parse(Rule::program, text).is_ok()
}

fn unexpected(pair: &Pair<Rule>) -> AlreadyError {
    let (line, col) = pair.as_span().start_pos().line_col();
    AlreadyError::Syntax {
        message: format!("unexpected {:?}", pair.as_rule()),
        line,
        col,
    }
}

fn next<'i>(inner: &mut Pairs<'i, Rule>, parent: &Pair<'i, Rule>) -> Result<Pair<'i, Rule>> {
    inner.next().ok_or_else(|| unexpected(parent))
}

struct Builder<'v> {
    vocabulary: &'v Vocabulary,
}

impl Builder<'_> {
    fn atom(&self, pair: &Pair<Rule>, role: Role) -> Result<Atom> {
        Atom::new(pair.as_str(), role, self.vocabulary)
    }

    fn statement(&self, pair: Pair<Rule>) -> Result<Action> {
        match pair.as_rule() {
            Rule::definition => {
                let mut inner = pair.clone().into_inner();
                let name = self.atom(&next(&mut inner, &pair)?, Role::Concept)?;
                let concept = self.concept(next(&mut inner, &pair)?)?;
                Ok(Action::Definition(Definition::new(name, concept)))
            }
            Rule::relation_declaration => {
                let mut inner = pair.clone().into_inner();
                let name = self.atom(&next(&mut inner, &pair)?, Role::Relation)?;
                let mapping = self.mapping(next(&mut inner, &pair)?)?;
                Ok(Action::RelationDeclaration(RelationDeclaration::new(name, mapping)))
            }
            Rule::concept_declaration => {
                let mut inner = pair.clone().into_inner();
                let name = self.atom(&next(&mut inner, &pair)?, Role::Concept)?;
                let concepts = self.tuple(next(&mut inner, &pair)?)?;
                Ok(Action::ConceptDeclaration(ConceptDeclaration::new(name, concepts)))
            }
            Rule::individual_declaration => {
                let mut inner = pair.clone().into_inner();
                let name = self.atom(&next(&mut inner, &pair)?, Role::Individual)?;
                let concepts = self.tuple(next(&mut inner, &pair)?)?;
                Ok(Action::Declaration(Declaration::new(name, concepts)))
            }
            Rule::containing_formula => {
                let mut inner = pair.clone().into_inner();
                let individual = self.individual_term(next(&mut inner, &pair)?)?;
                let concept = self.concept(next(&mut inner, &pair)?)?;
                Ok(Action::ContainingFormula(ContainingFormula {
                    individual: Box::new(individual),
                    concept: Box::new(concept),
                }))
            }
            Rule::comparison_formula => {
                let mut inner = pair.clone().into_inner();
                let first = self.concept(next(&mut inner, &pair)?)?;
                let mut rest = Vec::new();
                while let Some(comparator) = inner.next() {
                    let operand = self.concept(next(&mut inner, &pair)?)?;
                    rest.push((comparator.as_str().to_string(), operand));
                }
                Ok(Action::ComparisonFormula(ComparisonFormula::new(first, rest)))
            }
            _ => self.concept(pair),
        }
    }

    fn tuple(&self, pair: Pair<Rule>) -> Result<ConceptTuple> {
        let concepts = pair
            .into_inner()
            .map(|p| self.concept(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(ConceptTuple::new(concepts))
    }

    fn mapping(&self, pair: Pair<Rule>) -> Result<MappingFormula> {
        let mut inner = pair.clone().into_inner();
        let domain = self.concept(next(&mut inner, &pair)?)?;
        let range = self.concept(next(&mut inner, &pair)?)?;
        Ok(MappingFormula {
            domain: Box::new(domain),
            range: Box::new(range),
        })
    }

    fn individual_term(&self, pair: Pair<Rule>) -> Result<Action> {
        match pair.as_rule() {
            Rule::individual => Ok(Action::Individual(self.atom(&pair, Role::Individual)?)),
            Rule::anaphora => Ok(Action::Anaphora),
            Rule::variable => Ok(Action::from(self.variable(pair)?)),
            _ => Err(unexpected(&pair)),
        }
    }

    fn variable(&self, pair: Pair<Rule>) -> Result<Variable> {
        let mut name = "";
        let mut ty = None;
        for part in pair.into_inner() {
            match part.as_rule() {
                Rule::variable_name => name = part.as_str(),
                Rule::variable_type => ty = Some(part.as_str()),
                _ => (),
            }
        }
        Variable::new(name, ty, self.vocabulary)
    }

    fn concept(&self, pair: Pair<Rule>) -> Result<Action> {
        match pair.as_rule() {
            Rule::xor => self.connective(Connective::Xor, pair),
            Rule::or => self.connective(Connective::Or, pair),
            Rule::and => self.connective(Connective::And, pair),
            Rule::negation => {
                let mut inner = pair.clone().into_inner();
                let operand = self.concept(next(&mut inner, &pair)?)?;
                Ok(Action::Negation(Box::new(operand)))
            }
            Rule::restriction => {
                let mut inner = pair.clone().into_inner();
                let quantifier = self.quantifier(next(&mut inner, &pair)?)?;
                let relation = self.atom(&next(&mut inner, &pair)?, Role::Relation)?;
                let operand = self.concept(next(&mut inner, &pair)?)?;
                Ok(Action::Restriction(Restriction {
                    quantifier,
                    relation: Box::new(Action::Relation(relation)),
                    operand: Box::new(operand),
                }))
            }
            Rule::individual_set => {
                let members = pair
                    .into_inner()
                    .map(|p| self.atom(&p, Role::Individual))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Action::IndividualSet(members))
            }
            Rule::variable => Ok(Action::from(self.variable(pair)?)),
            Rule::anaphora => Ok(Action::Anaphora),
            Rule::concept_atom => Ok(Action::Concept(self.atom(&pair, Role::Concept)?)),
            _ => Err(unexpected(&pair)),
        }
    }

    fn connective(&self, kind: Connective, pair: Pair<Rule>) -> Result<Action> {
        let args = pair
            .into_inner()
            .map(|p| self.concept(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Action::connective(kind, args))
    }

    fn quantifier(&self, pair: Pair<Rule>) -> Result<Quantifier> {
        let kind = pair
            .clone()
            .into_inner()
            .next()
            .ok_or_else(|| unexpected(&pair))?;
        let count = || -> Result<u32> {
            let integer = kind
                .clone()
                .into_inner()
                .find(|p| p.as_rule() == Rule::integer)
                .ok_or_else(|| unexpected(&kind))?;
            integer.as_str().parse::<u32>().map_err(|e| {
                let (line, col) = integer.as_span().start_pos().line_col();
                AlreadyError::Syntax {
                    message: format!("invalid cardinality {}: {}", integer.as_str(), e),
                    line,
                    col,
                }
            })
        };
        match kind.as_rule() {
            Rule::some => Ok(Quantifier::Some),
            Rule::only => Ok(Quantifier::Only),
            Rule::at_least => Ok(Quantifier::AtLeast(count()?)),
            Rule::at_most => Ok(Quantifier::AtMost(count()?)),
            Rule::exactly => Ok(Quantifier::Exactly(count()?)),
            _ => Err(unexpected(&kind)),
        }
    }
}
