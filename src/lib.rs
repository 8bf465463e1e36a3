//! Already – a small description-logic language and its semantic calculator.
//!
//! Programs are `;` separated statements over three kinds of names:
//! * concepts (`Person`, capitalised), combined with `~`, `&`, `|`, `^` and
//!   the restrictions `some R . C`, `only R . C`, `more n R . C`,
//!   `less n R . C` and `exact n R . C`;
//! * individuals (`alice`, lower case), also usable as nominals `{a, b}`;
//! * relations (`HasChild`, capitalised).
//!
//! Declarations start with `!`: `! i : A` (individual), `! A :: B`
//! (concept), `! R :: A -> B` (relation) and `! D := C` (definition).
//! Formulas test membership (`i : C`) or compare concepts with chains such as
//! `A <= B == C`.
//!
//! ## Modules
//! * [`parser`] – the PEG grammar (`grammar.pest`) and the builders producing actions.
//! * [`action`] / [`declaration`] – the typed action tree and its evaluation.
//! * [`calculator`] – values, built-in operators and the two-tier environment.
//! * [`backend`] – the capability interface a knowledge base must provide.
//! * [`ontology`] – an in-memory backend with structural reasoning.
//! * [`language`] – a facade over parsing, file loading and evaluation.
//! * [`config`] – settings such as the reserved words.
//!
//! ## Quick Start
//! ```
//! use already::{calculator::{Calculator, Value}, language::Language, ontology::Ontology};
//! let mut ontology = Ontology::default();
//! let mut calculator = Calculator::for_backend(&ontology, "Thing");
//! let language = Language::default();
//! let value = language
//!     .run("! A :: Thing; ! B :: A; ! i : B; i : A", &mut calculator, &mut ontology)
//!     .unwrap();
//! assert_eq!(value, Value::Boolean(true));
//! ```
//!
//! Evaluation is single-threaded: a backend serves one evaluation at a time,
//! and hosts that share one must serialise access themselves.

pub mod action;
pub mod backend;
pub mod calculator;
pub mod config;
pub mod declaration;
pub mod error;
pub mod language;
pub mod naming;
pub mod ontology;
pub mod parser;

use core::hash::BuildHasherDefault;
use seahash::SeaHasher;

pub type ThingHasher = BuildHasherDefault<SeaHasher>;
pub type OtherHasher = BuildHasherDefault<SeaHasher>;

pub use error::{AlreadyError, Result};
