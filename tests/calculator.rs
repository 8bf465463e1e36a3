use already::action::Evaluate;
use already::backend::Backend;
use already::calculator::{ANAPHORA, Calculator, Dictionary, Operator, Value};
use already::error::AlreadyError;
use already::ontology::Ontology;
use already::parser::parse;

fn setup(prelude: &str) -> (Ontology, Calculator) {
    let mut ontology = Ontology::default();
    let mut calculator = Calculator::for_backend(&ontology, "Thing");
    parse(prelude)
        .unwrap()
        .eval(&mut calculator, &mut ontology)
        .unwrap();
    (ontology, calculator)
}

#[test]
fn dictionary_entries_cannot_be_rebound() {
    let (_, mut c) = setup("");
    for token in ["&", "|", "^", "~", "<=", ">=", "=>", "<", ">", "==", "Thing"] {
        assert!(c.dictionary().contains(token), "{token} is built in");
        let err = c.bind(token, Value::Boolean(true)).unwrap_err();
        assert!(matches!(err, AlreadyError::ImmutableRebind(ref name) if name == token));
    }
    assert_eq!(c.dictionary().len(), 11);
    assert_eq!(c.memory().count(), 0);
}

#[test]
fn bind_then_lookup() {
    let (o, mut c) = setup("");
    let top = Value::Class(o.top());
    c.bind("X", top.clone()).unwrap();
    assert_eq!(c.lookup("X").unwrap(), top);
    c.bind("X", Value::Boolean(false)).unwrap();
    assert_eq!(c.lookup("X").unwrap(), Value::Boolean(false));
    assert!(matches!(c.lookup("Y").unwrap_err(), AlreadyError::UnboundName(_)));
}

#[test]
fn anaphora_follows_the_last_binding() {
    let (mut o, mut c) = setup("! A :: Thing");
    let a = Value::Class(o.class_named("A").unwrap());
    assert_eq!(c.anaphora(), Some(&a));
    assert_eq!(parse("@").unwrap().eval(&mut c, &mut o).unwrap(), a);
    let value = parse("! i : A; @ : A").unwrap().eval(&mut c, &mut o).unwrap();
    assert_eq!(value, Value::Boolean(true));
    let i = Value::Instance(o.individual_named("i").unwrap());
    assert_eq!(c.lookup(ANAPHORA).unwrap(), i);
}

#[test]
fn fork_leaves_the_parent_untouched() {
    let (o, mut c) = setup("");
    let top = Value::Class(o.top());
    let child = c.fork("$x", top.clone()).unwrap();
    assert_eq!(child.lookup("$x").unwrap(), top);
    assert!(c.lookup("$x").is_err());
    assert!(c.anaphora().is_none());

    c.bind("$x", Value::Boolean(true)).unwrap();
    let child = c.fork("$x", top.clone()).unwrap();
    assert_eq!(child.lookup("$x").unwrap(), top);
    assert_eq!(c.lookup("$x").unwrap(), Value::Boolean(true));
    assert!(c.fork("&", top).is_err());
}

#[test]
fn operators_resolve_through_both_tiers() {
    let (_, mut c) = setup("");
    assert_eq!(c.resolve_operator("&").unwrap(), Operator::Conjunction);
    assert_eq!(c.resolve_operator("=>").unwrap(), Operator::Subsumes);
    assert!(matches!(c.resolve_operator("Thing").unwrap_err(), AlreadyError::TypeMismatch { .. }));
    assert!(matches!(c.resolve_operator("%").unwrap_err(), AlreadyError::UnboundOperator(_)));
    c.bind("%", Value::Operator(Operator::Disjunction)).unwrap();
    assert_eq!(c.resolve_operator("%").unwrap(), Operator::Disjunction);
}

#[test]
fn missing_operator_is_reported() {
    let mut o = Ontology::default();
    let mut c = Calculator::new(Dictionary::empty().with_constant("Thing", Value::Class(o.top())));
    let err = parse("! A :: Thing; ! B :: Thing; A & B")
        .unwrap()
        .eval(&mut c, &mut o)
        .unwrap_err();
    assert!(matches!(err, AlreadyError::UnboundOperator(ref token) if token == "&"));
    let err = parse("A <= B").unwrap().eval(&mut c, &mut o).unwrap_err();
    assert!(matches!(err, AlreadyError::UnboundOperator(ref token) if token == "<="));
}

#[test]
fn operator_arity_is_checked() {
    let mut o = Ontology::default();
    let top = Value::Class(o.top());
    let err = Operator::Negation.apply(&mut o, &[]).unwrap_err();
    assert!(matches!(err, AlreadyError::TypeMismatch { .. }));
    let err = Operator::SubsumedBy.apply(&mut o, &[top.clone()]).unwrap_err();
    assert!(matches!(err, AlreadyError::TypeMismatch { .. }));
    assert_eq!(
        Operator::SubsumedBy.apply(&mut o, &[top.clone(), top]).unwrap(),
        Value::Boolean(true)
    );
}

#[test]
fn unbound_variable_defers() {
    let (mut o, mut c) = setup("! A :: Thing; ! B :: A");
    let a = Value::Class(o.class_named("A").unwrap());
    let b = Value::Class(o.class_named("B").unwrap());
    let Value::Deferred(deferred) = parse("$X").unwrap().eval(&mut c, &mut o).unwrap() else {
        panic!("expected a deferred value");
    };
    assert_eq!(deferred.to_string(), "\\$X");
    assert_eq!(deferred.apply(&mut o, a.clone()).unwrap(), a);
    assert!(c.lookup("$X").is_err());

    let Value::Deferred(typed) = parse("$X:A").unwrap().eval(&mut c, &mut o).unwrap() else {
        panic!("expected a deferred value");
    };
    assert_eq!(typed.variable().ty().map(|t| t.content()), Some("A"));
    assert_eq!(typed.apply(&mut o, b.clone()).unwrap(), b);
    let top = Value::Class(o.top());
    let err = typed.apply(&mut o, top).unwrap_err();
    assert!(matches!(err, AlreadyError::TypeMismatch { .. }));
}

#[test]
fn deferred_values_are_never_equal() {
    let (mut o, mut c) = setup("");
    let deferred = parse("$X").unwrap().eval(&mut c, &mut o).unwrap();
    assert_ne!(deferred, deferred.clone());
}

#[test]
fn bound_variables_evaluate_in_place() {
    let (mut o, c) = setup("! A :: Thing; ! B :: Thing; ! i : A; ! j : B");
    let a = Value::Class(o.class_named("A").unwrap());
    let mut forked = c.fork("$X", a).unwrap();
    let value = parse("$X & B <= A").unwrap().eval(&mut forked, &mut o).unwrap();
    assert_eq!(value, Value::Boolean(true));

    let i = Value::Instance(o.individual_named("i").unwrap());
    let j = Value::Instance(o.individual_named("j").unwrap());
    let mut forked = c.fork("$x", i).unwrap();
    let value = parse("$x:A : Thing").unwrap().eval(&mut forked, &mut o).unwrap();
    assert_eq!(value, Value::Boolean(true));
    let mut forked = c.fork("$x", j).unwrap();
    let err = parse("$x:A : Thing").unwrap().eval(&mut forked, &mut o).unwrap_err();
    assert!(matches!(err, AlreadyError::TypeMismatch { .. }));
}

#[test]
fn variable_kind_follows_the_case_of_its_name() {
    use already::action::Action;
    use already::naming::Role;
    let kind = |text: &str| match &parse(text).unwrap().statements()[0] {
        Action::IndividualVariable(v) => v.role(),
        Action::ConceptVariable(v) => v.role(),
        other => panic!("{text} is not a variable: {other}"),
    };
    assert_eq!(kind("$x"), Role::Individual);
    assert_eq!(kind("$x:Person"), Role::Individual);
    assert_eq!(kind("$_x"), Role::Individual);
    assert_eq!(kind("$X"), Role::Concept);
    assert_eq!(kind("$X:Person"), Role::Concept);
    assert!(matches!(parse("$x:person").unwrap_err(), AlreadyError::NamingConvention { .. }));
    assert!(matches!(parse("$some").unwrap_err(), AlreadyError::ReservedWord { .. }));
}

#[test]
fn unbound_individual_variable_is_a_function() {
    let (mut o, mut c) = setup("! A :: Thing; ! i : A; ! j : Thing");
    let i = Value::Instance(o.individual_named("i").unwrap());
    let j = Value::Instance(o.individual_named("j").unwrap());

    let Value::Deferred(x) = parse("$x").unwrap().eval(&mut c, &mut o).unwrap() else {
        panic!("expected a deferred value");
    };
    assert_eq!(x.apply(&mut o, i.clone()).unwrap(), i);

    let Value::Deferred(typed) = parse("$x:A").unwrap().eval(&mut c, &mut o).unwrap() else {
        panic!("expected a deferred value");
    };
    assert_eq!(typed.apply(&mut o, i.clone()).unwrap(), i);
    let err = typed.apply(&mut o, j.clone()).unwrap_err();
    assert!(matches!(err, AlreadyError::TypeMismatch { .. }));
}

#[test]
fn formulas_over_an_unbound_variable_defer() {
    let (mut o, mut c) = setup("! A :: Thing; ! i : A; ! j : Thing");
    let i = Value::Instance(o.individual_named("i").unwrap());
    let j = Value::Instance(o.individual_named("j").unwrap());
    let a = Value::Class(o.class_named("A").unwrap());
    let top = Value::Class(o.top());

    let Value::Deferred(member) = parse("$x : A").unwrap().eval(&mut c, &mut o).unwrap() else {
        panic!("expected a deferred value");
    };
    assert_eq!(member.to_string(), "\\$x. $x : A");
    assert_eq!(member.apply(&mut o, i).unwrap(), Value::Boolean(true));
    assert_eq!(member.apply(&mut o, j).unwrap(), Value::Boolean(false));

    let Value::Deferred(below) = parse("$X <= A").unwrap().eval(&mut c, &mut o).unwrap() else {
        panic!("expected a deferred value");
    };
    assert_eq!(below.apply(&mut o, a.clone()).unwrap(), Value::Boolean(true));
    assert_eq!(below.apply(&mut o, top.clone()).unwrap(), Value::Boolean(false));
    // the comparison is not evaluated before the variable is bound
    assert!(c.lookup("$X").is_err());
}

#[test]
fn concepts_over_an_unbound_variable_defer() {
    let (mut o, mut c) = setup("! A :: Thing; ! B :: Thing; ! R :: Thing -> Thing");
    let a = Value::Class(o.class_named("A").unwrap());
    for (open, closed) in [
        ("~$X & B", "~A & B"),
        ("some R . $X", "some R . A"),
        ("$X | B", "A | B"),
        ("B ^ $X", "B ^ A"),
    ] {
        let Value::Deferred(deferred) = parse(open).unwrap().eval(&mut c, &mut o).unwrap() else {
            panic!("{open} should defer");
        };
        let expected = parse(closed).unwrap().eval(&mut c, &mut o).unwrap();
        assert_eq!(deferred.apply(&mut o, a.clone()).unwrap(), expected, "{open}");
    }
}
