use already::action::Evaluate;
use already::calculator::{Calculator, Value};
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

fn holds(text: &str, ontology: &mut Ontology, calculator: &mut Calculator) -> bool {
    match parse(text).unwrap().eval(calculator, ontology).unwrap() {
        Value::Boolean(b) => b,
        other => panic!("{text} did not evaluate to a boolean: {other:?}"),
    }
}

#[test]
fn subsumption_of_connectives() {
    let (mut o, mut c) = setup("! A :: Thing; ! B :: Thing");
    assert!(holds("A | B <= Thing", &mut o, &mut c));
    assert!(holds("A <= A | B", &mut o, &mut c));
    assert!(holds("A & B <= A", &mut o, &mut c));
    assert!(holds("A & B <= A | B", &mut o, &mut c));
    assert!(!holds("A | B <= A", &mut o, &mut c));
    assert!(!holds("A <= B", &mut o, &mut c));
    assert!(holds("A ^ B <= A | B", &mut o, &mut c));
    assert!(holds("~~A == A", &mut o, &mut c));
}

#[test]
fn comparison_chain_checks_every_pair() {
    let (mut o, mut c) = setup("! A :: Thing; ! B :: Thing; ! C :: A");
    assert!(holds("C <= A <= Thing", &mut o, &mut c));
    assert!(!holds("C <= B <= Thing", &mut o, &mut c));
    // endpoints alone would be true here
    assert!(!holds("A <= Thing <= A", &mut o, &mut c));
    assert!(holds("Thing >= A >= C", &mut o, &mut c));
    assert!(holds("A => C", &mut o, &mut c));
    assert!(holds("C <= A == A", &mut o, &mut c));
}

#[test]
fn hybrid_chains_are_recognised() {
    let program = parse("A <= B == C").unwrap();
    match &program.statements()[0] {
        already::action::Action::ComparisonFormula(formula) => {
            assert!(formula.is_hybrid());
            assert_eq!(formula.operands().len(), 3);
            assert_eq!(formula.comparators(), &["<=".to_string(), "==".to_string()]);
        }
        other => panic!("not a comparison: {other}"),
    }
}

#[test]
fn strict_comparators() {
    let (mut o, mut c) = setup("! A :: Thing; ! B :: A");
    assert!(holds("B < A", &mut o, &mut c));
    assert!(holds("A > B", &mut o, &mut c));
    assert!(!holds("A < A", &mut o, &mut c));
    assert!(!holds("A < B", &mut o, &mut c));
    assert!(holds("A <= A", &mut o, &mut c));
}

#[test]
fn containment() {
    let (mut o, mut c) = setup("! A :: Thing; ! B :: A; ! i : B; ! j : A");
    assert!(holds("i : A", &mut o, &mut c));
    assert!(holds("i : B", &mut o, &mut c));
    assert!(holds("j : A", &mut o, &mut c));
    assert!(!holds("j : B", &mut o, &mut c));
    assert!(!holds("j : ~A", &mut o, &mut c));
    assert!(holds("j : A | B", &mut o, &mut c));
    assert!(holds("i : A & B", &mut o, &mut c));
    assert!(holds("j : Thing", &mut o, &mut c));
}

#[test]
fn individual_sets() {
    let (mut o, mut c) = setup("! A :: Thing; ! a : A; ! b : A; ! d : Thing");
    assert!(holds("{a, b} <= A", &mut o, &mut c));
    assert!(!holds("{a, d} <= A", &mut o, &mut c));
    assert!(holds("a : {a, d}", &mut o, &mut c));
    assert!(!holds("b : {a, d}", &mut o, &mut c));
    assert!(holds("{a} <= {a, b}", &mut o, &mut c));
    assert!(holds("{a, b} == {b, a}", &mut o, &mut c));
}

#[test]
fn containment_needs_an_individual() {
    let (mut o, mut c) = setup("! A :: Thing; ! i : A; ! K :: Thing");
    let err = parse("@ : A").unwrap().eval(&mut c, &mut o).unwrap_err();
    // the anaphora holds the concept K, not an individual
    assert!(matches!(err, AlreadyError::TypeMismatch { .. }));
}

#[test]
fn comparing_an_individual_is_a_type_mismatch() {
    let (mut o, mut c) = setup("! A :: Thing; ! i : A");
    c.bind("I", c.lookup("i").unwrap()).unwrap();
    let err = parse("I <= A").unwrap().eval(&mut c, &mut o).unwrap_err();
    assert!(matches!(err, AlreadyError::TypeMismatch { .. }));
}

#[test]
fn unbound_names_fail() {
    let (mut o, mut c) = setup("! A :: Thing");
    let err = parse("A <= Missing").unwrap().eval(&mut c, &mut o).unwrap_err();
    assert!(matches!(err, AlreadyError::UnboundName(ref name) if name == "Missing"));
    let err = parse("nobody : A").unwrap().eval(&mut c, &mut o).unwrap_err();
    assert!(matches!(err, AlreadyError::UnboundName(ref name) if name == "nobody"));
}

#[test]
fn every_operand_is_evaluated() {
    let (mut o, mut c) = setup("! A :: Thing");
    // the first pair is already false, the last operand is still looked up
    for text in ["Thing <= A <= Missing", "A == Thing == Missing", "Thing < A > Missing"] {
        let err = parse(text).unwrap().eval(&mut c, &mut o).unwrap_err();
        assert!(matches!(err, AlreadyError::UnboundName(ref name) if name == "Missing"), "{text}");
    }
    // the first operand already settles the connective
    for text in ["Thing | Missing", "~Thing & Missing", "A ^ A ^ Missing"] {
        let err = parse(text).unwrap().eval(&mut c, &mut o).unwrap_err();
        assert!(matches!(err, AlreadyError::UnboundName(ref name) if name == "Missing"), "{text}");
    }
    let classes = o.class_count();
    let err = parse("Thing <= A <= ~A & Missing").unwrap().eval(&mut c, &mut o).unwrap_err();
    assert!(matches!(err, AlreadyError::UnboundName(_)));
    // `~A` was built before the failure
    assert_eq!(o.class_count(), classes + 1);
}
