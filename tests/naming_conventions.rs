use already::action::Action;
use already::error::AlreadyError;
use already::naming::{Role, Vocabulary};
use already::ontology::Ontology;
use already::parser::{parse, parse_with};

#[test]
fn concept_and_individual_names_follow_case() {
    let vocabulary = Vocabulary::default();
    for name in ["Person", "A", "Has_Part2"] {
        assert!(Action::concept(name, &vocabulary).is_ok(), "{name} is a concept name");
        match Action::individual(name, &vocabulary) {
            Err(AlreadyError::NamingConvention { role, .. }) => assert_eq!(role, Role::Individual),
            other => panic!("{name} should not name an individual: {other:?}"),
        }
    }
    for name in ["alice", "x", "_bob", "__carol9"] {
        assert!(Action::individual(name, &vocabulary).is_ok(), "{name} is an individual name");
        match Action::concept(name, &vocabulary) {
            Err(AlreadyError::NamingConvention { role, .. }) => assert_eq!(role, Role::Concept),
            other => panic!("{name} should not name a concept: {other:?}"),
        }
    }
    // underscores are skipped for individuals only
    assert!(Action::individual("_Alice", &vocabulary).is_err());
    assert!(Action::concept("_Person", &vocabulary).is_err());
    assert!(Action::relation("HasChild", &vocabulary).is_ok());
    assert!(Action::relation("hasChild", &vocabulary).is_err());
}

#[test]
fn misnamed_identifier_is_not_a_syntax_error() {
    let err = parse("alice <= Thing").unwrap_err();
    match err {
        AlreadyError::NamingConvention { name, role } => {
            assert_eq!(name, "alice");
            assert_eq!(role, Role::Concept);
        }
        other => panic!("unexpected error {other}"),
    }
    assert!(matches!(parse("! Alice : Thing").unwrap_err(), AlreadyError::NamingConvention { .. }));
    assert!(matches!(parse("! a :: Thing").unwrap_err(), AlreadyError::NamingConvention { .. }));
}

#[test]
fn reserved_words_are_rejected() {
    let vocabulary = Vocabulary::default();
    assert!(matches!(
        Action::individual("some", &vocabulary).unwrap_err(),
        AlreadyError::ReservedWord { .. }
    ));
    let err = parse("! some : Thing").unwrap_err();
    assert!(matches!(err, AlreadyError::ReservedWord { ref name } if name == "some"));
    let err = parse("! equal : Thing").unwrap_err();
    assert!(matches!(err, AlreadyError::ReservedWord { .. }));
}

#[test]
fn reserved_word_aborts_before_any_backend_mutation() {
    let vocabulary = Vocabulary::new(["Forbidden"]);
    let ontology = Ontology::default();
    let classes = ontology.class_count();
    let err = parse_with("! A :: Thing; ! Forbidden :: A; ! B :: A", &vocabulary).unwrap_err();
    assert!(matches!(err, AlreadyError::ReservedWord { ref name } if name == "Forbidden"));
    // nothing was evaluated, so nothing was created
    assert_eq!(ontology.class_count(), classes);
    assert!(ontology.class_named("A").is_none());
}

#[test]
fn custom_vocabulary_replaces_defaults() {
    let vocabulary = Vocabulary::new(["Nothing"]);
    assert!(vocabulary.is_reserved("Nothing"));
    assert!(!vocabulary.is_reserved("some"));
    assert!(parse_with("! Nothing :: Thing", &vocabulary).is_err());
    assert!(parse_with("! Something :: Thing", &vocabulary).is_ok());
}
