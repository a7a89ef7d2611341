use genomus::engines::generation::Arena;
use genomus::engines::parsing::{Parser, DEFAULT_EXPRESSION};
use genomus::functions::mapping::encode_parameter;
use genomus::functions::FunctionRegistry;
use genomus::{GenomusError, GenotypeType};

fn parser() -> Parser<'static> {
    Parser::new(FunctionRegistry::global().unwrap())
}

#[test]
fn test_empty_expression_yields_default_genotype() {
    for text in ["", "   ", "{}", "\n\t"] {
        let mut genotype = parser().parse(text).unwrap();
        assert_eq!(genotype.expression().unwrap(), DEFAULT_EXPRESSION);

        let score = genotype.evaluate().unwrap().into_score().unwrap();
        let event = &score.voices[0].events[0];
        assert_eq!(event.parameters[1].value, encode_parameter(GenotypeType::MidiPitch, 60.0));
    }
}

#[test]
fn test_layout_is_ignored() {
    let text = "
        s(
            vConcatE(
                e(n(0.25), m(60), a(100), i(64)),
                { e_piano(n(0.5), m(62), a(100), i(64)) }
            )
        )";
    let genotype = parser().parse(text).unwrap();
    assert_eq!(
        genotype.expression().unwrap(),
        "s(vConcatE(e_piano(n(0.25), m(60), a(100), i(64)), e_piano(n(0.5), m(62), a(100), i(64))))"
    );
}

#[test]
fn test_perpetuum_mobile_holds_note_value() {
    let mut genotype = parser()
        .parse("s(vPerpetuumMobile(n(0.25), lm(60, 62, 64), la(100), li(64, 70)))")
        .unwrap();
    let score = genotype.evaluate().unwrap().into_score().unwrap();
    let events = &score.voices[0].events;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].parameters[0].value, encode_parameter(GenotypeType::NoteValue, 0.25));

    let mut looped = parser()
        .parse("s(vPerpetuumMobileLoop(n(0.25), lm(60, 62, 64), la(100), li(64, 70)))")
        .unwrap();
    let score = looped.evaluate().unwrap().into_score().unwrap();
    let events = &score.voices[0].events;
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.parameters[0] == events[0].parameters[0]));
    assert_eq!(events[2].parameters[3], events[0].parameters[3]);
}

#[test]
fn test_parse_into_shared_arena() {
    let mut arena = Arena::with_seed(5);
    let first = parser()
        .parse_into(&mut arena, "e_piano(n(0.25), m(60), a(100), i(64))")
        .unwrap();
    // The second expression may refer back to the first one's event.
    let second = parser().parse_into(&mut arena, "v(eAutoref(0))").unwrap();
    assert!(second > first);

    let voice = arena.evaluate(second).unwrap().into_voice().unwrap();
    let event = arena.evaluate(first).unwrap().into_event().unwrap();
    assert_eq!(voice.events, vec![event]);
}

#[test]
fn test_errors() {
    let cases: [(&str, fn(&GenomusError) -> bool); 6] = [
        ("s(v(e_piano(n(0.25), m(60), a(100), i(64)))", |e| {
            *e == GenomusError::UnbalancedParenthesis
        }),
        ("s(v(e_organ(n(0.25))))", |e| {
            matches!(e, GenomusError::UnknownFunction(name) if name == "e_organ")
        }),
        ("s(v(e_piano(n(0.25), m(60), a(100))))", |e| {
            matches!(e, GenomusError::Arity { expected: 4, actual: 3, .. })
        }),
        ("s(e_piano(n(0.25), m(60), a(100), i(64)))", |e| {
            matches!(e, GenomusError::TypeMismatch { .. })
        }),
        ("s(v(e_piano(n(0.25), 60, a(100), i(64))))", |e| {
            matches!(e, GenomusError::Parse(_))
        }),
        ("s(v(e_piano(n(0.25), m(60), a(100), i(64)))) v(e_piano())", |e| {
            matches!(e, GenomusError::Parse(_))
        }),
    ];

    for (text, expected) in cases {
        match parser().parse(text) {
            Ok(genotype) => panic!("{} parsed as {}", text, genotype),
            Err(e) => assert!(expected(&e), "{}: unexpected {:?}", text, e),
        }
    }
}
