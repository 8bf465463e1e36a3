use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use already::action::Evaluate;
use already::calculator::Calculator;
use already::ontology::Ontology;
use already::parser::parse;

// a taxonomy of `width` concepts per level, `depth` levels deep
fn taxonomy(width: usize, depth: usize) -> String {
    let mut text = String::from("! HasPart :: Thing -> Thing;\n");
    for level in 0..depth {
        for i in 0..width {
            let parent = if level == 0 {
                "Thing".to_string()
            } else {
                format!("C{}_{}", level - 1, i)
            };
            text.push_str(&format!("! C{}_{} :: {};\n", level, i, parent));
            text.push_str(&format!("! c{}_{} : C{}_{};\n", level, i, level, i));
        }
    }
    text
}

fn loaded(prelude: &str) -> (Ontology, Calculator) {
    let mut ontology = Ontology::default();
    let mut calculator = Calculator::for_backend(&ontology, "Thing");
    if let Ok(program) = parse(prelude) {
        let _ = program.eval(&mut calculator, &mut ontology);
    }
    (ontology, calculator)
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let small = taxonomy(10, 5);
    let large = taxonomy(100, 10);
    c.bench_function("parse 100", |b| b.iter(|| parse(black_box(&small))));
    c.bench_function("parse 2k", |b| b.iter(|| parse(black_box(&large))));

    let program = parse(&large).unwrap();
    c.bench_function("declare 2k", |b| {
        b.iter(|| {
            let (mut ontology, mut calculator) = loaded("");
            program.eval(&mut calculator, &mut ontology)
        })
    });

    let (mut ontology, mut calculator) = loaded(&large);
    let queries = [
        ("subsumption deep", "C9_42 <= C0_42"),
        ("subsumption miss", "C9_42 <= C0_43"),
        ("containment deep", "c9_7 : C0_7"),
        ("connectives", "C5_1 & C5_2 | ~C5_3 <= C4_1 | C4_2 | ~C5_3"),
        ("restrictions", "more 2 HasPart . C9_3 <= some HasPart . C0_3"),
    ];
    for (name, text) in queries {
        let query = parse(text).unwrap();
        c.bench_function(name, |b| b.iter(|| query.eval(&mut calculator, &mut ontology)));
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
