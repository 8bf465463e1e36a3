use std::io::{self, Read};
use std::process::ExitCode;
use std::time::Instant;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use already::action::Evaluate;
use already::calculator::Calculator;
use already::config::Settings;
use already::language::Language;
use already::ontology::Ontology;

fn main() -> ExitCode {
    let settings = match Settings::load(None) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let language = Language::from_settings(&settings);
    let files: Vec<String> = std::env::args().skip(1).collect();
    let outcome = if files.is_empty() {
        let mut text = String::new();
        match io::stdin().read_to_string(&mut text) {
            Ok(_) => run(&language, &settings, "<stdin>", || language.parse(&text)),
            Err(e) => Err(e.into()),
        }
    } else {
        files.iter().try_for_each(|file| {
            run(&language, &settings, file, || language.parse_file(file))
        })
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "evaluation aborted");
            ExitCode::FAILURE
        }
    }
}

fn run<F>(language: &Language, settings: &Settings, source: &str, parse: F) -> already::Result<()>
where
    F: FnOnce() -> already::Result<already::action::Action>,
{
    let started = Instant::now();
    let program = parse()?;
    let mut ontology = Ontology::new(&settings.top_concept);
    let mut calculator = Calculator::for_backend(&ontology, &settings.top_concept);
    let value = program.eval(&mut calculator, &mut ontology)?;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    info!(
        source,
        statements = program.statements().len(),
        classes = ontology.class_count(),
        individuals = ontology.individual_count(),
        reserved = language.vocabulary().len(),
        ms = elapsed_ms,
        "program evaluated"
    );
    println!("{}", value.render(&ontology));
    Ok(())
}
