use anyhow::{bail, Context, Result};
use genomus::config::{traits::ConfigSection, AppConfig, ConfigManager, GenotypeConfig};
use genomus::engines::generation::{new_germinal_vector, Arena, DecodedGenotype, Retrotranscriptor};
use genomus::engines::parsing::Parser;
use genomus::functions::FunctionRegistry;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};

const USAGE: &str =
    "usage: genomus [--config FILE] [bench [MILLIS] | config [--save FILE | --check FILE]]";

fn main() -> Result<()> {
    env_logger::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            if i + 1 >= args.len() {
                bail!("--config needs a file\n{}", USAGE);
            }
            let path = args.remove(i + 1);
            args.remove(i);
            Some(path)
        }
        None => None,
    };

    let manager = ConfigManager::with_config(
        AppConfig::load_layered(config_path.as_deref()).context("Loading configuration")?,
    );
    let config = manager.get();
    let registry = FunctionRegistry::global().context("Building function registry")?;
    log::info!("Using {:?}", config.genotype);

    match args.first().map(String::as_str) {
        None => interpret(registry, config.genotype),
        Some("bench") => {
            let millis = match args.get(1) {
                Some(raw) => raw
                    .parse::<u64>()
                    .with_context(|| format!("Invalid benchmark duration: {}", raw))?,
                None => 1000,
            };
            bench(registry, config.genotype, Duration::from_millis(millis))
        }
        Some("config") => match (args.get(1).map(String::as_str), args.get(2)) {
            (None, _) => {
                let manifest = config.genotype.to_manifest();
                println!("{}", serde_json::to_string_pretty(&manifest)?);
                Ok(())
            }
            (Some("--save"), Some(path)) => {
                manager
                    .save_to_file(path)
                    .with_context(|| format!("Saving configuration to {}", path))?;
                println!("Saved configuration to {}", path);
                Ok(())
            }
            (Some("--check"), Some(path)) => {
                manager
                    .load_from_file(path)
                    .with_context(|| format!("Checking {}", path))?;
                println!("{} is valid: {:?}", path, manager.get().genotype);
                Ok(())
            }
            _ => bail!("Unknown config arguments\n{}", USAGE),
        },
        Some(other) => bail!("Unknown command {}\n{}", other, USAGE),
    }
}

/// Reads `;`-terminated statements from stdin until EOF.
fn interpret(registry: &FunctionRegistry, config: GenotypeConfig) -> Result<()> {
    let retrotranscriptor = Retrotranscriptor::new(registry, config);
    let parser = Parser::with_max_depth(registry, config.nesting_limit());
    let mut rng = StdRng::from_entropy();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut statement = String::new();

    print!("> ");
    stdout.flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        let mut rest = line.as_str();
        while let Some(end) = rest.find(';') {
            statement.push_str(&rest[..end]);
            if let Err(e) = run_statement(
                statement.trim(),
                &retrotranscriptor,
                &parser,
                &mut rng,
            ) {
                eprintln!("error: {}", e);
            }
            statement.clear();
            rest = &rest[end + 1..];
        }
        statement.push_str(rest);
        statement.push(' ');

        print!("> ");
        stdout.flush()?;
    }
    println!();
    Ok(())
}

fn run_statement(
    statement: &str,
    retrotranscriptor: &Retrotranscriptor,
    parser: &Parser,
    rng: &mut StdRng,
) -> Result<()> {
    let registry = FunctionRegistry::global()?;
    match statement {
        "\\list" => print!("{}", registry.print_function_type_dictionary()),
        "\\list_verbose" => {
            for symbol in registry.functions() {
                println!("{}", symbol.describe());
            }
        }
        "\\random" => {
            let germinal = new_germinal_vector(rng, retrotranscriptor.config().germinal_vector_max_length);
            println!("germinal vector: {:?}", germinal);
            let genotype = retrotranscriptor.decode_genotype(&germinal, Arena::new())?;
            report(genotype)?;
        }
        expression => report(parser.parse(expression)?)?,
    }
    Ok(())
}

fn report(mut genotype: DecodedGenotype) -> Result<()> {
    let normalized = genotype.to_normalized_vector()?;
    println!("normalized vector: {:?}", normalized);
    println!("decoded genotype: {}", genotype.expression()?);
    println!("encoded phenotype: {}", genotype.evaluate()?);
    Ok(())
}

/// Runs the full decode pipeline on random germinal vectors for `budget`.
fn bench(registry: &FunctionRegistry, config: GenotypeConfig, budget: Duration) -> Result<()> {
    let retrotranscriptor = Retrotranscriptor::new(registry, config);
    let mut rng = StdRng::from_entropy();

    let start = Instant::now();
    let mut iterations: u64 = 0;
    let mut failures: u64 = 0;
    let mut phenotype_length: usize = 0;

    while start.elapsed() < budget {
        let germinal = new_germinal_vector(&mut rng, config.germinal_vector_max_length);
        match retrotranscriptor
            .decode_genotype(&germinal, Arena::new())
            .and_then(|mut genotype| genotype.evaluate())
        {
            Ok(phenotype) => phenotype_length += phenotype.to_normalized_vector().len(),
            Err(e) => {
                log::warn!("Germinal vector {:?} failed: {}", germinal, e);
                failures += 1;
            }
        }
        iterations += 1;
    }

    let succeeded = iterations - failures;
    println!("iterations: {}", iterations);
    println!("failures: {}", failures);
    if succeeded > 0 {
        println!(
            "average phenotype length: {:.2}",
            phenotype_length as f64 / succeeded as f64
        );
    }
    println!(
        "average time per genotype: {:.3} ms",
        start.elapsed().as_secs_f64() * 1000.0 / iterations.max(1) as f64
    );
    Ok(())
}
