use std::env;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use concept_extract::ConceptExtractor;

const USAGE: &str = "conceptscan [OPTIONS] <text>

  Extract concepts from a text.

Options:
  -c, --concepts <concept list path>  File with one concept per line.
                                      Defaults to the CONCEPT_LIST env var.
  -h, --help                          Show this help.
";

fn main() -> anyhow::Result<()> {
    init_tracing();

    let Some(config) = load_config() else {
        print!("{USAGE}");
        return Ok(());
    };
    info!("using concept list at {}", config.concept_list.display());

    let start = Instant::now();
    let extractor = ConceptExtractor::from_file(&config.concept_list)?;
    info!(
        "concept list loaded in {} ms ({} dictionary entries)",
        start.elapsed().as_millis(),
        extractor.entry_count()
    );

    let concepts = extractor.get(&config.text);
    let count = concepts.len();
    println!(
        "{count} {} found{}",
        if count == 1 { "concept" } else { "concepts" },
        if count > 0 { " :" } else { "." }
    );
    for concept in &concepts {
        println!("{concept}");
    }

    Ok(())
}

#[derive(Debug, Clone)]
struct Config {
    concept_list: PathBuf,
    text: String,
}

fn load_config() -> Option<Config> {
    let mut concept_list: Option<PathBuf> = None;
    let mut text: Option<String> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return None,
            "-c" | "--concepts" => {
                if let Some(path) = args.next() {
                    concept_list = Some(PathBuf::from(path));
                }
            }
            _ => {
                if let Some(path) = arg.strip_prefix("--concepts=") {
                    concept_list = Some(PathBuf::from(path));
                } else if text.is_none() {
                    text = Some(arg);
                }
            }
        }
    }

    let concept_list = concept_list.or_else(|| env::var("CONCEPT_LIST").ok().map(PathBuf::from))?;
    Some(Config {
        concept_list,
        text: text?,
    })
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .init();
}
