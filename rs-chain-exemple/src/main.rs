use std::path::PathBuf;

use clap::Parser;
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rs_chain_core::io::{join_words, read_file, read_text_from, split_sequences, split_words};
use rs_chain_core::{ChainModel, Generator, Token};

/// Generate text from a word-level Markov chain trained on a corpus.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Corpus file. Reads stdin when omitted.
    corpus: Option<PathBuf>,

    /// Number of preceding words used as context.
    #[arg(long, default_value_t = 2)]
    order: usize,

    /// Number of words to generate.
    #[arg(long, default_value_t = 30)]
    length: usize,

    /// Number of texts to generate.
    #[arg(long, default_value_t = 1)]
    count: usize,

    /// Try to start and stop on sentence boundaries.
    #[arg(long)]
    sentences: bool,

    /// Seed of the random source, for reproducible output.
    #[arg(long)]
    seed: Option<u64>,

    /// Train on all CPU cores.
    #[arg(long)]
    parallel: bool,

    /// Treat each line as a separate sequence: texts start at the beginning
    /// of a line and stop at the end of one (or after `--length` words).
    #[arg(long, conflicts_with_all = ["sentences", "parallel"])]
    sequences: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let text = match &args.corpus {
        Some(path) => read_file(path)?,
        None => read_text_from(std::io::stdin().lock())?,
    };

    // A fixed seed makes every run print the same texts
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    if args.sequences {
        return print_sequences(&args, &text, rng);
    }

    // Tokenize the corpus (whitespace split, punctuation kept)
    let tokens = split_words(&text);

    // Build the model once
    let mut model = ChainModel::new(args.order)?;
    if args.parallel {
        model.train_parallel(&tokens)?;
    } else {
        model.train(&tokens);
    }
    info!("{} tokens, {} contexts of order {}", tokens.len(), model.len(), model.order());

    let mut generator = Generator::with_rng(&model, rng);

    for _ in 0..args.count {
        let words = if args.sentences {
            generator.generate_sentences(args.length)?
        } else {
            generator.generate(args.length)?
        };
        println!("{}", join_words(&words));
    }

    Ok(())
}

/// Trains one sequence per line and prints whole generated sequences.
fn print_sequences(args: &Args, text: &str, rng: StdRng) -> Result<(), Box<dyn std::error::Error>> {
    let mut model: ChainModel<Token<String>> = ChainModel::new(args.order)?;
    let sequences = split_sequences(text);
    for sequence in &sequences {
        model.train_sequence(sequence);
    }
    info!("{} sequences, {} contexts of order {}", sequences.len(), model.len(), model.order());

    let mut generator = Generator::with_rng(&model, rng);
    for _ in 0..args.count {
        let words = generator.generate_sequence(Some(args.length))?;
        println!("{}", join_words(&words));
    }

    Ok(())
}
