use anyhow::Result;
use clap::Parser;
use hotel_core::{build_store, HotelSearch, WordIndex};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "hotel-cli")]
#[command(about = "Build hotel and review indexes, then query them from the terminal", long_about = None)]
struct Args {
    /// Hotels metadata JSON file
    #[arg(long, default_value = "input/hotels/hotels.json")]
    hotels: PathBuf,
    /// Root directory of review JSON files
    #[arg(long, default_value = "input/reviews")]
    reviews: PathBuf,
    /// Worker-pool size for parsing and tokenizing
    #[arg(long, default_value_t = 4)]
    threads: usize,
    /// Diagnostic dump output file
    #[arg(long, default_value = "output/out.txt")]
    output: PathBuf,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let start = Instant::now();
    let store = build_store(Some(&args.hotels), Some(&args.reviews), args.threads)?;
    let words = WordIndex::build(&store, args.threads);
    tracing::info!(
        hotels = store.len(),
        reviews = store.review_count(),
        words = words.len(),
        elapsed = ?start.elapsed(),
        "indexes built"
    );

    let search = HotelSearch::new(store, words);
    if let Err(err) = search.write_dump(&args.output) {
        tracing::error!(%err, "failed to write dump file");
    }

    run_shell(&search)
}

fn run_shell(search: &HotelSearch) -> Result<()> {
    println!();
    print_queries();
    println!();

    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim().to_lowercase();
        if line.is_empty() {
            continue;
        }
        if line == "q" {
            break;
        }
        if line == "h" {
            print_queries();
            continue;
        }

        let mut tokens = line.split_whitespace();
        let (Some(command), Some(operand), None) = (tokens.next(), tokens.next(), tokens.next())
        else {
            print_invalid_query(&line);
            continue;
        };

        match command {
            "find" => match operand.parse() {
                Ok(id) => print_hotel(search, id),
                Err(_) => print_invalid_query(&line),
            },
            "findreviews" => match operand.parse() {
                Ok(id) => print_reviews(search, id),
                Err(_) => print_invalid_query(&line),
            },
            "findword" => print_word(search, operand),
            _ => print_invalid_query(&line),
        }
    }
    Ok(())
}

fn print_hotel(search: &HotelSearch, id: u64) {
    println!("Finding hotel {id}");
    if !search.contains_hotel(id) {
        println!("No hotel matches that id");
        return;
    }
    match search.hotel(id) {
        Some(hotel) => {
            println!("\n********************");
            println!("{hotel}");
        }
        None => println!("No information on that hotel"),
    }
}

fn print_reviews(search: &HotelSearch, id: u64) {
    println!("Finding reviews for hotel {id}");
    if !search.contains_hotel(id) {
        println!("No hotel matches that id");
        return;
    }
    let reviews = search.reviews(id, None);
    if reviews.is_empty() {
        println!("No reviews exist for that hotel");
        return;
    }
    for review in reviews {
        println!("--------------------");
        println!("{review}");
    }
}

fn print_word(search: &HotelSearch, word: &str) {
    println!("Finding reviews with the word \"{word}\"");
    let reviews = search.reviews_with_word(word, None);
    if reviews.is_empty() {
        println!("No reviews use that word");
        return;
    }
    for review in reviews {
        println!("--------------------");
        println!("{review}");
    }
}

fn print_queries() {
    print!(
        "    Valid Commands\n\
         --------------------\n\
         find [hotel_id]\n\
         findReviews [hotel_id]\n\
         findWord [word]\n\
         q to quit\n"
    );
}

fn print_invalid_query(query: &str) {
    println!("Unable to parse the query");
    println!("  \"{query}\"");
    println!("Enter \"h\" for help");
}
