//! Basic usage example for the Study Search library.
//!
//! This example builds a query one token at a time against a running study
//! index and prints the first page of highlighted results.
//!
//! Set `STUDY_SEARCH_API_BASE` to point at the index (default:
//! `http://localhost:5000`).

use std::sync::Arc;
use study_search::config::load_from_env;
use study_search::query::Operator;
use study_search::ui::{render_studies, RenderOptions};
use study_search::Session;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_from_env()?;
    let index = Arc::new(config.build_index()?);
    println!("Using study index at {}\n", index.base_url());

    let mut session = Session::new(index);

    // Load the vocabulary and show a few terms
    let state = session.mount().await?;
    println!("Catalog: {:?} ({} terms)", state, session.catalog().len());
    for term in session.catalog().filter("mem").iter().take(5) {
        println!("  {}", term);
    }

    // Build "memory AND recall" the way the shell does
    session.pick_term("memory");
    session.append(Operator::And);
    if let Some(handle) = session.pick_term("recall") {
        println!("\nSearching: {}", session.query());
        let outcome = handle.outcome().await;
        println!("Outcome: {:?}\n", outcome);
    }

    print!("{}", render_studies(&session.studies(), RenderOptions::detect()));

    Ok(())
}
