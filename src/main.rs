// Ballot Station - Election definition checker
// Loads an election definition JSON file, runs the full referential
// integrity check, and prints a ballot summary or every violation found.

use anyhow::{bail, Result};
use std::env;
use std::path::Path;

use ballot_station::{Election, ElectionCatalog};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("usage: ballot-station <election.json>");
        std::process::exit(2);
    }

    check_election(Path::new(&args[1]))
}

fn check_election(path: &Path) -> Result<()> {
    println!("🗳️  Checking election definition: {}", path.display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let election = Election::from_file(path)?;

    let catalog = match ElectionCatalog::new(election) {
        Ok(catalog) => catalog,
        Err(errors) => {
            eprintln!("\n❌ {} validation error(s):", errors.len());
            for error in &errors {
                eprintln!("   • {}", error);
            }
            bail!("election definition failed validation");
        }
    };

    let election = catalog.election();
    println!("\n✓ {}", election.title);
    println!(
        "  {} - {}, {}",
        election.date, election.county.name, election.state
    );
    println!("  hash: {}", catalog.election_hash());

    println!(
        "\n✓ {} parties, {} districts, {} precincts, {} contests",
        election.parties.len(),
        election.districts.len(),
        election.precincts.len(),
        election.contests.len()
    );

    println!("\n📋 Ballot styles:");
    for style in &election.ballot_styles {
        // A valid catalog always resolves its own ballot styles
        let contests = catalog
            .contests_for_ballot_style(&style.id)
            .map_err(anyhow::Error::new)?;
        println!(
            "   {} → {} contest(s), {} precinct(s)",
            style.id,
            contests.len(),
            style.precincts.len()
        );
    }

    if let Some(tracker) = &election.ballot_tracker_config {
        println!(
            "\n✓ Ballot tracker: {} ({})",
            tracker.tracker_site_display,
            tracker.tracker_type.as_str()
        );
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🎉 Election definition is valid");

    Ok(())
}
