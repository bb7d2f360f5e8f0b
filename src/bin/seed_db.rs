use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use statline_terminal::match_db::{self, MatchDb, SeedFile};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let input = arg_value(&args, "--input")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("usage: seed_db --input seed.json [--db statline.sqlite]"))?;
    let db_path = arg_value(&args, "--db")
        .map(PathBuf::from)
        .unwrap_or_else(match_db::default_db_path);

    let raw = fs::read_to_string(&input)
        .with_context(|| format!("read seed file {}", input.display()))?;
    let seed: SeedFile = serde_json::from_str(&raw)
        .with_context(|| format!("parse seed file {}", input.display()))?;

    let mut db = MatchDb::open(&db_path)?;
    let counts = db.seed(&seed)?;

    println!("Seed complete");
    println!("DB: {}", db_path.display());
    println!("Match rows upserted:           {}", counts.matches);
    println!("League average rows upserted:  {}", counts.league_averages);
    println!("Average-against rows upserted: {}", counts.averages_against);

    let mut leagues: Vec<String> = seed
        .matches
        .iter()
        .map(|row| row.league.clone())
        .filter(|l| !l.is_empty())
        .collect();
    leagues.sort();
    leagues.dedup();
    for league in leagues {
        let teams = db.teams(&league, "all")?;
        let seasons = db.seasons(&league)?;
        println!(
            "league {league}: {} teams, seasons {}",
            teams.len(),
            if seasons.is_empty() {
                "n/a".to_string()
            } else {
                seasons.join(", ")
            }
        );
    }

    Ok(())
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
