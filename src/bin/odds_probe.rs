use anyhow::{Context, Result, anyhow, bail};

use statline_terminal::analysis::{self, AnalysisSnapshot};
use statline_terminal::demo_feed::DemoStore;
use statline_terminal::match_db::{self, MatchDb};
use statline_terminal::provider::DataSource;
use statline_terminal::series::windowed_matches;
use statline_terminal::state::{
    ALL_SEASONS, AppState, DisplayOption, MATCH_FETCH_LIMIT, StatCategory, VenueFilter,
    league_baseline,
};
use statline_terminal::store_fetch::RemoteStore;
use statline_terminal::true_odds::Factorials;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let team_a =
        arg_value(&args, "--team-a").ok_or_else(|| anyhow!("--team-a is required, see --help"))?;
    let team_b =
        arg_value(&args, "--team-b").ok_or_else(|| anyhow!("--team-b is required, see --help"))?;

    let mut state = AppState::new();
    state.config.league =
        Some(arg_value(&args, "--league").unwrap_or_else(|| "Premier League".to_string()));
    state.config.season = arg_value(&args, "--season").unwrap_or_else(|| ALL_SEASONS.to_string());
    state.config.team_a = Some(team_a.clone());
    state.config.team_b = Some(team_b.clone());

    if let Some(key) = arg_value(&args, "--stat") {
        state.config.category = StatCategory::from_key(&key).ok_or_else(|| {
            anyhow!("unknown stat '{key}' (shots, shots_on_target, corners, goals, yellow, red)")
        })?;
    }
    if let Some(raw) = arg_value(&args, "--display") {
        state.config.display = parse_display(&raw)?;
    }
    if let Some(raw) = arg_value(&args, "--venue") {
        state.config.venue = parse_venue(&raw)?;
    }
    if let Some(raw) = arg_value(&args, "--sample") {
        let n: usize = raw
            .parse()
            .with_context(|| format!("bad --sample '{raw}'"))?;
        state.config.sample_size = n.clamp(1, MATCH_FETCH_LIMIT);
    }
    if let Some(raw) = arg_value(&args, "--line") {
        state.config.line = raw.parse().with_context(|| format!("bad --line '{raw}'"))?;
    }
    state.config.clamp_line_to_category();
    if let Some(raw) = arg_value(&args, "--smooth") {
        match raw.as_str() {
            "0" | "off" => state.config.smoothing = false,
            "1" | "2" | "3" => {
                state.config.smoothing = true;
                state.config.smoothing_strength = raw.parse().unwrap_or(1);
            }
            other => bail!("bad --smooth '{other}' (off, 1, 2 or 3)"),
        }
    }

    let source = resolve_source(arg_value(&args, "--source").as_deref())?;
    let league = state.config.league.clone().unwrap_or_default();

    state.league_averages = source.league_averages(&league, &state.config.season)?;
    state.team_a_matches = source.team_matches(&team_a, &state.config.season)?;
    state.team_b_matches = source.team_matches(&team_b, &state.config.season)?;

    if state.config.display == DisplayOption::ForA && state.config.show_average_against {
        let rows = windowed_matches(
            &state.team_a_matches,
            state.config.venue,
            state.config.sample_size,
        );
        let mut opponents: Vec<String> = rows
            .iter()
            .map(|m| m.opponent.clone())
            .filter(|o| !o.is_empty())
            .collect();
        opponents.sort();
        opponents.dedup();
        if !opponents.is_empty() {
            let fallback = league_baseline(&state.league_averages, state.config.category);
            state.opponent_averages = source.averages_against(
                state.config.category,
                &opponents,
                &state.config.season,
                fallback,
            )?;
        }
    }

    let mut factorials = Factorials::new();
    let snapshot = analysis::compute_snapshot(&state, &mut factorials);
    print_report(&state, &snapshot, source.label());
    Ok(())
}

fn print_report(state: &AppState, snapshot: &AnalysisSnapshot, source: &str) {
    let config = &state.config;
    println!("{}", snapshot.chart_title);
    println!(
        "{} | {} | {} | venue {} | source {}",
        config.league.as_deref().unwrap_or("-"),
        config.season_label(),
        config.display.label(),
        config.venue.label(),
        source,
    );
    println!(
        "line {:.1} | sample {} | smoothing {}",
        config.line,
        config.sample_size,
        if config.smoothing {
            format!("on (strength {})", config.smoothing_strength)
        } else {
            "off".to_string()
        }
    );
    println!();

    if snapshot.points.is_empty() {
        println!(
            "No matches found for {}.",
            config.team_a.as_deref().unwrap_or("-")
        );
        return;
    }

    println!(
        "{:<12} {:<22} {:>7} {:>8} {:>7} {:>8}",
        "date", "opponent", "value", "raw", "ma5", "opp avg"
    );
    for point in &snapshot.points {
        if point.is_padding() {
            println!(
                "{:<12} {:<22} {:>7} {:>8} {:>7} {:>8}",
                "-", "-", "-", "-", "-", "-"
            );
            continue;
        }
        let date = point
            .match_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        // A trailing * marks values the outlier smoother rewrote.
        let raw = if point.smoothed {
            format!("{:.1}*", point.original_value)
        } else {
            format!("{:.1}", point.original_value)
        };
        println!(
            "{:<12} {:<22} {:>7.1} {:>8} {:>7.1} {:>8.1}",
            date,
            truncate(&point.opponent, 22),
            point.value,
            raw,
            point.moving_average,
            point.average_against,
        );
    }
    println!();

    println!("Series average: {:.1}", snapshot.series_average);
    println!(
        "Hit rate over {:.1}: L5 {:.0}% | L10 {:.0}% | L15 {:.0}%",
        config.line, snapshot.hit_rate_5, snapshot.hit_rate_10, snapshot.hit_rate_15
    );
    println!(
        "Form: {} ({:+.1}, recent 5 {:.1} vs overall {:.1})",
        snapshot.form.status.label(),
        snapshot.form.difference,
        snapshot.form.recent5_avg,
        snapshot.form.overall_avg
    );
    println!(
        "Consistency: {} (cv {:.1}%, sd {:.1}, mean {:.1})",
        snapshot.consistency.level.label(),
        snapshot.consistency.coefficient,
        snapshot.consistency.std_dev,
        snapshot.consistency.mean
    );
    println!(
        "Conceded per match: home {:.1} | away {:.1}",
        snapshot.conceded.home, snapshot.conceded.away
    );
    if snapshot.odds.is_available() {
        println!(
            "True odds: over {:.2} ({:.1}%) | under {:.2} ({:.1}%) | expected {:.2}",
            snapshot.odds.over_odds,
            snapshot.odds.over_implied_pct(),
            snapshot.odds.under_odds,
            snapshot.odds.under_implied_pct(),
            snapshot.odds.expected_value
        );
    } else {
        println!("True odds: unavailable (needs matches for both teams plus league averages)");
    }
}

fn resolve_source(flag: Option<&str>) -> Result<DataSource> {
    let choice = flag
        .map(|s| s.trim().to_ascii_lowercase())
        .or_else(|| {
            std::env::var("STATLINE_SOURCE")
                .ok()
                .map(|s| s.trim().to_ascii_lowercase())
        })
        .unwrap_or_else(|| "demo".to_string());
    match choice.as_str() {
        "" | "demo" => Ok(DataSource::Demo(DemoStore::generate())),
        "sqlite" => {
            let path = match_db::default_db_path();
            let db = MatchDb::open(&path)
                .with_context(|| format!("open sqlite db {}", path.display()))?;
            Ok(DataSource::Sqlite(db))
        }
        "remote" => {
            let store = RemoteStore::from_env()
                .ok_or_else(|| anyhow!("remote source needs STATLINE_DB_URL and STATLINE_DB_KEY"))?;
            Ok(DataSource::Remote(store))
        }
        other => bail!("unknown source '{other}' (demo, sqlite or remote)"),
    }
}

fn parse_display(raw: &str) -> Result<DisplayOption> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "for" | "for_a" => Ok(DisplayOption::ForA),
        "against" | "against_a" => Ok(DisplayOption::AgainstA),
        "combined" | "total" => Ok(DisplayOption::Combined),
        other => bail!("unknown display '{other}' (for, against or combined)"),
    }
}

fn parse_venue(raw: &str) -> Result<VenueFilter> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "any" | "all" => Ok(VenueFilter::Any),
        "home" => Ok(VenueFilter::Home),
        "away" => Ok(VenueFilter::Away),
        other => bail!("unknown venue '{other}' (any, home or away)"),
    }
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
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

fn print_usage() {
    println!("odds_probe: one-shot analysis snapshot without the TUI");
    println!();
    println!("usage: odds_probe --team-a <name> --team-b <name> [options]");
    println!("  --league <name>    league to query (default Premier League)");
    println!("  --season <id>      season like 2025-26, or all (default all)");
    println!("  --stat <key>       shots, shots_on_target, corners, goals, yellow, red");
    println!("  --display <mode>   for, against or combined");
    println!("  --venue <filter>   any, home or away");
    println!("  --sample <n>       matches to chart, 1..={MATCH_FETCH_LIMIT}");
    println!("  --line <x.5>       reference line, clamped to the stat range");
    println!("  --smooth <level>   off, 1, 2 or 3");
    println!("  --source <name>    demo, sqlite or remote (default demo or STATLINE_SOURCE)");
}
