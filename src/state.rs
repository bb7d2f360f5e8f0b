use std::collections::{HashMap, VecDeque};

use chrono::NaiveDate;

/// Leagues the match database is seeded with. The picker cycles through these.
pub const LEAGUES: &[&str] = &[
    "Premier League",
    "La Liga",
    "Bundesliga",
    "Serie A",
    "Championship",
];

/// Season sentinel meaning "no season filter".
pub const ALL_SEASONS: &str = "all";

/// Hard cap on rows per team-match fetch, and the sample slider maximum.
pub const MATCH_FETCH_LIMIT: usize = 30;

pub const DEFAULT_SAMPLE: usize = 24;
pub const DEFAULT_LINE: f64 = 12.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatCategory {
    Shots,
    ShotsOnTarget,
    Corners,
    Goals,
    Yellow,
    Red,
}

impl StatCategory {
    pub const ALL: [StatCategory; 6] = [
        StatCategory::Shots,
        StatCategory::ShotsOnTarget,
        StatCategory::Corners,
        StatCategory::Goals,
        StatCategory::Yellow,
        StatCategory::Red,
    ];

    /// Stable storage key used in table columns and the averages-against rows.
    pub fn key(self) -> &'static str {
        match self {
            StatCategory::Shots => "shots",
            StatCategory::ShotsOnTarget => "shots_on_target",
            StatCategory::Corners => "corners",
            StatCategory::Goals => "goals",
            StatCategory::Yellow => "yellow",
            StatCategory::Red => "red",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cat| cat.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            StatCategory::Shots => "Shots",
            StatCategory::ShotsOnTarget => "Shots on Target",
            StatCategory::Corners => "Corners",
            StatCategory::Goals => "Goals",
            StatCategory::Yellow => "Yellow Cards",
            StatCategory::Red => "Red Cards",
        }
    }

    /// Upper bound for the reference-line slider, per category.
    pub fn line_max(self) -> f64 {
        match self {
            StatCategory::Goals => 8.0,
            StatCategory::Shots => 30.0,
            StatCategory::ShotsOnTarget => 15.0,
            StatCategory::Corners => 20.0,
            StatCategory::Yellow => 10.0,
            StatCategory::Red => 5.0,
        }
    }

    pub fn next(self) -> Self {
        match self {
            StatCategory::Shots => StatCategory::ShotsOnTarget,
            StatCategory::ShotsOnTarget => StatCategory::Corners,
            StatCategory::Corners => StatCategory::Goals,
            StatCategory::Goals => StatCategory::Yellow,
            StatCategory::Yellow => StatCategory::Red,
            StatCategory::Red => StatCategory::Shots,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayOption {
    ForA,
    AgainstA,
    Combined,
}

impl DisplayOption {
    pub fn label(self) -> &'static str {
        match self {
            DisplayOption::ForA => "For Team A",
            DisplayOption::AgainstA => "Against Team A",
            DisplayOption::Combined => "Combined",
        }
    }

    pub fn next(self) -> Self {
        match self {
            DisplayOption::ForA => DisplayOption::AgainstA,
            DisplayOption::AgainstA => DisplayOption::Combined,
            DisplayOption::Combined => DisplayOption::ForA,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VenueFilter {
    Any,
    Home,
    Away,
}

impl VenueFilter {
    pub fn label(self) -> &'static str {
        match self {
            VenueFilter::Any => "All",
            VenueFilter::Home => "Home",
            VenueFilter::Away => "Away",
        }
    }

    pub fn admits(self, is_home: bool) -> bool {
        match self {
            VenueFilter::Any => true,
            VenueFilter::Home => is_home,
            VenueFilter::Away => !is_home,
        }
    }

    pub fn next(self) -> Self {
        match self {
            VenueFilter::Any => VenueFilter::Home,
            VenueFilter::Home => VenueFilter::Away,
            VenueFilter::Away => VenueFilter::Any,
        }
    }
}

/// One team's line from one fixture. Stats are stored as for/against pairs;
/// absent columns default to zero at the parse boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub team: String,
    pub opponent: String,
    pub match_date: NaiveDate,
    pub is_home: bool,
    pub season: String,
    pub shots_for: u32,
    pub shots_against: u32,
    pub shots_on_target_for: u32,
    pub shots_on_target_against: u32,
    pub corners_for: u32,
    pub corners_against: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub yellow_for: u32,
    pub yellow_against: u32,
    pub red_for: u32,
    pub red_against: u32,
}

impl MatchRecord {
    pub fn stat_for(&self, category: StatCategory) -> u32 {
        match category {
            StatCategory::Shots => self.shots_for,
            StatCategory::ShotsOnTarget => self.shots_on_target_for,
            StatCategory::Corners => self.corners_for,
            StatCategory::Goals => self.goals_for,
            StatCategory::Yellow => self.yellow_for,
            StatCategory::Red => self.red_for,
        }
    }

    pub fn stat_against(&self, category: StatCategory) -> u32 {
        match category {
            StatCategory::Shots => self.shots_against,
            StatCategory::ShotsOnTarget => self.shots_on_target_against,
            StatCategory::Corners => self.corners_against,
            StatCategory::Goals => self.goals_against,
            StatCategory::Yellow => self.yellow_against,
            StatCategory::Red => self.red_against,
        }
    }

    pub fn stat_total(&self, category: StatCategory) -> u32 {
        self.stat_for(category) + self.stat_against(category)
    }
}

/// Per-league-season baseline rate for one statistic.
#[derive(Debug, Clone, PartialEq)]
pub struct LeagueAverage {
    pub league: String,
    pub season: String,
    pub stat_type: StatCategory,
    pub home_average: f64,
    pub away_average: f64,
    pub league_average: f64,
    pub matches_counted: u32,
    pub updated_at: Option<String>,
}

/// Combined baseline for a category, or 0.0 when no row matches.
pub fn league_baseline(averages: &[LeagueAverage], category: StatCategory) -> f64 {
    averages
        .iter()
        .find(|row| row.stat_type == category)
        .map(|row| row.league_average)
        .unwrap_or(0.0)
}

/// One chart bar after the full pipeline ran. Padding points carry an empty
/// opponent and no date.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartPoint {
    pub match_date: Option<NaiveDate>,
    pub opponent: String,
    pub value: f64,
    pub original_value: f64,
    pub smoothed: bool,
    pub moving_average: f64,
    pub average_against: f64,
}

impl ChartPoint {
    pub fn is_padding(&self) -> bool {
        self.match_date.is_none() && self.opponent.is_empty()
    }
}

/// The full control set driving the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub league: Option<String>,
    pub season: String,
    pub team_a: Option<String>,
    pub team_b: Option<String>,
    pub category: StatCategory,
    pub display: DisplayOption,
    pub venue: VenueFilter,
    pub sample_size: usize,
    /// Independent Team B window for the odds model; None follows `sample_size`.
    pub team_b_sample: Option<usize>,
    pub line: f64,
    pub smoothing: bool,
    pub smoothing_strength: u8,
    pub show_moving_average: bool,
    pub show_average_against: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            league: None,
            season: ALL_SEASONS.to_string(),
            team_a: None,
            team_b: None,
            category: StatCategory::Shots,
            display: DisplayOption::ForA,
            venue: VenueFilter::Any,
            sample_size: DEFAULT_SAMPLE,
            team_b_sample: None,
            line: DEFAULT_LINE,
            smoothing: false,
            smoothing_strength: 2,
            show_moving_average: false,
            show_average_against: false,
        }
    }
}

impl AnalysisConfig {
    pub fn effective_team_b_sample(&self) -> usize {
        self.team_b_sample.unwrap_or(self.sample_size)
    }

    /// Lines sit on half integers so over/under is never a push.
    pub fn nudge_line(&mut self, steps: i32) {
        let max = self.category.line_max() - 0.5;
        let next = self.line + f64::from(steps);
        self.line = next.clamp(0.5, max);
    }

    /// Re-fit the line to the freshly selected category's range.
    pub fn clamp_line_to_category(&mut self) {
        let max = self.category.line_max() - 0.5;
        self.line = self.line.clamp(0.5, max);
    }

    pub fn season_label(&self) -> &str {
        if self.season == ALL_SEASONS {
            "All Seasons"
        } else {
            &self.season
        }
    }
}

/// Monotonic counters, one per fetch kind. A response is applied only when it
/// carries the latest issued counter for its kind, so superseding the matches
/// request cannot drop a still-valid seasons response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchGenerations {
    pub seasons: u64,
    pub roster: u64,
    pub matches: u64,
    pub opponents: u64,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AnalysisConfig,
    /// Distinct seasons for the selected league, newest first. Excludes the
    /// "all" sentinel, which the picker prepends.
    pub seasons: Vec<String>,
    pub teams: Vec<String>,
    pub league_averages: Vec<LeagueAverage>,
    pub team_a_matches: Vec<MatchRecord>,
    pub team_b_matches: Vec<MatchRecord>,
    /// Opponent name to average-conceded, for the chart overlay.
    pub opponent_averages: HashMap<String, f64>,
    pub roster_loading: bool,
    pub matches_loading: bool,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub generations: FetchGenerations,
    /// Set whenever an input of the pipeline changed; drained by the host
    /// once per tick.
    pub dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            config: AnalysisConfig::default(),
            seasons: Vec::new(),
            teams: Vec::new(),
            league_averages: Vec::new(),
            team_a_matches: Vec::new(),
            team_b_matches: Vec::new(),
            opponent_averages: HashMap::new(),
            roster_loading: false,
            matches_loading: false,
            logs: VecDeque::new(),
            help_overlay: false,
            generations: FetchGenerations::default(),
            dirty: true,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn next_seasons_generation(&mut self) -> u64 {
        self.generations.seasons += 1;
        self.generations.seasons
    }

    pub fn next_roster_generation(&mut self) -> u64 {
        self.generations.roster += 1;
        self.generations.roster
    }

    pub fn next_matches_generation(&mut self) -> u64 {
        self.generations.matches += 1;
        self.generations.matches
    }

    pub fn next_opponents_generation(&mut self) -> u64 {
        self.generations.opponents += 1;
        self.generations.opponents
    }
}

/// State updates emitted by the provider thread. Fetch results carry the
/// generation of the request that produced them.
#[derive(Debug, Clone)]
pub enum Delta {
    Seasons {
        generation: u64,
        seasons: Vec<String>,
    },
    Roster {
        generation: u64,
        teams: Vec<String>,
        averages: Vec<LeagueAverage>,
    },
    /// Both teams' rows from one joined fetch, so state never holds a
    /// half-updated pair.
    Matches {
        generation: u64,
        team_a: Vec<MatchRecord>,
        team_b: Vec<MatchRecord>,
    },
    OpponentAverages {
        generation: u64,
        averages: HashMap<String, f64>,
    },
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchSeasons {
        generation: u64,
        league: String,
    },
    FetchRoster {
        generation: u64,
        league: String,
        season: String,
    },
    FetchMatches {
        generation: u64,
        team_a: String,
        team_b: String,
        season: String,
    },
    FetchOpponentAverages {
        generation: u64,
        category: StatCategory,
        opponents: Vec<String>,
        season: String,
        /// League-wide baseline used when neither the precomputed table nor
        /// raw rows can supply an opponent's average.
        league_fallback: f64,
    },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::Seasons { generation, seasons } => {
            if generation != state.generations.seasons {
                // Response for a league the user already navigated away from.
                return;
            }
            state.seasons = seasons;
            if state.config.season != ALL_SEASONS
                && !state.seasons.iter().any(|s| *s == state.config.season)
            {
                state.config.season = ALL_SEASONS.to_string();
                state.dirty = true;
            }
        }
        Delta::Roster {
            generation,
            teams,
            averages,
        } => {
            if generation != state.generations.roster {
                return;
            }
            state.teams = teams;
            state.league_averages = averages;
            state.roster_loading = false;
            // A selection that vanished from the listing is cleared with its data.
            if let Some(team) = &state.config.team_a
                && !state.teams.contains(team)
            {
                state.config.team_a = None;
                state.team_a_matches.clear();
            }
            if let Some(team) = &state.config.team_b
                && !state.teams.contains(team)
            {
                state.config.team_b = None;
                state.team_b_matches.clear();
            }
            state.dirty = true;
        }
        Delta::Matches {
            generation,
            team_a,
            team_b,
        } => {
            if generation != state.generations.matches {
                return;
            }
            state.team_a_matches = team_a;
            state.team_b_matches = team_b;
            state.matches_loading = false;
            state.dirty = true;
        }
        Delta::OpponentAverages {
            generation,
            averages,
        } => {
            if generation != state.generations.opponents {
                return;
            }
            state.opponent_averages = averages;
            state.dirty = true;
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
