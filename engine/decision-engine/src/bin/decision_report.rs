//! # Decision Report Binary
//!
//! Prints decision-quality reports for a team or a whole league.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use decision_engine::logging::initialize_logging_from_config;
use decision_engine::{DecisionService, EngineConfig, LoadState, WeekMarker};
use tracing::info;

/// Fantasy decision-quality reports
#[derive(Parser)]
#[command(name = "decision-report")]
#[command(about = "Score start/sit decisions for a fantasy league")]
struct Cli {
    /// League to analyze (overrides FANTASY_LEAGUE_ID)
    #[arg(long)]
    league_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Season report for one team
    Season {
        #[arg(long)]
        team: String,
        #[arg(long, default_value = "2024")]
        year: i32,
    },
    /// Single week report for one team
    Week {
        #[arg(long)]
        team: String,
        #[arg(long, default_value = "2024")]
        year: i32,
        #[arg(long)]
        week: u32,
    },
    /// Ranked league table
    League {
        #[arg(long, default_value = "2024")]
        year: i32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let mut config = EngineConfig::from_env()?;
    if let Some(league_id) = cli.league_id {
        config.source.league_id = league_id;
    }
    initialize_logging_from_config(&config.logging)?;
    info!("Using league backend at {}", config.source.base_url);

    let service =
        DecisionService::from_config(config).context("Failed to create decision service")?;

    match cli.command {
        Commands::Season { team, year } => {
            let outcome = service
                .season_summary(&team, year, |progress| {
                    let errors: Vec<String> = progress
                        .weeks
                        .iter()
                        .filter(|m| !matches!(m, WeekMarker::Loaded(_)))
                        .map(|m| m.to_string())
                        .collect();
                    let phase = match progress.state {
                        LoadState::ChunkFetch { index, of } => format!("chunk {}/{}", index, of),
                        state => format!("{:?}", state),
                    };
                    if errors.is_empty() {
                        println!("  [{}] {}/{} weeks", phase, progress.loaded, progress.total);
                    } else {
                        println!(
                            "  [{}] {}/{} weeks ({})",
                            phase,
                            progress.loaded,
                            progress.total,
                            errors.join(", ")
                        );
                    }
                })
                .await
                .with_context(|| format!("Failed to load season for team {}", team))?;

            let summary = &outcome.summary;
            println!();
            println!("Team {} - {} season", team, year);
            if outcome.degraded {
                println!(
                    "Warning: {} of {} chunks failed, {} weeks missing, report is incomplete",
                    outcome.failed_chunks,
                    outcome.attempted_chunks,
                    outcome.missing_weeks.len()
                );
            }
            println!("Rating:               {}", summary.rating);
            println!("Weeks analyzed:       {}", summary.total_weeks);
            println!("Average points:       {:.1}", summary.avg_points);
            println!("Avg process score:    {:.1}/10", summary.avg_process_score);
            println!("Points lost to bench: {:.1}", summary.points_lost_to_bench);
            println!(
                "Weeks by tier:        {} elite, {} strong, {} average, {} poor",
                summary.tier_counts.elite,
                summary.tier_counts.strong,
                summary.tier_counts.average,
                summary.tier_counts.poor
            );

            println!();
            println!("Week  Points  Process  Top player");
            for week in &summary.weekly_performance {
                println!(
                    "{:>4}  {:>6.1}  {:>7.1}  {} ({:.1}){}",
                    week.week,
                    week.points,
                    week.process_score,
                    week.top_player,
                    week.top_points,
                    week.big_miss
                        .as_ref()
                        .map(|miss| format!("  missed: {}", miss))
                        .unwrap_or_default()
                );
            }

            if !summary.highlights.is_empty() {
                println!();
                println!("Highlights:");
                for highlight in &summary.highlights {
                    println!(
                        "  Week {}: {} ({}) {:.1} pts",
                        highlight.week, highlight.player, highlight.position, highlight.points
                    );
                }
            }

            if !summary.improvement_areas.is_empty() {
                println!();
                println!("Improvement areas:");
                for area in &summary.improvement_areas {
                    println!(
                        "  [{}] {}: +{:.1} pts - {}",
                        area.priority, area.area, area.missed_points, area.description
                    );
                }
            }
        }
        Commands::Week { team, year, week } => {
            let summary = service
                .week_summary(&team, year, week)
                .await
                .with_context(|| format!("Failed to load week {} for team {}", week, team))?;

            println!("Week {} - {}", summary.week, summary.context);
            println!(
                "Points: {:.1} (projected {:.1}, {:+.1})",
                summary.total_points, summary.total_projected, summary.projection_diff
            );
            println!("Process score: {:.1}/10", summary.avg_process_score);
            println!();
            for decision in &summary.decisions {
                println!(
                    "  {:<5} {:<24} {:>5.1} pts  {:>4.1}/10  {}",
                    decision.position,
                    decision.player,
                    decision.points,
                    decision.total,
                    decision.reasoning
                );
            }
            println!();
            for insight in &summary.insights {
                println!("  - {}", insight);
            }
            println!();
            println!("{}", summary.bottom_line);
        }
        Commands::League { year } => {
            let snapshot = service
                .league_snapshot(year)
                .await
                .context("Failed to load league snapshot")?;
            let deltas = snapshot.deltas();

            println!("League {} - average process score {:.1}", year, snapshot.league_average());
            println!();
            println!("Rank  Team                      Owner             Process  Pts/G   vs Avg  vs Lead");
            for (standing, delta) in snapshot.teams.iter().zip(deltas.iter()) {
                println!(
                    "{:>4}  {:<24}  {:<16}  {:>7.1}  {:>5.1}  {:>+6.1}  {:>+7.1}",
                    standing.rank,
                    standing.team_name,
                    standing.owner_name,
                    standing.summary.avg_process_score,
                    standing.summary.avg_points,
                    delta.vs_average,
                    delta.vs_leader
                );
            }
            if let Some(top) = snapshot.most_points_per_game() {
                println!();
                println!(
                    "Most points per game: {} ({:.1})",
                    top.team_name, top.summary.avg_points
                );
            }
        }
    }

    Ok(())
}
