//! ironlog - adaptive strength training progression engine

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};

use ironlog::config::EngineConfig;
use ironlog::db::Database;
use ironlog::model::{ExercisePerformance, decode_templates};
use ironlog::planner::{SessionInputs, SessionPlanBuilder};
use ironlog::simulation::{Archetype, DEFAULT_SEED, Scenario, SimulationConfig, SimulationReport, Simulator};
use ironlog::store::{AthleteStore, Repository};

const DB_PATH: &str = "ironlog.db";

#[derive(Parser)]
#[command(name = "ironlog")]
#[command(author, version, about = "Adaptive strength training progression engine")]
struct Cli {
    /// SQLite database path
    #[arg(long, global = true, env = "IRONLOG_DB", default_value = DB_PATH)]
    db: String,

    /// Engine configuration (JSON); defaults apply when absent
    #[arg(long, global = true, env = "IRONLOG_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a deterministic long-horizon simulation
    Simulate {
        #[arg(short, long, value_enum, default_value = "intermediate")]
        archetype: Archetype,

        /// Number of workouts to simulate
        #[arg(short, long, default_value = "60")]
        workouts: u32,

        #[arg(short, long, value_enum, default_value = "baseline")]
        scenario: Scenario,

        #[arg(long, env = "IRONLOG_SEED", default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Save the simulated athlete's states, priors and decisions
        #[arg(long)]
        persist: bool,
    },

    /// Plan today's session from a template file
    Plan {
        #[arg(short, long)]
        user: String,

        /// JSON array of workout templates (legacy shapes accepted)
        #[arg(short, long)]
        templates: PathBuf,

        /// Template id; the first template when omitted
        #[arg(long)]
        template: Option<String>,

        /// Today is a planned deload week
        #[arg(long)]
        deload_week: bool,

        /// Readiness score 0-100, if measured elsewhere
        #[arg(long)]
        readiness: Option<u8>,

        #[arg(long, env = "IRONLOG_SEED", default_value_t = DEFAULT_SEED)]
        seed: u64,
    },

    /// Log performed exercises against the newest pending decisions
    Complete {
        #[arg(short, long)]
        user: String,

        /// JSON array of performed exercises
        #[arg(short, long)]
        results: PathBuf,

        #[arg(long, env = "IRONLOG_SEED", default_value_t = DEFAULT_SEED)]
        seed: u64,
    },

    /// Show exercise states for a user
    States {
        #[arg(short, long)]
        user: String,
    },

    /// Show recent decisions for a user
    Decisions {
        #[arg(short, long)]
        user: String,

        /// Number of records to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Reset bandit priors for a user (one family, or all)
    ResetBandit {
        #[arg(short, long)]
        user: String,

        /// Family key, e.g. "squat:barbell"
        #[arg(short, long)]
        family: Option<String>,
    },
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Simulate {
            archetype,
            workouts,
            scenario,
            seed,
            json,
            persist,
        } => {
            let sim = SimulationConfig {
                archetype,
                scenario,
                workouts,
                seed,
            };
            let simulator = Simulator::new(&config, sim.clone());
            let (report, store) = simulator.run();

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }

            if persist {
                let db = Database::open(&cli.db)?;
                store.persist(&db)?;
                println!("Saved {} to {}", sim.user_id(), cli.db);
            }
        }

        Commands::Plan {
            user,
            templates,
            template,
            deload_week,
            readiness,
            seed,
        } => {
            let raw = std::fs::read_to_string(&templates)
                .with_context(|| format!("reading templates {}", templates.display()))?;
            let report = decode_templates(&raw);
            for skipped in &report.skipped {
                println!("Skipped template {}: {}", skipped.key, skipped.reason);
            }
            let chosen = match &template {
                Some(id) => report.records.iter().find(|t| &t.id == id),
                None => report.records.first(),
            };
            let Some(chosen) = chosen else {
                bail!("no usable template in {}", templates.display());
            };

            let db = Database::open(&cli.db)?;
            let (mut athlete, _) = AthleteStore::load(&db, &user, seed)?;
            let inputs = SessionInputs {
                now: Utc::now(),
                readiness_override: readiness,
                planned_deload_week: deload_week,
                ..Default::default()
            };
            let plan = SessionPlanBuilder::new(&config).build(&mut athlete, chosen, &inputs);
            athlete.persist(&db)?;

            let model = plan.to_session_model();
            println!("{} | {}", model.title, model.readiness);
            println!("{:-<60}", "");
            for card in &model.cards {
                println!(
                    "{:28} | {:24} | {} | rest {}",
                    card.title, card.scheme, card.tempo, card.rest
                );
                if !card.badges.is_empty() {
                    println!("{:28}   [{}]", "", card.badges.join("] ["));
                }
            }
            if !model.insights.is_empty() {
                println!();
                for insight in &model.insights {
                    println!("{}", insight);
                }
            }
        }

        Commands::Complete { user, results, seed } => {
            let raw = std::fs::read_to_string(&results)
                .with_context(|| format!("reading results {}", results.display()))?;
            let performances: Vec<ExercisePerformance> =
                serde_json::from_str(&raw).with_context(|| format!("parsing results {}", results.display()))?;

            let db = Database::open(&cli.db)?;
            let (mut athlete, _) = AthleteStore::load(&db, &user, seed)?;
            let completion = SessionPlanBuilder::new(&config).complete_pending(&mut athlete, &performances);
            athlete.persist(&db)?;

            println!("Logged {} exercises for {}", completion.snapshots.len(), user);
            println!("{:-<60}", "");
            for snapshot in &completion.snapshots {
                println!(
                    "{:20} | next {:>7.1} x {:>2} | {}",
                    snapshot.exercise_id, snapshot.next_weight, snapshot.next_target_reps, snapshot.reason
                );
            }
            for (id, reward) in &completion.rewards {
                println!("Reward {:.0} applied to decision {}", reward, id);
            }
            for err in &completion.errors {
                println!("Not logged: {}", err);
            }
        }

        Commands::States { user } => {
            let db = Database::open(&cli.db)?;
            let report = db.load_states(&user)?;
            println!("Exercise states for {}:", user);
            println!("{:-<72}", "");
            for state in &report.records {
                println!(
                    "{:20} | {:>7.1} | fails {} | e1RM {:>7} | {}",
                    state.exercise_id,
                    state.current_working_weight,
                    state.failures_count,
                    state
                        .rolling_e1rm
                        .map(|e| format!("{:.1}", e))
                        .unwrap_or_else(|| "-".to_string()),
                    state.e1rm_trend.label()
                );
            }
            if !report.is_clean() {
                println!("({} corrupt records skipped)", report.skipped.len());
            }
        }

        Commands::Decisions { user, limit } => {
            let db = Database::open(&cli.db)?;
            let report = db.recent_decisions(&user, limit)?;
            println!("Recent decisions for {}:", user);
            println!("{:-<72}", "");
            for entry in &report.records {
                println!(
                    "{} | {:20} | {:8} {:14} | {:>7.1} | {}",
                    entry.created_at.format("%Y-%m-%d %H:%M"),
                    entry.exercise_id(),
                    entry.selection.exploration_mode.label(),
                    entry.selection.executed_policy_id.id(),
                    entry.action.prescribed_load,
                    entry
                        .reward
                        .map(|r| format!("reward {:.0}", r))
                        .unwrap_or_else(|| "pending".to_string())
                );
            }
        }

        Commands::ResetBandit { user, family } => {
            let db = Database::open(&cli.db)?;
            let removed = db.reset_priors(&user, family.as_deref())?;
            match family {
                Some(f) => println!("Reset {} priors for {} ({})", removed, user, f),
                None => println!("Reset {} priors for {}", removed, user),
            }
        }
    }

    Ok(())
}

fn print_report(report: &SimulationReport) {
    println!(
        "Simulation: {} / {} ({} workouts, seed {})",
        report.archetype, report.scenario, report.workouts, report.seed
    );
    println!("{:-<60}", "");
    println!("Exercises planned: {}", report.exercises_planned);
    println!("Load increases:    {}", report.load_increases);
    println!("Rep increases:     {}", report.rep_increases);
    println!("Holds:             {}", report.holds);
    println!("Failures:          {}", report.failures);
    println!("Load decreases:    {}", report.load_decreases);
    if report.completion_errors > 0 {
        println!("Completion errors: {}", report.completion_errors);
    }

    print_counts("Deloads by reason", &report.deloads_by_reason);
    print_counts("Insights by topic", &report.insights_by_topic);
    print_counts("Selection modes", &report.modes);
    print_counts("Explored arms", &report.arm_histogram);
    print_counts("Shadow arms", &report.shadow_histogram);

    if let Some(mean) = report.mean_reward {
        println!();
        println!("Mean reward: {:.2} over {} explored decisions", mean, report.rewards_applied);
    }

    println!();
    println!("Final state");
    println!("{:-<60}", "");
    for (id, weight) in &report.final_weights {
        let e1rm = report
            .final_e1rm
            .get(id)
            .map(|e| format!("{:.1}", e))
            .unwrap_or_else(|| "-".to_string());
        let truth = report
            .true_maxes
            .get(id)
            .map(|e| format!("{:.1}", e))
            .unwrap_or_else(|| "-".to_string());
        println!("{:20} | {:>7.1} | e1RM {:>7} | true {:>7}", id, weight, e1rm, truth);
    }

    if !report.arm_means.is_empty() {
        println!();
        println!("Arm means");
        println!("{:-<60}", "");
        for (family, arms) in &report.arm_means {
            let means: Vec<String> = arms.iter().map(|(arm, m)| format!("{} {:.2}", arm, m)).collect();
            println!("{:24} | {}", family, means.join(", "));
        }
    }
}

fn print_counts(title: &str, counts: &std::collections::BTreeMap<String, u32>) {
    if counts.is_empty() {
        return;
    }
    println!();
    println!("{}", title);
    println!("{:-<40}", "");
    for (key, count) in counts {
        println!("{:24} {:>6}", key, count);
    }
}
