use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use interview_srs::config::{self, StudyConfig};
use interview_srs::db::{self, DbPool};
use interview_srs::domain::{ProblemId, Rating, UserId};
use interview_srs::study::{self, ReviewSubmission};
use interview_srs::{session, srs, Result};

/// Spaced-repetition scheduler for coding-interview problems
#[derive(Parser, Debug)]
#[command(name = "interview-srs")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Database file (overrides config.toml and DATABASE_PATH)
  #[arg(long, global = true)]
  db: Option<PathBuf>,

  /// Acting user
  #[arg(short, long, global = true, default_value_t = 1)]
  user: UserId,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Create the database and run migrations
  Init,

  /// Import a JSON problem catalogue as a preset set
  Seed {
    /// Catalogue file
    file: PathBuf,
    /// Set name, e.g. "NeetCode 150"
    #[arg(short, long)]
    name: String,
    #[arg(short, long)]
    description: Option<String>,
  },

  /// Rate an attempt: again, hard, medium or easy
  Review {
    problem: ProblemId,
    rating: Rating,
    /// Minutes spent (capped at 60)
    #[arg(short, long)]
    time: Option<i64>,
    #[arg(short, long)]
    notes: Option<String>,
  },

  /// Show the interval each rating would produce
  Preview { problem: ProblemId },

  /// What to study now
  Queue {
    /// Number of problems (default from config.toml)
    #[arg(short, long)]
    limit: Option<usize>,
    /// Problems skipped for this session
    #[arg(short, long, value_delimiter = ',')]
    skip: Vec<ProblemId>,
    /// Visitor queue from the guest curriculum
    #[arg(long)]
    guest: bool,
  },

  /// Attempted problems by due date
  Upcoming,

  /// Preset sets and which ones you study
  Sets,

  /// One set's problems with their status
  Set { set: i64 },

  /// One problem with its scheduling record
  Problem { problem: ProblemId },

  /// Change the daily review goal (1 to 20)
  Goal { goal: i64 },

  /// Forget progress for a problem or a whole set
  Reset {
    #[arg(long, conflicts_with = "set", required_unless_present = "set")]
    problem: Option<ProblemId>,
    #[arg(long)]
    set: Option<i64>,
  },

  /// Activate or deactivate a set
  ToggleSet { set: i64 },

  /// Mastery counts and review activity
  Stats,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

fn run(cli: Cli, pool: &DbPool) -> Result<()> {
  let conn = db::try_lock(pool)?;
  let study_config = StudyConfig::load();
  let now = Utc::now();

  match cli.command {
    Commands::Init => print_json(&json!({ "initialized": true })),
    Commands::Seed {
      file,
      name,
      description,
    } => {
      let problems = db::load_seed_file(&file)?;
      let report = db::seed_problem_set(&conn, &name, description.as_deref(), &problems, now)?;
      print_json(&report)
    }
    Commands::Review {
      problem,
      rating,
      time,
      notes,
    } => {
      let submission = ReviewSubmission {
        problem_id: problem,
        rating,
        time_spent: time,
        notes,
      };
      let outcome = study::submit_review(&*conn, cli.user, submission, now)?;
      print_json(&json!({
        "problem_id": outcome.problem_id,
        "next_review": outcome.next_review,
        "interval": outcome.interval,
        "interval_label": srs::format_interval(outcome.interval),
        "status": outcome.status,
      }))
    }
    Commands::Preview { problem } => {
      let preview = study::preview_for(&*conn, cli.user, problem)?;
      let labels: serde_json::Map<String, serde_json::Value> = Rating::ALL
        .iter()
        .map(|r| (r.to_string(), json!(srs::format_interval(preview.for_rating(*r)))))
        .collect();
      print_json(&json!({ "days": preview, "labels": labels }))
    }
    Commands::Queue { limit, skip, guest } => {
      let limit = limit.unwrap_or(study_config.queue_limit);
      let queue = if guest {
        study::guest_queue(&*conn, &study_config, limit)?
      } else {
        let session_id = session::generate_session_id();
        for problem_id in skip {
          session::skip(&session_id, problem_id);
        }
        let queue = study::session_queue(&*conn, &study_config, cli.user, &session_id, limit, now);
        session::clear(&session_id);
        queue?
      };
      print_json(&queue)
    }
    Commands::Upcoming => print_json(&study::upcoming(&*conn, cli.user)?),
    Commands::Sets => print_json(&study::list_sets(&*conn, cli.user)?),
    Commands::Set { set } => print_json(&study::set_detail(&*conn, cli.user, set)?),
    Commands::Problem { problem } => print_json(&study::problem_detail(&*conn, cli.user, problem)?),
    Commands::Goal { goal } => {
      let goal = study::update_daily_goal(&*conn, cli.user, goal, now)?;
      print_json(&json!({ "daily_goal": goal }))
    }
    Commands::Reset { problem, set } => {
      let reset = match (problem, set) {
        (Some(problem), _) => study::reset_problem(&*conn, cli.user, problem)?,
        (None, Some(set)) => study::reset_set(&*conn, cli.user, set)?,
        (None, None) => 0,
      };
      print_json(&json!({ "reset": reset }))
    }
    Commands::ToggleSet { set } => {
      let active = study::toggle_set(&*conn, cli.user, set, now)?;
      print_json(&json!({ "problem_set_id": set, "active": active }))
    }
    Commands::Stats => print_json(&study::progress_summary(&*conn, &study_config, cli.user, now)?),
  }
}

fn main() -> ExitCode {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "interview_srs=info".into()),
    )
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();

  let cli = Cli::parse();

  let db_path = cli.db.clone().unwrap_or_else(config::load_database_path);
  let pool = match db::init_db(&db_path) {
    Ok(pool) => pool,
    Err(e) => {
      tracing::error!("Failed to open database {}: {}", db_path.display(), e);
      return ExitCode::FAILURE;
    }
  };

  match run(cli, &pool) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      tracing::error!("{}", e);
      eprintln!("error: {}", e);
      ExitCode::FAILURE
    }
  }
}
