use std::fmt;
use std::sync::Arc;

use course_core::model::{CourseId, EnrollmentBucket};
use course_core::VideoStatus;
use services::config::BASE_URL_VAR;
use services::{AppServices, ClientConfig, Clock, TracingNotifier, UpdateOutcome};
use tracing::info;

mod logger;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingCourse,
    InvalidCourseId { raw: String },
    InvalidIndex { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingCourse => write!(f, "viewer requires --course <id>"),
            ArgsError::InvalidCourseId { raw } => write!(f, "invalid --course value: {raw:?}"),
            ArgsError::InvalidIndex { raw } => write!(f, "invalid --complete value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- dashboard [--api <url>]");
    eprintln!("  cargo run -p app -- viewer --course <id> [--api <url>] [--complete <index>]");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  COURSE_API_BASE_URL, COURSE_API_TOKEN, COURSE_STUDENT_ID,");
    eprintln!("  COURSE_COMPLETION_THRESHOLD, COURSE_COMPLETION_DEBOUNCE_MS, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Dashboard,
    Viewer {
        course_id: CourseId,
        complete: Option<usize>,
    },
}

#[derive(Debug)]
struct Args {
    api: Option<String>,
    command: Command,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let Some(subcommand) = args.next() else {
            return Ok(None);
        };
        let is_viewer = match subcommand.as_str() {
            "dashboard" => false,
            "viewer" => true,
            "--help" | "-h" => return Ok(None),
            _ => return Err(ArgsError::UnknownArg(subcommand)),
        };

        let mut api = None;
        let mut course_id = None;
        let mut complete = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => api = Some(require_value(&mut args, "--api")?),
                "--course" if is_viewer => {
                    let raw = require_value(&mut args, "--course")?;
                    let parsed = raw
                        .parse::<CourseId>()
                        .map_err(|_| ArgsError::InvalidCourseId { raw: raw.clone() })?;
                    course_id = Some(parsed);
                }
                "--complete" if is_viewer => {
                    let raw = require_value(&mut args, "--complete")?;
                    let index = raw
                        .parse::<usize>()
                        .map_err(|_| ArgsError::InvalidIndex { raw: raw.clone() })?;
                    complete = Some(index);
                }
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let command = if is_viewer {
            Command::Viewer {
                course_id: course_id.ok_or(ArgsError::MissingCourse)?,
                complete,
            }
        } else {
            Command::Dashboard
        };
        Ok(Some(Self { api, command }))
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Args::parse(std::env::args().skip(1)).map_err(|e| {
        print_usage();
        e
    })?;
    let Some(args) = parsed else {
        print_usage();
        return Ok(());
    };

    let config = ClientConfig::from_lookup(|key| {
        if key == BASE_URL_VAR && args.api.is_some() {
            return args.api.clone();
        }
        std::env::var(key).ok()
    })?;
    info!(api = %config.api_base_url, "client configured");

    let services = AppServices::from_config(&config, Clock::system(), Arc::new(TracingNotifier));

    match args.command {
        Command::Dashboard => {
            let dashboard = services.dashboard().load().await?;
            for tab in dashboard.tabs() {
                println!("{} ({})", tab.label, tab.count);
                for progress in dashboard.courses(tab.bucket) {
                    println!(
                        "  {}  {:.0}%",
                        progress.course_id,
                        percentage_for_display(progress.progress_percentage)
                    );
                }
            }
            if dashboard.is_empty() {
                println!("No enrolled courses.");
            }
        }
        Command::Viewer {
            course_id,
            complete,
        } => {
            let viewer = services.viewer();
            let mut session = viewer.open(&course_id).await?;

            if let Some(index) = complete {
                session.select_video(index)?;
                if let Some(UpdateOutcome::Failed(err)) = session.on_ended().finished().await {
                    return Err(err.into());
                }
                viewer.refresh(&mut session).await?;
            }

            let view = session.view();
            println!(
                "{}  {:.0}%  [{}]",
                session.course().title(),
                percentage_for_display(view.progress_percentage),
                view.bucket.label()
            );
            for (index, (video, status)) in view.rows(session.course()).enumerate() {
                let marker = if index == session.playback().active_video_index() {
                    '>'
                } else {
                    ' '
                };
                let check = match status {
                    VideoStatus::Completed => 'x',
                    VideoStatus::NotCompleted => ' ',
                };
                println!("{marker} [{check}] {:>2}. {}", index + 1, video.title);
            }
            if view.bucket == EnrollmentBucket::Completed {
                println!("Course complete.");
            }
        }
    }
    Ok(())
}

fn percentage_for_display(raw: f64) -> f64 {
    if raw.is_finite() { raw.clamp(0.0, 100.0) } else { 0.0 }
}

#[tokio::main]
async fn main() {
    if let Err(err) = logger::init() {
        eprintln!("failed to initialise logging: {err}");
    }
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
