use std::path::PathBuf;

use clap::Parser;
use comcigan::{Timetable, TimetableOptions};
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(
    name = "comcigan",
    about = "Fetches a school's weekly timetable from the Comcigan portal.",
    version
)]
struct ComciganOptions {
    /// School search keyword. Must match exactly one school.
    keyword: String,

    /// The highest grade to fetch.
    #[arg(short = 'g', long = "max-grade", default_value_t = 3)]
    max_grade: u32,

    /// Only print this grade.
    #[arg(long)]
    grade: Option<u32>,

    /// Only print this class. Requires --grade.
    #[arg(long, requires = "grade")]
    class: Option<u32>,

    /// Write the timetable JSON to a file instead of stdout.
    #[arg(short = 'o', long = "out")]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    setup_tracing();
    color_eyre::install()?;
    let options = ComciganOptions::parse();

    let mut timetable = Timetable::with_options(TimetableOptions {
        max_grade: options.max_grade,
        ..Default::default()
    });

    timetable.init().await?;
    timetable.select_school(&options.keyword).await?;
    let mut schedule = timetable.get_timetable().await?;

    if let Some(grade) = options.grade {
        schedule.retain(|g, _| *g == grade);
        if let Some(class) = options.class {
            for classes in schedule.values_mut() {
                classes.retain(|c, _| *c == class);
            }
        }
    }

    let json = serde_json::to_string_pretty(&schedule)?;
    match options.out {
        Some(path) => {
            tokio::fs::write(&path, &json).await?;
            tracing::info!(path = %path.display(), "timetable written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();
}
