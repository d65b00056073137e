#![deny(unused_crate_dependencies)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

mod calendar;
mod config;
mod error;
mod event;
mod fetch;
mod hash;
mod ledger;
mod parse;
mod source;
mod sync;

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};

use crate::{
    calendar::{Authenticator, GoogleCalendar},
    config::Config,
    fetch::Direction,
    ledger::Ledger,
    parse::{Diet, Meal},
    source::{MenuSource, UnicampMenu},
    sync::{RangeReport, Synchronizer},
};

pub use error::{Error, Result};

#[cfg(all(target_env = "musl", target_pointer_width = "64"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Keeps Google calendars in step with the Unicamp restaurant menus.
#[derive(Parser, Debug)]
#[command(name = "bandeco", version)]
struct Cli {
    /// Config file; `.txt` reads the two-line calendar id form.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every meal served on a day.
    Show {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Create the day's events the ledger has not seen yet.
    Sync {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        meal: Option<Meal>,
        #[arg(long)]
        veg: bool,
    },
    /// `sync` for a range of days.
    SyncRange {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long)]
        meal: Option<Meal>,
        #[arg(long)]
        veg: bool,
    },
    /// Create events for a range of days, ignoring the ledger.
    Populate {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long)]
        meal: Option<Meal>,
        #[arg(long)]
        veg: bool,
    },
    /// Delete the range's events then create them again.
    Rebuild {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long)]
        veg: bool,
    },
    /// Delete every event on a calendar.
    Clear {
        #[arg(long)]
        veg: bool,
    },
}

#[derive(Args, Debug)]
struct RangeArgs {
    #[arg(long)]
    start: Option<NaiveDate>,
    #[arg(long, default_value_t = 7)]
    days: u32,
    /// Walk back from the start date, which is then left out.
    #[arg(long)]
    backward: bool,
}

impl RangeArgs {
    fn start(&self) -> NaiveDate {
        self.start.unwrap_or_else(today)
    }

    const fn direction(&self) -> Direction {
        Direction::from_backward_flag(self.backward)
    }
}

/// The date in Campinas, whatever the host clock's zone.
fn today() -> NaiveDate {
    Utc::now().with_timezone(&event::local_offset()).date_naive()
}

fn meals(meal: Option<Meal>) -> Vec<Meal> {
    meal.map_or_else(|| Meal::BOTH.to_vec(), |m| vec![m])
}

fn print_report(label: &str, report: &RangeReport) {
    println!(
        "{label}: {} created, {} unchanged, {} need update, {} without menu, {} failed",
        report.created.len(),
        report.unchanged,
        report.needs_update,
        report.no_menu,
        report.failed,
    );
}

async fn show(date: NaiveDate, json: bool) -> Result<()> {
    let menu = match UnicampMenu::default().daily_menu(date).await {
        Ok(menu) => menu,
        Err(Error::MenuNotFound(_)) => {
            println!("No menu published for {date}.");
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&menu)?);
        return Ok(());
    }
    println!("{}", menu.date().format("%d/%m/%Y"));
    for meal in menu.meals() {
        println!("\n{}", meal.slot);
        for line in [
            &meal.main_course,
            &meal.side_dish,
            &meal.salad,
            &meal.dessert,
            &meal.juice,
        ] {
            println!("  {line}");
        }
    }
    Ok(())
}

type Bandeco = Synchronizer<UnicampMenu, GoogleCalendar>;

async fn connect(config_path: Option<PathBuf>) -> Result<Bandeco> {
    let config = Config::load(config_path).await?;
    let ledger = Ledger::open(&config.ledger);
    if let Ledger::Local(file) = &ledger {
        log::info!("Using ledger at {}", file.path().display());
    }
    let auth = Authenticator::from_strategy(&config.auth).await?;
    log::debug!("Authenticating with {auth:?}");
    Ok(Synchronizer::new(
        UnicampMenu::default(),
        GoogleCalendar::new(auth),
        ledger,
        config.calendars(),
    ))
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Show { date, json } => show(date.unwrap_or_else(today), json).await?,
        Command::Sync { date, meal, veg } => {
            let mut sync = connect(cli.config).await?;
            let date = date.unwrap_or_else(today);
            for meal in meals(meal) {
                match sync.sync_one(date, meal, Diet::from_veg_flag(veg)).await {
                    Ok(outcome) => println!("{meal} on {date}: {outcome:?}"),
                    Err(e) => log::error!("{meal} on {date} failed: {e}"),
                }
            }
        }
        Command::SyncRange { range, meal, veg } => {
            let mut sync = connect(cli.config).await?;
            for meal in meals(meal) {
                let report = sync
                    .sync_range(
                        range.start(),
                        range.days,
                        range.direction(),
                        meal,
                        Diet::from_veg_flag(veg),
                    )
                    .await?;
                print_report(meal.name(), &report);
            }
        }
        Command::Populate { range, meal, veg } => {
            let mut sync = connect(cli.config).await?;
            for meal in meals(meal) {
                let report = sync
                    .populate_range(
                        range.start(),
                        range.days,
                        range.direction(),
                        meal,
                        Diet::from_veg_flag(veg),
                    )
                    .await?;
                print_report(meal.name(), &report);
            }
        }
        Command::Rebuild { range, veg } => {
            let mut sync = connect(cli.config).await?;
            let report = sync
                .rebuild_range(
                    range.start(),
                    range.days,
                    range.direction(),
                    Diet::from_veg_flag(veg),
                )
                .await?;
            println!(
                "{} events deleted, {} deletes failed",
                report.deleted.deleted, report.deleted.failed
            );
            print_report(Meal::Lunch.name(), &report.lunch);
            print_report(Meal::Dinner.name(), &report.dinner);
        }
        Command::Clear { veg } => {
            let sync = connect(cli.config).await?;
            let report = sync.clear(Diet::from_veg_flag(veg)).await?;
            println!(
                "{} events deleted, {} deletes failed",
                report.deleted, report.failed
            );
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> core::result::Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    run(cli).await?;
    Ok(())
}
