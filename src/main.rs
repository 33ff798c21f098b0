/* 3rd party libraries */
use clap::Parser;
use log::{info, warn};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

/* Custom libraries */
use elevator_dispatch::config;
use elevator_dispatch::timer::ThreadTimer;
use elevator_dispatch::unwrap_or_exit;
use elevator_dispatch::ElevatorSystem;

#[derive(Parser, Debug)]
#[clap(name = "elevator-dispatch", about = "Simulates dispatch and movement of an elevator fleet")]
struct Args {
    /// Configuration file
    #[clap(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Overrides the fleet size from the configuration
    #[clap(short, long)]
    elevators: Option<u32>,

    /// Writes the event log as JSON to this file on exit
    #[clap(long)]
    dump_events: Option<PathBuf>,
}

#[derive(Debug, PartialEq)]
enum Command {
    Call(i32, i32),
    Status(Option<u32>),
    Events(Option<u32>),
    Help,
    Quit,
}

const HELP: &str = "commands: call <start> <end> | status [id] | events [id] | help | quit";

/* Main */
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // Load the configuration
    let mut config = unwrap_or_exit!(config::load_config(&args.config), "Failed to load configuration");
    if let Some(count) = args.elevators {
        config.building.elevator_count = count;
        unwrap_or_exit!(config.validate(), "Invalid fleet size");
    }

    // Start the timer thread and the fleet
    let timer = Arc::new(unwrap_or_exit!(ThreadTimer::start(), "Failed to start timer thread"));
    let system = unwrap_or_exit!(ElevatorSystem::new(&config, timer), "Failed to build elevator system");

    println!("{}", HELP);
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = unwrap_or_exit!(line, "Failed to read command");
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => run_command(&system, command),
            Err(message) => println!("{}", message),
        }
        let _ = io::stdout().flush();
    }

    if let Some(path) = args.dump_events {
        let events = unwrap_or_exit!(system.events());
        let json = unwrap_or_exit!(serde_json::to_string_pretty(&events));
        unwrap_or_exit!(fs::write(&path, json), "Failed to write event log");
        info!("Wrote {} events to {}", events.len(), path.display());
    }
}

fn run_command(system: &ElevatorSystem, command: Command) {
    let output = match command {
        Command::Call(start, end) => serde_json::to_string_pretty(&system.call_elevator(start, end)),
        Command::Status(id) => match system.elevator_status(id) {
            Ok(elevators) => serde_json::to_string_pretty(&elevators),
            Err(e) => Ok(format!("error: {}", e)),
        },
        Command::Events(id) => match id.map_or_else(|| system.events(), |id| system.events_for(id)) {
            Ok(events) => serde_json::to_string_pretty(&events),
            Err(e) => Ok(format!("error: {}", e)),
        },
        Command::Help | Command::Quit => Ok(HELP.to_string()),
    };

    match output {
        Ok(text) => println!("{}", text),
        Err(e) => warn!("Failed to serialize output: {}", e),
    }
}

fn parse_command(line: &str) -> Result<Command, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let number = |word: &str| word.parse::<i32>().map_err(|_| format!("not a number: {}", word));
    let id = |word: &str| word.parse::<u32>().map_err(|_| format!("not an elevator id: {}", word));

    match words.as_slice() {
        ["call", start, end] => Ok(Command::Call(number(*start)?, number(*end)?)),
        ["status"] => Ok(Command::Status(None)),
        ["status", elevator] => Ok(Command::Status(Some(id(*elevator)?))),
        ["events"] => Ok(Command::Events(None)),
        ["events", elevator] => Ok(Command::Events(Some(id(*elevator)?))),
        ["help"] => Ok(Command::Help),
        ["quit"] | ["exit"] => Ok(Command::Quit),
        _ => Err(format!("unknown command, {}", HELP)),
    }
}

/***************************************/
/*             Unit tests              */
/***************************************/
