use std::env;
use std::fs;
use std::fs::File;
use std::path::PathBuf;
use chrono::{Local, SecondsFormat};
use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger};

pub const LOG_TO_FILE_VAR: &str = "TICKET_LOG_TO_FILE";

fn log_file_path() -> PathBuf{
    let date = Local::now().to_rfc3339_opts(SecondsFormat::Secs, false);
    // this fixes windows being windows
    let date = date.replace(":", "-");

    PathBuf::from("log").join(format!("{}.log", date))
}

/// Loads `.env` and installs the loggers. Terminal output goes to stderr so stdout only ever
/// carries tickets.
pub fn setup() -> anyhow::Result<()>{
    dotenv::dotenv().ok();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ),
    ];

    if env::var(LOG_TO_FILE_VAR).is_ok(){
        fs::create_dir_all("log")?;
        loggers.push(WriteLogger::new(LevelFilter::max(), Config::default(), File::create(log_file_path())?));
    }

    CombinedLogger::init(loggers)?;

    Ok(())
}
