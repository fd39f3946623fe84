use std::{fs::OpenOptions, io, process::ExitCode};

use log::{error, info, warn};
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use time::macros::format_description;

use api::{config::Config, err::CustomError, AppState};
use menu::Session;

mod api;
mod menu;

fn main() -> ExitCode {
    // a missing .env file is fine, the defaults still apply
    let _ = dotenv::dotenv();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logger(&config) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }
    if config.admin_password.is_none() {
        warn!("SRMS_ADMIN_PASSWORD is not set, admin login is disabled");
    }

    let mut state = match AppState::setup(&config) {
        Ok(state) => state,
        Err(e) => {
            error!("failed to load data: {}", e);
            return ExitCode::FAILURE;
        }
    };
    println!(
        "Loaded {} student records and {} ticket records.",
        state.store().students().len(),
        state.store().tickets().len()
    );

    let stdin = io::stdin();
    let result = Session::new(
        &mut state,
        config.admin_password.clone(),
        stdin.lock(),
        io::stdout(),
    )
    .run();
    if let Err(e) = result {
        error!("console session failed: {}", e);
    }

    state.flush();
    info!("data saved, exiting");
    ExitCode::SUCCESS
}

fn init_logger(config: &Config) -> Result<(), CustomError> {
    let (loggers, file_error) = build_loggers(config);
    CombinedLogger::init(loggers)?;
    if let Some(e) = file_error {
        warn!("cannot open the log file, logging to stderr only: {}", e);
    }
    Ok(())
}

/// stderr logger, plus the file logger when the log file can be opened
fn build_loggers(config: &Config) -> (Vec<Box<dyn SharedLogger>>, Option<io::Error>) {
    let log_config = ConfigBuilder::new()
        .set_time_format_custom(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        log::LevelFilter::Warn.min(config.log_level),
        log_config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    let Some(path) = &config.log_file else {
        return (loggers, None);
    };
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            loggers.push(WriteLogger::new(config.log_level, log_config, file));
            (loggers, None)
        }
        Err(e) => (loggers, Some(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn config_logging_to(log_file: &Path) -> Config {
        Config {
            admin_password: None,
            student_file: "students.txt".into(),
            ticket_file: "tickets.txt".into(),
            max_students: 10,
            max_tickets: 10,
            log_file: Some(log_file.to_path_buf()),
            log_level: log::LevelFilter::Info,
        }
    }

    #[test]
    fn test_build_loggers_with_log_file() {
        let temp_dir = tempdir().unwrap();
        let log_file = temp_dir.path().join("srms.log");
        let (loggers, file_error) = build_loggers(&config_logging_to(&log_file));

        assert_eq!(loggers.len(), 2);
        assert!(file_error.is_none());
        assert!(log_file.exists());
    }

    #[test]
    fn test_build_loggers_unopenable_log_file() {
        let temp_dir = tempdir().unwrap();
        let log_file = temp_dir.path().join("no_such_dir").join("srms.log");
        let (loggers, file_error) = build_loggers(&config_logging_to(&log_file));

        // stderr logging still works
        assert_eq!(loggers.len(), 1);
        assert!(file_error.is_some());
    }
}
