use crate::error::SolverError;
use chrono::Local;
use log::info;
use simplelog::*;
use std::fs::File;

/// maps the config spelling of a log level onto a filter
pub fn level_filter(loglevel: Option<&str>) -> Result<LevelFilter, SolverError> {
    match loglevel {
        None => Ok(LevelFilter::Info),
        Some("debug") => Ok(LevelFilter::Debug),
        Some("info") => Ok(LevelFilter::Info),
        Some("warn") => Ok(LevelFilter::Warn),
        Some("error") => Ok(LevelFilter::Error),
        Some("off") => Ok(LevelFilter::Off),
        Some(other) => Err(SolverError::LogLevel(other.to_string())),
    }
}

/// Sets up the global logger: a terminal logger and, if `to_file`, a copy written to
/// `log_<date>_<time>.txt`. A logger installed earlier stays in place.
pub fn init_logger(loglevel: Option<&str>, to_file: bool) -> Result<(), SolverError> {
    let log_option = level_filter(loglevel)?;
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        log_option,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if to_file {
        let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let name = format!("log_{}.txt", date_and_time);
        loggers.push(WriteLogger::new(
            log_option,
            Config::default(),
            File::create(name)?,
        ));
    }
    match CombinedLogger::init(loggers) {
        Ok(()) => {
            info!("logger started with level {}", log_option);
            Ok(())
        }
        Err(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter() {
        assert_eq!(level_filter(None).unwrap(), LevelFilter::Info);
        assert_eq!(level_filter(Some("warn")).unwrap(), LevelFilter::Warn);
        assert!(matches!(
            level_filter(Some("loud")),
            Err(SolverError::LogLevel(_))
        ));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        assert!(init_logger(Some("error"), false).is_ok());
        assert!(init_logger(Some("error"), false).is_ok());
    }
}
