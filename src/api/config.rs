use std::{path::PathBuf, str::FromStr};

use log::LevelFilter;

use super::err::CustomError;

pub const DEFAULT_STUDENT_FILE: &str = "students.txt";
pub const DEFAULT_TICKET_FILE: &str = "tickets.txt";
pub const DEFAULT_LOG_FILE: &str = "srms.log";
pub const DEFAULT_CAPACITY: usize = 100;

/// 运行配置, 从环境变量 (以及 `.env` 文件) 读取
#[derive(Debug, Clone)]
pub struct Config {
    /// `None` disables admin login
    pub admin_password: Option<String>,
    pub student_file: PathBuf,
    pub ticket_file: PathBuf,
    pub max_students: usize,
    pub max_tickets: usize,
    /// `None` disables the log file
    pub log_file: Option<PathBuf>,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn from_env() -> Result<Self, CustomError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// build the config from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CustomError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let admin_password = lookup("SRMS_ADMIN_PASSWORD").filter(|p| !p.is_empty());
        let student_file = lookup("SRMS_STUDENT_FILE")
            .unwrap_or_else(|| DEFAULT_STUDENT_FILE.to_string())
            .into();
        let ticket_file = lookup("SRMS_TICKET_FILE")
            .unwrap_or_else(|| DEFAULT_TICKET_FILE.to_string())
            .into();
        let max_students = parse_capacity("SRMS_MAX_STUDENTS", lookup("SRMS_MAX_STUDENTS"))?;
        let max_tickets = parse_capacity("SRMS_MAX_TICKETS", lookup("SRMS_MAX_TICKETS"))?;
        let log_file = match lookup("SRMS_LOG_FILE") {
            Some(path) if path.is_empty() => None,
            Some(path) => Some(path.into()),
            None => Some(DEFAULT_LOG_FILE.into()),
        };
        let log_level = match lookup("SRMS_LOG_LEVEL") {
            Some(level) => LevelFilter::from_str(&level).map_err(|_| {
                CustomError::ConfigError(format!("SRMS_LOG_LEVEL: unknown level {:?}", level))
            })?,
            None => LevelFilter::Info,
        };

        Ok(Self {
            admin_password,
            student_file,
            ticket_file,
            max_students,
            max_tickets,
            log_file,
            log_level,
        })
    }
}

fn parse_capacity(key: &str, value: Option<String>) -> Result<usize, CustomError> {
    let Some(value) = value else {
        return Ok(DEFAULT_CAPACITY);
    };
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CustomError::ConfigError(format!(
            "{}: expected a positive integer, got {:?}",
            key, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, CustomError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert!(config.admin_password.is_none());
        assert_eq!(config.student_file, PathBuf::from("students.txt"));
        assert_eq!(config.ticket_file, PathBuf::from("tickets.txt"));
        assert_eq!(config.max_students, 100);
        assert_eq!(config.max_tickets, 100);
        assert_eq!(config.log_file, Some(PathBuf::from("srms.log")));
        assert_eq!(config.log_level, LevelFilter::Info);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("SRMS_ADMIN_PASSWORD", "s3cret"),
            ("SRMS_STUDENT_FILE", "/data/s.csv"),
            ("SRMS_TICKET_FILE", "/data/t.csv"),
            ("SRMS_MAX_STUDENTS", "5"),
            ("SRMS_MAX_TICKETS", " 7 "),
            ("SRMS_LOG_FILE", ""),
            ("SRMS_LOG_LEVEL", "debug"),
        ])
        .unwrap();
        assert_eq!(config.admin_password.as_deref(), Some("s3cret"));
        assert_eq!(config.student_file, PathBuf::from("/data/s.csv"));
        assert_eq!(config.max_students, 5);
        assert_eq!(config.max_tickets, 7);
        assert!(config.log_file.is_none());
        assert_eq!(config.log_level, LevelFilter::Debug);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config_from(&[("SRMS_MAX_STUDENTS", "0")]),
            Err(CustomError::ConfigError(_))
        ));
        assert!(matches!(
            config_from(&[("SRMS_MAX_TICKETS", "many")]),
            Err(CustomError::ConfigError(_))
        ));
        assert!(matches!(
            config_from(&[("SRMS_LOG_LEVEL", "loud")]),
            Err(CustomError::ConfigError(_))
        ));
    }

    #[test]
    fn test_empty_password_disables_admin() {
        let config = config_from(&[("SRMS_ADMIN_PASSWORD", "")]).unwrap();
        assert!(config.admin_password.is_none());
    }
}
