use log::info;

pub mod config;
pub mod csv_processor;
pub mod err;
pub mod store;
pub mod student;
pub mod ticket;

use config::Config;
use csv_processor::{CsvStorage, LoadedData};
use err::CustomError;
use store::RecordStore;
use student::Student;
use ticket::{Decision, Outcome};

/// The record store together with the files backing it.
///
/// Every successful mutation goes through here and is followed by a full
/// flush of both files.
pub struct AppState {
    store: RecordStore,
    storage: CsvStorage,
}

impl AppState {
    /// load the persisted state once at startup
    pub fn setup(config: &Config) -> Result<Self, CustomError> {
        let storage = CsvStorage::new(config.student_file.clone(), config.ticket_file.clone());
        let LoadedData { students, tickets } =
            storage.load(config.max_students, config.max_tickets)?;
        info!(
            "loaded {} students and {} tickets",
            students.len(),
            tickets.len()
        );
        let store =
            RecordStore::from_parts(students, tickets, config.max_students, config.max_tickets);
        Ok(Self { store, storage })
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// write both files from the current state
    pub fn flush(&self) -> bool {
        self.storage
            .save(self.store.students(), self.store.tickets())
    }

    pub fn add_student(&mut self, student: Student) -> Result<(), CustomError> {
        self.store.add_student(student)?;
        self.flush();
        Ok(())
    }

    /// returns the new ticket's id
    pub fn raise_ticket(
        &mut self,
        roll: u32,
        field_name: &str,
        new_value: &str,
    ) -> Result<u32, CustomError> {
        let ticket_id = ticket::raise_ticket(&mut self.store, roll, field_name, new_value)?.ticket_id;
        self.flush();
        Ok(ticket_id)
    }

    pub fn decide(&mut self, ticket_id: u32, decision: Decision) -> Result<Outcome, CustomError> {
        let outcome = ticket::decide(&mut self.store, ticket_id, decision)?;
        if outcome != Outcome::Skipped {
            self.flush();
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::student::TicketStatus;
    use std::{fs, path::Path};
    use tempfile::tempdir;

    fn config_in(dir: &Path) -> Config {
        Config {
            admin_password: Some("pass".to_string()),
            student_file: dir.join("students.txt"),
            ticket_file: dir.join("tickets.txt"),
            max_students: 10,
            max_tickets: 10,
            log_file: None,
            log_level: log::LevelFilter::Off,
        }
    }

    #[test]
    fn test_mutations_are_flushed() {
        let temp_dir = tempdir().unwrap();
        let config = config_in(temp_dir.path());
        let mut state = AppState::setup(&config).unwrap();

        state
            .add_student(Student::new(3, "Kiran", "EEE", 1, 6.8, "9999900000"))
            .unwrap();
        assert_eq!(
            fs::read_to_string(&config.student_file).unwrap(),
            "3,Kiran,EEE,1,6.80,9999900000\n"
        );

        let ticket_id = state.raise_ticket(3, "year", "2").unwrap();
        assert_eq!(ticket_id, 1);
        assert_eq!(
            fs::read_to_string(&config.ticket_file).unwrap(),
            "1,3,year,1,2,Pending\n"
        );

        state.decide(1, Decision::Approve).unwrap();
        assert_eq!(
            fs::read_to_string(&config.student_file).unwrap(),
            "3,Kiran,EEE,2,6.80,9999900000\n"
        );
        assert_eq!(
            fs::read_to_string(&config.ticket_file).unwrap(),
            "1,3,year,1,2,Approved\n"
        );
    }

    #[test]
    fn test_invalid_field_writes_nothing() {
        let temp_dir = tempdir().unwrap();
        let config = config_in(temp_dir.path());
        let mut state = AppState::setup(&config).unwrap();
        state
            .add_student(Student::new(3, "Kiran", "EEE", 1, 6.8, "9999900000"))
            .unwrap();
        // the first flush creates an empty ticket file; drop it to see any rewrite
        fs::remove_file(&config.ticket_file).unwrap();

        let result = state.raise_ticket(3, "address", "Somewhere");
        assert!(matches!(result, Err(CustomError::InvalidField(_))));
        assert!(state.store().tickets().is_empty());
        assert!(!config.ticket_file.exists());
    }

    #[test]
    fn test_reload_reconstructs_state() {
        let temp_dir = tempdir().unwrap();
        let config = config_in(temp_dir.path());
        {
            let mut state = AppState::setup(&config).unwrap();
            state
                .add_student(Student::new(1, "Asha", "CSE", 2, 8.5, "9876543210"))
                .unwrap();
            state
                .add_student(Student::new(2, "Ravi", "ME", 4, 6.25, "9000000001"))
                .unwrap();
            state.raise_ticket(1, "cgpa", "8.75").unwrap();
            state.raise_ticket(2, "branch", "CSE").unwrap();
            state.decide(1, Decision::Approve).unwrap();
            assert!(state.flush());
        }

        let state = AppState::setup(&config).unwrap();
        let store = state.store();
        assert_eq!(store.students().len(), 2);
        assert_eq!(store.find_student(1).unwrap().cgpa, 8.75);
        assert_eq!(store.find_ticket(1).unwrap().status, TicketStatus::Approved);
        assert_eq!(store.find_ticket(2).unwrap().status, TicketStatus::Pending);
        assert_eq!(store.next_ticket_id(), Some(3));
    }
}
