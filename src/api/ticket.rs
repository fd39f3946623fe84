//! Correction ticket workflow.
//!
//! A ticket starts `Pending` and is moved exactly once to `Approved` or
//! `Rejected` by an admin decision. Skipping leaves it pending.

use log::{info, warn};

use super::err::CustomError;
use super::store::RecordStore;
use super::student::{Field, Ticket, TicketStatus};

/// admin decision on a pending ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
    Skip,
}

/// what a decision did to the ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// the student record was updated
    Approved,
    Rejected,
    /// approval was requested but the student record is gone
    RejectedMissingStudent,
    Skipped,
}

impl Decision {
    /// Map operator text to a decision using its first character,
    /// case-insensitively. `None` for anything that is not a/r/s.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().chars().next()?.to_ascii_lowercase() {
            'a' => Some(Decision::Approve),
            'r' => Some(Decision::Reject),
            's' => Some(Decision::Skip),
            _ => None,
        }
    }
}

/// Raise a correction ticket for one field of a student's record.
///
/// The field name is checked before anything else, so an unknown field never
/// touches the store.
pub fn raise_ticket<'s>(
    store: &'s mut RecordStore,
    roll: u32,
    field_name: &str,
    new_value: &str,
) -> Result<&'s Ticket, CustomError> {
    let field: Field = field_name.trim().parse()?;
    let old_value = store
        .find_student(roll)
        .map(|s| s.field_value(field))
        .ok_or(CustomError::UnknownStudent(roll))?;
    store.add_ticket(roll, field, &old_value, new_value)
}

/// Apply an admin decision to a pending ticket.
pub fn decide(
    store: &mut RecordStore,
    ticket_id: u32,
    decision: Decision,
) -> Result<Outcome, CustomError> {
    let ticket = store
        .find_ticket(ticket_id)
        .ok_or(CustomError::UnknownTicket(ticket_id))?;
    if ticket.status.is_terminal() {
        return Err(CustomError::TicketClosed {
            id: ticket_id,
            status: ticket.status.to_string(),
        });
    }
    let (roll, field, new_value) = (ticket.roll, ticket.field, ticket.new_value.clone());

    let (status, outcome) = match decision {
        Decision::Skip => {
            info!("ticket {} skipped", ticket_id);
            return Ok(Outcome::Skipped);
        }
        Decision::Reject => (TicketStatus::Rejected, Outcome::Rejected),
        Decision::Approve => match store.find_student_mut(roll) {
            Some(student) => {
                student.apply(field, &new_value);
                (TicketStatus::Approved, Outcome::Approved)
            }
            None => {
                warn!(
                    "ticket {}: student {} not found, rejecting instead of approving",
                    ticket_id, roll
                );
                (TicketStatus::Rejected, Outcome::RejectedMissingStudent)
            }
        },
    };

    if let Some(ticket) = store.find_ticket_mut(ticket_id) {
        ticket.status = status;
    }
    info!("ticket {} {}", ticket_id, status);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::student::Student;

    fn store_with_student() -> RecordStore {
        let mut store = RecordStore::new(10, 10);
        store
            .add_student(Student::new(11, "Meera", "IT", 3, 7.4, "9123456780"))
            .unwrap();
        store
    }

    #[test]
    fn test_decision_parse() {
        assert_eq!(Decision::parse("A"), Some(Decision::Approve));
        assert_eq!(Decision::parse("approve"), Some(Decision::Approve));
        assert_eq!(Decision::parse(" r"), Some(Decision::Reject));
        assert_eq!(Decision::parse("Skip"), Some(Decision::Skip));
        assert_eq!(Decision::parse("x"), None);
        assert_eq!(Decision::parse(""), None);
    }

    #[test]
    fn test_raise_ticket_snapshots_old_value() {
        let mut store = store_with_student();
        let ticket = raise_ticket(&mut store, 11, "cgpa", "8.75").unwrap();
        assert_eq!(ticket.ticket_id, 1);
        assert_eq!(ticket.field, Field::Cgpa);
        assert_eq!(ticket.old_value, "7.40");
        assert_eq!(ticket.new_value, "8.75");
        assert_eq!(ticket.status, TicketStatus::Pending);
    }

    #[test]
    fn test_raise_ticket_invalid_field() {
        let mut store = store_with_student();
        let result = raise_ticket(&mut store, 11, "email", "x@y.z");
        assert!(matches!(result, Err(CustomError::InvalidField(_))));
        assert!(store.tickets().is_empty());
    }

    #[test]
    fn test_raise_ticket_unknown_student() {
        let mut store = store_with_student();
        let result = raise_ticket(&mut store, 99, "name", "Ghost");
        assert!(matches!(result, Err(CustomError::UnknownStudent(99))));
        assert!(store.tickets().is_empty());
    }

    #[test]
    fn test_approve_cgpa() {
        let mut store = store_with_student();
        raise_ticket(&mut store, 11, "cgpa", "8.75").unwrap();

        let outcome = decide(&mut store, 1, Decision::Approve).unwrap();
        assert_eq!(outcome, Outcome::Approved);
        assert_eq!(store.find_student(11).unwrap().cgpa, 8.75);
        assert_eq!(store.find_ticket(1).unwrap().status, TicketStatus::Approved);
    }

    #[test]
    fn test_reject_leaves_student_unchanged() {
        let mut store = store_with_student();
        raise_ticket(&mut store, 11, "cgpa", "8.75").unwrap();
        let before = store.find_student(11).unwrap().clone();

        let outcome = decide(&mut store, 1, Decision::Reject).unwrap();
        assert_eq!(outcome, Outcome::Rejected);
        assert_eq!(store.find_student(11).unwrap(), &before);
        assert_eq!(store.find_ticket(1).unwrap().status, TicketStatus::Rejected);
    }

    #[test]
    fn test_approve_without_student_rejects() {
        let mut store = RecordStore::new(10, 10);
        store.add_ticket(42, Field::Name, "Old", "New").unwrap();

        let outcome = decide(&mut store, 1, Decision::Approve).unwrap();
        assert_eq!(outcome, Outcome::RejectedMissingStudent);
        assert_eq!(store.find_ticket(1).unwrap().status, TicketStatus::Rejected);
    }

    #[test]
    fn test_skip_keeps_pending() {
        let mut store = store_with_student();
        raise_ticket(&mut store, 11, "phone", "9000011111").unwrap();

        assert_eq!(decide(&mut store, 1, Decision::Skip).unwrap(), Outcome::Skipped);
        assert_eq!(store.find_ticket(1).unwrap().status, TicketStatus::Pending);
        assert_eq!(store.pending_ticket_ids(), vec![1]);
    }

    #[test]
    fn test_terminal_ticket_is_not_revisited() {
        let mut store = store_with_student();
        raise_ticket(&mut store, 11, "name", "Meera K").unwrap();
        decide(&mut store, 1, Decision::Reject).unwrap();

        let result = decide(&mut store, 1, Decision::Approve);
        assert!(matches!(result, Err(CustomError::TicketClosed { id: 1, .. })));
        assert_eq!(store.find_student(11).unwrap().name, "Meera");
    }

    #[test]
    fn test_unknown_ticket() {
        let mut store = store_with_student();
        assert!(matches!(
            decide(&mut store, 5, Decision::Approve),
            Err(CustomError::UnknownTicket(5))
        ));
    }
}
