use log::{info, warn};

use super::err::CustomError;
use super::student::{Field, Student, Ticket};

/// In-memory holder of the student roster and the ticket queue.
///
/// Both lists are append-only and bounded by the limits given at construction.
#[derive(Debug, Default)]
pub struct RecordStore {
    students: Vec<Student>,
    tickets: Vec<Ticket>,
    max_students: usize,
    max_tickets: usize,
}

impl RecordStore {
    pub fn new(max_students: usize, max_tickets: usize) -> Self {
        Self {
            students: Vec::new(),
            tickets: Vec::new(),
            max_students,
            max_tickets,
        }
    }

    /// build a store from records read back from disk
    pub fn from_parts(
        students: Vec<Student>,
        tickets: Vec<Ticket>,
        max_students: usize,
        max_tickets: usize,
    ) -> Self {
        Self {
            students,
            tickets,
            max_students,
            max_tickets,
        }
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn students_full(&self) -> bool {
        self.students.len() >= self.max_students
    }

    pub fn tickets_full(&self) -> bool {
        self.tickets.len() >= self.max_tickets
    }

    /// first student with this roll number
    pub fn find_student(&self, roll: u32) -> Option<&Student> {
        self.students.iter().find(|s| s.roll == roll)
    }

    pub fn find_student_mut(&mut self, roll: u32) -> Option<&mut Student> {
        self.students.iter_mut().find(|s| s.roll == roll)
    }

    pub fn find_ticket(&self, ticket_id: u32) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.ticket_id == ticket_id)
    }

    pub fn find_ticket_mut(&mut self, ticket_id: u32) -> Option<&mut Ticket> {
        self.tickets.iter_mut().find(|t| t.ticket_id == ticket_id)
    }

    /// Append a student.
    ///
    /// Roll numbers are not required to be unique; a duplicate is accepted and
    /// stays shadowed by the earlier record in [`RecordStore::find_student`].
    pub fn add_student(&mut self, student: Student) -> Result<&Student, CustomError> {
        if self.students_full() {
            return Err(CustomError::CapacityExceeded {
                kind: "student",
                max: self.max_students,
            });
        }
        if self.find_student(student.roll).is_some() {
            warn!("roll {} already exists, adding a duplicate record", student.roll);
        }
        info!("adding student {} ({})", student.roll, student.name);
        self.students.push(student);
        Ok(&self.students[self.students.len() - 1])
    }

    /// id the next ticket will receive: one past the last ticket's id
    ///
    /// `None` once the last id is `u32::MAX`; ids are never wrapped or reused.
    pub fn next_ticket_id(&self) -> Option<u32> {
        match self.tickets.last() {
            Some(t) => t.ticket_id.checked_add(1),
            None => Some(1),
        }
    }

    /// Append a pending ticket with the next ticket id.
    pub fn add_ticket(
        &mut self,
        roll: u32,
        field: Field,
        old_value: &str,
        new_value: &str,
    ) -> Result<&Ticket, CustomError> {
        if self.tickets_full() {
            return Err(CustomError::CapacityExceeded {
                kind: "ticket",
                max: self.max_tickets,
            });
        }
        let ticket_id = self
            .next_ticket_id()
            .ok_or(CustomError::TicketIdsExhausted)?;
        let ticket = Ticket::new(ticket_id, roll, field, old_value, new_value);
        info!(
            "ticket {} raised by roll {} for {}",
            ticket.ticket_id, roll, field
        );
        self.tickets.push(ticket);
        Ok(&self.tickets[self.tickets.len() - 1])
    }

    /// tickets owned by one student, in creation order
    pub fn tickets_for(&self, roll: u32) -> impl Iterator<Item = &Ticket> {
        self.tickets.iter().filter(move |t| t.roll == roll)
    }

    /// ids of every ticket still waiting for a decision
    pub fn pending_ticket_ids(&self) -> Vec<u32> {
        self.tickets
            .iter()
            .filter(|t| !t.status.is_terminal())
            .map(|t| t.ticket_id)
            .collect()
    }
}
