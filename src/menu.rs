use std::{
    io::{self, BufRead, Write},
    str::FromStr,
};

use log::{info, warn};

use crate::api::{
    err::CustomError,
    student::{Field, Student},
    ticket::{Decision, Outcome},
    AppState,
};

/// why a session stopped before the operator chose to exit
enum Stop {
    EndOfInput,
    Io(io::Error),
}

impl From<io::Error> for Stop {
    fn from(e: io::Error) -> Self {
        Stop::Io(e)
    }
}

type Step<T> = Result<T, Stop>;

/// Text menu over any line-oriented input and output.
pub struct Session<'a, R, W> {
    state: &'a mut AppState,
    admin_password: Option<String>,
    input: R,
    out: W,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    pub fn new(state: &'a mut AppState, admin_password: Option<String>, input: R, out: W) -> Self {
        Self {
            state,
            admin_password,
            input,
            out,
        }
    }

    /// Run the top-level menu until the operator exits or input ends.
    pub fn run(&mut self) -> Result<(), CustomError> {
        match self.main_menu() {
            Ok(()) => Ok(()),
            Err(Stop::EndOfInput) => {
                info!("input closed, leaving the menu");
                Ok(())
            }
            Err(Stop::Io(e)) => Err(e.into()),
        }
    }

    fn main_menu(&mut self) -> Step<()> {
        loop {
            writeln!(self.out, "\n========= STUDENT RECORD MANAGEMENT =========")?;
            writeln!(self.out, "1. Student Login")?;
            writeln!(self.out, "2. Admin Login")?;
            writeln!(self.out, "3. Exit")?;
            match self.prompt_number::<u32>("Enter choice: ")? {
                1 => self.student_login()?,
                2 => self.admin_login()?,
                3 => {
                    writeln!(self.out, "Thank you for using the system. Data has been saved.")?;
                    return Ok(());
                }
                _ => writeln!(self.out, "Invalid Choice!")?,
            }
        }
    }

    // ---------------- student ----------------

    fn student_login(&mut self) -> Step<()> {
        writeln!(self.out, "\n--- Student Login ---")?;
        let roll = self.prompt_roll("Enter your Roll Number: ")?;
        match self.state.store().find_student(roll) {
            Some(s) => {
                writeln!(self.out, "\nWelcome, {}!", s.name)?;
                writeln!(
                    self.out,
                    "Roll No.: {}, Branch: {}, CGPA: {:.2}",
                    s.roll, s.branch, s.cgpa
                )?;
            }
            None => {
                writeln!(self.out, "No Student Record Found with Roll Number {}!", roll)?;
                return Ok(());
            }
        }
        self.student_menu(roll)
    }

    fn student_menu(&mut self, roll: u32) -> Step<()> {
        loop {
            writeln!(self.out, "\n=== Student Menu ===")?;
            writeln!(self.out, "1. Raise Correction Ticket")?;
            writeln!(self.out, "2. View Ticket Status")?;
            writeln!(self.out, "3. Logout")?;
            match self.prompt_number::<u32>("Enter choice: ")? {
                1 => self.raise_ticket(roll)?,
                2 => self.view_tickets(roll)?,
                3 => return Ok(()),
                _ => writeln!(self.out, "Invalid Choice!")?,
            }
        }
    }

    fn raise_ticket(&mut self, roll: u32) -> Step<()> {
        if self.state.store().tickets_full() {
            writeln!(self.out, "Ticket system is full. Cannot raise new ticket.")?;
            return Ok(());
        }
        let Some(student) = self.state.store().find_student(roll) else {
            writeln!(self.out, "Error: Your student record was not found.")?;
            return Ok(());
        };
        let student = student.clone();

        writeln!(self.out, "\n--- Raise Correction Ticket ---")?;
        writeln!(self.out, "Which field you want to correct?")?;
        let field_name = self.prompt("Enter field name (name/branch/year/cgpa/phone): ")?;
        let field = match field_name.trim().parse::<Field>() {
            Ok(field) => field,
            Err(_) => {
                writeln!(self.out, "Invalid field name.")?;
                return Ok(());
            }
        };

        writeln!(self.out, "Current Value: {}", student.field_value(field))?;
        let new_value = self.prompt(&format!("Enter correct {} (New Value): ", field))?;

        match self.state.raise_ticket(roll, field.as_str(), &new_value) {
            Ok(ticket_id) => {
                writeln!(self.out, "\nTicket submitted successfully! (ID: {})", ticket_id)?
            }
            Err(e) => writeln!(self.out, "Error: {}", e)?,
        }
        Ok(())
    }

    fn view_tickets(&mut self, roll: u32) -> Step<()> {
        writeln!(self.out, "\n--- Ticket Status for Roll {} ---", roll)?;
        let mut found = false;
        for t in self.state.store().tickets_for(roll) {
            writeln!(
                self.out,
                "ID: {} | Field: {} | Old: {} | New: {} | Status: {}",
                t.ticket_id, t.field, t.old_value, t.new_value, t.status
            )?;
            found = true;
        }
        if !found {
            writeln!(self.out, "No tickets found for this roll number.")?;
        }
        Ok(())
    }

    // ---------------- admin ----------------

    fn admin_login(&mut self) -> Step<()> {
        writeln!(self.out, "\n--- Admin Login ---")?;
        let Some(expected) = self.admin_password.clone() else {
            warn!("admin login attempted but no admin password is configured");
            writeln!(self.out, "Admin login is disabled: no admin password configured.")?;
            return Ok(());
        };
        let password = self.prompt("Enter Admin Password: ")?;
        if password.trim() == expected {
            writeln!(self.out, "\nLogin Successful!")?;
            self.admin_menu()
        } else {
            warn!("failed admin login");
            writeln!(self.out, "Incorrect Password!")?;
            Ok(())
        }
    }

    fn admin_menu(&mut self) -> Step<()> {
        loop {
            writeln!(self.out, "\n=== ADMIN MENU ===")?;
            writeln!(self.out, "1. Add New Student")?;
            writeln!(self.out, "2. View All Students")?;
            writeln!(self.out, "3. Process Tickets (Pending Corrections)")?;
            writeln!(self.out, "4. Logout")?;
            match self.prompt_number::<u32>("Enter choice: ")? {
                1 => self.add_student()?,
                2 => self.view_all_students()?,
                3 => self.process_tickets()?,
                4 => return Ok(()),
                _ => writeln!(self.out, "Invalid Choice!")?,
            }
        }
    }

    fn add_student(&mut self) -> Step<()> {
        if self.state.store().students_full() {
            writeln!(self.out, "Student database is full. Cannot add more students.")?;
            return Ok(());
        }
        writeln!(self.out, "\n--- Add New Student ---")?;
        let roll = self.prompt_roll("Roll: ")?;
        let name = self.prompt("Name: ")?;
        let branch = self.prompt_token("Branch: ")?;
        let year = self.prompt_number::<i32>("Year: ")?;
        let cgpa = loop {
            let cgpa = self.prompt_number::<f64>("CGPA: ")?;
            if cgpa.is_finite() {
                break cgpa;
            }
            writeln!(self.out, "Invalid Input! Please enter a number.")?;
        };
        let phone = self.prompt_token("Phone: ")?;

        let student = Student::new(roll, name.trim(), &branch, year, cgpa, &phone);
        match self.state.add_student(student) {
            Ok(()) => writeln!(
                self.out,
                "\nStudent Added Successfully! Total students: {}",
                self.state.store().students().len()
            )?,
            Err(e) => writeln!(self.out, "Error: {}", e)?,
        }
        Ok(())
    }

    fn view_all_students(&mut self) -> Step<()> {
        let line = "-".repeat(80);
        let students = self.state.store().students();
        writeln!(self.out, "\n--- All Students ({} Records) ---", students.len())?;
        writeln!(self.out, "{}", line)?;
        writeln!(
            self.out,
            "| {:<4} | {:<20} | {:<10} | {:<4} | {:<6} | {:<14} |",
            "Roll", "Name", "Branch", "Year", "CGPA", "Phone"
        )?;
        writeln!(self.out, "{}", line)?;
        for s in students {
            writeln!(
                self.out,
                "| {:<4} | {:<20} | {:<10} | {:<4} | {:<6.2} | {:<14} |",
                s.roll, s.name, s.branch, s.year, s.cgpa, s.phone
            )?;
        }
        writeln!(self.out, "{}", line)?;
        Ok(())
    }

    fn process_tickets(&mut self) -> Step<()> {
        writeln!(self.out, "\n--- Processing Pending Tickets ---")?;
        let pending = self.state.store().pending_ticket_ids();
        if pending.is_empty() {
            writeln!(self.out, "No pending tickets found.")?;
        }

        for ticket_id in pending {
            self.show_ticket(ticket_id)?;
            let action = self.prompt("Action - Approve (A) / Reject (R) / Skip (S): ")?;
            let Some(decision) = Decision::parse(&action) else {
                warn!("ticket {}: unrecognised action {:?}, skipping", ticket_id, action);
                writeln!(self.out, "Invalid action. Ticket status remains Pending.")?;
                continue;
            };
            match self.state.decide(ticket_id, decision) {
                Ok(Outcome::Approved) => {
                    writeln!(self.out, "Student record updated and ticket Approved!")?
                }
                Ok(Outcome::RejectedMissingStudent) => writeln!(
                    self.out,
                    "Error: Student record not found! Rejecting ticket."
                )?,
                Ok(Outcome::Rejected) => writeln!(self.out, "Ticket Rejected!")?,
                Ok(Outcome::Skipped) => {
                    writeln!(self.out, "Ticket Skipped (Status remains Pending).")?
                }
                Err(e) => writeln!(self.out, "Error: {}", e)?,
            }
        }

        self.state.flush();
        Ok(())
    }

    fn show_ticket(&mut self, ticket_id: u32) -> Step<()> {
        let store = self.state.store();
        let Some(t) = store.find_ticket(ticket_id) else {
            return Ok(());
        };
        writeln!(self.out, "\n-------------------------------------")?;
        writeln!(self.out, "TICKET ID: {} | Student Roll: {}", t.ticket_id, t.roll)?;
        match store.find_student(t.roll) {
            Some(s) => writeln!(self.out, "Student Name: {}", s.name)?,
            None => writeln!(
                self.out,
                "Student Record: NOT FOUND! (Ticket must be rejected)"
            )?,
        }
        writeln!(self.out, "Field: {}", t.field)?;
        writeln!(self.out, "Old Value: {}", t.old_value)?;
        writeln!(self.out, "New Value: {}", t.new_value)?;
        writeln!(self.out, "-------------------------------------")?;
        Ok(())
    }

    // ---------------- input ----------------

    /// one line without its line ending
    ///
    /// input that is not valid UTF-8 is discarded and asked again
    fn prompt(&mut self, msg: &str) -> Step<String> {
        loop {
            write!(self.out, "{}", msg)?;
            self.out.flush()?;
            let mut buf = Vec::new();
            if self.input.read_until(b'\n', &mut buf)? == 0 {
                return Err(Stop::EndOfInput);
            }
            match String::from_utf8(buf) {
                Ok(mut line) => {
                    let len = line.trim_end_matches(['\r', '\n']).len();
                    line.truncate(len);
                    return Ok(line);
                }
                Err(_) => writeln!(self.out, "Invalid Input! Please enter plain text.")?,
            }
        }
    }

    /// roll numbers are positive, 0 is asked again
    fn prompt_roll(&mut self, msg: &str) -> Step<u32> {
        loop {
            let roll = self.prompt_number::<u32>(msg)?;
            if roll > 0 {
                return Ok(roll);
            }
            writeln!(self.out, "Invalid Input! Roll Number must be positive.")?;
        }
    }

    /// first whitespace separated word, asked again while empty
    fn prompt_token(&mut self, msg: &str) -> Step<String> {
        loop {
            let line = self.prompt(msg)?;
            if let Some(token) = line.split_whitespace().next() {
                return Ok(token.to_string());
            }
        }
    }

    /// asked again until the input parses
    fn prompt_number<T: FromStr>(&mut self, msg: &str) -> Step<T> {
        loop {
            let line = self.prompt(msg)?;
            match line.trim().parse::<T>() {
                Ok(n) => return Ok(n),
                Err(_) => writeln!(self.out, "Invalid Input! Please enter a number.")?,
            }
        }
    }
}
