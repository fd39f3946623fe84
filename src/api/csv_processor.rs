use std::{
    fs::File,
    path::{Path, PathBuf},
};

use csv;
use log::{error, info, warn};
use serde::{de::DeserializeOwned, Serialize};

use super::err::CustomError;
use super::student::{Student, Ticket};

/// 学生和ticket两个数据文件
///
/// Both files are header-less csv. Plain values are written without quotes,
/// so `1,Asha,CSE,2,8.50,9876543210` reads back unchanged; values holding a
/// comma or a quote get csv quoting instead of corrupting the row.
pub struct CsvStorage {
    student_path: PathBuf,
    ticket_path: PathBuf,
}

/// records read back from the data files
pub struct LoadedData {
    pub students: Vec<Student>,
    pub tickets: Vec<Ticket>,
}

impl CsvStorage {
    pub fn new(student_path: impl Into<PathBuf>, ticket_path: impl Into<PathBuf>) -> Self {
        Self {
            student_path: student_path.into(),
            ticket_path: ticket_path.into(),
        }
    }

    #[cfg(test)]
    fn student_path(&self) -> &Path {
        &self.student_path
    }

    #[cfg(test)]
    fn ticket_path(&self) -> &Path {
        &self.ticket_path
    }

    /// Read both files, keeping at most `max_students`/`max_tickets` records.
    ///
    /// A missing file is not an error, the list just starts empty.
    pub fn load(&self, max_students: usize, max_tickets: usize) -> Result<LoadedData, CustomError> {
        let students = read_records::<Student>(&self.student_path, max_students)?
            .into_iter()
            .map(Student::normalized)
            .collect();
        let tickets = read_records::<Ticket>(&self.ticket_path, max_tickets)?
            .into_iter()
            .map(Ticket::normalized)
            .collect();
        Ok(LoadedData { students, tickets })
    }

    /// Overwrite both files from memory.
    ///
    /// A file that cannot be written is logged and the other one is still
    /// attempted. Returns true when both were written.
    pub fn save(&self, students: &[Student], tickets: &[Ticket]) -> bool {
        let students_saved = report_save(&self.student_path, write_records(&self.student_path, students));
        let tickets_saved = report_save(&self.ticket_path, write_records(&self.ticket_path, tickets));
        students_saved && tickets_saved
    }
}

fn report_save(path: &Path, result: Result<(), CustomError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            error!("could not save data to {}: {}", path.display(), e);
            false
        }
    }
}

/// Read records while they are well-formed.
///
/// The first row that fails to parse stops reading; rows before it are kept.
pub fn read_records<T: DeserializeOwned>(path: &Path, max: usize) -> Result<Vec<T>, CustomError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("{} not found, starting with an empty list", path.display());
            return Ok(vec![]);
        }
        Err(e) => return Err(e.into()),
    };
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(file);

    let mut records = vec![];
    for (idx, rd) in rdr.deserialize().enumerate() {
        if records.len() >= max {
            warn!("{} holds more than {} records, ignoring the rest", path.display(), max);
            break;
        }
        match rd {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(
                    "{}: stopped reading at record {}: {}",
                    path.display(),
                    idx + 1,
                    e
                );
                break;
            }
        }
    }
    info!("loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), CustomError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}
