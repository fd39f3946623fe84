use std::{fmt, str::FromStr};

use log::warn;
use serde::{Deserialize, Serialize, Serializer};

use super::err::CustomError;

/// 姓名最大长度
pub const NAME_MAX: usize = 49;
/// 专业简称最大长度
pub const BRANCH_MAX: usize = 29;
/// 电话最大长度
pub const PHONE_MAX: usize = 14;
/// ticket中新旧值的最大长度
pub const VALUE_MAX: usize = 49;

/// 学生记录, 文件中的一行: `roll,name,branch,year,cgpa,phone`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    // 学号
    pub roll: u32,
    // 姓名
    pub name: String,
    // 专业
    pub branch: String,
    // 年级
    pub year: i32,
    // 绩点, 写入时保留两位小数
    #[serde(serialize_with = "two_decimals")]
    pub cgpa: f64,
    // 电话
    pub phone: String,
}

/// 可申请修改的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Branch,
    Year,
    Cgpa,
    Phone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    Pending,
    Approved,
    Rejected,
}

/// 修改申请, 文件中的一行: `ticket_id,roll,field,old_value,new_value,status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: u32,
    // 申请人学号
    pub roll: u32,
    pub field: Field,
    // 创建时的字段值
    pub old_value: String,
    // 申请修改为的值, 审批前不做类型检查
    pub new_value: String,
    pub status: TicketStatus,
}

impl Student {
    pub fn new(
        roll: u32,
        name: &str,
        branch: &str,
        year: i32,
        cgpa: f64,
        phone: &str,
    ) -> Self {
        Self {
            roll,
            name: truncate(name, NAME_MAX),
            branch: truncate(branch, BRANCH_MAX),
            year,
            cgpa,
            phone: truncate(phone, PHONE_MAX),
        }
    }

    /// re-apply the text bounds, used on records read back from disk
    pub fn normalized(self) -> Self {
        Self::new(
            self.roll,
            &self.name,
            &self.branch,
            self.year,
            self.cgpa,
            &self.phone,
        )
    }

    /// textual snapshot of a field, as stored in a ticket
    pub fn field_value(&self, field: Field) -> String {
        let value = match field {
            Field::Name => self.name.clone(),
            Field::Branch => self.branch.clone(),
            Field::Phone => self.phone.clone(),
            Field::Year => self.year.to_string(),
            Field::Cgpa => format!("{:.2}", self.cgpa),
        };
        truncate(&value, VALUE_MAX)
    }

    /// Overwrite a field with an unvalidated textual value.
    ///
    /// Numeric fields take the longest numeric prefix of `value` and fall back
    /// to zero when there is none. The fallback is logged, not rejected.
    pub fn apply(&mut self, field: Field, value: &str) {
        match field {
            Field::Name => self.name = truncate(value, NAME_MAX),
            Field::Branch => self.branch = truncate(value, BRANCH_MAX),
            Field::Phone => self.phone = truncate(value, PHONE_MAX),
            Field::Year => {
                let (year, exact) = lenient_int(value);
                if !exact {
                    warn!("roll {}: year {:?} is not a clean integer, stored {}", self.roll, value, year);
                }
                self.year = year;
            }
            Field::Cgpa => {
                let (cgpa, exact) = lenient_float(value);
                if !exact {
                    warn!("roll {}: cgpa {:?} is not a clean number, stored {}", self.roll, value, cgpa);
                }
                self.cgpa = cgpa;
            }
        }
    }
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Name,
        Field::Branch,
        Field::Year,
        Field::Cgpa,
        Field::Phone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Branch => "branch",
            Field::Year => "year",
            Field::Cgpa => "cgpa",
            Field::Phone => "phone",
        }
    }
}

impl FromStr for Field {
    type Err = CustomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| CustomError::InvalidField(s.to_string()))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TicketStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TicketStatus::Pending)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TicketStatus::Pending => "Pending",
            TicketStatus::Approved => "Approved",
            TicketStatus::Rejected => "Rejected",
        };
        f.write_str(s)
    }
}

impl Ticket {
    pub fn new(ticket_id: u32, roll: u32, field: Field, old_value: &str, new_value: &str) -> Self {
        Self {
            ticket_id,
            roll,
            field,
            old_value: truncate(old_value, VALUE_MAX),
            new_value: truncate(new_value, VALUE_MAX),
            status: TicketStatus::Pending,
        }
    }

    pub fn normalized(self) -> Self {
        Self {
            old_value: truncate(&self.old_value, VALUE_MAX),
            new_value: truncate(&self.new_value, VALUE_MAX),
            ..self
        }
    }
}

/// cut `s` down to at most `max` characters
pub fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

fn two_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.2}", value))
}

/// parse the leading integer of `s`, 0 if there is none
///
/// the flag is true only when the whole (trimmed) text was consumed
fn lenient_int(s: &str) -> (i32, bool) {
    let s = s.trim();
    let sign_len = usize::from(s.starts_with(['+', '-']));
    let digits = s[sign_len..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len() - sign_len);
    match s[..sign_len + digits].parse::<i32>() {
        Ok(v) => (v, sign_len + digits == s.len()),
        Err(_) => (0, false),
    }
}

/// parse the longest leading float of `s`, 0.0 if there is none
fn lenient_float(s: &str) -> (f64, bool) {
    let s = s.trim();
    let mut ends: Vec<usize> = s.char_indices().map(|(idx, _)| idx).skip(1).collect();
    ends.push(s.len());
    for end in ends.into_iter().rev() {
        if let Ok(v) = s[..end].parse::<f64>() {
            return (v, end == s.len());
        }
    }
    (0.0, false)
}
