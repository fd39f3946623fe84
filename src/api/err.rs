/// 自定义错误类型
#[derive(thiserror::Error, Debug)]
pub enum CustomError {
    /// 文件读写失败
    #[error("file access failed: {0}")]
    FileError(#[from] std::io::Error),
    /// csv处理错误
    #[error("csv processing failed: {0}")]
    CsvError(#[from] csv::Error),
    /// the store already holds the configured maximum
    #[error("{kind} storage is full (max {max})")]
    CapacityExceeded { kind: &'static str, max: usize },
    /// the last ticket already uses the largest id
    #[error("no ticket ids left, the last ticket id is {}", u32::MAX)]
    TicketIdsExhausted,
    /// field name outside of name/branch/year/cgpa/phone
    #[error("invalid field name: {0}")]
    InvalidField(String),
    /// no student with this roll number
    #[error("no student record found with roll number {0}")]
    UnknownStudent(u32),
    /// no ticket with this id
    #[error("no ticket found with id {0}")]
    UnknownTicket(u32),
    /// ticket was already approved or rejected
    #[error("ticket {id} is already {status}")]
    TicketClosed { id: u32, status: String },
    /// 配置错误
    #[error("invalid configuration: {0}")]
    ConfigError(String),
    /// logger setup failed
    #[error("failed to set up the logger: {0}")]
    LoggerError(#[from] log::SetLoggerError),
}
