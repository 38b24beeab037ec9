#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("translation error: {0}")]
    Translation(String),
    #[error("invalid text: {0}")]
    Text(#[from] clinic_types::TextError),
    #[error("examination not found: {0}")]
    ExaminationNotFound(String),
    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize invoice: {0}")]
    Serialization(serde_json::Error),
    #[error("arithmetic overflow while computing {0}")]
    Overflow(&'static str),
}

impl ClinicError {
    /// Short Vietnamese message suitable for showing to clinic staff.
    ///
    /// Internal details stay in the `Display` output, which is only logged.
    pub fn user_message(&self) -> &'static str {
        match self {
            ClinicError::InvalidInput(_)
            | ClinicError::Translation(_)
            | ClinicError::Text(_) => "Dữ liệu không hợp lệ",
            ClinicError::ExaminationNotFound(_) => "Không tìm thấy phiếu khám",
            ClinicError::FileRead(_)
            | ClinicError::Serialization(_)
            | ClinicError::Overflow(_) => "Lỗi hệ thống, vui lòng thử lại sau",
        }
    }
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;
