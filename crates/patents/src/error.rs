use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatentError {
  #[error("Failed to load patent data from {location}: {message}")]
  Fetch { location: String, message: String },

  #[error("Failed to parse patent data: {message}")]
  Parse { message: String },

  #[error("Please enter or upload an abstract")]
  EmptyInput,

  #[error("Unsupported file '{file_name}': please upload a .txt file")]
  UnsupportedFileType { file_name: String },

  #[error("Abstract is too long: {length}/{limit} characters")]
  AbstractTooLong { length: usize, limit: usize },

  #[error("Prediction failed: {source}")]
  DataUnavailable {
    #[source]
    source: Box<PatentError>,
  },

  #[error("Patent dataset contains no records")]
  EmptyDataset,

  #[error("Invalid configuration: {message}")]
  Config { message: String },
}

impl PatentError {
  pub fn fetch(location: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Fetch { location: location.into(), message: message.into() }
  }

  pub fn parse(message: impl Into<String>) -> Self {
    Self::Parse { message: message.into() }
  }

  pub fn unsupported_file_type(file_name: impl Into<String>) -> Self {
    Self::UnsupportedFileType { file_name: file_name.into() }
  }

  pub fn abstract_too_long(length: usize, limit: usize) -> Self {
    Self::AbstractTooLong { length, limit }
  }

  pub fn data_unavailable(cause: PatentError) -> Self {
    Self::DataUnavailable { source: Box::new(cause) }
  }

  pub fn config(message: impl Into<String>) -> Self {
    Self::Config { message: message.into() }
  }
}

impl From<serde_json::Error> for PatentError {
  fn from(err: serde_json::Error) -> Self {
    Self::parse(err.to_string())
  }
}

pub type Result<T> = std::result::Result<T, PatentError>;
