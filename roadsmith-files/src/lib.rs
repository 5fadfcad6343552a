use crate::typedefs::Templates;
use quick_xml::de::Deserializer;
use serde::Deserialize;
use std::io::BufRead;
use thiserror::Error;

pub mod building;
pub mod segment;
pub mod typedefs;

#[derive(Error, Debug)]
pub enum TemplateFileError {
    #[error("The template file does not match the expected schema: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("Template {id} is violating the expected format, because: {reason}")]
    FormatError { id: String, reason: &'static str },

    #[error("Template id {id} is defined more than once")]
    DuplicateId { id: String },

    /// The file parsed, but did not contain a single usable template.
    #[error("Source contains no templates")]
    EmptySource,
}

/// Parses and validates a template set, e.g. `assets/templates/city.xml`.
pub fn deserialize_templates<T: BufRead>(read: T) -> Result<Templates, TemplateFileError> {
    let mut deserializer = Deserializer::from_reader(read);
    let templates = Templates::deserialize(&mut deserializer)?;
    templates.validate()?;
    Ok(templates)
}
