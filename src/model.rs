use serde::{Deserialize, Serialize};

/// A launchable application resolved from a desktop entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,    // Display name, unique within a resolved list
    pub command: String, // Raw Exec= value, field codes still present
}

impl Candidate {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
        }
    }
}
