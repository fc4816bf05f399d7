use crate::model::Candidate;
use anyhow::Result;

pub trait Source {
    fn scan(&self) -> Result<Vec<Candidate>>;
}

pub mod desktop;
