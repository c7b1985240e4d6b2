use std::fmt::Display;

use crate::datasets::imdb;

/// The Dataset enum
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Dataset {
    /// IMDB movie reviews
    Imdb,
}

impl Dataset {
    /// The class labels of the dataset, in class id order
    pub fn labels(&self) -> Vec<String> {
        match self {
            Dataset::Imdb => imdb::Dataset::labels(),
        }
    }
}

impl TryFrom<&str> for Dataset {
    type Error = DatasetError;

    /// Try to convert a string to a Dataset
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.to_lowercase() == imdb::DATASET {
            Ok(Dataset::Imdb)
        } else {
            Err(Self::Error::Unknown(value.to_string()))
        }
    }
}

impl Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Dataset::Imdb => imdb::DATASET,
        };

        write!(f, "{}", name)
    }
}

/// Dataset Error
#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    /// No dataset found for the given string
    #[error("no dataset found for {0}")]
    Unknown(String),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_dataset_names() {
        assert_eq!(Dataset::try_from("IMDB").ok(), Some(Dataset::Imdb));
        assert_eq!(Dataset::Imdb.to_string(), "imdb");
        assert!(Dataset::try_from("sst2").is_err());
    }
}
