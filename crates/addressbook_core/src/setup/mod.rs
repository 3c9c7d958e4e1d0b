//! Sample data setup for a fresh docbase.
//!
//! # Responsibility
//! - Read `(name, telephone)` rows from header-less CSV.
//! - Derive dummy email addresses for imported contacts.
//!
//! # Invariants
//! - Every accepted row has a non-blank name and telephone.
//! - Derived emails are `lowercase(name)` with spaces turned into dots,
//!   followed by `@` and one of `DUMMY_DOMAINS`.

use crate::model::contact::NAME_MAX_CHARS;
use rand::Rng;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Domains picked uniformly at random for derived email addresses.
pub const DUMMY_DOMAINS: [&str; 7] = [
    "thecloud.com",
    "coldmail.net",
    "boohoo.com",
    "jungle.biz",
    "emailme.com",
    "dontsendmespam.net",
    "emailisso1990s.com",
];

pub type SetupResult<T> = Result<T, SetupError>;

#[derive(Debug)]
pub enum SetupError {
    Io { path: PathBuf, source: std::io::Error },
    Csv(csv::Error),
    InvalidRow { line: u64, message: String },
}

impl Display for SetupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to open `{}`: {source}", path.display())
            }
            Self::Csv(err) => write!(f, "{err}"),
            Self::InvalidRow { line, message } => write!(f, "line {line}: {message}"),
        }
    }
}

impl Error for SetupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv(err) => Some(err),
            Self::InvalidRow { .. } => None,
        }
    }
}

impl From<csv::Error> for SetupError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

/// One contact to import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRow {
    pub name: String,
    pub telephone: String,
}

impl ContactRow {
    pub fn new(name: impl Into<String>, telephone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            telephone: telephone.into(),
        }
    }
}

/// Parses header-less `name,telephone` CSV. Fields are trimmed and blank
/// lines skipped.
///
/// # Errors
/// - `InvalidRow` for rows without exactly two fields or with a blank field.
pub fn read_contact_rows(reader: impl Read) -> SetupResult<Vec<ContactRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |position| position.line());

        if record.iter().all(str::is_empty) {
            continue;
        }
        if record.len() != 2 {
            return Err(SetupError::InvalidRow {
                line,
                message: format!("expected 2 fields (name, telephone), found {}", record.len()),
            });
        }

        let name = &record[0];
        let telephone = &record[1];
        if name.is_empty() {
            return Err(SetupError::InvalidRow {
                line,
                message: "name is blank".to_string(),
            });
        }
        if telephone.is_empty() {
            return Err(SetupError::InvalidRow {
                line,
                message: "telephone is blank".to_string(),
            });
        }

        rows.push(ContactRow::new(name, telephone));
    }

    Ok(rows)
}

pub fn read_contact_rows_from_path(path: &Path) -> SetupResult<Vec<ContactRow>> {
    let file = std::fs::File::open(path).map_err(|source| SetupError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_contact_rows(file)
}

/// Builds a dummy address such as `ada.lovelace@jungle.biz`.
///
/// The local part is capped at `NAME_MAX_CHARS` characters, so every
/// address derived from a valid name passes contact validation.
pub fn generate_email_address<R: Rng + ?Sized>(name: &str, rng: &mut R) -> String {
    let local_part: String = name
        .to_lowercase()
        .replace(' ', ".")
        .chars()
        .take(NAME_MAX_CHARS)
        .collect();
    let domain = DUMMY_DOMAINS[rng.gen_range(0..DUMMY_DOMAINS.len())];
    format!("{local_part}@{domain}")
}

#[cfg(test)]
mod tests {
    use super::{generate_email_address, read_contact_rows, ContactRow, SetupError, DUMMY_DOMAINS};
    use crate::model::contact::{Contact, EMAIL_MAX_CHARS, NAME_MAX_CHARS};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn reads_trimmed_rows_and_skips_blank_lines() {
        let input = "Ada Lovelace, 0123 456\n\n\"Turing, Alan\",999\n";
        let rows = read_contact_rows(input.as_bytes()).expect("csv should parse");
        assert_eq!(
            rows,
            vec![
                ContactRow::new("Ada Lovelace", "0123 456"),
                ContactRow::new("Turing, Alan", "999"),
            ]
        );
    }

    #[test]
    fn blank_telephone_names_the_line() {
        let input = "Ada Lovelace,1\nGrace Hopper,  \n";
        let err = read_contact_rows(input.as_bytes()).expect_err("blank telephone must fail");
        match err {
            SetupError::InvalidRow { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("telephone"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn wrong_field_count_is_rejected() {
        let err = read_contact_rows("only-a-name\n".as_bytes()).unwrap_err();
        assert!(matches!(err, SetupError::InvalidRow { line: 1, .. }));
    }

    #[test]
    fn email_is_lowercased_dotted_and_uses_dummy_domain() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let email = generate_email_address("Ada King Lovelace", &mut rng);
            let (local, domain) = email.split_once('@').expect("email should contain @");
            assert_eq!(local, "ada.king.lovelace");
            assert!(DUMMY_DOMAINS.contains(&domain));
        }
    }

    #[test]
    fn every_domain_is_reachable() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..500 {
            let email = generate_email_address("x", &mut rng);
            seen.insert(email.split_once('@').map(|(_, d)| d.to_string()).unwrap());
        }
        assert_eq!(seen.len(), DUMMY_DOMAINS.len());
    }

    #[test]
    fn email_from_longest_valid_name_fits_contact_limits() {
        let longest_domain = DUMMY_DOMAINS.iter().map(|d| d.len()).max().unwrap();
        assert!(NAME_MAX_CHARS + 1 + longest_domain <= EMAIL_MAX_CHARS);

        let mut rng = StdRng::seed_from_u64(11);
        for name in ["A".repeat(NAME_MAX_CHARS), "\u{130}".repeat(NAME_MAX_CHARS)] {
            let email = generate_email_address(&name, &mut rng);
            let contact = Contact::new(name, email, "1");
            assert!(contact.validate().is_ok());
        }
    }
}
