//! Address book command-line client.
//!
//! # Responsibility
//! - Load configuration, start logging and open the configured docbase.
//! - Map subcommands onto `ContactService` calls and print the results.

use addressbook_core::setup::read_contact_rows_from_path;
use addressbook_core::{
    contact_repository, init_logging, AppConfig, Contact, ContactId, ContactQuery,
    ContactService, Session, StoreContactRepository,
};
use clap::{Parser, Subcommand};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Address book backed by a docbase.
#[derive(Parser)]
#[command(name = "addressbook", version, about = "Address book over a content repository")]
struct Cli {
    /// Path to the TOML configuration file (default: ./addressbook.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every contact.
    List,
    /// Find contacts whose name contains TEXT (case-sensitive).
    Search { text: String },
    /// Show one contact.
    Show {
        #[arg(value_parser = parse_id)]
        id: ContactId,
    },
    /// Create a contact.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        telephone: String,
    },
    /// Change attributes of an existing contact.
    Update {
        #[arg(value_parser = parse_id)]
        id: ContactId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        telephone: Option<String>,
    },
    /// Delete a contact and its picture.
    Delete {
        #[arg(value_parser = parse_id)]
        id: ContactId,
    },
    /// Attach a picture to a contact.
    SetPicture {
        #[arg(value_parser = parse_id)]
        id: ContactId,
        path: PathBuf,
        /// Format tag; defaults to the file's extension.
        #[arg(long)]
        extension: Option<String>,
    },
    /// Download a contact's picture.
    GetPicture {
        #[arg(value_parser = parse_id)]
        id: ContactId,
        destination: PathBuf,
    },
    /// Create contacts from a header-less `name,telephone` CSV file.
    Import {
        path: PathBuf,
        /// Seed for the dummy email domain choice.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Delete every contact in the docbase.
    Purge {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = AppConfig::load(cli.config.as_deref())?;

    let log_dir = config
        .logging
        .resolve_directory(&config.repository.data_dir);
    if let Err(err) = init_logging(&config.logging.level, &log_dir) {
        eprintln!("warning: logging disabled: {err}");
    }

    let session = Session::connect(&config.repository)?;
    let service = ContactService::new(contact_repository(&session, &config.repository)?);
    info!(
        "event=cli_command module=cli status=start docbase={}",
        session.docbase()
    );

    execute(&service, cli.command, cli.json)
}

fn execute(
    service: &ContactService<StoreContactRepository<'_>>,
    command: Commands,
    json: bool,
) -> CliResult<()> {
    match command {
        Commands::List => print_query(&service.find_all(), json),
        Commands::Search { text } => print_query(&service.find_by_name_containing(&text), json),
        Commands::Show { id } => print_contacts(&[service.require(&id)?], json),
        Commands::Add {
            name,
            email,
            telephone,
        } => {
            let created = service.create_contact(name, email, telephone)?;
            print_contacts(&[created], json)
        }
        Commands::Update {
            id,
            name,
            email,
            telephone,
        } => {
            let mut contact = service.require(&id)?;
            if let Some(name) = name {
                contact.name = name;
            }
            if let Some(email) = email {
                contact.email = email;
            }
            if let Some(telephone) = telephone {
                contact.telephone = telephone;
            }
            print_contacts(&[service.save(&contact)?], json)
        }
        Commands::Delete { id } => {
            let contact = service.require(&id)?;
            service.delete(&contact)?;
            println!("deleted {id}");
            Ok(())
        }
        Commands::SetPicture {
            id,
            path,
            extension,
        } => {
            let contact = service.require(&id)?;
            let extension = match extension {
                Some(extension) => extension,
                None => extension_of(&path)?,
            };
            service.set_content(&contact, &extension, &path)?;
            println!("picture set for {id}");
            Ok(())
        }
        Commands::GetPicture { id, destination } => {
            let contact = service.require(&id)?;
            let written = service.get_content(&contact, &destination)?;
            println!("{}", written.display());
            Ok(())
        }
        Commands::Import { path, seed } => {
            let rows = read_contact_rows_from_path(&path)?;
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let created = service.import_contacts(&rows, &mut rng)?;
            if json {
                print_contacts(&created, true)
            } else {
                println!("imported {} contacts", created.len());
                Ok(())
            }
        }
        Commands::Purge { yes } => {
            if !yes {
                return Err("refusing to delete every contact without --yes".into());
            }
            let deleted = service.delete_all_contacts()?;
            println!("deleted {deleted} contacts");
            Ok(())
        }
    }
}

fn parse_id(value: &str) -> Result<ContactId, String> {
    value.parse::<ContactId>().map_err(|err| err.to_string())
}

fn extension_of(path: &Path) -> CliResult<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            format!(
                "`{}` has no extension; pass --extension",
                path.display()
            )
            .into()
        })
}

fn print_query(query: &ContactQuery<'_>, json: bool) -> CliResult<()> {
    if json {
        return print_contacts(&query.to_vec()?, true);
    }

    let mut count = 0;
    for contact in query {
        print_contact(&contact?);
        count += 1;
    }
    if count == 0 {
        println!("no contacts");
    }
    Ok(())
}

fn print_contacts(contacts: &[Contact], json: bool) -> CliResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(contacts)?);
    } else {
        contacts.iter().for_each(print_contact);
    }
    Ok(())
}

fn print_contact(contact: &Contact) {
    let id = contact
        .id
        .as_ref()
        .map_or_else(|| "-".to_string(), ToString::to_string);
    println!("{id}  {}  <{}>  {}", contact.name, contact.email, contact.telephone);
}

#[cfg(test)]
mod tests {
    use super::{extension_of, parse_id, Cli, Commands};
    use clap::{CommandFactory, Parser};
    use std::path::Path;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn update_accepts_partial_fields() {
        let cli = Cli::try_parse_from([
            "addressbook",
            "update",
            "0123456789abcdef0123456789abcdef",
            "--email",
            "new@example.com",
        ])
        .unwrap();
        match cli.command {
            Commands::Update { name, email, .. } => {
                assert_eq!(name, None);
                assert_eq!(email.as_deref(), Some("new@example.com"));
            }
            _ => panic!("expected update command"),
        }
    }

    #[test]
    fn malformed_id_is_rejected_at_parse_time() {
        assert!(parse_id("nope").is_err());
        assert!(Cli::try_parse_from(["addressbook", "show", "nope"]).is_err());
    }

    #[test]
    fn picture_extension_comes_from_path() {
        assert_eq!(extension_of(Path::new("/tmp/me.png")).unwrap(), "png");
        assert!(extension_of(Path::new("/tmp/me")).is_err());
    }
}
