//! Command line definition.

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "chanterelle", version)]
#[command(about = "Contact the band, or sign in to read what people sent")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Send a message through the public contact form
    Contact(ContactArgs),
    /// Request a login code for an admin phone number or email
    Login {
        /// `+1` phone number or email, depending on LOGIN__VARIANT
        identifier: String,
    },
    /// Enter the login code
    Verify(VerifyArgs),
    /// List received contacts
    Contacts,
    /// Delete a contact
    Remove {
        /// Contact id as shown by `contacts`
        id: u64,
    },
    /// Forget the session token and pending login
    Logout,
    /// Show API reachability and session state
    Status,
}

#[derive(Debug, Args)]
pub struct ContactArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub message: Option<String>,
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// The 6-digit code. Prompted for digit by digit when omitted.
    pub code: Option<String>,
    /// Submit as soon as the last digit is entered
    #[arg(long)]
    pub auto_submit: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_contact() {
        let cli = Cli::try_parse_from([
            "chanterelle",
            "contact",
            "--name",
            "Al",
            "--email",
            "al@example.com",
        ])
        .unwrap();

        match cli.command {
            Commands::Contact(args) => {
                assert_eq!(args.name, "Al");
                assert!(args.phone.is_none());
                assert!(args.message.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_verify_and_remove() {
        let cli = Cli::try_parse_from(["chanterelle", "verify", "--auto-submit"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Verify(VerifyArgs { code: None, auto_submit: true })
        ));

        let cli = assert_ok!(Cli::try_parse_from(["chanterelle", "remove", "7"]));
        assert!(matches!(cli.command, Commands::Remove { id: 7 }));

        assert_err!(Cli::try_parse_from(["chanterelle", "remove", "seven"]));
        assert_err!(Cli::try_parse_from(["chanterelle", "login"]));
    }
}
