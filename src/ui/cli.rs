//! Command-line interface definition.
//!
//! Explorer starts the program as `vt-context-menu "<selected file>"`, so the
//! only positional argument is either a file path or one of the registration
//! flags. The flags are matched case-insensitively, which is why they are not
//! declared as clap flags.

use clap::Parser;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

/// VirusTotal context-menu scanner
#[derive(Parser, Debug)]
#[command(name = "vt-context-menu")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Without arguments the context-menu entry is registered, \
or unregistered if it already exists.")]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// File to scan, or --register / --unregister
    #[arg(value_name = "FILE", allow_hyphen_values = true)]
    pub target: Option<OsString>,
}

/// What the program was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Register if not registered, unregister otherwise
    Toggle,
    /// Register unconditionally
    Register,
    /// Unregister unconditionally
    Unregister,
    /// Scan the file
    Scan(PathBuf),
}

impl Invocation {
    /// Classify the positional argument.
    pub fn from_arg(arg: Option<&OsStr>) -> Self {
        let Some(arg) = arg else {
            return Invocation::Toggle;
        };

        match arg.to_str() {
            Some(flag) if flag.eq_ignore_ascii_case("--register") => Invocation::Register,
            Some(flag) if flag.eq_ignore_ascii_case("--unregister") => Invocation::Unregister,
            _ => Invocation::Scan(PathBuf::from(arg)),
        }
    }
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The requested invocation.
    pub fn invocation(&self) -> Invocation {
        Invocation::from_arg(self.target.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_argument_toggles() {
        assert_eq!(Invocation::from_arg(None), Invocation::Toggle);
    }

    #[test]
    fn test_flags_case_insensitive() {
        for flag in ["--register", "--REGISTER", "--Register"] {
            assert_eq!(
                Invocation::from_arg(Some(OsStr::new(flag))),
                Invocation::Register
            );
        }
        for flag in ["--unregister", "--UnRegister"] {
            assert_eq!(
                Invocation::from_arg(Some(OsStr::new(flag))),
                Invocation::Unregister
            );
        }
    }

    #[test]
    fn test_path_is_scan() {
        assert_eq!(
            Invocation::from_arg(Some(OsStr::new(r"C:\Users\me\Downloads\setup.exe"))),
            Invocation::Scan(PathBuf::from(r"C:\Users\me\Downloads\setup.exe"))
        );
    }

    #[test]
    fn test_cli_parse() {
        let cli = Cli::try_parse_from(["vt-context-menu", "report.pdf"]).unwrap();
        assert!(!cli.verbose);
        assert_eq!(cli.invocation(), Invocation::Scan(PathBuf::from("report.pdf")));

        let cli = Cli::try_parse_from(["vt-context-menu"]).unwrap();
        assert_eq!(cli.invocation(), Invocation::Toggle);
    }

    #[test]
    fn test_cli_verbose() {
        let cli = Cli::try_parse_from(["vt-context-menu", "-v", "report.pdf"]).unwrap();
        assert!(cli.verbose);
    }
}
