//! RPC TLS plugin inspection tool
//!
//! Prints certificate details and checks that a configuration initializes.

use clap::{Parser, Subcommand};
use log::{error, info};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rpc_tls_plugin::config::DEFAULT_CONFIG_FILE;
use rpc_tls_plugin::{
    init_logger, Certificate, PasswordPrompt, Plugin, Result, SslConfig, TlsError, APP_NAME,
    VERSION,
};

/// Inspect certificates and validate TLS plugin configuration
#[derive(Parser, Debug)]
#[clap(author, version = VERSION, about, long_about = None)]
struct Args {
    /// Log level
    #[clap(long, default_value = "info", env = "RPC_TLS_LOG_LEVEL")]
    log_level: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a summary of every certificate in a PEM file
    Cert {
        /// PEM certificate or bundle
        path: PathBuf,

        /// Print the full text dump as well
        #[clap(long)]
        full: bool,
    },

    /// Load a configuration and run a full initialization
    Check {
        /// JSON configuration file
        #[clap(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
}

fn print_certificate(index: usize, cert: &Certificate, full: bool) -> Result<()> {
    println!("[{}] subject:     {}", index, cert.subject_dn());
    println!("    issuer:      {}", cert.issuer_dn());
    println!("    serial:      {}", cert.serial_number()?);
    println!("    version:     {}", cert.version());
    println!("    not before:  {}", cert.not_before());
    println!("    not after:   {}", cert.not_after());
    println!("    valid now:   {}", cert.check_validity());
    println!("    sha256:      {}", cert.fingerprint()?);
    for (kind, value) in cert.subject_alt_names() {
        println!("    subject alt: {} {}", kind, value);
    }
    for (kind, value) in cert.issuer_alt_names() {
        println!("    issuer alt:  {} {}", kind, value);
    }
    if full {
        println!("{}", cert);
    }
    Ok(())
}

/// Read one password line; end of input is an error
fn read_password<R: BufRead>(mut input: R) -> io::Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Prompts on stdin and remembers a read failure for reporting
#[derive(Default)]
struct StdinPrompt {
    failure: Mutex<Option<String>>,
}

impl StdinPrompt {
    fn failure(&self) -> Option<String> {
        self.failure.lock().ok().and_then(|failure| failure.clone())
    }
}

impl PasswordPrompt for StdinPrompt {
    fn password(&self) -> String {
        print!("Private key password: ");
        if let Err(e) = io::stdout().flush() {
            error!("Failed to flush password prompt: {}", e);
        }

        match read_password(io::stdin().lock()) {
            Ok(password) => password,
            Err(e) => {
                error!("Cannot read private key password: {}", e);
                if let Ok(mut failure) = self.failure.lock() {
                    *failure = Some(e.to_string());
                }
                String::new()
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(&args.log_level);
    info!("Starting {} v{}", APP_NAME, VERSION);

    match args.command {
        Command::Cert { path, full } => {
            let chain = Certificate::load_chain(&path)?;
            for (index, cert) in chain.iter().enumerate() {
                print_certificate(index, cert, full)?;
            }
        }
        Command::Check { config } => {
            let config = SslConfig::load(Some(&config))?;
            for warning in config.check() {
                println!("warning: {}", warning);
            }

            let prompt = Arc::new(StdinPrompt::default());
            let mut plugin = Plugin::new(config);
            plugin.set_password_prompt(prompt.clone())?;
            if let Err(e) = plugin.initialize(None) {
                return Err(match prompt.failure() {
                    Some(reason) => TlsError::Initialization {
                        reason: format!("cannot read private key password: {}", reason),
                    },
                    None => e,
                });
            }

            let context = plugin.context()?;
            match context.certificate() {
                Some(cert) => {
                    let cert = Certificate::from_x509(cert.to_owned())?;
                    println!("Initialized with certificate {}", cert.subject_dn());
                }
                None => println!("Initialized without a certificate"),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_password_strips_line_ending() {
        assert_eq!(read_password(Cursor::new("secret\r\n")).unwrap(), "secret");
        assert_eq!(read_password(Cursor::new("\n")).unwrap(), "");
    }

    #[test]
    fn test_read_password_closed_input_is_an_error() {
        let err = read_password(Cursor::new("")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
