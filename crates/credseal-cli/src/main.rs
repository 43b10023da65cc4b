mod cli;
mod config;
mod storage;

use crate::cli::{Command, ConfigCommand};
use clap::Parser;
use color_eyre::Result;
use credseal_core::{
    loader::{CredentialLoader, LoadOutcome, RecordLoader},
    options::ProviderOptions,
    protector::{ProtectionProvider, Protector},
    record::Credential,
};
use credseal_storage::{credential::CredentialFile, json_file::EncryptedJsonFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const MASK: &str = "********";

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let config = config::load()?;
    match &cli.command {
        Command::Version => print_version(),
        Command::Config(ConfigCommand::Init) => init_config(&config)?,
        Command::Show { reveal } => {
            let options = config::resolve_options(&config, &cli)?;
            let provider = storage::provider_from_config(&config);
            println!("{}", show_credential(options, &provider, *reveal)?);
        }
        Command::Seal => {
            let options = config::resolve_options(&config, &cli)?;
            let provider = storage::provider_from_config(&config);
            let path = options.file_path.clone();
            let outcome = seal_file(options, &provider)?;
            println!("{}", describe_seal(&path, &outcome));
        }
        Command::Health => {
            let purpose = config::resolve_purpose(&config, &cli)?;
            run_protector_health(&storage::provider_from_config(&config), &purpose)?;
            println!("Protector: ok");
        }
    }

    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters, default to info; keep stdout for command output.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("credseal {}", env!("CARGO_PKG_VERSION"));
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}

/// Load the credential file and render it for the terminal.
fn show_credential<R: ProtectionProvider>(
    options: ProviderOptions,
    provider: &R,
    reveal: bool,
) -> Result<String> {
    let file = CredentialFile::open(options, provider)?;
    let credential = file.load()?;

    let password = match credential.password.as_deref() {
        Some(password) if reveal => password,
        Some(_) => MASK,
        None => "<unset>",
    };
    Ok(format!(
        "UserName: {}\nPassword: {password}",
        credential.user_name.as_deref().unwrap_or("<unset>")
    ))
}

fn seal_file<R: ProtectionProvider>(
    options: ProviderOptions,
    provider: &R,
) -> Result<LoadOutcome<Credential>> {
    let file: EncryptedJsonFile<Credential, _> = EncryptedJsonFile::new(options, provider)?;
    Ok(file.load_outcome()?)
}

fn describe_seal(path: &std::path::Path, outcome: &LoadOutcome<Credential>) -> String {
    if outcome.rewritten {
        format!(
            "Sealed {} field(s); rewrote {}",
            outcome.sealed_fields,
            path.display()
        )
    } else {
        format!("{} already sealed; nothing to do", path.display())
    }
}

/// Round-trips a probe value through a protector scoped to `purpose`.
fn run_protector_health<R: ProtectionProvider>(provider: &R, purpose: &str) -> Result<()> {
    let probe = "credseal-health-probe";
    let protector = provider
        .create_protector(purpose)
        .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?;
    let protected = protector
        .protect(probe)
        .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?;
    let round_trip = protector
        .unprotect(&protected)
        .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?;

    if round_trip != probe {
        color_eyre::eyre::bail!("protector round-trip failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::storage;

    fn fixture(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("creds.json");
        fs::write(&path, r#"{"UserName":"alice","Password":"s3cret"}"#).expect("write");
        path
    }

    #[test]
    fn health_check_with_test_provider_succeeds() {
        run_protector_health(&storage::test_provider(), "app:creds")
            .expect("health check should succeed");
    }

    #[test]
    fn health_check_rejects_empty_purpose() {
        assert!(run_protector_health(&storage::test_provider(), "").is_err());
    }

    #[test]
    fn show_masks_password_unless_revealed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = fixture(&dir);
        let provider = storage::test_provider();

        let masked = show_credential(ProviderOptions::new(&path, "app:creds"), &provider, false)
            .expect("show");
        assert_eq!(masked, "UserName: alice\nPassword: ********");

        let revealed = show_credential(ProviderOptions::new(&path, "app:creds"), &provider, true)
            .expect("show");
        assert_eq!(revealed, "UserName: alice\nPassword: s3cret");
    }

    #[test]
    fn seal_reports_rewrite_then_noop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = fixture(&dir);
        let provider = storage::test_provider();

        let first = seal_file(ProviderOptions::new(&path, "app:creds"), &provider).expect("seal");
        assert!(first.rewritten);
        assert!(describe_seal(&path, &first).starts_with("Sealed 1 field(s)"));
        assert!(!fs::read_to_string(&path).expect("read").contains("s3cret"));

        let second = seal_file(ProviderOptions::new(&path, "app:creds"), &provider).expect("seal");
        assert!(!second.rewritten);
        assert!(describe_seal(&path, &second).ends_with("already sealed; nothing to do"));
    }
}
