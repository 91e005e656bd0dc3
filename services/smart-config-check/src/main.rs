//! SMART configuration check
//!
//! Loads the effective SMART-on-FHIR settings (built-ins, or a TOML file
//! overriding them), validates them, and logs every value so an operator can
//! confirm what a deployment will send to the authorization server. Makes no
//! network requests.

use anyhow::{Context, Result};
use smart_config::{SmartSettings, resolve_path};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line: `--config PATH` and `--resource PATH`, both optional.
#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<String>,
    resource: Option<String>,
}

impl Args {
    fn parse(args: &[String]) -> Self {
        let value_of = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
                .cloned()
        };
        Self {
            config: value_of("--config"),
            resource: value_of("--resource"),
        }
    }
}

/// Load and validate settings, then log them. Returns the resolved resource
/// URL when one was requested.
fn run(args: &Args) -> Result<(SmartSettings, Option<String>)> {
    let config_path = resolve_path(args.config.as_deref());
    info!(path = %config_path.display(), "loading SMART configuration");

    let settings = SmartSettings::load_or_default(&config_path).with_context(|| {
        format!(
            "failed to load SMART configuration from {}",
            config_path.display()
        )
    })?;

    let keys = settings.storage_keys();
    info!(
        client_id = %settings.client_id(),
        fhir_base_url = %settings.fhir_base_url(),
        authorize_url = %settings.authorize_url(),
        token_url = %settings.token_url(),
        redirect_uri = %settings.redirect_uri(),
        code_verifier_key = %keys.code_verifier(),
        token_response_key = %keys.token_response(),
        "configuration valid"
    );

    let resource_url = match args.resource.as_deref() {
        Some(path) => {
            let url = settings
                .resource_url(path)
                .with_context(|| format!("cannot build FHIR URL for {path}"))?;
            info!(resource = %path, url = %url, "resolved FHIR resource URL");
            Some(url.to_string())
        }
        None => None,
    };

    Ok((settings, resource_url))
}

fn main() -> Result<()> {
    // JSON logs, LOG_LEVEL / RUST_LOG filter
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let argv: Vec<String> = std::env::args().collect();
    let args = Args::parse(&argv);
    run(&args)?;
    Ok(())
}
