use clap::Parser;

use meridian::auth::TokenVerifier;
use meridian::config::ServiceConfig;

/// Development token issuer. Signs a bearer token with the secret from
/// the service configuration so local clients can call the API.
#[derive(Parser, Debug)]
#[clap(name = "issue_token", version)]
struct Args {
    /// Subject (username) the token asserts
    #[clap(long)]
    subject: String,

    /// Numeric user id claim
    #[clap(long)]
    user_id: Option<u64>,

    /// Role claim
    #[clap(long)]
    role: Option<String>,

    /// Token lifetime in seconds
    #[clap(long, default_value = "3600")]
    ttl: i64,

    /// Path to the TOML configuration file
    #[clap(long, default_value = "meridian.toml")]
    config: String,
}

fn main() {
    let args = Args::parse();
    let config = ServiceConfig::load_or_default(&args.config);
    let verifier = TokenVerifier::new(config.auth.jwt_secret.as_bytes());

    match verifier.issue(&args.subject, args.user_id, args.role.as_deref(), args.ttl) {
        Ok(token) => {
            println!("Bearer token for {} (expires in {}s):", args.subject, args.ttl);
            println!("{}", token);
        }
        Err(e) => {
            eprintln!("Failed to issue token: {:?}", e);
            std::process::exit(1);
        }
    }
}
