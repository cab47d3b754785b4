use clap::Parser;

/// Runs one contact-form submission through the same handler the Lambda uses.
#[derive(Debug, Clone, Parser)]
#[command(name = "agrinova-contact")]
#[command(about = "Send a contact form submission through the AgriNova mail relay")]
pub struct CliArgs {
    /// JSON payload file, or `-` to read from stdin
    #[arg(short, long, default_value = "-")]
    pub payload: String,

    /// TOML configuration file; environment variables are used when omitted
    #[arg(short, long)]
    pub config: Option<String>,

    /// HTTP method to simulate
    #[arg(long, default_value = "POST")]
    pub method: String,

    /// Value for the X-Forwarded-For header
    #[arg(long)]
    pub client_ip: Option<String>,

    /// Log the composed emails instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}
