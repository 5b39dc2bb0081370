use crate::join::{run_join, JoinArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use void_walker::config::AppConfig;
use void_walker::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "void-walker",
    about = "Run the void-walker waitlist service or join the waitlist from a terminal",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk through the waitlist wizard interactively
    Join(JoinArgs),
    /// Print the referral link for a Twitter name
    Referral(ReferralArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the spreadsheet endpoint submissions are posted to
    #[arg(long)]
    pub(crate) endpoint: Option<String>,
    /// Override the site origin used to build referral links
    #[arg(long)]
    pub(crate) origin: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct ReferralArgs {
    /// Twitter (X) name the link is issued for
    #[arg(long)]
    pub(crate) name: String,
    /// Override the site origin used to build the link
    #[arg(long)]
    pub(crate) origin: Option<String>,
    /// Print the link as a JSON object
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Serialize)]
struct ReferralOutput<'a> {
    twitter_name: &'a str,
    referral_link: String,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Join(args) => run_join(args).await,
        Command::Referral(args) => print_referral(args),
    }
}

fn print_referral(args: ReferralArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(origin) = args.origin.as_deref() {
        config.waitlist.set_site_origin(origin)?;
    }

    let link = config.waitlist.referral_base().link_for(&args.name);
    if args.json {
        let output = ReferralOutput {
            twitter_name: &args.name,
            referral_link: link.into_string(),
        };
        let rendered = serde_json::to_string_pretty(&output)
            .map_err(|err| AppError::Io(err.into()))?;
        println!("{rendered}");
    } else {
        println!("{link}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["void-walker"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn join_accepts_dry_run_and_overrides() {
        let cli = Cli::try_parse_from([
            "void-walker",
            "join",
            "--dry-run",
            "--origin",
            "https://example.com",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Join(args)) => {
                assert!(args.dry_run);
                assert_eq!(args.origin.as_deref(), Some("https://example.com"));
                assert!(args.endpoint.is_none());
            }
            other => panic!("expected join, got {other:?}"),
        }
    }

    #[test]
    fn referral_requires_a_name() {
        assert!(Cli::try_parse_from(["void-walker", "referral"]).is_err());
    }
}
