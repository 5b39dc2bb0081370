use crate::infra::{waitlist_settings, DryRunEndpoint, TerminalClipboard};
use clap::Args;
use std::io::{self, BufRead, Write};
use void_walker::config::AppConfig;
use void_walker::error::AppError;
use void_walker::workflows::waitlist::{
    CelebrationSlot, Clipboard, ConfettiBurst, HttpSubmissionEndpoint, NotificationBuffer, Phase,
    ReferralLink, SubmissionEndpoint, TaskInstruction, WaitlistField, WaitlistSettings,
    WaitlistWizard, WizardError,
};

#[derive(Args, Debug, Default)]
pub(crate) struct JoinArgs {
    /// Walk through every phase without contacting the spreadsheet endpoint
    #[arg(long)]
    pub(crate) dry_run: bool,
    /// Override the spreadsheet endpoint submissions are posted to
    #[arg(long)]
    pub(crate) endpoint: Option<String>,
    /// Override the site origin used to build the referral link
    #[arg(long)]
    pub(crate) origin: Option<String>,
}

pub(crate) async fn run_join(args: JoinArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(endpoint) = args.endpoint.as_deref() {
        config.waitlist.set_endpoint_url(endpoint)?;
    }
    if let Some(origin) = args.origin.as_deref() {
        config.waitlist.set_site_origin(origin)?;
    }

    let settings = waitlist_settings(&config.waitlist);
    let mut input = io::stdin().lock();
    let mut output = io::stdout().lock();

    let joined = if args.dry_run {
        walk(&mut input, &mut output, &DryRunEndpoint, &settings, &TerminalClipboard).await?
    } else {
        let endpoint = HttpSubmissionEndpoint::new(
            config.waitlist.endpoint_url.clone(),
            config.waitlist.request_timeout,
        )?;
        walk(&mut input, &mut output, &endpoint, &settings, &TerminalClipboard).await?
    };

    if joined.is_none() {
        writeln!(output, "Signup abandoned. Run `join` again whenever you are ready.")?;
    }
    Ok(())
}

/// Drives one wizard from scripted terminal input until it reaches `Success`
/// or the user gives up after a failed submission.
pub(crate) async fn walk<I, O, E>(
    input: &mut I,
    output: &mut O,
    endpoint: &E,
    settings: &WaitlistSettings,
    clipboard: &dyn Clipboard,
) -> Result<Option<ReferralLink>, AppError>
where
    I: BufRead,
    O: Write,
    E: SubmissionEndpoint,
{
    let notifier = NotificationBuffer::default();
    let celebration = CelebrationSlot::default();
    let instructions = TaskInstruction::standard(&settings.campaign_url);
    let mut wizard = WaitlistWizard::new();

    loop {
        let phase = wizard.phase();
        writeln!(output)?;
        match phase.tagline() {
            Some(tagline) => writeln!(output, "{} :: {tagline}", phase.heading())?,
            None => writeln!(output, "{}", phase.heading())?,
        }

        match phase {
            Phase::Identity => {
                let name = prompt(input, output, WaitlistField::TwitterName)?;
                wizard.set_field(WaitlistField::TwitterName, name)?;
                settle(wizard.advance(&notifier), &notifier, output)?;
            }
            Phase::Tasks => {
                for instruction in &instructions {
                    writeln!(output, "  - {} ({})", instruction.label, instruction.url)?;
                }
                for field in [WaitlistField::QuoteLink, WaitlistField::CommentLink] {
                    let value = prompt(input, output, field)?;
                    wizard.set_field(field, value)?;
                }
                settle(wizard.advance(&notifier), &notifier, output)?;
            }
            Phase::Wallet => {
                let wallet = prompt(input, output, WaitlistField::WalletAddress)?;
                wizard.set_field(WaitlistField::WalletAddress, wallet)?;
                let result = wizard
                    .submit(endpoint, settings.honeypot, &notifier, &celebration)
                    .await;
                print_notifications(&notifier, output)?;

                match result {
                    Ok(_) | Err(WizardError::Validation(_)) => {}
                    Err(WizardError::Submission(_)) => {
                        if !confirm(input, output, "Try again? [Y/n]")? {
                            return Ok(None);
                        }
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            Phase::Success => {
                if let Some(burst) = celebration.take() {
                    writeln!(output, "{}", render_burst(&burst))?;
                }
                let link = wizard.referral_link(&settings.referral)?;
                writeln!(output, "Your referral link: {link}")?;
                // A refused copy is reported through the notifier; the link is already printed.
                wizard
                    .copy_referral(&settings.referral, clipboard, &notifier)
                    .ok();
                print_notifications(&notifier, output)?;
                return Ok(Some(link));
            }
        }
    }
}

/// Prints what the step raised; validation failures just repeat the phase.
fn settle<T, O: Write>(
    result: Result<T, WizardError>,
    notifier: &NotificationBuffer,
    output: &mut O,
) -> Result<(), AppError> {
    print_notifications(notifier, output)?;
    match result {
        Ok(_) | Err(WizardError::Validation(_)) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn print_notifications<O: Write>(notifier: &NotificationBuffer, output: &mut O) -> io::Result<()> {
    for notification in notifier.drain() {
        let marker = if notification.is_destructive() { "!" } else { "*" };
        writeln!(
            output,
            "{marker} {}: {}",
            notification.title, notification.description
        )?;
    }
    Ok(())
}

fn prompt<I: BufRead, O: Write>(
    input: &mut I,
    output: &mut O,
    field: WaitlistField,
) -> Result<String, AppError> {
    read_answer(input, output, field.placeholder())
}

fn confirm<I: BufRead, O: Write>(
    input: &mut I,
    output: &mut O,
    question: &str,
) -> Result<bool, AppError> {
    let answer = read_answer(input, output, question)?;
    Ok(!matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "n" | "no"
    ))
}

fn read_answer<I: BufRead, O: Write>(
    input: &mut I,
    output: &mut O,
    label: &str,
) -> Result<String, AppError> {
    write!(output, "{label} > ")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed before the signup finished",
        )
        .into());
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn render_burst(burst: &ConfettiBurst) -> String {
    let sparks = "*".repeat(usize::from(burst.spread / 7));
    format!("{sparks} Manifested {sparks}")
}
