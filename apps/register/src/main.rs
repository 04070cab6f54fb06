use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use client_core::{
    load_settings, load_settings_from, ChannelSink, HttpProfileService, Notification,
    NotificationKind, ProfileForm, SubmissionState, SubmitOutcome,
};
use shared::domain::{Field, Gender};
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc::UnboundedReceiver,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Parser, Debug)]
#[command(about = "Create a profile and register an NFC card")]
struct Args {
    /// Profile service base URL; overrides REGISTER_API_BASE_URL and register.toml.
    #[arg(long)]
    base_url: Option<String>,
    /// Settings file to read instead of ./register.toml.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    /// Date of birth as YYYY-MM-DD.
    #[arg(long, value_parser = parse_date)]
    dob: Option<NaiveDate>,
    #[arg(long)]
    email: Option<String>,
    /// One of male, female, others.
    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    card_number: Option<String>,
    /// Fail instead of prompting for missing or invalid fields.
    #[arg(long)]
    no_prompt: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => load_settings_from(path)?,
        None => load_settings(),
    };
    if let Some(base_url) = &args.base_url {
        settings.api_base_url = Some(base_url.clone());
    }
    let service = HttpProfileService::from_settings(&settings)?;
    info!(endpoint = %service.endpoint(), "profile service configured");

    let (sink, mut notifications) = ChannelSink::channel();
    let mut form = ProfileForm::new(Arc::new(service), Arc::new(sink));
    watch_transitions(&form);

    apply_args(&mut form, &args)?;
    let interactive = !args.no_prompt;
    if interactive {
        let missing: Vec<Field> = Field::ALL
            .into_iter()
            .filter(|field| !has_value(&form, *field))
            .collect();
        prompt_fields(&mut form, &missing)?;
    }

    loop {
        match form.submit().await {
            SubmitOutcome::Invalid(errors) => {
                for (field, message) in errors.iter() {
                    println!("  {}: {message}", field.label());
                }
                if !interactive {
                    bail!("profile input is invalid");
                }
                let fields: Vec<Field> = errors.fields().collect();
                prompt_fields(&mut form, &fields)?;
            }
            SubmitOutcome::Succeeded { name } => {
                print_notifications(&mut notifications);
                print_welcome(&name);
                return Ok(());
            }
            SubmitOutcome::Failed { reason } => {
                print_notifications(&mut notifications);
                form.dismiss_error();
                if !interactive || !confirm("Submit again?")? {
                    bail!(reason);
                }
            }
            SubmitOutcome::Ignored(state) => bail!("nothing submitted; the form is {state}"),
        }
    }
}

fn watch_transitions(form: &ProfileForm) {
    let transitions = form.subscribe();
    let session_id = form.session_id();
    tokio::spawn(log_transitions(transitions, session_id));
}

/// Logs each state until the form is dropped. Returns how many were logged.
async fn log_transitions(
    mut transitions: broadcast::Receiver<SubmissionState>,
    session_id: Uuid,
) -> usize {
    let mut logged = 0;
    loop {
        match transitions.recv().await {
            Ok(state) => {
                debug!(%session_id, state = %state, "form state changed");
                if state == SubmissionState::Submitting {
                    info!(%session_id, "submitting profile");
                }
                logged += 1;
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(%session_id, skipped, "state watcher lagged");
            }
            Err(RecvError::Closed) => return logged,
        }
    }
}

fn apply_args(form: &mut ProfileForm, args: &Args) -> Result<()> {
    if let Some(name) = &args.name {
        form.set_name(name.as_str())?;
    }
    if let Some(phone) = &args.phone {
        form.set_phone(phone)?;
    }
    if let Some(dob) = args.dob {
        form.select_date_of_birth(dob)?;
    }
    if let Some(email) = &args.email {
        form.set_email(email.as_str())?;
    }
    if let Some(gender) = &args.gender {
        form.set_gender(gender.as_str())?;
    }
    if let Some(card_number) = &args.card_number {
        form.set_card_number(card_number.as_str())?;
    }
    Ok(())
}

fn has_value(form: &ProfileForm, field: Field) -> bool {
    let input = form.input();
    match field {
        Field::Name => !input.name.is_empty(),
        Field::Phone => !input.phone.is_empty(),
        Field::DateOfBirth => input.date_of_birth.is_some(),
        Field::Email => !input.email.is_empty(),
        Field::Gender => !input.gender.is_empty(),
        Field::CardNumber => !input.card_number.is_empty(),
    }
}

/// Applies one typed answer to the form.
fn apply_field(form: &mut ProfileForm, field: Field, raw: &str) -> Result<()> {
    let value = raw.trim();
    match field {
        Field::Name => form.set_name(value)?,
        Field::Phone => form.set_phone(value)?,
        Field::DateOfBirth => form.select_date_of_birth(parse_date(value)?)?,
        Field::Email => form.set_email(value)?,
        Field::Gender => form.set_gender(value.to_ascii_lowercase())?,
        Field::CardNumber => form.set_card_number(value)?,
    }
    Ok(())
}

fn prompt_fields(form: &mut ProfileForm, fields: &[Field]) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    for &field in fields {
        loop {
            print!("{}: ", prompt_label(field));
            io::stdout().flush()?;
            let line = lines
                .next()
                .ok_or_else(|| anyhow!("input closed before {} was entered", field.label()))??;
            match apply_field(form, field, &line) {
                Ok(()) => break,
                Err(err) => println!("  {err}"),
            }
        }
    }
    Ok(())
}

fn prompt_label(field: Field) -> String {
    match field {
        Field::DateOfBirth => format!("{} (YYYY-MM-DD)", field.label()),
        Field::Gender => {
            let options: Vec<&str> = Gender::ALL.iter().map(|gender| gender.as_str()).collect();
            format!("{} ({})", field.label(), options.join("/"))
        }
        _ => field.label().to_string(),
    }
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N]: ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read answer")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .with_context(|| format!("'{raw}' is not a date in YYYY-MM-DD form"))
}

fn print_notifications(notifications: &mut UnboundedReceiver<Notification>) {
    while let Ok(notification) = notifications.try_recv() {
        let Notification {
            kind,
            title,
            description,
        } = notification;
        match kind {
            NotificationKind::Success => println!("{title}\n{description}"),
            NotificationKind::Error => eprintln!("{title}: {description}"),
        }
    }
}

fn print_welcome(name: &str) {
    println!();
    println!("Welcome to Yaki Ya, {name}!");
    println!("Congratulations! Your profile has been created successfully.");
    println!("Your journey with Yaki Ya begins now!");
}
