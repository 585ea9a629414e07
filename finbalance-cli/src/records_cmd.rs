use anyhow::{Context, Result, bail};
use clap::{Subcommand, ValueEnum};
use finbalance_core::{GatewaySettings, MessageLogEntry, ParsedType, Profile};
use finbalance_finance::summary::brl;
use finbalance_finance::{LogQuery, RecordStore};

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Link a WhatsApp number to an account
    Link {
        #[arg(long)]
        user: String,

        /// Number as the gateway reports it, e.g. 5511987654321
        #[arg(long)]
        phone: String,

        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum GatewayCommand {
    /// Store Evolution API settings for an account
    Set {
        #[arg(long)]
        user: String,

        #[arg(long)]
        url: String,

        #[arg(long)]
        key: String,

        #[arg(long)]
        instance: String,
    },
}

/// `--type` filter for message history
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TypeFilter {
    Gasto,
    Ganho,
    Pergunta,
    /// Messages that matched no rule
    None,
}

impl TypeFilter {
    pub fn parsed_type(self) -> Option<ParsedType> {
        match self {
            TypeFilter::Gasto => Some(ParsedType::Gasto),
            TypeFilter::Ganho => Some(ParsedType::Ganho),
            TypeFilter::Pergunta => Some(ParsedType::Pergunta),
            TypeFilter::None => None,
        }
    }
}

pub fn run_profile(store: &dyn RecordStore, command: ProfileCommand) -> Result<()> {
    match command {
        ProfileCommand::Link { user, phone, name } => {
            let digits = normalize_phone(&phone);
            if digits.is_empty() {
                bail!("phone has no digits: {phone}");
            }
            store
                .upsert_profile(Profile {
                    user_id: user.clone(),
                    phone_number: Some(digits.clone()),
                    full_name: name,
                })
                .context("save profile")?;
            println!("Linked {digits} to {user}");
        }
    }
    Ok(())
}

pub fn run_gateway(store: &dyn RecordStore, command: GatewayCommand) -> Result<()> {
    match command {
        GatewayCommand::Set {
            user,
            url,
            key,
            instance,
        } => {
            store
                .upsert_gateway_settings(GatewaySettings {
                    user_id: user.clone(),
                    api_url: Some(url),
                    api_key: Some(key),
                    instance_name: Some(instance.clone()),
                })
                .context("save gateway settings")?;
            println!("Saved gateway settings for {user} (instance {instance})");
        }
    }
    Ok(())
}

/// Per-type tallies shown above the history list
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LogCounts {
    pub total: usize,
    pub expenses: usize,
    pub incomes: usize,
    pub questions: usize,
    pub unrecognized: usize,
}

impl LogCounts {
    pub fn tally(entries: &[MessageLogEntry]) -> Self {
        let mut counts = LogCounts {
            total: entries.len(),
            ..Default::default()
        };
        for e in entries {
            match e.parsed_type {
                Some(ParsedType::Gasto) => counts.expenses += 1,
                Some(ParsedType::Ganho) => counts.incomes += 1,
                Some(ParsedType::Pergunta) => counts.questions += 1,
                None => counts.unrecognized += 1,
            }
        }
        counts
    }
}

pub fn run_messages(
    store: &dyn RecordStore,
    filter: Option<TypeFilter>,
    search: Option<String>,
    limit: usize,
) -> Result<()> {
    let everything = store
        .message_logs(&LogQuery {
            limit: usize::MAX,
            ..Default::default()
        })
        .context("load message log")?;
    let c = LogCounts::tally(&everything);
    println!(
        "total={} gastos={} ganhos={} perguntas={} não reconhecidas={}\n",
        c.total, c.expenses, c.incomes, c.questions, c.unrecognized
    );

    let query = LogQuery {
        parsed_type: filter.map(TypeFilter::parsed_type),
        search,
        limit,
    };
    let entries = store.message_logs(&query).context("load message log")?;
    if entries.is_empty() {
        println!("No messages.");
        return Ok(());
    }
    for e in &entries {
        println!("{}", format_entry(e));
    }
    Ok(())
}

fn format_entry(e: &MessageLogEntry) -> String {
    let kind = e.parsed_type.map(|t| t.label()).unwrap_or("-");
    let mut line = format!(
        "{} | {} | {} | {}",
        e.created_at.format("%Y-%m-%d %H:%M"),
        e.phone_number.as_deref().unwrap_or("-"),
        kind,
        e.raw_message
    );
    if let Some(d) = &e.parsed_data {
        line.push_str(&format!(" | {}: {}", d.description, brl(d.amount)));
    }
    if e.response_sent.is_some() {
        line.push_str(" | replied");
    }
    line
}

fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}
