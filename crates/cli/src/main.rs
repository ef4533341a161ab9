use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use triage_agents::SupportAgent;
use triage_core::Catalog;
use triage_ml::{load_capability, parse_switch, NerSettings};
use triage_observability::{init_tracing, AppMetrics};

#[derive(Debug, Parser)]
#[command(name = "triage")]
#[command(about = "Support intent triage CLI")]
struct Cli {
    /// `off` disables date/time/money recognition.
    #[arg(long, env = "TRIAGE_NER", default_value = "on")]
    ner: String,

    /// JSON lexicon replacing the builtin date/time/money patterns.
    #[arg(long, env = "TRIAGE_NER_LEXICON")]
    ner_lexicon: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive session; `exit` or `quit` leaves.
    Chat,
    Ask {
        text: String,
        /// Print the structured reply instead of the text.
        #[arg(long)]
        json: bool,
    },
    /// Per-intent scores for a message.
    Explain { text: String },
    /// Dump the intent catalogue.
    Intents,
}

fn main() -> Result<()> {
    init_tracing("triage_cli");
    let cli = Cli::parse();

    let agent = build_agent(&cli)?;

    match cli.command {
        Command::Chat => run_chat(&agent)?,
        Command::Ask { text, json } => {
            if json {
                let reply = agent.resolve_query(&text)?;
                println!("{}", serde_json::to_string_pretty(&reply)?);
            } else {
                println!("{}", agent.handle_query(&text));
            }
        }
        Command::Explain { text } => {
            let scores = agent
                .explain(&text)
                .into_iter()
                .filter(|score| score.score > 0.0)
                .collect::<Vec<_>>();
            println!("{}", serde_json::to_string_pretty(&scores)?);
        }
        Command::Intents => {
            println!(
                "{}",
                serde_json::to_string_pretty(&agent.catalog().summary())?
            );
        }
    }

    Ok(())
}

fn run_chat(agent: &SupportAgent) -> Result<()> {
    println!("Support triage chat mode. type 'exit' to quit.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        println!("\n{}\n", agent.handle_query(message));
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&agent.metrics()).context("failed encoding metrics")?
    );
    Ok(())
}

fn build_agent(cli: &Cli) -> Result<SupportAgent> {
    let catalog = Catalog::builtin().context("failed building builtin intent catalog")?;
    let capability = load_capability(&NerSettings {
        enabled: parse_switch(&cli.ner),
        lexicon_path: cli.ner_lexicon.clone(),
    });

    Ok(SupportAgent::new(
        Arc::new(catalog),
        capability,
        AppMetrics::shared(),
    ))
}
