use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use hervival_core::{
    ChatReply, CrisisDetector, EmergencyCategory, ExerciseKind, FixedPicker, KeywordResponder,
    ResourceProvider, StarterPicker, ThreadRngPicker,
};
use hervival_observability::init_tracing;

#[derive(Debug, Parser)]
#[command(name = "hervival")]
#[command(about = "HerVival support responder CLI")]
struct Cli {
    /// Always pick this conversation starter slot instead of a random one.
    #[arg(long, global = true)]
    starter_slot: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Chat {
        #[arg(long, default_value = "neutral")]
        emotion: String,
    },
    Crisis {
        text: Vec<String>,
    },
    Resources {
        #[arg(long)]
        category: Option<String>,
    },
    SelfCare {
        #[arg(long)]
        kind: Option<String>,
    },
}

fn main() -> Result<()> {
    init_tracing("hervival_cli");
    let cli = Cli::parse();

    match cli.command {
        Command::Chat { emotion } => {
            let picker: Arc<dyn StarterPicker> = match cli.starter_slot {
                Some(slot) => Arc::new(FixedPicker(slot)),
                None => Arc::new(ThreadRngPicker),
            };
            run_chat(KeywordResponder::new(picker), &emotion)?;
        }
        Command::Crisis { text } => {
            let text = text.join(" ");
            if text.trim().is_empty() {
                bail!("crisis needs some text to scan");
            }
            let assessment = CrisisDetector::new().detect_crisis(&text);
            println!("{}", serde_json::to_string_pretty(&assessment)?);
        }
        Command::Resources { category } => {
            let category = parse_key(category.as_deref(), EmergencyCategory::parse, "category")?;
            for resource in ResourceProvider::new().emergency_resources(category) {
                println!("- {resource}");
            }
        }
        Command::SelfCare { kind } => {
            let kind = parse_key(kind.as_deref(), ExerciseKind::parse, "kind")?;
            for exercise in ResourceProvider::new().self_care_exercises(kind) {
                println!("- {exercise}");
            }
        }
    }

    Ok(())
}

/// The CLI rejects unknown keys rather than silently listing everything.
fn parse_key<T>(raw: Option<&str>, parse: fn(&str) -> Option<T>, label: &str) -> Result<Option<T>> {
    match raw {
        None => Ok(None),
        Some(value) => match parse(value) {
            Some(key) => Ok(Some(key)),
            None => bail!("unknown {label}: {value}"),
        },
    }
}

fn run_chat(responder: KeywordResponder, emotion: &str) -> Result<()> {
    println!("HerVival chat mode. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        let reply = responder.generate_response(message, emotion, 0.8);
        print_reply(&reply);
    }

    Ok(())
}

fn print_reply(reply: &ChatReply) {
    println!("\n[{}] {}\n", reply.priority.as_code(), reply.response);

    if let Some(resources) = reply.resources.as_ref().filter(|items| !items.is_empty()) {
        println!("Support resources:");
        for resource in resources {
            println!(
                "- {} ({}): {}. {}",
                resource.name, resource.contact, resource.description, resource.available
            );
        }
        println!();
    }
}
