//! Interactive chat against a running alice backend.
//!
//! Replies are printed as they stream in. Type `/status` to show the
//! polled resources, `/memory` for the agent's memory, `/stop` to abort a
//! running reply, and `/quit` to exit.
//!
//! Run with:
//! ```bash
//! ALICE_BASE_URL=http://localhost:8000 cargo run -p alice --example chat
//! ```

use alice::core::MessageId;
use alice::prelude::*;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    alice::init_tracing();

    let client = AliceClient::from_env()?;
    let status = client.start_status_sync();
    println!("Connected to {}", client.config().base_url);
    println!("Commands: /status /memory /stop /quit\n");

    tokio::spawn(print_replies(client.session().subscribe_transcript()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => break,
            "/stop" => {
                if !client.session().abort() {
                    println!("Nothing to stop.");
                }
            }
            "/status" => print_status(&client, &client.status().snapshot())?,
            "/memory" => match client.memory().await {
                Ok(memory) => println!("Long-term:\n{}\n\nShort-term:\n{}", memory.ltm, memory.stm),
                Err(e) => println!("Could not load memory: {e}"),
            },
            text => match client.session().spawn_submit(text) {
                Ok(handle) => {
                    tokio::spawn(async move {
                        if let Ok(outcome) = handle.await {
                            report(&outcome);
                        }
                    });
                }
                Err(SessionError::EmptyMessage) => {}
                Err(e) => println!("({e})"),
            },
        }
    }

    client.session().abort();
    status.shutdown().await;
    Ok(())
}

async fn print_replies(mut transcript: tokio::sync::watch::Receiver<Transcript>) {
    let mut current: Option<MessageId> = None;
    let mut printed = 0;

    while transcript.changed().await.is_ok() {
        let snapshot = transcript.borrow_and_update().clone();
        let Some(last) = snapshot.last() else {
            continue;
        };
        if last.role() != Role::Bot {
            continue;
        }

        if current.as_ref() != Some(last.id()) {
            current = Some(last.id().clone());
            printed = 0;
            print!("\nalice> ");
        }

        let content = last.content();
        if content.len() > printed {
            print!("{}", &content[printed..]);
            printed = content.len();
            let _ = io::stdout().flush();
        }
        if !last.is_active() {
            println!();
        }
    }
}

fn report(outcome: &TurnOutcome) {
    if let MessageStatus::Failed { reason } = &outcome.status {
        println!("[turn failed: {reason}]");
    }
    if let Some(reply) = outcome.reply() {
        for result in reply.execution_results() {
            println!("[execution result]\n{result}");
        }
    }
    if outcome.decode_warnings > 0 {
        println!("[{} undecodable events skipped]", outcome.decode_warnings);
    }
}

fn print_status(client: &AliceClient, snapshot: &StatusSnapshot) -> anyhow::Result<()> {
    println!("== Tasks ==");
    println!("{}", snapshot.tasks.value().map_or("(not loaded)", String::as_str));

    println!("== Skills ==");
    if let Some(skills) = snapshot.skills.value() {
        for (name, info) in skills {
            println!("- {name}: {}", info.description);
        }
    }

    println!("== Outputs ==");
    if let Some(files) = snapshot.outputs.value() {
        for file in files {
            println!("- {} ({})", file.name, client.output_url(file)?);
        }
    }

    for kind in snapshot.stale_resources() {
        println!("({kind} could not be refreshed; showing last known value)");
    }
    Ok(())
}
