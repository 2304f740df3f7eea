//! Free-form play loop: one session, one line per turn

use anyhow::{Context, Result};
use console::style;
use dialoguer::Input;
use forge_engine::SessionEngine;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Words that end the loop, compared case-insensitively
const EXIT_KEYWORDS: [&str; 2] = ["exit", "quit"];

pub fn is_exit_keyword(input: &str) -> bool {
    let input = input.trim();
    EXIT_KEYWORDS.iter().any(|k| input.eq_ignore_ascii_case(k))
}

pub async fn run_play(engine: &SessionEngine, genre: Option<String>) -> Result<()> {
    let genre = match genre {
        Some(genre) => genre,
        None => Input::new()
            .with_prompt("What kind of adventure?")
            .interact_text()?,
    };

    let started = engine
        .start(&genre)
        .await
        .context("Failed to start a session")?;

    let mut stdout = std::io::stdout();
    writeln!(stdout, "{}", style(format!("Session {}", started.session_id)).dim())?;
    writeln!(stdout, "\n{} {}\n", style("GM:").bold().magenta(), started.reply)?;
    writeln!(
        stdout,
        "{}",
        style("Type your actions. 'exit' or 'quit' ends the adventure.").dim()
    )?;

    let reader = BufReader::new(tokio::io::stdin());
    play_turns(engine, &started.session_id, reader, &mut stdout).await?;
    Ok(())
}

/// Read player lines until an exit keyword or end of input.
///
/// Returns the number of completed turns. A failed turn is reported and the
/// loop keeps going.
pub async fn play_turns<R, W>(
    engine: &SessionEngine,
    session_id: &str,
    reader: R,
    out: &mut W,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = reader.lines();
    let mut turns = 0;

    loop {
        write!(out, "{} ", style(">").cyan().bold())?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if is_exit_keyword(input) {
            break;
        }

        match engine.advance(session_id, input).await {
            Ok(reply) => {
                writeln!(out, "\n{} {}\n", style("GM:").bold().magenta(), reply)?;
                turns += 1;
            }
            Err(e) => {
                writeln!(out, "{} {}", style("Error:").red().bold(), e)?;
            }
        }
    }

    writeln!(out, "{}", style("Farewell, adventurer.").dim())?;
    Ok(turns)
}
