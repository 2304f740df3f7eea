//! Menu-driven console. Every action is sent through the gateway dispatcher
//! so it behaves exactly like a request to the HTTP front end.

use anyhow::Result;
use console::style;
use dialoguer::{Input, Select};
use forge_engine::SessionEngine;
use forge_server::{dispatch, GatewayEvent, GatewayResponse};
use serde_json::json;

const MENU_ITEMS: [&str; 3] = [
    "Start new session",
    "Send message to existing session",
    "Exit",
];

pub async fn run_console(engine: &SessionEngine) -> Result<()> {
    println!("\n{}\n", style("Adventure Forge Console").bold().cyan());

    loop {
        let choice = Select::new()
            .with_prompt("Choose an action")
            .items(&MENU_ITEMS)
            .default(0)
            .interact()?;

        let event = match choice {
            0 => {
                let genre: String = Input::new()
                    .with_prompt("Enter genre")
                    .allow_empty(true)
                    .interact_text()?;
                GatewayEvent::post("/start", json!({ "genre": genre.trim() }))
            }
            1 => {
                let session_id: String = Input::new()
                    .with_prompt("Enter sessionId")
                    .allow_empty(true)
                    .interact_text()?;
                let message: String = Input::new()
                    .with_prompt("Enter your message")
                    .allow_empty(true)
                    .interact_text()?;
                GatewayEvent::post(
                    "/message",
                    json!({ "sessionId": session_id.trim(), "userMessage": message.trim() }),
                )
            }
            _ => break,
        };

        let response = dispatch(engine, &event).await;
        let status = if response.status_code == 200 {
            style(response.status_code).green().bold()
        } else {
            style(response.status_code).red().bold()
        };
        println!("{}", status);
        println!("{}\n", render_body(&response));
    }

    Ok(())
}

/// Pretty-print a response body, falling back to the raw text
fn render_body(response: &GatewayResponse) -> String {
    response
        .json_body()
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| response.body.clone())
}
