//! Echo Bot Demo
//!
//! A small demonstration of the confab framework over the in-process
//! driver: a few triggers, a fallback, and a simulated operator injecting
//! messages the way a real chat network would deliver them.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package echo-bot
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use confab::Runtime;
use confab::prelude::*;
use confab_adapter_inproc::InprocDriver;

#[tokio::main]
async fn main() -> Result<()> {
    let driver = InprocDriver::new(DriverIdentity::new("confab", "bot@inproc"));
    let operator = driver.handle();

    // Config comes from confab.toml / CONFAB_* when present.
    let runtime = Runtime::new(Arc::new(driver));
    runtime
        .client()
        .aliases()
        .insert("operator", "operator@inproc");

    runtime.register(
        Trigger::new("ping", |m: Message| async move {
            m.reply(Outbound::text("pong 🏓").log("ping")).await?;
            Ok(())
        })?
        .with_condition(|m| async move { m.clean() == "ping" }),
    );

    runtime.register(
        Trigger::new("echo", |m: Message| async move {
            let body = m.body.clone();
            if let Some(text) = body.strip_prefix("echo ") {
                m.send(Outbound::text(text.to_string()).log("echo")).await?;
            }
            Ok(())
        })?
        .with_condition(|m| async move { m.body.starts_with("echo ") }),
    );

    runtime.register(Trigger::new("else", |m: Message| async move {
        m.send(Outbound::text("say \"ping\" or \"echo <text>\"").log("help"))
            .await?;
        Ok(())
    })?);

    // Simulate an operator chatting with the bot.
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let lines = ["ping", "echo hello there", "what can you do?"];
        for (i, line) in lines.iter().enumerate() {
            let raw = RawMessage::text(format!("demo-{i}"), "operator@inproc", *line);
            operator.receive(raw).await;
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        for delivery in operator.deliveries() {
            info!(to = %delivery.to, body = ?delivery.message.body, "bot sent");
        }
    });

    runtime.run().await?;
    Ok(())
}
