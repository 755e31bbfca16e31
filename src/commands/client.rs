//! Bus-client command handlers, for scripting and for renderer bindings.
//!
//! `dismiss` and `action` are the commands a renderer wires to its
//! close/action buttons; they hit the renderer-facing interface so the
//! daemon records the right close reason.

use std::collections::HashMap;
use std::path::PathBuf;

use zbus::zvariant::Value;

use notifyd::config::default_state_path;
use notifyd::dbus::{BUS_NAME, NOTIFICATIONS_IFACE, NOTIFICATIONS_PATH, RENDERER_IFACE, RENDERER_PATH};
use notifyd::SnapshotEntry;

use super::CommandResult;

/// Helper to create a D-Bus proxy for the standard interface.
async fn notifications_proxy() -> Result<zbus::Proxy<'static>, Box<dyn std::error::Error>> {
    let conn = zbus::Connection::session().await?;
    let proxy = zbus::Proxy::new_owned(conn, BUS_NAME, NOTIFICATIONS_PATH, NOTIFICATIONS_IFACE).await?;
    Ok(proxy)
}

/// Helper to create a D-Bus proxy for the renderer interface.
async fn renderer_proxy() -> Result<zbus::Proxy<'static>, Box<dyn std::error::Error>> {
    let conn = zbus::Connection::session().await?;
    let proxy = zbus::Proxy::new_owned(conn, BUS_NAME, RENDERER_PATH, RENDERER_IFACE).await?;
    Ok(proxy)
}

/// Post a notification via D-Bus.
#[allow(clippy::too_many_arguments)]
pub async fn send(
    summary: &str,
    body: &str,
    app_name: &str,
    icon: &str,
    urgency_byte: u8,
    timeout: i32,
    replaces: u32,
    action_args: &[String],
) -> CommandResult {
    let mut actions = Vec::with_capacity(action_args.len() * 2);
    for arg in action_args {
        let Some((key, label)) = arg.split_once('=') else {
            return Err(format!("invalid action {arg:?}, expected KEY=LABEL").into());
        };
        actions.push(key.to_string());
        actions.push(label.to_string());
    }

    let mut hints: HashMap<&str, Value> = HashMap::new();
    hints.insert("urgency", Value::U8(urgency_byte));

    let proxy = notifications_proxy().await?;
    let reply = proxy
        .call_method(
            "Notify",
            &(app_name, replaces, icon, summary, body, actions, hints, timeout),
        )
        .await?;
    let id: u32 = reply.body().deserialize()?;

    println!("Notification posted: id={id}");
    Ok(())
}

/// Close a notification via D-Bus (reason: closed by request).
pub async fn close(id: u32) -> CommandResult {
    let proxy = notifications_proxy().await?;
    proxy.call_method("CloseNotification", &(id,)).await?;
    println!("Closed notification {id}.");
    Ok(())
}

/// Dismiss a notification on the user's behalf (reason: dismissed by user).
pub async fn dismiss(id: u32) -> CommandResult {
    let proxy = renderer_proxy().await?;
    proxy.call_method("Dismiss", &(id,)).await?;
    println!("Dismissed notification {id}.");
    Ok(())
}

/// Invoke a notification action on the user's behalf.
pub async fn action(id: u32, key: &str) -> CommandResult {
    let proxy = renderer_proxy().await?;
    proxy.call_method("InvokeAction", &(id, key)).await?;
    println!("Invoked action {key:?} on notification {id}.");
    Ok(())
}

/// List active notifications from the published snapshot file.
pub fn list(state_file: Option<PathBuf>) -> CommandResult {
    let path = state_file.unwrap_or_else(default_state_path);
    let content = std::fs::read_to_string(&path)
        .map_err(|e| format!("read {}: {e} (is the daemon running?)", path.display()))?;
    let entries: Vec<SnapshotEntry> = serde_json::from_str(&content)?;

    if entries.is_empty() {
        println!("No active notifications.");
    } else {
        println!(
            "{:<6} {:<9} {:<14} {:<32} {}",
            "ID", "Urgency", "App", "Summary", "Actions"
        );
        println!("{}", "-".repeat(78));
        for entry in &entries {
            let actions = entry
                .actions
                .iter()
                .map(|(key, _)| key.as_str())
                .collect::<Vec<_>>()
                .join(",");
            println!(
                "{:<6} {:<9} {:<14} {:<32} {}",
                entry.id,
                entry.urgency.to_string(),
                entry.name,
                entry.summary,
                actions
            );
        }
    }

    Ok(())
}

/// Show server information and capabilities.
pub async fn info() -> CommandResult {
    let proxy = notifications_proxy().await?;

    let reply = proxy.call_method("GetServerInformation", &()).await?;
    let (name, vendor, version, spec_version): (String, String, String, String) =
        reply.body().deserialize()?;

    let reply = proxy.call_method("GetCapabilities", &()).await?;
    let capabilities: Vec<String> = reply.body().deserialize()?;

    println!("Server:       {name} v{version} ({vendor})");
    println!("Spec version: {spec_version}");
    println!("Capabilities: {}", capabilities.join(", "));
    Ok(())
}
