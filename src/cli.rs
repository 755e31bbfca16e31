// CLI definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "notifyd")]
#[command(author, version, about = "Desktop notification daemon with a file-published snapshot")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/notifyd/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the notification daemon
    #[command(visible_alias = "daemon")]
    Run {
        /// Override the snapshot file the renderer tails
        #[arg(long, value_name = "FILE")]
        state_file: Option<PathBuf>,
    },

    /// Post a notification to the running daemon
    #[command(visible_aliases = ["notify", "n"])]
    Send {
        /// Summary line
        summary: String,

        /// Body text
        #[arg(short, long, default_value = "")]
        body: String,

        /// Application name label
        #[arg(short, long, default_value = "notifyd")]
        app_name: String,

        /// Icon path or themed icon name
        #[arg(short, long, default_value = "")]
        icon: String,

        /// Urgency level
        #[arg(short, long, value_enum, default_value_t = UrgencyArg::Normal)]
        urgency: UrgencyArg,

        /// Timeout in ms (-1 = urgency default, 0 = never expire)
        #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
        timeout: i32,

        /// Replace the notification with this id instead of creating one
        #[arg(long, value_name = "ID", default_value_t = 0)]
        replaces: u32,

        /// Action button as KEY=LABEL (repeatable)
        #[arg(long = "action", value_name = "KEY=LABEL")]
        actions: Vec<String>,
    },

    /// Close a notification by id
    #[command(visible_alias = "c")]
    Close {
        /// Notification id
        id: u32,
    },

    /// Dismiss a notification on the user's behalf (renderer-side close)
    #[command(visible_alias = "d")]
    Dismiss {
        /// Notification id
        id: u32,
    },

    /// Invoke a notification action on the user's behalf (renderer side)
    #[command(visible_alias = "a")]
    Action {
        /// Notification id
        id: u32,
        /// Action key, as declared by the sender
        key: String,
    },

    /// List active notifications from the published snapshot
    #[command(visible_aliases = ["ls", "l"])]
    List {
        /// Snapshot file to read (default: the daemon's default path)
        #[arg(long, value_name = "FILE")]
        state_file: Option<PathBuf>,
    },

    /// Show server information and capabilities
    #[command(visible_aliases = ["version", "i"])]
    Info,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum UrgencyArg {
    Low,
    Normal,
    Critical,
}

impl UrgencyArg {
    /// The `urgency` hint byte for this level.
    pub fn hint_byte(self) -> u8 {
        match self {
            UrgencyArg::Low => 0,
            UrgencyArg::Normal => 1,
            UrgencyArg::Critical => 2,
        }
    }
}

impl std::fmt::Display for UrgencyArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrgencyArg::Low => write!(f, "low"),
            UrgencyArg::Normal => write!(f, "normal"),
            UrgencyArg::Critical => write!(f, "critical"),
        }
    }
}
