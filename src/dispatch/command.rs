//! Parsing of inbound chat text and callback payloads into closed types.
//!
//! Chat text is parsed by its first word (`info`, `/reboot@bot rig1`, ...);
//! every following word is a target rig name. Callback payloads are short
//! colon-separated strings built by [`Callback::encode`].

use std::fmt;

/// Target name that expands to every registered rig.
pub const SYSTEM_WIDE: &str = "syswide";

/// Longest rig name that still fits a callback payload.
///
/// Telegram caps callback data at 64 bytes; the longest prefix is
/// `sel:restart:` (12 bytes).
pub const MAX_TARGET_LEN: usize = 48;

/// The action families a request can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Status summary.
    Info,
    /// Per-GPU statistics.
    Stats,
    /// Expected daily revenue.
    Profit,
    /// Reboot the rig's host.
    Reboot,
    /// Restart the mining process.
    Restart,
}

impl Action {
    /// Every action, in help-text order.
    pub const ALL: [Self; 5] = [
        Self::Info,
        Self::Stats,
        Self::Profit,
        Self::Reboot,
        Self::Restart,
    ];

    /// The chat keyword for this action.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Stats => "stats",
            Self::Profit => "profit",
            Self::Reboot => "reboot",
            Self::Restart => "restart",
        }
    }

    /// Parse a keyword (case-insensitive).
    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.keyword().eq_ignore_ascii_case(word))
    }

    /// Whether the action changes rig state and needs confirmation.
    pub fn is_destructive(self) -> bool {
        matches!(self, Self::Reboot | Self::Restart)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A parsed chat request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Status summary for the named rigs.
    Info(Vec<String>),
    /// Per-GPU statistics for the named rigs.
    Stats(Vec<String>),
    /// Expected daily revenue for the named rigs.
    Profit(Vec<String>),
    /// Reboot the named rigs.
    Reboot(Vec<String>),
    /// Restart the miner on the named rigs.
    Restart(Vec<String>),
    /// List the available requests.
    Help,
    /// Anything else, with the original text.
    Unknown(String),
}

impl Command {
    /// Parse chat text. A leading `/` and a trailing `@botname` on the first
    /// word are ignored.
    pub fn parse(text: &str) -> Self {
        let mut words = text.split_whitespace();
        let Some(first) = words.next() else {
            return Self::Unknown(text.to_owned());
        };

        let keyword = first.strip_prefix('/').unwrap_or(first);
        let keyword = keyword.split('@').next().unwrap_or(keyword);

        if keyword.eq_ignore_ascii_case("help") || keyword.eq_ignore_ascii_case("start") {
            return Self::Help;
        }

        let Some(action) = Action::from_keyword(keyword) else {
            return Self::Unknown(text.to_owned());
        };
        let names = words.map(str::to_owned).collect();
        Self::with_action(action, names)
    }

    /// Build the command for `action` over `names`.
    pub fn with_action(action: Action, names: Vec<String>) -> Self {
        match action {
            Action::Info => Self::Info(names),
            Action::Stats => Self::Stats(names),
            Action::Profit => Self::Profit(names),
            Action::Reboot => Self::Reboot(names),
            Action::Restart => Self::Restart(names),
        }
    }

    /// The action and its target names, for action commands.
    pub fn action(&self) -> Option<(Action, &[String])> {
        match self {
            Self::Info(names) => Some((Action::Info, names)),
            Self::Stats(names) => Some((Action::Stats, names)),
            Self::Profit(names) => Some((Action::Profit, names)),
            Self::Reboot(names) => Some((Action::Reboot, names)),
            Self::Restart(names) => Some((Action::Restart, names)),
            Self::Help | Self::Unknown(_) => None,
        }
    }
}

/// A parsed inline-button payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    /// A chooser selection: run `action` against `target` (a rig or `syswide`).
    Select {
        /// Requested action.
        action: Action,
        /// Chosen rig name or [`SYSTEM_WIDE`].
        target: String,
    },
    /// A "Yes" on a destructive-action confirmation.
    Confirm {
        /// Confirmed action; always destructive.
        action: Action,
        /// Rig to act on.
        rig: String,
    },
    /// A "No" on a confirmation.
    Cancel,
}

impl Callback {
    /// Parse a payload; `None` for anything unrecognized.
    pub fn parse(data: &str) -> Option<Self> {
        if data == "cancel" {
            return Some(Self::Cancel);
        }

        let mut parts = data.splitn(3, ':');
        let tag = parts.next()?;
        let action = Action::from_keyword(parts.next()?)?;
        let name = parts.next().filter(|name| !name.is_empty())?.to_owned();

        match tag {
            "sel" => Some(Self::Select {
                action,
                target: name,
            }),
            "yes" if action.is_destructive() => Some(Self::Confirm { action, rig: name }),
            _ => None,
        }
    }

    /// Encode as a payload accepted by [`Callback::parse`].
    pub fn encode(&self) -> String {
        match self {
            Self::Select { action, target } => format!("sel:{action}:{target}"),
            Self::Confirm { action, rig } => format!("yes:{action}:{rig}"),
            Self::Cancel => "cancel".to_owned(),
        }
    }
}
