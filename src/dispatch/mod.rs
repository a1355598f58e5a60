//! Command dispatch: turns parsed chat requests into replies.
//!
//! The dispatcher is transport-agnostic. It reads [`FleetState`] for status
//! queries, builds choosers and confirmations as button grids, and invokes
//! rig probes for confirmed reboots and restarts. The Telegram adapter
//! renders the returned [`Reply`] values.

use std::sync::Arc;

use tracing::{info, warn};

use crate::fleet::{FleetState, FleetView};
use crate::profit::Profitability;
use crate::rig::{to_mhs, RigEntry, RigRegistry, Status};

pub mod command;
pub mod format;

pub use command::{Action, Callback, Command, SYSTEM_WIDE};

/// One inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Visible label.
    pub label: String,
    /// Callback payload.
    pub data: String,
}

impl Button {
    fn new(label: impl Into<String>, callback: &Callback) -> Self {
        Self {
            label: label.into(),
            data: callback.encode(),
        }
    }
}

/// One outbound message: HTML text plus an optional button grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// HTML body.
    pub text: String,
    /// Button rows; empty for a plain message.
    pub keyboard: Vec<Vec<Button>>,
}

impl Reply {
    /// A plain text reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Vec::new(),
        }
    }

    /// A reply carrying buttons.
    pub fn with_keyboard(text: impl Into<String>, keyboard: Vec<Vec<Button>>) -> Self {
        Self {
            text: text.into(),
            keyboard,
        }
    }
}

/// Maps chat requests to fleet reads, prompts, and rig actions.
#[derive(Debug)]
pub struct CommandDispatcher {
    registry: Arc<RigRegistry>,
    fleet: Arc<FleetState>,
    profit: Arc<Profitability>,
}

impl CommandDispatcher {
    /// Create a dispatcher over the registry and shared fleet state.
    pub fn new(
        registry: Arc<RigRegistry>,
        fleet: Arc<FleetState>,
        profit: Arc<Profitability>,
    ) -> Self {
        Self {
            registry,
            fleet,
            profit,
        }
    }

    /// Handle a parsed chat request.
    pub async fn handle_command(&self, command: &Command) -> Vec<Reply> {
        if let Some((action, names)) = command.action() {
            return self.resolve(action, names).await;
        }
        match command {
            Command::Unknown(raw) => vec![Reply::text(format::unknown(raw))],
            _ => vec![Reply::text(format::help())],
        }
    }

    /// Handle a raw callback payload from an inline button.
    ///
    /// Cancellations and unrecognized payloads produce no replies.
    pub async fn handle_callback(&self, data: &str) -> Vec<Reply> {
        match Callback::parse(data) {
            Some(Callback::Select { action, target }) => {
                self.resolve(action, std::slice::from_ref(&target)).await
            }
            Some(Callback::Confirm { action, rig }) => vec![self.execute(action, &rig).await],
            Some(Callback::Cancel) => Vec::new(),
            None => {
                warn!(data, "unrecognized callback payload");
                Vec::new()
            }
        }
    }

    /// Resolve targets for `action` and act on each.
    ///
    /// No names with a single registered rig targets that rig; no names with
    /// several rigs returns a chooser. Each named target is resolved on its
    /// own, so an unknown name does not cancel the others.
    async fn resolve(&self, action: Action, names: &[String]) -> Vec<Reply> {
        if names.is_empty() {
            return match self.registry.sole() {
                Some(entry) => vec![self.act(action, entry).await],
                None => vec![self.chooser(action)],
            };
        }

        let mut replies = Vec::new();
        for name in names {
            if name == SYSTEM_WIDE {
                for entry in self.registry.iter() {
                    replies.push(self.act(action, entry).await);
                }
                continue;
            }
            match self.registry.get(name) {
                Some(entry) => replies.push(self.act(action, entry).await),
                None => {
                    info!(rig = %name, %action, "request for unknown rig canceled");
                    replies.push(Reply::text(format::not_found(name)));
                }
            }
        }
        replies
    }

    /// Read actions answer immediately; destructive ones ask for confirmation.
    async fn act(&self, action: Action, entry: &RigEntry) -> Reply {
        if action.is_destructive() {
            return confirm(action, entry.name());
        }

        let view = self.fleet.load();
        self.read(action, entry, &view).await
    }

    async fn read(&self, action: Action, entry: &RigEntry, view: &FleetView) -> Reply {
        let Some(snapshot) = view.rig(entry.name()) else {
            return Reply::text(format::not_reported(entry.name()));
        };

        match action {
            Action::Stats => Reply::text(format::rig_stats(snapshot, entry.config().dual)),
            Action::Info | Action::Profit => {
                let profit = if snapshot.status == Status::Offline {
                    "unavailable".to_owned()
                } else {
                    self.profit
                        .describe_daily(
                            &snapshot.coin_name,
                            to_mhs(snapshot.main_session.hash_rate),
                        )
                        .await
                };
                if action == Action::Info {
                    Reply::text(format::rig_status(snapshot, &profit))
                } else {
                    Reply::text(format::rig_profit(snapshot, &profit))
                }
            }
            Action::Reboot | Action::Restart => confirm(action, entry.name()),
        }
    }

    /// Run a confirmed reboot or restart. Failures are reported, not retried.
    async fn execute(&self, action: Action, name: &str) -> Reply {
        let Some(entry) = self.registry.get(name) else {
            return Reply::text(format::not_found(name));
        };

        let probe = entry.probe();
        let result = match action {
            Action::Reboot => probe.reboot().await,
            Action::Restart => probe.restart().await,
            Action::Info | Action::Stats | Action::Profit => return self.act(action, entry).await,
        };

        match result {
            Ok(()) => {
                info!(rig = %name, %action, "rig action sent");
                Reply::text(format::action_sent(action, name))
            }
            Err(e) => {
                warn!(rig = %name, %action, error = %e, "rig action failed");
                Reply::text(format::action_failed(action, name, &e.to_string()))
            }
        }
    }

    /// One button per rig in registry order, then "Entire System".
    fn chooser(&self, action: Action) -> Reply {
        let mut keyboard: Vec<Vec<Button>> = self
            .registry
            .iter()
            .map(|entry| {
                vec![Button::new(
                    entry.name(),
                    &Callback::Select {
                        action,
                        target: entry.name().to_owned(),
                    },
                )]
            })
            .collect();
        keyboard.push(vec![Button::new(
            "Entire System",
            &Callback::Select {
                action,
                target: SYSTEM_WIDE.to_owned(),
            },
        )]);
        Reply::with_keyboard(format::chooser_prompt(action), keyboard)
    }
}

fn confirm(action: Action, name: &str) -> Reply {
    let yes = Button::new(
        "Yes",
        &Callback::Confirm {
            action,
            rig: name.to_owned(),
        },
    );
    let no = Button::new("No", &Callback::Cancel);
    Reply::with_keyboard(format::confirm_prompt(action, name), vec![vec![yes, no]])
}
