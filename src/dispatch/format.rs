//! HTML reply texts for chat requests.

use std::fmt::Write as _;

use crate::dispatch::command::Action;
use crate::rig::{to_mhs, RigSnapshot};
use crate::telegram::ui::escape_html;

const HELP_LINES: [&str; 5] = [
    "<b>info</b> <i>- Get critical info for all rigs or a specific rig.</i>",
    "<b>stats</b> <i>- Get the statistics for all rigs or a specific rig.</i>",
    "<b>profit</b> <i>- Get the expected profit for all rigs or a specific rig.</i>",
    "<b>reboot</b> <i>- Reboot the system for all rigs or a specific rig.</i>",
    "<b>restart</b> <i>- Restart the miner on all rigs or a specific rig.</i>",
];

/// Status summary for one rig.
pub fn rig_status(snapshot: &RigSnapshot, profit: &str) -> String {
    format!(
        "<b>{name}</b>\n\
         Status: {status}\n\
         Expected Daily Profit: {profit}\n\
         Up Time: {uptime} min\n\
         Total Shares: {shares}\n\
         Total Speed: {speed:.3} Mh/s",
        name = escape_html(&snapshot.name),
        status = snapshot.status,
        profit = escape_html(profit),
        uptime = snapshot.uptime_mins,
        shares = snapshot.main_session.shares,
        speed = to_mhs(snapshot.main_session.hash_rate),
    )
}

/// Per-GPU statistics for one rig.
pub fn rig_stats(snapshot: &RigSnapshot, dual: bool) -> String {
    let mut text = format!(
        "<b>{name}</b> ({status})\n\
         Miner: {version}\n\
         Pool: <code>{pool}</code>\n\
         {tag}: {speed:.3} Mh/s, shares {shares}, rejected {rejected}, invalid {invalid}",
        name = escape_html(&snapshot.name),
        status = snapshot.status,
        version = escape_html(&snapshot.version),
        pool = escape_html(&snapshot.main_pool.address),
        tag = escape_html(&snapshot.coin_tag),
        speed = to_mhs(snapshot.main_session.hash_rate),
        shares = snapshot.main_session.shares,
        rejected = snapshot.main_session.rejected_shares,
        invalid = snapshot.main_session.invalid_shares,
    );

    if dual {
        let _ = write!(
            text,
            "\nAlt pool: <code>{pool}</code>\nAlt: {speed:.3} Mh/s, shares {shares}, rejected {rejected}",
            pool = escape_html(&snapshot.alt_pool.address),
            speed = to_mhs(snapshot.alt_session.hash_rate),
            shares = snapshot.alt_session.shares,
            rejected = snapshot.alt_session.rejected_shares,
        );
    }

    if snapshot.gpus.is_empty() {
        text.push_str("\nNo active GPUs.");
    }
    for gpu in &snapshot.gpus {
        let _ = write!(
            text,
            "\nGPU#{index}: {rate:.3} Mh/s",
            index = gpu.index,
            rate = to_mhs(gpu.hash_rate),
        );
        if dual {
            let _ = write!(text, " / {:.3} Mh/s", to_mhs(gpu.alt_hash_rate));
        }
        let _ = write!(text, ", {}°C, fan {}%", gpu.temperature, gpu.fan_speed);
    }
    text
}

/// Expected daily revenue for one rig.
pub fn rig_profit(snapshot: &RigSnapshot, profit: &str) -> String {
    format!(
        "<b>{name}</b> ({tag} at {speed:.3} Mh/s)\nExpected Daily Profit: {profit}",
        name = escape_html(&snapshot.name),
        tag = escape_html(&snapshot.coin_tag),
        speed = to_mhs(snapshot.main_session.hash_rate),
        profit = escape_html(profit),
    )
}

/// Reply for a target name that is not registered.
pub fn not_found(name: &str) -> String {
    format!(
        "Sorry, it seems {} does not exist, please check spelling or contact system admin. \
         Your request has been canceled.",
        escape_html(name)
    )
}

/// Reply for a registered rig that has not completed a poll yet.
pub fn not_reported(name: &str) -> String {
    format!(
        "Rig {} has not reported yet, please try again shortly.",
        escape_html(name)
    )
}

/// Prompt above the rig chooser.
pub fn chooser_prompt(action: Action) -> String {
    format!("For which rig do you want {action}?")
}

/// Prompt above a Yes/No confirmation.
pub fn confirm_prompt(action: Action, name: &str) -> String {
    format!("Are you sure you want to {action} {}?", escape_html(name))
}

/// Acknowledgement of a destructive action that was accepted.
pub fn action_sent(action: Action, name: &str) -> String {
    let verb = match action {
        Action::Restart => "Restarting miner on",
        _ => "Rebooting",
    };
    format!("{verb} rig {}.", escape_html(name))
}

/// Report of a destructive action that failed.
pub fn action_failed(action: Action, name: &str, error: &str) -> String {
    let verb = match action {
        Action::Restart => "Restarting",
        _ => "Rebooting",
    };
    format!(
        "ERROR: {verb} rig {} has failed: {}",
        escape_html(name),
        escape_html(error)
    )
}

/// The list of available requests.
pub fn help() -> String {
    let mut text = String::from("These are the requests you can make:");
    for line in HELP_LINES {
        text.push('\n');
        text.push_str(line);
    }
    text
}

/// Reply to text that did not parse as a request.
pub fn unknown(raw: &str) -> String {
    let mut text = format!(
        "Sorry, I didn't understand your request: <i>\"{}\"</i> these are some requests you can make:",
        escape_html(raw)
    );
    for line in HELP_LINES {
        text.push('\n');
        text.push_str(line);
    }
    text
}
