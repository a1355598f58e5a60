//! Telemon: fleet-health monitor for GPU mining rigs with a Telegram front end.
//!
//! A background poller samples every rig's management API, derives a
//! health snapshot and alert events per rig, and pushes alerts to a
//! Telegram chat. Allow-listed users query status and trigger reboots or
//! miner restarts through the same bot.
//!
//! See `DESIGN.md` for full architecture documentation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod credentials;
pub mod logging;

pub mod engine;
pub mod fleet;
pub mod rig;

pub mod dispatch;
pub mod notify;
pub mod poller;
pub mod profit;
pub mod telegram;
