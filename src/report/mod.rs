// src/report/mod.rs
//
// Everything after the numbers are known: text rendering, the chat sink,
// and the optional post-save hook.

pub mod hook;
pub mod notify;
pub mod render;

pub use hook::{CommandHook, GitCommitHook, HookError, PostSaveHook, SaveSummary};
pub use notify::{Ack, Notifier, NotifyError, StdoutNotifier, WebhookNotifier};
pub use render::{render, render_lines, thousands};
