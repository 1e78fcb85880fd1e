//! CLI command implementations. Each command resolves its target project,
//! calls into the orchestrator or resolver, and formats the outcome.

pub(crate) mod build;
pub(crate) mod config;
pub(crate) mod destroy;
pub(crate) mod domain;
pub(crate) mod exec;
pub(crate) mod init;
pub(crate) mod logs;
pub(crate) mod preset;
pub(crate) mod ps;
pub(crate) mod run;
pub(crate) mod start;
pub(crate) mod stop;
