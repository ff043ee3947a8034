use crate::Command;
use anyhow::{Context, bail};
use hintswap_engine::backend::Backend;
use hintswap_engine::config::{HintswapConfig, SessionConfig};
use hintswap_engine::resolution::ResolutionEngine;
use hintswap_engine::settings::{DocumentsLocator, RegionTable, SettingsLocator, read_server_setting};
use hintswap_engine::swap::{SwapReport, SwapTarget, swap_region};
use std::path::Path;
use std::process::ExitCode;
use tracing::debug;

/// Run one command. `make_backend` is only called by commands that need a browser.
pub async fn run<F>(
    command: Command,
    config: HintswapConfig,
    make_backend: F,
) -> anyhow::Result<ExitCode>
where
    F: FnOnce(SessionConfig) -> Box<dyn Backend>,
{
    match command {
        Command::Resolve { username, json } => {
            let engine = engine(&config)?;
            let mut backend = make_backend(config.session);
            let result = engine.resolve(&mut *backend, &username).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else if let Some(id) = result.identifier() {
                println!("{}", id);
            } else {
                eprintln!("No identifier could be resolved for '{}'", username);
            }
            Ok(exit_code(result.success()))
        }
        Command::Swap {
            username,
            all: _,
            region,
            json,
        } => {
            let table = RegionTable::new(config.regions.clone());
            let Some(token) = table.token_for(&region) else {
                bail!(
                    "Unknown region '{}'. Run `hintswap regions` to list them.",
                    region
                );
            };
            let target = match username {
                Some(name) => SwapTarget::Username(name),
                None => SwapTarget::AllAccounts,
            };

            let engine = engine(&config)?;
            let locator = DocumentsLocator::from_config(&config.settings);
            debug!("Searching settings under {:?}", locator.roots());
            let mut backend = make_backend(config.session);
            let report = swap_region(&engine, &mut *backend, &locator, &target, token).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(exit_code(report.is_success()))
        }
        Command::Regions => {
            for entry in RegionTable::new(config.regions).entries() {
                println!("{:<18} {}", entry.label, entry.token);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Files { id } => {
            let locator = DocumentsLocator::from_config(&config.settings);
            let files = locator.locate(id.as_deref());
            if files.is_empty() {
                eprintln!("No settings files found");
                return Ok(ExitCode::FAILURE);
            }
            for file in &files {
                println!("{}  [{}]", file.display(), describe_hint(file));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Show { path } => {
            let hint = read_server_setting(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            match hint {
                Some(token) => println!("{}", token),
                None => println!("(no DataCenterHint)"),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn engine(config: &HintswapConfig) -> anyhow::Result<ResolutionEngine> {
    ResolutionEngine::new(config.resolver.clone()).context("Invalid profile base URL")
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn describe_hint(path: &Path) -> String {
    match read_server_setting(path) {
        Ok(Some(token)) => token,
        Ok(None) => "no hint".to_string(),
        Err(e) => format!("unreadable: {}", e),
    }
}

fn print_report(report: &SwapReport) {
    match report {
        SwapReport::Unresolved { username } => {
            eprintln!("No identifier could be resolved for username '{}'", username);
        }
        SwapReport::NoSettingsFiles {
            identifier: Some(id),
        } => {
            eprintln!("No settings file exists for identifier {}", id);
        }
        SwapReport::NoSettingsFiles { identifier: None } => {
            eprintln!("No settings files found");
        }
        SwapReport::Applied {
            identifier,
            token,
            files,
        } => {
            if let Some(id) = identifier {
                println!("Account {}", id);
            }
            for file in files {
                let status = if file.updated { "updated" } else { "FAILED " };
                println!("  {}  {}", status, file.path.display());
            }
            println!(
                "Updated {} of {} file(s) to {}",
                report.updated_count(),
                files.len(),
                token
            );
        }
    }
}
