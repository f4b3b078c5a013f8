#![allow(unexpected_cfgs)] // Silence cfg warnings inside objc macros

#[cfg(target_os = "macos")]
mod macos_main;

use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use multi_overlay::cli::Cli;
use multi_overlay::config::{AppConfig, AppPaths};
use multi_overlay::logging;
use multi_overlay::registry::{OverlayRegistry, Registry};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut paths = AppPaths::resolve();
    if let Some(file) = cli.config.clone() {
        paths = paths.with_config_file(file);
    }
    let config = AppConfig::load(&paths.config_file);
    logging::init(&config.log_level);
    info!("Config file: {}", paths.config_file.display());

    let registry = Registry::discover(&paths.icons(&config), &paths.custom_overlays(&config));

    if cli.list_sites {
        for overlay in registry.list() {
            if overlay.description.is_empty() {
                println!("{}: {}", overlay.id, overlay.name);
            } else {
                println!("{}: {} - {}", overlay.id, overlay.name, overlay.description);
            }
        }
        return ExitCode::SUCCESS;
    }

    if let Some(site) = &cli.site {
        if registry.get(site).is_none() {
            error!("Unknown overlay '{}'", site);
            eprintln!("Unknown overlay '{}'. Valid ids: {}", site, registry.ids().join(", "));
            return ExitCode::FAILURE;
        }
    }

    if cli.check_permissions {
        return check_permissions();
    }

    run(config, paths, registry, cli.site)
}

#[cfg(target_os = "macos")]
fn check_permissions() -> ExitCode {
    if unsafe { multi_overlay::platform::macos::ffi::is_process_trusted(false) } {
        println!("Accessibility permission: granted");
        ExitCode::SUCCESS
    } else {
        println!("Accessibility permission: NOT granted");
        println!("Enable it in System Settings > Privacy & Security > Accessibility");
        ExitCode::FAILURE
    }
}

#[cfg(not(target_os = "macos"))]
fn check_permissions() -> ExitCode {
    eprintln!("Accessibility permission checks are only available on macOS");
    ExitCode::FAILURE
}

#[cfg(target_os = "macos")]
fn run(config: AppConfig, paths: AppPaths, registry: Registry, site: Option<String>) -> ExitCode {
    macos_main::run(config, paths, registry, site);
    ExitCode::SUCCESS
}

#[cfg(not(target_os = "macos"))]
fn run(_config: AppConfig, _paths: AppPaths, _registry: Registry, _site: Option<String>) -> ExitCode {
    eprintln!("multi-overlay only runs on macOS; --list-sites works everywhere");
    ExitCode::FAILURE
}
