use std::{env, path::Path, process::ExitCode};

use clap::Parser;
use cli::{Args, Commands};
use filekit_config::config::{self, generate_default_config, get_config, set_config_path};
use filekit_core::{
    detect::{detect, version, FileVersion},
    options::DetectionOptions,
    parse::DetectionResult,
    provision::{ProvisionOutcome, Provisioner},
};
use filekit_dl::{error::DownloadError, http_client::configure_http_client};
use filekit_utils::path::resolve_path;
use logging::setup_logging;
use miette::{miette, IntoDiagnostic};
use nu_ansi_term::Color::{Blue, Green, Yellow};
use serde::Serialize;
use tracing::{error, info};
use ureq::Proxy;
use utils::{describe, set_color, Colored};

mod cli;
mod logging;
mod utils;

#[derive(Serialize)]
struct Report<'a> {
    path: &'a Path,
    #[serde(flatten)]
    result: &'a DetectionResult,
}

fn handle_cli() -> miette::Result<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        set_color(false);
    }

    if let Some(ref c) = args.config {
        let path = resolve_path(c)?;
        let path = if path.is_absolute() {
            path
        } else {
            env::current_dir().into_diagnostic()?.join(path)
        };
        set_config_path(path);
    }

    let proxy = match args.proxy.as_deref() {
        Some(proxy) => Some(Proxy::new(proxy).map_err(DownloadError::from)?),
        None => None,
    };
    let user_agent = args.user_agent.clone();

    configure_http_client(|config| {
        if proxy.is_some() {
            config.proxy = proxy;
        }
        if let Some(user_agent) = user_agent {
            config.user_agent = Some(user_agent);
        }
    });

    match args.command {
        Commands::DefConfig => generate_default_config()?,
        command => {
            config::init()?;
            let config = get_config();

            match command {
                Commands::Detect {
                    paths,
                    mime,
                    separator,
                    bin,
                } => {
                    let mut options = DetectionOptions::from_config(&config)?;
                    if mime {
                        options = options.mime(true);
                    }
                    if let Some(separator) = separator {
                        options = options.separator(separator);
                    }
                    if let Some(bin) = bin {
                        options = options.binary_path(bin);
                    }

                    let mut failed = 0;
                    for path in &paths {
                        match detect(path, &options) {
                            Ok(result) if args.json => {
                                let report = Report {
                                    path,
                                    result: &result,
                                };
                                println!("{}", serde_json::to_string(&report).into_diagnostic()?);
                            }
                            Ok(result) => {
                                info!(
                                    "{}: {}",
                                    Colored(Blue, path.display()),
                                    Colored(Green, describe(&result))
                                );
                            }
                            Err(err) => {
                                failed += 1;
                                error!("{}: {}", path.display(), err);
                            }
                        }
                    }

                    if failed > 0 {
                        return Err(miette!(
                            "{} of {} files could not be inspected",
                            failed,
                            paths.len()
                        ));
                    }
                }
                Commands::Version { bin } => {
                    let mut options = DetectionOptions::from_config(&config)?;
                    if let Some(bin) = bin {
                        options = options.binary_path(bin);
                    }

                    let banner = version(&options)?;
                    match FileVersion::parse(&banner) {
                        Some(parsed) => info!("{} ({})", banner, Colored(Green, parsed)),
                        None => {
                            info!("{} ({})", banner, Colored(Yellow, "unrecognized version"))
                        }
                    }
                }
                Commands::Provision => {
                    let provisioner = Provisioner::from_config(&config)?;
                    match provisioner.ensure_provisioned()? {
                        ProvisionOutcome::AlreadyPresent => {
                            info!(
                                "{} is already provisioned",
                                provisioner.binary_path().display()
                            )
                        }
                        ProvisionOutcome::Provisioned => {
                            info!(
                                "Provisioned {}",
                                Colored(Green, provisioner.binary_path().display())
                            )
                        }
                    }
                }
                Commands::DefConfig => unreachable!(),
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    match handle_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:?}");
            ExitCode::FAILURE
        }
    }
}
