mod config;
mod error;
mod system;

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use interfaces::{Backend, Compiled, Compiler, PackageInfo, Registry, TaggedSnippet};
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};
use system::System;

const CONFIG_FILE: &str = "ifc.toml";

#[derive(Parser)]
#[command(name = "ifc")]
#[command(about = "Validate interface declarations and compile security policy", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered interfaces
    Interfaces,
    /// Load and validate package manifests
    Validate {
        /// Manifest files
        #[arg(required = true)]
        manifests: Vec<PathBuf>,
    },
    /// Compile security policy for a system description
    Compile {
        /// System description file
        #[arg(short, long, default_value = CONFIG_FILE)]
        config: PathBuf,
        /// Compile only these backends (repeatable)
        #[arg(short, long)]
        backend: Vec<Backend>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List plug/slot pairs that would connect automatically
    Candidates {
        /// System description file
        #[arg(short, long, default_value = CONFIG_FILE)]
        config: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let registry = Registry::builtin()?;

    match cli.command {
        Commands::Interfaces => cmd_interfaces(&registry),
        Commands::Validate { manifests } => cmd_validate(&registry, &manifests),
        Commands::Compile {
            config,
            backend,
            json,
        } => cmd_compile(&registry, &config, &backend, json),
        Commands::Candidates { config } => cmd_candidates(&registry, &config),
    }
}

fn cmd_interfaces(registry: &Registry) -> Result<()> {
    println!("{:<12}  SUMMARY", "INTERFACE");
    println!("{}", "-".repeat(80));
    for iface in registry.interfaces() {
        println!("{:<12}  {}", iface.name(), iface.static_info().summary);
    }
    Ok(())
}

fn cmd_validate(registry: &Registry, manifests: &[PathBuf]) -> Result<()> {
    let mut failed = 0;
    for path in manifests {
        let result = PackageInfo::load(path).and_then(|info| {
            registry.sanitize_package(&info)?;
            Ok(info)
        });
        match result {
            Ok(info) => println!("ok    {} ({})", path.display(), info.name()),
            Err(e) => {
                failed += 1;
                println!("FAIL  {}: {e}", path.display());
            }
        }
    }

    if failed > 0 {
        return Err(Error::ValidationFailed {
            failed,
            total: manifests.len(),
        });
    }
    Ok(())
}

fn cmd_compile(registry: &Registry, config: &Path, backends: &[Backend], json: bool) -> Result<()> {
    let config = Config::load(config)?;
    let system = System::load(&config, registry)?;
    let input = system.compile_input()?;

    let backends = if backends.is_empty() {
        config.backends.as_slice()
    } else {
        backends
    };
    let compiled = Compiler::new(registry).compile_backends(&input, backends)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&compiled)?);
    } else {
        print_compiled(&compiled);
    }
    Ok(())
}

fn cmd_candidates(registry: &Registry, config: &Path) -> Result<()> {
    let config = Config::load(config)?;
    let system = System::load(&config, registry)?;
    let candidates = Compiler::new(registry).auto_connect_candidates(system.packages())?;

    if candidates.is_empty() {
        println!("No candidates found.");
        return Ok(());
    }

    println!("{:<32}  {:<32}  INTERFACE", "PLUG", "SLOT");
    println!("{}", "-".repeat(80));
    for (plug, slot) in candidates {
        println!(
            "{:<32}  {:<32}  {}",
            format!("{}:{}", plug.package.name(), plug.name),
            format!("{}:{}", slot.package.name(), slot.name),
            plug.interface
        );
    }
    Ok(())
}

fn print_compiled(compiled: &Compiled) {
    let tagged = [
        (Backend::AppArmor, &compiled.apparmor),
        (Backend::Seccomp, &compiled.seccomp),
        (Backend::DBus, &compiled.dbus),
    ];
    for (backend, snippets) in tagged {
        if let Some(snippets) = snippets {
            print_tagged(backend, snippets);
        }
    }

    if let Some(rules) = &compiled.udev {
        println!("=== {} ===", Backend::UDev);
        for rule in rules {
            println!("{rule}");
        }
        println!();
    }

    if let Some(services) = &compiled.systemd {
        println!("=== {} ===", Backend::Systemd);
        for (name, service) in services {
            println!("[{name}]");
            println!("Type={}", service.service_type);
            println!("RemainAfterExit={}", service.remain_after_exit);
            println!("ExecStart={}", service.exec_start);
            println!("ExecStop={}", service.exec_stop);
            println!();
        }
    }
}

fn print_tagged(backend: Backend, snippets: &[TaggedSnippet]) {
    println!("=== {backend} ===");
    for TaggedSnippet { tag, snippet } in snippets {
        println!("--- {tag} ---");
        println!("{}", snippet.trim());
        println!();
    }
}
