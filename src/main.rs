use clap::{Parser, Subcommand};
use inquire::{Confirm, Select, Text};

use keyguard_lib::config::AppConfig;
use keyguard_lib::policy::{self, AccessControlPolicy};
use keyguard_lib::status::{self, Status};
use keyguard_lib::{init_logging, AppState};

#[derive(Parser)]
#[command(name = "keyguard", version, about = "Store secrets in the platform keyring")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Save a value under a key
    Save {
        key: String,
        value: String,
        /// none | passcode | password | biometry
        #[arg(short, long, default_value = "none")]
        policy: AccessControlPolicy,
    },
    /// Print the value stored under a key
    Load {
        key: String,
        #[arg(short, long, default_value = "none")]
        policy: AccessControlPolicy,
    },
    /// Remove the value stored under a key
    Remove {
        key: String,
        #[arg(short, long, default_value = "none")]
        policy: AccessControlPolicy,
    },
    /// Remove every stored credential
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Show the security level of the backing store
    SecurityLevel,
    /// Show the detected biometry type
    Biometry,
    /// List the access control options offered on this device
    Options,
    /// Menu-driven session (default)
    Interactive,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let _guard = match init_logging(config.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: failed to initialize logging: {}", e);
            std::process::exit(1);
        }
    };

    let state = match AppState::new_production(config).await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let ok = run(&state, cli.command.unwrap_or(Command::Interactive)).await;
    if !ok {
        std::process::exit(1);
    }
}

/// Returns false when the command ended in a failure status
async fn run(state: &AppState, command: Command) -> bool {
    match command {
        Command::Save { key, value, policy } => {
            report(status::saved(&state.store.save(&key, &value, policy).await))
        }
        Command::Load { key, policy } => {
            let outcome = state.store.load(&key, policy).await;
            if let Ok(Some(credential)) = &outcome {
                println!("{} = {}", credential.key, credential.value);
            }
            report(status::loaded(&outcome))
        }
        Command::Remove { key, policy } => {
            report(status::removed(&state.store.remove(&key, policy).await))
        }
        Command::Reset { yes } => {
            if !yes && !confirm_reset() {
                println!("Reset cancelled.");
                return true;
            }
            report(status::reset(&state.store.reset_all().await))
        }
        Command::SecurityLevel => report(status::security_level(&state.store.security_level().await)),
        Command::Biometry => {
            match state.biometry.get().await {
                Some(kind) => println!("Biometry: {}", kind),
                None => println!("Biometry: not available"),
            }
            true
        }
        Command::Options => {
            let labels = policy::option_labels(state.biometry.get().await);
            for (index, label) in labels.iter().enumerate() {
                println!("{}: {}", index, label);
            }
            true
        }
        Command::Interactive => {
            interactive(state).await;
            true
        }
    }
}

fn report(status: Status) -> bool {
    if status.success {
        println!("{}", status);
    } else {
        eprintln!("{}", status);
    }
    status.success
}

fn confirm_reset() -> bool {
    Confirm::new("Remove every stored credential?")
        .with_default(false)
        .prompt()
        .unwrap_or(false)
}

/// View state owned by the terminal session
#[derive(Default)]
struct Screen {
    key: String,
    value: String,
    policy_index: usize,
}

const ACTIONS: [&str; 7] = [
    "Save",
    "Load",
    "Remove",
    "Reset",
    "Get security level",
    "Access control",
    "Quit",
];

async fn interactive(state: &AppState) {
    let mut screen = Screen::default();

    loop {
        let biometry = state.biometry.get().await;
        let labels = policy::option_labels(biometry);
        if screen.policy_index >= labels.len() {
            screen.policy_index = 0;
        }
        let access = policy::policy_for_index(screen.policy_index, biometry.is_some());
        println!("\nKey: {}  Access control: {}", screen.key, labels[screen.policy_index]);

        let action = match Select::new("Action", ACTIONS.to_vec()).prompt() {
            Ok(action) => action,
            Err(_) => return,
        };

        let status = match action {
            "Save" => {
                let Some(key) = ask("Key", &screen.key) else { continue };
                let Some(value) = ask("Value", &screen.value) else { continue };
                let outcome = state.store.save(&key, &value, access).await;
                if outcome.is_ok() {
                    screen.key.clear();
                    screen.value.clear();
                } else {
                    screen.key = key;
                    screen.value = value;
                }
                status::saved(&outcome)
            }
            "Load" => {
                let Some(key) = ask("Key", &screen.key) else { continue };
                let outcome = state.store.load(&key, access).await;
                screen.key = key;
                if let Ok(Some(credential)) = &outcome {
                    screen.value = credential.value.clone();
                    println!("Value: {}", credential.value);
                }
                status::loaded(&outcome)
            }
            "Remove" => {
                let Some(key) = ask("Key", &screen.key) else { continue };
                let outcome = state.store.remove(&key, access).await;
                screen.key = key;
                screen.value.clear();
                status::removed(&outcome)
            }
            "Reset" => {
                if !confirm_reset() {
                    continue;
                }
                let outcome = state.store.reset_all().await;
                screen.key.clear();
                screen.value.clear();
                status::reset(&outcome)
            }
            "Get security level" => status::security_level(&state.store.security_level().await),
            "Access control" => {
                if let Ok(choice) = Select::new("Access control", labels).raw_prompt() {
                    screen.policy_index = choice.index;
                }
                continue;
            }
            _ => return,
        };

        report(status);
    }
}

fn ask(label: &str, initial: &str) -> Option<String> {
    Text::new(label).with_initial_value(initial).prompt().ok()
}
