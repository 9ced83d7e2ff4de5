//! meshdb CLI - inspect and maintain a mesh network database

use clap::{Parser, Subcommand, ValueEnum};
use meshdb::config::{self, MeshConfig};
use meshdb::ui::{self, Icons};
use meshdb::{GroupDevice, MeshStore, Setting, SingleDevice};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "meshdb")]
#[command(version)]
#[command(about = "Inspect and maintain the local database of a mesh network")]
#[command(long_about = r#"
meshdb manages the local store of a mesh network:
  • Network settings (key, TTL, id counters)
  • Devices and their group membership
  • Groups

Example usage:
  meshdb init
  meshdb settings save --key 0011aabb --ttl 4
  meshdb devices upsert --id 32769 --name Light1 --group 1 --group 2
  meshdb devices list --format json
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputMode::Text)]
    format: OutputMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputMode {
    Text,
    Json,
}

impl OutputMode {
    fn is_human(self) -> bool {
        self == OutputMode::Text
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the database
    Init {
        /// Settings id new devices and groups are stamped with
        #[arg(long)]
        settings_id: Option<i64>,

        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Show row counts per table
    Stats,

    /// Network settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Devices and their group membership
    Devices {
        #[command(subcommand)]
        action: DevicesAction,
    },

    /// Groups
    Groups {
        #[command(subcommand)]
        action: GroupsAction,
    },

    /// Delete every row from every table (factory reset)
    Wipe {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Show one settings record
    Show {
        /// Settings id (defaults to the configured one)
        #[arg(long)]
        id: Option<i64>,
    },

    /// List all settings records
    List,

    /// Create or replace a settings record
    Save {
        /// Existing id to replace; omitted inserts a new record
        #[arg(long)]
        id: Option<i64>,

        /// Network key
        #[arg(short, long)]
        key: String,

        #[arg(long, default_value = "0")]
        next_device: i32,

        #[arg(long, default_value = "0")]
        next_group: i32,

        /// Require device authentication
        #[arg(long)]
        auth: bool,

        #[arg(long, default_value = "0")]
        ttl: i32,
    },
}

#[derive(Subcommand)]
enum DevicesAction {
    /// List devices with their groups
    List,

    /// Show a single device
    Show {
        #[arg(long)]
        id: i32,
    },

    /// Create or replace a device and its group membership
    Upsert {
        #[arg(long)]
        id: i32,

        #[arg(short, long)]
        name: String,

        /// UUID hash
        #[arg(long, default_value = "0")]
        hash: i32,

        /// Model support bits 0..64
        #[arg(long, default_value = "0")]
        model_low: u64,

        /// Model support bits 64..128
        #[arg(long, default_value = "0")]
        model_high: u64,

        #[arg(long, default_value = "0")]
        groups_supported: i32,

        /// Group ids (repeat or comma separate)
        #[arg(short, long = "group", value_delimiter = ',')]
        groups: Vec<i32>,

        /// Owning settings id (defaults to the configured one)
        #[arg(long)]
        settings_id: Option<i64>,
    },

    /// Rename a device
    Rename {
        #[arg(long)]
        id: i32,

        #[arg(short, long)]
        name: String,
    },

    /// Remove a device (membership rows are kept)
    Remove {
        #[arg(long)]
        id: i32,
    },
}

#[derive(Subcommand)]
enum GroupsAction {
    /// List groups with their members
    List,

    /// Create or replace a group
    Upsert {
        #[arg(long)]
        id: i32,

        #[arg(short, long)]
        name: String,

        /// Owning settings id (defaults to the configured one)
        #[arg(long)]
        settings_id: Option<i64>,
    },

    /// Rename a group
    Rename {
        #[arg(long)]
        id: i32,

        #[arg(short, long)]
        name: String,
    },

    /// Remove a group (membership rows are kept)
    Remove {
        #[arg(long)]
        id: i32,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = run(cli) {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    let cwd = std::env::current_dir()?;
    let database = config.resolve_database(cli.database.as_deref(), &cwd);
    let mode = cli.format;

    match cli.command {
        Commands::Init { settings_id, force } => {
            let config_path = cli.config.unwrap_or_else(config::default_config_path);
            let new_config = MeshConfig {
                database: Some(database.to_string_lossy().to_string()),
                settings_id: settings_id.or(config.settings_id),
                busy_timeout_ms: config.busy_timeout_ms,
            };
            config::write_config(&config_path, &new_config, force)?;
            open_store(&database, &new_config)?;

            if mode.is_human() {
                ui::success(&format!("Wrote config to {}", config_path.display()));
                ui::info("Database", &database.display().to_string());
            } else {
                emit_json(&serde_json::json!({
                    "config": config_path,
                    "database": database,
                }))?;
            }
        }

        Commands::Stats => {
            let store = open_store(&database, &config)?;
            let stats = store.stats()?;

            if mode.is_human() {
                ui::header(&format!("{} Mesh database ({})", Icons::STATS, database.display()));
                println!("{}", ui::stats_table(&stats.rows()));
                if stats.has_orphans() {
                    ui::warn(&format!(
                        "{} membership rows reference missing devices, {} reference missing groups",
                        stats.memberships_without_device, stats.memberships_without_group
                    ));
                }
            } else {
                emit_json(&stats)?;
            }
        }

        Commands::Settings { action } => {
            let store = open_store(&database, &config)?;
            run_settings(&store, &config, action, mode)?;
        }

        Commands::Devices { action } => {
            let store = open_store(&database, &config)?;
            run_devices(&store, &config, action, mode)?;
        }

        Commands::Groups { action } => {
            let store = open_store(&database, &config)?;
            run_groups(&store, &config, action, mode)?;
        }

        Commands::Wipe { yes } => {
            if !yes {
                anyhow::bail!("refusing to wipe {} without --yes", database.display());
            }
            let store = open_store(&database, &config)?;
            store.wipe_all()?;
            if mode.is_human() {
                ui::success(&format!("{} Wiped {}", Icons::DEL, database.display()));
            } else {
                emit_json(&serde_json::json!({ "wiped": database }))?;
            }
        }
    }

    Ok(())
}

fn open_store(database: &Path, config: &MeshConfig) -> anyhow::Result<MeshStore> {
    tracing::debug!("Opening {}", database.display());
    let store = MeshStore::open(database)?;
    if let Some(timeout) = config.busy_timeout() {
        store.database().set_busy_timeout(timeout)?;
    }
    Ok(store)
}

fn settings_id(flag: Option<i64>, config: &MeshConfig) -> anyhow::Result<i64> {
    flag.or(config.settings_id).ok_or_else(|| {
        anyhow::anyhow!("no settings id given (pass --settings-id or set settings_id in the config)")
    })
}

fn emit_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_settings(
    store: &MeshStore,
    config: &MeshConfig,
    action: SettingsAction,
    mode: OutputMode,
) -> anyhow::Result<()> {
    match action {
        SettingsAction::Show { id } => {
            let id = settings_id(id, config)?;
            let setting = store
                .settings()
                .get(id)?
                .ok_or_else(|| meshdb::Error::NotFound(format!("settings {}", id)))?;

            if mode.is_human() {
                ui::header(&format!("{} Settings {}", Icons::KEY, id));
                println!("{}", ui::setting_table(&setting));
            } else {
                emit_json(&setting)?;
            }
        }

        SettingsAction::List => {
            let settings = store.settings().list_all()?;
            if mode.is_human() {
                if settings.is_empty() {
                    println!("{} No settings stored.", Icons::EMPTY);
                }
                for setting in &settings {
                    println!("{}", ui::setting_table(setting));
                }
            } else {
                emit_json(&settings)?;
            }
        }

        SettingsAction::Save {
            id,
            key,
            next_device,
            next_group,
            auth,
            ttl,
        } => {
            let setting = Setting {
                id,
                ..Setting::new(key)
                    .with_indices(next_device, next_group)
                    .with_auth_required(auth)
                    .with_ttl(ttl)
            };
            let replacing = setting.is_persisted();
            let saved = store.settings().save(&setting)?;

            if mode.is_human() {
                let verb = if replacing { "Replaced" } else { "Created" };
                ui::success(&format!("{} settings {}", verb, saved.id.unwrap_or_default()));
            } else {
                emit_json(&saved)?;
            }
        }
    }
    Ok(())
}

fn run_devices(
    store: &MeshStore,
    config: &MeshConfig,
    action: DevicesAction,
    mode: OutputMode,
) -> anyhow::Result<()> {
    match action {
        DevicesAction::List => {
            let devices = store.devices().list_all()?;
            if !mode.is_human() {
                emit_json(&devices)?;
            } else if devices.is_empty() {
                println!("{} No devices stored.", Icons::EMPTY);
            } else {
                ui::header(&format!("{} {} devices", Icons::DEVICE, devices.len()));
                println!("{}", ui::device_table(&devices));
            }
        }

        DevicesAction::Show { id } => {
            let device = store
                .devices()
                .get(id)?
                .ok_or_else(|| meshdb::Error::NotFound(format!("device {}", id)))?;
            if mode.is_human() {
                println!("{}", ui::device_table(std::slice::from_ref(&device)));
            } else {
                emit_json(&device)?;
            }
        }

        DevicesAction::Upsert {
            id,
            name,
            hash,
            model_low,
            model_high,
            groups_supported,
            groups,
            settings_id: flag,
        } => {
            let owner = settings_id(flag, config)?;
            let device = SingleDevice::new(id, name, hash, model_low, model_high)
                .with_minimum_supported_groups(groups_supported)
                .with_groups(groups);
            store.devices().upsert(&device, owner)?;

            if mode.is_human() {
                ui::success(&format!(
                    "Saved device {} ({}) in {} groups",
                    device.device_id,
                    device.name,
                    device.group_membership.len()
                ));
            } else {
                emit_json(&device)?;
            }
        }

        DevicesAction::Rename { id, name } => {
            store.devices().update_name(id, &name)?;
            if mode.is_human() {
                ui::success(&format!("Renamed device {} to {}", id, name));
            }
        }

        DevicesAction::Remove { id } => {
            store.devices().remove(id)?;
            if mode.is_human() {
                ui::success(&format!("Removed device {}", id));
            }
        }
    }
    Ok(())
}

fn run_groups(
    store: &MeshStore,
    config: &MeshConfig,
    action: GroupsAction,
    mode: OutputMode,
) -> anyhow::Result<()> {
    match action {
        GroupsAction::List => {
            let groups = store.groups().list_all()?;
            let mut with_members = Vec::with_capacity(groups.len());
            for group in groups {
                let members: Vec<i32> = store
                    .membership()
                    .list_device_ids_for_group(group.device_id)?
                    .into_iter()
                    .collect();
                with_members.push((group, members));
            }

            if !mode.is_human() {
                let json: Vec<_> = with_members
                    .iter()
                    .map(|(g, members)| {
                        serde_json::json!({ "id": g.device_id, "name": g.name, "members": members })
                    })
                    .collect();
                emit_json(&json)?;
            } else if with_members.is_empty() {
                println!("{} No groups stored.", Icons::EMPTY);
            } else {
                ui::header(&format!("{} {} groups", Icons::GROUP, with_members.len()));
                println!("{}", ui::group_table(&with_members));
            }
        }

        GroupsAction::Upsert {
            id,
            name,
            settings_id: flag,
        } => {
            let owner = settings_id(flag, config)?;
            let saved = store.groups().upsert(&GroupDevice::new(id, name), owner)?;
            if mode.is_human() {
                ui::success(&format!("Saved group {} ({})", saved.device_id, saved.name));
            } else {
                emit_json(&saved)?;
            }
        }

        GroupsAction::Rename { id, name } => {
            store.groups().update_name(id, &name)?;
            if mode.is_human() {
                ui::success(&format!("Renamed group {} to {}", id, name));
            }
        }

        GroupsAction::Remove { id } => {
            store.groups().remove(id)?;
            if mode.is_human() {
                ui::success(&format!("Removed group {}", id));
            }
        }
    }
    Ok(())
}
