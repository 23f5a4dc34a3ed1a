use clap::Subcommand;
use focusmonitor_core::storage::{SettingsStore, UserSettings};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a settings value
    Get {
        /// Settings key (e.g. "default_duration_min", "theme")
        key: String,
    },
    /// Set a settings value
    Set {
        /// Settings key
        key: String,
        /// New value
        value: String,
    },
    /// List all settings values
    List,
    /// Reset settings to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = SettingsStore::open()?;

    match action {
        ConfigAction::Get { key } => {
            let settings = store.load()?;
            match settings.get(&key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut settings = store.load()?;
            settings.set(&key, &value)?;
            store.save(&settings)?;
            println!("ok");
        }
        ConfigAction::List => {
            let settings = store.load()?;
            let json = serde_json::to_string_pretty(&settings)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            store.save(&UserSettings::default())?;
            println!("settings reset to defaults");
        }
    }
    Ok(())
}
