use std::io::Write;

use chrono::{DateTime, Local, NaiveTime, Utc};
use clap::Subcommand;
use focusmonitor_core::notify;
use focusmonitor_core::storage::{RecordStore, SettingsStore, UserSettings};
use focusmonitor_core::timer::{FocusMachine, Ticker};
use focusmonitor_core::{Event, SessionStatus, TimerStatus};

const MACHINE_KEY: &str = "focus_machine";

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a focus session now
    Start {
        /// Focus length in minutes (defaults to the configured duration)
        #[arg(long)]
        duration: Option<u32>,
    },
    /// Schedule a session for a future instant
    Schedule {
        /// Start time: RFC 3339, or HH:MM local time today
        #[arg(long)]
        at: String,
        /// Focus length in minutes (defaults to the configured duration)
        #[arg(long)]
        duration: Option<u32>,
    },
    /// Pause the running session
    Pause,
    /// Resume the paused session
    Resume,
    /// Stop the current session without recording it
    Stop {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Print current machine state as JSON
    Status,
    /// Drive the countdown in the foreground until it finishes
    Run,
}

fn load_machine(store: &RecordStore) -> FocusMachine {
    if let Ok(Some(json)) = store.kv_get(MACHINE_KEY) {
        if let Ok(machine) = serde_json::from_str::<FocusMachine>(&json) {
            return machine;
        }
    }
    FocusMachine::new()
}

fn save_machine(store: &RecordStore, machine: &FocusMachine) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(machine)?;
    store.kv_set(MACHINE_KEY, &json)?;
    Ok(())
}

/// Persist and announce any completions the machine emitted. Persistence
/// failures are reported but never undo the in-memory transition.
fn settle_events(store: &RecordStore, settings: &UserSettings, events: &[Event]) {
    for event in events {
        if let Event::SessionCompleted { record, .. } = event {
            if let Err(e) = store.append(record) {
                tracing::error!(error = %e, record_id = %record.id, "failed to persist focus record");
                eprintln!("warning: focus record was not persisted: {e}");
            }
            notify::notify_completion(settings, record);
        }
    }
}

fn confirm(prompt: &str) -> bool {
    eprint!("{prompt} [y/N] ");
    let _ = std::io::stderr().flush();
    let mut line = String::new();
    if std::io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Accepts RFC 3339 or a bare `HH:MM`, interpreted as local time today.
fn parse_start_time(input: &str) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(time) = NaiveTime::parse_from_str(input, "%H:%M") {
        let local = Local::now()
            .date_naive()
            .and_time(time)
            .and_local_timezone(Local)
            .single()
            .ok_or("ambiguous local time")?;
        return Ok(local.with_timezone(&Utc));
    }
    Err(format!("cannot parse '{input}' as RFC 3339 or HH:MM").into())
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = RecordStore::open()?;
    let settings = SettingsStore::open()?.load()?;
    let mut machine = load_machine(&store);

    // Replay the time that passed since the last invocation before acting.
    let caught_up = machine.catch_up(Utc::now());
    settle_events(&store, &settings, &caught_up);

    match action {
        SessionAction::Start { duration } => {
            let duration = duration.unwrap_or(settings.default_duration_min);
            let event = machine.start_instant(duration, Utc::now())?;
            print_event(&event)?;
        }
        SessionAction::Schedule { at, duration } => {
            let duration = duration.unwrap_or(settings.default_duration_min);
            let start_at = parse_start_time(&at)?;
            let event = machine.schedule(duration, start_at, Utc::now())?;
            print_event(&event)?;
        }
        SessionAction::Pause => match machine.pause(Utc::now()) {
            Some(event) => print_event(&Some(event))?,
            None => println!("no running session to pause"),
        },
        SessionAction::Resume => match machine.resume(Utc::now()) {
            Some(event) => print_event(&Some(event))?,
            None => println!("no paused session to resume"),
        },
        SessionAction::Stop { yes } => {
            if machine.is_empty() {
                // Idempotent: stopping with nothing live is not an error.
                println!("no active session");
            } else if yes || confirm("Stop the current session? Nothing will be recorded.") {
                let event = machine.stop(Utc::now());
                print_event(&event)?;
            } else {
                println!("kept the current session");
            }
        }
        SessionAction::Status => {
            print_event(&Some(machine.snapshot(Utc::now())))?;
        }
        SessionAction::Run => {
            save_machine(&store, &machine)?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run_live(&store, &settings, &mut machine))?;
        }
    }

    save_machine(&store, &machine)?;
    Ok(())
}

fn print_event(event: &Option<Event>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(event) = event {
        println!("{}", serde_json::to_string_pretty(event)?);
    }
    Ok(())
}

/// Foreground loop: a 1-second ticker drives the machine until the
/// session completes or is no longer live. The ticker dies with this
/// function, so nothing fires after the loop exits.
async fn run_live(
    store: &RecordStore,
    settings: &UserSettings,
    machine: &mut FocusMachine,
) -> Result<(), Box<dyn std::error::Error>> {
    if machine.is_empty() {
        println!("no active session");
        return Ok(());
    }
    if machine.timer().status == TimerStatus::Paused {
        println!("session is paused; resume it first");
        return Ok(());
    }

    let (tx, mut rx) = tokio::sync::mpsc::channel::<()>(8);
    let ticker = Ticker::every(std::time::Duration::from_secs(1), move || {
        let _ = tx.try_send(());
    });

    while rx.recv().await.is_some() {
        let now = Utc::now();
        let event = machine.tick(now);
        save_machine(store, machine)?;
        render_progress(machine);

        if let Some(Event::SessionCompleted { record, .. }) = &event {
            println!();
            if let Err(e) = store.append(record) {
                tracing::error!(error = %e, record_id = %record.id, "failed to persist focus record");
                eprintln!("warning: focus record was not persisted: {e}");
            }
            notify::notify_completion(settings, record);
            println!("{}", serde_json::to_string_pretty(&event)?);
            break;
        }
        if machine.is_empty() {
            println!();
            break;
        }
    }

    ticker.cancel();
    Ok(())
}

fn render_progress(machine: &FocusMachine) {
    let timer = machine.timer();
    let line = match machine.session().map(|s| s.status) {
        Some(SessionStatus::Pending) => {
            let until = machine
                .session()
                .and_then(|s| s.scheduled_at)
                .map(|at| at.with_timezone(&Local).format("%H:%M").to_string())
                .unwrap_or_default();
            format!("waiting until {until}        ")
        }
        Some(_) if timer.status == TimerStatus::Running => format!(
            "{:02}:{:02} remaining        ",
            timer.remaining_secs / 60,
            timer.remaining_secs % 60
        ),
        _ => String::from("                        "),
    };
    print!("\r{line}");
    let _ = std::io::stdout().flush();
}
