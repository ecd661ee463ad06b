use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use mockomatic_session::config::MockomaticConfig;
use mockomatic_session::state::timeline::RunField;

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "mockomatic-session")]
#[command(about = "Plan mock examination sessions: stations, slots and run timings")]
#[command(version)]
struct Cli {
    /// Draft file to read and update
    #[arg(long, global = true, default_value = "mockomatic-draft.json")]
    draft: PathBuf,

    /// Config file (default: ~/.config/mockomatic/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an empty draft
    New {
        /// Overwrite an existing draft
        #[arg(long)]
        force: bool,
    },

    /// Display the draft
    Show {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Change session-level settings
    Settings {
        /// Venue
        #[arg(long)]
        location: Option<String>,

        /// Scheduled date (YYYY-MM-DD, or "none" to clear)
        #[arg(long)]
        date: Option<String>,

        /// Intermission between stations (MM:SS)
        #[arg(long)]
        intermission: Option<String>,

        /// Enable or disable feedback time
        #[arg(long)]
        feedback: Option<bool>,

        /// Feedback time per station (MM:SS, or "none" to clear)
        #[arg(long)]
        feedback_duration: Option<String>,

        /// Give the last station its own duration
        #[arg(long)]
        static_at_end: Option<bool>,
    },

    /// Station subcommands
    Station {
        #[command(subcommand)]
        command: StationCommands,
    },

    /// Slot subcommands
    Slot {
        #[command(subcommand)]
        command: SlotCommands,
    },

    /// Run subcommands
    Run {
        #[command(subcommand)]
        command: RunCommands,
    },

    /// Circuit subcommands
    Circuit {
        #[command(subcommand)]
        command: CircuitCommands,
    },

    /// Bring every run back to the calculated run duration
    Recalc,

    /// Check the draft before pushing
    Validate,

    /// Template subcommands
    Templates {
        #[command(subcommand)]
        command: TemplateCommands,
    },

    /// Submit the draft as a new session
    Push,

    /// Replace the draft with a stored session
    Fetch {
        /// Session id
        #[arg(long)]
        id: String,
    },

    /// Stored session subcommands
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

#[derive(Subcommand)]
enum StationCommands {
    /// Append a station
    Add {
        /// Station title
        #[arg(long)]
        title: String,

        /// Duration (MM:SS, default from config)
        #[arg(long)]
        duration: Option<String>,
    },

    /// Change a station's title or duration
    Update {
        /// Station index
        #[arg(long)]
        index: usize,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New duration (MM:SS)
        #[arg(long)]
        duration: Option<String>,
    },

    /// Delete stations by index
    Delete {
        /// Station indices (comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        index: Vec<u32>,
    },

    /// Move a station before or after another
    Reorder {
        /// Index of the station to move
        #[arg(long)]
        source: usize,

        /// Index of the station to drop onto
        #[arg(long)]
        target: usize,

        /// Placement: reorder-before or reorder-after
        #[arg(long, default_value = "reorder-before")]
        instruction: String,
    },
}

#[derive(Subcommand)]
enum SlotCommands {
    /// Append a slot with one circuit and one run
    Add,

    /// Remove slots by key
    Remove {
        /// Slot keys (comma-separated, e.g. A,C)
        #[arg(long, value_delimiter = ',', required = true)]
        key: Vec<String>,
    },
}

#[derive(Subcommand)]
enum RunCommands {
    /// Append a run to a slot
    Add {
        /// Slot key
        #[arg(long)]
        slot: String,
    },

    /// Delete a run
    Delete {
        /// Slot key
        #[arg(long)]
        slot: String,

        /// Run number within the slot (1-based)
        #[arg(long)]
        run: usize,
    },

    /// Move a run's start; later runs follow
    SetStart {
        /// Slot key
        #[arg(long)]
        slot: String,

        /// Run number within the slot (1-based)
        #[arg(long)]
        run: usize,

        /// New start (HH:MM or HH:MM:SS)
        #[arg(long)]
        time: String,
    },

    /// Move a run's end; later runs follow
    SetEnd {
        /// Slot key
        #[arg(long)]
        slot: String,

        /// Run number within the slot (1-based)
        #[arg(long)]
        run: usize,

        /// New end (HH:MM or HH:MM:SS)
        #[arg(long)]
        time: String,
    },

    /// Set the flip-allocation flag
    Flip {
        /// Slot key
        #[arg(long)]
        slot: String,

        /// Run number within the slot (1-based)
        #[arg(long)]
        run: usize,

        /// Flag value
        #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
        value: bool,
    },
}

#[derive(Subcommand)]
enum CircuitCommands {
    /// Append a circuit to a slot
    Add {
        /// Slot key
        #[arg(long)]
        slot: String,
    },

    /// Delete a circuit (a slot keeps at least one)
    Delete {
        /// Slot key
        #[arg(long)]
        slot: String,

        /// Circuit key within the slot
        #[arg(long)]
        circuit: String,
    },

    /// Set the female-only flag
    FemaleOnly {
        /// Slot key
        #[arg(long)]
        slot: String,

        /// Circuit key within the slot
        #[arg(long)]
        circuit: String,

        /// Flag value
        #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
        value: bool,
    },
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// List templates from the API
    List {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Apply a template to the draft
    Apply {
        /// Template id or name
        #[arg(long)]
        template: String,
    },

    /// Save the draft's stations and timing policy as a template
    Create {
        /// Template name
        #[arg(long)]
        name: String,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// List stored sessions
    List {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete stored sessions (admin only)
    Delete {
        /// Session ids (comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        id: Vec<String>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run() -> anyhow::Result<u8> {
    let cli = Cli::parse();
    let config = MockomaticConfig::load(cli.config.as_deref())?;
    let ctx = Context::new(cli.draft, config);

    match cli.command {
        Commands::New { force } => commands::draft::new(&ctx, force),
        Commands::Show { format } => commands::draft::show(&ctx, format),
        Commands::Settings {
            location,
            date,
            intermission,
            feedback,
            feedback_duration,
            static_at_end,
        } => commands::draft::settings(
            &ctx,
            commands::draft::SettingsChange {
                location,
                date,
                intermission,
                feedback,
                feedback_duration,
                static_at_end,
            },
        ),
        Commands::Recalc => commands::draft::recalc(&ctx),
        Commands::Validate => commands::draft::validate(&ctx),

        Commands::Station { command } => match command {
            StationCommands::Add { title, duration } => {
                commands::stations::add(&ctx, &title, duration.as_deref())
            }
            StationCommands::Update {
                index,
                title,
                duration,
            } => commands::stations::update(&ctx, index, title.as_deref(), duration.as_deref()),
            StationCommands::Delete { index } => commands::stations::delete(&ctx, &index),
            StationCommands::Reorder {
                source,
                target,
                instruction,
            } => commands::stations::reorder(&ctx, source, target, &instruction),
        },

        Commands::Slot { command } => match command {
            SlotCommands::Add => commands::slots::add_slot(&ctx),
            SlotCommands::Remove { key } => commands::slots::remove_slots(&ctx, &key),
        },

        Commands::Run { command } => match command {
            RunCommands::Add { slot } => commands::slots::add_run(&ctx, &slot),
            RunCommands::Delete { slot, run } => commands::slots::delete_run(&ctx, &slot, run),
            RunCommands::SetStart { slot, run, time } => {
                commands::slots::set_run_time(&ctx, &slot, run, RunField::Start, &time)
            }
            RunCommands::SetEnd { slot, run, time } => {
                commands::slots::set_run_time(&ctx, &slot, run, RunField::End, &time)
            }
            RunCommands::Flip { slot, run, value } => {
                commands::slots::flip_run(&ctx, &slot, run, value)
            }
        },

        Commands::Circuit { command } => match command {
            CircuitCommands::Add { slot } => commands::slots::add_circuit(&ctx, &slot),
            CircuitCommands::Delete { slot, circuit } => {
                commands::slots::delete_circuit(&ctx, &slot, &circuit)
            }
            CircuitCommands::FemaleOnly {
                slot,
                circuit,
                value,
            } => commands::slots::set_female_only(&ctx, &slot, &circuit, value),
        },

        Commands::Templates { command } => match command {
            TemplateCommands::List { format } => commands::templates::list(&ctx, format),
            TemplateCommands::Apply { template } => commands::templates::apply(&ctx, &template),
            TemplateCommands::Create { name } => commands::templates::create(&ctx, &name),
        },

        Commands::Push => commands::remote::push(&ctx),
        Commands::Fetch { id } => commands::remote::fetch(&ctx, &id),
        Commands::Sessions { command } => match command {
            SessionCommands::List { format } => commands::remote::list_sessions(&ctx, format),
            SessionCommands::Delete { id } => commands::remote::delete_sessions(&ctx, &id),
        },
    }
}
