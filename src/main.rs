use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use comfy_table::{Attribute, Cell, Color, Table};
use inquire::Text;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use zc_invoice::{assemble, AppSettings, RecordStore, Result};

// ==========================================
// CLI
// ==========================================

#[derive(Parser)]
#[command(name = "zc-invoice", about = "Prepare export invoices for the print template")]
struct Cli {
    /// Data directory (overrides settings and ZC_INVOICE_DATA_ROOT)
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the render-ready data for an invoice as JSON
    Prepare {
        id: String,
        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },
    /// Render an invoice through a tera template
    Render {
        id: String,
        #[arg(short, long)]
        template: PathBuf,
        /// Write here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// List stored invoices
    List,
    /// Configure data directory
    Config {
        /// New data directory; prompts when omitted
        #[arg(value_name = "DIR")]
        path: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ==========================================
// Main Function
// ==========================================

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn open_store(data_root: Option<PathBuf>) -> RecordStore {
    let root = data_root.unwrap_or_else(|| AppSettings::resolve().data_root_path());
    RecordStore::new(root)
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Prepare { id, compact } => {
            let data = assemble(&open_store(cli.data_root).load(&id)?);
            let json = if compact {
                serde_json::to_string(&data)?
            } else {
                serde_json::to_string_pretty(&data)?
            };
            println!("{json}");
        }
        Commands::Render { id, template, out } => {
            let data = assemble(&open_store(cli.data_root).load(&id)?);
            let rendered = data.render_file(&template)?;
            match out {
                Some(path) => {
                    write_output(&path, &rendered)?;
                    info!(path = %path.display(), "invoice rendered");
                }
                None => print!("{rendered}"),
            }
        }
        Commands::List => list_invoices(&open_store(cli.data_root))?,
        Commands::Config { path } => configure(path)?,
    }
    Ok(())
}

// ==========================================
// Commands
// ==========================================

fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, content)?;
    Ok(())
}

fn list_invoices(store: &RecordStore) -> Result<()> {
    let ids = store.list()?;
    if ids.is_empty() {
        println!("No invoices found in {}", store.dir().display());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("ID").add_attribute(Attribute::Bold),
        Cell::new("Invoice No.").add_attribute(Attribute::Bold),
        Cell::new("Date").add_attribute(Attribute::Bold),
        Cell::new("Rows").add_attribute(Attribute::Bold),
        Cell::new("Middle Row").add_attribute(Attribute::Bold),
        Cell::new("Total").add_attribute(Attribute::Bold),
    ]);

    for id in ids {
        let record = match store.load(&id) {
            Ok(record) => record,
            Err(e) => {
                warn!(%id, "skipping unreadable invoice: {e}");
                table.add_row(vec![Cell::new(&id), Cell::new("unreadable").fg(Color::Red)]);
                continue;
            }
        };
        let data = assemble(&record);
        table.add_row(vec![
            Cell::new(&id),
            Cell::new(&data.invoice_number),
            Cell::new(&data.invoice_date),
            Cell::new(data.table.total_items),
            Cell::new(data.table.middle_row),
            Cell::new(format!("{} {}", data.currency, data.total_invoice_value))
                .fg(Color::Green),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn configure(data_root: Option<String>) -> Result<()> {
    let new_root = match data_root {
        Some(root) => root,
        None => {
            let current = AppSettings::load().unwrap_or_default();
            let answer = Text::new("Data directory:")
                .with_default(&current.data_root)
                .prompt();
            match answer {
                Ok(root) => root,
                Err(e) => {
                    warn!("configuration cancelled: {e}");
                    return Ok(());
                }
            }
        }
    };

    let settings = AppSettings {
        data_root: new_root,
    };
    let path = settings.save()?;
    info!(path = %path.display(), "settings saved");
    Ok(())
}
