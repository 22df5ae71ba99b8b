use anyhow::{anyhow, Result};
use crossterm::style::Stylize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use tdm::api::{ApiClient, Confirmer, FileRecordStore, FileSettingsStore, RecordStore, SettingsStore};
use tdm::config::config::Config;
use tdm::config::settings::search_column_list;
use tdm::data::filter::FilterSet;
use tdm::data::record::{RecordId, RecordStatus};
use tdm::schema::CustomValueType;
use tdm::session::Session;
use tdm::state::{Action, NoticeLevel};
use tdm::ui::table_display::{
    render_column_list, render_dashboard, render_filters, render_notice, render_record_details,
    render_table,
};
use tdm::ui::table_renderer::TableModel;
use tdm::utils::app_paths::AppPaths;
use tdm::utils::logging::init_tracing;

/// Options that take a value
const VALUE_FLAGS: [&str; 7] = [
    "--page",
    "--page-size",
    "--filter",
    "--out",
    "--search",
    "--type",
    "--to",
];

#[derive(Debug, Clone, PartialEq)]
enum Command {
    List,
    View(RecordId),
    Import(PathBuf),
    Export,
    Columns,
    Hide(String),
    Show(String),
    HideAll,
    ShowAll,
    Move { source: String, target: String },
    AddColumn(String),
    RemoveColumn(String),
    Status(Vec<RecordId>),
    Delete(Vec<RecordId>),
    DeleteAll,
    Stats,
    Help,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct CliArgs {
    positionals: Vec<String>,
    page: Option<usize>,
    page_size: Option<usize>,
    filters: Vec<String>,
    out: Option<PathBuf>,
    search: Option<String>,
    value_type: Option<String>,
    to: Option<String>,
    all: bool,
    offline: bool,
    yes: bool,
    verbose: bool,
    generate_config: bool,
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("{} expects a number, got '{}'", flag, value))
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut cli = CliArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            let value = iter
                .next()
                .ok_or_else(|| anyhow!("{} requires a value", arg))?;
            match arg.as_str() {
                "--page" => cli.page = Some(parse_number(arg, value)?),
                "--page-size" => cli.page_size = Some(parse_number(arg, value)?),
                "--filter" => cli.filters.push(value.clone()),
                "--out" => cli.out = Some(PathBuf::from(value)),
                "--search" => cli.search = Some(value.clone()),
                "--type" => cli.value_type = Some(value.clone()),
                "--to" => cli.to = Some(value.clone()),
                _ => {}
            }
            continue;
        }

        match arg.as_str() {
            "--all" => cli.all = true,
            "--offline" => cli.offline = true,
            "--yes" | "-y" => cli.yes = true,
            "--verbose" | "-v" => cli.verbose = true,
            "--generate-config" => cli.generate_config = true,
            "--help" | "-h" => cli.positionals.insert(0, "help".to_string()),
            flag if flag.starts_with("--") => return Err(anyhow!("Unknown option {}", flag)),
            _ => cli.positionals.push(arg.clone()),
        }
    }

    Ok(cli)
}

fn parse_ids(values: &[String]) -> Result<Vec<RecordId>> {
    if values.is_empty() {
        return Err(anyhow!("At least one record id is required"));
    }
    values
        .iter()
        .map(|v| parse_number("id", v.trim_start_matches('#')))
        .collect()
}

fn parse_command(cli: &CliArgs) -> Result<Command> {
    let Some((name, rest)) = cli.positionals.split_first() else {
        return Ok(Command::List);
    };
    let arg = |i: usize| {
        rest.get(i)
            .cloned()
            .ok_or_else(|| anyhow!("'{}' is missing an argument", name))
    };

    let command = match name.as_str() {
        "list" => Command::List,
        "view" => Command::View(parse_number("id", arg(0)?.trim_start_matches('#'))?),
        "import" => Command::Import(PathBuf::from(arg(0)?)),
        "export" => Command::Export,
        "columns" => Command::Columns,
        "hide" if cli.all => Command::HideAll,
        "show" if cli.all => Command::ShowAll,
        "hide" => Command::Hide(arg(0)?),
        "show" => Command::Show(arg(0)?),
        "move" => Command::Move {
            source: arg(0)?,
            target: arg(1)?,
        },
        "add-column" => Command::AddColumn(rest.join(" ")),
        "remove-column" => Command::RemoveColumn(arg(0)?),
        "status" => Command::Status(parse_ids(rest)?),
        "delete" => Command::Delete(parse_ids(rest)?),
        "delete-all" => Command::DeleteAll,
        "stats" => Command::Stats,
        "help" => Command::Help,
        other => return Err(anyhow!("Unknown command '{}'", other)),
    };
    Ok(command)
}

fn print_help() {
    println!("{}", "TDM - gerenciador de massas de teste".bold());
    println!();
    println!("Usage: tdm [OPTIONS] [COMMAND]");
    println!();
    println!("Commands:");
    println!("  list [--page N] [--page-size N] [--filter key=value]...");
    println!("  view ID                      Show every field of a record");
    println!("  import FILE                  Import a delimited text file");
    println!("  export [--filter ...] [--out DIR]");
    println!("  columns [--search QUERY]     List columns and their visibility");
    println!("  hide KEY | hide --all");
    println!("  show KEY | show --all");
    println!("  move KEY TARGET              Move column KEY to TARGET's position");
    println!("  add-column NAME [--type text|number|date|tag]");
    println!("  remove-column KEY");
    println!("  status ID... --to STATUS     AVAILABLE, IN_USE or BLOCKED");
    println!("  delete ID...");
    println!("  delete-all");
    println!("  stats");
    println!();
    println!("Options:");
    println!("  --offline          Use local files instead of the API");
    println!("  --yes, -y          Answer yes to confirmations");
    println!("  --verbose, -v      Echo log lines to stderr");
    println!("  --generate-config  Write a commented config file and exit");
}

/// Confirmation read from stdin
struct PromptConfirmer {
    assume_yes: bool,
}

impl Confirmer for PromptConfirmer {
    fn confirm(&mut self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        print!("{} [s/N] ", prompt);
        let _ = io::stdout().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(
            answer.trim().to_lowercase().as_str(),
            "s" | "sim" | "y" | "yes"
        )
    }
}

fn apply_filters<R: RecordStore, S: SettingsStore>(
    session: &mut Session<R, S>,
    assignments: &[String],
) -> Result<()> {
    let mut filters = FilterSet::new();
    for assignment in assignments {
        filters.parse_assignment(assignment)?;
    }
    for (key, value) in filters.iter() {
        session.dispatch(Action::SetFilter {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

fn select<R: RecordStore, S: SettingsStore>(session: &mut Session<R, S>, ids: &[RecordId]) {
    if !session.state().selection_mode {
        session.dispatch(Action::ToggleSelectionMode);
    }
    for &id in ids {
        if !session.state().selection.contains(id) {
            session.dispatch(Action::ToggleRowSelection(id));
        }
    }
}

/// Run one command. Returns false when an error notice was raised.
fn run<R: RecordStore, S: SettingsStore>(
    mut session: Session<R, S>,
    command: Command,
    cli: &CliArgs,
    use_colors: bool,
) -> Result<bool> {
    let mut confirmer = PromptConfirmer {
        assume_yes: cli.yes,
    };

    session.load();
    apply_filters(&mut session, &cli.filters)?;

    match command {
        Command::Help => print_help(),
        Command::List => {
            if let Some(size) = cli.page_size {
                session.dispatch(Action::SetPageSize(size));
            }
            if let Some(page) = cli.page {
                session.dispatch(Action::GoToPage(page));
            }
            if let Some(line) = render_filters(&session.state().filters) {
                println!("{}", line);
            }
            println!(
                "{}",
                render_table(&TableModel::build(session.state()), use_colors)
            );
        }
        Command::View(id) => match session.state().record(id) {
            Some(record) => println!("{}", render_record_details(record)),
            None => return Err(anyhow!("Massa #{} not found", id)),
        },
        Command::Import(path) => {
            session.import_file(&path);
        }
        Command::Export => {
            let dir = cli.out.clone().unwrap_or_else(AppPaths::export_dir);
            session.export_csv(&dir);
        }
        Command::Columns => {
            let settings = &session.state().settings;
            let entries = settings.column_list();
            let entries = match &cli.search {
                Some(query) => search_column_list(&entries, query),
                None => entries,
            };
            println!(
                "{}",
                render_column_list(&entries, &settings.visibility_summary())
            );
        }
        Command::Hide(key) => {
            if !session.state().settings.is_hidden(&key) {
                session.dispatch(Action::ToggleColumnVisibility(key));
            }
        }
        Command::Show(key) => {
            if session.state().settings.is_hidden(&key) {
                session.dispatch(Action::ToggleColumnVisibility(key));
            }
        }
        Command::HideAll => session.dispatch(Action::HideAllColumns),
        Command::ShowAll => session.dispatch(Action::ShowAllColumns),
        Command::Move { source, target } => {
            session.dispatch(Action::MoveColumn { source, target })
        }
        Command::AddColumn(name) => {
            let value_type = match cli.value_type.as_deref() {
                Some(raw) => CustomValueType::parse(raw)
                    .ok_or_else(|| anyhow!("Unknown column type '{}'", raw))?,
                None => CustomValueType::Text,
            };
            session.dispatch(Action::AddCustomColumn { name, value_type });
        }
        Command::RemoveColumn(key) => {
            if confirmer.confirm(
                "Tem certeza? Os dados dessa coluna não serão apagados do banco, mas ela deixará de aparecer.",
            ) {
                session.dispatch(Action::RemoveCustomColumn(key));
            }
        }
        Command::Status(ids) => {
            let raw = cli
                .to
                .as_deref()
                .ok_or_else(|| anyhow!("status requires --to STATUS"))?;
            let status =
                RecordStatus::parse(raw).ok_or_else(|| anyhow!("Unknown status '{}'", raw))?;
            select(&mut session, &ids);
            let prompt = format!(
                "Alterar {} item(s) para \"{}\"?",
                session.state().selection.len(),
                status.label()
            );
            if confirmer.confirm(&prompt) {
                session.bulk_change_status(status);
            }
        }
        Command::Delete(ids) => {
            select(&mut session, &ids);
            let prompt = format!(
                "Excluir permanentemente {} item(s)?",
                session.state().selection.len()
            );
            if confirmer.confirm(&prompt) {
                session.bulk_delete();
            }
        }
        Command::DeleteAll => {
            session.delete_all(&mut confirmer);
        }
        Command::Stats => println!("{}", render_dashboard(&session.dashboard())),
    }

    let notices = session.take_notices();
    for notice in &notices {
        println!("{}", render_notice(notice, use_colors));
    }
    Ok(!notices.iter().any(|n| n.level == NoticeLevel::Error))
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{}", e);
            print_help();
            std::process::exit(2);
        }
    };

    if cli.generate_config {
        let path = Config::get_config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, Config::create_default_with_comments())?;
        println!("Configuration file created at: {:?}", path);
        return Ok(());
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config, using defaults: {:#}", e);
            Config::default()
        }
    };

    if let Err(e) = init_tracing(&config.logging, cli.verbose) {
        eprintln!("Logging disabled: {:#}", e);
    }

    let command = parse_command(&cli)?;
    let page_size = config.display.page_size;
    let import_options = config.import.options();
    let use_colors = config.display.use_colors;

    let ok = if cli.offline {
        let session = Session::new(
            FileRecordStore::new(AppPaths::records_file()?),
            FileSettingsStore::new(AppPaths::settings_file()?),
            page_size,
            import_options,
        );
        run(session, command, &cli, use_colors)?
    } else {
        let client = ApiClient::new(&config.api.base_url);
        let session = Session::new(client.clone(), client, page_size, import_options);
        run(session, command, &cli, use_colors)?
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
