use anyhow::Result;
use apidocs_config::Config;
use apidocs_engine::{
    ChatOutcome, FileStore, GenerationError, NamedDocument, OutlineNode, PatchOrigin,
    ProjectContext, ProjectError, ProjectId, ProjectOptions,
};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::{
    env, fs,
    io::{self, Stdout, stdout},
    path::{Path, PathBuf},
    process,
    sync::Arc,
};

const USAGE: &str =
    "[--ingest <file> | --apply <file>] [--save-config] <project-id> [store-path]";

#[derive(Debug, PartialEq)]
enum Mode {
    Browse,
    /// Commit a model generation response read from a file (`-` for stdin)
    Ingest(PathBuf),
    /// Apply a chat message read from a file (`-` for stdin)
    Apply(PathBuf),
}

#[derive(Debug, PartialEq)]
struct Args {
    project: String,
    store_path: Option<PathBuf>,
    mode: Mode,
    /// Remember the given store path in the config file
    save_config: bool,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut mode = Mode::Browse;
    let mut save_config = false;
    let mut positional = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--ingest" | "--apply" => {
                if mode != Mode::Browse {
                    return Err("--ingest and --apply are mutually exclusive".to_string());
                }
                let file = iter
                    .next()
                    .ok_or_else(|| format!("{arg} needs a file argument"))?;
                mode = if arg == "--ingest" {
                    Mode::Ingest(PathBuf::from(file))
                } else {
                    Mode::Apply(PathBuf::from(file))
                };
            }
            "--save-config" => save_config = true,
            flag if flag.starts_with("--") => return Err(format!("Unknown option {flag}")),
            value => positional.push(value),
        }
    }

    match positional.as_slice() {
        [_] if save_config => Err("--save-config needs a store path".to_string()),
        [project] => Ok(Args {
            project: project.to_string(),
            store_path: None,
            mode,
            save_config,
        }),
        [project, store_path] => Ok(Args {
            project: project.to_string(),
            store_path: Some(PathBuf::from(store_path)),
            mode,
            save_config,
        }),
        _ => Err("Expected a project id and an optional store path".to_string()),
    }
}

/// One line of the outline panel
#[derive(Debug, Clone, PartialEq)]
struct OutlineRow {
    depth: usize,
    title: String,
    file_index: usize,
}

fn flatten_outline(outline: &[OutlineNode]) -> Vec<OutlineRow> {
    outline
        .iter()
        .enumerate()
        .flat_map(|(file_index, section)| {
            section.walk().into_iter().map(move |(depth, node)| OutlineRow {
                depth,
                title: node.title.clone(),
                file_index,
            })
        })
        .collect()
}

struct App {
    ctx: ProjectContext,
    documents: Vec<NamedDocument>,
    rows: Vec<OutlineRow>,
    outline_state: ListState,
    status: String,
}

impl App {
    fn new(ctx: ProjectContext) -> Self {
        let mut app = Self {
            ctx,
            documents: Vec::new(),
            rows: Vec::new(),
            outline_state: ListState::default(),
            status: String::new(),
        };
        app.refresh();
        app
    }

    /// Rebuild panels from the version the history cursor points at
    fn refresh(&mut self) {
        self.documents = self.ctx.documents();
        self.rows = flatten_outline(&self.ctx.outline());
        self.outline_state
            .select(if self.rows.is_empty() { None } else { Some(0) });

        let history = self.ctx.history();
        self.status = match history.current() {
            Some(snapshot) => format!(
                "Version {}/{} from {}{}",
                history.len() - history.current_index(),
                history.len(),
                snapshot.created_at.format("%Y-%m-%d %H:%M:%S"),
                if history.is_viewing_latest() {
                    ""
                } else {
                    " (viewing, r to restore)"
                }
            ),
            None => "No versions yet".to_string(),
        };
    }

    fn next_row(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.outline_state.selected() {
            Some(i) => (i + 1) % self.rows.len(),
            None => 0,
        };
        self.outline_state.select(Some(i));
    }

    fn previous_row(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.outline_state.selected() {
            Some(0) | None => self.rows.len() - 1,
            Some(i) => i - 1,
        };
        self.outline_state.select(Some(i));
    }

    fn view_older(&mut self) {
        let index = self.ctx.history().current_index() + 1;
        if index < self.ctx.history().len() {
            self.view(index);
        }
    }

    fn view_newer(&mut self) {
        let index = self.ctx.history().current_index();
        if index > 0 {
            self.view(index - 1);
        }
    }

    fn view(&mut self, index: usize) {
        match self.ctx.view(index) {
            Ok(_) => self.refresh(),
            Err(e) => self.status = format!("Error: {e}"),
        }
    }

    fn restore_viewed(&mut self) {
        if self.ctx.history().is_viewing_latest() {
            return;
        }
        let index = self.ctx.history().current_index();
        match self.ctx.restore(index) {
            Ok(_) => self.refresh(),
            Err(e) => self.status = format!("Error: {e}"),
        }
    }

    fn selected_document(&self) -> Option<&NamedDocument> {
        let row = self.rows.get(self.outline_state.selected()?)?;
        self.documents.get(row.file_index)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("apidocs-cli");
    let config_path = Config::config_path();

    let parsed = match parse_args(args.get(1..).unwrap_or_default()) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Usage: {program} {USAGE}");
            process::exit(1);
        }
    };

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    // Store path from CLI args, otherwise from the config file
    let store_path = match (&parsed.store_path, &config) {
        (Some(path), _) => path.clone(),
        (None, Some(config)) => config.store_path.clone(),
        (None, None) => {
            eprintln!("Error: No store path provided and no config file found");
            eprintln!("Usage: {program} {USAGE}");
            eprintln!("Or create a config file at {}", config_path.display());
            process::exit(1);
        }
    };
    let options = config
        .as_ref()
        .map(Config::project_options)
        .unwrap_or_default();

    if parsed.save_config {
        let remembered = remembered_config(config, std::path::absolute(&store_path)?);
        remembered.save()?;
        println!("Saved store path to {}", config_path.display());
    }

    let project = match ProjectId::new(parsed.project.as_str()) {
        Ok(project) => project,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let ctx = open_project(project, store_path, options)?;

    match parsed.mode {
        Mode::Browse => browse(ctx),
        Mode::Ingest(file) => ingest(ctx, &read_input(&file)?),
        Mode::Apply(file) => apply_message(ctx, &read_input(&file)?),
    }
}

/// Config pointing at `store_path`, keeping any other settings already saved
fn remembered_config(existing: Option<Config>, store_path: PathBuf) -> Config {
    match existing {
        Some(mut config) => {
            config.store_path = store_path;
            config
        }
        None => Config::new(store_path),
    }
}

fn open_project(
    project: ProjectId,
    store_path: PathBuf,
    options: ProjectOptions,
) -> Result<ProjectContext> {
    log::info!("Opening {project} in {}", store_path.display());
    let store = Arc::new(FileStore::new(store_path));
    Ok(ProjectContext::open(project, store, options)?)
}

fn read_input(file: &Path) -> Result<String> {
    if file.as_os_str() == "-" {
        Ok(io::read_to_string(io::stdin())?)
    } else {
        Ok(fs::read_to_string(file)?)
    }
}

fn ingest(mut ctx: ProjectContext, raw_output: &str) -> Result<()> {
    match ctx.ingest_generation(raw_output) {
        Ok(snapshot) => {
            println!("Saved version {} of {}", snapshot.id, ctx.id());
            print_outline(&ctx.outline());
            Ok(())
        }
        Err(ProjectError::Generation(e)) => {
            eprintln!("Could not understand the AI's response: {e}");
            if let GenerationError::Recovery(recovery) = &e {
                log::debug!("Parse error detail: {:?}", recovery.source);
            }
            process::exit(2);
        }
        Err(e) => Err(e.into()),
    }
}

fn apply_message(mut ctx: ProjectContext, message: &str) -> Result<()> {
    match ctx.apply_chat_message(message)? {
        ChatOutcome::NoEdit => println!("No edit was requested"),
        ChatOutcome::Applied {
            operation,
            origin,
            snapshot_id,
        } => {
            let how = match origin {
                PatchOrigin::Marker => "patch markers",
                PatchOrigin::Heuristic => "best-effort guess",
            };
            println!("Applied {operation} ({how}) as version {snapshot_id}");
        }
    }
    Ok(())
}

fn print_outline(outline: &[OutlineNode]) {
    for row in flatten_outline(outline) {
        println!("{}{}", "  ".repeat(row.depth), row.title);
    }
}

fn browse(ctx: ProjectContext) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(ctx);

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next_row(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_row(),
                KeyCode::Char('[') => app.view_older(),
                KeyCode::Char(']') => app.view_newer(),
                KeyCode::Char('r') => app.restore_viewed(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(f.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
        .split(rows[0]);

    // Outline panel
    let outline_items: Vec<ListItem> = app
        .rows
        .iter()
        .map(|row| {
            let indent = "  ".repeat(row.depth);
            let icon = if row.depth == 0 { "📄 " } else { "§ " };
            ListItem::new(vec![Line::from(vec![Span::raw(format!(
                "{indent}{icon}{}",
                row.title
            ))])])
        })
        .collect();

    let outline_list = List::new(outline_items)
        .block(Block::default().borders(Borders::ALL).title("Outline"))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_stateful_widget(outline_list, chunks[0], &mut app.outline_state);

    // Content panel
    let (title, content_text): (String, Vec<Line>) = match app.selected_document() {
        Some(document) => (
            document.filename.clone(),
            document
                .content
                .lines()
                .map(|line| Line::from(vec![Span::raw(line.to_string())]))
                .collect(),
        ),
        None => (
            "Content".to_string(),
            vec![Line::from("This project has no documents yet")],
        ),
    };

    let content = Paragraph::new(content_text)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(ratatui::widgets::Wrap { trim: false });

    f.render_widget(content, chunks[1]);

    // Status and key help at the bottom
    let help = Paragraph::new(vec![
        Line::from(Span::raw(app.status.clone())),
        Line::from(vec![
            Span::raw("q: Quit | "),
            Span::raw("↑/k ↓/j: Move | "),
            Span::raw("[: Older | ]: Newer | r: Restore viewed version"),
        ]),
    ])
    .block(Block::default());

    f.render_widget(help, rows[1]);
}
