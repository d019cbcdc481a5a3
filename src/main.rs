mod api;
mod app;
mod config;
mod dataset;
mod debounce;
mod state;
mod theme;
mod ui;

use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;

use api::FeedClient;
use app::{App, InputMode};
use config::Config;

#[derive(Parser)]
#[command(
    name = "screener",
    about = "Terminal viewer for a remote table of per-company financial metrics"
)]
struct Args {
    /// Alternate config file path
    #[arg(long)]
    config: Option<std::path::PathBuf>,
    /// Override the configured data endpoint URL
    #[arg(long)]
    url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::load(args.config)?;
    if let Some(url) = args.url {
        config.endpoint_url = url;
    }
    if config.endpoint_url.is_empty() {
        anyhow::bail!(
            "no data endpoint configured; set endpoint_url in the config file or pass --url"
        );
    }

    let mut app = App::new(config);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        let msg = format!("Fatal: {}", e);
        app::log_error(&msg);
        eprintln!("Error: {}", e);
    }

    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    // The one network request of the session, awaited behind a loading
    // frame. Nothing can trigger another fetch afterwards.
    terminal.draw(|f| ui::draw(f, &mut *app))?;
    let client = FeedClient::new(&app.cfg.endpoint_url)?;
    match client.fetch_dataset().await {
        Ok(mut dataset) => {
            let cfg = app.cfg.clone();
            dataset.normalize(|c| cfg.column_kind(c));
            app.table.set_dataset(dataset);
            app.loading = false;
        }
        Err(e) => {
            app.loading = false;
            app.set_error(e.to_string());
        }
    }
    app.clamp_selection();

    let tick_rate = Duration::from_millis(100);

    loop {
        terminal.draw(|f| ui::draw(f, &mut *app))?;

        if app.quit {
            break;
        }

        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) => handle_key(app, key),
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                _ => {}
            }
        }

        app.pump_debounce(Instant::now());
    }

    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Filtering => match key.code {
            KeyCode::Esc => {
                app.input_mode = InputMode::Normal;
                app.filter_buf.clear();
                app.apply_search_now();
            }
            KeyCode::Enter => {
                app.input_mode = InputMode::Normal;
                app.apply_search_now();
            }
            KeyCode::Backspace => {
                app.filter_buf.pop();
                app.filter_keystroke(Instant::now());
            }
            KeyCode::Char(c) => {
                app.filter_buf.push(c);
                app.filter_keystroke(Instant::now());
            }
            _ => {}
        },
        InputMode::Normal => match key.code {
            KeyCode::Char('q') => app.quit = true,
            KeyCode::Esc => {
                let focused_open = app
                    .focused_panel_key()
                    .filter(|k| app.open_panels.contains(k));
                if let Some(key) = focused_open {
                    app.toggle_panel(key);
                } else if !app.open_panels.is_empty() {
                    app.close_all_panels();
                } else {
                    app.quit = true;
                }
            }
            KeyCode::Char('j') | KeyCode::Down => app.move_row(1),
            KeyCode::Char('k') | KeyCode::Up => app.move_row(-1),
            KeyCode::Char('h') | KeyCode::Left => app.move_col(-1),
            KeyCode::Char('l') | KeyCode::Right => app.move_col(1),
            KeyCode::Char('g') => app.jump_row(false),
            KeyCode::Char('G') => app.jump_row(true),
            KeyCode::PageDown => app.move_row(app.page_height as isize),
            KeyCode::PageUp => app.move_row(-(app.page_height as isize)),
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                app.move_row(app.page_height as isize);
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                app.move_row(-(app.page_height as isize));
            }
            KeyCode::Tab => app.cycle_view(),
            KeyCode::Char(c @ '1'..='9') => {
                app.select_view_index(c as usize - '1' as usize);
            }
            KeyCode::Char('/') => {
                app.input_mode = InputMode::Filtering;
            }
            KeyCode::Char('s') => {
                if let Some(column) = app.cursor_column() {
                    app.request_sort(column, Instant::now());
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => app.toggle_focused_panel(),
            _ => {}
        },
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if !matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) {
        return;
    }
    let (x, y) = (mouse.column, mouse.row);

    // Panels draw on top; a click inside one is not an outside click.
    if hit_region(&app.regions.panels, x, y).is_some() {
        return;
    }
    if let Some(name) = hit_region(&app.regions.view_tabs, x, y) {
        app.select_view(&name);
        return;
    }
    if let Some(column) = hit_region(&app.regions.header_cells, x, y) {
        app.request_sort(column, Instant::now());
        return;
    }
    if let Some(key) = hit_region(&app.regions.info_cells, x, y) {
        app.toggle_panel(key);
        return;
    }
    // A click anywhere else closes every open panel at once.
    app.close_all_panels();
}

fn hit_region<T: Clone>(regions: &[(Rect, T)], x: u16, y: u16) -> Option<T> {
    regions
        .iter()
        .find(|(r, _)| x >= r.x && x < r.x + r.width && y >= r.y && y < r.y + r.height)
        .map(|(_, v)| v.clone())
}
