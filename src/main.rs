use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::path::Path;
use std::time::Duration;
use townhall_map::app::App;
use townhall_map::{data, events, ui};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    // Fetch the event list before entering the TUI; Ctrl-C while the
    // request is in flight aborts it instead of leaving it pending.
    let client = reqwest::Client::new();
    let (fetch, abort_handle) = events::abortable_fetch(&client);
    let items = tokio::select! {
        outcome = fetch => match outcome {
            Ok(result) => result?,
            Err(_aborted) => return Ok(()),
        },
        _ = tokio::signal::ctrl_c() => {
            abort_handle.abort();
            info!("Fetch aborted, exiting");
            return Ok(());
        }
    };

    let boundaries = data::load_boundaries(Path::new("data"), &items);

    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, items, boundaries);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Mouse handling: hover tracking, wheel zoom, drag to pan, click to select.
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_in(),
        MouseEventKind::ScrollDown => app.zoom_out(),
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
            app.drag_moved = false;
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            if !app.drag_moved {
                app.handle_click(mouse.column, mouse.row);
            }
            app.end_drag();
        }
        _ => {}
    }
}

fn run(
    terminal: &mut DefaultTerminal,
    items: Vec<events::EventRecord>,
    boundaries: data::BoundarySet,
) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(size.width, size.height, items, boundaries);

    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        // ~60fps event poll
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                            // Pan with hjkl or arrow keys
                            KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                            KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                            KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                            KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                            // Zoom
                            KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                            KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                            // Search mode for click handling
                            KeyCode::Char('m') | KeyCode::Char('M') => app.toggle_search_mode(),

                            // Clear selections and highlights
                            KeyCode::Char('r') | KeyCode::Char('0') => app.reset(),

                            _ => {}
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    handle_mouse(&mut app, mouse);
                }
                Event::Resize(width, height) => {
                    app.resize(width, height);
                }
                _ => {}
            }
        }

        app.drain_notifications();

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
