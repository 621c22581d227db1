use crate::app::App;
use crate::geo::parse_bounds_attr;
use crate::map::{fit, TerminalScene, Viewport};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

/// Render the UI: map block, inset panels, hover popup, status bar.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_map(frame, app, chunks[0]);
    if app.controller.inset_visible() {
        render_insets(frame, app);
    }
    render_popup(frame, app);
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Town Halls ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let scene = app
        .controller
        .surface()
        .render(inner.width as usize, inner.height as usize);

    let marker_colors: Vec<(String, Color)> = app
        .controller
        .colors()
        .entries()
        .iter()
        .map(|e| (e.icon.clone(), hex_color(&e.color)))
        .collect();

    frame.render_widget(
        MapWidget {
            scene,
            marker_colors,
        },
        inner,
    );
}

/// Braille map layers with marker glyphs overlaid.
struct MapWidget {
    scene: TerminalScene,
    marker_colors: Vec<(String, Color)>,
}

impl MapWidget {
    fn render_canvas(
        canvas: &crate::braille::BrailleCanvas,
        color: Color,
        area: Rect,
        buf: &mut Buffer,
    ) {
        for cy in 0..canvas.height().min(area.height as usize) {
            for cx in 0..canvas.width().min(area.width as usize) {
                if let Some(ch) = canvas.cell_char(cx, cy) {
                    let x = area.x + cx as u16;
                    let y = area.y + cy as u16;
                    buf[(x, y)].set_char(ch).set_fg(color);
                }
            }
        }
    }

    fn marker_color(&self, icon: &str) -> Color {
        self.marker_colors
            .iter()
            .find(|(name, _)| name == icon)
            .map(|(_, color)| *color)
            .unwrap_or(Color::White)
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front: plain boundaries, active states, highlights.
        Self::render_canvas(&self.scene.boundaries, Color::DarkGray, area, buf);
        Self::render_canvas(&self.scene.active, Color::Magenta, area, buf);
        Self::render_canvas(&self.scene.highlight, Color::Yellow, area, buf);

        for marker in &self.scene.markers {
            if marker.col >= area.width || marker.row >= area.height {
                continue;
            }
            let x = area.x + marker.col;
            let y = area.y + marker.row;
            let (glyph, modifier) = if marker.selected {
                ('◉', Modifier::BOLD)
            } else {
                ('●', Modifier::empty())
            };
            buf[(x, y)]
                .set_char(glyph)
                .set_style(
                    Style::default()
                        .fg(self.marker_color(&marker.icon))
                        .add_modifier(modifier),
                );
        }
    }
}

/// Screen rectangles of the AK/HI inset panels, anchored to the lower
/// left of the map block.
pub fn inset_rects(term_width: u16, term_height: u16) -> [Rect; 2] {
    let width: u16 = 20;
    let height: u16 = 7;
    let x = 2.min(term_width.saturating_sub(width));
    let bottom = term_height.saturating_sub(2); // border + status bar
    let hawaii_y = bottom.saturating_sub(height);
    let alaska_y = hawaii_y.saturating_sub(height);
    [
        Rect::new(x, alaska_y, width, height),
        Rect::new(x, hawaii_y, width, height),
    ]
}

fn render_insets(frame: &mut Frame, app: &App) {
    let rects = inset_rects(app.term_size.0, app.term_size.1);
    for (inset, rect) in app.insets.iter().zip(rects) {
        let items = match inset.state {
            "AK" => app.controller.alaska_items(),
            _ => app.controller.hawaii_items(),
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                format!(" {} ({}) ", inset.state, items.len()),
                Style::default().fg(Color::Cyan),
            ));
        let inner = block.inner(rect);
        frame.render_widget(Clear, rect);
        frame.render_widget(block, rect);

        let Some(bounds) = parse_bounds_attr(&inset.bounds_attr) else {
            continue;
        };
        let pixel_width = inner.width as usize * 2;
        let pixel_height = inner.height as usize * 4;
        let (center, zoom) = fit(bounds, pixel_width as f64, pixel_height as f64);
        let viewport = Viewport::new(center.lon, center.lat, zoom, pixel_width, pixel_height);

        let mut canvas = crate::braille::BrailleCanvas::new(
            inner.width as usize,
            inner.height as usize,
        );
        for item in items {
            let (Some(lat), Some(lng)) = (item.lat, item.lng) else {
                continue;
            };
            let (px, py) = viewport.project(lng, lat);
            canvas.set_pixel_signed(px, py);
        }

        for cy in 0..canvas.height().min(inner.height as usize) {
            for cx in 0..canvas.width().min(inner.width as usize) {
                if let Some(ch) = canvas.cell_char(cx, cy) {
                    if let Some(cell) = frame
                        .buffer_mut()
                        .cell_mut((inner.x + cx as u16, inner.y + cy as u16))
                    {
                        cell.set_char(ch).set_fg(Color::Yellow);
                    }
                }
            }
        }
    }
}

fn render_popup(frame: &mut Frame, app: &App) {
    let Some(feature) = app.hovered_feature() else {
        return;
    };
    let Some((col, row)) = app.mouse_pos else {
        return;
    };

    let prop = |key: &str| {
        feature
            .properties
            .as_ref()
            .and_then(|p| p.get(key))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };

    let title = prop("title");
    let starts_at = prop("startsAt");
    let venue = prop("venue");

    let mut lines = vec![Line::from(Span::styled(
        title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    if !starts_at.is_empty() {
        lines.push(Line::from(starts_at));
    }
    if !venue.is_empty() {
        lines.push(Line::from(venue));
    }

    let width = (title.chars().count().max(16) as u16 + 4).min(40);
    let height = lines.len() as u16 + 2;
    let area = frame.area();
    let x = (col + 2).min(area.width.saturating_sub(width));
    let y = row.saturating_sub(height).max(1);
    let rect = Rect::new(x, y, width.min(area.width), height.min(area.height));

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        ),
        rect,
    );
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mode = match app.search_mode {
        crate::map::SearchMode::Proximity => "proximity",
        crate::map::SearchMode::District => "district",
    };

    let status = Line::from(vec![
        Span::styled(" Mode: ", Style::default().fg(Color::DarkGray)),
        Span::styled(mode, Style::default().fg(Color::Green)),
        Span::styled(" | Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{} events", app.items.len()),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(
            " | hjkl:pan +/-:zoom m:mode r:reset q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}

/// Parse a `#rrggbb` display color; anything else falls back to white.
pub fn hex_color(hex: &str) -> Color {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Color::White;
    }
    match (
        u8::from_str_radix(&hex[0..2], 16),
        u8::from_str_radix(&hex[2..4], 16),
        u8::from_str_radix(&hex[4..6], 16),
    ) {
        (Ok(r), Ok(g), Ok(b)) => Color::Rgb(r, g, b),
        _ => Color::White,
    }
}
