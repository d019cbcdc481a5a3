use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::{App, InputMode};
use crate::dataset::{Cell as Datum, ColumnKind};
use crate::state::SortDirection;
use crate::theme::Theme;

const INFO_ICON: &str = "\u{24d8}"; // ⓘ

pub fn draw(f: &mut Frame, app: &mut App) {
    app.regions.clear();

    let bg_block = Block::default().style(Style::default().bg(app.theme.bg));
    f.render_widget(bg_block, f.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // top bar
            Constraint::Min(5),   // table
            Constraint::Length(1), // bottom bar
        ])
        .split(f.area());

    draw_top_bar(f, app, chunks[0]);
    draw_main(f, app, chunks[1]);
    draw_bottom_bar(f, app, chunks[2]);
    draw_panels(f, app);
}

// -- Top bar: title + view selector --

fn draw_top_bar(f: &mut Frame, app: &mut App, area: Rect) {
    let t = app.theme.clone();
    let mut spans: Vec<Span> = Vec::new();
    let mut x = area.x;

    let title = " screener ";
    spans.push(Span::styled(
        title,
        Style::default().fg(t.title).add_modifier(Modifier::BOLD),
    ));
    x += title.chars().count() as u16;

    let names: Vec<String> = app.cfg.view_names().iter().map(|n| n.to_string()).collect();
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            let sep = " \u{b7} ";
            spans.push(Span::styled(sep, Style::default().fg(t.muted)));
            x += sep.chars().count() as u16;
        } else {
            let sep = " ";
            spans.push(Span::raw(sep));
            x += 1;
        }
        let style = if *name == app.table.view() {
            Style::default().fg(t.title).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(t.muted)
        };
        spans.push(Span::styled(name.clone(), style));
        let w = name.chars().count() as u16;
        app.regions
            .view_tabs
            .push((Rect::new(x, area.y, w, 1), name.clone()));
        x += w;
    }

    if app.loading {
        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let info = "loading...";
        let pad = (area.width as usize).saturating_sub(used + info.len() + 1);
        if pad > 0 {
            spans.push(Span::raw(" ".repeat(pad)));
        }
        spans.push(Span::styled(info, Style::default().fg(t.muted)));
    }

    let bar = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(t.frame)),
    );
    f.render_widget(bar, area);
}

// -- Main table --

fn sort_indicator(app: &App, column: &str) -> &'static str {
    match app.table.sort() {
        Some(sort) if sort.column == column => match sort.direction {
            SortDirection::Ascending => " \u{25b4}",
            SortDirection::Descending => " \u{25be}",
        },
        _ => "",
    }
}

fn draw_main(f: &mut Frame, app: &mut App, area: Rect) {
    let t = app.theme.clone();

    if app.loading && app.table.dataset().rows.is_empty() {
        let loading =
            Paragraph::new("  Fetching data...").style(Style::default().fg(t.muted));
        f.render_widget(loading, area);
        return;
    }

    if app.table.dataset().rows.is_empty() {
        if let Some(ref err) = app.error {
            let msg = Paragraph::new(format!("  Error: {}", err))
                .style(Style::default().fg(t.error))
                .wrap(Wrap { trim: false });
            f.render_widget(msg, area);
        } else {
            let p = Paragraph::new("  No data.").style(Style::default().fg(t.muted));
            f.render_widget(p, area);
        }
        return;
    }

    let visible_cols = app.table.visible_columns();
    if visible_cols.is_empty() {
        let p = Paragraph::new("  This view matches none of the fetched columns.")
            .style(Style::default().fg(t.muted));
        f.render_widget(p, area);
        return;
    }

    app.page_height = (area.height.saturating_sub(1) as usize).max(1);

    if app.table.display_len() == 0 {
        let msg = if !app.table.search().is_empty() {
            "  No matches for filter."
        } else {
            "  No data."
        };
        let p = Paragraph::new(msg).style(Style::default().fg(t.muted));
        f.render_widget(p, area);
        return;
    }

    let columns = app.table.dataset().columns.clone();
    let kinds: Vec<ColumnKind> = visible_cols
        .iter()
        .map(|&c| app.table.column_kind(c))
        .collect();
    let widths: Vec<Constraint> = visible_cols
        .iter()
        .zip(&kinds)
        .map(|(&c, kind)| Constraint::Length(column_width(&columns[c], *kind)))
        .collect();

    // Click regions assume fixed Length widths; col_x mirrors the table
    // layout and breaks if a width becomes flexible.
    let mut col_x: Vec<(u16, u16)> = Vec::with_capacity(visible_cols.len());
    let mut x = area.x;
    for w in &widths {
        let w = match w {
            Constraint::Length(w) => *w,
            _ => 0,
        };
        col_x.push((x, w));
        x = x.saturating_add(w + 1);
    }

    let header_cells: Vec<Cell> = visible_cols
        .iter()
        .enumerate()
        .map(|(pos, &c)| {
            let label = format!("{}{}", columns[c], sort_indicator(app, &columns[c]));
            let mut style = Style::default().fg(t.muted);
            if pos == app.col_cursor {
                style = Style::default()
                    .fg(t.title)
                    .add_modifier(Modifier::UNDERLINED);
            }
            Cell::from(label).style(style)
        })
        .collect();
    for (pos, &c) in visible_cols.iter().enumerate() {
        let (cx, cw) = col_x[pos];
        if cx >= area.x + area.width {
            break;
        }
        app.regions
            .header_cells
            .push((Rect::new(cx, area.y, cw, 1), columns[c].clone()));
    }
    let header = Row::new(header_cells).height(1);

    let primary_info = app.cfg.primary_info_column().map(|s| s.to_string());
    let primary_idx = primary_info
        .as_ref()
        .and_then(|name| app.table.dataset().column_index(name));

    // (screen position, dataset row index) for the visible window.
    let window: Vec<(usize, usize)> = app
        .table
        .display_rows()
        .iter()
        .copied()
        .enumerate()
        .skip(app.scroll_offset)
        .take(app.page_height)
        .collect();

    for &(pos, row) in &window {
        let y = area.y + 1 + (pos - app.scroll_offset) as u16;
        for (cpos, &c) in visible_cols.iter().enumerate() {
            let name = &columns[c];
            let first_with_info = cpos == 0
                && primary_idx
                    .map(|pi| !app.table.dataset().rows[row][pi].is_empty())
                    .unwrap_or(false);
            let key = if app.cfg.is_info_column(name) {
                Some((row, name.clone()))
            } else if first_with_info {
                primary_info.clone().map(|p| (row, p))
            } else {
                None
            };
            if let Some(key) = key {
                let (cx, cw) = col_x[cpos];
                app.regions.info_cells.push((Rect::new(cx, y, cw, 1), key));
            }
        }
    }

    let rows: Vec<Row> = window
        .iter()
        .map(|&(screen_pos, row)| {
            let cells: Vec<Cell> = visible_cols
                .iter()
                .enumerate()
                .map(|(cpos, &c)| {
                    let name = &columns[c];
                    let kind = kinds[cpos];
                    let datum = &app.table.dataset().rows[row][c];
                    if app.cfg.is_info_column(name) {
                        return Cell::from(INFO_ICON).style(Style::default().fg(t.accent));
                    }
                    let mut text = format_cell(kind, datum);
                    if cpos == 0 {
                        let has_info = primary_idx
                            .map(|pi| !app.table.dataset().rows[row][pi].is_empty())
                            .unwrap_or(false);
                        if has_info {
                            text.push(' ');
                            text.push_str(INFO_ICON);
                        }
                    }
                    let classes = cell_classes(name, kind, cpos == 0, datum);
                    Cell::from(text).style(class_style(&t, &classes))
                })
                .collect();

            let style = if screen_pos == app.selected {
                Style::default().bg(t.sel_bg).fg(t.sel_fg)
            } else {
                Style::default().bg(t.bg)
            };
            Row::new(cells).style(style)
        })
        .collect();

    let table = Table::new(rows, &widths)
        .header(header)
        .block(Block::default().borders(Borders::NONE))
        .column_spacing(1);

    f.render_widget(table, area);
}

fn column_width(name: &str, kind: ColumnKind) -> u16 {
    match kind {
        ColumnKind::MarketCap | ColumnKind::Change => 10,
        ColumnKind::Text => {
            if name == "Company Name" {
                22
            } else {
                12
            }
        }
    }
}

// -- Bottom bar --

fn draw_bottom_bar(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;

    if app.input_mode == InputMode::Filtering {
        let n = app.table.display_len();
        let text = format!(" / {}_  ({} results)", app.filter_buf, n);
        let bar = Paragraph::new(text).style(Style::default().fg(t.input));
        f.render_widget(bar, area);
        return;
    }

    let hints = " j/k \u{2195} | h/l \u{2194} | Tab view | s sort | / filter | Enter info | q quit ";
    let mut spans = vec![Span::styled(hints, Style::default().fg(t.muted))];

    if !app.table.search().is_empty() {
        spans.push(Span::styled(
            format!(" [/{}]", app.table.search()),
            Style::default().fg(t.accent),
        ));
    }

    if let Some(ref err) = app.error {
        spans.push(Span::styled(
            format!(" \u{2502} {}", err),
            Style::default().fg(t.error),
        ));
    }

    let bar = Paragraph::new(Line::from(spans));
    f.render_widget(bar, area);
}

// -- Info panels --

fn draw_panels(f: &mut Frame, app: &mut App) {
    let open = app.open_panels.clone();
    if open.is_empty() {
        return;
    }
    let area = f.area();
    if area.width < 14 || area.height < 5 {
        return;
    }
    let t = app.theme.clone();

    for (i, key) in open.iter().enumerate() {
        let text = app.panel_text(key);
        let box_w = 46_u16.min(area.width.saturating_sub(4)).max(10);
        let lines = (text.chars().count() as u16 / box_w.saturating_sub(4).max(1)) + 1;
        let box_h = (lines + 2).clamp(3, area.height.saturating_sub(2).max(3));
        // Cascade later panels so every open one stays visible.
        let offset = (i as u16) * 2;
        let x = ((area.width.saturating_sub(box_w)) / 2).saturating_add(offset);
        let y = ((area.height.saturating_sub(box_h)) / 2).saturating_add(offset);
        let popup = Rect::new(
            x.min(area.width.saturating_sub(box_w)),
            y.min(area.height.saturating_sub(box_h)),
            box_w,
            box_h,
        );

        f.render_widget(Clear, popup);
        let block = Block::default()
            .title(format!(" {} ", key.1))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(t.accent));
        let inner = block.inner(popup);
        f.render_widget(block, popup);

        let body = Paragraph::new(text)
            .style(Style::default().fg(t.fg))
            .wrap(Wrap { trim: false });
        f.render_widget(body, inner);

        app.regions.panels.push((popup, key.clone()));
    }
}

// -- Cell formatting --

/// Styling classes a body cell carries; additive and independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellClass {
    Frozen,
    Symbol,
    CompanyName,
    PriceChangePositive,
    PriceChangeNegative,
}

pub fn cell_classes(name: &str, kind: ColumnKind, first: bool, datum: &Datum) -> Vec<CellClass> {
    let mut classes = Vec::new();
    if first {
        classes.push(CellClass::Frozen);
    }
    if name == "Symbol" {
        classes.push(CellClass::Symbol);
    }
    if name == "Company Name" {
        classes.push(CellClass::CompanyName);
    }
    if kind == ColumnKind::Change {
        // Zero counts as non-negative.
        if datum.as_number().unwrap_or(0.0) >= 0.0 {
            classes.push(CellClass::PriceChangePositive);
        } else {
            classes.push(CellClass::PriceChangeNegative);
        }
    }
    classes
}

fn class_style(t: &Theme, classes: &[CellClass]) -> Style {
    let mut style = Style::default().fg(t.fg);
    for class in classes {
        style = match class {
            CellClass::Frozen => style.add_modifier(Modifier::BOLD),
            CellClass::Symbol => style.fg(t.accent),
            CellClass::CompanyName => style.fg(t.fg),
            CellClass::PriceChangePositive => style.fg(t.up),
            CellClass::PriceChangeNegative => style.fg(t.down),
        };
    }
    style
}

pub fn format_cell(kind: ColumnKind, datum: &Datum) -> String {
    match kind {
        ColumnKind::MarketCap => match datum.as_number() {
            Some(n) => format_market_cap(n),
            None => "N/A".to_string(),
        },
        ColumnKind::Change => match datum.as_number() {
            Some(n) => format_change(n),
            None => "N/A".to_string(),
        },
        ColumnKind::Text => {
            if datum.is_empty() {
                "N/A".to_string()
            } else {
                sanitize(&datum.text())
            }
        }
    }
}

pub fn format_market_cap(v: f64) -> String {
    if v >= 1e12 {
        format!("{:.1}T", v / 1e12)
    } else if v >= 1e9 {
        format!("{:.1}B", v / 1e9)
    } else if v >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else {
        add_commas(&format!("{}", v))
    }
}

/// Values arrive as decimals, so display multiplies by 100.
pub fn format_change(v: f64) -> String {
    format!("{:.2}%", v * 100.0)
}

/// Control characters would corrupt the grid; they become spaces.
fn sanitize(s: &str) -> String {
    s.chars().map(|c| if c.is_control() { ' ' } else { c }).collect()
}

fn add_commas(s: &str) -> String {
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };
    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 && c != '-' {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let int_formatted: String = grouped.chars().rev().collect();
    match frac_part {
        Some(f) => format!("{}.{}", int_formatted, f),
        None => int_formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_cap_magnitude_boundaries() {
        assert_eq!(format_market_cap(2.0e12), "2.0T");
        assert_eq!(format_market_cap(1.0e12), "1.0T");
        assert_eq!(format_market_cap(5.0e9), "5.0B");
        assert_eq!(format_market_cap(1.0e9), "1.0B");
        assert_eq!(format_market_cap(999_999_999.0), "999,999,999");
        assert_eq!(format_market_cap(1.0e6), "1.0M");
        assert_eq!(format_market_cap(999_999.0), "999,999");
        assert_eq!(format_market_cap(0.0), "0");
    }

    #[test]
    fn sub_million_values_keep_fractions() {
        assert_eq!(format_market_cap(1234.5), "1,234.5");
    }

    #[test]
    fn change_display_multiplies_by_one_hundred() {
        // Stored values are decimals: 5.23 was parsed from "5.23" upstream
        // and renders with the same x100 chain the source applied.
        assert_eq!(format_change(5.23), "523.00%");
        assert_eq!(format_change(0.0523), "5.23%");
        assert_eq!(format_change(-0.004), "-0.40%");
    }

    #[test]
    fn non_numeric_cells_degrade_to_na() {
        assert_eq!(
            format_cell(ColumnKind::MarketCap, &Datum::Text("soon".into())),
            "N/A"
        );
        assert_eq!(format_cell(ColumnKind::Change, &Datum::Missing), "N/A");
        assert_eq!(format_cell(ColumnKind::Text, &Datum::Missing), "N/A");
        assert_eq!(format_cell(ColumnKind::Text, &Datum::Text("  ".into())), "N/A");
    }

    #[test]
    fn text_cells_strip_control_characters() {
        assert_eq!(
            format_cell(ColumnKind::Text, &Datum::Text("Alpha\x1b[31m Co\n".into())),
            "Alpha [31m Co "
        );
    }

    #[test]
    fn classes_accumulate_independently() {
        let classes = cell_classes("Symbol", ColumnKind::Text, true, &Datum::Text("AAA".into()));
        assert_eq!(classes, vec![CellClass::Frozen, CellClass::Symbol]);

        let classes = cell_classes(
            "1D Change",
            ColumnKind::Change,
            false,
            &Datum::Number(-0.4),
        );
        assert_eq!(classes, vec![CellClass::PriceChangeNegative]);

        // Zero is non-negative.
        let classes = cell_classes("YTD Change", ColumnKind::Change, false, &Datum::Number(0.0));
        assert_eq!(classes, vec![CellClass::PriceChangePositive]);

        // Market cap is numeric but never sign-colored.
        let classes = cell_classes(
            "Market Cap",
            ColumnKind::MarketCap,
            false,
            &Datum::Number(5.0e9),
        );
        assert!(classes.is_empty());
    }

    #[test]
    fn comma_grouping_handles_signs_and_fractions() {
        assert_eq!(add_commas("500000000"), "500,000,000");
        assert_eq!(add_commas("-1234567"), "-1,234,567");
        assert_eq!(add_commas("12"), "12");
    }

    #[test]
    fn formats_a_decoded_feed_end_to_end() {
        let cfg = crate::config::Config::default();
        let mut dataset = crate::api::decode_feed(
            r#"{"columns":["Symbol","Company Name","Market Cap"],
                "rows":[["AAA","Alpha Co","2,000 B"],["BBB","Beta Co","500 M"]]}"#,
        )
        .unwrap();
        dataset.normalize(|c| cfg.column_kind(c));
        let mut state = crate::state::TableState::new(cfg);
        state.set_dataset(dataset);

        assert_eq!(state.visible_columns().len(), 3);
        let caps: Vec<String> = state
            .display_rows()
            .iter()
            .map(|&r| format_cell(ColumnKind::MarketCap, &state.dataset().rows[r][2]))
            .collect();
        // 5e8 sits below the 1e9 boundary, so it renders in separator form.
        assert_eq!(caps, vec!["2.0T", "500,000,000"]);
    }
}
