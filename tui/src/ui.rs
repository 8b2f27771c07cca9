use std::time::Instant;

use iris_client_rs::{BridgeClientTrait, Group, Hsb, Light};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    style::{
        Color, Modifier, Style, Stylize,
        palette::tailwind::{BLUE, GREEN, RED, SLATE},
    },
    symbols,
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, Gauge, HighlightSpacing, List, ListItem, Padding, Paragraph,
        StatefulWidget, Widget, Wrap,
    },
};

use crate::app::{App, ConnectDialog, Focus, FormField, MAX_BRIGHTNESS, Mode, RoomEditor};
use crate::idle::IdleState;

struct Theme {
    header: Style,
    row_bg: Color,
    alt_row_bg: Color,
    selected: Style,
    text: Color,
    on: Color,
    error: Color,
    /// Dim mode replaces color swatches with the text color.
    swatches: bool,
}

const AWAKE: Theme = Theme {
    header: Style::new().fg(SLATE.c100).bg(BLUE.c800),
    row_bg: SLATE.c950,
    alt_row_bg: SLATE.c900,
    selected: Style::new().bg(SLATE.c800).add_modifier(Modifier::BOLD),
    text: SLATE.c200,
    on: GREEN.c500,
    error: RED.c400,
    swatches: true,
};

const DIM: Theme = Theme {
    header: Style::new().fg(SLATE.c500).bg(SLATE.c900),
    row_bg: Color::Black,
    alt_row_bg: Color::Black,
    selected: Style::new().bg(SLATE.c900),
    text: SLATE.c600,
    on: GREEN.c900,
    error: RED.c900,
    swatches: false,
};

impl<C: BridgeClientTrait> Widget for &mut App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = match self.idle.state(Instant::now()) {
            IdleState::Dark => {
                Block::new().bg(Color::Black).render(area, buf);
                return;
            }
            IdleState::Dim => &DIM,
            IdleState::Awake => &AWAKE,
        };

        let [header_area, main_area, detail_area, footer_area] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Fill(1),
            Constraint::Length(6),
            Constraint::Length(1),
        ])
        .areas(area);
        let [lights_area, rooms_area] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]).areas(main_area);

        self.render_header(header_area, buf, theme);
        self.render_lights(lights_area, buf, theme);
        self.render_rooms(rooms_area, buf, theme);
        self.render_detail(detail_area, buf, theme);
        self.render_footer(footer_area, buf, theme);

        match &self.mode {
            Mode::Browse => {}
            Mode::Connect(dialog) => render_connect(dialog, area, buf, theme),
            Mode::Room(editor) => render_room_editor(editor, &self.store.lights(), area, buf, theme),
            Mode::ConfirmDelete(id) => {
                let name = self.store.group(id).map(|g| g.name).unwrap_or_else(|| id.clone());
                render_confirm_delete(&name, area, buf, theme);
            }
        }
    }
}

impl<C: BridgeClientTrait> App<C> {
    fn render_header(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let connection = self.store.connection();
        let mut status = vec![if !connection.initial_checked {
            Span::raw("Checking bridge...")
        } else if connection.connected {
            Span::raw(format!(
                "Bridge {}",
                connection.bridge_ip.as_deref().unwrap_or("connected")
            ))
        } else {
            Span::raw("Not connected, press b to connect")
        }];
        if self.store.is_loading() {
            status.push(Span::raw("  Loading..."));
        }
        if let Some(error) = self.store.last_error().or_else(|| self.notice.clone()) {
            status.push(Span::styled(format!("  {error}"), theme.error));
        }

        Paragraph::new(vec![
            Line::from("Iris Panel").bold().centered(),
            Line::from(status).centered(),
        ])
        .style(theme.header)
        .render(area, buf);
    }

    fn render_lights(&mut self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let items: Vec<ListItem> = self
            .store
            .lights()
            .iter()
            .enumerate()
            .map(|(i, light)| light_item(light, theme).bg(row_color(theme, i)))
            .collect();
        let list = List::new(items)
            .block(list_block("Lights", self.focus == Focus::Lights, theme))
            .highlight_style(theme.selected)
            .highlight_symbol(">")
            .highlight_spacing(HighlightSpacing::Always);

        StatefulWidget::render(list, area, buf, &mut self.lights_state);
    }

    fn render_rooms(&mut self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let items: Vec<ListItem> = self
            .store
            .groups()
            .iter()
            .enumerate()
            .map(|(i, group)| group_item(group, theme).bg(row_color(theme, i)))
            .collect();
        let list = List::new(items)
            .block(list_block("Rooms", self.focus == Focus::Rooms, theme))
            .highlight_style(theme.selected)
            .highlight_symbol(">")
            .highlight_spacing(HighlightSpacing::Always);

        StatefulWidget::render(list, area, buf, &mut self.rooms_state);
    }

    fn render_detail(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let block = Block::new()
            .title(Line::raw("Details").centered())
            .borders(Borders::TOP)
            .border_set(symbols::border::EMPTY)
            .border_style(theme.header)
            .bg(theme.row_bg)
            .padding(Padding::horizontal(1));

        let detail = if let Some(light) = self.selected_light() {
            Some((
                light.name.clone(),
                light_summary(&light),
                light.brightness,
                light.has_color.then(|| Hsb::of_light(&light)),
            ))
        } else {
            self.selected_group().map(|group| {
                (
                    group.name.clone(),
                    format!("{}, {} lights", group.room_class, group.lights.len()),
                    group.brightness,
                    group.has_color.then(|| Hsb::of_group(&group)),
                )
            })
        };
        let Some((name, summary, brightness, color)) = detail else {
            Paragraph::new("Nothing selected...")
                .block(block)
                .fg(theme.text)
                .render(area, buf);
            return;
        };

        let inner = block.inner(area);
        block.render(area, buf);
        let [text_area, gauge_area, swatch_area] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        Paragraph::new(vec![Line::from(name).bold(), Line::from(summary)])
            .fg(theme.text)
            .wrap(Wrap { trim: false })
            .render(text_area, buf);

        Gauge::default()
            .gauge_style(Style::new().fg(theme.on).bg(theme.alt_row_bg))
            .ratio((f64::from(brightness) / f64::from(MAX_BRIGHTNESS)).min(1.0))
            .label(format!("Brightness {}%", percent(brightness)))
            .render(gauge_area, buf);

        let swatch = match color {
            Some(hsb) => Line::from(vec![
                Span::styled("      ", Style::new().bg(swatch_color(hsb, theme))),
                Span::styled(format!(" {}", hsb.to_hex()), theme.text),
            ]),
            None => Line::styled("White only", theme.text),
        };
        swatch.render(swatch_area, buf);
    }

    fn render_footer(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let help = match self.mode {
            Mode::Browse => {
                "↓↑ move, Tab switch list, Enter toggle, ←→ brightness, c/C color, n new room, e edit, d delete, r refresh, q quit"
            }
            Mode::Connect(_) => "Type the bridge address, Enter to connect, Esc to cancel",
            Mode::Room(_) => {
                "Tab next field, ←→ room type, Space add/remove light, Enter save, Esc cancel"
            }
            Mode::ConfirmDelete(_) => "y to delete, n to keep",
        };
        Paragraph::new(help)
            .fg(theme.text)
            .centered()
            .render(area, buf);
    }
}

fn list_block<'a>(title: &'a str, focused: bool, theme: &Theme) -> Block<'a> {
    let title = if focused {
        Line::raw(title).centered().bold()
    } else {
        Line::raw(title).centered()
    };
    Block::new()
        .title(title)
        .borders(Borders::TOP)
        .border_set(symbols::border::EMPTY)
        .border_style(theme.header)
        .bg(theme.row_bg)
}

const fn row_color(theme: &Theme, i: usize) -> Color {
    if i.is_multiple_of(2) {
        theme.row_bg
    } else {
        theme.alt_row_bg
    }
}

fn percent(brightness: u8) -> u16 {
    u16::from(brightness) * 100 / u16::from(MAX_BRIGHTNESS)
}

fn swatch_color(hsb: Hsb, theme: &Theme) -> Color {
    if !theme.swatches {
        return theme.text;
    }
    let (r, g, b) = hsb.to_rgb();
    Color::Rgb(r, g, b)
}

fn light_summary(light: &Light) -> String {
    let power = if light.on { "On" } else { "Off" };
    if light.reachable {
        power.to_string()
    } else {
        format!("{power}, unreachable")
    }
}

fn power_marker(on: bool, hsb: Hsb, theme: &Theme) -> Span<'static> {
    if on {
        Span::styled(" ● ", swatch_color(hsb, theme))
    } else {
        Span::styled(" ○ ", theme.text)
    }
}

fn light_item(light: &Light, theme: &Theme) -> ListItem<'static> {
    let name_color = if light.on { theme.on } else { theme.text };
    let mut spans = vec![
        power_marker(light.on, Hsb::of_light(light), theme),
        Span::styled(light.name.clone(), name_color),
        Span::styled(format!("  {}%", percent(light.brightness)), theme.text),
    ];
    if !light.reachable {
        spans.push(Span::styled("  unreachable", theme.error));
    }
    ListItem::new(Line::from(spans))
}

fn group_item(group: &Group, theme: &Theme) -> ListItem<'static> {
    let name_color = if group.on { theme.on } else { theme.text };
    ListItem::new(Line::from(vec![
        power_marker(group.on, Hsb::of_group(group), theme),
        Span::styled(group.name.clone(), name_color),
        Span::styled(
            format!("  {}, {} lights", group.room_class, group.lights.len()),
            theme.text,
        ),
    ]))
}

fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    area
}

fn popup_block<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::bordered()
        .title(Line::raw(title).centered().bold())
        .border_style(theme.header)
        .bg(theme.row_bg)
        .padding(Padding::horizontal(1))
}

fn field_style(focused: bool, theme: &Theme) -> Style {
    if focused {
        theme.selected.fg(theme.text)
    } else {
        Style::new().fg(theme.text)
    }
}

fn render_connect(dialog: &ConnectDialog, area: Rect, buf: &mut Buffer, theme: &Theme) {
    let area = popup_area(area, 50, 6);
    Clear.render(area, buf);

    let mut lines = vec![
        Line::styled(format!("Bridge address: {}_", dialog.ip), theme.text),
        Line::raw(""),
    ];
    if let Some(error) = &dialog.error {
        lines.push(Line::styled(error.clone(), theme.error));
    }
    Paragraph::new(lines)
        .block(popup_block("Connect to bridge", theme))
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

fn render_room_editor(
    editor: &RoomEditor,
    lights: &[Light],
    area: Rect,
    buf: &mut Buffer,
    theme: &Theme,
) {
    let height = u16::try_from(lights.len() + 8).unwrap_or(u16::MAX);
    let area = popup_area(area, 56, height.min(area.height));
    Clear.render(area, buf);

    let title = if editor.group_id.is_some() {
        "Room settings"
    } else {
        "New room"
    };
    let mut lines = vec![
        Line::styled(
            format!("Name: {}_", editor.form.name),
            field_style(editor.field == FormField::Name, theme),
        ),
        Line::styled(
            format!("Type: < {} >", editor.form.room_class),
            field_style(editor.field == FormField::RoomClass, theme),
        ),
        Line::styled("Lights:", theme.text),
    ];
    for (i, light) in lights.iter().enumerate() {
        let check = if editor.form.contains(&light.id) {
            "[x]"
        } else {
            "[ ]"
        };
        let focused = editor.field == FormField::Lights && i == editor.cursor;
        lines.push(Line::styled(
            format!("  {check} {}", light.name),
            field_style(focused, theme),
        ));
    }
    if let Some(error) = &editor.error {
        lines.push(Line::raw(""));
        lines.push(Line::styled(error.clone(), theme.error));
    }

    Paragraph::new(lines)
        .block(popup_block(title, theme))
        .render(area, buf);
}

fn render_confirm_delete(name: &str, area: Rect, buf: &mut Buffer, theme: &Theme) {
    let area = popup_area(area, 44, 5);
    Clear.render(area, buf);
    Paragraph::new(Line::styled(format!("Delete room '{name}'?"), theme.text))
        .block(popup_block("Delete room", theme))
        .wrap(Wrap { trim: true })
        .render(area, buf);
}
