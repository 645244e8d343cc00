//! Layout rendering for the interactive REPL: expression editor on top,
//! completion preview and key legend in the middle, scrollable output
//! pane below.

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::app::App;

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // expression editor
            Constraint::Length(1), // completion preview
            Constraint::Length(1), // legend
            Constraint::Min(3),    // output pane
        ])
        .split(frame.area());

    let editor = Paragraph::new(app.expression.as_str())
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" jq expression ")
                .border_style(Style::default().fg(Color::Magenta)),
        );
    frame.render_widget(editor, chunks[0]);

    let preview = match app.preview() {
        Some(candidate) => Line::from(vec![
            Span::styled("Suggestion: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                candidate.to_string(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::ITALIC),
            ),
        ]),
        None => Line::from(""),
    };
    frame.render_widget(Paragraph::new(preview), chunks[1]);

    let legend = Paragraph::new(
        "Tab: autocomplete | Enter: accept/newline | Ctrl+C/Esc: execute & exit | Up/Down: scroll",
    )
    .style(
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    );
    frame.render_widget(legend, chunks[2]);

    let output = Paragraph::new(app.output.as_str())
        .style(Style::default().fg(Color::Green))
        .wrap(Wrap { trim: false })
        .scroll((app.scroll, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" output ")
                .border_style(Style::default().fg(Color::Green)),
        );
    frame.render_widget(output, chunks[3]);
}
