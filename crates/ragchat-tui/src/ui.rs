use ragchat_core::{ChatRole, STACK_BADGES};
use unicode_width::UnicodeWidthChar;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};

use crate::app::App;

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c != '*' || chars.peek() != Some(&'*') {
            current_text.push(c);
            continue;
        }
        chars.next();

        let mut bold_text = String::new();
        let mut found_close = false;
        while let Some(c) = chars.next() {
            if c == '*' && chars.peek() == Some(&'*') {
                chars.next();
                found_close = true;
                break;
            }
            bold_text.push(c);
        }

        if found_close && !bold_text.is_empty() {
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }
            spans.push(Span::styled(bold_text, Style::default().add_modifier(Modifier::BOLD)));
        } else {
            // Unterminated, keep it literal
            current_text.push_str("**");
            current_text.push_str(&bold_text);
            if found_close {
                current_text.push_str("**");
            }
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let header = header_paragraph(app);
    let header_height = u16::try_from(header.line_count(area.width))
        .unwrap_or(u16::MAX)
        .min(area.height / 2);

    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(header_height),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    frame.render_widget(header, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(frame, footer_area);
}

/// Title, subtitle, and the info card: stack badges, description and the
/// source material the backend was fed.
fn header_paragraph(app: &App) -> Paragraph<'static> {
    let strings = app.language.strings();

    let title = Line::from(vec![
        Span::styled(" ● ", Style::default().fg(Color::Green)),
        Span::styled(
            format!("{} {} ", app.assistant_name, strings.title_suffix),
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let subtitle = Line::from(vec![
        Span::styled(format!(" {} ", strings.subtitle), Style::default().fg(Color::Gray)),
        Span::styled(app.client.endpoint().to_string(), Style::default().fg(Color::DarkGray)),
    ]);

    let badge_style = Style::default().bg(Color::Blue).fg(Color::White);
    let mut badges = vec![Span::styled(
        format!(" {}: ", strings.info_heading.to_uppercase()),
        Style::default().fg(Color::Gray).bold(),
    )];
    for badge in STACK_BADGES {
        badges.push(Span::styled(format!(" {badge} "), badge_style));
        badges.push(Span::raw(" "));
    }

    let dim = Style::default().fg(Color::Gray);
    let lines = vec![
        title,
        subtitle,
        Line::from(badges),
        Line::from(Span::styled(format!(" {}", strings.info_description), dim)),
        Line::from(Span::styled(format!(" {}", strings.source_material), dim)),
    ];

    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .style(Style::default().bg(Color::Black))
}

fn chat_text(app: &App) -> Text<'static> {
    let strings = app.language.strings();

    if app.chat.conversation().is_empty() && !app.chat.is_busy() {
        return Text::from(
            Line::from(Span::styled(
                strings.placeholder,
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center),
        );
    }

    let mut lines: Vec<Line<'static>> = Vec::new();
    for msg in app.chat.conversation() {
        match msg.role {
            ChatRole::User => {
                lines.push(
                    Line::from(Span::styled(
                        strings.user_label,
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    ))
                    .alignment(Alignment::Right),
                );
                for line in msg.text.lines() {
                    lines.push(Line::from(line.to_string()).alignment(Alignment::Right));
                }
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    app.assistant_name.clone(),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                for line in msg.text.lines() {
                    lines.push(parse_markdown_line(line));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.chat.is_busy() {
        lines.push(Line::from(Span::styled(
            app.language.typing_indicator(&app.assistant_name, app.animation_frame),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    Text::from(lines)
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let paragraph = Paragraph::new(chat_text(app)).wrap(Wrap { trim: false });

    let total_lines = u16::try_from(paragraph.line_count(inner.width)).unwrap_or(u16::MAX);
    app.chat_height = inner.height;
    app.chat_max_scroll = total_lines.saturating_sub(inner.height);
    if app.follow_bottom {
        app.chat_scroll = app.chat_max_scroll;
        app.follow_bottom = false;
    }
    app.chat_scroll = app.chat_scroll.min(app.chat_max_scroll);

    frame.render_widget(paragraph.scroll((app.chat_scroll, 0)), inner);

    if app.chat_max_scroll > 0 {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(None)
            .end_symbol(None);
        let mut scrollbar_state =
            ScrollbarState::new(app.chat_max_scroll as usize).position(app.chat_scroll as usize);
        frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
    }
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect) {
    let strings = app.language.strings();
    let send_width = strings.send.chars().count() as u16 + 4;

    let [field_area, send_area] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(send_width)]).areas(area);
    app.send_area = Some(send_area);

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let inner_width = field_area.width.saturating_sub(2);
    let (visible_text, cursor_x) = input_window(app.chat.draft(), app.cursor, inner_width);

    let input = if app.chat.draft().is_empty() {
        Paragraph::new(Span::styled(strings.input_hint, Style::default().fg(Color::DarkGray)))
    } else {
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };
    frame.render_widget(input.block(input_block), field_area);

    if inner_width > 0 {
        frame.set_cursor_position((field_area.x + 1 + cursor_x, field_area.y + 1));
    }

    let send_style = if app.can_send() {
        Style::default().fg(Color::White).bg(Color::Blue).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let send = Paragraph::new(strings.send)
        .alignment(Alignment::Center)
        .style(send_style)
        .block(Block::default().borders(Borders::ALL).border_style(send_style));
    frame.render_widget(send, send_area);
}

/// Slice of `draft` that fits in `width` columns with the cursor visible,
/// and the cursor's column inside that slice. Columns are display widths,
/// so wide characters take two.
fn input_window(draft: &str, cursor: usize, width: u16) -> (String, u16) {
    if width == 0 {
        return (String::new(), 0);
    }
    let width = usize::from(width);
    let chars: Vec<char> = draft.chars().collect();
    let cursor = cursor.min(chars.len());
    let col = |c: &char| c.width().unwrap_or(0);

    // Leave one column for the cursor cell itself
    let mut start = 0;
    while start < cursor && chars[start..cursor].iter().map(col).sum::<usize>() >= width {
        start += 1;
    }

    let mut used = 0;
    let visible: String = chars[start..]
        .iter()
        .take_while(|c| {
            used += col(*c);
            used <= width
        })
        .collect();

    let cursor_x = chars[start..cursor].iter().map(col).sum::<usize>().min(width - 1);
    (visible, cursor_x as u16)
}

fn render_footer(frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" ↑/↓ ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" page ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ];

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragchat_core::{Language, Settings};
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

    fn new_app(language: Language) -> App {
        App::new(&Settings {
            endpoint: "http://127.0.0.1:9/api/chat".to_string(),
            language,
            assistant_name: "Gemini".to_string(),
        })
    }

    fn draw(app: &mut App) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn screen_text(buffer: &Buffer) -> String {
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_parse_markdown_line_bold() {
        let line = parse_markdown_line("the **answer** is 42");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "answer");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_parse_markdown_line_unterminated_is_literal() {
        let line = parse_markdown_line("a **b");
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "a **b");
    }

    #[test]
    fn test_empty_conversation_shows_placeholder_only() {
        let mut app = new_app(Language::Swedish);
        let text = screen_text(&draw(&mut app));

        assert!(text.contains("Ställ en fråga om dina dokument"));
        assert!(!text.contains("Gemini skriver"));
    }

    #[test]
    fn test_header_shows_info_card() {
        let mut app = new_app(Language::Swedish);
        let text = screen_text(&draw(&mut app));

        assert!(text.contains("Gemini RAG Assistant"));
        assert!(text.contains("DEMO/POC VERSION"));
        assert!(text.contains("SYSTEMARKITEKTUR"));
        for badge in STACK_BADGES {
            assert!(text.contains(badge), "missing badge {badge}");
        }
        assert!(text.contains("RAG-assistent som hämtar kontext"));
        assert!(text.contains("PDF-material: Kapitel 1 och 2"));
    }

    #[test]
    fn test_input_window_counts_display_width() {
        // Two wide characters put the cursor four columns in
        assert_eq!(input_window("你好", 2, 10), ("你好".to_string(), 4));
        assert_eq!(input_window("hej", 1, 10), ("hej".to_string(), 1));
    }

    #[test]
    fn test_input_window_scrolls_and_clamps() {
        assert_eq!(input_window("abcdef", 6, 3), ("ef".to_string(), 2));
        assert_eq!(input_window("abcdef", 0, 3), ("abc".to_string(), 0));
        assert_eq!(input_window("你好世界", 4, 3), ("界".to_string(), 2));
        assert_eq!(input_window("abc", 3, 0), (String::new(), 0));
    }

    #[tokio::test]
    async fn test_typing_indicator_while_busy() {
        let mut app = new_app(Language::English);
        app.chat.set_draft("What is RAG?");
        app.submit();

        let text = screen_text(&draw(&mut app));
        assert!(text.contains("You"));
        assert!(text.contains("What is RAG?"));
        assert!(text.contains("Gemini is typing."));
        assert!(!text.contains("Ask a question about your documents"));

        app.finish_turn(Ok("Retrieval-augmented generation.".to_string()));
        let text = screen_text(&draw(&mut app));
        assert!(text.contains("Retrieval-augmented generation."));
        assert!(!text.contains("is typing"));
    }

    #[tokio::test]
    async fn test_send_control_dimmed_while_busy() {
        let mut app = new_app(Language::English);

        let buffer = draw(&mut app);
        let send = app.send_area.unwrap();
        let label = &buffer.content[buffer.index_of(send.x + 2, send.y + 1)];
        assert_eq!(label.symbol(), "S");
        assert_eq!(label.bg, Color::Blue);

        app.chat.set_draft("q");
        app.submit();
        let buffer = draw(&mut app);
        let label = &buffer.content[buffer.index_of(send.x + 2, send.y + 1)];
        assert_eq!(label.fg, Color::DarkGray);
    }

    #[test]
    fn test_follow_bottom_scrolls_to_last_message() {
        let mut app = new_app(Language::English);
        for i in 0..20 {
            app.chat.set_draft(format!("question {i}"));
            app.chat.begin_submit();
            app.chat.complete(Ok(format!("answer {i}")));
        }
        app.on_state_committed();

        let text = screen_text(&draw(&mut app));
        assert!(app.chat_max_scroll > 0);
        assert_eq!(app.chat_scroll, app.chat_max_scroll);
        assert!(text.contains("answer 19"));
        assert!(!text.contains("question 0"));
    }
}
