use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::session::Mode;
use crate::util::format_clock;
use crate::{App, InputMode, Screen};

const HORIZONTAL_MARGIN: u16 = 4;
const VERTICAL_MARGIN: u16 = 1;

pub fn draw(app: &App, f: &mut Frame) {
    match app.screen {
        Screen::Home => draw_home(app, f),
        Screen::Exam => draw_exam(app, f),
        Screen::Summary => draw_summary(app, f),
        Screen::Review => draw_review(app, f),
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn notice_line(app: &App) -> Line<'_> {
    match &app.notice {
        Some(text) => Line::from(Span::styled(
            text.as_str(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        None => Line::from(""),
    }
}

fn outer_layout(area: Rect, constraints: &[Constraint]) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(constraints.to_vec())
        .split(area)
}

fn draw_home(app: &App, f: &mut Frame) {
    let chunks = outer_layout(
        f.area(),
        &[
            Constraint::Length(3),
            Constraint::Length(9),
            Constraint::Min(8),
            Constraint::Length(3),
        ],
    );

    let title = Paragraph::new("cram — exam practice")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    if app.exam.history.is_empty() {
        let empty = Paragraph::new("No attempts yet. Finish a session to start your progress log.")
            .style(dim())
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Progress"));
        f.render_widget(empty, chunks[1]);
    } else {
        let header = Row::new(vec!["Date", "Score", "Score (%)"]).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
        // Most recent attempts at the bottom, oldest first
        let visible = chunks[1].height.saturating_sub(3) as usize;
        let skip = app.exam.history.len().saturating_sub(visible.max(1));
        let rows: Vec<Row> = app
            .exam
            .history
            .iter()
            .skip(skip)
            .map(|entry| {
                Row::new(vec![
                    Cell::from(entry.date.clone()),
                    Cell::from(entry.score.clone()),
                    Cell::from(format!("{:.1}", entry.percent)),
                ])
            })
            .collect();
        let avg = app
            .exam
            .average_percent()
            .map(|a| format!("Progress — average {a:.1}%"))
            .unwrap_or_else(|| "Progress".to_string());
        let table = Table::new(
            rows,
            &[
                Constraint::Length(18),
                Constraint::Length(10),
                Constraint::Length(10),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(avg));
        f.render_widget(table, chunks[1]);
    }

    let config = &app.exam.config;
    let settings = vec![
        Line::from(vec![
            Span::styled("bank       ", dim()),
            Span::raw(format!("{} questions", app.bank.len())),
        ]),
        Line::from(vec![
            Span::styled("session    ", dim()),
            Span::raw(format!("{} questions", config.count)),
        ]),
        Line::from(vec![
            Span::styled("mode       ", dim()),
            Span::raw(if config.mode.is_simulation() {
                "simulation (graded at the end)"
            } else {
                "immediate feedback"
            }),
        ]),
        Line::from(vec![
            Span::styled("timer      ", dim()),
            Span::raw(if config.time_limit_secs > 0 {
                format_clock(config.time_limit_secs as i64)
            } else {
                "off".to_string()
            }),
        ]),
        Line::from(vec![
            Span::styled("shuffle    ", dim()),
            Span::raw(if config.shuffle { "on" } else { "off" }),
        ]),
        Line::from(vec![
            Span::styled("previous   ", dim()),
            Span::raw(if config.allow_back { "enabled" } else { "disabled" }),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "(enter) start exam   (l) load save code   (q) quit",
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ];
    let settings = Paragraph::new(settings)
        .block(Block::default().borders(Borders::ALL).title("Settings"))
        .wrap(Wrap { trim: true });
    f.render_widget(settings, chunks[2]);

    if app.input_mode == InputMode::LoadCode {
        let input = Paragraph::new(app.input_buffer.as_str())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Paste save code, then press enter"),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(input, chunks[3]);
    } else {
        f.render_widget(Paragraph::new(notice_line(app)), chunks[3]);
    }
}

fn draw_exam(app: &App, f: &mut Frame) {
    let state = &app.exam.state;
    let Some(question) = state.current_question() else {
        return;
    };
    let index = state.current_index;
    let total = state.total();
    let locked = state.is_locked(index);
    let immediate = app.exam.config.mode == Mode::Immediate;

    let inner_width = f
        .area()
        .width
        .saturating_sub(HORIZONTAL_MARGIN * 2 + 2)
        .max(1);
    let question_lines =
        (question.question_text.width() as f64 / inner_width as f64).ceil() as u16;
    let body_height = question_lines + question.options.len() as u16 + 3;

    let chunks = outer_layout(
        f.area(),
        &[
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(body_height),
            Constraint::Min(6),
            Constraint::Length(2),
        ],
    );

    // Header: position, timer, accuracy or mode tag
    let timer = match app.exam.remaining_secs() {
        Some(remaining) => format!("time left {}", format_clock(remaining)),
        None => "timer off".to_string(),
    };
    let right = if immediate {
        let submitted = state.submitted_count();
        if submitted > 0 {
            format!(
                "accuracy {:.0}%",
                100.0 * state.score as f64 / submitted as f64
            )
        } else {
            "accuracy —".to_string()
        }
    } else {
        "simulation".to_string()
    };
    let header = Line::from(vec![
        Span::styled(format!("Question {} of {}", index + 1, total), bold()),
        Span::raw("    "),
        Span::styled(timer, Style::default().fg(Color::Magenta)),
        Span::raw("    "),
        Span::styled(right, dim()),
    ]);
    f.render_widget(Paragraph::new(header), chunks[0]);

    let progress = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio((index + 1) as f64 / total.max(1) as f64)
        .label("");
    f.render_widget(progress, chunks[1]);

    // Question and options
    let chosen = state.answer(index);
    let mut body: Vec<Line> = vec![Line::from(Span::styled(
        question.question_text.clone(),
        bold(),
    ))];
    body.push(Line::from(""));
    for (label, text) in &question.options {
        let is_chosen = chosen == Some(label.as_str());
        let style = if locked && immediate {
            if *label == question.answer_key {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else if is_chosen {
                Style::default().fg(Color::Red)
            } else {
                dim()
            }
        } else if is_chosen {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let marker = if is_chosen { ">" } else { " " };
        body.push(Line::from(Span::styled(
            format!("{marker} {label}) {text}"),
            style,
        )));
    }
    let title = if state.is_starred(index) {
        "★ starred"
    } else {
        ""
    };
    let body = Paragraph::new(body)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: true });
    f.render_widget(body, chunks[2]);

    // Feedback / notes / save code panel
    let mut panel: Vec<Line> = Vec::new();
    if let Some(code) = &app.save_code {
        panel.push(Line::from(Span::styled(
            "Copy this code to resume later (any key to dismiss):",
            Style::default().fg(Color::Yellow),
        )));
        panel.push(Line::from(code.as_str()));
    } else if app.input_mode == InputMode::Note {
        panel.push(Line::from(Span::styled(
            "Note (enter to save, esc to cancel):",
            Style::default().fg(Color::Yellow),
        )));
        panel.push(Line::from(app.input_buffer.as_str()));
    } else {
        if locked && immediate {
            if chosen == Some(question.answer_key.as_str()) {
                panel.push(Line::from(Span::styled(
                    "✓ Correct",
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                )));
            } else {
                panel.push(Line::from(Span::styled(
                    format!("✗ Incorrect — answer: {}", question.answer_key),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )));
            }
            panel.push(Line::from(Span::styled(
                format!("Rationale: {}", question.rationale),
                Style::default().add_modifier(Modifier::ITALIC),
            )));
        }
        if let Some(note) = state.note(index) {
            panel.push(Line::from(Span::styled(
                format!("Note: {note}"),
                Style::default().fg(Color::Blue),
            )));
        }
        if let Some(text) = &app.notice {
            panel.push(Line::from(Span::styled(
                text.as_str(),
                Style::default().fg(Color::Yellow),
            )));
        }
    }
    let panel = Paragraph::new(panel)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    f.render_widget(panel, chunks[3]);

    let submit_hint = if immediate && !locked {
        "(enter) submit"
    } else {
        "(enter) next"
    };
    let footer = Paragraph::new(format!(
        "(a-d) answer   {submit_hint}   (←/→) prev/next   (m) star   (e) note   (v) save code   (esc) home",
    ))
    .style(dim())
    .alignment(Alignment::Center);
    f.render_widget(footer, chunks[4]);
}

fn draw_summary(app: &App, f: &mut Frame) {
    let state = &app.exam.state;
    let total = state.total();
    let percent = crate::scoring::percent(state.score, total);
    let missed = state.incorrect.len();

    let chunks = outer_layout(
        f.area(),
        &[
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(5),
            Constraint::Length(2),
        ],
    );

    let title = Paragraph::new("Session complete")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    let score_color = if percent >= 80.0 {
        Color::Green
    } else if percent >= 50.0 {
        Color::Yellow
    } else {
        Color::Red
    };
    let score = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("Final score: {} / {}  ({percent:.1}%)", state.score, total),
            Style::default().fg(score_color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("{missed} missed"),
            dim(),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(score, chunks[1]);

    let retry = if missed > 0 {
        Line::from(format!("(r) retry {missed} missed"))
    } else {
        Line::from(Span::styled("(r) retry missed — nothing to retry", dim()))
    };
    let actions = Paragraph::new(vec![
        Line::from("(v) review answers"),
        retry,
        Line::from("(n) new exam"),
        Line::from("(h) home"),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(actions, chunks[2]);

    f.render_widget(
        Paragraph::new(notice_line(app)).alignment(Alignment::Center),
        chunks[3],
    );
}

fn draw_review(app: &App, f: &mut Frame) {
    let state = &app.exam.state;

    let chunks = outer_layout(
        f.area(),
        &[Constraint::Min(5), Constraint::Length(2)],
    );

    let mut lines: Vec<Line> = Vec::new();
    for (i, question) in state.questions.iter().enumerate() {
        let chosen = state.answer(i);
        let correct = crate::scoring::is_correct(state, i);
        let status = if correct {
            Span::styled("✓", Style::default().fg(Color::Green))
        } else {
            Span::styled("✗", Style::default().fg(Color::Red))
        };
        let star = if state.is_starred(i) { " ★" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(format!("Question {}{star} ", i + 1), bold()),
            status,
        ]));
        lines.push(Line::from(question.question_text.clone()));
        for (label, text) in &question.options {
            let mut suffix = String::new();
            if *label == question.answer_key {
                suffix.push_str("  (correct answer)");
            }
            if chosen == Some(label.as_str()) && *label != question.answer_key {
                suffix.push_str("  (your answer)");
            }
            let style = if *label == question.answer_key {
                Style::default().fg(Color::Green)
            } else if chosen == Some(label.as_str()) {
                Style::default().fg(Color::Red)
            } else {
                dim()
            };
            lines.push(Line::from(Span::styled(
                format!("  {label}) {text}{suffix}"),
                style,
            )));
        }
        if chosen.is_none() {
            lines.push(Line::from(Span::styled(
                "  Skipped",
                Style::default().fg(Color::Red),
            )));
        }
        lines.push(Line::from(Span::styled(
            format!("  Rationale: {}", question.rationale),
            Style::default().add_modifier(Modifier::ITALIC),
        )));
        if let Some(note) = state.note(i) {
            lines.push(Line::from(Span::styled(
                format!("  Note: {note}"),
                Style::default().fg(Color::Blue),
            )));
        }
        lines.push(Line::from(""));
    }

    let body = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Review"))
        .wrap(Wrap { trim: true })
        .scroll((app.review_scroll, 0));
    f.render_widget(body, chunks[0]);

    let footer = Paragraph::new("(↑/↓ pgup/pgdn) scroll   (b) back to summary")
        .style(dim())
        .alignment(Alignment::Center);
    f.render_widget(footer, chunks[1]);
}
