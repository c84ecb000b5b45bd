//! Controls panel - trigger, scaling, timebase and backend status

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use fluxscope::display::ReductionMode;

use super::ViewState;

fn row(label: &str, value: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {label:<9}"), Style::default().fg(Color::DarkGray)),
        Span::styled(value, Style::default().fg(color)),
    ])
}

pub fn render_controls(frame: &mut Frame, area: Rect, view: &ViewState) {
    let engine = view.engine;
    let mode = engine.trigger_mode();

    let (status, status_color) = match view.backend {
        Some(info) => (info.device_name.clone(), Color::Green),
        None => ("disconnected".to_owned(), Color::Red),
    };
    let reduction = match engine.reducer().mode() {
        ReductionMode::Direct => "direct",
        ReductionMode::Envelope => "envelope",
    };

    let lines = vec![
        row("Input", status, status_color),
        row(
            "Rate",
            format!("{:.1}kHz  {}ch", engine.sample_rate() / 1000.0, engine.channels()),
            Color::White,
        ),
        Line::raw(""),
        row(
            "Trigger",
            mode.label().to_owned(),
            if mode.is_enabled() {
                Color::Yellow
            } else {
                Color::DarkGray
            },
        ),
        row("Level", format!("{:+.3}", engine.trigger_level()), Color::Yellow),
        row("Scale", format!("x{:.2}", engine.vertical_scaling()), Color::Cyan),
        row(
            "Time",
            format!("{:.2}ms", engine.display_time() * 1000.0),
            Color::Cyan,
        ),
        row(
            "Samples",
            format!("{} ({reduction})", engine.display_samples()),
            Color::DarkGray,
        ),
        row(
            "Spp",
            format!("{:.2}", engine.reducer().samples_per_pixel()),
            Color::DarkGray,
        ),
    ];

    let panel =
        Paragraph::new(lines).block(Block::default().title(" Controls ").borders(Borders::ALL));
    frame.render_widget(panel, area);
}
