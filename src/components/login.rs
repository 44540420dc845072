//! Login screen shown while no identity is available.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ii_kaspa_wallet::domain::session::{Phase, SessionState};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use tokio::sync::mpsc::UnboundedSender;

use crate::{action::Action, tui::Frame};

use super::Component;

pub struct LoginComponent {
    action_tx: UnboundedSender<Action>,
    identity_provider: String,
}

impl LoginComponent {
    pub fn new(action_tx: UnboundedSender<Action>, identity_provider: &str) -> Self {
        Self {
            action_tx,
            identity_provider: identity_provider.to_string(),
        }
    }

    pub fn draw_static(f: &mut Frame, area: Rect, identity_provider: &str, phase: Phase) {
        let chunks = Layout::vertical([
            Constraint::Percentage(25),
            Constraint::Length(11),
            Constraint::Min(0),
        ])
        .split(area);

        let prompt = if phase == Phase::Authenticating {
            Line::from(vec![Span::styled(
                "Waiting for Internet Identity in your browser...",
                Style::default().fg(Color::Yellow),
            )])
        } else {
            Line::from(vec![
                Span::raw("Press "),
                Span::styled(
                    "[Enter]",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" to login with Internet Identity"),
            ])
        };

        let lines = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "Kaspa Wallet",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )]),
            Line::from(vec![Span::styled(
                "Secure Kaspa wallet powered by Internet Computer",
                Style::default().fg(Color::DarkGray),
            )]),
            Line::from(""),
            prompt,
            Line::from(""),
            Line::from(vec![
                Span::styled("Provider: ", Style::default().fg(Color::DarkGray)),
                Span::styled(identity_provider.to_string(), Style::default().fg(Color::White)),
            ]),
            Line::from(""),
            Line::from(vec![Span::styled(
                "[q] Quit",
                Style::default().fg(Color::DarkGray),
            )]),
        ];

        let widget = Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .title("Login")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(widget, chunks[1]);
    }
}

impl Component for LoginComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if let KeyCode::Enter | KeyCode::Char('l') = key.code {
            self.action_tx.send(Action::Login)?;
        }
        Ok(())
    }

    fn draw(&mut self, f: &mut Frame, area: Rect, session: &SessionState) {
        Self::draw_static(f, area, &self.identity_provider, session.phase);
    }
}
