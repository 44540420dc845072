//! Receive component showing the wallet address and balance.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ii_kaspa_wallet::domain::{
    amount::{format_balance, format_kas},
    session::SessionState,
    wallet::{Address, Balance},
};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tokio::sync::mpsc::UnboundedSender;

use crate::{action::Action, tui::Frame};

use super::Component;

pub struct ReceiveComponent {
    action_tx: UnboundedSender<Action>,
}

impl ReceiveComponent {
    pub fn new(action_tx: UnboundedSender<Action>) -> Self {
        Self { action_tx }
    }

    /// Static draw method for use in the main app draw loop.
    pub fn draw_static(
        f: &mut Frame,
        area: Rect,
        address: Option<&Address>,
        balance: Option<&Balance>,
        copied: bool,
        busy: bool,
    ) {
        let chunks = Layout::vertical([Constraint::Length(9), Constraint::Min(0)]).split(area);

        let balance_info = match balance {
            Some(balance) => vec![
                Line::from(""),
                Line::from(vec![
                    Span::styled(
                        format_balance(balance.total),
                        Style::default()
                            .fg(Color::Green)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(" KAS"),
                ]),
                Line::from(""),
                Line::from(vec![
                    Span::styled("Confirmed:   ", Style::default().fg(Color::DarkGray)),
                    Span::raw(format!("{} KAS", format_kas(balance.confirmed, 8))),
                ]),
                Line::from(vec![
                    Span::styled("Unconfirmed: ", Style::default().fg(Color::DarkGray)),
                    Span::raw(format!("{} KAS", format_kas(balance.unconfirmed, 8))),
                ]),
                Line::from(vec![
                    Span::styled("Immature:    ", Style::default().fg(Color::DarkGray)),
                    Span::raw(format!("{} KAS", format_kas(balance.immature, 8))),
                ]),
            ],
            None if busy => vec![
                Line::from(""),
                Line::from(vec![Span::styled(
                    "Setting up your wallet...",
                    Style::default().fg(Color::Yellow),
                )]),
            ],
            None => vec![
                Line::from(""),
                Line::from(vec![Span::styled(
                    "Balance unavailable. Press [r] to retry.",
                    Style::default().fg(Color::Red),
                )]),
            ],
        };

        let balance_widget = Paragraph::new(balance_info).block(
            Block::default()
                .title("Balance")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(balance_widget, chunks[0]);

        let address_info = match address {
            Some(address) => {
                let copy_hint = if copied {
                    Span::styled(
                        "Copied!",
                        Style::default()
                            .fg(Color::Green)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::styled("[c] Copy address", Style::default().fg(Color::DarkGray))
                };
                vec![
                    Line::from(""),
                    Line::from(vec![Span::styled(
                        "Your Kaspa Address:",
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    )]),
                    Line::from(""),
                    Line::from(vec![Span::styled(
                        format!("  {}", address.address),
                        Style::default().fg(Color::Cyan),
                    )]),
                    Line::from(""),
                    Line::from(vec![
                        Span::styled("Derivation path: ", Style::default().fg(Color::DarkGray)),
                        Span::raw(address.derivation_path.as_str()),
                    ]),
                    Line::from(vec![
                        Span::styled("Public key:      ", Style::default().fg(Color::DarkGray)),
                        Span::raw(hex::encode(&address.public_key)),
                    ]),
                    Line::from(""),
                    Line::from(vec![
                        copy_hint,
                        Span::styled("  [r] Refresh balance", Style::default().fg(Color::DarkGray)),
                    ]),
                ]
            }
            None if busy => vec![
                Line::from(""),
                Line::from(vec![Span::styled(
                    "Generating address...",
                    Style::default().fg(Color::Yellow),
                )]),
            ],
            None => vec![
                Line::from(""),
                Line::from(vec![Span::styled(
                    "No wallet address. Log out with [x] and log in again to retry.",
                    Style::default().fg(Color::Red),
                )]),
            ],
        };

        let address_widget = Paragraph::new(address_info)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title("Receive Kaspa")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(address_widget, chunks[1]);
    }
}

impl Component for ReceiveComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if let KeyCode::Char('c') = key.code {
            self.action_tx.send(Action::CopyAddress)?;
        }
        Ok(())
    }

    fn draw(&mut self, f: &mut Frame, area: Rect, session: &SessionState) {
        Self::draw_static(
            f,
            area,
            session.address.as_ref(),
            session.balance.as_ref(),
            session.is_copied(),
            session.is_busy(),
        );
    }
}
