//! Send component for transferring KAS from the wallet address.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ii_kaspa_wallet::domain::{
    amount::{format_balance, format_kas, format_tx_id},
    session::SessionState,
    wallet::{
        Address, Balance, BuiltTransaction, PendingTransfer, TransactionReceipt, TransferEdit,
        TransferField,
    },
};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use tokio::sync::mpsc::UnboundedSender;

use crate::{action::Action, tui::Frame};

use super::Component;

/// Input field focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendField {
    ToAddress,
    Amount,
    Confirm,
}

impl SendField {
    fn transfer_field(self) -> Option<TransferField> {
        match self {
            SendField::ToAddress => Some(TransferField::ToAddress),
            SendField::Amount => Some(TransferField::Amount),
            SendField::Confirm => None,
        }
    }
}

/// Everything the send tab renders besides focus.
pub struct SendView<'a> {
    pub from: Option<&'a Address>,
    pub balance: Option<&'a Balance>,
    pub pending: &'a PendingTransfer,
    pub fee_preview: Option<&'a BuiltTransaction>,
    pub last_receipt: Option<&'a TransactionReceipt>,
    pub busy: bool,
}

impl<'a> SendView<'a> {
    pub fn from_session(session: &'a SessionState) -> Self {
        Self {
            from: session.address.as_ref(),
            balance: session.balance.as_ref(),
            pending: &session.pending,
            fee_preview: session.fee_preview.as_ref(),
            last_receipt: session.last_receipt.as_ref(),
            busy: session.is_busy(),
        }
    }
}

/// Send form. Field contents live in the session's pending transfer; this
/// component only tracks focus and edit mode.
pub struct SendComponent {
    action_tx: UnboundedSender<Action>,
    pub focused_field: SendField,
    pub is_editing: bool,
}

impl SendComponent {
    pub fn new(action_tx: UnboundedSender<Action>) -> Self {
        Self {
            action_tx,
            focused_field: SendField::ToAddress,
            is_editing: false,
        }
    }

    /// Return focus to the first field, e.g. after a transfer went out.
    pub fn reset(&mut self) {
        self.focused_field = SendField::ToAddress;
        self.is_editing = false;
    }

    pub fn paste(&mut self, text: &str) -> Result<()> {
        if let Some(field) = self.focused_field.transfer_field() {
            self.edit(TransferEdit::Paste(field, text.to_string()))?;
        }
        Ok(())
    }

    fn edit(&self, edit: TransferEdit) -> Result<()> {
        self.action_tx.send(Action::EditTransfer(edit))?;
        Ok(())
    }

    fn next_field(&mut self) {
        self.focused_field = match self.focused_field {
            SendField::ToAddress => SendField::Amount,
            SendField::Amount => SendField::Confirm,
            SendField::Confirm => SendField::ToAddress,
        };
    }

    fn prev_field(&mut self) {
        self.focused_field = match self.focused_field {
            SendField::ToAddress => SendField::Confirm,
            SendField::Amount => SendField::ToAddress,
            SendField::Confirm => SendField::Amount,
        };
    }

    fn input_block(title: &'static str, focused: bool) -> Block<'static> {
        Block::default()
            .title(if focused {
                format!("> {}", title)
            } else {
                format!("  {}", title)
            })
            .borders(Borders::ALL)
            .border_style(if focused {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            })
    }

    fn input_line(
        value: &str,
        placeholder: &str,
        focused: bool,
        is_editing: bool,
    ) -> Span<'static> {
        let style = match (focused, is_editing) {
            (true, true) => Style::default().fg(Color::Yellow),
            (true, false) => Style::default().fg(Color::Cyan),
            _ => Style::default().fg(Color::White),
        };
        let mut text = if value.is_empty() && !focused {
            placeholder.to_string()
        } else {
            value.to_string()
        };
        if focused && is_editing {
            text.push('│');
        }
        Span::styled(text, style)
    }

    /// Static draw method for use in the main app draw loop.
    pub fn draw_static(
        f: &mut Frame,
        area: Rect,
        view: &SendView<'_>,
        focused_field: SendField,
        is_editing: bool,
    ) {
        let chunks = Layout::vertical([
            Constraint::Length(4), // From
            Constraint::Length(4), // To address
            Constraint::Length(4), // Amount
            Constraint::Length(4), // Confirm button
            Constraint::Min(0),    // Result/help
        ])
        .split(area);

        let from_info = match view.from {
            Some(address) => Line::from(vec![
                Span::styled("From: ", Style::default().fg(Color::DarkGray)),
                Span::styled(address.address.clone(), Style::default().fg(Color::White)),
                Span::raw("  |  "),
                Span::styled("Balance: ", Style::default().fg(Color::DarkGray)),
                Span::styled(
                    view.balance
                        .map(|b| format!("{} KAS", format_balance(b.total)))
                        .unwrap_or_else(|| "-".to_string()),
                    Style::default().fg(Color::Green),
                ),
            ]),
            None => Line::from(vec![Span::styled(
                "Wallet is not ready yet.",
                Style::default().fg(Color::Red),
            )]),
        };
        let from_widget = Paragraph::new(vec![Line::from(""), from_info]).block(
            Block::default()
                .title("Send From")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(from_widget, chunks[0]);

        let to_focused = focused_field == SendField::ToAddress;
        let to_widget = Paragraph::new(vec![
            Line::from(""),
            Line::from(vec![Self::input_line(
                &view.pending.to_address,
                "kaspa:...",
                to_focused,
                is_editing,
            )]),
        ])
        .block(Self::input_block("To Address", to_focused));
        f.render_widget(to_widget, chunks[1]);

        let amount_focused = focused_field == SendField::Amount;
        let amount_widget = Paragraph::new(vec![
            Line::from(""),
            Line::from(vec![
                Self::input_line(&view.pending.amount, "0.00", amount_focused, is_editing),
                Span::raw(" KAS"),
            ]),
        ])
        .block(Self::input_block("Amount", amount_focused));
        f.render_widget(amount_widget, chunks[2]);

        let confirm_focused = focused_field == SendField::Confirm;
        let confirm_style = if confirm_focused {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Green)
        };
        let label = if view.busy {
            "  [ Sending... ]  "
        } else {
            "  [ Send Kaspa ]  "
        };
        let confirm_widget = Paragraph::new(vec![
            Line::from(""),
            Line::from(vec![Span::styled(label, confirm_style)]),
        ])
        .block(Self::input_block("Confirm", confirm_focused));
        f.render_widget(confirm_widget, chunks[3]);

        let mut lines = vec![Line::from("")];
        if let Some(built) = view.fee_preview {
            lines.push(Line::from(vec![
                Span::styled("Estimated fee: ", Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("{} KAS", format_kas(built.fee_paid, 8)),
                    Style::default().fg(Color::Yellow),
                ),
            ]));
        }
        if let Some(receipt) = view.last_receipt {
            lines.push(Line::from(vec![
                Span::styled("Last transaction: ", Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format_tx_id(&receipt.transaction_id),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled("  Fee: ", Style::default().fg(Color::DarkGray)),
                Span::raw(format!("{} KAS", format_kas(receipt.fee_paid, 8))),
            ]));
            lines.push(Line::from(vec![Span::styled(
                "[o] View on Explorer",
                Style::default().fg(Color::DarkGray),
            )]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(vec![Span::styled(
            if is_editing {
                "[Esc] Stop editing  [Tab/↓] Next field  [Shift+Tab/↑] Prev field"
            } else {
                "[Enter/e] Edit  [j/k] Move  [p] Estimate fee  [c] Clear  [Enter on Confirm] Send"
            },
            Style::default().fg(Color::DarkGray),
        )]));

        let result_widget = Paragraph::new(lines).block(
            Block::default()
                .title("Transaction")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(result_widget, chunks[4]);
    }
}

impl Component for SendComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        let input_field = self.focused_field.transfer_field();

        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.is_editing = false;
                self.next_field();
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.is_editing = false;
                self.prev_field();
            }
            KeyCode::Esc => {
                self.is_editing = false;
            }
            KeyCode::Enter => {
                if self.focused_field == SendField::Confirm {
                    self.action_tx.send(Action::SendTransaction)?;
                } else {
                    self.is_editing = !self.is_editing;
                }
            }
            KeyCode::Char(c) => match input_field {
                Some(field) if self.is_editing => self.edit(TransferEdit::Push(field, c))?,
                _ if !self.is_editing => match c {
                    'j' => self.next_field(),
                    'k' => self.prev_field(),
                    'c' => self.edit(TransferEdit::Clear)?,
                    'e' if input_field.is_some() => self.is_editing = true,
                    'p' => self.action_tx.send(Action::PreviewFee)?,
                    'o' => self.action_tx.send(Action::OpenExplorer)?,
                    _ => {}
                },
                _ => {}
            },
            KeyCode::Backspace => {
                if let Some(field) = input_field
                    && self.is_editing
                {
                    self.edit(TransferEdit::Pop(field))?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn draw(&mut self, f: &mut Frame, area: Rect, session: &SessionState) {
        Self::draw_static(
            f,
            area,
            &SendView::from_session(session),
            self.focused_field,
            self.is_editing,
        );
    }
}
