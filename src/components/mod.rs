pub mod login;
pub mod receive;
pub mod send;

use color_eyre::eyre::Result;
use crossterm::event::KeyEvent;
use ii_kaspa_wallet::domain::session::SessionState;
use ratatui::layout::Rect;

use crate::tui::Frame;

/// A component is a reusable UI element that can handle events and render itself.
///
/// Components own only view state (focus, edit mode). Everything they show
/// comes from the [`SessionState`] passed to `draw`.
pub trait Component {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()>;
    fn draw(&mut self, f: &mut Frame, area: Rect, session: &SessionState);
}
