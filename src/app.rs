use std::{future::Future, sync::Arc};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ii_kaspa_wallet::{
    config::Config,
    domain::{
        amount::validate_amount,
        error::WalletError,
        session::{SessionEvent, SessionState},
        status::{StatusKind, StatusNotifier, spawn_expiry},
    },
    infra::{
        desktop::{Osc52Clipboard, SystemClipboard, open_url},
        identity::{IdentityManager, LoopbackIdentityProvider},
        session_factory::{HttpConnector, SessionFactory},
        store::Store,
    },
    workflow::{BusyGuard, EventSink, WalletClient},
};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
};
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::{
    action::Action,
    cli::Args,
    components::{
        Component, login::LoginComponent, receive::ReceiveComponent, send::SendComponent,
    },
    tui::{Event, Frame, Tui},
};

pub type Client = WalletClient<LoopbackIdentityProvider, HttpConnector>;

/// Wire the production identity provider, store and connector together.
pub fn build_client(config: Config) -> Result<(Client, UnboundedReceiver<SessionEvent>)> {
    let store = Store::new()?;
    let (events, event_rx) = EventSink::channel();
    let identity = IdentityManager::new(LoopbackIdentityProvider::default(), store);
    let factory = SessionFactory::new(HttpConnector::new()?);
    Ok((WalletClient::new(config, identity, factory, events), event_rx))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Receive,
    Send,
}

impl Tab {
    pub fn all() -> [Tab; 2] {
        [Tab::Receive, Tab::Send]
    }

    pub fn title(&self) -> Line<'static> {
        match self {
            Tab::Receive => Line::from(vec![
                Span::raw("Recei"),
                Span::styled("v", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                Span::raw("e"),
            ]),
            Tab::Send => Line::from(vec![
                Span::styled("S", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                Span::raw("end"),
            ]),
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Tab::Receive => 0,
            Tab::Send => 1,
        }
    }

    pub fn next(&self) -> Tab {
        match self {
            Tab::Receive => Tab::Send,
            Tab::Send => Tab::Receive,
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub should_suspend: bool,
    pub config: Config,
    pub active_tab: Tab,
    pub action_tx: UnboundedSender<Action>,
    pub action_rx: UnboundedReceiver<Action>,
    pub tui: Tui,
    pub client: Arc<Client>,
    pub event_rx: UnboundedReceiver<SessionEvent>,
    pub session: SessionState,
    pub status: StatusNotifier,
    pub login_component: LoginComponent,
    pub receive_component: ReceiveComponent,
    pub send_component: SendComponent,
}

impl App {
    pub fn new(args: &Args, config: Config) -> Result<Self> {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let (client, event_rx) = build_client(config.clone())?;
        let login_component =
            LoginComponent::new(action_tx.clone(), &config.endpoint.identity_provider);
        let receive_component = ReceiveComponent::new(action_tx.clone());
        let send_component = SendComponent::new(action_tx.clone());

        let tui = Tui::new()?
            .tick_rate(args.tick_rate)
            .frame_rate(args.frame_rate)
            .paste(true);

        info!(
            "Using canister {} on {} ({})",
            config.endpoint.canister_id, config.endpoint.network, config.endpoint.host
        );

        Ok(Self {
            should_quit: false,
            should_suspend: false,
            status: StatusNotifier::new(config.status_ttl),
            config,
            active_tab: Tab::Receive,
            action_tx,
            action_rx,
            tui,
            client: Arc::new(client),
            event_rx,
            session: SessionState::new(),
            login_component,
            receive_component,
            send_component,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        self.tui.enter()?;

        // Restore a saved session, if any.
        self.spawn_busy("start", |client| async move {
            client.start().await;
        });

        loop {
            // Handle events
            if let Some(event) = self.tui.next().await {
                self.handle_event(event)?;
            }

            // Results from background tasks
            while let Ok(event) = self.event_rx.try_recv() {
                self.apply_session_event(event);
            }

            // Handle actions
            while let Ok(action) = self.action_rx.try_recv() {
                self.handle_action(action)?;
            }

            if self.should_suspend {
                self.tui.suspend()?;
                self.should_suspend = false;
                self.tui.resume()?;
            }

            if self.should_quit {
                break;
            }
        }

        self.tui.exit()?;
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Tick => {
                self.action_tx.send(Action::Tick)?;
            }
            Event::Render => {
                self.action_tx.send(Action::Render)?;
            }
            Event::Key(key_event) => {
                self.handle_key_event(key_event)?;
            }
            Event::Resize(w, h) => {
                self.action_tx.send(Action::Resize(w, h))?;
            }
            Event::Init => {
                info!("Application initialized");
            }
            Event::Paste(text) => {
                if self.session.is_authenticated() && self.active_tab == Tab::Send {
                    self.send_component.paste(&text)?;
                }
            }
            Event::Error => {}
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.action_tx.send(Action::Quit)?;
            return Ok(());
        }

        if !self.session.is_authenticated() {
            match key.code {
                KeyCode::Char('q') if key.modifiers.is_empty() => {
                    self.action_tx.send(Action::Quit)?;
                }
                _ => self.login_component.handle_key_event(key)?,
            }
            return Ok(());
        }

        if self.active_tab == Tab::Send && self.send_component.is_editing {
            self.send_component.handle_key_event(key)?;
            return Ok(());
        }

        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => {
                self.action_tx.send(Action::Quit)?;
            }
            KeyCode::Char('z') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.action_tx.send(Action::Suspend)?;
            }
            KeyCode::Char('r') if key.modifiers.is_empty() => {
                self.action_tx.send(Action::RefreshBalance)?;
            }
            KeyCode::Char('x') if key.modifiers.is_empty() => {
                self.action_tx.send(Action::Logout)?;
            }
            KeyCode::Char('v') if key.modifiers.is_empty() => {
                self.action_tx.send(Action::TabReceive)?;
            }
            KeyCode::Char('s') if key.modifiers.is_empty() => {
                self.action_tx.send(Action::TabSend)?;
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.active_tab = self.active_tab.next();
            }
            _ => match self.active_tab {
                Tab::Receive => self.receive_component.handle_key_event(key)?,
                Tab::Send => self.send_component.handle_key_event(key)?,
            },
        }
        Ok(())
    }

    fn handle_action(&mut self, action: Action) -> Result<()> {
        if !matches!(action, Action::Tick | Action::Render) {
            debug!("Handling action: {:?}", action);
        }
        match action {
            Action::Tick => {
                self.status.sweep(Instant::now());
            }
            Action::Render => {
                self.draw_ui()?;
            }
            Action::Resize(w, h) => {
                self.tui.resize(Rect::new(0, 0, w, h))?;
                self.draw_ui()?;
            }
            Action::Suspend => {
                self.should_suspend = true;
            }
            Action::Quit => {
                self.should_quit = true;
            }
            Action::TabReceive => {
                self.active_tab = Tab::Receive;
            }
            Action::TabSend => {
                self.active_tab = Tab::Send;
            }
            Action::Login => {
                if !self.session.is_authenticated() {
                    self.spawn_busy("login", |client| async move {
                        client.login().await;
                    });
                }
            }
            Action::Logout => {
                // Not gated on busy: logout must always be possible.
                let client = self.client.clone();
                tokio::spawn(async move {
                    client.logout().await;
                });
                self.active_tab = Tab::Receive;
                self.send_component.reset();
            }
            Action::RefreshBalance => {
                let handle = self.session.handle.clone();
                let address = self.session.address.as_ref().map(|a| a.address.clone());
                let epoch = self.session.epoch;
                if handle.is_none() || address.is_none() {
                    debug!("Refresh ignored: wallet not initialized");
                    return Ok(());
                }
                self.spawn_busy("refresh", move |client| async move {
                    let _ = client
                        .refresh(handle.as_ref(), address.as_deref(), epoch)
                        .await;
                });
            }
            Action::SendTransaction | Action::PreviewFee => {
                let pending = self.session.pending.clone();
                if pending.is_complete()
                    && let Err(e) = validate_amount(pending.amount.trim())
                {
                    self.report(&e);
                    return Ok(());
                }
                let handle = self.session.handle.clone();
                let from = self.session.address.as_ref().map(|a| a.address.clone());
                let epoch = self.session.epoch;
                if action == Action::SendTransaction {
                    self.spawn_busy("send", move |client| async move {
                        let _ = client
                            .send(handle.as_ref(), from.as_deref(), &pending, epoch)
                            .await;
                    });
                } else {
                    self.spawn_busy("preview", move |client| async move {
                        let _ = client
                            .preview(handle.as_ref(), from.as_deref(), &pending, epoch)
                            .await;
                    });
                }
            }
            Action::EditTransfer(edit) => {
                self.apply_session_event(SessionEvent::TransferEdited(edit));
            }
            Action::CopyAddress => self.copy_address(),
            Action::OpenExplorer => self.open_explorer(),
            Action::StatusExpired(id) => {
                self.status.expire(id);
            }
        }
        Ok(())
    }

    /// Run `op` in the background unless another operation is in flight.
    fn spawn_busy<F, Fut>(&mut self, name: &'static str, op: F)
    where
        F: FnOnce(Arc<Client>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if !self.session.try_begin() {
            debug!("{} ignored: another operation is in flight", name);
            return;
        }
        let guard = BusyGuard::new(self.client.events().clone());
        let task = op(self.client.clone());
        tokio::spawn(async move {
            let _guard = guard;
            task.await;
        });
    }

    fn apply_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Notice { text, kind } => self.publish(text, kind),
            event => {
                let sent = matches!(event, SessionEvent::TransferSent { .. });
                debug!("Session event: {:?}", event);
                if !self.session.apply(event) {
                    debug!("Discarded stale session event");
                } else if sent {
                    self.send_component.reset();
                }
            }
        }
    }

    fn publish(&mut self, text: String, kind: StatusKind) {
        let id = self.status.publish(text, kind);
        let action_tx = self.action_tx.clone();
        spawn_expiry(id, self.status.ttl(), move |id| {
            let _ = action_tx.send(Action::StatusExpired(id));
        });
    }

    fn report(&mut self, err: &WalletError) {
        warn!("{}", err);
        self.publish(err.to_string(), StatusKind::Error);
    }

    fn copy_address(&mut self) {
        let Some(address) = self.session.address.as_ref().map(|a| a.address.clone()) else {
            return;
        };
        // Reported through the session channel either way.
        let _ = self
            .client
            .copy_address(&address, &SystemClipboard, &Osc52Clipboard);
    }

    fn open_explorer(&mut self) {
        let Some(tx_id) = self
            .session
            .last_receipt
            .as_ref()
            .map(|r| r.transaction_id.clone())
        else {
            return;
        };
        let url = self.config.explorer_url(&tx_id);
        match open_url(&url) {
            Ok(()) => self.publish(format!("Opening {}", url), StatusKind::Info),
            Err(e) => {
                warn!("Failed to open {}: {}", url, e);
                self.publish(format!("Open {} in your browser", url), StatusKind::Info);
            }
        }
    }

    fn draw_ui(&mut self) -> Result<()> {
        let Self {
            tui,
            config,
            session,
            status,
            active_tab,
            login_component,
            receive_component,
            send_component,
            ..
        } = self;
        let active_tab = *active_tab;

        tui.draw(|f| {
            let chunks = Layout::vertical([
                Constraint::Length(3), // Header
                Constraint::Length(3), // Tabs
                Constraint::Min(0),    // Content
                Constraint::Length(3), // Status
            ])
            .split(f.area());

            draw_header(f, chunks[0], config, session);

            if session.is_authenticated() {
                draw_tabs(f, chunks[1], active_tab);
                match active_tab {
                    Tab::Receive => receive_component.draw(f, chunks[2], session),
                    Tab::Send => send_component.draw(f, chunks[2], session),
                }
            } else {
                let area = chunks[1].union(chunks[2]);
                login_component.draw(f, area, session);
            }

            draw_status(f, chunks[3], status, session);
        })?;
        Ok(())
    }
}

fn draw_header(f: &mut Frame, area: Rect, config: &Config, session: &SessionState) {
    let mut spans = vec![
        Span::styled(
            "II Kaspa Wallet",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!("[{}]", config.endpoint.network),
            Style::default().fg(Color::Yellow),
        ),
    ];
    if let Some(handle) = session.handle.as_ref() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            handle.principal().to_string(),
            Style::default().fg(Color::White),
        ));
    }
    if let Some(health) = session.health.as_ref() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("Canister: {}", health),
            Style::default().fg(Color::Green),
        ));
    }
    let title = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(title, area);
}

fn draw_tabs(f: &mut Frame, area: Rect, active_tab: Tab) {
    let titles: Vec<Line> = Tab::all().iter().map(|t| t.title()).collect();

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL))
        .select(active_tab.index())
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, area);
}

fn draw_status(f: &mut Frame, area: Rect, status: &StatusNotifier, session: &SessionState) {
    let (text, color) = match status.current() {
        Some(message) => (
            message.text.as_str(),
            match message.kind {
                StatusKind::Info => Color::Cyan,
                StatusKind::Success => Color::Green,
                StatusKind::Error => Color::Red,
            },
        ),
        None => ("Ready", Color::DarkGray),
    };
    let keys = if session.is_authenticated() {
        "[r]Refresh [x]Logout [Tab]Switch [q]Quit"
    } else {
        "[Enter]Login [q]Quit"
    };
    let status = Paragraph::new(vec![Line::from(vec![
        Span::styled("Status: ", Style::default().fg(Color::DarkGray)),
        Span::styled(text, Style::default().fg(color)),
        Span::raw("  |  "),
        Span::styled(keys, Style::default().fg(Color::DarkGray)),
    ])])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(status, area);
}
