use tracing::info;

use super::EventSink;
use crate::{
    domain::{
        error::WalletError,
        session::{Epoch, SessionEvent},
        status::StatusKind,
        wallet::{Address, Balance},
    },
    infra::ledger::RemoteHandle,
};

/// Drives address and balance retrieval.
#[derive(Clone)]
pub struct WalletController {
    events: EventSink,
}

impl WalletController {
    pub fn new(events: EventSink) -> Self {
        Self { events }
    }

    /// Generate the address, then load its balance.
    ///
    /// A failed address call stops the sequence. A failed balance call keeps
    /// the address and reports the error.
    pub async fn bootstrap(
        &self,
        handle: &RemoteHandle,
        epoch: Epoch,
    ) -> Result<Address, WalletError> {
        self.events
            .notify("Setting up your wallet...", StatusKind::Info);

        let address = match handle.generate_address().await {
            Ok(address) => address,
            Err(e) => {
                let err = WalletError::WalletSetup(e.to_string());
                self.events.report(&err);
                return Err(err);
            }
        };
        info!("Wallet address: {}", address.address);
        self.events.emit(SessionEvent::AddressGenerated {
            epoch,
            address: address.clone(),
        });

        match handle.get_balance(&address.address).await {
            Ok(balance) => {
                self.events.emit(SessionEvent::BalanceLoaded { epoch, balance });
                self.events.notify("Wallet ready!", StatusKind::Success);
                Ok(address)
            }
            Err(e) => {
                let err = WalletError::WalletSetup(e.to_string());
                self.events.report(&err);
                Err(err)
            }
        }
    }

    /// Re-read the balance. Does nothing without a handle and an address.
    pub async fn refresh_balance(
        &self,
        handle: Option<&RemoteHandle>,
        address: Option<&str>,
        epoch: Epoch,
    ) -> Result<Option<Balance>, WalletError> {
        let (Some(handle), Some(address)) = (handle, address) else {
            return Ok(None);
        };

        self.events
            .notify("Refreshing balance...", StatusKind::Info);
        match handle.get_balance(address).await {
            Ok(balance) => {
                self.events.emit(SessionEvent::BalanceLoaded { epoch, balance });
                self.events.notify("Balance updated!", StatusKind::Success);
                Ok(Some(balance))
            }
            Err(e) => {
                let err = WalletError::BalanceRefresh(e.to_string());
                self.events.report(&err);
                Err(err)
            }
        }
    }
}
