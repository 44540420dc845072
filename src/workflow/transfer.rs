use std::time::Duration;

use tracing::{debug, info};

use super::{EventSink, wallet::WalletController};
use crate::{
    domain::{
        amount::{format_kas, format_tx_id, to_sompi},
        error::WalletError,
        session::{Epoch, SessionEvent},
        status::StatusKind,
        wallet::{BuiltTransaction, PendingTransfer, TransactionReceipt},
    },
    infra::ledger::RemoteHandle,
};

const MISSING_FIELDS: &str = "Please fill in all fields";

/// Compose, submit and follow up on transfers.
#[derive(Clone)]
pub struct TransactionWorkflow {
    events: EventSink,
    wallet: WalletController,
    refresh_delay: Duration,
}

/// Checked transfer ready to hand to the canister.
struct Prepared<'a> {
    handle: &'a RemoteHandle,
    from: &'a str,
    to: &'a str,
    amount: u64,
}

impl TransactionWorkflow {
    pub fn new(events: EventSink, wallet: WalletController, refresh_delay: Duration) -> Self {
        Self {
            events,
            wallet,
            refresh_delay,
        }
    }

    /// Send the pending transfer.
    ///
    /// On success one balance refresh is scheduled after the refresh delay.
    /// On failure the pending transfer is left untouched for a retry.
    pub async fn send(
        &self,
        handle: Option<&RemoteHandle>,
        from: Option<&str>,
        transfer: &PendingTransfer,
        epoch: Epoch,
    ) -> Result<TransactionReceipt, WalletError> {
        let prepared = self.prepare(handle, from, transfer)?;

        self.events
            .notify("Sending Kaspa transaction...", StatusKind::Info);
        info!(
            "Sending {} sompi from {} to {}",
            prepared.amount, prepared.from, prepared.to
        );

        match prepared
            .handle
            .send_transaction(prepared.from, prepared.to, prepared.amount)
            .await
        {
            Ok(receipt) => {
                info!(
                    "Transaction {} sent, fee {} sompi",
                    receipt.transaction_id, receipt.fee_paid
                );
                self.events.emit(SessionEvent::TransferSent {
                    epoch,
                    receipt: receipt.clone(),
                });
                self.events
                    .notify("Transaction sent successfully!", StatusKind::Success);
                self.schedule_refresh(prepared.handle.clone(), prepared.from.to_string(), epoch);
                Ok(receipt)
            }
            Err(e) => {
                let err = WalletError::Transaction(e.to_string());
                self.events.report(&err);
                Err(err)
            }
        }
    }

    /// Build the transfer without sending it, to show the fee.
    pub async fn preview(
        &self,
        handle: Option<&RemoteHandle>,
        from: Option<&str>,
        transfer: &PendingTransfer,
        epoch: Epoch,
    ) -> Result<BuiltTransaction, WalletError> {
        let prepared = self.prepare(handle, from, transfer)?;

        self.events.notify("Estimating fee...", StatusKind::Info);
        match prepared
            .handle
            .build_transaction(prepared.from, prepared.to, prepared.amount)
            .await
        {
            Ok(built) => {
                self.events.notify(
                    format!("Estimated fee: {} KAS", format_kas(built.fee_paid, 8)),
                    StatusKind::Info,
                );
                self.events.emit(SessionEvent::FeePreviewed {
                    epoch,
                    built: built.clone(),
                });
                Ok(built)
            }
            Err(e) => {
                let err = WalletError::Transaction(e.to_string());
                self.events.report(&err);
                Err(err)
            }
        }
    }

    /// Broadcast a transaction built earlier. Returns the canister's id for it.
    pub async fn broadcast(
        &self,
        handle: &RemoteHandle,
        serialized_tx: &str,
    ) -> Result<String, WalletError> {
        let serialized_tx = serialized_tx.trim();
        if serialized_tx.is_empty() {
            let err = WalletError::Validation("Serialized transaction is empty".to_string());
            self.events.report(&err);
            return Err(err);
        }

        match handle.broadcast_transaction(serialized_tx).await {
            Ok(tx_id) => {
                self.events.notify(
                    format!("Transaction broadcast: {}", format_tx_id(&tx_id)),
                    StatusKind::Success,
                );
                Ok(tx_id)
            }
            Err(e) => {
                let err = WalletError::Transaction(e.to_string());
                self.events.report(&err);
                Err(err)
            }
        }
    }

    fn prepare<'a>(
        &self,
        handle: Option<&'a RemoteHandle>,
        from: Option<&'a str>,
        transfer: &'a PendingTransfer,
    ) -> Result<Prepared<'a>, WalletError> {
        let result = match (handle, from) {
            (Some(handle), Some(from)) if transfer.is_complete() => {
                to_sompi(&transfer.amount).and_then(|amount| {
                    if amount == 0 {
                        return Err(WalletError::Validation(
                            "Amount must be greater than 0".to_string(),
                        ));
                    }
                    Ok(Prepared {
                        handle,
                        from,
                        to: transfer.to_address.trim(),
                        amount,
                    })
                })
            }
            _ => Err(WalletError::Validation(MISSING_FIELDS.to_string())),
        };
        if let Err(ref e) = result {
            self.events.report(e);
        }
        result
    }

    fn schedule_refresh(&self, handle: RemoteHandle, from: String, epoch: Epoch) {
        let wallet = self.wallet.clone();
        let delay = self.refresh_delay;
        debug!("Balance refresh scheduled in {:?}", delay);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Errors are already reported through the event sink.
            let _ = wallet
                .refresh_balance(Some(&handle), Some(&from), epoch)
                .await;
        });
    }
}
