//! Wallet data returned by the ledger canister.
//!
//! All amounts are integer sompi (1 KAS = 100_000_000 sompi).

use serde::{Deserialize, Serialize};

/// Address generated for the caller by the ledger canister.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub addr_type: u64,
    pub address: String,
    pub derivation_path: String,
    pub public_key: Vec<u8>,
    pub script_public_key: String,
}

/// Balance snapshot for one address. Replaced wholesale on every refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub confirmed: u64,
    pub unconfirmed: u64,
    pub immature: u64,
    pub total: u64,
}

/// Result of a successful `sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_id: String,
    pub fee_paid: u64,
}

/// Result of `buildTransaction`: signed but not yet broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltTransaction {
    pub serialized_tx: String,
    pub fee_paid: u64,
}

/// Field of the send form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferField {
    ToAddress,
    Amount,
}

/// Edit applied to the pending transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferEdit {
    Push(TransferField, char),
    Pop(TransferField),
    Paste(TransferField, String),
    Clear,
}

/// Contents of the send form while it is being filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransfer {
    pub to_address: String,
    pub amount: String,
}

impl PendingTransfer {
    pub fn new(to_address: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            to_address: to_address.into(),
            amount: amount.into(),
        }
    }

    /// Both fields are non-empty after trimming.
    pub fn is_complete(&self) -> bool {
        !self.to_address.trim().is_empty() && !self.amount.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.to_address.clear();
        self.amount.clear();
    }

    pub fn field(&self, field: TransferField) -> &str {
        match field {
            TransferField::ToAddress => &self.to_address,
            TransferField::Amount => &self.amount,
        }
    }

    /// Apply a form edit. Amount input only accepts digits and a single dot.
    pub fn apply(&mut self, edit: TransferEdit) {
        match edit {
            TransferEdit::Push(TransferField::ToAddress, c) => self.to_address.push(c),
            TransferEdit::Push(TransferField::Amount, c) => {
                if c.is_ascii_digit() || (c == '.' && !self.amount.contains('.')) {
                    self.amount.push(c);
                }
            }
            TransferEdit::Pop(TransferField::ToAddress) => {
                self.to_address.pop();
            }
            TransferEdit::Pop(TransferField::Amount) => {
                self.amount.pop();
            }
            TransferEdit::Paste(TransferField::ToAddress, text) => {
                self.to_address.push_str(text.trim());
            }
            TransferEdit::Paste(TransferField::Amount, text) => {
                for c in text.trim().chars() {
                    self.apply(TransferEdit::Push(TransferField::Amount, c));
                }
            }
            TransferEdit::Clear => self.clear(),
        }
    }
}
