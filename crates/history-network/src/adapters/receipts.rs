use crate::domain::AssembledBlock;
use crate::ports::ReceiptManager;

/// Receipt manager for nodes without an execution client: derives nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoReceipts;

impl ReceiptManager for NoReceipts {
    fn derive_receipts(&self, _block: &AssembledBlock) -> Option<Vec<u8>> {
        None
    }
}
