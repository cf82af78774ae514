use anchor_lang::prelude::*;

/// Lock state of a distribution index slot. Exactly one of the two slots of
/// an asset is `Open` at any time.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexLock {
    Open,
    Locked,
}

impl Default for IndexLock {
    fn default() -> Self {
        IndexLock::Open
    }
}

/// Outcome of settling a stream rate change
#[derive(Debug, PartialEq)]
pub enum RateSettlement {
    /// Rate unchanged
    NoOp,
    /// Rate increased; the upfront fee (18 decimals) moved from the
    /// streamable escrow into the pre-paid ledger
    Charged(u128),
    /// Rate decreased; the full uninvested accrual (18 decimals) is owed
    /// back to the depositor
    Refunded(u128),
}
