use anchor_lang::prelude::*;
use anchor_lang::solana_program::hash::hash;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::solana_program::program::invoke_signed;

use crate::asset::StreamAsset;
use crate::constants::*;

/// Narrow adapter over the external vault program. The engine only ever
/// calls the vault's `deposit`: wrapped tokens go in, share tokens come
/// back to the asset's share account. Shares received are measured by the
/// caller as a balance delta, never trusted from return data.
pub struct VaultDeposit<'a, 'info> {
    pub vault_program: &'a AccountInfo<'info>,
    pub vault_state: &'a AccountInfo<'info>,
    /// The vault's wrapped token custody account
    pub vault_token_account: &'a AccountInfo<'info>,
    pub share_mint: &'a AccountInfo<'info>,
    /// Source of the wrapped tokens, owned by the asset PDA
    pub source_token_account: &'a AccountInfo<'info>,
    /// Destination of the minted shares, owned by the asset PDA
    pub share_token_account: &'a AccountInfo<'info>,
    pub token_program: &'a AccountInfo<'info>,
}

impl<'a, 'info> VaultDeposit<'a, 'info> {
    /// Invokes the vault deposit signed by the asset PDA
    pub fn invoke(&self, asset: &Account<'info, StreamAsset>, amount: u64) -> Result<()> {
        let mut data = hash(b"global:deposit").to_bytes()[..8].to_vec();
        data.extend_from_slice(&amount.to_le_bytes());

        let ix = Instruction {
            program_id: self.vault_program.key(),
            accounts: vec![
                AccountMeta::new(self.vault_state.key(), false),
                AccountMeta::new(self.vault_token_account.key(), false),
                AccountMeta::new(self.share_mint.key(), false),
                AccountMeta::new(self.source_token_account.key(), false),
                AccountMeta::new(self.share_token_account.key(), false),
                AccountMeta::new_readonly(asset.key(), true),
                AccountMeta::new_readonly(self.token_program.key(), false),
            ],
            data,
        };

        let asset_signer_seed: &[&[&[_]]] = &[&[
            ASSET_SEED,
            asset.core.as_ref(),
            asset.wrapped_mint.as_ref(),
            &[asset.bump],
        ]];

        invoke_signed(
            &ix,
            &[
                self.vault_state.clone(),
                self.vault_token_account.clone(),
                self.share_mint.clone(),
                self.source_token_account.clone(),
                self.share_token_account.clone(),
                asset.to_account_info(),
                self.token_program.clone(),
            ],
            asset_signer_seed,
        )
        .map_err(Into::into)
    }
}

/// Seconds left on the vault's share exit cooldown, zero once elapsed
pub fn exit_cooldown_remaining(last_deposit_ts: u64, cooldown_seconds: u64, timestamp: u64) -> u64 {
    let elapsed = timestamp.saturating_sub(last_deposit_ts);
    cooldown_seconds.saturating_sub(elapsed)
}
