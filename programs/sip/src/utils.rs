use anchor_lang::prelude::*;
use anchor_spl::token::*;

use crate::asset::StreamAsset;
use crate::constants::*;
use crate::errors::ErrorCode;

pub fn transfer_token_amount<'info>(
    from: &AccountInfo<'info>,
    to: &AccountInfo<'info>,
    authority: &AccountInfo<'info>,
    token_program: &AccountInfo<'info>,
    amount: u64,
) -> Result<()> {
    let cpi_accounts = Transfer {
        from: from.clone(),
        to: to.clone(),
        authority: authority.clone(),
    };
    let cpi_ctx = CpiContext::new(token_program.clone(), cpi_accounts);
    transfer(cpi_ctx, amount)
}

/// Transfers tokens out of an account owned by the asset PDA
pub fn asset_signed_transfer<'info>(
    asset: &Account<'info, StreamAsset>,
    from: &AccountInfo<'info>,
    to: &AccountInfo<'info>,
    token_program: &AccountInfo<'info>,
    amount: u64,
) -> Result<()> {
    let asset_signer_seed: &[&[&[_]]] = &[&[
        ASSET_SEED,
        asset.core.as_ref(),
        asset.wrapped_mint.as_ref(),
        &[asset.bump],
    ]];
    let cpi_accounts = Transfer {
        from: from.clone(),
        to: to.clone(),
        authority: asset.to_account_info(),
    };
    let cpi_ctx = CpiContext::new_with_signer(token_program.clone(), cpi_accounts, asset_signer_seed);
    transfer(cpi_ctx, amount)
}

/// Enforces strictly ascending keys over a caller-supplied member list.
/// Together with an exact member count this guarantees every member
/// appears exactly once.
pub fn assert_ascending_member(previous: Option<Pubkey>, current: Pubkey) -> Result<()> {
    if let Some(previous) = previous {
        if current <= previous {
            return Err(ErrorCode::UnsortedMemberAccounts.into());
        }
    }
    Ok(())
}

pub fn string_to_bytes(string: String) -> Result<[u8; 32]> {
    let string_bytes = string.as_bytes();

    if string_bytes.len() > 32 {
        return Err(ErrorCode::StringTooLong.into());
    }

    let mut string_data = [b' '; 32];
    string_data[..string_bytes.len()].copy_from_slice(string_bytes);

    Ok(string_data)
}
