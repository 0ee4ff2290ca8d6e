//! Mint transaction builders for the candy machine `mint_nft` instruction.
//!
//! Each mint creates a fresh token mint, the payer's associated token
//! account, mints exactly one token into it and lets the candy machine
//! program attach metadata and a master edition.

use anyhow::Result;
use log::{info, warn};
use solana_program::program_pack::Pack;
use solana_sdk::{
    hash::Hash,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    system_instruction, system_program, sysvar,
    transaction::Transaction,
};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account,
};
use spl_token::{instruction as token_instruction, state::Mint, ID as TOKEN_PROGRAM_ID};

use super::{
    master_edition_address, metadata_address, CandyMachineState, CANDY_MACHINE_PROGRAM_ID,
    MINT_NFT_DISCRIMINATOR, TOKEN_METADATA_PROGRAM_ID,
};
use crate::{
    config::settings::CandyAccounts,
    ledger::Ledger,
    mint::errors::MintError,
    wallet::Wallet,
};

/// `mint_nft` instruction of the candy machine program.
pub fn mint_nft_instruction(
    candy: &CandyMachineState,
    accounts: &CandyAccounts,
    payer: &Pubkey,
    mint: &Pubkey,
) -> Instruction {
    let metas = vec![
        AccountMeta::new_readonly(accounts.config, false),
        AccountMeta::new(candy.address, false),
        AccountMeta::new(*payer, true),
        AccountMeta::new(accounts.treasury, false),
        AccountMeta::new(metadata_address(mint), false),
        AccountMeta::new(*mint, false),
        AccountMeta::new_readonly(*payer, true), // mint authority
        AccountMeta::new_readonly(*payer, true), // update authority
        AccountMeta::new(master_edition_address(mint), false),
        AccountMeta::new_readonly(TOKEN_METADATA_PROGRAM_ID, false),
        AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new_readonly(sysvar::rent::id(), false),
        AccountMeta::new_readonly(sysvar::clock::id(), false),
    ];

    Instruction {
        program_id: CANDY_MACHINE_PROGRAM_ID,
        accounts: metas,
        data: MINT_NFT_DISCRIMINATOR.to_vec(),
    }
}

/// Full instruction list for one mint into a fresh `mint` account.
pub fn mint_instructions(
    candy: &CandyMachineState,
    accounts: &CandyAccounts,
    payer: &Pubkey,
    mint: &Pubkey,
    rent_lamports: u64,
) -> Result<Vec<Instruction>> {
    let token_account = get_associated_token_address(payer, mint);

    Ok(vec![
        system_instruction::create_account(
            payer,
            mint,
            rent_lamports,
            Mint::LEN as u64,
            &TOKEN_PROGRAM_ID,
        ),
        token_instruction::initialize_mint(&TOKEN_PROGRAM_ID, mint, payer, Some(payer), 0)?,
        create_associated_token_account(payer, payer, mint, &TOKEN_PROGRAM_ID),
        token_instruction::mint_to(&TOKEN_PROGRAM_ID, mint, &token_account, payer, &[], 1)?,
        mint_nft_instruction(candy, accounts, payer, mint),
    ])
}

/// Unsigned-by-payer mint transaction; only the fresh mint keypair has signed.
fn build_mint_transaction(
    candy: &CandyMachineState,
    accounts: &CandyAccounts,
    payer: &Pubkey,
    rent_lamports: u64,
    blockhash: Hash,
) -> Result<Transaction> {
    let mint = Keypair::new();
    let ixs = mint_instructions(candy, accounts, payer, &mint.pubkey(), rent_lamports)?;

    let mut tx = Transaction::new_with_payer(&ixs, Some(payer));
    tx.try_partial_sign(&[&mint], blockhash)?;
    Ok(tx)
}

/// Build, sign and submit a single mint. Returns the transaction signature.
pub async fn mint_one_token<W: Wallet + ?Sized>(
    ledger: &dyn Ledger,
    wallet: &W,
    candy: &CandyMachineState,
    accounts: &CandyAccounts,
) -> Result<Signature> {
    let payer = wallet
        .public_key()
        .ok_or_else(|| MintError::Signing("wallet has no public key".into()))?;

    let rent = ledger.get_minimum_balance_for_rent_exemption(Mint::LEN).await?;
    let blockhash = ledger.get_latest_blockhash().await?;

    let tx = build_mint_transaction(candy, accounts, &payer, rent, blockhash)?;
    let signed = wallet
        .sign_transaction(tx)
        .await
        .map_err(|e| MintError::Signing(e.to_string()))?;

    let signature = ledger.send_transaction(&signed).await?;
    info!("🍬 [MINT] Submitted mint {}", signature);
    Ok(signature)
}

/// Build `quantity` mints, have the wallet sign them in one call and submit
/// each. Per-transaction submission results are returned in build order.
pub async fn mint_multiple_tokens<W: Wallet + ?Sized>(
    ledger: &dyn Ledger,
    wallet: &W,
    candy: &CandyMachineState,
    accounts: &CandyAccounts,
    quantity: usize,
) -> Result<Vec<Result<Signature>>> {
    let payer = wallet
        .public_key()
        .ok_or_else(|| MintError::Signing("wallet has no public key".into()))?;

    let rent = ledger.get_minimum_balance_for_rent_exemption(Mint::LEN).await?;
    let blockhash = ledger.get_latest_blockhash().await?;

    let unsigned = (0..quantity)
        .map(|_| build_mint_transaction(candy, accounts, &payer, rent, blockhash))
        .collect::<Result<Vec<_>>>()?;

    let signed = wallet
        .sign_all_transactions(unsigned)
        .await
        .map_err(|e| MintError::Signing(e.to_string()))?;
    if signed.len() != quantity {
        return Err(MintError::SignedCountMismatch {
            expected: quantity,
            got: signed.len(),
        }
        .into());
    }

    let mut results = Vec::with_capacity(quantity);
    for tx in &signed {
        let sent = ledger.send_transaction(tx).await;
        if let Err(e) = &sent {
            warn!("⚠️ [MINT] Submission failed: {:#}", e);
        }
        results.push(sent);
    }
    info!(
        "🍬 [MINT] Submitted {}/{} mints",
        results.iter().filter(|r| r.is_ok()).count(),
        quantity
    );
    Ok(results)
}
