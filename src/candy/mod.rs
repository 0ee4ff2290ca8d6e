/* --------------------------------------------------------------------- */
/*  Metaplex candy machine (v1) integration                              */
/* --------------------------------------------------------------------- */

pub mod mint;
pub mod state;

use solana_sdk::pubkey::Pubkey;

pub use mint::{mint_multiple_tokens, mint_one_token};
pub use state::{fetch_candy_machine_state, CandyMachine, CandyMachineState};

// Candy machine v1 program
pub const CANDY_MACHINE_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("cndyAnrLdpjq1Ssp1z8xxDsB8dxe7u4HL5Nxi2K5WXZ");

// Metaplex token metadata program
pub const TOKEN_METADATA_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

// Anchor discriminators: sha256("account:CandyMachine")[..8], sha256("global:mint_nft")[..8]
pub const CANDY_MACHINE_DISCRIMINATOR: [u8; 8] = [51, 173, 177, 113, 25, 241, 109, 189];
pub const MINT_NFT_DISCRIMINATOR: [u8; 8] = [211, 57, 6, 167, 15, 219, 35, 251];

const METADATA_SEED: &[u8] = b"metadata";
const EDITION_SEED: &[u8] = b"edition";

/// Metadata PDA for `mint`.
pub fn metadata_address(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[
            METADATA_SEED,
            TOKEN_METADATA_PROGRAM_ID.as_ref(),
            mint.as_ref(),
        ],
        &TOKEN_METADATA_PROGRAM_ID,
    )
    .0
}

/// Master edition PDA for `mint`.
pub fn master_edition_address(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[
            METADATA_SEED,
            TOKEN_METADATA_PROGRAM_ID.as_ref(),
            mint.as_ref(),
            EDITION_SEED,
        ],
        &TOKEN_METADATA_PROGRAM_ID,
    )
    .0
}
