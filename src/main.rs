use coincore::address::pubhash_to_address;
use coincore::context::Network;
use coincore::key::{canonicalize, encode_secret};
use coincore::registry::{CoinFamily, KeyVariant, Registry};
use rand::rngs::OsRng;
use rand::RngCore;
use std::error::Error;

/// Exercises the library end-to-end: generate a random scalar, canonicalize
/// it against Bitcoin's curve order, export it as a WIF, and derive the
/// corresponding P2PKH address. Argument parsing, daemon supervision, and
/// RPC transport stay out of scope (see SPEC_FULL.md §0) — this binary
/// exists only to demonstrate the library surface.
fn main() -> Result<(), Box<dyn Error>> {
    let registry = Registry::new();
    let record = registry.get("btc", Network::Mainnet)?;

    let mut secret = [0u8; 32];
    OsRng.fill_bytes(&mut secret);
    let canonical = canonicalize(&secret, CoinFamily::Bitcoin, KeyVariant::Std, &record)?;

    let wif = encode_secret(&canonical, CoinFamily::Bitcoin, KeyVariant::Std, true, &record)?;

    let secp = secp256k1::Secp256k1::signing_only();
    let seckey = secp256k1::SecretKey::from_slice(&canonical[..])?;
    let pubkey = secp256k1::PublicKey::from_secret_key(&secp, &seckey);
    let pubkey_hash = coincore::hash::hash160(&pubkey.serialize());
    let address = pubhash_to_address(&pubkey_hash, false, CoinFamily::Bitcoin, &record)?;

    println!("coins available: {}", registry.list_coins().join(", "));
    println!("WIF: {wif}");
    println!("P2PKH address: {address}");

    Ok(())
}
