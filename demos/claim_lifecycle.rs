// demos/claim_lifecycle.rs

use ecdsa_claims::{
    config::{Environment, StoreConfig},
    crypto::{challenge::decode_challenge_signature, ecdsa::verify_der_signature, pem},
    generate_nonce, ClaimService, EncodedClaim,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("ECDSA Claims Lifecycle Example");

    // 1. Open storage under a scratch directory (a device would use StoreConfig::default())
    let workdir = tempfile::tempdir()?;
    let config = StoreConfig::rooted_at(workdir.path(), Environment::Test);
    let service = ClaimService::open(&config)?;
    println!("Device public key:\n{}", service.public_key_pem()?);

    // 2. Issue a claim signed by the device key
    let claim = service.self_signed_claim(
        "manufacturer_user",
        "did:example:device",
        r#"{"certified_device":"true"}"#,
    )?;
    let encoded = service.issue("certification", &claim)?;
    println!("Stored token: {}...", &encoded.encoded_data[..50]);

    // 3. Creating the same id again is refused
    match service.create(&EncodedClaim::new("certification", "a.b.c")) {
        Ok(()) => println!("Unexpected: duplicate create succeeded"),
        Err(e) => println!("Duplicate create refused: {}", e),
    }

    // 4. Read it back with signature verification
    let verified = service.get_verified("certification")?;
    println!("Verified claim from {} issued at {}", verified.issuer, verified.issued_at);

    // 5. A control unit challenges the device with a nonce
    let nonce = generate_nonce();
    let response = service.sign_nonce("certification", &nonce)?;
    let public_key = pem::pem_decode_public(&service.public_key_pem()?)?;
    let der = decode_challenge_signature(&response.signature)?;
    verify_der_signature(&public_key, nonce.as_bytes(), &der)?;
    println!("Nonce signature verified");

    // 6. Clean up
    service.delete("certification")?;
    println!("Remaining claims: {:?}", service.list()?);

    println!("\nExample completed!");
    Ok(())
}
