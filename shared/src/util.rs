/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate an unguessable order token for customer-facing links.
///
/// 128 bits of randomness, hex-encoded. Tokens are bearer capabilities:
/// whoever holds one can read the order, so they must not be derivable
/// from the sequential order number.
pub fn order_token() -> String {
    use rand::Rng;
    let bytes: [u8; 16] = rand::thread_rng().r#gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
