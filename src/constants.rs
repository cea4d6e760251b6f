pub mod codes {

    pub const CODE_LENGTH: usize = 8;

    pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
}

pub mod session {

    pub const ADMIN_KEY: &str = "admin";

    pub const PRUNE_INTERVAL_SECS: u64 = 300;
}

pub mod qr {

    /// Longest text accepted for rendering; well inside QR byte-mode capacity.
    pub const MAX_TEXT_LENGTH: usize = 256;
}
