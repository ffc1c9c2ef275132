use rand::{Rng, distributions::Alphanumeric, rngs::OsRng};

/// Length of the OAuth state value put in the redirect URL.
pub const STATE_LENGTH: usize = 8;

/// Random alphanumeric string drawn from the OS CSPRNG.
pub fn random_alphanumeric(len: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn oauth_state() -> String {
    random_alphanumeric(STATE_LENGTH)
}
