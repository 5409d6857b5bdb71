use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Join-code source for workshops and sessions. Codes are upper-case base-36
/// so lookups can normalize user input with a plain `to_uppercase`.
pub struct CodeGenerator {
    rng: Mutex<StdRng>,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic generator for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// `XXX-XXX-XXX`; never expires.
    pub fn workshop_code(&self) -> String {
        format!("{}-{}-{}", self.chars(3), self.chars(3), self.chars(3))
    }

    /// `WORKSHOP-{year}-{XXXX}`; the caller stamps the expiry.
    pub fn session_code(&self, year: i32) -> String {
        format!("WORKSHOP-{}-{}", year, self.chars(4))
    }

    fn chars(&self, n: usize) -> String {
        let mut rng = self.rng.lock().expect("rng mutex poisoned");
        (0..n)
            .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
            .collect()
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}
