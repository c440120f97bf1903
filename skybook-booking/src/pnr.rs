use rand::Rng;
use std::collections::HashSet;
use std::sync::Mutex;

/// Uppercase letters and digits minus the easily confused 0/O and 1/I.
pub const PNR_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const PNR_LENGTH: usize = 6;

const MAX_ATTEMPTS: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum PnrError {
    #[error("PNR generation exhausted after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

/// Issues collision-free confirmation codes. Check-and-reserve happens under
/// one lock, so two concurrent confirmations can never draw the same code.
/// Codes are never recycled: a cancelled booking keeps its PNR.
pub struct PnrAllocator {
    issued: Mutex<HashSet<String>>,
}

impl PnrAllocator {
    pub fn new() -> Self {
        Self {
            issued: Mutex::new(HashSet::new()),
        }
    }

    pub fn allocate(&self) -> Result<String, PnrError> {
        self.allocate_with(random_code)
    }

    /// Mark an externally issued code as taken (e.g. when rehydrating from
    /// an archive). Returns false if the code was already reserved.
    pub fn reserve(&self, code: &str) -> bool {
        let mut issued = self.issued.lock().expect("pnr lock poisoned");
        issued.insert(code.to_uppercase())
    }

    pub fn issued_count(&self) -> usize {
        let issued = self.issued.lock().expect("pnr lock poisoned");
        issued.len()
    }

    fn allocate_with(&self, mut draw: impl FnMut() -> String) -> Result<String, PnrError> {
        let mut issued = self.issued.lock().expect("pnr lock poisoned");

        for _ in 0..MAX_ATTEMPTS {
            let code = draw();
            if issued.insert(code.clone()) {
                return Ok(code);
            }
        }

        // With a 32^6 code space this is a near-impossibility; if it fires,
        // something is badly wrong and the operation must abort loudly.
        tracing::error!(attempts = MAX_ATTEMPTS, "PNR generation exhausted retry budget");
        Err(PnrError::Exhausted {
            attempts: MAX_ATTEMPTS,
        })
    }
}

impl Default for PnrAllocator {
    fn default() -> Self {
        Self::new()
    }
}

fn random_code() -> String {
    let mut rng = rand::thread_rng();
    (0..PNR_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..PNR_ALPHABET.len());
            PNR_ALPHABET[idx] as char
        })
        .collect()
}
