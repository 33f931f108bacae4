use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const FOLIO_MIN: u32 = 100_000;
pub const FOLIO_MAX: u32 = 999_999;

/// Six-digit tracking number handed back to the applicant.
///
/// Folios are drawn at random and are not checked against previously issued
/// ones, so two submissions can share a folio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Folio(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("folio {0} is not a six-digit number")]
pub struct FolioOutOfRange(pub u32);

impl Folio {
    pub fn new(value: u32) -> Result<Self, FolioOutOfRange> {
        if (FOLIO_MIN..=FOLIO_MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(FolioOutOfRange(value))
        }
    }

    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.gen_range(FOLIO_MIN..=FOLIO_MAX))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Folio {
    type Error = FolioOutOfRange;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Folio> for u32 {
    fn from(folio: Folio) -> Self {
        folio.0
    }
}

impl fmt::Display for Folio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
