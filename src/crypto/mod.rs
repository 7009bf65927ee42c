pub mod seed;
pub mod slip10; // SLIP-0010 ed25519 path walk

pub use self::seed::{MasterSeed, SeedDeriver};
pub use self::slip10::{DerivedKeySeed, PathDeriver};
