mod engine;

pub use engine::CryptoEngine;

#[cfg(test)]
pub(crate) use engine::test_engine;
