#[cfg(feature = "cranelift")]
pub mod cranelift;
