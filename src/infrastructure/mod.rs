pub mod proofs;
pub mod storage;
